//! Charts module - static PNG rendering

mod renderer;
mod slices;

pub use renderer::{
    open_charts, truncate_label, ChartError, StaticChartRenderer, CATEGORY_REVENUE_FILE, PALETTE,
    TOP_CUSTOMERS_FILE, TOP_PRODUCTS_FILE,
};
pub use slices::{collapse_slices, Slice, OTHER_LABEL};
