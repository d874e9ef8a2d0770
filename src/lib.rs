//! Retail Insights: cleans a retail transactions export and reports top products,
//! revenue by category and customer purchase frequency as static charts.
//!
//! The run is a single linear pipeline:
//! load ([`data::DataLoader`]) -> clean ([`data::DataCleaner`]) ->
//! aggregate ([`stats::SalesAggregator`]) -> plot ([`charts::StaticChartRenderer`]).

pub mod charts;
pub mod cli;
pub mod config;
pub mod data;
pub mod error;
pub mod pipeline;
pub mod stats;
pub mod summary;

#[cfg(test)]
mod test_utils;

pub use cli::Args;
pub use config::{ColumnMapping, Encoding, PipelineConfig};
pub use data::{CleaningReport, DataCleaner, DataLoader, TransactionRecord, Transactions};
pub use error::{PipelineError, Result};
pub use pipeline::{analyze, run, PipelineOutput};
pub use stats::{Aggregates, CategoryRevenue, CustomerFrequency, ProductQuantity, SalesAggregator};
