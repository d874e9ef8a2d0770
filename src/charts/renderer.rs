//! Static Chart Renderer
//! Writes the three report charts as PNG files with plotters.
//!
//! Layout:
//! 1. top_products.png: horizontal bars, best seller on top
//! 2. category_revenue.png: donut with a legend column on the right
//! 3. top_customers.png: horizontal bars, most frequent customer on top

use plotters::coord::ranged1d::SegmentValue;
use plotters::drawing::DrawingAreaErrorKind;
use plotters::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

use super::slices::{collapse_slices, Slice};
use crate::config::PipelineConfig;
use crate::stats::{Aggregates, CategoryRevenue, CustomerFrequency, ProductQuantity};

#[derive(Error, Debug)]
pub enum ChartError {
    #[error("Nothing to chart: {0} is empty")]
    EmptyAggregate(&'static str),
    #[error("Failed to create output directory {path}: {source}")]
    OutputDir {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to render chart: {0}")]
    Render(String),
}

impl<E: std::error::Error + Send + Sync> From<DrawingAreaErrorKind<E>> for ChartError {
    fn from(err: DrawingAreaErrorKind<E>) -> Self {
        ChartError::Render(err.to_string())
    }
}

pub const TOP_PRODUCTS_FILE: &str = "top_products.png";
pub const CATEGORY_REVENUE_FILE: &str = "category_revenue.png";
pub const TOP_CUSTOMERS_FILE: &str = "top_customers.png";

// Colors
const PRODUCT_COLOR: RGBColor = RGBColor(52, 152, 219); // Blue
const CUSTOMER_COLOR: RGBColor = RGBColor(26, 188, 156); // Teal
const OTHER_COLOR: RGBColor = RGBColor(189, 195, 199); // Light grey
const NOTE_COLOR: RGBColor = RGBColor(100, 100, 100);

pub const PALETTE: [RGBColor; 10] = [
    RGBColor(231, 76, 60),  // Red
    RGBColor(46, 204, 113), // Green
    RGBColor(155, 89, 182), // Purple
    RGBColor(243, 156, 18), // Orange
    RGBColor(52, 152, 219), // Blue
    RGBColor(233, 30, 99),  // Pink
    RGBColor(0, 188, 212),  // Cyan
    RGBColor(255, 87, 34),  // Deep Orange
    RGBColor(121, 85, 72),  // Brown
    RGBColor(96, 125, 139), // Blue Grey
];

const FONT: &str = "sans-serif";
const MAX_LABEL_CHARS: usize = 32;

/// Shorten long product descriptions so the label column stays readable.
pub fn truncate_label(label: &str, max_chars: usize) -> String {
    if label.chars().count() <= max_chars {
        return label.to_string();
    }
    let head: String = label.chars().take(max_chars.saturating_sub(3)).collect();
    format!("{}...", head.trim_end())
}

pub struct StaticChartRenderer {
    output_dir: PathBuf,
    size: (u32, u32),
    pie_categories: usize,
}

impl StaticChartRenderer {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            size: (1000, 600),
            pie_categories: 10,
        }
    }

    pub fn from_config(config: &PipelineConfig) -> Self {
        Self {
            output_dir: config.output_dir.clone(),
            size: (config.chart_width, config.chart_height),
            pie_categories: config.pie_categories,
        }
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.size = (width, height);
        self
    }

    pub fn with_pie_categories(mut self, n: usize) -> Self {
        self.pie_categories = n;
        self
    }

    /// Render all three charts and return the written paths.
    pub fn render_all(&self, aggregates: &Aggregates) -> Result<Vec<PathBuf>, ChartError> {
        Ok(vec![
            self.render_top_products(&aggregates.top_products)?,
            self.render_category_revenue(&aggregates.category_revenue)?,
            self.render_top_customers(&aggregates.top_customers)?,
        ])
    }

    pub fn render_top_products(&self, products: &[ProductQuantity]) -> Result<PathBuf, ChartError> {
        if products.is_empty() {
            return Err(ChartError::EmptyAggregate("top products"));
        }
        let bars: Vec<(String, f64)> = products
            .iter()
            .map(|p| (p.product.clone(), p.quantity as f64))
            .collect();

        let path = self.prepare_path(TOP_PRODUCTS_FILE)?;
        Self::draw_horizontal_bars(
            &path,
            self.size,
            &format!("Top {} Products by Quantity Sold", bars.len()),
            "Total Quantity",
            &bars,
            PRODUCT_COLOR,
        )?;
        info!("Top products chart saved to: {}", path.display());
        Ok(path)
    }

    pub fn render_category_revenue(
        &self,
        revenue: &[CategoryRevenue],
    ) -> Result<PathBuf, ChartError> {
        if revenue.is_empty() {
            return Err(ChartError::EmptyAggregate("category revenue"));
        }
        let slices = collapse_slices(revenue, self.pie_categories);
        if slices.iter().map(|s| s.value).sum::<f64>() <= 0.0 {
            return Err(ChartError::EmptyAggregate("category revenue"));
        }

        let path = self.prepare_path(CATEGORY_REVENUE_FILE)?;
        Self::draw_donut(&path, self.size, "Revenue by Category", &slices)?;
        info!("Category revenue chart saved to: {}", path.display());
        Ok(path)
    }

    pub fn render_top_customers(
        &self,
        customers: &[CustomerFrequency],
    ) -> Result<PathBuf, ChartError> {
        if customers.is_empty() {
            return Err(ChartError::EmptyAggregate("top customers"));
        }
        let bars: Vec<(String, f64)> = customers
            .iter()
            .map(|c| (format!("Customer {}", c.customer_id), c.frequency as f64))
            .collect();

        let path = self.prepare_path(TOP_CUSTOMERS_FILE)?;
        Self::draw_horizontal_bars(
            &path,
            self.size,
            &format!("Top {} Customers by Purchase Frequency", bars.len()),
            "Distinct Transactions",
            &bars,
            CUSTOMER_COLOR,
        )?;
        info!("Top customers chart saved to: {}", path.display());
        Ok(path)
    }

    fn prepare_path(&self, file_name: &str) -> Result<PathBuf, ChartError> {
        fs::create_dir_all(&self.output_dir).map_err(|source| ChartError::OutputDir {
            path: self.output_dir.clone(),
            source,
        })?;
        Ok(self.output_dir.join(file_name))
    }

    /// Bars are given in rank order; rank 0 is drawn at the top.
    fn draw_horizontal_bars(
        path: &Path,
        size: (u32, u32),
        title: &str,
        x_desc: &str,
        bars: &[(String, f64)],
        color: RGBColor,
    ) -> Result<(), ChartError> {
        let n = bars.len() as u32;
        let max = bars.iter().map(|(_, v)| *v).fold(0.0, f64::max);
        let x_max = if max > 0.0 { max * 1.15 } else { 1.0 };
        let labels: Vec<String> = bars
            .iter()
            .map(|(label, _)| truncate_label(label, MAX_LABEL_CHARS))
            .collect();
        let row_of = |rank: usize| n - 1 - rank as u32;

        let root = BitMapBackend::new(path, size).into_drawing_area();
        root.fill(&WHITE)?;

        let mut chart = ChartBuilder::on(&root)
            .caption(title, (FONT, 26))
            .margin(15)
            .x_label_area_size(50)
            .y_label_area_size(280)
            .build_cartesian_2d(0f64..x_max, (0u32..n).into_segmented())?;

        let y_formatter = |v: &SegmentValue<u32>| match v {
            SegmentValue::CenterOf(row) if *row < n => {
                labels[(n - 1 - row) as usize].clone()
            }
            _ => String::new(),
        };

        chart
            .configure_mesh()
            .disable_y_mesh()
            .y_labels(bars.len() + 1)
            .y_label_formatter(&y_formatter)
            .x_desc(x_desc)
            .axis_desc_style((FONT, 15))
            .label_style((FONT, 13))
            .draw()?;

        chart.draw_series(bars.iter().enumerate().map(|(rank, (_, value))| {
            let row = row_of(rank);
            let mut bar = Rectangle::new(
                [
                    (0.0, SegmentValue::Exact(row)),
                    (*value, SegmentValue::Exact(row + 1)),
                ],
                color.filled(),
            );
            bar.set_margin(6, 6, 0, 0);
            bar
        }))?;

        chart.draw_series(bars.iter().enumerate().map(|(rank, (_, value))| {
            Text::new(
                format!(" {}", value),
                (*value, SegmentValue::CenterOf(row_of(rank))),
                (FONT, 13).into_font(),
            )
        }))?;

        root.present()?;
        Ok(())
    }

    fn draw_donut(
        path: &Path,
        size: (u32, u32),
        title: &str,
        slices: &[Slice],
    ) -> Result<(), ChartError> {
        let root = BitMapBackend::new(path, size).into_drawing_area();
        root.fill(&WHITE)?;
        let root = root.titled(title, (FONT, 26))?;

        let (width, height) = root.dim_in_pixel();
        let (pie_area, legend_area) = root.split_horizontally(width * 11 / 20);

        let note_style = TextStyle::from((FONT, 13).into_font()).color(&NOTE_COLOR);
        pie_area.draw_text(CategoryRevenue::NOTE, &note_style, (10, 0))?;

        let (pie_w, pie_h) = pie_area.dim_in_pixel();
        let center = (pie_w as i32 / 2, pie_h as i32 / 2 + 10);
        let radius = (pie_w.min(pie_h) as f64 / 2.0 - 30.0).max(10.0);

        let colors: Vec<RGBColor> = slices
            .iter()
            .enumerate()
            .map(|(i, s)| {
                if s.label == super::slices::OTHER_LABEL {
                    OTHER_COLOR
                } else {
                    PALETTE[i % PALETTE.len()]
                }
            })
            .collect();
        let sizes: Vec<f64> = slices.iter().map(|s| s.value).collect();
        // names go in the legend; the ring only carries percentages
        let ring_labels: Vec<&str> = vec![""; slices.len()];

        let mut pie = Pie::new(&center, &radius, &sizes, &colors, &ring_labels);
        pie.start_angle(-90.0);
        pie.donut_hole(radius * 0.5);
        pie.percentages((FONT, 12).into_font().color(&BLACK));
        pie_area.draw(&pie)?;

        let total: f64 = sizes.iter().sum();
        let legend_style = TextStyle::from((FONT, 13).into_font()).color(&BLACK);
        let row_h = ((height as i32 - 40) / (slices.len() as i32 + 1)).clamp(14, 32);
        for (i, (slice, color)) in slices.iter().zip(&colors).enumerate() {
            let y = 30 + i as i32 * row_h;
            legend_area.draw(&Rectangle::new([(0, y), (14, y + 14)], color.filled()))?;
            let text = format!(
                "{}  {:.2} ({:.1}%)",
                truncate_label(&slice.label, MAX_LABEL_CHARS),
                slice.value,
                slice.value / total * 100.0
            );
            legend_area.draw_text(&text, &legend_style, (22, y))?;
        }

        root.present()?;
        Ok(())
    }
}

/// Open rendered charts with the system viewer. Failures are logged, not fatal.
pub fn open_charts(paths: &[PathBuf]) {
    for path in paths {
        if let Err(e) = open::that(path) {
            warn!("Could not open {}: {}", path.display(), e);
        }
    }
}
