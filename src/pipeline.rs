//! Load -> clean -> aggregate -> plot, once per run.
//! Any stage failure aborts the run; there is no partial output.

use std::path::PathBuf;
use std::time::Instant;
use tracing::{debug, info};

use crate::charts::StaticChartRenderer;
use crate::config::PipelineConfig;
use crate::data::{CleaningReport, DataCleaner, DataLoader};
use crate::stats::{Aggregates, SalesAggregator};
use crate::Result;

/// Everything a successful run produced.
#[derive(Debug)]
pub struct PipelineOutput {
    pub report: CleaningReport,
    pub aggregates: Aggregates,
    pub charts: Vec<PathBuf>,
}

/// Load, clean and aggregate without rendering.
pub fn analyze(config: &PipelineConfig) -> Result<(CleaningReport, Aggregates)> {
    config.validate()?;

    let start = Instant::now();
    let raw = DataLoader::from_config(config).load_csv(&config.input)?;
    debug!("Load: {:.2}s", start.elapsed().as_secs_f64());

    let start = Instant::now();
    let (transactions, report) = DataCleaner::new()
        .with_timestamp_formats(&config.timestamp_formats)
        .clean(&raw)?;
    debug!("Clean: {:.2}s", start.elapsed().as_secs_f64());

    let start = Instant::now();
    let aggregates = SalesAggregator::new()
        .with_top_products(config.top_products)
        .with_top_customers(config.top_customers)
        .aggregate(&transactions)?;
    debug!("Aggregate: {:.2}s", start.elapsed().as_secs_f64());

    Ok((report, aggregates))
}

/// Full run: analyze, then write the three charts.
pub fn run(config: &PipelineConfig) -> Result<PipelineOutput> {
    info!("Analyzing {}", config.input.display());
    let (report, aggregates) = analyze(config)?;

    let start = Instant::now();
    let charts = StaticChartRenderer::from_config(config).render_all(&aggregates)?;
    debug!("Render: {:.2}s", start.elapsed().as_secs_f64());

    Ok(PipelineOutput {
        report,
        aggregates,
        charts,
    })
}
