//! Retail Insights - transaction cleaning, aggregation & chart report
//!
//! Exits non-zero when any stage fails; a missing input file aborts before anything else runs.

use anyhow::{Context, Result};
use clap::Parser;
use retail_insights::{charts, pipeline, summary, Args};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter directives: RUST_LOG wins over the flags when set.
fn log_directives(args: &Args, rust_log: Option<String>) -> String {
    match rust_log.filter(|d| !d.trim().is_empty()) {
        Some(directives) => directives,
        None if args.quiet => "warn".to_string(),
        None if args.verbose => "retail_insights=debug".to_string(),
        None => "retail_insights=info".to_string(),
    }
}

fn init_logging(args: &Args) {
    let directives = log_directives(args, std::env::var(EnvFilter::DEFAULT_ENV).ok());
    let filter =
        EnvFilter::try_new(&directives).unwrap_or_else(|_| EnvFilter::new("retail_insights=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args);

    let config = args.to_config().context("Invalid configuration")?;
    let output = pipeline::run(&config)
        .with_context(|| format!("Analysis of {} failed", config.input.display()))?;

    summary::print_summary(&output.report, &output.aggregates);
    for path in &output.charts {
        println!("Chart saved to: {}", path.display());
    }
    info!("Done: {} charts in {}", output.charts.len(), config.output_dir.display());

    if config.open_charts {
        charts::open_charts(&output.charts);
    }
    Ok(())
}
