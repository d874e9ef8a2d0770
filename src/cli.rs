//! Command-line interface definitions and argument parsing

use clap::Parser;
use std::path::PathBuf;

use crate::config::{ConfigError, Encoding, PipelineConfig};

/// Clean a retail transactions export and chart its top products, category revenue
/// and most frequent customers
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the input CSV file [default: data.csv]
    pub input: Option<PathBuf>,

    /// Directory for the rendered charts [default: charts]
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// JSON configuration file; flags override its values
    #[arg(short, long, env = "RETAIL_INSIGHTS_CONFIG")]
    pub config: Option<PathBuf>,

    /// Input character encoding
    #[arg(long, value_enum)]
    pub encoding: Option<Encoding>,

    /// Field delimiter
    #[arg(long)]
    pub delimiter: Option<char>,

    /// Number of products in the top products chart
    #[arg(long)]
    pub top_products: Option<usize>,

    /// Number of customers in the top customers chart
    #[arg(long)]
    pub top_customers: Option<usize>,

    /// Categories shown individually in the donut before folding into "Other"
    #[arg(long)]
    pub pie_categories: Option<usize>,

    /// Additional strptime format for the timestamp column (repeatable)
    #[arg(long = "timestamp-format")]
    pub timestamp_formats: Vec<String>,

    /// Open the charts with the system viewer after rendering
    #[arg(long)]
    pub open: bool,

    /// Only log warnings and errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    /// Build the run configuration: defaults, then the config file, then flags.
    pub fn to_config(&self) -> Result<PipelineConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => PipelineConfig::from_file(path)?,
            None => PipelineConfig::default(),
        };

        if let Some(input) = &self.input {
            config.input = input.clone();
        }
        if let Some(dir) = &self.output_dir {
            config.output_dir = dir.clone();
        }
        if let Some(encoding) = self.encoding {
            config.encoding = encoding;
        }
        if let Some(delimiter) = self.delimiter {
            config.delimiter = delimiter;
        }
        if let Some(n) = self.top_products {
            config.top_products = n;
        }
        if let Some(n) = self.top_customers {
            config.top_customers = n;
        }
        if let Some(n) = self.pie_categories {
            config.pie_categories = n;
        }
        config
            .timestamp_formats
            .extend(self.timestamp_formats.iter().cloned());
        config.open_charts |= self.open;

        config.validate()?;
        Ok(config)
    }
}
