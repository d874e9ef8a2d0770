//! Run configuration.
//! Settings come from an optional JSON file and are then overridden by CLI flags.

use clap::ValueEnum;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::data::columns;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Character encoding of the input file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Encoding {
    /// UTF-8 when the bytes are valid UTF-8, Latin-1 otherwise
    #[default]
    Auto,
    Utf8,
    /// ISO-8859-1
    Latin1,
}

/// Accepted source header names for every canonical column.
///
/// The first header (case-insensitive, trimmed) that matches an alias wins.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ColumnMapping {
    pub transaction_id: Vec<String>,
    pub customer_id: Vec<String>,
    pub product: Vec<String>,
    pub quantity: Vec<String>,
    pub unit_price: Vec<String>,
    pub timestamp: Vec<String>,
}

fn aliases(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

impl Default for ColumnMapping {
    fn default() -> Self {
        Self {
            transaction_id: aliases(&["InvoiceNo", "Invoice", "TransactionID", "transaction_id"]),
            customer_id: aliases(&["CustomerID", "Customer ID", "customer_id"]),
            product: aliases(&["Description", "Product", "product"]),
            quantity: aliases(&["Quantity", "quantity"]),
            unit_price: aliases(&["UnitPrice", "Price", "unit_price"]),
            timestamp: aliases(&["InvoiceDate", "Timestamp", "timestamp"]),
        }
    }
}

impl ColumnMapping {
    /// Canonical column name paired with its accepted aliases.
    pub fn entries(&self) -> [(&'static str, &[String]); 6] {
        [
            (columns::TRANSACTION_ID, self.transaction_id.as_slice()),
            (columns::CUSTOMER_ID, self.customer_id.as_slice()),
            (columns::PRODUCT, self.product.as_slice()),
            (columns::QUANTITY, self.quantity.as_slice()),
            (columns::UNIT_PRICE, self.unit_price.as_slice()),
            (columns::TIMESTAMP, self.timestamp.as_slice()),
        ]
    }
}

/// Everything a single pipeline run needs.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub input: PathBuf,
    pub output_dir: PathBuf,
    pub encoding: Encoding,
    pub delimiter: char,
    pub columns: ColumnMapping,
    /// Extra strptime formats tried before the built-in ones
    pub timestamp_formats: Vec<String>,
    pub top_products: usize,
    pub top_customers: usize,
    /// Slices shown individually in the category donut before folding into "Other"
    pub pie_categories: usize,
    pub chart_width: u32,
    pub chart_height: u32,
    pub open_charts: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::from("data.csv"),
            output_dir: PathBuf::from("charts"),
            encoding: Encoding::Auto,
            delimiter: ',',
            columns: ColumnMapping::default(),
            timestamp_formats: Vec::new(),
            top_products: 5,
            top_customers: 5,
            pie_categories: 10,
            chart_width: 1000,
            chart_height: 600,
            open_charts: false,
        }
    }
}

impl PipelineConfig {
    /// Load a JSON config file. Missing keys fall back to defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.top_products == 0 || self.top_customers == 0 {
            return Err(ConfigError::Invalid(
                "top_products and top_customers must be at least 1".to_string(),
            ));
        }
        if self.pie_categories == 0 {
            return Err(ConfigError::Invalid(
                "pie_categories must be at least 1".to_string(),
            ));
        }
        if self.chart_width == 0 || self.chart_height == 0 {
            return Err(ConfigError::Invalid(
                "chart dimensions must be non-zero".to_string(),
            ));
        }
        if !self.delimiter.is_ascii() {
            return Err(ConfigError::Invalid(format!(
                "delimiter {:?} is not a single ASCII character",
                self.delimiter
            )));
        }
        for (canonical, names) in self.columns.entries() {
            if names.is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "no source header aliases given for column '{}'",
                    canonical
                )));
            }
        }
        Ok(())
    }
}
