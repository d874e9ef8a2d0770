//! Crate-level error type.
//!
//! Each pipeline stage owns a `thiserror` enum describing its own failures;
//! `PipelineError` folds them together so library callers only handle one type.

use thiserror::Error;

use crate::charts::ChartError;
use crate::config::ConfigError;
use crate::data::{CleanerError, LoaderError};
use crate::stats::AggregateError;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Load(#[from] LoaderError),
    #[error(transparent)]
    Clean(#[from] CleanerError),
    #[error(transparent)]
    Aggregate(#[from] AggregateError),
    #[error(transparent)]
    Chart(#[from] ChartError),
}

/// Result alias used by the library API.
pub type Result<T> = std::result::Result<T, PipelineError>;
