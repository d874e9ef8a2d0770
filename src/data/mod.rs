//! Data module - CSV loading and cleaning

mod cleaner;
mod loader;
mod record;

pub use cleaner::{CleanerError, CleaningReport, DataCleaner, Transactions};
pub use loader::{decode_bytes, DataLoader, LoaderError};
pub use record::{columns, TransactionRecord};
