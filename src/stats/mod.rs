//! Stats module - grouped aggregates over cleaned transactions

mod aggregator;

pub use aggregator::{
    AggregateError, Aggregates, CategoryRevenue, CustomerFrequency, DatasetSummary,
    ProductQuantity, SalesAggregator, UNKNOWN_LABEL,
};
