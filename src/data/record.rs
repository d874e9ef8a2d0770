//! Transaction record model and canonical column names.

use chrono::NaiveDateTime;

/// Canonical column names used after the loader's rename step.
pub mod columns {
    pub const TRANSACTION_ID: &str = "transaction_id";
    pub const CUSTOMER_ID: &str = "customer_id";
    pub const PRODUCT: &str = "product";
    pub const QUANTITY: &str = "quantity";
    pub const UNIT_PRICE: &str = "unit_price";
    pub const TIMESTAMP: &str = "timestamp";
    /// Derived: copy of `PRODUCT`
    pub const CATEGORY: &str = "category";
    /// Derived: `QUANTITY * UNIT_PRICE`
    pub const REVENUE: &str = "revenue";
}

/// One cleaned line item.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionRecord {
    pub transaction_id: String,
    pub customer_id: i64,
    pub product: String,
    pub quantity: i64,
    pub unit_price: f64,
    pub timestamp: NaiveDateTime,
    /// Same value as `product`; the source data has no category taxonomy.
    pub category: String,
    pub revenue: f64,
}
