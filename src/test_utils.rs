//! Shared test utilities for unit tests
//!
//! Integration tests in tests/ go through CSV files instead; they cannot see this
//! module because it only exists under #[cfg(test)].

use polars::prelude::*;

use crate::data::{columns::*, DataCleaner, Transactions};

/// (transaction, customer, product, quantity, unit price, timestamp), all as raw text.
pub type RawRow<'a> = (&'a str, Option<&'a str>, &'a str, &'a str, &'a str, &'a str);

/// Build a frame shaped like the loader's output.
pub fn raw_frame(rows: &[RawRow<'_>]) -> DataFrame {
    let mut transaction_ids = Vec::new();
    let mut customer_ids = Vec::new();
    let mut products = Vec::new();
    let mut quantities = Vec::new();
    let mut prices = Vec::new();
    let mut timestamps = Vec::new();
    for &(txn, customer, product, quantity, price, ts) in rows {
        transaction_ids.push(txn);
        customer_ids.push(customer);
        products.push(product);
        quantities.push(quantity);
        prices.push(price);
        timestamps.push(ts);
    }
    DataFrame::new(vec![
        Column::new(TRANSACTION_ID.into(), transaction_ids),
        Column::new(CUSTOMER_ID.into(), customer_ids),
        Column::new(PRODUCT.into(), products),
        Column::new(QUANTITY.into(), quantities),
        Column::new(UNIT_PRICE.into(), prices),
        Column::new(TIMESTAMP.into(), timestamps),
    ])
    .unwrap()
}

/// Clean `rows` with the default cleaner.
pub fn cleaned(rows: &[RawRow<'_>]) -> Transactions {
    DataCleaner::new().clean(&raw_frame(rows)).unwrap().0
}
