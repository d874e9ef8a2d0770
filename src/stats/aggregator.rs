//! Sales Aggregator Module
//! Grouped reductions over the cleaned transactions: top products, category revenue
//! and customer purchase frequency.
//!
//! Grouping is stable (first appearance) and the descending sort maintains order,
//! so ties always resolve to whichever group appeared first in the cleaned data.

use chrono::{DateTime, NaiveDateTime};
use polars::prelude::*;
use thiserror::Error;
use tracing::info;

use crate::data::{columns::*, Transactions};

#[derive(Error, Debug)]
pub enum AggregateError {
    #[error("Polars error: {0}")]
    PolarsError(#[from] PolarsError),
}

const TOTAL_QUANTITY: &str = "total_quantity";
const TOTAL_REVENUE: &str = "total_revenue";
const FREQUENCY: &str = "frequency";

/// Label used when a product/category value is missing.
///
/// Missing values group separately from a product literally named `(unknown)`;
/// the two rows then share this label in summaries and charts.
pub const UNKNOWN_LABEL: &str = "(unknown)";

#[derive(Debug, Clone, PartialEq)]
pub struct ProductQuantity {
    pub product: String,
    pub quantity: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CategoryRevenue {
    pub category: String,
    pub revenue: f64,
}

impl CategoryRevenue {
    /// The export has no category taxonomy; the product description stands in for it.
    pub const NOTE: &'static str = "category is approximated by product description";
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomerFrequency {
    pub customer_id: i64,
    /// Distinct transactions, not line items
    pub frequency: u64,
}

/// Headline numbers for the cleaned working set.
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetSummary {
    pub rows: usize,
    pub transactions: usize,
    pub customers: usize,
    pub products: usize,
    pub total_revenue: f64,
    pub first_timestamp: Option<NaiveDateTime>,
    pub last_timestamp: Option<NaiveDateTime>,
}

/// All aggregates of one run.
#[derive(Debug, Clone, PartialEq)]
pub struct Aggregates {
    pub top_products: Vec<ProductQuantity>,
    pub category_revenue: Vec<CategoryRevenue>,
    pub top_customers: Vec<CustomerFrequency>,
    pub summary: DatasetSummary,
}

fn descending() -> SortMultipleOptions {
    SortMultipleOptions::default()
        .with_order_descending(true)
        .with_maintain_order(true)
}

/// Polars row limit; `n` beyond `IdxSize::MAX` means "everything".
fn row_limit(n: usize) -> IdxSize {
    IdxSize::try_from(n).unwrap_or(IdxSize::MAX)
}

fn labels(df: &DataFrame, column: &str) -> Result<Vec<String>, AggregateError> {
    Ok(df
        .column(column)?
        .str()?
        .into_iter()
        .map(|v| v.unwrap_or(UNKNOWN_LABEL).to_string())
        .collect())
}

/// Computes the grouped summaries. Every method is a pure function of its input.
pub struct SalesAggregator {
    top_products: usize,
    top_customers: usize,
}

impl Default for SalesAggregator {
    fn default() -> Self {
        Self::new()
    }
}

impl SalesAggregator {
    pub fn new() -> Self {
        Self {
            top_products: 5,
            top_customers: 5,
        }
    }

    pub fn with_top_products(mut self, n: usize) -> Self {
        self.top_products = n;
        self
    }

    pub fn with_top_customers(mut self, n: usize) -> Self {
        self.top_customers = n;
        self
    }

    /// Run all three reductions plus the dataset summary.
    pub fn aggregate(&self, transactions: &Transactions) -> Result<Aggregates, AggregateError> {
        let aggregates = Aggregates {
            top_products: Self::top_products(transactions, self.top_products)?,
            category_revenue: Self::revenue_by_category(transactions)?,
            top_customers: Self::top_customers(transactions, self.top_customers)?,
            summary: Self::summarize(transactions)?,
        };
        info!(
            "Aggregated {} products, {} categories, {} customers",
            aggregates.top_products.len(),
            aggregates.category_revenue.len(),
            aggregates.top_customers.len()
        );
        Ok(aggregates)
    }

    /// Sum quantity per product, descending, first `n`.
    pub fn top_products(
        transactions: &Transactions,
        n: usize,
    ) -> Result<Vec<ProductQuantity>, AggregateError> {
        let df = transactions
            .dataframe()
            .clone()
            .lazy()
            .group_by_stable([col(PRODUCT)])
            .agg([col(QUANTITY).sum().alias(TOTAL_QUANTITY)])
            .sort([TOTAL_QUANTITY], descending())
            .limit(row_limit(n))
            .collect()?;

        let products = labels(&df, PRODUCT)?;
        let totals = df.column(TOTAL_QUANTITY)?.i64()?;

        Ok(products
            .into_iter()
            .zip(totals.into_iter())
            .map(|(product, quantity)| ProductQuantity {
                product,
                quantity: quantity.unwrap_or_default(),
            })
            .collect())
    }

    /// Sum revenue per category, descending. All categories are kept.
    pub fn revenue_by_category(
        transactions: &Transactions,
    ) -> Result<Vec<CategoryRevenue>, AggregateError> {
        let df = transactions
            .dataframe()
            .clone()
            .lazy()
            .group_by_stable([col(CATEGORY)])
            .agg([col(REVENUE).sum().alias(TOTAL_REVENUE)])
            .sort([TOTAL_REVENUE], descending())
            .collect()?;

        let categories = labels(&df, CATEGORY)?;
        let totals = df.column(TOTAL_REVENUE)?.f64()?;

        Ok(categories
            .into_iter()
            .zip(totals.into_iter())
            .map(|(category, revenue)| CategoryRevenue {
                category,
                revenue: revenue.unwrap_or_default(),
            })
            .collect())
    }

    /// Count distinct transactions per customer, descending, first `n`.
    pub fn top_customers(
        transactions: &Transactions,
        n: usize,
    ) -> Result<Vec<CustomerFrequency>, AggregateError> {
        let df = transactions
            .dataframe()
            .clone()
            .lazy()
            .group_by_stable([col(CUSTOMER_ID)])
            .agg([col(TRANSACTION_ID)
                .n_unique()
                .cast(DataType::UInt64)
                .alias(FREQUENCY)])
            .sort([FREQUENCY], descending())
            .limit(row_limit(n))
            .collect()?;

        let customers = df.column(CUSTOMER_ID)?.i64()?;
        let frequencies = df.column(FREQUENCY)?.u64()?;

        Ok(customers
            .into_iter()
            .zip(frequencies.into_iter())
            .filter_map(|(customer, frequency)| {
                Some(CustomerFrequency {
                    customer_id: customer?,
                    frequency: frequency.unwrap_or_default(),
                })
            })
            .collect())
    }

    pub fn summarize(transactions: &Transactions) -> Result<DatasetSummary, AggregateError> {
        let df = transactions.dataframe();
        let distinct = |column: &str| -> Result<usize, AggregateError> {
            Ok(df.column(column)?.as_materialized_series().n_unique()?)
        };

        let millis = df.column(TIMESTAMP)?.cast(&DataType::Int64)?;
        let millis = millis.i64()?;
        let to_naive = |ms: Option<i64>| {
            ms.and_then(DateTime::from_timestamp_millis)
                .map(|dt| dt.naive_utc())
        };

        Ok(DatasetSummary {
            rows: df.height(),
            transactions: distinct(TRANSACTION_ID)?,
            customers: distinct(CUSTOMER_ID)?,
            products: distinct(PRODUCT)?,
            total_revenue: df.column(REVENUE)?.f64()?.sum().unwrap_or_default(),
            first_timestamp: to_naive(millis.min()),
            last_timestamp: to_naive(millis.max()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::cleaned;

    const TS: &str = "12/1/2010 8:26";

    #[test]
    fn test_same_product_revenue_example() {
        let tx = cleaned(&[
            ("A", Some("1"), "MUG", "2", "5.0", TS),
            ("A", Some("1"), "MUG", "1", "3.0", TS),
            ("B", Some("2"), "JUG", "4", "2.0", TS),
        ]);

        let revenue = SalesAggregator::revenue_by_category(&tx).unwrap();
        assert_eq!(revenue[0].category, "MUG");
        assert_eq!(revenue[0].revenue, 13.0);
        assert_eq!(revenue[1].revenue, 8.0);
    }

    #[test]
    fn test_distinct_product_revenue_example() {
        let tx = cleaned(&[
            ("A", Some("1"), "MUG", "2", "5.0", TS),
            ("A", Some("1"), "JUG", "1", "3.0", TS),
            ("B", Some("2"), "BOWL", "4", "2.0", TS),
        ]);

        let revenue = SalesAggregator::revenue_by_category(&tx).unwrap();
        let get = |name: &str| revenue.iter().find(|r| r.category == name).unwrap().revenue;
        assert_eq!(get("MUG"), 10.0);
        assert_eq!(get("JUG"), 3.0);
        assert_eq!(get("BOWL"), 8.0);

        let customers = SalesAggregator::top_customers(&tx, 5).unwrap();
        assert_eq!(
            customers,
            vec![
                CustomerFrequency { customer_id: 1, frequency: 1 },
                CustomerFrequency { customer_id: 2, frequency: 1 },
            ]
        );
    }

    #[test]
    fn test_frequency_counts_transactions_not_line_items() {
        let mut rows = Vec::new();
        for _ in 0..10 {
            rows.push(("A", Some("1"), "MUG", "1", "1.0", TS));
        }
        rows.push(("B", Some("2"), "MUG", "1", "1.0", TS));
        rows.push(("C", Some("2"), "MUG", "1", "1.0", TS));
        let tx = cleaned(&rows);

        let customers = SalesAggregator::top_customers(&tx, 5).unwrap();
        assert_eq!(customers[0], CustomerFrequency { customer_id: 2, frequency: 2 });
        assert_eq!(customers[1], CustomerFrequency { customer_id: 1, frequency: 1 });
    }

    #[test]
    fn test_top_products_truncates_and_sorts() {
        let tx = cleaned(&[
            ("A", Some("1"), "P1", "1", "1.0", TS),
            ("A", Some("1"), "P2", "7", "1.0", TS),
            ("A", Some("1"), "P3", "3", "1.0", TS),
            ("B", Some("2"), "P4", "9", "1.0", TS),
            ("B", Some("2"), "P5", "2", "1.0", TS),
            ("B", Some("2"), "P6", "5", "1.0", TS),
            ("C", Some("3"), "P1", "6", "1.0", TS),
        ]);

        let top = SalesAggregator::top_products(&tx, 5).unwrap();
        assert_eq!(top.len(), 5);
        let names: Vec<&str> = top.iter().map(|p| p.product.as_str()).collect();
        assert_eq!(names, vec!["P4", "P1", "P2", "P6", "P3"]);
        assert!(top.windows(2).all(|w| w[0].quantity >= w[1].quantity));
        assert_eq!(top[2].quantity, 7);
    }

    #[test]
    fn test_few_products_returns_all() {
        let tx = cleaned(&[
            ("A", Some("1"), "P1", "1", "1.0", TS),
            ("A", Some("1"), "P2", "2", "1.0", TS),
        ]);
        assert_eq!(SalesAggregator::top_products(&tx, 5).unwrap().len(), 2);
    }

    #[test]
    fn test_huge_top_n_returns_all() {
        let tx = cleaned(&[
            ("A", Some("1"), "P1", "1", "1.0", TS),
            ("B", Some("2"), "P2", "2", "1.0", TS),
        ]);
        assert_eq!(SalesAggregator::top_products(&tx, usize::MAX).unwrap().len(), 2);
        assert_eq!(SalesAggregator::top_customers(&tx, usize::MAX).unwrap().len(), 2);
        assert_eq!(row_limit(usize::MAX), IdxSize::MAX);
        assert_eq!(row_limit(3), 3);
    }

    #[test]
    fn test_ties_keep_first_appearance() {
        let tx = cleaned(&[
            ("A", Some("9"), "ZEBRA", "3", "1.0", TS),
            ("B", Some("4"), "APPLE", "3", "1.0", TS),
            ("C", Some("7"), "MANGO", "3", "1.0", TS),
        ]);
        let names: Vec<String> = SalesAggregator::top_products(&tx, 5)
            .unwrap()
            .into_iter()
            .map(|p| p.product)
            .collect();
        assert_eq!(names, vec!["ZEBRA", "APPLE", "MANGO"]);

        let ids: Vec<i64> = SalesAggregator::top_customers(&tx, 5)
            .unwrap()
            .into_iter()
            .map(|c| c.customer_id)
            .collect();
        assert_eq!(ids, vec![9, 4, 7]);
    }

    #[test]
    fn test_dropped_rows_never_contribute() {
        let tx = cleaned(&[
            ("A", Some("1"), "MUG", "2", "1.0", TS),
            ("B", None, "GHOST", "50", "1.0", TS),
            ("C", Some("3"), "RETURNED", "0", "1.0", TS),
        ]);
        let aggregates = SalesAggregator::new().aggregate(&tx).unwrap();
        assert!(aggregates.top_products.iter().all(|p| p.product == "MUG"));
        assert!(aggregates.category_revenue.iter().all(|c| c.category == "MUG"));
        assert_eq!(aggregates.top_customers.len(), 1);
        assert_eq!(aggregates.top_customers[0].customer_id, 1);
    }

    #[test]
    fn test_summary_and_revenue_total() {
        let tx = cleaned(&[
            ("A", Some("1"), "MUG", "2", "2.55", "12/1/2010 8:26"),
            ("A", Some("1"), "JUG", "3", "3.39", "12/1/2010 8:26"),
            ("B", Some("2"), "MUG", "6", "1.85", "12/9/2011 12:50"),
        ]);
        let aggregates = SalesAggregator::new().aggregate(&tx).unwrap();
        let summary = &aggregates.summary;
        assert_eq!(summary.rows, 3);
        assert_eq!(summary.transactions, 2);
        assert_eq!(summary.customers, 2);
        assert_eq!(summary.products, 2);
        assert_eq!(
            summary.first_timestamp.unwrap().to_string(),
            "2010-12-01 08:26:00"
        );
        assert_eq!(
            summary.last_timestamp.unwrap().to_string(),
            "2011-12-09 12:50:00"
        );

        let by_category: f64 = aggregates.category_revenue.iter().map(|c| c.revenue).sum();
        assert!((by_category - summary.total_revenue).abs() < 1e-9);
    }

    #[test]
    fn test_aggregate_is_repeatable() {
        let tx = cleaned(&[
            ("A", Some("1"), "MUG", "2", "0.1", TS),
            ("B", Some("2"), "JUG", "2", "0.2", TS),
            ("C", Some("2"), "MUG", "1", "0.3", TS),
        ]);
        let aggregator = SalesAggregator::new();
        assert_eq!(
            aggregator.aggregate(&tx).unwrap(),
            aggregator.aggregate(&tx).unwrap()
        );
    }
}
