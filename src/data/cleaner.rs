//! Data Cleaner Module
//! Filters out unusable line items, coerces types and derives category and revenue.
//!
//! Steps run in a fixed order; later filters rely on the typed columns produced by
//! earlier ones:
//! 1. drop rows without a customer id
//! 2. coerce customer id to an integer
//! 3. parse the timestamp (fatal on failure)
//! 4. drop non-positive quantities (returns / cancellations)
//! 5. drop non-positive unit prices
//! 6. category := product
//! 7. revenue := quantity * unit price

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use polars::prelude::*;
use thiserror::Error;
use tracing::{debug, info};

use super::record::{columns::*, TransactionRecord};

#[derive(Error, Debug)]
pub enum CleanerError {
    #[error("Polars error: {0}")]
    PolarsError(#[from] PolarsError),
    #[error("Invalid customer id '{0}'")]
    InvalidCustomerId(String),
    /// `row` is the 1-based data row of the input file, header excluded.
    #[error("Unparseable timestamp '{value}' in data row {row}")]
    InvalidTimestamp { row: usize, value: String },
    #[error("Row {0} of the cleaned set has no usable timestamp")]
    MissingTimestamp(usize),
    #[error("Invalid {column} value '{value}'")]
    InvalidNumber { column: &'static str, value: String },
    #[error("No rows remain after cleaning")]
    NoRowsRemaining,
}

/// Formats tried after any user-supplied ones.
pub const DEFAULT_TIMESTAMP_FORMATS: [&str; 6] = [
    "%m/%d/%Y %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%d-%m-%Y %H:%M",
];

/// Row counts for each exclusion rule. Exclusions are expected noise, not errors.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleaningReport {
    pub input_rows: usize,
    pub missing_customer: usize,
    pub non_positive_quantity: usize,
    pub non_positive_price: usize,
    pub kept: usize,
}

/// The cleaned working set. Read-only once built.
#[derive(Debug, Clone)]
pub struct Transactions {
    df: DataFrame,
}

impl Transactions {
    pub fn dataframe(&self) -> &DataFrame {
        &self.df
    }

    pub fn len(&self) -> usize {
        self.df.height()
    }

    pub fn is_empty(&self) -> bool {
        self.df.height() == 0
    }

    /// Materialize typed rows.
    pub fn records(&self) -> Result<Vec<TransactionRecord>, CleanerError> {
        let df = &self.df;
        let transaction_ids = df.column(TRANSACTION_ID)?.str()?;
        let customer_ids = df.column(CUSTOMER_ID)?.i64()?;
        let products = df.column(PRODUCT)?.str()?;
        let quantities = df.column(QUANTITY)?.i64()?;
        let prices = df.column(UNIT_PRICE)?.f64()?;
        let millis = df.column(TIMESTAMP)?.cast(&DataType::Int64)?;
        let millis = millis.i64()?;
        let categories = df.column(CATEGORY)?.str()?;
        let revenues = df.column(REVENUE)?.f64()?;

        let mut records = Vec::with_capacity(df.height());
        for i in 0..df.height() {
            let timestamp = millis
                .get(i)
                .and_then(DateTime::from_timestamp_millis)
                .map(|dt| dt.naive_utc())
                .ok_or(CleanerError::MissingTimestamp(i))?;
            records.push(TransactionRecord {
                transaction_id: transaction_ids.get(i).unwrap_or_default().to_string(),
                customer_id: customer_ids.get(i).unwrap_or_default(),
                product: products.get(i).unwrap_or_default().to_string(),
                quantity: quantities.get(i).unwrap_or_default(),
                unit_price: prices.get(i).unwrap_or_default(),
                timestamp,
                category: categories.get(i).unwrap_or_default().to_string(),
                revenue: revenues.get(i).unwrap_or_default(),
            });
        }
        Ok(records)
    }
}

/// Cleans raw loader output into `Transactions`.
pub struct DataCleaner {
    timestamp_formats: Vec<String>,
}

impl Default for DataCleaner {
    fn default() -> Self {
        Self::new()
    }
}

impl DataCleaner {
    pub fn new() -> Self {
        Self {
            timestamp_formats: DEFAULT_TIMESTAMP_FORMATS
                .iter()
                .map(|f| f.to_string())
                .collect(),
        }
    }

    /// Extra formats are tried before the defaults.
    pub fn with_timestamp_formats(mut self, formats: &[String]) -> Self {
        let mut all = formats.to_vec();
        all.append(&mut self.timestamp_formats);
        self.timestamp_formats = all;
        self
    }

    pub fn clean(&self, raw: &DataFrame) -> Result<(Transactions, CleaningReport), CleanerError> {
        let mut report = CleaningReport {
            input_rows: raw.height(),
            ..Default::default()
        };

        // 1. missing customer
        let present: BooleanChunked = raw
            .column(CUSTOMER_ID)?
            .str()?
            .into_iter()
            .map(|v| v.is_some_and(|s| !s.trim().is_empty()))
            .collect();
        let source_rows: Vec<usize> = present
            .into_iter()
            .enumerate()
            .filter_map(|(i, keep)| keep.unwrap_or(false).then_some(i + 1))
            .collect();
        let mut df = raw.filter(&present)?;
        report.missing_customer = report.input_rows - df.height();
        debug!("Dropped {} rows without customer id", report.missing_customer);

        // 2. customer id -> i64
        let customer_ids = df
            .column(CUSTOMER_ID)?
            .str()?
            .into_iter()
            .map(|v| {
                let value = v.unwrap_or_default();
                parse_integral(value)
                    .ok_or_else(|| CleanerError::InvalidCustomerId(value.to_string()))
            })
            .collect::<Result<Vec<i64>, _>>()?;
        df.with_column(Column::new(CUSTOMER_ID.into(), customer_ids))?;

        // 3. timestamp -> Datetime
        let millis = df
            .column(TIMESTAMP)?
            .str()?
            .into_iter()
            .zip(&source_rows)
            .map(|(v, &row)| {
                let value = v.unwrap_or_default();
                self.parse_timestamp(value)
                    .map(|ts| ts.and_utc().timestamp_millis())
                    .ok_or_else(|| CleanerError::InvalidTimestamp {
                        row,
                        value: value.to_string(),
                    })
            })
            .collect::<Result<Vec<i64>, _>>()?;
        let timestamps = Column::new(TIMESTAMP.into(), millis)
            .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))?;
        df.with_column(timestamps)?;

        // 4. quantity; blanks become null and fall out of the filter
        let quantities = Self::parse_optional(&df, QUANTITY, parse_integral)?;
        df.with_column(Column::new(QUANTITY.into(), quantities))?;

        let before = df.height();
        let mut df = df.lazy().filter(col(QUANTITY).gt(lit(0))).collect()?;
        report.non_positive_quantity = before - df.height();
        debug!("Dropped {} rows with non-positive quantity", report.non_positive_quantity);

        // 5. price, only on rows that survived step 4
        let prices = Self::parse_optional(&df, UNIT_PRICE, |s| {
            s.parse::<f64>().ok().filter(|p| p.is_finite())
        })?;
        df.with_column(Column::new(UNIT_PRICE.into(), prices))?;

        let before = df.height();
        let df = df.lazy().filter(col(UNIT_PRICE).gt(lit(0.0))).collect()?;
        report.non_positive_price = before - df.height();
        debug!("Dropped {} rows with non-positive unit price", report.non_positive_price);

        // 6./7. derived fields
        let df = df
            .lazy()
            .with_columns([
                col(PRODUCT).alias(CATEGORY),
                (col(QUANTITY).cast(DataType::Float64) * col(UNIT_PRICE)).alias(REVENUE),
            ])
            .collect()?;

        report.kept = df.height();
        info!(
            "Cleaned {} -> {} rows ({} no customer, {} bad quantity, {} bad price)",
            report.input_rows,
            report.kept,
            report.missing_customer,
            report.non_positive_quantity,
            report.non_positive_price
        );

        if df.height() == 0 {
            return Err(CleanerError::NoRowsRemaining);
        }
        Ok((Transactions { df }, report))
    }

    fn parse_timestamp(&self, raw: &str) -> Option<NaiveDateTime> {
        let value = raw.trim();
        if value.is_empty() {
            return None;
        }
        self.timestamp_formats
            .iter()
            .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
            .or_else(|| {
                DateTime::parse_from_rfc3339(value)
                    .ok()
                    .map(|dt| dt.naive_utc())
            })
            .or_else(|| {
                NaiveDate::parse_from_str(value, "%Y-%m-%d")
                    .ok()
                    .and_then(|d| d.and_hms_opt(0, 0, 0))
            })
    }

    /// Parse a text column where blanks mean "missing" and anything else must parse.
    fn parse_optional<T>(
        df: &DataFrame,
        column: &'static str,
        parse: impl Fn(&str) -> Option<T>,
    ) -> Result<Vec<Option<T>>, CleanerError> {
        df.column(column)?
            .str()?
            .into_iter()
            .map(|v| match v.map(str::trim) {
                None | Some("") => Ok(None),
                Some(s) => parse(s).map(Some).ok_or_else(|| CleanerError::InvalidNumber {
                    column,
                    value: s.to_string(),
                }),
            })
            .collect()
    }
}

/// Accepts `17850` as well as float-formatted exports such as `17850.0`.
fn parse_integral(raw: &str) -> Option<i64> {
    let s = raw.trim();
    if let Ok(v) = s.parse::<i64>() {
        return Some(v);
    }
    let f = s.parse::<f64>().ok()?;
    if f.is_finite() && f.fract() == 0.0 && f.abs() < i64::MAX as f64 {
        Some(f as i64)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::raw_frame;

    #[test]
    fn test_clean_enforces_postconditions() {
        let raw = raw_frame(&[
            ("A", Some("1"), "MUG", "2", "5.0", "12/1/2010 8:26"),
            ("A", Some("1"), "JUG", "1", "3.0", "12/1/2010 8:26"),
            ("B", None, "MUG", "4", "2.0", "12/1/2010 9:00"),
            ("C", Some("2"), "MUG", "0", "2.0", "12/1/2010 9:00"),
            ("C536379", Some("2"), "MUG", "-3", "2.0", "12/1/2010 9:00"),
            ("D", Some("3"), "MUG", "4", "0", "12/1/2010 9:00"),
            ("E", Some("4"), "BOWL", "4", "2.0", "12/2/2010 10:15"),
        ]);

        let (tx, report) = DataCleaner::new().clean(&raw).unwrap();
        assert_eq!(
            report,
            CleaningReport {
                input_rows: 7,
                missing_customer: 1,
                non_positive_quantity: 2,
                non_positive_price: 1,
                kept: 3,
            }
        );

        let records = tx.records().unwrap();
        assert_eq!(records.len(), 3);
        for r in &records {
            assert!(r.quantity > 0);
            assert!(r.unit_price > 0.0);
            assert_eq!(r.category, r.product);
            assert_eq!(r.revenue, r.quantity as f64 * r.unit_price);
        }
        assert_eq!(records[0].customer_id, 1);
        assert_eq!(records[0].revenue, 10.0);
        assert_eq!(records[2].customer_id, 4);
    }

    #[test]
    fn test_float_customer_ids_are_coerced() {
        let raw = raw_frame(&[("A", Some("17850.0"), "MUG", "1", "1.0", "2010-12-01 08:26:00")]);
        let (tx, _) = DataCleaner::new().clean(&raw).unwrap();
        assert_eq!(tx.records().unwrap()[0].customer_id, 17850);
    }

    #[test]
    fn test_blank_customer_is_dropped() {
        let raw = raw_frame(&[
            ("A", Some("  "), "MUG", "1", "1.0", "12/1/2010 8:26"),
            ("B", Some("7"), "MUG", "1", "1.0", "12/1/2010 8:26"),
        ]);
        let (tx, report) = DataCleaner::new().clean(&raw).unwrap();
        assert_eq!(tx.len(), 1);
        assert_eq!(report.missing_customer, 1);
    }

    #[test]
    fn test_bad_timestamp_is_fatal() {
        let raw = raw_frame(&[
            ("A", Some("1"), "MUG", "1", "1.0", "12/1/2010 8:26"),
            ("G", None, "MUG", "1", "1.0", "12/1/2010 8:26"),
            ("B", Some("2"), "MUG", "1", "1.0", "yesterday"),
        ]);
        match DataCleaner::new().clean(&raw) {
            // the dropped guest row still counts towards the data row number
            Err(CleanerError::InvalidTimestamp { row, value }) => {
                assert_eq!(row, 3);
                assert_eq!(value, "yesterday");
            }
            other => panic!("expected timestamp error, got {other:?}"),
        }
    }

    #[test]
    fn test_blank_timestamp_is_fatal() {
        let raw = raw_frame(&[("A", Some("1"), "MUG", "1", "1.0", "  ")]);
        assert!(matches!(
            DataCleaner::new().clean(&raw),
            Err(CleanerError::InvalidTimestamp { row: 1, .. })
        ));
    }

    #[test]
    fn test_date_only_timestamp_is_midnight() {
        let raw = raw_frame(&[("A", Some("1"), "MUG", "1", "1.0", "2010-12-01")]);
        let (tx, _) = DataCleaner::new().clean(&raw).unwrap();
        let ts = tx.records().unwrap()[0].timestamp;
        assert_eq!(ts.to_string(), "2010-12-01 00:00:00");
    }

    #[test]
    fn test_timestamp_checked_before_quantity_filter() {
        // the row would be dropped as a return, but parsing happens first
        let raw = raw_frame(&[("A", Some("1"), "MUG", "-1", "1.0", "not a date")]);
        assert!(matches!(
            DataCleaner::new().clean(&raw),
            Err(CleanerError::InvalidTimestamp { .. })
        ));
    }

    #[test]
    fn test_custom_timestamp_format() {
        let raw = raw_frame(&[("A", Some("1"), "MUG", "1", "1.0", "01.12.2010 08:26")]);
        assert!(DataCleaner::new().clean(&raw).is_err());

        let cleaner = DataCleaner::new().with_timestamp_formats(&["%d.%m.%Y %H:%M".to_string()]);
        let (tx, _) = cleaner.clean(&raw).unwrap();
        let ts = tx.records().unwrap()[0].timestamp;
        assert_eq!(ts.to_string(), "2010-12-01 08:26:00");
    }

    #[test]
    fn test_non_numeric_quantity_is_fatal() {
        let raw = raw_frame(&[("A", Some("1"), "MUG", "two", "1.0", "12/1/2010 8:26")]);
        assert!(matches!(
            DataCleaner::new().clean(&raw),
            Err(CleanerError::InvalidNumber { column: QUANTITY, .. })
        ));
    }

    #[test]
    fn test_non_numeric_price_is_fatal() {
        let raw = raw_frame(&[("A", Some("1"), "MUG", "1", "N/A", "12/1/2010 8:26")]);
        match DataCleaner::new().clean(&raw) {
            Err(CleanerError::InvalidNumber { column, value }) => {
                assert_eq!(column, UNIT_PRICE);
                assert_eq!(value, "N/A");
            }
            other => panic!("expected price error, got {other:?}"),
        }
    }

    #[test]
    fn test_return_with_bad_price_is_dropped() {
        let raw = raw_frame(&[
            ("A", Some("1"), "MUG", "1", "1.0", "12/1/2010 8:26"),
            ("C2", Some("1"), "MUG", "-1", "N/A", "12/1/2010 8:26"),
        ]);
        let (tx, report) = DataCleaner::new().clean(&raw).unwrap();
        assert_eq!(tx.len(), 1);
        assert_eq!(report.non_positive_quantity, 1);
        assert_eq!(report.non_positive_price, 0);
    }

    #[test]
    fn test_non_finite_price_is_fatal() {
        for price in ["inf", "-infinity", "NaN"] {
            let raw = raw_frame(&[("A", Some("1"), "MUG", "1", price, "12/1/2010 8:26")]);
            assert!(
                matches!(
                    DataCleaner::new().clean(&raw),
                    Err(CleanerError::InvalidNumber { column: UNIT_PRICE, .. })
                ),
                "price {price} accepted"
            );
        }
    }

    #[test]
    fn test_blank_quantity_and_price_are_dropped() {
        let raw = raw_frame(&[
            ("A", Some("1"), "MUG", "", "1.0", "12/1/2010 8:26"),
            ("B", Some("1"), "MUG", "2", " ", "12/1/2010 8:26"),
            ("C", Some("1"), "JUG", "3", "2.0", "12/1/2010 8:26"),
        ]);
        let (tx, report) = DataCleaner::new().clean(&raw).unwrap();
        assert_eq!(tx.len(), 1);
        assert_eq!(report.non_positive_quantity, 1);
        assert_eq!(report.non_positive_price, 1);
        assert_eq!(tx.records().unwrap()[0].product, "JUG");
    }

    #[test]
    fn test_everything_dropped() {
        let raw = raw_frame(&[("A", None, "MUG", "1", "1.0", "12/1/2010 8:26")]);
        assert!(matches!(
            DataCleaner::new().clean(&raw),
            Err(CleanerError::NoRowsRemaining)
        ));
    }

    #[test]
    fn test_parse_integral() {
        assert_eq!(parse_integral("12"), Some(12));
        assert_eq!(parse_integral(" 12.0 "), Some(12));
        assert_eq!(parse_integral("12.5"), None);
        assert_eq!(parse_integral("abc"), None);
    }
}
