//! Console summaries of each aggregate.
//! Human-readable only; the layout is not a stable interface.

use std::fmt::{self, Write};

use crate::charts::truncate_label;
use crate::data::CleaningReport;
use crate::stats::{Aggregates, CategoryRevenue};

const CATEGORY_ROWS: usize = 10;

/// Write the cleaning counts and all aggregates as plain text.
pub fn write_summary<W: Write>(
    out: &mut W,
    report: &CleaningReport,
    aggregates: &Aggregates,
) -> fmt::Result {
    let s = &aggregates.summary;

    writeln!(out, "=== Dataset ===")?;
    writeln!(
        out,
        "Rows: {} loaded, {} kept ({} without customer, {} non-positive quantity, {} non-positive price)",
        report.input_rows,
        report.kept,
        report.missing_customer,
        report.non_positive_quantity,
        report.non_positive_price
    )?;
    writeln!(
        out,
        "Transactions: {}  Customers: {}  Products: {}",
        s.transactions, s.customers, s.products
    )?;
    writeln!(out, "Total revenue: {:.2}", s.total_revenue)?;
    if let (Some(first), Some(last)) = (s.first_timestamp, s.last_timestamp) {
        writeln!(out, "Period: {} .. {}", first, last)?;
    }

    writeln!(out, "\n=== Top Products by Quantity ===")?;
    for (i, p) in aggregates.top_products.iter().enumerate() {
        writeln!(
            out,
            "  {:>2}. {:<40} {:>10}",
            i + 1,
            truncate_label(&p.product, 40),
            p.quantity
        )?;
    }

    writeln!(out, "\n=== Revenue by Category ===")?;
    writeln!(out, "  ({})", CategoryRevenue::NOTE)?;
    for (i, c) in aggregates.category_revenue.iter().take(CATEGORY_ROWS).enumerate() {
        writeln!(
            out,
            "  {:>2}. {:<40} {:>12.2}",
            i + 1,
            truncate_label(&c.category, 40),
            c.revenue
        )?;
    }
    let remaining = aggregates.category_revenue.len().saturating_sub(CATEGORY_ROWS);
    if remaining > 0 {
        writeln!(out, "  ... {} more categories", remaining)?;
    }

    writeln!(out, "\n=== Top Customers by Purchase Frequency ===")?;
    for (i, c) in aggregates.top_customers.iter().enumerate() {
        writeln!(
            out,
            "  {:>2}. Customer {:<10} {:>6} transactions",
            i + 1,
            c.customer_id,
            c.frequency
        )?;
    }

    Ok(())
}

pub fn format_summary(report: &CleaningReport, aggregates: &Aggregates) -> String {
    let mut out = String::new();
    // writing into a String cannot fail
    let _ = write_summary(&mut out, report, aggregates);
    out
}

pub fn print_summary(report: &CleaningReport, aggregates: &Aggregates) {
    print!("{}", format_summary(report, aggregates));
}
