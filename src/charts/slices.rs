//! Donut slice preparation.
//! Folding the tail of the category ranking into "Other" only affects the chart;
//! the aggregate itself keeps every category.

use crate::stats::CategoryRevenue;

pub const OTHER_LABEL: &str = "Other";

#[derive(Debug, Clone, PartialEq)]
pub struct Slice {
    pub label: String,
    pub value: f64,
}

/// Keep the first `keep` categories (input is sorted descending) and fold the rest
/// into a single "Other" slice. No "Other" slice when nothing is left over.
pub fn collapse_slices(revenue: &[CategoryRevenue], keep: usize) -> Vec<Slice> {
    let split = keep.min(revenue.len());
    let (head, tail) = revenue.split_at(split);

    let mut slices: Vec<Slice> = head
        .iter()
        .map(|c| Slice {
            label: c.category.clone(),
            value: c.revenue,
        })
        .collect();

    if !tail.is_empty() {
        slices.push(Slice {
            label: OTHER_LABEL.to_string(),
            value: tail.iter().map(|c| c.revenue).sum(),
        });
    }
    slices
}
