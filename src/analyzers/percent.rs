use crate::analyzers::types::{BucketTable, PercentRow, PercentTable};
use crate::analyzers::utility::round2;

/// Converts bucket sums into each bucket's share of the group total.
///
/// Shares are rounded to 2 decimals. A group whose total is zero (or not
/// finite) gets 0.00% in every bucket.
pub fn normalize(table: &BucketTable) -> PercentTable {
    let rows = table
        .rows
        .iter()
        .map(|row| {
            let percents = if row.total == 0.0 || !row.total.is_finite() {
                [0.0; 5]
            } else {
                row.values.map(|v| round2(v / row.total * 100.0))
            };
            PercentRow {
                group_id: row.group_id.clone(),
                percents,
            }
        })
        .collect();

    PercentTable { rows }
}
