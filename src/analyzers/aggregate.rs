use crate::analyzers::types::{CoverageRow, CoverageSummary};
use crate::analyzers::utility::{mean, round2, weighted_mean};
use crate::records::{GroupId, ValidRecord};
use std::collections::BTreeMap;
use tracing::debug;

/// Per-group series collected in one pass over the records.
#[derive(Default)]
struct GroupSeries {
    coverage: Vec<f64>,
    weighted: Vec<(f64, Option<f64>)>,
    pending_total: f64,
}

/// Aggregates filtered records into a [`CoverageSummary`].
///
/// For each group computes the stock-value weighted mean of coverage days,
/// the simple mean, and the pending balance total, all rounded to 2
/// decimals. When the weighted mean cannot be computed (missing stock value,
/// zero total stock value) it is reported as 0 rather than failing the run.
pub fn aggregate_coverage(records: &[ValidRecord]) -> CoverageSummary {
    let mut groups: BTreeMap<&GroupId, GroupSeries> = BTreeMap::new();

    for record in records {
        let series = groups.entry(&record.group_id).or_default();
        series.coverage.push(record.coverage_days);
        series
            .weighted
            .push((record.coverage_days, record.stock_value));
        series.pending_total += record.pending_order_balance;
    }

    let rows = groups
        .into_iter()
        .map(|(group_id, series)| {
            let weighted_mean_days = weighted_mean(&series.weighted).unwrap_or_else(|| {
                debug!(group = %group_id, "Weighted mean undefined, using 0");
                0.0
            });

            CoverageRow {
                group_id: group_id.clone(),
                weighted_mean_days: round2(weighted_mean_days),
                simple_mean_days: round2(mean(&series.coverage)),
                total_pending_balance: round2(series.pending_total),
            }
        })
        .collect();

    CoverageSummary { rows }
}
