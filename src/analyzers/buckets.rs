use crate::analyzers::types::{Bucket, BucketRow, BucketTable};
use crate::records::{GroupId, ValidRecord};
use std::collections::BTreeMap;
use tracing::warn;

/// Cross-tabulates pending order balance by group and coverage bucket.
///
/// Every group gets all five bucket columns (0.0 when it has no rows in a
/// bucket) plus a total. Sums are kept unrounded. Groups follow the same
/// ordering as [`aggregate_coverage`](crate::analyzers::aggregate::aggregate_coverage).
pub fn bucketize(records: &[ValidRecord]) -> BucketTable {
    let mut groups: BTreeMap<&GroupId, [f64; 5]> = BTreeMap::new();

    for record in records {
        let values = groups.entry(&record.group_id).or_insert([0.0; 5]);
        match Bucket::for_days(record.coverage_days) {
            Some(bucket) => values[bucket.index()] += record.pending_order_balance,
            // Filtered records have positive coverage, so this is unreachable
            // through the pipeline.
            None => warn!(
                group = %record.group_id,
                coverage_days = record.coverage_days,
                "Record outside every bucket"
            ),
        }
    }

    let rows = groups
        .into_iter()
        .map(|(group_id, values)| BucketRow {
            group_id: group_id.clone(),
            total: values.iter().sum(),
            values,
        })
        .collect();

    BucketTable { rows }
}
