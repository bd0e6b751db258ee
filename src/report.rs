//! The coverage report pipeline.
//!
//! validate → load records → filter → aggregate → bucketize → normalize

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use crate::analyzers::aggregate::aggregate_coverage;
use crate::analyzers::buckets::bucketize;
use crate::analyzers::percent::normalize;
use crate::analyzers::types::{Bucket, BucketTable, CoverageSummary, PercentTable};
use crate::error::ReportResult;
use crate::parser::{RawTable, load_table};
use crate::records::{filter_records, load_records};
use crate::schema::{ColumnMapping, validate};

/// Everything computed in one run.
#[derive(Debug, Clone, Serialize)]
pub struct CoverageReport {
    pub generated_at: DateTime<Utc>,
    pub rows_read: usize,
    pub rows_used: usize,
    pub rows_excluded: usize,
    /// Column labels for the bucket tables' `values`/`percents` arrays.
    pub buckets: [&'static str; 5],
    pub coverage: CoverageSummary,
    pub absolute: BucketTable,
    pub percentages: PercentTable,
}

/// Runs the pipeline over an already loaded table.
///
/// # Errors
///
/// Fails with a schema error before any row is read when a required column
/// is missing, or with a processing error when a numeric cell is malformed.
#[tracing::instrument(skip_all, fields(rows = table.len()))]
pub fn build_report(table: &RawTable, mapping: &ColumnMapping) -> ReportResult<CoverageReport> {
    let index = validate(table, mapping)?;
    let records = load_records(table, &index)?;
    let rows_read = records.len();

    let outcome = filter_records(records);
    let coverage = aggregate_coverage(&outcome.kept);
    let absolute = bucketize(&outcome.kept);
    let percentages = normalize(&absolute);

    info!(
        groups = coverage.rows.len(),
        rows_used = outcome.kept.len(),
        "Coverage report built"
    );

    Ok(CoverageReport {
        generated_at: Utc::now(),
        rows_read,
        rows_used: outcome.kept.len(),
        rows_excluded: outcome.excluded(),
        buckets: Bucket::ALL.map(Bucket::label),
        coverage,
        absolute,
        percentages,
    })
}

/// Loads `path` and runs the pipeline over it.
pub fn build_report_from_file(
    path: &Path,
    sheet: Option<&str>,
    mapping: &ColumnMapping,
) -> ReportResult<CoverageReport> {
    let table = load_table(path, sheet)?;
    build_report(&table, mapping)
}
