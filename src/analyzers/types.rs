//! Data types produced by the aggregation pipeline.

use serde::Serialize;

use crate::records::GroupId;

/// Coverage-day range used to stratify pending order value.
///
/// Ranges are half-open: `[0, 15)`, `[15, 30)`, `[30, 45)`, `[45, 60)`,
/// `[60, ∞)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Bucket {
    UpTo15,
    UpTo30,
    UpTo45,
    UpTo60,
    Over60,
}

impl Bucket {
    pub const ALL: [Bucket; 5] = [
        Bucket::UpTo15,
        Bucket::UpTo30,
        Bucket::UpTo45,
        Bucket::UpTo60,
        Bucket::Over60,
    ];

    /// Returns the bucket for `days`, or `None` for negative or NaN input.
    pub fn for_days(days: f64) -> Option<Self> {
        match days {
            d if d.is_nan() || d < 0.0 => None,
            d if d < 15.0 => Some(Bucket::UpTo15),
            d if d < 30.0 => Some(Bucket::UpTo30),
            d if d < 45.0 => Some(Bucket::UpTo45),
            d if d < 60.0 => Some(Bucket::UpTo60),
            _ => Some(Bucket::Over60),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Bucket::UpTo15 => "0-15 dias",
            Bucket::UpTo30 => "16-30 dias",
            Bucket::UpTo45 => "31-45 dias",
            Bucket::UpTo60 => "46-60 dias",
            Bucket::Over60 => "Mais de 60 dias",
        }
    }

    /// Column position in bucket tables.
    pub fn index(self) -> usize {
        self as usize
    }
}

/// Coverage statistics for one group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoverageRow {
    pub group_id: GroupId,
    pub weighted_mean_days: f64,
    pub simple_mean_days: f64,
    pub total_pending_balance: f64,
}

/// Per-group coverage statistics, ordered by group id.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CoverageSummary {
    pub rows: Vec<CoverageRow>,
}

/// Pending balance per bucket for one group, plus the row total.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BucketRow {
    pub group_id: GroupId,
    pub values: [f64; 5],
    pub total: f64,
}

impl BucketRow {
    pub fn value(&self, bucket: Bucket) -> f64 {
        self.values[bucket.index()]
    }
}

/// Group × bucket sums of pending order balance.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BucketTable {
    pub rows: Vec<BucketRow>,
}

/// Bucket shares of one group's total, in percent.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PercentRow {
    pub group_id: GroupId,
    pub percents: [f64; 5],
}

impl PercentRow {
    pub fn percent(&self, bucket: Bucket) -> f64 {
        self.percents[bucket.index()]
    }
}

/// [`BucketTable`] normalized row-wise; has no total column.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PercentTable {
    pub rows: Vec<PercentRow>,
}
