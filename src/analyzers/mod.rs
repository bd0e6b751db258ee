//! Coverage aggregation.
//!
//! This module groups filtered inventory records by branch, computes
//! coverage means and pending balance totals, cross-tabulates pending
//! balance by coverage bucket, and normalizes bucket sums to percentages.

pub mod aggregate;
pub mod buckets;
pub mod percent;
pub mod types;
pub mod utility;
