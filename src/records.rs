//! Typed inventory records and the positivity filter.

use std::cmp::Ordering;
use std::fmt;

use serde::Serialize;
use tracing::{debug, info};

use crate::error::{ReportError, ReportResult};
use crate::parser::{Cell, RawTable};
use crate::schema::ColumnIndex;

/// 2^53: beyond this a float no longer holds every integer exactly.
const MAX_EXACT_INTEGER: f64 = 9_007_199_254_740_992.0;

/// Branch/site identifier.
///
/// Ids that parse as integers sort numerically ahead of all other ids, which
/// sort lexically, so "2" comes before "10".
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct GroupId(String);

impl GroupId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn from_cell(cell: &Cell) -> Option<Self> {
        match cell {
            Cell::Empty => None,
            Cell::Number(n) if n.fract() == 0.0 && n.abs() < MAX_EXACT_INTEGER => {
                Some(Self(format!("{}", *n as i64)))
            }
            Cell::Number(n) => Some(Self(n.to_string())),
            Cell::Text(s) => Some(Self(s.clone())),
        }
    }
}

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Ord for GroupId {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.0.parse::<i64>(), other.0.parse::<i64>()) {
            (Ok(a), Ok(b)) => a.cmp(&b).then_with(|| self.0.cmp(&other.0)),
            (Ok(_), Err(_)) => Ordering::Less,
            (Err(_), Ok(_)) => Ordering::Greater,
            (Err(_), Err(_)) => self.0.cmp(&other.0),
        }
    }
}

impl PartialOrd for GroupId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// One inventory row after column mapping.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub group_id: Option<GroupId>,
    pub coverage_days: Option<f64>,
    pub stock_value: Option<f64>,
    pub pending_order_balance: Option<f64>,
}

/// A record that passed the filter: every field the aggregates need is set.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidRecord {
    pub group_id: GroupId,
    pub coverage_days: f64,
    pub stock_value: Option<f64>,
    pub pending_order_balance: f64,
}

/// Result of [`filter_records`].
#[derive(Debug, Clone, Default)]
pub struct FilterOutcome {
    pub kept: Vec<ValidRecord>,
    pub dropped_non_positive: usize,
    pub dropped_missing_group: usize,
}

impl FilterOutcome {
    pub fn excluded(&self) -> usize {
        self.dropped_non_positive + self.dropped_missing_group
    }
}

/// Converts table rows into [`Record`]s using the resolved column positions.
///
/// # Errors
///
/// Returns [`ReportError::InvalidNumber`] when a numeric column holds text
/// that is not a number. Blank numeric cells are read as `None`.
pub fn load_records(
    table: &RawTable,
    index: &ColumnIndex,
) -> ReportResult<Vec<Record>> {
    let mut records = Vec::with_capacity(table.len());

    for row in 0..table.len() {
        let number = |col: usize| {
            parse_number(table.cell(row, col)).map_err(|value| ReportError::InvalidNumber {
                column: table.headers[col].trim().to_string(),
                // 1-based, counting the header line
                row: row + 2,
                value,
            })
        };

        records.push(Record {
            group_id: GroupId::from_cell(table.cell(row, index.group_id)),
            coverage_days: number(index.coverage_days)?,
            stock_value: number(index.stock_value)?,
            pending_order_balance: number(index.pending_order_balance)?,
        });
    }

    debug!(records = records.len(), "Records loaded");
    Ok(records)
}

/// Keeps rows with positive coverage and positive pending balance.
///
/// Rows without a group id are also dropped since they cannot be grouped.
pub fn filter_records(records: Vec<Record>) -> FilterOutcome {
    let mut outcome = FilterOutcome::default();

    for record in records {
        let (Some(coverage), Some(pending)) = (record.coverage_days, record.pending_order_balance)
        else {
            outcome.dropped_non_positive += 1;
            continue;
        };
        if !(coverage > 0.0 && pending > 0.0) {
            outcome.dropped_non_positive += 1;
            continue;
        }
        let Some(group_id) = record.group_id else {
            outcome.dropped_missing_group += 1;
            continue;
        };

        outcome.kept.push(ValidRecord {
            group_id,
            coverage_days: coverage,
            stock_value: record.stock_value,
            pending_order_balance: pending,
        });
    }

    info!(
        kept = outcome.kept.len(),
        dropped_non_positive = outcome.dropped_non_positive,
        dropped_missing_group = outcome.dropped_missing_group,
        "Rows filtered"
    );
    outcome
}

/// Reads a numeric cell. The error carries the offending text.
///
/// Text cells accept plain decimals (`1234.5`), US grouping (`1,234.50`) and
/// pt-BR formatting (`1.234,50`), optionally prefixed with `R$`. Anything
/// else, including `inf` and `NaN`, is an error.
fn parse_number(cell: &Cell) -> Result<Option<f64>, String> {
    match cell {
        Cell::Empty => Ok(None),
        Cell::Number(n) if n.is_finite() => Ok(Some(*n)),
        Cell::Number(n) => Err(n.to_string()),
        Cell::Text(text) => {
            let s = text.trim();
            let s = s.strip_prefix("R$").map(str::trim).unwrap_or(s);
            normalize_decimal(s)
                .and_then(|literal| literal.parse::<f64>().ok())
                .filter(|v| v.is_finite())
                .map(Some)
                .ok_or_else(|| s.to_string())
        }
    }
}

/// Rewrites a formatted number as a plain `f64` literal.
///
/// The separator that comes last is the decimal mark and the other one may
/// only group thousands. A comma on its own is a pt-BR decimal mark. Dots on
/// their own group thousands when every group after the first has exactly
/// three digits (`1.234`, `1.234.567`) and the first does not start with 0.
fn normalize_decimal(s: &str) -> Option<String> {
    let (sign, body) = match s.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", s),
    };

    let (int_part, frac_part, group_sep) = match (body.rfind('.'), body.rfind(',')) {
        (None, None) => (body, None, None),
        (Some(dot), Some(comma)) if dot > comma => (&body[..dot], Some(&body[dot + 1..]), Some(',')),
        (Some(_), Some(comma)) => (&body[..comma], Some(&body[comma + 1..]), Some('.')),
        (None, Some(comma)) => (&body[..comma], Some(&body[comma + 1..]), None),
        (Some(_), None) if is_grouped(body, '.') => (body, None, Some('.')),
        (Some(dot), None) => (&body[..dot], Some(&body[dot + 1..]), None),
    };

    let int_digits = match group_sep {
        Some(sep) if int_part.contains(sep) => {
            if !is_grouped(int_part, sep) {
                return None;
            }
            int_part.replace(sep, "")
        }
        _ => int_part.to_string(),
    };
    if !all_digits(&int_digits) {
        return None;
    }

    match frac_part {
        None if int_digits.is_empty() => None,
        None => Some(format!("{sign}{int_digits}")),
        Some(frac) if frac.is_empty() || !all_digits(frac) => None,
        Some(frac) if int_digits.is_empty() => Some(format!("{sign}0.{frac}")),
        Some(frac) => Some(format!("{sign}{int_digits}.{frac}")),
    }
}

/// `1.234.567` with `.`: leading group of 1-3 digits, then groups of three.
fn is_grouped(s: &str, sep: char) -> bool {
    let mut groups = s.split(sep);
    let Some(first) = groups.next() else {
        return false;
    };
    if first.is_empty() || first.len() > 3 || first.starts_with('0') || !all_digits(first) {
        return false;
    }
    let mut rest = groups.peekable();
    if rest.peek().is_none() {
        return false;
    }
    rest.all(|group| group.len() == 3 && all_digits(group))
}

fn all_digits(s: &str) -> bool {
    s.bytes().all(|b| b.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(group: &str, coverage: f64, pending: f64) -> Record {
        Record {
            group_id: Some(GroupId::new(group)),
            coverage_days: Some(coverage),
            stock_value: Some(100.0),
            pending_order_balance: Some(pending),
        }
    }

    #[test]
    fn test_filter_drops_non_positive_rows() {
        let outcome = filter_records(vec![
            record("A", 10.0, 50.0),
            record("A", 0.0, 50.0),
            record("A", -3.0, 50.0),
            record("A", 10.0, 0.0),
            record("A", 10.0, -1.0),
        ]);
        assert_eq!(outcome.kept.len(), 1);
        assert_eq!(outcome.dropped_non_positive, 4);
        assert_eq!(outcome.excluded(), 4);
    }

    #[test]
    fn test_filter_drops_blank_values_and_groups() {
        let mut blank_coverage = record("A", 1.0, 1.0);
        blank_coverage.coverage_days = None;
        let mut blank_group = record("A", 1.0, 1.0);
        blank_group.group_id = None;

        let outcome = filter_records(vec![blank_coverage, blank_group, record("B", 5.0, 5.0)]);
        assert_eq!(outcome.kept.len(), 1);
        assert_eq!(outcome.dropped_non_positive, 1);
        assert_eq!(outcome.dropped_missing_group, 1);
    }

    #[test]
    fn test_group_id_ordering_is_numeric_aware() {
        let mut ids: Vec<GroupId> = ["10", "B", "2", "A", "1"]
            .into_iter()
            .map(GroupId::new)
            .collect();
        ids.sort();
        let ids: Vec<&str> = ids.iter().map(GroupId::as_str).collect();
        assert_eq!(ids, vec!["1", "2", "10", "A", "B"]);
    }

    #[test]
    fn test_group_id_from_numeric_cell() {
        assert_eq!(
            GroupId::from_cell(&Cell::Number(101.0)),
            Some(GroupId::new("101"))
        );
        assert_eq!(GroupId::from_cell(&Cell::Empty), None);
    }

    #[test]
    fn test_group_id_from_huge_numeric_cell_is_not_truncated() {
        assert_eq!(
            GroupId::from_cell(&Cell::Number(1e20)),
            Some(GroupId::new("100000000000000000000"))
        );
    }

    #[test]
    fn test_parse_number_formats() {
        assert_eq!(parse_number(&Cell::Number(2.5)), Ok(Some(2.5)));
        assert_eq!(parse_number(&Cell::Empty), Ok(None));
        assert_eq!(parse_number(&Cell::Text("12.5".into())), Ok(Some(12.5)));
        assert_eq!(parse_number(&Cell::Text("1.234,50".into())), Ok(Some(1234.5)));
        assert_eq!(parse_number(&Cell::Text("R$ 10,00".into())), Ok(Some(10.0)));
        assert_eq!(parse_number(&Cell::Text("abc".into())), Err("abc".to_string()));
    }

    fn text(s: &str) -> Result<Option<f64>, String> {
        parse_number(&Cell::Text(s.into()))
    }

    #[test]
    fn test_parse_number_uses_last_separator_as_decimal_mark() {
        assert_eq!(text("1,234.50"), Ok(Some(1234.5)));
        assert_eq!(text("1.234,50"), Ok(Some(1234.5)));
        assert_eq!(text("1.234.567,89"), Ok(Some(1234567.89)));
        assert_eq!(text("1,234,567.89"), Ok(Some(1234567.89)));
        assert_eq!(text("-1.234,5"), Ok(Some(-1234.5)));
    }

    #[test]
    fn test_parse_number_dot_only() {
        assert_eq!(text("1.234"), Ok(Some(1234.0)));
        assert_eq!(text("1.234.567"), Ok(Some(1234567.0)));
        assert_eq!(text("12.5"), Ok(Some(12.5)));
        assert_eq!(text("0.125"), Ok(Some(0.125)));
        assert_eq!(text("12"), Ok(Some(12.0)));
    }

    #[test]
    fn test_parse_number_rejects_ambiguous_or_broken_text() {
        assert!(text("1,234,567").is_err());
        assert!(text("1.23.4").is_err());
        assert!(text("1,23.4").is_err());
        assert!(text("12,").is_err());
        assert!(text("-").is_err());
        assert!(text("R$").is_err());
    }

    #[test]
    fn test_parse_number_rejects_non_finite() {
        assert_eq!(text("inf"), Err("inf".to_string()));
        assert_eq!(text("NaN"), Err("NaN".to_string()));
        assert!(parse_number(&Cell::Number(f64::INFINITY)).is_err());
    }

    #[test]
    fn test_load_records_reports_bad_number() {
        let table = RawTable::new(
            vec!["g".into(), "c".into(), "s".into(), "m".into(), "p".into()],
            vec![vec![
                Cell::Text("A".into()),
                Cell::Text("muitos".into()),
                Cell::Number(1.0),
                Cell::Empty,
                Cell::Number(1.0),
            ]],
        );
        let index = ColumnIndex {
            group_id: 0,
            coverage_days: 1,
            stock_value: 2,
            merchandise: 3,
            pending_order_balance: 4,
        };
        let err = load_records(&table, &index).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid number in column `c` at row 2: 'muitos'"
        );
    }
}
