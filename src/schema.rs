//! Column validation and mapping.
//!
//! Source spreadsheets carry business column names. [`validate`] checks that
//! every required column is present and resolves each canonical field to a
//! column position, so nothing downstream looks columns up by name.

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::{ReportError, ReportResult};
use crate::parser::RawTable;

/// Source header names for each canonical field.
///
/// Loaded from a JSON object on disk; keys left out keep their defaults:
/// ```json
/// {
///   "group_id": "Loja",
///   "pending_order_balance": "Saldo Pedido Aberto"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ColumnMapping {
    pub group_id: String,
    pub coverage_days: String,
    pub stock_value: String,
    /// Required to be present, never read.
    pub merchandise: String,
    pub pending_order_balance: String,
}

impl Default for ColumnMapping {
    fn default() -> Self {
        Self {
            group_id: "Filial".to_string(),
            coverage_days: "Cobertura Atual".to_string(),
            stock_value: "Vlr Estoque Tmk".to_string(),
            merchandise: "Mercadoria".to_string(),
            pending_order_balance: "Saldo Pedido".to_string(),
        }
    }
}

impl ColumnMapping {
    /// Loads a mapping from a JSON file at `path`.
    pub fn load(path: &Path) -> ReportResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| ReportError::io(path, e))?;
        let mapping: ColumnMapping = serde_json::from_str(&content)?;
        mapping.check()?;
        Ok(mapping)
    }

    /// Required source columns, in reporting order.
    pub fn required(&self) -> [&str; 5] {
        [
            self.group_id.as_str(),
            self.coverage_days.as_str(),
            self.stock_value.as_str(),
            self.merchandise.as_str(),
            self.pending_order_balance.as_str(),
        ]
    }

    fn check(&self) -> ReportResult<()> {
        let required = self.required();
        if required.iter().any(|name| name.trim().is_empty()) {
            return Err(ReportError::Config(
                "column names must not be empty".to_string(),
            ));
        }
        for (i, name) in required.iter().enumerate() {
            if required[..i].contains(name) {
                return Err(ReportError::Config(format!(
                    "column `{name}` is mapped to more than one field"
                )));
            }
        }
        Ok(())
    }
}

/// Column positions of the canonical fields within a [`RawTable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnIndex {
    pub group_id: usize,
    pub coverage_days: usize,
    pub stock_value: usize,
    pub merchandise: usize,
    pub pending_order_balance: usize,
}

/// Checks that every required column exists and resolves their positions.
///
/// # Errors
///
/// Returns [`ReportError::Schema`] naming every missing column, in the
/// mapping's required order.
pub fn validate(table: &RawTable, mapping: &ColumnMapping) -> ReportResult<ColumnIndex> {
    let header_map = build_header_map(&table.headers);

    let missing: Vec<String> = mapping
        .required()
        .iter()
        .filter(|name| !header_map.contains_key(**name))
        .map(|name| name.to_string())
        .collect();

    if !missing.is_empty() {
        warn!(missing = ?missing, "Input is missing required columns");
        return Err(ReportError::Schema { missing });
    }

    let index = ColumnIndex {
        group_id: header_map[mapping.group_id.as_str()],
        coverage_days: header_map[mapping.coverage_days.as_str()],
        stock_value: header_map[mapping.stock_value.as_str()],
        merchandise: header_map[mapping.merchandise.as_str()],
        pending_order_balance: header_map[mapping.pending_order_balance.as_str()],
    };
    debug!(?index, "Required columns resolved");
    Ok(index)
}

fn build_header_map(headers: &[String]) -> HashMap<&str, usize> {
    let mut map = HashMap::new();
    for (idx, name) in headers.iter().enumerate() {
        // First occurrence wins for duplicated headers.
        map.entry(normalize_header_name(name)).or_insert(idx);
    }
    map
}

fn normalize_header_name(name: &str) -> &str {
    name.trim_start_matches('\u{feff}').trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(names: &[&str]) -> RawTable {
        RawTable::new(names.iter().map(|s| s.to_string()).collect(), vec![])
    }

    #[test]
    fn test_validate_resolves_positions() {
        let table = headers(&[
            "Extra",
            "Saldo Pedido",
            "Filial",
            "Mercadoria",
            "Vlr Estoque Tmk",
            "Cobertura Atual",
        ]);
        let index = validate(&table, &ColumnMapping::default()).unwrap();
        assert_eq!(index.group_id, 2);
        assert_eq!(index.coverage_days, 5);
        assert_eq!(index.stock_value, 4);
        assert_eq!(index.merchandise, 3);
        assert_eq!(index.pending_order_balance, 1);
    }

    #[test]
    fn test_missing_single_column_is_named() {
        let table = headers(&["Filial", "Cobertura Atual", "Vlr Estoque Tmk", "Mercadoria"]);
        let err = validate(&table, &ColumnMapping::default()).unwrap_err();
        match err {
            ReportError::Schema { missing } => assert_eq!(missing, vec!["Saldo Pedido"]),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_merchandise_is_required_even_though_unused() {
        let table = headers(&["Filial", "Cobertura Atual", "Vlr Estoque Tmk", "Saldo Pedido"]);
        let err = validate(&table, &ColumnMapping::default()).unwrap_err();
        assert_eq!(err.to_string(), "Missing required columns: Mercadoria");
    }

    #[test]
    fn test_missing_columns_reported_in_required_order() {
        let table = headers(&["Mercadoria"]);
        match validate(&table, &ColumnMapping::default()).unwrap_err() {
            ReportError::Schema { missing } => assert_eq!(
                missing,
                vec!["Filial", "Cobertura Atual", "Vlr Estoque Tmk", "Saldo Pedido"]
            ),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_headers_with_bom_and_padding_match() {
        let table = headers(&[
            "\u{feff}Filial",
            " Cobertura Atual ",
            "Vlr Estoque Tmk",
            "Mercadoria",
            "Saldo Pedido",
        ]);
        let index = validate(&table, &ColumnMapping::default()).unwrap();
        assert_eq!(index.group_id, 0);
        assert_eq!(index.coverage_days, 1);
    }

    #[test]
    fn test_mapping_partial_json_keeps_defaults() {
        let mapping: ColumnMapping = serde_json::from_str(r#"{ "group_id": "Loja" }"#).unwrap();
        assert_eq!(mapping.group_id, "Loja");
        assert_eq!(mapping.pending_order_balance, "Saldo Pedido");
    }

    #[test]
    fn test_mapping_rejects_duplicate_columns() {
        let mapping = ColumnMapping {
            stock_value: "Filial".to_string(),
            ..ColumnMapping::default()
        };
        assert!(matches!(mapping.check(), Err(ReportError::Config(_))));
    }

    #[test]
    fn test_mapping_load_from_file() {
        let path = std::env::temp_dir().join("coverage_report_test_mapping.json");
        std::fs::write(&path, r#"{ "coverage_days": "Dias Cobertura" }"#).unwrap();

        let mapping = ColumnMapping::load(&path).unwrap();
        assert_eq!(mapping.coverage_days, "Dias Cobertura");
        assert_eq!(mapping.group_id, "Filial");

        std::fs::remove_file(&path).unwrap();
    }
}
