//! Spreadsheet loader.
//!
//! Reads an uploaded workbook (`calamine`) or CSV export (`csv`) into a
//! [`RawTable`]. The file is fully read and closed before anything else
//! touches the data.

use std::path::Path;

use calamine::{Data, Reader, open_workbook_auto};
use tracing::debug;

use crate::error::{ReportError, ReportResult};

/// A single cell value as read from the input.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Number(f64),
    Text(String),
}

impl Cell {
    /// Builds a text cell, treating blank strings as empty.
    pub fn from_text(s: &str) -> Self {
        let s = s.trim();
        if s.is_empty() {
            Cell::Empty
        } else {
            Cell::Text(s.to_string())
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }
}

impl From<&Data> for Cell {
    fn from(data: &Data) -> Self {
        match data {
            Data::Empty => Cell::Empty,
            Data::Int(i) => Cell::Number(*i as f64),
            Data::Float(f) => Cell::Number(*f),
            Data::String(s) => Cell::from_text(s),
            Data::Bool(b) => Cell::Text(b.to_string()),
            other => Cell::from_text(&other.to_string()),
        }
    }
}

static EMPTY: Cell = Cell::Empty;

/// Header row plus data rows, untyped beyond [`Cell`].
#[derive(Debug, Clone, Default)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl RawTable {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<Cell>>) -> Self {
        Self { headers, rows }
    }

    /// Returns the cell at `(row, col)`, or an empty cell for short rows.
    pub fn cell(&self, row: usize, col: usize) -> &Cell {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .unwrap_or(&EMPTY)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Loads a spreadsheet or CSV file into a [`RawTable`].
///
/// `.csv` files go through the CSV reader; everything else is handed to
/// `calamine`, which detects xlsx/xlsm/xls/ods from the extension. For
/// workbooks, `sheet` selects a worksheet by name (default: the first one).
#[tracing::instrument(skip(path), fields(path = %path.display()))]
pub fn load_table(path: &Path, sheet: Option<&str>) -> ReportResult<RawTable> {
    let is_csv = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("csv"));

    let table = if is_csv {
        let bytes = std::fs::read(path).map_err(|e| ReportError::io(path, e))?;
        parse_csv(&bytes)?
    } else {
        load_workbook(path, sheet)?
    };

    debug!(
        columns = table.headers.len(),
        rows = table.len(),
        "Input table loaded"
    );
    Ok(table)
}

fn load_workbook(path: &Path, sheet: Option<&str>) -> ReportResult<RawTable> {
    let mut workbook = open_workbook_auto(path)?;
    let sheet_names = workbook.sheet_names();

    let name = match sheet {
        Some(wanted) => sheet_names
            .iter()
            .find(|n| n.as_str() == wanted)
            .cloned()
            .ok_or_else(|| ReportError::SheetNotFound(wanted.to_string()))?,
        None => sheet_names.first().cloned().ok_or(ReportError::EmptyInput)?,
    };

    debug!(sheet = %name, "Reading worksheet");
    let range = workbook.worksheet_range(&name)?;

    let mut rows = range.rows();
    let headers = rows
        .next()
        .ok_or(ReportError::EmptyInput)?
        .iter()
        .map(|d| d.to_string())
        .collect();
    let rows = rows
        .map(|row| row.iter().map(Cell::from).collect())
        .collect();

    Ok(RawTable::new(headers, rows))
}

/// Parses CSV bytes into a [`RawTable`].
///
/// The delimiter is sniffed from the header line: spreadsheet exports in
/// pt-BR locales use `;`.
pub fn parse_csv(bytes: &[u8]) -> ReportResult<RawTable> {
    let delimiter = sniff_delimiter(bytes);

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(bytes);

    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    if headers.iter().all(|h| h.trim().is_empty()) {
        return Err(ReportError::EmptyInput);
    }

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result?;
        rows.push(record.iter().map(Cell::from_text).collect());
    }

    Ok(RawTable::new(headers, rows))
}

fn sniff_delimiter(bytes: &[u8]) -> u8 {
    let first_line = bytes.split(|b| *b == b'\n').next().unwrap_or_default();
    let semicolons = first_line.iter().filter(|b| **b == b';').count();
    let commas = first_line.iter().filter(|b| **b == b',').count();
    if semicolons > commas { b';' } else { b',' }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_csv_comma() {
        let table = parse_csv(b"Filial,Cobertura Atual\n101,12.5\n102,\n").unwrap();
        assert_eq!(table.headers, vec!["Filial", "Cobertura Atual"]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.cell(0, 1), &Cell::Text("12.5".to_string()));
        assert!(table.cell(1, 1).is_empty());
    }

    #[test]
    fn test_parse_csv_sniffs_semicolon() {
        let table = parse_csv(b"Filial;Saldo Pedido\n101;1.234,50\n").unwrap();
        assert_eq!(table.headers.len(), 2);
        assert_eq!(table.cell(0, 1), &Cell::Text("1.234,50".to_string()));
    }

    #[test]
    fn test_short_rows_read_as_empty() {
        let table = parse_csv(b"a,b,c\n1\n").unwrap();
        assert!(table.cell(0, 2).is_empty());
        assert!(table.cell(5, 0).is_empty());
    }

    #[test]
    fn test_empty_input_is_rejected() {
        assert!(matches!(parse_csv(b""), Err(ReportError::EmptyInput)));
    }

    #[test]
    fn test_cell_from_data() {
        assert_eq!(Cell::from(&Data::Int(3)), Cell::Number(3.0));
        assert_eq!(Cell::from(&Data::Float(1.5)), Cell::Number(1.5));
        assert_eq!(Cell::from(&Data::String("  ".into())), Cell::Empty);
        assert_eq!(Cell::from(&Data::Empty), Cell::Empty);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let path = std::env::temp_dir().join("coverage_report_missing_input.csv");
        let _ = std::fs::remove_file(&path);
        assert!(matches!(
            load_table(&path, None),
            Err(ReportError::Io { .. })
        ));
    }
}
