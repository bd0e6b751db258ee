//! Error types for the coverage report pipeline.
//!
//! Every failure is either a schema problem (required columns absent) or a
//! processing problem (anything else while loading, computing or exporting).

use std::path::PathBuf;

use thiserror::Error;

/// Coarse classification of a [`ReportError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Schema,
    Processing,
}

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("Missing required columns: {}", .missing.join(", "))]
    Schema { missing: Vec<String> },

    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to read workbook: {0}")]
    Workbook(#[from] calamine::Error),

    #[error("Failed to read CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("Sheet not found: {0}")]
    SheetNotFound(String),

    #[error("Input has no header row")]
    EmptyInput,

    #[error("Invalid number in column `{column}` at row {row}: '{value}'")]
    InvalidNumber {
        column: String,
        row: usize,
        value: String,
    },

    #[error("Failed to write workbook: {0}")]
    Export(#[from] rust_xlsxwriter::XlsxError),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid column mapping: {0}")]
    Config(String),
}

impl ReportError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ReportError::Schema { .. } => ErrorKind::Schema,
            _ => ErrorKind::Processing,
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ReportError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type alias for pipeline operations.
pub type ReportResult<T> = Result<T, ReportError>;
