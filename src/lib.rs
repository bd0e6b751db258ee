pub mod analyzers;
pub mod error;
pub mod output;
pub mod parser;
pub mod records;
pub mod report;
pub mod schema;

pub use error::{ErrorKind, ReportError, ReportResult};
pub use report::{CoverageReport, build_report, build_report_from_file};
pub use schema::ColumnMapping;
