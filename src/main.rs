//! CLI entry point for the stock coverage report.
//!
//! Provides subcommands for building the three-sheet coverage workbook from
//! an inventory spreadsheet and for printing the same tables to the terminal.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use coverage_report::output::{
    DEFAULT_WORKBOOK_NAME, render_tables, to_json, write_csv_sheets, write_workbook,
};
use coverage_report::{ColumnMapping, build_report_from_file};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tracing::{error, info};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "coverage_report")]
#[command(about = "Stock coverage analysis by branch", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the coverage workbook from an inventory spreadsheet
    Report {
        /// Inventory spreadsheet (.xlsx, .xls, .ods or .csv)
        #[arg(short, long, value_name = "FILE")]
        input: PathBuf,

        /// Workbook to write
        #[arg(short, long, default_value = DEFAULT_WORKBOOK_NAME)]
        output: PathBuf,

        /// Worksheet to read (defaults to the first one)
        #[arg(long)]
        sheet: Option<String>,

        /// JSON file overriding the source column names
        #[arg(long, value_name = "JSON")]
        columns: Option<PathBuf>,

        /// Optional: also write each sheet as a CSV file into this directory
        #[arg(long)]
        csv_dir: Option<PathBuf>,
    },
    /// Print the coverage tables without writing any file
    Show {
        /// Inventory spreadsheet (.xlsx, .xls, .ods or .csv)
        #[arg(short, long, value_name = "FILE")]
        input: PathBuf,

        /// Worksheet to read (defaults to the first one)
        #[arg(long)]
        sheet: Option<String>,

        /// JSON file overriding the source column names
        #[arg(long, value_name = "JSON")]
        columns: Option<PathBuf>,

        /// Print the report as JSON instead of tables
        #[arg(long, default_value_t = false)]
        json: bool,
    },
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path = std::env::var("LOG_FILE_PATH")
        .unwrap_or_else(|_| "logs/coverage_report.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("coverage_report.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    let result = run(cli.command);
    if let Err(e) = &result {
        error!(error = %format!("{e:#}"), "Coverage report failed");
    }
    result
}

fn run(command: Commands) -> Result<()> {
    match command {
        Commands::Report {
            input,
            output,
            sheet,
            columns,
            csv_dir,
        } => {
            let mapping = load_mapping(columns.as_deref())?;
            let report = build_report_from_file(&input, sheet.as_deref(), &mapping)
                .with_context(|| format!("Failed to process {}", input.display()))?;

            write_workbook(&output, &report)
                .with_context(|| format!("Failed to write {}", output.display()))?;

            if let Some(dir) = csv_dir {
                write_csv_sheets(&dir, &report)
                    .with_context(|| format!("Failed to write CSV sheets to {}", dir.display()))?;
            }

            info!(
                output = %output.display(),
                groups = report.coverage.rows.len(),
                rows_used = report.rows_used,
                rows_excluded = report.rows_excluded,
                "Report complete"
            );
        }
        Commands::Show {
            input,
            sheet,
            columns,
            json,
        } => {
            let mapping = load_mapping(columns.as_deref())?;
            let report = build_report_from_file(&input, sheet.as_deref(), &mapping)
                .with_context(|| format!("Failed to process {}", input.display()))?;

            if json {
                println!("{}", to_json(&report)?);
            } else {
                println!("{}", render_tables(&report));
            }
        }
    }

    Ok(())
}

fn load_mapping(path: Option<&Path>) -> Result<ColumnMapping> {
    match path {
        Some(path) => {
            let mapping = ColumnMapping::load(path)
                .with_context(|| format!("Failed to load column mapping {}", path.display()))?;
            info!(path = %path.display(), "Column mapping loaded");
            Ok(mapping)
        }
        None => Ok(ColumnMapping::default()),
    }
}
