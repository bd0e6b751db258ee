//! Output formatting and persistence for coverage reports.
//!
//! Supports the three-sheet Excel workbook, terminal tables, JSON and
//! per-sheet CSV files.

use std::path::{Path, PathBuf};

use csv::WriterBuilder;
use rust_xlsxwriter::{Format, FormatAlign, Workbook, Worksheet, XlsxError};
use tabled::settings::Style;
use tabled::{Table, Tabled};
use tracing::{debug, info};

use crate::analyzers::types::Bucket;
use crate::error::{ReportError, ReportResult};
use crate::report::CoverageReport;

pub const SHEET_COVERAGE: &str = "Cobertura Média";
pub const SHEET_ABSOLUTE: &str = "Valores Absolutos";
pub const SHEET_PERCENT: &str = "Percentuais";

/// File name the workbook is saved under unless told otherwise.
pub const DEFAULT_WORKBOOK_NAME: &str = "relatorio_estoque.xlsx";

const GROUP_HEADER: &str = "Filial";
const TOTAL_HEADER: &str = "TOTAL";
const COVERAGE_HEADERS: [&str; 4] = [
    GROUP_HEADER,
    "Cobertura Média Ponderada (dias)",
    "Cobertura Média Simples (dias)",
    "Saldo Pedido Total",
];

const NUM_FORMAT_DAYS: &str = "0.00";
const NUM_FORMAT_CURRENCY: &str = r#""R$" #,##0.00"#;
const NUM_FORMAT_PERCENT: &str = r#"0.00"%""#;

fn absolute_headers() -> Vec<&'static str> {
    let mut headers = vec![GROUP_HEADER];
    headers.extend(Bucket::ALL.map(Bucket::label));
    headers.push(TOTAL_HEADER);
    headers
}

fn percent_headers() -> Vec<&'static str> {
    let mut headers = vec![GROUP_HEADER];
    headers.extend(Bucket::ALL.map(Bucket::label));
    headers
}

/// Renders the report as an in-memory `.xlsx` file.
///
/// Values are written as numbers; currency, percentage and day formatting
/// is applied as a cell number format only.
pub fn workbook_bytes(report: &CoverageReport) -> ReportResult<Vec<u8>> {
    let mut workbook = build_workbook(report)?;
    Ok(workbook.save_to_buffer()?)
}

/// Writes the report workbook to `path`.
///
/// The workbook is rendered fully in memory first, so a failed run leaves
/// no file behind.
#[tracing::instrument(skip(path, report), fields(path = %path.display()))]
pub fn write_workbook(path: &Path, report: &CoverageReport) -> ReportResult<()> {
    let bytes = workbook_bytes(report)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| ReportError::io(parent, e))?;
    }
    std::fs::write(path, &bytes).map_err(|e| ReportError::io(path, e))?;
    info!(bytes = bytes.len(), "Workbook written");
    Ok(())
}

fn build_workbook(report: &CoverageReport) -> Result<Workbook, XlsxError> {
    let header = Format::new().set_bold().set_align(FormatAlign::Center);
    let days = Format::new().set_num_format(NUM_FORMAT_DAYS);
    let currency = Format::new().set_num_format(NUM_FORMAT_CURRENCY);
    let percent = Format::new().set_num_format(NUM_FORMAT_PERCENT);

    let mut workbook = Workbook::new();

    let sheet = workbook.add_worksheet().set_name(SHEET_COVERAGE)?;
    write_header(sheet, &COVERAGE_HEADERS, &header)?;
    for (i, row) in report.coverage.rows.iter().enumerate() {
        let r = i as u32 + 1;
        sheet.write_string(r, 0, row.group_id.as_str())?;
        sheet.write_number_with_format(r, 1, row.weighted_mean_days, &days)?;
        sheet.write_number_with_format(r, 2, row.simple_mean_days, &days)?;
        sheet.write_number_with_format(r, 3, row.total_pending_balance, &currency)?;
    }

    let sheet = workbook.add_worksheet().set_name(SHEET_ABSOLUTE)?;
    write_header(sheet, &absolute_headers(), &header)?;
    for (i, row) in report.absolute.rows.iter().enumerate() {
        let r = i as u32 + 1;
        sheet.write_string(r, 0, row.group_id.as_str())?;
        for (c, value) in row.values.iter().chain([&row.total]).enumerate() {
            sheet.write_number_with_format(r, c as u16 + 1, *value, &currency)?;
        }
    }

    let sheet = workbook.add_worksheet().set_name(SHEET_PERCENT)?;
    write_header(sheet, &percent_headers(), &header)?;
    for (i, row) in report.percentages.rows.iter().enumerate() {
        let r = i as u32 + 1;
        sheet.write_string(r, 0, row.group_id.as_str())?;
        for (c, value) in row.percents.iter().enumerate() {
            sheet.write_number_with_format(r, c as u16 + 1, *value, &percent)?;
        }
    }

    debug!(sheets = 3, "Workbook rendered");
    Ok(workbook)
}

fn write_header(sheet: &mut Worksheet, headers: &[&str], format: &Format) -> Result<(), XlsxError> {
    for (c, title) in headers.iter().enumerate() {
        let c = c as u16;
        sheet.write_string_with_format(0, c, *title, format)?;
        let width = (title.chars().count() + 4).max(12);
        sheet.set_column_width(c, width as f64)?;
    }
    Ok(())
}

/// Writes each sheet as its own CSV file inside `dir`.
///
/// Returns the paths written, in sheet order.
pub fn write_csv_sheets(dir: &Path, report: &CoverageReport) -> ReportResult<Vec<PathBuf>> {
    std::fs::create_dir_all(dir).map_err(|e| ReportError::io(dir, e))?;

    let coverage_rows = report.coverage.rows.iter().map(|row| {
        vec![
            row.group_id.to_string(),
            format!("{:.2}", row.weighted_mean_days),
            format!("{:.2}", row.simple_mean_days),
            format!("{:.2}", row.total_pending_balance),
        ]
    });
    let absolute_rows = report.absolute.rows.iter().map(|row| {
        std::iter::once(row.group_id.to_string())
            .chain(row.values.iter().chain([&row.total]).map(|v| format!("{v:.2}")))
            .collect::<Vec<String>>()
    });
    let percent_rows = report.percentages.rows.iter().map(|row| {
        std::iter::once(row.group_id.to_string())
            .chain(row.percents.iter().map(|v| format!("{v:.2}")))
            .collect::<Vec<String>>()
    });

    let paths = vec![
        write_csv(&dir.join("cobertura_media.csv"), &COVERAGE_HEADERS, coverage_rows)?,
        write_csv(&dir.join("valores_absolutos.csv"), &absolute_headers(), absolute_rows)?,
        write_csv(&dir.join("percentuais.csv"), &percent_headers(), percent_rows)?,
    ];
    info!(dir = %dir.display(), files = paths.len(), "CSV sheets written");
    Ok(paths)
}

fn write_csv(
    path: &Path,
    headers: &[&str],
    rows: impl Iterator<Item = Vec<String>>,
) -> ReportResult<PathBuf> {
    debug!(path = %path.display(), "Writing CSV sheet");
    let mut writer = WriterBuilder::new().from_path(path)?;
    writer.write_record(headers)?;
    for row in rows {
        writer.write_record(&row)?;
    }
    writer.flush().map_err(|e| ReportError::io(path, e))?;
    Ok(path.to_path_buf())
}

/// Serializes the whole report as pretty-printed JSON.
pub fn to_json(report: &CoverageReport) -> ReportResult<String> {
    Ok(serde_json::to_string_pretty(report)?)
}

/// Console row for the coverage sheet, with formatted numbers.
#[derive(Debug, Clone, Tabled)]
struct CoveragePreview {
    #[tabled(rename = "Filial")]
    group_id: String,
    #[tabled(rename = "Cobertura Média Ponderada (dias)")]
    weighted_mean_days: String,
    #[tabled(rename = "Cobertura Média Simples (dias)")]
    simple_mean_days: String,
    #[tabled(rename = "Saldo Pedido Total")]
    total_pending_balance: String,
}

#[derive(Debug, Clone, Tabled)]
struct AbsolutePreview {
    #[tabled(rename = "Filial")]
    group_id: String,
    #[tabled(rename = "0-15 dias")]
    up_to_15: String,
    #[tabled(rename = "16-30 dias")]
    up_to_30: String,
    #[tabled(rename = "31-45 dias")]
    up_to_45: String,
    #[tabled(rename = "46-60 dias")]
    up_to_60: String,
    #[tabled(rename = "Mais de 60 dias")]
    over_60: String,
    #[tabled(rename = "TOTAL")]
    total: String,
}

#[derive(Debug, Clone, Tabled)]
struct PercentPreview {
    #[tabled(rename = "Filial")]
    group_id: String,
    #[tabled(rename = "0-15 dias")]
    up_to_15: String,
    #[tabled(rename = "16-30 dias")]
    up_to_30: String,
    #[tabled(rename = "31-45 dias")]
    up_to_45: String,
    #[tabled(rename = "46-60 dias")]
    up_to_60: String,
    #[tabled(rename = "Mais de 60 dias")]
    over_60: String,
}

/// Renders the three tables as Markdown for the terminal.
pub fn render_tables(report: &CoverageReport) -> String {
    let coverage = report.coverage.rows.iter().map(|row| CoveragePreview {
        group_id: row.group_id.to_string(),
        weighted_mean_days: format_days(row.weighted_mean_days),
        simple_mean_days: format_days(row.simple_mean_days),
        total_pending_balance: format_currency(row.total_pending_balance),
    });
    let absolute = report.absolute.rows.iter().map(|row| {
        let [up_to_15, up_to_30, up_to_45, up_to_60, over_60] = row.values.map(format_currency);
        AbsolutePreview {
            group_id: row.group_id.to_string(),
            up_to_15,
            up_to_30,
            up_to_45,
            up_to_60,
            over_60,
            total: format_currency(row.total),
        }
    });
    let percent = report.percentages.rows.iter().map(|row| {
        let [up_to_15, up_to_30, up_to_45, up_to_60, over_60] = row.percents.map(format_percent);
        PercentPreview {
            group_id: row.group_id.to_string(),
            up_to_15,
            up_to_30,
            up_to_45,
            up_to_60,
            over_60,
        }
    });

    [
        render_table("Cobertura Média por Filial", coverage),
        render_table("Valores Absolutos (R$)", absolute),
        render_table("Percentuais por Faixa (%)", percent),
    ]
    .join("\n")
}

fn render_table<T: Tabled>(title: &str, rows: impl IntoIterator<Item = T>) -> String {
    let mut table = Table::new(rows);
    table.with(Style::markdown());
    format!("{title}\n\n{table}\n")
}

/// `1234.5` → `R$ 1,234.50`
pub fn format_currency(value: f64) -> String {
    let formatted = format!("{:.2}", value.abs());
    let (int_part, frac_part) = formatted.split_once('.').unwrap_or((formatted.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if value < 0.0 && formatted != "0.00" { "-" } else { "" };
    format!("R$ {sign}{grouped}.{frac_part}")
}

/// `25.0` → `25.00%`
pub fn format_percent(value: f64) -> String {
    format!("{value:.2}%")
}

/// `17.5` → `17.50`
pub fn format_days(value: f64) -> String {
    format!("{value:.2}")
}
