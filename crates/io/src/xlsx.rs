// XLSX comparison report (export) and worksheet extracts (import)

use std::io::Write;
use std::path::Path;
use std::time::Instant;

use calamine::{open_workbook_auto, Data, Reader};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_xlsxwriter::{Color, ConditionalFormatFormula, Format, Workbook, Worksheet, XlsxError};
use slicecheck_recon::{CellValue, ColumnRole, JoinedTable, Reconciliation, RowOutcome, Table};
use tracing::{debug, info};

use crate::error::{InputError, RenderError};

pub const SOURCE_SHEET: &str = "Source";
pub const TARGET_SHEET: &str = "Target";
pub const VALIDATION_SHEET: &str = "Validation";

/// Excel's "Bad" cell style.
const FAIL_FILL: u32 = 0xFFC7CE;
const FAIL_FONT: u32 = 0x9C0006;
/// Excel's "Good" cell style.
const PASS_FILL: u32 = 0xC6EFCE;
const PASS_FONT: u32 = 0x006100;

/// Statistics from one report export
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportResult {
    pub sheets_exported: usize,
    pub cells_exported: usize,
    pub hidden_rows: usize,
    pub conditional_formats: usize,
    pub numbers_as_text: usize,
    pub export_duration_ms: u128,
}

/// Build the three-sheet report in memory.
pub fn build_report(recon: &Reconciliation) -> Result<(Workbook, ExportResult), RenderError> {
    let mut result = ExportResult::default();
    let mut workbook = Workbook::new();
    let header_format = Format::new().set_bold();

    for (name, table) in [(SOURCE_SHEET, &recon.source), (TARGET_SHEET, &recon.target)] {
        let worksheet = workbook.add_worksheet().set_name(name)?;
        export_table(worksheet, table, &header_format, &mut result)?;
        result.sheets_exported += 1;
    }

    let worksheet = workbook.add_worksheet().set_name(VALIDATION_SHEET)?;
    export_validation(worksheet, recon, &header_format, &mut result)?;
    result.sheets_exported += 1;

    Ok((workbook, result))
}

/// Render `recon` and write it to `path`.
///
/// The workbook is serialized in memory, written to a temporary file next
/// to `path` and renamed over it, so `path` either holds a complete report
/// or is left as it was.
pub fn export_report(recon: &Reconciliation, path: &Path) -> Result<ExportResult, RenderError> {
    let start_time = Instant::now();
    let (mut workbook, mut result) = build_report(recon)?;
    let buffer = workbook.save_to_buffer()?;
    write_atomic(path, &buffer)?;

    result.export_duration_ms = start_time.elapsed().as_millis();
    info!(
        path = %path.display(),
        cells = result.cells_exported,
        hidden_rows = result.hidden_rows,
        "report written"
    );
    Ok(result)
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), RenderError> {
    let io_err = |source: std::io::Error| RenderError::Io {
        path: path.to_path_buf(),
        source,
    };
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    // Dropping the temp file on any error path removes it.
    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(io_err)?;
    tmp.write_all(bytes).map_err(io_err)?;
    tmp.as_file().sync_all().map_err(io_err)?;
    tmp.persist(path).map_err(|e| io_err(e.error))?;
    Ok(())
}

/// Header row then data rows, every column as a plain column.
fn export_table(
    worksheet: &mut Worksheet,
    table: &Table,
    header_format: &Format,
    result: &mut ExportResult,
) -> Result<(), XlsxError> {
    for (col, name) in table.header().names().iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, name, header_format)?;
    }
    for (row, cells) in table.rows().iter().enumerate() {
        for (col, cell) in cells.iter().enumerate() {
            write_cell(worksheet, row as u32 + 1, col as u16, cell, result)?;
        }
    }
    worksheet.set_freeze_panes(1, 0)?;
    Ok(())
}

fn export_validation(
    worksheet: &mut Worksheet,
    recon: &Reconciliation,
    header_format: &Format,
    result: &mut ExportResult,
) -> Result<(), XlsxError> {
    let table = &recon.validation;

    for (col, column) in table.columns.iter().enumerate() {
        let col16 = col as u16;
        worksheet.write_string_with_format(0, col16, &column.name, header_format)?;
        for (row, cell) in column.values.iter().enumerate() {
            write_cell(worksheet, row as u32 + 1, col16, cell, result)?;
        }
    }

    result.conditional_formats += export_highlights(worksheet, table)?;

    // Passing rows stay in the sheet but collapse out of view.
    for (row, outcome) in recon.outcomes.iter().enumerate() {
        if *outcome == RowOutcome::Success {
            worksheet.set_row_hidden(row as u32 + 1)?;
            result.hidden_rows += 1;
        }
    }

    worksheet.set_freeze_panes(1, table.dimensions.len() as u16)?;
    Ok(())
}

/// Value a highlighted column holds on a passing row, as an Excel literal.
fn pass_sentinel(role: ColumnRole) -> Option<&'static str> {
    match role {
        ColumnRole::Variance => Some("0"),
        ColumnRole::Notes => Some("\"Data Match\""),
        ColumnRole::Outcome => Some("\"success\""),
        _ => None,
    }
}

/// Two formula rules per variance, notes and outcome column: red when the
/// cell differs from its pass sentinel, green when it equals it.
fn export_highlights(worksheet: &mut Worksheet, table: &JoinedTable) -> Result<usize, XlsxError> {
    if table.row_count == 0 {
        return Ok(0);
    }

    let fail_format = Format::new()
        .set_background_color(Color::RGB(FAIL_FILL))
        .set_font_color(Color::RGB(FAIL_FONT));
    let pass_format = Format::new()
        .set_background_color(Color::RGB(PASS_FILL))
        .set_font_color(Color::RGB(PASS_FONT));

    let last_row = table.row_count as u32;
    let mut added = 0;

    for (col, column) in table.columns.iter().enumerate() {
        let Some(sentinel) = pass_sentinel(column.role) else {
            continue;
        };
        // Relative to the first data cell of the range.
        let anchor = format!("{}2", col_to_letter(col));
        let col16 = col as u16;

        let fail = ConditionalFormatFormula::new()
            .set_rule(format!("={anchor}<>{sentinel}").as_str())
            .set_format(&fail_format);
        let pass = ConditionalFormatFormula::new()
            .set_rule(format!("={anchor}={sentinel}").as_str())
            .set_format(&pass_format);

        worksheet.add_conditional_format(1, col16, last_row, col16, &fail)?;
        worksheet.add_conditional_format(1, col16, last_row, col16, &pass)?;
        added += 2;
    }

    debug!(rules = added, "conditional formats added");
    Ok(added)
}

/// Null cells are left blank; numbers beyond Excel's 15 significant digits
/// are written as text so the exact value survives.
fn write_cell(
    worksheet: &mut Worksheet,
    row: u32,
    col: u16,
    cell: &CellValue,
    result: &mut ExportResult,
) -> Result<(), XlsxError> {
    match cell {
        CellValue::Null => return Ok(()),
        CellValue::Text(s) if s.is_empty() => return Ok(()),
        CellValue::Text(s) => {
            worksheet.write_string(row, col, s)?;
        }
        CellValue::Numeric(d) => match excel_number(d) {
            Some(n) => {
                worksheet.write_number(row, col, n)?;
            }
            None => {
                worksheet.write_string(row, col, d.to_string())?;
                result.numbers_as_text += 1;
            }
        },
    }
    result.cells_exported += 1;
    Ok(())
}

fn excel_number(d: &Decimal) -> Option<f64> {
    const EXCEL_DIGITS: u128 = 1_000_000_000_000_000;
    if d.mantissa().unsigned_abs() >= EXCEL_DIGITS {
        return None;
    }
    d.to_f64()
}

/// Convert column index to Excel column letter (0 = A, 25 = Z, 26 = AA, etc.)
fn col_to_letter(col: usize) -> String {
    let mut result = String::new();
    let mut n = col;
    loop {
        result.insert(0, (b'A' + (n % 26) as u8) as char);
        if n < 26 {
            break;
        }
        n = n / 26 - 1;
    }
    result
}

// ---------------------------------------------------------------------------
// Import
// ---------------------------------------------------------------------------

/// Read one worksheet (the first when `sheet` is `None`) as CSV text.
///
/// Leading empty rows and columns are kept so header positions match what
/// the sheet shows.
pub fn read_sheet_as_csv(path: &Path, sheet: Option<&str>) -> Result<String, InputError> {
    let mut workbook = open_workbook_auto(path).map_err(|e| InputError::Workbook {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let sheet_name = match sheet {
        Some(name) => {
            if !workbook.sheet_names().iter().any(|s| s == name) {
                return Err(InputError::SheetNotFound {
                    path: path.to_path_buf(),
                    sheet: name.to_string(),
                });
            }
            name.to_string()
        }
        None => workbook
            .sheet_names()
            .first()
            .cloned()
            .ok_or_else(|| InputError::EmptyWorkbook { path: path.to_path_buf() })?,
    };

    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|e| InputError::Workbook {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

    let (first_row, first_col) = range.start().unwrap_or((0, 0));
    let mut records: Vec<Vec<String>> = vec![Vec::new(); first_row as usize];
    for row in range.rows() {
        let mut record = vec![String::new(); first_col as usize];
        record.extend(row.iter().map(data_to_string));
        records.push(record);
    }

    debug!(path = %path.display(), sheet = %sheet_name, rows = records.len(), "sheet read");
    crate::csv::write_records(records).map_err(|e| InputError::Workbook {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

fn data_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
        // f64 Display never uses exponent notation.
        Data::Float(n) => n.to_string(),
        Data::Int(n) => n.to_string(),
        Data::Bool(true) => "TRUE".to_string(),
        Data::Bool(false) => "FALSE".to_string(),
        Data::DateTime(dt) => dt.as_f64().to_string(),
        Data::Error(e) => e.to_string(),
    }
}

/// Read an extract from disk: spreadsheets through their worksheet, anything
/// else as delimited text.
pub fn read_extract(path: &Path, sheet: Option<&str>) -> Result<String, InputError> {
    let is_workbook = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| matches!(e.to_ascii_lowercase().as_str(), "xlsx" | "xlsm" | "xlsb" | "xls" | "ods"))
        .unwrap_or(false);

    if is_workbook {
        read_sheet_as_csv(path, sheet)
    } else {
        crate::csv::read_file_as_utf8(path)
    }
}
