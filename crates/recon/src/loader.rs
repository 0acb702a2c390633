use tracing::{debug, warn};

use crate::error::{ReconError, RowParseError};
use crate::header::{normalize_header, split_fields, RawExtract};
use crate::model::{CellValue, Table};

/// A loaded table plus the rows that had to be skipped.
#[derive(Debug, Clone)]
pub struct LoadedTable {
    pub table: Table,
    pub row_errors: Vec<RowParseError>,
}

/// Normalize the header, then parse every data line into typed cells.
///
/// Blank lines are ignored. Lines whose field count differs from the
/// header are recorded as `RowParseError` and skipped.
pub fn load_table(extract: &RawExtract, dimensions: &[String]) -> Result<LoadedTable, ReconError> {
    let header = normalize_header(extract, dimensions)?;
    let (_, data_lines) = extract.split()?;
    let width = header.len();

    let mut rows = Vec::with_capacity(data_lines.len());
    let mut row_errors = Vec::new();

    for (offset, line) in data_lines.iter().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let line_no = extract.header_rows + offset + 1;
        let fields = split_fields(extract.side, line_no, line)?;

        if fields.len() != width {
            warn!(
                side = %extract.side,
                line = line_no,
                expected = width,
                found = fields.len(),
                "skipping malformed row"
            );
            row_errors.push(RowParseError {
                side: extract.side,
                line: line_no,
                expected: width,
                found: fields.len(),
            });
            continue;
        }

        rows.push(fields.iter().map(|f| CellValue::parse(f)).collect());
    }

    debug!(
        side = %extract.side,
        columns = width,
        rows = rows.len(),
        skipped = row_errors.len(),
        "loaded table"
    );

    Ok(LoadedTable {
        table: Table::new(extract.side, header, rows),
        row_errors,
    })
}
