//! Planning-grid JSON ⇄ CSV.
//!
//! A planning grid is the slice shape the planning service exchanges:
//! `columns` is a list of column-header rows, `rows` a list of objects with
//! member `headers` and cell `data`.

use serde_json::{json, Value};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GridError {
    #[error("grid JSON: {0}")]
    Shape(String),

    #[error("{dimensions} POV dimension(s) but {members} POV member(s)")]
    PovMismatch { dimensions: usize, members: usize },

    #[error("CSV: {0}")]
    Csv(#[from] ::csv::Error),
}

/// Which dimensions sit on the point of view, the columns and the rows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GridSpec {
    pub pov_dimensions: Vec<String>,
    pub pov_members: Vec<String>,
    pub column_dimensions: Vec<String>,
    pub row_dimensions: Vec<String>,
}

impl GridSpec {
    fn validate(&self) -> Result<(), GridError> {
        if self.pov_dimensions.len() != self.pov_members.len() {
            return Err(GridError::PovMismatch {
                dimensions: self.pov_dimensions.len(),
                members: self.pov_members.len(),
            });
        }
        Ok(())
    }
}

/// Split a comma-separated CLI list, trimming each item and dropping empties.
pub fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn array<'a>(value: &'a Value, what: &str) -> Result<&'a Vec<Value>, GridError> {
    value
        .as_array()
        .ok_or_else(|| GridError::Shape(format!("'{what}' must be an array")))
}

fn optional_array<'a>(value: &'a Value, key: &str) -> Result<&'a [Value], GridError> {
    match value.get(key) {
        None | Some(Value::Null) => Ok(&[]),
        Some(v) => array(v, key).map(Vec::as_slice),
    }
}

/// Flatten a grid into CSV: column-header rows first, shifted right past
/// the row-header columns, then one line per row of `headers ++ data`.
pub fn grid_json_to_csv(grid: &Value) -> Result<String, GridError> {
    if !grid.is_object() {
        return Err(GridError::Shape("top level must be an object".into()));
    }
    let columns = optional_array(grid, "columns")?;
    let rows = optional_array(grid, "rows")?;

    let padding = match rows.first() {
        Some(first) => optional_array(first, "headers")?.len(),
        None => 0,
    };

    let mut records: Vec<Vec<String>> = Vec::with_capacity(columns.len() + rows.len());
    for col in columns {
        let mut record = vec![String::new(); padding];
        record.extend(array(col, "columns[]")?.iter().map(scalar_text));
        records.push(record);
    }
    for row in rows {
        let mut record: Vec<String> = optional_array(row, "headers")?.iter().map(scalar_text).collect();
        record.extend(optional_array(row, "data")?.iter().map(scalar_text));
        records.push(record);
    }

    tracing::debug!(columns = columns.len(), rows = rows.len(), "grid flattened");
    Ok(crate::csv::write_records(records)?)
}

/// Build an export-data-slice payload from a CSV laid out as
/// [`grid_json_to_csv`] writes it.
///
/// Column members come from the first `column_dimensions.len()` lines,
/// starting after the row-header columns. Row members come from the leading
/// `row_dimensions.len()` cells of every remaining line. Missing cells read
/// as empty strings.
pub fn csv_to_grid_payload(text: &str, spec: &GridSpec) -> Result<Value, GridError> {
    spec.validate()?;

    let mut reader = ::csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());
    let mut lines: Vec<Vec<String>> = Vec::new();
    for record in reader.records() {
        lines.push(record?.iter().map(str::to_string).collect());
    }

    let width = lines.iter().map(Vec::len).max().unwrap_or(0);
    let cell = |row: usize, col: usize| -> String {
        lines
            .get(row)
            .and_then(|r| r.get(col))
            .cloned()
            .unwrap_or_default()
    };

    let header_rows = spec.column_dimensions.len();
    let header_cols = spec.row_dimensions.len();

    let columns: Vec<Value> = (header_cols..width)
        .map(|col| {
            let members: Vec<Value> = (0..header_rows).map(|row| json!([cell(row, col)])).collect();
            json!({ "dimensions": spec.column_dimensions, "members": members })
        })
        .collect();

    let rows: Vec<Value> = (header_rows..lines.len())
        .map(|row| {
            let members: Vec<Value> = (0..header_cols).map(|col| json!([cell(row, col)])).collect();
            json!({ "dimensions": spec.row_dimensions, "members": members })
        })
        .collect();

    let pov_members: Vec<Value> = spec.pov_members.iter().map(|m| json!([m])).collect();

    Ok(json!({
        "exportPlanningData": false,
        "gridDefinition": {
            "suppressMissingBlocks": true,
            "suppressMissingRows": false,
            "suppressMissingColumns": false,
            "pov": {
                "dimensions": spec.pov_dimensions,
                "members": pov_members,
            },
            "columns": columns,
            "rows": rows,
        }
    }))
}
