//! `slicecheck json-to-csv` and `slicecheck csv-to-json`.

use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use serde_json::Value;
use slicecheck_io::csv::read_file_as_utf8;
use slicecheck_io::grid::parse_list;
use slicecheck_io::{csv_to_grid_payload, grid_json_to_csv, GridSpec};
use tracing::info;

use crate::exit_codes::{grid_exit_code, EXIT_GRID_SHAPE, EXIT_INPUT, EXIT_USAGE};
use crate::CliError;

pub fn cmd_json_to_csv(
    json_data: Option<String>,
    file: Option<PathBuf>,
    output: Option<PathBuf>,
) -> Result<(), CliError> {
    let raw = match (json_data, file) {
        (Some(data), _) => data,
        (None, Some(path)) if path.as_os_str() == "-" => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .map_err(|e| CliError::new(EXIT_INPUT, format!("cannot read stdin: {}", e)))?;
            buf
        }
        (None, Some(path)) => read_input(&path)?,
        (None, None) => {
            return Err(CliError::args("no JSON data provided")
                .with_hint("pass --json-data '<json>' or --file <path>"))
        }
    };

    let grid: Value = serde_json::from_str(&raw)
        .map_err(|e| CliError::new(EXIT_GRID_SHAPE, format!("invalid JSON data: {}", e)))?;
    let csv = grid_json_to_csv(&grid).map_err(|e| CliError::new(grid_exit_code(&e), e.to_string()))?;

    write_output(output.as_deref(), &csv)
}

pub fn cmd_csv_to_json(
    file: PathBuf,
    pov_dimensions: &str,
    pov_members: &str,
    col_dimensions: &str,
    row_dimensions: &str,
    output: Option<PathBuf>,
) -> Result<(), CliError> {
    let spec = GridSpec {
        pov_dimensions: parse_list(pov_dimensions),
        pov_members: parse_list(pov_members),
        column_dimensions: parse_list(col_dimensions),
        row_dimensions: parse_list(row_dimensions),
    };
    if spec.row_dimensions.is_empty() {
        return Err(CliError::args("--row-dimensions must name at least one dimension"));
    }

    let text = read_input(&file)?;
    let payload = csv_to_grid_payload(&text, &spec).map_err(|e| {
        let err = CliError::new(grid_exit_code(&e), e.to_string());
        match e {
            slicecheck_io::GridError::PovMismatch { .. } => {
                err.with_hint("--pov-members needs one member per --pov-dimensions entry")
            }
            _ => err,
        }
    })?;

    let mut json = serde_json::to_string_pretty(&payload)
        .map_err(|e| CliError::new(EXIT_USAGE, e.to_string()))?;
    json.push('\n');
    write_output(output.as_deref(), &json)
}

fn read_input(path: &Path) -> Result<String, CliError> {
    read_file_as_utf8(path).map_err(|e| CliError::new(EXIT_INPUT, e.to_string()))
}

/// Write to `path`, or to stdout when none is given.
fn write_output(path: Option<&Path>, contents: &str) -> Result<(), CliError> {
    match path {
        Some(p) => {
            fs::write(p, contents).map_err(|e| {
                CliError::new(EXIT_INPUT, format!("cannot write {}: {}", p.display(), e))
            })?;
            info!(path = %p.display(), bytes = contents.len(), "output written");
            Ok(())
        }
        None => {
            print!("{}", contents);
            Ok(())
        }
    }
}
