// File I/O around the reconciliation engine

pub mod compare;
pub mod csv;
pub mod error;
pub mod grid;
pub mod xlsx;

pub use compare::{
    compare, compare_files, CompareError, CompareErrorKind, CompareOutcome, CompareSummary,
    ExtractRef, StatusCode,
};
pub use error::{InputError, RenderError};
pub use grid::{csv_to_grid_payload, grid_json_to_csv, GridError, GridSpec};
