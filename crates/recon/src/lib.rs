//! `slicecheck-recon`: keyed reconciliation of two delimited extracts.
//!
//! Pure engine crate: receives extract text, returns typed tables, a joined
//! and classified validation table, and per-row outcomes.
//! No file, network or workbook IO.

pub mod classify;
pub mod engine;
pub mod error;
pub mod hash;
pub mod header;
pub mod join;
pub mod loader;
pub mod model;
pub mod outcome;

pub use engine::{reconcile, reconcile_text, Reconciliation};
pub use error::{MissingDimension, ReconError, RowParseError};
pub use hash::HashCheck;
pub use header::RawExtract;
pub use model::{
    CellValue, ColumnRole, JoinedColumn, JoinedTable, Note, ReconSummary, RowOutcome, Side, Table,
    OUTCOME_COLUMN,
};
