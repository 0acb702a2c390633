use serde::Serialize;
use thiserror::Error;

use crate::model::Side;

/// Fatal engine errors. Any of these aborts the remaining pipeline stages.
#[derive(Debug, Error)]
pub enum ReconError {
    /// Header row count is zero.
    #[error("{side} extract: header row count must be at least 1")]
    ZeroHeaderRows { side: Side },

    /// Header row count exceeds the number of lines in the extract.
    #[error("{side} extract: {header_rows} header row(s) requested but only {available} line(s) present")]
    MalformedHeader {
        side: Side,
        header_rows: usize,
        available: usize,
    },

    /// The join cannot run on the requested dimensions.
    #[error(transparent)]
    MissingDimension(#[from] MissingDimension),

    /// The csv crate failed while splitting a header line or while writing
    /// the canonical rendering of a loaded table. Input is already valid
    /// UTF-8 when it reaches the tokenizer, so in practice this comes from
    /// the writer (a row whose width disagrees with the header).
    #[error("{side} extract: csv error: {message}")]
    Csv { side: Side, message: String },

    /// Two joined columns would carry the same name.
    #[error("joined column '{name}' collides with {existing}")]
    ColumnCollision { name: String, existing: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MissingDimension {
    /// No dimension columns were declared, so there is nothing to join on.
    #[error("no dimension columns declared; a keyed comparison needs at least one")]
    NoneDeclared,

    /// A declared dimension is not a column of one side.
    #[error("{side} extract has no dimension column '{name}'")]
    Absent { side: Side, name: String },
}

/// A data line whose field count disagrees with the normalized header.
///
/// Not fatal: the row is skipped and the error is carried in the result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowParseError {
    pub side: Side,
    /// 1-based line number within the whole extract (header lines included).
    pub line: usize,
    pub expected: usize,
    pub found: usize,
}

impl std::fmt::Display for RowParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} extract, line {}: expected {} field(s), found {}",
            self.side, self.line, self.expected, self.found
        )
    }
}
