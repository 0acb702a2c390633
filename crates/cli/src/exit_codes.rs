//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Exit codes are part of the shell contract: scripts rely on them.
//!
//! # Exit Code Ranges
//!
//! | Range   | Domain           | Description                                  |
//! |---------|------------------|----------------------------------------------|
//! | 0       | Universal        | Success                                      |
//! | 1       | Universal        | Extracts differ (like `diff(1)`)             |
//! | 2       | Universal        | CLI usage error (bad args, missing file)     |
//! | 3-9     | compare / grid   | Reconciliation, conversion and file IO       |
//! | 50-59   | epm              | Planning-service client                      |
//!
//! # Adding New Exit Codes
//!
//! 1. Add the constant in the appropriate range
//! 2. Document what triggers it
//! 3. Update the table above
//! 4. Wire it into the relevant command's error handling

use slicecheck_epm_client::EpmError;
use slicecheck_io::{CompareError, CompareErrorKind, GridError};

// =============================================================================
// Universal (0-2)
// =============================================================================

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// The comparison ran and the extracts differ (status 412).
pub const EXIT_DIFFS: u8 = 1;

/// Usage error - bad arguments, missing required options.
pub const EXIT_USAGE: u8 = 2;

// =============================================================================
// Compare / grid (3-9)
// =============================================================================

/// Header row count is zero or exceeds the extract's line count.
pub const EXIT_COMPARE_HEADER: u8 = 3;

/// No dimensions declared, a declared dimension is not a column, or a
/// dimension name collides with a derived validation column.
pub const EXIT_COMPARE_DIMENSION: u8 = 4;

/// The report workbook could not be built or written.
pub const EXIT_COMPARE_RENDER: u8 = 5;

/// An input file could not be read (unreadable, bad workbook), or a
/// converted output could not be written.
pub const EXIT_INPUT: u8 = 6;

/// The csv crate failed on an extract or on grid CSV.
pub const EXIT_CSV: u8 = 7;

/// Grid JSON or grid CSV does not have the expected shape.
pub const EXIT_GRID_SHAPE: u8 = 8;

// =============================================================================
// Planning service (50-59)
// =============================================================================

/// Could not reach the planning service.
pub const EXIT_EPM_NETWORK: u8 = 50;

/// The planning service answered with a non-2xx status.
pub const EXIT_EPM_HTTP: u8 = 51;

/// A JSON payload or parameters argument is malformed, or the response
/// body was not the expected JSON.
pub const EXIT_EPM_PAYLOAD: u8 = 52;

/// The job was still in progress after the last allowed poll.
pub const EXIT_EPM_RETRIES: u8 = 53;

/// The job finished with a non-success status.
pub const EXIT_EPM_JOB_FAILED: u8 = 54;

/// Connection settings or password missing.
pub const EXIT_EPM_CONFIG: u8 = 55;

/// Map a comparison failure to its exit code.
pub fn compare_exit_code(err: &CompareError) -> u8 {
    match err.kind() {
        CompareErrorKind::MalformedHeader => EXIT_COMPARE_HEADER,
        CompareErrorKind::MissingDimension | CompareErrorKind::ColumnCollision => {
            EXIT_COMPARE_DIMENSION
        }
        CompareErrorKind::Csv => EXIT_CSV,
        CompareErrorKind::Render => EXIT_COMPARE_RENDER,
        CompareErrorKind::Input => EXIT_INPUT,
    }
}

pub fn grid_exit_code(err: &GridError) -> u8 {
    match err {
        GridError::Csv(_) => EXIT_CSV,
        GridError::Shape(_) | GridError::PovMismatch { .. } => EXIT_GRID_SHAPE,
    }
}

/// Map a planning-service error to its exit code.
pub fn epm_exit_code(err: &EpmError) -> u8 {
    match err {
        EpmError::Config(_) => EXIT_EPM_CONFIG,
        EpmError::Network(_) => EXIT_EPM_NETWORK,
        EpmError::Http(..) => EXIT_EPM_HTTP,
        EpmError::Parse(_) | EpmError::InvalidPayload(_) => EXIT_EPM_PAYLOAD,
        EpmError::RetriesExhausted { .. } => EXIT_EPM_RETRIES,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_distinct() {
        let codes = [
            EXIT_SUCCESS,
            EXIT_DIFFS,
            EXIT_USAGE,
            EXIT_COMPARE_HEADER,
            EXIT_COMPARE_DIMENSION,
            EXIT_COMPARE_RENDER,
            EXIT_INPUT,
            EXIT_CSV,
            EXIT_GRID_SHAPE,
            EXIT_EPM_NETWORK,
            EXIT_EPM_HTTP,
            EXIT_EPM_PAYLOAD,
            EXIT_EPM_RETRIES,
            EXIT_EPM_JOB_FAILED,
            EXIT_EPM_CONFIG,
        ];
        let mut sorted = codes.to_vec();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(sorted.len(), codes.len());
    }

    #[test]
    fn test_epm_mapping() {
        assert_eq!(epm_exit_code(&EpmError::Network("refused".into())), EXIT_EPM_NETWORK);
        assert_eq!(epm_exit_code(&EpmError::Http(401, String::new())), EXIT_EPM_HTTP);
        assert_eq!(epm_exit_code(&EpmError::InvalidPayload("x".into())), EXIT_EPM_PAYLOAD);
        assert_eq!(
            epm_exit_code(&EpmError::RetriesExhausted {
                job_id: "1".into(),
                polls: 3,
                last_status: "Processing".into(),
            }),
            EXIT_EPM_RETRIES
        );
    }

    #[test]
    fn test_grid_mapping() {
        assert_eq!(grid_exit_code(&GridError::Shape("rows".into())), EXIT_GRID_SHAPE);
    }
}
