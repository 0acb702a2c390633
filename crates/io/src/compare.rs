//! The single comparison entry point: two extracts in, one report out.

use std::path::{Path, PathBuf};

use serde::Serialize;
use slicecheck_recon::{
    reconcile_text, HashCheck, MissingDimension, ReconError, ReconSummary, RowParseError,
};
use thiserror::Error;
use tracing::info;

use crate::error::{InputError, RenderError};
use crate::xlsx::{export_report, read_extract};

/// HTTP-flavoured result of a comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(into = "u16")]
pub enum StatusCode {
    /// Both extracts hash identically (200).
    ExactMatch,
    /// The report was written but the extracts differ (412).
    Mismatch,
    /// Nothing usable was produced (500).
    InternalFailure,
}

impl StatusCode {
    pub fn as_u16(self) -> u16 {
        match self {
            StatusCode::ExactMatch => 200,
            StatusCode::Mismatch => 412,
            StatusCode::InternalFailure => 500,
        }
    }
}

impl From<StatusCode> for u16 {
    fn from(code: StatusCode) -> u16 {
        code.as_u16()
    }
}

impl std::fmt::Display for StatusCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_u16())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompareSummary {
    #[serde(flatten)]
    pub recon: ReconSummary,
    pub hidden_rows: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct CompareOutcome {
    pub status: StatusCode,
    pub output: PathBuf,
    pub hashes: HashCheck,
    pub source_row_errors: Vec<RowParseError>,
    pub target_row_errors: Vec<RowParseError>,
    pub summary: CompareSummary,
}

impl CompareOutcome {
    pub fn row_error_count(&self) -> usize {
        self.source_row_errors.len() + self.target_row_errors.len()
    }
}

#[derive(Debug, Error)]
pub enum CompareError {
    #[error(transparent)]
    Recon(#[from] ReconError),

    #[error("render failed: {0}")]
    Render(#[from] RenderError),

    #[error(transparent)]
    Input(#[from] InputError),
}

/// Which fatal stage stopped a comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CompareErrorKind {
    MalformedHeader,
    MissingDimension,
    ColumnCollision,
    Csv,
    Render,
    Input,
}

impl CompareError {
    /// Every fatal error maps to 500.
    pub fn status(&self) -> StatusCode {
        StatusCode::InternalFailure
    }

    pub fn kind(&self) -> CompareErrorKind {
        match self {
            CompareError::Recon(ReconError::ZeroHeaderRows { .. })
            | CompareError::Recon(ReconError::MalformedHeader { .. }) => {
                CompareErrorKind::MalformedHeader
            }
            CompareError::Recon(ReconError::MissingDimension(_)) => {
                CompareErrorKind::MissingDimension
            }
            CompareError::Recon(ReconError::ColumnCollision { .. }) => {
                CompareErrorKind::ColumnCollision
            }
            CompareError::Recon(ReconError::Csv { .. }) => CompareErrorKind::Csv,
            CompareError::Render(_) => CompareErrorKind::Render,
            CompareError::Input(_) => CompareErrorKind::Input,
        }
    }

    pub fn missing_dimension(&self) -> Option<&MissingDimension> {
        match self {
            CompareError::Recon(ReconError::MissingDimension(m)) => Some(m),
            _ => None,
        }
    }
}

/// Reconcile two in-memory extracts and write the report to `destination`.
///
/// On success the status is 200 when the extracts hash identically and 412
/// otherwise. Any error means no report was written.
pub fn compare(
    source_text: &str,
    target_text: &str,
    destination: &Path,
    source_header_rows: usize,
    target_header_rows: usize,
    dimensions: &[String],
) -> Result<CompareOutcome, CompareError> {
    let recon = reconcile_text(
        source_text,
        target_text,
        source_header_rows,
        target_header_rows,
        dimensions,
    )?;
    let export = export_report(&recon, destination)?;

    let status = if recon.hashes.exact_match {
        StatusCode::ExactMatch
    } else {
        StatusCode::Mismatch
    };
    info!(status = status.as_u16(), output = %destination.display(), "comparison finished");

    Ok(CompareOutcome {
        status,
        output: destination.to_path_buf(),
        summary: CompareSummary {
            recon: recon.summary(),
            hidden_rows: export.hidden_rows,
        },
        hashes: recon.hashes,
        source_row_errors: recon.source_row_errors,
        target_row_errors: recon.target_row_errors,
    })
}

/// Where to read one side of a comparison from.
#[derive(Debug, Clone, Copy)]
pub struct ExtractRef<'a> {
    pub path: &'a Path,
    /// Worksheet to read when `path` is a spreadsheet; first sheet if unset.
    pub sheet: Option<&'a str>,
}

impl<'a> ExtractRef<'a> {
    pub fn new(path: &'a Path) -> Self {
        Self { path, sheet: None }
    }

    pub fn with_sheet(mut self, sheet: Option<&'a str>) -> Self {
        self.sheet = sheet;
        self
    }
}

/// [`compare`] over extracts on disk.
pub fn compare_files(
    source: ExtractRef<'_>,
    target: ExtractRef<'_>,
    destination: &Path,
    source_header_rows: usize,
    target_header_rows: usize,
    dimensions: &[String],
) -> Result<CompareOutcome, CompareError> {
    let source_text = read_extract(source.path, source.sheet)?;
    let target_text = read_extract(target.path, target.sheet)?;
    compare(
        &source_text,
        &target_text,
        destination,
        source_header_rows,
        target_header_rows,
        dimensions,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dims(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(StatusCode::ExactMatch.as_u16(), 200);
        assert_eq!(StatusCode::Mismatch.as_u16(), 412);
        assert_eq!(StatusCode::InternalFailure.as_u16(), 500);
        assert_eq!(serde_json::to_string(&StatusCode::Mismatch).unwrap(), "412");
    }

    #[test]
    fn test_identical_extracts_are_200() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("report.xlsx");
        let text = "id,value\nA,10\n";
        let outcome = compare(text, text, &out, 1, 1, &dims(&["id"])).unwrap();
        assert_eq!(outcome.status, StatusCode::ExactMatch);
        assert_eq!(outcome.summary.hidden_rows, 1);
        assert!(out.exists());
    }

    #[test]
    fn test_different_extracts_are_412() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("report.xlsx");
        let outcome = compare("id,v\nA,1\n", "id,v\nA,2\n", &out, 1, 1, &dims(&["id"])).unwrap();
        assert_eq!(outcome.status, StatusCode::Mismatch);
        assert_eq!(outcome.summary.recon.failing_rows, 1);
        assert_eq!(outcome.summary.hidden_rows, 0);
    }

    #[test]
    fn test_malformed_header_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("report.xlsx");
        let err = compare("id,v\n", "id,v\n", &out, 3, 1, &dims(&["id"])).unwrap_err();
        assert_eq!(err.kind(), CompareErrorKind::MalformedHeader);
        assert_eq!(err.status(), StatusCode::InternalFailure);
        assert!(!out.exists());
    }

    #[test]
    fn test_column_collision_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("report.xlsx");
        let err = compare("v_target,v\nA,1\n", "v_target,v\nA,2\n", &out, 1, 1, &dims(&["v_target"]))
            .unwrap_err();
        assert_eq!(err.kind(), CompareErrorKind::ColumnCollision);
        assert_eq!(err.status(), StatusCode::InternalFailure);
        assert!(!out.exists());
    }

    #[test]
    fn test_missing_dimension_kind() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("report.xlsx");
        // Two columns cannot carry three dimensions.
        let err = compare("id,v\nA,1\n", "id,v\nA,1\n", &out, 1, 1, &dims(&["id", "region", "product"]))
            .unwrap_err();
        assert_eq!(err.kind(), CompareErrorKind::MissingDimension);
        assert!(err.missing_dimension().is_some());
        assert!(!out.exists());
    }

    #[test]
    fn test_unwritable_destination_is_render_error() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("no_such_dir").join("report.xlsx");
        let err = compare("id,v\nA,1\n", "id,v\nA,1\n", &out, 1, 1, &dims(&["id"])).unwrap_err();
        assert_eq!(err.kind(), CompareErrorKind::Render);
        assert!(!out.exists());
    }

    #[test]
    fn test_unreadable_input_is_input_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.csv");
        let err = compare_files(
            ExtractRef::new(&missing),
            ExtractRef::new(&missing),
            &dir.path().join("report.xlsx"),
            1,
            1,
            &dims(&["id"]),
        )
        .unwrap_err();
        assert_eq!(err.kind(), CompareErrorKind::Input);
    }

    #[test]
    fn test_outcome_serializes_status_as_number() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("report.xlsx");
        let outcome = compare("id,v\nA,1\n", "id,v\nB,1\n", &out, 1, 1, &dims(&["id"])).unwrap();
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["status"], 412);
        assert_eq!(json["summary"]["joined_rows"], 2);
        assert_eq!(json["summary"]["hidden_rows"], 0);
        assert_eq!(json["hashes"]["exact_match"], false);
    }
}
