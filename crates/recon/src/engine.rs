use tracing::info;

use crate::classify::classify;
use crate::error::{ReconError, RowParseError};
use crate::hash::{verify, HashCheck};
use crate::header::RawExtract;
use crate::join::{check_column_names, key_table, outer_join};
use crate::loader::load_table;
use crate::model::{ColumnRole, JoinedTable, ReconSummary, RowOutcome, Side, Table};
use crate::outcome::{row_outcomes, with_outcomes};

/// Everything one comparison produces, ready for rendering.
#[derive(Debug, Clone)]
pub struct Reconciliation {
    pub dimensions: Vec<String>,
    pub source: Table,
    pub target: Table,
    pub hashes: HashCheck,
    /// Joined, classified table with the trailing outcome column.
    pub validation: JoinedTable,
    pub outcomes: Vec<RowOutcome>,
    pub source_row_errors: Vec<RowParseError>,
    pub target_row_errors: Vec<RowParseError>,
}

impl Reconciliation {
    pub fn summary(&self) -> ReconSummary {
        let failing_rows = self.outcomes.iter().filter(|o| **o == RowOutcome::Fail).count();
        ReconSummary {
            source_rows: self.source.row_count(),
            target_rows: self.target.row_count(),
            joined_rows: self.validation.row_count,
            failing_rows,
            passing_rows: self.outcomes.len() - failing_rows,
            metrics: self.validation.columns_with_role(ColumnRole::Source).count(),
            numeric_metrics: self.validation.columns_with_role(ColumnRole::Variance).count(),
        }
    }

    pub fn row_error_count(&self) -> usize {
        self.source_row_errors.len() + self.target_row_errors.len()
    }
}

/// Run the whole pipeline on two extracts that share `dimensions`.
///
/// Stages run strictly in order and each returns a fresh structure:
/// load both sides, hash, key, join, classify, derive outcomes.
pub fn reconcile(
    source: &RawExtract,
    target: &RawExtract,
    dimensions: &[String],
) -> Result<Reconciliation, ReconError> {
    debug_assert_eq!(source.side, Side::Source);
    debug_assert_eq!(target.side, Side::Target);

    let source_loaded = load_table(source, dimensions)?;
    let target_loaded = load_table(target, dimensions)?;

    let hashes = verify(&source_loaded.table, &target_loaded.table)?;
    info!(
        source = %hashes.source,
        target = %hashes.target,
        exact_match = hashes.exact_match,
        "content hashes"
    );

    let source_keyed = key_table(&source_loaded.table, dimensions)?;
    let target_keyed = key_table(&target_loaded.table, dimensions)?;
    check_column_names(&source_keyed, &target_keyed)?;
    let joined = outer_join(&source_keyed, &target_keyed);

    let classified = classify(&joined);
    let outcomes = row_outcomes(&classified);
    let validation = with_outcomes(&classified, &outcomes);

    let result = Reconciliation {
        dimensions: dimensions.to_vec(),
        source: source_loaded.table,
        target: target_loaded.table,
        hashes,
        validation,
        outcomes,
        source_row_errors: source_loaded.row_errors,
        target_row_errors: target_loaded.row_errors,
    };

    let summary = result.summary();
    info!(
        joined_rows = summary.joined_rows,
        failing_rows = summary.failing_rows,
        numeric_metrics = summary.numeric_metrics,
        skipped_rows = result.row_error_count(),
        "reconciliation complete"
    );

    Ok(result)
}

/// Convenience wrapper over [`reconcile`] for in-memory text.
pub fn reconcile_text(
    source_text: &str,
    target_text: &str,
    source_header_rows: usize,
    target_header_rows: usize,
    dimensions: &[String],
) -> Result<Reconciliation, ReconError> {
    let source = RawExtract::from_text(Side::Source, source_text, source_header_rows);
    let target = RawExtract::from_text(Side::Target, target_text, target_header_rows);
    reconcile(&source, &target, dimensions)
}
