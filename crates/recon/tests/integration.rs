use std::path::PathBuf;
use std::str::FromStr;

use rust_decimal::Decimal;
use slicecheck_recon::model::ColumnRole;
use slicecheck_recon::{reconcile_text, CellValue, Note, ReconError, Reconciliation, RowOutcome};

fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn fixture(name: &str) -> String {
    let path = fixtures_dir().join(name);
    std::fs::read_to_string(&path).unwrap_or_else(|e| panic!("cannot read {}: {e}", path.display()))
}

fn dims(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

fn num(s: &str) -> CellValue {
    CellValue::Numeric(Decimal::from_str(s).unwrap())
}

fn text(s: &str) -> CellValue {
    CellValue::Text(s.into())
}

fn run_fixtures() -> Reconciliation {
    reconcile_text(
        &fixture("planning-extract.csv"),
        &fixture("ledger-extract.csv"),
        2,
        1,
        &dims(&["Entity", "Account"]),
    )
    .unwrap()
}

// -------------------------------------------------------------------------
// Scenarios
// -------------------------------------------------------------------------

#[test]
fn matching_row_succeeds() {
    let r = reconcile_text("id,value\nA,10\n", "id,value\nA,10\n", 1, 1, &dims(&["id"])).unwrap();
    let v = &r.validation;
    assert_eq!(v.column("value_variance").unwrap().values, vec![num("0")]);
    assert_eq!(v.column("value_notes").unwrap().values, vec![text("Data Match")]);
    assert_eq!(v.column("rowfailure").unwrap().values, vec![text("success")]);
}

#[test]
fn source_only_row_fails() {
    let r = reconcile_text("id,value\nB,5\n", "id,value\n", 1, 1, &dims(&["id"])).unwrap();
    let v = &r.validation;
    assert_eq!(v.column("value_source").unwrap().values, vec![num("5")]);
    assert_eq!(v.column("value_target").unwrap().values, vec![CellValue::Null]);
    assert_eq!(v.column("value_variance").unwrap().values, vec![num("5")]);
    assert_eq!(
        v.column("value_notes").unwrap().values,
        vec![text("Data exists in source, not in target")]
    );
    assert_eq!(r.outcomes, vec![RowOutcome::Fail]);
}

#[test]
fn duplicate_source_keys_pair_with_each_target_row() {
    let r = reconcile_text(
        "id,value\nC,1\nC,2\n",
        "id,value\nC,2\n",
        1,
        1,
        &dims(&["id"]),
    )
    .unwrap();
    assert_eq!(r.validation.row_count, 2);
    assert_eq!(r.validation.column("id").unwrap().values, vec![text("C"), text("C")]);
    assert_eq!(r.validation.column("value_target").unwrap().values, vec![num("2"), num("2")]);
    assert_eq!(r.outcomes, vec![RowOutcome::Fail, RowOutcome::Success]);
}

#[test]
fn target_only_key_reports_negated_target() {
    let r = reconcile_text("id,value\n", "id,value\nT,8\n", 1, 1, &dims(&["id"])).unwrap();
    let v = &r.validation;
    assert_eq!(v.column("value_source").unwrap().values, vec![CellValue::Null]);
    assert_eq!(v.column("value_variance").unwrap().values, vec![num("-8")]);
    assert_eq!(
        v.column("value_notes").unwrap().values,
        vec![text("Data exists in target, not in source")]
    );
}

// -------------------------------------------------------------------------
// Fixture extracts (two-row planning header vs flat ledger header)
// -------------------------------------------------------------------------

#[test]
fn fixture_layout() {
    let r = run_fixtures();
    assert_eq!(
        r.source.header().names(),
        &["Entity", "Account", "Jan_Actual", "Jan_Plan", "Feb_Actual", "Feb_Plan"]
    );
    assert_eq!(r.source.header().names(), r.target.header().names());

    let header = r.validation.header();
    assert_eq!(&header[..2], &["Entity", "Account"]);
    assert_eq!(
        &header[2..6],
        &["Jan_Actual_source", "Jan_Actual_target", "Jan_Actual_variance", "Jan_Actual_notes"]
    );
    assert_eq!(header.last(), Some(&"rowfailure"));
    assert_eq!(header.len(), 2 + 4 * 4 + 1);
}

#[test]
fn fixture_outcomes() {
    let r = run_fixtures();
    assert!(!r.hashes.exact_match);
    assert_eq!(
        r.outcomes,
        vec![
            RowOutcome::Success, // E100/4000, 1200.50 == 1200.5
            RowOutcome::Fail,    // E100/5000, Feb actual 310 vs 300
            RowOutcome::Success, // E200/4000 first source row
            RowOutcome::Fail,    // E200/4000 duplicate source row
            RowOutcome::Success, // E300/6000
            RowOutcome::Fail,    // E400/7000 target only
        ]
    );

    let summary = r.summary();
    assert_eq!(summary.joined_rows, 6);
    assert_eq!(summary.failing_rows, 3);
    assert_eq!(summary.numeric_metrics, 4);
}

#[test]
fn fixture_target_only_row() {
    let r = run_fixtures();
    let v = &r.validation;
    let last = v.row_count - 1;
    assert_eq!(v.column("Entity").unwrap().values[last], text("E400"));
    assert_eq!(v.column("Jan_Actual_variance").unwrap().values[last], num("-42"));
    // Zero on the target side still counts as present data.
    assert_eq!(v.column("Jan_Plan_variance").unwrap().values[last], num("0"));
    assert_eq!(
        v.column("Jan_Plan_notes").unwrap().values[last],
        text(Note::TargetOnly.as_str())
    );
}

#[test]
fn every_classified_cell_has_exactly_one_note() {
    let r = run_fixtures();
    let labels = [Note::DataMatch, Note::ValuesDiffer, Note::SourceOnly, Note::TargetOnly];
    for col in r.validation.columns_with_role(ColumnRole::Notes) {
        for cell in &col.values {
            let matches = labels
                .iter()
                .filter(|n| *cell == CellValue::Text(n.as_str().to_string()))
                .count();
            assert_eq!(matches, 1, "column {} has unexpected note {cell:?}", col.name);
        }
    }
}

#[test]
fn identical_fixture_is_exact_match() {
    let text = fixture("planning-extract.csv");
    let r = reconcile_text(&text, &text, 2, 2, &dims(&["Entity", "Account"])).unwrap();
    assert!(r.hashes.exact_match);
    // Duplicate keys still multiply: E200/4000 appears twice on each side.
    assert_eq!(r.validation.row_count, 7);
}

#[test]
fn overlong_decimal_is_not_rounded_into_a_match() {
    let nines = format!("0.{}", "9".repeat(40));
    let source = format!("id,v\nA,{nines}\n");
    let target = format!("id,v\nA,1.{}\n", "0".repeat(28));

    let r = reconcile_text(&source, &target, 1, 1, &dims(&["id"])).unwrap();
    assert!(!r.hashes.exact_match);
    assert_eq!(r.validation.column("v_source").unwrap().values, vec![text(&nines)]);
    assert!(r.validation.column("v_variance").is_none());
}

#[test]
fn dimension_clashing_with_derived_column_is_fatal() {
    let err = reconcile_text("v_source,v\nA,1\n", "v_source,v\nA,2\n", 1, 1, &dims(&["v_source"]))
        .unwrap_err();
    assert!(matches!(err, ReconError::ColumnCollision { ref name, .. } if name == "v_source"));

    let err = reconcile_text("rowfailure,v\nA,1\n", "rowfailure,v\nA,1\n", 1, 1, &dims(&["rowfailure"]))
        .unwrap_err();
    assert!(matches!(err, ReconError::ColumnCollision { .. }));
}

#[test]
fn joined_header_names_are_unique() {
    let r = run_fixtures();
    let header = r.validation.header();
    let mut seen = std::collections::HashSet::new();
    for name in &header {
        assert!(seen.insert(*name), "duplicate column {name} in {header:?}");
    }
}
