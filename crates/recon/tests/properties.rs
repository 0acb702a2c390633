// Property-based tests for the reconciliation pipeline.
// CI: 256 cases (default). Soak: PROPTEST_CASES=10000 cargo test --release

use std::collections::{BTreeMap, HashMap, HashSet};

use proptest::prelude::*;
use slicecheck_recon::header::ensure_unique;
use slicecheck_recon::model::ColumnRole;
use slicecheck_recon::outcome::variance_passes;
use slicecheck_recon::{reconcile_text, CellValue, Note, RowOutcome};

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

fn config() -> ProptestConfig {
    ProptestConfig {
        cases: std::env::var("PROPTEST_CASES")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(256),
        failure_persistence: None,
        ..ProptestConfig::default()
    }
}

// ---------------------------------------------------------------------------
// Generators
// ---------------------------------------------------------------------------

/// Metric value: mostly numeric, sometimes empty.
fn arb_value() -> impl Strategy<Value = String> {
    prop_oneof![
        4 => r"-?[0-9]{1,6}(\.[0-9]{1,2})?",
        1 => Just(String::new()),
    ]
}

/// Rows of `key,amount,qty` with keys drawn from a small alphabet so that
/// duplicates and overlaps between sides are common.
fn arb_rows() -> impl Strategy<Value = Vec<(String, String, String)>> {
    prop::collection::vec(("[A-E]", arb_value(), arb_value()), 0..12)
}

/// Same shape, one row per key.
fn arb_unique_rows() -> impl Strategy<Value = Vec<(String, String, String)>> {
    prop::collection::btree_map("[A-H]", (arb_value(), arb_value()), 0..8)
        .prop_map(|m| m.into_iter().map(|(k, (a, q))| (k, a, q)).collect())
}

fn arb_header_names() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(
        prop_oneof![
            3 => "[ab]",
            1 => Just("a_1".to_string()),
            1 => Just("a_2".to_string()),
            1 => Just(String::new()),
        ],
        0..10,
    )
}

fn extract(rows: &[(String, String, String)]) -> String {
    let mut text = String::from("key,amount,qty\n");
    for (k, a, q) in rows {
        text.push_str(&format!("{k},{a},{q}\n"));
    }
    text
}

fn dims() -> Vec<String> {
    vec!["key".to_string()]
}

fn key_counts(rows: &[(String, String, String)]) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for (k, _, _) in rows {
        *counts.entry(k.clone()).or_insert(0) += 1;
    }
    counts
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(config())]

    #[test]
    fn header_names_are_unique_and_aligned(names in arb_header_names()) {
        let out = ensure_unique(names.clone());
        prop_assert_eq!(out.len(), names.len());
        let distinct: HashSet<&String> = out.iter().collect();
        prop_assert_eq!(distinct.len(), out.len());

        // The first occurrence of every name survives unchanged.
        let mut first_seen = HashSet::new();
        for (given, produced) in names.iter().zip(&out) {
            if first_seen.insert(given.clone()) {
                prop_assert_eq!(given, produced);
            }
        }
    }

    #[test]
    fn hash_is_reflexive_and_symmetric(a in arb_rows(), b in arb_rows()) {
        let (ta, tb) = (extract(&a), extract(&b));

        let same = reconcile_text(&ta, &ta, 1, 1, &dims()).unwrap();
        prop_assert!(same.hashes.exact_match);
        prop_assert_eq!(&same.hashes.source, &same.hashes.target);

        let ab = reconcile_text(&ta, &tb, 1, 1, &dims()).unwrap();
        let ba = reconcile_text(&tb, &ta, 1, 1, &dims()).unwrap();
        prop_assert_eq!(ab.hashes.exact_match, ba.hashes.exact_match);
        prop_assert_eq!(&ab.hashes.source, &ba.hashes.target);
    }

    #[test]
    fn row_fails_iff_some_variance_is_nonzero(a in arb_rows(), b in arb_rows()) {
        let r = reconcile_text(&extract(&a), &extract(&b), 1, 1, &dims()).unwrap();
        let variances: Vec<_> = r.validation.columns_with_role(ColumnRole::Variance).collect();
        prop_assert_eq!(r.outcomes.len(), r.validation.row_count);

        for (row, outcome) in r.outcomes.iter().enumerate() {
            let all_zero = variances.iter().all(|c| variance_passes(&c.values[row]));
            prop_assert_eq!(*outcome == RowOutcome::Success, all_zero);
        }
    }

    #[test]
    fn every_key_survives_the_join(a in arb_rows(), b in arb_rows()) {
        let r = reconcile_text(&extract(&a), &extract(&b), 1, 1, &dims()).unwrap();
        let (sc, tc) = (key_counts(&a), key_counts(&b));

        let mut joined: HashMap<String, usize> = HashMap::new();
        for cell in &r.validation.column("key").unwrap().values {
            *joined.entry(cell.to_string()).or_insert(0) += 1;
        }

        let keys: HashSet<&String> = sc.keys().chain(tc.keys()).collect();
        prop_assert_eq!(joined.len(), keys.len());
        for key in keys {
            let s = sc.get(key).copied().unwrap_or(0);
            let t = tc.get(key).copied().unwrap_or(0);
            let expected = if s > 0 && t > 0 { s * t } else { s + t };
            prop_assert_eq!(joined.get(key.as_str()).copied(), Some(expected), "key {}", key);
        }
    }

    #[test]
    fn each_classified_cell_carries_one_note(a in arb_rows(), b in arb_rows()) {
        let r = reconcile_text(&extract(&a), &extract(&b), 1, 1, &dims()).unwrap();
        for col in r.validation.columns_with_role(ColumnRole::Notes) {
            prop_assert_eq!(col.values.len(), r.validation.row_count);
            for cell in &col.values {
                let label = match cell {
                    CellValue::Text(s) => s.as_str(),
                    other => return Err(TestCaseError::fail(format!("non-text note {other:?}"))),
                };
                prop_assert!(Note::from_label(label).is_some(), "unknown note {}", label);
            }
        }
    }

    #[test]
    fn identical_unique_keys_all_succeed(rows in arb_unique_rows()) {
        let text = extract(&rows);
        let r = reconcile_text(&text, &text, 1, 1, &dims()).unwrap();
        prop_assert_eq!(r.validation.row_count, rows.len());
        prop_assert!(r.outcomes.iter().all(|o| *o == RowOutcome::Success));
    }
}
