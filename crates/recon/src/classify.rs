use rust_decimal::Decimal;
use tracing::debug;

use crate::model::{CellValue, ColumnRole, JoinedColumn, JoinedTable, Note};

/// Written into a variance cell when `source - target` overflows the
/// decimal range. Never equal to zero, so the row fails.
pub const VARIANCE_OVERFLOW: &str = "#OVERFLOW";

/// A metric takes part in variance only if neither side holds non-empty
/// text. Empty text and nulls count as missing values.
pub fn is_numeric_metric(source: &JoinedColumn, target: &JoinedColumn) -> bool {
    source
        .values
        .iter()
        .chain(&target.values)
        .all(|v| v.is_blank() || matches!(v, CellValue::Numeric(_)))
}

/// Variance and note for one aligned pair of cells.
///
/// Variance treats a missing operand as zero. The note is decided in fixed
/// priority: equal, unequal, target missing, source missing. A pair with
/// both sides missing lands on the target-missing note.
pub fn compare_cells(source: &CellValue, target: &CellValue) -> (CellValue, Note) {
    let s = source.as_decimal();
    let t = target.as_decimal();

    let variance = s
        .unwrap_or(Decimal::ZERO)
        .checked_sub(t.unwrap_or(Decimal::ZERO))
        .map(CellValue::Numeric)
        .unwrap_or_else(|| CellValue::Text(VARIANCE_OVERFLOW.to_string()));

    let note = match (s, t) {
        (Some(a), Some(b)) if a == b => Note::DataMatch,
        (Some(_), Some(_)) => Note::ValuesDiffer,
        (_, None) => Note::SourceOnly,
        (None, Some(_)) => Note::TargetOnly,
    };

    (variance, note)
}

/// Insert `<m>_variance` and `<m>_notes` after each numeric metric's
/// source/target pair. Non-numeric metrics pass through unchanged.
pub fn classify(joined: &JoinedTable) -> JoinedTable {
    let mut columns = Vec::with_capacity(joined.columns.len() * 2);
    let mut numeric = 0usize;

    for col in &joined.columns {
        match col.role {
            ColumnRole::Source => {}
            ColumnRole::Target => continue,
            _ => {
                columns.push(col.clone());
                continue;
            }
        }

        let Some(metric) = col.metric.as_deref() else {
            columns.push(col.clone());
            continue;
        };
        let target = joined
            .columns
            .iter()
            .find(|c| c.role == ColumnRole::Target && c.metric.as_deref() == Some(metric));

        columns.push(col.clone());
        let Some(target) = target else {
            continue;
        };
        columns.push(target.clone());

        if !is_numeric_metric(col, target) {
            debug!(metric, "skipping non-numeric metric");
            continue;
        }
        numeric += 1;

        let (variance, notes): (Vec<CellValue>, Vec<CellValue>) = col
            .values
            .iter()
            .zip(&target.values)
            .map(|(s, t)| {
                let (v, note) = compare_cells(s, t);
                (v, CellValue::Text(note.as_str().to_string()))
            })
            .unzip();

        columns.push(JoinedColumn::metric(metric, ColumnRole::Variance, variance));
        columns.push(JoinedColumn::metric(metric, ColumnRole::Notes, notes));
    }

    debug!(numeric_metrics = numeric, rows = joined.row_count, "variance classified");

    JoinedTable {
        dimensions: joined.dimensions.clone(),
        columns,
        row_count: joined.row_count,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn num(s: &str) -> CellValue {
        CellValue::Numeric(Decimal::from_str(s).unwrap())
    }

    fn text(s: &str) -> CellValue {
        CellValue::Text(s.into())
    }

    #[test]
    fn equal_values_match() {
        assert_eq!(compare_cells(&num("10"), &num("10")), (num("0"), Note::DataMatch));
        assert_eq!(compare_cells(&num("10"), &num("10.00")).1, Note::DataMatch);
    }

    #[test]
    fn unequal_values() {
        assert_eq!(compare_cells(&num("10"), &num("7.5")), (num("2.5"), Note::ValuesDiffer));
    }

    #[test]
    fn source_only_reports_full_value() {
        assert_eq!(compare_cells(&num("5"), &CellValue::Null), (num("5"), Note::SourceOnly));
    }

    #[test]
    fn target_only_reports_negated_value() {
        assert_eq!(compare_cells(&CellValue::Null, &num("7")), (num("-7"), Note::TargetOnly));
    }

    #[test]
    fn zero_against_missing_is_not_a_match() {
        let (variance, note) = compare_cells(&num("0"), &CellValue::Null);
        assert_eq!(variance, num("0"));
        assert_eq!(note, Note::SourceOnly);
    }

    #[test]
    fn blank_text_counts_as_missing() {
        assert_eq!(compare_cells(&text(""), &num("3")), (num("-3"), Note::TargetOnly));
    }

    #[test]
    fn both_missing() {
        assert_eq!(compare_cells(&CellValue::Null, &CellValue::Null), (num("0"), Note::SourceOnly));
    }

    #[test]
    fn overflow_is_flagged() {
        let (variance, _) = compare_cells(&CellValue::Numeric(Decimal::MAX), &CellValue::Numeric(Decimal::MIN));
        assert_eq!(variance, text(VARIANCE_OVERFLOW));
    }

    fn joined(cols: Vec<JoinedColumn>, rows: usize) -> JoinedTable {
        JoinedTable { dimensions: vec!["id".into()], columns: cols, row_count: rows }
    }

    fn dim(values: Vec<CellValue>) -> JoinedColumn {
        JoinedColumn { name: "id".into(), role: ColumnRole::Dimension, metric: None, values }
    }

    #[test]
    fn classify_lays_out_metric_groups() {
        let j = joined(
            vec![
                dim(vec![text("A"), text("B")]),
                JoinedColumn::metric("value", ColumnRole::Source, vec![num("10"), num("5")]),
                JoinedColumn::metric("value", ColumnRole::Target, vec![num("10"), CellValue::Null]),
                JoinedColumn::metric("label", ColumnRole::Source, vec![text("x"), text("y")]),
                JoinedColumn::metric("label", ColumnRole::Target, vec![text("x"), CellValue::Null]),
            ],
            2,
        );
        let c = classify(&j);
        assert_eq!(
            c.header(),
            vec![
                "id",
                "value_source",
                "value_target",
                "value_variance",
                "value_notes",
                "label_source",
                "label_target",
            ]
        );
        assert_eq!(c.column("value_variance").unwrap().values, vec![num("0"), num("5")]);
        assert_eq!(
            c.column("value_notes").unwrap().values,
            vec![text("Data Match"), text("Data exists in source, not in target")]
        );
        assert_eq!(c.columns_with_role(ColumnRole::Variance).count(), 1);
    }

    #[test]
    fn blank_cells_do_not_disqualify_a_metric() {
        let s = JoinedColumn::metric("v", ColumnRole::Source, vec![num("1"), text("")]);
        let t = JoinedColumn::metric("v", ColumnRole::Target, vec![CellValue::Null, num("2")]);
        assert!(is_numeric_metric(&s, &t));
        let t = JoinedColumn::metric("v", ColumnRole::Target, vec![text("n/a"), num("2")]);
        assert!(!is_numeric_metric(&s, &t));
    }
}
