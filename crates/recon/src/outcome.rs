use crate::model::{CellValue, ColumnRole, JoinedColumn, JoinedTable, RowOutcome, OUTCOME_COLUMN};

/// A variance cell passes only if it is numerically zero.
pub fn variance_passes(cell: &CellValue) -> bool {
    matches!(cell, CellValue::Numeric(d) if d.is_zero())
}

/// One verdict per row: `Fail` if any variance cell on the row is non-zero.
/// Rows of a table without variance columns all succeed.
pub fn row_outcomes(classified: &JoinedTable) -> Vec<RowOutcome> {
    let variances: Vec<&JoinedColumn> = classified.columns_with_role(ColumnRole::Variance).collect();

    (0..classified.row_count)
        .map(|row| {
            if variances.iter().all(|c| variance_passes(&c.values[row])) {
                RowOutcome::Success
            } else {
                RowOutcome::Fail
            }
        })
        .collect()
}

/// Copy of `classified` with the trailing outcome column appended.
pub fn with_outcomes(classified: &JoinedTable, outcomes: &[RowOutcome]) -> JoinedTable {
    debug_assert_eq!(outcomes.len(), classified.row_count);

    let mut columns = classified.columns.clone();
    columns.push(JoinedColumn {
        name: OUTCOME_COLUMN.to_string(),
        role: ColumnRole::Outcome,
        metric: None,
        values: outcomes
            .iter()
            .map(|o| CellValue::Text(o.as_str().to_string()))
            .collect(),
    });

    JoinedTable {
        dimensions: classified.dimensions.clone(),
        columns,
        row_count: classified.row_count,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn num(n: i64) -> CellValue {
        CellValue::Numeric(Decimal::from(n))
    }

    fn table(variances: Vec<Vec<CellValue>>, rows: usize) -> JoinedTable {
        let columns = variances
            .into_iter()
            .enumerate()
            .map(|(i, values)| JoinedColumn::metric(&format!("m{i}"), ColumnRole::Variance, values))
            .collect();
        JoinedTable { dimensions: vec![], columns, row_count: rows }
    }

    #[test]
    fn any_nonzero_variance_fails() {
        let t = table(vec![vec![num(0), num(0), num(3)], vec![num(0), num(-1), num(0)]], 3);
        assert_eq!(
            row_outcomes(&t),
            vec![RowOutcome::Success, RowOutcome::Fail, RowOutcome::Fail]
        );
    }

    #[test]
    fn no_variance_columns_is_vacuous_success() {
        let t = table(vec![], 2);
        assert_eq!(row_outcomes(&t), vec![RowOutcome::Success, RowOutcome::Success]);
    }

    #[test]
    fn overflow_marker_fails() {
        let t = table(vec![vec![CellValue::Text("#OVERFLOW".into())]], 1);
        assert_eq!(row_outcomes(&t), vec![RowOutcome::Fail]);
    }

    #[test]
    fn outcome_column_is_appended_last() {
        let t = table(vec![vec![num(0), num(2)]], 2);
        let out = with_outcomes(&t, &row_outcomes(&t));
        let last = out.columns.last().unwrap();
        assert_eq!(last.name, OUTCOME_COLUMN);
        assert_eq!(last.role, ColumnRole::Outcome);
        assert_eq!(
            last.values,
            vec![CellValue::Text("success".into()), CellValue::Text("fail".into())]
        );
    }
}
