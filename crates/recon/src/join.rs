//! Full outer join on the composite dimension key.
//!
//! Row order: every source row in source order, each paired with all
//! target rows sharing its key (or with a null target when there are none),
//! followed by target rows whose key never appears in the source, in target
//! order. Duplicate keys multiply: n source rows × m target rows → n·m rows.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::error::{MissingDimension, ReconError};
use crate::model::{
    CellValue, ColumnRole, JoinedColumn, JoinedTable, KeyedRow, KeyedTable, RowKey, Side, Table,
    OUTCOME_COLUMN,
};

/// Promote `dimensions` to the composite key. Every other column becomes a
/// metric, in header order.
pub fn key_table(table: &Table, dimensions: &[String]) -> Result<KeyedTable, ReconError> {
    if dimensions.is_empty() {
        return Err(MissingDimension::NoneDeclared.into());
    }

    let header = table.header();
    let key_positions = dimensions
        .iter()
        .map(|name| {
            header.position(name).ok_or_else(|| MissingDimension::Absent {
                side: table.side,
                name: name.clone(),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let metric_positions: Vec<usize> = (0..header.len())
        .filter(|i| !key_positions.contains(i))
        .collect();
    let metrics = metric_positions
        .iter()
        .map(|&i| header.names()[i].clone())
        .collect();

    let rows = table
        .rows()
        .iter()
        .map(|row| KeyedRow {
            key: RowKey(key_positions.iter().map(|&i| row[i].clone()).collect()),
            metrics: metric_positions.iter().map(|&i| row[i].clone()).collect(),
        })
        .collect();

    Ok(KeyedTable {
        side: table.side,
        dimensions: dimensions.to_vec(),
        metrics,
        rows,
    })
}

/// Union of both sides' metric names: source order first, then metrics
/// that only the target has, in target order.
pub fn metric_union(source: &KeyedTable, target: &KeyedTable) -> Vec<String> {
    let mut seen: HashSet<&str> = HashSet::new();
    source
        .metrics
        .iter()
        .chain(&target.metrics)
        .filter(|m| seen.insert(m.as_str()))
        .cloned()
        .collect()
}

/// Reject dimension names that a derived column would also take: the
/// `<m>_source`, `<m>_target`, `<m>_variance` and `<m>_notes` names of every
/// metric in the union, and the trailing outcome column.
pub fn check_column_names(source: &KeyedTable, target: &KeyedTable) -> Result<(), ReconError> {
    let derived_roles = [
        ColumnRole::Source,
        ColumnRole::Target,
        ColumnRole::Variance,
        ColumnRole::Notes,
    ];
    let metrics = metric_union(source, target);
    for dim in &source.dimensions {
        if dim == OUTCOME_COLUMN {
            return Err(ReconError::ColumnCollision {
                name: dim.clone(),
                existing: "the row outcome column".to_string(),
            });
        }
        for metric in &metrics {
            if derived_roles
                .iter()
                .any(|role| format!("{metric}{}", role.suffix()) == *dim)
            {
                return Err(ReconError::ColumnCollision {
                    name: dim.clone(),
                    existing: format!("a column derived from metric '{metric}'"),
                });
            }
        }
    }
    Ok(())
}

/// Outer-join two keyed tables.
///
/// The result has the dimension columns (unsuffixed) followed by
/// `<m>_source`, `<m>_target` for every metric in the union. A metric
/// a side lacks entirely is null on that side.
pub fn outer_join(source: &KeyedTable, target: &KeyedTable) -> JoinedTable {
    debug_assert_eq!(source.dimensions, target.dimensions);

    let metrics = metric_union(source, target);
    let source_pos: Vec<Option<usize>> = metrics.iter().map(|m| source.metric_position(m)).collect();
    let target_pos: Vec<Option<usize>> = metrics.iter().map(|m| target.metric_position(m)).collect();

    let mut target_by_key: HashMap<&RowKey, Vec<&KeyedRow>> = HashMap::new();
    for row in &target.rows {
        target_by_key.entry(&row.key).or_default().push(row);
    }
    let source_keys: HashSet<&RowKey> = source.rows.iter().map(|r| &r.key).collect();

    let mut pairs: Vec<(Option<&KeyedRow>, Option<&KeyedRow>)> = Vec::new();
    for s in &source.rows {
        match target_by_key.get(&s.key) {
            Some(matches) => pairs.extend(matches.iter().map(|t| (Some(s), Some(*t)))),
            None => pairs.push((Some(s), None)),
        }
    }
    for t in &target.rows {
        if !source_keys.contains(&t.key) {
            pairs.push((None, Some(t)));
        }
    }

    let dim_count = source.dimensions.len();
    let mut dim_values: Vec<Vec<CellValue>> = vec![Vec::with_capacity(pairs.len()); dim_count];
    let mut source_values: Vec<Vec<CellValue>> = vec![Vec::with_capacity(pairs.len()); metrics.len()];
    let mut target_values: Vec<Vec<CellValue>> = vec![Vec::with_capacity(pairs.len()); metrics.len()];

    for &(s, t) in &pairs {
        let key = s.or(t).map(|r| &r.key.0);
        for (d, col) in dim_values.iter_mut().enumerate() {
            col.push(key.map_or(CellValue::Null, |k| k[d].clone()));
        }
        for m in 0..metrics.len() {
            source_values[m].push(side_value(s, source_pos[m]));
            target_values[m].push(side_value(t, target_pos[m]));
        }
    }

    let mut columns = Vec::with_capacity(dim_count + metrics.len() * 2);
    for (name, values) in source.dimensions.iter().zip(dim_values) {
        columns.push(JoinedColumn {
            name: name.clone(),
            role: ColumnRole::Dimension,
            metric: None,
            values,
        });
    }
    for ((metric, s_vals), t_vals) in metrics.iter().zip(source_values).zip(target_values) {
        columns.push(JoinedColumn::metric(metric, side_role(Side::Source), s_vals));
        columns.push(JoinedColumn::metric(metric, side_role(Side::Target), t_vals));
    }

    debug!(
        source_rows = source.rows.len(),
        target_rows = target.rows.len(),
        joined_rows = pairs.len(),
        metrics = metrics.len(),
        "outer join complete"
    );

    JoinedTable {
        dimensions: source.dimensions.clone(),
        columns,
        row_count: pairs.len(),
    }
}

fn side_value(row: Option<&KeyedRow>, pos: Option<usize>) -> CellValue {
    match (row, pos) {
        (Some(r), Some(p)) => r.metrics[p].clone(),
        _ => CellValue::Null,
    }
}

fn side_role(side: Side) -> ColumnRole {
    match side {
        Side::Source => ColumnRole::Source,
        Side::Target => ColumnRole::Target,
    }
}
