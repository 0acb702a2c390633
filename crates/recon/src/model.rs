use std::str::FromStr;

use rust_decimal::Decimal;
use serde::Serialize;

// ---------------------------------------------------------------------------
// Cells
// ---------------------------------------------------------------------------

/// A single typed cell.
///
/// `Null` never comes out of the loader; it only appears in joined tables
/// for the side a row (or a whole column) is missing from.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CellValue {
    Numeric(Decimal),
    Text(String),
    Null,
}

impl CellValue {
    /// Coerce a raw field: integer or decimal with an optional leading sign
    /// becomes `Numeric`, anything else stays `Text` verbatim.
    pub fn parse(raw: &str) -> Self {
        match parse_decimal(raw) {
            Some(d) => CellValue::Numeric(d),
            None => CellValue::Text(raw.to_string()),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    /// Empty text is treated as a missing metric value.
    pub fn is_blank(&self) -> bool {
        match self {
            CellValue::Null => true,
            CellValue::Text(s) => s.is_empty(),
            CellValue::Numeric(_) => false,
        }
    }

    pub fn as_decimal(&self) -> Option<Decimal> {
        match self {
            CellValue::Numeric(d) => Some(*d),
            _ => None,
        }
    }

    /// Stable, locale-independent text form. Numbers keep the scale they
    /// were parsed with (`10.50` stays `10.50`); `Null` renders empty.
    pub fn canonical(&self) -> String {
        match self {
            CellValue::Numeric(d) => d.to_string(),
            CellValue::Text(s) => s.clone(),
            CellValue::Null => String::new(),
        }
    }
}

impl std::fmt::Display for CellValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.canonical())
    }
}

/// Strict decimal grammar: `[+-]? digits ('.' digits?)? | [+-]? '.' digits`.
/// Surrounding whitespace is ignored. Exponents, thousands separators and
/// currency symbols are not numbers here, and neither is anything a
/// `Decimal` cannot hold without rounding (more than 28 fractional digits,
/// or beyond the 96-bit mantissa).
fn parse_decimal(raw: &str) -> Option<Decimal> {
    let s = raw.trim();
    let unsigned = s.strip_prefix(['+', '-']).unwrap_or(s);
    if unsigned.is_empty() {
        return None;
    }

    let (int_part, frac_part) = match unsigned.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (unsigned, None),
    };
    let digits = |p: &str| p.bytes().all(|b| b.is_ascii_digit());
    if !digits(int_part) || !frac_part.map_or(true, digits) {
        return None;
    }
    if int_part.is_empty() && frac_part.map_or(true, str::is_empty) {
        return None;
    }

    let mut body = String::with_capacity(s.len() + 1);
    if s.starts_with('-') {
        body.push('-');
    }
    body.push_str(if int_part.is_empty() { "0" } else { int_part });
    if let Some(frac) = frac_part.filter(|f| !f.is_empty()) {
        body.push('.');
        body.push_str(frac);
    }
    Decimal::from_str_exact(&body).ok()
}

// ---------------------------------------------------------------------------
// Sides + header
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Source,
    Target,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Source => "source",
            Side::Target => "target",
        }
    }

    /// Column-name suffix used in the joined table.
    pub fn suffix(&self) -> &'static str {
        match self {
            Side::Source => "_source",
            Side::Target => "_target",
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Flattened, de-duplicated column names for one extract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedHeader {
    names: Vec<String>,
}

impl NormalizedHeader {
    pub(crate) fn new(names: Vec<String>) -> Self {
        Self { names }
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }
}

// ---------------------------------------------------------------------------
// Tables
// ---------------------------------------------------------------------------

/// Row-oriented table produced by the loader. Every row has exactly
/// `header.len()` cells.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub side: Side,
    header: NormalizedHeader,
    rows: Vec<Vec<CellValue>>,
}

impl Table {
    pub(crate) fn new(side: Side, header: NormalizedHeader, rows: Vec<Vec<CellValue>>) -> Self {
        debug_assert!(rows.iter().all(|r| r.len() == header.len()));
        Self { side, header, rows }
    }

    /// Builds a table without the row-width check, for exercising writers
    /// against rows the loader would never produce.
    #[cfg(test)]
    pub(crate) fn from_parts_unchecked(
        side: Side,
        header: NormalizedHeader,
        rows: Vec<Vec<CellValue>>,
    ) -> Self {
        Self { side, header, rows }
    }

    pub fn header(&self) -> &NormalizedHeader {
        &self.header
    }

    pub fn rows(&self) -> &[Vec<CellValue>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Values of one column, top to bottom.
    pub fn column(&self, name: &str) -> Option<impl Iterator<Item = &CellValue> + '_> {
        let idx = self.header.position(name)?;
        Some(self.rows.iter().map(move |r| &r[idx]))
    }
}

/// Composite join key: the dimension cells of one row, in dimension order.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RowKey(pub Vec<CellValue>);

#[derive(Debug, Clone)]
pub struct KeyedRow {
    pub key: RowKey,
    /// Metric cells, aligned with `KeyedTable::metrics`.
    pub metrics: Vec<CellValue>,
}

/// A table with its dimension columns promoted to a composite key.
/// Keys need not be unique.
#[derive(Debug, Clone)]
pub struct KeyedTable {
    pub side: Side,
    pub dimensions: Vec<String>,
    pub metrics: Vec<String>,
    pub rows: Vec<KeyedRow>,
}

impl KeyedTable {
    pub fn metric_position(&self, name: &str) -> Option<usize> {
        self.metrics.iter().position(|m| m == name)
    }
}

// ---------------------------------------------------------------------------
// Joined output
// ---------------------------------------------------------------------------

/// What a joined column holds. Set once when the column is created; the
/// renderer picks columns by role, never by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnRole {
    Dimension,
    Source,
    Target,
    Variance,
    Notes,
    Outcome,
}

impl ColumnRole {
    pub fn suffix(&self) -> &'static str {
        match self {
            ColumnRole::Source => "_source",
            ColumnRole::Target => "_target",
            ColumnRole::Variance => "_variance",
            ColumnRole::Notes => "_notes",
            ColumnRole::Dimension | ColumnRole::Outcome => "",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct JoinedColumn {
    pub name: String,
    pub role: ColumnRole,
    /// Base metric name for metric-derived columns.
    pub metric: Option<String>,
    pub values: Vec<CellValue>,
}

impl JoinedColumn {
    pub fn metric(metric: &str, role: ColumnRole, values: Vec<CellValue>) -> Self {
        Self {
            name: format!("{metric}{}", role.suffix()),
            role,
            metric: Some(metric.to_string()),
            values,
        }
    }
}

/// Column-oriented result of the outer join (and of the stages after it).
#[derive(Debug, Clone, PartialEq)]
pub struct JoinedTable {
    pub dimensions: Vec<String>,
    pub columns: Vec<JoinedColumn>,
    pub row_count: usize,
}

impl JoinedTable {
    pub fn column(&self, name: &str) -> Option<&JoinedColumn> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn columns_with_role(&self, role: ColumnRole) -> impl Iterator<Item = &JoinedColumn> + '_ {
        self.columns.iter().filter(move |c| c.role == role)
    }

    pub fn header(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Cells of row `idx` in column order.
    pub fn row(&self, idx: usize) -> Vec<&CellValue> {
        self.columns.iter().map(|c| &c.values[idx]).collect()
    }
}

/// Per-cell relationship between the two sides of one metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Note {
    DataMatch,
    ValuesDiffer,
    SourceOnly,
    TargetOnly,
}

impl Note {
    pub fn as_str(&self) -> &'static str {
        match self {
            Note::DataMatch => "Data Match",
            Note::ValuesDiffer => "Values do not match",
            Note::SourceOnly => "Data exists in source, not in target",
            Note::TargetOnly => "Data exists in target, not in source",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        [Note::DataMatch, Note::ValuesDiffer, Note::SourceOnly, Note::TargetOnly]
            .into_iter()
            .find(|n| n.as_str() == label)
    }
}

/// Header of the trailing per-row verdict column.
pub const OUTCOME_COLUMN: &str = "rowfailure";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RowOutcome {
    Success,
    Fail,
}

impl RowOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            RowOutcome::Success => "success",
            RowOutcome::Fail => "fail",
        }
    }
}

// ---------------------------------------------------------------------------
// Summary
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReconSummary {
    pub source_rows: usize,
    pub target_rows: usize,
    pub joined_rows: usize,
    pub failing_rows: usize,
    pub passing_rows: usize,
    pub metrics: usize,
    pub numeric_metrics: usize,
}
