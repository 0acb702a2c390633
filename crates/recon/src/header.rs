//! Multi-row header flattening.
//!
//! The first `header_rows` lines of an extract are the header block. Each
//! column's non-empty header cells are joined top to bottom with `_`, the
//! leading columns are renamed to the caller's dimension names, and any
//! remaining collisions get a numeric suffix.

use std::collections::{HashMap, HashSet};

use crate::error::ReconError;
use crate::model::{NormalizedHeader, Side};

/// One side's raw input: its lines and how many of them form the header.
#[derive(Debug, Clone)]
pub struct RawExtract {
    pub side: Side,
    pub lines: Vec<String>,
    pub header_rows: usize,
}

impl RawExtract {
    /// Split text on newlines (`\n` or `\r\n`).
    pub fn from_text(side: Side, text: &str, header_rows: usize) -> Self {
        Self {
            side,
            lines: text.lines().map(str::to_string).collect(),
            header_rows,
        }
    }

    /// Header block and data block, or `MalformedHeader` when the header
    /// block would run past the end of the extract.
    pub fn split(&self) -> Result<(&[String], &[String]), ReconError> {
        if self.header_rows == 0 {
            return Err(ReconError::ZeroHeaderRows { side: self.side });
        }
        if self.header_rows > self.lines.len() {
            return Err(ReconError::MalformedHeader {
                side: self.side,
                header_rows: self.header_rows,
                available: self.lines.len(),
            });
        }
        Ok(self.lines.split_at(self.header_rows))
    }
}

/// Tokenize one line as a single CSV record. A blank line has no fields.
pub(crate) fn split_fields(side: Side, line_no: usize, line: &str) -> Result<Vec<String>, ReconError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(line.as_bytes());

    match reader.records().next() {
        None => Ok(Vec::new()),
        Some(Ok(record)) => Ok(record.iter().map(str::to_string).collect()),
        Some(Err(e)) => Err(ReconError::Csv {
            side,
            message: format!("line {line_no}: {e}"),
        }),
    }
}

/// Flatten the header block into one unique name per column.
pub fn normalize_header(
    extract: &RawExtract,
    dimensions: &[String],
) -> Result<NormalizedHeader, ReconError> {
    let (header_lines, _) = extract.split()?;

    let mut rows = Vec::with_capacity(header_lines.len());
    for (i, line) in header_lines.iter().enumerate() {
        rows.push(split_fields(extract.side, i + 1, line)?);
    }

    let mut names = flatten_header_rows(&rows);
    for (slot, dim) in names.iter_mut().zip(dimensions) {
        slot.clone_from(dim);
    }

    Ok(NormalizedHeader::new(ensure_unique(names)))
}

/// Join each column's non-empty cells across header rows with `_`.
/// Column count is the widest header row; short rows contribute nothing
/// to the columns they lack.
pub fn flatten_header_rows(rows: &[Vec<String>]) -> Vec<String> {
    let width = rows.iter().map(Vec::len).max().unwrap_or(0);
    (0..width)
        .map(|col| {
            rows.iter()
                .filter_map(|r| r.get(col))
                .filter(|cell| !cell.is_empty())
                .map(String::as_str)
                .collect::<Vec<_>>()
                .join("_")
        })
        .collect()
}

/// First occurrence keeps its name; later ones get `_<n>` with the smallest
/// `n` not yet used for that base and not clashing with any emitted name.
pub fn ensure_unique(names: Vec<String>) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::with_capacity(names.len());
    let mut counters: HashMap<String, usize> = HashMap::new();
    let mut out = Vec::with_capacity(names.len());

    for name in names {
        if seen.insert(name.clone()) {
            out.push(name);
            continue;
        }

        let counter = counters.entry(name.clone()).or_insert(0);
        let candidate = loop {
            *counter += 1;
            let candidate = format!("{name}_{counter}");
            if !seen.contains(&candidate) {
                break candidate;
            }
        };
        seen.insert(candidate.clone());
        out.push(candidate);
    }

    out
}
