//! Content hashing for exact-match detection.
//!
//! The canonical rendering is CSV: the column-name row, then every data row,
//! cells in their canonical text form. Digest is lowercase hex SHA-256.

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::error::ReconError;
use crate::model::Table;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HashCheck {
    pub source: String,
    pub target: String,
    pub exact_match: bool,
}

/// Canonical bytes of a table. Deterministic for equal tables.
pub fn canonical_rendering(table: &Table) -> Result<Vec<u8>, ReconError> {
    let csv_error = |message: String| ReconError::Csv {
        side: table.side,
        message,
    };
    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    writer
        .write_record(table.header().names())
        .map_err(|e| csv_error(e.to_string()))?;
    for row in table.rows() {
        writer
            .write_record(row.iter().map(|c| c.canonical()))
            .map_err(|e| csv_error(e.to_string()))?;
    }

    writer.into_inner().map_err(|e| csv_error(e.to_string()))
}

pub fn table_digest(table: &Table) -> Result<String, ReconError> {
    Ok(hex(&Sha256::digest(canonical_rendering(table)?)))
}

pub fn verify(source: &Table, target: &Table) -> Result<HashCheck, ReconError> {
    let source = table_digest(source)?;
    let target = table_digest(target)?;
    let exact_match = source == target;
    Ok(HashCheck { source, target, exact_match })
}

fn hex(bytes: &[u8]) -> String {
    use std::fmt::Write;
    bytes.iter().fold(String::with_capacity(bytes.len() * 2), |mut s, b| {
        let _ = write!(s, "{b:02x}");
        s
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::RawExtract;
    use crate::loader::load_table;
    use crate::model::{CellValue, NormalizedHeader, Side};

    fn table(side: Side, text: &str) -> Table {
        let x = RawExtract::from_text(side, text, 1);
        load_table(&x, &["id".to_string()]).unwrap().table
    }

    #[test]
    fn digest_is_sha256_hex() {
        let t = table(Side::Source, "id,v\nA,1\n");
        let d = table_digest(&t).unwrap();
        assert_eq!(d.len(), 64);
        assert!(d.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn canonical_rendering_is_plain_csv() {
        let t = table(Side::Source, "id,v,note\nA,+1.50,\"x, y\"\n");
        let text = String::from_utf8(canonical_rendering(&t).unwrap()).unwrap();
        assert_eq!(text, "id,v,note\nA,1.50,\"x, y\"\n");
    }

    #[test]
    fn identical_extracts_match() {
        let text = "id,v\nA,1\nB,2\n";
        let check = verify(&table(Side::Source, text), &table(Side::Target, text)).unwrap();
        assert!(check.exact_match);
        assert_eq!(check.source, check.target);
    }

    #[test]
    fn row_order_matters() {
        let a = table(Side::Source, "id,v\nA,1\nB,2\n");
        let b = table(Side::Target, "id,v\nB,2\nA,1\n");
        assert!(!verify(&a, &b).unwrap().exact_match);
    }

    #[test]
    fn ragged_table_is_an_error_not_an_empty_digest() {
        let header = NormalizedHeader::new(vec!["id".into(), "v".into()]);
        let rows = vec![
            vec![CellValue::Text("A".into()), CellValue::Text("1".into())],
            vec![CellValue::Text("B".into())],
        ];
        let ragged = Table::from_parts_unchecked(Side::Target, header, rows);
        match table_digest(&ragged) {
            Err(ReconError::Csv { side, .. }) => assert_eq!(side, Side::Target),
            other => panic!("expected a csv error, got {other:?}"),
        }
        let good = table(Side::Source, "id,v\nA,1\n");
        assert!(verify(&good, &ragged).is_err());
    }

    #[test]
    fn decimal_scale_matters() {
        let a = table(Side::Source, "id,v\nA,10\n");
        let b = table(Side::Target, "id,v\nA,10.0\n");
        assert!(!verify(&a, &b).unwrap().exact_match);
    }
}
