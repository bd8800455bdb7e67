//! Loading step rows from CSV.

use crate::error::{Error, Result};
use crate::types::{Row, SECTION_COLUMN, STEPS_COLUMN};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// Read data rows from a CSV with a header row.
///
/// Fails when there are no data rows, or when the header lacks the
/// `SECTION` or `STEPS` column. Columns beyond the header are ignored and
/// short records read as empty fields.
pub fn read_rows<R: Read>(reader: R) -> Result<Vec<Row>> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(reader);

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').to_string())
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let row = Row::from_pairs(
            headers
                .iter()
                .enumerate()
                .map(|(i, h)| (h.as_str(), record.get(i).unwrap_or_default())),
        );
        rows.push(row);
    }

    if rows.is_empty() {
        return Err(Error::EmptyInput("CSV file".to_string()));
    }

    for column in [SECTION_COLUMN, STEPS_COLUMN] {
        if !headers.iter().any(|h| h == column) {
            return Err(Error::MissingColumn(column.to_string()));
        }
    }

    log::debug!("Read {} rows with columns {:?}", rows.len(), headers);

    Ok(rows)
}

/// Read rows from a CSV file on disk.
pub fn read_rows_from_path(path: &Path) -> Result<Vec<Row>> {
    if !path.exists() {
        return Err(Error::MissingResource {
            kind: "CSV",
            path: path.to_path_buf(),
        });
    }
    let file = File::open(path)?;
    read_rows(BufReader::new(file))
}
