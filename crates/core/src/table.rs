//! CSV tables and empty row/column pruning.

use crate::config::CleanerConfig;
use crate::error::{Error, Result};
use serde::Serialize;
use std::fs::File;
use std::io::{BufReader, Read, Write};

/// Tokens pandas' `read_csv` treats as missing by default.
pub const PANDAS_NA_TOKENS: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// Decides which cell values count as missing.
///
/// The empty string is always missing; extra tokens are compared exactly.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MissingValues {
    tokens: Vec<String>,
}

impl MissingValues {
    /// Only empty cells are missing.
    pub fn new() -> Self {
        Self::default()
    }

    /// Treat each of `tokens` as missing too.
    pub fn with_tokens<I, S>(mut self, tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tokens.extend(tokens.into_iter().map(Into::into));
        self
    }

    /// Use pandas' default NA token list.
    pub fn pandas() -> Self {
        Self::new().with_tokens(PANDAS_NA_TOKENS.iter().copied())
    }

    /// Whether a cell value counts as missing.
    pub fn is_missing(&self, cell: &str) -> bool {
        cell.is_empty() || self.tokens.iter().any(|t| t == cell)
    }
}

/// What [`Table::clean`] removed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CleanReport {
    pub rows_before: usize,
    pub rows_dropped: usize,
    /// Names of the dropped columns, in their original order.
    pub columns_dropped: Vec<String>,
}

/// A header row plus data rows, every row as wide as the header.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    /// Create a table, padding short rows with empty cells.
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        let width = headers.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                if row.len() < width {
                    row.resize(width, String::new());
                }
                row
            })
            .collect();
        Self { headers, rows }
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// Read a CSV with a header row.
    ///
    /// Short records are padded; records wider than the header are rejected.
    pub fn read_csv<R: Read>(reader: R) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_reader(reader);

        let headers: Vec<String> = reader
            .headers()?
            .iter()
            .enumerate()
            .map(|(i, h)| if i == 0 { h.trim_start_matches('\u{feff}') } else { h })
            .map(str::to_string)
            .collect();

        let mut rows = Vec::new();
        for (idx, record) in reader.records().enumerate() {
            let record = record?;
            if record.len() > headers.len() {
                return Err(Error::CsvError(format!(
                    "record {} has {} fields but the header has {}",
                    idx + 1,
                    record.len(),
                    headers.len()
                )));
            }
            rows.push(record.iter().map(str::to_string).collect());
        }

        Ok(Self::new(headers, rows))
    }

    /// Write the table as CSV, header first, without an index column.
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        if self.headers.is_empty() {
            return Ok(());
        }
        let mut writer = csv::Writer::from_writer(writer);
        writer.write_record(&self.headers)?;
        for row in &self.rows {
            writer.write_record(row)?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Drop rows whose cells are all missing, then columns whose cells are
    /// all missing. Survivors keep their relative order, and surviving cells
    /// that count as missing are emptied.
    pub fn clean(&self, missing: &MissingValues) -> (Table, CleanReport) {
        let rows: Vec<&Vec<String>> = self
            .rows
            .iter()
            .filter(|row| !row.iter().all(|cell| missing.is_missing(cell)))
            .collect();

        let keep: Vec<usize> = (0..self.headers.len())
            .filter(|&col| rows.iter().any(|row| !missing.is_missing(&row[col])))
            .collect();

        let columns_dropped = self
            .headers
            .iter()
            .enumerate()
            .filter(|(col, _)| !keep.contains(col))
            .map(|(_, name)| name.clone())
            .collect();

        let headers = keep.iter().map(|&col| self.headers[col].clone()).collect();
        let cleaned_rows: Vec<Vec<String>> = rows
            .iter()
            .map(|row| {
                keep.iter()
                    .map(|&col| {
                        let cell = &row[col];
                        if missing.is_missing(cell) {
                            String::new()
                        } else {
                            cell.clone()
                        }
                    })
                    .collect()
            })
            .collect();

        let report = CleanReport {
            rows_before: self.rows.len(),
            rows_dropped: self.rows.len() - cleaned_rows.len(),
            columns_dropped,
        };

        (Table::new(headers, cleaned_rows), report)
    }
}

/// Clean the configured input file into the configured output file.
///
/// The output is written only once the whole input was read and cleaned.
pub fn clean_file(config: &CleanerConfig) -> Result<CleanReport> {
    let file = File::open(&config.input_path)?;
    let table = Table::read_csv(BufReader::new(file))?;

    let missing = if config.keep_default_na {
        MissingValues::pandas()
    } else {
        MissingValues::new()
    }
    .with_tokens(config.na_values.iter().cloned());
    let (cleaned, report) = table.clean(&missing);

    let mut buffer = Vec::new();
    cleaned.write_csv(&mut buffer)?;
    std::fs::write(&config.output_path, buffer)?;

    log::info!(
        "Cleaned {}: dropped {} of {} rows and {} columns",
        config.input_path.display(),
        report.rows_dropped,
        report.rows_before,
        report.columns_dropped.len()
    );

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(csv: &str) -> Table {
        Table::read_csv(csv.as_bytes()).unwrap()
    }

    fn to_csv(table: &Table) -> String {
        let mut out = Vec::new();
        table.write_csv(&mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_drops_empty_rows_and_columns() {
        let input = table("A,B,C\n1,,x\n,,\n2,,y\n");
        let (cleaned, report) = input.clean(&MissingValues::new());

        assert_eq!(to_csv(&cleaned), "A,C\n1,x\n2,y\n");
        assert_eq!(report.rows_before, 3);
        assert_eq!(report.rows_dropped, 1);
        assert_eq!(report.columns_dropped, vec!["B".to_string()]);
    }

    #[test]
    fn test_keeps_partially_filled_rows_and_columns() {
        let input = table("A,B\n1,\n,2\n");
        let (cleaned, report) = input.clean(&MissingValues::new());

        assert_eq!(cleaned, input);
        assert_eq!(report.rows_dropped, 0);
        assert!(report.columns_dropped.is_empty());
    }

    #[test]
    fn test_preserves_order() {
        let input = table("Z,Y,X,W\nc,,a,\n,,,\nb,,,d\n");
        let (cleaned, _) = input.clean(&MissingValues::new());

        assert_eq!(cleaned.headers(), &["Z", "X", "W"]);
        assert_eq!(
            cleaned.rows(),
            &[
                vec!["c".to_string(), "a".to_string(), String::new()],
                vec!["b".to_string(), String::new(), "d".to_string()],
            ]
        );
    }

    #[test]
    fn test_short_records_are_padded() {
        let input = table("A,B,C\n1\n2,3\n");
        assert_eq!(input.rows()[0], vec!["1", "", ""]);

        let (cleaned, report) = input.clean(&MissingValues::new());
        assert_eq!(cleaned.headers(), &["A", "B"]);
        assert_eq!(report.columns_dropped, vec!["C".to_string()]);
    }

    #[test]
    fn test_wide_records_are_rejected() {
        let err = Table::read_csv("A\n1,2\n".as_bytes()).unwrap_err();
        assert!(matches!(err, Error::CsvError(_)));
    }

    #[test]
    fn test_whitespace_is_not_missing() {
        let input = table("A,B\n1, \n");
        let (cleaned, _) = input.clean(&MissingValues::new());
        assert_eq!(cleaned.headers(), &["A", "B"]);
    }

    #[test]
    fn test_na_tokens() {
        let input = table("A,B\nNA,n/a\n1,NULL\n");

        let (strict, _) = input.clean(&MissingValues::new());
        assert_eq!(strict, input);

        let (cleaned, report) = input.clean(&MissingValues::pandas());
        assert_eq!(to_csv(&cleaned), "A\n1\n");
        assert_eq!(report.rows_dropped, 1);
        assert_eq!(report.columns_dropped, vec!["B".to_string()]);
    }

    #[test]
    fn test_quoted_fields_round_trip() {
        let input = table("A,B\n\"a, b\",\"say \"\"hi\"\"\"\n");
        assert_eq!(to_csv(&input), "A,B\n\"a, b\",\"say \"\"hi\"\"\"\n");
    }

    #[test]
    fn test_bom_is_stripped_from_header() {
        let input = table("\u{feff}A,B\n1,2\n");
        assert_eq!(input.headers(), &["A", "B"]);
    }

    #[test]
    fn test_clean_file() {
        let dir = tempfile::tempdir().unwrap();
        let input_path = dir.path().join("sheet.csv");
        let output_path = dir.path().join("cleaned.csv");
        std::fs::write(&input_path, "SECTION,EMPTY,STEPS\n1. Setup,,S1 Go\n,,\n").unwrap();

        let config = CleanerConfig {
            input_path,
            output_path: output_path.clone(),
            ..CleanerConfig::default()
        };
        let report = clean_file(&config).unwrap();

        assert_eq!(report.rows_dropped, 1);
        assert_eq!(
            std::fs::read_to_string(&output_path).unwrap(),
            "SECTION,STEPS\n1. Setup,S1 Go\n"
        );
    }

    #[test]
    fn test_clean_file_missing_input_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let output_path = dir.path().join("cleaned.csv");
        let config = CleanerConfig {
            input_path: dir.path().join("missing.csv"),
            output_path: output_path.clone(),
            ..CleanerConfig::default()
        };

        let err = clean_file(&config).unwrap_err();
        assert!(err.is_not_found());
        assert!(!output_path.exists());
    }

    #[test]
    fn test_clean_file_default_config_drops_na_tokens() {
        let dir = tempfile::tempdir().unwrap();
        let input_path = dir.path().join("sheet.csv");
        let output_path = dir.path().join("cleaned.csv");
        std::fs::write(
            &input_path,
            "SECTION,NOTES,STEPS\n1. Setup,NaN,S1 Go\nNA,null,N/A\n",
        )
        .unwrap();

        let config = CleanerConfig {
            input_path,
            output_path: output_path.clone(),
            ..CleanerConfig::default()
        };
        let report = clean_file(&config).unwrap();

        assert_eq!(report.rows_dropped, 1);
        assert_eq!(report.columns_dropped, vec!["NOTES".to_string()]);
        assert_eq!(
            std::fs::read_to_string(&output_path).unwrap(),
            "SECTION,STEPS\n1. Setup,S1 Go\n"
        );
    }

    #[test]
    fn test_clean_file_without_default_na_keeps_tokens() {
        let dir = tempfile::tempdir().unwrap();
        let input_path = dir.path().join("sheet.csv");
        let output_path = dir.path().join("cleaned.csv");
        std::fs::write(&input_path, "A,B\nNA,\nnull,TBD\n").unwrap();

        let config = CleanerConfig {
            input_path,
            output_path: output_path.clone(),
            na_values: vec!["TBD".to_string()],
            keep_default_na: false,
        };
        let report = clean_file(&config).unwrap();

        assert_eq!(report.rows_dropped, 0);
        assert_eq!(
            std::fs::read_to_string(&output_path).unwrap(),
            "A\nNA\nnull\n"
        );
    }
}
