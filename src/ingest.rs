// 📂 CSV ingestion
// Reads a header-keyed CSV export into RawRows. Header cells are trimmed and
// stripped of a leading UTF-8 BOM so "\u{feff}Date " matches "Date".

use anyhow::{Context, Result};
use csv::ReaderBuilder;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// One data row keyed by normalized header name
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRow {
    /// 1-indexed line in the source file (header is line 1)
    pub line_number: usize,
    fields: HashMap<String, String>,
}

impl RawRow {
    /// Build a row from (column, value) pairs
    pub fn from_pairs<K, V, I>(line_number: usize, pairs: I) -> Self
    where
        K: Into<String>,
        V: Into<String>,
        I: IntoIterator<Item = (K, V)>,
    {
        RawRow {
            line_number,
            fields: pairs
                .into_iter()
                .map(|(k, v)| {
                    let key: String = k.into();
                    (normalize_header(&key), v.into())
                })
                .collect(),
        }
    }

    /// Raw cell value, "" when the column is missing
    pub fn get(&self, column: &str) -> &str {
        self.fields.get(column).map(String::as_str).unwrap_or("")
    }

    /// Trimmed cell value
    pub fn trimmed(&self, column: &str) -> &str {
        self.get(column).trim()
    }

    /// Trimmed cell value, None when empty
    pub fn optional(&self, column: &str) -> Option<String> {
        let value = self.trimmed(column);
        if value.is_empty() {
            None
        } else {
            Some(value.to_string())
        }
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.fields.contains_key(column)
    }
}

/// Trim whitespace and a leading byte-order mark
pub fn normalize_header(value: &str) -> String {
    value.trim_start_matches('\u{feff}').trim().to_string()
}

/// Read every data row from a CSV reader
///
/// `source_name` only appears in error messages.
pub fn read_rows<R: Read>(reader: R, source_name: &str) -> Result<Vec<RawRow>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers: Vec<String> = reader
        .headers()
        .with_context(|| format!("Failed to read CSV header in {}", source_name))?
        .iter()
        .map(normalize_header)
        .collect();

    let mut rows = Vec::new();
    for (line_num, result) in reader.records().enumerate() {
        let record = result.with_context(|| {
            format!("Failed to parse CSV line {} in {}", line_num + 2, source_name)
        })?;

        let fields = headers
            .iter()
            .zip(record.iter())
            .map(|(header, value)| (header.clone(), value.to_string()))
            .collect();

        rows.push(RawRow {
            line_number: line_num + 2, // +2 because: 1-indexed + header row
            fields,
        });
    }

    Ok(rows)
}

/// Open and read a CSV file
pub fn read_rows_from_path(path: &Path) -> Result<Vec<RawRow>> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open file: {}", path.display()))?;
    let filename = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("unknown.csv");
    read_rows(file, filename)
}

/// SHA-256 of a file's bytes, hex encoded
pub fn file_fingerprint(path: &Path) -> Result<String> {
    let mut file = File::open(path)
        .with_context(|| format!("Failed to open file: {}", path.display()))?;
    let mut hasher = Sha256::new();
    std::io::copy(&mut file, &mut hasher)
        .with_context(|| format!("Failed to read file: {}", path.display()))?;
    Ok(format!("{:x}", hasher.finalize()))
}
