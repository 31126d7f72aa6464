//! CSV ingestion: reads the orders export into an ordered record set.
//!
//! The reader is deliberately untyped. Every cell stays a string; header
//! aliasing ([`crate::schema`]) is the only contract between the file and
//! the rest of the application.

use color_eyre::eyre::eyre;
use color_eyre::Result;
use std::collections::HashMap;
use std::path::Path;

/// One order: a mapping from column name to cell text.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    fields: HashMap<String, String>,
}

impl Record {
    pub fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        Self {
            fields: pairs.into_iter().collect(),
        }
    }

    /// Cell text for a column, or "" when the column is absent.
    pub fn get(&self, column: &str) -> &str {
        self.fields.get(column).map(String::as_str).unwrap_or("")
    }

    pub fn is_blank(&self) -> bool {
        self.fields.values().all(|v| v.trim().is_empty())
    }
}

/// An ordered sequence of records sharing one header set.
#[derive(Debug, Clone, Default)]
pub struct RecordSet {
    headers: Vec<String>,
    rows: Vec<Record>,
}

impl RecordSet {
    pub fn new(headers: Vec<String>, rows: Vec<Record>) -> Self {
        Self { headers, rows }
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Record] {
        &self.rows
    }

    pub fn get(&self, index: usize) -> Option<&Record> {
        self.rows.get(index)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// All row indices in input order. Filtering starts from this.
    pub fn all_indices(&self) -> Vec<usize> {
        (0..self.rows.len()).collect()
    }
}

/// Options for reading the orders file.
#[derive(Debug, Clone, Default)]
pub struct OpenOptions {
    pub delimiter: Option<u8>,
}

impl OpenOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = Some(delimiter);
        self
    }
}

/// Read the orders CSV into a [`RecordSet`]. Blank lines are skipped; ragged
/// rows are tolerated (missing trailing cells read as empty).
pub fn read_orders(path: &Path, options: &OpenOptions) -> Result<RecordSet> {
    let mut builder = csv::ReaderBuilder::new();
    builder.flexible(true);
    if let Some(delimiter) = options.delimiter {
        builder.delimiter(delimiter);
    }

    let mut reader = builder
        .from_path(path)
        .map_err(|e| eyre!("could not open {}: {}", path.display(), e))?;

    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    if headers.is_empty() {
        return Err(eyre!("{} has no header row", path.display()));
    }

    let mut rows = Vec::new();
    for result in reader.records() {
        let raw = result?;
        let record = Record::from_pairs(
            headers
                .iter()
                .enumerate()
                .map(|(i, h)| (h.clone(), raw.get(i).unwrap_or("").to_string()))
                .collect(),
        );
        if record.is_blank() {
            continue;
        }
        rows.push(record);
    }

    Ok(RecordSet::new(headers, rows))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_csv(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn reads_headers_and_rows_in_order() {
        let file = write_csv("Tracking,Warehouse\nT1,W1\nT2,W2\n");
        let set = read_orders(file.path(), &OpenOptions::new()).unwrap();
        assert_eq!(set.headers(), &["Tracking", "Warehouse"]);
        assert_eq!(set.len(), 2);
        assert_eq!(set.get(0).unwrap().get("Tracking"), "T1");
        assert_eq!(set.get(1).unwrap().get("Warehouse"), "W2");
    }

    #[test]
    fn skips_blank_lines() {
        let file = write_csv("Tracking,Warehouse\nT1,W1\n,\nT2,W2\n");
        let set = read_orders(file.path(), &OpenOptions::new()).unwrap();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn ragged_rows_read_missing_cells_as_empty() {
        let file = write_csv("Tracking,Warehouse,DSP\nT1,W1\n");
        let set = read_orders(file.path(), &OpenOptions::new()).unwrap();
        assert_eq!(set.get(0).unwrap().get("DSP"), "");
    }

    #[test]
    fn custom_delimiter() {
        let file = write_csv("Tracking;Warehouse\nT1;W1\n");
        let set = read_orders(file.path(), &OpenOptions::new().with_delimiter(b';')).unwrap();
        assert_eq!(set.get(0).unwrap().get("Warehouse"), "W1");
    }

    #[test]
    fn missing_file_is_an_error() {
        let result = read_orders(Path::new("/nonexistent/orders.csv"), &OpenOptions::new());
        assert!(result.is_err());
    }
}
