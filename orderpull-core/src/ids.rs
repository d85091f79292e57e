//! Order ID source: one column of a delimited file with a header row.
//!
//! IDs are yielded lazily and in file order. Cells are trimmed and blank
//! cells are dropped; duplicates are passed through untouched.

use std::fmt;
use std::fs::File;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::{io_err, StartupError};
use crate::types::OrderId;

/// Header name of the ID column in the order-transactions export.
pub const DEFAULT_ID_COLUMN: &str = "ID";

/// Which column of the input holds the order IDs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnSelector {
    /// Match a header cell by (trimmed) name.
    Name(String),
    /// Zero-based column position.
    Index(usize),
}

impl Default for ColumnSelector {
    fn default() -> Self {
        Self::Name(DEFAULT_ID_COLUMN.to_string())
    }
}

impl FromStr for ColumnSelector {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err("column selector must not be empty".to_string());
        }
        if s.bytes().all(|b| b.is_ascii_digit()) {
            return s
                .parse()
                .map(Self::Index)
                .map_err(|e| format!("invalid column index '{s}': {e}"));
        }
        Ok(Self::Name(s.to_string()))
    }
}

impl fmt::Display for ColumnSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnSelector::Name(name) => write!(f, "{name}"),
            ColumnSelector::Index(i) => write!(f, "#{i}"),
        }
    }
}

/// Lazy iterator over the order IDs in one input file.
pub struct OrderIdReader {
    path: PathBuf,
    column: usize,
    records: csv::StringRecordsIntoIter<File>,
}

impl OrderIdReader {
    /// Open `path`, read its header row and resolve `selector` against it.
    pub fn open(path: &Path, selector: &ColumnSelector) -> Result<Self, StartupError> {
        let file = File::open(path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => StartupError::InputNotFound {
                path: path.to_path_buf(),
            },
            _ => io_err(path, e),
        })?;

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(file);
        let headers = reader.headers().map_err(|e| csv_err(path, e))?.clone();

        let column = match selector {
            ColumnSelector::Name(name) => headers
                .iter()
                .position(|h| h.trim_start_matches('\u{feff}').trim() == name),
            ColumnSelector::Index(i) => (*i < headers.len()).then_some(*i),
        }
        .ok_or_else(|| StartupError::MissingColumn {
            path: path.to_path_buf(),
            column: selector.to_string(),
        })?;

        Ok(Self {
            path: path.to_path_buf(),
            column,
            records: reader.into_records(),
        })
    }
}

impl Iterator for OrderIdReader {
    type Item = Result<OrderId, StartupError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let record = match self.records.next()? {
                Ok(record) => record,
                Err(e) => return Some(Err(csv_err(&self.path, e))),
            };
            let Some(cell) = record.get(self.column) else {
                tracing::debug!(
                    line = ?record.position().map(|p| p.line()),
                    "record shorter than ID column, skipping"
                );
                continue;
            };
            let cell = cell.trim();
            if cell.is_empty() {
                continue;
            }
            return Some(Ok(OrderId::from(cell)));
        }
    }
}

/// Read every order ID in `path` into memory, preserving file order.
pub fn read_order_ids(path: &Path, selector: &ColumnSelector) -> Result<Vec<OrderId>, StartupError> {
    OrderIdReader::open(path, selector)?.collect()
}

fn csv_err(path: &Path, source: csv::Error) -> StartupError {
    StartupError::Csv {
        path: path.to_path_buf(),
        source,
    }
}
