//! Rows and datasets

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::value::CellValue;

/// One record, keyed by column name. Key order follows the payload.
pub type Row = IndexMap<String, CellValue>;

/// Look up a cell, treating `null` the same as a missing key
pub fn present<'a>(row: &'a Row, column: &str) -> Option<&'a CellValue> {
    row.get(column).filter(|value| !value.is_null())
}

/// An in-memory tabular dataset as fetched for one data source
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub rows: Vec<Row>,
    pub columns: Vec<String>,
}

impl Dataset {
    /// Create a dataset whose column list is taken from the first row
    pub fn new(rows: Vec<Row>) -> Self {
        let columns = rows
            .first()
            .map(|row| row.keys().cloned().collect())
            .unwrap_or_default();
        Self { rows, columns }
    }

    /// Create a dataset with an explicit column list
    pub fn with_columns(rows: Vec<Row>, columns: Vec<String>) -> Self {
        Self { rows, columns }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Build a row from `(column, value)` pairs
pub fn row_from<I, K, V>(cells: I) -> Row
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<CellValue>,
{
    cells.into_iter().map(|(k, v)| (k.into(), v.into())).collect()
}
