use std::fmt;

use indexmap::IndexMap;
use serde::{Serialize, Deserialize};
use fd_core::{present, CellValue, Row};

/// Column classification used by axis pickers and the filter panel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    Numeric,
    Date,
    Text,
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ColumnType::Numeric => "numeric",
            ColumnType::Date => "date",
            ColumnType::Text => "text",
        })
    }
}

/// Resolved column types, in column order
pub type ColumnTypes = IndexMap<String, ColumnType>;

/// Classifies columns from a sample row.
///
/// Only the first row is inspected, so a column whose first value is missing
/// is reported as text even if later rows hold numbers.
#[derive(Debug, Default)]
pub struct ColumnTypeInferencer;

impl ColumnTypeInferencer {
    /// Create a new inferencer
    pub fn new() -> Self {
        Self
    }

    /// Classify every column in `columns`
    pub fn infer(&self, rows: &[Row], columns: &[String]) -> ColumnTypes {
        let sample = rows.first();
        columns
            .iter()
            .map(|column| {
                let value = sample.and_then(|row| present(row, column));
                (column.clone(), Self::classify(column, value))
            })
            .collect()
    }

    /// Classify a single column from its sample value
    pub fn classify(column: &str, sample: Option<&CellValue>) -> ColumnType {
        let Some(value) = sample else {
            return ColumnType::Text;
        };

        if Self::looks_like_date_column(column) {
            ColumnType::Date
        } else if matches!(value, CellValue::Number(_)) {
            ColumnType::Numeric
        } else {
            ColumnType::Text
        }
    }

    /// Name heuristic for date-like columns
    fn looks_like_date_column(column: &str) -> bool {
        let lower = column.to_lowercase();
        lower.contains("date") || lower.contains("year")
    }
}

/// Shorthand for `ColumnTypeInferencer::new().infer(rows, columns)`
pub fn infer_column_types(rows: &[Row], columns: &[String]) -> ColumnTypes {
    ColumnTypeInferencer::new().infer(rows, columns)
}

/// Columns with a value in the sample row, usable as chart axes
pub fn axis_candidates(rows: &[Row], columns: &[String]) -> Vec<String> {
    let Some(sample) = rows.first() else {
        return Vec::new();
    };
    columns
        .iter()
        .filter(|column| present(sample, column).is_some())
        .cloned()
        .collect()
}

/// Columns classified as numeric, usable as Y metrics
pub fn numeric_columns(types: &ColumnTypes) -> Vec<String> {
    types
        .iter()
        .filter(|(_, ty)| **ty == ColumnType::Numeric)
        .map(|(name, _)| name.clone())
        .collect()
}
