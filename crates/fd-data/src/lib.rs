//! Data handling and sources for the dashboard

pub mod export;
pub mod filter;
pub mod loader;
pub mod query;
pub mod schema;
pub mod sources;

use arrow::error::ArrowError;
use tokio::task::JoinError;
use thiserror::Error;

// Re-exports
pub use export::{export_csv, save_csv};
pub use filter::{apply_filters, FilterClause, FilterEvaluator, FilterLogic, Operator};
pub use loader::{DatasetLoader, LoadState};
pub use query::{QueryConfig, QueryFilter, SaveQueryRequest, SavedQuery, ValidationError};
pub use schema::{infer_column_types, ColumnType, ColumnTypeInferencer, ColumnTypes};
pub use sources::{fetch_time_series, CsvSource, DataApi, HttpDataApi};

/// Errors that can occur in data operations
#[derive(Error, Debug)]
pub enum DataError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Arrow error: {0}")]
    Arrow(ArrowError),

    #[error("CSV parsing error: {0}")]
    Csv(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unexpected payload: {0}")]
    Payload(String),

    #[error("Invalid query: {0}")]
    Validation(#[from] ValidationError),

    #[error("Join error: {0}")]
    Join(#[from] JoinError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<csv::Error> for DataError {
    fn from(error: csv::Error) -> Self {
        match error.kind() {
            csv::ErrorKind::Io(io_err) => DataError::Io(std::io::Error::new(io_err.kind(), error.to_string())),
            _ => DataError::Csv(error.to_string()),
        }
    }
}

impl From<ArrowError> for DataError {
    fn from(error: ArrowError) -> Self {
        DataError::Arrow(error)
    }
}
