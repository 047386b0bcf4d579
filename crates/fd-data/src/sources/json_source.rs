//! Decoding of dataset payloads returned by the backend

use serde::Deserialize;
use fd_core::{Dataset, Row};

use crate::DataError;

/// Dataset endpoints answer either with an envelope or with a bare row array
#[derive(Deserialize)]
#[serde(untagged)]
enum DatasetPayload {
    Envelope {
        data: Vec<Row>,
        #[serde(default)]
        columns: Option<Vec<String>>,
    },
    Bare(Vec<Row>),
}

/// Decode a dataset payload, taking the column list from the payload when
/// present and from the first row otherwise
pub fn decode_payload(payload: serde_json::Value) -> Result<Dataset, DataError> {
    let payload: DatasetPayload = serde_json::from_value(payload)
        .map_err(|e| DataError::Payload(format!("expected rows or {{ data, columns }}: {}", e)))?;

    Ok(match payload {
        DatasetPayload::Envelope {
            data,
            columns: Some(columns),
        } => Dataset::with_columns(data, columns),
        DatasetPayload::Envelope { data, columns: None } => Dataset::new(data),
        DatasetPayload::Bare(rows) => Dataset::new(rows),
    })
}

/// Decode a payload from raw JSON text
pub fn decode_payload_str(text: &str) -> Result<Dataset, DataError> {
    let value: serde_json::Value = serde_json::from_str(text)?;
    decode_payload(value)
}
