//! Local CSV files as datasets
//!
//! Records are read with the `csv` crate, column types are detected from
//! every record, and the typed columns are assembled into an Arrow batch
//! before being flattened into rows. Zero-padded codes such as FIPS ids
//! stay text.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use arrow::array::*;
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use csv::ReaderBuilder;
use serde::{Deserialize, Serialize};
use fd_core::{CellValue, Dataset, Row};

use crate::DataError;

/// Options for reading a CSV file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CsvOptions {
    /// Field delimiter
    pub delimiter: u8,

    /// Cell contents treated as missing
    pub null_patterns: Vec<String>,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            null_patterns: vec![
                String::new(),
                "-".to_string(),
                "N/A".to_string(),
                "NA".to_string(),
                "null".to_string(),
                "None".to_string(),
            ],
        }
    }
}

impl CsvOptions {
    /// Whether a raw cell should be read as null
    pub fn is_null(&self, value: &str) -> bool {
        let value = value.trim();
        self.null_patterns
            .iter()
            .any(|pattern| value.eq_ignore_ascii_case(pattern))
    }
}

/// A CSV file with detected column types
pub struct CsvSource {
    path: PathBuf,
    options: CsvOptions,
    pub schema: Arc<Schema>,
    pub row_count: usize,
}

impl CsvSource {
    /// Open a CSV file and detect its schema
    pub async fn open(path: PathBuf, options: CsvOptions) -> Result<Self, DataError> {
        let (schema, row_count) = tokio::task::spawn_blocking({
            let path = path.clone();
            let options = options.clone();
            move || Self::analyze_file(&path, &options)
        })
        .await??;

        tracing::info!("Opened {:?}: {} rows, {} columns", path, row_count, schema.fields().len());

        Ok(Self {
            path,
            options,
            schema: Arc::new(schema),
            row_count,
        })
    }

    /// File name used in logs and as a data source id
    pub fn source_name(&self) -> &str {
        self.path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unknown.csv")
    }

    /// Read every record into a dataset
    pub async fn load(&self) -> Result<Dataset, DataError> {
        if self.schema.fields().is_empty() {
            return Ok(Dataset::default());
        }

        let path = self.path.clone();
        let schema = self.schema.clone();
        let options = self.options.clone();
        let batch = tokio::task::spawn_blocking(move || Self::read_batch(&path, schema, &options)).await??;

        let columns = self.schema.fields().iter().map(|f| f.name().clone()).collect();
        Ok(Dataset::with_columns(rows_from_batch(&batch), columns))
    }

    fn reader(path: &Path, options: &CsvOptions) -> Result<csv::Reader<BufReader<File>>, DataError> {
        let file = File::open(path)?;
        Ok(ReaderBuilder::new()
            .has_headers(true)
            .delimiter(options.delimiter)
            .from_reader(BufReader::new(file)))
    }

    /// Detect the schema from every record and count them
    fn analyze_file(path: &Path, options: &CsvOptions) -> Result<(Schema, usize), DataError> {
        let mut reader = Self::reader(path, options)?;
        let headers = reader.headers()?.clone();
        let records = Self::read_records(&mut reader)?;

        let fields = headers
            .iter()
            .enumerate()
            .map(|(idx, name)| Field::new(name, Self::detect_column_type(&records, idx, options), true))
            .collect::<Vec<_>>();

        Ok((Schema::new(fields), records.len()))
    }

    fn read_records(reader: &mut csv::Reader<BufReader<File>>) -> Result<Vec<Vec<String>>, DataError> {
        let mut records = Vec::new();
        for result in reader.records() {
            let record = result?;
            records.push(record.iter().map(|s| s.to_string()).collect());
        }
        Ok(records)
    }

    /// Detect a column type from its values
    fn detect_column_type(records: &[Vec<String>], col_idx: usize, options: &CsvOptions) -> DataType {
        let mut seen_value = false;
        let mut is_int = true;
        let mut is_float = true;
        let mut is_bool = true;

        for value in records.iter().filter_map(|row| row.get(col_idx)) {
            if options.is_null(value) {
                continue;
            }
            seen_value = true;
            let value = value.trim();

            if has_leading_zero(value) {
                return DataType::Utf8;
            }

            if is_int && value.parse::<i64>().is_err() {
                is_int = false;
            }
            if is_float && !value.parse::<f64>().map(|v| v.is_finite()).unwrap_or(false) {
                is_float = false;
            }
            if is_bool && !(value.eq_ignore_ascii_case("true") || value.eq_ignore_ascii_case("false")) {
                is_bool = false;
            }
        }

        if !seen_value {
            DataType::Utf8
        } else if is_bool {
            DataType::Boolean
        } else if is_int {
            DataType::Int64
        } else if is_float {
            DataType::Float64
        } else {
            DataType::Utf8
        }
    }

    /// Read the whole file into a typed record batch
    fn read_batch(path: &Path, schema: Arc<Schema>, options: &CsvOptions) -> Result<RecordBatch, DataError> {
        let mut reader = Self::reader(path, options)?;
        let records = Self::read_records(&mut reader)?;

        let cell = |row: &Vec<String>, idx: usize| -> Option<String> {
            row.get(idx)
                .filter(|value| !options.is_null(value))
                .map(|value| value.trim().to_string())
        };

        let mut columns: Vec<ArrayRef> = Vec::with_capacity(schema.fields().len());
        for (col_idx, field) in schema.fields().iter().enumerate() {
            let array: ArrayRef = match field.data_type() {
                DataType::Int64 => {
                    let mut builder = Int64Builder::new();
                    for row in &records {
                        builder.append_option(cell(row, col_idx).map(|v| parse_cell::<i64>(field, &v)).transpose()?);
                    }
                    Arc::new(builder.finish())
                }
                DataType::Float64 => {
                    let mut builder = Float64Builder::new();
                    for row in &records {
                        builder.append_option(cell(row, col_idx).map(|v| parse_cell::<f64>(field, &v)).transpose()?);
                    }
                    Arc::new(builder.finish())
                }
                DataType::Boolean => {
                    let mut builder = BooleanBuilder::new();
                    for row in &records {
                        builder.append_option(cell(row, col_idx).map(|v| v.eq_ignore_ascii_case("true")));
                    }
                    Arc::new(builder.finish())
                }
                _ => {
                    let mut builder = StringBuilder::new();
                    for row in &records {
                        builder.append_option(cell(row, col_idx));
                    }
                    Arc::new(builder.finish())
                }
            };
            columns.push(array);
        }

        RecordBatch::try_new(schema, columns).map_err(|e| e.into())
    }
}

/// `"06"` or `"-007"`: a code, not a number
fn has_leading_zero(value: &str) -> bool {
    let digits = value.strip_prefix(['-', '+']).unwrap_or(value).as_bytes();
    digits.len() > 1 && digits[0] == b'0' && digits[1].is_ascii_digit()
}

fn parse_cell<T: std::str::FromStr>(field: &Field, value: &str) -> Result<T, DataError> {
    value.parse::<T>().map_err(|_| {
        DataError::Csv(format!(
            "column '{}': '{}' is not {}",
            field.name(),
            value,
            field.data_type()
        ))
    })
}

/// Flatten a record batch into rows, one cell per field
pub fn rows_from_batch(batch: &RecordBatch) -> Vec<Row> {
    let schema = batch.schema();
    (0..batch.num_rows())
        .map(|row_idx| {
            schema
                .fields()
                .iter()
                .zip(batch.columns())
                .map(|(field, column)| (field.name().clone(), cell_value(column.as_ref(), row_idx)))
                .collect()
        })
        .collect()
}

fn cell_value(array: &dyn Array, idx: usize) -> CellValue {
    if array.is_null(idx) {
        return CellValue::Null;
    }

    if let Some(values) = array.as_any().downcast_ref::<Float64Array>() {
        CellValue::Number(values.value(idx))
    } else if let Some(values) = array.as_any().downcast_ref::<Int64Array>() {
        CellValue::Number(values.value(idx) as f64)
    } else if let Some(values) = array.as_any().downcast_ref::<Int32Array>() {
        CellValue::Number(values.value(idx) as f64)
    } else if let Some(values) = array.as_any().downcast_ref::<BooleanArray>() {
        CellValue::Bool(values.value(idx))
    } else if let Some(values) = array.as_any().downcast_ref::<StringArray>() {
        CellValue::Text(values.value(idx).to_string())
    } else {
        arrow::util::display::array_value_to_string(array, idx)
            .map(CellValue::Text)
            .unwrap_or(CellValue::Null)
    }
}
