//! CSV export of table data
//!
//! Every cell is JSON-encoded, so strings come out quoted and numbers or
//! booleans bare. Lines are joined with `\n` without a trailing newline.

use std::path::Path;

use fd_core::value::format_js_number;
use fd_core::{CellValue, Row};

use crate::DataError;

/// Encode one cell the way `JSON.stringify` does; a missing cell is empty
fn encode_cell(cell: Option<&CellValue>) -> Result<String, DataError> {
    Ok(match cell {
        None => String::new(),
        Some(CellValue::Null) => "null".to_string(),
        Some(CellValue::Bool(b)) => b.to_string(),
        Some(CellValue::Number(n)) if n.is_finite() => format_js_number(*n),
        Some(CellValue::Number(_)) => "null".to_string(),
        Some(CellValue::Text(s)) => serde_json::to_string(s)?,
    })
}

/// Render `rows` as CSV text with the given column order
pub fn export_csv(rows: &[Row], columns: &[String]) -> Result<String, DataError> {
    let mut lines = Vec::with_capacity(rows.len() + 1);
    lines.push(columns.join(","));

    for row in rows {
        let cells = columns
            .iter()
            .map(|column| encode_cell(row.get(column)))
            .collect::<Result<Vec<_>, _>>()?;
        lines.push(cells.join(","));
    }

    Ok(lines.join("\n"))
}

/// Write CSV text for `rows` to `path`
pub fn save_csv(path: &Path, rows: &[Row], columns: &[String]) -> Result<(), DataError> {
    let text = export_csv(rows, columns)?;
    std::fs::write(path, text)?;
    tracing::info!("Exported {} rows to {:?}", rows.len(), path);
    Ok(())
}
