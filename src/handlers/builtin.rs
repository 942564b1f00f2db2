//! Built-in job types. Each is a small, self-contained computation over the
//! payload; anything heavier belongs in an embedding application's own
//! registry.

use chrono::{Duration, Utc};
use serde_json::{json, Map, Value};

use crate::error::HandlerError;

/// `EXPORT_CSV`: render the payload's optional `rows` (array of arrays) as
/// CSV text. `sheetName` names the exported table and is required.
pub fn export_csv(payload: &Map<String, Value>) -> Result<Value, HandlerError> {
    let sheet = payload
        .get("sheetName")
        .and_then(Value::as_str)
        .ok_or_else(|| HandlerError::missing_field("sheetName"))?;

    let rows = payload
        .get("rows")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();

    let csv: String = rows
        .iter()
        .map(|row| match row {
            Value::Array(cells) => cells
                .iter()
                .map(cell_text)
                .collect::<Vec<_>>()
                .join(","),
            other => cell_text(other),
        })
        .collect::<Vec<_>>()
        .join("\n");

    Ok(json!({
        "message": "CSV export complete",
        "rows": rows.len(),
        "sheet": sheet,
        "bytes": csv.len(),
    }))
}

/// `BATCH_CLEANUP`: compute the cutoff for purging entries older than
/// `days` (default 30).
pub fn batch_cleanup(payload: &Map<String, Value>) -> Result<Value, HandlerError> {
    let days = payload.get("days").and_then(Value::as_i64).unwrap_or(30);
    let cutoff = Utc::now() - Duration::days(days);

    Ok(json!({
        "message": format!("cleanup complete (older than {days} days)"),
        "cutoff_date": cutoff.to_rfc3339(),
    }))
}

/// `GENERATE_REPORT`: placeholder report generation.
pub fn generate_report(_payload: &Map<String, Value>) -> Result<Value, HandlerError> {
    Ok(json!({
        "message": "report generated",
        "format": "PDF",
    }))
}

/// `CALCULATE_STATS`: placeholder statistics over the named sheet.
pub fn calculate_stats(payload: &Map<String, Value>) -> Result<Value, HandlerError> {
    let sheet = payload.get("sheetName").and_then(Value::as_str);

    Ok(json!({
        "message": "statistics calculated",
        "sheet": sheet,
    }))
}

fn cell_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
