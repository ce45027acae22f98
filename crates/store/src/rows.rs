//! Dynamic row decoding for generated SELECT statements.
//!
//! Generated queries can project arbitrary columns and expressions, so rows
//! are decoded by declared column type into JSON values. SQLite's storage
//! classes map as: INTEGER → number, REAL → number, TEXT/DATE/DATETIME →
//! string, NULL → null. Anything else falls back to a textual rendering.

use rosterbot_core::error::StoreError;
use serde_json::Value;
use sqlx::sqlite::SqliteRow;
use sqlx::{Column, Row, TypeInfo, ValueRef};

/// Decode one row into a JSON object keyed by column name.
pub fn row_to_json(row: &SqliteRow) -> Result<serde_json::Map<String, Value>, StoreError> {
    let mut map = serde_json::Map::new();

    for (i, column) in row.columns().iter().enumerate() {
        let raw = row
            .try_get_raw(i)
            .map_err(|e| StoreError::QueryFailed(format!("column {}: {e}", column.name())))?;

        let value = if raw.is_null() {
            Value::Null
        } else {
            decode_value(row, i, raw.type_info().name())
        };

        map.insert(column.name().to_string(), value);
    }

    Ok(map)
}

/// Decode a non-null column by its declared type name.
fn decode_value(row: &SqliteRow, index: usize, type_name: &str) -> Value {
    match type_name {
        "INTEGER" | "INT" | "BIGINT" | "BOOLEAN" => row
            .try_get::<i64, _>(index)
            .map(Value::from)
            .unwrap_or(Value::Null),
        "REAL" | "FLOAT" | "DOUBLE" | "NUMERIC" => row
            .try_get::<f64, _>(index)
            .ok()
            .and_then(|f| serde_json::Number::from_f64(f).map(Value::Number))
            .unwrap_or(Value::Null),
        "TEXT" | "DATE" | "DATETIME" => row
            .try_get::<String, _>(index)
            .map(Value::String)
            .unwrap_or(Value::Null),
        "BLOB" => row
            .try_get::<Vec<u8>, _>(index)
            .map(|bytes| Value::String(format!("<{} bytes>", bytes.len())))
            .unwrap_or(Value::Null),
        // Unknown declared type: try the common decodings in order.
        _ => row
            .try_get::<i64, _>(index)
            .map(Value::from)
            .or_else(|_| row.try_get::<String, _>(index).map(Value::String))
            .unwrap_or(Value::Null),
    }
}
