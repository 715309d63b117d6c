//! Row codec: the single serialization boundary between rows and containers
//!
//! Containers are JSON Lines files:
//!
//! ```text
//! ["id","code","description","category","is_active"]
//! [1,"J06.9","Acute upper respiratory infection","J00-J99",true]
//! [2,"R51","Headache",null,true]
//! ```
//!
//! - Line 1: column names in declared order
//! - Each following line: one row, one cell per column in the same order
//! - Integers as JSON numbers, booleans as JSON booleans
//! - Text and enum cells as JSON strings, dates as `"YYYY-MM-DD"` strings
//! - Absent optional cells as `null`
//!
//! Decoding is strict: a cell of the wrong JSON type, an unparseable date or
//! a row of the wrong width is a decode error. Schema-level checks
//! (required columns, enum variants) are applied by the container on load.

use chrono::NaiveDate;
use clinicdb_core::{ColumnType, Row, TableSchema, Value};
use serde_json::Value as Json;

/// Date format used on disk
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Encode the header line for a schema (no trailing newline)
pub fn encode_header(schema: &TableSchema) -> String {
    Json::Array(
        schema
            .columns
            .iter()
            .map(|c| Json::String(c.name.to_string()))
            .collect(),
    )
    .to_string()
}

/// Decode a header line into column names
pub fn decode_header(line: &str) -> Result<Vec<String>, String> {
    let parsed: Json = serde_json::from_str(line).map_err(|e| format!("header: {}", e))?;
    let cells = parsed
        .as_array()
        .ok_or_else(|| "header is not a JSON array".to_string())?;
    cells
        .iter()
        .map(|c| {
            c.as_str()
                .map(str::to_string)
                .ok_or_else(|| format!("header cell {} is not a string", c))
        })
        .collect()
}

/// Encode one cell
pub fn encode_value(value: &Value) -> Json {
    match value {
        Value::Null => Json::Null,
        Value::Int(i) => Json::from(*i),
        Value::Bool(b) => Json::Bool(*b),
        Value::Text(s) => Json::String(s.clone()),
        Value::Date(d) => Json::String(d.format(DATE_FORMAT).to_string()),
    }
}

/// Encode a row as one line (no trailing newline)
pub fn encode_row(row: &Row) -> String {
    Json::Array(row.cells().iter().map(encode_value).collect()).to_string()
}

/// Decode one cell for a column type
pub fn decode_value(ty: ColumnType, cell: &Json) -> Result<Value, String> {
    match (ty, cell) {
        (_, Json::Null) => Ok(Value::Null),
        (ColumnType::Integer, Json::Number(n)) => n
            .as_i64()
            .map(Value::Int)
            .ok_or_else(|| format!("{} is not a 64-bit integer", n)),
        (ColumnType::Boolean, Json::Bool(b)) => Ok(Value::Bool(*b)),
        (ColumnType::Text | ColumnType::Enum(_), Json::String(s)) => Ok(Value::Text(s.clone())),
        (ColumnType::Date, Json::String(s)) => NaiveDate::parse_from_str(s, DATE_FORMAT)
            .map(Value::Date)
            .map_err(|e| format!("invalid date {:?}: {}", s, e)),
        (ty, other) => Err(format!("expected {}, found {}", ty.name(), other)),
    }
}

/// Decode one data line into a row of `schema`
pub fn decode_row(schema: &'static TableSchema, line: &str) -> Result<Row, String> {
    let parsed: Json = serde_json::from_str(line).map_err(|e| e.to_string())?;
    let cells = parsed
        .as_array()
        .ok_or_else(|| "row is not a JSON array".to_string())?;
    if cells.len() != schema.columns.len() {
        return Err(format!(
            "expected {} cells, found {}",
            schema.columns.len(),
            cells.len()
        ));
    }
    let values = schema
        .columns
        .iter()
        .zip(cells)
        .map(|(column, cell)| {
            decode_value(column.ty, cell).map_err(|e| format!("column {}: {}", column.name, e))
        })
        .collect::<Result<Vec<_>, _>>()?;
    Row::from_cells(schema, values).map_err(|e| e.to_string())
}
