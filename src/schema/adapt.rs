//! Permissive adaptation of JSON records to a fixed Arrow schema.
//!
//! Input records are not trusted to match the schema. A value whose JSON type
//! cannot be represented in the target column becomes null for that column
//! only; a line that is not a JSON object becomes a row of nulls. Nothing in
//! here fails a run because of record content.

use std::borrow::Cow;
use std::path::Path;

use arrow::datatypes::{DataType, SchemaRef};
use arrow::json::ReaderBuilder;
use arrow::record_batch::RecordBatch;
use serde_json::{Map, Value};

use crate::error::Result;
use crate::utils::logging::log_warning;

/// Adapt a single JSON value to an Arrow column type
///
/// # Returns
/// `Some(value)` in a shape the Arrow JSON decoder accepts for `data_type`,
/// or `None` when the value should be stored as null.
#[must_use]
pub fn adapt_value(value: Value, data_type: &DataType) -> Option<Value> {
    match (data_type, value) {
        (_, Value::Null) => None,
        (DataType::Utf8, Value::String(s)) => Some(Value::String(s)),
        (DataType::Utf8, Value::Number(n)) => Some(Value::String(n.to_string())),
        (DataType::Utf8, Value::Bool(b)) => Some(Value::String(b.to_string())),
        (DataType::Utf8, nested @ (Value::Array(_) | Value::Object(_))) => {
            Some(Value::String(nested.to_string()))
        }
        (DataType::Int32, Value::Number(n)) => n
            .as_i64()
            .and_then(|v| i32::try_from(v).ok())
            .map(Value::from),
        (DataType::Int64, Value::Number(n)) => n.as_i64().map(Value::from),
        (DataType::Float64, Value::Number(n)) => n.as_f64().map(Value::from),
        _ => None,
    }
}

/// Project a parsed JSON object onto the schema, adapting every field
fn adapt_object(mut object: Map<String, Value>, schema: &SchemaRef) -> Map<String, Value> {
    let mut adapted = Map::with_capacity(schema.fields().len());
    for field in schema.fields() {
        if let Some(value) = object
            .remove(field.name())
            .and_then(|v| adapt_value(v, field.data_type()))
        {
            adapted.insert(field.name().clone(), value);
        }
    }
    adapted
}

/// Byte order mark some exporters put at the start of a file
const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Decode newline-delimited JSON bytes into a single record batch
///
/// Blank lines are skipped and a leading byte order mark is dropped. Lines
/// that are not valid UTF-8 are decoded lossily. Lines that do not parse as a
/// JSON object are logged and decoded as all-null rows.
///
/// # Arguments
/// * `input` - File contents
/// * `schema` - Target schema
/// * `source` - File the input came from (for log context)
pub fn decode_json_lines(
    input: impl AsRef<[u8]>,
    schema: &SchemaRef,
    source: &Path,
) -> Result<RecordBatch> {
    let bytes = input.as_ref();
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    let mut rows: Vec<Map<String, Value>> = Vec::new();

    for (line_no, raw) in bytes.split(|b| *b == b'\n').enumerate() {
        let text = match std::str::from_utf8(raw) {
            Ok(text) => Cow::Borrowed(text),
            Err(_) => {
                log_warning(
                    &format!("Line {} is not valid UTF-8, replacing invalid bytes", line_no + 1),
                    Some(source),
                );
                String::from_utf8_lossy(raw)
            }
        };
        let line = text.trim();
        if line.is_empty() {
            continue;
        }
        match serde_json::from_str::<Value>(line) {
            Ok(Value::Object(object)) => rows.push(adapt_object(object, schema)),
            Ok(_) => {
                log_warning(
                    &format!("Line {} is not a JSON object, reading it as nulls", line_no + 1),
                    Some(source),
                );
                rows.push(Map::new());
            }
            Err(e) => {
                log_warning(
                    &format!("Line {} is malformed ({e}), reading it as nulls", line_no + 1),
                    Some(source),
                );
                rows.push(Map::new());
            }
        }
    }

    if rows.is_empty() {
        return Ok(RecordBatch::new_empty(schema.clone()));
    }

    let mut decoder = ReaderBuilder::new(schema.clone())
        .with_batch_size(rows.len())
        .build_decoder()?;
    decoder.serialize(&rows)?;

    Ok(decoder
        .flush()?
        .unwrap_or_else(|| RecordBatch::new_empty(schema.clone())))
}
