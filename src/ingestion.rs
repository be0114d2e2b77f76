//! Input boundary: turn a JSON document into raw records.
//!
//! Accepted shapes are a bare array of objects or an envelope object with a
//! `records` array. Anything else is rejected here, before the pipeline runs.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde_json::Value;
use tracing::debug;

use crate::data::RawRecord;
use crate::errors::ReconcileError;

/// Key holding the record array in the envelope form.
pub const RECORDS_KEY: &str = "records";

/// Extract raw records from an already-parsed JSON value.
pub fn parse_records(value: Value) -> Result<Vec<RawRecord>, ReconcileError> {
    let items = match value {
        Value::Array(items) => items,
        Value::Object(mut envelope) => match envelope.remove(RECORDS_KEY) {
            Some(Value::Array(items)) => items,
            Some(other) => {
                return Err(ReconcileError::InvalidInput {
                    details: format!("'{RECORDS_KEY}' must be an array, found {}", kind(&other)),
                });
            }
            None => {
                return Err(ReconcileError::InvalidInput {
                    details: format!("object input must carry a '{RECORDS_KEY}' array"),
                });
            }
        },
        other => {
            return Err(ReconcileError::InvalidInput {
                details: format!("expected an array or an object, found {}", kind(&other)),
            });
        }
    };

    items
        .into_iter()
        .enumerate()
        .map(|(idx, item)| match item {
            Value::Object(fields) => Ok(RawRecord::new(fields)),
            other => Err(ReconcileError::InvalidInput {
                details: format!("record {idx} is {}, expected an object", kind(&other)),
            }),
        })
        .collect()
}

/// Parse raw records from JSON text.
pub fn load_records_from_str(text: &str) -> Result<Vec<RawRecord>, ReconcileError> {
    let value: Value = serde_json::from_str(text)?;
    parse_records(value)
}

/// Parse raw records from a JSON file.
pub fn load_records_from_path(path: impl AsRef<Path>) -> Result<Vec<RawRecord>, ReconcileError> {
    let path = path.as_ref();
    let reader = BufReader::new(File::open(path)?);
    let value: Value = serde_json::from_reader(reader)?;
    let records = parse_records(value)?;
    debug!(
        "[lotwise:ingestion] loaded {} records from {}",
        records.len(),
        path.display()
    );
    Ok(records)
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
