//! Recursive JSON flattening into single-level rows
//!
//! `{"asset": {"id": 123, "name": "test"}}` becomes
//! `{"asset_id": 123, "asset_name": "test"}`.

use serde_json::{Map, Value};

use vulnex_core::FlatRow;

const SEP: char = '_';

/// Flatten a nested JSON object into (column, value) pairs.
///
/// - nested objects recurse, joining keys with `_`
/// - empty lists are kept as-is
/// - lists of objects are JSON-stringified (tabular stores have no nested rows)
/// - lists of primitives are kept as-is
/// - primitives are kept as-is
pub fn flatten(obj: Map<String, Value>) -> FlatRow {
    let mut out = FlatRow::new();
    for (key, value) in obj {
        flatten_into(&mut out, &key, value);
    }
    out
}

fn flatten_into(out: &mut FlatRow, key: &str, value: Value) {
    match value {
        Value::Object(inner) => {
            for (k, v) in inner {
                let nested = format!("{key}{SEP}{k}");
                flatten_into(out, &nested, v);
            }
        }
        Value::Array(items) => {
            if items.first().is_some_and(Value::is_object) {
                // List of objects — stringify for tabular compatibility
                let text = serde_json::to_string(&items).unwrap_or_default();
                out.push((key.to_string(), Value::String(text)));
            } else {
                // Empty list or list of primitives
                out.push((key.to_string(), Value::Array(items)));
            }
        }
        primitive => out.push((key.to_string(), primitive)),
    }
}
