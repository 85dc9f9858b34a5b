//! JSON-safe projection of arbitrary payload values
//!
//! Everything attached to an event passes through here before it is
//! enqueued: sensitive keys are replaced with a marker at every nesting
//! level, and traversal is depth-capped so output stays bounded on any
//! input. `serde_json::Value` trees cannot contain reference cycles, so the
//! recursion ceiling plays the role a re-seen-reference check plays for
//! graph-shaped inputs. These functions never fail.

use serde::Serialize;
use serde_json::{Map, Value};

/// Marker substituted for values of redacted keys
pub const REDACTED_MARKER: &str = "[REDACTED]";

/// Marker substituted for structure past the recursion ceiling
pub const CIRCULAR_MARKER: &str = "[Circular]";

/// Marker substituted for values that cannot be converted to JSON
pub const UNSERIALIZABLE_MARKER: &str = "[Unserializable]";

/// Deepest level of nesting preserved in sanitized output
const MAX_DEPTH: usize = 32;

/// Produce a JSON-safe copy of `value` with redaction applied
pub fn sanitize(value: &Value, redact_keys: &[String]) -> Value {
    sanitize_at(value, redact_keys, 0)
}

fn sanitize_at(value: &Value, redact_keys: &[String], depth: usize) -> Value {
    match value {
        Value::Object(fields) => {
            if depth >= MAX_DEPTH {
                return Value::String(CIRCULAR_MARKER.to_string());
            }
            let mut result = Map::with_capacity(fields.len());
            for (key, field) in fields {
                if redact_keys.iter().any(|k| k == key) {
                    result.insert(key.clone(), Value::String(REDACTED_MARKER.to_string()));
                } else {
                    result.insert(key.clone(), sanitize_at(field, redact_keys, depth + 1));
                }
            }
            Value::Object(result)
        }
        Value::Array(items) => {
            if depth >= MAX_DEPTH {
                return Value::String(CIRCULAR_MARKER.to_string());
            }
            Value::Array(
                items
                    .iter()
                    .map(|item| sanitize_at(item, redact_keys, depth + 1))
                    .collect(),
            )
        }
        primitive => primitive.clone(),
    }
}

/// Convert any serializable value into sanitized JSON
///
/// A value that cannot become JSON (e.g. a map with non-string keys) turns
/// into the unserializable marker instead of an error.
pub fn to_safe_value<T: Serialize>(value: &T, redact_keys: &[String]) -> Value {
    match serde_json::to_value(value) {
        Ok(converted) => sanitize(&converted, redact_keys),
        Err(_) => Value::String(UNSERIALIZABLE_MARKER.to_string()),
    }
}
