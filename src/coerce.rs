//! Scalar coercion helpers
//!
//! The single decoding layer between loosely typed backend values and the
//! string-only flat records. Every function here is total: malformed input
//! degrades to an empty or verbatim string and never fails.

use serde_json::{Map, Value};

/// Generic display form of a raw value
///
/// Absent and `null` become `""`. Strings pass through untouched, numbers use
/// their shortest decimal form (`3.0` displays as `3`), booleans display as
/// `true`/`false`, and nested structures display as compact JSON.
pub fn display_string(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Bool(b)) => b.to_string(),
        Some(Value::Number(n)) => number_string(n),
        Some(other) => other.to_string(),
    }
}

fn number_string(n: &serde_json::Number) -> String {
    if n.is_f64() {
        if let Some(f) = n.as_f64() {
            if f.fract() == 0.0 && f.abs() < 1e15 {
                return format!("{}", f as i64);
            }
        }
    }
    n.to_string()
}

/// Three-way boolean coercion: `true` → `"Yes"`, `false` → `"No"`, anything
/// else → `""`
pub fn bool_str(value: Option<&Value>) -> String {
    match value {
        Some(Value::Bool(true)) => "Yes".to_string(),
        Some(Value::Bool(false)) => "No".to_string(),
        _ => String::new(),
    }
}

/// Decode a nested blob stored either as a JSON object or as a JSON string
///
/// Returns `None` when the value is absent, empty, not decodable, or decodes
/// to anything other than an object.
pub fn parse_blob(value: Option<&Value>) -> Option<Map<String, Value>> {
    match value? {
        Value::Object(map) => Some(map.clone()),
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return None;
            }
            match serde_json::from_str::<Value>(trimmed) {
                Ok(Value::Object(map)) => Some(map),
                _ => None,
            }
        }
        _ => None,
    }
}

/// Flatten a nested blob into `prefix_field` keys
///
/// Always yields one entry per name in `fields`, in order.
pub fn flatten_nested(
    value: Option<&Value>,
    prefix: &str,
    fields: &[&str],
) -> Vec<(String, String)> {
    let blob = parse_blob(value);
    fields
        .iter()
        .map(|field| {
            let text = blob
                .as_ref()
                .map(|map| display_string(map.get(*field)))
                .unwrap_or_default();
            (format!("{prefix}_{field}"), text)
        })
        .collect()
}

/// Normalize a keyword field into a comma separated list
///
/// Accepts a native list, a JSON array encoded in a string, or free text.
/// Decoding is only attempted when the trimmed string starts with `[`; a
/// string that fails to decode, or decodes to a non-list, is returned as is.
pub fn normalize_keywords(value: Option<&Value>) -> String {
    match value {
        Some(Value::Array(items)) => join_list(items),
        Some(Value::String(s)) => {
            if s.trim_start().starts_with('[') {
                if let Ok(Value::Array(items)) = serde_json::from_str::<Value>(s.trim()) {
                    return join_list(&items);
                }
            }
            s.clone()
        }
        other => display_string(other),
    }
}

fn join_list(items: &[Value]) -> String {
    items
        .iter()
        .map(|item| display_string(Some(item)))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Display label for a stored file path: its final path segment
///
/// Both `/` and `\` separate segments. A path whose final segment is empty
/// labels as the full path.
pub fn file_label(path: &str) -> String {
    match path.rsplit(['/', '\\']).next() {
        Some(segment) if !segment.is_empty() => segment.to_string(),
        _ => path.to_string(),
    }
}
