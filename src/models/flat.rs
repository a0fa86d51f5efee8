//! Flat-key document layout.
//!
//! Stored documents keep nested objects flattened into one level, joining
//! path segments with `_` (`contact.phone` is stored as `contact_phone`).
//! Flat documents are simple to filter and sort on and map one-to-one onto
//! CSV columns.

use serde_json::{Map, Value};

/// Separator between path segments of a flattened key.
pub const FLAT_SEPARATOR: char = '_';

/// Flatten nested objects of `value` into a single-level map.
///
/// Arrays and scalars are leaves. A non-object input yields an empty map.
pub fn flatten(value: &Value) -> Map<String, Value> {
    let mut out = Map::new();
    if let Value::Object(obj) = value {
        flatten_into(obj, None, &mut out);
    }
    out
}

fn flatten_into(obj: &Map<String, Value>, prefix: Option<&str>, out: &mut Map<String, Value>) {
    for (key, value) in obj {
        let path = match prefix {
            Some(p) => format!("{p}{FLAT_SEPARATOR}{key}"),
            None => key.clone(),
        };
        match value {
            Value::Object(inner) if !inner.is_empty() => flatten_into(inner, Some(&path), out),
            Value::Object(_) => {}
            other => {
                out.insert(path, other.clone());
            }
        }
    }
}

/// Rebuild nested objects from a flat map by splitting keys on `_`.
///
/// When a key is both a leaf and a prefix of another key, the nested
/// object wins.
pub fn nest(flat: &Map<String, Value>) -> Value {
    let mut root = Map::new();

    for (key, value) in flat {
        let parts: Vec<&str> = key.split(FLAT_SEPARATOR).collect();
        let (last, parents) = match parts.split_last() {
            Some(split) => split,
            None => continue,
        };

        let mut current = &mut root;
        for part in parents {
            let entry = current
                .entry((*part).to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if !entry.is_object() {
                *entry = Value::Object(Map::new());
            }
            current = match entry {
                Value::Object(map) => map,
                _ => unreachable!("entry was just made an object"),
            };
        }

        match current.get(*last) {
            Some(Value::Object(_)) => {}
            _ => {
                current.insert((*last).to_string(), value.clone());
            }
        }
    }

    Value::Object(root)
}

/// Read one flat field of a flattened document.
pub fn flat_field<'a>(flat: &'a Map<String, Value>, field: &str) -> Option<&'a Value> {
    flat.get(field).filter(|v| !v.is_null())
}
