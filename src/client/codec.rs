//! Conversion between plain JSON and Firestore's typed value encoding.
//!
//! Firestore wraps every value in a single-key object naming its type
//! (`{"stringValue": "Ana"}`, `{"integerValue": "42"}`). Fields listed in
//! [`TIMESTAMP_FIELDS`] are written as `timestampValue` so the store can
//! order and compare them as dates.

use serde_json::{json, Map, Number, Value};

/// Top-level fields stored as Firestore timestamps.
pub const TIMESTAMP_FIELDS: &[&str] = &["createdAt", "updatedAt", "deletedAt", "expiresAt"];

/// Encode a flat document into a Firestore `fields` object.
pub fn encode_fields(fields: &Map<String, Value>) -> Value {
    let encoded: Map<String, Value> = fields
        .iter()
        .map(|(key, value)| {
            let typed = match value {
                Value::String(s) if TIMESTAMP_FIELDS.contains(&key.as_str()) => {
                    json!({ "timestampValue": s })
                }
                other => encode_value(other),
            };
            (key.clone(), typed)
        })
        .collect();
    Value::Object(encoded)
}

/// Encode one JSON value.
pub fn encode_value(value: &Value) -> Value {
    match value {
        Value::Null => json!({ "nullValue": null }),
        Value::Bool(b) => json!({ "booleanValue": b }),
        Value::Number(n) => match n.as_i64() {
            Some(i) => json!({ "integerValue": i.to_string() }),
            None => json!({ "doubleValue": n.as_f64().unwrap_or_default() }),
        },
        Value::String(s) => json!({ "stringValue": s }),
        Value::Array(items) => {
            let values: Vec<Value> = items.iter().map(encode_value).collect();
            json!({ "arrayValue": { "values": values } })
        }
        Value::Object(map) => {
            let fields: Map<String, Value> = map
                .iter()
                .map(|(k, v)| (k.clone(), encode_value(v)))
                .collect();
            json!({ "mapValue": { "fields": fields } })
        }
    }
}

/// Decode a Firestore `fields` object into a flat JSON map.
pub fn decode_fields(fields: &Value) -> Map<String, Value> {
    match fields.as_object() {
        Some(obj) => obj
            .iter()
            .map(|(k, v)| (k.clone(), decode_value(v)))
            .collect(),
        None => Map::new(),
    }
}

/// Decode one typed value. Unknown encodings decode to `null`.
pub fn decode_value(value: &Value) -> Value {
    let Some((kind, inner)) = value.as_object().and_then(|obj| obj.iter().next()) else {
        return Value::Null;
    };

    match kind.as_str() {
        "stringValue" | "timestampValue" | "referenceValue" | "bytesValue" => inner.clone(),
        "booleanValue" => inner.clone(),
        "integerValue" => match inner {
            Value::String(s) => s
                .parse::<i64>()
                .map(|i| Value::Number(i.into()))
                .unwrap_or(Value::Null),
            Value::Number(_) => inner.clone(),
            _ => Value::Null,
        },
        "doubleValue" => inner
            .as_f64()
            .and_then(Number::from_f64)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        "arrayValue" => {
            let values = inner
                .get("values")
                .and_then(Value::as_array)
                .map(|items| items.iter().map(decode_value).collect())
                .unwrap_or_default();
            Value::Array(values)
        }
        "mapValue" => Value::Object(decode_fields(inner.get("fields").unwrap_or(&Value::Null))),
        "geoPointValue" => inner.clone(),
        _ => Value::Null,
    }
}
