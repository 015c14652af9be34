//! Canonical body forms used by request fingerprints.
//!
//! Structured bodies are reduced to the field list a form encoder would send:
//! nested objects and arrays become bracketed names (`user[name]`,
//! `tags[0]`) and scalars become their text. JSON, URL-encoded and multipart
//! bodies with equal field contents therefore canonicalize identically.

use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

use crate::request::{MultipartField, RequestBody};

/// Flattens a JSON value into bracket-notation form fields.
///
/// Top-level scalars produce a single field with an empty name. Empty objects
/// and arrays produce no fields, matching what form encoders send.
///
/// ```
/// use inflight_core::canonical::flatten_json;
/// use serde_json::json;
///
/// let fields = flatten_json(&json!({"id": 7, "other": [1, {"a": 2}]}));
/// assert_eq!(fields, vec![
///     ("id".to_string(), "7".to_string()),
///     ("other[0]".to_string(), "1".to_string()),
///     ("other[1][a]".to_string(), "2".to_string()),
/// ]);
/// ```
pub fn flatten_json(value: &Value) -> Vec<(String, String)> {
    let mut fields = Vec::new();
    flatten_into(String::new(), value, &mut fields);
    fields
}

fn flatten_into(name: String, value: &Value, fields: &mut Vec<(String, String)>) {
    match value {
        Value::Object(map) => {
            for (key, value) in map {
                let name = if name.is_empty() {
                    key.clone()
                } else {
                    format!("{name}[{key}]")
                };
                flatten_into(name, value, fields);
            }
        }
        Value::Array(items) => {
            for (index, value) in items.iter().enumerate() {
                flatten_into(format!("{name}[{index}]"), value, fields);
            }
        }
        scalar => fields.push((name, scalar_text(scalar))),
    }
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// Hex-encoded SHA-256 digest.
pub fn digest(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// Returns the canonical form of a request body.
///
/// The result is tagged so that different body shapes can never collide:
///
/// - `Empty` → `null`
/// - field-like bodies → `{"fields": [[name, value], ...]}`, sorted by name
///   (stable, so repeated names keep their send order)
/// - other JSON → `{"json": <value with object keys sorted>}`
/// - raw bytes → `{"bytes": {"content_type": ..., "sha256": ...}}`
pub fn canonical_body(body: &RequestBody) -> Value {
    match body {
        RequestBody::Empty => Value::Null,
        RequestBody::Json(value @ Value::Object(_)) => fields_value(flatten_json(value)),
        RequestBody::Json(value) => tagged("json", sorted(value)),
        RequestBody::Form(fields) => fields_value(fields.clone()),
        RequestBody::Multipart(parts) => {
            fields_value(parts.iter().map(multipart_field).collect())
        }
        RequestBody::Bytes { content_type, data } => {
            let mut inner = Map::new();
            inner.insert(
                "content_type".to_string(),
                content_type.clone().map_or(Value::Null, Value::String),
            );
            inner.insert("sha256".to_string(), Value::String(digest(data)));
            tagged("bytes", Value::Object(inner))
        }
    }
}

fn multipart_field(field: &MultipartField) -> (String, String) {
    match field {
        MultipartField::Text { name, value } => (name.clone(), value.clone()),
        MultipartField::File {
            name,
            file_name,
            data,
            ..
        } => (
            name.clone(),
            format!(
                "file:{}:{}",
                file_name.as_deref().unwrap_or_default(),
                digest(data)
            ),
        ),
    }
}

fn fields_value(mut fields: Vec<(String, String)>) -> Value {
    fields.sort_by(|(left, _), (right, _)| left.cmp(right));
    let pairs = fields
        .into_iter()
        .map(|(name, value)| Value::Array(vec![Value::String(name), Value::String(value)]))
        .collect();
    tagged("fields", Value::Array(pairs))
}

fn tagged(tag: &str, value: Value) -> Value {
    let mut map = Map::new();
    map.insert(tag.to_string(), value);
    Value::Object(map)
}

/// Rebuilds a JSON value with every object's keys in sorted order.
fn sorted(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            let mut out = Map::new();
            for key in keys {
                out.insert(key.clone(), sorted(&map[key.as_str()]));
            }
            Value::Object(out)
        }
        Value::Array(items) => Value::Array(items.iter().map(sorted).collect()),
        scalar => scalar.clone(),
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn test_json_object_matches_equivalent_form() {
        let json = RequestBody::Json(json!({"orgNo": "s000044", "other": [1, {"a": 2}]}));
        let form = RequestBody::Form(vec![
            ("other[1][a]".into(), "2".into()),
            ("orgNo".into(), "s000044".into()),
            ("other[0]".into(), "1".into()),
        ]);
        assert_eq!(canonical_body(&json), canonical_body(&form));
    }

    #[test]
    fn test_multipart_text_matches_form() {
        let multipart = RequestBody::Multipart(vec![
            MultipartField::text("id", "42"),
            MultipartField::text("name", "x"),
        ]);
        let form = RequestBody::Form(vec![("name".into(), "x".into()), ("id".into(), "42".into())]);
        assert_eq!(canonical_body(&multipart), canonical_body(&form));
    }

    #[test]
    fn test_repeated_names_keep_send_order() {
        let ab = RequestBody::Form(vec![("t".into(), "a".into()), ("t".into(), "b".into())]);
        let ba = RequestBody::Form(vec![("t".into(), "b".into()), ("t".into(), "a".into())]);
        assert_ne!(canonical_body(&ab), canonical_body(&ba));
    }

    #[test]
    fn test_top_level_array_does_not_collide_with_fields() {
        let array = RequestBody::Json(json!([["id", "1"]]));
        let form = RequestBody::Form(vec![("id".into(), "1".into())]);
        assert_ne!(canonical_body(&array), canonical_body(&form));
    }

    #[test]
    fn test_nested_key_order_is_irrelevant() {
        let left = RequestBody::Json(json!([{"b": 1, "a": {"d": 2, "c": 3}}]));
        let right = RequestBody::Json(json!([{"a": {"c": 3, "d": 2}, "b": 1}]));
        assert_eq!(canonical_body(&left), canonical_body(&right));
    }

    #[test]
    fn test_file_parts_differ_by_content() {
        let one = RequestBody::Multipart(vec![MultipartField::file("f", "a.txt", "one")]);
        let two = RequestBody::Multipart(vec![MultipartField::file("f", "a.txt", "two")]);
        assert_ne!(canonical_body(&one), canonical_body(&two));
    }

    #[test]
    fn test_bytes_hash_payload() {
        let body = RequestBody::Bytes {
            content_type: Some("text/plain".into()),
            data: "hello".into(),
        };
        assert_eq!(
            canonical_body(&body),
            json!({"bytes": {
                "content_type": "text/plain",
                "sha256": "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
            }})
        );
    }

    #[test]
    fn test_null_scalar_flattens_to_empty_text() {
        assert_eq!(
            flatten_json(&json!({"a": null, "b": true, "c": {}})),
            vec![("a".to_string(), String::new()), ("b".to_string(), "true".to_string())]
        );
    }
}
