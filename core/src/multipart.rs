//! Multipart flattening and `multipart/form-data` encoding.
//!
//! # Design
//! The Bot API accepts nested JSON for plain calls but requires flat field
//! names when a request carries a binary upload. [`flatten`] walks the
//! serialized parameter object and produces one named part per leaf:
//! nested objects recurse with bracketed names (`parent[child]`), strings
//! are sent verbatim, and every other scalar or array is sent as its
//! compact JSON text. Binary parts are not produced here — an uploaded file
//! serializes into the parameter object as an `attach://<name>` reference,
//! and the matching [`Part`] comes from the method's
//! [`uploads`](crate::methods::Method::uploads).

use serde_json::{Map, Value};
use uuid::Uuid;

/// One named part of a `multipart/form-data` body.
#[derive(Debug, Clone, PartialEq)]
pub struct Part {
    pub name: String,
    pub value: PartValue,
}

/// Content of a [`Part`]: form text or an uploaded file.
#[derive(Debug, Clone, PartialEq)]
pub enum PartValue {
    Text(String),
    File { file_name: String, bytes: Vec<u8> },
}

/// Flatten a JSON parameter object into named text parts.
///
/// Returns `None` when no parts were produced, so "no multipart needed"
/// stays distinguishable from "multipart with zero fields".
pub fn flatten(map: &Map<String, Value>) -> Option<Vec<Part>> {
    let mut parts = Vec::new();
    flatten_into(None, map, &mut parts);
    if parts.is_empty() {
        None
    } else {
        Some(parts)
    }
}

fn flatten_into(prefix: Option<&str>, map: &Map<String, Value>, parts: &mut Vec<Part>) {
    for (key, value) in map {
        let name = match prefix {
            Some(prefix) => format!("{prefix}[{key}]"),
            None => key.clone(),
        };
        match value {
            Value::Object(child) => flatten_into(Some(&name), child, parts),
            // Serialized requests omit unset fields, never emit null.
            Value::Null => {}
            leaf => parts.push(Part {
                name,
                value: PartValue::Text(leaf_text(leaf)),
            }),
        }
    }
}

/// Form-field text for a leaf value: strings unquoted, everything else as
/// compact JSON (the wire expects JSON-serialized arrays and numbers).
fn leaf_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// Fresh boundary for one request body.
pub fn boundary() -> String {
    format!("------------------------{}", Uuid::new_v4().simple())
}

/// Encode parts into a `multipart/form-data` body with the given boundary.
pub fn encode(parts: &[Part], boundary: &str) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
        match &part.value {
            PartValue::Text(text) => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", part.name)
                        .as_bytes(),
                );
                body.extend_from_slice(text.as_bytes());
            }
            PartValue::File { file_name, bytes } => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
                        part.name, file_name
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
                body.extend_from_slice(bytes);
            }
        }
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());
    body
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {other}"),
        }
    }

    #[test]
    fn flatten_nests_with_bracketed_names() {
        let map = object(json!({"a": 1, "b": {"c": 2}}));
        let parts = flatten(&map).unwrap();
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0].name, "a");
        assert_eq!(parts[0].value, PartValue::Text("1".to_string()));
        assert_eq!(parts[1].name, "b[c]");
        assert_eq!(parts[1].value, PartValue::Text("2".to_string()));
    }

    #[test]
    fn flatten_recurses_two_levels() {
        let map = object(json!({"outer": {"mid": {"inner": "x"}}}));
        let parts = flatten(&map).unwrap();
        assert_eq!(parts.len(), 1);
        assert_eq!(parts[0].name, "outer[mid][inner]");
        assert_eq!(parts[0].value, PartValue::Text("x".to_string()));
    }

    #[test]
    fn flatten_empty_object_is_none() {
        let map = object(json!({}));
        assert!(flatten(&map).is_none());
    }

    #[test]
    fn flatten_strings_are_unquoted() {
        let map = object(json!({"text": "hello world"}));
        let parts = flatten(&map).unwrap();
        assert_eq!(parts[0].value, PartValue::Text("hello world".to_string()));
    }

    #[test]
    fn flatten_arrays_become_json_text() {
        let map = object(json!({"allowed_updates": ["message", "callback_query"]}));
        let parts = flatten(&map).unwrap();
        assert_eq!(
            parts[0].value,
            PartValue::Text(r#"["message","callback_query"]"#.to_string())
        );
    }

    #[test]
    fn flatten_bools_become_json_text() {
        let map = object(json!({"disable_notification": true}));
        let parts = flatten(&map).unwrap();
        assert_eq!(parts[0].value, PartValue::Text("true".to_string()));
    }

    #[test]
    fn encode_emits_dispositions_and_final_boundary() {
        let parts = vec![
            Part {
                name: "chat_id".to_string(),
                value: PartValue::Text("42".to_string()),
            },
            Part {
                name: "report.pdf".to_string(),
                value: PartValue::File {
                    file_name: "report.pdf".to_string(),
                    bytes: vec![0x25, 0x50, 0x44, 0x46],
                },
            },
        ];
        let body = encode(&parts, "XBOUNDARY");
        let text = String::from_utf8_lossy(&body);
        assert!(text.contains("--XBOUNDARY\r\n"));
        assert!(text.contains("Content-Disposition: form-data; name=\"chat_id\"\r\n\r\n42"));
        assert!(text.contains(
            "Content-Disposition: form-data; name=\"report.pdf\"; filename=\"report.pdf\"\r\n"
        ));
        assert!(text.contains("Content-Type: application/octet-stream\r\n\r\n%PDF"));
        assert!(text.ends_with("--XBOUNDARY--\r\n"));
    }

    #[test]
    fn boundaries_are_unique_per_call() {
        assert_ne!(boundary(), boundary());
    }
}
