//! Canonical JSON serialization
//!
//! The dispatcher re-serializes the JWE before handing it to a plugin so
//! every plugin sees the same deterministic form regardless of how the
//! caller formatted it: object keys sorted lexicographically, no
//! insignificant whitespace. Content equality with the input is guaranteed;
//! byte equality with any particular serializer is not.

use serde_json::{Map, Value};

use crate::error::Result;

/// Serialize a JSON value in canonical form.
pub fn to_canonical_json(value: &Value) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec(&sort_keys(value))?)
}

// Sorting is done explicitly rather than relying on the map ordering the
// serde_json build happens to use.
fn sort_keys(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by_key(|(key, _)| key.as_str());
            let mut sorted = Map::new();
            for (key, inner) in entries {
                sorted.insert(key.clone(), sort_keys(inner));
            }
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.iter().map(sort_keys).collect()),
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_keys_sorted_recursively() {
        let value = json!({
            "unprotected": {"clevis": {"url": "http://t", "pin": "tang"}},
            "ciphertext": "x",
            "iv": "y"
        });
        let out = String::from_utf8(to_canonical_json(&value).unwrap()).unwrap();
        assert_eq!(
            out,
            r#"{"ciphertext":"x","iv":"y","unprotected":{"clevis":{"pin":"tang","url":"http://t"}}}"#
        );
    }

    #[test]
    fn test_no_insignificant_whitespace() {
        let value: Value = serde_json::from_str("{ \"b\" : 1 ,\n \"a\" : [ 1 , 2 ] }").unwrap();
        let out = String::from_utf8(to_canonical_json(&value).unwrap()).unwrap();
        assert_eq!(out, r#"{"a":[1,2],"b":1}"#);
    }

    #[test]
    fn test_content_preserved() {
        let value = json!({
            "z": null,
            "a": {"nested": [true, false, 1.5, "s"]},
            "m": -7
        });
        let out = to_canonical_json(&value).unwrap();
        let reparsed: Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(reparsed, value);
    }

    #[test]
    fn test_array_order_untouched() {
        let value = json!([3, 1, 2]);
        let out = String::from_utf8(to_canonical_json(&value).unwrap()).unwrap();
        assert_eq!(out, "[3,1,2]");
    }
}
