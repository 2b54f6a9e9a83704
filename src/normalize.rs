//! Expansion of JSON that the backend embeds as strings.
//!
//! The backend stores every parameter value as text, so structured values
//! arrive as stringified JSON, sometimes nested several levels deep. Before a
//! template is written to disk those strings are replaced by the structures
//! they encode.
//!
//! Termination rules:
//! - a string that parses to an object or array is replaced by the parsed
//!   structure, which is then visited in turn
//! - a string that parses to a primitive is replaced by that primitive and
//!   not visited further
//! - a string that is not JSON is left alone
//! - object members whose key is purely numeric are left untouched, as are
//!   array elements; both are positional data, not named fields

use serde_json::{Map, Value};

/// Recursively replace stringified JSON with the value it encodes.
pub fn normalize_embedded_json(value: Value) -> Value {
    match value {
        Value::String(text) => match serde_json::from_str::<Value>(&text) {
            Ok(structure @ (Value::Object(_) | Value::Array(_))) => {
                normalize_embedded_json(structure)
            }
            Ok(primitive) => primitive,
            Err(_) => Value::String(text),
        },
        Value::Object(map) => Value::Object(normalize_members(map)),
        // elements are positional; see module docs
        other => other,
    }
}

fn normalize_members(map: Map<String, Value>) -> Map<String, Value> {
    map.into_iter()
        .map(|(key, value)| {
            if is_index_key(&key) {
                (key, value)
            } else {
                let value = normalize_embedded_json(value);
                (key, value)
            }
        })
        .collect()
}

/// Keys made only of ASCII digits.
fn is_index_key(key: &str) -> bool {
    !key.is_empty() && key.bytes().all(|b| b.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_expands_nested_stringified_objects() {
        let input = json!({
            "value": "{\"outer\":\"{\\\"inner\\\":true}\"}"
        });
        let expected = json!({
            "value": {"outer": {"inner": true}}
        });
        assert_eq!(normalize_embedded_json(input), expected);
    }

    #[test]
    fn test_primitives_are_parsed_but_not_visited() {
        let input = json!({
            "count": "12",
            "flag": "false",
            "quoted": "\"{\\\"a\\\":1}\""
        });
        let out = normalize_embedded_json(input);
        assert_eq!(out["count"], json!(12));
        assert_eq!(out["flag"], json!(false));
        // a JSON string literal unwraps once; its contents stay text
        assert_eq!(out["quoted"], json!("{\"a\":1}"));
    }

    #[test]
    fn test_plain_text_is_untouched() {
        let input = json!({"expression": "app.userProperty['env'] == 'dev'"});
        assert_eq!(normalize_embedded_json(input.clone()), input);
    }

    #[test]
    fn test_index_keys_and_arrays_are_skipped() {
        let input = json!({
            "0": "{\"a\":1}",
            "list": ["{\"b\":2}", "3"],
            "1x": "{\"c\":3}"
        });
        let out = normalize_embedded_json(input);
        assert_eq!(out["0"], json!("{\"a\":1}"));
        assert_eq!(out["list"], json!(["{\"b\":2}", "3"]));
        assert_eq!(out["1x"], json!({"c": 3}));
    }

    #[test]
    fn test_is_idempotent() {
        let input = json!({"v": "{\"x\":\"[1,2]\"}"});
        let once = normalize_embedded_json(input);
        let twice = normalize_embedded_json(once.clone());
        assert_eq!(once, twice);
    }

    #[test]
    fn test_top_level_string() {
        assert_eq!(
            normalize_embedded_json(json!("{\"versionNumber\":3}")),
            json!({"versionNumber": 3})
        );
        assert_eq!(normalize_embedded_json(json!("hello")), json!("hello"));
    }
}
