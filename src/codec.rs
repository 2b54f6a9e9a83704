//! Value coercion between disk text, canonical values and backend wire text.
//!
//! Every parameter declares one [`ValueType`]. The type is resolved once per
//! parameter and then drives every conversion of its default and conditional
//! values, so a parameter can never mix codecs across its overrides.
//!
//! Three representations are involved:
//! - **disk text**: the contents of `defaultValue.json` / `<condition>.json`
//! - **canonical value**: a `serde_json::Value` of the shape the type implies
//!   (object/array for JSON, number, bool, string)
//! - **wire text**: the string the backend stores in `{"value": "..."}`
//!
//! Encoding never fails: absent or mistyped input falls back to the type's
//! default (`{}`, `0`, `false`, `""`).

use crate::normalize::normalize_embedded_json;
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Declared kind of a parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ValueType {
    Json,
    Number,
    Boolean,
    /// Backends that predate typed parameters report no type; those values are plain strings.
    #[default]
    #[serde(alias = "PARAMETER_VALUE_TYPE_UNSPECIFIED")]
    String,
}

/// A disk file could not be decoded under its parameter's declared type.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("cannot decode {value_type} value: {reason}")]
pub struct DecodeError {
    pub value_type: ValueType,
    pub reason: String,
}

impl ValueType {
    /// Literal name as stored in `valueType.txt` and on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueType::Json => "JSON",
            ValueType::Number => "NUMBER",
            ValueType::Boolean => "BOOLEAN",
            ValueType::String => "STRING",
        }
    }

    /// Value used when a default or override is absent.
    pub fn default_value(&self) -> Value {
        match self {
            ValueType::Json => Value::Object(Default::default()),
            ValueType::Number => Value::Number(Number::from(0)),
            ValueType::Boolean => Value::Bool(false),
            ValueType::String => Value::String(String::new()),
        }
    }

    /// Encode a canonical value into disk text.
    pub fn encode(&self, value: &Value) -> String {
        match self {
            ValueType::Json => match value {
                Value::Null => "{}".to_string(),
                other => to_pretty_json(other),
            },
            ValueType::Number => coerce_number(value).to_string(),
            ValueType::Boolean => coerce_bool(value).to_string(),
            ValueType::String => {
                let text = coerce_text(value);
                match parse_structure(&text) {
                    Some(structure) => to_pretty_json(&normalize_embedded_json(structure)),
                    None => Value::String(text).to_string(),
                }
            }
        }
    }

    /// Decode disk text into a canonical value.
    ///
    /// Only JSON and NUMBER can fail; BOOLEAN and STRING accept any text.
    pub fn decode(&self, text: &str) -> Result<Value, DecodeError> {
        let trimmed = text.trim();
        match self {
            ValueType::Json => {
                if trimmed.is_empty() {
                    return Ok(self.default_value());
                }
                serde_json::from_str(trimmed).map_err(|e| self.decode_error(e))
            }
            ValueType::Number => {
                if trimmed.is_empty() {
                    return Ok(self.default_value());
                }
                let number = match serde_json::from_str::<Value>(trimmed) {
                    Ok(Value::Number(n)) => Some(n),
                    Ok(Value::Null) => Some(Number::from(0)),
                    Ok(Value::String(s)) => parse_number_text(&s),
                    Ok(_) => None,
                    Err(_) => parse_number_text(trimmed),
                };
                number
                    .map(Value::Number)
                    .ok_or_else(|| self.decode_error(format!("'{}' is not a number", trimmed)))
            }
            ValueType::Boolean => {
                let unquoted = trimmed.trim_matches('"').trim();
                Ok(Value::Bool(is_true_literal(unquoted)))
            }
            ValueType::String => match serde_json::from_str::<Value>(trimmed) {
                Ok(Value::String(s)) => Ok(Value::String(s)),
                Ok(Value::Null) => Ok(Value::String(String::new())),
                Ok(structure @ (Value::Object(_) | Value::Array(_))) => {
                    Ok(Value::String(to_pretty_json(&structure)))
                }
                // scalar literals are kept as written
                Ok(_) => Ok(Value::String(trimmed.to_string())),
                Err(_) => Ok(Value::String(
                    text.trim_end_matches(['\n', '\r']).to_string(),
                )),
            },
        }
    }

    /// Convert backend wire text into a canonical value.
    ///
    /// JSON values have any stringified JSON nested inside them expanded.
    pub fn from_wire(&self, raw: Option<&str>) -> Value {
        let Some(raw) = raw else {
            return self.default_value();
        };
        match self {
            ValueType::Json => match serde_json::from_str::<Value>(raw) {
                Ok(structure @ (Value::Object(_) | Value::Array(_))) => {
                    normalize_embedded_json(structure)
                }
                Ok(scalar) => scalar,
                Err(_) => Value::String(raw.to_string()),
            },
            ValueType::Number => match parse_number_text(raw) {
                Some(n) => Value::Number(n),
                None => {
                    tracing::warn!(raw = %raw, "NUMBER value is not numeric, using 0");
                    self.default_value()
                }
            },
            ValueType::Boolean => Value::Bool(is_true_literal(raw.trim())),
            ValueType::String => Value::String(raw.to_string()),
        }
    }

    /// Convert a canonical value into the text the backend stores.
    pub fn to_wire(&self, value: &Value) -> String {
        match self {
            ValueType::Json => match value {
                Value::Null => "{}".to_string(),
                Value::String(s) => s.clone(),
                other => to_pretty_json(other),
            },
            ValueType::Number => coerce_number(value).to_string(),
            ValueType::Boolean => coerce_bool(value).to_string(),
            ValueType::String => coerce_text(value),
        }
    }

    fn decode_error(&self, reason: impl fmt::Display) -> DecodeError {
        DecodeError {
            value_type: *self,
            reason: reason.to_string(),
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ValueType {
    type Err = String;

    /// Case-insensitive; surrounding whitespace is ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "JSON" => Ok(ValueType::Json),
            "NUMBER" => Ok(ValueType::Number),
            "BOOLEAN" => Ok(ValueType::Boolean),
            "STRING" | "PARAMETER_VALUE_TYPE_UNSPECIFIED" => Ok(ValueType::String),
            other => Err(format!("unknown value type '{}'", other)),
        }
    }
}

/// Pretty-print with 4-space indentation.
pub fn to_pretty_json<T: Serialize + ?Sized>(value: &T) -> String {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    match value.serialize(&mut ser) {
        Ok(()) => String::from_utf8(buf).unwrap_or_default(),
        Err(_) => String::new(),
    }
}

/// Parse text as a number; non-finite floats are rejected.
pub fn parse_number_text(text: &str) -> Option<Number> {
    let text = text.trim();
    if let Ok(i) = text.parse::<i64>() {
        return Some(Number::from(i));
    }
    if let Ok(u) = text.parse::<u64>() {
        return Some(Number::from(u));
    }
    text.parse::<f64>().ok().and_then(Number::from_f64)
}

fn is_true_literal(text: &str) -> bool {
    text.eq_ignore_ascii_case("true") || text == "1"
}

fn parse_structure(text: &str) -> Option<Value> {
    match serde_json::from_str::<Value>(text) {
        Ok(structure @ (Value::Object(_) | Value::Array(_))) => Some(structure),
        _ => None,
    }
}

fn coerce_number(value: &Value) -> Number {
    match value {
        Value::Number(n) => n.clone(),
        Value::Bool(b) => Number::from(u8::from(*b)),
        Value::String(s) => parse_number_text(s).unwrap_or_else(|| Number::from(0)),
        Value::Null | Value::Object(_) | Value::Array(_) => Number::from(0),
    }
}

fn coerce_bool(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::String(s) => is_true_literal(s.trim()),
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::Null | Value::Object(_) | Value::Array(_) => false,
    }
}

fn coerce_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        Value::Object(_) | Value::Array(_) => to_pretty_json(value),
        scalar => scalar.to_string(),
    }
}
