//! Core data types for remote-config templates.
//!
//! [`Template`] and friends mirror the backend's JSON document, where every
//! value is a string. [`Parameter`] is the typed local form that the file
//! tree reader and writer work with.

use crate::codec::ValueType;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Name of the parameter that carries the application-visible version.
pub const REMOTE_CONFIG_INFO: &str = "remoteConfigInfo";

/// The full remote-configuration document exchanged with the backend.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    #[serde(default)]
    pub conditions: Vec<Condition>,
    #[serde(default)]
    pub parameters: BTreeMap<String, RemoteParameter>,
    #[serde(default)]
    pub parameter_groups: BTreeMap<String, RemoteParameterGroup>,
    /// Opaque token used by the backend to reject stale writes.
    #[serde(default)]
    pub etag: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<Version>,
}

/// A named targeting rule. The expression is opaque to this tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    pub name: String,
    pub expression: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag_color: Option<String>,
}

/// A parameter as the backend sends it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteParameter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<RemoteValue>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub conditional_values: BTreeMap<String, RemoteValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_type: Option<ValueType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// `{"value": "..."}` or `{"useInAppDefault": true}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteValue {
    #[serde(
        default,
        deserialize_with = "deserialize_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub use_in_app_default: Option<bool>,
}

impl RemoteValue {
    pub fn text(value: impl Into<String>) -> Self {
        Self {
            value: Some(value.into()),
            use_in_app_default: None,
        }
    }
}

/// A named collection of parameters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteParameterGroup {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub parameters: BTreeMap<String, RemoteParameter>,
}

/// Template version metadata. Unknown backend fields are preserved.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Version {
    #[serde(
        default,
        deserialize_with = "deserialize_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub version_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rollback_source: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Version {
    /// Numeric version, when the backend assigned one.
    pub fn number(&self) -> Option<i64> {
        self.version_number.as_deref()?.trim().parse().ok()
    }

    /// The backend expects `rollbackSource` as text even though it is a version number.
    pub fn coerce_rollback_source_to_text(&mut self) {
        if let Some(source) = self.rollback_source.take() {
            self.rollback_source = match source {
                Value::Null => None,
                Value::String(s) => Some(Value::String(s)),
                other => Some(Value::String(other.to_string())),
            };
        }
    }
}

impl Template {
    /// Body for write requests; the etag travels in the `If-Match` header instead.
    pub fn request_body(&self) -> Value {
        let mut body = serde_json::to_value(self).unwrap_or(Value::Null);
        if let Value::Object(ref mut map) = body {
            map.remove("etag");
        }
        body
    }

    /// Find a parameter at top level or inside any group.
    pub fn find_parameter(&self, name: &str) -> Option<&RemoteParameter> {
        self.parameters.get(name).or_else(|| {
            self.parameter_groups
                .values()
                .find_map(|group| group.parameters.get(name))
        })
    }

    pub fn version_number(&self) -> Option<i64> {
        self.version.as_ref().and_then(Version::number)
    }
}

/// A parameter in its typed local form.
///
/// `value_type` governs how the default and every conditional value are
/// encoded and decoded.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub value_type: ValueType,
    pub default_value: Value,
    pub conditional_values: BTreeMap<String, Value>,
    pub description: Option<String>,
}

/// Parameters keyed by name.
pub type ParameterMap = BTreeMap<String, Parameter>;

impl Parameter {
    /// A parameter holding its type's default value and no overrides.
    pub fn new(value_type: ValueType) -> Self {
        Self {
            value_type,
            default_value: value_type.default_value(),
            conditional_values: BTreeMap::new(),
            description: None,
        }
    }

    pub fn with_default(mut self, value: Value) -> Self {
        self.default_value = value;
        self
    }

    pub fn with_conditional(mut self, condition: impl Into<String>, value: Value) -> Self {
        self.conditional_values.insert(condition.into(), value);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Convert from the wire form, parsing every value with the declared type.
    ///
    /// Conditional entries without a concrete value (`useInAppDefault`) are
    /// dropped; they have no file representation.
    pub fn from_remote(remote: &RemoteParameter) -> Self {
        let value_type = remote.value_type.unwrap_or_default();
        let default_value = value_type.from_wire(
            remote
                .default_value
                .as_ref()
                .and_then(|v| v.value.as_deref()),
        );
        let conditional_values = remote
            .conditional_values
            .iter()
            .filter_map(|(condition, v)| {
                v.value
                    .as_deref()
                    .map(|raw| (condition.clone(), value_type.from_wire(Some(raw))))
            })
            .collect();
        Self {
            value_type,
            default_value,
            conditional_values,
            description: remote.description.clone(),
        }
    }

    /// Convert to the wire form, re-stringifying every value with the declared type.
    pub fn to_remote(&self) -> RemoteParameter {
        let value_type = self.value_type;
        RemoteParameter {
            default_value: Some(RemoteValue::text(value_type.to_wire(&self.default_value))),
            conditional_values: self
                .conditional_values
                .iter()
                .map(|(condition, value)| {
                    (condition.clone(), RemoteValue::text(value_type.to_wire(value)))
                })
                .collect(),
            value_type: Some(value_type),
            description: self.description.clone(),
        }
    }
}

/// Accept a string, number or bool and keep it as text.
fn deserialize_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    })
}
