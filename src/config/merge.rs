//! Field-by-field merging of configuration tiers.
//!
//! Higher tiers override lower ones key by key. Arrays and scalars are
//! replaced whole.

use serde_json::Value;

/// Merge `overlay` onto `base`.
///
/// - objects merge recursively
/// - `null` in the overlay keeps the base value (the tier did not set it)
/// - anything else in the overlay replaces the base value
///
/// # Example
/// ```
/// use serde_json::json;
/// use remote_config_sync::config::deep_merge;
///
/// let defaults = json!({"backend": {"kind": "firebase", "request_timeout_ms": 30000}});
/// let project = json!({"backend": {"kind": "file"}});
/// let merged = deep_merge(defaults, project);
/// assert_eq!(merged, json!({"backend": {"kind": "file", "request_timeout_ms": 30000}}));
/// ```
pub fn deep_merge(base: Value, overlay: Value) -> Value {
    match (base, overlay) {
        (Value::Object(mut base_map), Value::Object(overlay_map)) => {
            for (key, overlay_value) in overlay_map {
                let merged = match base_map.remove(&key) {
                    Some(base_value) => deep_merge(base_value, overlay_value),
                    None => overlay_value,
                };
                base_map.insert(key, merged);
            }
            Value::Object(base_map)
        }
        (base, Value::Null) => base,
        (_, overlay) => overlay,
    }
}

/// Fold tiers lowest-priority first.
pub fn deep_merge_all(values: impl IntoIterator<Item = Value>) -> Value {
    values.into_iter().fold(Value::Null, deep_merge)
}
