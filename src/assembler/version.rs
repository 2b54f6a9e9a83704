//! The application-visible version counter in `remoteConfigInfo`.
//!
//! `remoteConfigInfo` holds `{versionNumber, versionCheckUrlText,
//! versionCheckHttpMethod}`. Every push increments `versionNumber` by one so
//! clients can tell a new template went out.

use super::Assembler;
use crate::codec::to_pretty_json;
use crate::error::{SyncError, SyncResult};
use crate::tree::{ConfigLayout, read_parameter, write_parameter};
use crate::types::{Parameter, ParameterMap, REMOTE_CONFIG_INFO};
use serde_json::{Map, Number, Value};

const VERSION_NUMBER: &str = "versionNumber";

/// Local and remote version counters side by side.
#[derive(Debug, Clone, PartialEq)]
pub struct VersionInfo {
    /// `remoteConfigInfo.versionNumber` in the local tree.
    pub local: Option<i64>,
    /// `remoteConfigInfo.versionNumber` in the published template.
    pub remote: Option<i64>,
    /// Backend-assigned template version.
    pub template_version: Option<i64>,
    pub etag: String,
}

/// Increment `versionNumber` inside a `remoteConfigInfo` default value.
///
/// A structured object is updated in place. A string is parsed as JSON,
/// updated and re-stringified. A missing `versionNumber` counts as `-1`, so
/// the first bump yields `0`.
pub fn bump_version_number(value: &mut Value) -> SyncResult<i64> {
    match value {
        Value::Object(map) => bump_in_object(map),
        Value::String(text) => {
            let mut parsed: Value = serde_json::from_str(text).map_err(|e| {
                SyncError::VersionBump(format!("{} is not JSON: {}", REMOTE_CONFIG_INFO, e))
            })?;
            let next = match parsed {
                Value::Object(ref mut map) => bump_in_object(map)?,
                _ => return Err(not_an_object(&parsed)),
            };
            *text = to_pretty_json(&parsed);
            Ok(next)
        }
        other => Err(not_an_object(other)),
    }
}

/// Bump the default value of the top-level `remoteConfigInfo` parameter.
pub fn bump_remote_config_info(parameters: &mut ParameterMap) -> SyncResult<i64> {
    let parameter = parameters.get_mut(REMOTE_CONFIG_INFO).ok_or_else(|| {
        SyncError::VersionBump(format!("no {} parameter", REMOTE_CONFIG_INFO))
    })?;
    bump_version_number(&mut parameter.default_value)
}

/// Read `versionNumber` from a `remoteConfigInfo` value without changing it.
pub fn read_version_number(value: &Value) -> Option<i64> {
    match value {
        Value::Object(map) => map.get(VERSION_NUMBER).and_then(as_integer),
        Value::String(text) => {
            let parsed: Value = serde_json::from_str(text).ok()?;
            parsed.get(VERSION_NUMBER).and_then(as_integer)
        }
        _ => None,
    }
}

/// `remoteConfigInfo.versionNumber` in the local tree; `None` when the parameter is absent.
pub fn local_version_number(layout: &ConfigLayout) -> SyncResult<Option<i64>> {
    let dir = layout.parameter_dir(REMOTE_CONFIG_INFO);
    if !dir.exists() {
        return Ok(None);
    }
    let parameter = read_parameter(&dir)?;
    Ok(read_version_number(&parameter.default_value))
}

/// Bump the local `remoteConfigInfo` and rewrite its directory.
pub fn increase_local_version(layout: &ConfigLayout) -> SyncResult<i64> {
    let dir = layout.parameter_dir(REMOTE_CONFIG_INFO);
    let mut parameter = read_parameter(&dir)?;
    let next = bump_version_number(&mut parameter.default_value)?;
    write_parameter(&dir, &parameter)?;
    tracing::info!(version = next, "Increased local remoteConfigInfo.versionNumber");
    Ok(next)
}

impl Assembler<'_> {
    /// Compare the local counter with the published template.
    pub async fn version_info(&self) -> SyncResult<VersionInfo> {
        let local = local_version_number(&self.layout)?;
        let template = self.store.fetch_template().await?;
        let remote = template
            .parameters
            .get(REMOTE_CONFIG_INFO)
            .map(Parameter::from_remote)
            .and_then(|parameter| read_version_number(&parameter.default_value));
        Ok(VersionInfo {
            local,
            remote,
            template_version: template.version_number(),
            etag: template.etag,
        })
    }
}

fn bump_in_object(map: &mut Map<String, Value>) -> SyncResult<i64> {
    let current = match map.get(VERSION_NUMBER) {
        None | Some(Value::Null) => -1,
        Some(value @ Value::Number(_)) => as_integer(value).ok_or_else(|| {
            SyncError::VersionBump(format!("{} {} is not an integer", VERSION_NUMBER, value))
        })?,
        Some(other) => {
            return Err(SyncError::VersionBump(format!(
                "{} is {}, expected a number",
                VERSION_NUMBER, other
            )));
        }
    };
    let next = current + 1;
    map.insert(VERSION_NUMBER.to_string(), Value::Number(Number::from(next)));
    Ok(next)
}

fn as_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
                .map(|f| f as i64)
        }),
        _ => None,
    }
}

fn not_an_object(value: &Value) -> SyncError {
    SyncError::VersionBump(format!(
        "{} default value is {}, expected an object",
        REMOTE_CONFIG_INFO, value
    ))
}
