//! Template store backed by a local JSON file.
//!
//! Useful for offline dry runs and as the backend in tests. It applies the
//! same structural checks the hosted backend does before accepting a
//! template, and assigns a new etag and version number on publish.

use super::TemplateStore;
use crate::codec::{ValueType, parse_number_text, to_pretty_json};
use crate::error::{SyncError, SyncPhase, SyncResult};
use crate::types::{RemoteParameter, Template, Version};
use async_trait::async_trait;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::info;

/// Template store reading and writing one JSON document.
#[derive(Debug, Clone)]
pub struct FileTemplateStore {
    path: PathBuf,
}

impl FileTemplateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self, phase: SyncPhase) -> SyncResult<Template> {
        let text = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            SyncError::store(phase, format!("cannot read {}: {}", self.path.display(), e))
        })?;
        serde_json::from_str(&text).map_err(|e| {
            SyncError::store(
                phase,
                format!("{} is not a template: {}", self.path.display(), e),
            )
        })
    }

    /// Check a candidate against the stored template.
    async fn check(&self, phase: SyncPhase, candidate: &Template) -> SyncResult<Template> {
        let current = self.load(phase).await?;
        if candidate.etag != current.etag && candidate.etag != "*" {
            return Err(SyncError::store_with_code(
                phase,
                "FAILED_PRECONDITION",
                format!(
                    "etag mismatch: template is at {}, request carried {}",
                    current.etag, candidate.etag
                ),
            ));
        }
        let problems = validation_problems(candidate);
        if !problems.is_empty() {
            return Err(SyncError::store_with_code(
                phase,
                "INVALID_ARGUMENT",
                problems.join("; "),
            ));
        }
        Ok(current)
    }
}

#[async_trait]
impl TemplateStore for FileTemplateStore {
    async fn fetch_template(&self) -> SyncResult<Template> {
        self.load(SyncPhase::Fetch).await
    }

    async fn validate_template(&self, template: &Template) -> SyncResult<Template> {
        self.check(SyncPhase::Validate, template).await?;
        Ok(template.clone())
    }

    async fn publish_template(&self, template: &Template) -> SyncResult<Template> {
        let phase = SyncPhase::Publish;
        let current = self.check(phase, template).await?;

        let next_number = current.version_number().unwrap_or(0) + 1;
        let mut published = template.clone();
        let mut version = published.version.take().unwrap_or_default();
        version.rollback_source = None;
        version.version_number = Some(next_number.to_string());
        version.update_time = Some(chrono::Utc::now().to_rfc3339());
        published.version = Some(version);
        published.etag = format!("etag-{}", next_number);

        tokio::fs::write(&self.path, to_pretty_json(&published))
            .await
            .map_err(|e| {
                SyncError::store(phase, format!("cannot write {}: {}", self.path.display(), e))
            })?;
        info!(path = %self.path.display(), etag = %published.etag, "Template stored");
        Ok(published)
    }

    async fn list_versions(&self, page_size: u32) -> SyncResult<Vec<Version>> {
        let current = self.load(SyncPhase::ListVersions).await?;
        Ok(current
            .version
            .into_iter()
            .take(page_size as usize)
            .collect())
    }
}

/// Structural checks applied before a template is accepted.
pub fn validation_problems(template: &Template) -> Vec<String> {
    let mut problems = Vec::new();

    let mut conditions = HashSet::new();
    for condition in &template.conditions {
        if !conditions.insert(condition.name.as_str()) {
            problems.push(format!("duplicate condition '{}'", condition.name));
        }
    }

    let mut seen = HashSet::new();
    for (name, parameter) in &template.parameters {
        seen.insert(name.as_str());
        check_parameter(name, parameter, &conditions, &mut problems);
    }
    for (group, contents) in &template.parameter_groups {
        for (name, parameter) in &contents.parameters {
            if !seen.insert(name.as_str()) {
                problems.push(format!(
                    "parameter '{}' in group '{}' is declared more than once",
                    name, group
                ));
            }
            check_parameter(name, parameter, &conditions, &mut problems);
        }
    }

    problems
}

fn check_parameter(
    name: &str,
    parameter: &RemoteParameter,
    conditions: &HashSet<&str>,
    problems: &mut Vec<String>,
) {
    let value_type = parameter.value_type.unwrap_or_default();
    if let Some(raw) = parameter.default_value.as_ref().and_then(|v| v.value.as_deref())
        && let Err(reason) = check_wire_value(value_type, raw)
    {
        problems.push(format!("parameter '{}' default value: {}", name, reason));
    }
    for (condition, value) in &parameter.conditional_values {
        if !conditions.contains(condition.as_str()) {
            problems.push(format!(
                "parameter '{}' references unknown condition '{}'",
                name, condition
            ));
        }
        if let Some(raw) = value.value.as_deref()
            && let Err(reason) = check_wire_value(value_type, raw)
        {
            problems.push(format!(
                "parameter '{}' value for '{}': {}",
                name, condition, reason
            ));
        }
    }
}

fn check_wire_value(value_type: ValueType, raw: &str) -> Result<(), String> {
    match value_type {
        ValueType::Json => serde_json::from_str::<serde_json::Value>(raw)
            .map(|_| ())
            .map_err(|e| format!("invalid JSON: {}", e)),
        ValueType::Number => parse_number_text(raw)
            .map(|_| ())
            .ok_or_else(|| format!("'{}' is not a number", raw)),
        ValueType::Boolean => match raw {
            "true" | "false" => Ok(()),
            other => Err(format!("'{}' is not a boolean", other)),
        },
        ValueType::String => Ok(()),
    }
}
