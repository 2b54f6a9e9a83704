//! File tree → store.

use super::version::bump_remote_config_info;
use super::{Assembled, Assembler, PublishSummary};
use crate::error::{SyncError, SyncResult};
use crate::tree::reader::read_text;
use crate::tree::{discover_groups, read_group_description, read_parameter_tree};
use crate::types::{
    Condition, ParameterMap, RemoteParameter, RemoteParameterGroup, Template, Version,
};
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{error, info, warn};

impl Assembler<'_> {
    /// Read the tree into a template, bumping `remoteConfigInfo.versionNumber`.
    ///
    /// A failed bump is logged and the template is assembled without it.
    pub fn assemble(&self) -> SyncResult<Assembled> {
        let layout = &self.layout;

        let conditions: Vec<Condition> = read_json(&layout.conditions_path())?;

        let mut parameters = read_parameter_tree(&layout.parameters_dir())?;

        let mut parameter_groups = BTreeMap::new();
        for group in discover_groups(&layout.groups_dir())? {
            let group_dir = layout.group_dir(&group);
            let group_parameters = read_parameter_tree(&group_dir)?;
            parameter_groups.insert(
                group,
                RemoteParameterGroup {
                    description: read_group_description(&group_dir)?,
                    parameters: untyped(&group_parameters),
                },
            );
        }

        let etag: String = read_json(&layout.etag_path())?;
        let mut version: Option<Version> = read_json(&layout.version_path())?;
        if let Some(ref mut version) = version {
            version.coerce_rollback_source_to_text();
        }

        let remote_config_version = match bump_remote_config_info(&mut parameters) {
            Ok(next) => {
                info!(version = next, "Bumped remoteConfigInfo.versionNumber");
                Some(next)
            }
            Err(e) => {
                warn!(error = %e, "Continuing without a version bump");
                None
            }
        };

        let template = Template {
            conditions,
            parameters: untyped(&parameters),
            parameter_groups,
            etag,
            version,
        };
        Ok(Assembled {
            template,
            remote_config_version,
        })
    }

    /// Assemble the tree and have the store validate it.
    pub async fn assemble_and_validate(&self) -> SyncResult<Assembled> {
        let assembled = self.assemble()?;
        let validated = self
            .store
            .validate_template(&assembled.template)
            .await
            .inspect_err(|e| error!(error = %e, "Template is invalid and cannot be published"))?;
        info!(etag = %validated.etag, "Template is valid");
        Ok(Assembled {
            template: validated,
            remote_config_version: assembled.remote_config_version,
        })
    }

    /// Validate, publish, then pull the published template back into the tree.
    pub async fn publish(&self) -> SyncResult<PublishSummary> {
        let validated = self.assemble_and_validate().await?;
        let published = self
            .store
            .publish_template(&validated.template)
            .await
            .inspect_err(|e| error!(error = %e, "Unable to publish template"))?;
        info!(etag = %published.etag, "Template has been published");

        self.pull().await.inspect_err(|e| {
            error!(error = %e, "Template was published but the local tree could not be refreshed")
        })?;

        Ok(PublishSummary {
            etag: published.etag.clone(),
            template_version: published.version_number(),
            remote_config_version: validated.remote_config_version,
        })
    }
}

fn untyped(parameters: &ParameterMap) -> BTreeMap<String, RemoteParameter> {
    parameters
        .iter()
        .map(|(name, parameter)| (name.clone(), parameter.to_remote()))
        .collect()
}

fn read_json<T: DeserializeOwned>(path: &Path) -> SyncResult<T> {
    let text = read_text(path)?;
    serde_json::from_str(&text).map_err(|e| SyncError::read(path, e))
}
