//! Store → file tree.

use super::{Assembler, PullSummary};
use crate::codec::to_pretty_json;
use crate::error::{SyncError, SyncResult};
use crate::normalize::normalize_embedded_json;
use crate::tree::{
    DESCRIPTION_FILE, child_path, remove_dir_if_exists, write_parameters, write_text,
};
use crate::types::{Parameter, ParameterMap, RemoteParameter, Template};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info};

impl Assembler<'_> {
    /// Fetch the current template and write it to the tree.
    ///
    /// A failed step aborts the pull without undoing earlier steps; the
    /// writers are idempotent so a retry converges.
    pub async fn pull(&self) -> SyncResult<PullSummary> {
        let template = self.store.fetch_template().await?;
        info!(etag = %template.etag, "Fetched template");
        self.write_template(&template)
    }

    /// Write a template to the tree.
    pub fn write_template(&self, template: &Template) -> SyncResult<PullSummary> {
        let layout = &self.layout;
        std::fs::create_dir_all(layout.root()).map_err(|e| SyncError::write(layout.root(), e))?;

        write_text(&layout.conditions_path(), &to_pretty_json(&template.conditions))?;

        write_parameters(&layout.parameters_dir(), &typed(&template.parameters))?;

        let groups_dir = layout.groups_dir();
        let group_dirs = template
            .parameter_groups
            .iter()
            .map(|(group, contents)| Ok((group, child_path(&groups_dir, group)?, contents)))
            .collect::<SyncResult<Vec<_>>>()?;

        // stale groups go too, not just stale parameters inside surviving groups
        remove_dir_if_exists(&groups_dir)?;
        for (group, group_dir, contents) in group_dirs {
            write_parameters(&group_dir, &typed(&contents.parameters))?;
            if let Some(description) = contents.description.as_deref().filter(|d| !d.is_empty()) {
                write_text(&group_dir.join(DESCRIPTION_FILE), description)?;
            }
            debug!(group = %group, count = contents.parameters.len(), "Wrote parameter group");
        }

        write_text(&layout.etag_path(), &to_pretty_json(&template.etag))?;
        write_text(
            &layout.version_path(),
            &to_pretty_json(&template.version.clone().unwrap_or_default()),
        )?;

        let summary = PullSummary {
            etag: template.etag.clone(),
            version_number: template.version_number(),
            parameters: template.parameters.len(),
            groups: template.parameter_groups.len(),
        };
        info!(
            etag = %summary.etag,
            parameters = summary.parameters,
            groups = summary.groups,
            "Wrote template to {}",
            layout.root().display()
        );
        Ok(summary)
    }

    /// Fetch the template and write it, embedded JSON expanded, as one document.
    pub async fn pull_meta(&self, path: &Path) -> SyncResult<String> {
        let template = self.store.fetch_template().await?;
        let document = serde_json::to_value(&template).map_err(|e| SyncError::write(path, e))?;
        write_text(path, &to_pretty_json(&normalize_embedded_json(document)))?;
        info!(etag = %template.etag, path = %path.display(), "Wrote template document");
        Ok(template.etag)
    }

    /// Fetch the template as pretty-printed JSON.
    pub async fn render_remote(&self) -> SyncResult<String> {
        let template = self.store.fetch_template().await?;
        Ok(to_pretty_json(&template))
    }
}

fn typed(parameters: &BTreeMap<String, RemoteParameter>) -> ParameterMap {
    parameters
        .iter()
        .map(|(name, remote)| (name.clone(), Parameter::from_remote(remote)))
        .collect()
}
