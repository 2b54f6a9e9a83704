//! Moves templates between the store and the `configs/` tree.
//!
//! - **pull**: fetch → expand embedded JSON → write conditions, parameters,
//!   groups, etag and version files
//! - **push**: read the same files → bump `remoteConfigInfo` → re-stringify
//!   values → validate → (publish → pull again)
//!
//! Steps within one invocation run strictly in that order. The tree is not
//! locked; running a pull and a push against the same directory at once is
//! the caller's problem.

mod pull;
mod push;
mod version;

use crate::error::SyncResult;
use crate::store::TemplateStore;
use crate::tree::ConfigLayout;
use crate::types::{Template, Version};

pub use version::{
    VersionInfo, bump_remote_config_info, bump_version_number, increase_local_version,
    local_version_number, read_version_number,
};

/// Drives pull and push against one store and one `configs/` directory.
pub struct Assembler<'a> {
    store: &'a dyn TemplateStore,
    layout: ConfigLayout,
}

/// Outcome of a pull.
#[derive(Debug, Clone, PartialEq)]
pub struct PullSummary {
    pub etag: String,
    pub version_number: Option<i64>,
    pub parameters: usize,
    pub groups: usize,
}

/// A template read from disk and ready for the store.
#[derive(Debug, Clone, PartialEq)]
pub struct Assembled {
    pub template: Template,
    /// New `remoteConfigInfo.versionNumber`, or `None` when the bump was skipped.
    pub remote_config_version: Option<i64>,
}

/// Outcome of a publish.
#[derive(Debug, Clone, PartialEq)]
pub struct PublishSummary {
    pub etag: String,
    pub template_version: Option<i64>,
    pub remote_config_version: Option<i64>,
}

impl<'a> Assembler<'a> {
    pub fn new(store: &'a dyn TemplateStore, layout: ConfigLayout) -> Self {
        Self { store, layout }
    }

    pub fn layout(&self) -> &ConfigLayout {
        &self.layout
    }

    /// Ask the store for its latest version to prove it is reachable.
    pub async fn check(&self) -> SyncResult<Option<Version>> {
        let versions = self.store.list_versions(1).await?;
        let latest = versions.into_iter().next();
        tracing::info!(
            version = latest.as_ref().and_then(Version::number),
            "Store is reachable"
        );
        Ok(latest)
    }
}
