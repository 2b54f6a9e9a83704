//! Template store backends.
//!
//! The store is the only component that talks to the remote-config backend.
//! A handle is built once by the caller and passed into every assembler
//! operation; dropping it releases its connection pool.

pub mod file;
pub mod http;

use crate::config::{BackendConfig, BackendKind};
use crate::credentials::ServiceAccount;
use crate::error::{SyncError, SyncResult};
use crate::types::{Template, Version};
use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;

pub use file::FileTemplateStore;
pub use http::HttpTemplateStore;

/// Backend holding the authoritative template.
#[async_trait]
pub trait TemplateStore: Send + Sync {
    /// Fetch the current template, etag included.
    async fn fetch_template(&self) -> SyncResult<Template>;

    /// Check a candidate template without publishing it.
    ///
    /// Failures are reported with [`crate::error::SyncPhase::Validate`].
    async fn validate_template(&self, template: &Template) -> SyncResult<Template>;

    /// Publish a validated template. Returns the template with its new etag and version.
    async fn publish_template(&self, template: &Template) -> SyncResult<Template>;

    /// Most recent versions first. Used as a connectivity probe.
    async fn list_versions(&self, page_size: u32) -> SyncResult<Vec<Version>>;
}

/// Build the store selected by the backend configuration.
///
/// The firebase backend needs `serviceAccountKey.json` under `project_root`
/// and an access token; the file backend needs neither.
pub fn open_store(
    backend: &BackendConfig,
    project_root: &Path,
    service_account_file: &Path,
) -> SyncResult<Box<dyn TemplateStore>> {
    match backend.kind {
        BackendKind::Firebase => {
            let account = ServiceAccount::discover(&project_root.join(service_account_file))?;
            let token = backend.access_token.clone().ok_or_else(|| {
                SyncError::Credentials(
                    "no access token; set REMOTE_CONFIG_ACCESS_TOKEN or backend.access_token"
                        .to_string(),
                )
            })?;
            let store = HttpTemplateStore::new(
                backend.base_url.clone(),
                account.project_id,
                token,
                Duration::from_millis(backend.connect_timeout_ms),
                Duration::from_millis(backend.request_timeout_ms),
            )?;
            Ok(Box::new(store))
        }
        BackendKind::File => {
            let path = project_root.join(&backend.template_file);
            Ok(Box::new(FileTemplateStore::new(path)))
        }
    }
}
