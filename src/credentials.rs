//! Service-account credential discovery.
//!
//! The hosted backend is addressed by the `project_id` of the service
//! account file kept in the project root.

use crate::error::{SyncError, SyncResult};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::path::Path;

/// Placeholder written by project templates before a real key is dropped in.
const PLACEHOLDER_PROJECT_ID: &str = "{project_id}";

/// The subset of a service-account key this tool reads.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceAccount {
    #[serde(default)]
    pub project_id: String,
    #[serde(default)]
    pub client_email: Option<String>,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

impl ServiceAccount {
    /// Load and check the key file at `path`.
    pub fn discover(path: &Path) -> SyncResult<Self> {
        if !path.is_file() {
            return Err(SyncError::Credentials(format!(
                "{} not found in the project root",
                path.display()
            )));
        }
        let text = std::fs::read_to_string(path)
            .map_err(|e| SyncError::Credentials(format!("cannot read {}: {}", path.display(), e)))?;
        Self::from_json(&text)
            .map_err(|reason| SyncError::Credentials(format!("{}: {}", path.display(), reason)))
    }

    /// Parse a key file body and require a usable `project_id`.
    pub fn from_json(text: &str) -> Result<Self, String> {
        let account: ServiceAccount =
            serde_json::from_str(text).map_err(|e| format!("invalid JSON: {}", e))?;
        let project_id = account.project_id.trim();
        if project_id.is_empty() || project_id == PLACEHOLDER_PROJECT_ID {
            return Err("no valid project_id".to_string());
        }
        Ok(account)
    }
}
