//! Structured error types for sync operations.

use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Error codes for programmatic error handling.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Local tree errors
    ReadError,
    WriteError,

    // Backend errors
    StoreError,

    // Non-fatal
    VersionBumpError,

    // Boundary errors
    CredentialsError,
    ConfigError,
}

/// Which store interaction failed.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum SyncPhase {
    Fetch,
    Validate,
    Publish,
    ListVersions,
}

impl fmt::Display for SyncPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncPhase::Fetch => write!(f, "fetch"),
            SyncPhase::Validate => write!(f, "validate"),
            SyncPhase::Publish => write!(f, "publish"),
            SyncPhase::ListVersions => write!(f, "list-versions"),
        }
    }
}

/// Errors raised while moving a template between the store and the file tree.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Missing or unparseable file or directory under the configs tree.
    #[error("read failed for {}: {reason}", path.display())]
    Read { path: PathBuf, reason: String },

    /// Filesystem write or delete failure.
    #[error("write failed for {}: {reason}", path.display())]
    Write { path: PathBuf, reason: String },

    /// The template store rejected or failed a request.
    #[error("{phase} failed: {message}")]
    Store {
        phase: SyncPhase,
        code: Option<String>,
        message: String,
    },

    /// Malformed `remoteConfigInfo.versionNumber`. Logged, never fatal during assembly.
    #[error("version bump failed: {0}")]
    VersionBump(String),

    #[error("credentials: {0}")]
    Credentials(String),

    #[error("configuration: {0}")]
    Config(String),
}

impl SyncError {
    // Convenience constructors

    pub fn read(path: impl AsRef<Path>, reason: impl fmt::Display) -> Self {
        Self::Read {
            path: path.as_ref().to_path_buf(),
            reason: reason.to_string(),
        }
    }

    pub fn write(path: impl AsRef<Path>, reason: impl fmt::Display) -> Self {
        Self::Write {
            path: path.as_ref().to_path_buf(),
            reason: reason.to_string(),
        }
    }

    pub fn store(phase: SyncPhase, message: impl Into<String>) -> Self {
        Self::Store {
            phase,
            code: None,
            message: message.into(),
        }
    }

    pub fn store_with_code(
        phase: SyncPhase,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::Store {
            phase,
            code: Some(code.into()),
            message: message.into(),
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            SyncError::Read { .. } => ErrorCode::ReadError,
            SyncError::Write { .. } => ErrorCode::WriteError,
            SyncError::Store { .. } => ErrorCode::StoreError,
            SyncError::VersionBump(_) => ErrorCode::VersionBumpError,
            SyncError::Credentials(_) => ErrorCode::CredentialsError,
            SyncError::Config(_) => ErrorCode::ConfigError,
        }
    }

    /// The store phase for store errors, `None` for everything else.
    pub fn phase(&self) -> Option<SyncPhase> {
        match self {
            SyncError::Store { phase, .. } => Some(*phase),
            _ => None,
        }
    }

    /// Short label for the step that failed, used in CLI diagnostics.
    pub fn phase_label(&self) -> &'static str {
        match self {
            SyncError::Read { .. } => "read",
            SyncError::Write { .. } => "write",
            SyncError::Store { phase, .. } => match phase {
                SyncPhase::Fetch => "fetch",
                SyncPhase::Validate => "validate",
                SyncPhase::Publish => "publish",
                SyncPhase::ListVersions => "list-versions",
            },
            SyncError::VersionBump(_) => "version-bump",
            SyncError::Credentials(_) => "credentials",
            SyncError::Config(_) => "config",
        }
    }
}

/// Result type for sync operations.
pub type SyncResult<T> = std::result::Result<T, SyncError>;
