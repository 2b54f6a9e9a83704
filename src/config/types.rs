//! Configuration types and structures.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Default REST endpoint of the hosted backend.
pub const DEFAULT_BASE_URL: &str = "https://firebaseremoteconfig.googleapis.com";

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub project: ProjectConfig,

    #[serde(default)]
    pub backend: BackendConfig,
}

/// Where the project keeps its files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Project root; every other project path is relative to it.
    #[serde(default = "default_root")]
    pub root: PathBuf,

    /// Directory holding the pulled template tree (default: `configs`).
    #[serde(default = "default_configs_dir")]
    pub configs_dir: PathBuf,

    /// Service-account key file (default: `serviceAccountKey.json`).
    #[serde(default = "default_service_account")]
    pub service_account: PathBuf,

    /// Output of `pull-meta` (default: `config.json`).
    #[serde(default = "default_meta_file")]
    pub meta_file: PathBuf,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            configs_dir: default_configs_dir(),
            service_account: default_service_account(),
            meta_file: default_meta_file(),
        }
    }
}

impl ProjectConfig {
    pub fn configs_path(&self) -> PathBuf {
        self.resolve(&self.configs_dir)
    }

    pub fn meta_path(&self) -> PathBuf {
        self.resolve(&self.meta_file)
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }
}

fn default_root() -> PathBuf {
    PathBuf::from(".")
}

fn default_configs_dir() -> PathBuf {
    PathBuf::from("configs")
}

fn default_service_account() -> PathBuf {
    PathBuf::from("serviceAccountKey.json")
}

fn default_meta_file() -> PathBuf {
    PathBuf::from("config.json")
}

/// Which template store to talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// Hosted REST backend (default)
    #[default]
    Firebase,
    /// Local JSON file
    File,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::Firebase => write!(f, "firebase"),
            BackendKind::File => write!(f, "file"),
        }
    }
}

impl FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "firebase" => Ok(BackendKind::Firebase),
            "file" => Ok(BackendKind::File),
            other => Err(format!("unknown backend '{}'", other)),
        }
    }
}

/// Template store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    #[serde(default)]
    pub kind: BackendKind,

    /// REST endpoint root for the firebase backend.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Template document for the file backend, relative to the project root.
    #[serde(default = "default_template_file")]
    pub template_file: PathBuf,

    /// OAuth bearer token for the firebase backend. Usually supplied through
    /// `REMOTE_CONFIG_ACCESS_TOKEN` rather than a file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,

    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,

    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            kind: BackendKind::default(),
            base_url: default_base_url(),
            template_file: default_template_file(),
            access_token: None,
            connect_timeout_ms: default_connect_timeout_ms(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_template_file() -> PathBuf {
    PathBuf::from("remote-template.json")
}

fn default_connect_timeout_ms() -> u64 {
    10_000 // 10 seconds
}

fn default_request_timeout_ms() -> u64 {
    30_000 // 30 seconds
}

impl Config {
    /// Load configuration from one YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }
}
