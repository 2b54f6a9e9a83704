//! Configuration loader with tier-based merging.
//!
//! Loads configuration from multiple tiers and merges them field-by-field.

use super::merge::deep_merge_all;
use super::types::{BackendKind, Config};
use anyhow::{Result, anyhow};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Configuration tier priority (lowest to highest).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ConfigTier {
    /// Embedded defaults (lowest priority)
    Defaults = 0,
    /// Project-level config ($CWD/remote-config/)
    Project = 1,
    /// User-level config (~/.remote-config/)
    User = 2,
    /// Environment variables (highest priority)
    Environment = 3,
}

impl std::fmt::Display for ConfigTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigTier::Defaults => write!(f, "defaults"),
            ConfigTier::Project => write!(f, "project"),
            ConfigTier::User => write!(f, "user"),
            ConfigTier::Environment => write!(f, "environment"),
        }
    }
}

/// Directories searched for `config.yaml`.
#[derive(Debug, Clone)]
pub struct ConfigPaths {
    /// Project-level config directory
    pub project_dir: Option<PathBuf>,
    /// User-level config directory
    pub user_dir: Option<PathBuf>,
}

impl Default for ConfigPaths {
    fn default() -> Self {
        Self::discover()
    }
}

impl ConfigPaths {
    /// Discover configuration paths from environment and defaults.
    pub fn discover() -> Self {
        // User dir: REMOTE_CONFIG_USER_DIR or ~/.remote-config
        let user_dir = std::env::var("REMOTE_CONFIG_USER_DIR")
            .ok()
            .map(PathBuf::from)
            .or_else(|| dirs::home_dir().map(|h| h.join(".remote-config")));

        // Project dir: REMOTE_CONFIG_PROJECT_DIR or $CWD/remote-config
        let project_dir = std::env::var("REMOTE_CONFIG_PROJECT_DIR")
            .ok()
            .map(PathBuf::from)
            .or_else(|| Some(PathBuf::from("remote-config")));

        Self {
            project_dir,
            user_dir,
        }
    }

    /// Create paths with explicit directories.
    pub fn with_dirs(project_dir: Option<PathBuf>, user_dir: Option<PathBuf>) -> Self {
        Self {
            project_dir,
            user_dir,
        }
    }
}

/// Configuration loader that handles tier-based merging.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    /// Paths for each tier
    pub paths: ConfigPaths,
    /// Loaded configuration
    config: Config,
    /// Highest-priority config file that contributed, if any
    config_path: Option<PathBuf>,
}

impl ConfigLoader {
    /// Load configuration from all tiers with proper merging.
    ///
    /// `REMOTE_CONFIG_CONFIG_PATH` names a single file that replaces the
    /// project and user tiers.
    pub fn load() -> Result<Self> {
        match std::env::var("REMOTE_CONFIG_CONFIG_PATH") {
            Ok(explicit) => Self::load_explicit(Path::new(&explicit)),
            Err(_) => Self::load_with_paths(ConfigPaths::discover()),
        }
    }

    /// Load one explicit config file on top of the defaults.
    pub fn load_explicit(path: &Path) -> Result<Self> {
        let mut config = Config::load(path)
            .map_err(|e| anyhow!("cannot load config {}: {}", path.display(), e))?;
        Self::apply_env_overrides(&mut config)?;
        Ok(Self {
            paths: ConfigPaths::with_dirs(None, None),
            config,
            config_path: Some(path.to_path_buf()),
        })
    }

    /// Load configuration with explicit paths.
    pub fn load_with_paths(paths: ConfigPaths) -> Result<Self> {
        let mut configs: Vec<Value> = Vec::new();
        let mut config_path = None;

        // Tier 1: Defaults (embedded)
        configs.push(serde_json::to_value(Config::default())?);

        // Tier 2: Project config
        if let Some(ref project_dir) = paths.project_dir
            && let Some(value) = read_tier(&project_dir.join("config.yaml"), ConfigTier::Project)
        {
            configs.push(value);
            config_path = Some(project_dir.join("config.yaml"));
        }

        // Tier 3: User config
        if let Some(ref user_dir) = paths.user_dir
            && let Some(value) = read_tier(&user_dir.join("config.yaml"), ConfigTier::User)
        {
            configs.push(value);
            config_path = Some(user_dir.join("config.yaml"));
        }

        let merged = deep_merge_all(configs);
        let mut config: Config = serde_json::from_value(merged)?;

        // Tier 4: Environment variable overrides
        Self::apply_env_overrides(&mut config)?;

        Ok(Self {
            paths,
            config,
            config_path,
        })
    }

    /// Apply environment variable overrides to config.
    fn apply_env_overrides(config: &mut Config) -> Result<()> {
        if let Ok(root) = std::env::var("REMOTE_CONFIG_ROOT") {
            config.project.root = PathBuf::from(root);
        }

        if let Ok(kind) = std::env::var("REMOTE_CONFIG_BACKEND") {
            config.backend.kind = kind.parse::<BackendKind>().map_err(|e| anyhow!(e))?;
        }

        if let Ok(file) = std::env::var("REMOTE_CONFIG_TEMPLATE_FILE") {
            config.backend.template_file = PathBuf::from(file);
        }

        if let Ok(token) = std::env::var("REMOTE_CONFIG_ACCESS_TOKEN")
            && !token.trim().is_empty()
        {
            config.backend.access_token = Some(token.trim().to_string());
        }

        Ok(())
    }

    /// Get the loaded configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get mutable access to the configuration.
    pub fn config_mut(&mut self) -> &mut Config {
        &mut self.config
    }

    /// Consume the loader and return the configuration.
    pub fn into_config(self) -> Config {
        self.config
    }

    /// Get the config file path that was used.
    pub fn config_path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }
}

/// Read one tier's YAML file. Unreadable or invalid files are skipped with a warning.
fn read_tier(path: &Path, tier: ConfigTier) -> Option<Value> {
    if !path.exists() {
        return None;
    }
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            warn!(path = %path.display(), tier = %tier, error = %e, "Cannot read config file");
            return None;
        }
    };
    match serde_yaml::from_str::<Value>(&content) {
        Ok(value) => {
            debug!(path = %path.display(), tier = %tier, "Loaded config tier");
            Some(value)
        }
        Err(e) => {
            warn!(path = %path.display(), tier = %tier, error = %e, "Ignoring invalid config file");
            None
        }
    }
}
