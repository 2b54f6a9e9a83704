//! Unified configuration system.
//!
//! Consolidates configuration from tiers with field-by-field YAML merging:
//! 1. **Defaults** - `Config::default()`
//! 2. **Project** - `$CWD/remote-config/config.yaml`
//! 3. **User** - `~/.remote-config/config.yaml`
//! 4. **Environment** - variables below
//!
//! ## Environment Variables
//! - `REMOTE_CONFIG_CONFIG_PATH` - Explicit config file (replaces tiers 2-3)
//! - `REMOTE_CONFIG_PROJECT_DIR` - Project config dir (default: `./remote-config`)
//! - `REMOTE_CONFIG_USER_DIR` - User config dir (default: `~/.remote-config`)
//! - `REMOTE_CONFIG_ROOT` - Project root holding `configs/` and the key file
//! - `REMOTE_CONFIG_BACKEND` - `firebase` or `file`
//! - `REMOTE_CONFIG_TEMPLATE_FILE` - Template document for the file backend
//! - `REMOTE_CONFIG_ACCESS_TOKEN` - Bearer token for the firebase backend

mod loader;
mod merge;
mod types;

pub use loader::{ConfigLoader, ConfigPaths, ConfigTier};
pub use merge::{deep_merge, deep_merge_all};
pub use types::*;
