//! On-disk layout of a pulled template.
//!
//! ```text
//! configs/
//!   conditions.json
//!   eTag.json
//!   version.json
//!   parameters/<name>/
//!     valueType.txt
//!     defaultValue.json
//!     <condition>.json ...
//!     description.txt        (optional)
//!   parameterGroups/<group>/
//!     description.txt        (optional)
//!     <name>/ ...            (same shape as parameters/<name>/)
//! ```

pub mod reader;
pub mod writer;

use std::path::{Path, PathBuf};

pub use reader::{
    discover_groups, discover_parameter_names, read_group_description, read_parameter,
    read_parameter_tree, read_parameters,
};
pub use writer::{child_path, remove_dir_if_exists, write_parameter, write_parameters, write_text};

pub const CONDITIONS_FILE: &str = "conditions.json";
pub const ETAG_FILE: &str = "eTag.json";
pub const VERSION_FILE: &str = "version.json";
pub const PARAMETERS_DIR: &str = "parameters";
pub const PARAMETER_GROUPS_DIR: &str = "parameterGroups";

pub const VALUE_TYPE_FILE: &str = "valueType.txt";
pub const DEFAULT_VALUE_FILE: &str = "defaultValue.json";
pub const DESCRIPTION_FILE: &str = "description.txt";
pub const VALUE_FILE_EXTENSION: &str = "json";

/// Paths inside a `configs/` directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigLayout {
    root: PathBuf,
}

impl ConfigLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The `configs/` directory itself.
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn conditions_path(&self) -> PathBuf {
        self.root.join(CONDITIONS_FILE)
    }

    pub fn etag_path(&self) -> PathBuf {
        self.root.join(ETAG_FILE)
    }

    pub fn version_path(&self) -> PathBuf {
        self.root.join(VERSION_FILE)
    }

    pub fn parameters_dir(&self) -> PathBuf {
        self.root.join(PARAMETERS_DIR)
    }

    pub fn groups_dir(&self) -> PathBuf {
        self.root.join(PARAMETER_GROUPS_DIR)
    }

    pub fn group_dir(&self, group: &str) -> PathBuf {
        self.groups_dir().join(group)
    }

    pub fn parameter_dir(&self, name: &str) -> PathBuf {
        self.parameters_dir().join(name)
    }
}

/// Entries such as `.DS_Store` are never parameters.
pub(crate) fn is_hidden(name: &str) -> bool {
    name.starts_with('.')
}
