//! Materialize typed parameters as a directory tree.
//!
//! The writer owns everything under the directory it is given: it removes
//! the directory first and recreates only the files the parameters imply,
//! so an override deleted upstream never lingers on disk.

use super::{DEFAULT_VALUE_FILE, DESCRIPTION_FILE, VALUE_FILE_EXTENSION, VALUE_TYPE_FILE};
use crate::error::{SyncError, SyncResult};
use crate::types::{Parameter, ParameterMap};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Replace `root` with exactly one directory per parameter.
///
/// Every name is checked before anything on disk is touched.
pub fn write_parameters(root: &Path, parameters: &ParameterMap) -> SyncResult<()> {
    let mut dirs = Vec::with_capacity(parameters.len());
    for (name, parameter) in parameters {
        if name.trim().is_empty() {
            warn!(root = %root.display(), "Skipping parameter with an empty name");
            continue;
        }
        dirs.push((child_path(root, name)?, parameter));
    }

    remove_dir_if_exists(root)?;
    fs::create_dir_all(root).map_err(|e| SyncError::write(root, e))?;

    for (dir, parameter) in dirs {
        write_parameter(&dir, parameter)?;
    }

    debug!(root = %root.display(), count = parameters.len(), "Wrote parameter tree");
    Ok(())
}

/// Replace one parameter directory.
pub fn write_parameter(dir: &Path, parameter: &Parameter) -> SyncResult<()> {
    let value_type = parameter.value_type;

    let mut files = Vec::with_capacity(parameter.conditional_values.len());
    for (condition, value) in &parameter.conditional_values {
        let file_name = format!("{}.{}", condition.trim(), VALUE_FILE_EXTENSION);
        if file_name == DEFAULT_VALUE_FILE {
            return Err(SyncError::write(
                dir.join(&file_name),
                "condition name collides with the default value file",
            ));
        }
        files.push((child_path(dir, &file_name)?, value));
    }

    remove_dir_if_exists(dir)?;
    fs::create_dir_all(dir).map_err(|e| SyncError::write(dir, e))?;

    write_text(&dir.join(VALUE_TYPE_FILE), value_type.as_str())?;
    write_text(
        &dir.join(DEFAULT_VALUE_FILE),
        &value_type.encode(&parameter.default_value),
    )?;

    for (path, value) in files {
        write_text(&path, &value_type.encode(value))?;
    }

    if let Some(description) = parameter.description.as_deref().filter(|d| !d.is_empty()) {
        write_text(&dir.join(DESCRIPTION_FILE), description)?;
    }

    Ok(())
}

/// Join a backend-supplied name onto `parent` as exactly one path segment.
///
/// Names holding a path separator, or starting with `.` (which the reader
/// skips), cannot round-trip through the tree and are rejected.
pub fn child_path(parent: &Path, name: &str) -> SyncResult<PathBuf> {
    let segment = name.trim();
    if segment.is_empty() || segment.starts_with('.') || segment.contains(['/', '\\']) {
        return Err(SyncError::write(
            parent,
            format!("'{}' cannot be used as a file name", name),
        ));
    }
    Ok(parent.join(segment))
}

/// Recursively delete `path`. Absence is not an error.
pub fn remove_dir_if_exists(path: &Path) -> SyncResult<()> {
    match fs::remove_dir_all(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(SyncError::write(path, e)),
    }
}

/// Write a UTF-8 file, creating parent directories as needed.
pub fn write_text(path: &Path, contents: &str) -> SyncResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| SyncError::write(parent, e))?;
    }
    fs::write(path, contents).map_err(|e| SyncError::write(path, e))
}
