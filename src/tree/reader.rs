//! Reconstruct typed parameters from a directory tree.
//!
//! Reading has no side effects. Every failure is reported against the path
//! that caused it; callers decide whether one bad parameter aborts the whole
//! read.

use super::{DEFAULT_VALUE_FILE, DESCRIPTION_FILE, VALUE_FILE_EXTENSION, VALUE_TYPE_FILE, is_hidden};
use crate::codec::ValueType;
use crate::error::{SyncError, SyncResult};
use crate::types::{Parameter, ParameterMap};
use std::fs;
use std::path::Path;
use tracing::debug;

/// List parameter directory names under `root`, sorted.
///
/// Hidden entries and plain files are skipped. A missing `root` is an error.
pub fn discover_parameter_names(root: &Path) -> SyncResult<Vec<String>> {
    list_subdirectories(root)
}

/// List parameter group directory names. A missing directory means no groups.
pub fn discover_groups(groups_dir: &Path) -> SyncResult<Vec<String>> {
    if !groups_dir.exists() {
        return Ok(Vec::new());
    }
    list_subdirectories(groups_dir)
}

/// Read the named parameters under `root`.
pub fn read_parameters(root: &Path, names: &[String]) -> SyncResult<ParameterMap> {
    let mut parameters = ParameterMap::new();
    for name in names {
        let parameter = read_parameter(&root.join(name))?;
        parameters.insert(name.clone(), parameter);
    }
    Ok(parameters)
}

/// Read every parameter directory found under `root`.
pub fn read_parameter_tree(root: &Path) -> SyncResult<ParameterMap> {
    let names = discover_parameter_names(root)?;
    read_parameters(root, &names)
}

/// Read one parameter directory.
///
/// `valueType.txt` is required and is read once; its type decodes the
/// default and every `<condition>.json` file.
pub fn read_parameter(dir: &Path) -> SyncResult<Parameter> {
    if !dir.is_dir() {
        return Err(SyncError::read(dir, "parameter directory does not exist"));
    }

    let value_type_path = dir.join(VALUE_TYPE_FILE);
    if !value_type_path.is_file() {
        return Err(SyncError::read(dir, format!("{} is missing", VALUE_TYPE_FILE)));
    }
    let value_type: ValueType = read_text(&value_type_path)?
        .parse()
        .map_err(|e: String| SyncError::read(&value_type_path, e))?;

    let mut parameter = Parameter::new(value_type);

    let entries = fs::read_dir(dir).map_err(|e| SyncError::read(dir, e))?;
    for entry in entries {
        let entry = entry.map_err(|e| SyncError::read(dir, e))?;
        let path = entry.path();
        let file_name = entry.file_name().to_string_lossy().to_string();
        if is_hidden(&file_name) || !path.is_file() {
            continue;
        }

        if file_name == VALUE_TYPE_FILE {
            continue;
        }
        if file_name == DESCRIPTION_FILE {
            let description = read_text(&path)?.trim().to_string();
            if !description.is_empty() {
                parameter.description = Some(description);
            }
            continue;
        }
        if path.extension().and_then(|e| e.to_str()) != Some(VALUE_FILE_EXTENSION) {
            debug!(path = %path.display(), "Ignoring non-value file");
            continue;
        }

        let text = read_text(&path)?;
        let value = value_type
            .decode(&text)
            .map_err(|e| SyncError::read(&path, e))?;

        if file_name == DEFAULT_VALUE_FILE {
            parameter.default_value = value;
        } else {
            let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or(&file_name);
            let condition = stem.trim().to_string();
            parameter.conditional_values.insert(condition, value);
        }
    }

    Ok(parameter)
}

/// Read `description.txt` from a group directory, if present.
pub fn read_group_description(group_dir: &Path) -> SyncResult<Option<String>> {
    let path = group_dir.join(DESCRIPTION_FILE);
    if !path.is_file() {
        return Ok(None);
    }
    let description = read_text(&path)?.trim().to_string();
    Ok((!description.is_empty()).then_some(description))
}

fn list_subdirectories(root: &Path) -> SyncResult<Vec<String>> {
    let entries = fs::read_dir(root).map_err(|e| SyncError::read(root, e))?;
    let mut names = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| SyncError::read(root, e))?;
        let name = entry.file_name().to_string_lossy().to_string();
        if is_hidden(&name) || !entry.path().is_dir() {
            continue;
        }
        names.push(name);
    }
    names.sort();
    Ok(names)
}

pub(crate) fn read_text(path: &Path) -> SyncResult<String> {
    fs::read_to_string(path).map_err(|e| SyncError::read(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn write(dir: &Path, file: &str, contents: &str) {
        fs::create_dir_all(dir).unwrap();
        fs::write(dir.join(file), contents).unwrap();
    }

    #[test]
    fn test_read_string_parameter_with_override() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("greeting");
        write(&dir, "valueType.txt", "STRING");
        write(&dir, "defaultValue.json", "\"hello\"");
        write(&dir, "development.json", "\"hi\"");

        let param = read_parameter(&dir).unwrap();
        assert_eq!(param.value_type, ValueType::String);
        assert_eq!(param.default_value, json!("hello"));
        assert_eq!(param.conditional_values["development"], json!("hi"));
    }

    #[test]
    fn test_missing_value_type_is_an_error() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("orphan");
        write(&dir, "defaultValue.json", "1");

        let err = read_parameter(&dir).unwrap_err();
        match err {
            SyncError::Read { path, reason } => {
                assert_eq!(path, dir);
                assert!(reason.contains("valueType.txt"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_malformed_json_names_the_file() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("settings");
        write(&dir, "valueType.txt", "JSON");
        write(&dir, "defaultValue.json", "{broken");

        let err = read_parameter(&dir).unwrap_err();
        match err {
            SyncError::Read { path, .. } => assert_eq!(path, dir.join("defaultValue.json")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_missing_default_uses_type_default() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("enabled");
        write(&dir, "valueType.txt", "boolean\n");

        let param = read_parameter(&dir).unwrap();
        assert_eq!(param.value_type, ValueType::Boolean);
        assert_eq!(param.default_value, json!(false));
    }

    #[test]
    fn test_hidden_and_foreign_files_are_ignored() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("limit");
        write(&dir, "valueType.txt", "NUMBER");
        write(&dir, "defaultValue.json", "3");
        write(&dir, ".DS_Store", "junk");
        write(&dir, "notes.md", "not a value");
        write(&dir, "description.txt", "Maximum retries\n");

        let param = read_parameter(&dir).unwrap();
        assert_eq!(param.default_value, json!(3));
        assert!(param.conditional_values.is_empty());
        assert_eq!(param.description.as_deref(), Some("Maximum retries"));
    }

    #[test]
    fn test_discover_skips_files_and_hidden_entries() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("b")).unwrap();
        fs::create_dir_all(temp.path().join("a")).unwrap();
        fs::create_dir_all(temp.path().join(".git")).unwrap();
        fs::write(temp.path().join(".DS_Store"), "").unwrap();
        fs::write(temp.path().join("README"), "").unwrap();

        let names = discover_parameter_names(temp.path()).unwrap();
        assert_eq!(names, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_missing_groups_dir_means_no_groups() {
        let temp = TempDir::new().unwrap();
        let groups = discover_groups(&temp.path().join("parameterGroups")).unwrap();
        assert!(groups.is_empty());
    }

    #[test]
    fn test_missing_parameters_dir_is_an_error() {
        let temp = TempDir::new().unwrap();
        assert!(discover_parameter_names(&temp.path().join("parameters")).is_err());
    }
}
