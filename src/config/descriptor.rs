// src/config/descriptor.rs

//! The subject's file descriptor (`logs/file_descriptor.json`).
//!
//! The descriptor maps acquisition keys (e.g. `"rfMRI_0"`, `"tfMRI_1"`,
//! `"rfMRI_SBRef_0"`, `"rfMRI_oldpath_0"`) to metadata. Key order is
//! significant: run discovery follows it, so the map keeps insertion order.

use std::path::Path;

use serde_json::{Map, Value};

use crate::errors::{PipelineError, Result};
use crate::fs::FileSystem;

/// Marker for bookkeeping entries that record where a file used to live.
pub const OLD_PATH_MARKER: &str = "oldpath";

/// Parsed file descriptor, in file order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FileDescriptor {
    entries: Map<String, Value>,
}

impl FileDescriptor {
    pub fn new(entries: Map<String, Value>) -> Self {
        Self { entries }
    }

    /// Parse a descriptor from JSON text. The top level must be an object.
    pub fn from_json(text: &str) -> Result<Self> {
        match serde_json::from_str::<Value>(text)? {
            Value::Object(entries) => Ok(Self { entries }),
            other => Err(PipelineError::DescriptorError(format!(
                "expected a JSON object at the top level, found {}",
                json_kind(&other)
            ))),
        }
    }

    /// Read and parse the descriptor at `path`.
    pub fn load(fs: &dyn FileSystem, path: &Path) -> Result<Self> {
        let text = fs.read_to_string(path).map_err(|e| {
            PipelineError::ConfigError(format!("{} could not be loaded: {e:#}", path.display()))
        })?;
        Self::from_json(&text)
    }

    /// Keys in descriptor order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(|k| k.as_str())
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `(key, value)` pairs for every old-path bookkeeping entry, with the
    /// value rendered as text: strings verbatim, anything else as compact JSON.
    pub fn old_path_entries(&self) -> Vec<(&str, String)> {
        self.entries
            .iter()
            .filter(|(k, _)| k.contains(OLD_PATH_MARKER))
            .map(|(k, v)| (k.as_str(), value_text(v)))
            .collect()
    }
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::mock::MockFileSystem;

    #[test]
    fn keeps_file_order() {
        let fd = FileDescriptor::from_json(r#"{"tfMRI_1": "a", "rfMRI_2": "b", "rfMRI_0": "c"}"#)
            .unwrap();
        let keys: Vec<&str> = fd.keys().collect();
        assert_eq!(keys, vec!["tfMRI_1", "rfMRI_2", "rfMRI_0"]);
    }

    #[test]
    fn rejects_non_object_top_level() {
        let err = FileDescriptor::from_json("[1, 2]").unwrap_err();
        match err {
            PipelineError::DescriptorError(msg) => assert!(msg.contains("an array")),
            other => panic!("expected DescriptorError, got {other:?}"),
        }
    }

    #[test]
    fn old_path_values_are_rendered_as_text() {
        let fd = FileDescriptor::from_json(
            r#"{"rfMRI_0": "x", "rfMRI_oldpath_0": "/raw/rest.nii.gz", "T1_oldpath": ["a", "b"]}"#,
        )
        .unwrap();
        assert_eq!(
            fd.old_path_entries(),
            vec![
                ("rfMRI_oldpath_0", "/raw/rest.nii.gz".to_string()),
                ("T1_oldpath", r#"["a","b"]"#.to_string()),
            ]
        );
    }

    #[test]
    fn load_reports_missing_file_as_config_error() {
        let fs = MockFileSystem::new();
        let err = FileDescriptor::load(&fs, Path::new("/s/logs/file_descriptor.json")).unwrap_err();
        assert!(matches!(err, PipelineError::ConfigError(_)));
    }
}
