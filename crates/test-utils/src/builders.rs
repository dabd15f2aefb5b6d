#![allow(dead_code)]

use funcdag::config::FileDescriptor;
use serde_json::{Map, Value};

/// Builder for a subject's file descriptor.
///
/// Keys are kept in insertion order, which is also discovery order.
pub struct DescriptorBuilder {
    entries: Map<String, Value>,
}

impl DescriptorBuilder {
    pub fn new() -> Self {
        Self { entries: Map::new() }
    }

    pub fn entry(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.entries.insert(key.to_string(), value.into());
        self
    }

    /// Resting-state run `index`.
    pub fn rest(self, index: &str) -> Self {
        let key = format!("rfMRI_{index}");
        let value = format!("fMRI/{key}.nii.gz");
        self.entry(&key, value)
    }

    /// Task run `index`.
    pub fn task(self, index: &str) -> Self {
        let key = format!("tfMRI_{index}");
        let value = format!("fMRI/{key}.nii.gz");
        self.entry(&key, value)
    }

    /// Single-band reference scan of resting-state run `index`.
    pub fn rest_sbref(self, index: &str) -> Self {
        let key = format!("rfMRI_SBRef_{index}");
        let value = format!("fMRI/{key}.nii.gz");
        self.entry(&key, value)
    }

    /// Single-band reference scan of task run `index`.
    pub fn task_sbref(self, index: &str) -> Self {
        let key = format!("tfMRI_SBRef_{index}");
        let value = format!("fMRI/{key}.nii.gz");
        self.entry(&key, value)
    }

    /// Old-path bookkeeping entry, e.g. `old_path("rfMRI", "0", "/raw/r0.nii.gz")`.
    pub fn old_path(self, marker: &str, index: &str, path: &str) -> Self {
        self.entry(&format!("{marker}_oldpath_{index}"), path)
    }

    pub fn structural(self) -> Self {
        self.entry("T1", "T1/T1.nii.gz")
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(&self.entries).expect("descriptor map serializes")
    }

    pub fn build(self) -> FileDescriptor {
        FileDescriptor::new(self.entries)
    }
}

impl Default for DescriptorBuilder {
    fn default() -> Self {
        Self::new()
    }
}
