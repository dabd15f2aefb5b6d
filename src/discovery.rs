// src/discovery.rs

//! Discovery of acquisition runs from a subject's file descriptor.
//!
//! A run of a family is any descriptor key that contains the family marker
//! (`rfMRI`, `tfMRI`), is not a reference scan (`SBRef`) and is not an
//! old-path bookkeeping entry. The run index is the key's last `_`-separated
//! token, kept as an opaque string.

use std::fmt;

use crate::config::descriptor::{FileDescriptor, OLD_PATH_MARKER};

/// Marker for single-band reference scans, which never form a run.
pub const REFERENCE_SCAN_MARKER: &str = "SBRef";

/// Modality family whose runs each get their own branch of jobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModalityFamily {
    RestingState,
    Task,
}

impl ModalityFamily {
    /// Substring identifying this family's descriptor keys.
    pub fn marker(self) -> &'static str {
        match self {
            ModalityFamily::RestingState => "rfMRI",
            ModalityFamily::Task => "tfMRI",
        }
    }
}

impl fmt::Display for ModalityFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ModalityFamily::RestingState => "resting-state",
            ModalityFamily::Task => "task",
        };
        f.write_str(s)
    }
}

/// One discovered acquisition run.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ModalityRun {
    pub family: ModalityFamily,
    /// Index token taken from the descriptor key, e.g. `"0"` or `"2"`.
    pub index: String,
}

impl ModalityRun {
    pub fn new(family: ModalityFamily, index: impl Into<String>) -> Self {
        Self {
            family,
            index: index.into(),
        }
    }
}

/// Distinct runs of `family`, in descriptor order.
///
/// Never fails: an empty list means the family has no runs and the caller
/// decides what to do about it.
pub fn discover_runs(descriptor: &FileDescriptor, family: ModalityFamily) -> Vec<ModalityRun> {
    let mut runs: Vec<ModalityRun> = Vec::new();

    for key in descriptor.keys().filter(|k| is_run_key(k, family)) {
        let index = run_index(key);
        if runs.iter().any(|r| r.index == index) {
            continue;
        }
        runs.push(ModalityRun::new(family, index));
    }

    runs
}

fn is_run_key(key: &str, family: ModalityFamily) -> bool {
    key.contains(family.marker())
        && !key.contains(REFERENCE_SCAN_MARKER)
        && !key.contains(OLD_PATH_MARKER)
}

fn run_index(key: &str) -> &str {
    key.rsplit('_').next().unwrap_or(key)
}
