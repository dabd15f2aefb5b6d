// src/subject.rs

//! Subject directory conventions.
//!
//! ```text
//! <cwd>/<subject>/
//!   logs/
//!     file_descriptor.json
//!     <job name>.log          one per submitted job
//!   fMRI/
//!     rfMRI_<i>.fsf, tfMRI_<j>.fsf
//!     filenames.txt           side-car, after relocation
//!   filenames.txt             side-car, while jobs are being submitted
//! ```

use std::path::{Path, PathBuf};

use crate::errors::{PipelineError, Result};
use crate::fs::FileSystem;

pub const LOG_DIR_NAME: &str = "logs";
pub const DESCRIPTOR_FILE_NAME: &str = "file_descriptor.json";
pub const FMRI_DIR_NAME: &str = "fMRI";
pub const SIDECAR_FILE_NAME: &str = "filenames.txt";

/// Resolved paths for one subject.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubjectLayout {
    /// Subject as given on the command line (trailing `/` removed). Job
    /// commands receive it verbatim, relative to the working directory.
    name: String,
    /// `<cwd>/<subject>`
    root: PathBuf,
}

impl SubjectLayout {
    /// Build a layout without checking the filesystem.
    pub fn new(cwd: &Path, subject: &str) -> Self {
        let trimmed = subject.trim_end_matches('/');
        let name = if trimmed.is_empty() { subject } else { trimmed };
        Self {
            name: name.to_string(),
            root: cwd.join(name),
        }
    }

    /// Build a layout and check that the subject directory and its file
    /// descriptor exist. Either failure is a configuration error: nothing
    /// may be submitted for this subject.
    pub fn locate(fs: &dyn FileSystem, cwd: &Path, subject: &str) -> Result<Self> {
        let layout = Self::new(cwd, subject);

        if !fs.is_dir(&layout.root) {
            return Err(PipelineError::SubjectNotFound(subject.to_string()));
        }

        let descriptor = layout.descriptor_path();
        if !fs.is_file(&descriptor) {
            return Err(PipelineError::ConfigError(format!(
                "{} could not be loaded",
                descriptor.display()
            )));
        }

        Ok(layout)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Subject name usable inside a job name (`/` replaced by `_`).
    pub fn job_suffix(&self) -> String {
        self.name.replace('/', "_")
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn log_dir(&self) -> PathBuf {
        self.root.join(LOG_DIR_NAME)
    }

    pub fn descriptor_path(&self) -> PathBuf {
        self.log_dir().join(DESCRIPTOR_FILE_NAME)
    }

    pub fn fmri_dir(&self) -> PathBuf {
        self.root.join(FMRI_DIR_NAME)
    }

    /// Per-job log file.
    pub fn job_log_path(&self, job_name: &str) -> PathBuf {
        self.log_dir().join(format!("{job_name}.log"))
    }

    /// Session log written by the orchestration process itself.
    pub fn session_log_path(&self, pid: u32) -> PathBuf {
        self.log_dir()
            .join(format!("funcdag__{}__{pid}.log", self.job_suffix()))
    }

    /// Where the side-car file is written while jobs are being submitted.
    pub fn sidecar_staging_path(&self) -> PathBuf {
        self.root.join(SIDECAR_FILE_NAME)
    }

    /// Final location of the side-car file.
    pub fn sidecar_path(&self) -> PathBuf {
        self.fmri_dir().join(SIDECAR_FILE_NAME)
    }
}
