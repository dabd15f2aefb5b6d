// src/job/spec.rs

use std::fmt;
use std::path::PathBuf;

/// Resource pool on the batch queue that executes a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueueClass {
    Standard,
    HighMemory,
    MaxMemory,
}

impl fmt::Display for QueueClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            QueueClass::Standard => "standard",
            QueueClass::HighMemory => "high-memory",
            QueueClass::MaxMemory => "max-memory",
        };
        f.write_str(s)
    }
}

/// Everything needed to submit one job, minus its dependencies (which are
/// only known once upstream jobs have been submitted).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobSpec {
    /// Unique within one orchestration pass.
    pub name: String,
    /// Unexpanded command line; may contain `$VAR` references and quoting.
    pub command: String,
    pub queue_class: QueueClass,
    /// Only set for [`QueueClass::HighMemory`].
    pub memory_request_mb: Option<u32>,
    /// `<log_dir>/<name>.log`
    pub log_path: PathBuf,
}

impl JobSpec {
    /// Directory the queue should write its own job logs to.
    pub fn log_dir(&self) -> PathBuf {
        self.log_path
            .parent()
            .map(PathBuf::from)
            .unwrap_or_default()
    }
}
