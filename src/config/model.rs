// src/config/model.rs

use serde::Deserialize;

use crate::job::QueueClass;

/// Pipeline settings as read from an optional TOML file.
///
/// ```toml
/// [queue]
/// submit_program = "${FSLDIR}/bin/fsl_sub"
/// standard = "${QUEUE_STANDARD}"
/// high_memory = "${QUEUE_MORE_MEM}"
/// max_memory = "${QUEUE_MAX_MEM}"
/// high_memory_request_mb = 16000
///
/// [paths]
/// bin_dir = "$BB_BIN_DIR"
/// ```
///
/// All sections are optional. Values may reference environment variables;
/// they are expanded only when a job is rendered for submission.
///
/// `RawSettings` is the unvalidated form; convert it to [`Settings`] with
/// `Settings::try_from`.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct RawSettings {
    #[serde(default)]
    pub queue: QueueSection,

    #[serde(default)]
    pub paths: PathsSection,
}

/// Validated settings.
#[derive(Debug, Clone)]
pub struct Settings {
    pub queue: QueueSection,
    pub paths: PathsSection,
}

impl Settings {
    pub(crate) fn new_unchecked(queue: QueueSection, paths: PathsSection) -> Self {
        Self { queue, paths }
    }

    /// Queue name (possibly containing `$VAR` references) for a class.
    pub fn queue_name(&self, class: QueueClass) -> &str {
        match class {
            QueueClass::Standard => &self.queue.standard,
            QueueClass::HighMemory => &self.queue.high_memory,
            QueueClass::MaxMemory => &self.queue.max_memory,
        }
    }

    /// Memory request attached to jobs of the given class, if any.
    pub fn memory_request_mb(&self, class: QueueClass) -> Option<u32> {
        match class {
            QueueClass::HighMemory => Some(self.queue.high_memory_request_mb),
            QueueClass::Standard | QueueClass::MaxMemory => None,
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::new_unchecked(QueueSection::default(), PathsSection::default())
    }
}

/// `[queue]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct QueueSection {
    /// Program that accepts a job and prints its identifier.
    #[serde(default = "default_submit_program")]
    pub submit_program: String,

    #[serde(default = "default_standard_queue")]
    pub standard: String,

    #[serde(default = "default_high_memory_queue")]
    pub high_memory: String,

    #[serde(default = "default_max_memory_queue")]
    pub max_memory: String,

    /// Passed as `-R <mb>` for high-memory jobs.
    #[serde(default = "default_high_memory_request_mb")]
    pub high_memory_request_mb: u32,
}

fn default_submit_program() -> String {
    "${FSLDIR}/bin/fsl_sub".to_string()
}

fn default_standard_queue() -> String {
    "${QUEUE_STANDARD}".to_string()
}

fn default_high_memory_queue() -> String {
    "${QUEUE_MORE_MEM}".to_string()
}

fn default_max_memory_queue() -> String {
    "${QUEUE_MAX_MEM}".to_string()
}

fn default_high_memory_request_mb() -> u32 {
    16000
}

impl Default for QueueSection {
    fn default() -> Self {
        Self {
            submit_program: default_submit_program(),
            standard: default_standard_queue(),
            high_memory: default_high_memory_queue(),
            max_memory: default_max_memory_queue(),
            high_memory_request_mb: default_high_memory_request_mb(),
        }
    }
}

/// `[paths]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PathsSection {
    /// Base directory of the pipeline binaries.
    ///
    /// Inserted into job commands unquoted, so after expansion it is
    /// word-split like the rest of the command: a path containing spaces
    /// must carry its own shell quoting.
    #[serde(default = "default_bin_dir")]
    pub bin_dir: String,
}

fn default_bin_dir() -> String {
    "$BB_BIN_DIR".to_string()
}

impl Default for PathsSection {
    fn default() -> Self {
        Self {
            bin_dir: default_bin_dir(),
        }
    }
}
