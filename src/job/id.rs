// src/job/id.rs

use std::fmt;

/// Wire form of "no dependency" / "no identifier available".
pub const SENTINEL: &str = "-1";

/// Identifier handed out by the batch queue when a job is accepted.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum JobId {
    /// The queue accepted the job under this identifier.
    Assigned(String),
    /// No identifier: either the submission failed or there was nothing to
    /// submit. Jobs held on this are free to start immediately.
    Unavailable,
}

impl JobId {
    /// Build an identifier from a raw token. Blank tokens and the sentinel
    /// map to [`JobId::Unavailable`].
    pub fn new(raw: impl AsRef<str>) -> Self {
        let raw = raw.as_ref().trim();
        if raw.is_empty() || raw == SENTINEL {
            JobId::Unavailable
        } else {
            JobId::Assigned(raw.to_string())
        }
    }

    /// Extract the identifier from a queue's standard output.
    ///
    /// The identifier is the last whitespace-separated token of the last
    /// non-empty line, which covers both queues that print only the id and
    /// those that print a sentence ending in it.
    pub fn from_queue_output(stdout: &str) -> Option<JobId> {
        let token = stdout
            .lines()
            .rev()
            .find(|line| !line.trim().is_empty())?
            .split_whitespace()
            .last()?;
        match JobId::new(token) {
            JobId::Unavailable => None,
            id => Some(id),
        }
    }

    pub fn is_assigned(&self) -> bool {
        matches!(self, JobId::Assigned(_))
    }

    pub fn as_str(&self) -> &str {
        match self {
            JobId::Assigned(id) => id,
            JobId::Unavailable => SENTINEL,
        }
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for JobId {
    fn from(raw: &str) -> Self {
        JobId::new(raw)
    }
}
