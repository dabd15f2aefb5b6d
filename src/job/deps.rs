// src/job/deps.rs

use std::fmt;

use crate::job::id::{JobId, SENTINEL};

/// Ordered set of upstream identifiers a job is held on.
///
/// Duplicates are dropped on insert, first occurrence wins. The wire form
/// ([`DependencySet::hold_arg`]) lists the assigned identifiers joined by
/// `,` with no trailing separator, or `-1` if none are assigned. The same
/// form is used for the final join token handed to a downstream stage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencySet {
    ids: Vec<JobId>,
}

impl DependencySet {
    /// No upstream dependency.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn single(id: JobId) -> Self {
        let mut set = Self::default();
        set.push(id);
        set
    }

    /// Parse a hold token as accepted on the command line, e.g. `"12,13"`
    /// or `"-1"`.
    pub fn parse(token: &str) -> Self {
        token.split(',').map(JobId::new).collect()
    }

    pub fn push(&mut self, id: JobId) {
        if !self.ids.contains(&id) {
            self.ids.push(id);
        }
    }

    pub fn extend_from(&mut self, other: &DependencySet) {
        for id in other.iter() {
            self.push(id.clone());
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &JobId> {
        self.ids.iter()
    }

    /// Identifiers the queue will actually hold on.
    pub fn assigned(&self) -> impl Iterator<Item = &str> {
        self.ids.iter().filter_map(|id| match id {
            JobId::Assigned(raw) => Some(raw.as_str()),
            JobId::Unavailable => None,
        })
    }

    /// True when the queue would not hold the job at all.
    pub fn is_unconstrained(&self) -> bool {
        self.assigned().next().is_none()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Serialize for the queue's hold argument.
    pub fn hold_arg(&self) -> String {
        let assigned: Vec<&str> = self.assigned().collect();
        if assigned.is_empty() {
            SENTINEL.to_string()
        } else {
            assigned.join(",")
        }
    }
}

impl FromIterator<JobId> for DependencySet {
    fn from_iter<I: IntoIterator<Item = JobId>>(iter: I) -> Self {
        let mut set = Self::default();
        for id in iter {
            set.push(id);
        }
        set
    }
}

impl fmt::Display for DependencySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.hold_arg())
    }
}
