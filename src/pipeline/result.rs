// src/pipeline/result.rs

//! What an orchestration pass reports back: every submission made, the
//! join token for the next stage and the non-fatal problems met on the way.

use crate::discovery::{ModalityFamily, ModalityRun};
use crate::job::{DependencySet, JobId};
use crate::pipeline::stage::Stage;
use crate::submit::SubmitFailure;

/// Record of one submission made while executing a plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmittedJob {
    pub name: String,
    pub stage: Stage,
    pub run: Option<ModalityRun>,
    /// Identifiers the job was held on, as resolved at submission time.
    pub depends_on: DependencySet,
    /// What the queue assigned; unavailable if the submission failed.
    pub id: JobId,
}

/// Outcome of one orchestration pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineResult {
    /// Every submission, in the order it was made.
    pub submitted: Vec<SubmittedJob>,
    /// Terminal identifiers a downstream stage should wait for.
    pub wait_for: DependencySet,
    pub failures: Vec<SubmitFailure>,
    /// Families that had no runs.
    pub skipped_branches: Vec<ModalityFamily>,
}

impl PipelineResult {
    /// Join token for the next stage's hold argument; `-1` if nothing to
    /// wait for.
    pub fn token(&self) -> String {
        self.wait_for.hold_arg()
    }

    /// Problems that did not stop the run but deserve the caller's
    /// attention.
    pub fn non_fatal_error_count(&self) -> usize {
        self.failures.len() + self.skipped_branches.len()
    }

    pub fn job(&self, name: &str) -> Option<&SubmittedJob> {
        self.submitted.iter().find(|j| j.name == name)
    }
}
