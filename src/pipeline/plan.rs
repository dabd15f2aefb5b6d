// src/pipeline/plan.rs

//! Symbolic job plan.
//!
//! The builder describes the whole graph before anything is submitted.
//! Dependencies between planned jobs are expressed as [`JobKey`]s and only
//! turned into queue identifiers during execution.

use crate::discovery::{ModalityFamily, ModalityRun};
use crate::job::{DependencySet, JobSpec};
use crate::pipeline::stage::Stage;

/// Position of a job in its plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JobKey(usize);

impl JobKey {
    pub fn index(self) -> usize {
        self.0
    }

    #[cfg(test)]
    pub(crate) fn from_index(index: usize) -> Self {
        JobKey(index)
    }
}

/// Something a planned job is held on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Upstream {
    /// Identifiers from outside this plan, e.g. a previous pipeline stage.
    External(DependencySet),
    /// Another job of this plan.
    Job(JobKey),
}

#[derive(Debug, Clone)]
pub struct PlannedJob {
    pub key: JobKey,
    pub stage: Stage,
    pub run: Option<ModalityRun>,
    pub spec: JobSpec,
    pub upstream: Vec<Upstream>,
}

/// Ordered list of jobs plus the terminals that make up the join token.
#[derive(Debug, Clone, Default)]
pub struct JobPlan {
    jobs: Vec<PlannedJob>,
    terminals: Vec<JobKey>,
    skipped: Vec<ModalityFamily>,
}

impl JobPlan {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a job and return its key. Jobs are submitted in push order.
    pub fn push(
        &mut self,
        stage: Stage,
        run: Option<ModalityRun>,
        spec: JobSpec,
        upstream: Vec<Upstream>,
    ) -> JobKey {
        let key = JobKey(self.jobs.len());
        self.jobs.push(PlannedJob {
            key,
            stage,
            run,
            spec,
            upstream,
        });
        key
    }

    pub fn mark_terminal(&mut self, key: JobKey) {
        if !self.terminals.contains(&key) {
            self.terminals.push(key);
        }
    }

    /// Record that a family had no runs and its branch was left out.
    pub fn mark_skipped(&mut self, family: ModalityFamily) {
        self.skipped.push(family);
    }

    pub fn jobs(&self) -> &[PlannedJob] {
        &self.jobs
    }

    pub fn get(&self, key: JobKey) -> Option<&PlannedJob> {
        self.jobs.get(key.index())
    }

    pub fn terminals(&self) -> &[JobKey] {
        &self.terminals
    }

    pub fn skipped(&self) -> &[ModalityFamily] {
        &self.skipped
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// Human-readable upstream list, e.g. `bb_fix_0_sub01` or `external:-1`.
    pub fn describe_upstream(&self, job: &PlannedJob) -> Vec<String> {
        job.upstream
            .iter()
            .map(|up| match up {
                Upstream::External(deps) => format!("external:{deps}"),
                Upstream::Job(key) => self
                    .get(*key)
                    .map(|j| j.spec.name.clone())
                    .unwrap_or_else(|| format!("<unknown job #{}>", key.index())),
            })
            .collect()
    }
}
