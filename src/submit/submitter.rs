// src/submit/submitter.rs

//! The command-execution wrapper: render, submit, record, identify.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, error, info};

use crate::config::model::Settings;
use crate::errors::PipelineError;
use crate::fs::FileSystem;
use crate::job::{DependencySet, JobId, JobSpec};
use crate::submit::backend::QueueBackend;
use crate::submit::log_file;
use crate::submit::render::{render_invocation, VarSource};

/// Step of a submission that went wrong.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureStage {
    /// Expanding or tokenizing the command.
    Render,
    /// Reaching the queue's submission entry point.
    Invoke,
    /// Writing the per-job log record.
    LogFile,
    /// The queue answered, but not with an identifier.
    Response,
}

impl fmt::Display for FailureStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FailureStage::Render => "render",
            FailureStage::Invoke => "invoke",
            FailureStage::LogFile => "log-file",
            FailureStage::Response => "response",
        };
        f.write_str(s)
    }
}

/// Structured reason a job did not obtain an identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitFailure {
    pub job_name: String,
    pub stage: FailureStage,
    /// Error class, e.g. `"render"` or `"io"`.
    pub kind: String,
    pub message: String,
}

impl SubmitFailure {
    fn from_error(job: &JobSpec, stage: FailureStage, err: &PipelineError) -> Self {
        Self {
            job_name: job.name.clone(),
            stage,
            kind: err.kind().to_string(),
            message: err.to_string(),
        }
    }

    fn response(job: &JobSpec, message: impl Into<String>) -> Self {
        Self {
            job_name: job.name.clone(),
            stage: FailureStage::Response,
            kind: "queue".to_string(),
            message: message.into(),
        }
    }
}

impl fmt::Display for SubmitFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "job '{}' failed at {} ({}): {}",
            self.job_name, self.stage, self.kind, self.message
        )
    }
}

/// Result of one submission. Failures are values, not errors: the caller
/// keeps building the graph with [`JobId::Unavailable`] in place of the
/// missing identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Submitted(JobId),
    Failed(SubmitFailure),
}

impl SubmitOutcome {
    /// Identifier to hold dependants on; unavailable on failure.
    pub fn job_id(&self) -> JobId {
        match self {
            SubmitOutcome::Submitted(id) => id.clone(),
            SubmitOutcome::Failed(_) => JobId::Unavailable,
        }
    }

    pub fn failure(&self) -> Option<&SubmitFailure> {
        match self {
            SubmitOutcome::Submitted(_) => None,
            SubmitOutcome::Failed(failure) => Some(failure),
        }
    }
}

/// Submits single jobs to the batch queue.
///
/// A call returns as soon as the queue has acknowledged the job; it never
/// waits for the job to run.
pub struct JobSubmitter<B: QueueBackend> {
    backend: B,
    fs: Arc<dyn FileSystem>,
    settings: Settings,
    vars: VarSource,
}

impl<B: QueueBackend> JobSubmitter<B> {
    pub fn new(backend: B, fs: Arc<dyn FileSystem>, settings: Settings, vars: VarSource) -> Self {
        Self {
            backend,
            fs,
            settings,
            vars,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn into_backend(self) -> B {
        self.backend
    }

    /// Submit `job`, held on `depends_on`.
    ///
    /// Appends a STANDARD OUT / STANDARD ERROR record to the job's log file
    /// whenever the queue answered. Never returns an error: anything that
    /// goes wrong is logged and reported as [`SubmitOutcome::Failed`].
    pub async fn submit(&mut self, job: &JobSpec, depends_on: &DependencySet) -> SubmitOutcome {
        match self.try_submit(job, depends_on).await {
            Ok(id) => {
                info!(job = %job.name, id = %id, "job submitted");
                SubmitOutcome::Submitted(id)
            }
            Err(failure) => {
                error!(
                    job = %failure.job_name,
                    cmd = %job.command.trim(),
                    stage = %failure.stage,
                    kind = %failure.kind,
                    error = %failure.message,
                    "exception raised during submission; dependants will not be held on this job"
                );
                SubmitOutcome::Failed(failure)
            }
        }
    }

    async fn try_submit(
        &mut self,
        job: &JobSpec,
        depends_on: &DependencySet,
    ) -> Result<JobId, SubmitFailure> {
        info!(
            job = %job.name,
            queue = %job.queue_class,
            hold = %depends_on,
            cmd = %job.command.trim(),
            "command to run"
        );

        let invocation = render_invocation(&self.settings, job, depends_on, &self.vars)
            .map_err(|e| SubmitFailure::from_error(job, FailureStage::Render, &e))?;
        debug!(job = %job.name, invocation = %invocation, "rendered queue invocation");

        let response = self
            .backend
            .submit(invocation)
            .await
            .map_err(|e| SubmitFailure::from_error(job, FailureStage::Invoke, &e))?;

        log_file::append_record(self.fs.as_ref(), &job.log_path, &response).map_err(|e| {
            SubmitFailure::from_error(job, FailureStage::LogFile, &PipelineError::Other(e))
        })?;

        info!(job = %job.name, stderr = %response.stderr.trim(), "command output");

        if !response.success() {
            let status = response
                .exit_code
                .map(|c| c.to_string())
                .unwrap_or_else(|| "signal".to_string());
            return Err(SubmitFailure::response(
                job,
                format!("queue submission exited with status {status}"),
            ));
        }

        JobId::from_queue_output(&response.stdout).ok_or_else(|| {
            SubmitFailure::response(job, "queue output did not contain a job identifier")
        })
    }
}
