// src/pipeline/orchestrator.rs

//! Plan execution.
//!
//! Jobs are submitted strictly in plan order, one at a time, each as soon as
//! the identifiers it depends on are known. Nothing here waits for a job to
//! run: the queue enforces the holds.

use tracing::{debug, error, info, warn};

use crate::config::descriptor::FileDescriptor;
use crate::errors::{PipelineError, Result};
use crate::fs::FileSystem;
use crate::job::{DependencySet, JobId};
use crate::pipeline::builder::build_functional_plan;
use crate::pipeline::graph::validate_plan;
use crate::pipeline::plan::{JobPlan, PlannedJob, Upstream};
use crate::pipeline::result::{PipelineResult, SubmittedJob};
use crate::pipeline::sidecar;
use crate::pipeline::stage::StageContext;
use crate::subject::SubjectLayout;
use crate::submit::{JobSubmitter, QueueBackend, SubmitOutcome};

/// Submit every job of `plan` and collect the join token.
///
/// A failed submission does not stop execution: dependants of that job are
/// submitted with the failure recorded as an unavailable identifier.
pub async fn execute_plan<B: QueueBackend>(
    submitter: &mut JobSubmitter<B>,
    plan: &JobPlan,
) -> Result<PipelineResult> {
    validate_plan(plan)?;

    let mut resolved: Vec<Option<JobId>> = vec![None; plan.len()];
    let mut result = PipelineResult {
        skipped_branches: plan.skipped().to_vec(),
        ..PipelineResult::default()
    };

    for job in plan.jobs() {
        let depends_on = resolve_upstream(plan, job, &resolved)?;
        debug!(job = %job.spec.name, upstream = ?plan.describe_upstream(job), "resolved dependencies");

        let outcome = submitter.submit(&job.spec, &depends_on).await;
        let id = outcome.job_id();
        if let SubmitOutcome::Failed(failure) = outcome {
            result.failures.push(failure);
        }

        resolved[job.key.index()] = Some(id.clone());
        result.submitted.push(SubmittedJob {
            name: job.spec.name.clone(),
            stage: job.stage,
            run: job.run.clone(),
            depends_on,
            id,
        });
    }

    for key in plan.terminals() {
        match resolved.get(key.index()).cloned().flatten() {
            Some(id) if id.is_assigned() => result.wait_for.push(id),
            Some(_) => {
                let name = plan.get(*key).map(|j| j.spec.name.as_str()).unwrap_or("?");
                warn!(job = %name, "terminal job has no identifier; left out of the join token");
            }
            None => {
                return Err(PipelineError::PlanError(format!(
                    "terminal job #{} was never submitted",
                    key.index()
                )));
            }
        }
    }

    Ok(result)
}

fn resolve_upstream(
    plan: &JobPlan,
    job: &PlannedJob,
    resolved: &[Option<JobId>],
) -> Result<DependencySet> {
    let mut deps = DependencySet::none();
    for up in &job.upstream {
        match up {
            Upstream::External(external) => deps.extend_from(external),
            Upstream::Job(key) => {
                let id = resolved.get(key.index()).cloned().flatten().ok_or_else(|| {
                    let upstream = plan.get(*key).map(|j| j.spec.name.as_str()).unwrap_or("?");
                    PipelineError::PlanError(format!(
                        "job '{}' needs the identifier of '{upstream}' before it was submitted",
                        job.spec.name
                    ))
                })?;
                deps.push(id);
            }
        }
    }
    Ok(deps)
}

/// Run the whole functional pipeline for one subject.
///
/// 1. Stage the side-car file in the subject root.
/// 2. Plan and submit the postprocessing, field-map, resting-state and task
///    jobs.
/// 3. Move the side-car into the subject's fMRI directory.
///
/// Side-car IO failures are returned as errors; submission failures are not.
pub async fn run_functional_pipeline<B: QueueBackend>(
    fs: &dyn FileSystem,
    subject: &SubjectLayout,
    descriptor: &FileDescriptor,
    hold: &DependencySet,
    submitter: &mut JobSubmitter<B>,
) -> Result<PipelineResult> {
    sidecar::write_staging(fs, subject, descriptor)?;

    let plan = {
        let ctx = StageContext::new(subject, submitter.settings());
        build_functional_plan(&ctx, descriptor, hold)
    };
    info!(subject = %subject.name(), jobs = plan.len(), "functional plan built");

    let result = execute_plan(submitter, &plan).await?;
    info!(
        subject = %subject.name(),
        submitted = result.submitted.len(),
        failed = result.failures.len(),
        token = %result.token(),
        "functional jobs submitted"
    );

    if let Err(err) = sidecar::relocate(fs, subject) {
        error!(
            subject = %subject.name(),
            error = %err,
            "could not move the side-car file; jobs were already submitted"
        );
        return Err(err);
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::future::Future;
    use std::path::Path;
    use std::pin::Pin;
    use std::sync::Arc;

    use crate::config::model::Settings;
    use crate::fs::mock::MockFileSystem;
    use crate::pipeline::stage::Stage;
    use crate::submit::{Invocation, QueueResponse, VarSource};

    /// Hands out 1, 2, 3, ... and fails the jobs whose name is listed.
    struct CountingQueue {
        next: u32,
        fail: Vec<String>,
    }

    impl QueueBackend for CountingQueue {
        fn submit(
            &mut self,
            invocation: Invocation,
        ) -> Pin<Box<dyn Future<Output = Result<QueueResponse>> + Send + '_>> {
            let tokens: Vec<String> = invocation.tokens().iter().map(|t| t.to_string()).collect();
            let name = tokens
                .iter()
                .position(|t| t == "-N")
                .and_then(|i| tokens.get(i + 1))
                .cloned()
                .unwrap_or_default();
            let response = if self.fail.contains(&name) {
                QueueResponse {
                    stdout: String::new(),
                    stderr: "rejected".to_string(),
                    exit_code: Some(1),
                }
            } else {
                self.next += 1;
                QueueResponse {
                    stdout: format!("{}\n", self.next),
                    stderr: String::new(),
                    exit_code: Some(0),
                }
            };
            Box::pin(async move { Ok(response) })
        }
    }

    fn subject_fs() -> MockFileSystem {
        let fs = MockFileSystem::new();
        fs.add_file(
            "/study/sub01/logs/file_descriptor.json",
            r#"{"rfMRI_0": "a", "rfMRI_oldpath_0": "/raw/a"}"#,
        );
        fs
    }

    fn submitter(fs: &MockFileSystem, fail: &[&str]) -> JobSubmitter<CountingQueue> {
        let queue = CountingQueue {
            next: 0,
            fail: fail.iter().map(|s| s.to_string()).collect(),
        };
        JobSubmitter::new(
            queue,
            Arc::new(fs.clone()),
            Settings::default(),
            VarSource::fixed([
                ("FSLDIR", "/fsl"),
                ("QUEUE_STANDARD", "short.q"),
                ("QUEUE_MORE_MEM", "long.q"),
                ("QUEUE_MAX_MEM", "bigmem.q"),
                ("BB_BIN_DIR", "/bb"),
            ]),
        )
    }

    fn descriptor(fs: &MockFileSystem) -> FileDescriptor {
        FileDescriptor::load(fs, Path::new("/study/sub01/logs/file_descriptor.json")).unwrap()
    }

    #[tokio::test]
    async fn resolves_ids_in_plan_order() {
        let fs = subject_fs();
        let subject = SubjectLayout::new(Path::new("/study"), "sub01");
        let mut submitter = submitter(&fs, &[]);

        let result = run_functional_pipeline(
            &fs,
            &subject,
            &descriptor(&fs),
            &DependencySet::parse("9"),
            &mut submitter,
        )
        .await
        .unwrap();

        assert_eq!(result.submitted.len(), 7);
        assert_eq!(result.submitted[0].depends_on.hold_arg(), "9");
        assert_eq!(result.submitted[1].depends_on.hold_arg(), "1");
        assert_eq!(result.submitted[6].stage, Stage::CleanLogs);
        assert_eq!(result.token(), "7");
        assert_eq!(result.skipped_branches.len(), 1);
        assert!(fs.is_file(Path::new("/study/sub01/fMRI/filenames.txt")));
    }

    #[tokio::test]
    async fn failed_job_propagates_the_sentinel() {
        let fs = subject_fs();
        let subject = SubjectLayout::new(Path::new("/study"), "sub01");
        let mut submitter = submitter(&fs, &["bb_fix_0_sub01"]);

        let result = run_functional_pipeline(
            &fs,
            &subject,
            &descriptor(&fs),
            &DependencySet::none(),
            &mut submitter,
        )
        .await
        .unwrap();

        let fc = result.job("bb_FC_0_sub01").unwrap();
        assert_eq!(fc.depends_on.hold_arg(), "-1");
        assert_eq!(result.failures.len(), 1);
        assert_eq!(result.failures[0].job_name, "bb_fix_0_sub01");
        assert_eq!(result.non_fatal_error_count(), 2);
    }

    #[tokio::test]
    async fn relocation_failure_is_fatal() {
        let fs = subject_fs();
        fs.add_dir("/study/sub01/fMRI");
        fs.make_read_only("/study/sub01/fMRI");
        let subject = SubjectLayout::new(Path::new("/study"), "sub01");
        let mut submitter = submitter(&fs, &[]);

        let err = run_functional_pipeline(
            &fs,
            &subject,
            &descriptor(&fs),
            &DependencySet::none(),
            &mut submitter,
        )
        .await
        .unwrap_err();

        assert!(format!("{err:#}").contains("/study/sub01/fMRI"));
        assert_eq!(submitter.into_backend().next, 7);
    }
}
