// src/lib.rs

pub mod cli;
pub mod config;
pub mod discovery;
pub mod errors;
pub mod fs;
pub mod job;
pub mod logging;
pub mod pipeline;
pub mod subject;
pub mod submit;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use crate::cli::{CliArgs, Command};
use crate::config::descriptor::FileDescriptor;
use crate::config::loader::load_settings;
use crate::fs::{FileSystem, RealFileSystem};
use crate::job::DependencySet;
use crate::pipeline::{
    build_functional_plan, run_functional_pipeline, run_idp_stage, JobPlan, PipelineResult,
    StageContext,
};
use crate::subject::SubjectLayout;
use crate::submit::{JobSubmitter, ProcessQueueBackend, QueueBackend, VarSource};

/// High-level entry point used by `main.rs`.
///
/// Runs the requested subcommand against the real filesystem and queue and
/// prints the join token on stdout.
pub async fn run(args: CliArgs) -> Result<()> {
    let cwd = std::env::current_dir().context("resolving the working directory")?;
    let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);

    let outcome = run_with_backend(
        &args,
        fs,
        &cwd,
        ProcessQueueBackend::new(),
        VarSource::Process,
    )
    .await?;

    if let Some(result) = outcome {
        println!("{}", result.token());
    }
    Ok(())
}

/// Run a subcommand with an explicit filesystem, working directory and queue.
///
/// Returns `None` for a dry run. Configuration problems are errors and
/// happen before anything is submitted.
pub async fn run_with_backend<B: QueueBackend>(
    args: &CliArgs,
    fs: Arc<dyn FileSystem>,
    cwd: &Path,
    backend: B,
    vars: VarSource,
) -> errors::Result<Option<PipelineResult>> {
    let subject_args = args.subject_args();
    let subject = SubjectLayout::locate(fs.as_ref(), cwd, &subject_args.subject)?;
    let settings = load_settings(fs.as_ref(), subject_args.settings.as_deref())?;
    let hold = DependencySet::parse(&subject_args.hold);
    let descriptor = FileDescriptor::load(fs.as_ref(), &subject.descriptor_path())?;

    info!("starting subject processing");
    info!(subject = %subject.name(), hold = %hold, "subject received as input");

    let result = match &args.command {
        Command::Run(run) => {
            if run.dry_run {
                let ctx = StageContext::new(&subject, &settings);
                let plan = build_functional_plan(&ctx, &descriptor, &hold);
                pipeline::graph::validate_plan(&plan)?;
                print_dry_run(&subject, &plan);
                info!("main processing finished");
                return Ok(None);
            }

            let mut submitter = JobSubmitter::new(backend, fs.clone(), settings, vars);
            run_functional_pipeline(fs.as_ref(), &subject, &descriptor, &hold, &mut submitter)
                .await?
        }
        Command::Idp(_) => {
            let mut submitter = JobSubmitter::new(backend, fs.clone(), settings, vars);
            run_idp_stage(&subject, &hold, &mut submitter).await?
        }
    };

    let problems = result.non_fatal_error_count();
    if problems > 0 {
        warn!(
            failed_submissions = result.failures.len(),
            skipped_branches = result.skipped_branches.len(),
            "{problems} non-fatal error(s) during processing"
        );
    }
    info!(token = %result.token(), "main processing finished");

    Ok(Some(result))
}

/// Session log file for the subject named on the command line, if its log
/// directory exists.
pub fn session_log_path(args: &CliArgs) -> Option<PathBuf> {
    let cwd = std::env::current_dir().ok()?;
    let subject = SubjectLayout::new(&cwd, &args.subject_args().subject);
    if subject.log_dir().is_dir() {
        Some(subject.session_log_path(std::process::id()))
    } else {
        None
    }
}

/// Dry-run output: every planned job with its queue, dependencies and
/// command.
fn print_dry_run(subject: &SubjectLayout, plan: &JobPlan) {
    println!("funcdag dry-run");
    println!("  subject = {}", subject.name());
    println!("  root = {}", subject.root().display());
    for family in plan.skipped() {
        println!("  skipped = {family}");
    }
    println!();

    println!("jobs ({}):", plan.len());
    for job in plan.jobs() {
        println!("  - {}", job.spec.name);
        println!("      queue: {}", job.spec.queue_class);
        if let Some(mb) = job.spec.memory_request_mb {
            println!("      memory_mb: {mb}");
        }
        println!("      after: {:?}", plan.describe_upstream(job));
        println!("      cmd: {}", job.spec.command);
    }

    let terminals: Vec<&str> = plan
        .terminals()
        .iter()
        .filter_map(|key| plan.get(*key))
        .map(|job| job.spec.name.as_str())
        .collect();
    println!();
    println!("join: {terminals:?}");

    debug!("dry-run complete (no submission)");
}
