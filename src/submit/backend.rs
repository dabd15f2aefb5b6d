// src/submit/backend.rs

//! Pluggable queue backend abstraction.
//!
//! The submitter talks to a `QueueBackend` instead of spawning processes
//! directly, so tests can swap in a fake queue.
//!
//! - `ProcessQueueBackend` is the production implementation: it runs the
//!   rendered submission command (normally `fsl_sub`) and captures its
//!   output.
//! - Tests provide their own `QueueBackend` that records invocations and
//!   hands out identifiers without touching the system.

use std::future::Future;
use std::pin::Pin;
use std::process::Stdio;

use anyhow::Context;
use tokio::process::Command;
use tracing::debug;

use crate::errors::Result;
use crate::submit::render::Invocation;

/// What the queue's submission entry point answered.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueueResponse {
    pub stdout: String,
    pub stderr: String,
    /// Exit status of the submission command, `None` if it was killed by a
    /// signal.
    pub exit_code: Option<i32>,
}

impl QueueResponse {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Trait abstracting how a rendered job reaches the batch queue.
///
/// Implementations return once the queue has acknowledged (or refused) the
/// job; they never wait for the job itself to run.
pub trait QueueBackend: Send {
    fn submit(
        &mut self,
        invocation: Invocation,
    ) -> Pin<Box<dyn Future<Output = Result<QueueResponse>> + Send + '_>>;
}

/// Real queue backend: spawns the submission command and collects its
/// output.
#[derive(Debug, Clone, Default)]
pub struct ProcessQueueBackend;

impl ProcessQueueBackend {
    pub fn new() -> Self {
        Self
    }
}

impl QueueBackend for ProcessQueueBackend {
    fn submit(
        &mut self,
        invocation: Invocation,
    ) -> Pin<Box<dyn Future<Output = Result<QueueResponse>> + Send + '_>> {
        Box::pin(async move {
            debug!(program = %invocation.program, args = ?invocation.args, "spawning queue submission");

            let output = Command::new(&invocation.program)
                .args(&invocation.args)
                .stdin(Stdio::null())
                .stdout(Stdio::piped())
                .stderr(Stdio::piped())
                .kill_on_drop(true)
                .output()
                .await
                .with_context(|| format!("running queue submission '{}'", invocation.program))?;

            Ok(QueueResponse {
                stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
                exit_code: output.status.code(),
            })
        })
    }
}
