// src/submit/mod.rs

//! Job submission layer.
//!
//! This module is responsible for getting one job onto the batch queue and
//! reporting back the identifier the queue assigned:
//!
//! - [`render`] expands environment references and splits the command into
//!   the exact argv for the queue.
//! - [`backend`] provides the `QueueBackend` trait and the production
//!   `ProcessQueueBackend`, which tests replace with a fake queue.
//! - [`log_file`] writes the per-job STANDARD OUT / STANDARD ERROR records.
//! - [`submitter`] ties these together in `JobSubmitter`, which turns every
//!   failure into a value instead of an error.

pub mod backend;
pub mod log_file;
pub mod render;
pub mod submitter;

pub use backend::{ProcessQueueBackend, QueueBackend, QueueResponse};
pub use render::{Invocation, VarSource};
pub use submitter::{FailureStage, JobSubmitter, SubmitFailure, SubmitOutcome};
