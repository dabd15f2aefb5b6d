// src/pipeline/mod.rs

//! Functional pipeline orchestration.
//!
//! - [`stage`] is the catalogue of job kinds and how each becomes a
//!   [`JobSpec`](crate::job::JobSpec).
//! - [`builder`] plans the postprocessing, field-map and per-run branches
//!   into a symbolic [`JobPlan`].
//! - [`graph`] checks a plan before submission.
//! - [`orchestrator`] submits a plan in order and resolves identifiers.
//! - [`sidecar`] stages and relocates the `filenames.txt` side-car.
//! - [`idp`] plans and submits the follow-up IDP job.

pub mod builder;
pub mod graph;
pub mod idp;
pub mod orchestrator;
pub mod plan;
pub mod result;
pub mod sidecar;
pub mod stage;

pub use builder::{build_functional_plan, build_plan_for_runs, BranchOutcome};
pub use idp::{build_idp_plan, run_idp_stage};
pub use orchestrator::{execute_plan, run_functional_pipeline};
pub use plan::{JobKey, JobPlan, PlannedJob, Upstream};
pub use result::{PipelineResult, SubmittedJob};
pub use stage::{Stage, StageContext};
