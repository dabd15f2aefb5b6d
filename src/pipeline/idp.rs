// src/pipeline/idp.rs

//! Imaging-derived phenotype stage: one job, held on the token of the
//! functional stage.

use tracing::info;

use crate::errors::Result;
use crate::job::DependencySet;
use crate::pipeline::orchestrator::execute_plan;
use crate::pipeline::plan::{JobPlan, Upstream};
use crate::pipeline::result::PipelineResult;
use crate::pipeline::stage::{Stage, StageContext};
use crate::subject::SubjectLayout;
use crate::submit::{JobSubmitter, QueueBackend};

pub fn build_idp_plan(ctx: &StageContext<'_>, hold: &DependencySet) -> JobPlan {
    let mut plan = JobPlan::new();
    let key = plan.push(
        Stage::Idp,
        None,
        ctx.job(Stage::Idp, None),
        vec![Upstream::External(hold.clone())],
    );
    plan.mark_terminal(key);
    plan
}

/// Submit the IDP job for `subject`.
pub async fn run_idp_stage<B: QueueBackend>(
    subject: &SubjectLayout,
    hold: &DependencySet,
    submitter: &mut JobSubmitter<B>,
) -> Result<PipelineResult> {
    let plan = {
        let ctx = StageContext::new(subject, submitter.settings());
        build_idp_plan(&ctx, hold)
    };

    let result = execute_plan(submitter, &plan).await?;
    info!(subject = %subject.name(), token = %result.token(), "IDP job submitted");
    Ok(result)
}
