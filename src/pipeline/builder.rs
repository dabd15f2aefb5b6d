// src/pipeline/builder.rs

//! Branch construction for the functional pipeline.
//!
//! ```text
//! hold ─▶ postprocess ─▶ field map ─┬─▶ rest[0] ─▶ rest[1] ─▶ … ─┬─▶ task[0] ─▶ task[1] ─▶ …
//!                                   └────────(no rest runs)───────┘
//!
//! rest[i] = prepare ─▶ feat (high-mem) ─▶ fix (max-mem) ─▶ FC ─▶ clean logs
//! task[j] = prepare ─▶ feat (high-mem)
//! ```
//!
//! Chains of one family are serialized: each chain starts after the previous
//! chain's terminal job, so the memory-hungry stages never run for two runs
//! of the same family at once. The join token collects every resting-state
//! clean-logs job and every task FEAT job.

use tracing::{debug, error};

use crate::config::descriptor::FileDescriptor;
use crate::discovery::{discover_runs, ModalityFamily, ModalityRun};
use crate::job::DependencySet;
use crate::pipeline::plan::{JobKey, JobPlan, Upstream};
use crate::pipeline::stage::{RunSlot, Stage, StageContext};

const REST_CHAIN: [Stage; 5] = [
    Stage::PrepareRest,
    Stage::FeatRest,
    Stage::Fix,
    Stage::Connectivity,
    Stage::CleanLogs,
];

const TASK_CHAIN: [Stage; 2] = [Stage::PrepareTask, Stage::FeatTask];

/// What one family's branch contributed to the plan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BranchOutcome {
    /// Jobs that belong in the join token, in submission order.
    pub terminals: Vec<JobKey>,
    /// Terminal job of the last chain, if the branch planned anything.
    pub last: Option<JobKey>,
}

/// Discover the subject's runs and plan the full functional pipeline.
pub fn build_functional_plan(
    ctx: &StageContext<'_>,
    descriptor: &FileDescriptor,
    hold: &DependencySet,
) -> JobPlan {
    let rest_runs = discover_runs(descriptor, ModalityFamily::RestingState);
    let task_runs = discover_runs(descriptor, ModalityFamily::Task);
    debug!(
        rest = ?rest_runs.iter().map(|r| r.index.as_str()).collect::<Vec<_>>(),
        task = ?task_runs.iter().map(|r| r.index.as_str()).collect::<Vec<_>>(),
        "discovered runs"
    );
    build_plan_for_runs(ctx, &rest_runs, &task_runs, hold)
}

/// Plan the pipeline for already discovered runs.
pub fn build_plan_for_runs(
    ctx: &StageContext<'_>,
    rest_runs: &[ModalityRun],
    task_runs: &[ModalityRun],
    hold: &DependencySet,
) -> JobPlan {
    let mut plan = JobPlan::new();

    let postprocess = plan.push(
        Stage::Postprocess,
        None,
        ctx.job(Stage::Postprocess, None),
        vec![Upstream::External(hold.clone())],
    );
    let field_map = plan.push(
        Stage::FieldMap,
        None,
        ctx.job(Stage::FieldMap, None),
        vec![Upstream::Job(postprocess)],
    );

    let rest = build_branch(&mut plan, ctx, ModalityFamily::RestingState, rest_runs, field_map);
    let task_start = rest.last.unwrap_or(field_map);
    let task = build_branch(&mut plan, ctx, ModalityFamily::Task, task_runs, task_start);

    for key in rest.terminals.into_iter().chain(task.terminals) {
        plan.mark_terminal(key);
    }

    plan
}

/// Append one serialized chain per run of `family`, the first one held on
/// `predecessor`.
pub fn build_branch(
    plan: &mut JobPlan,
    ctx: &StageContext<'_>,
    family: ModalityFamily,
    runs: &[ModalityRun],
    predecessor: JobKey,
) -> BranchOutcome {
    if runs.is_empty() {
        error!(family = %family, "{}", skipped_branch_message(family));
        plan.mark_skipped(family);
        return BranchOutcome::default();
    }

    let stages: &[Stage] = match family {
        ModalityFamily::RestingState => &REST_CHAIN,
        ModalityFamily::Task => &TASK_CHAIN,
    };

    let mut outcome = BranchOutcome::default();
    let mut previous = predecessor;

    for (position, run) in runs.iter().enumerate() {
        let slot = RunSlot { position, run };
        for &stage in stages {
            previous = plan.push(
                stage,
                Some(run.clone()),
                ctx.job(stage, Some(slot)),
                vec![Upstream::Job(previous)],
            );
        }
        outcome.terminals.push(previous);
        outcome.last = Some(previous);
    }

    outcome
}

/// Error logged when a family has no runs.
pub fn skipped_branch_message(family: ModalityFamily) -> &'static str {
    match family {
        ModalityFamily::RestingState => {
            "There is no rFMRI info. Thus, the Resting State part will not be run"
        }
        ModalityFamily::Task => {
            "There is no tFMRI info. Thus, the Task Functional part will not be run"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::model::Settings;
    use crate::job::JobId;
    use crate::subject::SubjectLayout;
    use std::path::Path;

    fn runs(family: ModalityFamily, indices: &[&str]) -> Vec<ModalityRun> {
        indices.iter().map(|i| ModalityRun::new(family, *i)).collect()
    }

    fn plan_for(rest: &[&str], task: &[&str]) -> JobPlan {
        let settings = Settings::default();
        let subject = SubjectLayout::new(Path::new("/study"), "sub01");
        let ctx = StageContext::new(&subject, &settings);
        build_plan_for_runs(
            &ctx,
            &runs(ModalityFamily::RestingState, rest),
            &runs(ModalityFamily::Task, task),
            &DependencySet::single(JobId::from("77")),
        )
    }

    fn upstream_names(plan: &JobPlan, name: &str) -> Vec<String> {
        let job = plan.jobs().iter().find(|j| j.spec.name == name).unwrap();
        plan.describe_upstream(job)
    }

    #[test]
    fn job_count_and_order() {
        let plan = plan_for(&["0", "1"], &["0"]);
        assert_eq!(plan.len(), 2 + 5 * 2 + 2);

        let stages: Vec<Stage> = plan.jobs().iter().map(|j| j.stage).collect();
        assert_eq!(&stages[..2], &[Stage::Postprocess, Stage::FieldMap]);
        assert_eq!(&stages[2..7], &REST_CHAIN);
        assert_eq!(&stages[7..12], &REST_CHAIN);
        assert_eq!(&stages[12..], &TASK_CHAIN);
    }

    #[test]
    fn postprocess_is_held_on_the_external_token() {
        let plan = plan_for(&[], &[]);
        assert_eq!(upstream_names(&plan, "bb_postprocess_struct_sub01"), vec!["external:77"]);
        assert_eq!(
            upstream_names(&plan, "tvb_prepare_gradEchoFieldMap_sub01"),
            vec!["bb_postprocess_struct_sub01"]
        );
    }

    #[test]
    fn rest_chains_are_serialized_on_clean_logs() {
        let plan = plan_for(&["0", "2", "5"], &[]);
        assert_eq!(
            upstream_names(&plan, "bb_prepare_rfMRI_0_sub01"),
            vec!["tvb_prepare_gradEchoFieldMap_sub01"]
        );
        assert_eq!(
            upstream_names(&plan, "bb_prepare_rfMRI_1_sub01"),
            vec!["bb_rfMRI_clean_0_sub01"]
        );
        assert_eq!(
            upstream_names(&plan, "bb_prepare_rfMRI_2_sub01"),
            vec!["bb_rfMRI_clean_1_sub01"]
        );
        assert_eq!(upstream_names(&plan, "bb_FC_1_sub01"), vec!["bb_fix_1_sub01"]);
    }

    #[test]
    fn task_branch_starts_after_last_rest_chain() {
        let plan = plan_for(&["0", "1"], &["0", "1"]);
        assert_eq!(
            upstream_names(&plan, "bb_prepare_tfMRI_0_sub01"),
            vec!["bb_rfMRI_clean_1_sub01"]
        );
        assert_eq!(
            upstream_names(&plan, "bb_prepare_tfMRI_1_sub01"),
            vec!["bb_feat_tfMRI_0_sub01"]
        );
    }

    #[test]
    fn task_branch_falls_back_to_field_map() {
        let plan = plan_for(&[], &["3"]);
        assert_eq!(plan.skipped(), &[ModalityFamily::RestingState]);
        assert_eq!(
            upstream_names(&plan, "bb_prepare_tfMRI_0_sub01"),
            vec!["tvb_prepare_gradEchoFieldMap_sub01"]
        );
    }

    #[test]
    fn terminals_are_clean_logs_and_task_feat_only() {
        let plan = plan_for(&["0", "1"], &["0"]);
        let names: Vec<&str> = plan
            .terminals()
            .iter()
            .map(|k| plan.get(*k).unwrap().spec.name.as_str())
            .collect();
        assert_eq!(
            names,
            vec!["bb_rfMRI_clean_0_sub01", "bb_rfMRI_clean_1_sub01", "bb_feat_tfMRI_0_sub01"]
        );
    }

    #[test]
    fn empty_families_are_each_skipped_once() {
        let plan = plan_for(&[], &[]);
        assert_eq!(plan.len(), 2);
        assert!(plan.terminals().is_empty());
        assert_eq!(plan.skipped(), &[ModalityFamily::RestingState, ModalityFamily::Task]);
    }
}
