// src/pipeline/graph.rs

//! Structural checks on a [`JobPlan`] before anything is submitted.
//!
//! A plan is submittable when:
//! - job names are unique (they name the per-job log files),
//! - every `Upstream::Job` refers to a job of the plan,
//! - the dependency graph is acyclic,
//! - every dependency precedes its dependant in plan order, so plan order is
//!   itself a topological order and every identifier is known by the time
//!   it is needed.

use std::collections::HashSet;

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;

use crate::errors::{PipelineError, Result};
use crate::pipeline::plan::{JobKey, JobPlan, Upstream};

pub fn validate_plan(plan: &JobPlan) -> Result<()> {
    ensure_unique_names(plan)?;
    ensure_known_upstreams(plan)?;
    ensure_acyclic(plan)?;
    ensure_forward_only(plan)?;
    Ok(())
}

fn ensure_unique_names(plan: &JobPlan) -> Result<()> {
    let mut seen = HashSet::new();
    for job in plan.jobs() {
        if !seen.insert(job.spec.name.as_str()) {
            return Err(PipelineError::PlanError(format!(
                "job name '{}' is used more than once",
                job.spec.name
            )));
        }
    }
    Ok(())
}

fn ensure_known_upstreams(plan: &JobPlan) -> Result<()> {
    for job in plan.jobs() {
        for key in upstream_keys(&job.upstream) {
            if plan.get(key).is_none() {
                return Err(PipelineError::PlanError(format!(
                    "job '{}' depends on unknown job #{}",
                    job.spec.name,
                    key.index()
                )));
            }
        }
    }
    Ok(())
}

fn ensure_acyclic(plan: &JobPlan) -> Result<()> {
    // Edge direction: dependency -> dependant.
    let mut graph: DiGraphMap<usize, ()> = DiGraphMap::new();

    for job in plan.jobs() {
        graph.add_node(job.key.index());
    }

    for job in plan.jobs() {
        for key in upstream_keys(&job.upstream) {
            graph.add_edge(key.index(), job.key.index(), ());
        }
    }

    match toposort(&graph, None) {
        Ok(_order) => Ok(()),
        Err(cycle) => {
            let name = plan
                .jobs()
                .get(cycle.node_id())
                .map(|j| j.spec.name.as_str())
                .unwrap_or("?");
            Err(PipelineError::PlanError(format!(
                "cycle detected in job plan involving '{name}'"
            )))
        }
    }
}

fn ensure_forward_only(plan: &JobPlan) -> Result<()> {
    for job in plan.jobs() {
        for key in upstream_keys(&job.upstream) {
            if key >= job.key {
                let upstream = plan.get(key).map(|j| j.spec.name.as_str()).unwrap_or("?");
                return Err(PipelineError::PlanError(format!(
                    "job '{}' is planned before its dependency '{upstream}'",
                    job.spec.name
                )));
            }
        }
    }
    Ok(())
}

fn upstream_keys(upstream: &[Upstream]) -> impl Iterator<Item = JobKey> + '_ {
    upstream.iter().filter_map(|up| match up {
        Upstream::Job(key) => Some(*key),
        Upstream::External(_) => None,
    })
}
