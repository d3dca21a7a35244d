//! Run grouping engine: partition job records by (product, machine, state).

use std::collections::BTreeMap;

use crate::jobs::{JobRecord, RunState};

use super::{RunGroup, RunKey};

fn key_of(job: &JobRecord) -> RunKey {
    RunKey {
        product_id: job.product.id.clone(),
        machine: job.machine.name.clone(),
        state: job.state,
    }
}

/// Partition a snapshot into run groups.
///
/// Pure and deterministic: the same input yields the same groups in the same
/// order (earliest member first, key as tie-break). Performs no I/O. A key
/// only exists because at least one record maps to it, so zero-quantity
/// groups never arise; presentation filters such as `quantity() > 0` belong
/// to callers, not here.
pub fn group_jobs(jobs: &[JobRecord]) -> Vec<RunGroup> {
    let mut by_key: BTreeMap<RunKey, Vec<JobRecord>> = BTreeMap::new();
    for job in jobs {
        by_key.entry(key_of(job)).or_default().push(job.clone());
    }

    let mut groups: Vec<RunGroup> = by_key
        .into_iter()
        .map(|(key, mut members)| {
            members.sort_by_key(|j| j.created_at);
            let display_name = members[0].product.name.clone();
            RunGroup {
                key,
                display_name,
                members,
            }
        })
        .collect();

    groups.sort_by(|a, b| {
        a.started_at()
            .cmp(&b.started_at())
            .then_with(|| a.key.cmp(&b.key))
    });
    groups
}

/// All records for one (product, machine, state), ascending by creation time.
///
/// ON and OFF records for the same physical unit live in different run
/// groups, so duration computation reads the full unfiltered snapshot through
/// this function. Read-only by contract; it never touches group state.
pub fn jobs_for<'a>(
    jobs: &'a [JobRecord],
    product_id: &str,
    machine: &str,
    state: RunState,
) -> Vec<&'a JobRecord> {
    let mut matched: Vec<&JobRecord> = jobs
        .iter()
        .filter(|j| j.product.id == product_id && j.machine.name == machine && j.state == state)
        .collect();
    matched.sort_by_key(|j| j.created_at);
    matched
}

/// All records for one (product, machine) across both states, ascending by
/// creation time: the flattened set the finished-run pairing walks.
pub fn jobs_for_pair<'a>(
    jobs: &'a [JobRecord],
    product_id: &str,
    machine: &str,
) -> Vec<&'a JobRecord> {
    let mut matched: Vec<&JobRecord> = jobs
        .iter()
        .filter(|j| j.product.id == product_id && j.machine.name == machine)
        .collect();
    matched.sort_by_key(|j| j.created_at);
    matched
}
