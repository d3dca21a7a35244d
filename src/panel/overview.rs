//! Machine status derived from the grouped runs.

use std::collections::BTreeMap;

use crate::jobs::RunState;
use crate::runs::RunGroup;

/// One machine's standing as seen through its runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MachineOverview {
    pub name: String,
    /// Number of live runs currently assigned to the machine.
    pub live_runs: usize,
    pub state: RunState,
}

/// Derive per-machine status from the current run groups.
///
/// A machine counts as ON when at least one live run with members is on it;
/// machines that only appear through finished runs read OFF. Output is
/// sorted by machine name.
pub fn machine_overview(groups: &[RunGroup]) -> Vec<MachineOverview> {
    let mut live_by_machine: BTreeMap<&str, usize> = BTreeMap::new();
    for group in groups {
        let entry = live_by_machine.entry(group.key.machine.as_str()).or_default();
        if group.is_live() && group.quantity() > 0 {
            *entry += 1;
        }
    }

    live_by_machine
        .into_iter()
        .map(|(name, live_runs)| MachineOverview {
            name: name.to_string(),
            live_runs,
            state: if live_runs > 0 {
                RunState::On
            } else {
                RunState::Off
            },
        })
        .collect()
}

/// Online / offline machine tallies for the panel header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OverviewCounts {
    pub online: usize,
    pub offline: usize,
}

pub fn counts(overview: &[MachineOverview]) -> OverviewCounts {
    let online = overview.iter().filter(|m| m.state == RunState::On).count();
    OverviewCounts {
        online,
        offline: overview.len() - online,
    }
}
