//! Duration computation for run groups.
//!
//! Live runs count up from the most recent start. Finished runs reconstruct
//! the elapsed span of the production cycle they closed, pairing the last
//! stop record against the nearest preceding unmatched start across both
//! states of the same (product, machine).

use std::fmt;

use chrono::{DateTime, Utc};

use super::group::jobs_for_pair;
use super::RunGroup;
use crate::jobs::{JobRecord, RunState};

/// Which clock a run is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimingLabel {
    /// Live run, still accumulating.
    Running,
    /// Finished run with a reconstructed positive span.
    Final,
    /// Finished run whose span collapsed to zero.
    Total,
    /// Finished run with no measurable span at all.
    Completed,
}

impl TimingLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimingLabel::Running => "Running",
            TimingLabel::Final => "Final",
            TimingLabel::Total => "Total",
            TimingLabel::Completed => "Completed",
        }
    }
}

impl fmt::Display for TimingLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A computed run duration, ready for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunTiming {
    pub label: TimingLabel,
    /// Elapsed milliseconds. `None` when there is nothing to measure.
    pub duration_ms: Option<i64>,
}

impl RunTiming {
    pub fn running(duration_ms: i64) -> Self {
        Self {
            label: TimingLabel::Running,
            duration_ms: Some(duration_ms),
        }
    }

    pub fn finished(duration_ms: i64) -> Self {
        Self {
            label: TimingLabel::Final,
            duration_ms: Some(duration_ms),
        }
    }

    pub fn total_zero() -> Self {
        Self {
            label: TimingLabel::Total,
            duration_ms: Some(0),
        }
    }

    pub fn completed() -> Self {
        Self {
            label: TimingLabel::Completed,
            duration_ms: None,
        }
    }
}

impl fmt::Display for RunTiming {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.duration_ms {
            Some(ms) => write!(f, "{}: {}", self.label, format_hms(ms)),
            None => f.write_str(self.label.as_str()),
        }
    }
}

/// Render elapsed milliseconds as zero-padded `HH:MM:SS`.
///
/// Whole seconds only (floor division), negatives clamp to zero, and the
/// hours field grows past two digits rather than wrapping.
pub fn format_hms(duration_ms: i64) -> String {
    let total_secs = duration_ms.max(0) / 1000;
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;
    format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
}

/// Compute the timing for one run group against the full snapshot.
///
/// `jobs` must be the unfiltered snapshot the group was built from: finished
/// runs pair their stop records against start records that live in a sibling
/// group, so a pre-filtered slice would starve the pairing.
pub fn compute_timing(group: &RunGroup, jobs: &[JobRecord], now: DateTime<Utc>) -> RunTiming {
    match group.state() {
        RunState::On => match group.members.last() {
            Some(latest) => {
                RunTiming::running((now - latest.created_at).num_milliseconds())
            }
            None => RunTiming::completed(),
        },
        RunState::Off => {
            let pair = jobs_for_pair(jobs, &group.key.product_id, &group.key.machine);
            off_timing(&pair)
        }
    }
}

/// Timing for a finished run, given every record of its (product, machine)
/// across both states in ascending creation order.
fn off_timing(pair: &[&JobRecord]) -> RunTiming {
    // A lone stop record measures its own lifetime: created to last update.
    if let [only] = pair {
        if only.state == RunState::Off {
            let ms = (only.effective_updated_at() - only.created_at).num_milliseconds();
            return if ms > 0 {
                RunTiming::finished(ms)
            } else {
                RunTiming::completed()
            };
        }
    }

    match last_close_pairing(pair) {
        Some((close, Some(start))) => {
            let ms = (close.effective_updated_at() - start.created_at).num_milliseconds();
            if ms > 0 {
                RunTiming::finished(ms)
            } else {
                RunTiming::total_zero()
            }
        }
        _ => RunTiming::completed(),
    }
}

/// Find the most recent stop record and the start it closes.
///
/// Walks the records in creation order keeping a stack of still-open starts;
/// each stop pops the nearest preceding unmatched start. Returns the last
/// stop seen together with its paired start, `None` for the start when every
/// earlier start was already consumed.
fn last_close_pairing<'a>(
    pair: &[&'a JobRecord],
) -> Option<(&'a JobRecord, Option<&'a JobRecord>)> {
    let mut open: Vec<&'a JobRecord> = Vec::new();
    let mut last_close: Option<(&'a JobRecord, Option<&'a JobRecord>)> = None;
    for job in pair {
        match job.state {
            RunState::On => open.push(job),
            RunState::Off => last_close = Some((job, open.pop())),
        }
    }
    last_close
}

/// Timing over an explicit span of records in one state, for detail views.
///
/// Live spans count from the latest start; finished spans stretch from the
/// earliest creation to the latest update among the given records.
pub fn span_timing(records: &[&JobRecord], state: RunState, now: DateTime<Utc>) -> RunTiming {
    if state == RunState::On {
        return match records.last() {
            Some(latest) => RunTiming::running((now - latest.created_at).num_milliseconds()),
            None => RunTiming::completed(),
        };
    }

    let earliest = records.iter().map(|j| j.created_at).min();
    let latest = records.iter().map(|j| j.effective_updated_at()).max();
    match (earliest, latest) {
        (Some(start), Some(end)) => RunTiming::finished((end - start).num_milliseconds()),
        _ => RunTiming::completed(),
    }
}
