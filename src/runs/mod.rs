//! Run aggregation: typed grouping keys, run groups, and duration rules.

pub mod group;
pub mod timing;

use chrono::{DateTime, Utc};

use crate::jobs::{JobRecord, RunState};

/// Typed composite key identifying one run group.
///
/// Replaces delimiter-joined string keys; a machine name containing any
/// delimiter sequence cannot collide with another key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RunKey {
    pub product_id: String,
    pub machine: String,
    pub state: RunState,
}

/// One logical run: every job record sharing a [`RunKey`], ordered by
/// creation time. Recomputed on each aggregation pass, never persisted.
///
/// Invariant: `members` is non-empty and all members share the key fields.
/// A product may hold an ON group and an OFF group on the same machine at
/// once; those are disjoint physical units, not contradictory states.
#[derive(Debug, Clone, PartialEq)]
pub struct RunGroup {
    pub key: RunKey,
    /// Product name, taken from the earliest member.
    pub display_name: String,
    /// Ascending by `created_at`.
    pub members: Vec<JobRecord>,
}

impl RunGroup {
    /// Machine name this run executes on.
    pub fn operation(&self) -> &str {
        &self.key.machine
    }

    pub fn state(&self) -> RunState {
        self.key.state
    }

    /// One physical unit per member record.
    pub fn quantity(&self) -> usize {
        self.members.len()
    }

    /// Creation time of the earliest member.
    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.members.first().map(|j| j.created_at)
    }

    /// Display date derived from the earliest member.
    pub fn display_date(&self) -> String {
        self.started_at()
            .map(|t| t.format("%d/%m/%Y").to_string())
            .unwrap_or_default()
    }

    pub fn is_live(&self) -> bool {
        self.key.state.is_live()
    }
}
