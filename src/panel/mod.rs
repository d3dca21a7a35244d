//! Operator panel: job snapshot, grouped runs, selection and notices.
//!
//! The panel owns an immutable snapshot of job records plus everything
//! derived from it. Aggregation is recomputed from the snapshot, never
//! patched in place; the wall-clock tick only moves `now` so live durations
//! advance without refetching.

pub mod overview;

use chrono::{DateTime, Utc};
use tracing::warn;

use crate::config::PanelTuning;
use crate::jobs::{well_formed_records, JobRecord};
use crate::lifecycle::{self, TransitionError};
use crate::notify::Notice;
use crate::runs::group::{group_jobs, jobs_for};
use crate::runs::timing::{compute_timing, span_timing, RunTiming};
use crate::runs::{RunGroup, RunKey};
use crate::source::{JobSource, LifecycleSink, SourceError};

pub const MSG_MOVED_TO_PAST: &str = "Product moved to past products successfully!";
pub const MSG_JOB_NOT_FOUND: &str = "Product job not found";
pub const MSG_MOVE_FAILED: &str = "Failed to move product to past";
pub const MSG_LOAD_FAILED: &str = "Failed to load jobs";

/// Which run list the operator is looking at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelView {
    Live,
    Past,
}

impl PanelView {
    pub fn title(&self) -> &'static str {
        match self {
            PanelView::Live => "Live Products",
            PanelView::Past => "Past Products",
        }
    }

    fn empty_hint(&self) -> &'static str {
        match self {
            PanelView::Live => "No Live Products",
            PanelView::Past => "No Past Products",
        }
    }
}

/// Detail card for one run, recomputed from the full snapshot on read.
#[derive(Debug, Clone, PartialEq)]
pub struct RunDetail {
    pub name: String,
    pub date: String,
    pub operation: String,
    pub status: &'static str,
    pub timing: RunTiming,
    pub quantity: usize,
}

/// Panel state over a job backend.
pub struct WorkPanel<B> {
    backend: B,
    tuning: PanelTuning,
    jobs: Vec<JobRecord>,
    groups: Vec<RunGroup>,
    view: PanelView,
    selected: Option<RunKey>,
    notice: Option<Notice>,
    now: DateTime<Utc>,
}

impl<B> WorkPanel<B>
where
    B: JobSource + LifecycleSink,
{
    pub fn new(backend: B, tuning: PanelTuning) -> Self {
        Self {
            backend,
            tuning,
            jobs: Vec::new(),
            groups: Vec::new(),
            view: PanelView::Live,
            selected: None,
            notice: None,
            now: Utc::now(),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Fetch a fresh snapshot and regroup.
    ///
    /// On failure the previous snapshot stays in place, an error notice is
    /// posted, and the error is returned.
    pub async fn refresh(&mut self) -> Result<(), SourceError> {
        match self.backend.fetch_jobs().await {
            Ok(raw) => {
                self.jobs = well_formed_records(raw);
                self.groups = group_jobs(&self.jobs);
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "job snapshot refresh failed, keeping previous snapshot");
                self.notice = Some(Notice::error(MSG_LOAD_FAILED, self.now));
                Err(e)
            }
        }
    }

    /// Advance the panel clock. Expires the notice once its TTL has passed;
    /// never refetches.
    pub fn tick(&mut self, now: DateTime<Utc>) {
        self.now = now;
        if let Some(notice) = &self.notice {
            if notice.is_expired(now, self.tuning.notice_ttl_ms) {
                self.notice = None;
            }
        }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.now
    }

    pub fn view(&self) -> PanelView {
        self.view
    }

    pub fn set_view(&mut self, view: PanelView) {
        self.view = view;
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    /// Runs currently in progress.
    pub fn live_runs(&self) -> Vec<&RunGroup> {
        self.groups
            .iter()
            .filter(|g| g.is_live() && g.quantity() > 0)
            .collect()
    }

    /// Finished runs.
    pub fn past_runs(&self) -> Vec<&RunGroup> {
        self.groups
            .iter()
            .filter(|g| !g.is_live() && g.quantity() > 0)
            .collect()
    }

    pub fn visible_runs(&self) -> Vec<&RunGroup> {
        match self.view {
            PanelView::Live => self.live_runs(),
            PanelView::Past => self.past_runs(),
        }
    }

    pub fn groups(&self) -> &[RunGroup] {
        &self.groups
    }

    /// Timing for one of this panel's groups against the current snapshot.
    pub fn timing_for(&self, group: &RunGroup) -> RunTiming {
        compute_timing(group, &self.jobs, self.now)
    }

    /// Focus a run for the detail card. Returns false when no current group
    /// matches the key.
    pub fn select(&mut self, key: RunKey) -> bool {
        let exists = self.groups.iter().any(|g| g.key == key);
        if exists {
            self.selected = Some(key);
        }
        exists
    }

    pub fn close_detail(&mut self) {
        self.selected = None;
    }

    pub fn selected_group(&self) -> Option<&RunGroup> {
        let key = self.selected.as_ref()?;
        self.groups.iter().find(|g| g.key == *key)
    }

    /// Detail card for the focused run.
    ///
    /// Quantity and timing are recomputed from the snapshot rather than read
    /// off the group; the two must agree while the snapshot is unchanged.
    pub fn detail(&self) -> Option<RunDetail> {
        let group = self.selected_group()?;
        let records = jobs_for(
            &self.jobs,
            &group.key.product_id,
            &group.key.machine,
            group.state(),
        );
        Some(RunDetail {
            name: group.display_name.clone(),
            date: group.display_date(),
            operation: group.operation().to_string(),
            status: if group.is_live() { "Active" } else { "Inactive" },
            timing: span_timing(&records, group.state(), self.now),
            quantity: records.len(),
        })
    }

    /// Retire the focused run and post the outcome as a notice.
    ///
    /// Success swaps in the post-transition snapshot and drops the focus. A
    /// record that vanished between snapshot and action is informational,
    /// not an error; everything else leaves local state untouched.
    pub async fn move_selected_to_past(&mut self) {
        let Some(run) = self.selected_group().cloned() else {
            return;
        };

        match lifecycle::move_to_past(&self.backend, &run).await {
            Ok(outcome) => {
                self.jobs = outcome.jobs;
                self.groups = group_jobs(&self.jobs);
                self.selected = None;
                self.notice = Some(Notice::success(MSG_MOVED_TO_PAST, self.now));
            }
            Err(TransitionError::RecordNotFound { .. }) => {
                self.notice = Some(Notice::info(MSG_JOB_NOT_FOUND, self.now));
            }
            Err(e) => {
                warn!(error = %e, "move to past failed");
                self.notice = Some(Notice::error(MSG_MOVE_FAILED, self.now));
            }
        }
    }

    /// Render the panel as plain text for the terminal.
    pub fn render(&self) -> String {
        let mut out = String::new();

        out.push_str(&format!("{}\n", self.view.title()));
        out.push_str(&format!("{}\n", "-".repeat(76)));

        if let Some(notice) = &self.notice {
            out.push_str(&format!("[{}] {}\n\n", notice.kind, notice.text));
        }

        let runs = self.visible_runs();
        if runs.is_empty() {
            out.push_str(&format!("{}\n", self.view.empty_hint()));
        } else {
            out.push_str(&format!(
                "{:<24} {:<16} {:<12} {:>4}  {}\n",
                "PRODUCT", "OPERATION", "DATE", "QTY", "TIME"
            ));
            for run in runs {
                out.push_str(&format!(
                    "{:<24} {:<16} {:<12} {:>4}  {}\n",
                    run.display_name,
                    run.operation(),
                    run.display_date(),
                    run.quantity(),
                    self.timing_for(run),
                ));
            }
        }

        if let Some(detail) = self.detail() {
            out.push('\n');
            out.push_str(&format!("{}\n", detail.name));
            out.push_str(&format!("  Date       {}\n", detail.date));
            out.push_str(&format!("  Operation  {}\n", detail.operation));
            out.push_str(&format!("  Status     {}\n", detail.status));
            out.push_str(&format!("  Time       {}\n", detail.timing));
            out.push_str(&format!("  Quantity   {}\n", detail.quantity));
        }

        let machines = overview::machine_overview(&self.groups);
        if !machines.is_empty() {
            let tally = overview::counts(&machines);
            out.push('\n');
            out.push_str("Status Overview\n");
            for machine in &machines {
                out.push_str(&format!("  {:<20} {}\n", machine.name, machine.state));
            }
            out.push_str(&format!(
                "  {} online, {} offline\n",
                tally.online, tally.offline
            ));
        }

        out
    }
}
