//! End-to-end panel flows over the in-memory backend: grouping, durations,
//! the move-to-past transition and its notices.

use chrono::{DateTime, Duration, Utc};

use runpanel::config::PanelTuning;
use runpanel::jobs::{
    well_formed_records, JobRecord, MachineRef, ProductRef, RawJob, RawMachine, RawProduct,
    RunState,
};
use runpanel::notify::NoticeKind;
use runpanel::panel::{PanelView, WorkPanel, MSG_JOB_NOT_FOUND, MSG_MOVED_TO_PAST, MSG_MOVE_FAILED};
use runpanel::runs::group::group_jobs;
use runpanel::runs::timing::{compute_timing, TimingLabel};
use runpanel::source::memory::MemoryBackend;

fn job(
    id: &str,
    product_id: &str,
    name: &str,
    machine: &str,
    state: RunState,
    created: DateTime<Utc>,
    updated: Option<DateTime<Utc>>,
) -> JobRecord {
    JobRecord {
        id: id.to_string(),
        product: ProductRef {
            id: product_id.to_string(),
            name: name.to_string(),
        },
        machine: MachineRef {
            name: machine.to_string(),
        },
        state,
        created_at: created,
        updated_at: updated,
    }
}

fn at(rfc3339: &str) -> DateTime<Utc> {
    rfc3339.parse().unwrap()
}

async fn panel_over(jobs: Vec<JobRecord>) -> WorkPanel<MemoryBackend> {
    let mut panel = WorkPanel::new(MemoryBackend::new(jobs), PanelTuning::default());
    panel.refresh().await.unwrap();
    panel
}

// Two live records for the same product and machine collapse into one run
// counting from the later start.
#[tokio::test]
async fn test_two_live_records_one_running_group() {
    let now = Utc::now();
    let jobs = vec![
        job(
            "1",
            "7",
            "Gear Housing",
            "Drilling",
            RunState::On,
            now - Duration::minutes(20),
            None,
        ),
        job(
            "2",
            "7",
            "Gear Housing",
            "Drilling",
            RunState::On,
            now - Duration::minutes(10),
            None,
        ),
    ];

    let mut panel = panel_over(jobs).await;
    panel.tick(now);

    let live = panel.live_runs();
    assert_eq!(live.len(), 1);
    assert_eq!(live[0].quantity(), 2);

    let timing = panel.timing_for(live[0]);
    assert_eq!(timing.label, TimingLabel::Running);
    assert!(timing.duration_ms.unwrap() >= Duration::minutes(10).num_milliseconds());
}

// A start and a stop two hours apart: the finished run reads the full cycle
// even though the records live in different groups.
#[tokio::test]
async fn test_start_stop_cycle_reads_final_duration() {
    let t0 = at("2024-03-01T08:00:00Z");
    let jobs = vec![
        job("1", "7", "Gear Housing", "Drilling", RunState::On, t0, None),
        job(
            "2",
            "7",
            "Gear Housing",
            "Drilling",
            RunState::Off,
            t0 + Duration::hours(2),
            Some(t0 + Duration::hours(2)),
        ),
    ];

    let panel = panel_over(jobs).await;
    assert_eq!(panel.live_runs().len(), 1);
    assert_eq!(panel.past_runs().len(), 1);
    assert_eq!(panel.live_runs()[0].quantity(), 1);
    assert_eq!(panel.past_runs()[0].quantity(), 1);

    let timing = panel.timing_for(panel.past_runs()[0]);
    assert_eq!(timing.to_string(), "Final: 02:00:00");
}

// A lone stop record that was never touched after creation has nothing to
// measure.
#[tokio::test]
async fn test_untouched_lone_stop_shows_completed() {
    let t0 = at("2024-03-01T08:00:00Z");
    let jobs = vec![job(
        "1",
        "7",
        "Gear Housing",
        "Drilling",
        RunState::Off,
        t0,
        Some(t0),
    )];

    let panel = panel_over(jobs).await;
    let timing = panel.timing_for(panel.past_runs()[0]);
    assert_eq!(timing.label, TimingLabel::Completed);
    assert_eq!(timing.duration_ms, None);
    assert_eq!(timing.to_string(), "Completed");
}

// Move-to-past against a run whose record was already retired elsewhere:
// informational notice, and the backend is never asked to mutate.
#[tokio::test]
async fn test_move_to_past_without_live_record_posts_info() {
    let t0 = at("2024-03-01T08:00:00Z");
    let live = vec![job(
        "1",
        "7",
        "Gear Housing",
        "Drilling",
        RunState::On,
        t0,
        None,
    )];

    let mut panel = panel_over(live).await;
    let key = panel.live_runs()[0].key.clone();
    assert!(panel.select(key));

    // Another actor retires the record between snapshot and action.
    use runpanel::source::LifecycleSink;
    panel
        .backend()
        .move_to_past(&runpanel::source::TransitionRequest::move_to_past("7", "1"))
        .await
        .unwrap();
    let calls_before = panel.backend().transition_calls();

    panel.move_selected_to_past().await;

    let notice = panel.notice().expect("a notice should be posted");
    assert_eq!(notice.kind, NoticeKind::Info);
    assert_eq!(notice.text, MSG_JOB_NOT_FOUND);
    assert_eq!(panel.backend().transition_calls(), calls_before);
}

// A record with no machine name is dropped; the rest of the snapshot still
// groups.
#[tokio::test]
async fn test_malformed_record_is_skipped_not_fatal() {
    let t0 = at("2024-03-01T08:00:00Z");
    let good = [
        job("1", "7", "Gear Housing", "Drilling", RunState::On, t0, None),
        job(
            "2",
            "9",
            "Shaft",
            "Milling 1",
            RunState::On,
            t0 + Duration::minutes(5),
            None,
        ),
    ];
    let mut raw: Vec<RawJob> = good.iter().map(RawJob::from).collect();
    raw.push(RawJob {
        id: Some("3".to_string()),
        product: Some(RawProduct {
            id: Some("11".to_string()),
            name: Some("Bracket".to_string()),
        }),
        machine: Some(RawMachine { name: None }),
        state: Some("ON".to_string()),
        created_at: Some(t0.to_rfc3339()),
        updated_at: None,
    });

    let mut panel = WorkPanel::new(MemoryBackend::with_raw(raw), PanelTuning::default());
    panel.refresh().await.unwrap();

    let live = panel.live_runs();
    assert_eq!(live.len(), 2);
    assert!(live.iter().all(|g| g.display_name != "Bracket"));
}

#[test]
fn test_grouping_properties_hold_on_mixed_snapshot() {
    let t0 = at("2024-03-01T06:00:00Z");
    let jobs = vec![
        job("1", "7", "Gear Housing", "Drilling", RunState::On, t0, None),
        job(
            "2",
            "7",
            "Gear Housing",
            "Drilling",
            RunState::On,
            t0 + Duration::minutes(30),
            None,
        ),
        job(
            "3",
            "7",
            "Gear Housing",
            "Milling 1",
            RunState::Off,
            t0 + Duration::hours(1),
            None,
        ),
        job(
            "4",
            "9",
            "Shaft",
            "Drilling",
            RunState::Off,
            t0 + Duration::hours(2),
            Some(t0 + Duration::hours(3)),
        ),
        job(
            "5",
            "9",
            "Shaft",
            "Drilling",
            RunState::On,
            t0 + Duration::hours(4),
            None,
        ),
    ];

    // Determinism.
    let groups = group_jobs(&jobs);
    assert_eq!(groups, group_jobs(&jobs));

    // Quantity conservation.
    let total: usize = groups.iter().map(|g| g.quantity()).sum();
    assert_eq!(total, jobs.len());

    // Disjointness across states for every (product, machine).
    for a in &groups {
        for b in &groups {
            if a.key != b.key {
                assert!(a.members.iter().all(|m| !b.members.contains(m)));
            }
        }
    }
}

#[test]
fn test_live_duration_is_monotonic() {
    let t0 = at("2024-03-01T08:00:00Z");
    let jobs = vec![job(
        "1",
        "7",
        "Gear Housing",
        "Drilling",
        RunState::On,
        t0,
        None,
    )];
    let groups = group_jobs(&jobs);

    let earlier = compute_timing(&groups[0], &jobs, t0 + Duration::minutes(1));
    let later = compute_timing(&groups[0], &jobs, t0 + Duration::minutes(2));
    assert!(later.duration_ms.unwrap() >= earlier.duration_ms.unwrap());
}

// Detail quantity must agree with the group it was opened from as long as
// the snapshot has not changed underneath.
#[tokio::test]
async fn test_detail_quantity_round_trip() {
    let t0 = at("2024-03-01T08:00:00Z");
    let jobs = vec![
        job("1", "7", "Gear Housing", "Drilling", RunState::On, t0, None),
        job(
            "2",
            "7",
            "Gear Housing",
            "Drilling",
            RunState::On,
            t0 + Duration::minutes(10),
            None,
        ),
        job(
            "3",
            "7",
            "Gear Housing",
            "Drilling",
            RunState::Off,
            t0 + Duration::hours(1),
            None,
        ),
    ];

    let mut panel = panel_over(jobs).await;
    for key in [
        panel.live_runs()[0].key.clone(),
        panel.past_runs()[0].key.clone(),
    ] {
        assert!(panel.select(key));
        let group_quantity = panel.selected_group().unwrap().quantity();
        assert_eq!(panel.detail().unwrap().quantity, group_quantity);
        panel.close_detail();
    }
}

// Full happy path: select a live run, retire it, watch the panel flip it to
// the past view with a success notice and no lingering selection.
#[tokio::test]
async fn test_move_to_past_happy_path() {
    let t0 = at("2024-03-01T08:00:00Z");
    let jobs = vec![job(
        "1",
        "7",
        "Gear Housing",
        "Drilling",
        RunState::On,
        t0,
        None,
    )];

    let mut panel = panel_over(jobs).await;
    let key = panel.live_runs()[0].key.clone();
    assert!(panel.select(key));

    panel.move_selected_to_past().await;

    let notice = panel.notice().expect("success notice expected");
    assert_eq!(notice.kind, NoticeKind::Success);
    assert_eq!(notice.text, MSG_MOVED_TO_PAST);

    assert!(panel.selected_group().is_none());
    assert!(panel.live_runs().is_empty());
    assert_eq!(panel.past_runs().len(), 1);
    assert_eq!(panel.backend().transition_calls(), 1);

    panel.set_view(PanelView::Past);
    assert!(panel.render().contains("Gear Housing"));
}

// A rejecting sink leaves the panel exactly where it was, apart from the
// error notice.
#[tokio::test]
async fn test_rejected_transition_leaves_state_unchanged() {
    let t0 = at("2024-03-01T08:00:00Z");
    let jobs = vec![job(
        "1",
        "7",
        "Gear Housing",
        "Drilling",
        RunState::On,
        t0,
        None,
    )];

    let mut panel = panel_over(jobs).await;
    panel.backend().set_reject_transitions(true);
    let key = panel.live_runs()[0].key.clone();
    assert!(panel.select(key));

    panel.move_selected_to_past().await;

    let notice = panel.notice().expect("error notice expected");
    assert_eq!(notice.kind, NoticeKind::Error);
    assert_eq!(notice.text, MSG_MOVE_FAILED);

    // Still live, still selected, exactly one sink attempt.
    assert_eq!(panel.live_runs().len(), 1);
    assert!(panel.selected_group().is_some());
    assert_eq!(panel.backend().transition_calls(), 1);
}

// Repeating a move after a not-found result reports not-found again rather
// than silently succeeding.
#[tokio::test]
async fn test_repeated_move_after_not_found_reports_again() {
    let t0 = at("2024-03-01T08:00:00Z");
    let stale = vec![job(
        "1",
        "7",
        "Gear Housing",
        "Drilling",
        RunState::On,
        t0,
        None,
    )];
    // Backend only knows the retired version of the record.
    let retired = RawJob {
        state: Some("OFF".to_string()),
        ..RawJob::from(&stale[0])
    };
    let backend = MemoryBackend::with_raw(vec![retired]);

    let run = group_jobs(&stale)
        .into_iter()
        .find(|g| g.is_live())
        .unwrap();

    for _ in 0..2 {
        let err = runpanel::lifecycle::move_to_past(&backend, &run)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            runpanel::lifecycle::TransitionError::RecordNotFound { .. }
        ));
    }
    assert_eq!(backend.transition_calls(), 0);
}

// Three interleaved cycles on one machine: the finished view tracks the most
// recent cycle.
#[tokio::test]
async fn test_interleaved_cycles_track_latest() {
    let t0 = at("2024-03-01T06:00:00Z");
    let jobs = vec![
        job("1", "7", "Gear Housing", "Drilling", RunState::On, t0, None),
        job(
            "2",
            "7",
            "Gear Housing",
            "Drilling",
            RunState::Off,
            t0 + Duration::hours(1),
            None,
        ),
        job(
            "3",
            "7",
            "Gear Housing",
            "Drilling",
            RunState::On,
            t0 + Duration::hours(2),
            None,
        ),
        job(
            "4",
            "7",
            "Gear Housing",
            "Drilling",
            RunState::Off,
            t0 + Duration::hours(2) + Duration::minutes(45),
            None,
        ),
        job(
            "5",
            "7",
            "Gear Housing",
            "Drilling",
            RunState::On,
            t0 + Duration::hours(4),
            None,
        ),
        job(
            "6",
            "7",
            "Gear Housing",
            "Drilling",
            RunState::Off,
            t0 + Duration::hours(4) + Duration::minutes(15),
            None,
        ),
    ];

    let panel = panel_over(jobs).await;
    let timing = panel.timing_for(panel.past_runs()[0]);
    assert_eq!(timing.to_string(), "Final: 00:15:00");
}

// The snapshot path used by the panel is the same validation path exposed to
// callers: raw wire records in, well-formed domain records out.
#[tokio::test]
async fn test_wire_snapshot_matches_domain_snapshot() {
    let t0 = at("2024-03-01T08:00:00Z");
    let jobs = vec![job(
        "1",
        "7",
        "Gear Housing",
        "Drilling",
        RunState::On,
        t0,
        None,
    )];
    let backend = MemoryBackend::new(jobs.clone());

    use runpanel::source::JobSource;
    let raw = backend.fetch_jobs().await.unwrap();
    assert_eq!(well_formed_records(raw), jobs);
}
