//! In-memory backend used by the test suites.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use chrono::Utc;
use tokio::sync::Mutex;

use crate::jobs::{JobRecord, RawJob};

use super::{JobSource, LifecycleSink, SourceError, TransitionRequest};

/// Backend holding its job table in memory.
///
/// Snapshots are served from the table; move-to-past flips the matching
/// record to OFF and stamps its update time, mirroring what the real
/// backend does. Failure injection toggles cover the outage and rejection
/// paths.
pub struct MemoryBackend {
    jobs: Mutex<Vec<RawJob>>,
    fail_fetches: AtomicBool,
    reject_transitions: AtomicBool,
    transition_calls: AtomicUsize,
}

impl MemoryBackend {
    pub fn new(jobs: Vec<JobRecord>) -> Self {
        Self::with_raw(jobs.iter().map(RawJob::from).collect())
    }

    /// Seed with raw records, malformed ones included.
    pub fn with_raw(jobs: Vec<RawJob>) -> Self {
        Self {
            jobs: Mutex::new(jobs),
            fail_fetches: AtomicBool::new(false),
            reject_transitions: AtomicBool::new(false),
            transition_calls: AtomicUsize::new(0),
        }
    }

    /// Make every subsequent fetch fail as if the backend were down.
    pub fn set_fail_fetches(&self, fail: bool) {
        self.fail_fetches.store(fail, Ordering::SeqCst);
    }

    /// Make every subsequent transition come back rejected.
    pub fn set_reject_transitions(&self, reject: bool) {
        self.reject_transitions.store(reject, Ordering::SeqCst);
    }

    /// How many transition requests reached this backend.
    pub fn transition_calls(&self) -> usize {
        self.transition_calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl JobSource for MemoryBackend {
    async fn fetch_jobs(&self) -> Result<Vec<RawJob>, SourceError> {
        if self.fail_fetches.load(Ordering::SeqCst) {
            return Err(SourceError::Unavailable {
                reason: "simulated outage".to_string(),
            });
        }
        Ok(self.jobs.lock().await.clone())
    }
}

#[async_trait::async_trait]
impl LifecycleSink for MemoryBackend {
    async fn move_to_past(&self, request: &TransitionRequest) -> Result<(), SourceError> {
        self.transition_calls.fetch_add(1, Ordering::SeqCst);

        if self.reject_transitions.load(Ordering::SeqCst) {
            return Err(SourceError::Rejected { status: 409 });
        }

        let mut jobs = self.jobs.lock().await;
        let target = jobs
            .iter_mut()
            .find(|raw| raw.id.as_deref() == Some(request.job_id.as_str()));
        match target {
            Some(raw) => {
                raw.state = Some("OFF".to_string());
                raw.updated_at = Some(Utc::now().to_rfc3339());
                Ok(())
            }
            None => Err(SourceError::Rejected { status: 404 }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::{well_formed_records, MachineRef, ProductRef, RunState};

    fn live_job(id: &str) -> JobRecord {
        JobRecord {
            id: id.to_string(),
            product: ProductRef {
                id: "7".to_string(),
                name: "Gear Housing".to_string(),
            },
            machine: MachineRef {
                name: "Drilling".to_string(),
            },
            state: RunState::On,
            created_at: "2024-03-01T08:00:00Z".parse().unwrap(),
            updated_at: None,
        }
    }

    #[test]
    fn test_transition_flips_state_and_counts_call() {
        let backend = MemoryBackend::new(vec![live_job("42")]);

        tokio_test::block_on(async {
            let request = TransitionRequest::move_to_past("7", "42");
            backend.move_to_past(&request).await.unwrap();

            let raw = backend.fetch_jobs().await.unwrap();
            let records = well_formed_records(raw);
            assert_eq!(records[0].state, RunState::Off);
            assert!(records[0].updated_at.is_some());
        });
        assert_eq!(backend.transition_calls(), 1);
    }

    #[test]
    fn test_unknown_job_is_rejected() {
        let backend = MemoryBackend::new(vec![live_job("42")]);

        tokio_test::block_on(async {
            let request = TransitionRequest::move_to_past("7", "99");
            let err = backend.move_to_past(&request).await.unwrap_err();
            assert!(matches!(err, SourceError::Rejected { status: 404 }));
        });
    }

    #[test]
    fn test_fetch_outage_is_switchable() {
        let backend = MemoryBackend::new(vec![live_job("42")]);
        backend.set_fail_fetches(true);

        tokio_test::block_on(async {
            let err = backend.fetch_jobs().await.unwrap_err();
            assert!(matches!(err, SourceError::Unavailable { .. }));

            backend.set_fail_fetches(false);
            assert_eq!(backend.fetch_jobs().await.unwrap().len(), 1);
        });
    }
}
