//! Backend seam: where job snapshots come from and where lifecycle
//! transitions go.
//!
//! The panel only ever talks to these two traits. The production backend is
//! [`http::HttpBackend`]; [`memory::MemoryBackend`] backs the test suites.

pub mod http;
pub mod memory;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::jobs::RawJob;

/// Lifecycle action verb understood by the backend.
pub const ACTION_MOVE_TO_PAST: &str = "move_to_past";

/// Audit reason recorded for panel-initiated transitions.
pub const REASON_WORKPANEL: &str = "manually_moved_from_workpanel";

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("job source unavailable: {reason}")]
    Unavailable { reason: String },

    #[error("job source returned status {status}")]
    BadStatus { status: u16 },

    #[error("could not decode job payload: {reason}")]
    Decode { reason: String },

    #[error("lifecycle sink rejected the transition with status {status}")]
    Rejected { status: u16 },
}

/// Envelope the jobs endpoint wraps its records in.
#[derive(Debug, Deserialize)]
pub struct JobsResponse {
    #[serde(default)]
    pub jobs: Vec<RawJob>,
}

/// Body posted to the lifecycle endpoint for a move-to-past transition.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TransitionRequest {
    #[serde(rename = "productId")]
    pub product_id: String,
    #[serde(rename = "jobId")]
    pub job_id: String,
    pub action: String,
    pub reason: String,
}

impl TransitionRequest {
    /// Move-to-past request for one job, carrying the panel audit reason.
    pub fn move_to_past(product_id: &str, job_id: &str) -> Self {
        Self {
            product_id: product_id.to_string(),
            job_id: job_id.to_string(),
            action: ACTION_MOVE_TO_PAST.to_string(),
            reason: REASON_WORKPANEL.to_string(),
        }
    }
}

/// Read side: fetch the current job snapshot.
#[async_trait::async_trait]
pub trait JobSource: Send + Sync {
    /// Fetch every job record the backend currently knows about, live and
    /// finished alike. Records come back raw; callers validate them.
    async fn fetch_jobs(&self) -> Result<Vec<RawJob>, SourceError>;
}

/// Write side: apply lifecycle transitions.
#[async_trait::async_trait]
pub trait LifecycleSink: Send + Sync {
    /// Ask the backend to retire the job named in `request`.
    async fn move_to_past(&self, request: &TransitionRequest) -> Result<(), SourceError>;
}
