//! Move-to-past transition flow.
//!
//! The panel holds a snapshot that may be stale by the time the operator
//! acts, so the transition re-fetches first and locates the target inside
//! the fresh snapshot. The sink is called at most once per invocation.

use thiserror::Error;

use crate::jobs::{well_formed_records, JobRecord, RunState};
use crate::runs::RunGroup;
use crate::source::{JobSource, LifecycleSink, SourceError, TransitionRequest};

#[derive(Debug, Error)]
pub enum TransitionError {
    #[error("run is {state}, only live runs can move to past")]
    NotLive { state: RunState },

    #[error("no live job record found for product {product_id}")]
    RecordNotFound { product_id: String },

    #[error("transition for product {product_id} was rejected")]
    SinkRejected {
        product_id: String,
        #[source]
        source: SourceError,
    },

    #[error(transparent)]
    Source(#[from] SourceError),
}

/// What a successful transition produced.
#[derive(Debug)]
pub struct TransitionOutcome {
    pub product_id: String,
    /// The record that was retired.
    pub job_id: String,
    /// Fresh snapshot fetched after the transition landed.
    pub jobs: Vec<JobRecord>,
}

/// Retire the live run's product: flip its job record to OFF on the backend.
///
/// Looks the record up by product id in a snapshot fetched on entry, taking
/// the first live record in snapshot order. Fetch failures surface as
/// [`TransitionError::Source`] before any sink call; a missing record means
/// the run already finished elsewhere and raises `RecordNotFound`, again
/// without touching the sink.
pub async fn move_to_past<B>(
    backend: &B,
    run: &RunGroup,
) -> Result<TransitionOutcome, TransitionError>
where
    B: JobSource + LifecycleSink + ?Sized,
{
    if !run.is_live() {
        return Err(TransitionError::NotLive { state: run.state() });
    }

    let product_id = &run.key.product_id;
    let snapshot = well_formed_records(backend.fetch_jobs().await?);

    let target = snapshot
        .iter()
        .find(|job| job.product.id == *product_id && job.state == RunState::On)
        .ok_or_else(|| TransitionError::RecordNotFound {
            product_id: product_id.clone(),
        })?;
    let job_id = target.id.clone();

    let request = TransitionRequest::move_to_past(product_id, &job_id);
    backend
        .move_to_past(&request)
        .await
        .map_err(|source| TransitionError::SinkRejected {
            product_id: product_id.clone(),
            source,
        })?;

    let jobs = well_formed_records(backend.fetch_jobs().await?);
    tracing::info!(%product_id, %job_id, "moved product to past");

    Ok(TransitionOutcome {
        product_id: product_id.clone(),
        job_id,
        jobs,
    })
}
