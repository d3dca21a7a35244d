//! HTTP backend for the job source and lifecycle sink.

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::Client;

use crate::config::SourceConfig;
use crate::jobs::RawJob;

use super::{JobSource, JobsResponse, LifecycleSink, SourceError, TransitionRequest};

/// Talks to the shop-floor backend over HTTP.
///
/// `base_url` is the API root (for example `http://127.0.0.1:3000/api`);
/// endpoints are joined beneath it.
pub struct HttpBackend {
    client: Client,
    base_url: String,
}

impl HttpBackend {
    pub fn new(config: &SourceConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("building HTTP client for job source")?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }
}

#[async_trait::async_trait]
impl JobSource for HttpBackend {
    async fn fetch_jobs(&self) -> Result<Vec<RawJob>, SourceError> {
        let url = self.endpoint("jobs");
        tracing::debug!(%url, "fetching job snapshot");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| SourceError::Unavailable {
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::BadStatus {
                status: status.as_u16(),
            });
        }

        let payload: JobsResponse =
            response.json().await.map_err(|e| SourceError::Decode {
                reason: e.to_string(),
            })?;
        Ok(payload.jobs)
    }
}

#[async_trait::async_trait]
impl LifecycleSink for HttpBackend {
    async fn move_to_past(&self, request: &TransitionRequest) -> Result<(), SourceError> {
        let url = self.endpoint("products/lifecycle");
        tracing::debug!(%url, product_id = %request.product_id, job_id = %request.job_id, "posting lifecycle transition");

        let response = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|e| SourceError::Unavailable {
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Rejected {
                status: status.as_u16(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_joins_without_double_slash() {
        let config = SourceConfig {
            base_url: "http://127.0.0.1:3000/api/".to_string(),
            timeout_secs: 5,
        };
        let backend = HttpBackend::new(&config).unwrap();
        assert_eq!(backend.endpoint("jobs"), "http://127.0.0.1:3000/api/jobs");
        assert_eq!(
            backend.endpoint("products/lifecycle"),
            "http://127.0.0.1:3000/api/products/lifecycle"
        );
    }
}
