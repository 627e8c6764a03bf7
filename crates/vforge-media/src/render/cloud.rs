//! Cloud timeline render backend.
//!
//! Submits the render plan as JSON to a remote timeline service, polls
//! the job with backoff until it completes, then downloads the result.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;
use serde::Deserialize;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};
use url::Url;
use vforge_models::RenderPlan;

use crate::error::BackendError;
use crate::render::RenderBackend;

const INITIAL_POLL_SECS: u64 = 2;
const MAX_POLL_SECS: u64 = 30;

#[derive(Debug, Deserialize)]
struct RenderJob {
    id: String,
    status: JobStatus,
    #[serde(default)]
    output_url: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
enum JobStatus {
    Queued,
    Processing,
    Complete,
    Failed,
}

pub struct CloudTimelineBackend {
    client: Client,
    base_url: Url,
    api_key: Option<String>,
    poll_timeout_secs: u64,
}

impl CloudTimelineBackend {
    pub fn new(base_url: Url, api_key: Option<String>, poll_timeout_secs: u64) -> Self {
        Self {
            client: Client::new(),
            base_url,
            api_key,
            poll_timeout_secs,
        }
    }

    fn request(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => builder.bearer_auth(key),
            None => builder,
        }
    }

    fn endpoint(&self, path: &str) -> Result<Url, BackendError> {
        self.base_url
            .join(path)
            .map_err(|e| BackendError::Protocol(format!("bad endpoint {path}: {e}")))
    }

    async fn submit(&self, plan: &RenderPlan) -> Result<RenderJob, BackendError> {
        let url = self.endpoint("v1/renders")?;
        let response = self
            .request(self.client.post(url).json(plan))
            .send()
            .await?
            .error_for_status()?;
        Ok(response.json().await?)
    }

    async fn poll(&self, job_id: &str) -> Result<RenderJob, BackendError> {
        let url = self.endpoint(&format!("v1/renders/{job_id}"))?;
        let response = self
            .request(self.client.get(url))
            .send()
            .await?
            .error_for_status()?;
        Ok(response.json().await?)
    }

    async fn wait_for_completion(&self, job_id: &str) -> Result<RenderJob, BackendError> {
        let mut waited = 0u64;
        let mut interval = INITIAL_POLL_SECS;
        loop {
            tokio::time::sleep(Duration::from_secs(interval)).await;
            waited += interval;
            interval = (interval * 2).min(MAX_POLL_SECS);

            let job = self.poll(job_id).await?;
            debug!(job = job_id, status = ?job.status, waited, "poll");
            match job.status {
                JobStatus::Complete => return Ok(job),
                JobStatus::Failed => {
                    return Err(BackendError::RemoteFailed {
                        job_id: job_id.to_string(),
                        message: job.error.unwrap_or_else(|| "no error detail".to_string()),
                    });
                }
                JobStatus::Queued | JobStatus::Processing => {
                    if waited >= self.poll_timeout_secs {
                        return Err(BackendError::PollTimeout {
                            job_id: job_id.to_string(),
                            waited_secs: waited,
                        });
                    }
                }
            }
        }
    }

    async fn download(&self, url: &str, output: &Path) -> Result<(), BackendError> {
        let response = self
            .request(self.client.get(url))
            .send()
            .await?
            .error_for_status()?;

        let mut file = tokio::fs::File::create(output).await?;
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            file.write_all(&chunk?).await?;
        }
        file.flush().await?;
        Ok(())
    }
}

#[async_trait]
impl RenderBackend for CloudTimelineBackend {
    async fn render(&self, plan: &RenderPlan, output: &Path) -> Result<(), BackendError> {
        plan.validate().map_err(BackendError::InvalidPlan)?;

        let job = self.submit(plan).await?;
        info!(job = %job.id, "render submitted");
        if job.status == JobStatus::Failed {
            return Err(BackendError::RemoteFailed {
                job_id: job.id,
                message: job.error.unwrap_or_else(|| "rejected on submit".to_string()),
            });
        }

        let done = match job.status {
            JobStatus::Complete => job,
            _ => self.wait_for_completion(&job.id).await?,
        };

        let output_url = done.output_url.ok_or_else(|| {
            BackendError::Protocol("complete job carries no output_url".to_string())
        })?;
        if let Err(err) = self.download(&output_url, output).await {
            warn!(job = %done.id, error = %err, "download failed");
            return Err(err);
        }
        info!(job = %done.id, output = %output.display(), "render downloaded");
        Ok(())
    }
}
