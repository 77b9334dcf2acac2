use std::time::Duration;

use narrator_core::{GenerationRequest, JobHandle};
use narrator_logging::narrator_info;
use serde::{Deserialize, Serialize};

use crate::types::error_detail;
use crate::{ServiceEndpoints, SubmissionError};

/// Creates generation jobs. Never touches client state.
#[async_trait::async_trait]
pub trait JobSubmitter: Send + Sync {
    async fn submit(&self, request: &GenerationRequest) -> Result<JobHandle, SubmissionError>;
}

#[derive(Debug, Serialize)]
struct GenerateBody<'a> {
    text: &'a str,
    model_id: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(alias = "job_id", alias = "jobId")]
    task_id: String,
}

#[derive(Debug, Clone)]
pub struct ReqwestJobSubmitter {
    client: reqwest::Client,
    endpoints: ServiceEndpoints,
    timeout: Duration,
}

impl ReqwestJobSubmitter {
    pub fn new(client: reqwest::Client, endpoints: ServiceEndpoints, timeout: Duration) -> Self {
        Self {
            client,
            endpoints,
            timeout,
        }
    }
}

#[async_trait::async_trait]
impl JobSubmitter for ReqwestJobSubmitter {
    async fn submit(&self, request: &GenerationRequest) -> Result<JobHandle, SubmissionError> {
        let body = GenerateBody {
            text: request.text(),
            model_id: request.model_id(),
        };
        let response = self
            .client
            .post(self.endpoints.generate())
            .timeout(self.timeout)
            .json(&body)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(SubmissionError::HttpStatus {
                status: status.as_u16(),
                detail: error_detail(response).await,
            });
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|err| SubmissionError::MalformedResponse(err.to_string()))?;
        let job_id = parsed.task_id.trim();
        if job_id.is_empty() {
            return Err(SubmissionError::MalformedResponse("empty job id".to_string()));
        }

        narrator_info!(
            "submitted job {} model={} text_len={}",
            job_id,
            request.model_id(),
            request.text().len()
        );
        Ok(JobHandle::new(job_id))
    }
}

fn map_reqwest_error(err: reqwest::Error) -> SubmissionError {
    if err.is_timeout() {
        return SubmissionError::Timeout;
    }
    SubmissionError::Network(err.to_string())
}
