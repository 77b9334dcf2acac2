use std::path::Path;
use std::time::Duration;

use narrator_logging::narrator_info;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;

use crate::types::error_detail;
use crate::{ExtractionError, ServiceEndpoints};

/// Document types the extraction service accepts.
pub const SUPPORTED_EXTENSIONS: &[&str] = &["pdf", "epub", "txt"];

/// Turns a document into plain text via the extraction service.
#[async_trait::async_trait]
pub trait TextExtractor: Send + Sync {
    async fn extract(&self, path: &Path) -> Result<String, ExtractionError>;
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    text: String,
}

#[derive(Debug, Clone)]
pub struct ReqwestTextExtractor {
    client: reqwest::Client,
    endpoints: ServiceEndpoints,
    timeout: Duration,
}

impl ReqwestTextExtractor {
    pub fn new(client: reqwest::Client, endpoints: ServiceEndpoints, timeout: Duration) -> Self {
        Self {
            client,
            endpoints,
            timeout,
        }
    }
}

#[async_trait::async_trait]
impl TextExtractor for ReqwestTextExtractor {
    async fn extract(&self, path: &Path) -> Result<String, ExtractionError> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        if !SUPPORTED_EXTENSIONS.contains(&extension.as_str()) {
            return Err(ExtractionError::UnsupportedFileType(extension));
        }
        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("document")
            .to_string();

        let bytes = tokio::fs::read(path)
            .await
            .map_err(|err| ExtractionError::Io(format!("{}: {}", path.display(), err)))?;
        let byte_len = bytes.len();
        let form = Form::new().part("file", Part::bytes(bytes).file_name(file_name));

        let response = self
            .client
            .post(self.endpoints.upload())
            .timeout(self.timeout)
            .multipart(form)
            .send()
            .await
            .map_err(|err| {
                if err.is_timeout() {
                    ExtractionError::Timeout
                } else {
                    ExtractionError::Network(err.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ExtractionError::HttpStatus {
                status: status.as_u16(),
                detail: error_detail(response).await,
            });
        }
        let parsed: UploadResponse = response
            .json()
            .await
            .map_err(|err| ExtractionError::MalformedResponse(err.to_string()))?;

        narrator_info!(
            "extracted {} chars from {} ({} bytes uploaded)",
            parsed.text.chars().count(),
            path.display(),
            byte_len
        );
        Ok(parsed.text)
    }
}
