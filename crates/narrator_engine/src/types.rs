use std::fmt;
use std::path::PathBuf;

use narrator_core::{GenerationToken, JobHandle, ModelEntry, ProgressEvent};
use thiserror::Error;

/// Results the engine reports back to the caller's thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    ModelsFetched(Result<Vec<ModelEntry>, CatalogUnavailable>),
    TextExtracted(Result<String, ExtractionError>),
    Submitted {
        token: GenerationToken,
        result: Result<JobHandle, SubmissionError>,
    },
    Progress {
        token: GenerationToken,
        event: ProgressEvent,
    },
    /// The progress transport ended (or never opened) without a terminal event.
    ChannelClosed {
        token: GenerationToken,
    },
    ArtifactDownloaded(Result<PathBuf, DownloadError>),
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid settings: {0}")]
    InvalidSettings(String),
    #[error("failed to build http client: {0}")]
    Client(String),
    #[error("failed to start engine runtime: {0}")]
    Runtime(#[from] std::io::Error),
    #[error("engine thread stopped")]
    Stopped,
}

/// Server rejection detail, taken from a `{"detail": ...}` body when present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpDetail(pub Option<String>);

impl fmt::Display for HttpDetail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Some(detail) => write!(f, ": {detail}"),
            None => Ok(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmissionError {
    #[error("could not reach the generation service: {0}")]
    Network(String),
    #[error("generation request timed out")]
    Timeout,
    #[error("generation request rejected (http {status}){detail}")]
    HttpStatus { status: u16, detail: HttpDetail },
    #[error("unexpected response from the generation service: {0}")]
    MalformedResponse(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("model catalog unavailable: {reason}")]
pub struct CatalogUnavailable {
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractionError {
    #[error("unsupported file type {0:?} (expected pdf, epub or txt)")]
    UnsupportedFileType(String),
    #[error("could not read document: {0}")]
    Io(String),
    #[error("could not reach the extraction service: {0}")]
    Network(String),
    #[error("extraction request timed out")]
    Timeout,
    #[error("extraction failed (http {status}){detail}")]
    HttpStatus { status: u16, detail: HttpDetail },
    #[error("unexpected response from the extraction service: {0}")]
    MalformedResponse(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChannelOpenError {
    #[error("closed before the channel opened")]
    Cancelled,
    #[error("could not reach the progress stream: {0}")]
    Network(String),
    #[error("progress stream connect timed out")]
    Timeout,
    #[error("progress stream rejected (http {0})")]
    HttpStatus(u16),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DownloadError {
    #[error("could not download audio: {0}")]
    Network(String),
    #[error("audio download timed out")]
    Timeout,
    #[error("audio download failed (http {0})")]
    HttpStatus(u16),
    #[error("audio too large (max {max_bytes} bytes, got at least {actual})")]
    TooLarge { max_bytes: u64, actual: u64 },
    #[error("could not save audio: {0}")]
    Persist(String),
}

/// Reads `{"detail": "..."}` from an error response, FastAPI style.
pub(crate) async fn error_detail(response: reqwest::Response) -> HttpDetail {
    let detail = response
        .json::<serde_json::Value>()
        .await
        .ok()
        .and_then(|body| {
            body.get("detail")
                .and_then(|detail| detail.as_str())
                .map(ToOwned::to_owned)
        });
    HttpDetail(detail)
}
