use std::collections::VecDeque;
use std::fmt;

use bytes::Bytes;
use futures_util::stream::{BoxStream, Stream, StreamExt};
use narrator_core::ProgressEvent;
use narrator_logging::{narrator_debug, narrator_info, narrator_warn};
use reqwest::header::ACCEPT;
use tokio_util::sync::CancellationToken;

use crate::decode::decode_progress_event;
use crate::sse::SseDecoder;
use crate::{ChannelOpenError, ServiceEndpoints};

/// Opens progress subscriptions for jobs.
#[async_trait::async_trait]
pub trait ProgressSource: Send + Sync {
    /// Cancelling `cancel` aborts the open and closes the resulting channel.
    async fn open(
        &self,
        job_id: &str,
        cancel: CancellationToken,
    ) -> Result<ProgressChannel, ChannelOpenError>;
}

/// One job's progress subscription.
///
/// Yields events in delivery order until a terminal event, transport closure
/// or [`ProgressChannel::close`]. Messages that fail to decode are dropped.
pub struct ProgressChannel {
    job_id: String,
    body: Option<BoxStream<'static, Result<Bytes, String>>>,
    decoder: SseDecoder,
    pending: VecDeque<ProgressEvent>,
    cancel: CancellationToken,
    terminal_seen: bool,
}

impl fmt::Debug for ProgressChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProgressChannel")
            .field("job_id", &self.job_id)
            .field("open", &self.body.is_some())
            .field("terminal_seen", &self.terminal_seen)
            .finish()
    }
}

impl ProgressChannel {
    /// Wraps a raw `text/event-stream` body.
    pub fn from_stream<S, E>(job_id: impl Into<String>, body: S, cancel: CancellationToken) -> Self
    where
        S: Stream<Item = Result<Bytes, E>> + Send + 'static,
        E: fmt::Display,
    {
        let body = body.map(|chunk| chunk.map_err(|err| err.to_string())).boxed();
        Self {
            job_id: job_id.into(),
            body: Some(body),
            decoder: SseDecoder::new(),
            pending: VecDeque::new(),
            cancel,
            terminal_seen: false,
        }
    }

    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    /// Next decoded event; `None` once the channel has ended for any reason.
    pub async fn next(&mut self) -> Option<ProgressEvent> {
        loop {
            if let Some(event) = self.pending.pop_front() {
                if event.is_terminal() {
                    self.terminal_seen = true;
                    self.shutdown();
                }
                return Some(event);
            }

            let chunk = {
                let body = self.body.as_mut()?;
                tokio::select! {
                    biased;
                    _ = self.cancel.cancelled() => None,
                    chunk = body.next() => Some(chunk),
                }
            };

            match chunk {
                None => {
                    self.shutdown();
                    return None;
                }
                Some(None) => {
                    narrator_debug!("progress stream for job {} ended", self.job_id);
                    self.shutdown();
                    return None;
                }
                Some(Some(Err(err))) => {
                    narrator_warn!("progress stream for job {} failed: {}", self.job_id, err);
                    self.shutdown();
                    return None;
                }
                Some(Some(Ok(bytes))) => self.decode_chunk(&bytes),
            }
        }
    }

    /// True once a `complete` or `error` event has been yielded.
    pub fn ended_with_result(&self) -> bool {
        self.terminal_seen
    }

    /// Stops the channel. Safe to call any number of times, in any state.
    pub fn close(&mut self) {
        self.cancel.cancel();
        self.shutdown();
    }

    fn decode_chunk(&mut self, bytes: &[u8]) {
        for payload in self.decoder.feed(bytes) {
            match decode_progress_event(&payload) {
                Ok(event) => self.pending.push_back(event),
                Err(err) => {
                    narrator_debug!("dropping progress message for job {}: {}", self.job_id, err)
                }
            }
        }
    }

    fn shutdown(&mut self) {
        self.body = None;
        self.pending.clear();
    }
}

#[derive(Debug, Clone)]
pub struct ReqwestProgressSource {
    client: reqwest::Client,
    endpoints: ServiceEndpoints,
}

impl ReqwestProgressSource {
    /// `client` must not carry a total request timeout; jobs run indefinitely.
    pub fn new(client: reqwest::Client, endpoints: ServiceEndpoints) -> Self {
        Self { client, endpoints }
    }
}

#[async_trait::async_trait]
impl ProgressSource for ReqwestProgressSource {
    async fn open(
        &self,
        job_id: &str,
        cancel: CancellationToken,
    ) -> Result<ProgressChannel, ChannelOpenError> {
        let url = self.endpoints.progress(job_id);
        let request = self
            .client
            .get(url)
            .header(ACCEPT, "text/event-stream")
            .send();

        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(ChannelOpenError::Cancelled),
            response = request => response.map_err(|err| {
                if err.is_timeout() {
                    ChannelOpenError::Timeout
                } else {
                    ChannelOpenError::Network(err.to_string())
                }
            })?,
        };

        let status = response.status();
        if !status.is_success() {
            return Err(ChannelOpenError::HttpStatus(status.as_u16()));
        }

        narrator_info!("progress stream opened for job {}", job_id);
        Ok(ProgressChannel::from_stream(
            job_id,
            response.bytes_stream(),
            cancel,
        ))
    }
}
