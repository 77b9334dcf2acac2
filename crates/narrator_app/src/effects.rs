use std::path::PathBuf;
use std::time::Duration;

use narrator_core::{AudioLocator, Effect, Msg};
use narrator_engine::{DownloadError, EngineError, EngineEvent, EngineHandle};
use narrator_logging::{narrator_debug, narrator_info, narrator_warn};

/// What the engine hands back to the dispatch loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    Msg(Msg),
    Downloaded(Result<PathBuf, DownloadError>),
}

pub struct EffectRunner {
    engine: EngineHandle,
}

impl EffectRunner {
    pub fn new(engine: EngineHandle) -> Self {
        Self { engine }
    }

    pub fn enqueue(&self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::FetchModels => {
                    narrator_debug!("FetchModels");
                    self.engine.fetch_models();
                }
                Effect::ExtractText { path } => {
                    narrator_info!("ExtractText path={:?}", path);
                    self.engine.extract_text(path);
                }
                Effect::SubmitJob { token, request } => {
                    narrator_info!(
                        "SubmitJob token={} model={} text_len={}",
                        token,
                        request.model_id(),
                        request.text().len()
                    );
                    self.engine.submit(token, request);
                }
                Effect::OpenProgress { token, job_id } => {
                    narrator_info!("OpenProgress token={} job_id={}", token, job_id);
                    self.engine.open_progress(token, job_id);
                }
                Effect::CloseProgress { token } => {
                    narrator_debug!("CloseProgress token={}", token);
                    self.engine.close_progress(token);
                }
            }
        }
    }

    pub fn download(&self, locator: AudioLocator, dir: PathBuf) {
        narrator_info!("Download url={} dir={:?}", locator.url, dir);
        self.engine.download(locator, dir);
    }

    /// Waits up to `timeout` for the next engine result.
    pub fn next(&self, timeout: Duration) -> Result<Option<Inbound>, EngineError> {
        Ok(self.engine.recv_timeout(timeout)?.map(map_event))
    }
}

pub fn map_event(event: EngineEvent) -> Inbound {
    let msg = match event {
        EngineEvent::ModelsFetched(Ok(entries)) => Msg::ModelsLoaded(entries),
        EngineEvent::ModelsFetched(Err(err)) => {
            narrator_warn!("Model catalog unavailable: {}", err);
            Msg::CatalogUnavailable(err.reason)
        }
        EngineEvent::TextExtracted(Ok(text)) => Msg::TextExtracted(text),
        EngineEvent::TextExtracted(Err(err)) => Msg::ExtractionFailed(err.to_string()),
        EngineEvent::Submitted {
            token,
            result: Ok(handle),
        } => Msg::JobSubmitted { token, handle },
        EngineEvent::Submitted {
            token,
            result: Err(err),
        } => Msg::SubmissionFailed {
            token,
            message: err.to_string(),
        },
        EngineEvent::Progress { token, event } => Msg::ProgressReceived { token, event },
        EngineEvent::ChannelClosed { token } => Msg::ChannelClosed { token },
        EngineEvent::ArtifactDownloaded(result) => return Inbound::Downloaded(result),
    };
    Inbound::Msg(msg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use narrator_core::JobHandle;
    use narrator_engine::{CatalogUnavailable, HttpDetail, SubmissionError};

    #[test]
    fn submission_errors_carry_their_display_text() {
        let inbound = map_event(EngineEvent::Submitted {
            token: 4,
            result: Err(SubmissionError::HttpStatus {
                status: 422,
                detail: HttpDetail(Some("text is required".to_string())),
            }),
        });

        assert_eq!(
            inbound,
            Inbound::Msg(Msg::SubmissionFailed {
                token: 4,
                message: "generation request rejected (http 422): text is required".to_string(),
            })
        );
    }

    #[test]
    fn catalog_failure_keeps_reason() {
        let inbound = map_event(EngineEvent::ModelsFetched(Err(CatalogUnavailable {
            reason: "http status 500".to_string(),
        })));

        assert_eq!(
            inbound,
            Inbound::Msg(Msg::CatalogUnavailable("http status 500".to_string()))
        );
    }

    #[test]
    fn submitted_and_downloaded_map_through() {
        assert_eq!(
            map_event(EngineEvent::Submitted {
                token: 1,
                result: Ok(JobHandle::new("job-1")),
            }),
            Inbound::Msg(Msg::JobSubmitted {
                token: 1,
                handle: JobHandle::new("job-1"),
            })
        );
        assert_eq!(
            map_event(EngineEvent::ArtifactDownloaded(Err(DownloadError::Timeout))),
            Inbound::Downloaded(Err(DownloadError::Timeout))
        );
    }
}
