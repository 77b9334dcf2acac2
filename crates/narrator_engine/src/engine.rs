use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use narrator_core::{AudioLocator, GenerationRequest, GenerationToken};
use narrator_logging::{narrator_debug, narrator_info, narrator_warn};
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tokio_util::sync::CancellationToken;

use crate::{
    ArtifactDownloader, ChannelOpenError, EngineError, EngineEvent, EngineSettings, JobSubmitter,
    ModelCatalog, ProgressSource, ReqwestJobSubmitter, ReqwestModelCatalog, ReqwestProgressSource,
    ReqwestTextExtractor, TextExtractor,
};

/// The collaborators the engine drives.
#[derive(Clone)]
pub struct EngineServices {
    pub submitter: Arc<dyn JobSubmitter>,
    pub progress: Arc<dyn ProgressSource>,
    pub catalog: Arc<dyn ModelCatalog>,
    pub extractor: Arc<dyn TextExtractor>,
    pub downloader: ArtifactDownloader,
}

impl EngineServices {
    /// HTTP implementations sharing one connection pool.
    pub fn from_settings(settings: &EngineSettings) -> Result<Self, EngineError> {
        let endpoints = settings.endpoints()?;
        let client = settings.build_client()?;
        let timeout = settings.request_timeout;
        Ok(Self {
            submitter: Arc::new(ReqwestJobSubmitter::new(
                client.clone(),
                endpoints.clone(),
                timeout,
            )),
            progress: Arc::new(ReqwestProgressSource::new(client.clone(), endpoints.clone())),
            catalog: Arc::new(ReqwestModelCatalog::new(
                client.clone(),
                endpoints.clone(),
                timeout,
            )),
            extractor: Arc::new(ReqwestTextExtractor::new(client.clone(), endpoints, timeout)),
            downloader: ArtifactDownloader::new(client, settings.max_download_bytes),
        })
    }
}

enum EngineCommand {
    FetchModels,
    ExtractText {
        path: PathBuf,
    },
    Submit {
        token: GenerationToken,
        request: GenerationRequest,
    },
    OpenProgress {
        token: GenerationToken,
        job_id: String,
    },
    CloseProgress {
        token: GenerationToken,
    },
    Download {
        locator: AudioLocator,
        dir: PathBuf,
    },
}

/// Handle to the IO thread.
///
/// All IO runs cooperatively on one current-thread tokio runtime. Results come
/// back as [`EngineEvent`]s. Dropping every clone of the handle stops the
/// thread and closes any open progress channel.
#[derive(Clone)]
pub struct EngineHandle {
    cmd_tx: UnboundedSender<EngineCommand>,
    event_rx: Arc<Mutex<mpsc::Receiver<EngineEvent>>>,
}

impl EngineHandle {
    pub fn new(settings: &EngineSettings) -> Result<Self, EngineError> {
        Self::with_services(EngineServices::from_settings(settings)?)
    }

    pub fn with_services(services: EngineServices) -> Result<Self, EngineError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        let (cmd_tx, cmd_rx) = unbounded_channel();
        let (event_tx, event_rx) = mpsc::channel();

        thread::Builder::new()
            .name("narrator-engine".to_string())
            .spawn(move || {
                runtime.block_on(run_commands(services, cmd_rx, event_tx));
            })?;

        Ok(Self {
            cmd_tx,
            event_rx: Arc::new(Mutex::new(event_rx)),
        })
    }

    pub fn fetch_models(&self) {
        self.send(EngineCommand::FetchModels);
    }

    pub fn extract_text(&self, path: impl Into<PathBuf>) {
        self.send(EngineCommand::ExtractText { path: path.into() });
    }

    pub fn submit(&self, token: GenerationToken, request: GenerationRequest) {
        self.send(EngineCommand::Submit { token, request });
    }

    pub fn open_progress(&self, token: GenerationToken, job_id: impl Into<String>) {
        self.send(EngineCommand::OpenProgress {
            token,
            job_id: job_id.into(),
        });
    }

    /// Idempotent; unknown tokens are ignored.
    pub fn close_progress(&self, token: GenerationToken) {
        self.send(EngineCommand::CloseProgress { token });
    }

    pub fn download(&self, locator: AudioLocator, dir: impl Into<PathBuf>) {
        self.send(EngineCommand::Download {
            locator,
            dir: dir.into(),
        });
    }

    pub fn try_recv(&self) -> Option<EngineEvent> {
        self.event_rx.lock().ok()?.try_recv().ok()
    }

    /// `Ok(None)` on timeout; `Err(EngineError::Stopped)` once the engine thread is gone.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<Option<EngineEvent>, EngineError> {
        let event_rx = self.event_rx.lock().map_err(|_| EngineError::Stopped)?;
        match event_rx.recv_timeout(timeout) {
            Ok(event) => Ok(Some(event)),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => Err(EngineError::Stopped),
        }
    }

    fn send(&self, command: EngineCommand) {
        if self.cmd_tx.send(command).is_err() {
            narrator_warn!("engine thread is gone; command dropped");
        }
    }
}

async fn run_commands(
    services: EngineServices,
    mut cmd_rx: UnboundedReceiver<EngineCommand>,
    event_tx: mpsc::Sender<EngineEvent>,
) {
    let mut channels: HashMap<GenerationToken, CancellationToken> = HashMap::new();

    while let Some(command) = cmd_rx.recv().await {
        handle_command(&services, &mut channels, command, &event_tx);
    }

    for (_, cancel) in channels.drain() {
        cancel.cancel();
    }
    narrator_debug!("engine command loop stopped");
}

fn handle_command(
    services: &EngineServices,
    channels: &mut HashMap<GenerationToken, CancellationToken>,
    command: EngineCommand,
    event_tx: &mpsc::Sender<EngineEvent>,
) {
    let event_tx = event_tx.clone();
    match command {
        EngineCommand::FetchModels => {
            let catalog = services.catalog.clone();
            tokio::spawn(async move {
                let result = catalog.fetch_all().await;
                let _ = event_tx.send(EngineEvent::ModelsFetched(result));
            });
        }
        EngineCommand::ExtractText { path } => {
            let extractor = services.extractor.clone();
            tokio::spawn(async move {
                let result = extractor.extract(&path).await;
                let _ = event_tx.send(EngineEvent::TextExtracted(result));
            });
        }
        EngineCommand::Submit { token, request } => {
            let submitter = services.submitter.clone();
            tokio::spawn(async move {
                let result = submitter.submit(&request).await;
                if let Err(err) = &result {
                    narrator_warn!("submission for attempt {} failed: {}", token, err);
                }
                let _ = event_tx.send(EngineEvent::Submitted { token, result });
            });
        }
        EngineCommand::OpenProgress { token, job_id } => {
            let cancel = CancellationToken::new();
            if let Some(previous) = channels.insert(token, cancel.clone()) {
                previous.cancel();
            }
            let source = services.progress.clone();
            tokio::spawn(stream_progress(source, token, job_id, cancel, event_tx));
        }
        EngineCommand::CloseProgress { token } => {
            if let Some(cancel) = channels.remove(&token) {
                cancel.cancel();
                narrator_debug!("closed progress channel for attempt {}", token);
            }
        }
        EngineCommand::Download { locator, dir } => {
            let downloader = services.downloader.clone();
            tokio::spawn(async move {
                let result = downloader.download(&locator, &dir).await;
                let _ = event_tx.send(EngineEvent::ArtifactDownloaded(result));
            });
        }
    }
}

async fn stream_progress(
    source: Arc<dyn ProgressSource>,
    token: GenerationToken,
    job_id: String,
    cancel: CancellationToken,
    event_tx: mpsc::Sender<EngineEvent>,
) {
    let mut channel = match source.open(&job_id, cancel.clone()).await {
        Ok(channel) => channel,
        Err(ChannelOpenError::Cancelled) => return,
        Err(err) => {
            narrator_warn!("could not open progress for job {}: {}", job_id, err);
            let _ = event_tx.send(EngineEvent::ChannelClosed { token });
            return;
        }
    };

    while let Some(event) = channel.next().await {
        if event_tx
            .send(EngineEvent::Progress { token, event })
            .is_err()
        {
            channel.close();
            return;
        }
    }

    if channel.ended_with_result() || cancel.is_cancelled() {
        return;
    }
    narrator_info!("progress for job {} ended without a result", job_id);
    let _ = event_tx.send(EngineEvent::ChannelClosed { token });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handle_with_dead_thread() -> EngineHandle {
        let (cmd_tx, _cmd_rx) = unbounded_channel();
        let (event_tx, event_rx) = mpsc::channel();
        drop(event_tx);
        EngineHandle {
            cmd_tx,
            event_rx: Arc::new(Mutex::new(event_rx)),
        }
    }

    #[test]
    fn recv_timeout_reports_a_stopped_engine() {
        let engine = handle_with_dead_thread();

        assert!(matches!(
            engine.recv_timeout(Duration::from_millis(10)),
            Err(EngineError::Stopped)
        ));
        assert_eq!(engine.try_recv(), None);
    }

    #[test]
    fn recv_timeout_is_empty_while_the_engine_is_idle() {
        let engine = EngineHandle::new(&EngineSettings::default()).unwrap();

        assert!(matches!(engine.recv_timeout(Duration::from_millis(10)), Ok(None)));
    }
}
