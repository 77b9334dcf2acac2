use std::sync::Arc;
use std::time::{Duration, Instant};

use futures_util::stream;
use narrator_core::{update, AppState, Effect, JobState, Msg, ProgressEvent};
use narrator_engine::{
    ChannelOpenError, EngineEvent, EngineHandle, EngineServices, EngineSettings, ProgressChannel,
    ProgressSource,
};
use serde_json::json;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn init_logging() {
    narrator_logging::initialize_for_tests();
}

async fn next_event(engine: &EngineHandle) -> EngineEvent {
    let deadline = Instant::now() + Duration::from_secs(5);
    loop {
        if let Some(event) = engine.try_recv() {
            return event;
        }
        assert!(Instant::now() < deadline, "timed out waiting for engine event");
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

fn settings_for(server: &MockServer) -> EngineSettings {
    EngineSettings {
        origin: server.uri(),
        ..EngineSettings::default()
    }
}

fn to_msg(event: EngineEvent) -> Msg {
    match event {
        EngineEvent::Submitted { token, result } => match result {
            Ok(handle) => Msg::JobSubmitted { token, handle },
            Err(err) => Msg::SubmissionFailed {
                token,
                message: err.to_string(),
            },
        },
        EngineEvent::Progress { token, event } => Msg::ProgressReceived { token, event },
        EngineEvent::ChannelClosed { token } => Msg::ChannelClosed { token },
        EngineEvent::ModelsFetched(Ok(entries)) => Msg::ModelsLoaded(entries),
        EngineEvent::ModelsFetched(Err(err)) => Msg::CatalogUnavailable(err.reason),
        EngineEvent::TextExtracted(Ok(text)) => Msg::TextExtracted(text),
        EngineEvent::TextExtracted(Err(err)) => Msg::ExtractionFailed(err.to_string()),
        EngineEvent::ArtifactDownloaded(_) => Msg::NoOp,
    }
}

fn run_effects(engine: &EngineHandle, effects: Vec<Effect>) {
    for effect in effects {
        match effect {
            Effect::FetchModels => engine.fetch_models(),
            Effect::ExtractText { path } => engine.extract_text(path),
            Effect::SubmitJob { token, request } => engine.submit(token, request),
            Effect::OpenProgress { token, job_id } => engine.open_progress(token, job_id),
            Effect::CloseProgress { token } => engine.close_progress(token),
        }
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn full_generation_flow_reaches_success() {
    init_logging();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/models"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": "microsoft/speecht5_tts", "name": "Microsoft SpeechT5 (Recommended)"}
        ])))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"task_id": "job-1"})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/progress/job-1"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            concat!(
                "data: {\"status\": \"running\", \"percent\": 10}\n\n",
                "data: {\"status\": \"running\", \"percent\": 55}\n\n",
                "data: {\"status\": \"complete\", \"audio_url\": \"/files/job-1.wav\"}\n\n",
            ),
            "text/event-stream",
        ))
        .mount(&server)
        .await;

    let engine = EngineHandle::new(&settings_for(&server)).expect("engine");
    let (state, effects) = update(AppState::new(), Msg::AppStarted);
    run_effects(&engine, effects);
    let (state, _) = update(state, to_msg(next_event(&engine).await));
    assert_eq!(
        state.models().effective_model_id(),
        Some("microsoft/speecht5_tts")
    );

    let (state, _) = update(state, Msg::TextExtracted("Hello world".to_string()));
    let (mut state, effects) = update(state, Msg::GenerateClicked);
    run_effects(&engine, effects);

    let mut percents = Vec::new();
    while !state.job().is_terminal() {
        let (next, effects) = update(state, to_msg(next_event(&engine).await));
        if matches!(
            next.job(),
            JobState::Running { .. } | JobState::Succeeded { .. }
        ) {
            percents.push(next.view().percent);
        }
        run_effects(&engine, effects);
        state = next;
    }

    assert_eq!(
        *state.job(),
        JobState::Succeeded {
            audio_ref: "/files/job-1.wav".to_string()
        }
    );
    assert_eq!(percents, vec![10, 55, 100]);
}

#[tokio::test(flavor = "multi_thread")]
async fn rejected_submission_fails_the_attempt() {
    init_logging();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let engine = EngineHandle::new(&settings_for(&server)).expect("engine");
    let (state, _) = update(AppState::new(), Msg::TextExtracted("Hello".to_string()));
    let (state, _) = update(state, Msg::ModelRequested("m".to_string()));
    let (state, effects) = update(state, Msg::GenerateClicked);
    run_effects(&engine, effects);

    let (state, _) = update(state, to_msg(next_event(&engine).await));

    assert!(matches!(state.job(), JobState::Failed { .. }));
}

/// Hands out channels that never produce anything.
struct SilentSource;

#[async_trait::async_trait]
impl ProgressSource for SilentSource {
    async fn open(
        &self,
        job_id: &str,
        cancel: CancellationToken,
    ) -> Result<ProgressChannel, ChannelOpenError> {
        Ok(ProgressChannel::from_stream(
            job_id,
            stream::pending::<Result<bytes::Bytes, std::io::Error>>(),
            cancel,
        ))
    }
}

/// Hands out channels that end immediately without a terminal event.
struct DroppingSource;

#[async_trait::async_trait]
impl ProgressSource for DroppingSource {
    async fn open(
        &self,
        job_id: &str,
        cancel: CancellationToken,
    ) -> Result<ProgressChannel, ChannelOpenError> {
        let chunks: Vec<Result<bytes::Bytes, std::io::Error>> = vec![Ok(
            bytes::Bytes::from_static(b"data: {\"status\": \"running\", \"percent\": 30}\n\n"),
        )];
        Ok(ProgressChannel::from_stream(job_id, stream::iter(chunks), cancel))
    }
}

fn services_with(progress: Arc<dyn ProgressSource>) -> EngineServices {
    let mut services = EngineServices::from_settings(&EngineSettings::default()).unwrap();
    services.progress = progress;
    services
}

#[tokio::test(flavor = "multi_thread")]
async fn closing_a_channel_produces_no_further_events() {
    init_logging();
    let engine = EngineHandle::with_services(services_with(Arc::new(SilentSource))).unwrap();

    engine.open_progress(1, "job-1");
    engine.close_progress(1);
    engine.close_progress(1);
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert_eq!(engine.try_recv(), None);
}

#[tokio::test(flavor = "multi_thread")]
async fn stream_ending_without_result_reports_channel_closed() {
    init_logging();
    let engine = EngineHandle::with_services(services_with(Arc::new(DroppingSource))).unwrap();

    engine.open_progress(7, "job-7");

    assert_eq!(
        next_event(&engine).await,
        EngineEvent::Progress {
            token: 7,
            event: ProgressEvent::Running {
                percent: 30,
                detail: None
            },
        }
    );
    assert_eq!(
        next_event(&engine).await,
        EngineEvent::ChannelClosed { token: 7 }
    );
}
