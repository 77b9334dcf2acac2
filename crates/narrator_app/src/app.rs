use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use chrono::Utc;
use narrator_core::{
    update, AppState, ArtifactResolver, CatalogStatus, ExtractionStatus, JobState, Msg,
};
use narrator_engine::{DownloadError, EngineHandle};
use narrator_logging::{narrator_info, narrator_warn};

use crate::cli::{Cli, Commands, GenerateCommand};
use crate::config::AppConfig;
use crate::effects::{EffectRunner, Inbound};
use crate::history::{append_history, load_history, HistoryEntry};
use crate::render::{history_lines, model_lines, Renderer};

/// The service reported an error for the job.
pub const EXIT_JOB_FAILED: u8 = 2;
/// Every attempt lost its progress stream before a result arrived.
pub const EXIT_CLOSED_WITHOUT_RESULT: u8 = 3;
/// An attempt was abandoned after going quiet for too long.
pub const EXIT_IDLE_TIMEOUT: u8 = 4;

const POLL_INTERVAL: Duration = Duration::from_millis(100);

pub fn run(cli: Cli) -> Result<ExitCode> {
    let mut config = AppConfig::load(cli.config.as_deref())?;
    config.apply_cli(&cli);
    narrator_logging::initialize(config.log.into(), config.level_filter()?, &config.log_file);
    narrator_info!("narrator starting against {}", config.origin);

    match cli.command {
        Commands::Generate(command) => run_generate(&config, command),
        Commands::Models => run_models(&config),
        Commands::History => {
            for line in history_lines(&load_history(&config.output_dir)) {
                println!("{line}");
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn run_models(config: &AppConfig) -> Result<ExitCode> {
    let mut session = Session::start(config)?;
    session.load_catalog(catalog_wait(config))?;
    for line in model_lines(&session.state.view()) {
        println!("{line}");
    }
    Ok(ExitCode::SUCCESS)
}

fn run_generate(config: &AppConfig, command: GenerateCommand) -> Result<ExitCode> {
    let resolver = ArtifactResolver::new(&config.origin)?;
    let mut session = Session::start(config)?;
    session.load_catalog(catalog_wait(config))?;
    session.load_text(&command, catalog_wait(config))?;

    let selected = session.state.models().effective_model_id().is_some();
    if let Some(model) = model_to_request(command.model, config, selected) {
        session.dispatch(Msg::ModelRequested(model));
    }

    let retries = command.retries.unwrap_or(config.retries);
    let idle_timeout = command
        .idle_timeout
        .or(config.idle_timeout_secs)
        .map(Duration::from_secs);

    let mut attempt = 0;
    let audio_ref = loop {
        attempt += 1;
        session.dispatch(Msg::GenerateClicked);
        if let Some(error) = session.state.view().validation_error {
            bail!("cannot generate: {error}");
        }

        let settled = session.pump_until(idle_timeout, |state| {
            state.job().is_terminal() || state.closed_without_result()
        })?;
        if !settled {
            narrator_warn!("attempt {} went quiet; abandoning it", attempt);
            session.dispatch(Msg::CancelClicked);
            eprintln!(
                "No progress for {}s; giving up.",
                idle_timeout.unwrap_or_default().as_secs()
            );
            return Ok(ExitCode::from(EXIT_IDLE_TIMEOUT));
        }

        match session.state.job().clone() {
            JobState::Succeeded { audio_ref } => break audio_ref,
            JobState::Failed { message } => {
                eprintln!("Generation failed: {message}");
                return Ok(ExitCode::from(EXIT_JOB_FAILED));
            }
            _ if attempt <= retries => {
                narrator_warn!(
                    "progress stream closed without a result; retrying ({}/{})",
                    attempt,
                    retries
                );
            }
            _ => {
                eprintln!("Lost the progress stream before the audiobook was ready.");
                return Ok(ExitCode::from(EXIT_CLOSED_WITHOUT_RESULT));
            }
        }
    };

    let locator = resolver.resolve(&audio_ref)?;
    println!("{}", locator.url);

    if command.download {
        session.runner.download(locator, config.output_dir.clone());
        let path = session.wait_download(idle_timeout)?;
        println!("Saved {}", path.display());
    }

    append_history(
        &config.output_dir,
        HistoryEntry {
            job_id: session.last_job_id.clone().unwrap_or_default(),
            model_id: session
                .state
                .models()
                .effective_model_id()
                .unwrap_or_default()
                .to_string(),
            audio_ref,
            completed_utc: Utc::now().to_rfc3339(),
        },
    );
    Ok(ExitCode::SUCCESS)
}

/// `--model`, then the configured default. The fallback only applies when the
/// catalog left nothing selected.
fn model_to_request(
    cli_model: Option<String>,
    config: &AppConfig,
    selected: bool,
) -> Option<String> {
    cli_model
        .or_else(|| config.default_model.clone())
        .or_else(|| (!selected).then(|| config.fallback_model.clone()))
}

fn catalog_wait(config: &AppConfig) -> Option<Duration> {
    Some(Duration::from_secs(config.request_timeout_secs + 5))
}

struct Session {
    state: AppState,
    runner: EffectRunner,
    renderer: Renderer,
    last_job_id: Option<String>,
    downloaded: Option<Result<PathBuf, DownloadError>>,
}

impl Session {
    fn start(config: &AppConfig) -> Result<Self> {
        let engine = EngineHandle::new(&config.engine_settings())?;
        Ok(Self {
            state: AppState::new(),
            runner: EffectRunner::new(engine),
            renderer: Renderer::new(),
            last_job_id: None,
            downloaded: None,
        })
    }

    fn dispatch(&mut self, msg: Msg) {
        let state = std::mem::take(&mut self.state);
        let (mut state, effects) = update(state, msg);
        if state.consume_dirty() {
            self.renderer.render(&state.view());
        }
        if let Some(job_id) = state.job().job_id() {
            self.last_job_id = Some(job_id.to_string());
        }
        self.state = state;
        self.runner.enqueue(effects);
    }

    /// Feeds engine results through `update` until `done` holds. Returns false
    /// when `idle` passes without any engine result.
    fn pump_until(
        &mut self,
        idle: Option<Duration>,
        done: impl Fn(&AppState) -> bool,
    ) -> Result<bool> {
        let mut last_activity = Instant::now();
        while !done(&self.state) {
            if self.poll()? {
                last_activity = Instant::now();
            } else if idle.is_some_and(|idle| last_activity.elapsed() >= idle) {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Handles at most one engine result. Returns whether one arrived.
    fn poll(&mut self) -> Result<bool> {
        match self.runner.next(POLL_INTERVAL)? {
            Some(Inbound::Msg(msg)) => self.dispatch(msg),
            Some(Inbound::Downloaded(result)) => self.downloaded = Some(result),
            None => return Ok(false),
        }
        Ok(true)
    }

    fn load_catalog(&mut self, wait: Option<Duration>) -> Result<()> {
        self.dispatch(Msg::AppStarted);
        let settled = self.pump_until(wait, |state| {
            matches!(
                state.catalog(),
                CatalogStatus::Loaded | CatalogStatus::Unavailable(_)
            )
        })?;
        if !settled {
            bail!("model catalog did not answer");
        }
        Ok(())
    }

    fn load_text(&mut self, command: &GenerateCommand, wait: Option<Duration>) -> Result<()> {
        let source = &command.source;
        if let Some(path) = &source.document {
            self.dispatch(Msg::DocumentSelected(path.clone()));
            let settled = self.pump_until(wait, |state| {
                *state.extraction() != ExtractionStatus::Extracting
            })?;
            if !settled {
                bail!("extraction of {} did not finish", path.display());
            }
            if let ExtractionStatus::Failed(message) = self.state.extraction() {
                bail!("could not extract {}: {message}", path.display());
            }
        } else if let Some(path) = &source.text_file {
            let text = fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            self.dispatch(Msg::TextExtracted(text));
        } else if let Some(text) = &source.text {
            self.dispatch(Msg::TextExtracted(text.clone()));
        }
        narrator_info!("text ready: {} chars", self.state.view().text_chars);
        Ok(())
    }

    fn wait_download(&mut self, idle: Option<Duration>) -> Result<PathBuf> {
        let started = Instant::now();
        loop {
            if let Some(result) = self.downloaded.take() {
                return result.context("downloading audio");
            }
            if !self.poll()? && idle.is_some_and(|idle| started.elapsed() >= idle) {
                bail!(
                    "audio download did not finish within {}s",
                    idle.unwrap_or_default().as_secs()
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_model_wins_over_config() {
        let config = AppConfig {
            default_model: Some("from/config".to_string()),
            ..AppConfig::default()
        };

        assert_eq!(
            model_to_request(Some("from/cli".to_string()), &config, true),
            Some("from/cli".to_string())
        );
        assert_eq!(
            model_to_request(None, &config, true),
            Some("from/config".to_string())
        );
    }

    #[test]
    fn fallback_model_only_fills_an_empty_selection() {
        let config = AppConfig::default();

        assert_eq!(model_to_request(None, &config, true), None);
        assert_eq!(
            model_to_request(None, &config, false),
            Some("microsoft/speecht5_tts".to_string())
        );
    }

    #[test]
    fn download_wait_gives_up_after_idle_timeout() {
        let mut session = Session::start(&AppConfig::default()).unwrap();

        let started = Instant::now();
        let result = session.wait_download(Some(Duration::from_millis(200)));

        assert!(result.is_err());
        assert!(started.elapsed() < Duration::from_secs(5));
    }
}
