use crate::view_model::{AppViewModel, ModelOptionView, TEXT_PREVIEW_CHARS};
use crate::{
    GenerationRequest, GenerationToken, ModelChoice, ModelEntry, ModelSelection, ProgressEvent,
    ValidationError, CUSTOM_MODEL_LABEL,
};

/// Visible state of the current generation attempt.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum JobState {
    #[default]
    Idle,
    Submitting,
    Awaiting {
        job_id: String,
    },
    Running {
        job_id: String,
        percent: u8,
        status_text: String,
    },
    Succeeded {
        audio_ref: String,
    },
    Failed {
        message: String,
    },
}

impl JobState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Succeeded { .. } | JobState::Failed { .. })
    }

    /// Submitting, Awaiting or Running.
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            JobState::Submitting | JobState::Awaiting { .. } | JobState::Running { .. }
        )
    }

    pub fn job_id(&self) -> Option<&str> {
        match self {
            JobState::Awaiting { job_id } | JobState::Running { job_id, .. } => Some(job_id),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CatalogStatus {
    #[default]
    NotLoaded,
    Loading,
    Loaded,
    Unavailable(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ExtractionStatus {
    #[default]
    Idle,
    Extracting,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppState {
    text: String,
    extraction: ExtractionStatus,
    models: ModelSelection,
    catalog: CatalogStatus,
    job: JobState,
    token: GenerationToken,
    max_percent: u8,
    closed_without_result: bool,
    validation_error: Option<ValidationError>,
    dirty: bool,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn view(&self) -> AppViewModel {
        let mut model_options: Vec<ModelOptionView> = self
            .models
            .entries()
            .iter()
            .map(|entry| ModelOptionView {
                choice: ModelChoice::Catalog(entry.id.clone()),
                label: entry.display_name.clone(),
                selected: self.models.choice() == Some(&ModelChoice::Catalog(entry.id.clone())),
            })
            .collect();
        model_options.push(ModelOptionView {
            choice: ModelChoice::Custom,
            label: CUSTOM_MODEL_LABEL.to_string(),
            selected: self.models.choice() == Some(&ModelChoice::Custom),
        });

        AppViewModel {
            job: self.job.clone(),
            percent: self.displayed_percent(),
            status_text: self.status_text(),
            closed_without_result: self.closed_without_result,
            can_generate: self.can_generate(),
            validation_error: self.validation_error,
            text_chars: self.text.chars().count(),
            text_preview: self.text.chars().take(TEXT_PREVIEW_CHARS).collect(),
            extraction: self.extraction.clone(),
            catalog: self.catalog.clone(),
            model_options,
            effective_model_id: self.models.effective_model_id().map(ToOwned::to_owned),
            dirty: self.dirty,
        }
    }

    /// Returns whether anything changed since the last call, and resets the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub fn job(&self) -> &JobState {
        &self.job
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn models(&self) -> &ModelSelection {
        &self.models
    }

    pub fn catalog(&self) -> &CatalogStatus {
        &self.catalog
    }

    pub fn extraction(&self) -> &ExtractionStatus {
        &self.extraction
    }

    /// Token of the most recent attempt; 0 before the first one.
    pub fn current_token(&self) -> GenerationToken {
        self.token
    }

    pub fn closed_without_result(&self) -> bool {
        self.closed_without_result
    }

    /// An attempt whose channel ended without a result no longer blocks a new one.
    pub fn is_in_flight(&self) -> bool {
        self.job.is_active() && !self.closed_without_result
    }

    fn can_generate(&self) -> bool {
        !self.is_in_flight()
            && self.extraction != ExtractionStatus::Extracting
            && !self.text.trim().is_empty()
            && self.models.effective_model_id().is_some()
    }

    fn displayed_percent(&self) -> u8 {
        match self.job {
            JobState::Idle | JobState::Submitting => 0,
            JobState::Succeeded { .. } => 100,
            JobState::Awaiting { .. } | JobState::Running { .. } | JobState::Failed { .. } => {
                self.max_percent
            }
        }
    }

    fn status_text(&self) -> String {
        match &self.job {
            JobState::Idle => String::new(),
            JobState::Submitting => "Initiating...".to_string(),
            JobState::Awaiting { .. } => "Waiting for progress...".to_string(),
            JobState::Running { status_text, .. } => status_text.clone(),
            JobState::Succeeded { .. } => "Complete".to_string(),
            JobState::Failed { message } => format!("Error: {message}"),
        }
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub(crate) fn set_text(&mut self, text: String) {
        self.text = text;
        self.extraction = ExtractionStatus::Idle;
        self.validation_error = None;
        self.mark_dirty();
    }

    pub(crate) fn begin_extraction(&mut self) {
        self.extraction = ExtractionStatus::Extracting;
        self.mark_dirty();
    }

    pub(crate) fn fail_extraction(&mut self, message: String) {
        self.extraction = ExtractionStatus::Failed(message);
        self.mark_dirty();
    }

    pub(crate) fn begin_catalog_load(&mut self) {
        self.catalog = CatalogStatus::Loading;
        self.mark_dirty();
    }

    pub(crate) fn apply_catalog(&mut self, entries: Vec<ModelEntry>) {
        self.models.set_entries(entries);
        self.catalog = CatalogStatus::Loaded;
        self.mark_dirty();
    }

    pub(crate) fn apply_catalog_unavailable(&mut self, reason: String) {
        self.catalog = CatalogStatus::Unavailable(reason);
        // Custom entry is the only way forward without a catalog.
        if self.models.choice().is_none() {
            self.models.choose(ModelChoice::Custom);
        }
        self.mark_dirty();
    }

    pub(crate) fn choose_model(&mut self, choice: ModelChoice) {
        if self.models.choose(choice) {
            self.validation_error = None;
            self.mark_dirty();
        }
    }

    pub(crate) fn edit_custom_model(&mut self, input: String) {
        self.models.set_custom_input(input);
        self.validation_error = None;
        self.mark_dirty();
    }

    pub(crate) fn request_model(&mut self, input: &str) {
        self.models.request(input);
        self.validation_error = None;
        self.mark_dirty();
    }

    pub(crate) fn generation_request(&self) -> Result<GenerationRequest, ValidationError> {
        let model_id = self.models.effective_model_id().unwrap_or_default();
        GenerationRequest::new(self.text.clone(), model_id)
    }

    pub(crate) fn reject(&mut self, error: ValidationError) {
        self.validation_error = Some(error);
        self.mark_dirty();
    }

    /// Resets every per-attempt field and hands out the next token.
    pub(crate) fn begin_attempt(&mut self) -> GenerationToken {
        self.token += 1;
        self.job = JobState::Submitting;
        self.max_percent = 0;
        self.closed_without_result = false;
        self.validation_error = None;
        self.mark_dirty();
        self.token
    }

    /// Abandons the current attempt; anything still tagged with its token is stale.
    pub(crate) fn abandon_attempt(&mut self) {
        self.token += 1;
        self.job = JobState::Idle;
        self.max_percent = 0;
        self.closed_without_result = false;
        self.mark_dirty();
    }

    pub(crate) fn is_current(&self, token: GenerationToken) -> bool {
        token != 0 && token == self.token
    }

    pub(crate) fn apply_submitted(&mut self, job_id: String) -> bool {
        if self.job != JobState::Submitting {
            return false;
        }
        self.job = JobState::Awaiting { job_id };
        self.mark_dirty();
        true
    }

    pub(crate) fn apply_submission_failed(&mut self, message: String) -> bool {
        if self.job != JobState::Submitting {
            return false;
        }
        self.job = JobState::Failed { message };
        self.mark_dirty();
        true
    }

    /// Folds one event into the job. Returns true when the event ended the job.
    pub(crate) fn apply_progress(&mut self, event: ProgressEvent) -> bool {
        let job_id = match &self.job {
            JobState::Awaiting { job_id } | JobState::Running { job_id, .. } => job_id.clone(),
            _ => return false,
        };
        if self.closed_without_result {
            return false;
        }

        match event {
            ProgressEvent::Complete { audio_ref } => {
                self.max_percent = 100;
                self.job = JobState::Succeeded { audio_ref };
                self.mark_dirty();
                true
            }
            ProgressEvent::Error { message } => {
                self.job = JobState::Failed { message };
                self.mark_dirty();
                true
            }
            event @ (ProgressEvent::Queued { .. } | ProgressEvent::Running { .. }) => {
                let percent = event.percent().unwrap_or(0);
                self.max_percent = self.max_percent.max(percent);
                self.job = JobState::Running {
                    job_id,
                    percent: self.max_percent,
                    status_text: event.status_text(),
                };
                self.mark_dirty();
                false
            }
        }
    }

    pub(crate) fn apply_channel_closed(&mut self) -> bool {
        if !matches!(self.job, JobState::Awaiting { .. } | JobState::Running { .. }) {
            return false;
        }
        self.closed_without_result = true;
        self.mark_dirty();
        true
    }
}
