use crate::{CatalogStatus, ExtractionStatus, JobState, ModelChoice, ValidationError};

/// Number of characters shown in the text preview.
pub const TEXT_PREVIEW_CHARS: usize = 500;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppViewModel {
    pub job: JobState,
    /// Never decreases within an attempt; 100 once the audio is ready.
    pub percent: u8,
    pub status_text: String,
    /// The progress channel ended with no result; offer a retry.
    pub closed_without_result: bool,
    pub can_generate: bool,
    pub validation_error: Option<ValidationError>,
    pub text_chars: usize,
    pub text_preview: String,
    pub extraction: ExtractionStatus,
    pub catalog: CatalogStatus,
    /// Catalog entries in server order, custom pseudo-entry last.
    pub model_options: Vec<ModelOptionView>,
    pub effective_model_id: Option<String>,
    pub dirty: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelOptionView {
    pub choice: ModelChoice,
    pub label: String,
    pub selected: bool,
}
