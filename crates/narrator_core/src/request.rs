use thiserror::Error;

/// Identifies one generation attempt. Strictly increasing within a session.
pub type GenerationToken = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("no text to narrate")]
    EmptyText,
    #[error("no model selected")]
    EmptyModelId,
}

/// Text plus model selection, validated before it is ever sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    text: String,
    model_id: String,
}

impl GenerationRequest {
    /// Builds a request; whitespace-only text or model ids count as empty.
    pub fn new(
        text: impl Into<String>,
        model_id: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(ValidationError::EmptyText);
        }
        let model_id = model_id.into().trim().to_string();
        if model_id.is_empty() {
            return Err(ValidationError::EmptyModelId);
        }
        Ok(Self { text, model_id })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn model_id(&self) -> &str {
        &self.model_id
    }
}

/// Server-side job created for one attempt.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct JobHandle {
    pub job_id: String,
}

impl JobHandle {
    pub fn new(job_id: impl Into<String>) -> Self {
        Self {
            job_id: job_id.into(),
        }
    }
}
