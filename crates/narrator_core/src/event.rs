/// A decoded progress message for one job.
///
/// Payloads only exist on the variant they belong to, so an audio reference
/// can never travel alongside an error message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    Queued { percent: u8 },
    Running { percent: u8, detail: Option<String> },
    Complete { audio_ref: String },
    Error { message: String },
}

impl ProgressEvent {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ProgressEvent::Complete { .. } | ProgressEvent::Error { .. })
    }

    /// Percent carried by non-terminal events, clamped to 100.
    pub fn percent(&self) -> Option<u8> {
        match self {
            ProgressEvent::Queued { percent } | ProgressEvent::Running { percent, .. } => {
                Some((*percent).min(100))
            }
            ProgressEvent::Complete { .. } | ProgressEvent::Error { .. } => None,
        }
    }

    /// Human-readable status line for non-terminal events.
    pub(crate) fn status_text(&self) -> String {
        match self {
            ProgressEvent::Queued { .. } => "Queued".to_string(),
            ProgressEvent::Running {
                detail: Some(detail),
                ..
            } => detail.clone(),
            ProgressEvent::Running { detail: None, .. } => "Running".to_string(),
            ProgressEvent::Complete { .. } => "Complete".to_string(),
            ProgressEvent::Error { .. } => "Error".to_string(),
        }
    }
}
