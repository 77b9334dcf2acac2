use narrator_core::{AppViewModel, CatalogStatus, ExtractionStatus, JobState, ModelChoice};

use crate::history::HistoryEntry;

const BAR_WIDTH: usize = 30;

/// Prints a progress line whenever what the user sees actually changes.
#[derive(Debug, Default)]
pub struct Renderer {
    last_line: Option<String>,
}

impl Renderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn render(&mut self, view: &AppViewModel) {
        let Some(line) = status_line(view) else {
            return;
        };
        if self.last_line.as_deref() != Some(line.as_str()) {
            eprintln!("{line}");
            self.last_line = Some(line);
        }
    }
}

/// Single terminal line for the current state; `None` while nothing is happening.
pub fn status_line(view: &AppViewModel) -> Option<String> {
    if let Some(error) = &view.validation_error {
        return Some(format!("Cannot generate: {error}"));
    }
    let suffix = if view.closed_without_result {
        " (connection lost)"
    } else {
        ""
    };
    match &view.job {
        JobState::Idle => match &view.extraction {
            ExtractionStatus::Extracting => Some("Extracting text...".to_string()),
            ExtractionStatus::Failed(message) => Some(format!("Extraction failed: {message}")),
            ExtractionStatus::Idle => None,
        },
        JobState::Submitting | JobState::Awaiting { .. } => Some(format!(
            "[{}] {}{}",
            progress_bar(view.percent),
            view.status_text,
            suffix
        )),
        JobState::Running { .. } | JobState::Succeeded { .. } | JobState::Failed { .. } => {
            Some(format!(
                "[{}] {:>3}% {}{}",
                progress_bar(view.percent),
                view.percent,
                view.status_text,
                suffix
            ))
        }
    }
}

fn progress_bar(percent: u8) -> String {
    let filled = usize::from(percent.min(100)) * BAR_WIDTH / 100;
    format!("{}{}", "#".repeat(filled), "-".repeat(BAR_WIDTH - filled))
}

pub fn model_lines(view: &AppViewModel) -> Vec<String> {
    let mut lines = Vec::with_capacity(view.model_options.len() + 1);
    if let CatalogStatus::Unavailable(reason) = &view.catalog {
        lines.push(format!("Model catalog unavailable ({reason})"));
    }
    for option in &view.model_options {
        let marker = if option.selected { '*' } else { ' ' };
        let id = match &option.choice {
            ModelChoice::Catalog(id) => id.as_str(),
            ModelChoice::Custom => "<any model id>",
        };
        lines.push(format!("{marker} {id:<40} {}", option.label));
    }
    lines
}

pub fn history_lines(entries: &[HistoryEntry]) -> Vec<String> {
    if entries.is_empty() {
        return vec!["No completed generations yet.".to_string()];
    }
    entries
        .iter()
        .map(|entry| {
            format!(
                "{}  {}  {}  {}",
                entry.completed_utc, entry.job_id, entry.model_id, entry.audio_ref
            )
        })
        .collect()
}
