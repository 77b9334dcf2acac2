use std::fs;
use std::path::{Path, PathBuf};

use narrator_engine::{ensure_output_dir, AtomicFileWriter};
use narrator_logging::{narrator_error, narrator_info, narrator_warn};
use serde::{Deserialize, Serialize};

const HISTORY_FILENAME: &str = ".narrator_history.ron";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub job_id: String,
    pub model_id: String,
    pub audio_ref: String,
    pub completed_utc: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct PersistedHistory {
    completed: Vec<HistoryEntry>,
}

/// A missing or unreadable history is empty.
pub fn load_history(output_dir: &Path) -> Vec<HistoryEntry> {
    let path = output_dir.join(HISTORY_FILENAME);
    let content = match fs::read_to_string(&path) {
        Ok(text) => text,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return Vec::new();
        }
        Err(err) => {
            narrator_warn!("Failed to read history from {:?}: {}", path, err);
            return Vec::new();
        }
    };

    match ron::from_str::<PersistedHistory>(&content) {
        Ok(history) => history.completed,
        Err(err) => {
            narrator_warn!("Failed to parse history from {:?}: {}", path, err);
            Vec::new()
        }
    }
}

pub fn append_history(output_dir: &Path, entry: HistoryEntry) {
    if let Err(err) = ensure_output_dir(output_dir) {
        narrator_error!("Failed to ensure output dir {:?}: {}", output_dir, err);
        return;
    }

    let mut history = PersistedHistory {
        completed: load_history(output_dir),
    };
    history.completed.push(entry);

    let pretty = ron::ser::PrettyConfig::new();
    let content = match ron::ser::to_string_pretty(&history, pretty) {
        Ok(text) => text,
        Err(err) => {
            narrator_error!("Failed to serialize history: {}", err);
            return;
        }
    };

    let writer = AtomicFileWriter::new(PathBuf::from(output_dir));
    match writer.write(HISTORY_FILENAME, content.as_bytes()) {
        Ok(path) => narrator_info!(
            "Recorded generation #{} in {:?}",
            history.completed.len(),
            path
        ),
        Err(err) => narrator_error!("Failed to write history to {:?}: {}", output_dir, err),
    }
}
