//! Saving downloaded audio and the generation history into the output directory.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::{Builder, NamedTempFile};
use thiserror::Error;

/// Prefix of in-progress files, so an interrupted download is recognizable.
const PARTIAL_PREFIX: &str = ".narrator-partial-";

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("cannot save audio or history into {dir:?}: {reason}")]
    OutputDir { dir: PathBuf, reason: String },
    #[error("{0:?} is not a plain file name; audio and history stay inside the output directory")]
    FileName(String),
    #[error("saving {name:?} failed: {source}")]
    Io {
        name: String,
        #[source]
        source: io::Error,
    },
}

/// Creates the audio output directory when missing and checks that a file
/// can be created in it.
pub fn ensure_output_dir(dir: &Path) -> Result<(), PersistError> {
    let unusable = |reason: String| PersistError::OutputDir {
        dir: dir.to_path_buf(),
        reason,
    };
    match fs::metadata(dir) {
        Ok(meta) if !meta.is_dir() => return Err(unusable("not a directory".to_string())),
        Ok(_) => {}
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            fs::create_dir_all(dir).map_err(|e| unusable(e.to_string()))?;
        }
        Err(err) => return Err(unusable(err.to_string())),
    }
    partial_file(dir).map_err(|e| unusable(e.to_string()))?;
    Ok(())
}

fn partial_file(dir: &Path) -> io::Result<NamedTempFile> {
    Builder::new().prefix(PARTIAL_PREFIX).tempfile_in(dir)
}

/// Saves audio files and the history file under one output directory.
///
/// Content lands in a `.narrator-partial-*` file first and is renamed over the
/// target once synced, so a reader sees either the old file or the new one.
pub struct AtomicFileWriter {
    dir: PathBuf,
}

impl AtomicFileWriter {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    /// Replaces `{dir}/{name}` with `content` and returns the final path.
    pub fn write(&self, name: &str, content: &[u8]) -> Result<PathBuf, PersistError> {
        if Path::new(name).file_name().is_none_or(|plain| plain != name) {
            return Err(PersistError::FileName(name.to_string()));
        }
        ensure_output_dir(&self.dir)?;

        let io_failed = |source: io::Error| PersistError::Io {
            name: name.to_string(),
            source,
        };
        let mut partial = partial_file(&self.dir).map_err(io_failed)?;
        partial.write_all(content).map_err(io_failed)?;
        partial.as_file_mut().sync_all().map_err(io_failed)?;

        let target = self.dir.join(name);
        partial
            .persist(&target)
            .map_err(|err| io_failed(err.error))?;
        Ok(target)
    }
}
