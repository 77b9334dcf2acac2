use std::path::{Path, PathBuf};

use futures_util::StreamExt;
use narrator_core::AudioLocator;
use narrator_logging::narrator_info;

use crate::{AtomicFileWriter, DownloadError};

/// Saves finished audiobooks to disk.
#[derive(Debug, Clone)]
pub struct ArtifactDownloader {
    client: reqwest::Client,
    max_bytes: u64,
}

impl ArtifactDownloader {
    pub fn new(client: reqwest::Client, max_bytes: u64) -> Self {
        Self { client, max_bytes }
    }

    /// Streams the audio into memory (bounded by `max_bytes`) and writes it
    /// atomically as `{dir}/{locator.file_name}`.
    pub async fn download(
        &self,
        locator: &AudioLocator,
        dir: &Path,
    ) -> Result<PathBuf, DownloadError> {
        let response = self
            .client
            .get(locator.url.clone())
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::HttpStatus(status.as_u16()));
        }
        if let Some(content_len) = response.content_length() {
            if content_len > self.max_bytes {
                return Err(DownloadError::TooLarge {
                    max_bytes: self.max_bytes,
                    actual: content_len,
                });
            }
        }

        let mut bytes = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(map_reqwest_error)?;
            let next_len = bytes.len() as u64 + chunk.len() as u64;
            if next_len > self.max_bytes {
                return Err(DownloadError::TooLarge {
                    max_bytes: self.max_bytes,
                    actual: next_len,
                });
            }
            bytes.extend_from_slice(&chunk);
        }

        let writer = AtomicFileWriter::new(dir.to_path_buf());
        let path = writer
            .write(&locator.file_name, &bytes)
            .map_err(|err| DownloadError::Persist(err.to_string()))?;
        narrator_info!("saved {} bytes of audio to {:?}", bytes.len(), path);
        Ok(path)
    }
}

fn map_reqwest_error(err: reqwest::Error) -> DownloadError {
    if err.is_timeout() {
        return DownloadError::Timeout;
    }
    DownloadError::Network(err.to_string())
}
