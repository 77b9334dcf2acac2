use percent_encoding::percent_decode_str;
use thiserror::Error;
use url::Url;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArtifactError {
    #[error("invalid service origin {origin}: {message}")]
    InvalidOrigin { origin: String, message: String },
    #[error("empty audio reference")]
    Empty,
    #[error("malformed audio reference {reference:?}: {message}")]
    Malformed { reference: String, message: String },
}

/// Where a finished audiobook can be played from and downloaded to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioLocator {
    pub url: Url,
    pub file_name: String,
}

/// Turns server-relative audio references into absolute locators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactResolver {
    origin: Url,
}

impl ArtifactResolver {
    /// `origin` must be an absolute http(s) URL; any path on it is ignored.
    pub fn new(origin: &str) -> Result<Self, ArtifactError> {
        let invalid = |message: String| ArtifactError::InvalidOrigin {
            origin: origin.to_string(),
            message,
        };
        let parsed = Url::parse(origin).map_err(|err| invalid(err.to_string()))?;
        if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().is_none() {
            return Err(invalid("expected an http(s) origin".to_string()));
        }
        let mut origin = parsed;
        origin.set_path("/");
        origin.set_query(None);
        origin.set_fragment(None);
        Ok(Self { origin })
    }

    pub fn resolve(&self, audio_ref: &str) -> Result<AudioLocator, ArtifactError> {
        let reference = audio_ref.trim();
        if reference.is_empty() {
            return Err(ArtifactError::Empty);
        }
        let malformed = |message: &str| ArtifactError::Malformed {
            reference: audio_ref.to_string(),
            message: message.to_string(),
        };
        if !reference.starts_with('/') {
            return Err(malformed("not a server-relative path"));
        }
        if reference.starts_with("//") {
            return Err(malformed("protocol-relative references are not allowed"));
        }
        if reference.contains('\\') || reference.chars().any(char::is_control) {
            return Err(malformed("backslashes and control characters are not allowed"));
        }
        let path = reference.split(['?', '#']).next().unwrap_or_default();
        for segment in path.split('/') {
            let decoded = percent_decode_str(segment)
                .decode_utf8()
                .map_err(|_| malformed("path is not valid UTF-8"))?;
            if decoded == "." || decoded == ".." {
                return Err(malformed("path traversal"));
            }
            if decoded.contains(['/', '\\']) {
                return Err(malformed("encoded path separator"));
            }
        }

        let url = self
            .origin
            .join(reference)
            .map_err(|err| malformed(&err.to_string()))?;
        if url.origin() != self.origin.origin() {
            return Err(malformed("resolves outside the service origin"));
        }
        // Segments were checked above, so the decoded name is a plain file name.
        let file_name = url
            .path_segments()
            .and_then(|mut segments| segments.next_back())
            .map(|name| percent_decode_str(name).decode_utf8_lossy().into_owned())
            .filter(|name| !name.is_empty())
            .ok_or_else(|| malformed("no file name"))?;

        Ok(AudioLocator { url, file_name })
    }
}
