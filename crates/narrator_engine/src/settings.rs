use std::time::Duration;

use url::Url;

use crate::EngineError;

#[derive(Debug, Clone)]
pub struct EngineSettings {
    /// Service origin; audio references are resolved against it.
    pub origin: String,
    /// Path prefix of the JSON/SSE endpoints.
    pub api_prefix: String,
    pub connect_timeout: Duration,
    /// Applies to submit, catalog and upload calls. The progress stream and
    /// audio downloads only use the connect timeout.
    pub request_timeout: Duration,
    pub max_download_bytes: u64,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            origin: "http://localhost:8000".to_string(),
            api_prefix: "/api".to_string(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            max_download_bytes: 512 * 1024 * 1024,
        }
    }
}

impl EngineSettings {
    pub fn endpoints(&self) -> Result<ServiceEndpoints, EngineError> {
        ServiceEndpoints::new(&self.origin, &self.api_prefix)
    }

    pub(crate) fn build_client(&self) -> Result<reqwest::Client, EngineError> {
        reqwest::Client::builder()
            .connect_timeout(self.connect_timeout)
            .build()
            .map_err(|err| EngineError::Client(err.to_string()))
    }
}

/// Absolute URLs of the service endpoints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceEndpoints {
    base: Url,
}

impl ServiceEndpoints {
    pub fn new(origin: &str, api_prefix: &str) -> Result<Self, EngineError> {
        let mut base = Url::parse(origin)
            .map_err(|err| EngineError::InvalidSettings(format!("origin {origin:?}: {err}")))?;
        if !matches!(base.scheme(), "http" | "https") || base.host_str().is_none() {
            return Err(EngineError::InvalidSettings(format!(
                "origin {origin:?} is not an http(s) url"
            )));
        }
        let prefix = api_prefix.trim().trim_matches('/');
        base.set_path(&format!("/{prefix}"));
        base.set_query(None);
        base.set_fragment(None);
        Ok(Self { base })
    }

    pub fn generate(&self) -> Url {
        self.endpoint(&["generate"])
    }

    /// The job id is percent-encoded as a single path segment.
    pub fn progress(&self, job_id: &str) -> Url {
        self.endpoint(&["progress", job_id])
    }

    pub fn models(&self) -> Url {
        self.endpoint(&["models"])
    }

    pub fn upload(&self) -> Url {
        self.endpoint(&["upload"])
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoints_live_under_the_api_prefix() {
        let endpoints = ServiceEndpoints::new("http://localhost:8000", "/api").unwrap();
        assert_eq!(endpoints.generate().as_str(), "http://localhost:8000/api/generate");
        assert_eq!(endpoints.models().as_str(), "http://localhost:8000/api/models");
        assert_eq!(endpoints.upload().as_str(), "http://localhost:8000/api/upload");
        assert_eq!(
            endpoints.progress("job-1").as_str(),
            "http://localhost:8000/api/progress/job-1"
        );
    }

    #[test]
    fn empty_prefix_and_trailing_slashes_are_normalized() {
        let endpoints = ServiceEndpoints::new("http://host:9000/", "").unwrap();
        assert_eq!(endpoints.generate().as_str(), "http://host:9000/generate");

        let endpoints = ServiceEndpoints::new("http://host:9000", "/v1/tts/").unwrap();
        assert_eq!(endpoints.models().as_str(), "http://host:9000/v1/tts/models");
    }

    #[test]
    fn job_id_is_a_single_segment() {
        let endpoints = ServiceEndpoints::new("http://host", "/api").unwrap();
        assert_eq!(
            endpoints.progress("a/b c").as_str(),
            "http://host/api/progress/a%2Fb%20c"
        );
    }

    #[test]
    fn non_http_origin_is_rejected() {
        assert!(ServiceEndpoints::new("ftp://host", "/api").is_err());
        assert!(ServiceEndpoints::new("localhost:8000", "/api").is_err());
    }
}
