//! App configuration: `narrator.ron` overlaid with command line flags.

use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use narrator_engine::EngineSettings;
use narrator_logging::LevelFilter;
use serde::{Deserialize, Serialize};

use crate::cli::{Cli, LogTarget};

pub const DEFAULT_CONFIG_FILENAME: &str = "narrator.ron";
/// The model the generation service itself defaults to.
pub const FALLBACK_MODEL_ID: &str = "microsoft/speecht5_tts";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub origin: String,
    pub api_prefix: String,
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
    pub max_download_mib: u64,
    pub output_dir: PathBuf,
    pub default_model: Option<String>,
    /// Used when neither `--model` nor `default_model` is set and the catalog
    /// selected nothing.
    pub fallback_model: String,
    pub retries: u32,
    /// Seconds without any progress before an attempt is abandoned; none waits forever.
    pub idle_timeout_secs: Option<u64>,
    pub log: LogTarget,
    pub log_level: String,
    pub log_file: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        let engine = EngineSettings::default();
        Self {
            origin: engine.origin,
            api_prefix: engine.api_prefix,
            connect_timeout_secs: engine.connect_timeout.as_secs(),
            request_timeout_secs: engine.request_timeout.as_secs(),
            max_download_mib: engine.max_download_bytes / (1024 * 1024),
            output_dir: PathBuf::from("output"),
            default_model: None,
            fallback_model: FALLBACK_MODEL_ID.to_string(),
            retries: 0,
            idle_timeout_secs: None,
            log: LogTarget::Terminal,
            log_level: "info".to_string(),
            log_file: narrator_logging::default_log_path(),
        }
    }
}

impl AppConfig {
    /// An explicit path must exist. The default file is optional.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => Self::from_file(path),
            None => {
                let path = Path::new(DEFAULT_CONFIG_FILENAME);
                if path.exists() {
                    Self::from_file(path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        ron::from_str(&content).with_context(|| format!("parsing config {}", path.display()))
    }

    pub fn apply_cli(&mut self, cli: &Cli) {
        if let Some(origin) = &cli.origin {
            self.origin = origin.clone();
        }
        if let Some(dir) = &cli.output_dir {
            self.output_dir = dir.clone();
        }
        if let Some(log) = cli.log {
            self.log = log;
        }
        if cli.verbose {
            self.log_level = "debug".to_string();
        }
    }

    pub fn level_filter(&self) -> Result<LevelFilter> {
        LevelFilter::from_str(&self.log_level)
            .map_err(|_| anyhow!("unknown log level {:?}", self.log_level))
    }

    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            origin: self.origin.clone(),
            api_prefix: self.api_prefix.clone(),
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            max_download_bytes: self.max_download_mib.saturating_mul(1024 * 1024),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use tempfile::TempDir;

    #[test]
    fn defaults_match_engine_settings() {
        let config = AppConfig::default();
        let settings = config.engine_settings();
        let engine = EngineSettings::default();

        assert_eq!(settings.origin, engine.origin);
        assert_eq!(settings.request_timeout, engine.request_timeout);
        assert_eq!(settings.max_download_bytes, engine.max_download_bytes);
    }

    #[test]
    fn partial_file_keeps_defaults_for_missing_fields() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("narrator.ron");
        fs::write(
            &path,
            r#"(origin: "http://tts.lan:8000", retries: 2, log: both)"#,
        )
        .unwrap();

        let config = AppConfig::load(Some(&path)).unwrap();

        assert_eq!(config.origin, "http://tts.lan:8000");
        assert_eq!(config.retries, 2);
        assert_eq!(config.log, LogTarget::Both);
        assert_eq!(config.api_prefix, "/api");
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        assert!(AppConfig::load(Some(&dir.path().join("absent.ron"))).is_err());
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("narrator.ron");
        fs::write(&path, "(origin: ").unwrap();

        assert!(AppConfig::from_file(&path).is_err());
    }

    #[test]
    fn cli_flags_override_file_values() {
        let mut config = AppConfig {
            origin: "http://from-file:8000".to_string(),
            ..AppConfig::default()
        };
        let cli = Cli::try_parse_from([
            "narrator",
            "--origin",
            "http://from-cli:8000",
            "--output-dir",
            "books",
            "-v",
            "history",
        ])
        .unwrap();

        config.apply_cli(&cli);

        assert_eq!(config.origin, "http://from-cli:8000");
        assert_eq!(config.output_dir, PathBuf::from("books"));
        assert_eq!(config.level_filter().unwrap(), LevelFilter::Debug);
    }
}
