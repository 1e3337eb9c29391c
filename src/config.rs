use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

const ENV_PREFIX: &str = "TRIGGER_VIEW_";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file at {path:?}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse TOML from config file at {path:?}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("Failed to load config from environment: {0}")]
    Environment(#[from] envy::Error),
    #[error("{0} is required")]
    Missing(&'static str),
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct ViewConfig {
    /// Base URL of the alerting service API, without a trailing slash.
    pub api_url: String,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    #[serde(default = "default_events_page_size")]
    pub events_page_size: u64,

    #[serde(default = "default_log_dir")]
    pub log_dir: String,
}

// Partial config for layering
#[derive(Deserialize, Default, Debug)]
struct PartialViewConfig {
    api_url: Option<String>,
    request_timeout_secs: Option<u64>,
    events_page_size: Option<u64>,
    log_dir: Option<String>,
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_events_page_size() -> u64 {
    100
}

fn default_log_dir() -> String {
    "logs".to_string()
}

impl ViewConfig {
    /// Loads `.env`, then the optional TOML file, then `TRIGGER_VIEW_*`
    /// environment variables. Environment values win over the file.
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();

        let file_config = match config_path {
            Some(path) => read_file_config(path)?,
            None => PartialViewConfig::default(),
        };
        let env_config: PartialViewConfig = envy::prefixed(ENV_PREFIX).from_env()?;

        let config = Self::merge(env_config, file_config)?;
        info!(api_url = %config.api_url, "Loaded trigger view configuration.");
        Ok(config)
    }

    fn merge(
        preferred: PartialViewConfig,
        fallback: PartialViewConfig,
    ) -> Result<Self, ConfigError> {
        let api_url = preferred
            .api_url
            .or(fallback.api_url)
            .map(|url| url.trim_end_matches('/').to_string())
            .filter(|url| !url.is_empty())
            .ok_or(ConfigError::Missing("TRIGGER_VIEW_API_URL"))?;

        Ok(ViewConfig {
            api_url,
            request_timeout_secs: preferred
                .request_timeout_secs
                .or(fallback.request_timeout_secs)
                .unwrap_or_else(default_request_timeout_secs),
            events_page_size: preferred
                .events_page_size
                .or(fallback.events_page_size)
                .unwrap_or_else(default_events_page_size),
            log_dir: preferred
                .log_dir
                .or(fallback.log_dir)
                .unwrap_or_else(default_log_dir),
        })
    }
}

fn read_file_config(path: &Path) -> Result<PartialViewConfig, ConfigError> {
    if !path.exists() {
        return Ok(PartialViewConfig::default());
    }
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_file_values_and_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "api_url = \"http://alerts.local/api/\"").unwrap();
        writeln!(file, "events_page_size = 20").unwrap();

        let file_config = read_file_config(file.path()).unwrap();
        let config = ViewConfig::merge(PartialViewConfig::default(), file_config).unwrap();

        assert_eq!(config.api_url, "http://alerts.local/api");
        assert_eq!(config.events_page_size, 20);
        assert_eq!(config.request_timeout_secs, 30);
        assert_eq!(config.log_dir, "logs");
    }

    #[test]
    fn test_environment_overrides_file() {
        let env_config = PartialViewConfig {
            api_url: Some("http://override".to_string()),
            request_timeout_secs: Some(5),
            ..PartialViewConfig::default()
        };
        let file_config = PartialViewConfig {
            api_url: Some("http://from-file".to_string()),
            request_timeout_secs: Some(60),
            log_dir: Some("/var/log/trigger-view".to_string()),
            ..PartialViewConfig::default()
        };

        let config = ViewConfig::merge(env_config, file_config).unwrap();

        assert_eq!(config.api_url, "http://override");
        assert_eq!(config.request_timeout_secs, 5);
        assert_eq!(config.log_dir, "/var/log/trigger-view");
    }

    #[test]
    fn test_missing_api_url() {
        let result = ViewConfig::merge(PartialViewConfig::default(), PartialViewConfig::default());
        assert!(matches!(result, Err(ConfigError::Missing(_))));
    }

    #[test]
    fn test_missing_file_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let config = read_file_config(&dir.path().join("absent.toml")).unwrap();
        assert!(config.api_url.is_none());
    }

    #[test]
    fn test_invalid_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "api_url = ").unwrap();

        let result = read_file_config(file.path());
        assert!(matches!(result, Err(ConfigError::Parse { .. })));
    }
}
