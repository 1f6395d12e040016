use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use assistant_engine::StreamSettings;
use assistant_logging::{assistant_info, LogDestination};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub(crate) const DEFAULT_CONFIG_FILENAME: &str = "assistant.ron";
pub(crate) const BASE_URL_ENV: &str = "ASSISTANT_BASE_URL";

#[derive(Debug, Error)]
pub(crate) enum ConfigError {
    #[error("failed to read config {path:?}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config {path:?}: {message}")]
    Parse { path: PathBuf, message: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct AppConfig {
    pub base_url: String,
    pub user_id: String,
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
    pub read_timeout_secs: u64,
    pub max_bytes: u64,
    pub log_to_file: bool,
    pub log_to_terminal: bool,
    pub log_path: PathBuf,
    pub verbose: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        let stream = StreamSettings::default();
        Self {
            base_url: stream.base_url,
            user_id: "guest".to_string(),
            connect_timeout_secs: stream.connect_timeout.as_secs(),
            request_timeout_secs: stream.request_timeout.as_secs(),
            read_timeout_secs: stream.read_timeout.as_secs(),
            max_bytes: stream.max_bytes,
            log_to_file: true,
            log_to_terminal: false,
            log_path: PathBuf::from("./assistant.log"),
            verbose: false,
        }
    }
}

impl AppConfig {
    pub fn stream_settings(&self) -> StreamSettings {
        StreamSettings {
            base_url: self.base_url.clone(),
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            read_timeout: Duration::from_secs(self.read_timeout_secs),
            max_bytes: self.max_bytes,
        }
    }

    /// Terminal logging is the fallback when both flags are off.
    pub fn log_destination(&self) -> LogDestination {
        match (self.log_to_file, self.log_to_terminal) {
            (true, true) => LogDestination::Both,
            (true, false) => LogDestination::File,
            (false, _) => LogDestination::Terminal,
        }
    }

    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(base_url) = lookup(BASE_URL_ENV).filter(|value| !value.trim().is_empty()) {
            self.base_url = base_url.trim().to_string();
        }
    }
}

/// Load configuration from a RON file. A missing file yields the defaults.
pub(crate) fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    let content = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return Ok(AppConfig::default());
        }
        Err(source) => {
            return Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            });
        }
    };

    let config = ron::from_str(&content).map_err(|err| ConfigError::Parse {
        path: path.to_path_buf(),
        message: err.to_string(),
    })?;
    assistant_info!("Loaded configuration from {:?}", path);
    Ok(config)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use assistant_logging::LogDestination;

    use super::{load_config, AppConfig, ConfigError, BASE_URL_ENV};

    #[test]
    fn missing_file_gives_defaults() {
        let temp = TempDir::new().unwrap();
        let config = load_config(&temp.path().join("absent.ron")).unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("assistant.ron");
        fs::write(&path, "(base_url: \"http://clinic:9000\", user_id: \"p-42\")").unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.base_url, "http://clinic:9000");
        assert_eq!(config.user_id, "p-42");
        assert_eq!(config.max_bytes, AppConfig::default().max_bytes);
        assert_eq!(config.stream_settings().base_url, "http://clinic:9000");
    }

    #[test]
    fn log_flags_select_destination() {
        let mut config = AppConfig::default();
        assert_eq!(config.log_destination(), LogDestination::File);
        config.log_to_terminal = true;
        assert_eq!(config.log_destination(), LogDestination::Both);
        config.log_to_file = false;
        assert_eq!(config.log_destination(), LogDestination::Terminal);
    }

    #[test]
    fn read_timeout_reaches_stream_settings() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("assistant.ron");
        fs::write(&path, "(request_timeout_secs: 5, read_timeout_secs: 90)").unwrap();

        let settings = load_config(&path).unwrap().stream_settings();
        assert_eq!(settings.request_timeout.as_secs(), 5);
        assert_eq!(settings.read_timeout.as_secs(), 90);
    }

    #[test]
    fn invalid_file_is_an_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("assistant.ron");
        fs::write(&path, "(base_url: 12").unwrap();
        assert!(matches!(
            load_config(&path),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn env_overrides_base_url() {
        let mut config = AppConfig::default();
        config.apply_env_overrides(|key| {
            (key == BASE_URL_ENV).then(|| " http://override:1 ".to_string())
        });
        assert_eq!(config.base_url, "http://override:1");

        config.apply_env_overrides(|_| Some(String::new()));
        assert_eq!(config.base_url, "http://override:1");
    }
}
