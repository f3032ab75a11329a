use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use log::LevelFilter;
use noah_core::DEFAULT_PAGE_SIZE;
use noah_engine::ClientSettings;
use noah_logging::LogDestination;
use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path:?}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse {path:?}: {source}")]
    Parse {
        path: PathBuf,
        source: ron::error::SpannedError,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogTarget {
    File,
    Terminal,
    Both,
}

impl From<LogTarget> for LogDestination {
    fn from(target: LogTarget) -> Self {
        match target {
            LogTarget::File => LogDestination::File,
            LogTarget::Terminal => LogDestination::Terminal,
            LogTarget::Both => LogDestination::Both,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub target: LogTarget,
    /// `off`, `error`, `warn`, `info`, `debug` or `trace`.
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        // The terminal belongs to the progress display.
        Self {
            target: LogTarget::File,
            level: "info".to_string(),
        }
    }
}

impl LogConfig {
    pub fn level_filter(&self) -> LevelFilter {
        self.level.parse().unwrap_or(LevelFilter::Info)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: String,
    /// Socket base for status updates; derived from `server` when unset.
    pub status_server: Option<String>,
    pub upload_concurrency: usize,
    pub connect_timeout_secs: u64,
    pub page_size: u32,
    pub log: LogConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        let settings = ClientSettings::default();
        Self {
            server: settings.base_url,
            status_server: None,
            upload_concurrency: settings.upload_concurrency,
            connect_timeout_secs: settings.connect_timeout.as_secs(),
            page_size: DEFAULT_PAGE_SIZE,
            log: LogConfig::default(),
        }
    }
}

impl AppConfig {
    pub fn client_settings(&self) -> ClientSettings {
        ClientSettings {
            base_url: self.server.clone(),
            status_base_url: self.status_server.clone(),
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            upload_concurrency: self.upload_concurrency,
            ..ClientSettings::default()
        }
    }
}

/// Reads the configuration file. A missing file yields the defaults.
pub fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    let content = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return Ok(AppConfig::default());
        }
        Err(source) => {
            return Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    ron::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config(&dir.path().join("noah.ron")).unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.upload_concurrency, 3);
        assert_eq!(config.server, "http://localhost:8000/");
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("noah.ron");
        fs::write(
            &path,
            r#"(server: "https://media.example.org/", upload_concurrency: 5, log: (level: "debug"))"#,
        )
        .unwrap();

        let config = load_config(&path).unwrap();

        assert_eq!(config.server, "https://media.example.org/");
        assert_eq!(config.upload_concurrency, 5);
        assert_eq!(config.page_size, DEFAULT_PAGE_SIZE);
        assert_eq!(config.log.target, LogTarget::File);
        assert_eq!(config.log.level_filter(), LevelFilter::Debug);

        let settings = config.client_settings();
        assert_eq!(settings.base_url, "https://media.example.org/");
        assert_eq!(settings.upload_concurrency, 5);
        assert_eq!(settings.connect_timeout, Duration::from_secs(10));
    }

    #[test]
    fn unparsable_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("noah.ron");
        fs::write(&path, "(server: 42").unwrap();

        assert!(matches!(
            load_config(&path),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn round_trips_through_ron() {
        let config = AppConfig {
            status_server: Some("wss://media.example.org/".to_string()),
            ..AppConfig::default()
        };
        let text = ron::ser::to_string_pretty(&config, ron::ser::PrettyConfig::new()).unwrap();
        let parsed: AppConfig = ron::from_str(&text).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn unknown_level_falls_back_to_info() {
        let log = LogConfig {
            target: LogTarget::Both,
            level: "loud".to_string(),
        };
        assert_eq!(log.level_filter(), LevelFilter::Info);
    }
}
