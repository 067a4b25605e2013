//! Loading, saving and converting `~/.nearfield/config.ini`.
//!
//! Settings structs live in [`super::settings`], constants in [`super::defaults`],
//! parsing in [`super::parser`], and serialization in [`super::writer`].

use std::path::{Path, PathBuf};
use std::time::Duration;

use ini::Ini;
use thiserror::Error;

use super::settings::ConfigFile;
use crate::engine::EngineConfig;
use crate::repository::{ClientConfig, RepositoryConfig};
use crate::scheduler::SchedulerConfig;

/// Configuration file errors.
#[derive(Debug, Error)]
pub enum ConfigFileError {
    /// Failed to read config file
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] ini::Error),

    /// Failed to write config file
    #[error("Failed to write config file: {0}")]
    WriteError(String),

    /// Invalid configuration value
    #[error("Invalid configuration: {section}.{key} = '{value}' - {reason}")]
    InvalidValue {
        section: String,
        key: String,
        value: String,
        reason: String,
    },

    /// Failed to create config directory
    #[error("Failed to create config directory: {0}")]
    DirectoryError(std::io::Error),
}

impl ConfigFile {
    /// Load configuration from the default path (~/.nearfield/config.ini).
    ///
    /// If the file doesn't exist, returns defaults.
    pub fn load() -> Result<Self, ConfigFileError> {
        Self::load_from(&config_file_path())
    }

    /// Load configuration from a specific path.
    ///
    /// If the file doesn't exist, returns defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigFileError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let ini = Ini::load_from_file(path)?;
        super::parser::parse_ini(&ini)
    }

    /// Save configuration to the default path.
    pub fn save(&self) -> Result<(), ConfigFileError> {
        self.save_to(&config_file_path())
    }

    /// Save configuration to a specific path, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigFileError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(ConfigFileError::DirectoryError)?;
        }

        let content = super::writer::to_config_string(self);
        std::fs::write(path, content).map_err(|e| ConfigFileError::WriteError(e.to_string()))
    }

    /// Create the default config file if it doesn't exist.
    ///
    /// Returns the path to the config file.
    pub fn ensure_exists() -> Result<PathBuf, ConfigFileError> {
        let path = config_file_path();
        if !path.exists() {
            Self::default().save_to(&path)?;
        }
        Ok(path)
    }

    /// HTTP client settings.
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            base_url: self.api.base_url.clone(),
            timeout: Duration::from_secs(self.api.timeout_secs),
            token: self.api.token.clone(),
        }
    }

    /// Repository settings. Results are not reused outside the scheduler's
    /// recency window.
    pub fn repository_config(&self) -> RepositoryConfig {
        RepositoryConfig {
            page_limit: self.query.page_limit,
            ..RepositoryConfig::default()
        }
    }

    pub fn scheduler_config(&self) -> SchedulerConfig {
        SchedulerConfig {
            recency_window: Duration::from_secs(self.scheduler.recency_window_secs),
            center_precision: self.query.center_precision,
            page_limit: self.query.page_limit,
        }
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            scheduler: self.scheduler_config(),
            ..EngineConfig::default()
        }
    }

    /// How long to wait for a position reading.
    pub fn position_timeout(&self) -> Duration {
        Duration::from_secs(self.position.timeout_secs)
    }
}

/// Get the path to the config directory (~/.nearfield).
pub fn config_directory() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".nearfield")
}

/// Get the path to the config file (~/.nearfield/config.ini).
pub fn config_file_path() -> PathBuf {
    config_directory().join("config.ini")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::defaults::*;
    use crate::repository::{DEFAULT_BASE_URL, DEFAULT_PAGE_LIMIT};

    #[test]
    fn test_default_config() {
        let config = ConfigFile::default();

        assert_eq!(config.api.base_url, DEFAULT_BASE_URL);
        assert!(config.api.token.is_none());
        assert_eq!(config.query.page_limit, DEFAULT_PAGE_LIMIT);
        assert_eq!(config.scheduler.recency_window_secs, 0);
        assert_eq!(config.position.fallback.latitude(), DEFAULT_FALLBACK_LAT);
        assert!(config.logging.file.ends_with(DEFAULT_LOG_FILE));
    }

    #[test]
    fn test_load_nonexistent_returns_defaults() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let config_path = temp_dir.path().join("nonexistent.ini");

        let config = ConfigFile::load_from(&config_path).unwrap();

        assert_eq!(config.api.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.position.timeout_secs, DEFAULT_POSITION_TIMEOUT_SECS);
    }

    #[test]
    fn test_conversions() {
        let mut config = ConfigFile::default();
        config.api.timeout_secs = 3;
        config.api.token = Some("abc".to_string());
        config.query.page_limit = 20;
        config.query.center_precision = 3;
        config.scheduler.recency_window_secs = 30;

        let client = config.client_config();
        assert_eq!(client.timeout, Duration::from_secs(3));
        assert_eq!(client.token.as_deref(), Some("abc"));

        let scheduler = config.scheduler_config();
        assert_eq!(scheduler.recency_window, Duration::from_secs(30));
        assert_eq!(scheduler.center_precision, 3);
        assert_eq!(scheduler.page_limit, 20);

        assert_eq!(config.repository_config().page_limit, 20);
        assert_eq!(config.engine_config().scheduler.page_limit, 20);
    }
}
