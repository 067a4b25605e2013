//! CLI runner for common setup and operations.
//!
//! Encapsulates config loading, logging initialization and client creation
//! to reduce duplication across command handlers.

use std::path::Path;

use tracing::info;

use nearfield::config::{ConfigFile, DEFAULT_LOG_FILE};
use nearfield::logging::{init_logging, LoggingGuard};
use nearfield::repository::{
    ArtifactClient, HttpArtifactClient, NearbyArtifactRepository, ScriptedArtifactClient,
};

use crate::commands::common::demo_catalog;
use crate::error::CliError;

/// Runner that manages CLI lifecycle and common operations.
pub struct CliRunner {
    /// Logging guard - keeps logging active while runner exists
    _logging_guard: LoggingGuard,
    /// Loaded configuration file
    config: ConfigFile,
}

impl CliRunner {
    /// Load config and initialize logging.
    ///
    /// # Arguments
    ///
    /// * `debug_mode` - Default to debug-level logging when RUST_LOG is unset
    /// * `stdout_enabled` - Also print log events to stdout
    pub fn new(debug_mode: bool, stdout_enabled: bool) -> Result<Self, CliError> {
        let config = ConfigFile::load()?;

        let log_path = &config.logging.file;
        let log_dir = log_path.parent().unwrap_or_else(|| Path::new("."));
        let log_file = log_path
            .file_name()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| DEFAULT_LOG_FILE.to_string());

        let logging_guard = init_logging(log_dir, &log_file, stdout_enabled, debug_mode)
            .map_err(|e| CliError::LoggingInit(e.to_string()))?;

        Ok(Self {
            _logging_guard: logging_guard,
            config,
        })
    }

    /// Get the loaded configuration.
    pub fn config(&self) -> &ConfigFile {
        &self.config
    }

    /// Log startup information for a command.
    pub fn log_startup(&self, command: &str) {
        info!("Nearfield v{}", nearfield::VERSION);
        info!(base_url = %self.config.api.base_url, "Nearfield CLI: {} command", command);
    }

    /// Repository over the configured HTTP endpoint.
    pub fn http_repository(
        &self,
    ) -> Result<NearbyArtifactRepository<HttpArtifactClient>, CliError> {
        let client = HttpArtifactClient::new(&self.config.client_config())?;
        Ok(self.repository(client))
    }

    /// Repository over the built-in Seattle catalog.
    pub fn demo_repository(
        &self,
    ) -> Result<NearbyArtifactRepository<ScriptedArtifactClient>, CliError> {
        info!("Using built-in demo catalog");
        let client = ScriptedArtifactClient::with_catalog(demo_catalog()?);
        Ok(self.repository(client))
    }

    fn repository<C: ArtifactClient>(&self, client: C) -> NearbyArtifactRepository<C> {
        NearbyArtifactRepository::new(client, self.config.repository_config())
    }
}
