//! Configuration loader
//!
//! Loads configuration from an optional .env file and environment
//! variables, then validates it before handing it to the process.

use std::path::Path;

use super::dto::ExporterConfigDto;
use super::error::{ConfigError, Result};
use super::validator::validate_exporter_config;

/// Configuration loader
///
/// Values from the .env file take precedence over an unset environment,
/// which allows local development overrides without modifying the system
/// environment.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    /// Optional path to .env file
    env_file_path: Option<std::path::PathBuf>,
}

impl ConfigLoader {
    pub fn new(env_file_path: Option<std::path::PathBuf>) -> Self {
        Self { env_file_path }
    }

    /// Load and validate the exporter configuration.
    ///
    /// # Returns
    ///
    /// `Ok(ExporterConfigDto)` if configuration is valid and complete,
    /// `Err(ConfigError)` if required configuration is missing or invalid.
    pub fn load(&self) -> Result<ExporterConfigDto> {
        if let Some(path) = &self.env_file_path {
            self.load_env_file(path)?;
        }

        let config = ExporterConfigDto::from_env()?;
        validate_exporter_config(&config)?;

        Ok(config)
    }

    fn load_env_file(&self, path: &Path) -> Result<()> {
        dotenv::from_path(path).map_err(|source| ConfigError::EnvFileLoad {
            path: path.to_path_buf(),
            source,
        })
    }
}
