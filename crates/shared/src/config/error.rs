//! Configuration error types.

use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {name}")]
    MissingVar { name: &'static str },

    #[error("Invalid value for {name}: {value:?} ({expected})")]
    InvalidVar {
        name: &'static str,
        value: String,
        expected: &'static str,
    },

    #[error("Failed to load env file {path}: {source}")]
    EnvFileLoad {
        path: PathBuf,
        #[source]
        source: dotenv::Error,
    },

    #[error("Invalid configuration: {message}")]
    Validation { message: String },
}
