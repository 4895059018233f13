//! Shared configuration for the faro event export pipeline.

pub mod config;

pub use config::{ConfigError, ConfigLoader, ExporterConfigDto};
