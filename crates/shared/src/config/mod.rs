//! Configuration module for the faro exporter.
//!
//! The configuration system follows these principles:
//!
//! 1. **Single Source of Truth**: all configuration is loaded once at startup
//! 2. **Fail Fast**: errors are reported immediately, no silent fallbacks
//! 3. **DTO Pattern**: configuration is immutable and passed via dependency injection
//!
//! # Environment Variables
//!
//! ## Required
//!
//! - `OUTBOX_DATABASE_URL`: PostgreSQL connection string
//! - `OUTBOX_ENVIRONMENT`: deployment tag stamped on every record
//! - `CLICKHOUSE_URL`: base URL of the sink's HTTP interface
//!
//! ## Optional
//!
//! - `OUTBOX_METADATA_VERSION` (default: 1)
//! - `OUTBOX_DB_POOL_SIZE` (default: 10)
//! - `OUTBOX_BATCH_SIZE` (default: 100)
//! - `OUTBOX_POLL_INTERVAL_MS` (default: 500)
//! - `OUTBOX_MAX_RETRIES` (default: 3)
//! - `OUTBOX_RETENTION_SECS` (default: 604800)
//! - `OUTBOX_CLEANUP_INTERVAL_SECS` (default: 3600)
//! - `CLICKHOUSE_DATABASE` (default: "default")
//! - `CLICKHOUSE_TABLE` (default: "event_log")
//! - `CLICKHOUSE_USER` (default: "default")
//! - `CLICKHOUSE_PASSWORD` (default: "")
//! - `CLICKHOUSE_TIMEOUT_SECS` (default: 10)

pub mod dto;
pub mod error;
pub mod loader;
pub mod validator;

pub use dto::{
    CleanupSettings, DatabaseConfig, ExportSettings, ExporterConfigDto, SinkSettings,
};
pub use error::{ConfigError, Result};
pub use loader::ConfigLoader;
pub use validator::validate_exporter_config;
