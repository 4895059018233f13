//! ClickHouse sink client
//!
//! Ships event batches to ClickHouse over its HTTP interface as a single
//! `INSERT ... FORMAT JSONEachRow` request. The request carries an
//! explicit timeout; a timeout is a sink failure like any other and the
//! exporter marks the batch for retry.

use async_trait::async_trait;
use faro_domain::sink::{EventRow, EventSink, SinkError, EVENT_LOG_COLUMNS};
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

/// Sink connection configuration.
#[derive(Debug, Clone)]
pub struct SinkConfig {
    /// Base URL of the ClickHouse HTTP interface.
    pub url: String,
    /// Target database (schema) name.
    pub database: String,
    /// Target event log table name.
    pub table: String,
    pub user: String,
    pub password: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:8123".to_string(),
            database: "default".to_string(),
            table: "event_log".to_string(),
            user: "default".to_string(),
            password: String::new(),
            timeout_secs: 10,
        }
    }
}

/// ClickHouse bulk-insert client.
pub struct ClickHouseSink {
    config: SinkConfig,
    client: Client,
}

impl ClickHouseSink {
    pub fn new(config: SinkConfig) -> Result<Self, SinkError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| SinkError::Transport(e.to_string()))?;

        Ok(Self { config, client })
    }

    fn insert_sql(&self) -> String {
        format!(
            "INSERT INTO {}.{} ({}) FORMAT JSONEachRow",
            self.config.database,
            self.config.table,
            EVENT_LOG_COLUMNS.join(", ")
        )
    }

    /// Encode a batch as newline-delimited JSON, one row per line.
    fn encode_rows(rows: &[EventRow]) -> Result<String, SinkError> {
        let mut body = String::with_capacity(rows.len() * 128);
        for row in rows {
            let line =
                serde_json::to_string(row).map_err(|e| SinkError::Encode(e.to_string()))?;
            body.push_str(&line);
            body.push('\n');
        }
        Ok(body)
    }
}

#[async_trait]
impl EventSink for ClickHouseSink {
    async fn insert(&self, rows: &[EventRow]) -> Result<(), SinkError> {
        if rows.is_empty() {
            return Ok(());
        }

        let body = Self::encode_rows(rows)?;

        let response = self
            .client
            .post(&self.config.url)
            .query(&[("query", self.insert_sql())])
            .basic_auth(&self.config.user, Some(&self.config.password))
            .body(body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    SinkError::Timeout
                } else {
                    SinkError::Transport(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(SinkError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        debug!(rows = rows.len(), table = %self.config.table, "Batch inserted into sink");
        Ok(())
    }
}
