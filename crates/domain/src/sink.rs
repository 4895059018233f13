//! Sink wire contract.
//!
//! The sink is the external analytical store that receives exported event
//! batches. Column order and types are the wire contract; `event_context`
//! is transmitted as an opaque string-encoded document.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

/// Column names of the analytical event log table, in wire order.
pub const EVENT_LOG_COLUMNS: [&str; 5] = [
    "event_type",
    "event_date_time",
    "environment",
    "event_context",
    "metadata_version",
];

/// One row in the sink's event log table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventRow {
    pub event_type: String,
    #[serde(rename = "event_date_time")]
    pub event_time: DateTime<Utc>,
    pub environment: String,
    pub event_context: String,
    pub metadata_version: i64,
}

#[derive(Error, Debug)]
pub enum SinkError {
    #[error("Failed to reach sink: {0}")]
    Transport(String),

    #[error("Sink request timed out")]
    Timeout,

    #[error("Sink rejected batch (status {status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("Failed to encode batch: {0}")]
    Encode(String),
}

/// Bulk-insert client for the analytical sink.
///
/// A batch is one indivisible insert call; partial success is not modeled.
/// Implementations must apply an explicit timeout to the call; a timeout
/// is treated identically to any other sink failure.
#[async_trait]
pub trait EventSink: Send + Sync {
    async fn insert(&self, rows: &[EventRow]) -> Result<(), SinkError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_event_row_wire_encoding() {
        let row = EventRow {
            event_type: "user_created".to_string(),
            event_time: Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap(),
            environment: "test".to_string(),
            event_context: r#"{"email":"a@b.test"}"#.to_string(),
            metadata_version: 1,
        };

        let encoded = serde_json::to_value(&row).unwrap();
        // The serialized field set must match EVENT_LOG_COLUMNS.
        let object = encoded.as_object().unwrap();
        assert_eq!(object.len(), EVENT_LOG_COLUMNS.len());
        for column in EVENT_LOG_COLUMNS {
            assert!(object.contains_key(column), "missing column {}", column);
        }
        assert_eq!(encoded["event_date_time"], "2024-05-01T12:30:00Z");
        assert_eq!(encoded["event_context"], r#"{"email":"a@b.test"}"#);
    }
}
