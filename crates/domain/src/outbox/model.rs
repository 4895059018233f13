//! Outbox Record Model
//!
//! Domain model for outbox records used in the Transactional Outbox Pattern.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::sink::EventRow;

/// Status of an outbox record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutboxStatus {
    /// Record has been created but not yet exported
    Pending,
    /// Record has been successfully delivered to the sink
    Processed,
    /// Last delivery attempt failed; eligible for retry up to the bound
    Failed,
}

impl OutboxStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutboxStatus::Pending => "PENDING",
            OutboxStatus::Processed => "PROCESSED",
            OutboxStatus::Failed => "FAILED",
        }
    }
}

impl std::fmt::Display for OutboxStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for OutboxStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(OutboxStatus::Pending),
            "PROCESSED" => Ok(OutboxStatus::Processed),
            "FAILED" => Ok(OutboxStatus::Failed),
            _ => Err(format!("Invalid outbox status: {}", s)),
        }
    }
}

/// An event that can be recorded in the outbox.
///
/// `event_name` is the structured name of the event (e.g. `UserCreated`);
/// it is normalized to snake_case at enqueue time and becomes part of the
/// wire contract consumed by the sink schema.
pub trait SinkEvent: Serialize {
    fn event_name(&self) -> &'static str;
}

/// An outbox record ready to be inserted into the database.
///
/// The payload is serialized exactly once, when the insert is built; the
/// stored bytes are the durable contract and are never re-encoded.
#[derive(Debug, Clone)]
pub struct OutboxRecordInsert {
    pub event_type: String,
    pub environment: String,
    pub event_context: String,
    pub metadata_version: i64,
}

impl OutboxRecordInsert {
    pub fn new(
        event_type: String,
        environment: String,
        event_context: String,
        metadata_version: i64,
    ) -> Self {
        Self {
            event_type,
            environment,
            event_context,
            metadata_version,
        }
    }

    /// Build an insert from a typed event, serializing the payload once
    /// and normalizing the event name to snake_case.
    pub fn from_event<E: SinkEvent>(
        event: &E,
        environment: &str,
        metadata_version: i64,
    ) -> Result<Self, serde_json::Error> {
        Ok(Self {
            event_type: to_snake_case(event.event_name()),
            environment: environment.to_string(),
            event_context: serde_json::to_string(event)?,
            metadata_version,
        })
    }
}

/// A view of an outbox record read back from the database.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutboxRecord {
    pub id: i64,
    pub event_type: String,
    pub environment: String,
    pub event_context: String,
    pub metadata_version: i64,
    pub status: OutboxStatus,
    pub retry_count: i32,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub processed_at: Option<DateTime<Utc>>,
}

impl OutboxRecord {
    pub fn is_pending(&self) -> bool {
        matches!(self.status, OutboxStatus::Pending)
    }

    pub fn is_processed(&self) -> bool {
        matches!(self.status, OutboxStatus::Processed)
    }

    /// Check if the record has failed and exhausted the retry bound.
    pub fn is_dead_lettered(&self, max_retries: i32) -> bool {
        matches!(self.status, OutboxStatus::Failed) && self.retry_count >= max_retries
    }

    /// Convert the record into the sink's flattened row format.
    ///
    /// Conversion is pure and cannot fail for well-formed stored records;
    /// a failure here is a data integrity bug, not a retryable fault.
    pub fn to_event_row(&self) -> Result<EventRow, ConversionError> {
        if self.event_type.is_empty() {
            return Err(ConversionError {
                id: self.id,
                reason: "empty event_type".to_string(),
            });
        }
        if self.event_context.is_empty() {
            return Err(ConversionError {
                id: self.id,
                reason: "empty event_context".to_string(),
            });
        }

        Ok(EventRow {
            event_type: self.event_type.clone(),
            event_time: self.created_at,
            environment: self.environment.clone(),
            event_context: self.event_context.clone(),
            metadata_version: self.metadata_version,
        })
    }
}

/// A stored record that could not be converted to the sink row format.
#[derive(Debug, thiserror::Error)]
#[error("record {id} is malformed: {reason}")]
pub struct ConversionError {
    pub id: i64,
    pub reason: String,
}

/// Outcome of one exporter pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExportResult {
    /// Records delivered to the sink and marked processed.
    pub delivered: u64,
    /// Records marked failed (sink failure or quarantined conversion).
    pub failed: u64,
}

impl ExportResult {
    pub fn is_empty(&self) -> bool {
        self.delivered == 0 && self.failed == 0
    }

    pub fn total(&self) -> u64 {
        self.delivered + self.failed
    }
}

/// Convert a structured event name to snake_case.
///
/// An underscore is inserted before an uppercase letter that either starts
/// a new word (`UserCreated` -> `user_created`) or ends an acronym run
/// (`HTTPRequest` -> `http_request`). The normalization is deterministic
/// and is part of the wire contract.
pub fn to_snake_case(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut out = String::with_capacity(name.len() + 4);

    for (i, &c) in chars.iter().enumerate() {
        if c.is_ascii_uppercase() && i > 0 {
            let prev = chars[i - 1];
            let next_is_lower = chars.get(i + 1).is_some_and(|n| n.is_ascii_lowercase());
            if next_is_lower || prev.is_ascii_lowercase() || prev.is_ascii_digit() {
                out.push('_');
            }
        }
        out.push(c.to_ascii_lowercase());
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snake_case_simple() {
        assert_eq!(to_snake_case("UserCreated"), "user_created");
        assert_eq!(to_snake_case("OrderShipped"), "order_shipped");
    }

    #[test]
    fn test_snake_case_acronyms_and_digits() {
        assert_eq!(to_snake_case("HTTPRequest"), "http_request");
        assert_eq!(to_snake_case("UserCreatedV2"), "user_created_v2");
        assert_eq!(to_snake_case("ABTest"), "ab_test");
    }

    #[test]
    fn test_snake_case_already_normalized() {
        assert_eq!(to_snake_case("user_created"), "user_created");
        assert_eq!(to_snake_case("event"), "event");
    }

    #[test]
    fn test_status_round_trip() {
        for status in [
            OutboxStatus::Pending,
            OutboxStatus::Processed,
            OutboxStatus::Failed,
        ] {
            assert_eq!(status.as_str().parse::<OutboxStatus>().unwrap(), status);
        }
        assert!("PUBLISHED".parse::<OutboxStatus>().is_err());
    }

    #[test]
    fn test_insert_from_event_serializes_once() {
        #[derive(Serialize)]
        struct UserCreated {
            email: String,
        }

        impl SinkEvent for UserCreated {
            fn event_name(&self) -> &'static str {
                "UserCreated"
            }
        }

        let event = UserCreated {
            email: "a@b.test".to_string(),
        };
        let insert = OutboxRecordInsert::from_event(&event, "test", 1).unwrap();

        assert_eq!(insert.event_type, "user_created");
        assert_eq!(insert.environment, "test");
        assert_eq!(insert.metadata_version, 1);
        assert_eq!(insert.event_context, r#"{"email":"a@b.test"}"#);
    }

    #[test]
    fn test_record_conversion() {
        let record = OutboxRecord {
            id: 7,
            event_type: "user_created".to_string(),
            environment: "test".to_string(),
            event_context: r#"{"email":"a@b.test"}"#.to_string(),
            metadata_version: 1,
            status: OutboxStatus::Pending,
            retry_count: 0,
            error_message: None,
            created_at: Utc::now(),
            processed_at: None,
        };

        let row = record.to_event_row().unwrap();
        assert_eq!(row.event_type, "user_created");
        assert_eq!(row.environment, "test");
        assert_eq!(row.event_context, record.event_context);
        assert_eq!(row.event_time, record.created_at);
        assert_eq!(row.metadata_version, 1);
    }

    #[test]
    fn test_record_conversion_rejects_malformed() {
        let record = OutboxRecord {
            id: 8,
            event_type: String::new(),
            environment: "test".to_string(),
            event_context: "{}".to_string(),
            metadata_version: 1,
            status: OutboxStatus::Pending,
            retry_count: 0,
            error_message: None,
            created_at: Utc::now(),
            processed_at: None,
        };

        let err = record.to_event_row().unwrap_err();
        assert_eq!(err.id, 8);
    }

    #[test]
    fn test_dead_letter_bound() {
        let mut record = OutboxRecord {
            id: 1,
            event_type: "user_created".to_string(),
            environment: "test".to_string(),
            event_context: "{}".to_string(),
            metadata_version: 1,
            status: OutboxStatus::Failed,
            retry_count: 2,
            error_message: Some("sink unavailable".to_string()),
            created_at: Utc::now(),
            processed_at: None,
        };

        assert!(!record.is_dead_lettered(3));
        record.retry_count = 3;
        assert!(record.is_dead_lettered(3));
    }
}
