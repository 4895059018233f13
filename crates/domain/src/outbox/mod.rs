//! Outbox record model and lifecycle.

pub mod error;
pub mod model;
pub mod stats;

pub use error::OutboxError;
pub use model::{
    to_snake_case, ConversionError, ExportResult, OutboxRecord, OutboxRecordInsert, OutboxStatus,
    SinkEvent,
};
pub use stats::OutboxStats;
