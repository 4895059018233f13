//! Domain model for the faro event export pipeline.
//!
//! Defines the outbox record lifecycle, the sink wire contract, and the
//! error taxonomy shared by the infrastructure implementations.

pub mod outbox;
pub mod sink;

pub use outbox::{
    to_snake_case, ConversionError, ExportResult, OutboxError, OutboxRecord, OutboxRecordInsert,
    OutboxStats, OutboxStatus, SinkEvent,
};
pub use sink::{EventRow, EventSink, SinkError, EVENT_LOG_COLUMNS};
