//! Infrastructure for the faro event export pipeline.
//!
//! PostgreSQL outbox store, HTTP sink client, the exporter with its
//! background workers, and the queue-buffered fast path.

pub mod export;
pub mod persistence;
pub mod producer;
pub mod sink;

pub use export::{
    start_cleanup_worker, start_export_worker, CleanupConfig, CleanupMetrics, CleanupWorker,
    EventBuffer, EventBufferConfig, Exporter, ExportMetrics, ExportWorker, ExportWorkerConfig,
};
pub use persistence::outbox::PostgresOutboxStore;
pub use producer::Producer;
pub use sink::{ClickHouseSink, SinkConfig};
