//! Export pipeline
//!
//! The exporter drains pending outbox records into the sink; the workers
//! drive it on a schedule; the buffer is the low-latency fast path ahead
//! of the durable store.

pub mod buffer;
pub mod cleanup;
pub mod exporter;
pub mod worker;

pub use buffer::{EventBuffer, EventBufferConfig};
pub use cleanup::{start_cleanup_worker, CleanupConfig, CleanupMetrics, CleanupWorker};
pub use exporter::Exporter;
pub use worker::{start_export_worker, ExportMetrics, ExportWorker, ExportWorkerConfig};
