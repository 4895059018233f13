//! Buffered fast path
//!
//! An in-process queue ahead of the durable store for callers that cannot
//! afford one relational write per event. Rows accumulate in a named
//! queue and are flushed as one sink insert when the queue reaches the
//! batch size or the time since the last flush exceeds the batch timeout.
//! A failed flush moves the raw rows onto a separate failed-queue; an
//! explicit reprocessing pass re-attempts them. Same at-least-once
//! contract as the durable path, not a different guarantee.

use faro_domain::sink::{EventRow, EventSink, SinkError};
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, warn};
use uuid::Uuid;

/// Configuration for the buffered fast path.
#[derive(Debug, Clone)]
pub struct EventBufferConfig {
    /// Queue length that triggers a flush
    pub batch_size: usize,
    /// Maximum time between flushes
    pub batch_timeout: Duration,
}

impl Default for EventBufferConfig {
    fn default() -> Self {
        Self {
            batch_size: 100,
            batch_timeout: Duration::from_secs(5),
        }
    }
}

impl EventBufferConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_batch_timeout(mut self, timeout: Duration) -> Self {
        self.batch_timeout = timeout;
        self
    }
}

struct BufferState {
    queue: VecDeque<EventRow>,
    last_flush: Instant,
}

/// Named in-process queue ahead of the sink.
pub struct EventBuffer {
    name: String,
    sink: Arc<dyn EventSink>,
    config: EventBufferConfig,
    state: Mutex<BufferState>,
    failed: Mutex<VecDeque<EventRow>>,
}

impl EventBuffer {
    pub fn new(name: impl Into<String>, sink: Arc<dyn EventSink>, config: EventBufferConfig) -> Self {
        Self {
            name: name.into(),
            sink,
            config,
            state: Mutex::new(BufferState {
                queue: VecDeque::new(),
                last_flush: Instant::now(),
            }),
            failed: Mutex::new(VecDeque::new()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Append a row, flushing if a trigger fires.
    ///
    /// Returns the number of rows flushed by this call (0 when the row was
    /// only buffered). A flush failure is returned to the caller, but the
    /// rows are already safe on the failed-queue.
    pub async fn push(&self, row: EventRow) -> Result<usize, SinkError> {
        let due = {
            let mut state = self.state.lock().await;
            state.queue.push_back(row);
            state.queue.len() >= self.config.batch_size
                || state.last_flush.elapsed() > self.config.batch_timeout
        };

        if due {
            self.flush().await
        } else {
            Ok(0)
        }
    }

    /// Flush when a trigger has fired; for periodic drivers.
    pub async fn flush_if_due(&self) -> Result<usize, SinkError> {
        let due = {
            let state = self.state.lock().await;
            !state.queue.is_empty()
                && (state.queue.len() >= self.config.batch_size
                    || state.last_flush.elapsed() > self.config.batch_timeout)
        };

        if due {
            self.flush().await
        } else {
            Ok(0)
        }
    }

    /// Flush everything currently buffered as one sink insert.
    ///
    /// On failure the drained rows are pushed onto the failed-queue for a
    /// later explicit [`reprocess_failed`](Self::reprocess_failed) pass.
    pub async fn flush(&self) -> Result<usize, SinkError> {
        let rows: Vec<EventRow> = {
            let mut state = self.state.lock().await;
            state.last_flush = Instant::now();
            state.queue.drain(..).collect()
        };

        if rows.is_empty() {
            return Ok(0);
        }

        let flush_id = Uuid::new_v4();
        match self.sink.insert(&rows).await {
            Ok(()) => {
                debug!(
                    queue = %self.name,
                    flush = %flush_id,
                    count = rows.len(),
                    "Flushed buffered events to sink"
                );
                Ok(rows.len())
            }
            Err(e) => {
                warn!(
                    queue = %self.name,
                    flush = %flush_id,
                    count = rows.len(),
                    error = %e,
                    "Flush failed, moving rows to failed-queue"
                );
                self.failed.lock().await.extend(rows);
                Err(e)
            }
        }
    }

    /// Re-attempt delivery of rows parked on the failed-queue.
    ///
    /// Rows stay on the failed-queue, in order, if the sink fails again.
    pub async fn reprocess_failed(&self) -> Result<usize, SinkError> {
        let rows: Vec<EventRow> = {
            let mut failed = self.failed.lock().await;
            failed.drain(..).collect()
        };

        if rows.is_empty() {
            return Ok(0);
        }

        match self.sink.insert(&rows).await {
            Ok(()) => {
                debug!(queue = %self.name, count = rows.len(), "Reprocessed failed events");
                Ok(rows.len())
            }
            Err(e) => {
                let mut failed = self.failed.lock().await;
                for row in rows.into_iter().rev() {
                    failed.push_front(row);
                }
                Err(e)
            }
        }
    }

    pub async fn pending_len(&self) -> usize {
        self.state.lock().await.queue.len()
    }

    pub async fn failed_len(&self) -> usize {
        self.failed.lock().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Utc;
    use std::sync::atomic::{AtomicBool, Ordering};

    struct RecordingSink {
        healthy: AtomicBool,
        batches: std::sync::Mutex<Vec<Vec<EventRow>>>,
    }

    impl RecordingSink {
        fn new() -> Self {
            Self {
                healthy: AtomicBool::new(true),
                batches: std::sync::Mutex::new(Vec::new()),
            }
        }

        fn set_healthy(&self, healthy: bool) {
            self.healthy.store(healthy, Ordering::SeqCst);
        }

        fn batch_sizes(&self) -> Vec<usize> {
            self.batches.lock().unwrap().iter().map(|b| b.len()).collect()
        }
    }

    #[async_trait]
    impl EventSink for RecordingSink {
        async fn insert(&self, rows: &[EventRow]) -> Result<(), SinkError> {
            if !self.healthy.load(Ordering::SeqCst) {
                return Err(SinkError::Rejected {
                    status: 503,
                    message: "unavailable".to_string(),
                });
            }
            self.batches.lock().unwrap().push(rows.to_vec());
            Ok(())
        }
    }

    fn make_row(event_type: &str) -> EventRow {
        EventRow {
            event_type: event_type.to_string(),
            event_time: Utc::now(),
            environment: "test".to_string(),
            event_context: "{}".to_string(),
            metadata_version: 1,
        }
    }

    #[tokio::test]
    async fn test_flush_on_size_threshold() {
        let sink = Arc::new(RecordingSink::new());
        let buffer = EventBuffer::new(
            "events",
            sink.clone(),
            EventBufferConfig::new().with_batch_size(3),
        );

        assert_eq!(buffer.push(make_row("a")).await.unwrap(), 0);
        assert_eq!(buffer.push(make_row("b")).await.unwrap(), 0);
        assert_eq!(buffer.pending_len().await, 2);

        assert_eq!(buffer.push(make_row("c")).await.unwrap(), 3);
        assert_eq!(buffer.pending_len().await, 0);
        assert_eq!(sink.batch_sizes(), vec![3]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_flush_on_timeout() {
        let sink = Arc::new(RecordingSink::new());
        let buffer = EventBuffer::new(
            "events",
            sink.clone(),
            EventBufferConfig::new()
                .with_batch_size(100)
                .with_batch_timeout(Duration::from_secs(5)),
        );

        assert_eq!(buffer.push(make_row("a")).await.unwrap(), 0);
        assert_eq!(buffer.flush_if_due().await.unwrap(), 0);

        tokio::time::advance(Duration::from_secs(6)).await;

        assert_eq!(buffer.push(make_row("b")).await.unwrap(), 2);
        assert_eq!(sink.batch_sizes(), vec![2]);
    }

    #[tokio::test]
    async fn test_failed_flush_parks_rows() {
        let sink = Arc::new(RecordingSink::new());
        sink.set_healthy(false);

        let buffer = EventBuffer::new(
            "events",
            sink.clone(),
            EventBufferConfig::new().with_batch_size(2),
        );

        buffer.push(make_row("a")).await.unwrap();
        assert!(buffer.push(make_row("b")).await.is_err());

        assert_eq!(buffer.pending_len().await, 0);
        assert_eq!(buffer.failed_len().await, 2);

        // Still failing: rows stay parked, in order.
        assert!(buffer.reprocess_failed().await.is_err());
        assert_eq!(buffer.failed_len().await, 2);

        sink.set_healthy(true);
        assert_eq!(buffer.reprocess_failed().await.unwrap(), 2);
        assert_eq!(buffer.failed_len().await, 0);

        let batches = sink.batches.lock().unwrap();
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0][0].event_type, "a");
        assert_eq!(batches[0][1].event_type, "b");
    }

    #[tokio::test]
    async fn test_explicit_flush_drains_everything() {
        let sink = Arc::new(RecordingSink::new());
        let buffer = EventBuffer::new(
            "events",
            sink.clone(),
            EventBufferConfig::new().with_batch_size(100),
        );

        buffer.push(make_row("a")).await.unwrap();
        buffer.push(make_row("b")).await.unwrap();

        assert_eq!(buffer.flush().await.unwrap(), 2);
        assert_eq!(buffer.flush().await.unwrap(), 0);
        assert_eq!(sink.batch_sizes(), vec![2]);
    }
}
