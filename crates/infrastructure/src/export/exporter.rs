//! Exporter
//!
//! Drains batches of outbox records into the analytical sink. Each pass
//! runs under a single database transaction: the batch is selected with
//! `FOR UPDATE SKIP LOCKED`, delivered in one indivisible sink call, and
//! marked processed or failed before the transaction commits. A crash
//! between the sink call and the commit rolls everything back, so the
//! batch is re-sent later; the sink must tolerate duplicates.

use faro_domain::outbox::{ExportResult, OutboxError, OutboxStats};
use faro_domain::sink::EventSink;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, warn};

use crate::persistence::outbox::PostgresOutboxStore;

/// Which records a drain pass selects.
#[derive(Debug, Clone, Copy)]
enum Selection {
    Pending,
    Failed { max_retries: i32 },
}

/// Batched exporter over the outbox table.
///
/// Multiple instances may run concurrently against the same table; the
/// lock-and-skip selection partitions the pending set between them.
pub struct Exporter {
    store: PostgresOutboxStore,
    sink: Arc<dyn EventSink>,
}

impl Exporter {
    pub fn new(store: PostgresOutboxStore, sink: Arc<dyn EventSink>) -> Self {
        Self { store, sink }
    }

    pub fn store(&self) -> &PostgresOutboxStore {
        &self.store
    }

    /// Export one batch of pending records.
    ///
    /// Returns `{0, 0}` without writing anything when no pending records
    /// are claimable. Sink failures are recorded on the selected records
    /// and reported in the result, never raised.
    pub async fn run_once(&self, batch_size: usize) -> Result<ExportResult, OutboxError> {
        self.drain(Selection::Pending, batch_size).await
    }

    /// Re-attempt delivery for failed records under the retry bound.
    ///
    /// Records at `retry_count >= max_retries` are left alone; they stay
    /// failed until an operator intervenes and are reported through
    /// [`stats`](Self::stats).
    pub async fn retry_failed(
        &self,
        batch_size: usize,
        max_retries: i32,
    ) -> Result<ExportResult, OutboxError> {
        self.drain(Selection::Failed { max_retries }, batch_size).await
    }

    /// Purge processed records older than the retention window.
    pub async fn purge(&self, retention: Duration) -> Result<u64, OutboxError> {
        self.store.purge_processed(retention).await
    }

    pub async fn stats(&self, max_retries: i32) -> Result<OutboxStats, OutboxError> {
        self.store.get_stats(max_retries).await
    }

    async fn drain(
        &self,
        selection: Selection,
        batch_size: usize,
    ) -> Result<ExportResult, OutboxError> {
        let mut tx = self.store.pool().begin().await?;

        let records = match selection {
            Selection::Pending => self.store.fetch_pending_locked(&mut tx, batch_size).await?,
            Selection::Failed { max_retries } => {
                self.store
                    .fetch_failed_locked(&mut tx, batch_size, max_retries)
                    .await?
            }
        };

        if records.is_empty() {
            // Dropping the transaction rolls it back; nothing was touched.
            return Ok(ExportResult::default());
        }

        // Convert to the sink row format, quarantining malformed records so
        // one bad row cannot starve the rest of the batch.
        let mut rows = Vec::with_capacity(records.len());
        let mut row_ids = Vec::with_capacity(records.len());
        let mut quarantined = 0u64;

        for record in &records {
            match record.to_event_row() {
                Ok(row) => {
                    rows.push(row);
                    row_ids.push(record.id);
                }
                Err(e) => {
                    error!(
                        record_id = record.id,
                        event_type = %record.event_type,
                        error = %e,
                        "Malformed outbox record, quarantining"
                    );
                    self.store
                        .mark_failed(&mut tx, &[record.id], &format!("conversion: {}", e.reason))
                        .await?;
                    quarantined += 1;
                }
            }
        }

        if rows.is_empty() {
            tx.commit().await?;
            return Ok(ExportResult {
                delivered: 0,
                failed: quarantined,
            });
        }

        // The sink call is the only externally-latent step. Whatever the
        // outcome, the status update is the immediate next operation and
        // commits with the locks from the selection above.
        match self.sink.insert(&rows).await {
            Ok(()) => {
                self.store.mark_processed(&mut tx, &row_ids).await?;
                tx.commit().await?;

                debug!(count = row_ids.len(), "Batch delivered to sink");
                Ok(ExportResult {
                    delivered: row_ids.len() as u64,
                    failed: quarantined,
                })
            }
            Err(e) => {
                warn!(
                    count = row_ids.len(),
                    error = %e,
                    "Sink insert failed, marking batch for retry"
                );
                self.store
                    .mark_failed(&mut tx, &row_ids, &e.to_string())
                    .await?;
                tx.commit().await?;

                Ok(ExportResult {
                    delivered: 0,
                    failed: row_ids.len() as u64 + quarantined,
                })
            }
        }
    }
}
