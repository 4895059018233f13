//! Export Worker
//!
//! Background worker that drives the exporter on a fixed cadence. Each
//! tick drains the pending backlog, gives failed records one retry pass,
//! and reports the dead-letter backlog for operator visibility.

use faro_domain::outbox::OutboxError;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time;
use tracing::{info, warn};

use super::exporter::Exporter;

/// Configuration for the export worker.
#[derive(Debug, Clone)]
pub struct ExportWorkerConfig {
    /// Maximum number of records claimed per exporter pass
    pub batch_size: usize,
    /// How often to poll for pending records
    pub poll_interval: Duration,
    /// Automatic retry bound for failed records
    pub max_retries: i32,
    pub enabled: bool,
}

impl Default for ExportWorkerConfig {
    fn default() -> Self {
        Self {
            batch_size: 100,
            poll_interval: Duration::from_millis(500),
            max_retries: 3,
            enabled: true,
        }
    }
}

impl ExportWorkerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_max_retries(mut self, max_retries: i32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }
}

/// Metrics from the export worker
#[derive(Debug, Default)]
pub struct ExportMetrics {
    pub delivered: AtomicU64,
    pub failed: AtomicU64,
    pub retried: AtomicU64,
    pub cycles: AtomicU64,
    pub errors: AtomicU64,
}

impl ExportMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn delivered_count(&self) -> u64 {
        self.delivered.load(Ordering::SeqCst)
    }

    pub fn failed_count(&self) -> u64 {
        self.failed.load(Ordering::SeqCst)
    }

    pub fn retried_count(&self) -> u64 {
        self.retried.load(Ordering::SeqCst)
    }

    pub fn error_count(&self) -> u64 {
        self.errors.load(Ordering::SeqCst)
    }
}

/// Export worker.
pub struct ExportWorker {
    exporter: Arc<Exporter>,
    config: ExportWorkerConfig,
    metrics: Arc<ExportMetrics>,
    shutdown: broadcast::Receiver<()>,
}

impl ExportWorker {
    pub fn new(
        exporter: Arc<Exporter>,
        config: ExportWorkerConfig,
        metrics: Arc<ExportMetrics>,
        shutdown: broadcast::Receiver<()>,
    ) -> Self {
        Self {
            exporter,
            config,
            metrics,
            shutdown,
        }
    }

    pub async fn run(mut self) {
        if !self.config.enabled {
            info!("Export worker is disabled");
            return;
        }

        info!(
            batch_size = self.config.batch_size,
            poll_interval = ?self.config.poll_interval,
            max_retries = self.config.max_retries,
            "🚀 Starting export worker"
        );

        let mut interval = time::interval(self.config.poll_interval);

        loop {
            tokio::select! {
                _ = self.shutdown.recv() => {
                    info!("Export worker shutting down");
                    break;
                }
                _ = interval.tick() => {
                    // A cycle in flight is never cancelled; the post-insert
                    // status update always reaches its commit.
                    if let Err(e) = self.cycle().await {
                        warn!(error = %e, "Export cycle failed");
                        self.metrics.errors.fetch_add(1, Ordering::SeqCst);
                    }
                }
            }
        }
    }

    async fn cycle(&self) -> Result<(), OutboxError> {
        self.metrics.cycles.fetch_add(1, Ordering::SeqCst);

        // Drain the backlog: keep claiming until a short batch comes back.
        loop {
            let result = self.exporter.run_once(self.config.batch_size).await?;
            self.metrics
                .delivered
                .fetch_add(result.delivered, Ordering::SeqCst);
            self.metrics.failed.fetch_add(result.failed, Ordering::SeqCst);

            if result.delivered > 0 || result.failed > 0 {
                info!(
                    delivered = result.delivered,
                    failed = result.failed,
                    "Processed outbox batch"
                );
            }

            if (result.total() as usize) < self.config.batch_size {
                break;
            }
        }

        // One retry pass per tick for records under the bound.
        let retried = self
            .exporter
            .retry_failed(self.config.batch_size, self.config.max_retries)
            .await?;
        if !retried.is_empty() {
            self.metrics
                .retried
                .fetch_add(retried.total(), Ordering::SeqCst);
            self.metrics
                .delivered
                .fetch_add(retried.delivered, Ordering::SeqCst);
            info!(
                delivered = retried.delivered,
                failed = retried.failed,
                "Retried failed outbox records"
            );
        }

        let stats = self.exporter.stats(self.config.max_retries).await?;
        if stats.has_dead_letters() {
            warn!(
                dead_lettered = stats.dead_lettered_count,
                "Outbox records exhausted their retry bound; manual intervention required"
            );
        }

        Ok(())
    }
}

/// Start the export worker.
pub fn start_export_worker(
    exporter: Arc<Exporter>,
    config: ExportWorkerConfig,
    shutdown: broadcast::Sender<()>,
) -> (Arc<ExportMetrics>, tokio::task::JoinHandle<()>) {
    let metrics = Arc::new(ExportMetrics::new());
    let shutdown_rx = shutdown.subscribe();

    let worker = ExportWorker::new(exporter, config, metrics.clone(), shutdown_rx);
    let handle = tokio::spawn(async move {
        worker.run().await;
    });

    (metrics, handle)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = ExportWorkerConfig::default();
        assert_eq!(config.batch_size, 100);
        assert_eq!(config.poll_interval, Duration::from_millis(500));
        assert_eq!(config.max_retries, 3);
        assert!(config.enabled);
    }

    #[test]
    fn test_config_builders() {
        let config = ExportWorkerConfig::new()
            .with_batch_size(25)
            .with_poll_interval(Duration::from_secs(2))
            .with_max_retries(5)
            .disabled();

        assert_eq!(config.batch_size, 25);
        assert_eq!(config.poll_interval, Duration::from_secs(2));
        assert_eq!(config.max_retries, 5);
        assert!(!config.enabled);
    }
}
