//! Cleanup Worker
//!
//! Background worker that periodically purges delivered records older than
//! the retention window. Pending and failed records are never touched.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time;
use tracing::{info, warn};

use super::exporter::Exporter;

/// Configuration for the cleanup worker.
#[derive(Debug, Clone)]
pub struct CleanupConfig {
    pub interval: Duration,
    pub retention: Duration,
    pub enabled: bool,
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(3600),
            retention: Duration::from_secs(7 * 24 * 3600),
            enabled: true,
        }
    }
}

impl CleanupConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_retention(mut self, retention: Duration) -> Self {
        self.retention = retention;
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }
}

/// Metrics from the cleanup worker
#[derive(Debug, Default)]
pub struct CleanupMetrics {
    pub records_deleted: AtomicU64,
    pub last_cleanup: AtomicU64,
    pub errors: AtomicU64,
}

impl CleanupMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records_deleted_count(&self) -> u64 {
        self.records_deleted.load(Ordering::SeqCst)
    }

    pub fn error_count(&self) -> u64 {
        self.errors.load(Ordering::SeqCst)
    }
}

/// Cleanup worker.
pub struct CleanupWorker {
    exporter: Arc<Exporter>,
    config: CleanupConfig,
    metrics: Arc<CleanupMetrics>,
    shutdown: broadcast::Receiver<()>,
}

impl CleanupWorker {
    pub fn new(
        exporter: Arc<Exporter>,
        config: CleanupConfig,
        metrics: Arc<CleanupMetrics>,
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
            info!("Cleanup worker is disabled");
            return;
        }

        info!(
            interval = ?self.config.interval,
            retention = ?self.config.retention,
            "Starting outbox cleanup worker"
        );

        let mut interval = time::interval(self.config.interval);

        loop {
            tokio::select! {
                _ = self.shutdown.recv() => {
                    info!("Cleanup worker shutting down");
                    break;
                }
                _ = interval.tick() => {
                    match self.exporter.purge(self.config.retention).await {
                        Ok(deleted) => {
                            if deleted > 0 {
                                info!(deleted = deleted, "Outbox cleanup completed");
                            }
                            self.metrics
                                .records_deleted
                                .fetch_add(deleted, Ordering::SeqCst);
                            self.metrics.last_cleanup.store(
                                chrono::Utc::now().timestamp() as u64,
                                Ordering::SeqCst,
                            );
                        }
                        Err(e) => {
                            warn!(error = %e, "Cleanup iteration failed");
                            self.metrics.errors.fetch_add(1, Ordering::SeqCst);
                        }
                    }
                }
            }
        }
    }
}

/// Start the cleanup worker.
pub fn start_cleanup_worker(
    exporter: Arc<Exporter>,
    config: CleanupConfig,
    shutdown: broadcast::Sender<()>,
) -> (Arc<CleanupMetrics>, tokio::task::JoinHandle<()>) {
    let metrics = Arc::new(CleanupMetrics::new());
    let shutdown_rx = shutdown.subscribe();

    let worker = CleanupWorker::new(exporter, config, metrics.clone(), shutdown_rx);
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
        let config = CleanupConfig::default();
        assert_eq!(config.interval, Duration::from_secs(3600));
        assert_eq!(config.retention, Duration::from_secs(7 * 24 * 3600));
        assert!(config.enabled);
    }

    #[test]
    fn test_config_builders() {
        let config = CleanupConfig::new()
            .with_interval(Duration::from_secs(60))
            .with_retention(Duration::from_secs(86_400))
            .disabled();

        assert_eq!(config.interval, Duration::from_secs(60));
        assert_eq!(config.retention, Duration::from_secs(86_400));
        assert!(!config.enabled);
    }
}
