// Exporter binary for the faro event pipeline
// Compile: cargo build --bin faro-exporter
// Run: cargo run --bin faro-exporter

use std::sync::Arc;
use std::time::Duration;

use faro_infrastructure::{
    start_cleanup_worker, start_export_worker, CleanupConfig, ClickHouseSink, Exporter,
    ExportWorkerConfig, PostgresOutboxStore, SinkConfig,
};
use faro_shared::ConfigLoader;
use sqlx::postgres::PgPoolOptions;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Configure logging
    tracing_subscriber::fmt::init();

    info!("🚀 Starting faro exporter");

    // Load configuration (.env is optional for local development)
    let env_file = std::path::PathBuf::from(".env");
    let loader = ConfigLoader::new(env_file.exists().then_some(env_file));
    let config = loader.load()?;

    // Relational store
    let pool = PgPoolOptions::new()
        .max_connections(config.database.pool_size)
        .connect(&config.database.url)
        .await?;

    let store = PostgresOutboxStore::new(pool);
    store.run_migrations().await?;

    // Analytical sink
    let sink = Arc::new(ClickHouseSink::new(SinkConfig {
        url: config.sink.url,
        database: config.sink.database,
        table: config.sink.table,
        user: config.sink.user,
        password: config.sink.password,
        timeout_secs: config.sink.timeout_secs,
    })?);

    let exporter = Arc::new(Exporter::new(store, sink));

    // Background workers with graceful shutdown
    let (shutdown_tx, _) = tokio::sync::broadcast::channel(1);

    let export_config = ExportWorkerConfig::new()
        .with_batch_size(config.export.batch_size)
        .with_poll_interval(Duration::from_millis(config.export.poll_interval_ms))
        .with_max_retries(config.export.max_retries);
    let (export_metrics, export_handle) =
        start_export_worker(exporter.clone(), export_config, shutdown_tx.clone());

    let cleanup_config = CleanupConfig::new()
        .with_interval(Duration::from_secs(config.cleanup.interval_secs))
        .with_retention(Duration::from_secs(config.cleanup.retention_secs));
    let (_cleanup_metrics, cleanup_handle) =
        start_cleanup_worker(exporter, cleanup_config, shutdown_tx.clone());

    tokio::signal::ctrl_c().await?;
    info!("🛑 Shutdown signal received, stopping workers...");

    let _ = shutdown_tx.send(());
    export_handle.await?;
    cleanup_handle.await?;

    info!(
        delivered = export_metrics.delivered_count(),
        failed = export_metrics.failed_count(),
        "Faro exporter exited clean"
    );

    Ok(())
}
