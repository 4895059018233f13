//! Error types for outbox operations.

/// Error type for outbox persistence and export operations.
///
/// Enqueue failures must propagate to the caller so the enclosing business
/// transaction aborts; export failures are recorded on the record itself
/// and never escape the exporter as a process-fatal error.
#[derive(Debug, thiserror::Error)]
pub enum OutboxError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Infrastructure error: {message}")]
    InfrastructureError { message: String },
}
