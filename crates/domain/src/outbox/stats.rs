//! Outbox statistics for monitoring and alerting.

/// Counts by status plus the dead-letter backlog.
///
/// `dead_lettered` counts FAILED records at or past the retry bound; they
/// are never retried automatically and must be surfaced to an operator.
#[derive(Debug, Clone, Default)]
pub struct OutboxStats {
    pub pending_count: u64,
    pub processed_count: u64,
    pub failed_count: u64,
    pub dead_lettered_count: u64,
    pub oldest_pending_age_seconds: Option<i64>,
}

impl OutboxStats {
    pub fn total(&self) -> u64 {
        self.pending_count + self.processed_count + self.failed_count
    }

    pub fn has_dead_letters(&self) -> bool {
        self.dead_lettered_count > 0
    }
}
