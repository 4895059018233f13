//! PostgreSQL Outbox Store
//!
//! Implements the durable side of the Transactional Outbox Pattern.

pub mod postgres;
pub mod postgres_tx;

pub use postgres::PostgresOutboxStore;
