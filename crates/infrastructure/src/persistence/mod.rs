//! Persistence layer.

pub mod outbox;
