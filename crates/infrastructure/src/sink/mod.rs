//! Sink clients.

pub mod clickhouse;

pub use clickhouse::{ClickHouseSink, SinkConfig};
