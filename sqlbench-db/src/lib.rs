//! Database strategies for the sqlbench engine.
//!
//! One [`sqlbench_core::DatabaseStrategy`] implementation per supported
//! engine, selected once at startup. A strategy owns the benchmark schema
//! lifecycle (drop, create, populate, index, analyze) and hands out
//! single-connection transaction executors to workers.

mod config;
mod mysql;
mod postgres;

pub use config::{DbConfig, DbEngine};
pub use mysql::MySqlStrategy;
pub use postgres::PostgresStrategy;

use sqlbench_core::DatabaseStrategy;
use std::sync::Arc;
use std::time::Duration;

/// The four benchmark tables, in creation order.
pub(crate) const TABLES: [&str; 4] = [
    "bench_branches",
    "bench_tellers",
    "bench_accounts",
    "bench_history",
];

/// Rows per multi-row INSERT during population. Bounded so the bind-parameter
/// count stays well under PostgreSQL's 65535-parameter limit.
pub(crate) const INSERT_BATCH_ROWS: u64 = 10_000;

/// Instantiate the strategy for the configured engine.
pub fn strategy_for(config: DbConfig) -> Arc<dyn DatabaseStrategy> {
    match config.engine {
        DbEngine::Postgres => Arc::new(PostgresStrategy::new(config)),
        DbEngine::MySql => Arc::new(MySqlStrategy::new(config)),
    }
}

/// Millisecond-resolution rendering of a setup step's duration.
pub(crate) fn fmt_elapsed(elapsed: Duration) -> String {
    humantime::format_duration(Duration::from_millis(elapsed.as_millis() as u64)).to_string()
}
