//! Core benchmark execution engine.
//!
//! The engine drives a fixed-duration, multi-client transactional workload
//! against a backing store and produces throughput and latency statistics.
//! The store itself is abstracted behind [`DatabaseStrategy`] and
//! [`TransactionExecutor`]; concrete SQL implementations live in the
//! `sqlbench-db` crate.

mod config;
mod constants;
mod engine;
mod error;
mod executor;
mod reporter;
mod stats;
mod worker;

pub use config::*;
pub use constants::*;
pub use engine::*;
pub use error::*;
pub use executor::*;
pub use reporter::*;
pub use stats::*;
pub use worker::*;
