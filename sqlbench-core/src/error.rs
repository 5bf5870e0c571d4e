use thiserror::Error;

/// Failure taxonomy for a benchmark run.
///
/// A `Prepare` error is fatal and happens before any worker spawns. A
/// `Transaction` error terminates only the worker that hit it and ends up as
/// a warning in the final report.
#[derive(Debug, Error)]
pub enum BenchError {
    #[error("error while preparing database for benchmark: {0}")]
    Prepare(#[source] anyhow::Error),

    #[error("transaction failed: {0}")]
    Transaction(#[source] anyhow::Error),

    #[error("error while cleaning up database: {0}")]
    Cleanup(#[source] anyhow::Error),
}
