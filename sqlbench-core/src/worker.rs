use crate::config::BenchConfig;
use crate::error::BenchError;
use crate::executor::{TransactionExecutor, TxParams};
use crate::stats::StatTracker;
use std::sync::Arc;
use tokio::time::Instant;
#[allow(unused)]
use tracing::{debug, error, info, trace, warn};

/// Terminal status of one worker task, read by the engine after the join.
#[derive(Debug)]
pub enum WorkerResult {
    Completed,
    Failed(BenchError),
}

/// A single simulated client.
///
/// Runs randomized transactions back to back through its privately-owned
/// executor until the shared deadline passes. The deadline is only checked at
/// iteration boundaries, so an in-flight transaction is never interrupted.
pub struct Worker {
    config: Arc<BenchConfig>,
    tracker: Arc<StatTracker>,
    deadline: Instant,
    executor: Box<dyn TransactionExecutor>,
}

impl Worker {
    pub fn new(
        config: Arc<BenchConfig>,
        tracker: Arc<StatTracker>,
        deadline: Instant,
        executor: Box<dyn TransactionExecutor>,
    ) -> Self {
        Self {
            config,
            tracker,
            deadline,
            executor,
        }
    }

    /// Drive transactions until the deadline.
    ///
    /// On the first executor error the loop stops immediately, with no retry.
    /// Samples recorded before the failure stay in the tracker; only this
    /// worker terminates.
    pub async fn run(mut self) -> WorkerResult {
        while Instant::now() < self.deadline {
            let tx = TxParams::generate(self.config.scale);

            let start = Instant::now();
            let res = if self.config.read_only {
                self.executor.execute_read_only(&tx).await
            } else {
                self.executor.execute_write(&tx).await
            };

            match res {
                Ok(()) => {
                    self.tracker.record(start.elapsed().as_secs_f64() * 1_000.0);

                    #[cfg(feature = "metrics")]
                    metrics::counter!("sqlbench_transaction_success").increment(1);
                }
                Err(err) => {
                    #[cfg(feature = "metrics")]
                    metrics::counter!("sqlbench_transaction_error").increment(1);

                    return WorkerResult::Failed(BenchError::Transaction(err));
                }
            }
        }
        WorkerResult::Completed
    }
}
