use crate::config::BenchConfig;
use crate::constants::{DEFAULT_PROGRESS_INTERVAL, DEFAULT_SETTLE_TIME};
use crate::error::BenchError;
use crate::executor::DatabaseStrategy;
use crate::reporter::ProgressReporter;
use crate::stats::{StatTracker, StatsSnapshot};
use crate::worker::{Worker, WorkerResult};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
#[allow(unused)]
use tracing::{debug, error, info, instrument, trace, warn};

/// Final outcome of a run.
///
/// `stats` is `None` when not a single transaction completed; partial results
/// from failed workers are always included in the sample set.
#[derive(Debug)]
pub struct BenchReport {
    /// Wall-clock time of the whole concurrent phase.
    pub elapsed: Duration,
    /// Causes reported by workers that stopped early.
    pub failures: Vec<BenchError>,
    pub stats: Option<BenchStats>,
}

/// Aggregate figures computed over the full sample set.
#[derive(Clone, Copy, Debug)]
pub struct BenchStats {
    pub transactions: usize,
    /// Transactions per second over wall-clock run time; includes connection
    /// and client overhead.
    pub wall_clock_tps: f64,
    /// Transactions per second over summed per-transaction latency normalized
    /// by concurrency; excludes overhead outside the timed call.
    pub raw_tps: f64,
    pub mean_latency_ms: f64,
    pub latency_stddev_ms: f64,
}

/// Coordinates one full benchmark run: schema preparation, worker fan-out,
/// progress reporting, aggregation and cleanup.
///
/// The lifecycle is strictly linear; an engine instance executes exactly one
/// run to completion.
pub struct BenchEngine {
    config: Arc<BenchConfig>,
    strategy: Arc<dyn DatabaseStrategy>,
    settle_time: Duration,
    progress_interval: Duration,
}

impl BenchEngine {
    pub fn new(config: BenchConfig, strategy: Arc<dyn DatabaseStrategy>) -> Self {
        Self {
            config: Arc::new(config),
            strategy,
            settle_time: DEFAULT_SETTLE_TIME,
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
        }
    }

    /// Override the pause between schema preparation and the first spawn.
    pub fn settle_time(mut self, settle_time: Duration) -> Self {
        self.settle_time = settle_time;
        self
    }

    /// Override the partial-result reporting period.
    pub fn progress_interval(mut self, interval: Duration) -> Self {
        self.progress_interval = interval;
        self
    }

    /// Execute the run to completion.
    #[instrument(name = "bench", skip_all)]
    pub async fn run(self) -> Result<BenchReport, BenchError> {
        info!("*** PREPARING FOR BENCHMARK ***");
        self.strategy.prepare().await.map_err(BenchError::Prepare)?;

        info!(
            "Settling down for {}...",
            humantime::format_duration(self.settle_time)
        );
        tokio::time::sleep(self.settle_time).await;

        let report = self.run_concurrent_phase().await;

        self.strategy.cleanup().await.map_err(BenchError::Cleanup)?;

        self.print_report(&report);
        Ok(report)
    }

    /// Spawn `concurrency` workers plus one reporter sharing a single tracker
    /// and deadline, then join them all.
    async fn run_concurrent_phase(&self) -> BenchReport {
        info!("Starting {} concurrent workers...", self.config.concurrency);

        let tracker = Arc::new(StatTracker::new());
        let deadline = Instant::now() + self.config.duration;

        let start = Instant::now();
        let mut handles = Vec::with_capacity(self.config.concurrency);
        for _ in 0..self.config.concurrency {
            let config = Arc::clone(&self.config);
            let tracker = Arc::clone(&tracker);
            let strategy = Arc::clone(&self.strategy);
            handles.push(tokio::spawn(async move {
                // Each worker opens its own connection; a failure to connect
                // is reported like any other transaction failure.
                match strategy.executor().await {
                    Ok(executor) => Worker::new(config, tracker, deadline, executor).run().await,
                    Err(err) => WorkerResult::Failed(BenchError::Transaction(err)),
                }
            }));
        }
        let reporter =
            ProgressReporter::new(Arc::clone(&tracker), deadline, self.config.concurrency)
                .interval(self.progress_interval);
        let reporter_handle = tokio::spawn(reporter.run());

        // NOTE: There is no cancellation; a hung executor call is waited out.
        // One worker failing never prevents joining the others.
        let mut failures = Vec::new();
        for handle in handles {
            match handle.await {
                Ok(WorkerResult::Completed) => {}
                Ok(WorkerResult::Failed(err)) => failures.push(err),
                Err(err) => failures.push(BenchError::Transaction(err.into())),
            }
        }
        let _ = reporter_handle.await;
        let elapsed = start.elapsed();

        let snapshot = tracker.snapshot();
        BenchReport {
            elapsed,
            failures,
            stats: aggregate(&snapshot, elapsed, self.config.concurrency),
        }
    }

    fn print_report(&self, report: &BenchReport) {
        info!("*** BENCHMARK RESULT ***");
        info!("Scale factor: {}", self.config.scale);
        info!("Number of concurrent clients: {}", self.config.concurrency);
        info!(
            "Total time elapsed: {}",
            humantime::format_duration(Duration::from_millis(report.elapsed.as_millis() as u64))
        );

        for failure in &report.failures {
            warn!("Worker reported error: {failure}");
        }

        let Some(stats) = &report.stats else {
            info!("No transaction processed, no result to show");
            return;
        };

        info!(
            "Total number of transactions processed: {}",
            stats.transactions
        );
        info!(
            "Transactions per second: {:.3} (including connection and client overhead)",
            stats.wall_clock_tps
        );
        info!(
            "Transactions per second: {:.3} (excluding connection and client overhead)",
            stats.raw_tps
        );
        info!("Average latency: {:.3} ms", stats.mean_latency_ms);
        info!("Latency stddev: {:.3} ms", stats.latency_stddev_ms);
    }
}

fn aggregate(
    snapshot: &StatsSnapshot,
    elapsed: Duration,
    concurrency: usize,
) -> Option<BenchStats> {
    if snapshot.count == 0 {
        return None;
    }
    Some(BenchStats {
        transactions: snapshot.count,
        wall_clock_tps: snapshot.count as f64 / elapsed.as_secs_f64(),
        raw_tps: snapshot.raw_tps(concurrency),
        mean_latency_ms: snapshot.mean,
        latency_stddev_ms: snapshot.stddev,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::TransactionExecutor;
    use crate::worker::tests::StubExecutor;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tracing_test::traced_test;

    /// Strategy handing out stub executors; the n-th executor created (1-based)
    /// can be configured to fail after a number of successful calls.
    struct StubStrategy {
        latency: Duration,
        fail_worker: Option<(usize, u64)>,
        fail_prepare: bool,
        created: AtomicUsize,
    }

    impl StubStrategy {
        fn ok(latency: Duration) -> Self {
            Self {
                latency,
                fail_worker: None,
                fail_prepare: false,
                created: AtomicUsize::new(0),
            }
        }

        fn failing_worker(latency: Duration, worker: usize, successes: u64) -> Self {
            Self {
                latency,
                fail_worker: Some((worker, successes)),
                fail_prepare: false,
                created: AtomicUsize::new(0),
            }
        }

        fn failing_prepare() -> Self {
            Self {
                latency: Duration::ZERO,
                fail_worker: None,
                fail_prepare: true,
                created: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl DatabaseStrategy for StubStrategy {
        async fn prepare(&self) -> anyhow::Result<()> {
            if self.fail_prepare {
                anyhow::bail!("relation \"bench_accounts\" cannot be created");
            }
            Ok(())
        }

        async fn cleanup(&self) -> anyhow::Result<()> {
            Ok(())
        }

        async fn executor(&self) -> anyhow::Result<Box<dyn TransactionExecutor>> {
            let nth = self.created.fetch_add(1, Ordering::SeqCst) + 1;
            Ok(match self.fail_worker {
                Some((worker, successes)) if worker == nth => {
                    Box::new(StubExecutor::failing_after(self.latency, successes))
                }
                _ => Box::new(StubExecutor::with_latency(self.latency)),
            })
        }
    }

    fn config(concurrency: usize, secs: u64) -> BenchConfig {
        BenchConfig::new(concurrency, 1, Duration::from_secs(secs), true)
    }

    #[traced_test]
    #[tokio::test(start_paused = true)]
    async fn end_to_end_run() {
        let strategy = Arc::new(StubStrategy::ok(Duration::from_millis(1)));
        let report = BenchEngine::new(config(4, 2), strategy)
            .settle_time(Duration::ZERO)
            .run()
            .await
            .unwrap();

        assert!(report.failures.is_empty());
        let stats = report.stats.expect("run produced samples");

        // 4 workers x ~2000 calls/sec x 2s.
        assert!(stats.transactions >= 4_000 && stats.transactions <= 8_000);
        // Both throughput figures describe the same run; with a stub executor
        // they land within the same order of magnitude.
        let ratio = stats.wall_clock_tps / stats.raw_tps;
        assert!(ratio > 0.1 && ratio < 10.0, "ratio was {ratio}");
        assert!(stats.mean_latency_ms > 0.5);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_worker_is_isolated() {
        // Worker 3 of 5 fails on its 2nd call; the others run to the deadline.
        let strategy = Arc::new(StubStrategy::failing_worker(Duration::from_millis(10), 3, 1));
        let report = BenchEngine::new(config(5, 1), strategy)
            .settle_time(Duration::ZERO)
            .run()
            .await
            .unwrap();

        assert_eq!(report.failures.len(), 1);
        assert!(matches!(report.failures[0], BenchError::Transaction(_)));

        let stats = report.stats.expect("surviving workers produced samples");
        // 4 surviving workers x 100 calls, plus the 1 sample worker 3
        // recorded before failing.
        assert_eq!(stats.transactions, 401);
    }

    #[traced_test]
    #[tokio::test(start_paused = true)]
    async fn zero_samples_reported_distinctly() {
        // Every executor fails on its first call.
        let strategy = Arc::new(AllFailingStrategy);
        let report = BenchEngine::new(config(3, 1), strategy)
            .settle_time(Duration::ZERO)
            .run()
            .await
            .unwrap();

        assert_eq!(report.failures.len(), 3);
        assert!(report.stats.is_none());
        assert!(logs_contain("No transaction processed"));
    }

    struct AllFailingStrategy;

    #[async_trait]
    impl DatabaseStrategy for AllFailingStrategy {
        async fn prepare(&self) -> anyhow::Result<()> {
            Ok(())
        }

        async fn cleanup(&self) -> anyhow::Result<()> {
            Ok(())
        }

        async fn executor(&self) -> anyhow::Result<Box<dyn TransactionExecutor>> {
            Ok(Box::new(StubExecutor::failing_after(Duration::ZERO, 0)))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn prepare_failure_is_fatal() {
        let strategy = Arc::new(StubStrategy::failing_prepare());
        let err = BenchEngine::new(config(2, 1), strategy)
            .settle_time(Duration::ZERO)
            .run()
            .await
            .unwrap_err();

        assert!(matches!(err, BenchError::Prepare(_)));
    }
}
