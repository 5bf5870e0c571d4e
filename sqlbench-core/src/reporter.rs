use crate::constants::DEFAULT_PROGRESS_INTERVAL;
use crate::stats::StatTracker;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
#[allow(unused)]
use tracing::{debug, error, info, trace, warn};

/// Emits periodic partial results while a run is in flight.
///
/// The reporter only reads the shared tracker, so it never blocks workers.
/// It goes back to sleep only while a full period still fits before the
/// deadline, which means it can never be the reason a run outlives its
/// deadline.
pub struct ProgressReporter {
    tracker: Arc<StatTracker>,
    deadline: Instant,
    concurrency: usize,
    interval: Duration,
}

impl ProgressReporter {
    pub fn new(tracker: Arc<StatTracker>, deadline: Instant, concurrency: usize) -> Self {
        Self {
            tracker,
            deadline,
            concurrency,
            interval: DEFAULT_PROGRESS_INTERVAL,
        }
    }

    /// Override the reporting period.
    pub fn interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub async fn run(self) {
        while Instant::now() + self.interval < self.deadline {
            tokio::time::sleep(self.interval).await;

            let snapshot = self.tracker.snapshot();
            if snapshot.count == 0 {
                info!("Partial results: no transactions processed yet");
                continue;
            }
            info!(
                "Partial results: {:.3} tps, {:.3} ms latency, {:.3} stddev",
                snapshot.raw_tps(self.concurrency),
                snapshot.mean,
                snapshot.stddev,
            );
        }
    }
}
