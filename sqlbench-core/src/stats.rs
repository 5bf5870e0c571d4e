use metrics_util::AtomicBucket;

/// Thread-safe accumulator for per-transaction latencies.
///
/// Samples are kept in a lock-free append-only bucket so arbitrarily many
/// workers can record concurrently without contending on a lock. Insertion
/// order is irrelevant; only the multiset of values matters.
pub struct StatTracker {
    samples: AtomicBucket<f64>,
}

impl StatTracker {
    pub fn new() -> Self {
        Self {
            samples: AtomicBucket::new(),
        }
    }

    /// Record one latency sample, in milliseconds.
    ///
    /// Conversion to milliseconds happens once, here, so every stored sample
    /// shares a single unit.
    pub fn record(&self, latency_ms: f64) {
        self.samples.push(latency_ms);

        #[cfg(feature = "metrics")]
        metrics::histogram!("sqlbench_transaction_latency_ms").record(latency_ms);
    }

    /// Compute descriptive statistics over everything recorded so far.
    ///
    /// The snapshot reflects a consistent state of the bucket; a concurrent
    /// `record` is either fully included or not yet visible.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot::compute(&self.samples.data())
    }
}

impl Default for StatTracker {
    fn default() -> Self {
        Self::new()
    }
}

/// Descriptive statistics over a sample set, derived on demand.
///
/// With no samples every field is zero. With a single sample the variance and
/// stddev are zero (insufficient degrees of freedom), never NaN.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct StatsSnapshot {
    pub count: usize,
    /// Sum of all samples, in milliseconds.
    pub sum: f64,
    pub mean: f64,
    /// Sample variance (Bessel-corrected, `n - 1` denominator).
    pub variance: f64,
    pub stddev: f64,
}

impl StatsSnapshot {
    fn compute(samples: &[f64]) -> Self {
        if samples.is_empty() {
            return Self::default();
        }

        let count = samples.len();
        let sum: f64 = samples.iter().sum();
        let mean = statistical::mean(samples);
        let (variance, stddev) = if count > 1 {
            let variance = statistical::variance(samples, Some(mean));
            (variance, variance.sqrt())
        } else {
            (0.0, 0.0)
        };

        Self {
            count,
            sum,
            mean,
            variance,
            stddev,
        }
    }

    /// Transactions per second computed from summed per-transaction latency,
    /// normalized by the number of concurrent workers. Excludes connection
    /// and client overhead spent outside the timed call.
    pub fn raw_tps(&self, concurrency: usize) -> f64 {
        // A sub-resolution clock can leave the sum at zero even with samples
        // present; report 0.0 rather than infinity.
        if self.count == 0 || self.sum <= 0.0 {
            return 0.0;
        }
        self.count as f64 / (self.sum / 1_000.0 / concurrency as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn empty_tracker_snapshots_to_zero() {
        let tracker = StatTracker::new();
        let snapshot = tracker.snapshot();
        assert_eq!(snapshot.count, 0);
        assert_eq!(snapshot.sum, 0.0);
        assert_eq!(snapshot.mean, 0.0);
        assert_eq!(snapshot.variance, 0.0);
        assert_eq!(snapshot.stddev, 0.0);
    }

    #[test]
    fn single_sample_has_zero_variance() {
        let tracker = StatTracker::new();
        tracker.record(42.5);
        let snapshot = tracker.snapshot();
        assert_eq!(snapshot.count, 1);
        assert_eq!(snapshot.mean, 42.5);
        assert_eq!(snapshot.variance, 0.0);
        assert_eq!(snapshot.stddev, 0.0);
    }

    #[test]
    fn known_distribution() {
        let tracker = StatTracker::new();
        for sample in [10.0, 20.0, 30.0] {
            tracker.record(sample);
        }
        let snapshot = tracker.snapshot();
        assert_eq!(snapshot.count, 3);
        assert!((snapshot.sum - 60.0).abs() < 1e-9);
        assert!((snapshot.mean - 20.0).abs() < 1e-9);
        assert!((snapshot.variance - 100.0).abs() < 1e-9);
        assert!((snapshot.stddev - 10.0).abs() < 1e-9);
    }

    #[test]
    fn concurrent_recording_loses_nothing() {
        let tracker = Arc::new(StatTracker::new());

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let tracker = Arc::clone(&tracker);
                std::thread::spawn(move || {
                    for i in 0..500 {
                        tracker.record(i as f64);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(tracker.snapshot().count, 4_000);
    }

    #[test]
    fn raw_tps_never_divides_by_zero() {
        let empty = StatsSnapshot::default();
        assert_eq!(empty.raw_tps(4), 0.0);

        let tracker = StatTracker::new();
        // 2000 transactions at 1ms each across 2 workers => 2000 tps.
        for _ in 0..2_000 {
            tracker.record(1.0);
        }
        let tps = tracker.snapshot().raw_tps(2);
        assert!((tps - 2_000.0).abs() < 1e-6);
    }

    #[test]
    fn zero_duration_samples_yield_zero_tps() {
        let tracker = StatTracker::new();
        for _ in 0..100 {
            tracker.record(0.0);
        }
        let tps = tracker.snapshot().raw_tps(4);
        assert_eq!(tps, 0.0);
        assert!(tps.is_finite());
    }
}
