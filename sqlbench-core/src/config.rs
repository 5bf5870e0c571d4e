use std::time::Duration;

/// Immutable parameters for one benchmark run.
///
/// Built once at startup and shared read-only by every worker. The CLI layer
/// validates that the numeric fields are positive before this struct exists,
/// so the engine treats them as such.
#[derive(Clone, Debug)]
pub struct BenchConfig {
    /// Number of concurrent clients simulated.
    pub concurrency: usize,
    /// Sizes the keyspace transaction parameters are drawn from.
    pub scale: u64,
    /// How long workers keep issuing transactions.
    pub duration: Duration,
    /// Issue read-only transactions instead of the read-write mix.
    pub read_only: bool,
}

impl BenchConfig {
    pub fn new(concurrency: usize, scale: u64, duration: Duration, read_only: bool) -> Self {
        Self {
            concurrency,
            scale,
            duration,
            read_only,
        }
    }
}
