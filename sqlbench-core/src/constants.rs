use std::time::Duration;

/// Tellers per branch in the generated keyspace.
pub const TELLERS_PER_BRANCH: u64 = 10;

/// Accounts per branch in the generated keyspace.
pub const ACCOUNTS_PER_BRANCH: u64 = 100_000;

/// Lower bound of the per-transaction balance delta.
pub const DELTA_MIN: i64 = -5_000;

/// Upper bound of the per-transaction balance delta.
pub const DELTA_MAX: i64 = 5_000;

/// Default period between partial-result reports.
pub const DEFAULT_PROGRESS_INTERVAL: Duration = Duration::from_secs(60);

/// Default pause between schema preparation and the first worker spawn.
pub const DEFAULT_SETTLE_TIME: Duration = Duration::from_secs(5);
