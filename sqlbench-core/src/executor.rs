use crate::constants::{ACCOUNTS_PER_BRANCH, DELTA_MAX, DELTA_MIN, TELLERS_PER_BRANCH};
use async_trait::async_trait;
use rand::Rng;

/// Randomized parameters for a single transaction.
#[derive(Clone, Copy, Debug)]
pub struct TxParams {
    pub branch: u64,
    pub teller: u64,
    pub account: u64,
    pub delta: i64,
}

impl TxParams {
    /// Draw one set of ids uniformly from the keyspace sized by `scale`.
    ///
    /// With `scale == 1` the branch range collapses to the single-element
    /// range `[1, 1]`, which is valid. The derived keyspaces saturate at
    /// `u64::MAX` rather than overflow for absurdly large scales.
    pub fn generate(scale: u64) -> Self {
        let mut rng = rand::thread_rng();
        Self {
            branch: rng.gen_range(1..=scale),
            teller: rng.gen_range(1..=scale.saturating_mul(TELLERS_PER_BRANCH)),
            account: rng.gen_range(1..=scale.saturating_mul(ACCOUNTS_PER_BRANCH)),
            delta: rng.gen_range(DELTA_MIN..=DELTA_MAX),
        }
    }
}

/// One logical, atomically-committed unit of work against the backing store.
///
/// An executor owns its connection for its whole lifetime and is driven by
/// exactly one worker; it is never shared. Any failure must surface as an
/// `Err`, including connectivity loss.
#[async_trait]
pub trait TransactionExecutor: Send {
    async fn execute_write(&mut self, tx: &TxParams) -> anyhow::Result<()>;

    async fn execute_read_only(&mut self, tx: &TxParams) -> anyhow::Result<()>;
}

/// Store-specific schema lifecycle and executor factory.
///
/// One implementation per supported engine, selected once at startup.
#[async_trait]
pub trait DatabaseStrategy: Send + Sync {
    /// Build the benchmark schema from scratch. Runs before any worker
    /// spawns; a failure here aborts the run.
    async fn prepare(&self) -> anyhow::Result<()>;

    /// Drop the benchmark schema.
    async fn cleanup(&self) -> anyhow::Result<()>;

    /// Open a fresh connection to be owned by a single worker.
    async fn executor(&self) -> anyhow::Result<Box<dyn TransactionExecutor>>;
}
