//! Fee-prioritized transaction pool.
//!
//! Two back-ends share the [`MempoolBackend`] contract: [`VolatileMempool`]
//! keeps state in a `Mutex`-guarded in-memory priority queue;
//! [`DurableMempool`] persists the same index to `sled` so pending
//! transactions survive a restart.

mod durable;
mod entry;
pub mod metrics;
mod order;
mod volatile;

pub use durable::DurableMempool;
pub use volatile::VolatileMempool;

use chain_types::{CoreError, PendingTransaction};

/// Shared contract for both mempool back-ends.
pub trait MempoolBackend: Send + Sync {
    /// Admits a transaction, returning its `tx_hash`.
    ///
    /// Idempotent in the hash dimension (M4): re-adding a transaction with
    /// the same hash returns the existing hash unchanged. `fee` defaults to
    /// 0 when `content` carries no `"fee"` field. Rejects with
    /// [`CoreError::Validation`] when `fee < min_fee`. Evicts exactly one
    /// lowest-fee entry (ties broken by latest `received_at`) when the pool
    /// is already at `max_size`.
    fn add(&self, content: serde_json::Value) -> Result<String, CoreError>;

    /// Snapshot of all pending transactions. Order is unspecified; callers
    /// MUST NOT rely on it.
    fn list(&self) -> Result<Vec<PendingTransaction>, CoreError>;

    /// Greedily selects entries in (fee DESC, received_at ASC) order,
    /// skipping — not stopping at — any candidate that would overflow
    /// `max_bytes`, and removes exactly the returned entries (M3).
    fn drain(&self, max_count: usize, max_bytes: u64) -> Result<Vec<PendingTransaction>, CoreError>;

    /// Removes an entry by hash. Idempotent; not an error if absent.
    fn remove(&self, tx_hash: &str) -> Result<bool, CoreError>;

    fn size(&self) -> Result<usize, CoreError>;
}

/// Minimum fee and capacity configuration shared by both back-ends.
#[derive(Debug, Clone, Copy)]
pub struct MempoolConfig {
    pub min_fee: u64,
    pub max_size: usize,
}

impl Default for MempoolConfig {
    fn default() -> Self {
        Self {
            min_fee: 0,
            max_size: 10_000,
        }
    }
}
