//! Durable, ordered key-value storage for the chain core.
//!
//! Two back-ends share one [`ChainStore`] contract: [`SledStore`] persists to
//! disk via `sled`; [`MemoryStore`] is a process-local `BTreeMap` used in
//! tests and for ephemeral/dev nodes. Every mutating operation is atomic on
//! commit and leaves no partial state observable on failure — the "scoped
//! session" of collapses here into one atomic call per operation,
//! since none of the core's write paths need to compose multiple operations
//! into a single transaction beyond what `append_block` /
//! `delete_blocks_from` already do internally.

mod keys;
mod memory;
mod sled_store;

pub use memory::MemoryStore;
pub use sled_store::SledStore;

use chain_types::{Account, Block, CoreError, Receipt, Transaction};

/// Durable storage contract shared by both back-ends.
pub trait ChainStore: Send + Sync {
    /// The block of maximum height, or `None` if the chain is empty.
    fn get_head(&self) -> Result<Option<Block>, CoreError>;

    fn get_block_by_height(&self, height: u64) -> Result<Option<Block>, CoreError>;

    fn get_block_by_hash(&self, hash: &str) -> Result<Option<Block>, CoreError>;

    fn get_transaction_by_hash(&self, tx_hash: &str) -> Result<Option<Transaction>, CoreError>;

    fn get_receipt_by_id(&self, receipt_id: &str) -> Result<Option<Receipt>, CoreError>;

    fn get_account(&self, address: &str) -> Result<Option<Account>, CoreError>;

    /// Inserts one block and all of its transactions under a single commit.
    ///
    /// Fails with [`CoreError::Conflict`] ("duplicate height" or "duplicate
    /// hash") on a uniqueness violation; no partial write is observable
    /// either way.
    fn append_block(&self, block: Block, transactions: Vec<Transaction>) -> Result<(), CoreError>;

    /// Deletes all blocks with `height >= from_height` and their owned
    /// transactions, in one commit. Used only by the fork resolver. Returns
    /// the number of blocks removed.
    fn delete_blocks_from(&self, from_height: u64) -> Result<u64, CoreError>;

    /// Applies a balance/nonce delta to an account, creating it with a zero
    /// balance if it does not yet exist.
    fn upsert_account(
        &self,
        address: &str,
        balance_delta: i64,
        nonce_delta: i64,
    ) -> Result<Account, CoreError>;

    /// Inserts a receipt, failing with [`CoreError::Conflict`] if the
    /// `receipt_id` already exists.
    fn put_receipt(&self, receipt: Receipt) -> Result<(), CoreError>;
}
