//! Core domain entities.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::hex_field::normalize_hex;
use crate::CoreError;

/// `parent_hash` used by the genesis block.
pub const GENESIS_PARENT_HASH: &str = "0x00";

/// A committed (or about-to-be-committed) block.
///
/// Identity is `(height, hash)`, both unique. Created exactly once, by
/// either the Block Production Engine (local head) or the Chain Sync
/// Resolver (imported); never mutated; deleted only during a reorg.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Block {
    pub height: u64,
    pub hash: String,
    pub parent_hash: String,
    pub proposer: String,
    pub timestamp: DateTime<Utc>,
    pub tx_count: u64,
    pub state_root: Option<String>,
}

impl Block {
    pub fn genesis(hash: String, proposer: String, timestamp: DateTime<Utc>) -> Self {
        Self {
            height: 0,
            hash,
            parent_hash: GENESIS_PARENT_HASH.to_string(),
            proposer,
            timestamp,
            tx_count: 0,
            state_root: None,
        }
    }
}

/// A confirmed or pending transaction.
///
/// Identity is `tx_hash`. A transaction is exclusively owned by at most one
/// block; deleting its block deletes the transaction.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Transaction {
    pub tx_hash: String,
    pub block_height: Option<u64>,
    pub sender: String,
    pub recipient: String,
    pub payload: Value,
    pub created_at: DateTime<Utc>,
}

/// A structured signature attached to a receipt.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct SignatureData {
    pub signer: String,
    pub signature: String,
}

/// A settled compute-work receipt, referencing blocks by height.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Receipt {
    pub receipt_id: String,
    pub job_id: String,
    pub block_height: Option<u64>,
    pub payload: Value,
    pub miner_signature: SignatureData,
    pub coordinator_attestations: Vec<SignatureData>,
    pub minted_amount: Option<u64>,
    pub recorded_at: DateTime<Utc>,
}

/// An account balance/nonce record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Account {
    pub address: String,
    pub balance: u64,
    pub nonce: u64,
    pub updated_at: DateTime<Utc>,
}

impl Account {
    pub fn zero(address: String, now: DateTime<Utc>) -> Self {
        Self {
            address,
            balance: 0,
            nonce: 0,
            updated_at: now,
        }
    }
}

/// A mempool-only immutable record of an admitted transaction.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PendingTransaction {
    pub tx_hash: String,
    /// The submitted transaction body verbatim, as canonical JSON would
    /// encode it.
    pub content: Value,
    /// Monotonic receive order; milliseconds since UNIX epoch.
    pub received_at: i64,
    pub fee: u64,
    pub size_bytes: u64,
}

/// The client-submitted shape of `/sendTx`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionRequest {
    #[serde(rename = "type")]
    pub kind: String,
    pub sender: String,
    pub nonce: u64,
    #[serde(default)]
    pub fee: u64,
    #[serde(default)]
    pub payload: Value,
    #[serde(default)]
    pub sig: Option<String>,
}

impl TransactionRequest {
    /// Structural validation: required fields present, hex fields well-formed.
    /// Balances/nonces are not checked here — that is delegated to an
    /// external state executor. Normalizes `kind` to upper-case in place
    /// before checking it, so `"transfer"` is accepted the same as
    /// `"TRANSFER"`.
    pub fn validate(&mut self) -> Result<(), CoreError> {
        if self.sender.is_empty() {
            return Err(CoreError::Validation("sender must not be empty".into()));
        }
        self.kind = self.kind.to_uppercase();
        if !matches!(self.kind.as_str(), "TRANSFER" | "RECEIPT_CLAIM") {
            return Err(CoreError::Validation(format!(
                "unsupported transaction type {:?}",
                self.kind
            )));
        }
        if let Some(sig) = &self.sig {
            normalize_hex("sig", sig)?;
        }
        Ok(())
    }
}
