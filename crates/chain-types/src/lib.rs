//! Shared domain entities for the AITBC chain core.
//!
//! This is the single source of truth for the types that cross subsystem
//! boundaries: storage, mempool, block production, chain sync, and gossip
//! all speak these types rather than inventing their own.

pub mod canonical;
pub mod entities;
pub mod error;
pub mod hex_field;

pub use canonical::{canonical_json, sha256_hex, tx_hash};
pub use entities::{
    Account, Block, PendingTransaction, Receipt, SignatureData, Transaction, TransactionRequest,
};
pub use error::CoreError;
