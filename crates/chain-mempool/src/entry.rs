//! Builds a [`PendingTransaction`] from raw submitted content: the hash and
//! size are both derived from the canonical (sorted-key, whitespace-free)
//! encoding of the whole submitted object, fee included.

use chain_types::canonical::{canonical_json, sha256_hex};
use chain_types::{CoreError, PendingTransaction};
use serde_json::Value;

pub fn build_entry(content: Value, received_at: i64) -> Result<PendingTransaction, CoreError> {
    let fee = content.get("fee").and_then(Value::as_u64).unwrap_or(0);
    let canonical = canonical_json(&content)?;
    let tx_hash = sha256_hex(canonical.as_bytes());
    let size_bytes = canonical.len() as u64;
    Ok(PendingTransaction {
        tx_hash,
        content,
        received_at,
        fee,
        size_bytes,
    })
}
