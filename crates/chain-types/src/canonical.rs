//! Canonical encoding and transaction hashing.
//!
//! Canonical encoding is UTF-8 JSON with lexicographically sorted keys and no
//! insignificant whitespace (`serde_json::Value`'s map is a `BTreeMap` here —
//! we do not enable the `preserve_order` feature — so `to_string` already
//! yields sorted keys without an extra sort pass.

use serde::Serialize;
use sha2::{Digest, Sha256};

/// Serializes a value into its canonical compact JSON string.
pub fn canonical_json<T: Serialize>(value: &T) -> serde_json::Result<String> {
    let as_value = serde_json::to_value(value)?;
    serde_json::to_string(&as_value)
}

/// Lower-case hex-encoded SHA-256 digest of `data`, prefixed with `0x`.
pub fn sha256_hex(data: &[u8]) -> String {
    let digest = Sha256::digest(data);
    format!("0x{}", hex::encode(digest))
}

/// Canonical transaction hash: SHA-256 over the canonical JSON encoding of
/// the transaction body.
pub fn tx_hash<T: Serialize>(body: &T) -> serde_json::Result<String> {
    let encoded = canonical_json(body)?;
    Ok(sha256_hex(encoded.as_bytes()))
}
