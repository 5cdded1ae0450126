//! Key encoding shared by both storage back-ends.
//!
//! Keys are namespaced by a short prefix so that a single ordered
//! keyspace can host the block/transaction/receipt/account tables plus
//! their secondary indices. Heights are
//! encoded big-endian so that lexicographic key order matches numeric
//! order, which lets "get the head" fall out of a reverse prefix scan.

pub fn block_by_height(height: u64) -> Vec<u8> {
    let mut key = b"blk/h/".to_vec();
    key.extend_from_slice(&height.to_be_bytes());
    key
}

pub fn block_by_hash_index(hash: &str) -> Vec<u8> {
    format!("blk/hash/{hash}").into_bytes()
}

pub fn tx_by_hash(tx_hash: &str) -> Vec<u8> {
    format!("tx/h/{tx_hash}").into_bytes()
}

pub fn tx_by_height_index(height: u64, tx_hash: &str) -> Vec<u8> {
    let mut key = b"tx/bh/".to_vec();
    key.extend_from_slice(&height.to_be_bytes());
    key.push(b'/');
    key.extend_from_slice(tx_hash.as_bytes());
    key
}

pub fn tx_by_height_prefix(height: u64) -> Vec<u8> {
    let mut key = b"tx/bh/".to_vec();
    key.extend_from_slice(&height.to_be_bytes());
    key
}

pub fn receipt_by_id(receipt_id: &str) -> Vec<u8> {
    format!("receipt/id/{receipt_id}").into_bytes()
}

pub fn receipt_by_height_index(height: u64, receipt_id: &str) -> Vec<u8> {
    let mut key = b"receipt/bh/".to_vec();
    key.extend_from_slice(&height.to_be_bytes());
    key.push(b'/');
    key.extend_from_slice(receipt_id.as_bytes());
    key
}

pub fn account(address: &str) -> Vec<u8> {
    format!("acct/{address}").into_bytes()
}

pub const BLOCK_HEIGHT_PREFIX: &[u8] = b"blk/h/";
