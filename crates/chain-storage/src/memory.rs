//! Process-local storage back-end. Backed by a single `BTreeMap`
//! guarded by one exclusive lock, with secondary indices and account
//! upserts layered on top.

use std::collections::BTreeMap;
use std::sync::Mutex;

use chain_types::{Account, Block, CoreError, Receipt, Transaction};
use chrono::Utc;

use crate::{keys, ChainStore};

#[derive(Default)]
pub struct MemoryStore {
    data: Mutex<BTreeMap<Vec<u8>, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn encode<T: serde::Serialize>(value: &T) -> Result<Vec<u8>, CoreError> {
    serde_json::to_vec(value).map_err(|e| CoreError::Storage(e.to_string()))
}

fn decode<T: serde::de::DeserializeOwned>(bytes: &[u8]) -> Result<T, CoreError> {
    serde_json::from_slice(bytes).map_err(|e| CoreError::Storage(e.to_string()))
}

impl ChainStore for MemoryStore {
    fn get_head(&self) -> Result<Option<Block>, CoreError> {
        let data = self.data.lock().unwrap();
        let entry = data
            .range(keys::BLOCK_HEIGHT_PREFIX.to_vec()..)
            .rfind(|(k, _)| k.starts_with(keys::BLOCK_HEIGHT_PREFIX));
        entry.map(|(_, v)| decode(v)).transpose()
    }

    fn get_block_by_height(&self, height: u64) -> Result<Option<Block>, CoreError> {
        let data = self.data.lock().unwrap();
        data.get(&keys::block_by_height(height))
            .map(|v| decode(v))
            .transpose()
    }

    fn get_block_by_hash(&self, hash: &str) -> Result<Option<Block>, CoreError> {
        let data = self.data.lock().unwrap();
        let Some(height_bytes) = data.get(&keys::block_by_hash_index(hash)) else {
            return Ok(None);
        };
        let height: u64 = decode(height_bytes)?;
        data.get(&keys::block_by_height(height))
            .map(|v| decode(v))
            .transpose()
    }

    fn get_transaction_by_hash(&self, tx_hash: &str) -> Result<Option<Transaction>, CoreError> {
        let data = self.data.lock().unwrap();
        data.get(&keys::tx_by_hash(tx_hash))
            .map(|v| decode(v))
            .transpose()
    }

    fn get_receipt_by_id(&self, receipt_id: &str) -> Result<Option<Receipt>, CoreError> {
        let data = self.data.lock().unwrap();
        data.get(&keys::receipt_by_id(receipt_id))
            .map(|v| decode(v))
            .transpose()
    }

    fn get_account(&self, address: &str) -> Result<Option<Account>, CoreError> {
        let data = self.data.lock().unwrap();
        data.get(&keys::account(address))
            .map(|v| decode(v))
            .transpose()
    }

    fn append_block(&self, block: Block, transactions: Vec<Transaction>) -> Result<(), CoreError> {
        let mut data = self.data.lock().unwrap();
        if data.contains_key(&keys::block_by_height(block.height)) {
            return Err(CoreError::Conflict(format!(
                "duplicate height {}",
                block.height
            )));
        }
        if data.contains_key(&keys::block_by_hash_index(&block.hash)) {
            return Err(CoreError::Conflict(format!(
                "duplicate hash {}",
                block.hash
            )));
        }
        data.insert(keys::block_by_height(block.height), encode(&block)?);
        data.insert(
            keys::block_by_hash_index(&block.hash),
            encode(&block.height)?,
        );
        for tx in &transactions {
            data.insert(keys::tx_by_hash(&tx.tx_hash), encode(tx)?);
            data.insert(
                keys::tx_by_height_index(block.height, &tx.tx_hash),
                Vec::new(),
            );
        }
        Ok(())
    }

    fn delete_blocks_from(&self, from_height: u64) -> Result<u64, CoreError> {
        let mut data = self.data.lock().unwrap();
        let heights: Vec<u64> = data
            .range(keys::block_by_height(from_height)..)
            .take_while(|(k, _)| k.starts_with(keys::BLOCK_HEIGHT_PREFIX))
            .map(|(k, _)| {
                let mut h = [0u8; 8];
                h.copy_from_slice(&k[keys::BLOCK_HEIGHT_PREFIX.len()..]);
                u64::from_be_bytes(h)
            })
            .collect();

        for &height in heights.iter().rev() {
            let Some(block_bytes) = data.remove(&keys::block_by_height(height)) else {
                continue;
            };
            let block: Block = decode(&block_bytes)?;
            data.remove(&keys::block_by_hash_index(&block.hash));

            let prefix = keys::tx_by_height_prefix(height);
            let tx_keys: Vec<Vec<u8>> = data
                .range(prefix.clone()..)
                .take_while(|(k, _)| k.starts_with(&prefix))
                .map(|(k, _)| k.clone())
                .collect();
            for index_key in tx_keys {
                let tx_hash = String::from_utf8_lossy(&index_key[prefix.len() + 1..]).to_string();
                data.remove(&index_key);
                data.remove(&keys::tx_by_hash(&tx_hash));
            }
        }
        Ok(heights.len() as u64)
    }

    fn upsert_account(
        &self,
        address: &str,
        balance_delta: i64,
        nonce_delta: i64,
    ) -> Result<Account, CoreError> {
        let mut data = self.data.lock().unwrap();
        let key = keys::account(address);
        let mut account = match data.get(&key) {
            Some(bytes) => decode(bytes)?,
            None => Account::zero(address.to_string(), Utc::now()),
        };
        account.balance = (account.balance as i64 + balance_delta).max(0) as u64;
        account.nonce = (account.nonce as i64 + nonce_delta).max(0) as u64;
        account.updated_at = Utc::now();
        data.insert(key, encode(&account)?);
        Ok(account)
    }

    fn put_receipt(&self, receipt: Receipt) -> Result<(), CoreError> {
        let mut data = self.data.lock().unwrap();
        let key = keys::receipt_by_id(&receipt.receipt_id);
        if data.contains_key(&key) {
            return Err(CoreError::Conflict(format!(
                "duplicate receipt {}",
                receipt.receipt_id
            )));
        }
        if let Some(height) = receipt.block_height {
            data.insert(
                keys::receipt_by_height_index(height, &receipt.receipt_id),
                Vec::new(),
            );
        }
        data.insert(key, encode(&receipt)?);
        Ok(())
    }
}
