//! Durable, disk-backed storage, backed by `sled` — a pure-Rust embedded
//! store that avoids pulling in a C++ toolchain dependency. Multi-key
//! writes use `sled::Transactional` so `append_block` / `delete_blocks_from`
//! commit atomically.

use std::path::Path;

use chain_types::{Account, Block, CoreError, Receipt, Transaction};
use chrono::Utc;
use sled::transaction::{ConflictableTransactionError, TransactionError};
use sled::Db;

use crate::{keys, ChainStore};

pub struct SledStore {
    db: Db,
}

impl SledStore {
    pub fn open(path: &Path) -> Result<Self, CoreError> {
        let db = sled::open(path).map_err(|e| CoreError::Storage(e.to_string()))?;
        Ok(Self { db })
    }
}

fn encode<T: serde::Serialize>(value: &T) -> Result<Vec<u8>, CoreError> {
    serde_json::to_vec(value).map_err(|e| CoreError::Storage(e.to_string()))
}

fn decode<T: serde::de::DeserializeOwned>(bytes: &[u8]) -> Result<T, CoreError> {
    serde_json::from_slice(bytes).map_err(|e| CoreError::Storage(e.to_string()))
}

fn tx_err(e: impl ToString) -> ConflictableTransactionError<CoreError> {
    ConflictableTransactionError::Abort(CoreError::Storage(e.to_string()))
}

fn flatten(e: TransactionError<CoreError>) -> CoreError {
    match e {
        TransactionError::Abort(inner) => inner,
        TransactionError::Storage(err) => CoreError::Storage(err.to_string()),
    }
}

impl ChainStore for SledStore {
    fn get_head(&self) -> Result<Option<Block>, CoreError> {
        let entry = self
            .db
            .scan_prefix(keys::BLOCK_HEIGHT_PREFIX)
            .next_back()
            .transpose()
            .map_err(|e| CoreError::Storage(e.to_string()))?;
        entry.map(|(_, v)| decode(&v)).transpose()
    }

    fn get_block_by_height(&self, height: u64) -> Result<Option<Block>, CoreError> {
        self.db
            .get(keys::block_by_height(height))
            .map_err(|e| CoreError::Storage(e.to_string()))?
            .map(|v| decode(&v))
            .transpose()
    }

    fn get_block_by_hash(&self, hash: &str) -> Result<Option<Block>, CoreError> {
        let Some(height_bytes) = self
            .db
            .get(keys::block_by_hash_index(hash))
            .map_err(|e| CoreError::Storage(e.to_string()))?
        else {
            return Ok(None);
        };
        let height: u64 = decode(&height_bytes)?;
        self.get_block_by_height(height)
    }

    fn get_transaction_by_hash(&self, tx_hash: &str) -> Result<Option<Transaction>, CoreError> {
        self.db
            .get(keys::tx_by_hash(tx_hash))
            .map_err(|e| CoreError::Storage(e.to_string()))?
            .map(|v| decode(&v))
            .transpose()
    }

    fn get_receipt_by_id(&self, receipt_id: &str) -> Result<Option<Receipt>, CoreError> {
        self.db
            .get(keys::receipt_by_id(receipt_id))
            .map_err(|e| CoreError::Storage(e.to_string()))?
            .map(|v| decode(&v))
            .transpose()
    }

    fn get_account(&self, address: &str) -> Result<Option<Account>, CoreError> {
        self.db
            .get(keys::account(address))
            .map_err(|e| CoreError::Storage(e.to_string()))?
            .map(|v| decode(&v))
            .transpose()
    }

    fn append_block(&self, block: Block, transactions: Vec<Transaction>) -> Result<(), CoreError> {
        self.db
            .transaction(|tx_db| {
                let height_key = keys::block_by_height(block.height);
                let hash_key = keys::block_by_hash_index(&block.hash);
                if tx_db.get(&height_key)?.is_some() {
                    return Err(tx_err(format!("duplicate height {}", block.height)));
                }
                if tx_db.get(&hash_key)?.is_some() {
                    return Err(tx_err(format!("duplicate hash {}", block.hash)));
                }
                tx_db.insert(height_key, encode(&block).map_err(tx_err)?)?;
                tx_db.insert(hash_key, encode(&block.height).map_err(tx_err)?)?;
                for t in &transactions {
                    tx_db.insert(keys::tx_by_hash(&t.tx_hash), encode(t).map_err(tx_err)?)?;
                    tx_db.insert(
                        keys::tx_by_height_index(block.height, &t.tx_hash),
                        Vec::new(),
                    )?;
                }
                Ok(())
            })
            .map_err(flatten)
    }

    fn delete_blocks_from(&self, from_height: u64) -> Result<u64, CoreError> {
        let heights: Vec<u64> = self
            .db
            .scan_prefix(keys::BLOCK_HEIGHT_PREFIX)
            .keys()
            .filter_map(|k| k.ok())
            .filter(|k| {
                let mut h = [0u8; 8];
                if k.len() != keys::BLOCK_HEIGHT_PREFIX.len() + 8 {
                    return false;
                }
                h.copy_from_slice(&k[keys::BLOCK_HEIGHT_PREFIX.len()..]);
                u64::from_be_bytes(h) >= from_height
            })
            .map(|k| {
                let mut h = [0u8; 8];
                h.copy_from_slice(&k[keys::BLOCK_HEIGHT_PREFIX.len()..]);
                u64::from_be_bytes(h)
            })
            .collect();

        for &height in heights.iter().rev() {
            let Some(block_bytes) = self
                .db
                .get(keys::block_by_height(height))
                .map_err(|e| CoreError::Storage(e.to_string()))?
            else {
                continue;
            };
            let block: Block = decode(&block_bytes)?;

            let prefix = keys::tx_by_height_prefix(height);
            let tx_keys: Vec<Vec<u8>> = self
                .db
                .scan_prefix(&prefix)
                .keys()
                .filter_map(|k| k.ok())
                .map(|k| k.to_vec())
                .collect();

            self.db
                .transaction(|tx_db| {
                    tx_db.remove(keys::block_by_height(height))?;
                    tx_db.remove(keys::block_by_hash_index(&block.hash))?;
                    for index_key in &tx_keys {
                        let tx_hash =
                            String::from_utf8_lossy(&index_key[prefix.len() + 1..]).to_string();
                        tx_db.remove(index_key.clone())?;
                        tx_db.remove(keys::tx_by_hash(&tx_hash))?;
                    }
                    Ok(())
                })
                .map_err(flatten)?;
        }
        Ok(heights.len() as u64)
    }

    fn upsert_account(
        &self,
        address: &str,
        balance_delta: i64,
        nonce_delta: i64,
    ) -> Result<Account, CoreError> {
        let key = keys::account(address);
        self.db
            .transaction(|tx_db| {
                let mut account: Account = match tx_db.get(&key)? {
                    Some(bytes) => decode(&bytes).map_err(tx_err)?,
                    None => Account::zero(address.to_string(), Utc::now()),
                };
                account.balance = (account.balance as i64 + balance_delta).max(0) as u64;
                account.nonce = (account.nonce as i64 + nonce_delta).max(0) as u64;
                account.updated_at = Utc::now();
                tx_db.insert(key.clone(), encode(&account).map_err(tx_err)?)?;
                Ok(account)
            })
            .map_err(flatten)
    }

    fn put_receipt(&self, receipt: Receipt) -> Result<(), CoreError> {
        let key = keys::receipt_by_id(&receipt.receipt_id);
        if self
            .db
            .get(&key)
            .map_err(|e| CoreError::Storage(e.to_string()))?
            .is_some()
        {
            return Err(CoreError::Conflict(format!(
                "duplicate receipt {}",
                receipt.receipt_id
            )));
        }
        if let Some(height) = receipt.block_height {
            self.db
                .insert(
                    keys::receipt_by_height_index(height, &receipt.receipt_id),
                    Vec::new(),
                )
                .map_err(|e| CoreError::Storage(e.to_string()))?;
        }
        self.db
            .insert(key, encode(&receipt)?)
            .map_err(|e| CoreError::Storage(e.to_string()))?;
        Ok(())
    }
}
