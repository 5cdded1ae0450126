//! Restart-surviving mempool back-end: the same fee-priority contract as
//! [`crate::VolatileMempool`], backed by `sled` so it shares a storage
//! engine with [`chain_storage`].

use std::path::Path;
use std::sync::atomic::{AtomicI64, Ordering as AtomicOrdering};
use std::sync::Mutex;

use chain_types::{CoreError, PendingTransaction};
use sled::Db;

use crate::entry::build_entry;
use crate::order::PriorityKey;
use crate::{metrics, MempoolBackend, MempoolConfig};

pub struct DurableMempool {
    db: Db,
    config: MempoolConfig,
    clock: AtomicI64,
    /// Serializes the add/drain read-modify-write sequences against `db`,
    /// the same single-exclusive-lock-per-backend guarantee
    /// [`crate::VolatileMempool`] gets for free from its own `Mutex`; `sled`
    /// only makes each individual op atomic, not the sequence around it.
    write_lock: Mutex<()>,
}

impl DurableMempool {
    pub fn open(path: &Path, config: MempoolConfig) -> Result<Self, CoreError> {
        let db = sled::open(path).map_err(|e| CoreError::Storage(e.to_string()))?;
        Ok(Self {
            db,
            config,
            clock: AtomicI64::new(0),
            write_lock: Mutex::new(()),
        })
    }

    fn entries(&self) -> Result<Vec<PendingTransaction>, CoreError> {
        self.db
            .iter()
            .values()
            .map(|v| {
                let bytes = v.map_err(|e| CoreError::Storage(e.to_string()))?;
                serde_json::from_slice(&bytes).map_err(|e| CoreError::Storage(e.to_string()))
            })
            .collect()
    }

    fn ordered_entries(&self) -> Result<Vec<PendingTransaction>, CoreError> {
        let mut entries = self.entries()?;
        entries.sort_by(|a, b| {
            PriorityKey {
                fee: a.fee,
                received_at: a.received_at,
                tx_hash: a.tx_hash.clone(),
            }
            .cmp(&PriorityKey {
                fee: b.fee,
                received_at: b.received_at,
                tx_hash: b.tx_hash.clone(),
            })
        });
        Ok(entries)
    }
}

impl MempoolBackend for DurableMempool {
    fn add(&self, content: serde_json::Value) -> Result<String, CoreError> {
        let _guard = self.write_lock.lock().unwrap();
        let received_at = self.clock.fetch_add(1, AtomicOrdering::SeqCst);
        let entry = build_entry(content, received_at)?;

        if entry.fee < self.config.min_fee {
            return Err(CoreError::Validation(format!(
                "fee {} below minimum {}",
                entry.fee, self.config.min_fee
            )));
        }
        if self
            .db
            .contains_key(entry.tx_hash.as_bytes())
            .map_err(|e| CoreError::Storage(e.to_string()))?
        {
            return Ok(entry.tx_hash);
        }
        if self.db.len() >= self.config.max_size {
            if let Some(worst) = self.ordered_entries()?.pop() {
                self.db
                    .remove(worst.tx_hash.as_bytes())
                    .map_err(|e| CoreError::Storage(e.to_string()))?;
                metrics::record_evicted();
            }
        }
        let encoded = serde_json::to_vec(&entry).map_err(|e| CoreError::Storage(e.to_string()))?;
        self.db
            .insert(entry.tx_hash.as_bytes(), encoded)
            .map_err(|e| CoreError::Storage(e.to_string()))?;
        metrics::record_added();
        metrics::set_size(self.db.len());
        Ok(entry.tx_hash)
    }

    fn list(&self) -> Result<Vec<PendingTransaction>, CoreError> {
        self.ordered_entries()
    }

    fn drain(&self, max_count: usize, max_bytes: u64) -> Result<Vec<PendingTransaction>, CoreError> {
        let _guard = self.write_lock.lock().unwrap();
        let ordered = self.ordered_entries()?;
        let mut result = Vec::new();
        let mut total_bytes = 0u64;

        for entry in ordered {
            if result.len() >= max_count {
                break;
            }
            if total_bytes + entry.size_bytes > max_bytes {
                continue;
            }
            total_bytes += entry.size_bytes;
            result.push(entry);
        }

        for entry in &result {
            self.db
                .remove(entry.tx_hash.as_bytes())
                .map_err(|e| CoreError::Storage(e.to_string()))?;
        }
        metrics::record_drained(result.len());
        metrics::set_size(self.db.len());
        Ok(result)
    }

    fn remove(&self, tx_hash: &str) -> Result<bool, CoreError> {
        let _guard = self.write_lock.lock().unwrap();
        let removed = self
            .db
            .remove(tx_hash.as_bytes())
            .map_err(|e| CoreError::Storage(e.to_string()))?
            .is_some();
        if removed {
            metrics::set_size(self.db.len());
        }
        Ok(removed)
    }

    fn size(&self) -> Result<usize, CoreError> {
        Ok(self.db.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        {
            let pool = DurableMempool::open(
                dir.path(),
                MempoolConfig {
                    min_fee: 0,
                    max_size: 10,
                },
            )
            .unwrap();
            pool.add(json!({"sender": "a", "fee": 3})).unwrap();
        }
        let pool = DurableMempool::open(
            dir.path(),
            MempoolConfig {
                min_fee: 0,
                max_size: 10,
            },
        )
        .unwrap();
        assert_eq!(pool.size().unwrap(), 1);
    }

    #[test]
    fn drain_removes_only_returned_entries() {
        let dir = tempfile::tempdir().unwrap();
        let pool = DurableMempool::open(
            dir.path(),
            MempoolConfig {
                min_fee: 0,
                max_size: 10,
            },
        )
        .unwrap();
        pool.add(json!({"sender": "a", "fee": 5})).unwrap();
        pool.add(json!({"sender": "b", "fee": 1})).unwrap();
        let drained = pool.drain(1, 10_000).unwrap();
        assert_eq!(drained.len(), 1);
        assert_eq!(drained[0].fee, 5);
        assert_eq!(pool.size().unwrap(), 1);
    }
}
