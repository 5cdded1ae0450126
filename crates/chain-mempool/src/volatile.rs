//! Process-local mempool back-end: a by-hash map paired with a priority
//! `BTreeSet` for fee-ordered drain and eviction.

use std::collections::{BTreeSet, HashMap};
use std::sync::Mutex;

use chain_types::{CoreError, PendingTransaction};

use crate::entry::build_entry;
use crate::order::PriorityKey;
use crate::{metrics, MempoolBackend, MempoolConfig};

struct State {
    by_hash: HashMap<String, PendingTransaction>,
    ordered: BTreeSet<PriorityKey>,
    clock: i64,
}

pub struct VolatileMempool {
    config: MempoolConfig,
    state: Mutex<State>,
}

impl VolatileMempool {
    pub fn new(config: MempoolConfig) -> Self {
        Self {
            config,
            state: Mutex::new(State {
                by_hash: HashMap::new(),
                ordered: BTreeSet::new(),
                clock: 0,
            }),
        }
    }
}

impl Default for VolatileMempool {
    fn default() -> Self {
        Self::new(MempoolConfig::default())
    }
}

impl MempoolBackend for VolatileMempool {
    fn add(&self, content: serde_json::Value) -> Result<String, CoreError> {
        let mut state = self.state.lock().unwrap();
        state.clock += 1;
        let received_at = state.clock;
        let entry = build_entry(content, received_at)?;

        if entry.fee < self.config.min_fee {
            return Err(CoreError::Validation(format!(
                "fee {} below minimum {}",
                entry.fee, self.config.min_fee
            )));
        }
        if state.by_hash.contains_key(&entry.tx_hash) {
            return Ok(entry.tx_hash);
        }
        if state.by_hash.len() >= self.config.max_size {
            if let Some(worst) = state.ordered.iter().next_back().cloned() {
                state.ordered.remove(&worst);
                state.by_hash.remove(&worst.tx_hash);
                metrics::record_evicted();
            }
        }
        state.ordered.insert(PriorityKey {
            fee: entry.fee,
            received_at: entry.received_at,
            tx_hash: entry.tx_hash.clone(),
        });
        let tx_hash = entry.tx_hash.clone();
        state.by_hash.insert(tx_hash.clone(), entry);
        metrics::record_added();
        metrics::set_size(state.by_hash.len());
        Ok(tx_hash)
    }

    fn list(&self) -> Result<Vec<PendingTransaction>, CoreError> {
        let state = self.state.lock().unwrap();
        Ok(state.by_hash.values().cloned().collect())
    }

    fn drain(&self, max_count: usize, max_bytes: u64) -> Result<Vec<PendingTransaction>, CoreError> {
        let mut state = self.state.lock().unwrap();
        let mut result = Vec::new();
        let mut total_bytes = 0u64;
        let mut drained_keys = Vec::new();

        for key in state.ordered.iter() {
            if result.len() >= max_count {
                break;
            }
            let entry = &state.by_hash[&key.tx_hash];
            if total_bytes + entry.size_bytes > max_bytes {
                continue;
            }
            total_bytes += entry.size_bytes;
            result.push(entry.clone());
            drained_keys.push(key.clone());
        }

        for key in &drained_keys {
            state.ordered.remove(key);
            state.by_hash.remove(&key.tx_hash);
        }
        metrics::record_drained(result.len());
        metrics::set_size(state.by_hash.len());
        Ok(result)
    }

    fn remove(&self, tx_hash: &str) -> Result<bool, CoreError> {
        let mut state = self.state.lock().unwrap();
        let Some(entry) = state.by_hash.remove(tx_hash) else {
            return Ok(false);
        };
        state.ordered.remove(&PriorityKey {
            fee: entry.fee,
            received_at: entry.received_at,
            tx_hash: entry.tx_hash,
        });
        metrics::set_size(state.by_hash.len());
        Ok(true)
    }

    fn size(&self) -> Result<usize, CoreError> {
        Ok(self.state.lock().unwrap().by_hash.len())
    }
}
