//! The PoA proposer task: a cooperatively cancellable tokio task that
//! sleeps until the next slot, drains the mempool, commits a block, and
//! publishes it.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex as StdMutex;
use std::sync::Arc;
use std::time::Duration;

use chain_gossip::GossipBroker;
use chain_mempool::MempoolBackend;
use chain_storage::ChainStore;
use chain_types::{Block, CoreError, Transaction};
use chrono::Utc;
use serde_json::json;
use sha2::{Digest, Sha256};
use tokio::sync::Notify;
use tokio::task::JoinHandle;

use crate::circuit_breaker::CircuitBreaker;
use crate::config::ProposerConfig;
use crate::metrics;

/// Computes `"0x" + SHA256(chain_id | height | parent_hash | timestamp_iso)`
///, `|` being a single literal pipe byte.
pub fn compute_block_hash(chain_id: &str, height: u64, parent_hash: &str, timestamp: chrono::DateTime<Utc>) -> String {
    let payload = format!("{chain_id}|{height}|{parent_hash}|{}", timestamp.to_rfc3339());
    let digest = Sha256::digest(payload.as_bytes());
    format!("0x{}", hex_encode(&digest))
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

/// Single long-lived PoA proposer task.
pub struct Proposer {
    config: ProposerConfig,
    store: Arc<dyn ChainStore>,
    mempool: Arc<dyn MempoolBackend>,
    gossip: Arc<GossipBroker>,
    breaker: CircuitBreaker,
    stop_notify: Arc<Notify>,
    stopping: Arc<AtomicBool>,
    last_proposer_id: StdMutex<Option<String>>,
    task: tokio::sync::Mutex<Option<JoinHandle<()>>>,
}

impl Proposer {
    pub fn new(
        config: ProposerConfig,
        store: Arc<dyn ChainStore>,
        mempool: Arc<dyn MempoolBackend>,
        gossip: Arc<GossipBroker>,
    ) -> Arc<Self> {
        let breaker = CircuitBreaker::new(config.circuit_breaker.clone());
        Arc::new(Self {
            config,
            store,
            mempool,
            gossip,
            breaker,
            stop_notify: Arc::new(Notify::new()),
            stopping: Arc::new(AtomicBool::new(false)),
            last_proposer_id: StdMutex::new(None),
            task: tokio::sync::Mutex::new(None),
        })
    }

    /// Starts the proposer loop. A second call while already running is a
    /// no-op.
    pub async fn start(self: &Arc<Self>) -> Result<(), CoreError> {
        let mut task_slot = self.task.lock().await;
        if task_slot.is_some() {
            return Ok(());
        }
        self.ensure_genesis().await?;
        self.stopping.store(false, Ordering::SeqCst);

        let this = Arc::clone(self);
        *task_slot = Some(tokio::spawn(async move { this.run_loop().await }));
        Ok(())
    }

    /// Signals cooperative cancel and awaits the task.
    pub async fn stop(self: &Arc<Self>) {
        let handle = self.task.lock().await.take();
        let Some(handle) = handle else {
            return;
        };
        self.stopping.store(true, Ordering::SeqCst);
        self.stop_notify.notify_waiters();
        let _ = handle.await;
    }

    pub fn is_healthy(&self) -> bool {
        self.breaker.state() != crate::circuit_breaker::CircuitState::Open
    }

    async fn run_loop(self: Arc<Self>) {
        while !self.stopping.load(Ordering::SeqCst) {
            self.wait_until_next_slot().await;
            if self.stopping.load(Ordering::SeqCst) {
                break;
            }
            if !self.breaker.allow_request() {
                tracing::warn!("circuit breaker open, skipping block proposal");
                metrics::BLOCKS_SKIPPED_CIRCUIT_BREAKER_TOTAL.inc();
                continue;
            }
            match self.propose_block().await {
                Ok(()) => self.breaker.record_success(),
                Err(err) => {
                    self.breaker.record_failure();
                    metrics::POA_PROPOSE_ERRORS_TOTAL.inc();
                    tracing::error!(error = %err, "failed to propose block");
                }
            }
        }
        tracing::info!("PoA proposer loop exited");
    }

    async fn wait_until_next_slot(&self) {
        let head = match self.read_head_with_retries().await {
            Ok(head) => head,
            Err(_) => return,
        };
        let Some(head) = head else {
            return;
        };
        let elapsed = (Utc::now() - head.timestamp)
            .to_std()
            .unwrap_or(Duration::ZERO);
        if elapsed >= self.config.block_time {
            return;
        }
        let sleep_for = self.config.block_time - elapsed;
        tokio::select! {
            _ = tokio::time::sleep(sleep_for) => {}
            _ = self.stop_notify.notified() => {}
        }
    }

    /// Retries up to three times with 0.1s/0.2s linear back-off (
    /// Failure semantics) before treating the read as a storage failure.
    async fn read_head_with_retries(&self) -> Result<Option<Block>, CoreError> {
        let mut attempt = 0;
        loop {
            match self.store.get_head() {
                Ok(head) => return Ok(head),
                Err(_) if attempt < 2 => {
                    attempt += 1;
                    tokio::time::sleep(Duration::from_millis(100 * attempt as u64)).await;
                }
                Err(err) => return Err(err),
            }
        }
    }

    async fn ensure_genesis(&self) -> Result<(), CoreError> {
        if self.store.get_head()?.is_some() {
            return Ok(());
        }
        let timestamp = Utc::now();
        let hash = compute_block_hash(&self.config.chain_id, 0, chain_types::entities::GENESIS_PARENT_HASH, timestamp);
        let genesis = Block::genesis(hash.clone(), self.config.proposer_id.clone(), timestamp);
        self.store.append_block(genesis.clone(), vec![])?;
        tracing::info!(hash = %hash, "created genesis block");
        self.publish_block(&genesis).await;
        Ok(())
    }

    async fn propose_block(&self) -> Result<(), CoreError> {
        let start = std::time::Instant::now();
        let head = self.store.get_head()?;

        let (next_height, parent_hash, interval_seconds) = match &head {
            Some(head) => {
                let interval = (Utc::now() - head.timestamp).to_std().ok().map(|d| d.as_secs_f64());
                (head.height + 1, head.hash.clone(), interval)
            }
            None => (0, chain_types::entities::GENESIS_PARENT_HASH.to_string(), None),
        };

        let pending = self.mempool.drain(self.config.max_txs_per_block, self.config.max_block_size_bytes)?;
        let timestamp = Utc::now();
        let block_hash = compute_block_hash(&self.config.chain_id, next_height, &parent_hash, timestamp);

        let mut total_fees: u64 = 0;
        let transactions: Vec<Transaction> = pending
            .iter()
            .map(|ptx| {
                total_fees += ptx.fee;
                let sender = ptx.content.get("sender").and_then(|v| v.as_str()).unwrap_or("").to_string();
                let recipient = ptx
                    .content
                    .get("recipient")
                    .and_then(|v| v.as_str())
                    .or_else(|| ptx.content.get("payload").and_then(|p| p.get("recipient")).and_then(|v| v.as_str()))
                    .unwrap_or("")
                    .to_string();
                Transaction {
                    tx_hash: ptx.tx_hash.clone(),
                    block_height: Some(next_height),
                    sender,
                    recipient,
                    payload: ptx.content.clone(),
                    created_at: timestamp,
                }
            })
            .collect();

        let block = Block {
            height: next_height,
            hash: block_hash.clone(),
            parent_hash,
            proposer: self.config.proposer_id.clone(),
            timestamp,
            tx_count: transactions.len() as u64,
            state_root: None,
        };

        self.store.append_block(block.clone(), transactions)?;

        let build_duration = start.elapsed().as_secs_f64();
        metrics::BLOCKS_PROPOSED_TOTAL.inc();
        metrics::CHAIN_HEAD_HEIGHT.set(next_height as i64);
        metrics::LAST_BLOCK_TX_COUNT.set(block.tx_count as i64);
        metrics::LAST_BLOCK_TOTAL_FEES.set(total_fees as i64);
        metrics::BLOCK_BUILD_DURATION.observe(build_duration);
        if let Some(interval) = interval_seconds {
            metrics::BLOCK_INTERVAL.observe(interval);
        }
        metrics::record_block_proposed_by(&self.config.proposer_id);
        {
            let mut last = self.last_proposer_id.lock().unwrap();
            if last.as_deref().is_some_and(|id| id != self.config.proposer_id) {
                metrics::POA_PROPOSER_ROTATIONS_TOTAL.inc();
            }
            *last = Some(self.config.proposer_id.clone());
        }

        tracing::info!(
            height = next_height,
            hash = %block_hash,
            tx_count = block.tx_count,
            total_fees,
            build_ms = build_duration * 1000.0,
            "proposed block"
        );

        self.publish_block(&block).await;
        Ok(())
    }

    async fn publish_block(&self, block: &Block) {
        let message = json!({
            "height": block.height,
            "hash": block.hash,
            "parent_hash": block.parent_hash,
            "timestamp": block.timestamp.to_rfc3339(),
            "tx_count": block.tx_count,
        });
        if let Err(err) = self.gossip.publish("blocks", message).await {
            tracing::warn!(error = %err, "failed to publish produced block");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chain_gossip::InProcessBackend;
    use chain_mempool::VolatileMempool;
    use chain_storage::MemoryStore;
    use std::time::Duration as StdDuration;

    fn test_proposer(block_time: StdDuration) -> Arc<Proposer> {
        let store: Arc<dyn ChainStore> = Arc::new(MemoryStore::new());
        let mempool: Arc<dyn MempoolBackend> = Arc::new(VolatileMempool::new(Default::default()));
        let gossip = Arc::new(GossipBroker::new(Arc::new(InProcessBackend::new())));
        let config = ProposerConfig {
            chain_id: "test".to_string(),
            proposer_id: "P1".to_string(),
            block_time,
            ..Default::default()
        };
        Proposer::new(config, store, mempool, gossip)
    }

    #[tokio::test]
    async fn start_creates_genesis_block() {
        let proposer = test_proposer(StdDuration::from_secs(60));
        proposer.start().await.unwrap();
        let head = proposer.store.get_head().unwrap().unwrap();
        assert_eq!(head.height, 0);
        assert_eq!(head.parent_hash, "0x00");
        proposer.stop().await;
    }

    #[tokio::test]
    async fn second_start_is_a_no_op() {
        let proposer = test_proposer(StdDuration::from_secs(60));
        proposer.start().await.unwrap();
        proposer.start().await.unwrap();
        let head = proposer.store.get_head().unwrap().unwrap();
        assert_eq!(head.height, 0);
        proposer.stop().await;
    }

    #[tokio::test]
    async fn produces_block_after_slot_elapses() {
        let proposer = test_proposer(StdDuration::from_millis(20));
        proposer.mempool.add(json!({"sender": "a", "fee": 5})).unwrap();
        proposer.start().await.unwrap();
        tokio::time::sleep(StdDuration::from_millis(150)).await;
        proposer.stop().await;
        let head = proposer.store.get_head().unwrap().unwrap();
        assert!(head.height >= 1, "expected at least one produced block, got height {}", head.height);
    }

    #[test]
    fn block_hash_is_deterministic() {
        let ts = Utc::now();
        let a = compute_block_hash("chain", 1, "0xparent", ts);
        let b = compute_block_hash("chain", 1, "0xparent", ts);
        assert_eq!(a, b);
        assert!(a.starts_with("0x"));
        assert_eq!(a.len(), 66);
    }

    #[test]
    fn block_hash_changes_with_height() {
        let ts = Utc::now();
        let a = compute_block_hash("chain", 1, "0xparent", ts);
        let b = compute_block_hash("chain", 2, "0xparent", ts);
        assert_ne!(a, b);
    }
}
