//! Process wiring: constructs storage, mempool, gossip, and the PoA
//! proposer from [`Config`] in dependency order, handing each subsystem
//! the handles it needs.

use std::path::Path;
use std::sync::Arc;

use chain_block_production::Proposer;
use chain_gossip::{GossipBroker, InProcessBackend, TcpBroadcastBackend};
use chain_mempool::{DurableMempool, MempoolBackend, VolatileMempool};
use chain_storage::{ChainStore, MemoryStore, SledStore};
use chain_sync::{ChainSync, ImportResult, IncomingBlock, ProposerSignatureValidator};
use chain_types::{CoreError, Transaction};

use crate::config::{Config, GossipBackendKind, MempoolBackendKind};

/// Owns every live subsystem for one running node. Dropping it does not
/// gracefully stop the proposer task — call [`Node::shutdown`] first.
pub struct Node {
    pub config: Config,
    pub store: Arc<dyn ChainStore>,
    pub mempool: Arc<dyn MempoolBackend>,
    pub gossip: Arc<GossipBroker>,
    pub proposer: Arc<Proposer>,
}

impl Node {
    /// Builds every subsystem per `config`, but does not start the
    /// proposer loop — call [`Node::start`] once the caller is ready.
    pub async fn build(config: Config) -> Result<Self, CoreError> {
        let store: Arc<dyn ChainStore> = if config.db_path == ":memory:" {
            Arc::new(MemoryStore::new())
        } else {
            std::fs::create_dir_all(&config.db_path)
                .map_err(|e| CoreError::Storage(e.to_string()))?;
            Arc::new(SledStore::open(Path::new(&config.db_path))?)
        };

        let mempool: Arc<dyn MempoolBackend> = match config.mempool_backend {
            MempoolBackendKind::Volatile => Arc::new(VolatileMempool::new(config.mempool_config())),
            MempoolBackendKind::Durable => {
                let path = Path::new(&config.db_path).join("mempool");
                std::fs::create_dir_all(&path).map_err(|e| CoreError::Storage(e.to_string()))?;
                Arc::new(DurableMempool::open(&path, config.mempool_config())?)
            }
        };

        let gossip_backend = match config.gossip_backend {
            GossipBackendKind::InProcess => Arc::new(InProcessBackend::new()) as Arc<dyn chain_gossip::GossipBackend>,
            GossipBackendKind::Tcp => {
                Arc::new(TcpBroadcastBackend::bind(&config.gossip_broadcast_addr).await?)
                    as Arc<dyn chain_gossip::GossipBackend>
            }
        };
        let gossip = Arc::new(GossipBroker::new(gossip_backend));

        let proposer = Proposer::new(config.proposer_config(), store.clone(), mempool.clone(), gossip.clone());

        Ok(Self {
            config,
            store,
            mempool,
            gossip,
            proposer,
        })
    }

    /// Ensures genesis exists and starts the proposer loop.
    pub async fn start(&self) -> Result<(), CoreError> {
        self.proposer.start().await
    }

    /// Stops the proposer and tears down the gossip back-end.
    pub async fn shutdown(&self) -> Result<(), CoreError> {
        self.proposer.stop().await;
        self.gossip.shutdown().await
    }

    /// Admin entry point for importing a peer-produced block,
    /// not exposed over any network transport by this workspace.
    pub fn import_block(
        &self,
        incoming: IncomingBlock,
        transactions: Vec<Transaction>,
    ) -> Result<ImportResult, CoreError> {
        let mut sync = ChainSync::new(self.store.as_ref(), self.config.max_reorg_depth)
            .with_validator(ProposerSignatureValidator::new(self.config.trusted_proposers.clone()));
        if !self.config.sync_validate_signatures {
            sync = sync.without_signature_validation();
        }
        sync.import_block(incoming, transactions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memory_config() -> Config {
        Config {
            db_path: ":memory:".to_string(),
            ..Config::default()
        }
    }

    #[tokio::test]
    async fn build_then_start_creates_genesis() {
        let node = Node::build(memory_config()).await.unwrap();
        node.start().await.unwrap();
        let head = node.store.get_head().unwrap().unwrap();
        assert_eq!(head.height, 0);
        node.shutdown().await.unwrap();
    }
}
