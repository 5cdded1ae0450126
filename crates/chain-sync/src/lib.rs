//! Chain sync and fork resolution: validates an incoming block, classifies
//! it against the local head, and either appends, rejects, or reorganizes,
//! reporting the outcome as a named result rather than an exception.

pub mod metrics;
mod validator;

pub use validator::ProposerSignatureValidator;

use chain_storage::ChainStore;
use chain_types::{Block, CoreError, Transaction};
use chrono::{DateTime, Utc};
use std::time::Instant;

/// A block as received from a peer, before it has been validated or
/// normalized into a [`Block`].
#[derive(Debug, Clone, Default)]
pub struct IncomingBlock {
    pub height: Option<u64>,
    pub hash: Option<String>,
    pub parent_hash: Option<String>,
    pub proposer: Option<String>,
    pub timestamp: Option<DateTime<Utc>>,
    pub tx_count: Option<u64>,
    pub state_root: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportResult {
    pub accepted: bool,
    pub height: i64,
    pub block_hash: String,
    pub reason: String,
    pub reorged: bool,
    pub reorg_depth: u64,
}

impl ImportResult {
    fn rejected(height: i64, block_hash: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            accepted: false,
            height,
            block_hash: block_hash.into(),
            reason: reason.into(),
            reorged: false,
            reorg_depth: 0,
        }
    }
}

pub struct ChainSync<'a> {
    store: &'a dyn ChainStore,
    max_reorg_depth: u64,
    validator: ProposerSignatureValidator,
    validate_signatures: bool,
}

impl<'a> ChainSync<'a> {
    pub fn new(store: &'a dyn ChainStore, max_reorg_depth: u64) -> Self {
        Self {
            store,
            max_reorg_depth,
            validator: ProposerSignatureValidator::default(),
            validate_signatures: true,
        }
    }

    pub fn with_validator(mut self, validator: ProposerSignatureValidator) -> Self {
        self.validator = validator;
        self
    }

    pub fn without_signature_validation(mut self) -> Self {
        self.validate_signatures = false;
        self
    }

    /// Imports one block produced elsewhere, classifying it against the
    /// local chain.
    pub fn import_block(
        &self,
        incoming: IncomingBlock,
        transactions: Vec<Transaction>,
    ) -> Result<ImportResult, CoreError> {
        let start = Instant::now();
        metrics::BLOCKS_RECEIVED_TOTAL.inc();

        let height = incoming.height.map(|h| h as i64).unwrap_or(-1);
        let block_hash = incoming.hash.clone().unwrap_or_default();

        if self.validate_signatures {
            if let Err(reason) = self.validator.validate(&incoming) {
                metrics::BLOCKS_REJECTED_TOTAL.inc();
                return Ok(ImportResult::rejected(height, block_hash, reason));
            }
        }

        let result = self.classify_and_import(incoming, transactions)?;
        metrics::IMPORT_DURATION.observe(start.elapsed().as_secs_f64());
        Ok(result)
    }

    fn classify_and_import(
        &self,
        incoming: IncomingBlock,
        transactions: Vec<Transaction>,
    ) -> Result<ImportResult, CoreError> {
        let height = incoming.height.unwrap() as i64;
        let hash = incoming.hash.clone().unwrap();
        let parent_hash = incoming.parent_hash.clone().unwrap();

        if self.store.get_block_by_hash(&hash)?.is_some() {
            metrics::BLOCKS_DUPLICATE_TOTAL.inc();
            return Ok(ImportResult::rejected(height, hash, "duplicate"));
        }

        let head = self.store.get_head()?;
        let local_height: i64 = head.as_ref().map(|b| b.height as i64).unwrap_or(-1);

        let extends_head = height == local_height + 1
            && (head
                .as_ref()
                .map(|h| h.hash == parent_hash)
                .unwrap_or(false)
                || (height == 0 && parent_hash == "0x00"));

        if extends_head {
            return self.append(incoming, transactions);
        }

        if height <= local_height {
            let existing_at_height = self.store.get_block_by_height(height as u64)?;
            if let Some(existing) = existing_at_height {
                if existing.hash != hash {
                    metrics::FORKS_DETECTED_TOTAL.inc();
                    return self.resolve_fork(incoming, transactions, head.unwrap());
                }
            }
            metrics::BLOCKS_STALE_TOTAL.inc();
            return Ok(ImportResult::rejected(
                height,
                hash,
                format!("stale block (our height: {local_height})"),
            ));
        }

        metrics::BLOCKS_GAP_TOTAL.inc();
        Ok(ImportResult::rejected(
            height,
            hash,
            format!("gap detected (our height: {local_height}, received: {height})"),
        ))
    }

    fn append(
        &self,
        incoming: IncomingBlock,
        transactions: Vec<Transaction>,
    ) -> Result<ImportResult, CoreError> {
        let height = incoming.height.unwrap();
        let hash = incoming.hash.clone().unwrap();
        let tx_count = if transactions.is_empty() {
            incoming.tx_count.unwrap_or(0)
        } else {
            transactions.len() as u64
        };

        let block = Block {
            height,
            hash: hash.clone(),
            parent_hash: incoming.parent_hash.clone().unwrap(),
            proposer: incoming.proposer.clone().unwrap_or_else(|| "unknown".to_string()),
            timestamp: incoming.timestamp.unwrap_or_else(Utc::now),
            tx_count,
            state_root: incoming.state_root.clone(),
        };

        self.store.append_block(block, transactions)?;

        metrics::BLOCKS_ACCEPTED_TOTAL.inc();
        metrics::CHAIN_HEIGHT.set(height as i64);
        tracing::info!(height, hash = %hash, "imported block");

        Ok(ImportResult {
            accepted: true,
            height: height as i64,
            block_hash: hash,
            reason: "appended to chain".to_string(),
            reorged: false,
            reorg_depth: 0,
        })
    }

    fn resolve_fork(
        &self,
        incoming: IncomingBlock,
        transactions: Vec<Transaction>,
        our_head: Block,
    ) -> Result<ImportResult, CoreError> {
        let fork_height = incoming.height.unwrap() as i64;
        let our_height = our_head.height as i64;
        let hash = incoming.hash.clone().unwrap_or_default();

        tracing::warn!(fork_height, our_height, "fork detected");

        if fork_height <= our_height {
            return Ok(ImportResult::rejected(
                fork_height,
                hash,
                format!("fork rejected: our chain is longer or equal ({our_height} >= {fork_height})"),
            ));
        }

        let reorg_depth = (our_height - fork_height + 1) as u64;
        if reorg_depth > self.max_reorg_depth {
            metrics::REORG_REJECTED_TOTAL.inc();
            return Ok(ImportResult::rejected(
                fork_height,
                hash,
                format!("reorg depth {reorg_depth} exceeds max {}", self.max_reorg_depth),
            ));
        }

        let removed = self.store.delete_blocks_from(fork_height as u64)?;

        metrics::REORGS_TOTAL.inc();
        metrics::REORG_DEPTH.observe(removed as f64);
        tracing::warn!(removed_blocks = removed, new_height = fork_height, "chain reorg performed");

        let mut result = self.append(incoming, transactions)?;
        result.reorged = true;
        result.reorg_depth = removed;
        Ok(result)
    }
}
