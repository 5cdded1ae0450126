//! `RpcService`: the client/operator RPC operations as plain async Rust
//! functions returning typed results — no HTTP framework is started by this
//! workspace; a facade would sit in front of this and translate
//! [`chain_types::CoreError`] onto wire status codes.

use std::sync::Arc;

use chain_gossip::GossipBroker;
use chain_mempool::MempoolBackend;
use chain_storage::ChainStore;
use chain_types::{canonical_json, Account, Block, CoreError, Receipt, Transaction, TransactionRequest};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Fee schedule used by [`RpcService::estimate_fee`].
const BASE_FEE: u64 = 10;
const PER_BYTE_FEE: u64 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BalanceResponse {
    pub address: String,
    pub balance: u64,
    pub nonce: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<chrono::DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendTxResponse {
    pub tx_hash: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReceiptSubmissionRequest {
    pub sender: String,
    pub nonce: u64,
    #[serde(default)]
    pub fee: u64,
    pub payload: Value,
    #[serde(default)]
    pub sig: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EstimateFeeRequest {
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub payload: Value,
}

#[derive(Debug, Clone, Serialize)]
pub struct EstimateFeeResponse {
    #[serde(rename = "type")]
    pub kind: String,
    pub base_fee: u64,
    pub payload_bytes: u64,
    pub estimated_fee: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MintFaucetRequest {
    pub address: String,
    pub amount: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct MintFaucetResponse {
    pub address: String,
    pub balance: u64,
}

/// The facade's single entry point into the core: storage, mempool, and
/// gossip, plus enough identity to answer `estimate_fee`/`mint_faucet`
/// without a separate executor.
pub struct RpcService {
    store: Arc<dyn ChainStore>,
    mempool: Arc<dyn MempoolBackend>,
    gossip: Arc<GossipBroker>,
}

impl RpcService {
    pub fn new(store: Arc<dyn ChainStore>, mempool: Arc<dyn MempoolBackend>, gossip: Arc<GossipBroker>) -> Self {
        Self { store, mempool, gossip }
    }

    pub fn get_head(&self) -> Result<Block, CoreError> {
        self.store.get_head()?.ok_or_else(|| CoreError::NotFound("no blocks yet".to_string()))
    }

    pub fn get_block(&self, height: u64) -> Result<Block, CoreError> {
        self.store
            .get_block_by_height(height)?
            .ok_or_else(|| CoreError::NotFound(format!("block at height {height}")))
    }

    pub fn get_transaction(&self, tx_hash: &str) -> Result<Transaction, CoreError> {
        self.store
            .get_transaction_by_hash(tx_hash)?
            .ok_or_else(|| CoreError::NotFound(format!("transaction {tx_hash}")))
    }

    pub fn get_receipt(&self, receipt_id: &str) -> Result<Receipt, CoreError> {
        self.store
            .get_receipt_by_id(receipt_id)?
            .ok_or_else(|| CoreError::NotFound(format!("receipt {receipt_id}")))
    }

    /// Unknown addresses return a zero balance, not `NotFound` — "never seen
    /// this address" is a perfectly ordinary account state.
    pub fn get_balance(&self, address: &str) -> Result<BalanceResponse, CoreError> {
        match self.store.get_account(address)? {
            Some(Account { address, balance, nonce, updated_at }) => {
                Ok(BalanceResponse { address, balance, nonce, updated_at: Some(updated_at) })
            }
            None => Ok(BalanceResponse {
                address: address.to_string(),
                balance: 0,
                nonce: 0,
                updated_at: None,
            }),
        }
    }

    /// Admits `request` into the mempool after structural validation.
    pub fn send_tx(&self, mut request: TransactionRequest) -> Result<SendTxResponse, CoreError> {
        request.validate()?;
        let content = serde_json::to_value(&request)?;
        let tx_hash = self.mempool.add(content)?;
        Ok(SendTxResponse { tx_hash })
    }

    /// "Submitting a receipt" means admitting a `RECEIPT_CLAIM` mempool
    /// transaction, not writing a [`Receipt`] row directly — settlement
    /// into the `Receipt` table is an external executor's job.
    pub fn submit_receipt(&self, request: ReceiptSubmissionRequest) -> Result<SendTxResponse, CoreError> {
        self.send_tx(TransactionRequest {
            kind: "RECEIPT_CLAIM".to_string(),
            sender: request.sender,
            nonce: request.nonce,
            fee: request.fee,
            payload: request.payload,
            sig: request.sig,
        })
    }

    /// `base_fee + per_byte * canonical_json(payload).len()`.
    pub fn estimate_fee(&self, request: EstimateFeeRequest) -> Result<EstimateFeeResponse, CoreError> {
        let kind = request.kind.unwrap_or_else(|| "TRANSFER".to_string()).to_uppercase();
        let payload_bytes = canonical_json(&request.payload)?.len() as u64;
        let estimated_fee = BASE_FEE + PER_BYTE_FEE * payload_bytes;
        Ok(EstimateFeeResponse { kind, base_fee: BASE_FEE, payload_bytes, estimated_fee })
    }

    /// Admin/devnet-only: upserts an account balance directly, bypassing
    /// the mempool.
    pub fn mint_faucet(&self, request: MintFaucetRequest) -> Result<MintFaucetResponse, CoreError> {
        if request.amount == 0 {
            return Err(CoreError::Validation("amount must be greater than 0".to_string()));
        }
        let account = self.store.upsert_account(&request.address, request.amount as i64, 0)?;
        Ok(MintFaucetResponse { address: account.address, balance: account.balance })
    }

    /// Publishes an admin-initiated notification to the `admin` topic;
    /// not one of the RPC methods a facade exposes directly, but useful
    /// for wiring a future websocket push without duplicating gossip
    /// plumbing.
    pub async fn notify(&self, event: &str, detail: Value) -> Result<(), CoreError> {
        self.gossip.publish("admin", json!({"event": event, "detail": detail})).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chain_gossip::InProcessBackend;
    use chain_mempool::{MempoolConfig, VolatileMempool};
    use chain_storage::MemoryStore;

    fn service() -> RpcService {
        let store: Arc<dyn ChainStore> = Arc::new(MemoryStore::new());
        let mempool: Arc<dyn MempoolBackend> = Arc::new(VolatileMempool::new(MempoolConfig::default()));
        let gossip = Arc::new(GossipBroker::new(Arc::new(InProcessBackend::new())));
        RpcService::new(store, mempool, gossip)
    }

    #[test]
    fn get_head_is_not_found_before_genesis() {
        let svc = service();
        assert!(matches!(svc.get_head(), Err(CoreError::NotFound(_))));
    }

    #[test]
    fn get_balance_defaults_to_zero_for_unknown_address() {
        let svc = service();
        let balance = svc.get_balance("0xnobody").unwrap();
        assert_eq!(balance.balance, 0);
        assert_eq!(balance.nonce, 0);
        assert!(balance.updated_at.is_none());
    }

    #[test]
    fn send_tx_admits_into_mempool() {
        let svc = service();
        let request = TransactionRequest {
            kind: "TRANSFER".to_string(),
            sender: "alice".to_string(),
            nonce: 0,
            fee: 10,
            payload: json!({"recipient": "bob", "amount": 5}),
            sig: None,
        };
        let response = svc.send_tx(request).unwrap();
        assert!(!response.tx_hash.is_empty());
        assert_eq!(svc.mempool.size().unwrap(), 1);
    }

    #[test]
    fn submit_receipt_becomes_a_receipt_claim_mempool_transaction() {
        let svc = service();
        let response = svc
            .submit_receipt(ReceiptSubmissionRequest {
                sender: "miner-1".to_string(),
                nonce: 0,
                fee: 10,
                payload: json!({"job_id": "job-1"}),
                sig: None,
            })
            .unwrap();
        let pending = svc.mempool.list().unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].tx_hash, response.tx_hash);
        assert_eq!(pending[0].content.get("type").and_then(|v| v.as_str()), Some("RECEIPT_CLAIM"));
    }

    #[test]
    fn estimate_fee_scales_with_payload_size() {
        let svc = service();
        let small = svc
            .estimate_fee(EstimateFeeRequest { kind: None, payload: json!({}) })
            .unwrap();
        let large = svc
            .estimate_fee(EstimateFeeRequest { kind: Some("transfer".to_string()), payload: json!({"data": "x".repeat(100)}) })
            .unwrap();
        assert_eq!(small.kind, "TRANSFER");
        assert_eq!(small.base_fee, 10);
        assert_eq!(large.base_fee, 10);
        assert!(large.estimated_fee > small.estimated_fee);
    }

    #[test]
    fn mint_faucet_upserts_balance_directly() {
        let svc = service();
        let response = svc.mint_faucet(MintFaucetRequest { address: "alice".to_string(), amount: 100 }).unwrap();
        assert_eq!(response.balance, 100);
        let response = svc.mint_faucet(MintFaucetRequest { address: "alice".to_string(), amount: 50 }).unwrap();
        assert_eq!(response.balance, 150);
    }

    #[test]
    fn mint_faucet_rejects_zero_amount() {
        let svc = service();
        let result = svc.mint_faucet(MintFaucetRequest { address: "alice".to_string(), amount: 0 });
        assert!(matches!(result, Err(CoreError::Validation(_))));
    }
}
