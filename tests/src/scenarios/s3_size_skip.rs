//! S3 — size-skip.

use chain_node::{Config, Node, RpcService};
use chain_types::TransactionRequest;
use serde_json::json;
use std::time::Duration;

#[tokio::test]
async fn oversized_candidate_is_skipped_not_blocked_on() {
    let config = Config {
        db_path: ":memory:".to_string(),
        max_txs_per_block: 10,
        max_block_size_bytes: 200,
        min_fee: 0,
        block_time: Duration::from_millis(300),
        ..Config::default()
    };
    let node = Node::build(config).await.unwrap();
    let rpc = RpcService::new(node.store.clone(), node.mempool.clone(), node.gossip.clone());
    node.start().await.unwrap();

    let big = rpc
        .send_tx(TransactionRequest {
            kind: "TRANSFER".to_string(),
            sender: "big".to_string(),
            nonce: 0,
            fee: 1000,
            payload: json!({"padding": "x".repeat(500)}),
            sig: None,
        })
        .unwrap()
        .tx_hash;
    let small = rpc
        .send_tx(TransactionRequest {
            kind: "TRANSFER".to_string(),
            sender: "small".to_string(),
            nonce: 0,
            fee: 1,
            payload: json!({}),
            sig: None,
        })
        .unwrap()
        .tx_hash;

    tokio::time::sleep(Duration::from_millis(400)).await;
    node.shutdown().await.unwrap();

    let head = rpc.get_head().unwrap();
    assert_eq!(head.height, 1);
    assert_eq!(head.tx_count, 1);
    assert!(rpc.get_transaction(&small).is_ok());
    assert!(rpc.get_transaction(&big).is_err(), "oversized tx must remain in mempool");
    assert_eq!(node.mempool.size().unwrap(), 1);
}
