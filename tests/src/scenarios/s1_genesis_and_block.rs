//! S1 — genesis + one block.

use chain_node::{Config, Node, RpcService};
use chain_types::TransactionRequest;
use serde_json::json;
use std::time::Duration;

#[tokio::test]
async fn genesis_then_submitted_tx_lands_in_next_block() {
    let config = Config {
        db_path: ":memory:".to_string(),
        chain_id: "test".to_string(),
        proposer_id: "P1".to_string(),
        block_time: Duration::from_secs(1),
        ..Config::default()
    };
    let node = Node::build(config).await.unwrap();
    let rpc = RpcService::new(node.store.clone(), node.mempool.clone(), node.gossip.clone());

    node.start().await.unwrap();
    assert_eq!(rpc.get_head().unwrap().height, 0);

    let response = rpc
        .send_tx(TransactionRequest {
            kind: "TRANSFER".to_string(),
            sender: "a".to_string(),
            nonce: 0,
            fee: 10,
            payload: json!({}),
            sig: None,
        })
        .unwrap();

    tokio::time::sleep(Duration::from_millis(1100)).await;
    node.shutdown().await.unwrap();

    let head = rpc.get_head().unwrap();
    assert_eq!(head.height, 1);
    assert_eq!(head.tx_count, 1);

    let tx = rpc.get_transaction(&response.tx_hash).unwrap();
    assert_eq!(tx.block_height, Some(1));
}
