//! S2 — fee priority drain.

use chain_node::{Config, Node, RpcService};
use chain_types::TransactionRequest;
use serde_json::json;
use std::time::Duration;

fn submit(rpc: &RpcService, sender: &str, fee: u64) -> String {
    rpc.send_tx(TransactionRequest {
        kind: "TRANSFER".to_string(),
        sender: sender.to_string(),
        nonce: 0,
        fee,
        payload: json!({}),
        sig: None,
    })
    .unwrap()
    .tx_hash
}

#[tokio::test]
async fn next_block_drains_highest_fee_first_up_to_max_txs() {
    let config = Config {
        db_path: ":memory:".to_string(),
        max_txs_per_block: 2,
        max_block_size_bytes: 1_000_000,
        min_fee: 0,
        block_time: Duration::from_millis(300),
        ..Config::default()
    };
    let node = Node::build(config).await.unwrap();
    let rpc = RpcService::new(node.store.clone(), node.mempool.clone(), node.gossip.clone());
    node.start().await.unwrap();

    // genesis is produced synchronously by start(); wait for it then submit.
    let t_a = submit(&rpc, "a", 1);
    let _t_b = submit(&rpc, "b", 100);
    let _t_c = submit(&rpc, "c", 50);

    // Wait past exactly one proposal slot, then shut down before the next one fires.
    tokio::time::sleep(Duration::from_millis(400)).await;
    node.shutdown().await.unwrap();

    let head = rpc.get_head().unwrap();
    assert_eq!(head.height, 1);
    assert_eq!(head.tx_count, 2);

    assert!(rpc.get_transaction(&t_a).is_err(), "T_a should remain in mempool, not in a block");
    assert_eq!(node.mempool.size().unwrap(), 1);
}
