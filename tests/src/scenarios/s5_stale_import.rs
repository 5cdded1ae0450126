//! S5 — stale import.

use chain_node::{Config, Node};
use chain_sync::IncomingBlock;
use chrono::Utc;

fn hash(n: u8) -> String {
    format!("0x{}", hex::encode([n; 32]))
}

fn incoming(height: u64, hash: &str, parent_hash: &str) -> IncomingBlock {
    IncomingBlock {
        height: Some(height),
        hash: Some(hash.to_string()),
        parent_hash: Some(parent_hash.to_string()),
        proposer: Some("p1".to_string()),
        timestamp: Some(Utc::now()),
        tx_count: Some(0),
        state_root: None,
    }
}

#[tokio::test]
async fn reimporting_a_block_already_at_that_height_is_rejected_as_duplicate() {
    let node = Node::build(Config { db_path: ":memory:".to_string(), ..Config::default() })
        .await
        .unwrap();

    node.import_block(incoming(0, &hash(1), "0x00"), vec![]).unwrap();
    node.import_block(incoming(1, &hash(2), &hash(1)), vec![]).unwrap();
    node.import_block(incoming(2, &hash(3), &hash(2)), vec![]).unwrap();

    let result = node.import_block(incoming(2, &hash(3), &hash(2)), vec![]).unwrap();
    assert!(!result.accepted);
    assert!(result.reason.contains("duplicate"));
}

#[tokio::test]
async fn a_different_block_at_an_already_filled_height_is_rejected_as_not_longer() {
    let node = Node::build(Config { db_path: ":memory:".to_string(), ..Config::default() })
        .await
        .unwrap();

    node.import_block(incoming(0, &hash(1), "0x00"), vec![]).unwrap();
    node.import_block(incoming(1, &hash(2), &hash(1)), vec![]).unwrap();
    node.import_block(incoming(2, &hash(3), &hash(2)), vec![]).unwrap();

    let result = node.import_block(incoming(2, &hash(9), &hash(1)), vec![]).unwrap();
    assert!(!result.accepted);
    assert!(result.reason.contains("rejected") || result.reason.contains("fork"));
    assert!(!result.reorged);
}
