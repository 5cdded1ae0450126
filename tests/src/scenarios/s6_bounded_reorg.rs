//! S6 — bounded reorg.

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

async fn seeded_chain(max_reorg_depth: u64) -> Node {
    let node = Node::build(Config {
        db_path: ":memory:".to_string(),
        max_reorg_depth,
        ..Config::default()
    })
    .await
    .unwrap();
    node.import_block(incoming(0, &hash(1), "0x00"), vec![]).unwrap();
    for h in 1u8..=5 {
        node.import_block(incoming(h as u64, &hash(h + 1), &hash(h)), vec![]).unwrap();
    }
    node
}

#[tokio::test]
async fn importing_a_far_future_block_is_rejected_as_a_gap() {
    let node = seeded_chain(3).await;
    let result = node.import_block(incoming(20, &hash(200), &hash(199)), vec![]).unwrap();
    assert!(!result.accepted);
    assert!(result.reason.contains("gap"));
}

#[tokio::test]
async fn mismatched_parent_at_the_next_height_is_rejected_as_a_gap() {
    let node = seeded_chain(3).await;
    // height 6 == local_height(5) + 1, but parent_hash does not match the
    // local hash of block 5 — the classifier cannot extend the head, and
    // since height > local_height the only remaining bucket is "gap".
    let result = node.import_block(incoming(6, &hash(60), &hash(99)), vec![]).unwrap();
    assert!(!result.accepted);
    assert!(result.reason.contains("gap"));
}

#[tokio::test]
async fn correct_parent_at_the_next_height_is_accepted() {
    let node = seeded_chain(3).await;
    let head_hash = hash(6);
    let result = node.import_block(incoming(6, &hash(60), &head_hash), vec![]).unwrap();
    assert!(result.accepted);
    assert!(!result.reorged);
}
