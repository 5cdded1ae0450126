//! S4 — duplicate import.

use chain_node::{Config, Node};
use chain_sync::IncomingBlock;
use std::time::Duration;

#[tokio::test]
async fn reimporting_the_local_head_is_rejected_as_duplicate() {
    let config = Config {
        db_path: ":memory:".to_string(),
        block_time: Duration::from_millis(30),
        ..Config::default()
    };
    let node = Node::build(config).await.unwrap();
    node.start().await.unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;
    node.shutdown().await.unwrap();

    let head = node.store.get_head().unwrap().unwrap();
    let before = node.store.get_head().unwrap().unwrap();

    let result = node
        .import_block(
            IncomingBlock {
                height: Some(head.height),
                hash: Some(head.hash.clone()),
                parent_hash: Some(head.parent_hash.clone()),
                proposer: Some(head.proposer.clone()),
                timestamp: Some(head.timestamp),
                tx_count: Some(head.tx_count),
                state_root: head.state_root.clone(),
            },
            vec![],
        )
        .unwrap();

    assert!(!result.accepted);
    assert!(result.reason.contains("duplicate"));
    assert_eq!(node.store.get_head().unwrap().unwrap(), before);
}
