//! Chain sync metrics.

use lazy_static::lazy_static;
use prometheus::{register_histogram, register_int_counter, register_int_gauge, Histogram, IntCounter, IntGauge};

lazy_static! {
    pub static ref BLOCKS_RECEIVED_TOTAL: IntCounter =
        register_int_counter!("sync_blocks_received_total", "Total blocks offered to import_block")
            .unwrap();
    pub static ref BLOCKS_ACCEPTED_TOTAL: IntCounter =
        register_int_counter!("sync_blocks_accepted_total", "Total blocks accepted").unwrap();
    pub static ref BLOCKS_REJECTED_TOTAL: IntCounter =
        register_int_counter!("sync_blocks_rejected_total", "Total blocks rejected").unwrap();
    pub static ref BLOCKS_DUPLICATE_TOTAL: IntCounter =
        register_int_counter!("sync_blocks_duplicate_total", "Total duplicate-hash rejections").unwrap();
    pub static ref BLOCKS_STALE_TOTAL: IntCounter =
        register_int_counter!("sync_blocks_stale_total", "Total stale-height rejections").unwrap();
    pub static ref BLOCKS_GAP_TOTAL: IntCounter =
        register_int_counter!("sync_blocks_gap_total", "Total height-gap rejections").unwrap();
    pub static ref FORKS_DETECTED_TOTAL: IntCounter =
        register_int_counter!("sync_forks_detected_total", "Total forks detected").unwrap();
    pub static ref REORGS_TOTAL: IntCounter =
        register_int_counter!("sync_reorgs_total", "Total successful reorgs").unwrap();
    pub static ref REORG_REJECTED_TOTAL: IntCounter =
        register_int_counter!("sync_reorg_rejected_total", "Total reorgs rejected as too deep").unwrap();
    pub static ref REORG_DEPTH: Histogram = register_histogram!(
        "sync_reorg_depth",
        "Depth of performed reorgs",
        vec![1.0, 2.0, 3.0, 5.0, 8.0, 13.0, 21.0]
    )
    .unwrap();
    pub static ref SIGNATURE_VALIDATED_TOTAL: IntCounter = register_int_counter!(
        "sync_signature_validated_total",
        "Total blocks passing the signature gate"
    )
    .unwrap();
    pub static ref SIGNATURE_REJECTED_TOTAL: IntCounter = register_int_counter!(
        "sync_signature_rejected_total",
        "Total blocks rejected by the signature gate"
    )
    .unwrap();
    pub static ref IMPORT_DURATION: Histogram = register_histogram!(
        "sync_import_duration_seconds",
        "Time spent per import_block call",
        vec![0.0001, 0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5]
    )
    .unwrap();
    pub static ref CHAIN_HEIGHT: IntGauge =
        register_int_gauge!("sync_chain_height", "Height of the local chain after the last import").unwrap();
}
