//! Block production metrics.

use lazy_static::lazy_static;
use prometheus::{
    register_histogram, register_int_counter, register_int_counter_vec, register_int_gauge,
    Histogram, IntCounter, IntCounterVec, IntGauge,
};
lazy_static! {
    pub static ref BLOCKS_PROPOSED_TOTAL: IntCounter =
        register_int_counter!("blocks_proposed_total", "Total blocks successfully proposed").unwrap();
    pub static ref CHAIN_HEAD_HEIGHT: IntGauge =
        register_int_gauge!("chain_head_height", "Height of the local chain head").unwrap();
    pub static ref LAST_BLOCK_TX_COUNT: IntGauge =
        register_int_gauge!("last_block_tx_count", "Transaction count of the last produced block").unwrap();
    pub static ref LAST_BLOCK_TOTAL_FEES: IntGauge =
        register_int_gauge!("last_block_total_fees", "Total fees of the last produced block").unwrap();
    pub static ref BLOCK_BUILD_DURATION: Histogram = register_histogram!(
        "block_build_duration_seconds",
        "Time spent building and committing one block",
        vec![0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0]
    )
    .unwrap();
    pub static ref BLOCK_INTERVAL: Histogram = register_histogram!(
        "block_interval_seconds",
        "Observed time between consecutive block timestamps",
        vec![0.1, 0.5, 1.0, 2.0, 5.0, 10.0, 30.0]
    )
    .unwrap();
    pub static ref POA_PROPOSE_ERRORS_TOTAL: IntCounter =
        register_int_counter!("poa_propose_errors_total", "Total production-step failures").unwrap();
    pub static ref BLOCKS_SKIPPED_CIRCUIT_BREAKER_TOTAL: IntCounter = register_int_counter!(
        "blocks_skipped_circuit_breaker_total",
        "Total production ticks skipped because the circuit breaker was open"
    )
    .unwrap();
    pub static ref CIRCUIT_BREAKER_STATE: IntGauge =
        register_int_gauge!("circuit_breaker_state", "0 = closed/half-open, 1 = open").unwrap();
    pub static ref CIRCUIT_BREAKER_TRIPS_TOTAL: IntCounter =
        register_int_counter!("circuit_breaker_trips_total", "Total times the breaker tripped open").unwrap();
    pub static ref POA_PROPOSER_ROTATIONS_TOTAL: IntCounter = register_int_counter!(
        "poa_proposer_rotations_total",
        "Total times the proposer id changed between successive produced blocks"
    )
    .unwrap();
    static ref POA_BLOCKS_PROPOSED_BY_PROPOSER: IntCounterVec = register_int_counter_vec!(
        "poa_blocks_proposed_total",
        "Total blocks proposed, labeled by sanitized proposer id",
        &["proposer_id"]
    )
    .unwrap();
}

/// Replaces every non-alphanumeric byte with `_` so a proposer id is safe
/// to splice into a Prometheus metric name.
pub fn sanitize_metric_suffix(value: &str) -> String {
    let sanitized: String = value
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    let trimmed = sanitized.trim_matches('_');
    if trimmed.is_empty() {
        "unknown".to_string()
    } else {
        trimmed.to_string()
    }
}

pub fn record_block_proposed_by(proposer_id: &str) {
    let label = sanitize_metric_suffix(proposer_id);
    POA_BLOCKS_PROPOSED_BY_PROPOSER.with_label_values(&[&label]).inc();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitizes_non_alphanumeric_characters() {
        assert_eq!(sanitize_metric_suffix("node-1.example"), "node_1_example");
        assert_eq!(sanitize_metric_suffix("---"), "unknown");
        assert_eq!(sanitize_metric_suffix(""), "unknown");
    }
}
