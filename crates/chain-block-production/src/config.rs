//! Proposer configuration: slot interval, per-block limits, and the
//! circuit breaker thresholds.

use std::time::Duration;

use crate::circuit_breaker::CircuitBreakerConfig;

#[derive(Clone, Debug)]
pub struct ProposerConfig {
    pub chain_id: String,
    pub proposer_id: String,
    pub block_time: Duration,
    pub max_block_size_bytes: u64,
    pub max_txs_per_block: usize,
    pub circuit_breaker: CircuitBreakerConfig,
}

impl Default for ProposerConfig {
    fn default() -> Self {
        Self {
            chain_id: "default".to_string(),
            proposer_id: "proposer-1".to_string(),
            block_time: Duration::from_secs(5),
            max_block_size_bytes: 1_000_000,
            max_txs_per_block: 500,
            circuit_breaker: CircuitBreakerConfig::default(),
        }
    }
}
