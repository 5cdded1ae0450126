//! Process configuration from environment variables, grouped into
//! per-component sub-structs each with a sensible `Default`.

use std::env;
use std::time::Duration;

use chain_mempool::MempoolConfig;
use chain_block_production::{CircuitBreakerConfig, ProposerConfig};

/// Selects which [`chain_mempool`] back-end to construct.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MempoolBackendKind {
    Volatile,
    Durable,
}

/// Selects which [`chain_gossip`] back-end to construct.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GossipBackendKind {
    InProcess,
    Tcp,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub chain_id: String,
    pub db_path: String,
    pub proposer_id: String,
    pub block_time: Duration,
    pub max_block_size_bytes: u64,
    pub max_txs_per_block: usize,
    pub min_fee: u64,
    pub mempool_backend: MempoolBackendKind,
    pub mempool_max_size: usize,
    pub circuit_breaker_threshold: u32,
    pub circuit_breaker_timeout: Duration,
    pub trusted_proposers: Vec<String>,
    pub max_reorg_depth: u64,
    pub sync_validate_signatures: bool,
    pub gossip_backend: GossipBackendKind,
    pub gossip_broadcast_addr: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            chain_id: "aitbc-devnet".to_string(),
            db_path: "./data/chain".to_string(),
            proposer_id: "proposer-1".to_string(),
            block_time: Duration::from_secs(5),
            max_block_size_bytes: 1_000_000,
            max_txs_per_block: 500,
            min_fee: 0,
            mempool_backend: MempoolBackendKind::Volatile,
            mempool_max_size: 10_000,
            circuit_breaker_threshold: 5,
            circuit_breaker_timeout: Duration::from_secs(30),
            trusted_proposers: Vec::new(),
            max_reorg_depth: 64,
            sync_validate_signatures: false,
            gossip_backend: GossipBackendKind::InProcess,
            gossip_broadcast_addr: "127.0.0.1:7700".to_string(),
        }
    }
}

impl Config {
    /// Reads every `QC_*` variable, falling back to [`Config::default`] for
    /// anything unset or unparsable.
    ///
    /// - `QC_CHAIN_ID`, `QC_DB_PATH`, `QC_PROPOSER_ID`
    /// - `QC_BLOCK_TIME_SECONDS`, `QC_MAX_BLOCK_SIZE_BYTES`, `QC_MAX_TXS_PER_BLOCK`
    /// - `QC_MIN_FEE`
    /// - `QC_MEMPOOL_BACKEND` (`volatile` | `durable`), `QC_MEMPOOL_MAX_SIZE`
    /// - `QC_CIRCUIT_BREAKER_THRESHOLD`, `QC_CIRCUIT_BREAKER_TIMEOUT_SECONDS`
    /// - `QC_TRUSTED_PROPOSERS` (comma-separated)
    /// - `QC_MAX_REORG_DEPTH`, `QC_SYNC_VALIDATE_SIGNATURES`
    /// - `QC_GOSSIP_BACKEND` (`inprocess` | `tcp`), `QC_GOSSIP_BROADCAST_ADDR`
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            chain_id: env_or("QC_CHAIN_ID", defaults.chain_id),
            db_path: env_or("QC_DB_PATH", defaults.db_path),
            proposer_id: env_or("QC_PROPOSER_ID", defaults.proposer_id),
            block_time: Duration::from_secs(env_parsed("QC_BLOCK_TIME_SECONDS", defaults.block_time.as_secs())),
            max_block_size_bytes: env_parsed("QC_MAX_BLOCK_SIZE_BYTES", defaults.max_block_size_bytes),
            max_txs_per_block: env_parsed("QC_MAX_TXS_PER_BLOCK", defaults.max_txs_per_block),
            min_fee: env_parsed("QC_MIN_FEE", defaults.min_fee),
            mempool_backend: parse_mempool_backend(env::var("QC_MEMPOOL_BACKEND").ok()),
            mempool_max_size: env_parsed("QC_MEMPOOL_MAX_SIZE", defaults.mempool_max_size),
            circuit_breaker_threshold: env_parsed("QC_CIRCUIT_BREAKER_THRESHOLD", defaults.circuit_breaker_threshold),
            circuit_breaker_timeout: Duration::from_secs(env_parsed(
                "QC_CIRCUIT_BREAKER_TIMEOUT_SECONDS",
                defaults.circuit_breaker_timeout.as_secs(),
            )),
            trusted_proposers: env::var("QC_TRUSTED_PROPOSERS")
                .ok()
                .map(|v| v.split(',').map(|s| s.trim().to_string()).filter(|s| !s.is_empty()).collect())
                .unwrap_or(defaults.trusted_proposers),
            max_reorg_depth: env_parsed("QC_MAX_REORG_DEPTH", defaults.max_reorg_depth),
            sync_validate_signatures: env::var("QC_SYNC_VALIDATE_SIGNATURES")
                .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
                .unwrap_or(defaults.sync_validate_signatures),
            gossip_backend: parse_gossip_backend(env::var("QC_GOSSIP_BACKEND").ok()),
            gossip_broadcast_addr: env_or("QC_GOSSIP_BROADCAST_ADDR", defaults.gossip_broadcast_addr),
        }
    }

    pub fn mempool_config(&self) -> MempoolConfig {
        MempoolConfig {
            min_fee: self.min_fee,
            max_size: self.mempool_max_size,
        }
    }

    pub fn proposer_config(&self) -> ProposerConfig {
        ProposerConfig {
            chain_id: self.chain_id.clone(),
            proposer_id: self.proposer_id.clone(),
            block_time: self.block_time,
            max_block_size_bytes: self.max_block_size_bytes,
            max_txs_per_block: self.max_txs_per_block,
            circuit_breaker: CircuitBreakerConfig {
                threshold: self.circuit_breaker_threshold,
                timeout: self.circuit_breaker_timeout,
            },
        }
    }
}

fn env_or(key: &str, default: String) -> String {
    env::var(key).unwrap_or(default)
}

fn env_parsed<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn parse_mempool_backend(value: Option<String>) -> MempoolBackendKind {
    match value.as_deref() {
        Some("durable") => MempoolBackendKind::Durable,
        _ => MempoolBackendKind::Volatile,
    }
}

fn parse_gossip_backend(value: Option<String>) -> GossipBackendKind {
    match value.as_deref() {
        Some("tcp") => GossipBackendKind::Tcp,
        _ => GossipBackendKind::InProcess,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_devnet_friendly() {
        let config = Config::default();
        assert_eq!(config.chain_id, "aitbc-devnet");
        assert_eq!(config.mempool_backend, MempoolBackendKind::Volatile);
        assert_eq!(config.gossip_backend, GossipBackendKind::InProcess);
    }

    #[test]
    fn trusted_proposers_parses_comma_separated_list() {
        let value = Some("alice, bob,, carol".to_string());
        let parsed: Vec<String> = value
            .map(|v| v.split(',').map(|s| s.trim().to_string()).filter(|s| !s.is_empty()).collect())
            .unwrap();
        assert_eq!(parsed, vec!["alice", "bob", "carol"]);
    }

    #[test]
    fn unknown_mempool_backend_falls_back_to_volatile() {
        assert_eq!(parse_mempool_backend(Some("bogus".into())), MempoolBackendKind::Volatile);
        assert_eq!(parse_mempool_backend(Some("durable".into())), MempoolBackendKind::Durable);
    }
}
