//! `/health` and `/metrics` snapshot builders, built on top of
//! [`chain_telemetry::render_prometheus_text`].

use serde::Serialize;

use crate::node::Node;

#[derive(Debug, Clone, Serialize)]
pub struct HealthSnapshot {
    pub status: &'static str,
    pub chain_id: String,
    pub proposer_id: String,
    pub chain_height: Option<u64>,
    pub proposer_healthy: bool,
}

/// Builds the `/health` snapshot: `status` is `"ok"` whenever the proposer's
/// circuit breaker is not open, regardless of chain height (an empty chain
/// before genesis is still a healthy, starting node).
pub fn health_snapshot(node: &Node) -> HealthSnapshot {
    let proposer_healthy = node.proposer.is_healthy();
    let chain_height = node.store.get_head().ok().flatten().map(|b| b.height);
    HealthSnapshot {
        status: if proposer_healthy { "ok" } else { "degraded" },
        chain_id: node.config.chain_id.clone(),
        proposer_id: node.config.proposer_id.clone(),
        chain_height,
        proposer_healthy,
    }
}

/// Renders every metric registered by the subsystem crates as Prometheus
/// text exposition format.
pub fn metrics_snapshot() -> Result<String, prometheus::Error> {
    chain_telemetry::render_prometheus_text()
}
