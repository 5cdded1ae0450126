//! Long-running node process: builds [`chain_node::Config`] from the
//! environment, wires every subsystem, starts the PoA proposer, and awaits
//! `Ctrl+C` for graceful shutdown.

use chain_node::{Config, Node};
use chain_telemetry::{init_tracing, TelemetryConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _tracing_guard = init_tracing(&TelemetryConfig::from_env())?;

    let config = Config::from_env();
    tracing::info!(chain_id = %config.chain_id, proposer_id = %config.proposer_id, "starting chain node");

    let node = Node::build(config).await?;
    node.start().await?;

    tokio::signal::ctrl_c().await?;
    tracing::info!("shutdown signal received");
    node.shutdown().await?;

    Ok(())
}
