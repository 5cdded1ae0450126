//! Installs the global `tracing` subscriber: a plain fmt/json subscriber,
//! since this workspace never starts an OpenTelemetry collector.

use thiserror::Error;
use tracing_subscriber::EnvFilter;

use crate::TelemetryConfig;

#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("invalid log filter directive: {0}")]
    Config(String),
}

/// Held for the process lifetime; dropping it has no effect beyond
/// ordinary `tracing` subscriber teardown.
pub struct TracingGuard;

pub fn init_tracing(config: &TelemetryConfig) -> Result<TracingGuard, TelemetryError> {
    let filter = EnvFilter::try_new(&config.log_level)
        .map_err(|e| TelemetryError::Config(e.to_string()))?;

    let subscriber = tracing_subscriber::fmt().with_env_filter(filter);

    let result = if config.json_logs {
        subscriber.json().try_init()
    } else {
        subscriber.try_init()
    };
    // A subscriber may already be installed (e.g. by a test harness);
    // that is not a failure for our purposes.
    let _ = result;

    Ok(TracingGuard)
}
