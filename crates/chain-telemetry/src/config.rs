//! Telemetry configuration from environment variables: log level/format
//! and the metrics port. OTLP/Tempo fields are dropped since no tracing
//! exporter is carried (see crate docs).

use std::env;

#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub service_name: String,
    pub log_level: String,
    pub json_logs: bool,
    pub metrics_port: u16,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "aitbc-chain".to_string(),
            log_level: "info".to_string(),
            json_logs: false,
            metrics_port: 9100,
        }
    }
}

impl TelemetryConfig {
    /// - `OTEL_SERVICE_NAME`: service name (default: aitbc-chain)
    /// - `QC_LOG_LEVEL` or `RUST_LOG`: log level filter (default: info)
    /// - `QC_JSON_LOGS`: emit JSON-formatted logs (default: false)
    /// - `QC_METRICS_PORT`: Prometheus metrics port (default: 9100)
    pub fn from_env() -> Self {
        Self {
            service_name: env::var("OTEL_SERVICE_NAME")
                .unwrap_or_else(|_| "aitbc-chain".to_string()),
            log_level: env::var("QC_LOG_LEVEL")
                .or_else(|_| env::var("RUST_LOG"))
                .unwrap_or_else(|_| "info".to_string()),
            json_logs: env::var("QC_JSON_LOGS")
                .map(|v| v.to_lowercase() == "true" || v == "1")
                .unwrap_or(false),
            metrics_port: env::var("QC_METRICS_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(9100),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = TelemetryConfig::default();
        assert_eq!(config.service_name, "aitbc-chain");
        assert_eq!(config.log_level, "info");
        assert_eq!(config.metrics_port, 9100);
    }
}
