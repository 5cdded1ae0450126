//! Logging and metrics ambient stack: `tracing` for structured logs and
//! `prometheus` for counters/gauges/summaries. OpenTelemetry/OTLP trace
//! export is dropped — this workspace never runs a collector, so carrying
//! the exporter stack would be dead weight (see DESIGN.md).

mod config;
mod metrics;
mod tracing_setup;

pub use config::TelemetryConfig;
pub use metrics::{register_metrics, render_prometheus_text, MetricsHandle};
pub use tracing_setup::{init_tracing, TelemetryError, TracingGuard};
