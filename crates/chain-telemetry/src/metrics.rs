//! Renders the global Prometheus registry to text: a text-format export
//! of whatever counters/gauges the subsystem crates registered via
//! `lazy_static!`.

use prometheus::{Encoder, TextEncoder};

/// Opaque handle kept alive for the process lifetime; metrics themselves
/// live in each subsystem crate's own `lazy_static!` registry.
pub struct MetricsHandle;

pub fn register_metrics() -> MetricsHandle {
    MetricsHandle
}

/// Renders every metric in the default registry as Prometheus text
/// exposition format.
pub fn render_prometheus_text() -> Result<String, prometheus::Error> {
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    TextEncoder::new().encode(&metric_families, &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
}
