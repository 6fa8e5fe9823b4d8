//! Metrics recorder setup and exporter self-metrics.
//!
//! Quota gauges are published by [`crate::publisher::QuotaRegistry`]; this
//! module owns the recorder itself plus the exporter's own operational
//! metrics:
//!
//! - `exporter_fetch_cycles_total` counter, labeled by `status`
//! - `exporter_fetch_cycle_duration_seconds` histogram

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::time::Duration;

/// Initialize the Prometheus metrics recorder and return the handle for
/// serving metrics via HTTP.
///
/// Must be called before any metrics are recorded.
///
/// # Errors
///
/// Returns an error if the recorder fails to install (e.g. already
/// installed).
pub fn init_metrics_recorder() -> Result<PrometheusHandle, String> {
    PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| format!("Failed to install Prometheus recorder: {e}"))
}

/// Record completion of one fetch-and-publish cycle.
///
/// Metric: `exporter_fetch_cycles_total`, `exporter_fetch_cycle_duration_seconds`
/// Labels: `status` ("success" or "error")
pub fn record_fetch_cycle(status: &str, duration: Duration) {
    histogram!("exporter_fetch_cycle_duration_seconds").record(duration.as_secs_f64());

    counter!("exporter_fetch_cycles_total",
        "status" => status.to_string()
    )
    .increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    // These tests exercise the recording functions against the global no-op
    // recorder; value assertions live in the publisher and poller tests
    // that install a debugging recorder.

    #[test]
    fn test_record_fetch_cycle() {
        record_fetch_cycle("success", Duration::from_millis(120));
        record_fetch_cycle("error", Duration::from_millis(40));
    }
}
