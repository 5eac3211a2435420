//! Prometheus metrics endpoint
//!
//! Exposes relay metrics in Prometheus format for monitoring.

use axum::response::IntoResponse;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;

/// Global Prometheus handle for metrics export
static PROMETHEUS_HANDLE: OnceCell<PrometheusHandle> = OnceCell::new();

/// Initialize metrics (call once at startup)
pub fn init_metrics() -> anyhow::Result<()> {
    PROMETHEUS_HANDLE.get_or_try_init(|| PrometheusBuilder::new().install_recorder())?;

    register_metrics();
    Ok(())
}

/// Register all custom metrics
fn register_metrics() {
    metrics::describe_counter!(
        "relay_requests_total",
        "Total number of relayed requests"
    );
    metrics::describe_counter!(
        "relay_stream_chunks_total",
        "Total chunks relayed on streamed responses"
    );
    metrics::describe_histogram!(
        "relay_request_duration_seconds",
        "Time until the response (or first stream byte) was ready"
    );
}

/// Prometheus metrics endpoint handler
///
/// Returns metrics in Prometheus text format for scraping. Empty until
/// [`init_metrics`] has run.
pub async fn prometheus_metrics() -> impl IntoResponse {
    PROMETHEUS_HANDLE
        .get()
        .map(PrometheusHandle::render)
        .unwrap_or_default()
}

/// Record a finished (or started, for streams) request
pub fn record_request(mode: &str, status: u16, duration_secs: f64) {
    metrics::counter!("relay_requests_total", "mode" => mode.to_string(), "status" => status.to_string())
        .increment(1);
    metrics::histogram!("relay_request_duration_seconds", "mode" => mode.to_string())
        .record(duration_secs);
}

/// Record one chunk written to a streaming caller
pub fn record_stream_chunk() {
    metrics::counter!("relay_stream_chunks_total").increment(1);
}
