//! HTTP route wiring.
//!
//! The scrape endpoint is unauthenticated so Prometheus can poll it; no
//! secrets are exposed in metrics, only quota numbers with bounded
//! `project`/`region` labels.

use crate::observability::{health_router, HealthState};
use axum::{extract::State, response::IntoResponse, routing::get, Router};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Build the exporter's router: the scrape endpoint at `metrics_path`
/// merged with the health probes.
pub fn build_routes(
    metrics_path: &str,
    prometheus_handle: PrometheusHandle,
    health_state: Arc<HealthState>,
) -> Router {
    let metrics_router = Router::new()
        .route(metrics_path, get(metrics_handler))
        .with_state(prometheus_handle);

    health_router(health_state)
        .merge(metrics_router)
        .layer(TraceLayer::new_for_http())
}

/// Handler for the scrape endpoint.
///
/// Returns 200 OK with Prometheus text format:
/// ```text
/// # HELP gcloud_quota_global_cpus_limit The limit for quota CPUS.
/// # TYPE gcloud_quota_global_cpus_limit gauge
/// gcloud_quota_global_cpus_limit{project="proj-a"} 100
/// ```
#[tracing::instrument(skip_all, name = "exporter.metrics.scrape")]
async fn metrics_handler(State(handle): State<PrometheusHandle>) -> impl IntoResponse {
    handle.render()
}
