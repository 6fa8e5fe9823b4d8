//! Router tests: scrape endpoint rendering and health probes.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use metrics_exporter_prometheus::PrometheusBuilder;
use quota_exporter::models::{QuotaObservation, QuotaScope};
use quota_exporter::observability::HealthState;
use quota_exporter::publisher::QuotaRegistry;
use quota_exporter::routes::build_routes;
use std::sync::Arc;
use tower::util::ServiceExt;

async fn body_string(body: Body) -> String {
    let bytes = body.collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn test_scrape_endpoint_renders_published_gauges() {
    // Build (not install) a recorder so tests stay isolated from the
    // process-global one.
    let recorder = PrometheusBuilder::new().build_recorder();
    let handle = recorder.handle();

    let registry = QuotaRegistry::new();
    metrics::with_local_recorder(&recorder, || {
        registry.publish(&QuotaObservation {
            metric: "CPUS".to_string(),
            limit: 100.0,
            usage: 42.0,
            scope: QuotaScope::Global {
                project: "proj-a".to_string(),
            },
        });
    });

    let app = build_routes("/metrics", handle, Arc::new(HealthState::new()));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/metrics")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = body_string(response.into_body()).await;
    assert!(
        body.contains("gcloud_quota_global_cpus_limit{project=\"proj-a\"} 100"),
        "missing limit gauge in exposition output: {body}"
    );
    assert!(
        body.contains("gcloud_quota_global_cpus_usage{project=\"proj-a\"} 42"),
        "missing usage gauge in exposition output: {body}"
    );
    assert!(
        body.contains("# HELP gcloud_quota_global_cpus_limit The limit for quota CPUS."),
        "missing help text in exposition output: {body}"
    );
}

#[tokio::test]
async fn test_scrape_path_is_configurable() {
    let recorder = PrometheusBuilder::new().build_recorder();
    let handle = recorder.handle();

    let app = build_routes("/prometheus", handle, Arc::new(HealthState::new()));

    let found = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/prometheus")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(found.status(), StatusCode::OK);

    let missing = app
        .oneshot(
            Request::builder()
                .uri("/metrics")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_health_is_ok_before_readiness() {
    let recorder = PrometheusBuilder::new().build_recorder();
    let app = build_routes("/metrics", recorder.handle(), Arc::new(HealthState::new()));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_ready_reflects_health_state() {
    let recorder = PrometheusBuilder::new().build_recorder();
    let health_state = Arc::new(HealthState::new());
    let app = build_routes("/metrics", recorder.handle(), Arc::clone(&health_state));

    let not_ready = app
        .clone()
        .oneshot(Request::builder().uri("/ready").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(not_ready.status(), StatusCode::SERVICE_UNAVAILABLE);

    health_state.set_ready();

    let ready = app
        .oneshot(Request::builder().uri("/ready").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(ready.status(), StatusCode::OK);
}
