//! Compute API client integration tests against a fake server.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use qe_test_utils::{quota_json, static_token_receiver, FakeComputeApi};
use quota_exporter::errors::ExporterError;
use quota_exporter::services::ComputeClient;

#[tokio::test]
async fn test_project_quotas_happy_path() -> anyhow::Result<()> {
    let api = FakeComputeApi::start().await;
    api.mount_project_quotas(
        "proj-a",
        vec![
            quota_json("CPUS", 100.0, 42.0),
            quota_json("DISKS_TOTAL_GB", 4096.0, 200.0),
        ],
    )
    .await;

    let client = ComputeClient::new(api.base_url(), static_token_receiver("test-token"))?;

    let quotas = client.project_quotas("proj-a").await?;

    assert_eq!(quotas.len(), 2);
    let first = quotas.first().expect("first quota");
    assert_eq!(first.metric, "CPUS");
    assert!((first.limit - 100.0).abs() < f64::EPSILON);
    assert!((first.usage - 42.0).abs() < f64::EPSILON);
    Ok(())
}

#[tokio::test]
async fn test_region_quotas_happy_path() -> anyhow::Result<()> {
    let api = FakeComputeApi::start().await;
    api.mount_region_quotas(
        "proj-a",
        "us-central1",
        vec![quota_json("IN_USE_ADDRESSES", 8.0, 3.0)],
    )
    .await;

    let client = ComputeClient::new(api.base_url(), static_token_receiver("test-token"))?;

    let quotas = client.region_quotas("proj-a", "us-central1").await?;

    assert_eq!(quotas.len(), 1);
    assert_eq!(quotas.first().expect("first quota").metric, "IN_USE_ADDRESSES");
    Ok(())
}

#[tokio::test]
async fn test_bearer_token_is_sent() {
    let api = FakeComputeApi::start().await;
    // Only requests carrying the expected token match; anything else 404s.
    api.mount_project_quotas_requiring_token("proj-a", "sekrit", vec![quota_json("CPUS", 1.0, 0.0)])
        .await;

    let good = ComputeClient::new(api.base_url(), static_token_receiver("sekrit"))
        .expect("client should build");
    assert!(good.project_quotas("proj-a").await.is_ok());

    let bad = ComputeClient::new(api.base_url(), static_token_receiver("wrong"))
        .expect("client should build");
    assert!(bad.project_quotas("proj-a").await.is_err());
}

#[tokio::test]
async fn test_project_error_status_is_fetch_error() {
    let api = FakeComputeApi::start().await;
    api.mount_project_error("proj-a", 403).await;

    let client = ComputeClient::new(api.base_url(), static_token_receiver("test-token"))
        .expect("client should build");

    let result = client.project_quotas("proj-a").await;

    match result {
        Err(ExporterError::ProjectQuotaFetch { project, reason }) => {
            assert_eq!(project, "proj-a");
            assert!(reason.contains("403"), "reason was: {reason}");
        }
        other => panic!("expected ProjectQuotaFetch error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_region_error_carries_scope_context() {
    let api = FakeComputeApi::start().await;
    // No region mock mounted: the fake server answers 404.

    let client = ComputeClient::new(api.base_url(), static_token_receiver("test-token"))
        .expect("client should build");

    let result = client.region_quotas("proj-a", "europe-west1").await;

    match result {
        Err(ExporterError::RegionQuotaFetch {
            project, region, ..
        }) => {
            assert_eq!(project, "proj-a");
            assert_eq!(region, "europe-west1");
        }
        other => panic!("expected RegionQuotaFetch error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_unreachable_server_is_fetch_error() {
    // Nothing listens here.
    let client = ComputeClient::new(
        "http://127.0.0.1:1".to_string(),
        static_token_receiver("test-token"),
    )
    .expect("client should build");

    let result = client.project_quotas("proj-a").await;
    assert!(matches!(
        result,
        Err(ExporterError::ProjectQuotaFetch { .. })
    ));
}

#[tokio::test]
async fn test_project_without_quota_list_yields_empty_vec() {
    let api = FakeComputeApi::start().await;
    api.mount_project_quotas("proj-a", vec![]).await;

    let client = ComputeClient::new(api.base_url(), static_token_receiver("test-token"))
        .expect("client should build");

    let quotas = client.project_quotas("proj-a").await.unwrap();
    assert!(quotas.is_empty());
}
