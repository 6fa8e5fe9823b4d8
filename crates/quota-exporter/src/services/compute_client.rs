//! Google Compute API HTTP client.
//!
//! Fetches quota records for projects (global scope) and regions. The
//! exporter consumes this purely as a data source: any failure is surfaced
//! as a per-scope error and treated as fatal by the caller; there is no
//! retry here.
//!
//! # Security
//!
//! - Requests authenticate with a bearer token from the [`TokenReceiver`]
//! - Timeouts prevent hanging connections

use crate::auth::TokenReceiver;
use crate::errors::ExporterError;
use reqwest::Client;
use secrecy::ExposeSecret;
use serde::Deserialize;
use std::time::Duration;
use tracing::{instrument, warn};

/// Default timeout for Compute API requests in seconds.
const COMPUTE_REQUEST_TIMEOUT_SECS: u64 = 10;

/// One quota record as returned by the Compute API.
///
/// The API omits fields that are zero, so every field defaults.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Quota {
    /// Upstream metric identifier (e.g. `"CPUS"`).
    #[serde(default)]
    pub metric: String,

    /// Quota ceiling.
    #[serde(default)]
    pub limit: f64,

    /// Current consumption.
    #[serde(default)]
    pub usage: f64,
}

/// Wire shape of project and region detail responses; only the quota list
/// is of interest.
#[derive(Debug, Deserialize)]
struct QuotaContainer {
    #[serde(default)]
    quotas: Vec<Quota>,
}

/// HTTP client for the Compute API quota endpoints.
#[derive(Clone)]
pub struct ComputeClient {
    /// HTTP client with configured timeouts.
    client: Client,

    /// Base URL for the Compute API (overridable for tests).
    base_url: String,

    /// Source of the current access token.
    token_receiver: TokenReceiver,
}

impl ComputeClient {
    /// Create a new Compute API client.
    ///
    /// # Errors
    ///
    /// Returns `ExporterError::ClientBuild` if the HTTP client cannot be
    /// built.
    pub fn new(base_url: String, token_receiver: TokenReceiver) -> Result<Self, ExporterError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(COMPUTE_REQUEST_TIMEOUT_SECS))
            .connect_timeout(Duration::from_secs(5))
            .build()
            .map_err(|e| ExporterError::ClientBuild(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token_receiver,
        })
    }

    /// Fetch the global-scope quota list for a project.
    ///
    /// # Errors
    ///
    /// Returns `ExporterError::ProjectQuotaFetch` on any transport error or
    /// non-success status.
    #[instrument(skip(self))]
    pub async fn project_quotas(&self, project: &str) -> Result<Vec<Quota>, ExporterError> {
        let url = format!("{}/compute/v1/projects/{}", self.base_url, project);

        self.get_quotas(&url).await.map_err(|reason| {
            warn!(target: "exporter.compute", project, reason = %reason, "Project quota request failed");
            ExporterError::ProjectQuotaFetch {
                project: project.to_string(),
                reason,
            }
        })
    }

    /// Fetch the quota list for a (project, region) pair.
    ///
    /// # Errors
    ///
    /// Returns `ExporterError::RegionQuotaFetch` on any transport error or
    /// non-success status.
    #[instrument(skip(self))]
    pub async fn region_quotas(
        &self,
        project: &str,
        region: &str,
    ) -> Result<Vec<Quota>, ExporterError> {
        let url = format!(
            "{}/compute/v1/projects/{}/regions/{}",
            self.base_url, project, region
        );

        self.get_quotas(&url).await.map_err(|reason| {
            warn!(
                target: "exporter.compute",
                project,
                region,
                reason = %reason,
                "Region quota request failed"
            );
            ExporterError::RegionQuotaFetch {
                project: project.to_string(),
                region: region.to_string(),
                reason,
            }
        })
    }

    /// Perform an authenticated GET and extract the quota list.
    async fn get_quotas(&self, url: &str) -> Result<Vec<Quota>, String> {
        let token = self.token_receiver.token();

        let response = self
            .client
            .get(url)
            .bearer_auth(token.expose_secret())
            .send()
            .await
            .map_err(|e| format!("request failed: {e}"))?;

        let status = response.status();
        if !status.is_success() {
            return Err(format!("unexpected status {status}"));
        }

        let container: QuotaContainer = response
            .json()
            .await
            .map_err(|e| format!("malformed response body: {e}"))?;

        Ok(container.quotas)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_quota_deserialization() {
        let json = r#"{"metric":"CPUS","limit":24.0,"usage":17.0}"#;
        let quota: Quota = serde_json::from_str(json).unwrap();

        assert_eq!(quota.metric, "CPUS");
        assert!((quota.limit - 24.0).abs() < f64::EPSILON);
        assert!((quota.usage - 17.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_quota_deserialization_defaults_missing_fields() {
        let quota: Quota = serde_json::from_str(r#"{"metric":"SNAPSHOTS"}"#).unwrap();

        assert_eq!(quota.metric, "SNAPSHOTS");
        assert!(quota.limit.abs() < f64::EPSILON);
        assert!(quota.usage.abs() < f64::EPSILON);
    }

    #[test]
    fn test_container_defaults_missing_quota_list() {
        let container: QuotaContainer =
            serde_json::from_str(r#"{"name":"proj-a","id":"12345"}"#).unwrap();
        assert!(container.quotas.is_empty());
    }

    #[test]
    fn test_container_ignores_unknown_fields() {
        let json = r#"{
            "kind": "compute#project",
            "name": "proj-a",
            "quotas": [
                {"metric": "CPUS", "limit": 24.0, "usage": 17.0},
                {"metric": "DISKS_TOTAL_GB", "limit": 4096.0, "usage": 200.0}
            ]
        }"#;
        let container: QuotaContainer = serde_json::from_str(json).unwrap();

        assert_eq!(container.quotas.len(), 2);
        assert_eq!(container.quotas.first().unwrap().metric, "CPUS");
    }
}
