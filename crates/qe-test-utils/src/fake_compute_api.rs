//! Wiremock-backed fake Compute API.
//!
//! Mounts project and region detail endpoints in the same URL shape the
//! real API uses, returning quota lists in the wire format the exporter
//! deserializes.

use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Fake Compute API server.
///
/// # Example
/// ```rust,ignore
/// let api = FakeComputeApi::start().await;
/// api.mount_project_quotas("proj-a", vec![quota_json("CPUS", 100.0, 42.0)])
///     .await;
/// let client = ComputeClient::new(api.base_url(), static_token_receiver("t"))?;
/// ```
pub struct FakeComputeApi {
    server: MockServer,
}

impl FakeComputeApi {
    /// Start the fake server on a random local port.
    pub async fn start() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    /// Base URL to hand to `ComputeClient::new`.
    #[must_use]
    pub fn base_url(&self) -> String {
        self.server.uri()
    }

    /// Direct access to the underlying mock server for custom mounts.
    #[must_use]
    pub fn server(&self) -> &MockServer {
        &self.server
    }

    /// Serve a quota list for a project's global scope.
    pub async fn mount_project_quotas(&self, project: &str, quotas: Vec<serde_json::Value>) {
        Mock::given(method("GET"))
            .and(path(format!("/compute/v1/projects/{project}")))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "kind": "compute#project",
                "name": project,
                "quotas": quotas,
            })))
            .mount(&self.server)
            .await;
    }

    /// Serve a quota list for a (project, region) pair.
    pub async fn mount_region_quotas(
        &self,
        project: &str,
        region: &str,
        quotas: Vec<serde_json::Value>,
    ) {
        Mock::given(method("GET"))
            .and(path(format!("/compute/v1/projects/{project}/regions/{region}")))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "kind": "compute#region",
                "name": region,
                "quotas": quotas,
            })))
            .mount(&self.server)
            .await;
    }

    /// Serve an error status for a project's global scope.
    pub async fn mount_project_error(&self, project: &str, status: u16) {
        Mock::given(method("GET"))
            .and(path(format!("/compute/v1/projects/{project}")))
            .respond_with(ResponseTemplate::new(status))
            .mount(&self.server)
            .await;
    }

    /// Serve a quota list for a project, but only to requests carrying the
    /// expected bearer token.
    pub async fn mount_project_quotas_requiring_token(
        &self,
        project: &str,
        token: &str,
        quotas: Vec<serde_json::Value>,
    ) {
        Mock::given(method("GET"))
            .and(path(format!("/compute/v1/projects/{project}")))
            .and(header("authorization", format!("Bearer {token}").as_str()))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "kind": "compute#project",
                "name": project,
                "quotas": quotas,
            })))
            .mount(&self.server)
            .await;
    }

    /// Serve a successful token-endpoint response at `/token`.
    pub async fn mount_token_endpoint(&self, access_token: &str, expires_in: u64) {
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": access_token,
                "expires_in": expires_in,
                "token_type": "Bearer",
            })))
            .mount(&self.server)
            .await;
    }

    /// Serve a rejection at `/token`.
    pub async fn mount_token_endpoint_rejection(&self, status: u16) {
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(
                ResponseTemplate::new(status)
                    .set_body_json(serde_json::json!({"error": "invalid_grant"})),
            )
            .mount(&self.server)
            .await;
    }

    /// URL of the fake token endpoint.
    #[must_use]
    pub fn token_uri(&self) -> String {
        format!("{}/token", self.server.uri())
    }

    /// Number of requests the fake server has received so far.
    pub async fn received_request_count(&self) -> usize {
        self.server
            .received_requests()
            .await
            .map(|requests| requests.len())
            .unwrap_or(0)
    }
}
