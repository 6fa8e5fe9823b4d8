//! Quota exporter error types.
//!
//! Every variant here is fatal: the exporter deliberately has no in-process
//! recovery. Fetch and startup failures are logged with their scope context
//! and terminate the process; the surrounding supervisor restarts it.

use crate::auth::TokenError;
use crate::config::ConfigError;
use thiserror::Error;

/// Quota exporter error type.
#[derive(Debug, Error)]
pub enum ExporterError {
    /// Configuration could not be loaded or validated.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Service-account token acquisition failed at startup.
    #[error("Token acquisition failed: {0}")]
    TokenAcquisition(#[from] TokenError),

    /// Initial token acquisition did not complete within the startup timeout.
    #[error("Token acquisition timed out")]
    TokenAcquisitionTimeout,

    /// The HTTP client could not be constructed.
    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(String),

    /// Retrieving project-level (global scope) quota failed.
    #[error("Retrieving quota for project {project} failed: {reason}")]
    ProjectQuotaFetch { project: String, reason: String },

    /// Retrieving region-level quota failed.
    #[error("Retrieving quota for project {project} and region {region} failed: {reason}")]
    RegionQuotaFetch {
        project: String,
        region: String,
        reason: String,
    },

    /// The scrape listener could not be bound or the server failed.
    #[error("Server error: {0}")]
    Serve(String),
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_display_project_quota_fetch() {
        let error = ExporterError::ProjectQuotaFetch {
            project: "proj-a".to_string(),
            reason: "connection refused".to_string(),
        };
        assert_eq!(
            format!("{}", error),
            "Retrieving quota for project proj-a failed: connection refused"
        );
    }

    #[test]
    fn test_display_region_quota_fetch() {
        let error = ExporterError::RegionQuotaFetch {
            project: "proj-a".to_string(),
            region: "us-central1".to_string(),
            reason: "unexpected status 403".to_string(),
        };
        assert_eq!(
            format!("{}", error),
            "Retrieving quota for project proj-a and region us-central1 failed: unexpected status 403"
        );
    }

    #[test]
    fn test_display_token_timeout() {
        assert_eq!(
            format!("{}", ExporterError::TokenAcquisitionTimeout),
            "Token acquisition timed out"
        );
    }
}
