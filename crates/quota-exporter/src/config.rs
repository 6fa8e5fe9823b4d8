//! Exporter configuration.
//!
//! Configuration is environment-variable-backed and CLI-overridable: a flag
//! value wins over the matching environment variable, which wins over the
//! built-in default. Loading from an injected `HashMap` keeps the whole
//! surface testable without touching process environment.

use crate::cli::Cli;
use std::collections::HashMap;
use std::env;
use std::net::SocketAddr;
use thiserror::Error;

/// Default bind address for the scrape endpoint.
pub const DEFAULT_METRICS_LISTEN_ADDRESS: &str = "0.0.0.0:9101";

/// Default scrape path.
pub const DEFAULT_METRICS_PATH: &str = "/metrics";

/// Default base polling interval in seconds.
pub const DEFAULT_FETCH_INTERVAL_SECONDS: u64 = 60;

/// Default Compute API base URL.
pub const DEFAULT_COMPUTE_API_BASE_URL: &str = "https://compute.googleapis.com";

/// Exporter configuration.
///
/// Holds no secret material; the credentials file is read by the token
/// manager, never by this struct.
#[derive(Debug, Clone)]
pub struct Config {
    /// Bind address for the scrape endpoint (default: "0.0.0.0:9101").
    pub metrics_listen_address: String,

    /// Path the metrics are served on (default: "/metrics").
    pub metrics_path: String,

    /// Project ids to query at global scope, in configured order.
    pub projects: Vec<String>,

    /// Regions to query per project, in configured order. May be empty.
    pub regions: Vec<String>,

    /// Path to the service-account credentials JSON file.
    pub credentials_file: String,

    /// Base polling interval in seconds (default: 60).
    pub fetch_interval_seconds: u64,

    /// Compute API base URL (default: "https://compute.googleapis.com").
    pub compute_api_base_url: String,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("At least one project id must be set via --gcloud-projects or GCLOUD_PROJECTS")]
    MissingProjects,

    #[error(
        "A credentials file must be set via --credentials-file or GOOGLE_APPLICATION_CREDENTIALS"
    )]
    MissingCredentialsFile,

    #[error("Invalid fetch interval: {0}")]
    InvalidFetchInterval(String),

    #[error("Invalid metrics listen address: {0}")]
    InvalidListenAddress(String),

    #[error("Invalid metrics path: {0}")]
    InvalidMetricsPath(String),
}

impl Config {
    /// Load configuration from CLI flags layered over process environment.
    pub fn load(cli: &Cli) -> Result<Self, ConfigError> {
        Self::from_sources(cli, &env::vars().collect())
    }

    /// Load configuration from CLI flags layered over a variable map
    /// (for testing).
    pub fn from_sources(cli: &Cli, vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let metrics_listen_address = cli
            .metrics_listen_address
            .clone()
            .or_else(|| vars.get("METRICS_LISTEN_ADDRESS").cloned())
            .unwrap_or_else(|| DEFAULT_METRICS_LISTEN_ADDRESS.to_string());

        metrics_listen_address
            .parse::<SocketAddr>()
            .map_err(|e| {
                ConfigError::InvalidListenAddress(format!(
                    "'{}' is not a socket address: {}",
                    metrics_listen_address, e
                ))
            })?;

        let metrics_path = cli
            .metrics_path
            .clone()
            .or_else(|| vars.get("METRICS_PATH").cloned())
            .unwrap_or_else(|| DEFAULT_METRICS_PATH.to_string());

        if !metrics_path.starts_with('/') {
            return Err(ConfigError::InvalidMetricsPath(format!(
                "'{}' must start with '/'",
                metrics_path
            )));
        }

        let projects = split_csv(
            &cli.gcloud_projects
                .clone()
                .or_else(|| vars.get("GCLOUD_PROJECTS").cloned())
                .unwrap_or_default(),
        );

        if projects.is_empty() {
            return Err(ConfigError::MissingProjects);
        }

        let regions = split_csv(
            &cli.gcloud_regions
                .clone()
                .or_else(|| vars.get("GCLOUD_REGIONS").cloned())
                .unwrap_or_default(),
        );

        let credentials_file = cli
            .credentials_file
            .clone()
            .or_else(|| vars.get("GOOGLE_APPLICATION_CREDENTIALS").cloned())
            .filter(|path| !path.is_empty())
            .ok_or(ConfigError::MissingCredentialsFile)?;

        let fetch_interval_seconds = match cli.fetch_interval_seconds {
            Some(value) => value,
            None => match vars.get("FETCH_INTERVAL_SECONDS") {
                Some(value_str) => value_str.parse().map_err(|e| {
                    ConfigError::InvalidFetchInterval(format!(
                        "FETCH_INTERVAL_SECONDS must be a valid positive integer, got '{}': {}",
                        value_str, e
                    ))
                })?,
                None => DEFAULT_FETCH_INTERVAL_SECONDS,
            },
        };

        if fetch_interval_seconds == 0 {
            return Err(ConfigError::InvalidFetchInterval(
                "fetch interval must be greater than 0".to_string(),
            ));
        }

        let compute_api_base_url = cli
            .compute_api_base_url
            .clone()
            .or_else(|| vars.get("COMPUTE_API_BASE_URL").cloned())
            .unwrap_or_else(|| DEFAULT_COMPUTE_API_BASE_URL.to_string());

        Ok(Config {
            metrics_listen_address,
            metrics_path,
            projects,
            regions,
            credentials_file,
            fetch_interval_seconds,
            compute_api_base_url,
        })
    }
}

/// Split a comma-separated list, trimming whitespace and discarding empty
/// segments.
fn split_csv(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .map(str::to_string)
        .collect()
}
