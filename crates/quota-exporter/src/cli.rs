//! Command-line flags.
//!
//! Every flag is optional; unset flags fall back to the matching environment
//! variable and then to the built-in default (see [`crate::config::Config`]).
//! Flag values always win over environment variables.

use clap::Parser;

/// Prometheus exporter for Google Cloud compute quota.
#[derive(Parser, Debug, Default)]
#[command(name = "quota-exporter", version, about, long_about = None)]
pub struct Cli {
    /// The address to listen on for Prometheus scrape requests
    /// (env: METRICS_LISTEN_ADDRESS).
    #[arg(long)]
    pub metrics_listen_address: Option<String>,

    /// The path to serve Prometheus metrics on (env: METRICS_PATH).
    #[arg(long)]
    pub metrics_path: Option<String>,

    /// Comma-separated Google Cloud project ids to get quota for
    /// (env: GCLOUD_PROJECTS).
    #[arg(long)]
    pub gcloud_projects: Option<String>,

    /// Comma-separated regions to get quota for per project
    /// (env: GCLOUD_REGIONS).
    #[arg(long)]
    pub gcloud_regions: Option<String>,

    /// Path to the service-account credentials JSON file
    /// (env: GOOGLE_APPLICATION_CREDENTIALS).
    #[arg(long)]
    pub credentials_file: Option<String>,

    /// Base polling interval in seconds; actual sleeps are jittered by 25%
    /// (env: FETCH_INTERVAL_SECONDS).
    #[arg(long)]
    pub fetch_interval_seconds: Option<u64>,

    /// Compute API base URL (env: COMPUTE_API_BASE_URL).
    #[arg(long)]
    pub compute_api_base_url: Option<String>,
}
