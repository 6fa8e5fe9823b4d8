//! Gcloud Quota Exporter Library
//!
//! Periodically queries the Google Cloud compute-quota API for the
//! configured projects and regions and republishes the returned limits and
//! usage numbers as Prometheus gauges.
//!
//! # Modules
//!
//! - `auth` - Service-account token acquisition and refresh
//! - `cli` / `config` - Flag and environment configuration
//! - `errors` - Error types
//! - `models` - Quota observation domain types
//! - `observability` - Metrics recorder and health probes
//! - `publisher` - Canonicalization and the gauge registry
//! - `routes` - HTTP route wiring
//! - `services` - Compute API client
//! - `tasks` - The quota poller loop

pub mod auth;
pub mod cli;
pub mod config;
pub mod errors;
pub mod models;
pub mod observability;
pub mod publisher;
pub mod routes;
pub mod services;
pub mod tasks;
