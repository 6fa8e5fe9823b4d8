//! Test utilities for the quota exporter.
//!
//! Provides a wiremock-backed fake Compute API and token endpoint, plus
//! credential fixtures, so integration tests never touch real Google
//! endpoints.

#![allow(clippy::unwrap_used, clippy::expect_used)]

pub mod crypto_fixtures;
pub mod fake_compute_api;

pub use crypto_fixtures::{service_account_json, write_service_account_file, TEST_RSA_PRIVATE_KEY_PEM};
pub use fake_compute_api::FakeComputeApi;

use quota_exporter::auth::TokenReceiver;
use secrecy::SecretString;
use tokio::sync::watch;

/// Build a `TokenReceiver` that always yields the given token, without a
/// token manager behind it.
#[must_use]
pub fn static_token_receiver(token: &str) -> TokenReceiver {
    let (tx, rx) = watch::channel(SecretString::from(token.to_string()));
    // Keep the sender alive for the test's duration; receivers clone the
    // current value on read, so leaking one sender per harness is fine.
    std::mem::forget(tx);
    TokenReceiver::from_watch_receiver(rx)
}

/// Build a quota record in the Compute API's wire shape.
#[must_use]
pub fn quota_json(metric: &str, limit: f64, usage: f64) -> serde_json::Value {
    serde_json::json!({
        "metric": metric,
        "limit": limit,
        "usage": usage,
    })
}
