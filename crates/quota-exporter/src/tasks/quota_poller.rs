//! Quota polling background task.
//!
//! Drives the fetch-and-publish cycle on a jittered interval. Each cycle
//! queries every configured project at global scope and every
//! project x region pair, in order, then publishes the observations into
//! the gauge registry.
//!
//! Any fetch failure is fatal: the task returns the error and the process
//! exits nonzero. Recovery belongs to the process supervisor, not to this
//! loop.
//!
//! # Graceful Shutdown
//!
//! The task supports graceful shutdown via a cancellation token. The token
//! is observed at the top of the loop and during the sleep; an in-flight
//! fetch/publish cycle is always allowed to complete.

use crate::errors::ExporterError;
use crate::models::{QuotaObservation, QuotaScope};
use crate::observability::metrics::record_fetch_cycle;
use crate::publisher::QuotaRegistry;
use crate::services::ComputeClient;
use rand::Rng;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument};

/// Fraction of the base interval used as the jitter deviation.
const JITTER_FRACTION: f64 = 0.25;

/// Compute a jittered sleep interval in seconds.
///
/// With `deviation = round(0.25 * base)`, the result is uniform over
/// `[base - deviation, base + deviation)`, i.e. `[0.75 * base, 1.25 * base)`.
/// Bases small enough that the deviation rounds to zero are returned
/// unchanged.
#[must_use]
pub fn jittered_interval_secs(base: u64) -> u64 {
    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let deviation = (JITTER_FRACTION * base as f64).round() as u64;
    if deviation == 0 {
        return base;
    }

    base - deviation + rand::thread_rng().gen_range(0..2 * deviation)
}

/// Fetch quota for every configured scope, in order.
///
/// For each project: one global-scope fetch, then one fetch per configured
/// region. Returns the flat, ordered observation list.
///
/// # Errors
///
/// The first failing fetch aborts the sweep and is returned with its scope
/// context; remaining projects and regions are not queried.
pub async fn fetch_all(
    client: &ComputeClient,
    projects: &[String],
    regions: &[String],
) -> Result<Vec<QuotaObservation>, ExporterError> {
    let mut observations = Vec::new();

    for project in projects {
        let quotas = client.project_quotas(project).await?;
        observations.extend(quotas.into_iter().map(|quota| QuotaObservation {
            metric: quota.metric,
            limit: quota.limit,
            usage: quota.usage,
            scope: QuotaScope::Global {
                project: project.clone(),
            },
        }));

        for region in regions {
            let quotas = client.region_quotas(project, region).await?;
            observations.extend(quotas.into_iter().map(|quota| QuotaObservation {
                metric: quota.metric,
                limit: quota.limit,
                usage: quota.usage,
                scope: QuotaScope::Regional {
                    project: project.clone(),
                    region: region.clone(),
                },
            }));
        }
    }

    Ok(observations)
}

/// Run one full fetch-and-publish cycle.
///
/// # Errors
///
/// Propagates the first fetch failure; nothing from a failed cycle is
/// published.
pub async fn fetch_and_publish(
    client: &ComputeClient,
    registry: &QuotaRegistry,
    projects: &[String],
    regions: &[String],
) -> Result<(), ExporterError> {
    let started = Instant::now();
    info!(target: "exporter.poller", "Fetching gcloud quota...");

    let observations = match fetch_all(client, projects, regions).await {
        Ok(observations) => observations,
        Err(e) => {
            record_fetch_cycle("error", started.elapsed());
            return Err(e);
        }
    };

    for observation in &observations {
        registry.publish(observation);
    }

    record_fetch_cycle("success", started.elapsed());
    info!(
        target: "exporter.poller",
        observations = observations.len(),
        gauges = registry.len(),
        "Published quota observations"
    );

    Ok(())
}

/// Run the quota poller loop until cancelled.
///
/// Sleeps a jittered interval between cycles; the initial cycle is expected
/// to have been run by the caller before the serving endpoint started, so
/// the loop sleeps first. Returns `Ok(())` on cancellation and the fetch
/// error if any cycle fails.
///
/// # Errors
///
/// Returns the first `ExporterError` produced by a fetch cycle; the caller
/// treats it as fatal.
#[instrument(skip_all, name = "exporter.task.quota_poller")]
pub async fn run_quota_poller(
    client: ComputeClient,
    registry: Arc<QuotaRegistry>,
    projects: Vec<String>,
    regions: Vec<String>,
    base_interval_seconds: u64,
    cancel_token: CancellationToken,
) -> Result<(), ExporterError> {
    info!(
        target: "exporter.poller",
        base_interval_seconds,
        projects = projects.len(),
        regions = regions.len(),
        "Starting quota poller task"
    );

    loop {
        if cancel_token.is_cancelled() {
            break;
        }

        let sleep_seconds = jittered_interval_secs(base_interval_seconds);
        debug!(target: "exporter.poller", sleep_seconds, "Sleeping until next fetch");

        tokio::select! {
            () = cancel_token.cancelled() => {
                info!(
                    target: "exporter.poller",
                    "Quota poller received shutdown signal, exiting"
                );
                break;
            }
            () = tokio::time::sleep(Duration::from_secs(sleep_seconds)) => {}
        }

        // Not raced against the token: an in-flight cycle always completes.
        fetch_and_publish(&client, &registry, &projects, &regions).await?;
    }

    info!(target: "exporter.poller", "Quota poller task stopped");
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_jitter_stays_within_bounds() {
        for _ in 0..1000 {
            let sleep = jittered_interval_secs(60);
            assert!((45..75).contains(&sleep), "jitter {sleep} out of bounds");
        }
    }

    #[test]
    fn test_jitter_covers_both_halves_of_the_window() {
        let samples: Vec<u64> = (0..1000).map(|_| jittered_interval_secs(60)).collect();

        assert!(samples.iter().any(|&s| s < 60));
        assert!(samples.iter().any(|&s| s >= 60));
    }

    #[test]
    fn test_jitter_small_base() {
        // deviation = round(0.25 * 4) = 1 -> [3, 5)
        for _ in 0..200 {
            let sleep = jittered_interval_secs(4);
            assert!((3..5).contains(&sleep));
        }
    }

    #[test]
    fn test_jitter_degenerate_base_returns_base() {
        // deviation rounds to zero for base <= 1
        assert_eq!(jittered_interval_secs(1), 1);
        assert_eq!(jittered_interval_secs(0), 0);
    }

    #[tokio::test]
    async fn test_cancelled_token_is_observed() {
        let cancel_token = CancellationToken::new();
        cancel_token.cancel();
        assert!(cancel_token.is_cancelled());
    }
}
