//! Quota gauge publication.
//!
//! Maps quota observations onto Prometheus gauges. Gauge names are derived
//! from the upstream metric identifier, canonicalized to lower snake case,
//! and qualified by scope:
//!
//! - global: `gcloud_quota_global_<metric>_<limit|usage>`, labeled by
//!   `project`
//! - regional: `gcloud_quota_<metric>_<limit|usage>`, labeled by `project`
//!   and `region`
//!
//! The registry only grows: a gauge is described once, on the first
//! observation of its key, and is never removed. Values use overwrite
//! semantics; a scrape sees the last published value for each label tuple.

use crate::models::{QuotaObservation, QuotaScope};
use metrics::{describe_gauge, gauge};
use std::collections::HashSet;
use std::sync::{Mutex, PoisonError};

/// Name prefix shared by every published quota gauge.
const METRIC_PREFIX: &str = "gcloud_quota_";

/// Extra name segment distinguishing global-scope gauges from regional ones.
const GLOBAL_SEGMENT: &str = "global_";

/// Canonicalize an upstream metric identifier to lower snake case.
///
/// Deterministic and idempotent: re-applying the transformation to its own
/// output is a no-op. Any input is accepted; unexpected upstream names
/// degrade into oddly named gauges rather than errors. Runs of separator
/// characters collapse into a single underscore, and a word boundary is
/// inserted where lowercase meets uppercase (`maxCpus` -> `max_cpus`).
#[must_use]
pub fn canonical_metric_name(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut prev_lower_or_digit = false;

    for c in raw.chars() {
        if c.is_alphanumeric() {
            if c.is_uppercase() {
                if prev_lower_or_digit {
                    out.push('_');
                }
                out.extend(c.to_lowercase());
                prev_lower_or_digit = false;
            } else {
                out.push(c);
                prev_lower_or_digit = true;
            }
        } else if !out.is_empty() && !out.ends_with('_') {
            out.push('_');
            prev_lower_or_digit = false;
        }
    }

    while out.ends_with('_') {
        out.pop();
    }

    out
}

/// Registry of published quota gauges.
///
/// Tracks which gauge names have been described so each is registered
/// exactly once per process lifetime. The seen-set lock makes the
/// check-then-describe step atomic with respect to a concurrent scrape;
/// the publisher itself is a single writer driven by the poller task.
#[derive(Debug, Default)]
pub struct QuotaRegistry {
    seen: Mutex<HashSet<String>>,
}

impl QuotaRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish one observation: ensure the limit and usage gauges for its
    /// key exist, then set their values for the observation's label tuple.
    pub fn publish(&self, observation: &QuotaObservation) {
        let canonical = canonical_metric_name(&observation.metric);

        for (kind, value) in [
            ("limit", observation.limit),
            ("usage", observation.usage),
        ] {
            let name = match &observation.scope {
                QuotaScope::Global { .. } => {
                    format!("{METRIC_PREFIX}{GLOBAL_SEGMENT}{canonical}_{kind}")
                }
                QuotaScope::Regional { .. } => format!("{METRIC_PREFIX}{canonical}_{kind}"),
            };

            self.describe_once(&name, &observation.metric, kind);

            match &observation.scope {
                QuotaScope::Global { project } => {
                    gauge!(name, "project" => project.clone()).set(value);
                }
                QuotaScope::Regional { project, region } => {
                    gauge!(name, "project" => project.clone(), "region" => region.clone())
                        .set(value);
                }
            }
        }
    }

    /// Number of distinct gauge names registered so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.seen
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether no gauge has been registered yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Describe a gauge the first time its name is seen; later calls are
    /// no-ops.
    fn describe_once(&self, name: &str, upstream_metric: &str, kind: &str) {
        let mut seen = self.seen.lock().unwrap_or_else(PoisonError::into_inner);
        if seen.insert(name.to_string()) {
            describe_gauge!(
                name.to_string(),
                format!("The {kind} for quota {upstream_metric}.")
            );
        }
    }
}
