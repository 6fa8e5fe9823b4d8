//! Background tasks.

pub mod quota_poller;

pub use quota_poller::{fetch_all, fetch_and_publish, jittered_interval_secs, run_quota_poller};
