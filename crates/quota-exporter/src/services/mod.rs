//! External service clients.

pub mod compute_client;

pub use compute_client::{ComputeClient, Quota};
