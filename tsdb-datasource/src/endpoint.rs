//! Backend endpoint construction.

use crate::model::{QueryTarget, TimeRange};

/// A built backend request: path plus query string, not yet joined to a
/// base URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub path: String,
    pub query: String,
}

/// Build the data endpoint for one target and time window.
///
/// The path is `/api/<prefix><primary>/<secondary>`; the prefix is inserted
/// verbatim, so its slashes are the caller's business. Index names are not
/// percent-encoded; callers are expected to supply URL-safe names.
///
/// Only called for eligible targets; the orchestrator filters first.
pub fn build_endpoint(target: &QueryTarget, range: TimeRange) -> Endpoint {
    Endpoint {
        path: format!(
            "/api/{}{}/{}",
            target.path, target.primary_idx, target.secondary_idx
        ),
        query: format!("from={}&to={}", range.from, range.to),
    }
}
