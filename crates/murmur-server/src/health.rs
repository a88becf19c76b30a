//! `/healthcheck` endpoint.

use serde::Serialize;
use std::time::Instant;

/// Health check response body.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Always `"healthy"` when the server is running.
    pub status: String,
    /// Seconds since the server started.
    pub uptime_secs: u64,
}

/// Build a health response from the server start time.
pub fn health_check(start_time: Instant) -> HealthResponse {
    HealthResponse {
        status: "healthy".into(),
        uptime_secs: start_time.elapsed().as_secs(),
    }
}
