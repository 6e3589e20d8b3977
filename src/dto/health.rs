//! Health check payload.

use serde::Serialize;
use utoipa::ToSchema;

/// Body of the `/healthcheck` route.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// "ok" or "degraded".
    pub status: &'static str,
}

impl HealthResponse {
    /// Storage is installed and healthy.
    pub fn ok() -> Self {
        Self { status: "ok" }
    }

    /// Storage is not reachable; room routes answer 503.
    pub fn degraded() -> Self {
        Self { status: "degraded" }
    }
}
