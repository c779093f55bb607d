use serde::Serialize;
use utoipa::ToSchema;

/// Coarse health of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// Storage is connected.
    Ok,
    /// No storage backend is reachable; writes are refused.
    Degraded,
}

/// Body of the `/healthcheck` route.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Overall status.
    pub status: HealthStatus,
    /// Whether a league store is currently installed.
    pub storage_connected: bool,
}

impl HealthResponse {
    /// Healthy response with storage connected.
    pub fn ok() -> Self {
        Self {
            status: HealthStatus::Ok,
            storage_connected: true,
        }
    }

    /// `storage_connected` tells a dropped backend apart from a failing ping.
    pub fn degraded(storage_connected: bool) -> Self {
        Self {
            status: HealthStatus::Degraded,
            storage_connected,
        }
    }
}
