use tracing::warn;

use crate::{dto::health::HealthResponse, state::SharedState};

/// Report whether storage is reachable, logging connectivity issues.
pub async fn health_status(state: &SharedState) -> HealthResponse {
    let Some(store) = state.league_store().await else {
        warn!("league store unavailable (degraded mode)");
        return HealthResponse::degraded(false);
    };

    if let Err(err) = store.health_check().await {
        warn!(error = %err, "league store health check failed");
        return HealthResponse::degraded(true);
    }

    if state.is_degraded() {
        HealthResponse::degraded(true)
    } else {
        HealthResponse::ok()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        config::AppConfig, dao::league_store::memory::MemoryLeagueStore,
        dto::health::HealthStatus, state::AppState,
    };

    #[tokio::test]
    async fn reports_degraded_without_store() {
        let state = AppState::new(AppConfig::default());
        let response = health_status(&state).await;
        assert_eq!(response.status, HealthStatus::Degraded);
        assert!(!response.storage_connected);

        state
            .set_league_store(Arc::new(MemoryLeagueStore::new()))
            .await;
        assert_eq!(health_status(&state).await.status, HealthStatus::Ok);
    }
}
