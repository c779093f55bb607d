//! Match lifecycle operations driven by the league administration, plus the
//! public read side.

use std::sync::Arc;

use tracing::info;

use crate::{
    dao::{league_store::LeagueStore, models::MatchEntity},
    dto::matches::{MatchResultResponse, MatchSummary},
    error::ServiceError,
    scoresheet::MatchId,
    state::{
        SharedState,
        match_lifecycle::{MatchEvent, MatchStatus, next_status},
    },
};

/// Load a match or fail with [`ServiceError::NotFound`].
pub(crate) async fn load_match(
    store: &Arc<dyn LeagueStore>,
    match_id: MatchId,
) -> Result<MatchEntity, ServiceError> {
    store
        .find_match(match_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("match `{match_id}` not found")))
}

/// Fail unless the match currently has `expected` status.
pub(crate) fn ensure_status(
    entity: &MatchEntity,
    expected: MatchStatus,
) -> Result<(), ServiceError> {
    if entity.status == expected {
        return Ok(());
    }
    Err(ServiceError::InvalidState(format!(
        "match `{}` is {}, operation requires {expected}",
        entity.id, entity.status
    )))
}

/// Apply `event` to the stored status of a match.
async fn transition(
    state: &SharedState,
    match_id: MatchId,
    event: MatchEvent,
) -> Result<MatchStatus, ServiceError> {
    let store = state.require_league_store().await?;
    let entity = load_match(&store, match_id).await?;
    let next = next_status(entity.status, event)?;

    if !store.update_match_status(match_id, next).await? {
        return Err(ServiceError::NotFound(format!(
            "match `{match_id}` not found"
        )));
    }
    info!(match_id, from = %entity.status, to = %next, ?event, "match status changed");
    Ok(next)
}

/// Open the scorekeepers' drafts.
pub async fn kickoff(state: &SharedState, match_id: MatchId) -> Result<MatchStatus, ServiceError> {
    transition(state, match_id, MatchEvent::Kickoff).await
}

/// Cancel a match that has not ended yet.
pub async fn cancel(state: &SharedState, match_id: MatchId) -> Result<MatchStatus, ServiceError> {
    transition(state, match_id, MatchEvent::Cancel).await
}

/// Public summary of a match.
pub async fn get_match(state: &SharedState, match_id: MatchId) -> Result<MatchSummary, ServiceError> {
    let store = state.require_league_store().await?;
    Ok(load_match(&store, match_id).await?.into())
}

/// Final sheet of a finished match.
pub async fn get_result(
    state: &SharedState,
    match_id: MatchId,
) -> Result<MatchResultResponse, ServiceError> {
    let store = state.require_league_store().await?;
    let entity = load_match(&store, match_id).await?;
    ensure_status(&entity, MatchStatus::Finished)?;

    store
        .find_result(match_id)
        .await?
        .map(Into::into)
        .ok_or_else(|| ServiceError::NotFound(format!("no final sheet for match `{match_id}`")))
}

#[cfg(test)]
mod tests {
    use std::time::SystemTime;

    use super::*;
    use crate::{
        config::AppConfig,
        dao::league_store::memory::MemoryLeagueStore,
        state::AppState,
    };

    async fn state_with_match(status: MatchStatus) -> SharedState {
        let store = MemoryLeagueStore::new();
        store.insert_match(MatchEntity {
            id: 1,
            home_team_id: 10,
            away_team_id: 20,
            status,
            scorekeepers: vec![100, 200],
            updated_at: SystemTime::now(),
        });
        AppState::with_store(AppConfig::default(), Arc::new(store)).await
    }

    #[tokio::test]
    async fn kickoff_moves_scheduled_match_to_live() {
        let state = state_with_match(MatchStatus::Scheduled).await;
        assert_eq!(kickoff(&state, 1).await.unwrap(), MatchStatus::Live);
        assert_eq!(get_match(&state, 1).await.unwrap().status, MatchStatus::Live);
    }

    #[tokio::test]
    async fn finished_match_cannot_be_cancelled() {
        let state = state_with_match(MatchStatus::Finished).await;
        let err = cancel(&state, 1).await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidState(_)));
        assert_eq!(get_match(&state, 1).await.unwrap().status, MatchStatus::Finished);
    }

    #[tokio::test]
    async fn unknown_match_is_not_found() {
        let state = state_with_match(MatchStatus::Live).await;
        assert!(matches!(
            get_match(&state, 42).await,
            Err(ServiceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn result_requires_finished_match() {
        let state = state_with_match(MatchStatus::AdminReview).await;
        assert!(matches!(
            get_result(&state, 1).await,
            Err(ServiceError::InvalidState(_))
        ));
    }
}
