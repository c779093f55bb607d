//! Scorekeeper write side and the two-draft read used by reviewers.
//!
//! Each scorekeeper owns a private draft per match. Drafts are never merged
//! here; merging is the reconciler's job once both are submitted.

use std::{sync::Arc, time::SystemTime};

use tracing::{debug, info};
use uuid::Uuid;

use crate::{
    dao::{
        league_store::LeagueStore,
        models::{DraftEntity, EventDraftEntity, MatchEntity},
    },
    dto::draft::{AttendanceInput, DraftView, EventInput},
    error::ServiceError,
    scoresheet::{AttendanceRecord, EventRecord, MatchDrafts, MatchId, ScorekeeperId},
    services::match_service::{ensure_status, load_match},
    state::{
        SharedState,
        match_lifecycle::{MatchEvent, MatchStatus, next_status},
    },
};

/// Scorekeepers A and B of a match, or NotFound when fewer than two are assigned.
fn scorekeeper_pair(entity: &MatchEntity) -> Result<(ScorekeeperId, ScorekeeperId), ServiceError> {
    entity.scorekeeper_pair().ok_or_else(|| {
        ServiceError::NotFound(format!(
            "match `{}` has fewer than two distinct scorekeepers assigned",
            entity.id
        ))
    })
}

fn ensure_assigned(entity: &MatchEntity, scorekeeper_id: ScorekeeperId) -> Result<(), ServiceError> {
    let (a, b) = scorekeeper_pair(entity)?;
    if scorekeeper_id == a || scorekeeper_id == b {
        return Ok(());
    }
    Err(ServiceError::Unauthorized(format!(
        "scorekeeper `{scorekeeper_id}` is not assigned to match `{}`",
        entity.id
    )))
}

async fn load_or_empty(
    store: &Arc<dyn LeagueStore>,
    match_id: MatchId,
    scorekeeper_id: ScorekeeperId,
) -> Result<DraftEntity, ServiceError> {
    Ok(store
        .find_draft(match_id, scorekeeper_id)
        .await?
        .unwrap_or_else(|| DraftEntity::empty(match_id, scorekeeper_id)))
}

/// Load the draft a scorekeeper is about to edit, checking every write precondition.
async fn writable_draft(
    state: &SharedState,
    match_id: MatchId,
    scorekeeper_id: ScorekeeperId,
) -> Result<(Arc<dyn LeagueStore>, MatchEntity, DraftEntity), ServiceError> {
    let store = state.require_league_store().await?;
    let entity = load_match(&store, match_id).await?;
    ensure_assigned(&entity, scorekeeper_id)?;
    ensure_status(&entity, MatchStatus::Live)?;

    let draft = load_or_empty(&store, match_id, scorekeeper_id).await?;
    if draft.submitted {
        return Err(ServiceError::InvalidState(format!(
            "draft of scorekeeper `{scorekeeper_id}` for match `{match_id}` is already submitted"
        )));
    }
    Ok((store, entity, draft))
}

/// Record or overwrite the attendance of one player.
pub async fn record_attendance(
    state: &SharedState,
    match_id: MatchId,
    scorekeeper_id: ScorekeeperId,
    input: AttendanceInput,
) -> Result<(), ServiceError> {
    let (store, _, mut draft) = writable_draft(state, match_id, scorekeeper_id).await?;

    let record = AttendanceRecord {
        match_id,
        team_id: input.team_id,
        player_id: input.player_id,
        status: input.status,
        jersey_number: input.jersey_number,
    }
    .normalized();

    match draft
        .attendance
        .iter_mut()
        .find(|existing| existing.player_id == record.player_id)
    {
        Some(existing) => *existing = record,
        None => draft.attendance.push(record),
    }
    draft.updated_at = SystemTime::now();

    store.save_draft(draft).await?;
    debug!(match_id, scorekeeper_id, player_id = input.player_id, "attendance recorded");
    Ok(())
}

/// Append an event and return the id used to edit it later.
pub async fn record_event(
    state: &SharedState,
    match_id: MatchId,
    scorekeeper_id: ScorekeeperId,
    input: EventInput,
) -> Result<Uuid, ServiceError> {
    let (store, _, mut draft) = writable_draft(state, match_id, scorekeeper_id).await?;

    let now = SystemTime::now();
    let id = Uuid::new_v4();
    draft.events.push(EventDraftEntity {
        id,
        record: event_record(match_id, input),
        recorded_at: now,
    });
    draft.updated_at = now;

    store.save_draft(draft).await?;
    debug!(match_id, scorekeeper_id, event_id = %id, "event recorded");
    Ok(id)
}

/// Overwrite a previously recorded event.
pub async fn update_event(
    state: &SharedState,
    match_id: MatchId,
    scorekeeper_id: ScorekeeperId,
    event_id: Uuid,
    input: EventInput,
) -> Result<(), ServiceError> {
    let (store, _, mut draft) = writable_draft(state, match_id, scorekeeper_id).await?;

    let Some(event) = draft.events.iter_mut().find(|event| event.id == event_id) else {
        return Err(ServiceError::NotFound(format!(
            "event `{event_id}` not found in draft of scorekeeper `{scorekeeper_id}`"
        )));
    };
    event.record = event_record(match_id, input);
    draft.updated_at = SystemTime::now();

    store.save_draft(draft).await?;
    debug!(match_id, scorekeeper_id, event_id = %event_id, "event updated");
    Ok(())
}

fn event_record(match_id: MatchId, input: EventInput) -> EventRecord {
    EventRecord {
        match_id,
        team_id: input.team_id,
        player_id: input.player_id,
        kind: input.kind,
        minute: input.minute,
    }
}

/// Hand a draft in. Once both scorekeepers submitted, the match moves to
/// admin review; the returned status tells which happened.
pub async fn submit_draft(
    state: &SharedState,
    match_id: MatchId,
    scorekeeper_id: ScorekeeperId,
) -> Result<MatchStatus, ServiceError> {
    let (store, entity, mut draft) = writable_draft(state, match_id, scorekeeper_id).await?;
    let (a, b) = scorekeeper_pair(&entity)?;

    draft.submitted = true;
    draft.updated_at = SystemTime::now();
    store.save_draft(draft).await?;
    info!(match_id, scorekeeper_id, "draft submitted");

    let other = if scorekeeper_id == a { b } else { a };
    let other_submitted = store
        .find_draft(match_id, other)
        .await?
        .is_some_and(|draft| draft.submitted);
    if !other_submitted {
        return Ok(entity.status);
    }

    let next = next_status(entity.status, MatchEvent::SubmitForReview)?;
    store.update_match_status(match_id, next).await?;
    info!(match_id, "both drafts submitted; match waiting for review");
    Ok(next)
}

/// A scorekeeper's own draft, empty when nothing was recorded yet.
pub async fn get_own_draft(
    state: &SharedState,
    match_id: MatchId,
    scorekeeper_id: ScorekeeperId,
) -> Result<DraftView, ServiceError> {
    let store = state.require_league_store().await?;
    let entity = load_match(&store, match_id).await?;
    ensure_assigned(&entity, scorekeeper_id)?;
    Ok(load_or_empty(&store, match_id, scorekeeper_id).await?.into())
}

/// Both drafts of a match. Scorekeepers who recorded nothing yield empty
/// collections; fewer than two assigned scorekeepers is NotFound.
pub async fn get_drafts(
    store: &Arc<dyn LeagueStore>,
    match_id: MatchId,
) -> Result<MatchDrafts, ServiceError> {
    let entity = load_match(store, match_id).await?;
    let (a, b) = scorekeeper_pair(&entity)?;

    let draft_a = load_or_empty(store, match_id, a).await?;
    let draft_b = load_or_empty(store, match_id, b).await?;

    Ok(MatchDrafts {
        match_id,
        scorekeeper_a: (a, draft_a.to_scorekeeper_draft()),
        scorekeeper_b: (b, draft_b.to_scorekeeper_draft()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::AppConfig,
        dao::league_store::memory::MemoryLeagueStore,
        scoresheet::{AttendanceStatus, EventType},
        state::AppState,
    };

    fn live_match(id: MatchId, scorekeepers: Vec<ScorekeeperId>) -> MatchEntity {
        MatchEntity {
            id,
            home_team_id: 10,
            away_team_id: 20,
            status: MatchStatus::Live,
            scorekeepers,
            updated_at: SystemTime::now(),
        }
    }

    async fn setup(entity: MatchEntity) -> (SharedState, Arc<dyn LeagueStore>) {
        let store = MemoryLeagueStore::new();
        store.insert_match(entity);
        let store: Arc<dyn LeagueStore> = Arc::new(store);
        let state = AppState::with_store(AppConfig::default(), store.clone()).await;
        (state, store)
    }

    fn present(player_id: i64, jersey: u16) -> AttendanceInput {
        AttendanceInput {
            team_id: 10,
            player_id,
            status: AttendanceStatus::Present,
            jersey_number: Some(jersey),
        }
    }

    fn goal(player_id: i64, minute: i32) -> EventInput {
        EventInput {
            team_id: 10,
            player_id,
            kind: EventType::Goal,
            minute,
        }
    }

    #[tokio::test]
    async fn attendance_is_upserted_per_player() {
        let (state, store) = setup(live_match(1, vec![100, 200])).await;

        record_attendance(&state, 1, 100, present(7, 10)).await.unwrap();
        record_attendance(&state, 1, 100, present(7, 11)).await.unwrap();
        record_attendance(
            &state,
            1,
            100,
            AttendanceInput {
                team_id: 10,
                player_id: 9,
                status: AttendanceStatus::Absent,
                jersey_number: Some(5),
            },
        )
        .await
        .unwrap();

        let draft = store.find_draft(1, 100).await.unwrap().unwrap();
        assert_eq!(draft.attendance.len(), 2);
        assert_eq!(draft.attendance[0].jersey_number, Some(11));
        assert_eq!(draft.attendance[1].jersey_number, None);
    }

    #[tokio::test]
    async fn events_can_be_edited_by_id() {
        let (state, store) = setup(live_match(1, vec![100, 200])).await;

        let id = record_event(&state, 1, 100, goal(7, 23)).await.unwrap();
        update_event(&state, 1, 100, id, goal(7, 24)).await.unwrap();

        let draft = store.find_draft(1, 100).await.unwrap().unwrap();
        assert_eq!(draft.events.len(), 1);
        assert_eq!(draft.events[0].record.minute, 24);

        let missing = update_event(&state, 1, 100, Uuid::new_v4(), goal(7, 1)).await;
        assert!(matches!(missing, Err(ServiceError::NotFound(_))));
    }

    #[tokio::test]
    async fn unassigned_scorekeeper_cannot_write() {
        let (state, _) = setup(live_match(1, vec![100, 200, 300])).await;
        let err = record_event(&state, 1, 300, goal(7, 23)).await.unwrap_err();
        assert!(matches!(err, ServiceError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn writes_require_live_match() {
        let mut entity = live_match(1, vec![100, 200]);
        entity.status = MatchStatus::Scheduled;
        let (state, _) = setup(entity).await;

        let err = record_attendance(&state, 1, 100, present(7, 10)).await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidState(_)));
    }

    #[tokio::test]
    async fn second_submission_moves_match_to_review() {
        let (state, store) = setup(live_match(1, vec![100, 200])).await;

        assert_eq!(submit_draft(&state, 1, 100).await.unwrap(), MatchStatus::Live);
        let locked = record_event(&state, 1, 100, goal(7, 23)).await.unwrap_err();
        assert!(matches!(locked, ServiceError::InvalidState(_)));

        assert_eq!(
            submit_draft(&state, 1, 200).await.unwrap(),
            MatchStatus::AdminReview
        );
        let entity = store.find_match(1).await.unwrap().unwrap();
        assert_eq!(entity.status, MatchStatus::AdminReview);
    }

    #[tokio::test]
    async fn drafts_default_to_empty_collections() {
        let (state, store) = setup(live_match(1, vec![100, 200])).await;
        record_event(&state, 1, 200, goal(7, 23)).await.unwrap();

        let drafts = get_drafts(&store, 1).await.unwrap();
        assert_eq!(drafts.scorekeeper_a.0, 100);
        assert!(drafts.scorekeeper_a.1.attendance.is_empty());
        assert!(drafts.scorekeeper_a.1.events.is_empty());
        assert_eq!(drafts.scorekeeper_b.1.events.len(), 1);
    }

    #[tokio::test]
    async fn repeated_scorekeeper_does_not_count_twice() {
        let (state, store) = setup(live_match(1, vec![100, 100])).await;

        let err = record_attendance(&state, 1, 100, present(7, 10)).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
        let err = submit_draft(&state, 1, 100).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
        assert!(matches!(
            get_drafts(&store, 1).await,
            Err(ServiceError::NotFound(_))
        ));
        let entity = store.find_match(1).await.unwrap().unwrap();
        assert_eq!(entity.status, MatchStatus::Live);
    }

    #[tokio::test]
    async fn duplicates_are_skipped_when_picking_scorekeeper_b() {
        let (state, store) = setup(live_match(1, vec![100, 100, 200])).await;

        assert_eq!(submit_draft(&state, 1, 100).await.unwrap(), MatchStatus::Live);
        assert_eq!(
            submit_draft(&state, 1, 200).await.unwrap(),
            MatchStatus::AdminReview
        );
        let drafts = get_drafts(&store, 1).await.unwrap();
        assert_eq!(drafts.scorekeeper_a.0, 100);
        assert_eq!(drafts.scorekeeper_b.0, 200);
    }

    #[tokio::test]
    async fn drafts_need_two_scorekeepers() {
        let (_, store) = setup(live_match(1, vec![100])).await;
        assert!(matches!(
            get_drafts(&store, 1).await,
            Err(ServiceError::NotFound(_))
        ));
    }
}
