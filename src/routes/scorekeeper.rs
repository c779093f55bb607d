//! Endpoints used by the two scorekeepers while a match is played.

use axum::{
    Json, Router,
    extract::State,
    routing::{get, post, put},
};
use uuid::Uuid;

use crate::{
    dto::{
        ActionResponse,
        draft::{AttendanceInput, DraftView, EventInput, RecordedEventResponse},
        validation::{ApiPath, ValidJson},
    },
    error::{AppError, ErrorBody},
    scoresheet::{MatchId, ScorekeeperId},
    services::draft_service,
    state::{SharedState, match_lifecycle::MatchStatus},
};

/// Scorekeeper route tree.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route(
            "/matches/{id}/scorekeepers/{scorekeeper_id}/attendance",
            put(record_attendance),
        )
        .route(
            "/matches/{id}/scorekeepers/{scorekeeper_id}/events",
            post(record_event),
        )
        .route(
            "/matches/{id}/scorekeepers/{scorekeeper_id}/events/{event_id}",
            put(update_event),
        )
        .route(
            "/matches/{id}/scorekeepers/{scorekeeper_id}/submit",
            post(submit_draft),
        )
        .route(
            "/matches/{id}/scorekeepers/{scorekeeper_id}/draft",
            get(get_draft),
        )
}

#[utoipa::path(
    put,
    path = "/matches/{id}/scorekeepers/{scorekeeper_id}/attendance",
    tag = "scorekeepers",
    params(
        ("id" = i64, Path, description = "Match identifier"),
        ("scorekeeper_id" = i64, Path, description = "Scorekeeper identifier")
    ),
    request_body = AttendanceInput,
    responses(
        (status = 200, description = "Attendance recorded", body = ActionResponse),
        (status = 400, description = "Invalid payload", body = ErrorBody),
        (status = 401, description = "Scorekeeper not assigned to the match", body = ErrorBody),
        (status = 409, description = "Match not live or draft already submitted", body = ErrorBody)
    )
)]
/// Record or overwrite the attendance of one player in the scorekeeper's draft.
pub async fn record_attendance(
    State(state): State<SharedState>,
    ApiPath((id, scorekeeper_id)): ApiPath<(MatchId, ScorekeeperId)>,
    ValidJson(payload): ValidJson<AttendanceInput>,
) -> Result<Json<ActionResponse>, AppError> {
    draft_service::record_attendance(&state, id, scorekeeper_id, payload).await?;
    Ok(Json(ActionResponse::ok("attendance recorded")))
}

#[utoipa::path(
    post,
    path = "/matches/{id}/scorekeepers/{scorekeeper_id}/events",
    tag = "scorekeepers",
    params(
        ("id" = i64, Path, description = "Match identifier"),
        ("scorekeeper_id" = i64, Path, description = "Scorekeeper identifier")
    ),
    request_body = EventInput,
    responses(
        (status = 200, description = "Event recorded", body = RecordedEventResponse),
        (status = 400, description = "Invalid payload", body = ErrorBody),
        (status = 409, description = "Match not live or draft already submitted", body = ErrorBody)
    )
)]
/// Append an event to the scorekeeper's draft.
pub async fn record_event(
    State(state): State<SharedState>,
    ApiPath((id, scorekeeper_id)): ApiPath<(MatchId, ScorekeeperId)>,
    ValidJson(payload): ValidJson<EventInput>,
) -> Result<Json<RecordedEventResponse>, AppError> {
    let event_id = draft_service::record_event(&state, id, scorekeeper_id, payload).await?;
    Ok(Json(RecordedEventResponse {
        success: true,
        message: "event recorded".into(),
        event_id,
    }))
}

#[utoipa::path(
    put,
    path = "/matches/{id}/scorekeepers/{scorekeeper_id}/events/{event_id}",
    tag = "scorekeepers",
    params(
        ("id" = i64, Path, description = "Match identifier"),
        ("scorekeeper_id" = i64, Path, description = "Scorekeeper identifier"),
        ("event_id" = Uuid, Path, description = "Identifier returned when the event was recorded")
    ),
    request_body = EventInput,
    responses(
        (status = 200, description = "Event updated", body = ActionResponse),
        (status = 404, description = "Unknown event", body = ErrorBody)
    )
)]
/// Correct a previously recorded event.
pub async fn update_event(
    State(state): State<SharedState>,
    ApiPath((id, scorekeeper_id, event_id)): ApiPath<(MatchId, ScorekeeperId, Uuid)>,
    ValidJson(payload): ValidJson<EventInput>,
) -> Result<Json<ActionResponse>, AppError> {
    draft_service::update_event(&state, id, scorekeeper_id, event_id, payload).await?;
    Ok(Json(ActionResponse::ok("event updated")))
}

#[utoipa::path(
    post,
    path = "/matches/{id}/scorekeepers/{scorekeeper_id}/submit",
    tag = "scorekeepers",
    params(
        ("id" = i64, Path, description = "Match identifier"),
        ("scorekeeper_id" = i64, Path, description = "Scorekeeper identifier")
    ),
    responses(
        (status = 200, description = "Draft submitted", body = ActionResponse),
        (status = 409, description = "Match not live or draft already submitted", body = ErrorBody)
    )
)]
/// Hand the draft in. The match goes to review once both drafts are in.
pub async fn submit_draft(
    State(state): State<SharedState>,
    ApiPath((id, scorekeeper_id)): ApiPath<(MatchId, ScorekeeperId)>,
) -> Result<Json<ActionResponse>, AppError> {
    let status = draft_service::submit_draft(&state, id, scorekeeper_id).await?;
    let message = match status {
        MatchStatus::AdminReview => "draft submitted; match waiting for review",
        _ => "draft submitted; waiting for the other scorekeeper",
    };
    Ok(Json(ActionResponse::ok(message)))
}

#[utoipa::path(
    get,
    path = "/matches/{id}/scorekeepers/{scorekeeper_id}/draft",
    tag = "scorekeepers",
    params(
        ("id" = i64, Path, description = "Match identifier"),
        ("scorekeeper_id" = i64, Path, description = "Scorekeeper identifier")
    ),
    responses((status = 200, description = "Scorekeeper's own draft", body = DraftView))
)]
/// Read the scorekeeper's own draft.
pub async fn get_draft(
    State(state): State<SharedState>,
    ApiPath((id, scorekeeper_id)): ApiPath<(MatchId, ScorekeeperId)>,
) -> Result<Json<DraftView>, AppError> {
    Ok(Json(
        draft_service::get_own_draft(&state, id, scorekeeper_id).await?,
    ))
}
