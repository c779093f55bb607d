use axum::{Json, Router, extract::State, routing::get};

use crate::{
    dto::{
        matches::{MatchResultResponse, MatchSummary},
        validation::ApiPath,
    },
    error::{AppError, ErrorBody},
    scoresheet::MatchId,
    services::match_service,
    state::SharedState,
};

/// Public read-only endpoints exposing matches and their final sheets.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/matches/{id}", get(get_match))
        .route("/matches/{id}/result", get(get_result))
}

#[utoipa::path(
    get,
    path = "/matches/{id}",
    tag = "public",
    params(("id" = i64, Path, description = "Match identifier")),
    responses(
        (status = 200, description = "Match found", body = MatchSummary),
        (status = 404, description = "Unknown match", body = ErrorBody)
    )
)]
/// Return a match and its current status.
pub async fn get_match(
    State(state): State<SharedState>,
    ApiPath(id): ApiPath<MatchId>,
) -> Result<Json<MatchSummary>, AppError> {
    Ok(Json(match_service::get_match(&state, id).await?))
}

#[utoipa::path(
    get,
    path = "/matches/{id}/result",
    tag = "public",
    params(("id" = i64, Path, description = "Match identifier")),
    responses(
        (status = 200, description = "Final sheet", body = MatchResultResponse),
        (status = 404, description = "Unknown match or no final sheet", body = ErrorBody),
        (status = 409, description = "Match not finished yet", body = ErrorBody)
    )
)]
/// Return the authoritative attendance and events of a finished match.
pub async fn get_result(
    State(state): State<SharedState>,
    ApiPath(id): ApiPath<MatchId>,
) -> Result<Json<MatchResultResponse>, AppError> {
    Ok(Json(match_service::get_result(&state, id).await?))
}
