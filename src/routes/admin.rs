use axum::{
    Extension, Json, Router,
    body::Body,
    extract::State,
    http::Request,
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
};

use crate::{
    dto::{
        ActionResponse,
        matches::MatchDraftsResponse,
        review::{
            ApproveRequest, PreviewRequest, PreviewResponse, ReconciliationResponse, RejectRequest,
            ReviewView,
        },
        validation::{ApiPath, ValidJson},
    },
    error::{AppError, ErrorBody},
    scoresheet::MatchId,
    services::{draft_service, match_service, review_service},
    state::SharedState,
};

const ADMIN_TOKEN_HEADER: &str = "x-admin-token";

/// Name of the reviewer authenticated by the admin token.
#[derive(Debug, Clone)]
pub struct ReviewerIdentity(pub String);

/// Administrative endpoints: match lifecycle and sheet review.
pub fn router(state: SharedState) -> Router<SharedState> {
    Router::new()
        .route("/admin/matches/{id}/kickoff", post(kickoff))
        .route("/admin/matches/{id}/cancel", post(cancel))
        .route("/admin/matches/{id}/drafts", get(get_drafts))
        .route("/admin/matches/{id}/reconciliation", get(get_reconciliation))
        .route("/admin/matches/{id}/review/preview", post(preview_review))
        .route("/admin/matches/{id}/review/approve", post(approve_review))
        .route("/admin/matches/{id}/review/reject", post(reject_review))
        .route("/admin/matches/{id}/reviews", get(list_reviews))
        .route_layer(middleware::from_fn_with_state(state, require_admin_token))
}

#[utoipa::path(
    post,
    path = "/admin/matches/{id}/kickoff",
    tag = "admin",
    params(
        ("X-Admin-Token" = String, Header, description = "Reviewer token from the configuration"),
        ("id" = i64, Path, description = "Match identifier")
    ),
    responses(
        (status = 200, description = "Match is live", body = ActionResponse),
        (status = 409, description = "Match cannot start", body = ErrorBody)
    )
)]
/// Start a scheduled match, opening the scorekeepers' drafts.
pub async fn kickoff(
    State(state): State<SharedState>,
    ApiPath(id): ApiPath<MatchId>,
) -> Result<Json<ActionResponse>, AppError> {
    let status = match_service::kickoff(&state, id).await?;
    Ok(Json(ActionResponse::ok(format!("match is now {status}"))))
}

#[utoipa::path(
    post,
    path = "/admin/matches/{id}/cancel",
    tag = "admin",
    params(
        ("X-Admin-Token" = String, Header, description = "Reviewer token from the configuration"),
        ("id" = i64, Path, description = "Match identifier")
    ),
    responses(
        (status = 200, description = "Match cancelled", body = ActionResponse),
        (status = 409, description = "Match already finished or cancelled", body = ErrorBody)
    )
)]
/// Cancel a match that is not finished yet.
pub async fn cancel(
    State(state): State<SharedState>,
    ApiPath(id): ApiPath<MatchId>,
) -> Result<Json<ActionResponse>, AppError> {
    let status = match_service::cancel(&state, id).await?;
    Ok(Json(ActionResponse::ok(format!("match is now {status}"))))
}

#[utoipa::path(
    get,
    path = "/admin/matches/{id}/drafts",
    tag = "admin",
    params(
        ("X-Admin-Token" = String, Header, description = "Reviewer token from the configuration"),
        ("id" = i64, Path, description = "Match identifier")
    ),
    responses(
        (status = 200, description = "Raw drafts of scorekeepers A and B", body = MatchDraftsResponse),
        (status = 404, description = "Unknown match or fewer than two scorekeepers", body = ErrorBody)
    )
)]
/// Return both drafts as recorded, without reconciliation.
pub async fn get_drafts(
    State(state): State<SharedState>,
    ApiPath(id): ApiPath<MatchId>,
) -> Result<Json<MatchDraftsResponse>, AppError> {
    let store = state.require_league_store().await?;
    Ok(Json(draft_service::get_drafts(&store, id).await?.into()))
}

#[utoipa::path(
    get,
    path = "/admin/matches/{id}/reconciliation",
    tag = "admin",
    params(
        ("X-Admin-Token" = String, Header, description = "Reviewer token from the configuration"),
        ("id" = i64, Path, description = "Match identifier")
    ),
    responses((status = 200, description = "Reconciled entries", body = ReconciliationResponse))
)]
/// Line both drafts up and classify every entry.
pub async fn get_reconciliation(
    State(state): State<SharedState>,
    ApiPath(id): ApiPath<MatchId>,
) -> Result<Json<ReconciliationResponse>, AppError> {
    Ok(Json(review_service::reconciliation(&state, id).await?))
}

#[utoipa::path(
    post,
    path = "/admin/matches/{id}/review/preview",
    tag = "admin",
    params(
        ("X-Admin-Token" = String, Header, description = "Reviewer token from the configuration"),
        ("id" = i64, Path, description = "Match identifier")
    ),
    request_body = PreviewRequest,
    responses(
        (status = 200, description = "Working sheet for the given choices", body = PreviewResponse),
        (status = 400, description = "Unknown entry or impossible choice", body = ErrorBody)
    )
)]
/// Apply tentative choices and run the rules, without saving anything.
pub async fn preview_review(
    State(state): State<SharedState>,
    ApiPath(id): ApiPath<MatchId>,
    ValidJson(payload): ValidJson<PreviewRequest>,
) -> Result<Json<PreviewResponse>, AppError> {
    Ok(Json(
        review_service::preview(&state, id, payload.choices).await?,
    ))
}

#[utoipa::path(
    post,
    path = "/admin/matches/{id}/review/approve",
    tag = "admin",
    summary = "Approve the reconciled sheet",
    description = "Takes the reviewer `choices` for every non-agreed entry and an optional `comment`. \
        The server rebuilds the final sheet from the stored drafts plus those choices, validates it \
        and saves it; attendance or event arrays sent by the client are not accepted.",
    params(
        ("X-Admin-Token" = String, Header, description = "Reviewer token from the configuration"),
        ("id" = i64, Path, description = "Match identifier")
    ),
    request_body = ApproveRequest,
    responses(
        (status = 200, description = "Final sheet saved and match finished", body = ActionResponse),
        (status = 400, description = "Invalid choice or missing comment", body = ErrorBody),
        (status = 409, description = "Match not in review or decisions missing", body = ErrorBody),
        (status = 422, description = "Sheet breaks league rules", body = ErrorBody),
        (status = 503, description = "Final sheet could not be saved", body = ErrorBody)
    )
)]
/// Approve the reconciled sheet and finish the match. The final sheet is
/// rebuilt here from the stored drafts and the submitted choices.
pub async fn approve_review(
    State(state): State<SharedState>,
    Extension(reviewer): Extension<ReviewerIdentity>,
    ApiPath(id): ApiPath<MatchId>,
    ValidJson(payload): ValidJson<ApproveRequest>,
) -> Result<Json<ActionResponse>, AppError> {
    review_service::approve(&state, id, &reviewer.0, payload.comment, payload.choices).await?;
    Ok(Json(ActionResponse::ok("final sheet saved; match finished")))
}

#[utoipa::path(
    post,
    path = "/admin/matches/{id}/review/reject",
    tag = "admin",
    params(
        ("X-Admin-Token" = String, Header, description = "Reviewer token from the configuration"),
        ("id" = i64, Path, description = "Match identifier")
    ),
    request_body = RejectRequest,
    responses(
        (status = 200, description = "Drafts sent back to the scorekeepers", body = ActionResponse),
        (status = 409, description = "Match not in review", body = ErrorBody)
    )
)]
/// Send both drafts back to the scorekeepers for correction.
pub async fn reject_review(
    State(state): State<SharedState>,
    Extension(reviewer): Extension<ReviewerIdentity>,
    ApiPath(id): ApiPath<MatchId>,
    ValidJson(payload): ValidJson<RejectRequest>,
) -> Result<Json<ActionResponse>, AppError> {
    review_service::reject(&state, id, &reviewer.0, payload.comment).await?;
    Ok(Json(ActionResponse::ok("drafts reopened")))
}

#[utoipa::path(
    get,
    path = "/admin/matches/{id}/reviews",
    tag = "admin",
    params(
        ("X-Admin-Token" = String, Header, description = "Reviewer token from the configuration"),
        ("id" = i64, Path, description = "Match identifier")
    ),
    responses((status = 200, description = "Audit trail, oldest first", body = [ReviewView]))
)]
/// Review audit trail of a match.
pub async fn list_reviews(
    State(state): State<SharedState>,
    ApiPath(id): ApiPath<MatchId>,
) -> Result<Json<Vec<ReviewView>>, AppError> {
    Ok(Json(review_service::list_reviews(&state, id).await?))
}

/// Resolve the reviewer from the admin token before any data access.
async fn require_admin_token(
    State(state): State<SharedState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let provided = req
        .headers()
        .get(ADMIN_TOKEN_HEADER)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| {
            AppError::Unauthorized("missing admin token header `X-Admin-Token`".into())
        })?;

    let reviewer = state
        .config()
        .reviewer_for_token(provided)
        .map(|reviewer| ReviewerIdentity(reviewer.name.clone()))
        .ok_or_else(|| AppError::Unauthorized("invalid admin token".into()))?;

    req.extensions_mut().insert(reviewer);
    Ok(next.run(req).await)
}
