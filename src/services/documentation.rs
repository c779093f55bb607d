use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for the match-sheet backend.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::public::get_match,
        crate::routes::public::get_result,
        crate::routes::scorekeeper::record_attendance,
        crate::routes::scorekeeper::record_event,
        crate::routes::scorekeeper::update_event,
        crate::routes::scorekeeper::submit_draft,
        crate::routes::scorekeeper::get_draft,
        crate::routes::admin::kickoff,
        crate::routes::admin::cancel,
        crate::routes::admin::get_drafts,
        crate::routes::admin::get_reconciliation,
        crate::routes::admin::preview_review,
        crate::routes::admin::approve_review,
        crate::routes::admin::reject_review,
        crate::routes::admin::list_reviews,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::health::HealthStatus,
            crate::dto::ActionResponse,
            crate::error::ErrorBody,
            crate::dto::matches::MatchSummary,
            crate::dto::matches::MatchResultResponse,
            crate::dto::matches::ScorekeeperDraftView,
            crate::dto::matches::MatchDraftsResponse,
            crate::dto::draft::AttendanceInput,
            crate::dto::draft::EventInput,
            crate::dto::draft::RecordedEventResponse,
            crate::dto::draft::DraftEventView,
            crate::dto::draft::DraftView,
            crate::dto::review::AttendanceEntryView,
            crate::dto::review::EventEntryView,
            crate::dto::review::ReconciliationResponse,
            crate::dto::review::ChoiceInput,
            crate::dto::review::PreviewRequest,
            crate::dto::review::PreviewResponse,
            crate::dto::review::ApproveRequest,
            crate::dto::review::RejectRequest,
            crate::dto::review::ReviewView,
            crate::dao::models::ReviewOutcome,
            crate::scoresheet::AttendanceRecord,
            crate::scoresheet::AttendanceStatus,
            crate::scoresheet::EventRecord,
            crate::scoresheet::EventType,
            crate::scoresheet::ResolvedView,
            crate::scoresheet::EntryKey,
            crate::scoresheet::EntrySource,
            crate::scoresheet::Choice,
            crate::scoresheet::ValidationIssue,
            crate::scoresheet::IssueKind,
            crate::state::match_lifecycle::MatchStatus,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "public", description = "Match status and published results"),
        (name = "scorekeepers", description = "Private drafts of the two scorekeepers"),
        (name = "admin", description = "Match lifecycle and sheet review, behind `X-Admin-Token`"),
    )
)]
/// OpenAPI document of every route.
pub struct ApiDoc;
