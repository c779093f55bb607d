//! Administrative review of a match sheet: reconciliation, live preview of
//! reviewer choices, and the final approve/reject decision.

use std::{sync::Arc, time::SystemTime};

use tracing::{error, info, warn};
use uuid::Uuid;

use crate::{
    dao::{
        league_store::LeagueStore,
        models::{FinalizedMatch, MatchEntity, MatchResultEntity, ReviewEntity, ReviewOutcome},
    },
    dto::review::{ChoiceInput, PreviewResponse, ReconciliationResponse, ReviewView},
    error::ServiceError,
    scoresheet::{
        MatchId, Reconciliation, ResolutionSet, ResolvedView, ValidationRules, reconcile, validate,
    },
    services::{draft_service::get_drafts, match_service::load_match},
    state::{
        SharedState,
        match_lifecycle::{MatchEvent, MatchStatus, next_status},
    },
};

/// Reconcile the two drafts of a match.
async fn reconcile_match(
    store: &Arc<dyn LeagueStore>,
    match_id: MatchId,
) -> Result<Reconciliation, ServiceError> {
    let drafts = get_drafts(store, match_id).await?;
    Ok(reconcile(&drafts.scorekeeper_a.1, &drafts.scorekeeper_b.1))
}

/// A justification is mandatory when the drafts disagree or when the agreed
/// entries alone already break a rule.
pub fn comment_required(reconciliation: &Reconciliation, rules: &ValidationRules) -> bool {
    reconciliation.has_differences() || !validate(&reconciliation.agreed_view(), rules).is_empty()
}

fn build_resolutions(
    reconciliation: &Reconciliation,
    choices: Vec<ChoiceInput>,
) -> Result<ResolutionSet, ServiceError> {
    let choices = choices.into_iter().map(|input| (input.key, input.choice));
    Ok(ResolutionSet::from_choices(reconciliation, choices)?)
}

fn normalized_comment(comment: Option<String>) -> Option<String> {
    comment
        .map(|text| text.trim().to_owned())
        .filter(|text| !text.is_empty())
}

/// Check every finalization precondition that does not depend on storage and
/// return the sheet to persist.
fn finalizable_view(
    reconciliation: &Reconciliation,
    resolutions: &ResolutionSet,
    rules: &ValidationRules,
    comment: Option<&str>,
) -> Result<ResolvedView, ServiceError> {
    let unresolved = resolutions.unresolved(reconciliation);
    if !unresolved.is_empty() {
        return Err(ServiceError::InvalidState(format!(
            "{} entr{} still need a decision",
            unresolved.len(),
            if unresolved.len() == 1 { "y" } else { "ies" }
        )));
    }

    let view = resolutions.working_view(reconciliation);
    let issues = validate(&view, rules);
    if !issues.is_empty() {
        return Err(ServiceError::Validation(issues));
    }

    if comment.is_none() && comment_required(reconciliation, rules) {
        return Err(ServiceError::InvalidInput(
            "a comment is required because the scorekeepers' drafts differ".into(),
        ));
    }

    Ok(view)
}

/// Side-by-side reconciliation of both drafts.
pub async fn reconciliation(
    state: &SharedState,
    match_id: MatchId,
) -> Result<ReconciliationResponse, ServiceError> {
    let store = state.require_league_store().await?;
    let reconciliation = reconcile_match(&store, match_id).await?;
    Ok(ReconciliationResponse::new(match_id, &reconciliation))
}

/// Working sheet, issues and remaining decisions for a tentative set of choices.
/// Nothing is written.
pub async fn preview(
    state: &SharedState,
    match_id: MatchId,
    choices: Vec<ChoiceInput>,
) -> Result<PreviewResponse, ServiceError> {
    let store = state.require_league_store().await?;
    let reconciliation = reconcile_match(&store, match_id).await?;
    let resolutions = build_resolutions(&reconciliation, choices)?;
    let rules = state.config().validation_rules();

    let view = resolutions.working_view(&reconciliation);
    let issues = validate(&view, rules);
    let unresolved = resolutions.unresolved(&reconciliation);

    Ok(PreviewResponse {
        match_id,
        can_finalize: issues.is_empty() && unresolved.is_empty(),
        view,
        issues,
        unresolved,
        has_differences: reconciliation.has_differences(),
        comment_required: comment_required(&reconciliation, rules),
    })
}

/// Approve the reconciled sheet and finish the match.
///
/// The final sheet is recomputed from the stored drafts and the reviewer's
/// choices. Either the whole sheet lands together with the status change and
/// the audit record, or nothing changes and the match stays in admin review.
pub async fn approve(
    state: &SharedState,
    match_id: MatchId,
    reviewer: &str,
    comment: Option<String>,
    choices: Vec<ChoiceInput>,
) -> Result<(), ServiceError> {
    let store = state.require_league_store().await?;
    let entity: MatchEntity = load_match(&store, match_id).await?;
    next_status(entity.status, MatchEvent::Approve)?;

    let reconciliation = reconcile_match(&store, match_id).await?;
    let resolutions = build_resolutions(&reconciliation, choices)?;
    let comment = normalized_comment(comment);
    let view = finalizable_view(
        &reconciliation,
        &resolutions,
        state.config().validation_rules(),
        comment.as_deref(),
    )?;

    let now = SystemTime::now();
    let finalized = FinalizedMatch {
        result: MatchResultEntity {
            match_id,
            attendance: view.attendance,
            events: view.events,
            finalized_at: now,
        },
        review: ReviewEntity {
            id: Uuid::new_v4(),
            match_id,
            reviewer: reviewer.to_owned(),
            outcome: ReviewOutcome::Approved,
            comment,
            reviewed_at: now,
        },
    };

    if let Err(err) = store.finalize_match(finalized).await {
        error!(match_id, error = %err, "finalization failed; match stays in admin review");
        return Err(err.into());
    }

    info!(match_id, reviewer, "match sheet approved");
    Ok(())
}

/// Send both drafts back to the scorekeepers.
pub async fn reject(
    state: &SharedState,
    match_id: MatchId,
    reviewer: &str,
    comment: String,
) -> Result<MatchStatus, ServiceError> {
    let store = state.require_league_store().await?;
    let entity = load_match(&store, match_id).await?;
    let next = next_status(entity.status, MatchEvent::Reject)?;

    let Some(comment) = normalized_comment(Some(comment)) else {
        return Err(ServiceError::InvalidInput(
            "a comment is required to reject a sheet".into(),
        ));
    };

    let review = ReviewEntity {
        id: Uuid::new_v4(),
        match_id,
        reviewer: reviewer.to_owned(),
        outcome: ReviewOutcome::Rejected,
        comment: Some(comment),
        reviewed_at: SystemTime::now(),
    };

    if let Err(err) = store.reopen_match(review).await {
        warn!(match_id, error = %err, "failed to reopen match drafts");
        return Err(err.into());
    }

    info!(match_id, reviewer, "match sheet rejected; drafts reopened");
    Ok(next)
}

/// Audit trail of a match, oldest first.
pub async fn list_reviews(
    state: &SharedState,
    match_id: MatchId,
) -> Result<Vec<ReviewView>, ServiceError> {
    let store = state.require_league_store().await?;
    load_match(&store, match_id).await?;
    let reviews = store.list_reviews(match_id).await?;
    Ok(reviews.into_iter().map(Into::into).collect())
}
