//! Payloads of the review endpoints.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dao::models::{ReviewEntity, ReviewOutcome},
    dto::{format_system_time, validation::validate_not_blank},
    scoresheet::{
        AttendanceRecord, Choice, EntryKey, EntrySource, EventRecord, MatchId, ReconciledEntry,
        Reconciliation, ResolvedView, ValidationIssue,
    },
};

/// Longest comment accepted on a review.
pub const MAX_COMMENT_LENGTH: u64 = 2000;

/// One reconciled attendance line.
#[derive(Debug, Serialize, ToSchema)]
pub struct AttendanceEntryView {
    /// Entry identifier to send back with a choice.
    pub key: EntryKey,
    /// How the two drafts relate.
    pub source: EntrySource,
    /// Value recorded by scorekeeper A.
    pub a: Option<AttendanceRecord>,
    /// Value recorded by scorekeeper B.
    pub b: Option<AttendanceRecord>,
}

/// One reconciled event line.
#[derive(Debug, Serialize, ToSchema)]
pub struct EventEntryView {
    /// Entry identifier to send back with a choice.
    pub key: EntryKey,
    /// How the two drafts relate.
    pub source: EntrySource,
    /// Value recorded by scorekeeper A.
    pub a: Option<EventRecord>,
    /// Value recorded by scorekeeper B.
    pub b: Option<EventRecord>,
}

fn entry_sides<T: Clone>(entry: &ReconciledEntry<T>) -> (Option<T>, Option<T>) {
    (entry.value_from_a().cloned(), entry.value_from_b().cloned())
}

/// Reconciled view of both drafts.
#[derive(Debug, Serialize, ToSchema)]
pub struct ReconciliationResponse {
    /// Match both drafts belong to.
    pub match_id: MatchId,
    /// Whether any entry is not agreed.
    pub has_differences: bool,
    /// Attendance lines in first-seen player order.
    pub attendance: Vec<AttendanceEntryView>,
    /// Event lines.
    pub events: Vec<EventEntryView>,
}

impl ReconciliationResponse {
    /// Project a reconciliation onto the wire format.
    pub fn new(match_id: MatchId, reconciliation: &Reconciliation) -> Self {
        Self {
            match_id,
            has_differences: reconciliation.has_differences(),
            attendance: reconciliation
                .attendance
                .iter()
                .map(|entry| {
                    let (a, b) = entry_sides(entry);
                    AttendanceEntryView {
                        key: entry.key,
                        source: entry.source(),
                        a,
                        b,
                    }
                })
                .collect(),
            events: reconciliation
                .events
                .iter()
                .map(|entry| {
                    let (a, b) = entry_sides(entry);
                    EventEntryView {
                        key: entry.key,
                        source: entry.source(),
                        a,
                        b,
                    }
                })
                .collect(),
        }
    }
}

/// Reviewer decision for one entry.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ChoiceInput {
    /// Entry the choice applies to.
    pub key: EntryKey,
    /// Selected value.
    pub choice: Choice,
}

/// Choices to try out without saving anything.
#[derive(Debug, Default, Deserialize, ToSchema, Validate)]
pub struct PreviewRequest {
    /// Choices to apply, later ones overriding earlier ones on the same key.
    #[serde(default)]
    pub choices: Vec<ChoiceInput>,
}

/// Working sheet for a set of choices.
#[derive(Debug, Serialize, ToSchema)]
pub struct PreviewResponse {
    /// Match being reviewed.
    pub match_id: MatchId,
    /// Agreed values plus the chosen ones.
    pub view: ResolvedView,
    /// Validator findings on the working sheet.
    pub issues: Vec<ValidationIssue>,
    /// Entries still lacking a choice.
    pub unresolved: Vec<EntryKey>,
    /// Whether the drafts disagree anywhere.
    pub has_differences: bool,
    /// Whether approving requires a comment.
    pub comment_required: bool,
    /// Whether approving with these choices would succeed, comment aside.
    pub can_finalize: bool,
}

/// Final decision on the sheet.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct ApproveRequest {
    /// Mandatory as soon as the drafts disagree.
    #[serde(default)]
    #[validate(length(max = MAX_COMMENT_LENGTH))]
    pub comment: Option<String>,
    /// Resolution of every non-agreed entry. The server rebuilds the final
    /// sheet from the stored drafts and these choices.
    #[serde(default)]
    pub choices: Vec<ChoiceInput>,
}

/// Sends the drafts back to the scorekeepers.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct RejectRequest {
    /// Reason sent back to the scorekeepers.
    #[validate(
        length(min = 1, max = MAX_COMMENT_LENGTH),
        custom(function = "validate_not_blank")
    )]
    pub comment: String,
}

/// Audit trail entry.
#[derive(Debug, Serialize, ToSchema)]
pub struct ReviewView {
    /// Audit record identifier.
    pub id: Uuid,
    /// Administrator who decided.
    pub reviewer: String,
    /// Approved or rejected.
    pub outcome: ReviewOutcome,
    /// Justification, if one was given.
    pub comment: Option<String>,
    /// RFC 3339 timestamp of the decision.
    pub reviewed_at: String,
}

impl From<ReviewEntity> for ReviewView {
    fn from(value: ReviewEntity) -> Self {
        Self {
            id: value.id,
            reviewer: value.reviewer,
            outcome: value.outcome,
            comment: value.comment,
            reviewed_at: format_system_time(value.reviewed_at),
        }
    }
}
