use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// Status of a match as stored on the match row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    /// Scheduled but not started; scorekeepers cannot record yet.
    Scheduled,
    /// Being played; scorekeepers fill their drafts.
    Live,
    /// Both drafts submitted; waiting for an administrator.
    AdminReview,
    /// Final sheet approved.
    Finished,
    /// Called off.
    Cancelled,
}

impl MatchStatus {
    /// Name stored in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchStatus::Scheduled => "scheduled",
            MatchStatus::Live => "live",
            MatchStatus::AdminReview => "admin_review",
            MatchStatus::Finished => "finished",
            MatchStatus::Cancelled => "cancelled",
        }
    }

    /// Whether no further transition can leave this status.
    pub fn is_terminal(&self) -> bool {
        matches!(self, MatchStatus::Finished | MatchStatus::Cancelled)
    }
}

impl fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Events moving a match between statuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchEvent {
    /// Referee starts the match.
    Kickoff,
    /// Every scorekeeper submitted their draft.
    SubmitForReview,
    /// Administrator approves the reconciled sheet.
    Approve,
    /// Administrator sends the drafts back to the scorekeepers.
    Reject,
    /// Match is called off.
    Cancel,
}

/// Error returned when an event cannot be applied from the current status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("invalid transition: {event:?} cannot be applied while the match is {from}")]
pub struct InvalidTransition {
    /// Status the match was in.
    pub from: MatchStatus,
    /// Event that was refused.
    pub event: MatchEvent,
}

/// Compute the status reached by applying `event` to a match in `from`.
pub fn next_status(from: MatchStatus, event: MatchEvent) -> Result<MatchStatus, InvalidTransition> {
    let next = match (from, event) {
        (MatchStatus::Scheduled, MatchEvent::Kickoff) => MatchStatus::Live,
        (MatchStatus::Live, MatchEvent::SubmitForReview) => MatchStatus::AdminReview,
        (MatchStatus::AdminReview, MatchEvent::Approve) => MatchStatus::Finished,
        (MatchStatus::AdminReview, MatchEvent::Reject) => MatchStatus::Live,
        (
            MatchStatus::Scheduled | MatchStatus::Live | MatchStatus::AdminReview,
            MatchEvent::Cancel,
        ) => MatchStatus::Cancelled,
        (from, event) => return Err(InvalidTransition { from, event }),
    };

    Ok(next)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn apply(status: MatchStatus, event: MatchEvent) -> MatchStatus {
        next_status(status, event).unwrap()
    }

    #[test]
    fn full_happy_path_through_match() {
        let mut status = MatchStatus::Scheduled;
        status = apply(status, MatchEvent::Kickoff);
        assert_eq!(status, MatchStatus::Live);
        status = apply(status, MatchEvent::SubmitForReview);
        assert_eq!(status, MatchStatus::AdminReview);
        status = apply(status, MatchEvent::Approve);
        assert_eq!(status, MatchStatus::Finished);
        assert!(status.is_terminal());
    }

    #[test]
    fn rejected_review_returns_to_live() {
        assert_eq!(
            apply(MatchStatus::AdminReview, MatchEvent::Reject),
            MatchStatus::Live
        );
    }

    #[test]
    fn cancel_is_allowed_until_finished() {
        for status in [
            MatchStatus::Scheduled,
            MatchStatus::Live,
            MatchStatus::AdminReview,
        ] {
            assert_eq!(apply(status, MatchEvent::Cancel), MatchStatus::Cancelled);
        }
        assert!(next_status(MatchStatus::Finished, MatchEvent::Cancel).is_err());
    }

    #[test]
    fn approve_requires_admin_review() {
        let err = next_status(MatchStatus::Live, MatchEvent::Approve).unwrap_err();
        assert_eq!(err.from, MatchStatus::Live);
        assert_eq!(err.event, MatchEvent::Approve);
    }

    #[test]
    fn terminal_statuses_refuse_everything() {
        for status in [MatchStatus::Finished, MatchStatus::Cancelled] {
            for event in [
                MatchEvent::Kickoff,
                MatchEvent::SubmitForReview,
                MatchEvent::Approve,
                MatchEvent::Reject,
                MatchEvent::Cancel,
            ] {
                assert!(next_status(status, event).is_err());
            }
        }
    }

    #[test]
    fn status_uses_snake_case_names() {
        assert_eq!(
            serde_json::to_string(&MatchStatus::AdminReview).unwrap(),
            "\"admin_review\""
        );
        assert_eq!(MatchStatus::AdminReview.to_string(), "admin_review");
    }
}
