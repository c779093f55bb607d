use serde::{Deserialize, Serialize};
use std::time::SystemTime;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    scoresheet::{
        AttendanceRecord, EventRecord, MatchId, ScorekeeperDraft, ScorekeeperId, TeamId,
    },
    state::match_lifecycle::MatchStatus,
};

/// Match row as read from the league database. Owned by the league
/// administration; this service only moves its status.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MatchEntity {
    /// Primary key of the match.
    pub id: MatchId,
    /// Home team.
    pub home_team_id: TeamId,
    /// Away team.
    pub away_team_id: TeamId,
    /// Current lifecycle status.
    pub status: MatchStatus,
    /// Assigned scorekeepers in assignment order; the first two are A and B.
    pub scorekeepers: Vec<ScorekeeperId>,
    /// Last time the match row was updated.
    pub updated_at: SystemTime,
}

impl MatchEntity {
    /// Scorekeepers A and B: the first two distinct assigned ids. A repeated
    /// id counts once, so one person can never hold both drafts.
    pub fn scorekeeper_pair(&self) -> Option<(ScorekeeperId, ScorekeeperId)> {
        let (&a, rest) = self.scorekeepers.split_first()?;
        let &b = rest.iter().find(|&&id| id != a)?;
        Some((a, b))
    }
}

/// Event as stored in a draft, with the identifier used to edit it later.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EventDraftEntity {
    /// Identifier handed back to the scorekeeper.
    pub id: Uuid,
    /// Recorded values.
    pub record: EventRecord,
    /// When the scorekeeper recorded the event.
    pub recorded_at: SystemTime,
}

/// Private draft of one scorekeeper for one match.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DraftEntity {
    /// Match the draft belongs to.
    pub match_id: MatchId,
    /// Owner of the draft.
    pub scorekeeper_id: ScorekeeperId,
    /// One record per player.
    pub attendance: Vec<AttendanceRecord>,
    /// Events in recording order.
    pub events: Vec<EventDraftEntity>,
    /// Whether the scorekeeper handed the draft in.
    pub submitted: bool,
    /// Last write to the draft.
    pub updated_at: SystemTime,
}

impl DraftEntity {
    /// Empty draft for a scorekeeper who has not recorded anything yet.
    pub fn empty(match_id: MatchId, scorekeeper_id: ScorekeeperId) -> Self {
        Self {
            match_id,
            scorekeeper_id,
            attendance: Vec::new(),
            events: Vec::new(),
            submitted: false,
            updated_at: SystemTime::now(),
        }
    }

    /// Collections fed to the reconciler.
    pub fn to_scorekeeper_draft(&self) -> ScorekeeperDraft {
        ScorekeeperDraft {
            attendance: self.attendance.clone(),
            events: self
                .events
                .iter()
                .map(|event| event.record.clone())
                .collect(),
        }
    }
}

/// Authoritative attendance and events of a finished match.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MatchResultEntity {
    /// Finished match.
    pub match_id: MatchId,
    /// Final attendance lines.
    pub attendance: Vec<AttendanceRecord>,
    /// Final events.
    pub events: Vec<EventRecord>,
    /// When the reviewer approved the sheet.
    pub finalized_at: SystemTime,
}

/// Outcome of an administrative review.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ReviewOutcome {
    /// Sheet approved and match finished.
    Approved,
    /// Drafts sent back to the scorekeepers.
    Rejected,
}

/// Audit record of a review decision.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReviewEntity {
    /// Audit record identifier.
    pub id: Uuid,
    /// Match the decision is about.
    pub match_id: MatchId,
    /// Name of the administrator who decided.
    pub reviewer: String,
    /// Approved or rejected.
    pub outcome: ReviewOutcome,
    /// Justification, mandatory whenever the drafts disagreed.
    pub comment: Option<String>,
    /// When the decision was taken.
    pub reviewed_at: SystemTime,
}

/// Everything the store writes in one go when a match is approved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinalizedMatch {
    /// Replaces any previous final sheet of the match.
    pub result: MatchResultEntity,
    /// Audit trail entry with outcome `approved`.
    pub review: ReviewEntity,
}
