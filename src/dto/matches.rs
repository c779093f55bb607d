//! Read models of matches, final sheets and raw drafts.

use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    dao::models::{MatchEntity, MatchResultEntity},
    dto::format_system_time,
    scoresheet::{
        AttendanceRecord, EventRecord, MatchDrafts, MatchId, ScorekeeperDraft, ScorekeeperId,
        TeamId,
    },
    state::match_lifecycle::MatchStatus,
};

/// Public projection of a match row.
#[derive(Debug, Serialize, ToSchema)]
pub struct MatchSummary {
    /// Match identifier.
    pub id: MatchId,
    /// Home team.
    pub home_team_id: TeamId,
    /// Away team.
    pub away_team_id: TeamId,
    /// Lifecycle status.
    pub status: MatchStatus,
    /// Assigned scorekeepers; the first two distinct ids are A and B.
    pub scorekeepers: Vec<ScorekeeperId>,
    /// RFC 3339 timestamp of the last status change.
    pub updated_at: String,
}

impl From<MatchEntity> for MatchSummary {
    fn from(value: MatchEntity) -> Self {
        Self {
            id: value.id,
            home_team_id: value.home_team_id,
            away_team_id: value.away_team_id,
            status: value.status,
            scorekeepers: value.scorekeepers,
            updated_at: format_system_time(value.updated_at),
        }
    }
}

/// Authoritative sheet of a finished match.
#[derive(Debug, Serialize, ToSchema)]
pub struct MatchResultResponse {
    /// Finished match.
    pub match_id: MatchId,
    /// Final attendance lines.
    pub attendance: Vec<AttendanceRecord>,
    /// Final events.
    pub events: Vec<EventRecord>,
    /// RFC 3339 timestamp of the approval.
    pub finalized_at: String,
}

impl From<MatchResultEntity> for MatchResultResponse {
    fn from(value: MatchResultEntity) -> Self {
        Self {
            match_id: value.match_id,
            attendance: value.attendance,
            events: value.events,
            finalized_at: format_system_time(value.finalized_at),
        }
    }
}

/// Raw draft of one scorekeeper.
#[derive(Debug, Serialize, ToSchema)]
pub struct ScorekeeperDraftView {
    /// Owner of the draft.
    pub scorekeeper_id: ScorekeeperId,
    /// Attendance lines as recorded.
    pub attendance: Vec<AttendanceRecord>,
    /// Events as recorded.
    pub events: Vec<EventRecord>,
}

impl From<(ScorekeeperId, ScorekeeperDraft)> for ScorekeeperDraftView {
    fn from((scorekeeper_id, draft): (ScorekeeperId, ScorekeeperDraft)) -> Self {
        Self {
            scorekeeper_id,
            attendance: draft.attendance,
            events: draft.events,
        }
    }
}

/// Both drafts of a match side by side.
#[derive(Debug, Serialize, ToSchema)]
pub struct MatchDraftsResponse {
    /// Match both drafts belong to.
    pub match_id: MatchId,
    /// Draft of the first assigned scorekeeper.
    pub scorekeeper_a: ScorekeeperDraftView,
    /// Draft of the second assigned scorekeeper.
    pub scorekeeper_b: ScorekeeperDraftView,
}

impl From<MatchDrafts> for MatchDraftsResponse {
    fn from(value: MatchDrafts) -> Self {
        Self {
            match_id: value.match_id,
            scorekeeper_a: value.scorekeeper_a.into(),
            scorekeeper_b: value.scorekeeper_b.into(),
        }
    }
}
