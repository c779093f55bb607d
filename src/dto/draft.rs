//! Payloads of the scorekeeper endpoints.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dao::models::{DraftEntity, EventDraftEntity},
    dto::{format_system_time, validation::MAX_JERSEY_NUMBER},
    scoresheet::{
        AttendanceRecord, AttendanceStatus, EventType, MatchId, PlayerId, ScorekeeperId, TeamId,
        validator::{DEFAULT_MAX_MINUTE, MIN_MINUTE},
    },
};

/// Attendance of one player as typed by a scorekeeper.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct AttendanceInput {
    /// Team the player plays for.
    pub team_id: TeamId,
    /// Player the line is about.
    pub player_id: PlayerId,
    /// How the player took part.
    pub status: AttendanceStatus,
    /// Ignored when the player is absent.
    #[serde(default)]
    #[validate(range(max = MAX_JERSEY_NUMBER))]
    pub jersey_number: Option<u16>,
}

/// Event as typed by a scorekeeper.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct EventInput {
    /// Team credited with the event.
    pub team_id: TeamId,
    /// Player involved.
    pub player_id: PlayerId,
    /// What happened.
    pub kind: EventType,
    /// Match minute.
    #[validate(range(min = MIN_MINUTE, max = DEFAULT_MAX_MINUTE))]
    pub minute: i32,
}

/// Acknowledgement of a recorded event, carrying the id used to edit it.
#[derive(Debug, Serialize, ToSchema)]
pub struct RecordedEventResponse {
    /// Always `true`.
    pub success: bool,
    /// Human-readable acknowledgement.
    pub message: String,
    /// Handle for later edits or deletion.
    pub event_id: Uuid,
}

/// Event of a draft with its edit handle.
#[derive(Debug, Serialize, ToSchema)]
pub struct DraftEventView {
    /// Edit handle.
    pub id: Uuid,
    /// Team credited with the event.
    pub team_id: TeamId,
    /// Player involved.
    pub player_id: PlayerId,
    /// What happened.
    pub kind: EventType,
    /// Match minute.
    pub minute: i32,
    /// RFC 3339 timestamp of the last edit.
    pub recorded_at: String,
}

impl From<EventDraftEntity> for DraftEventView {
    fn from(value: EventDraftEntity) -> Self {
        Self {
            id: value.id,
            team_id: value.record.team_id,
            player_id: value.record.player_id,
            kind: value.record.kind,
            minute: value.record.minute,
            recorded_at: format_system_time(value.recorded_at),
        }
    }
}

/// A scorekeeper's own draft.
#[derive(Debug, Serialize, ToSchema)]
pub struct DraftView {
    /// Match the draft belongs to.
    pub match_id: MatchId,
    /// Owner of the draft.
    pub scorekeeper_id: ScorekeeperId,
    /// One line per player.
    pub attendance: Vec<AttendanceRecord>,
    /// Events in recording order.
    pub events: Vec<DraftEventView>,
    /// Whether the draft was handed in.
    pub submitted: bool,
    /// RFC 3339 timestamp of the last write.
    pub updated_at: String,
}

impl From<DraftEntity> for DraftView {
    fn from(value: DraftEntity) -> Self {
        Self {
            match_id: value.match_id,
            scorekeeper_id: value.scorekeeper_id,
            attendance: value.attendance,
            events: value.events.into_iter().map(Into::into).collect(),
            submitted: value.submitted,
            updated_at: format_system_time(value.updated_at),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn out_of_range_values_fail_validation() {
        let event = EventInput {
            team_id: 1,
            player_id: 9,
            kind: EventType::Goal,
            minute: 121,
        };
        assert!(event.validate().is_err());

        let attendance = AttendanceInput {
            team_id: 1,
            player_id: 9,
            status: AttendanceStatus::Present,
            jersey_number: Some(100),
        };
        assert!(attendance.validate().is_err());
    }

    #[test]
    fn boundary_values_pass_validation() {
        for minute in [0, 120] {
            let event = EventInput {
                team_id: 1,
                player_id: 9,
                kind: EventType::YellowCard,
                minute,
            };
            assert!(event.validate().is_ok());
        }
    }
}
