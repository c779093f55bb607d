use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Identifier of a match row in the league database.
pub type MatchId = i64;
/// Identifier of a team row in the league database.
pub type TeamId = i64;
/// Identifier of a player row in the league database.
pub type PlayerId = i64;
/// Identifier of the user acting as scorekeeper.
pub type ScorekeeperId = i64;

/// Attendance status recorded for a player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum AttendanceStatus {
    /// Player started the match.
    Present,
    /// Player did not show up.
    Absent,
    /// Player was on the bench.
    Substitute,
}

/// Kind of event recorded during a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    /// A goal scored by the player.
    Goal,
    /// A yellow card shown to the player.
    YellowCard,
    /// A red card shown to the player.
    RedCard,
    /// The player came on as a substitute.
    Substitution,
    /// Anything else worth noting on the sheet.
    Other,
}

impl EventType {
    /// Wire name of the event type, used in validation messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::Goal => "goal",
            EventType::YellowCard => "yellow_card",
            EventType::RedCard => "red_card",
            EventType::Substitution => "substitution",
            EventType::Other => "other",
        }
    }
}

/// Attendance of a single player for a match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct AttendanceRecord {
    /// Match the player was recorded for.
    pub match_id: MatchId,
    /// Team the player played for.
    pub team_id: TeamId,
    /// Player the line is about.
    pub player_id: PlayerId,
    /// How the player took part.
    pub status: AttendanceStatus,
    /// Only meaningful when the player is not absent.
    #[serde(default)]
    pub jersey_number: Option<u16>,
}

impl AttendanceRecord {
    /// Two drafts agree on a player when both the status and the jersey match.
    pub fn same_sheet_values(&self, other: &AttendanceRecord) -> bool {
        self.status == other.status && self.jersey_number == other.jersey_number
    }

    /// Drop the jersey number of an absent player.
    pub fn normalized(mut self) -> Self {
        if self.status == AttendanceStatus::Absent {
            self.jersey_number = None;
        }
        self
    }

    /// Whether the player took part in the match at all.
    pub fn is_absent(&self) -> bool {
        self.status == AttendanceStatus::Absent
    }
}

/// Value tuple used as the identity of an event across both drafts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EventIdentity {
    /// Team credited with the event.
    pub team_id: TeamId,
    /// Player involved.
    pub player_id: PlayerId,
    /// What happened.
    pub kind: EventType,
    /// Match minute.
    pub minute: i32,
}

/// Event recorded on the match sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct EventRecord {
    /// Match the event belongs to.
    pub match_id: MatchId,
    /// Team credited with the event.
    pub team_id: TeamId,
    /// Player involved.
    pub player_id: PlayerId,
    /// What happened.
    pub kind: EventType,
    /// Match minute; writes are range checked, stored values are re-checked on review.
    pub minute: i32,
}

impl EventRecord {
    /// Identity tuple `(team, player, type, minute)`.
    ///
    /// Two events are the same event if and only if every field of the tuple is
    /// equal. A one-minute discrepancy between scorekeepers yields two distinct
    /// events rather than a conflict.
    pub fn identity(&self) -> EventIdentity {
        EventIdentity {
            team_id: self.team_id,
            player_id: self.player_id,
            kind: self.kind,
            minute: self.minute,
        }
    }
}

/// Everything one scorekeeper recorded for a match.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ScorekeeperDraft {
    /// One line per player.
    pub attendance: Vec<AttendanceRecord>,
    /// Events in recording order.
    pub events: Vec<EventRecord>,
}

/// Both scorekeepers' drafts for one match. Scorekeeper A is the first one
/// assigned to the match, scorekeeper B the second.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchDrafts {
    /// Match both drafts belong to.
    pub match_id: MatchId,
    /// First assigned scorekeeper and their draft.
    pub scorekeeper_a: (ScorekeeperId, ScorekeeperDraft),
    /// Second assigned scorekeeper and their draft.
    pub scorekeeper_b: (ScorekeeperId, ScorekeeperDraft),
}

/// Attendance and events currently selected for the final sheet.
///
/// Built from the agreed entries plus whatever the reviewer picked so far.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ResolvedView {
    /// Attendance lines kept so far.
    pub attendance: Vec<AttendanceRecord>,
    /// Events kept so far.
    pub events: Vec<EventRecord>,
}

impl ResolvedView {
    /// Attendance entry for `player_id`, if the player is part of the view.
    pub fn attendance_of(&self, player_id: PlayerId) -> Option<&AttendanceRecord> {
        self.attendance
            .iter()
            .find(|record| record.player_id == player_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalized_drops_jersey_of_absent_player() {
        let record = AttendanceRecord {
            match_id: 1,
            team_id: 2,
            player_id: 9,
            status: AttendanceStatus::Absent,
            jersey_number: Some(5),
        };
        assert_eq!(record.normalized().jersey_number, None);
    }

    #[test]
    fn normalized_keeps_jersey_of_substitute() {
        let record = AttendanceRecord {
            match_id: 1,
            team_id: 2,
            player_id: 9,
            status: AttendanceStatus::Substitute,
            jersey_number: Some(14),
        };
        assert_eq!(record.normalized().jersey_number, Some(14));
    }

    #[test]
    fn sheet_values_ignore_team() {
        let a = AttendanceRecord {
            match_id: 1,
            team_id: 2,
            player_id: 7,
            status: AttendanceStatus::Present,
            jersey_number: Some(10),
        };
        let b = AttendanceRecord { team_id: 3, ..a.clone() };
        assert!(a.same_sheet_values(&b));
        let c = AttendanceRecord {
            jersey_number: Some(11),
            ..a.clone()
        };
        assert!(!a.same_sheet_values(&c));
    }

    #[test]
    fn event_types_use_snake_case_on_the_wire() {
        let json = serde_json::to_string(&EventType::YellowCard).unwrap();
        assert_eq!(json, "\"yellow_card\"");
        assert_eq!(EventType::RedCard.as_str(), "red_card");
    }
}
