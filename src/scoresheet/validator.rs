//! Rule checks run over the sheet a reviewer is about to approve.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::scoresheet::records::{EventRecord, PlayerId, ResolvedView, TeamId};

/// Earliest valid event minute.
pub const MIN_MINUTE: i32 = 0;
/// Latest valid event minute (regular time, extra time and stoppage).
pub const DEFAULT_MAX_MINUTE: i32 = 120;

/// Which players must not share a jersey number.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum JerseyScope {
    /// Every player of the match.
    #[default]
    Match,
    /// Players of the same team only.
    Team,
}

/// Tunables for the rule set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationRules {
    /// Highest minute accepted on an event.
    pub max_minute: i32,
    /// Where jersey numbers must be unique.
    pub jersey_scope: JerseyScope,
}

impl Default for ValidationRules {
    fn default() -> Self {
        Self {
            max_minute: DEFAULT_MAX_MINUTE,
            jersey_scope: JerseyScope::Match,
        }
    }
}

/// Rule that produced an issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    /// An event is attached to a player marked absent.
    AttendanceEventConflict,
    /// An event is attached to a player missing from the attendance list.
    MissingAttendance,
    /// Several playing players share a jersey number.
    DuplicateJersey,
    /// An event minute is out of bounds.
    InvalidMinute,
}

/// A problem that blocks finalization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ValidationIssue {
    /// Rule that fired.
    pub kind: IssueKind,
    /// Human-readable explanation.
    pub message: String,
    /// Player the issue is about, for single-player rules.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub player_id: Option<PlayerId>,
    /// Every player involved, for rules spanning several players.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub player_ids: Vec<PlayerId>,
    /// Offending event, for event rules.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event: Option<EventRecord>,
}

/// Run every rule over `view` and return the issues in rule order.
pub fn validate(view: &ResolvedView, rules: &ValidationRules) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();
    check_absent_players(view, &mut issues);
    check_missing_attendance(view, &mut issues);
    check_duplicate_jerseys(view, rules.jersey_scope, &mut issues);
    check_minutes(view, rules.max_minute, &mut issues);
    issues
}

fn check_absent_players(view: &ResolvedView, issues: &mut Vec<ValidationIssue>) {
    for event in &view.events {
        let Some(attendance) = view.attendance_of(event.player_id) else {
            continue;
        };
        if attendance.is_absent() {
            issues.push(ValidationIssue {
                kind: IssueKind::AttendanceEventConflict,
                message: format!(
                    "player {} is marked absent but has a {} at minute {}",
                    event.player_id,
                    event.kind.as_str(),
                    event.minute
                ),
                player_id: Some(event.player_id),
                player_ids: Vec::new(),
                event: Some(event.clone()),
            });
        }
    }
}

fn check_missing_attendance(view: &ResolvedView, issues: &mut Vec<ValidationIssue>) {
    for event in &view.events {
        if view.attendance_of(event.player_id).is_none() {
            issues.push(ValidationIssue {
                kind: IssueKind::MissingAttendance,
                message: format!(
                    "player {} has a {} at minute {} but no attendance entry",
                    event.player_id,
                    event.kind.as_str(),
                    event.minute
                ),
                player_id: Some(event.player_id),
                player_ids: Vec::new(),
                event: Some(event.clone()),
            });
        }
    }
}

fn check_duplicate_jerseys(
    view: &ResolvedView,
    scope: JerseyScope,
    issues: &mut Vec<ValidationIssue>,
) {
    let mut holders: IndexMap<(Option<TeamId>, u16), Vec<PlayerId>> = IndexMap::new();

    for record in view.attendance.iter().filter(|record| !record.is_absent()) {
        let Some(jersey) = record.jersey_number else {
            continue;
        };
        let team = match scope {
            JerseyScope::Match => None,
            JerseyScope::Team => Some(record.team_id),
        };
        holders
            .entry((team, jersey))
            .or_default()
            .push(record.player_id);
    }

    for ((team, jersey), mut players) in holders {
        if players.len() < 2 {
            continue;
        }
        players.sort_unstable();
        let listed = players
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        let message = match team {
            Some(team_id) => {
                format!("jersey #{jersey} is shared by players {listed} of team {team_id}")
            }
            None => format!("jersey #{jersey} is shared by players {listed}"),
        };
        issues.push(ValidationIssue {
            kind: IssueKind::DuplicateJersey,
            message,
            player_id: None,
            player_ids: players,
            event: None,
        });
    }
}

fn check_minutes(view: &ResolvedView, max_minute: i32, issues: &mut Vec<ValidationIssue>) {
    for event in &view.events {
        if !(MIN_MINUTE..=max_minute).contains(&event.minute) {
            issues.push(ValidationIssue {
                kind: IssueKind::InvalidMinute,
                message: format!(
                    "{} of player {} has minute {} outside [{MIN_MINUTE}, {max_minute}]",
                    event.kind.as_str(),
                    event.player_id,
                    event.minute
                ),
                player_id: Some(event.player_id),
                player_ids: Vec::new(),
                event: Some(event.clone()),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoresheet::records::{AttendanceRecord, AttendanceStatus, EventType};

    fn attendance(
        team_id: TeamId,
        player_id: PlayerId,
        status: AttendanceStatus,
        jersey: Option<u16>,
    ) -> AttendanceRecord {
        AttendanceRecord {
            match_id: 1,
            team_id,
            player_id,
            status,
            jersey_number: jersey,
        }
    }

    fn event(player_id: PlayerId, kind: EventType, minute: i32) -> EventRecord {
        EventRecord {
            match_id: 1,
            team_id: 10,
            player_id,
            kind,
            minute,
        }
    }

    #[test]
    fn clean_sheet_has_no_issues() {
        let view = ResolvedView {
            attendance: vec![
                attendance(10, 7, AttendanceStatus::Present, Some(10)),
                attendance(10, 9, AttendanceStatus::Present, Some(5)),
            ],
            events: vec![event(7, EventType::Goal, 23)],
        };
        assert!(validate(&view, &ValidationRules::default()).is_empty());
    }

    #[test]
    fn event_of_absent_player_is_reported_once_per_event() {
        let view = ResolvedView {
            attendance: vec![attendance(10, 9, AttendanceStatus::Absent, None)],
            events: vec![event(9, EventType::YellowCard, 30)],
        };

        let issues = validate(&view, &ValidationRules::default());
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].kind, IssueKind::AttendanceEventConflict);
        assert_eq!(issues[0].player_id, Some(9));
        assert_eq!(issues[0].event, Some(event(9, EventType::YellowCard, 30)));
    }

    #[test]
    fn substitute_may_have_events() {
        let view = ResolvedView {
            attendance: vec![attendance(10, 12, AttendanceStatus::Substitute, Some(14))],
            events: vec![event(12, EventType::Substitution, 60)],
        };
        assert!(validate(&view, &ValidationRules::default()).is_empty());
    }

    #[test]
    fn event_without_attendance_is_reported() {
        let view = ResolvedView {
            attendance: vec![],
            events: vec![event(7, EventType::Goal, 23)],
        };

        let issues = validate(&view, &ValidationRules::default());
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].kind, IssueKind::MissingAttendance);
    }

    #[test]
    fn shared_jersey_is_one_issue_listing_every_player() {
        let view = ResolvedView {
            attendance: vec![
                attendance(10, 12, AttendanceStatus::Present, Some(10)),
                attendance(11, 7, AttendanceStatus::Substitute, Some(10)),
                attendance(10, 3, AttendanceStatus::Absent, None),
                attendance(10, 4, AttendanceStatus::Present, None),
                attendance(10, 5, AttendanceStatus::Present, None),
            ],
            events: vec![],
        };

        let issues = validate(&view, &ValidationRules::default());
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].kind, IssueKind::DuplicateJersey);
        assert_eq!(issues[0].player_ids, vec![7, 12]);
    }

    #[test]
    fn absent_players_do_not_collide() {
        let view = ResolvedView {
            attendance: vec![
                attendance(10, 1, AttendanceStatus::Present, Some(9)),
                attendance(10, 2, AttendanceStatus::Absent, Some(9)),
            ],
            events: vec![],
        };
        assert!(validate(&view, &ValidationRules::default()).is_empty());
    }

    #[test]
    fn team_scope_allows_same_number_on_opposite_teams() {
        let view = ResolvedView {
            attendance: vec![
                attendance(10, 1, AttendanceStatus::Present, Some(9)),
                attendance(11, 2, AttendanceStatus::Present, Some(9)),
            ],
            events: vec![],
        };
        let rules = ValidationRules {
            jersey_scope: JerseyScope::Team,
            ..ValidationRules::default()
        };
        assert!(validate(&view, &rules).is_empty());
        assert_eq!(validate(&view, &ValidationRules::default()).len(), 1);
    }

    #[test]
    fn minutes_out_of_bounds_are_reported() {
        let view = ResolvedView {
            attendance: vec![attendance(10, 7, AttendanceStatus::Present, Some(10))],
            events: vec![
                event(7, EventType::Goal, -1),
                event(7, EventType::Goal, 0),
                event(7, EventType::Goal, 120),
                event(7, EventType::Goal, 121),
            ],
        };

        let issues = validate(&view, &ValidationRules::default());
        let minutes: Vec<_> = issues
            .iter()
            .filter(|issue| issue.kind == IssueKind::InvalidMinute)
            .filter_map(|issue| issue.event.as_ref().map(|e| e.minute))
            .collect();
        assert_eq!(minutes, vec![-1, 121]);
    }

    #[test]
    fn issues_come_out_in_rule_order() {
        let view = ResolvedView {
            attendance: vec![
                attendance(10, 9, AttendanceStatus::Absent, None),
                attendance(10, 1, AttendanceStatus::Present, Some(4)),
                attendance(10, 2, AttendanceStatus::Present, Some(4)),
            ],
            events: vec![
                event(1, EventType::Goal, 130),
                event(8, EventType::Goal, 10),
                event(9, EventType::RedCard, 50),
            ],
        };

        let kinds: Vec<_> = validate(&view, &ValidationRules::default())
            .into_iter()
            .map(|issue| issue.kind)
            .collect();
        assert_eq!(
            kinds,
            vec![
                IssueKind::AttendanceEventConflict,
                IssueKind::MissingAttendance,
                IssueKind::DuplicateJersey,
                IssueKind::InvalidMinute,
            ]
        );
    }
}
