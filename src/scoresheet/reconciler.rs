//! Two-writer reconciliation of scorekeeper drafts.
//!
//! Each scorekeeper records attendance and events independently. The
//! reconciler lines both drafts up and tags every entry as agreed, conflicting
//! or single-sourced so that a reviewer can adjudicate the differences.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::scoresheet::records::{
    AttendanceRecord, EventIdentity, EventRecord, EventType, PlayerId, ResolvedView,
    ScorekeeperDraft, TeamId,
};

/// Where the value of a reconciled entry comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum EntrySource {
    /// Both drafts hold the same value.
    Agreed,
    /// Both drafts hold a value but they differ.
    Conflict,
    /// Only scorekeeper A recorded the entry.
    OnlyA,
    /// Only scorekeeper B recorded the entry.
    OnlyB,
}

/// Stable identity of a reconciled entry, used by reviewers to record choices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(tag = "entry", rename_all = "snake_case")]
pub enum EntryKey {
    /// Attendance entries are keyed by player.
    Attendance {
        /// Player the attendance belongs to.
        player_id: PlayerId,
    },
    /// Events are keyed by their value tuple plus the occurrence index of that
    /// tuple, so two identical goals in the same minute stay distinct.
    Event {
        /// Team credited with the event.
        team_id: TeamId,
        /// Player involved in the event.
        player_id: PlayerId,
        /// Type of event.
        kind: EventType,
        /// Minute of the event.
        minute: i32,
        /// Zero-based index among events sharing the same tuple.
        occurrence: u32,
    },
}

impl EntryKey {
    fn event(identity: EventIdentity, occurrence: u32) -> Self {
        EntryKey::Event {
            team_id: identity.team_id,
            player_id: identity.player_id,
            kind: identity.kind,
            minute: identity.minute,
            occurrence,
        }
    }
}

/// Candidate values for an entry, tagged by how the two drafts relate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Candidates<T> {
    /// Both drafts hold the same value.
    Agreed(T),
    /// Both drafts hold the entry with different values.
    Conflict { a: T, b: T },
    /// Only scorekeeper A recorded the entry.
    OnlyA(T),
    /// Only scorekeeper B recorded the entry.
    OnlyB(T),
}

impl<T> Candidates<T> {
    /// How the two drafts relate for this entry.
    pub fn source(&self) -> EntrySource {
        match self {
            Candidates::Agreed(_) => EntrySource::Agreed,
            Candidates::Conflict { .. } => EntrySource::Conflict,
            Candidates::OnlyA(_) => EntrySource::OnlyA,
            Candidates::OnlyB(_) => EntrySource::OnlyB,
        }
    }

    /// Value recorded by scorekeeper A, if any.
    pub fn value_from_a(&self) -> Option<&T> {
        match self {
            Candidates::Agreed(value) | Candidates::OnlyA(value) => Some(value),
            Candidates::Conflict { a, .. } => Some(a),
            Candidates::OnlyB(_) => None,
        }
    }

    /// Value recorded by scorekeeper B, if any. Agreed entries report the
    /// shared value for both sides.
    pub fn value_from_b(&self) -> Option<&T> {
        match self {
            Candidates::Agreed(value) | Candidates::OnlyB(value) => Some(value),
            Candidates::Conflict { b, .. } => Some(b),
            Candidates::OnlyA(_) => None,
        }
    }
}

/// One line of the reconciled sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconciledEntry<T> {
    /// Stable identifier reviewers refer to.
    pub key: EntryKey,
    /// Values from each draft.
    pub candidates: Candidates<T>,
}

impl<T> ReconciledEntry<T> {
    /// How the two drafts relate for this entry.
    pub fn source(&self) -> EntrySource {
        self.candidates.source()
    }

    /// Whether both drafts hold the same value.
    pub fn is_agreed(&self) -> bool {
        matches!(self.candidates, Candidates::Agreed(_))
    }

    /// Value recorded by scorekeeper A, if any.
    pub fn value_from_a(&self) -> Option<&T> {
        self.candidates.value_from_a()
    }

    /// Value recorded by scorekeeper B, if any.
    pub fn value_from_b(&self) -> Option<&T> {
        self.candidates.value_from_b()
    }
}

/// Unified view of both drafts. Transient: computed per request, never stored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reconciliation {
    /// Attendance lines in first-seen player order.
    pub attendance: Vec<ReconciledEntry<AttendanceRecord>>,
    /// Event lines, A's events first, then those only B recorded.
    pub events: Vec<ReconciledEntry<EventRecord>>,
}

impl Reconciliation {
    /// True as soon as any entry is not agreed.
    pub fn has_differences(&self) -> bool {
        self.attendance.iter().any(|entry| !entry.is_agreed())
            || self.events.iter().any(|entry| !entry.is_agreed())
    }

    /// Source classification of the entry identified by `key`.
    pub fn source_of(&self, key: &EntryKey) -> Option<EntrySource> {
        match key {
            EntryKey::Attendance { .. } => self
                .attendance
                .iter()
                .find(|entry| &entry.key == key)
                .map(ReconciledEntry::source),
            EntryKey::Event { .. } => self
                .events
                .iter()
                .find(|entry| &entry.key == key)
                .map(ReconciledEntry::source),
        }
    }

    /// Keys of every entry that needs a reviewer decision.
    pub fn pending_keys(&self) -> impl Iterator<Item = EntryKey> + '_ {
        let attendance = self
            .attendance
            .iter()
            .filter(|entry| !entry.is_agreed())
            .map(|entry| entry.key);
        let events = self
            .events
            .iter()
            .filter(|entry| !entry.is_agreed())
            .map(|entry| entry.key);
        attendance.chain(events)
    }

    /// Baseline view holding only the agreed entries.
    pub fn agreed_view(&self) -> ResolvedView {
        ResolvedView {
            attendance: agreed_values(&self.attendance),
            events: agreed_values(&self.events),
        }
    }
}

fn agreed_values<T: Clone>(entries: &[ReconciledEntry<T>]) -> Vec<T> {
    entries
        .iter()
        .filter_map(|entry| match &entry.candidates {
            Candidates::Agreed(value) => Some(value.clone()),
            _ => None,
        })
        .collect()
}

/// Reconcile the drafts of scorekeeper A and scorekeeper B.
///
/// Attendance is matched per player: equal status and jersey number is an
/// agreement, anything else recorded by both is a conflict. Events are matched
/// on the exact `(team, player, type, minute)` tuple as a multiset, so they are
/// either agreed or single-sourced, never conflicting.
///
/// Entries keep first-seen order: A's entries in A's order, then entries only
/// B recorded in B's order.
pub fn reconcile(a: &ScorekeeperDraft, b: &ScorekeeperDraft) -> Reconciliation {
    Reconciliation {
        attendance: reconcile_attendance(&a.attendance, &b.attendance),
        events: reconcile_events(&a.events, &b.events),
    }
}

fn reconcile_attendance(
    a: &[AttendanceRecord],
    b: &[AttendanceRecord],
) -> Vec<ReconciledEntry<AttendanceRecord>> {
    type Pair = (Option<AttendanceRecord>, Option<AttendanceRecord>);
    let mut players: IndexMap<PlayerId, Pair> = IndexMap::new();

    // A repeated player inside one draft keeps the last record.
    for record in a {
        players.entry(record.player_id).or_default().0 = Some(record.clone().normalized());
    }
    for record in b {
        players.entry(record.player_id).or_default().1 = Some(record.clone().normalized());
    }

    players
        .into_iter()
        .filter_map(|(player_id, pair)| {
            let candidates = match pair {
                (Some(a), Some(b)) if a.same_sheet_values(&b) => Candidates::Agreed(a),
                (Some(a), Some(b)) => Candidates::Conflict { a, b },
                (Some(a), None) => Candidates::OnlyA(a),
                (None, Some(b)) => Candidates::OnlyB(b),
                (None, None) => return None,
            };
            Some(ReconciledEntry {
                key: EntryKey::Attendance { player_id },
                candidates,
            })
        })
        .collect()
}

fn reconcile_events(a: &[EventRecord], b: &[EventRecord]) -> Vec<ReconciledEntry<EventRecord>> {
    let mut groups: IndexMap<EventIdentity, (Vec<&EventRecord>, Vec<&EventRecord>)> =
        IndexMap::new();

    for event in a {
        groups.entry(event.identity()).or_default().0.push(event);
    }
    for event in b {
        groups.entry(event.identity()).or_default().1.push(event);
    }

    let mut entries = Vec::new();
    for (identity, (from_a, from_b)) in groups {
        let occurrences = from_a.len().max(from_b.len());
        for occurrence in 0..occurrences {
            let candidates = match (from_a.get(occurrence), from_b.get(occurrence)) {
                (Some(a), Some(_)) => Candidates::Agreed((*a).clone()),
                (Some(a), None) => Candidates::OnlyA((*a).clone()),
                (None, Some(b)) => Candidates::OnlyB((*b).clone()),
                (None, None) => continue,
            };
            entries.push(ReconciledEntry {
                key: EntryKey::event(identity, occurrence as u32),
                candidates,
            });
        }
    }

    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoresheet::records::AttendanceStatus;

    fn attendance(player_id: PlayerId, status: AttendanceStatus, jersey: Option<u16>) -> AttendanceRecord {
        AttendanceRecord {
            match_id: 1,
            team_id: 10,
            player_id,
            status,
            jersey_number: jersey,
        }
    }

    fn goal(player_id: PlayerId, minute: i32) -> EventRecord {
        EventRecord {
            match_id: 1,
            team_id: 10,
            player_id,
            kind: EventType::Goal,
            minute,
        }
    }

    #[test]
    fn identical_drafts_are_fully_agreed() {
        let draft = ScorekeeperDraft {
            attendance: vec![
                attendance(7, AttendanceStatus::Present, Some(10)),
                attendance(8, AttendanceStatus::Substitute, Some(12)),
                attendance(9, AttendanceStatus::Absent, None),
            ],
            events: vec![goal(7, 23), goal(7, 60)],
        };

        let reconciliation = reconcile(&draft, &draft.clone());

        assert!(!reconciliation.has_differences());
        assert!(
            reconciliation
                .attendance
                .iter()
                .all(|entry| entry.source() == EntrySource::Agreed)
        );
        assert!(
            reconciliation
                .events
                .iter()
                .all(|entry| entry.source() == EntrySource::Agreed)
        );
        assert_eq!(reconciliation.agreed_view().attendance, draft.attendance);
        assert_eq!(reconciliation.agreed_view().events, draft.events);
    }

    #[test]
    fn attendance_is_classified_per_player() {
        let a = ScorekeeperDraft {
            attendance: vec![
                attendance(7, AttendanceStatus::Present, Some(10)),
                attendance(9, AttendanceStatus::Present, Some(5)),
                attendance(11, AttendanceStatus::Present, Some(3)),
            ],
            events: vec![],
        };
        let b = ScorekeeperDraft {
            attendance: vec![
                attendance(7, AttendanceStatus::Present, Some(10)),
                attendance(9, AttendanceStatus::Absent, None),
                attendance(12, AttendanceStatus::Substitute, Some(4)),
            ],
            events: vec![],
        };

        let reconciliation = reconcile(&a, &b);
        let sources: Vec<_> = reconciliation
            .attendance
            .iter()
            .map(|entry| (entry.key, entry.source()))
            .collect();

        assert_eq!(
            sources,
            vec![
                (EntryKey::Attendance { player_id: 7 }, EntrySource::Agreed),
                (EntryKey::Attendance { player_id: 9 }, EntrySource::Conflict),
                (EntryKey::Attendance { player_id: 11 }, EntrySource::OnlyA),
                (EntryKey::Attendance { player_id: 12 }, EntrySource::OnlyB),
            ]
        );
        assert!(reconciliation.has_differences());

        let conflict = &reconciliation.attendance[1];
        assert_eq!(
            conflict.value_from_a().map(|r| r.status),
            Some(AttendanceStatus::Present)
        );
        assert_eq!(
            conflict.value_from_b().map(|r| r.status),
            Some(AttendanceStatus::Absent)
        );
        assert!(reconciliation.attendance[2].value_from_b().is_none());
        assert!(reconciliation.attendance[3].value_from_a().is_none());
    }

    #[test]
    fn jersey_difference_is_a_conflict() {
        let a = ScorekeeperDraft {
            attendance: vec![attendance(7, AttendanceStatus::Present, Some(10))],
            events: vec![],
        };
        let b = ScorekeeperDraft {
            attendance: vec![attendance(7, AttendanceStatus::Present, Some(11))],
            events: vec![],
        };

        let reconciliation = reconcile(&a, &b);
        assert_eq!(reconciliation.attendance[0].source(), EntrySource::Conflict);
    }

    #[test]
    fn absent_jersey_is_ignored_when_comparing() {
        let a = ScorekeeperDraft {
            attendance: vec![attendance(9, AttendanceStatus::Absent, Some(5))],
            events: vec![],
        };
        let b = ScorekeeperDraft {
            attendance: vec![attendance(9, AttendanceStatus::Absent, None)],
            events: vec![],
        };

        let reconciliation = reconcile(&a, &b);
        assert_eq!(reconciliation.attendance[0].source(), EntrySource::Agreed);
    }

    #[test]
    fn one_minute_discrepancy_yields_two_single_sourced_events() {
        let a = ScorekeeperDraft {
            attendance: vec![],
            events: vec![goal(7, 23)],
        };
        let b = ScorekeeperDraft {
            attendance: vec![],
            events: vec![goal(7, 24)],
        };

        let reconciliation = reconcile(&a, &b);
        let sources: Vec<_> = reconciliation.events.iter().map(|e| e.source()).collect();
        assert_eq!(sources, vec![EntrySource::OnlyA, EntrySource::OnlyB]);
    }

    #[test]
    fn repeated_events_are_matched_as_a_multiset() {
        let a = ScorekeeperDraft {
            attendance: vec![],
            events: vec![goal(7, 45), goal(7, 45)],
        };
        let b = ScorekeeperDraft {
            attendance: vec![],
            events: vec![goal(7, 45)],
        };

        let reconciliation = reconcile(&a, &b);
        assert_eq!(reconciliation.events.len(), 2);
        assert_eq!(reconciliation.events[0].source(), EntrySource::Agreed);
        assert_eq!(reconciliation.events[1].source(), EntrySource::OnlyA);
        assert_eq!(
            reconciliation.events[1].key,
            EntryKey::Event {
                team_id: 10,
                player_id: 7,
                kind: EventType::Goal,
                minute: 45,
                occurrence: 1,
            }
        );
    }

    #[test]
    fn empty_drafts_reconcile_to_nothing() {
        let reconciliation = reconcile(&ScorekeeperDraft::default(), &ScorekeeperDraft::default());
        assert!(reconciliation.attendance.is_empty());
        assert!(reconciliation.events.is_empty());
        assert!(!reconciliation.has_differences());
    }

    #[test]
    fn pending_keys_skip_agreed_entries() {
        let a = ScorekeeperDraft {
            attendance: vec![attendance(7, AttendanceStatus::Present, Some(10))],
            events: vec![goal(7, 23), goal(7, 50)],
        };
        let b = ScorekeeperDraft {
            attendance: vec![attendance(7, AttendanceStatus::Present, Some(10))],
            events: vec![goal(7, 23)],
        };

        let reconciliation = reconcile(&a, &b);
        let pending: Vec<_> = reconciliation.pending_keys().collect();
        assert_eq!(pending.len(), 1);
        assert_eq!(
            reconciliation.source_of(&pending[0]),
            Some(EntrySource::OnlyA)
        );
    }

    #[test]
    fn entry_keys_are_tagged_on_the_wire() {
        let key = EntryKey::Attendance { player_id: 9 };
        let json = serde_json::to_value(key).unwrap();
        assert_eq!(json, serde_json::json!({"entry": "attendance", "player_id": 9}));
    }
}
