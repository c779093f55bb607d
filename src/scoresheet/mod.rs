//! Match sheet reconciliation core: pure, synchronous computations over
//! already-fetched scorekeeper drafts.

/// Two-draft reconciliation.
pub mod reconciler;
/// Attendance and event records.
pub mod records;
/// Reviewer choices over a reconciliation.
pub mod resolution;
/// Rules blocking finalization.
pub mod validator;

pub use reconciler::{Candidates, EntryKey, EntrySource, ReconciledEntry, Reconciliation, reconcile};
pub use records::{
    AttendanceRecord, AttendanceStatus, EventRecord, EventType, MatchDrafts, MatchId, PlayerId,
    ResolvedView, ScorekeeperDraft, ScorekeeperId, TeamId,
};
pub use resolution::{Choice, Resolution, ResolutionError, ResolutionSet};
pub use validator::{IssueKind, JerseyScope, ValidationIssue, ValidationRules, validate};
