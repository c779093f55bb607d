//! Reviewer decisions over a reconciliation.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

use crate::scoresheet::{
    reconciler::{EntryKey, EntrySource, ReconciledEntry, Reconciliation},
    records::ResolvedView,
};

/// Decision a reviewer can record for a non-agreed entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Choice {
    /// Keep scorekeeper A's value.
    UseA,
    /// Keep scorekeeper B's value.
    UseB,
    /// Keep neither value.
    Discard,
}

/// Effective resolution of an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Resolution {
    /// Both drafts agree, no choice needed.
    Agreed,
    /// Reviewer picked scorekeeper A's value.
    UseA,
    /// Reviewer picked scorekeeper B's value.
    UseB,
    /// Reviewer dropped the entry.
    Discard,
    /// No choice recorded yet.
    Unresolved,
}

impl From<Choice> for Resolution {
    fn from(choice: Choice) -> Self {
        match choice {
            Choice::UseA => Resolution::UseA,
            Choice::UseB => Resolution::UseB,
            Choice::Discard => Resolution::Discard,
        }
    }
}

/// Reasons a choice cannot be recorded.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolutionError {
    /// The key matches no reconciled entry.
    #[error("entry {0:?} is not part of the reconciliation")]
    UnknownEntry(EntryKey),
    /// Both drafts agree, so there is nothing to choose.
    #[error("entry {0:?} is agreed and needs no choice")]
    AgreedEntry(EntryKey),
    /// The chosen side never recorded the entry.
    #[error("entry {key:?} has no value from scorekeeper {side}")]
    MissingSource { key: EntryKey, side: &'static str },
}

/// Choices recorded so far, in the order the reviewer made them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolutionSet {
    choices: IndexMap<EntryKey, Choice>,
}

impl ResolutionSet {
    /// Empty set: only agreed entries make it into the working view.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a set from a batch of choices, stopping at the first invalid one.
    pub fn from_choices<I>(reconciliation: &Reconciliation, choices: I) -> Result<Self, ResolutionError>
    where
        I: IntoIterator<Item = (EntryKey, Choice)>,
    {
        let mut set = Self::new();
        for (key, choice) in choices {
            set.select(reconciliation, key, choice)?;
        }
        Ok(set)
    }

    /// Record `choice` for the entry identified by `key`, replacing any earlier choice.
    pub fn select(
        &mut self,
        reconciliation: &Reconciliation,
        key: EntryKey,
        choice: Choice,
    ) -> Result<(), ResolutionError> {
        let source = reconciliation
            .source_of(&key)
            .ok_or(ResolutionError::UnknownEntry(key))?;

        match (source, choice) {
            (EntrySource::Agreed, _) => Err(ResolutionError::AgreedEntry(key)),
            (EntrySource::OnlyB, Choice::UseA) => {
                Err(ResolutionError::MissingSource { key, side: "A" })
            }
            (EntrySource::OnlyA, Choice::UseB) => {
                Err(ResolutionError::MissingSource { key, side: "B" })
            }
            _ => {
                self.choices.insert(key, choice);
                Ok(())
            }
        }
    }

    /// Forget every choice.
    pub fn clear(&mut self) {
        self.choices.clear();
    }

    /// Choice recorded for `key`, if any.
    pub fn choice(&self, key: &EntryKey) -> Option<Choice> {
        self.choices.get(key).copied()
    }

    /// Number of recorded choices.
    pub fn len(&self) -> usize {
        self.choices.len()
    }

    /// Whether no choice has been recorded.
    pub fn is_empty(&self) -> bool {
        self.choices.is_empty()
    }

    /// Effective resolution of `entry` given the choices so far.
    pub fn resolution_for<T>(&self, entry: &ReconciledEntry<T>) -> Resolution {
        if entry.is_agreed() {
            return Resolution::Agreed;
        }
        self.choice(&entry.key)
            .map(Resolution::from)
            .unwrap_or(Resolution::Unresolved)
    }

    /// Keys of non-agreed entries still lacking a choice.
    pub fn unresolved(&self, reconciliation: &Reconciliation) -> Vec<EntryKey> {
        reconciliation
            .pending_keys()
            .filter(|key| !self.choices.contains_key(key))
            .collect()
    }

    /// Whether any non-agreed entry still lacks a choice.
    pub fn has_unresolved_conflicts(&self, reconciliation: &Reconciliation) -> bool {
        reconciliation
            .pending_keys()
            .any(|key| !self.choices.contains_key(&key))
    }

    /// Agreed values plus the values picked so far. Unresolved and discarded
    /// entries are left out.
    pub fn working_view(&self, reconciliation: &Reconciliation) -> ResolvedView {
        ResolvedView {
            attendance: self.selected_values(&reconciliation.attendance),
            events: self.selected_values(&reconciliation.events),
        }
    }

    fn selected_values<T: Clone>(&self, entries: &[ReconciledEntry<T>]) -> Vec<T> {
        entries
            .iter()
            .filter_map(|entry| match self.resolution_for(entry) {
                Resolution::Agreed | Resolution::UseA => entry.value_from_a().cloned(),
                Resolution::UseB => entry.value_from_b().cloned(),
                Resolution::Discard | Resolution::Unresolved => None,
            })
            .collect()
    }
}
