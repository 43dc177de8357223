//! Selection sessions
//!
//! A selection session is the interactive, not yet confirmed set of values the
//! user brushes on one visual. [`SelectionCoordinator`] owns its lifecycle.

mod coordinator;
mod error;

pub use coordinator::{CancelOutcome, CommitOutcome, OutsideClickOutcome, SelectionCoordinator};
pub use error::SelectionError;

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::hypercube::ElementId;

/// Lifecycle state of a visual's selection session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SelectionSessionState {
    #[default]
    Idle,
    Active,
    /// A commit was sent and is awaiting acknowledgement
    Committing,
    /// A revert was sent and is awaiting acknowledgement
    Cancelling,
}

impl fmt::Display for SelectionSessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SelectionSessionState::Idle => "idle",
            SelectionSessionState::Active => "active",
            SelectionSessionState::Committing => "committing",
            SelectionSessionState::Cancelling => "cancelling",
        };
        f.write_str(name)
    }
}

impl SelectionSessionState {
    /// Anything but idle
    pub fn is_open(self) -> bool {
        self != SelectionSessionState::Idle
    }
}

/// Element ids toggled since the session began. Toggling twice is a no-op.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PendingSelection {
    elements: IndexSet<ElementId>,
}

impl PendingSelection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flip membership of `elem`. Returns true if it is now pending.
    pub fn toggle(&mut self, elem: ElementId) -> bool {
        if self.elements.shift_remove(&elem) {
            false
        } else {
            self.elements.insert(elem);
            true
        }
    }

    /// Apply every toggle recorded in `other` on top of this set
    pub fn apply(&mut self, other: &PendingSelection) {
        for elem in other.iter() {
            self.toggle(elem);
        }
    }

    pub fn contains(&self, elem: ElementId) -> bool {
        self.elements.contains(&elem)
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn clear(&mut self) {
        self.elements.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = ElementId> + '_ {
        self.elements.iter().copied()
    }

    pub fn to_vec(&self) -> Vec<ElementId> {
        self.iter().collect()
    }
}

impl FromIterator<ElementId> for PendingSelection {
    fn from_iter<I: IntoIterator<Item = ElementId>>(iter: I) -> Self {
        let mut selection = PendingSelection::new();
        for elem in iter {
            selection.toggle(elem);
        }
        selection
    }
}

/// Read-only view of a coordinator for presentation
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SelectionSnapshot {
    pub state: SelectionSessionState,
    /// Selection the user is currently editing
    pub pending: Vec<ElementId>,
    /// Selection sent with an unacknowledged commit
    pub in_flight: Vec<ElementId>,
    /// Last transport failure, cleared by the next successful round-trip
    pub last_error: Option<String>,
}

impl SelectionSnapshot {
    pub fn is_dirty(&self) -> bool {
        self.state == SelectionSessionState::Active && !self.pending.is_empty()
    }

    /// Whether `elem` is part of the visible, not yet confirmed selection
    pub fn is_pending(&self, elem: ElementId) -> bool {
        self.pending.contains(&elem) || self.in_flight.contains(&elem)
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty() || !self.in_flight.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggle_twice_is_noop() {
        let mut pending: PendingSelection = [ElementId(4)].into_iter().collect();
        let before = pending.clone();

        assert!(pending.toggle(ElementId(9)));
        assert!(!pending.toggle(ElementId(9)));
        assert_eq!(pending, before);
    }

    #[test]
    fn test_apply_replays_toggles() {
        let mut base: PendingSelection = [ElementId(1), ElementId(2)].into_iter().collect();
        let later: PendingSelection = [ElementId(2), ElementId(3)].into_iter().collect();

        base.apply(&later);
        assert_eq!(base.to_vec(), vec![ElementId(1), ElementId(3)]);
    }
}
