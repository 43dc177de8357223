use serde::{Deserialize, Serialize};

/// Selection state the engine assigns to a cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CellState {
    /// Explicitly selected
    Selected,
    /// Excluded by selections in other fields
    Excluded,
    /// Selectable, not selected, in a field that has selections
    Alternative,
    /// No selection applies
    Normal,
    /// Selected, but excluded by a selection in another field
    SelectedExcluded,
    /// Locked selection
    Locked,
}

impl CellState {
    /// Parse the engine's state code
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "S" => Some(CellState::Selected),
            "X" => Some(CellState::Excluded),
            "A" => Some(CellState::Alternative),
            "O" => Some(CellState::Normal),
            "XS" => Some(CellState::SelectedExcluded),
            "L" => Some(CellState::Locked),
            _ => None,
        }
    }

    /// The engine's state code
    pub fn code(self) -> &'static str {
        match self {
            CellState::Selected => "S",
            CellState::Excluded => "X",
            CellState::Alternative => "A",
            CellState::Normal => "O",
            CellState::SelectedExcluded => "XS",
            CellState::Locked => "L",
        }
    }

    pub fn is_selected(self) -> bool {
        matches!(self, CellState::Selected | CellState::Locked)
    }

    pub fn is_excluded(self) -> bool {
        matches!(self, CellState::Excluded | CellState::SelectedExcluded)
    }
}

impl Default for CellState {
    fn default() -> Self {
        CellState::Normal
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_codes() {
        for code in ["S", "X", "A", "O", "XS", "L"] {
            let state = CellState::from_code(code).unwrap();
            assert_eq!(state.code(), code);
        }
        assert_eq!(CellState::from_code("Q"), None);
    }

    #[test]
    fn test_selected_excluded_counts_as_excluded() {
        assert!(CellState::SelectedExcluded.is_excluded());
        assert!(!CellState::SelectedExcluded.is_selected());
        assert!(CellState::Locked.is_selected());
    }
}
