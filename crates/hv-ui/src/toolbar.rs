//! Confirm / cancel bar shown while a selection is being edited

use egui::{RichText, Ui};
use hv_core::SelectionSessionState;

use crate::theme::Theme;

/// What the user pressed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolbarAction {
    Confirm,
    Cancel,
}

/// Display model of the toolbar
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ToolbarView {
    pub visible: bool,
    pub text: String,
    pub error: Option<String>,
}

impl ToolbarView {
    pub fn new(
        state: SelectionSessionState,
        count: usize,
        first_label: Option<&str>,
        error: Option<&str>,
    ) -> Self {
        let text = match (count, first_label) {
            (0, _) => "No values selected".to_string(),
            (1, Some(label)) => label.to_string(),
            (n, _) => format!("{} selected", n),
        };
        Self {
            visible: state == SelectionSessionState::Active,
            text,
            error: error.map(str::to_string),
        }
    }
}

/// Selection toolbar widget
#[derive(Debug, Clone)]
pub struct SelectionToolbar {
    pub confirm_label: String,
    pub cancel_label: String,
}

impl Default for SelectionToolbar {
    fn default() -> Self {
        Self {
            confirm_label: "✔ Confirm".to_string(),
            cancel_label: "✖ Cancel".to_string(),
        }
    }
}

impl SelectionToolbar {
    /// Draw the bar; nothing is drawn unless a session is active
    pub fn ui(&self, ui: &mut Ui, view: &ToolbarView, theme: &Theme) -> Option<ToolbarAction> {
        if !view.visible {
            return None;
        }

        let mut action = None;
        ui.horizontal(|ui| {
            ui.label(RichText::new(&view.text).small());
            if let Some(error) = &view.error {
                ui.label(RichText::new(error).small().color(theme.palette.error.main));
            }
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                if ui.button(&self.cancel_label).clicked() {
                    action = Some(ToolbarAction::Cancel);
                }
                let confirm = egui::Button::new(RichText::new(&self.confirm_label).color(egui::Color32::WHITE))
                    .fill(theme.palette.success.main);
                if ui.add(confirm).clicked() {
                    action = Some(ToolbarAction::Confirm);
                }
            });
        });
        action
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_visible_only_while_active() {
        for state in [
            SelectionSessionState::Idle,
            SelectionSessionState::Committing,
            SelectionSessionState::Cancelling,
        ] {
            assert!(!ToolbarView::new(state, 1, None, None).visible, "{}", state);
        }
        assert!(ToolbarView::new(SelectionSessionState::Active, 0, None, None).visible);
    }

    #[test]
    fn test_summary_text() {
        let active = SelectionSessionState::Active;
        assert_eq!(ToolbarView::new(active, 0, None, None).text, "No values selected");
        assert_eq!(ToolbarView::new(active, 1, Some("North"), None).text, "North");
        assert_eq!(ToolbarView::new(active, 1, None, None).text, "1 selected");
        assert_eq!(ToolbarView::new(active, 3, Some("North"), None).text, "3 selected");

        let failed = ToolbarView::new(active, 1, Some("North"), Some("timed out"));
        assert_eq!(failed.error.as_deref(), Some("timed out"));
    }
}
