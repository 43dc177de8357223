//! Dropdown selector bound to a list object

use egui::{RichText, ScrollArea, Ui};
use serde::{Deserialize, Serialize};
use hv_core::{CellState, DataSession, ElementId, HypercubeLayout, HypercubePage, SelectionPath, SessionError};

use crate::theme::Theme;
use crate::widget_utils::{ScrollAreaExt, WidgetId};

/// Maximum height of the open list
const LIST_MAX_HEIGHT: f32 = 310.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DropdownOptions {
    pub multiple: bool,
    pub show_label: bool,
    pub show_search: bool,
    pub placeholder: Option<String>,
    /// Text of a synthetic row that clears the field's selections
    pub clear_selections_row: Option<String>,
}

impl Default for DropdownOptions {
    fn default() -> Self {
        Self {
            multiple: false,
            show_label: true,
            show_search: true,
            placeholder: None,
            clear_selections_row: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DropdownItem {
    pub elem: ElementId,
    pub label: String,
    pub state: CellState,
}

/// Display model built from a list object's layout and first page
#[derive(Debug, Clone, PartialEq)]
pub struct DropdownView {
    pub title: Option<String>,
    pub items: Vec<DropdownItem>,
    /// Current value: the first selected row, or all of them in multiple mode
    pub value: Vec<ElementId>,
    pub total: usize,
    pub selected_text: Option<String>,
}

impl DropdownView {
    pub fn new(layout: &HypercubeLayout, page: &HypercubePage, options: &DropdownOptions) -> Self {
        let items: Vec<DropdownItem> = page
            .rows
            .iter()
            .filter_map(|row| row.first())
            .map(|cell| DropdownItem {
                elem: cell.elem,
                label: cell.text.clone(),
                state: cell.state,
            })
            .collect();

        let selected: Vec<&DropdownItem> = items.iter().filter(|i| i.state == CellState::Selected).collect();
        let total = layout.total_rows();

        let (value, selected_text) = if options.multiple {
            let text = match selected.as_slice() {
                [only] => only.label.clone(),
                many => format!("{} of {} selected", many.len(), total),
            };
            (selected.iter().map(|i| i.elem).collect(), Some(text))
        } else {
            match selected.first() {
                Some(first) => (vec![first.elem], Some(first.label.clone())),
                None => (Vec::new(), None),
            }
        };

        Self {
            title: layout.primary_title().map(str::to_string),
            items,
            value,
            total,
            selected_text,
        }
    }

    /// Values to send when `elem` is chosen
    pub fn choose(&self, elem: ElementId, multiple: bool) -> Vec<ElementId> {
        if !multiple {
            return vec![elem];
        }
        let mut values = self.value.clone();
        match values.iter().position(|v| *v == elem) {
            Some(i) => {
                values.remove(i);
            }
            None => values.push(elem),
        }
        values
    }
}

/// User intent produced by [`Dropdown::ui`]
#[derive(Debug, Clone, PartialEq)]
pub enum DropdownAction {
    Open,
    Close,
    Select(Vec<ElementId>),
    Clear,
    Search(String),
}

impl DropdownAction {
    /// Forward the action to the list object's session
    pub async fn apply(&self, session: &dyn DataSession) -> Result<(), SessionError> {
        let path = SelectionPath::list_object();
        tracing::debug!("Dropdown {:?} on {}", self, session.session_name());
        match self {
            DropdownAction::Open => session.begin_selections(std::slice::from_ref(&path)).await,
            DropdownAction::Close => session.end_selections(true).await,
            DropdownAction::Select(values) => session.select(&path, values, false).await,
            DropdownAction::Clear => session.clear_selections(&path).await,
            DropdownAction::Search(text) => session.search(&path, text).await,
        }
    }
}

/// Dropdown widget state
#[derive(Debug, Clone)]
pub struct Dropdown {
    id: WidgetId,
    pub options: DropdownOptions,
    open: bool,
    search: String,
}

impl Dropdown {
    pub fn new(id: impl std::fmt::Display, options: DropdownOptions) -> Self {
        Self {
            id: WidgetId::new("dropdown").with(id),
            options,
            open: false,
            search: String::new(),
        }
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn ui(&mut self, ui: &mut Ui, view: &DropdownView, theme: &Theme) -> Vec<DropdownAction> {
        let mut actions = Vec::new();

        if self.options.show_label {
            if let Some(title) = &view.title {
                ui.label(RichText::new(title).strong().small());
            }
        }

        let text = view
            .selected_text
            .clone()
            .or_else(|| self.options.placeholder.clone())
            .unwrap_or_default();
        let arrow = if self.open { "⏶" } else { "⏷" };
        if ui.button(format!("{}  {}", text, arrow)).clicked() {
            self.open = !self.open;
            if self.open {
                actions.push(DropdownAction::Open);
            } else {
                self.search.clear();
                actions.push(DropdownAction::Close);
            }
        }

        if !self.open {
            return actions;
        }

        egui::Frame::popup(ui.style()).show(ui, |ui| {
            if self.options.show_search {
                ui.horizontal(|ui| {
                    ui.label("🔍");
                    if ui.text_edit_singleline(&mut self.search).changed() {
                        actions.push(DropdownAction::Search(self.search.clone()));
                    }
                });
            }

            if let Some(clear) = &self.options.clear_selections_row {
                if ui.selectable_label(false, clear.as_str()).clicked() {
                    actions.push(DropdownAction::Clear);
                }
                ui.separator();
            }

            ScrollArea::vertical()
                .id_builder(self.id.clone().with("list"))
                .max_height(LIST_MAX_HEIGHT)
                .show(ui, |ui| {
                    for item in &view.items {
                        let mut text = RichText::new(&item.label).small();
                        if let Some((background, foreground)) = theme.state_colors(item.state) {
                            text = text.background_color(background).color(foreground);
                        }
                        let label = if item.state == CellState::Selected {
                            ui.horizontal(|ui| {
                                let r = ui.selectable_label(true, text);
                                ui.label("✔");
                                r
                            })
                            .inner
                        } else {
                            ui.selectable_label(false, text)
                        };
                        if label.clicked() {
                            actions.push(DropdownAction::Select(view.choose(item.elem, self.options.multiple)));
                        }
                    }
                });
        });

        if !self.options.multiple && actions.iter().any(|a| matches!(a, DropdownAction::Select(_))) {
            self.open = false;
            self.search.clear();
            actions.push(DropdownAction::Close);
        }
        actions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hv_data::MemoryDocument;

    fn products() -> MemoryDocument {
        MemoryDocument::builder("dropdown")
            .field("Product", vec!["Tea".into(), "Coffee".into(), "Cocoa".into()])
            .measure("Units", vec![1.0, 2.0, 3.0])
            .build()
            .unwrap()
    }

    async fn view(list: &dyn DataSession, options: &DropdownOptions) -> DropdownView {
        let layout = list.get_layout().await.unwrap();
        let page = list.get_page(hv_core::PageRect::default()).await.unwrap();
        DropdownView::new(&layout, &page, options)
    }

    #[tokio::test]
    async fn test_single_mode_value_and_text() {
        let doc = products();
        let list = doc.list_object("Product").unwrap();
        let options = DropdownOptions::default();

        let empty = view(&list, &options).await;
        assert_eq!(empty.title.as_deref(), Some("Product"));
        assert_eq!(empty.items.len(), 3);
        assert!(empty.value.is_empty());
        assert_eq!(empty.selected_text, None);

        DropdownAction::Open.apply(&list).await.unwrap();
        DropdownAction::Select(vec![ElementId(1)]).apply(&list).await.unwrap();
        DropdownAction::Close.apply(&list).await.unwrap();

        let selected = view(&list, &options).await;
        assert_eq!(selected.value, vec![ElementId(1)]);
        assert_eq!(selected.selected_text.as_deref(), Some("Coffee"));
        assert_eq!(doc.selected_elements("Product"), vec![ElementId(1)]);
    }

    #[tokio::test]
    async fn test_multiple_mode_text() {
        let doc = products();
        let list = doc.list_object("Product").unwrap();
        let options = DropdownOptions { multiple: true, ..DropdownOptions::default() };

        assert_eq!(view(&list, &options).await.selected_text.as_deref(), Some("0 of 3 selected"));

        DropdownAction::Select(vec![ElementId(0), ElementId(2)]).apply(&list).await.unwrap();
        let view = view(&list, &options).await;
        assert_eq!(view.value, vec![ElementId(0), ElementId(2)]);
        assert_eq!(view.selected_text.as_deref(), Some("2 of 3 selected"));
        assert_eq!(view.choose(ElementId(2), true), vec![ElementId(0)]);
        assert_eq!(view.choose(ElementId(1), true), vec![ElementId(0), ElementId(2), ElementId(1)]);
        assert_eq!(view.choose(ElementId(1), false), vec![ElementId(1)]);
    }

    #[tokio::test]
    async fn test_clear_row_clears_confirmed_selection() {
        let doc = products();
        let list = doc.list_object("Product").unwrap();

        DropdownAction::Select(vec![ElementId(0)]).apply(&list).await.unwrap();
        DropdownAction::Clear.apply(&list).await.unwrap();

        assert!(doc.selected_elements("Product").is_empty());
    }

    #[tokio::test]
    async fn test_search_filters_items() {
        let doc = products();
        let list = doc.list_object("Product").unwrap();

        DropdownAction::Search("co".into()).apply(&list).await.unwrap();
        let labels: Vec<String> = view(&list, &DropdownOptions::default())
            .await
            .items
            .into_iter()
            .map(|i| i.label)
            .collect();
        assert_eq!(labels, vec!["Coffee", "Cocoa"]);

        DropdownAction::Search(String::new()).apply(&list).await.unwrap();
        assert_eq!(view(&list, &DropdownOptions::default()).await.items.len(), 3);
    }

    #[test]
    fn test_options_defaults_from_json() {
        let options: DropdownOptions =
            serde_json::from_str(r#"{ "multiple": true, "clear_selections_row": "Clear" }"#).unwrap();
        assert!(options.multiple);
        assert!(options.show_search);
        assert_eq!(options.clear_selections_row.as_deref(), Some("Clear"));
    }
}
