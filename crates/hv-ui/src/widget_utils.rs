//! Widget id helpers
//!
//! Several visuals and dropdowns are drawn in the same frame, so every
//! scroll area and popup is keyed by its owner.

use egui::{Id, ScrollArea};
use std::fmt::Display;

/// Id built from path components, e.g. `dropdown_product_list`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WidgetId {
    components: Vec<String>,
}

impl WidgetId {
    pub fn new(base: impl Display) -> Self {
        Self {
            components: vec![base.to_string()],
        }
    }

    pub fn with(mut self, component: impl Display) -> Self {
        self.components.push(component.to_string());
        self
    }

    pub fn build(&self) -> String {
        self.components.join("_")
    }

    pub fn id(&self) -> Id {
        Id::new(self.build())
    }
}

pub trait ScrollAreaExt {
    fn id_builder(self, builder: WidgetId) -> Self;
}

impl ScrollAreaExt for ScrollArea {
    fn id_builder(self, builder: WidgetId) -> Self {
        self.id_source(builder.build())
    }
}

/// Id of a part of one visual
pub fn visual_widget_id(visual: impl Display, part: &str) -> WidgetId {
    WidgetId::new("visual").with(visual).with(part)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_widget_id_builder() {
        let id = WidgetId::new("dropdown").with("product").with("list").build();
        assert_eq!(id, "dropdown_product_list");
    }

    #[test]
    fn test_visual_widget_id() {
        let a = visual_widget_id(1, "minimap");
        let b = visual_widget_id(2, "minimap");
        assert_eq!(a.build(), "visual_1_minimap");
        assert_ne!(a.id(), b.id());
    }
}
