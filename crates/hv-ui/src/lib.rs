//! egui presentation for hypercube visuals
//!
//! Stateless display of selection state: the confirm/cancel toolbar, the
//! list-object dropdown and the light theme.

pub mod dropdown;
pub mod theme;
pub mod toolbar;
pub mod widget_utils;

pub use dropdown::{Dropdown, DropdownAction, DropdownItem, DropdownOptions, DropdownView};
pub use theme::{apply_theme, Palette, Swatch, Theme};
pub use toolbar::{SelectionToolbar, ToolbarAction, ToolbarView};
pub use widget_utils::{visual_widget_id, ScrollAreaExt, WidgetId};
