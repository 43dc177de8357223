//! Visual binding layer
//!
//! Turns a hypercube plus a selection session into renderer-neutral scene
//! descriptors, and renderer interaction events back into selection calls.

mod binding;
mod config;
mod minimap;
mod options;
pub mod plot;
pub mod presets;
mod scene;

pub use binding::{PointerOutcome, RendererEvent, SelectionSummary, VisualBinding};
pub use config::{RenderPriority, VisualConfig};
pub use minimap::{MiniMapBar, MiniMapModel};
pub use options::{BarOptions, ChartOptions};
pub use plot::{MarkColors, ScenePlot, ScenePlotResponse};
pub use presets::{preset, ChartPreset, ChartType, MarkKind, Rgb};
pub use scene::{
    build_scene, size_hint, Mark, MarkStyle, ResolvedScale, SceneDescriptor, SceneInput, SizeHint,
};

use thiserror::Error;
use hv_core::SelectionError;
use hv_data::DataError;

/// Unique identifier for a visual
pub type VisualId = uuid::Uuid;

/// Errors raised while binding a visual
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ViewError {
    #[error(transparent)]
    Selection(#[from] SelectionError),

    #[error(transparent)]
    Data(#[from] DataError),

    #[error("visual has no chart type")]
    MissingSettings,

    #[error("unknown chart type: {0}")]
    UnknownChartType(String),

    #[error("invalid colour: {0}")]
    InvalidColor(String),

    #[error("configuration error: {0}")]
    Config(String),
}

impl ViewError {
    /// Whether the data session behind the visual is gone
    pub fn is_fatal(&self) -> bool {
        match self {
            ViewError::Selection(SelectionError::SessionClosed) => true,
            ViewError::Data(e) => e.is_fatal(),
            _ => false,
        }
    }
}

impl From<serde_json::Error> for ViewError {
    fn from(error: serde_json::Error) -> Self {
        ViewError::Config(error.to_string())
    }
}
