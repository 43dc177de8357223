//! Core functionality for hypercube-backed visuals
//!
//! This crate provides the data session abstraction, the hypercube data
//! model and the selection session coordinator shared by every visual.

pub mod events;
pub mod hypercube;
pub mod pointer;
pub mod selection;
pub mod session;

// Re-export commonly used types
pub use events::EventBus;
pub use hypercube::{
    Cell, CellState, CubeSize, DimensionInfo, ElementId, HypercubeLayout, HypercubePage,
    MeasureInfo, PageRect,
};
pub use pointer::{Bounds, PointerEvent, PointerHub, PointerSubscription};
pub use selection::{
    CancelOutcome, CommitOutcome, OutsideClickOutcome, PendingSelection, SelectionCoordinator,
    SelectionError, SelectionSessionState, SelectionSnapshot,
};
pub use session::{DataSession, SelectionPath, SessionError};
