//! Data access for hypercube-backed visuals
//!
//! The [`HypercubeAdapter`] pages rows out of a data session; the in-memory
//! document in [`sources`] stands in for a remote engine in demos and tests.

pub mod adapter;
pub mod config;
pub mod sources;

use hv_core::SessionError;
use thiserror::Error;

// Re-exports
pub use adapter::{HypercubeAdapter, HypercubeSnapshot, ReducedPage, ReducedRow};
pub use config::AdapterConfig;
pub use sources::{MemoryDocument, MemoryObject, Operation, SessionRequest};

/// Errors that can occur in data operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DataError {
    #[error("session error: {0}")]
    Session(#[from] SessionError),

    #[error("page does not match its layout: {0}")]
    PageMismatch(String),

    #[error("reduction factor must be at least 1")]
    InvalidFactor,

    #[error("no data loaded")]
    NotLoaded,

    #[error("invalid data: {0}")]
    InvalidData(String),

    #[error("configuration error: {0}")]
    Config(String),
}

impl DataError {
    /// Whether the underlying session is gone for good
    pub fn is_fatal(&self) -> bool {
        matches!(self, DataError::Session(e) if e.is_fatal())
    }
}

impl From<serde_json::Error> for DataError {
    fn from(error: serde_json::Error) -> Self {
        DataError::Config(error.to_string())
    }
}
