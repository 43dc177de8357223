//! Data session: the handle to a remote analytics engine object
//!
//! The engine owns selection state, paging and query execution. Everything in
//! this workspace talks to it through [`DataSession`].

mod error;

pub use error::SessionError;

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::hypercube::{ElementId, HypercubeLayout, HypercubePage, PageRect};

/// Path of a selectable dimension inside an engine object
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SelectionPath {
    /// Property path of the object definition, e.g. `/qHyperCubeDef`
    pub object_path: String,
    /// Dimension index within the object
    pub dimension: usize,
}

impl SelectionPath {
    pub const HYPERCUBE: &'static str = "/qHyperCubeDef";
    pub const LIST_OBJECT: &'static str = "/qListObjectDef";

    /// A dimension of a hypercube object
    pub fn hypercube(dimension: usize) -> Self {
        Self {
            object_path: Self::HYPERCUBE.to_string(),
            dimension,
        }
    }

    /// The single field of a list object
    pub fn list_object() -> Self {
        Self {
            object_path: Self::LIST_OBJECT.to_string(),
            dimension: 0,
        }
    }
}

impl fmt::Display for SelectionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self.object_path, self.dimension)
    }
}

/// Remote analytics engine object.
///
/// Implementations serialize concurrent requests coming from different
/// visuals bound to the same document.
#[async_trait::async_trait]
pub trait DataSession: Send + Sync {
    /// Open a selection scope for the given paths
    async fn begin_selections(&self, paths: &[SelectionPath]) -> Result<(), SessionError>;

    /// Close the selection scope, accepting or reverting what was selected in it
    async fn end_selections(&self, accept: bool) -> Result<(), SessionError>;

    /// Select values of a dimension. `toggle` flips membership instead of replacing.
    async fn select(
        &self,
        path: &SelectionPath,
        values: &[ElementId],
        toggle: bool,
    ) -> Result<(), SessionError>;

    /// Remove all confirmed selections of a dimension
    async fn clear_selections(&self, path: &SelectionPath) -> Result<(), SessionError>;

    /// Filter a list object by a text predicate
    async fn search(&self, path: &SelectionPath, text: &str) -> Result<(), SessionError>;

    /// Current layout of the object
    async fn get_layout(&self) -> Result<HypercubeLayout, SessionError>;

    /// Fetch a page of rows
    async fn get_page(&self, rect: PageRect) -> Result<HypercubePage, SessionError>;

    /// Select exactly `values` and confirm the open scope in one request.
    ///
    /// Engines with a native combined call should override this.
    async fn select_and_confirm(
        &self,
        path: &SelectionPath,
        values: &[ElementId],
    ) -> Result<(), SessionError> {
        self.select(path, values, false).await?;
        self.end_selections(true).await
    }

    /// Name of the object, for logging
    fn session_name(&self) -> &str;
}
