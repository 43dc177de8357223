//! Hypercube data model
//!
//! A hypercube is the rectangular result grid (dimensions x measures) that the
//! analytics engine returns for a query definition. It travels in pages; each
//! cell carries the selection state the engine computed for it.

mod state;

pub use state::CellState;

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable identifier of one distinct value within a dimension,
/// independent of the row it is rendered on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementId(pub i64);

impl ElementId {
    /// Element number the engine uses for null / missing values
    pub const NULL: ElementId = ElementId(-2);

    pub fn is_null(self) -> bool {
        self.0 < 0
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for ElementId {
    fn from(value: i64) -> Self {
        ElementId(value)
    }
}

/// A rectangular window into a hypercube
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRect {
    pub top: usize,
    pub left: usize,
    pub width: usize,
    pub height: usize,
}

impl Default for PageRect {
    fn default() -> Self {
        Self {
            top: 0,
            left: 0,
            width: 10,
            height: 1000,
        }
    }
}

impl PageRect {
    pub fn new(top: usize, left: usize, width: usize, height: usize) -> Self {
        Self { top, left, width, height }
    }

    /// Same window size, starting at another row
    pub fn with_top(self, top: usize) -> Self {
        Self { top, ..self }
    }

    /// Number of rows this window covers in a cube with `total_rows` rows
    pub fn visible_rows(&self, total_rows: usize) -> usize {
        total_rows.saturating_sub(self.top).min(self.height)
    }
}

/// Total size of a hypercube
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CubeSize {
    /// Number of columns (dimensions + measures)
    pub columns: usize,
    /// Number of rows
    pub rows: usize,
}

/// Metadata for one dimension column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DimensionInfo {
    /// Display title
    pub title: String,
    /// Number of distinct values in the field
    pub cardinal: usize,
}

/// Metadata for one measure column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasureInfo {
    pub title: String,
    pub min: f64,
    pub max: f64,
}

/// Query metadata. Immutable per query definition; replaced wholesale on re-query.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct HypercubeLayout {
    pub dimensions: Vec<DimensionInfo>,
    pub measures: Vec<MeasureInfo>,
    pub size: CubeSize,
}

impl HypercubeLayout {
    /// Total number of rows in the cube
    pub fn total_rows(&self) -> usize {
        self.size.rows
    }

    /// Title of the first dimension, used as the label of list-style selectors
    pub fn primary_title(&self) -> Option<&str> {
        self.dimensions.first().map(|d| d.title.as_str())
    }
}

/// One cell of a hypercube page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    pub text: String,
    pub num: Option<f64>,
    pub elem: ElementId,
    pub state: CellState,
}

impl Cell {
    /// A dimension cell
    pub fn dimension(text: impl Into<String>, elem: ElementId, state: CellState) -> Self {
        Self {
            text: text.into(),
            num: None,
            elem,
            state,
        }
    }

    /// A measure cell
    pub fn measure(value: f64) -> Self {
        Self {
            text: format_number(value),
            num: Some(value),
            elem: ElementId(0),
            state: CellState::Locked,
        }
    }
}

/// A page of result rows. Replaced wholesale on each refresh.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct HypercubePage {
    /// Window this page was requested for
    pub rect: PageRect,
    pub rows: Vec<Vec<Cell>>,
}

impl HypercubePage {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Per-row selection state of the dimension in column `column`
    pub fn states(&self, column: usize) -> Vec<CellState> {
        self.rows
            .iter()
            .filter_map(|row| row.get(column).map(|c| c.state))
            .collect()
    }

    /// Label of the first row whose `column` cell carries `elem`
    pub fn label_of(&self, column: usize, elem: ElementId) -> Option<&str> {
        self.rows
            .iter()
            .filter_map(|row| row.get(column))
            .find(|c| c.elem == elem)
            .map(|c| c.text.as_str())
    }
}

fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{:.2}", value)
    }
}
