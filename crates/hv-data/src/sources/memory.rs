//! In-memory analytics document
//!
//! Holds a small columnar table plus confirmed per-field selections, and hands
//! out engine objects (hypercubes and list objects) that implement
//! [`DataSession`]. Every object of a document sees the same selections.

use std::collections::BTreeSet;
use std::sync::Arc;
use async_trait::async_trait;
use ahash::AHashMap;
use parking_lot::{Mutex, RwLock};
use tokio::sync::Notify;
use hv_core::{
    Cell, CellState, CubeSize, DataSession, DimensionInfo, ElementId, HypercubeLayout,
    HypercubePage, MeasureInfo, PageRect, SelectionPath, SessionError,
};

use crate::DataError;

/// Session operations, used to target fault injection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    BeginSelections,
    EndSelections,
    Select,
    ClearSelections,
    Search,
    GetLayout,
    GetPage,
}

/// A request as received by a [`MemoryObject`]
#[derive(Debug, Clone, PartialEq)]
pub enum SessionRequest {
    BeginSelections(Vec<SelectionPath>),
    EndSelections { accept: bool },
    Select { path: SelectionPath, values: Vec<ElementId>, toggle: bool },
    ClearSelections(SelectionPath),
    Search { path: SelectionPath, text: String },
    GetLayout,
    GetPage(PageRect),
}

/// A dimension field: raw values plus their element numbers
#[derive(Debug, Clone)]
struct Field {
    name: String,
    /// Distinct values; the index is the element number
    distinct: Vec<String>,
    /// Element number per table row
    rows: Vec<usize>,
}

#[derive(Debug, Clone)]
struct Measure {
    name: String,
    values: Vec<f64>,
}

type Selections = AHashMap<usize, BTreeSet<i64>>;

#[derive(Debug)]
struct DocState {
    fields: Vec<Field>,
    measures: Vec<Measure>,
    row_count: usize,
    selections: Selections,
    closed: bool,
}

impl DocState {
    /// Rows compatible with every selection except the one on `skip`
    fn row_passes(&self, row: usize, skip: Option<usize>) -> bool {
        self.selections.iter().all(|(field, selected)| {
            Some(*field) == skip
                || selected.is_empty()
                || selected.contains(&(self.fields[*field].rows[row] as i64))
        })
    }

    fn field_index(&self, name: &str) -> Result<usize, DataError> {
        self.fields
            .iter()
            .position(|f| f.name == name)
            .ok_or_else(|| DataError::InvalidData(format!("unknown field '{}'", name)))
    }

    fn measure_index(&self, name: &str) -> Result<usize, DataError> {
        self.measures
            .iter()
            .position(|m| m.name == name)
            .ok_or_else(|| DataError::InvalidData(format!("unknown measure '{}'", name)))
    }

    fn selected(&self, field: usize) -> Option<&BTreeSet<i64>> {
        self.selections.get(&field).filter(|s| !s.is_empty())
    }
}

/// Builder for [`MemoryDocument`]
pub struct MemoryDocumentBuilder {
    name: String,
    fields: Vec<(String, Vec<String>)>,
    measures: Vec<Measure>,
}

impl MemoryDocumentBuilder {
    pub fn field(mut self, name: impl Into<String>, values: Vec<String>) -> Self {
        self.fields.push((name.into(), values));
        self
    }

    pub fn measure(mut self, name: impl Into<String>, values: Vec<f64>) -> Self {
        self.measures.push(Measure {
            name: name.into(),
            values,
        });
        self
    }

    pub fn build(self) -> Result<MemoryDocument, DataError> {
        let row_count = self
            .fields
            .first()
            .map(|(_, v)| v.len())
            .or_else(|| self.measures.first().map(|m| m.values.len()))
            .unwrap_or(0);

        let lengths_match = self.fields.iter().all(|(_, v)| v.len() == row_count)
            && self.measures.iter().all(|m| m.values.len() == row_count);
        if !lengths_match {
            return Err(DataError::InvalidData(
                "all columns must have the same length".to_string(),
            ));
        }

        let fields = self
            .fields
            .into_iter()
            .map(|(name, values)| {
                let mut index: AHashMap<String, usize> = AHashMap::new();
                let mut distinct = Vec::new();
                let rows = values
                    .into_iter()
                    .map(|value| {
                        *index.entry(value.clone()).or_insert_with(|| {
                            distinct.push(value);
                            distinct.len() - 1
                        })
                    })
                    .collect();
                Field { name, distinct, rows }
            })
            .collect();

        Ok(MemoryDocument {
            name: self.name,
            state: Arc::new(RwLock::new(DocState {
                fields,
                measures: self.measures,
                row_count,
                selections: Selections::new(),
                closed: false,
            })),
        })
    }
}

/// A document shared by several engine objects
#[derive(Clone)]
pub struct MemoryDocument {
    name: String,
    state: Arc<RwLock<DocState>>,
}

impl MemoryDocument {
    pub fn builder(name: impl Into<String>) -> MemoryDocumentBuilder {
        MemoryDocumentBuilder {
            name: name.into(),
            fields: Vec::new(),
            measures: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Hypercube object over `dimensions` with summed `measures`
    pub fn hypercube(&self, dimensions: &[&str], measures: &[&str]) -> Result<MemoryObject, DataError> {
        let state = self.state.read();
        let dimensions = dimensions
            .iter()
            .map(|d| state.field_index(d))
            .collect::<Result<Vec<_>, _>>()?;
        let measures = measures
            .iter()
            .map(|m| state.measure_index(m))
            .collect::<Result<Vec<_>, _>>()?;
        drop(state);

        Ok(self.object(
            format!("{}/hypercube", self.name),
            ObjectKind::Hypercube { dimensions, measures },
        ))
    }

    /// List object over one field
    pub fn list_object(&self, field: &str) -> Result<MemoryObject, DataError> {
        let field = self.state.read().field_index(field)?;
        Ok(self.object(format!("{}/list", self.name), ObjectKind::List { field }))
    }

    /// Confirmed selection of a field, as element numbers
    pub fn selected_elements(&self, field: &str) -> Vec<ElementId> {
        let state = self.state.read();
        state
            .field_index(field)
            .ok()
            .and_then(|f| state.selected(f))
            .map(|s| s.iter().map(|e| ElementId(*e)).collect())
            .unwrap_or_default()
    }

    /// Invalidate every object of this document
    pub fn close(&self) {
        self.state.write().closed = true;
        tracing::info!("Document {} closed", self.name);
    }

    fn object(&self, name: String, kind: ObjectKind) -> MemoryObject {
        MemoryObject {
            name,
            kind,
            doc: self.state.clone(),
            modal: Mutex::new(None),
            search: Mutex::new(None),
            faults: Mutex::new(AHashMap::new()),
            gates: Mutex::new(AHashMap::new()),
            log: Mutex::new(Vec::new()),
        }
    }
}

#[derive(Debug, Clone)]
enum ObjectKind {
    Hypercube { dimensions: Vec<usize>, measures: Vec<usize> },
    List { field: usize },
}

/// One engine object of a [`MemoryDocument`]
pub struct MemoryObject {
    name: String,
    kind: ObjectKind,
    doc: Arc<RwLock<DocState>>,
    /// Selections at the time the open scope began
    modal: Mutex<Option<Selections>>,
    search: Mutex<Option<String>>,
    faults: Mutex<AHashMap<Operation, SessionError>>,
    gates: Mutex<AHashMap<Operation, Arc<Notify>>>,
    log: Mutex<Vec<SessionRequest>>,
}

impl MemoryObject {
    /// Fail the next call of `operation` with `error`
    pub fn fail_next(&self, operation: Operation, error: SessionError) {
        self.faults.lock().insert(operation, error);
    }

    /// Hold the next call of `operation` until the returned gate is notified
    pub fn pause_next(&self, operation: Operation) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.gates.lock().insert(operation, gate.clone());
        gate
    }

    /// Every request received so far
    pub fn requests(&self) -> Vec<SessionRequest> {
        self.log.lock().clone()
    }

    /// Requests that change selections
    pub fn selection_requests(&self) -> Vec<SessionRequest> {
        self.requests()
            .into_iter()
            .filter(|r| !matches!(r, SessionRequest::GetLayout | SessionRequest::GetPage(_)))
            .collect()
    }

    pub fn in_selection_scope(&self) -> bool {
        self.modal.lock().is_some()
    }

    async fn enter(&self, operation: Operation, request: SessionRequest) -> Result<(), SessionError> {
        self.log.lock().push(request);

        let gate = self.gates.lock().remove(&operation);
        if let Some(gate) = gate {
            gate.notified().await;
        }

        if self.doc.read().closed {
            return Err(SessionError::Closed);
        }
        match self.faults.lock().remove(&operation) {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    fn field_for(&self, path: &SelectionPath) -> Result<usize, SessionError> {
        match (&self.kind, path.object_path.as_str()) {
            (ObjectKind::Hypercube { dimensions, .. }, SelectionPath::HYPERCUBE) => dimensions
                .get(path.dimension)
                .copied()
                .ok_or_else(|| SessionError::Rejected(format!("no dimension {}", path.dimension))),
            (ObjectKind::List { field }, SelectionPath::LIST_OBJECT) if path.dimension == 0 => Ok(*field),
            _ => Err(SessionError::Rejected(format!("invalid path {}", path))),
        }
    }

    /// All rows of the object, before windowing
    fn materialize(&self) -> (HypercubeLayout, Vec<Vec<Cell>>) {
        let doc = self.doc.read();
        match &self.kind {
            ObjectKind::Hypercube { dimensions, measures } => {
                Self::materialize_hypercube(&doc, dimensions, measures)
            }
            ObjectKind::List { field } => {
                let search = self.search.lock().clone();
                Self::materialize_list(&doc, *field, search.as_deref())
            }
        }
    }

    fn materialize_hypercube(
        doc: &DocState,
        dimensions: &[usize],
        measures: &[usize],
    ) -> (HypercubeLayout, Vec<Vec<Cell>>) {
        let mut groups: AHashMap<Vec<usize>, usize> = AHashMap::new();
        let mut keys: Vec<Vec<usize>> = Vec::new();
        let mut sums: Vec<Vec<f64>> = Vec::new();

        for row in (0..doc.row_count).filter(|r| doc.row_passes(*r, None)) {
            let key: Vec<usize> = dimensions.iter().map(|d| doc.fields[*d].rows[row]).collect();
            let slot = *groups.entry(key.clone()).or_insert_with(|| {
                keys.push(key);
                sums.push(vec![0.0; measures.len()]);
                keys.len() - 1
            });
            for (i, m) in measures.iter().enumerate() {
                sums[slot][i] += doc.measures[*m].values[row];
            }
        }

        let rows: Vec<Vec<Cell>> = keys
            .iter()
            .zip(&sums)
            .map(|(key, values)| {
                let mut cells: Vec<Cell> = key
                    .iter()
                    .zip(dimensions)
                    .map(|(elem, field)| {
                        let state = match doc.selected(*field) {
                            Some(selected) if selected.contains(&(*elem as i64)) => CellState::Selected,
                            _ => CellState::Normal,
                        };
                        Cell::dimension(
                            doc.fields[*field].distinct[*elem].clone(),
                            ElementId(*elem as i64),
                            state,
                        )
                    })
                    .collect();
                cells.extend(values.iter().map(|v| Cell::measure(*v)));
                cells
            })
            .collect();

        let measure_info = measures
            .iter()
            .enumerate()
            .map(|(i, m)| {
                let column = sums.iter().map(|s| s[i]);
                MeasureInfo {
                    title: doc.measures[*m].name.clone(),
                    min: column.clone().fold(f64::INFINITY, f64::min).min(0.0),
                    max: column.fold(f64::NEG_INFINITY, f64::max).max(0.0),
                }
            })
            .collect();

        let layout = HypercubeLayout {
            dimensions: dimensions
                .iter()
                .map(|d| DimensionInfo {
                    title: doc.fields[*d].name.clone(),
                    cardinal: doc.fields[*d].distinct.len(),
                })
                .collect(),
            measures: measure_info,
            size: CubeSize {
                columns: dimensions.len() + measures.len(),
                rows: rows.len(),
            },
        };
        (layout, rows)
    }

    fn materialize_list(doc: &DocState, field: usize, search: Option<&str>) -> (HypercubeLayout, Vec<Vec<Cell>>) {
        let info = &doc.fields[field];
        let mut associated = vec![false; info.distinct.len()];
        for row in (0..doc.row_count).filter(|r| doc.row_passes(*r, Some(field))) {
            associated[info.rows[row]] = true;
        }
        let selected = doc.selected(field);
        let needle = search.map(str::to_lowercase);

        let rows: Vec<Vec<Cell>> = info
            .distinct
            .iter()
            .enumerate()
            .filter(|(_, text)| match &needle {
                Some(needle) => text.to_lowercase().contains(needle.as_str()),
                None => true,
            })
            .map(|(elem, text)| {
                let is_selected = selected.map(|s| s.contains(&(elem as i64))).unwrap_or(false);
                let state = match (is_selected, associated[elem], selected.is_some()) {
                    (true, true, _) => CellState::Selected,
                    (true, false, _) => CellState::SelectedExcluded,
                    (false, true, true) => CellState::Alternative,
                    (false, true, false) => CellState::Normal,
                    (false, false, _) => CellState::Excluded,
                };
                vec![Cell::dimension(text.clone(), ElementId(elem as i64), state)]
            })
            .collect();

        let layout = HypercubeLayout {
            dimensions: vec![DimensionInfo {
                title: info.name.clone(),
                cardinal: info.distinct.len(),
            }],
            measures: Vec::new(),
            size: CubeSize {
                columns: 1,
                rows: rows.len(),
            },
        };
        (layout, rows)
    }
}

#[async_trait]
impl DataSession for MemoryObject {
    async fn begin_selections(&self, paths: &[SelectionPath]) -> Result<(), SessionError> {
        self.enter(Operation::BeginSelections, SessionRequest::BeginSelections(paths.to_vec()))
            .await?;
        for path in paths {
            self.field_for(path)?;
        }
        let snapshot = self.doc.read().selections.clone();
        *self.modal.lock() = Some(snapshot);
        Ok(())
    }

    async fn end_selections(&self, accept: bool) -> Result<(), SessionError> {
        self.enter(Operation::EndSelections, SessionRequest::EndSelections { accept })
            .await?;
        let snapshot = self.modal.lock().take();
        if let (false, Some(snapshot)) = (accept, snapshot) {
            self.doc.write().selections = snapshot;
        }
        Ok(())
    }

    async fn select(
        &self,
        path: &SelectionPath,
        values: &[ElementId],
        toggle: bool,
    ) -> Result<(), SessionError> {
        self.enter(
            Operation::Select,
            SessionRequest::Select {
                path: path.clone(),
                values: values.to_vec(),
                toggle,
            },
        )
        .await?;
        let field = self.field_for(path)?;

        let mut doc = self.doc.write();
        let selected = doc.selections.entry(field).or_default();
        if toggle {
            for value in values {
                if !selected.remove(&value.0) {
                    selected.insert(value.0);
                }
            }
        } else {
            *selected = values.iter().map(|v| v.0).collect();
        }
        Ok(())
    }

    async fn clear_selections(&self, path: &SelectionPath) -> Result<(), SessionError> {
        self.enter(Operation::ClearSelections, SessionRequest::ClearSelections(path.clone()))
            .await?;
        let field = self.field_for(path)?;
        self.doc.write().selections.remove(&field);
        Ok(())
    }

    async fn search(&self, path: &SelectionPath, text: &str) -> Result<(), SessionError> {
        self.enter(
            Operation::Search,
            SessionRequest::Search {
                path: path.clone(),
                text: text.to_string(),
            },
        )
        .await?;
        if !matches!(self.kind, ObjectKind::List { .. }) {
            return Err(SessionError::Rejected("search requires a list object".to_string()));
        }
        self.field_for(path)?;

        *self.search.lock() = if text.is_empty() {
            None
        } else {
            Some(text.to_string())
        };
        Ok(())
    }

    async fn get_layout(&self) -> Result<HypercubeLayout, SessionError> {
        self.enter(Operation::GetLayout, SessionRequest::GetLayout).await?;
        Ok(self.materialize().0)
    }

    async fn get_page(&self, rect: PageRect) -> Result<HypercubePage, SessionError> {
        self.enter(Operation::GetPage, SessionRequest::GetPage(rect)).await?;
        let (_, rows) = self.materialize();
        let rows = rows
            .into_iter()
            .skip(rect.top)
            .take(rect.height)
            .map(|row| row.into_iter().skip(rect.left).take(rect.width).collect())
            .collect();
        Ok(HypercubePage { rect, rows })
    }

    fn session_name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sales() -> MemoryDocument {
        let strings = |v: &[&str]| v.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        MemoryDocument::builder("sales")
            .field("Region", strings(&["North", "South", "North", "East", "South"]))
            .field("Product", strings(&["Tea", "Tea", "Coffee", "Coffee", "Cocoa"]))
            .measure("Revenue", vec![10.0, 20.0, 5.0, 7.0, 3.0])
            .build()
            .unwrap()
    }

    #[test]
    fn test_mismatched_columns_rejected() {
        let result = MemoryDocument::builder("bad")
            .field("A", vec!["x".to_string()])
            .measure("M", vec![1.0, 2.0])
            .build();
        assert!(matches!(result, Err(DataError::InvalidData(_))));
    }

    #[tokio::test]
    async fn test_hypercube_aggregates_by_dimension() {
        let doc = sales();
        let cube = doc.hypercube(&["Region"], &["Revenue"]).unwrap();

        let layout = cube.get_layout().await.unwrap();
        assert_eq!(layout.size, CubeSize { columns: 2, rows: 3 });
        assert_eq!(layout.dimensions[0].title, "Region");

        let page = cube.get_page(PageRect::default()).await.unwrap();
        let summary: Vec<(String, f64)> = page
            .rows
            .iter()
            .map(|r| (r[0].text.clone(), r[1].num.unwrap()))
            .collect();
        assert_eq!(
            summary,
            vec![("North".to_string(), 15.0), ("South".to_string(), 23.0), ("East".to_string(), 7.0)]
        );
    }

    #[tokio::test]
    async fn test_revert_restores_selections() {
        let doc = sales();
        let cube = doc.hypercube(&["Region"], &["Revenue"]).unwrap();
        let path = SelectionPath::hypercube(0);

        cube.begin_selections(&[path.clone()]).await.unwrap();
        cube.select(&path, &[ElementId(1)], false).await.unwrap();
        assert_eq!(doc.selected_elements("Region"), vec![ElementId(1)]);

        cube.end_selections(false).await.unwrap();
        assert!(doc.selected_elements("Region").is_empty());
        assert!(!cube.in_selection_scope());
    }

    #[tokio::test]
    async fn test_select_and_confirm_filters_cube() {
        let doc = sales();
        let cube = doc.hypercube(&["Region"], &["Revenue"]).unwrap();
        let path = SelectionPath::hypercube(0);

        cube.begin_selections(&[path.clone()]).await.unwrap();
        cube.select_and_confirm(&path, &[ElementId(0)]).await.unwrap();

        let page = cube.get_page(PageRect::default()).await.unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page.rows[0][0].state, CellState::Selected);
        assert_eq!(
            cube.selection_requests(),
            vec![
                SessionRequest::BeginSelections(vec![path.clone()]),
                SessionRequest::Select { path: path.clone(), values: vec![ElementId(0)], toggle: false },
                SessionRequest::EndSelections { accept: true },
            ]
        );
    }

    #[tokio::test]
    async fn test_list_states_follow_other_fields() {
        let doc = sales();
        let regions = doc.hypercube(&["Region"], &["Revenue"]).unwrap();
        let products = doc.list_object("Product").unwrap();

        // North sells Tea and Coffee only
        regions.select(&SelectionPath::hypercube(0), &[ElementId(0)], false).await.unwrap();
        products.select(&SelectionPath::list_object(), &[ElementId(0)], false).await.unwrap();

        let page = products.get_page(PageRect::default()).await.unwrap();
        let states: Vec<CellState> = page.states(0);
        assert_eq!(
            states,
            vec![CellState::Selected, CellState::Alternative, CellState::Excluded]
        );
    }

    #[tokio::test]
    async fn test_search_and_clear() {
        let doc = sales();
        let products = doc.list_object("Product").unwrap();
        let path = SelectionPath::list_object();

        products.search(&path, "co").await.unwrap();
        let page = products.get_page(PageRect::default()).await.unwrap();
        let texts: Vec<&str> = page.rows.iter().map(|r| r[0].text.as_str()).collect();
        assert_eq!(texts, vec!["Coffee", "Cocoa"]);

        products.search(&path, "").await.unwrap();
        assert_eq!(products.get_layout().await.unwrap().total_rows(), 3);

        products.select(&path, &[ElementId(2)], true).await.unwrap();
        products.clear_selections(&path).await.unwrap();
        assert!(doc.selected_elements("Product").is_empty());
    }

    #[tokio::test]
    async fn test_fault_injection_is_one_shot() {
        let doc = sales();
        let cube = doc.hypercube(&["Region"], &["Revenue"]).unwrap();
        cube.fail_next(Operation::GetLayout, SessionError::Timeout);

        assert_eq!(cube.get_layout().await, Err(SessionError::Timeout));
        assert!(cube.get_layout().await.is_ok());
    }

    #[tokio::test]
    async fn test_wrong_path_rejected() {
        let doc = sales();
        let cube = doc.hypercube(&["Region"], &["Revenue"]).unwrap();
        let err = cube
            .select(&SelectionPath::list_object(), &[ElementId(0)], false)
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::Rejected(_)));
    }
}
