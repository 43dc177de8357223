//! Renderer-neutral scene descriptors
//!
//! A [`SceneDescriptor`] is rebuilt from scratch for every render from the
//! current layout, page and selection snapshot. Nothing in it aliases the
//! preset table or a previous scene.

use serde::{Deserialize, Serialize};
use hv_core::{CellState, ElementId, HypercubeLayout, HypercubePage, SelectionSnapshot};

use crate::presets::{
    AxisSpec, ChartPreset, ChartType, MarkKind, MarkLayer, Orientation, ScaleKind, ScaleSource,
};
use crate::VisualId;

/// Column width of one vertical bar
pub const VERTICAL_BAR_WIDTH: f32 = 50.0;
/// Space kept free for the minimap under a vertical bar chart
pub const MINIMAP_RESERVE: f32 = 50.0;

/// How a mark is drawn with respect to selections
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MarkStyle {
    Selected,
    Excluded,
    Normal,
}

impl MarkStyle {
    fn from_state(state: CellState) -> Self {
        if state.is_selected() {
            MarkStyle::Selected
        } else if state.is_excluded() {
            MarkStyle::Excluded
        } else {
            MarkStyle::Normal
        }
    }
}

/// One row of the page as drawn
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mark {
    pub elem: ElementId,
    pub label: String,
    /// Absolute row index in the cube
    pub row: usize,
    pub values: Vec<f64>,
    pub state: CellState,
    pub style: MarkStyle,
    /// Part of the selection being edited
    pub pending: bool,
}

/// A scale with its domain resolved against the page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedScale {
    pub name: String,
    pub kind: ScaleKind,
    pub min: f64,
    pub max: f64,
    pub invert: bool,
    /// Band labels in row order; empty for linear scales
    pub labels: Vec<String>,
}

/// Inner size the visual asks its container for
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SizeHint {
    pub width: Option<f32>,
    pub height: Option<f32>,
    /// Height kept below the plot for the minimap
    pub minimap_reserve: f32,
}

/// Everything a renderer needs for one frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneDescriptor {
    pub visual: VisualId,
    pub chart_type: ChartType,
    pub title: Option<String>,
    pub orientation: Orientation,
    pub layers: Vec<MarkLayer>,
    pub scales: Vec<ResolvedScale>,
    pub axes: Vec<AxisSpec>,
    pub marks: Vec<Mark>,
    pub size: SizeHint,
    pub brush: bool,
    pub labels: bool,
    pub minimap: bool,
    /// A selection session is open
    pub selecting: bool,
    /// Data or selection failure to show next to the chart
    pub error: Option<String>,
}

impl SceneDescriptor {
    pub fn scale(&self, name: &str) -> Option<&ResolvedScale> {
        self.scales.iter().find(|s| s.name == name)
    }

    pub fn mark(&self, elem: ElementId) -> Option<&Mark> {
        self.marks.iter().find(|m| m.elem == elem)
    }
}

/// Inputs of [`build_scene`]
pub struct SceneInput<'a> {
    pub visual: VisualId,
    pub chart_type: ChartType,
    /// Settings with options already applied
    pub settings: &'a ChartPreset,
    pub bar_height: Option<f32>,
    pub layout: &'a HypercubeLayout,
    pub page: &'a HypercubePage,
    pub selection: &'a SelectionSnapshot,
    /// Dimension the visual selects on
    pub dimension: usize,
    pub minimap: bool,
    pub error: Option<String>,
}

/// Build a fresh scene
pub fn build_scene(input: SceneInput<'_>) -> SceneDescriptor {
    let marks = collect_marks(&input);

    let scales = input
        .settings
        .scales
        .iter()
        .map(|scale| {
            let (min, max, labels) = match (&scale.kind, &scale.source) {
                (ScaleKind::Band, _) => {
                    let labels: Vec<String> = marks.iter().map(|m| m.label.clone()).collect();
                    (0.0, labels.len() as f64, labels)
                }
                (ScaleKind::Linear, ScaleSource::Measures(measures)) => {
                    let stacked = input.settings.layers.iter().any(|l| l.kind == MarkKind::StackedBar);
                    let (lo, hi) = domain(&marks, measures, stacked, scale.expand);
                    (scale.min.unwrap_or(lo), scale.max.unwrap_or(hi), Vec::new())
                }
                (ScaleKind::Linear, ScaleSource::Dimension(_)) => {
                    (scale.min.unwrap_or(0.0), scale.max.unwrap_or(marks.len() as f64), Vec::new())
                }
            };
            ResolvedScale {
                name: scale.name.clone(),
                kind: scale.kind,
                min,
                max,
                invert: scale.invert,
                labels,
            }
        })
        .collect();

    let minimap = input.minimap && input.settings.minimap;
    let size = size_hint(input.chart_type, input.bar_height, marks.len(), minimap);

    SceneDescriptor {
        visual: input.visual,
        chart_type: input.chart_type,
        title: input.layout.primary_title().map(str::to_string),
        orientation: input.settings.orientation,
        layers: input.settings.layers.clone(),
        scales,
        axes: input.settings.axes.clone(),
        marks,
        size,
        brush: input.settings.brush,
        labels: input.settings.labels,
        minimap,
        selecting: input.selection.state.is_open(),
        error: input.error,
    }
}

fn collect_marks(input: &SceneInput<'_>) -> Vec<Mark> {
    let left = input.page.rect.left;
    let dimension_col = input.dimension.checked_sub(left);
    let measure_start = input.layout.dimensions.len().saturating_sub(left);
    let editing = input.selection.has_pending();

    input
        .page
        .rows
        .iter()
        .enumerate()
        .map(|(i, row)| {
            let cell = dimension_col.and_then(|c| row.get(c));
            let (label, elem, state) = cell
                .map(|c| (c.text.clone(), c.elem, c.state))
                .unwrap_or_else(|| (String::new(), ElementId::NULL, CellState::Normal));

            let pending = !elem.is_null() && input.selection.is_pending(elem);
            let style = if editing {
                if pending {
                    MarkStyle::Selected
                } else {
                    MarkStyle::Excluded
                }
            } else {
                MarkStyle::from_state(state)
            };

            Mark {
                elem,
                label,
                row: input.page.rect.top + i,
                values: row.iter().skip(measure_start).map(|c| c.num.unwrap_or(0.0)).collect(),
                state,
                style,
                pending,
            }
        })
        .collect()
}

fn domain(marks: &[Mark], measures: &[usize], stacked: bool, expand: f64) -> (f64, f64) {
    let mut lo = 0.0_f64;
    let mut hi = 0.0_f64;
    for mark in marks {
        let values = measures.iter().filter_map(|m| mark.values.get(*m).copied());
        if stacked {
            let sum: f64 = values.sum();
            lo = lo.min(sum);
            hi = hi.max(sum);
        } else {
            for v in values {
                lo = lo.min(v);
                hi = hi.max(v);
            }
        }
    }

    let pad = (hi - lo) * expand;
    let lo = if lo < 0.0 { lo - pad } else { lo };
    let hi = if hi > lo { hi + pad } else { lo + 1.0 };
    (lo, hi)
}

/// Sizing rules for bar charts; other types fill their container
pub fn size_hint(chart_type: ChartType, bar_height: Option<f32>, rows: usize, minimap: bool) -> SizeHint {
    match chart_type {
        ChartType::HorizontalBarchart => SizeHint {
            width: None,
            height: bar_height.map(|h| rows as f32 * h),
            minimap_reserve: 0.0,
        },
        ChartType::VerticalBarchart => SizeHint {
            width: Some(rows as f32 * VERTICAL_BAR_WIDTH),
            height: None,
            minimap_reserve: if minimap { MINIMAP_RESERVE } else { 0.0 },
        },
        _ => SizeHint::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presets::preset;
    use hv_core::{
        Cell, CubeSize, DimensionInfo, MeasureInfo, PageRect, SelectionSessionState,
    };
    use uuid::Uuid;

    fn cube() -> (HypercubeLayout, HypercubePage) {
        let layout = HypercubeLayout {
            dimensions: vec![DimensionInfo { title: "Region".into(), cardinal: 3 }],
            measures: vec![MeasureInfo { title: "Revenue".into(), min: -5.0, max: 40.0 }],
            size: CubeSize { columns: 2, rows: 3 },
        };
        let page = HypercubePage {
            rect: PageRect::new(0, 0, 2, 10),
            rows: vec![
                vec![Cell::dimension("North", ElementId(0), CellState::Selected), Cell::measure(40.0)],
                vec![Cell::dimension("South", ElementId(1), CellState::Excluded), Cell::measure(-5.0)],
                vec![Cell::dimension("West", ElementId(2), CellState::Alternative), Cell::measure(10.0)],
            ],
        };
        (layout, page)
    }

    fn scene(chart_type: ChartType, selection: &SelectionSnapshot, minimap: bool) -> SceneDescriptor {
        let (layout, page) = cube();
        let settings = preset(chart_type);
        build_scene(SceneInput {
            visual: Uuid::nil(),
            chart_type,
            settings: &settings,
            bar_height: Some(30.0),
            layout: &layout,
            page: &page,
            selection,
            dimension: 0,
            minimap,
            error: None,
        })
    }

    #[test]
    fn test_styles_follow_cell_states() {
        let scene = scene(ChartType::VerticalBarchart, &SelectionSnapshot::default(), false);

        let styles: Vec<MarkStyle> = scene.marks.iter().map(|m| m.style).collect();
        assert_eq!(styles, vec![MarkStyle::Selected, MarkStyle::Excluded, MarkStyle::Normal]);
        assert_eq!(scene.title.as_deref(), Some("Region"));
        assert!(!scene.selecting);
    }

    #[test]
    fn test_pending_selection_overrides_states() {
        let selection = SelectionSnapshot {
            state: SelectionSessionState::Active,
            pending: vec![ElementId(1)],
            ..SelectionSnapshot::default()
        };
        let scene = scene(ChartType::VerticalBarchart, &selection, false);

        assert!(scene.selecting);
        assert_eq!(scene.mark(ElementId(1)).unwrap().style, MarkStyle::Selected);
        assert!(scene.mark(ElementId(1)).unwrap().pending);
        assert_eq!(scene.mark(ElementId(0)).unwrap().style, MarkStyle::Excluded);
    }

    #[test]
    fn test_scales_resolve_against_page() {
        let scene = scene(ChartType::VerticalBarchart, &SelectionSnapshot::default(), false);

        let x = scene.scale("x").unwrap();
        assert_eq!(x.labels, vec!["North", "South", "West"]);
        let y = scene.scale("y").unwrap();
        assert!(y.min < -5.0);
        assert!(y.max > 40.0);
    }

    #[test]
    fn test_size_hints() {
        let vertical = scene(ChartType::VerticalBarchart, &SelectionSnapshot::default(), true);
        assert_eq!(vertical.size.width, Some(150.0));
        assert_eq!(vertical.size.minimap_reserve, MINIMAP_RESERVE);
        assert!(vertical.minimap);

        let horizontal = scene(ChartType::HorizontalBarchart, &SelectionSnapshot::default(), true);
        assert_eq!(horizontal.size.height, Some(90.0));
        assert!(!horizontal.minimap);

        assert_eq!(size_hint(ChartType::Pie, Some(30.0), 3, true), SizeHint::default());
    }

    #[test]
    fn test_scenes_do_not_share_settings() {
        let mut first = scene(ChartType::HorizontalBarchart, &SelectionSnapshot::default(), false);
        first.layers[0].fill = None;

        let second = scene(ChartType::HorizontalBarchart, &SelectionSnapshot::default(), false);
        assert!(second.layers[0].fill.is_some());
    }
}
