//! egui_plot renderer for scene descriptors

use egui::{Color32, Ui};
use egui_plot::{Bar, BarChart, Line, Plot, PlotPoints, Points};
use hv_core::{Bounds, ElementId};

use crate::binding::RendererEvent;
use crate::presets::{MarkKind, MarkLayer, Orientation, Rgb};
use crate::scene::{Mark, MarkStyle, SceneDescriptor};

/// Share of a band a bar occupies
const BAR_WIDTH: f64 = 0.7;

/// Colours for each mark style
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarkColors {
    pub normal: Color32,
    pub selected: Color32,
    pub excluded: Color32,
}

impl Default for MarkColors {
    fn default() -> Self {
        Self {
            normal: Color32::from_rgb(0x44, 0x77, 0xaa),
            selected: Color32::from_rgb(0x00, 0x98, 0x45),
            excluded: Color32::from_rgb(0xd2, 0xd2, 0xd2),
        }
    }
}

impl MarkColors {
    pub fn for_mark(&self, mark: &Mark, fill: Option<Rgb>) -> Color32 {
        match mark.style {
            MarkStyle::Selected => self.selected,
            MarkStyle::Excluded => self.excluded,
            MarkStyle::Normal => fill.map(to_color).unwrap_or(self.normal),
        }
    }
}

fn to_color(rgb: Rgb) -> Color32 {
    Color32::from_rgb(rgb.0, rgb.1, rgb.2)
}

/// What one frame of the plot produced
pub struct ScenePlotResponse {
    /// Interaction events for [`VisualBinding::handle_renderer_event`](crate::VisualBinding::handle_renderer_event)
    pub events: Vec<RendererEvent>,
    /// Screen area the plot covered
    pub bounds: Bounds,
    pub hovered: Option<ElementId>,
}

/// Draws a [`SceneDescriptor`] with egui_plot
#[derive(Debug, Clone)]
pub struct ScenePlot {
    pub colors: MarkColors,
    pub default_height: f32,
}

impl Default for ScenePlot {
    fn default() -> Self {
        Self {
            colors: MarkColors::default(),
            default_height: 320.0,
        }
    }
}

impl ScenePlot {
    pub fn new(colors: MarkColors) -> Self {
        Self {
            colors,
            ..Self::default()
        }
    }

    pub fn show(&self, ui: &mut Ui, scene: &SceneDescriptor) -> ScenePlotResponse {
        let height = scene.size.height.unwrap_or(self.default_height);
        let mut plot = Plot::new(scene.visual)
            .height(height)
            .allow_drag(false)
            .allow_zoom(false)
            .allow_scroll(false)
            .allow_boxed_zoom(false);
        if let Some(width) = scene.size.width {
            plot = plot.width(width.min(ui.available_width()));
        }

        let value_scale = match scene.orientation {
            Orientation::Vertical => "y",
            Orientation::Horizontal => "x",
        };
        if let Some(scale) = scene.scale(value_scale) {
            plot = match scene.orientation {
                Orientation::Vertical => plot.include_y(scale.min).include_y(scale.max),
                Orientation::Horizontal => plot.include_x(scale.min).include_x(scale.max),
            };
        }

        let response = plot.show(ui, |plot_ui| {
            let bar_layers = scene.layers.iter().filter(|l| is_bar(l.kind)).count();
            let mut bar_index = 0;
            for layer in &scene.layers {
                match layer.kind {
                    MarkKind::Line => plot_ui.line(self.line(scene, layer)),
                    MarkKind::Area => plot_ui.line(self.line(scene, layer).fill(0.0_f32)),
                    MarkKind::Point => plot_ui.points(self.points(scene, layer)),
                    _ => {
                        plot_ui.bar_chart(self.bars(scene, layer, bar_index, bar_layers));
                        bar_index += 1;
                    }
                }
            }
            plot_ui.pointer_coordinate().map(|p| [p.x, p.y])
        });

        let rect = response.response.rect;
        let bounds = Bounds::new(rect.min.x, rect.min.y, rect.max.x, rect.max.y);
        let hovered = response.inner.and_then(|p| mark_at(scene, p));

        let events = if response.response.clicked() {
            hovered.map(|elem| click_events(scene, elem)).unwrap_or_default()
        } else {
            Vec::new()
        };

        ScenePlotResponse {
            events,
            bounds,
            hovered,
        }
    }

    fn bars(&self, scene: &SceneDescriptor, layer: &MarkLayer, index: usize, count: usize) -> BarChart {
        let grouped = count > 1 && layer.kind == MarkKind::Bar;
        let width = if grouped { BAR_WIDTH / count as f64 } else { BAR_WIDTH };
        let shift = if grouped {
            (index as f64 - (count as f64 - 1.0) / 2.0) * width
        } else {
            0.0
        };

        let bars: Vec<Bar> = scene
            .marks
            .iter()
            .enumerate()
            .map(|(i, mark)| {
                let value = mark.values.get(layer.measure).copied().unwrap_or(0.0);
                let (base, height) = match layer.kind {
                    MarkKind::StackedBar => {
                        let below: f64 = mark.values.iter().take(layer.measure).sum();
                        (below, value)
                    }
                    MarkKind::RangeBar => {
                        let end = layer
                            .measure_end
                            .and_then(|m| mark.values.get(m).copied())
                            .unwrap_or(value);
                        (value, end - value)
                    }
                    MarkKind::Gauge => {
                        let start = layer.start.unwrap_or(0.0);
                        (start, value - start)
                    }
                    _ => (0.0, value),
                };
                Bar::new(i as f64 + shift, height)
                    .base_offset(base)
                    .width(width)
                    .name(&mark.label)
                    .fill(self.colors.for_mark(mark, layer.fill))
            })
            .collect();

        let chart = BarChart::new(bars);
        match scene.orientation {
            Orientation::Horizontal => chart.horizontal(),
            Orientation::Vertical => chart,
        }
    }

    fn line(&self, scene: &SceneDescriptor, layer: &MarkLayer) -> Line {
        let points: Vec<[f64; 2]> = scene
            .marks
            .iter()
            .enumerate()
            .map(|(i, m)| [i as f64, m.values.get(layer.measure).copied().unwrap_or(0.0)])
            .collect();
        let color = layer.fill.map(to_color).unwrap_or(self.colors.normal);
        Line::new(PlotPoints::from(points)).color(color)
    }

    fn points(&self, scene: &SceneDescriptor, layer: &MarkLayer) -> Points {
        // Scatter: first measure on x, layer measure on y
        let points: Vec<[f64; 2]> = scene
            .marks
            .iter()
            .map(|m| {
                [
                    m.values.first().copied().unwrap_or(0.0),
                    m.values.get(layer.measure).copied().unwrap_or(0.0),
                ]
            })
            .collect();
        Points::new(PlotPoints::from(points)).radius(4.0_f32).color(self.colors.normal)
    }
}

fn is_bar(kind: MarkKind) -> bool {
    matches!(
        kind,
        MarkKind::Bar | MarkKind::StackedBar | MarkKind::Gauge | MarkKind::RangeBar | MarkKind::Pie
    )
}

/// Mark under a plot coordinate
pub fn mark_at(scene: &SceneDescriptor, point: [f64; 2]) -> Option<ElementId> {
    let band = match scene.orientation {
        Orientation::Vertical => point[0],
        Orientation::Horizontal => point[1],
    };
    let index = band.round();
    if index < 0.0 || (band - index).abs() > BAR_WIDTH / 2.0 {
        return None;
    }
    scene
        .marks
        .get(index as usize)
        .map(|m| m.elem)
        .filter(|e| !e.is_null())
}

/// Events for a click on `elem`: a single-element brush stroke
pub fn click_events(scene: &SceneDescriptor, elem: ElementId) -> Vec<RendererEvent> {
    if !scene.brush {
        return Vec::new();
    }

    let pending = scene.mark(elem).map(|m| m.pending).unwrap_or(false);
    let delta = if pending {
        RendererEvent::InteractionDelta { added: Vec::new(), removed: vec![elem] }
    } else {
        RendererEvent::InteractionDelta { added: vec![elem], removed: Vec::new() }
    };

    let mut events = Vec::with_capacity(3);
    if !scene.selecting {
        events.push(RendererEvent::InteractionStart);
    }
    events.push(delta);
    events.push(RendererEvent::InteractionEnd);
    events
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presets::{preset, ChartType};
    use crate::scene::{build_scene, SceneInput};
    use hv_core::{
        Cell, CellState, CubeSize, DimensionInfo, HypercubeLayout, HypercubePage, MeasureInfo,
        PageRect, SelectionSessionState, SelectionSnapshot,
    };

    fn scene(chart_type: ChartType, selection: SelectionSnapshot) -> SceneDescriptor {
        let layout = HypercubeLayout {
            dimensions: vec![DimensionInfo { title: "Day".into(), cardinal: 3 }],
            measures: vec![MeasureInfo { title: "Visits".into(), min: 1.0, max: 3.0 }],
            size: CubeSize { columns: 2, rows: 3 },
        };
        let page = HypercubePage {
            rect: PageRect::default(),
            rows: (0..3)
                .map(|i| {
                    vec![
                        Cell::dimension(format!("d{}", i), ElementId(i), CellState::Normal),
                        Cell::measure((i + 1) as f64),
                    ]
                })
                .collect(),
        };
        let settings = preset(chart_type);
        build_scene(SceneInput {
            visual: uuid::Uuid::nil(),
            chart_type,
            settings: &settings,
            bar_height: None,
            layout: &layout,
            page: &page,
            selection: &selection,
            dimension: 0,
            minimap: false,
            error: None,
        })
    }

    #[test]
    fn test_mark_at_vertical() {
        let scene = scene(ChartType::VerticalBarchart, SelectionSnapshot::default());
        assert_eq!(mark_at(&scene, [1.1, 0.5]), Some(ElementId(1)));
        assert_eq!(mark_at(&scene, [1.45, 0.5]), None);
        assert_eq!(mark_at(&scene, [-0.6, 0.5]), None);
        assert_eq!(mark_at(&scene, [7.0, 0.5]), None);
    }

    #[test]
    fn test_mark_at_horizontal() {
        let scene = scene(ChartType::HorizontalBarchart, SelectionSnapshot::default());
        assert_eq!(mark_at(&scene, [0.5, 2.0]), Some(ElementId(2)));
    }

    #[test]
    fn test_click_starts_a_stroke_when_idle() {
        let scene = scene(ChartType::VerticalBarchart, SelectionSnapshot::default());
        assert_eq!(
            click_events(&scene, ElementId(2)),
            vec![
                RendererEvent::InteractionStart,
                RendererEvent::InteractionDelta { added: vec![ElementId(2)], removed: vec![] },
                RendererEvent::InteractionEnd,
            ]
        );
    }

    #[test]
    fn test_click_on_pending_mark_removes_it() {
        let selection = SelectionSnapshot {
            state: SelectionSessionState::Active,
            pending: vec![ElementId(2)],
            ..SelectionSnapshot::default()
        };
        let scene = scene(ChartType::VerticalBarchart, selection);
        assert_eq!(
            click_events(&scene, ElementId(2)),
            vec![
                RendererEvent::InteractionDelta { added: vec![], removed: vec![ElementId(2)] },
                RendererEvent::InteractionEnd,
            ]
        );
    }

    #[test]
    fn test_gauge_does_not_brush() {
        let scene = scene(ChartType::VerticalGauge, SelectionSnapshot::default());
        assert!(click_events(&scene, ElementId(0)).is_empty());
    }

    #[test]
    fn test_mark_colors() {
        let colors = MarkColors::default();
        let scene = scene(ChartType::VerticalBarchart, SelectionSnapshot::default());
        let mark = &scene.marks[0];
        assert_eq!(colors.for_mark(mark, Some(Rgb(1, 2, 3))), Color32::from_rgb(1, 2, 3));
        assert_eq!(colors.for_mark(mark, None), colors.normal);
    }
}
