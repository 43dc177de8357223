//! Chart-type presets
//!
//! Declarative per-chart-type settings: which marks to draw, how scales map
//! the hypercube columns and where axes dock. [`preset`] builds a fresh value
//! on every call so visuals never share mutable settings.

mod color;

pub use color::Rgb;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::ViewError;

/// Supported chart types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ChartType {
    ComboLineBarchart,
    HorizontalBarchart,
    LineChart,
    MultiLineChart,
    Pie,
    Piechart,
    Scatterplot,
    VerticalBarchart,
    VerticalGroupBarchart,
    StackedBarchart,
    VerticalGauge,
    VerticalRangeGauge,
    RangeArea,
    Gantt,
}

impl ChartType {
    pub const ALL: [ChartType; 14] = [
        ChartType::ComboLineBarchart,
        ChartType::HorizontalBarchart,
        ChartType::LineChart,
        ChartType::MultiLineChart,
        ChartType::Pie,
        ChartType::Piechart,
        ChartType::Scatterplot,
        ChartType::VerticalBarchart,
        ChartType::VerticalGroupBarchart,
        ChartType::StackedBarchart,
        ChartType::VerticalGauge,
        ChartType::VerticalRangeGauge,
        ChartType::RangeArea,
        ChartType::Gantt,
    ];

    /// Tag used in configuration files
    pub fn tag(self) -> &'static str {
        match self {
            ChartType::ComboLineBarchart => "comboLineBarchart",
            ChartType::HorizontalBarchart => "horizontalBarchart",
            ChartType::LineChart => "lineChart",
            ChartType::MultiLineChart => "multiLineChart",
            ChartType::Pie => "pie",
            ChartType::Piechart => "piechart",
            ChartType::Scatterplot => "scatterplot",
            ChartType::VerticalBarchart => "verticalBarchart",
            ChartType::VerticalGroupBarchart => "verticalGroupBarchart",
            ChartType::StackedBarchart => "stackedBarchart",
            ChartType::VerticalGauge => "verticalGauge",
            ChartType::VerticalRangeGauge => "verticalRangeGauge",
            ChartType::RangeArea => "rangeArea",
            ChartType::Gantt => "gantt",
        }
    }
}

impl fmt::Display for ChartType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for ChartType {
    type Err = ViewError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ChartType::ALL
            .iter()
            .copied()
            .find(|t| t.tag() == s)
            .ok_or_else(|| ViewError::UnknownChartType(s.to_string()))
    }
}

/// Mark drawn for each row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MarkKind {
    Bar,
    StackedBar,
    Line,
    Point,
    Area,
    Pie,
    /// Bar from a start value up to the measure
    Gauge,
    /// Bar between two measures
    RangeBar,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Orientation {
    #[default]
    Vertical,
    Horizontal,
}

/// A layer of marks bound to one measure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkLayer {
    pub kind: MarkKind,
    /// Measure index (0-based, after the dimensions)
    pub measure: usize,
    /// Second measure for range marks
    #[serde(default)]
    pub measure_end: Option<usize>,
    #[serde(default)]
    pub fill: Option<Rgb>,
    /// Baseline of gauge marks
    #[serde(default)]
    pub start: Option<f64>,
    /// Upper reference of gauge marks
    #[serde(default)]
    pub end: Option<f64>,
}

impl MarkLayer {
    pub fn new(kind: MarkKind, measure: usize) -> Self {
        Self {
            kind,
            measure,
            measure_end: None,
            fill: None,
            start: None,
            end: None,
        }
    }

    fn with_fill(mut self, fill: Rgb) -> Self {
        self.fill = Some(fill);
        self
    }

    fn with_range(mut self, measure_end: usize) -> Self {
        self.measure_end = Some(measure_end);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ScaleKind {
    Band,
    Linear,
}

/// Columns a scale draws its domain from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ScaleSource {
    Dimension(usize),
    Measures(Vec<usize>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScaleSpec {
    pub name: String,
    pub kind: ScaleKind,
    pub source: ScaleSource,
    #[serde(default)]
    pub min: Option<f64>,
    #[serde(default)]
    pub max: Option<f64>,
    #[serde(default)]
    pub invert: bool,
    /// Fraction of the extent added as padding on each side
    #[serde(default)]
    pub expand: f64,
}

impl ScaleSpec {
    fn band(name: &str, dimension: usize) -> Self {
        Self {
            name: name.to_string(),
            kind: ScaleKind::Band,
            source: ScaleSource::Dimension(dimension),
            min: None,
            max: None,
            invert: false,
            expand: 0.0,
        }
    }

    fn linear(name: &str, measures: Vec<usize>) -> Self {
        Self {
            name: name.to_string(),
            kind: ScaleKind::Linear,
            source: ScaleSource::Measures(measures),
            min: None,
            max: None,
            invert: true,
            expand: 0.1,
        }
    }

    fn bounded(mut self, min: f64, max: f64) -> Self {
        self.min = Some(min);
        self.max = Some(max);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Dock {
    Left,
    Right,
    Top,
    Bottom,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AxisSpec {
    pub scale: String,
    pub dock: Dock,
}

impl AxisSpec {
    fn new(scale: &str, dock: Dock) -> Self {
        Self {
            scale: scale.to_string(),
            dock,
        }
    }
}

/// Complete settings for one chart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartPreset {
    pub layers: Vec<MarkLayer>,
    #[serde(default)]
    pub orientation: Orientation,
    pub scales: Vec<ScaleSpec>,
    #[serde(default)]
    pub axes: Vec<AxisSpec>,
    /// Whether marks can be brushed to select
    #[serde(default = "default_true")]
    pub brush: bool,
    /// Value labels on marks
    #[serde(default)]
    pub labels: bool,
    /// Overview strip under the chart
    #[serde(default)]
    pub minimap: bool,
}

fn default_true() -> bool {
    true
}

impl ChartPreset {
    /// Scale by name
    pub fn scale(&self, name: &str) -> Option<&ScaleSpec> {
        self.scales.iter().find(|s| s.name == name)
    }

    pub fn scale_mut(&mut self, name: &str) -> Option<&mut ScaleSpec> {
        self.scales.iter_mut().find(|s| s.name == name)
    }

    /// The value scale: `y` for vertical charts, `x` for horizontal ones
    pub fn value_scale_name(&self) -> &'static str {
        match self.orientation {
            Orientation::Vertical => "y",
            Orientation::Horizontal => "x",
        }
    }
}

const BAR_BLUE: Rgb = Rgb(0x44, 0x77, 0xaa);
const LINE_ORANGE: Rgb = Rgb(0xcc, 0x66, 0x77);
const GAUGE_GREEN: Rgb = Rgb(0x00, 0x98, 0x45);

/// Build the preset for `chart_type`
pub fn preset(chart_type: ChartType) -> ChartPreset {
    let vertical = |layers: Vec<MarkLayer>, measures: Vec<usize>| ChartPreset {
        layers,
        orientation: Orientation::Vertical,
        scales: vec![ScaleSpec::band("x", 0), ScaleSpec::linear("y", measures)],
        axes: vec![AxisSpec::new("x", Dock::Bottom), AxisSpec::new("y", Dock::Left)],
        brush: true,
        labels: false,
        minimap: false,
    };

    match chart_type {
        ChartType::VerticalBarchart => ChartPreset {
            minimap: true,
            ..vertical(vec![MarkLayer::new(MarkKind::Bar, 0).with_fill(BAR_BLUE)], vec![0])
        },
        ChartType::HorizontalBarchart => ChartPreset {
            layers: vec![MarkLayer::new(MarkKind::Bar, 0).with_fill(BAR_BLUE)],
            orientation: Orientation::Horizontal,
            scales: vec![
                ScaleSpec::band("y", 0),
                ScaleSpec { invert: false, ..ScaleSpec::linear("x", vec![0]) },
            ],
            axes: vec![AxisSpec::new("y", Dock::Left), AxisSpec::new("x", Dock::Bottom)],
            brush: true,
            labels: true,
            minimap: false,
        },
        ChartType::VerticalGroupBarchart => vertical(
            vec![MarkLayer::new(MarkKind::Bar, 0), MarkLayer::new(MarkKind::Bar, 1)],
            vec![0, 1],
        ),
        ChartType::StackedBarchart => vertical(
            vec![MarkLayer::new(MarkKind::StackedBar, 0), MarkLayer::new(MarkKind::StackedBar, 1)],
            vec![0, 1],
        ),
        ChartType::ComboLineBarchart => vertical(
            vec![
                MarkLayer::new(MarkKind::Bar, 0).with_fill(BAR_BLUE),
                MarkLayer::new(MarkKind::Line, 1).with_fill(LINE_ORANGE),
            ],
            vec![0, 1],
        ),
        ChartType::LineChart => vertical(vec![MarkLayer::new(MarkKind::Line, 0)], vec![0]),
        ChartType::MultiLineChart => vertical(
            vec![MarkLayer::new(MarkKind::Line, 0), MarkLayer::new(MarkKind::Line, 1)],
            vec![0, 1],
        ),
        ChartType::RangeArea => vertical(
            vec![MarkLayer::new(MarkKind::Area, 0).with_range(1), MarkLayer::new(MarkKind::Line, 2)],
            vec![0, 1, 2],
        ),
        ChartType::Scatterplot => ChartPreset {
            layers: vec![MarkLayer::new(MarkKind::Point, 1)],
            orientation: Orientation::Vertical,
            scales: vec![
                ScaleSpec { invert: false, ..ScaleSpec::linear("x", vec![0]) },
                ScaleSpec::linear("y", vec![1]),
            ],
            axes: vec![AxisSpec::new("x", Dock::Bottom), AxisSpec::new("y", Dock::Left)],
            brush: true,
            labels: false,
            minimap: false,
        },
        ChartType::Pie | ChartType::Piechart => ChartPreset {
            layers: vec![MarkLayer::new(MarkKind::Pie, 0)],
            orientation: Orientation::Vertical,
            scales: vec![ScaleSpec::band("color", 0)],
            axes: Vec::new(),
            brush: true,
            labels: chart_type == ChartType::Piechart,
            minimap: false,
        },
        ChartType::VerticalGauge => ChartPreset {
            layers: vec![MarkLayer {
                start: Some(0.0),
                end: Some(1.0),
                ..MarkLayer::new(MarkKind::Gauge, 0).with_fill(GAUGE_GREEN)
            }],
            orientation: Orientation::Vertical,
            scales: vec![ScaleSpec::linear("y", vec![0]).bounded(0.0, 1.0)],
            axes: vec![AxisSpec::new("y", Dock::Left)],
            brush: false,
            labels: true,
            minimap: false,
        },
        ChartType::VerticalRangeGauge => ChartPreset {
            layers: vec![MarkLayer::new(MarkKind::RangeBar, 0).with_range(1).with_fill(GAUGE_GREEN)],
            orientation: Orientation::Vertical,
            scales: vec![ScaleSpec::linear("y", vec![0, 1])],
            axes: vec![AxisSpec::new("y", Dock::Left)],
            brush: false,
            labels: true,
            minimap: false,
        },
        ChartType::Gantt => ChartPreset {
            layers: vec![MarkLayer::new(MarkKind::RangeBar, 0).with_range(1)],
            orientation: Orientation::Horizontal,
            scales: vec![
                ScaleSpec::band("y", 0),
                ScaleSpec { invert: false, ..ScaleSpec::linear("x", vec![0, 1]) },
            ],
            axes: vec![AxisSpec::new("y", Dock::Left), AxisSpec::new("x", Dock::Top)],
            brush: true,
            labels: false,
            minimap: false,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_type_has_a_preset() {
        for chart_type in ChartType::ALL {
            let preset = preset(chart_type);
            assert!(!preset.layers.is_empty(), "{} has no layers", chart_type);
            for axis in &preset.axes {
                assert!(preset.scale(&axis.scale).is_some(), "{} axis on missing scale", chart_type);
            }
        }
    }

    #[test]
    fn test_tags_round_trip_through_serde() {
        for chart_type in ChartType::ALL {
            let json = serde_json::to_string(&chart_type).unwrap();
            assert_eq!(json, format!("\"{}\"", chart_type.tag()));
            assert_eq!(chart_type.tag().parse::<ChartType>().unwrap(), chart_type);
        }
        assert!("donut".parse::<ChartType>().is_err());
    }

    #[test]
    fn test_presets_are_independent_values() {
        let mut first = preset(ChartType::VerticalGauge);
        first.scale_mut("y").unwrap().max = Some(250.0);

        let second = preset(ChartType::VerticalGauge);
        assert_eq!(second.scale("y").unwrap().max, Some(1.0));
    }
}
