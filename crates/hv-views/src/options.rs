//! Per-visual chart options layered over a preset

use serde::{Deserialize, Serialize};

use crate::presets::{ChartPreset, ChartType, MarkKind, Rgb};

/// Bar sizing and colour
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BarOptions {
    /// Pixel height of each bar in horizontal bar charts
    #[serde(default)]
    pub height: Option<f32>,
    #[serde(default)]
    pub fill: Option<Rgb>,
}

/// User options for a visual
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChartOptions {
    #[serde(default)]
    pub bar: Option<BarOptions>,
    /// Lower bound of the value scale
    #[serde(default)]
    pub min: Option<f64>,
    /// Upper bound of the value scale
    #[serde(default)]
    pub max: Option<f64>,
}

impl ChartOptions {
    pub fn bar_height(&self) -> Option<f32> {
        self.bar.as_ref().and_then(|b| b.height).filter(|h| *h > 0.0)
    }

    pub fn bar_fill(&self) -> Option<Rgb> {
        self.bar.as_ref().and_then(|b| b.fill)
    }

    /// Build the effective settings for `chart_type`. `base` is left untouched.
    pub fn apply(&self, chart_type: ChartType, base: &ChartPreset) -> ChartPreset {
        let mut settings = base.clone();

        if chart_type == ChartType::HorizontalBarchart {
            if let Some(fill) = self.bar_fill() {
                for layer in settings.layers.iter_mut().filter(|l| l.kind == MarkKind::Bar) {
                    layer.fill = Some(fill);
                }
            }
        }

        let value_scale = settings.value_scale_name();
        if let Some(scale) = settings.scale_mut(value_scale) {
            if self.min.is_some() {
                scale.min = self.min;
            }
            if self.max.is_some() {
                scale.max = self.max;
            }
        }

        if chart_type == ChartType::VerticalGauge {
            for layer in settings.layers.iter_mut().filter(|l| l.kind == MarkKind::Gauge) {
                if self.min.is_some() {
                    layer.start = self.min;
                }
                if self.max.is_some() {
                    layer.end = self.max;
                }
            }
        }

        settings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presets::preset;

    #[test]
    fn test_horizontal_bar_fill() {
        let options = ChartOptions {
            bar: Some(BarOptions { height: Some(20.0), fill: Some(Rgb(255, 0, 0)) }),
            ..ChartOptions::default()
        };
        let base = preset(ChartType::HorizontalBarchart);
        let settings = options.apply(ChartType::HorizontalBarchart, &base);

        assert_eq!(settings.layers[0].fill, Some(Rgb(255, 0, 0)));
        assert_ne!(base.layers[0].fill, Some(Rgb(255, 0, 0)));
    }

    #[test]
    fn test_fill_ignored_for_other_types() {
        let options = ChartOptions {
            bar: Some(BarOptions { height: None, fill: Some(Rgb(255, 0, 0)) }),
            ..ChartOptions::default()
        };
        let base = preset(ChartType::VerticalBarchart);
        assert_eq!(options.apply(ChartType::VerticalBarchart, &base), base);
    }

    #[test]
    fn test_gauge_bounds() {
        let options = ChartOptions { bar: None, min: Some(10.0), max: Some(90.0) };
        let settings = options.apply(ChartType::VerticalGauge, &preset(ChartType::VerticalGauge));

        let y = settings.scale("y").unwrap();
        assert_eq!((y.min, y.max), (Some(10.0), Some(90.0)));
        assert_eq!(settings.layers[0].start, Some(10.0));
        assert_eq!(settings.layers[0].end, Some(90.0));
    }

    #[test]
    fn test_options_from_json() {
        let options: ChartOptions =
            serde_json::from_str(r##"{"bar": {"height": 24, "fill": "#336699"}, "max": 5}"##).unwrap();
        assert_eq!(options.bar_height(), Some(24.0));
        assert_eq!(options.bar_fill(), Some(Rgb(0x33, 0x66, 0x99)));
        assert_eq!(options.max, Some(5.0));
        assert_eq!(options.min, None);
    }
}
