//! Visual configuration

use serde::{Deserialize, Serialize};
use serde_json::Value;
use hv_core::PageRect;
use hv_data::AdapterConfig;

use crate::options::ChartOptions;
use crate::presets::{preset, ChartPreset, ChartType};
use crate::ViewError;

/// Rendering backend preference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderPriority {
    #[default]
    Canvas,
    Svg,
}

/// Configuration of one chart visual
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisualConfig {
    /// Preset to start from
    pub chart_type: Option<ChartType>,
    /// Explicit settings; replaces the preset when given
    pub settings: Option<ChartPreset>,
    pub options: ChartOptions,
    pub page: PageRect,
    pub prio: RenderPriority,
    /// Build the minimap from reduced pages
    pub reduced_data: bool,
    pub minimap: bool,
    pub reduced_factor: usize,
    /// Dimension brushing selects on
    pub dimension: usize,
}

impl Default for VisualConfig {
    fn default() -> Self {
        Self {
            chart_type: None,
            settings: None,
            options: ChartOptions::default(),
            page: PageRect::default(),
            prio: RenderPriority::default(),
            reduced_data: true,
            minimap: true,
            reduced_factor: 10,
            dimension: 0,
        }
    }
}

impl VisualConfig {
    pub fn new(chart_type: ChartType) -> Self {
        Self {
            chart_type: Some(chart_type),
            ..Self::default()
        }
    }

    pub fn from_json(json: &str) -> Result<Self, ViewError> {
        let config: VisualConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, ViewError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Chart type used for option rules and size hints
    pub fn effective_chart_type(&self) -> Result<ChartType, ViewError> {
        self.chart_type.ok_or(ViewError::MissingSettings)
    }

    pub fn validate(&self) -> Result<(), ViewError> {
        self.effective_chart_type()?;
        if self.reduced_factor == 0 {
            return Err(ViewError::Data(hv_data::DataError::InvalidFactor));
        }
        if self.page.height == 0 || self.page.width == 0 {
            return Err(ViewError::Data(hv_data::DataError::Config(
                "page window must have rows and columns".to_string(),
            )));
        }
        Ok(())
    }

    /// Settings with options applied, built fresh on every call
    pub fn resolve_settings(&self) -> Result<ChartPreset, ViewError> {
        let chart_type = self.effective_chart_type()?;
        let base = match &self.settings {
            Some(settings) => settings.clone(),
            None => preset(chart_type),
        };
        Ok(self.options.apply(chart_type, &base))
    }

    pub fn adapter_config(&self) -> AdapterConfig {
        AdapterConfig {
            window: self.page,
            reduced_factor: self.reduced_factor,
        }
    }

    pub fn save_config(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    /// Overlay the keys present in `config` onto this configuration
    pub fn load_config(&mut self, config: Value) -> Result<(), ViewError> {
        let mut merged = self.save_config();
        if let (Value::Object(target), Value::Object(source)) = (&mut merged, config) {
            for (key, value) in source {
                target.insert(key, value);
            }
        }
        let loaded: VisualConfig = serde_json::from_value(merged)?;
        loaded.validate()?;
        *self = loaded;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults_from_json() {
        let config = VisualConfig::from_json(r#"{ "chart_type": "verticalBarchart" }"#).unwrap();
        assert_eq!(config.chart_type, Some(ChartType::VerticalBarchart));
        assert_eq!(config.page, PageRect::default());
        assert_eq!(config.prio, RenderPriority::Canvas);
        assert!(config.reduced_data);
        assert!(config.minimap);
    }

    #[test]
    fn test_missing_chart_type() {
        assert_eq!(VisualConfig::from_json("{}"), Err(ViewError::MissingSettings));
        assert!(VisualConfig::from_json(r#"{ "chart_type": "donut" }"#).is_err());
    }

    #[test]
    fn test_resolve_settings_applies_options() {
        let mut config = VisualConfig::new(ChartType::VerticalGauge);
        config.options.max = Some(300.0);

        let settings = config.resolve_settings().unwrap();
        assert_eq!(settings.scale("y").unwrap().max, Some(300.0));
        assert_eq!(config.settings, None);
    }

    #[test]
    fn test_load_config_overlays_keys() {
        let mut config = VisualConfig::new(ChartType::HorizontalBarchart);
        config
            .load_config(json!({ "prio": "svg", "options": { "bar": { "height": 12 } } }))
            .unwrap();

        assert_eq!(config.prio, RenderPriority::Svg);
        assert_eq!(config.options.bar_height(), Some(12.0));
        assert_eq!(config.chart_type, Some(ChartType::HorizontalBarchart));

        let err = config.load_config(json!({ "reduced_factor": 0 }));
        assert!(err.is_err());
        assert_eq!(config.reduced_factor, 10);
    }
}
