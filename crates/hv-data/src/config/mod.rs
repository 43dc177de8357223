//! Adapter configuration

use serde::{Deserialize, Serialize};
use hv_core::PageRect;

use crate::DataError;

/// How an adapter pages its object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdapterConfig {
    /// Initial window
    pub window: PageRect,

    /// Rows folded into one overview row by [`reduced`](crate::HypercubeAdapter::reduced)
    pub reduced_factor: usize,
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self {
            window: PageRect::default(),
            reduced_factor: 10,
        }
    }
}

impl AdapterConfig {
    pub fn from_json(json: &str) -> Result<Self, DataError> {
        let config: AdapterConfig = serde_json::from_str(json)?;
        if config.reduced_factor == 0 {
            return Err(DataError::InvalidFactor);
        }
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, DataError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
