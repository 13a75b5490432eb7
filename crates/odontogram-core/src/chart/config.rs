//! Chart configuration.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid zoom range: {0}")]
    Zoom(String),
}

/// How teeth with several findings count towards the CPO/ceo indices.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexPolicy {
    /// Each tooth lands in at most one component. CPO: caries before
    /// restored. ceo: extraction before caries before restored.
    #[default]
    PerTooth,
    /// Every flag counts on its own; a carious, restored tooth is both
    /// decayed and filled.
    PerFlag,
}

/// Zoom bounds for the chart view.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZoomConfig {
    pub min: f64,
    pub max: f64,
    pub step: f64,
    pub initial: f64,
}

impl Default for ZoomConfig {
    fn default() -> Self {
        Self {
            min: 0.7,
            max: 1.3,
            step: 0.1,
            initial: 1.0,
        }
    }
}

/// Chart engine configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartConfig {
    pub zoom: ZoomConfig,
    pub index_policy: IndexPolicy,
}

impl ChartConfig {
    /// Parse a (possibly partial) JSON document; missing keys take defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: ChartConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let zoom = &self.zoom;
        if !(zoom.min.is_finite() && zoom.max.is_finite() && zoom.step.is_finite()) {
            return Err(ConfigError::Zoom("bounds must be finite".into()));
        }
        if zoom.min <= 0.0 || zoom.min > zoom.max {
            return Err(ConfigError::Zoom(format!(
                "need 0 < min <= max, got [{}, {}]",
                zoom.min, zoom.max
            )));
        }
        if zoom.step <= 0.0 {
            return Err(ConfigError::Zoom(format!("step must be positive, got {}", zoom.step)));
        }
        if !(zoom.min..=zoom.max).contains(&zoom.initial) {
            return Err(ConfigError::Zoom(format!(
                "initial {} outside [{}, {}]",
                zoom.initial, zoom.min, zoom.max
            )));
        }
        Ok(())
    }
}
