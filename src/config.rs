//! Engine Configuration
//!
//! Tolerances and defaults the engine reads at construction time. Every field
//! has a default, so `{}` is a valid configuration.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::canonical::DEFAULT_PRECISION_MM;

/// Environment variable overriding the canonical rounding precision.
pub const ROUNDING_ENV_VAR: &str = "PLACEMENT_ROUNDING_MM";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid engine config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("{var} must be a number, got {raw:?}")]
    InvalidOverride { var: &'static str, raw: String },

    #[error("{field} must be a finite positive number, got {value}")]
    InvalidValue { field: &'static str, value: f64 },
}

impl ConfigError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Parse(_) => "INVALID_CONFIG",
            Self::InvalidOverride { .. } => "INVALID_CONFIG_OVERRIDE",
            Self::InvalidValue { .. } => "INVALID_CONFIG_VALUE",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineConfig {
    #[serde(default = "default_precision")]
    pub rounding_precision_mm: f64,
    #[serde(default = "default_wrap_tolerance")]
    pub wrap_width_tolerance_mm: f64,
    #[serde(default = "default_image_width")]
    pub default_image_width_mm: f64,
    #[serde(default = "default_image_fraction")]
    pub default_image_canvas_fraction: f64,
}

fn default_precision() -> f64 { DEFAULT_PRECISION_MM }
fn default_wrap_tolerance() -> f64 { 0.01 }
fn default_image_width() -> f64 { 40.0 }
fn default_image_fraction() -> f64 { 0.4 }

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            rounding_precision_mm: default_precision(),
            wrap_width_tolerance_mm: default_wrap_tolerance(),
            default_image_width_mm: default_image_width(),
            default_image_canvas_fraction: default_image_fraction(),
        }
    }
}

impl EngineConfig {
    pub fn from_json_str(content: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Apply environment overrides. `lookup` is usually `|k| std::env::var(k).ok()`.
    pub fn with_env_overrides<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = lookup(ROUNDING_ENV_VAR) {
            self.rounding_precision_mm = raw
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidOverride {
                    var: ROUNDING_ENV_VAR,
                    raw: raw.clone(),
                })?;
            log::debug!("rounding precision overridden to {}", self.rounding_precision_mm);
        }
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let fields = [
            ("roundingPrecisionMm", self.rounding_precision_mm),
            ("wrapWidthToleranceMm", self.wrap_width_tolerance_mm),
            ("defaultImageWidthMm", self.default_image_width_mm),
            ("defaultImageCanvasFraction", self.default_image_canvas_fraction),
        ];
        for (field, value) in fields {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::InvalidValue { field, value });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = EngineConfig::from_json_str("{}").unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.rounding_precision_mm, 0.001);
        assert_eq!(config.wrap_width_tolerance_mm, 0.01);
    }

    #[test]
    fn test_env_override() {
        let config = EngineConfig::default()
            .with_env_overrides(|k| (k == ROUNDING_ENV_VAR).then(|| "0.01".to_string()))
            .unwrap();
        assert_eq!(config.rounding_precision_mm, 0.01);

        let bad = EngineConfig::default()
            .with_env_overrides(|_| Some("fine".to_string()))
            .unwrap_err();
        assert_eq!(bad.code(), "INVALID_CONFIG_OVERRIDE");
        assert!(bad.to_string().contains(ROUNDING_ENV_VAR));
    }

    #[test]
    fn test_rejects_non_positive_values() {
        let err = EngineConfig::from_json_str(r#"{"wrapWidthToleranceMm": 0}"#).unwrap_err();
        assert_eq!(err.code(), "INVALID_CONFIG_VALUE");
        assert!(err.to_string().contains("wrapWidthToleranceMm"));
    }

    #[test]
    fn test_rejects_malformed_json() {
        let err = EngineConfig::from_json_str("{not json").unwrap_err();
        assert_eq!(err.code(), "INVALID_CONFIG");
    }
}
