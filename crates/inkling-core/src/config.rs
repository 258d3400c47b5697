//! Drawing surface configuration.

use crate::brush::DEFAULT_BRUSH_SIZE;
use crate::color::Rgb;
use crate::history::DEFAULT_HISTORY_CAPACITY;
use crate::setup::SetupLimits;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Cannot read configuration: {0}")]
    Io(#[from] std::io::Error),
}

/// Tunables for a drawing surface. Every field has a default, so a partial
/// JSON document is a valid configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SurfaceConfig {
    pub limits: SetupLimits,
    pub history_capacity: usize,
    pub brush_size: f64,
    pub brush_color: Rgb,
    /// Background for setups that do not name one.
    pub background: Rgb,
    pub max_brush_size: f64,
    pub max_symmetry_axes: usize,
    pub long_press_ms: f64,
    pub jpeg_quality: u8,
}

impl Default for SurfaceConfig {
    fn default() -> Self {
        Self {
            limits: SetupLimits::default(),
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            brush_size: DEFAULT_BRUSH_SIZE,
            brush_color: Rgb::BLACK,
            background: Rgb::WHITE,
            max_brush_size: 400.0,
            max_symmetry_axes: 64,
            long_press_ms: 400.0,
            jpeg_quality: 95,
        }
    }
}

impl SurfaceConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SurfaceConfig::default();
        assert_eq!(config.history_capacity, 50);
        assert_eq!(config.brush_size, 30.0);
        assert_eq!(config.brush_color, Rgb::BLACK);
        assert_eq!(config.background, Rgb::WHITE);
        assert_eq!(config.limits.max_width, 10_000);
        assert_eq!(config.long_press_ms, 400.0);
    }

    #[test]
    fn test_partial_json() {
        let config = SurfaceConfig::from_json(r##"{"history_capacity": 10, "brush_color": "#fff"}"##).unwrap();
        assert_eq!(config.history_capacity, 10);
        assert_eq!(config.brush_color, Rgb::WHITE);
        assert_eq!(config.max_brush_size, 400.0);
    }

    #[test]
    fn test_json_round_trip() {
        let config = SurfaceConfig {
            max_symmetry_axes: 12,
            ..SurfaceConfig::default()
        };
        let back = SurfaceConfig::from_json(&config.to_json().unwrap()).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn test_invalid_json() {
        assert!(matches!(SurfaceConfig::from_json("{"), Err(ConfigError::Parse(_))));
        assert!(SurfaceConfig::from_json(r#"{"brush_color": "pink"}"#).is_err());
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("surface.json");
        std::fs::write(&path, r#"{"jpeg_quality": 80}"#).unwrap();
        assert_eq!(SurfaceConfig::from_file(&path).unwrap().jpeg_quality, 80);
        assert!(matches!(
            SurfaceConfig::from_file(dir.path().join("missing.json")),
            Err(ConfigError::Io(_))
        ));
    }
}
