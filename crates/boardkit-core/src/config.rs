//! Engine configuration.

use crate::error::{EngineError, EngineResult};
use serde::{Deserialize, Serialize};

/// Grid spacing used for new documents (matches the visual grid).
pub const DEFAULT_GRID_SPACING: f64 = 20.0;

/// Minimum width/height of a native element, in canvas units.
pub const MIN_ELEMENT_SIZE: f64 = 10.0;

/// Tunables for the document engine.
///
/// Every field has a default, so a partial JSON object is a valid config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineConfig {
    /// Maximum number of undo entries kept.
    pub max_history: usize,
    /// Grid spacing assigned to newly created documents.
    pub grid_spacing: f64,
    /// Whether new documents snap to the grid.
    pub snap_to_grid: bool,
    /// Minimum element width/height.
    pub min_element_size: f64,
    /// Minimum widget width when the owning module is not installed.
    pub min_widget_width: f64,
    /// Minimum widget height when the owning module is not installed.
    pub min_widget_height: f64,
    /// Offset applied to duplicates and pastes.
    pub duplicate_offset: f64,
    /// Arrow-to-shape binding search radius, in screen pixels.
    pub binding_radius_px: f64,
    /// Rotation snap increment, in degrees.
    pub rotation_snap_degrees: f64,
    /// Quiet period before a debounced history capture fires.
    pub capture_debounce_ms: u64,
    /// Smallest allowed viewport zoom.
    pub min_zoom: f64,
    /// Largest allowed viewport zoom.
    pub max_zoom: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_history: 100,
            grid_spacing: DEFAULT_GRID_SPACING,
            snap_to_grid: false,
            min_element_size: MIN_ELEMENT_SIZE,
            min_widget_width: 40.0,
            min_widget_height: 40.0,
            duplicate_offset: 20.0,
            binding_radius_px: 20.0,
            rotation_snap_degrees: 15.0,
            capture_debounce_ms: 500,
            min_zoom: 0.1,
            max_zoom: 5.0,
        }
    }
}

impl EngineConfig {
    /// Parse a configuration from JSON and validate it.
    pub fn from_json(json: &str) -> EngineResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that all sizes are positive and the zoom range is sane.
    pub fn validate(&self) -> EngineResult<()> {
        if self.max_history == 0 {
            return Err(EngineError::Config("maxHistory must be at least 1".into()));
        }
        let positive = [
            ("gridSpacing", self.grid_spacing),
            ("minElementSize", self.min_element_size),
            ("minWidgetWidth", self.min_widget_width),
            ("minWidgetHeight", self.min_widget_height),
            ("bindingRadiusPx", self.binding_radius_px),
            ("rotationSnapDegrees", self.rotation_snap_degrees),
            ("minZoom", self.min_zoom),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(EngineError::Config(format!("{name} must be positive, got {value}")));
            }
        }
        if self.max_zoom < self.min_zoom {
            return Err(EngineError::Config(format!(
                "maxZoom ({}) is below minZoom ({})",
                self.max_zoom, self.min_zoom
            )));
        }
        Ok(())
    }

    /// Rotation snap increment in radians.
    pub fn rotation_snap_radians(&self) -> f64 {
        self.rotation_snap_degrees.to_radians()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(EngineConfig::default().validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = EngineConfig::from_json(r#"{ "maxHistory": 5, "snapToGrid": true }"#).unwrap();
        assert_eq!(config.max_history, 5);
        assert!(config.snap_to_grid);
        assert!((config.grid_spacing - DEFAULT_GRID_SPACING).abs() < f64::EPSILON);
    }

    #[test]
    fn test_rejects_inverted_zoom() {
        let result = EngineConfig::from_json(r#"{ "minZoom": 2.0, "maxZoom": 1.0 }"#);
        assert!(matches!(result, Err(EngineError::Config(_))));
    }

    #[test]
    fn test_rejects_bad_json() {
        let result = EngineConfig::from_json("{ not json");
        assert!(matches!(result, Err(EngineError::Serialization(_))));
    }
}
