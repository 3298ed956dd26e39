//! Grid and angle snapping.
//!
//! Snapping is applied when a gesture commits, never to live previews.

use kurbo::Point;

/// Result of a snap operation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SnapResult {
    /// The snapped point.
    pub point: Point,
    /// Whether the X coordinate was snapped.
    pub snapped_x: bool,
    /// Whether the Y coordinate was snapped.
    pub snapped_y: bool,
}

impl SnapResult {
    /// Create a result with no snapping.
    pub fn none(point: Point) -> Self {
        Self { point, snapped_x: false, snapped_y: false }
    }

    /// Check if any snapping occurred.
    pub fn is_snapped(&self) -> bool {
        self.snapped_x || self.snapped_y
    }
}

/// Grid snapping settings for one document.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridSnap {
    pub enabled: bool,
    pub spacing: f64,
}

impl GridSnap {
    pub fn new(enabled: bool, spacing: f64) -> Self {
        Self { enabled, spacing }
    }

    /// Snap a single coordinate. Identity when disabled.
    pub fn snap(&self, value: f64) -> f64 {
        if self.enabled { snap_value(value, self.spacing) } else { value }
    }

    /// Snap a point. Identity when disabled.
    pub fn snap_point(&self, point: Point) -> SnapResult {
        if self.enabled { snap_to_grid(point, self.spacing) } else { SnapResult::none(point) }
    }
}

/// Round a coordinate to the nearest grid line.
///
/// Idempotent: a value already on a grid line maps to itself.
pub fn snap_value(value: f64, grid_size: f64) -> f64 {
    if grid_size <= 0.0 {
        return value;
    }
    let snapped = (value / grid_size).round() * grid_size;
    // Avoid handing out -0.0, which would break bitwise snapshot equality.
    if snapped == 0.0 { 0.0 } else { snapped }
}

/// Snap a point to the nearest grid intersection.
pub fn snap_to_grid(point: Point, grid_size: f64) -> SnapResult {
    SnapResult {
        point: Point::new(snap_value(point.x, grid_size), snap_value(point.y, grid_size)),
        snapped_x: true,
        snapped_y: true,
    }
}

/// Snap an angle (radians) to the nearest multiple of `increment` (radians).
pub fn snap_angle(angle: f64, increment: f64) -> f64 {
    if increment <= 0.0 {
        return angle;
    }
    (angle / increment).round() * increment
}
