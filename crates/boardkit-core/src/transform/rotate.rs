//! Rotation gestures.
//!
//! A single element turns about its own center. A group turns about the
//! center of the selection box and only the delta is held until release.

use crate::document::Document;
use crate::elements::ElementId;
use crate::geometry::{angle_from, normalize_angle};
use crate::selection::EntityRef;
use crate::snap::snap_angle;
use kurbo::Point;

/// Angle for a single rotation: the initial angle plus how far the pointer
/// has swept around the center, optionally snapped, normalized.
pub fn single_rotation_angle(
    initial_angle: f64,
    initial_pointer_angle: f64,
    center: Point,
    pointer: Point,
    snap_increment: Option<f64>,
) -> f64 {
    let raw = initial_angle + (angle_from(center, pointer) - initial_pointer_angle);
    let snapped = snap_increment.map_or(raw, |inc| snap_angle(raw, inc));
    normalize_angle(snapped)
}

/// Delta for a group rotation, normalized then optionally snapped.
pub fn group_rotation_delta(initial_pointer_angle: f64, pivot: Point, pointer: Point, snap_increment: Option<f64>) -> f64 {
    let raw = normalize_angle(angle_from(pivot, pointer) - initial_pointer_angle);
    snap_increment.map_or(raw, |inc| snap_angle(raw, inc))
}

#[derive(Debug, Clone)]
pub(crate) struct SingleRotate {
    pub element: ElementId,
    pub center: Point,
    pub initial_angle: f64,
    pub initial_pointer_angle: f64,
    pub current: f64,
    pub before: Document,
}

impl SingleRotate {
    pub fn new(element: ElementId, center: Point, initial_angle: f64, pointer: Point, before: Document) -> Self {
        Self {
            element,
            center,
            initial_angle,
            initial_pointer_angle: angle_from(center, pointer),
            current: initial_angle,
            before,
        }
    }

    pub fn update(&mut self, pointer: Point, snap_increment: Option<f64>) {
        self.current =
            single_rotation_angle(self.initial_angle, self.initial_pointer_angle, self.center, pointer, snap_increment);
    }

    pub fn changed(&self) -> bool {
        normalize_angle(self.current - self.initial_angle).abs() > f64::EPSILON
    }
}

#[derive(Debug, Clone)]
pub(crate) struct GroupRotate {
    pub members: Vec<EntityRef>,
    pub pivot: Point,
    pub initial_pointer_angle: f64,
    pub delta: f64,
    pub before: Document,
}

impl GroupRotate {
    pub fn new(members: Vec<EntityRef>, pivot: Point, pointer: Point, before: Document) -> Self {
        Self { members, pivot, initial_pointer_angle: angle_from(pivot, pointer), delta: 0.0, before }
    }

    pub fn update(&mut self, pointer: Point, snap_increment: Option<f64>) {
        self.delta = group_rotation_delta(self.initial_pointer_angle, self.pivot, pointer, snap_increment);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::{FRAC_PI_2, PI};

    const STEP: f64 = PI / 12.0;

    #[test]
    fn test_single_rotation_adds_sweep() {
        let center = Point::ZERO;
        let start = Point::new(10.0, 0.0);
        let initial_pointer = angle_from(center, start);
        let angle = single_rotation_angle(0.3, initial_pointer, center, Point::new(0.0, 10.0), None);
        assert!((angle - (0.3 + FRAC_PI_2)).abs() < 1e-9);
    }

    #[test]
    fn test_single_rotation_normalizes() {
        let center = Point::ZERO;
        let angle = single_rotation_angle(PI - 0.1, 0.0, center, Point::new(0.0, 10.0), None);
        assert!(angle > -PI && angle <= PI);
        assert!((angle - (PI - 0.1 + FRAC_PI_2 - 2.0 * PI)).abs() < 1e-9);
    }

    #[test]
    fn test_single_rotation_snaps() {
        let center = Point::ZERO;
        let pointer = Point::new(10.0 * 0.4_f64.cos(), 10.0 * 0.4_f64.sin());
        let angle = single_rotation_angle(0.0, 0.0, center, pointer, Some(STEP));
        assert!((angle - 2.0 * STEP).abs() < 1e-9);
    }

    #[test]
    fn test_group_delta_snaps_92_to_90() {
        let pivot = Point::new(50.0, 50.0);
        let raw = 92.0_f64.to_radians();
        let pointer = Point::new(pivot.x + 100.0 * raw.cos(), pivot.y + 100.0 * raw.sin());
        let delta = group_rotation_delta(0.0, pivot, pointer, Some(STEP));
        assert!((delta - FRAC_PI_2).abs() < 1e-12);
        let unsnapped = group_rotation_delta(0.0, pivot, pointer, None);
        assert!((unsnapped - raw).abs() < 1e-9);
    }
}
