//! Freehand stroke element.

use super::{remap_point, ElementId, ElementStyle, ElementTrait};
use crate::geometry::{normalize_angle, rotate_point, Bounds};
use kurbo::{Point, Vec2};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A freehand stroke. `rect` always wraps `points`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DrawElement {
    pub(crate) id: ElementId,
    pub rect: Bounds,
    pub z_index: i64,
    #[serde(default)]
    pub rotation: f64,
    pub style: ElementStyle,
    pub points: Vec<Point>,
}

impl DrawElement {
    pub fn new(points: Vec<Point>) -> Self {
        let rect = Bounds::from_points(&points).unwrap_or_default();
        Self {
            id: Uuid::new_v4(),
            rect,
            z_index: 0,
            rotation: 0.0,
            style: ElementStyle::default(),
            points,
        }
    }
}

impl ElementTrait for DrawElement {
    fn id(&self) -> ElementId {
        self.id
    }

    fn bounds(&self) -> Bounds {
        self.rect
    }

    fn z_index(&self) -> i64 {
        self.z_index
    }

    fn set_z_index(&mut self, z_index: i64) {
        self.z_index = z_index;
    }

    fn style(&self) -> &ElementStyle {
        &self.style
    }

    fn style_mut(&mut self) -> &mut ElementStyle {
        &mut self.style
    }

    fn translate(&mut self, delta: Vec2) {
        for p in &mut self.points {
            *p += delta;
        }
        self.rect = self.rect.translated(delta);
    }

    fn resize(&mut self, bounds: Bounds) {
        let from = self.rect;
        let to = bounds.normalized();
        for p in &mut self.points {
            *p = remap_point(*p, from, to);
        }
        if let Some(rect) = Bounds::from_points(&self.points) {
            self.rect = rect;
        }
    }

    // The stroke keeps its own shape; only its center orbits the pivot and
    // the angle field records the turn.
    fn rotate_about(&mut self, pivot: Point, delta: f64) {
        let old_center = self.rect.center();
        let new_center = rotate_point(old_center, pivot, delta);
        self.translate(new_center - old_center);
        self.rotation = normalize_angle(self.rotation + delta);
    }
}
