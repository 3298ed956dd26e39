//! Rectangle and ellipse elements.

use super::{ElementId, ElementStyle, ElementTrait};
use crate::geometry::{normalize_angle, rotate_point, Bounds};
use kurbo::{Point, Vec2};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A closed shape filling its bounding box. Arrows can bind to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShapeElement {
    pub(crate) id: ElementId,
    pub rect: Bounds,
    pub z_index: i64,
    /// Rotation angle in radians (around center).
    #[serde(default)]
    pub rotation: f64,
    pub style: ElementStyle,
    /// Text drawn inside the shape.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl ShapeElement {
    pub fn new(rect: Bounds) -> Self {
        Self {
            id: Uuid::new_v4(),
            rect: rect.normalized(),
            z_index: 0,
            rotation: 0.0,
            style: ElementStyle::default(),
            label: None,
        }
    }
}

impl ElementTrait for ShapeElement {
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
        self.rect = self.rect.translated(delta);
    }

    fn resize(&mut self, bounds: Bounds) {
        self.rect = bounds.normalized();
    }

    fn rotate_about(&mut self, pivot: Point, delta: f64) {
        let center = rotate_point(self.rect.center(), pivot, delta);
        self.rect = self.rect.with_center(center);
        self.rotation = normalize_angle(self.rotation + delta);
    }
}
