//! Line and arrow elements, and their shape bindings.

use super::{remap_point, ElementId, ElementStyle, ElementTrait};
use crate::geometry::{rotate_point, Anchor, Bounds};
use kurbo::{Point, Vec2};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Which end of a line or arrow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BindingEnd {
    Start,
    End,
}

/// Derived-position link from an endpoint to an anchor on a shape.
///
/// The endpoint coordinates are recomputed from the target's rect whenever
/// the target moves; they are never an independent source of truth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArrowBinding {
    pub element_id: ElementId,
    pub anchor: Anchor,
}

/// The two endpoints of a line or arrow.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinePoints {
    pub start: Point,
    pub end: Point,
}

impl LinePoints {
    pub fn get(&self, end: BindingEnd) -> Point {
        match end {
            BindingEnd::Start => self.start,
            BindingEnd::End => self.end,
        }
    }

    pub fn set(&mut self, end: BindingEnd, point: Point) {
        match end {
            BindingEnd::Start => self.start = point,
            BindingEnd::End => self.end = point,
        }
    }
}

/// A straight line or arrow. The arrowhead, if any, sits at `end`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinearElement {
    pub(crate) id: ElementId,
    /// Always the tight bounds of `points`.
    pub rect: Bounds,
    pub z_index: i64,
    pub style: ElementStyle,
    pub points: LinePoints,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_binding: Option<ArrowBinding>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_binding: Option<ArrowBinding>,
}

impl LinearElement {
    pub fn new(start: Point, end: Point) -> Self {
        let mut line = Self {
            id: Uuid::new_v4(),
            rect: Bounds::default(),
            z_index: 0,
            style: ElementStyle::default(),
            points: LinePoints { start, end },
            start_binding: None,
            end_binding: None,
        };
        line.sync_rect();
        line
    }

    /// Recompute `rect` from the endpoints.
    pub fn sync_rect(&mut self) {
        if let Some(rect) = Bounds::from_points(&[self.points.start, self.points.end]) {
            self.rect = rect;
        }
    }

    /// Move one endpoint and keep `rect` consistent.
    pub fn set_endpoint(&mut self, end: BindingEnd, point: Point) {
        self.points.set(end, point);
        self.sync_rect();
    }

    pub fn binding(&self, end: BindingEnd) -> Option<ArrowBinding> {
        match end {
            BindingEnd::Start => self.start_binding,
            BindingEnd::End => self.end_binding,
        }
    }

    pub fn set_binding(&mut self, end: BindingEnd, binding: Option<ArrowBinding>) {
        match end {
            BindingEnd::Start => self.start_binding = binding,
            BindingEnd::End => self.end_binding = binding,
        }
    }

    /// Endpoints currently bound to `target`.
    pub fn ends_bound_to(&self, target: ElementId) -> Vec<(BindingEnd, Anchor)> {
        [BindingEnd::Start, BindingEnd::End]
            .into_iter()
            .filter_map(|end| {
                self.binding(end)
                    .filter(|b| b.element_id == target)
                    .map(|b| (end, b.anchor))
            })
            .collect()
    }

    pub fn length(&self) -> f64 {
        self.points.start.distance(self.points.end)
    }
}

impl ElementTrait for LinearElement {
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
        self.points.start += delta;
        self.points.end += delta;
        self.rect = self.rect.translated(delta);
    }

    fn resize(&mut self, bounds: Bounds) {
        let from = self.rect;
        let to = bounds.normalized();
        self.points.start = remap_point(self.points.start, from, to);
        self.points.end = remap_point(self.points.end, from, to);
        self.sync_rect();
    }

    fn rotate_about(&mut self, pivot: Point, delta: f64) {
        self.points.start = rotate_point(self.points.start, pivot, delta);
        self.points.end = rotate_point(self.points.end, pivot, delta);
        self.sync_rect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    #[test]
    fn test_rect_follows_points() {
        let line = LinearElement::new(Point::new(100.0, 10.0), Point::new(20.0, 50.0));
        assert_eq!(line.rect, Bounds::new(20.0, 10.0, 80.0, 40.0));
    }

    #[test]
    fn test_resize_scales_points() {
        let mut line = LinearElement::new(Point::new(0.0, 0.0), Point::new(100.0, 50.0));
        line.resize(Bounds::new(10.0, 10.0, 200.0, 100.0));
        assert_eq!(line.points.start, Point::new(10.0, 10.0));
        assert_eq!(line.points.end, Point::new(210.0, 110.0));
        assert_eq!(line.rect, Bounds::new(10.0, 10.0, 200.0, 100.0));
    }

    #[test]
    fn test_resize_flat_line_keeps_rect_consistent() {
        let mut line = LinearElement::new(Point::new(0.0, 5.0), Point::new(100.0, 5.0));
        line.resize(Bounds::new(0.0, 0.0, 50.0, 40.0));
        assert_eq!(line.points.end, Point::new(50.0, 0.0));
        assert_eq!(line.rect.height, 0.0);
    }

    #[test]
    fn test_rotate_endpoints() {
        let mut line = LinearElement::new(Point::new(-10.0, 0.0), Point::new(10.0, 0.0));
        line.rotate_about(Point::ZERO, PI / 2.0);
        assert!(line.points.start.x.abs() < 1e-9);
        assert!((line.points.start.y + 10.0).abs() < 1e-9);
        assert!((line.rect.height - 20.0).abs() < 1e-9);
        assert!(line.rect.width.abs() < 1e-9);
    }

    #[test]
    fn test_ends_bound_to() {
        let mut line = LinearElement::new(Point::ZERO, Point::new(10.0, 0.0));
        let target = Uuid::new_v4();
        line.set_binding(BindingEnd::End, Some(ArrowBinding { element_id: target, anchor: Anchor::Left }));
        assert_eq!(line.ends_bound_to(target), vec![(BindingEnd::End, Anchor::Left)]);
        assert!(line.ends_bound_to(Uuid::new_v4()).is_empty());
    }
}
