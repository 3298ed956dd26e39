//! Geometry kernel: pure functions over canvas-space rectangles and points.

use crate::elements::CanvasElement;
use kurbo::{Affine, Point, Vec2};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::f64::consts::{PI, TAU};
use uuid::Uuid;

/// Slack applied to every half-plane test in [`rects_intersect`].
pub const INTERSECT_EPSILON: f64 = 0.5;

/// Axis-aligned rectangle stored as origin plus size.
///
/// This is the authoritative bounding box of every widget and element. Width
/// and height may be negative while a rect is being drawn from an arbitrary
/// corner; [`Bounds::normalized`] brings it back to canonical form.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Bounds {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Bounds {
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    /// Bounds spanning two arbitrary corner points.
    pub fn from_corners(p1: Point, p2: Point) -> Self {
        Self::new(p1.x, p1.y, p2.x - p1.x, p2.y - p1.y).normalized()
    }

    /// Tight bounds around a point set, `None` when empty.
    pub fn from_points(points: &[Point]) -> Option<Self> {
        let first = points.first()?;
        let (mut x0, mut y0, mut x1, mut y1) = (first.x, first.y, first.x, first.y);
        for p in &points[1..] {
            x0 = x0.min(p.x);
            y0 = y0.min(p.y);
            x1 = x1.max(p.x);
            y1 = y1.max(p.y);
        }
        Some(Self::new(x0, y0, x1 - x0, y1 - y0))
    }

    /// Canonical form with non-negative width and height.
    pub fn normalized(self) -> Self {
        let (x, width) = if self.width < 0.0 { (self.x + self.width, -self.width) } else { (self.x, self.width) };
        let (y, height) = if self.height < 0.0 { (self.y + self.height, -self.height) } else { (self.y, self.height) };
        Self { x, y, width, height }
    }

    pub fn origin(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn translated(self, delta: Vec2) -> Self {
        Self { x: self.x + delta.x, y: self.y + delta.y, ..self }
    }

    pub fn with_origin(self, origin: Point) -> Self {
        Self { x: origin.x, y: origin.y, ..self }
    }

    /// Same size, centered on `center`.
    pub fn with_center(self, center: Point) -> Self {
        Self { x: center.x - self.width / 2.0, y: center.y - self.height / 2.0, ..self }
    }

    pub fn union(self, other: Self) -> Self {
        let x0 = self.x.min(other.x);
        let y0 = self.y.min(other.y);
        let x1 = self.right().max(other.right());
        let y1 = self.bottom().max(other.bottom());
        Self::new(x0, y0, x1 - x0, y1 - y0)
    }

    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.x && point.x <= self.right() && point.y >= self.y && point.y <= self.bottom()
    }
}

/// Normalize a rect drawn from any corner.
pub fn normalize_rect(bounds: Bounds) -> Bounds {
    bounds.normalized()
}

/// Union of a set of bounds, `None` when empty.
pub fn union_bounds(bounds: impl IntoIterator<Item = Bounds>) -> Option<Bounds> {
    bounds.into_iter().reduce(Bounds::union)
}

/// Tolerant rectangle intersection.
///
/// Rects that exactly touch, or miss each other by less than
/// [`INTERSECT_EPSILON`], count as intersecting.
pub fn rects_intersect(a: Bounds, b: Bounds) -> bool {
    let a = a.normalized();
    let b = b.normalized();
    a.x <= b.right() + INTERSECT_EPSILON
        && a.right() + INTERSECT_EPSILON >= b.x
        && a.y <= b.bottom() + INTERSECT_EPSILON
        && a.bottom() + INTERSECT_EPSILON >= b.y
}

/// Rotate `point` by `angle` radians about `pivot`.
pub fn rotate_point(point: Point, pivot: Point, angle: f64) -> Point {
    Affine::rotate_about(angle, pivot) * point
}

/// Normalize an angle into `(-PI, PI]`.
pub fn normalize_angle(angle: f64) -> f64 {
    let mut a = angle % TAU;
    if a <= -PI {
        a += TAU;
    } else if a > PI {
        a -= TAU;
    }
    a
}

/// Angle of `point` as seen from `center`, in radians.
pub fn angle_from(center: Point, point: Point) -> f64 {
    (point.y - center.y).atan2(point.x - center.x)
}

/// Attachment point on a shape's bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Anchor {
    Top,
    Bottom,
    Left,
    Right,
    Center,
}

impl Anchor {
    pub const ALL: [Anchor; 5] = [Anchor::Top, Anchor::Bottom, Anchor::Left, Anchor::Right, Anchor::Center];
}

/// Canvas position of `anchor` on `bounds`.
pub fn anchor_point(bounds: Bounds, anchor: Anchor) -> Point {
    let b = bounds.normalized();
    let c = b.center();
    match anchor {
        Anchor::Top => Point::new(c.x, b.y),
        Anchor::Bottom => Point::new(c.x, b.bottom()),
        Anchor::Left => Point::new(b.x, c.y),
        Anchor::Right => Point::new(b.right(), c.y),
        Anchor::Center => c,
    }
}

/// Result of a nearest-anchor search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnchorHit {
    pub element_id: Uuid,
    pub anchor: Anchor,
    pub point: Point,
    pub distance: f64,
}

/// Find the closest shape anchor within `radius` of `point`.
///
/// Only shape elements (rectangles and ellipses) offer anchors. Ids in
/// `exclude` are skipped. Ties keep the first candidate encountered.
pub fn find_nearest_anchor<'a>(
    point: Point,
    candidates: impl IntoIterator<Item = &'a CanvasElement>,
    exclude: &HashSet<Uuid>,
    radius: f64,
) -> Option<AnchorHit> {
    let mut best: Option<AnchorHit> = None;
    for element in candidates {
        if !element.is_shape() || exclude.contains(&element.id()) {
            continue;
        }
        let bounds = element.bounds();
        for anchor in Anchor::ALL {
            let anchor_pos = anchor_point(bounds, anchor);
            let distance = point.distance(anchor_pos);
            if distance > radius {
                continue;
            }
            if best.is_none_or(|b| distance < b.distance) {
                best = Some(AnchorHit { element_id: element.id(), anchor, point: anchor_pos, distance });
            }
        }
    }
    best
}
