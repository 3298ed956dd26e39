//! Handle-driven resizing, for one entity or a proportional group.

use crate::document::Document;
use crate::geometry::{rotate_point, Bounds};
use crate::selection::{EntityRef, HandleKind};
use crate::snap::GridSnap;
use kurbo::{Point, Size, Vec2};

/// Resize `original` by dragging `handle` by `delta` (canvas units).
///
/// Each axis is floored at `min`. When the floor is reached the edge
/// opposite the handle stays where it was. With `keep_aspect` (corner
/// handles only) the axis that changed more drives the other one.
pub fn resize_bounds(original: Bounds, handle: HandleKind, delta: Vec2, min: Size, keep_aspect: bool) -> Bounds {
    let original = original.normalized();
    let (moves_left, moves_right, moves_top, moves_bottom) = handle.moves_edges();

    let mut left = original.x + if moves_left { delta.x } else { 0.0 };
    let mut right = original.right() + if moves_right { delta.x } else { 0.0 };
    let mut top = original.y + if moves_top { delta.y } else { 0.0 };
    let mut bottom = original.bottom() + if moves_bottom { delta.y } else { 0.0 };

    if right - left < min.width {
        if moves_left {
            left = right - min.width;
        } else {
            right = left + min.width;
        }
    }
    if bottom - top < min.height {
        if moves_top {
            top = bottom - min.height;
        } else {
            bottom = top + min.height;
        }
    }

    if keep_aspect && handle.is_corner() && original.width > 0.0 && original.height > 0.0 {
        let ratio = original.width / original.height;
        let mut width = right - left;
        let mut height = bottom - top;
        let scale_x = width / original.width;
        let scale_y = height / original.height;
        if (scale_x - 1.0).abs() >= (scale_y - 1.0).abs() {
            height = width / ratio;
        } else {
            width = height * ratio;
        }
        if width < min.width {
            width = min.width;
            height = width / ratio;
        }
        if height < min.height {
            height = min.height;
            width = height * ratio;
        }
        if moves_left {
            left = right - width;
        } else {
            right = left + width;
        }
        if moves_top {
            top = bottom - height;
        } else {
            bottom = top + height;
        }
    }

    Bounds::new(left, top, right - left, bottom - top)
}

/// Snap the edges `handle` moves to the grid, leaving the others alone.
///
/// An axis whose snapped size would fall under `min` is left unsnapped.
pub fn snap_moving_edges(bounds: Bounds, handle: HandleKind, grid: GridSnap, min: Size) -> Bounds {
    if !grid.enabled {
        return bounds;
    }
    let (moves_left, moves_right, moves_top, moves_bottom) = handle.moves_edges();
    let mut left = bounds.x;
    let mut right = bounds.right();
    let mut top = bounds.y;
    let mut bottom = bounds.bottom();

    let snapped_left = if moves_left { grid.snap(left) } else { left };
    let snapped_right = if moves_right { grid.snap(right) } else { right };
    if snapped_right - snapped_left >= min.width {
        left = snapped_left;
        right = snapped_right;
    }
    let snapped_top = if moves_top { grid.snap(top) } else { top };
    let snapped_bottom = if moves_bottom { grid.snap(bottom) } else { bottom };
    if snapped_bottom - snapped_top >= min.height {
        top = snapped_top;
        bottom = snapped_bottom;
    }
    Bounds::new(left, top, right - left, bottom - top)
}

/// Shift `resized` so the edge pinned during an unrotated resize stays put
/// on screen when the box is drawn rotated by `rotation` about its center.
pub fn compensate_rotation(original: Bounds, resized: Bounds, rotation: f64) -> Bounds {
    if rotation == 0.0 {
        return resized;
    }
    let d = original.center() - resized.center();
    let turned = rotate_point(Point::ZERO + d, Point::ZERO, rotation).to_vec2();
    resized.translated(d - turned)
}

/// Place a rect expressed relative to a frame into `to`.
fn map_relative(rel: Bounds, to: Bounds) -> Bounds {
    Bounds::new(to.x + rel.x * to.width, to.y + rel.y * to.height, rel.width * to.width, rel.height * to.height)
}

fn relative_to(rect: Bounds, frame: Bounds) -> Bounds {
    let fx = |v: f64| if frame.width > 0.0 { v / frame.width } else { 0.0 };
    let fy = |v: f64| if frame.height > 0.0 { v / frame.height } else { 0.0 };
    Bounds::new(fx(rect.x - frame.x), fy(rect.y - frame.y), fx(rect.width), fy(rect.height))
}

/// Live state of a single-entity resize.
#[derive(Debug, Clone)]
pub(crate) struct SingleResize {
    pub entity: EntityRef,
    pub handle: HandleKind,
    pub start: Point,
    pub original: Bounds,
    pub rotation: f64,
    pub min: Size,
    pub current: Bounds,
    pub before: Document,
}

impl SingleResize {
    pub fn update(&mut self, pointer: Point, zoom: f64, keep_aspect: bool) {
        let world = (pointer - self.start) / zoom;
        // Handles turn with the entity, so the drag is measured in its own frame.
        let local = rotate_point(Point::ZERO + world, Point::ZERO, -self.rotation).to_vec2();
        let resized = resize_bounds(self.original, self.handle, local, self.min, keep_aspect);
        self.current = compensate_rotation(self.original, resized, self.rotation);
    }

    /// Final rect, grid-snapped when the entity is axis-aligned.
    pub fn committed(&self, grid: GridSnap) -> Bounds {
        if self.rotation == 0.0 { snap_moving_edges(self.current, self.handle, grid, self.min) } else { self.current }
    }
}

/// One member of a group resize, held relative to the group's box.
#[derive(Debug, Clone)]
pub(crate) struct GroupMember {
    pub entity: EntityRef,
    pub relative: Bounds,
    pub min: Size,
}

/// Live state of a proportional group resize.
#[derive(Debug, Clone)]
pub(crate) struct GroupResize {
    pub handle: HandleKind,
    pub start: Point,
    pub original: Bounds,
    pub min: Size,
    pub members: Vec<GroupMember>,
    pub current: Bounds,
    pub before: Document,
}

impl GroupResize {
    pub fn new(
        handle: HandleKind,
        start: Point,
        original: Bounds,
        min: Size,
        members: impl IntoIterator<Item = (EntityRef, Bounds, Size)>,
        before: Document,
    ) -> Self {
        let members = members
            .into_iter()
            .map(|(entity, rect, min)| GroupMember { entity, relative: relative_to(rect, original), min })
            .collect();
        Self { handle, start, original, min, members, current: original, before }
    }

    pub fn update(&mut self, pointer: Point, zoom: f64, keep_aspect: bool) {
        let delta = (pointer - self.start) / zoom;
        self.current = resize_bounds(self.original, self.handle, delta, self.min, keep_aspect);
    }

    /// Member rects inside `frame`, clamped to each member's minimum.
    pub fn member_rects(&self, frame: Bounds) -> Vec<(EntityRef, Bounds)> {
        self.members
            .iter()
            .map(|m| {
                let mut rect = map_relative(m.relative, frame);
                rect.width = rect.width.max(m.min.width);
                rect.height = rect.height.max(m.min.height);
                (m.entity, rect)
            })
            .collect()
    }

    pub fn preview(&self, entity: EntityRef) -> Option<Bounds> {
        let member = self.members.iter().find(|m| m.entity == entity)?;
        self.member_rects(self.current).into_iter().find(|(e, _)| *e == member.entity).map(|(_, r)| r)
    }

    pub fn committed_frame(&self, grid: GridSnap) -> Bounds {
        snap_moving_edges(self.current, self.handle, grid, self.min)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selection::{Corner, Edge};
    use std::f64::consts::FRAC_PI_2;
    use uuid::Uuid;

    const MIN: Size = Size::new(10.0, 10.0);

    fn approx_bounds(a: Bounds, b: Bounds) -> bool {
        (a.x - b.x).abs() < 1e-9
            && (a.y - b.y).abs() < 1e-9
            && (a.width - b.width).abs() < 1e-9
            && (a.height - b.height).abs() < 1e-9
    }

    #[test]
    fn test_corner_moves_both_axes() {
        let r = resize_bounds(
            Bounds::new(0.0, 0.0, 100.0, 50.0),
            HandleKind::Corner(Corner::BottomRight),
            Vec2::new(20.0, 10.0),
            MIN,
            false,
        );
        assert_eq!(r, Bounds::new(0.0, 0.0, 120.0, 60.0));
    }

    #[test]
    fn test_edge_moves_one_axis() {
        let r = resize_bounds(
            Bounds::new(0.0, 0.0, 100.0, 50.0),
            HandleKind::Edge(Edge::Left),
            Vec2::new(30.0, 99.0),
            MIN,
            false,
        );
        assert_eq!(r, Bounds::new(30.0, 0.0, 70.0, 50.0));
    }

    #[test]
    fn test_floor_pins_opposite_edge() {
        let r = resize_bounds(
            Bounds::new(0.0, 0.0, 100.0, 50.0),
            HandleKind::Corner(Corner::TopLeft),
            Vec2::new(500.0, 500.0),
            MIN,
            false,
        );
        assert_eq!(r, Bounds::new(90.0, 40.0, 10.0, 10.0));
    }

    #[test]
    fn test_aspect_lock_follows_larger_change() {
        let r = resize_bounds(
            Bounds::new(0.0, 0.0, 100.0, 50.0),
            HandleKind::Corner(Corner::BottomRight),
            Vec2::new(100.0, 10.0),
            MIN,
            true,
        );
        assert!(approx_bounds(r, Bounds::new(0.0, 0.0, 200.0, 100.0)));

        let edge = resize_bounds(
            Bounds::new(0.0, 0.0, 100.0, 50.0),
            HandleKind::Edge(Edge::Right),
            Vec2::new(100.0, 0.0),
            MIN,
            true,
        );
        assert_eq!(edge, Bounds::new(0.0, 0.0, 200.0, 50.0));
    }

    #[test]
    fn test_aspect_lock_anchors_opposite_corner() {
        let r = resize_bounds(
            Bounds::new(0.0, 0.0, 100.0, 100.0),
            HandleKind::Corner(Corner::TopLeft),
            Vec2::new(-50.0, -10.0),
            MIN,
            true,
        );
        assert!(approx_bounds(r, Bounds::new(-50.0, -50.0, 150.0, 150.0)));
    }

    #[test]
    fn test_snap_moving_edges_only() {
        let grid = GridSnap::new(true, 20.0);
        let r = snap_moving_edges(Bounds::new(3.0, 3.0, 104.0, 50.0), HandleKind::Edge(Edge::Right), grid, MIN);
        assert_eq!(r, Bounds::new(3.0, 3.0, 97.0, 50.0));
    }

    #[test]
    fn test_rotated_resize_keeps_pinned_edge() {
        let original = Bounds::new(-50.0, -50.0, 100.0, 100.0);
        let resized = resize_bounds(original, HandleKind::Edge(Edge::Right), Vec2::new(50.0, 0.0), MIN, false);
        let fixed = compensate_rotation(original, resized, FRAC_PI_2);
        // The left edge midpoint, drawn rotated, must not move.
        let before = rotate_point(Point::new(original.x, 0.0), original.center(), FRAC_PI_2);
        let after = rotate_point(Point::new(fixed.x, fixed.center().y), fixed.center(), FRAC_PI_2);
        assert!((before - after).hypot() < 1e-9);
    }

    #[test]
    fn test_group_maps_relative_rects() {
        let a = EntityRef::element(Uuid::new_v4());
        let b = EntityRef::widget(Uuid::new_v4());
        let mut resize = GroupResize::new(
            HandleKind::Corner(Corner::BottomRight),
            Point::ZERO,
            Bounds::new(0.0, 0.0, 200.0, 100.0),
            MIN,
            [(a, Bounds::new(0.0, 0.0, 50.0, 50.0), MIN), (b, Bounds::new(100.0, 50.0, 100.0, 50.0), MIN)],
            Document::new("t"),
        );
        resize.update(Point::new(200.0, 100.0), 1.0, false);
        assert_eq!(resize.current, Bounds::new(0.0, 0.0, 400.0, 200.0));
        assert_eq!(resize.preview(a), Some(Bounds::new(0.0, 0.0, 100.0, 100.0)));
        assert_eq!(resize.preview(b), Some(Bounds::new(200.0, 100.0, 200.0, 100.0)));
    }

    #[test]
    fn test_group_members_clamped_to_minimum() {
        let a = EntityRef::widget(Uuid::new_v4());
        let mut resize = GroupResize::new(
            HandleKind::Corner(Corner::BottomRight),
            Point::ZERO,
            Bounds::new(0.0, 0.0, 100.0, 100.0),
            MIN,
            [(a, Bounds::new(0.0, 0.0, 100.0, 100.0), Size::new(80.0, 80.0))],
            Document::new("t"),
        );
        resize.update(Point::new(-50.0, -50.0), 1.0, false);
        assert_eq!(resize.preview(a), Some(Bounds::new(0.0, 0.0, 80.0, 80.0)));
    }
}
