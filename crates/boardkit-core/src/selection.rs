//! Selection set and manipulation handle system.

use crate::geometry::{rotate_point, Bounds};
use kurbo::Point;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Handle hit tolerance in screen pixels.
pub const HANDLE_HIT_TOLERANCE: f64 = 10.0;

/// Distance from the top edge to the rotation handle, in screen pixels.
pub const ROTATE_HANDLE_OFFSET: f64 = 25.0;

/// The two kinds of placed objects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Widget,
    Element,
}

/// Typed reference to a widget or element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityRef {
    #[serde(rename = "type")]
    pub kind: EntityKind,
    pub id: Uuid,
}

impl EntityRef {
    pub fn new(kind: EntityKind, id: Uuid) -> Self {
        Self { kind, id }
    }

    pub fn widget(id: Uuid) -> Self {
        Self::new(EntityKind::Widget, id)
    }

    pub fn element(id: Uuid) -> Self {
        Self::new(EntityKind::Element, id)
    }

    pub fn is_widget(&self) -> bool {
        self.kind == EntityKind::Widget
    }

    pub fn is_element(&self) -> bool {
        self.kind == EntityKind::Element
    }
}

/// Ordered, duplicate-free list of selected entities.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    items: Vec<EntityRef>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(&self) -> &[EntityRef] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn contains(&self, entity: EntityRef) -> bool {
        self.items.contains(&entity)
    }

    pub fn first(&self) -> Option<EntityRef> {
        self.items.first().copied()
    }

    /// The only selected entity, if exactly one is selected.
    pub fn single(&self) -> Option<EntityRef> {
        match self.items.as_slice() {
            [only] => Some(*only),
            _ => None,
        }
    }

    /// Append `entity` unless already present. Returns true if added.
    pub fn insert(&mut self, entity: EntityRef) -> bool {
        if self.contains(entity) {
            return false;
        }
        self.items.push(entity);
        true
    }

    pub fn remove(&mut self, entity: EntityRef) -> bool {
        let before = self.items.len();
        self.items.retain(|e| *e != entity);
        self.items.len() != before
    }

    /// Remove every entry with this id, whatever its kind.
    pub fn remove_id(&mut self, id: Uuid) -> bool {
        let before = self.items.len();
        self.items.retain(|e| e.id != id);
        self.items.len() != before
    }

    /// Replace the contents, dropping duplicates while keeping first-seen order.
    pub fn set(&mut self, entities: impl IntoIterator<Item = EntityRef>) {
        self.items.clear();
        for entity in entities {
            self.insert(entity);
        }
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn retain(&mut self, keep: impl FnMut(&EntityRef) -> bool) {
        self.items.retain(keep);
    }

    pub fn ids(&self) -> impl Iterator<Item = Uuid> + '_ {
        self.items.iter().map(|e| e.id)
    }
}

/// Corner positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Corner {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

/// Edge positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Edge {
    Top,
    Right,
    Bottom,
    Left,
}

/// Type of selection handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HandleKind {
    /// Resizes both axes.
    Corner(Corner),
    /// Resizes one axis.
    Edge(Edge),
    /// Rotation handle (positioned above the top edge).
    Rotate,
}

impl HandleKind {
    pub const RESIZE: [HandleKind; 8] = [
        HandleKind::Corner(Corner::TopLeft),
        HandleKind::Edge(Edge::Top),
        HandleKind::Corner(Corner::TopRight),
        HandleKind::Edge(Edge::Right),
        HandleKind::Corner(Corner::BottomRight),
        HandleKind::Edge(Edge::Bottom),
        HandleKind::Corner(Corner::BottomLeft),
        HandleKind::Edge(Edge::Left),
    ];

    pub fn is_corner(&self) -> bool {
        matches!(self, HandleKind::Corner(_))
    }

    /// Whether dragging this handle moves the left / right / top / bottom edge.
    pub fn moves_edges(&self) -> (bool, bool, bool, bool) {
        match self {
            HandleKind::Corner(Corner::TopLeft) => (true, false, true, false),
            HandleKind::Corner(Corner::TopRight) => (false, true, true, false),
            HandleKind::Corner(Corner::BottomLeft) => (true, false, false, true),
            HandleKind::Corner(Corner::BottomRight) => (false, true, false, true),
            HandleKind::Edge(Edge::Top) => (false, false, true, false),
            HandleKind::Edge(Edge::Right) => (false, true, false, false),
            HandleKind::Edge(Edge::Bottom) => (false, false, false, true),
            HandleKind::Edge(Edge::Left) => (true, false, false, false),
            HandleKind::Rotate => (false, false, false, false),
        }
    }
}

/// A selection handle with its position and type.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Handle {
    /// Position in canvas coordinates.
    pub position: Point,
    pub kind: HandleKind,
}

impl Handle {
    pub fn new(position: Point, kind: HandleKind) -> Self {
        Self { position, kind }
    }

    /// `tolerance` must already be in canvas units.
    pub fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        self.position.distance_squared(point) <= tolerance * tolerance
    }
}

fn handle_offset(bounds: Bounds, kind: HandleKind, rotate_offset: f64) -> (f64, f64) {
    let hw = bounds.width / 2.0;
    let hh = bounds.height / 2.0;
    match kind {
        HandleKind::Corner(Corner::TopLeft) => (-hw, -hh),
        HandleKind::Corner(Corner::TopRight) => (hw, -hh),
        HandleKind::Corner(Corner::BottomLeft) => (-hw, hh),
        HandleKind::Corner(Corner::BottomRight) => (hw, hh),
        HandleKind::Edge(Edge::Top) => (0.0, -hh),
        HandleKind::Edge(Edge::Right) => (hw, 0.0),
        HandleKind::Edge(Edge::Bottom) => (0.0, hh),
        HandleKind::Edge(Edge::Left) => (-hw, 0.0),
        HandleKind::Rotate => (0.0, -hh - rotate_offset),
    }
}

/// Handles for a box rotated by `rotation` about its center.
///
/// `zoom` keeps the rotation handle a constant screen distance away.
pub fn handles_for(bounds: Bounds, rotation: f64, rotatable: bool, zoom: f64) -> Vec<Handle> {
    let bounds = bounds.normalized();
    let center = bounds.center();
    let rotate_offset = ROTATE_HANDLE_OFFSET / zoom;
    let place = |kind: HandleKind| {
        let (dx, dy) = handle_offset(bounds, kind, rotate_offset);
        Handle::new(rotate_point(Point::new(center.x + dx, center.y + dy), center, rotation), kind)
    };
    let mut handles: Vec<Handle> = HandleKind::RESIZE.iter().map(|&kind| place(kind)).collect();
    if rotatable {
        handles.push(place(HandleKind::Rotate));
    }
    handles
}

/// Find which handle (if any) is hit at the given canvas point.
///
/// The rotation handle wins over resize handles when they overlap.
pub fn hit_test_handles(handles: &[Handle], point: Point, tolerance: f64) -> Option<HandleKind> {
    handles
        .iter()
        .rev()
        .find(|h| h.hit_test(point, tolerance))
        .map(|h| h.kind)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    #[test]
    fn test_selection_is_ordered_and_unique() {
        let a = EntityRef::element(Uuid::new_v4());
        let b = EntityRef::widget(Uuid::new_v4());
        let mut selection = Selection::new();
        selection.set([a, b, a]);
        assert_eq!(selection.items(), &[a, b]);
        assert!(!selection.insert(b));
        assert!(selection.remove(a));
        assert_eq!(selection.single(), Some(b));
    }

    #[test]
    fn test_handles_unrotated() {
        let handles = handles_for(Bounds::new(0.0, 0.0, 100.0, 50.0), 0.0, true, 1.0);
        assert_eq!(handles.len(), 9);
        let br = handles.iter().find(|h| h.kind == HandleKind::Corner(Corner::BottomRight)).unwrap();
        assert_eq!(br.position, Point::new(100.0, 50.0));
        let rot = handles.last().unwrap();
        assert_eq!(rot.kind, HandleKind::Rotate);
        assert!((rot.position.y + ROTATE_HANDLE_OFFSET).abs() < 1e-9);
    }

    #[test]
    fn test_handles_follow_rotation() {
        let handles = handles_for(Bounds::new(-50.0, -50.0, 100.0, 100.0), PI / 2.0, true, 1.0);
        let top = handles.iter().find(|h| h.kind == HandleKind::Edge(Edge::Top)).unwrap();
        assert!((top.position.x - 50.0).abs() < 1e-9);
        assert!(top.position.y.abs() < 1e-9);
    }

    #[test]
    fn test_hit_test_handles() {
        let handles = handles_for(Bounds::new(0.0, 0.0, 100.0, 50.0), 0.0, false, 1.0);
        assert_eq!(
            hit_test_handles(&handles, Point::new(3.0, 2.0), HANDLE_HIT_TOLERANCE),
            Some(HandleKind::Corner(Corner::TopLeft))
        );
        assert_eq!(hit_test_handles(&handles, Point::new(50.0, 25.0), HANDLE_HIT_TOLERANCE), None);
    }

    #[test]
    fn test_entity_ref_serializes_type_field() {
        let entity = EntityRef::widget(Uuid::nil());
        let json = serde_json::to_value(entity).unwrap();
        assert_eq!(json["type"], "widget");
    }
}
