//! The board document: everything that is saved and snapshotted.

use crate::config::DEFAULT_GRID_SPACING;
use crate::connection::Connection;
use crate::elements::{CanvasElement, ElementId, SerializableColor};
use crate::error::EngineResult;
use crate::geometry::{union_bounds, Bounds};
use crate::selection::{EntityKind, EntityRef};
use crate::snap::GridSnap;
use crate::widget::{Widget, WidgetId};
use kurbo::{Affine, Point, Size, Vec2};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

/// Unique identifier for groups.
pub type GroupId = Uuid;

/// Milliseconds since the UNIX epoch.
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Pan and zoom of the board view.
///
/// `screen = canvas * zoom + (x, y)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub x: f64,
    pub y: f64,
    pub zoom: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self { x: 0.0, y: 0.0, zoom: 1.0 }
    }
}

impl Viewport {
    pub fn offset(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    /// Canvas to screen transform.
    pub fn transform(&self) -> Affine {
        Affine::translate(self.offset()) * Affine::scale(self.zoom)
    }

    pub fn screen_to_canvas(&self, screen_point: Point) -> Point {
        self.transform().inverse() * screen_point
    }

    pub fn canvas_to_screen(&self, canvas_point: Point) -> Point {
        self.transform() * canvas_point
    }

    /// Pan by a delta in screen coordinates.
    pub fn pan(&mut self, delta: Vec2) {
        self.x += delta.x;
        self.y += delta.y;
    }

    /// Zoom by `factor`, keeping `screen_point` fixed. Returns false when the
    /// clamped zoom did not change.
    pub fn zoom_at(&mut self, screen_point: Point, factor: f64, min_zoom: f64, max_zoom: f64) -> bool {
        let new_zoom = (self.zoom * factor).clamp(min_zoom, max_zoom);
        if (new_zoom - self.zoom).abs() < f64::EPSILON {
            return false;
        }
        let anchor = self.screen_to_canvas(screen_point);
        self.zoom = new_zoom;
        let moved = self.canvas_to_screen(anchor);
        self.pan(screen_point - moved);
        true
    }

    /// Center `bounds` in a view of `view_size`, leaving `padding` pixels.
    pub fn fit_to_bounds(&mut self, bounds: Bounds, view_size: Size, padding: f64, min_zoom: f64, max_zoom: f64) {
        let bounds = bounds.normalized();
        if bounds.width <= 0.0 || bounds.height <= 0.0 {
            let center = bounds.center();
            self.zoom = 1.0;
            self.x = view_size.width / 2.0 - center.x;
            self.y = view_size.height / 2.0 - center.y;
            return;
        }
        let usable_w = (view_size.width - padding * 2.0).max(1.0);
        let usable_h = (view_size.height - padding * 2.0).max(1.0);
        self.zoom = (usable_w / bounds.width).min(usable_h / bounds.height).clamp(min_zoom, max_zoom);
        let center = bounds.center();
        self.x = view_size.width / 2.0 - center.x * self.zoom;
        self.y = view_size.height / 2.0 - center.y * self.zoom;
    }
}

/// Background pattern drawn behind the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackgroundPattern {
    None,
    #[default]
    Dots,
    Grid,
    Lines,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Background {
    pub color: SerializableColor,
    #[serde(default)]
    pub pattern: BackgroundPattern,
}

impl Default for Background {
    fn default() -> Self {
        Self { color: SerializableColor::new(250, 250, 250, 255), pattern: BackgroundPattern::default() }
    }
}

/// Grid settings. `grid_spacing` is fixed once the document is created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanvasSettings {
    pub grid_spacing: f64,
    #[serde(default)]
    pub snap_to_grid: bool,
    #[serde(default = "default_show_grid")]
    pub show_grid: bool,
}

fn default_show_grid() -> bool {
    true
}

impl Default for CanvasSettings {
    fn default() -> Self {
        Self { grid_spacing: DEFAULT_GRID_SPACING, snap_to_grid: false, show_grid: true }
    }
}

impl CanvasSettings {
    pub fn grid(&self) -> GridSnap {
        GridSnap::new(self.snap_to_grid, self.grid_spacing)
    }
}

/// A set of elements that move, resize and rotate together.
///
/// Groups partition elements: an element is a member of at most one group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementGroup {
    pub id: GroupId,
    pub member_ids: Vec<ElementId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentMeta {
    pub id: Uuid,
    pub title: String,
    pub created_at: u64,
    pub updated_at: u64,
}

/// The placed content of a board.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Board {
    pub viewport: Viewport,
    pub widgets: Vec<Widget>,
    pub elements: Vec<CanvasElement>,
    #[serde(default)]
    pub groups: Vec<ElementGroup>,
    #[serde(default)]
    pub connections: Vec<Connection>,
    #[serde(default)]
    pub background: Background,
    #[serde(default)]
    pub canvas_settings: CanvasSettings,
}

impl Board {
    pub fn widget(&self, id: WidgetId) -> Option<&Widget> {
        self.widgets.iter().find(|w| w.id == id)
    }

    pub fn widget_mut(&mut self, id: WidgetId) -> Option<&mut Widget> {
        self.widgets.iter_mut().find(|w| w.id == id)
    }

    pub fn element(&self, id: ElementId) -> Option<&CanvasElement> {
        self.elements.iter().find(|e| e.id() == id)
    }

    pub fn element_mut(&mut self, id: ElementId) -> Option<&mut CanvasElement> {
        self.elements.iter_mut().find(|e| e.id() == id)
    }

    pub fn contains(&self, entity: EntityRef) -> bool {
        match entity.kind {
            EntityKind::Widget => self.widget(entity.id).is_some(),
            EntityKind::Element => self.element(entity.id).is_some(),
        }
    }

    /// Resolve a bare id to whichever entity kind owns it.
    pub fn entity_ref(&self, id: Uuid) -> Option<EntityRef> {
        if self.widget(id).is_some() {
            Some(EntityRef::widget(id))
        } else if self.element(id).is_some() {
            Some(EntityRef::element(id))
        } else {
            None
        }
    }

    pub fn entity_bounds(&self, entity: EntityRef) -> Option<Bounds> {
        match entity.kind {
            EntityKind::Widget => self.widget(entity.id).map(|w| w.rect),
            EntityKind::Element => self.element(entity.id).map(CanvasElement::bounds),
        }
    }

    pub fn entity_z(&self, entity: EntityRef) -> Option<i64> {
        match entity.kind {
            EntityKind::Widget => self.widget(entity.id).map(|w| w.z_index),
            EntityKind::Element => self.element(entity.id).map(CanvasElement::z_index),
        }
    }

    pub fn set_entity_z(&mut self, entity: EntityRef, z_index: i64) -> bool {
        match entity.kind {
            EntityKind::Widget => self.widget_mut(entity.id).map(|w| w.z_index = z_index).is_some(),
            EntityKind::Element => self.element_mut(entity.id).map(|e| e.set_z_index(z_index)).is_some(),
        }
    }

    /// Every entity, in no particular order.
    pub fn entity_refs(&self) -> impl Iterator<Item = EntityRef> + '_ {
        self.widgets
            .iter()
            .map(|w| EntityRef::widget(w.id))
            .chain(self.elements.iter().map(|e| EntityRef::element(e.id())))
    }

    fn z_values(&self) -> impl Iterator<Item = i64> + '_ {
        self.widgets.iter().map(|w| w.z_index).chain(self.elements.iter().map(CanvasElement::z_index))
    }

    /// Highest z-index across widgets and elements.
    pub fn max_z(&self) -> Option<i64> {
        self.z_values().max()
    }

    /// Lowest z-index across widgets and elements.
    pub fn min_z(&self) -> Option<i64> {
        self.z_values().min()
    }

    /// The z-index a new or raised entity receives.
    pub fn next_z(&self) -> i64 {
        self.max_z().map_or(1, |z| z + 1)
    }

    pub fn group(&self, id: GroupId) -> Option<&ElementGroup> {
        self.groups.iter().find(|g| g.id == id)
    }

    pub fn group_of(&self, element_id: ElementId) -> Option<&ElementGroup> {
        self.groups.iter().find(|g| g.member_ids.contains(&element_id))
    }

    /// Union of all entity bounds.
    pub fn content_bounds(&self) -> Option<Bounds> {
        union_bounds(
            self.widgets
                .iter()
                .map(|w| w.rect)
                .chain(self.elements.iter().map(CanvasElement::bounds)),
        )
    }

    /// Drop references to ids that do not exist. Returns how many were dropped.
    pub fn sanitize(&mut self) -> usize {
        let element_ids: HashSet<Uuid> = self.elements.iter().map(CanvasElement::id).collect();
        let shape_ids: HashSet<Uuid> =
            self.elements.iter().filter(|e| e.is_shape()).map(CanvasElement::id).collect();
        let all_ids: HashSet<Uuid> = element_ids.iter().copied().chain(self.widgets.iter().map(|w| w.id)).collect();
        let mut dropped = 0;

        for element in &mut self.elements {
            if let Some(line) = element.as_linear_mut() {
                for binding in [&mut line.start_binding, &mut line.end_binding] {
                    if binding.is_some_and(|b| !shape_ids.contains(&b.element_id)) {
                        *binding = None;
                        dropped += 1;
                    }
                }
            }
        }

        let before = self.connections.len();
        let mut pairs = HashSet::new();
        self.connections.retain(|c| {
            let pair = if c.source_id < c.target_id { (c.source_id, c.target_id) } else { (c.target_id, c.source_id) };
            c.source_id != c.target_id
                && all_ids.contains(&c.source_id)
                && all_ids.contains(&c.target_id)
                && pairs.insert(pair)
        });
        dropped += before - self.connections.len();

        let mut seen = HashSet::new();
        for group in &mut self.groups {
            let before = group.member_ids.len();
            group.member_ids.retain(|id| element_ids.contains(id) && seen.insert(*id));
            dropped += before - group.member_ids.len();
        }
        let before = self.groups.len();
        self.groups.retain(|g| !g.member_ids.is_empty());
        dropped += before - self.groups.len();

        dropped
    }
}

/// A complete board document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub meta: DocumentMeta,
    pub board: Board,
    /// Serialized module state per widget id. Opaque to the engine.
    #[serde(default)]
    pub modules: BTreeMap<WidgetId, Value>,
    /// State of the cross-widget data-sharing collaborator. Opaque.
    #[serde(default)]
    pub data_sharing: Value,
}

impl Document {
    pub fn new(title: impl Into<String>) -> Self {
        let now = now_millis();
        Self {
            meta: DocumentMeta { id: Uuid::new_v4(), title: title.into(), created_at: now, updated_at: now },
            board: Board::default(),
            modules: BTreeMap::new(),
            data_sharing: Value::Null,
        }
    }

    /// Record that the content changed.
    pub fn touch(&mut self) {
        self.meta.updated_at = now_millis().max(self.meta.updated_at);
    }

    pub fn to_json(&self) -> EngineResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> EngineResult<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elements::{ArrowBinding, BindingEnd};
    use crate::geometry::Anchor;

    #[test]
    fn test_viewport_conversions_roundtrip() {
        let viewport = Viewport { x: 40.0, y: -10.0, zoom: 2.0 };
        let canvas = Point::new(15.0, 30.0);
        let screen = viewport.canvas_to_screen(canvas);
        assert_eq!(screen, Point::new(70.0, 50.0));
        let back = viewport.screen_to_canvas(screen);
        assert!((back.x - canvas.x).abs() < 1e-9 && (back.y - canvas.y).abs() < 1e-9);
    }

    #[test]
    fn test_zoom_at_keeps_point_fixed() {
        let mut viewport = Viewport::default();
        let anchor = Point::new(200.0, 100.0);
        let before = viewport.screen_to_canvas(anchor);
        assert!(viewport.zoom_at(anchor, 2.0, 0.1, 5.0));
        let after = viewport.screen_to_canvas(anchor);
        assert!((before.x - after.x).abs() < 1e-9 && (before.y - after.y).abs() < 1e-9);
        assert!((viewport.zoom - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_zoom_clamped() {
        let mut viewport = Viewport { zoom: 5.0, ..Viewport::default() };
        assert!(!viewport.zoom_at(Point::ZERO, 3.0, 0.1, 5.0));
        assert!((viewport.zoom - 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_next_z_spans_both_kinds() {
        let mut board = Board::default();
        assert_eq!(board.next_z(), 1);
        board.widgets.push(Widget::new("notes", Bounds::new(0.0, 0.0, 10.0, 10.0), 7));
        let mut rect = CanvasElement::rectangle(Bounds::new(0.0, 0.0, 10.0, 10.0));
        rect.set_z_index(3);
        board.elements.push(rect);
        assert_eq!(board.next_z(), 8);
        assert_eq!(board.min_z(), Some(3));
    }

    #[test]
    fn test_sanitize_drops_dangling_references() {
        let mut board = Board::default();
        let shape = CanvasElement::rectangle(Bounds::new(0.0, 0.0, 10.0, 10.0));
        let mut arrow = CanvasElement::arrow(Point::ZERO, Point::new(50.0, 0.0));
        if let Some(line) = arrow.as_linear_mut() {
            line.set_binding(BindingEnd::Start, Some(ArrowBinding { element_id: shape.id(), anchor: Anchor::Right }));
            line.set_binding(BindingEnd::End, Some(ArrowBinding { element_id: Uuid::new_v4(), anchor: Anchor::Left }));
        }
        board.groups.push(ElementGroup { id: Uuid::new_v4(), member_ids: vec![Uuid::new_v4()] });
        board.connections.push(Connection::new(EntityRef::element(shape.id()), EntityRef::widget(Uuid::new_v4())));
        board.elements.push(shape);
        board.elements.push(arrow);

        assert_eq!(board.sanitize(), 4);
        let line = board.elements[1].as_linear().unwrap();
        assert!(line.start_binding.is_some());
        assert!(line.end_binding.is_none());
        assert!(board.groups.is_empty());
        assert!(board.connections.is_empty());
    }

    #[test]
    fn test_sanitize_drops_repeated_connection_pairs() {
        let mut board = Board::default();
        let a = CanvasElement::rectangle(Bounds::new(0.0, 0.0, 10.0, 10.0));
        let b = CanvasElement::rectangle(Bounds::new(50.0, 0.0, 10.0, 10.0));
        let (a_ref, b_ref) = (EntityRef::element(a.id()), EntityRef::element(b.id()));
        board.connections.push(Connection::new(a_ref, b_ref));
        board.connections.push(Connection::new(b_ref, a_ref));
        board.connections.push(Connection::new(a_ref, b_ref));
        board.elements.push(a);
        board.elements.push(b);

        assert_eq!(board.sanitize(), 2);
        assert_eq!(board.connections.len(), 1);
        assert_eq!(board.connections[0].source(), a_ref);
    }

    #[test]
    fn test_document_json_roundtrip() {
        let mut doc = Document::new("Plans");
        doc.board.elements.push(CanvasElement::text(Point::new(1.0, 2.0), "hello"));
        doc.modules.insert(Uuid::new_v4(), serde_json::json!({ "items": [1, 2] }));
        let json = doc.to_json().unwrap();
        assert_eq!(Document::from_json(&json).unwrap(), doc);
    }
}
