//! Creating elements with the drawing tools.

use super::Tool;
use crate::elements::{BindingEnd, CanvasElement, ElementId, ElementStyle};
use crate::error::EngineResult;
use crate::geometry::{find_nearest_anchor, AnchorHit, Bounds};
use crate::store::BoardStore;
use kurbo::{Point, Size};
use std::collections::HashSet;

/// Size of a rectangle or ellipse placed with a plain click.
pub const DEFAULT_SHAPE_SIZE: Size = Size::new(120.0, 80.0);

/// Pointer travel, in screen pixels, below which a shape gesture is a click.
const CLICK_SLOP_PX: f64 = 3.0;

#[derive(Debug, Clone)]
pub(crate) struct DrawingState {
    pub tool: Tool,
    /// Canvas space.
    pub start: Point,
    pub current: Point,
    pub points: Vec<Point>,
    pub start_hit: Option<AnchorHit>,
    pub end_hit: Option<AnchorHit>,
}

/// Nearest shape anchor within the binding radius, which is fixed in screen
/// pixels.
fn anchor_near(store: &BoardStore, point: Point, zoom: f64, exclude: &HashSet<uuid::Uuid>) -> Option<AnchorHit> {
    let radius = store.config().binding_radius_px / zoom;
    find_nearest_anchor(point, store.elements(), exclude, radius)
}

impl DrawingState {
    pub fn new(tool: Tool, start: Point, store: &BoardStore, zoom: f64) -> Self {
        let start_hit = if tool.is_linear() { anchor_near(store, start, zoom, &HashSet::new()) } else { None };
        let start = start_hit.map_or(start, |hit| hit.point);
        Self { tool, start, current: start, points: vec![start], start_hit, end_hit: None }
    }

    pub fn update(&mut self, pointer: Point, store: &BoardStore, zoom: f64) {
        match self.tool {
            Tool::Line | Tool::Arrow => {
                let exclude: HashSet<_> = self.start_hit.iter().map(|h| h.element_id).collect();
                self.end_hit = anchor_near(store, pointer, zoom, &exclude);
                self.current = self.end_hit.map_or(pointer, |hit| hit.point);
            }
            Tool::Draw => {
                if self.points.last() != Some(&pointer) {
                    self.points.push(pointer);
                }
                self.current = pointer;
            }
            _ => self.current = pointer,
        }
    }

    /// The element as it would be created right now, before grid snapping.
    pub fn preview(&self) -> Option<CanvasElement> {
        match self.tool {
            Tool::Rectangle => Some(CanvasElement::rectangle(Bounds::from_corners(self.start, self.current))),
            Tool::Ellipse => Some(CanvasElement::ellipse(Bounds::from_corners(self.start, self.current))),
            Tool::Line => Some(CanvasElement::line(self.start, self.current)),
            Tool::Arrow => Some(CanvasElement::arrow(self.start, self.current)),
            Tool::Draw => Some(CanvasElement::draw(self.points.clone())),
            Tool::Text | Tool::Select | Tool::Pan => None,
        }
    }

    /// The binding the end being placed would get on release.
    pub fn candidate(&self) -> Option<AnchorHit> {
        self.end_hit
    }

    /// Create the element. Degenerate gestures create nothing.
    pub fn commit(self, store: &mut BoardStore, style: &ElementStyle, zoom: f64) -> EngineResult<Option<ElementId>> {
        let grid = store.grid_snap();
        let snap = |p: Point| grid.snap_point(p).point;
        let min = store.config().min_element_size;
        let element = match self.tool {
            Tool::Rectangle | Tool::Ellipse => {
                let drawn = Bounds::from_corners(self.start, self.current);
                let slop = CLICK_SLOP_PX / zoom;
                let rect = if drawn.width < slop && drawn.height < slop {
                    Bounds::new(0.0, 0.0, DEFAULT_SHAPE_SIZE.width, DEFAULT_SHAPE_SIZE.height)
                        .with_origin(snap(self.start))
                } else {
                    let rect = Bounds::from_corners(snap(self.start), snap(self.current));
                    Bounds::new(rect.x, rect.y, rect.width.max(min), rect.height.max(min))
                };
                if self.tool == Tool::Rectangle { CanvasElement::rectangle(rect) } else { CanvasElement::ellipse(rect) }
            }
            Tool::Line | Tool::Arrow => {
                let start = self.start_hit.map_or_else(|| snap(self.start), |h| h.point);
                let end = self.end_hit.map_or_else(|| snap(self.current), |h| h.point);
                if start.distance(end) <= f64::EPSILON {
                    log::debug!("Discarded zero-length {:?}", self.tool);
                    return Ok(None);
                }
                if self.tool == Tool::Line { CanvasElement::line(start, end) } else { CanvasElement::arrow(start, end) }
            }
            Tool::Draw => {
                if self.points.len() < 2 {
                    log::debug!("Discarded single-point stroke");
                    return Ok(None);
                }
                CanvasElement::draw(self.points)
            }
            Tool::Text => CanvasElement::text(snap(self.start), String::new()),
            Tool::Select | Tool::Pan => return Ok(None),
        };
        let mut element = element;
        *element.style_mut() = style.clone();
        let (start_hit, end_hit) = (self.start_hit, self.end_hit);
        store
            .batch("Draw", |store| {
                let id = store.add_element(element)?;
                for (end, hit) in [(BindingEnd::Start, start_hit), (BindingEnd::End, end_hit)] {
                    if let Some(hit) = hit {
                        store.bind_arrow_to_shape(id, end, hit.element_id, hit.anchor)?;
                    }
                }
                Ok(id)
            })
            .map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Anchor;

    fn store() -> BoardStore {
        let mut store = BoardStore::with_defaults();
        store.create_document("Drawing");
        store
    }

    #[test]
    fn test_click_creates_default_size() {
        let mut store = store();
        let drawing = DrawingState::new(Tool::Rectangle, Point::new(40.0, 40.0), &store, 1.0);
        let id = drawing.commit(&mut store, &ElementStyle::default(), 1.0).unwrap().unwrap();
        assert_eq!(store.element(id).unwrap().bounds(), Bounds::new(40.0, 40.0, 120.0, 80.0));
    }

    #[test]
    fn test_zero_length_line_discarded() {
        let mut store = store();
        let mut drawing = DrawingState::new(Tool::Line, Point::new(5.0, 5.0), &store, 1.0);
        drawing.update(Point::new(5.0, 5.0), &store, 1.0);
        assert_eq!(drawing.commit(&mut store, &ElementStyle::default(), 1.0).unwrap(), None);
        assert!(store.elements().is_empty());
        assert!(store.history().is_empty());
    }

    #[test]
    fn test_single_point_stroke_discarded() {
        let mut store = store();
        let drawing = DrawingState::new(Tool::Draw, Point::ZERO, &store, 1.0);
        assert_eq!(drawing.commit(&mut store, &ElementStyle::default(), 1.0).unwrap(), None);
    }

    #[test]
    fn test_arrow_binds_to_nearby_anchor() {
        let mut store = store();
        let shape = store.add_element(CanvasElement::rectangle(Bounds::new(200.0, 0.0, 100.0, 100.0))).unwrap();
        let mut drawing = DrawingState::new(Tool::Arrow, Point::ZERO, &store, 1.0);
        // Left anchor is (200, 50); 15 canvas units away is inside the radius at zoom 1.
        drawing.update(Point::new(188.0, 59.0), &store, 1.0);
        let hit = drawing.candidate().unwrap();
        assert_eq!((hit.element_id, hit.anchor), (shape, Anchor::Left));
        let arrow = drawing.commit(&mut store, &ElementStyle::default(), 1.0).unwrap().unwrap();
        let line = store.element(arrow).unwrap().as_linear().unwrap().clone();
        assert_eq!(line.points.end, Point::new(200.0, 50.0));
        assert_eq!(line.end_binding.map(|b| b.element_id), Some(shape));
        assert!(line.start_binding.is_none());
    }

    #[test]
    fn test_binding_radius_shrinks_with_zoom() {
        let mut store = store();
        store.add_element(CanvasElement::rectangle(Bounds::new(200.0, 0.0, 100.0, 100.0))).unwrap();
        let mut drawing = DrawingState::new(Tool::Arrow, Point::ZERO, &store, 4.0);
        drawing.update(Point::new(188.0, 59.0), &store, 4.0);
        assert!(drawing.candidate().is_none());
    }
}
