//! Element CRUD and editing.

use super::{bindings, BoardStore};
use crate::elements::{BindingEnd, CanvasElement, ElementId, ElementStyle};
use crate::error::EngineResult;
use crate::events::ChangeEvent;
use crate::geometry::{normalize_angle, Bounds};
use crate::selection::EntityRef;
use kurbo::{Point, Vec2};
use std::time::Instant;
use uuid::Uuid;

impl BoardStore {
    pub fn element(&self, id: ElementId) -> Option<&CanvasElement> {
        self.board()?.element(id)
    }

    pub fn elements(&self) -> &[CanvasElement] {
        self.board().map_or(&[], |b| b.elements.as_slice())
    }

    /// Add an element on top of everything and select it.
    pub fn add_element(&mut self, element: CanvasElement) -> EngineResult<ElementId> {
        self.doc()?;
        self.record("Add element")?;
        let id = self.insert_element(element, Vec2::ZERO)?;
        self.selection.set([EntityRef::element(id)]);
        self.notify(ChangeEvent::SelectionChanged);
        Ok(id)
    }

    /// Push `element` translated by `offset`, with top z-index. Not recorded.
    pub(crate) fn insert_element(&mut self, mut element: CanvasElement, offset: Vec2) -> EngineResult<ElementId> {
        let board = self.board_mut()?;
        if board.element(element.id()).is_some() {
            element.regenerate_id();
        }
        if offset != Vec2::ZERO {
            element.translate(offset);
        }
        element.set_z_index(board.next_z());
        let id = element.id();
        board.elements.push(element);
        bindings::resolve_line_bindings(board, id);
        self.touch();
        self.notify(ChangeEvent::ElementsChanged);
        Ok(id)
    }

    /// Move an element so its rect origin is (x, y). Point data moves along.
    pub fn move_element(&mut self, id: ElementId, x: f64, y: f64) -> EngineResult<bool> {
        let Some(origin) = self.board_ref()?.element(id).map(|e| e.bounds().origin()) else {
            log::debug!("move_element: unknown element {id}");
            return Ok(false);
        };
        self.record("Move element")?;
        let board = self.board_mut()?;
        if let Some(element) = board.element_mut(id) {
            element.translate(Point::new(x, y) - origin);
        }
        bindings::resolve_line_bindings(board, id);
        bindings::refresh_bound_arrows(board, id);
        self.touch();
        self.notify(ChangeEvent::ElementsChanged);
        Ok(true)
    }

    /// Fit an element into `rect`. Point data is rescaled proportionally.
    ///
    /// Non-linear elements are clamped to the minimum element size.
    pub fn resize_element(&mut self, id: ElementId, rect: Bounds) -> EngineResult<bool> {
        let Some(is_linear) = self.board_ref()?.element(id).map(CanvasElement::is_linear) else {
            log::debug!("resize_element: unknown element {id}");
            return Ok(false);
        };
        let mut rect = rect.normalized();
        if !is_linear {
            let min = self.config.min_element_size;
            rect.width = rect.width.max(min);
            rect.height = rect.height.max(min);
        }
        self.record("Resize element")?;
        let board = self.board_mut()?;
        if let Some(element) = board.element_mut(id) {
            element.resize(rect);
        }
        bindings::resolve_line_bindings(board, id);
        bindings::refresh_bound_arrows(board, id);
        self.touch();
        self.notify(ChangeEvent::ElementsChanged);
        Ok(true)
    }

    pub fn remove_element(&mut self, id: ElementId) -> EngineResult<bool> {
        if self.board_ref()?.element(id).is_none() {
            log::debug!("remove_element: unknown element {id}");
            return Ok(false);
        }
        self.record("Delete element")?;
        self.purge_entity(EntityRef::element(id))
    }

    /// Copy an element, offset and on top. The copy keeps no arrow bindings.
    pub fn duplicate_element(&mut self, id: ElementId) -> EngineResult<Option<ElementId>> {
        let Some(mut copy) = self.board_ref()?.element(id).cloned() else {
            log::debug!("duplicate_element: unknown element {id}");
            return Ok(None);
        };
        copy.regenerate_id();
        if let Some(line) = copy.as_linear_mut() {
            line.start_binding = None;
            line.end_binding = None;
        }
        let offset = self.config.duplicate_offset;
        self.record("Duplicate element")?;
        let new_id = self.insert_element(copy, Vec2::new(offset, offset))?;
        self.selection.set([EntityRef::element(new_id)]);
        self.notify(ChangeEvent::SelectionChanged);
        Ok(Some(new_id))
    }

    pub fn update_element_style(&mut self, id: ElementId, style: ElementStyle) -> EngineResult<bool> {
        match self.board_ref()?.element(id) {
            None => return Ok(false),
            Some(element) if *element.style() == style => return Ok(false),
            Some(_) => {}
        }
        self.record("Change style")?;
        if let Some(element) = self.board_mut()?.element_mut(id) {
            *element.style_mut() = style;
        }
        self.touch();
        self.notify(ChangeEvent::ElementsChanged);
        Ok(true)
    }

    /// Set or clear the label of a rectangle or ellipse.
    pub fn set_element_label(&mut self, id: ElementId, label: Option<String>) -> EngineResult<bool> {
        if !self.board_ref()?.element(id).is_some_and(CanvasElement::is_shape) {
            log::debug!("set_element_label: {id} is not a shape");
            return Ok(false);
        }
        self.record("Edit label")?;
        if let Some(shape) = self.board_mut()?.element_mut(id).and_then(CanvasElement::as_shape_mut) {
            shape.label = label.filter(|l| !l.is_empty());
        }
        self.touch();
        self.notify(ChangeEvent::ElementsChanged);
        Ok(true)
    }

    /// Replace the content of a text element. History capture is debounced
    /// per element so a burst of typing becomes one entry.
    pub fn set_text_content(&mut self, id: ElementId, content: impl Into<String>, now: Instant) -> EngineResult<bool> {
        if !self.board_ref()?.element(id).is_some_and(|e| matches!(e, CanvasElement::Text(_))) {
            log::debug!("set_text_content: {id} is not a text element");
            return Ok(false);
        }
        self.schedule_capture(id, "Edit text", now)?;
        if let Some(text) = self.board_mut()?.element_mut(id).and_then(CanvasElement::as_text_mut) {
            text.content = content.into();
        }
        self.touch();
        self.notify(ChangeEvent::ElementsChanged);
        Ok(true)
    }

    /// Set an element's own angle (radians, normalized). Lines and arrows
    /// have no angle and are rejected.
    pub fn set_element_rotation(&mut self, id: ElementId, angle: f64) -> EngineResult<bool> {
        if !self.board_ref()?.element(id).is_some_and(CanvasElement::supports_rotation) {
            return Ok(false);
        }
        self.record("Rotate element")?;
        if let Some(element) = self.board_mut()?.element_mut(id) {
            element.set_rotation(normalize_angle(angle));
        }
        self.touch();
        self.notify(ChangeEvent::ElementsChanged);
        Ok(true)
    }

    /// Move one endpoint of a line or arrow. Its binding on that end is dropped.
    pub fn set_line_endpoint(&mut self, id: ElementId, end: BindingEnd, point: Point) -> EngineResult<bool> {
        if !self.board_ref()?.element(id).is_some_and(CanvasElement::is_linear) {
            log::debug!("set_line_endpoint: {id} is not a line or arrow");
            return Ok(false);
        }
        self.record("Move endpoint")?;
        if let Some(line) = self.board_mut()?.element_mut(id).and_then(CanvasElement::as_linear_mut) {
            line.set_binding(end, None);
            line.set_endpoint(end, point);
        }
        self.touch();
        self.notify(ChangeEvent::ElementsChanged);
        Ok(true)
    }

    /// Element ids, for callers that only have a bare id.
    pub fn element_ids(&self) -> Vec<Uuid> {
        self.elements().iter().map(CanvasElement::id).collect()
    }
}
