//! Arrow-to-shape bindings.
//!
//! A bound endpoint is derived from its target's rect. Whenever a shape moves
//! or resizes, every endpoint bound to it is rewritten.

use super::BoardStore;
use crate::document::Board;
use crate::elements::{ArrowBinding, BindingEnd, CanvasElement, ElementId};
use crate::error::EngineResult;
use crate::events::ChangeEvent;
use crate::geometry::{anchor_point, Anchor};

/// Rewrite every endpoint bound to `target` from its current rect.
/// Returns the number of endpoints updated.
pub(crate) fn refresh_bound_arrows(board: &mut Board, target: ElementId) -> usize {
    let Some(bounds) = board.element(target).filter(|e| e.is_shape()).map(CanvasElement::bounds) else {
        return 0;
    };
    let mut updated = 0;
    for element in &mut board.elements {
        if let Some(line) = element.as_linear_mut() {
            for (end, anchor) in line.ends_bound_to(target) {
                line.set_endpoint(end, anchor_point(bounds, anchor));
                updated += 1;
            }
        }
    }
    updated
}

/// Re-derive the bound endpoints of the line or arrow `line_id`.
pub(crate) fn resolve_line_bindings(board: &mut Board, line_id: ElementId) {
    let Some(bindings) = board.element(line_id).and_then(CanvasElement::as_linear).map(|l| {
        [BindingEnd::Start, BindingEnd::End]
            .into_iter()
            .filter_map(|end| l.binding(end).map(|b| (end, b)))
            .collect::<Vec<_>>()
    }) else {
        return;
    };
    for (end, binding) in bindings {
        let Some(bounds) = board.element(binding.element_id).map(CanvasElement::bounds) else {
            continue;
        };
        if let Some(line) = board.element_mut(line_id).and_then(CanvasElement::as_linear_mut) {
            line.set_endpoint(end, anchor_point(bounds, binding.anchor));
        }
    }
}

/// Clear every binding that points at `target`. Endpoints stay where they are.
pub(crate) fn clear_bindings_to(board: &mut Board, target: ElementId) -> usize {
    let mut cleared = 0;
    for element in &mut board.elements {
        if let Some(line) = element.as_linear_mut() {
            for (end, _) in line.ends_bound_to(target) {
                line.set_binding(end, None);
                cleared += 1;
            }
        }
    }
    cleared
}

impl BoardStore {
    /// Bind one end of a line or arrow to an anchor on a rectangle or ellipse,
    /// snapping the endpoint onto the anchor.
    pub fn bind_arrow_to_shape(
        &mut self,
        arrow_id: ElementId,
        end: BindingEnd,
        target_id: ElementId,
        anchor: Anchor,
    ) -> EngineResult<bool> {
        let board = self.board_ref()?;
        let arrow_ok = board.element(arrow_id).is_some_and(CanvasElement::is_linear);
        let target_ok = board.element(target_id).is_some_and(CanvasElement::is_shape);
        if !arrow_ok || !target_ok || arrow_id == target_id {
            log::debug!("bind_arrow_to_shape: rejected {arrow_id} -> {target_id}");
            return Ok(false);
        }
        self.record("Bind arrow")?;
        let board = self.board_mut()?;
        if let Some(line) = board.element_mut(arrow_id).and_then(CanvasElement::as_linear_mut) {
            line.set_binding(end, Some(ArrowBinding { element_id: target_id, anchor }));
        }
        resolve_line_bindings(board, arrow_id);
        self.touch();
        self.notify(ChangeEvent::ElementsChanged);
        Ok(true)
    }

    /// Drop the binding on one end. Returns false if that end was not bound.
    pub fn unbind_arrow(&mut self, arrow_id: ElementId, end: BindingEnd) -> EngineResult<bool> {
        let bound = self
            .board_ref()?
            .element(arrow_id)
            .and_then(CanvasElement::as_linear)
            .is_some_and(|l| l.binding(end).is_some());
        if !bound {
            return Ok(false);
        }
        self.record("Unbind arrow")?;
        if let Some(line) = self.board_mut()?.element_mut(arrow_id).and_then(CanvasElement::as_linear_mut) {
            line.set_binding(end, None);
        }
        self.touch();
        self.notify(ChangeEvent::ElementsChanged);
        Ok(true)
    }

    /// Re-resolve every arrow bound to `element_id`. Returns how many
    /// endpoints moved. Moves and resizes call this on their own.
    pub fn update_bound_arrows_for_element(&mut self, element_id: ElementId) -> EngineResult<usize> {
        let updated = refresh_bound_arrows(self.board_mut()?, element_id);
        if updated > 0 {
            self.touch();
            self.notify(ChangeEvent::ElementsChanged);
        }
        Ok(updated)
    }

    /// Ids of lines and arrows with at least one end bound to `element_id`.
    pub fn arrows_bound_to(&self, element_id: ElementId) -> Vec<ElementId> {
        self.elements()
            .iter()
            .filter(|e| e.as_linear().is_some_and(|l| !l.ends_bound_to(element_id).is_empty()))
            .map(CanvasElement::id)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Bounds;
    use kurbo::Point;

    fn setup() -> (BoardStore, ElementId, ElementId) {
        let mut store = BoardStore::with_defaults();
        store.create_document("Bindings");
        let shape = store.add_element(CanvasElement::rectangle(Bounds::new(100.0, 100.0, 100.0, 50.0))).unwrap();
        let arrow = store.add_element(CanvasElement::arrow(Point::ZERO, Point::new(90.0, 120.0))).unwrap();
        (store, shape, arrow)
    }

    fn endpoint(store: &BoardStore, arrow: ElementId, end: BindingEnd) -> Point {
        store.element(arrow).unwrap().as_linear().unwrap().points.get(end)
    }

    #[test]
    fn test_bind_snaps_endpoint() {
        let (mut store, shape, arrow) = setup();
        assert!(store.bind_arrow_to_shape(arrow, BindingEnd::End, shape, Anchor::Left).unwrap());
        assert_eq!(endpoint(&store, arrow, BindingEnd::End), Point::new(100.0, 125.0));
        let rect = store.element(arrow).unwrap().bounds();
        assert_eq!(rect, Bounds::new(0.0, 0.0, 100.0, 125.0));
    }

    #[test]
    fn test_bind_rejects_non_shape_target() {
        let (mut store, _, arrow) = setup();
        let text = store.add_element(CanvasElement::text(Point::ZERO, "x")).unwrap();
        assert!(!store.bind_arrow_to_shape(arrow, BindingEnd::End, text, Anchor::Top).unwrap());
        assert!(!store.bind_arrow_to_shape(arrow, BindingEnd::End, arrow, Anchor::Top).unwrap());
    }

    #[test]
    fn test_moving_shape_drags_bound_endpoint() {
        let (mut store, shape, arrow) = setup();
        store.bind_arrow_to_shape(arrow, BindingEnd::End, shape, Anchor::Top).unwrap();
        store.move_element(shape, 300.0, 300.0).unwrap();
        assert_eq!(endpoint(&store, arrow, BindingEnd::End), Point::new(350.0, 300.0));
        store.resize_element(shape, Bounds::new(300.0, 300.0, 200.0, 80.0)).unwrap();
        assert_eq!(endpoint(&store, arrow, BindingEnd::End), Point::new(400.0, 300.0));
        assert_eq!(endpoint(&store, arrow, BindingEnd::Start), Point::ZERO);
    }

    #[test]
    fn test_deleting_shape_clears_bindings() {
        let (mut store, shape, arrow) = setup();
        let other = store.add_element(CanvasElement::arrow(Point::new(500.0, 0.0), Point::ZERO)).unwrap();
        store.bind_arrow_to_shape(arrow, BindingEnd::End, shape, Anchor::Left).unwrap();
        store.bind_arrow_to_shape(other, BindingEnd::Start, shape, Anchor::Right).unwrap();
        assert_eq!(store.arrows_bound_to(shape).len(), 2);
        store.remove_element(shape).unwrap();
        for id in [arrow, other] {
            let line = store.element(id).unwrap().as_linear().unwrap();
            assert!(line.start_binding.is_none() && line.end_binding.is_none());
        }
    }

    #[test]
    fn test_unbind() {
        let (mut store, shape, arrow) = setup();
        store.bind_arrow_to_shape(arrow, BindingEnd::Start, shape, Anchor::Center).unwrap();
        assert!(store.unbind_arrow(arrow, BindingEnd::Start).unwrap());
        assert!(!store.unbind_arrow(arrow, BindingEnd::Start).unwrap());
        store.move_element(shape, 0.0, 0.0).unwrap();
        assert_eq!(endpoint(&store, arrow, BindingEnd::Start), Point::new(150.0, 125.0));
    }
}
