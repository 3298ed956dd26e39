//! Rubber-band selection.

use crate::error::EngineResult;
use crate::geometry::Bounds;
use crate::store::BoardStore;
use kurbo::Point;

#[derive(Debug, Clone, Copy)]
pub(crate) struct MarqueeState {
    /// Canvas space.
    pub start: Point,
    pub current: Point,
    pub additive: bool,
}

impl MarqueeState {
    pub fn new(start: Point, additive: bool) -> Self {
        Self { start, current: start, additive }
    }

    pub fn rect(&self) -> Bounds {
        Bounds::from_corners(self.start, self.current)
    }

    pub fn has_area(&self) -> bool {
        let rect = self.rect();
        rect.width > 0.0 || rect.height > 0.0
    }

    /// Select whatever the rect touches. Returns whether the marquee had any
    /// extent, in which case the click that follows must be swallowed.
    pub fn commit(self, store: &mut BoardStore) -> EngineResult<bool> {
        if !self.has_area() {
            return Ok(false);
        }
        let hits = store.entities_in_rect(self.rect());
        if self.additive {
            for hit in hits {
                store.add_to_selection(hit)?;
            }
        } else {
            store.set_selection(&hits)?;
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elements::CanvasElement;
    use crate::selection::EntityRef;

    #[test]
    fn test_touching_edge_is_selected() {
        let mut store = BoardStore::with_defaults();
        store.create_document("Marquee");
        let id = store.add_element(CanvasElement::rectangle(Bounds::new(100.0, 0.0, 50.0, 50.0))).unwrap();
        store.clear_selection();
        let mut marquee = MarqueeState::new(Point::new(0.0, 0.0), false);
        marquee.current = Point::new(100.0, 50.0);
        assert!(marquee.commit(&mut store).unwrap());
        assert!(store.is_selected(EntityRef::element(id)));
    }

    #[test]
    fn test_zero_area_selects_nothing() {
        let mut store = BoardStore::with_defaults();
        store.create_document("Marquee");
        store.add_element(CanvasElement::rectangle(Bounds::new(0.0, 0.0, 50.0, 50.0))).unwrap();
        store.clear_selection();
        let marquee = MarqueeState::new(Point::new(10.0, 10.0), false);
        assert!(!marquee.commit(&mut store).unwrap());
        assert!(store.selection().is_empty());
    }
}
