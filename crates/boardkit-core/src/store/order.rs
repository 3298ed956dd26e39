//! Shared z-order, selection and spatial queries.

use super::BoardStore;
use crate::elements::CanvasElement;
use crate::error::EngineResult;
use crate::events::ChangeEvent;
use crate::geometry::{rects_intersect, union_bounds, Bounds};
use crate::selection::{EntityKind, EntityRef};
use kurbo::{Line, ParamCurveNearest, Point};
use std::collections::{HashMap, HashSet};

impl BoardStore {
    // --- Z-order ---

    /// Widgets and elements interleaved bottom-to-top.
    pub fn entities_in_z_order(&self) -> Vec<EntityRef> {
        let Some(board) = self.board() else {
            return Vec::new();
        };
        let mut all: Vec<(i64, EntityRef)> = board
            .widgets
            .iter()
            .map(|w| (w.z_index, EntityRef::widget(w.id)))
            .chain(board.elements.iter().map(|e| (e.z_index(), EntityRef::element(e.id()))))
            .collect();
        all.sort_by_key(|(z, _)| *z);
        all.into_iter().map(|(_, e)| e).collect()
    }

    /// Existing refs sorted by current z, deduplicated.
    fn sorted_existing(&self, entities: &[EntityRef]) -> EngineResult<Vec<EntityRef>> {
        let board = self.board_ref()?;
        let mut seen = HashSet::new();
        let mut found: Vec<(i64, EntityRef)> = entities
            .iter()
            .filter(|e| seen.insert(**e))
            .filter_map(|e| board.entity_z(*e).map(|z| (z, *e)))
            .collect();
        found.sort_by_key(|(z, _)| *z);
        Ok(found.into_iter().map(|(_, e)| e).collect())
    }

    /// Give `entities` consecutive z-indices starting at `first`, keeping
    /// their relative order. Not recorded.
    fn assign_z(&mut self, entities: &[EntityRef], first: i64) -> EngineResult<()> {
        let board = self.board_mut()?;
        let mut kinds = HashSet::new();
        for (offset, entity) in (0_i64..).zip(entities) {
            board.set_entity_z(*entity, first + offset);
            kinds.insert(entity.kind);
        }
        for kind in kinds {
            self.notify(Self::kind_event(kind));
        }
        Ok(())
    }

    /// Move `entities` above everything else.
    pub fn bring_to_front(&mut self, entities: &[EntityRef]) -> EngineResult<bool> {
        let targets = self.sorted_existing(entities)?;
        if targets.is_empty() {
            return Ok(false);
        }
        let next = self.board_ref()?.next_z();
        self.record("Bring to front")?;
        self.assign_z(&targets, next)?;
        self.touch();
        Ok(true)
    }

    /// Move `entities` below everything else.
    pub fn send_to_back(&mut self, entities: &[EntityRef]) -> EngineResult<bool> {
        let targets = self.sorted_existing(entities)?;
        if targets.is_empty() {
            return Ok(false);
        }
        let min = self.board_ref()?.min_z().unwrap_or(0);
        self.record("Send to back")?;
        self.assign_z(&targets, min - targets.len() as i64)?;
        self.touch();
        Ok(true)
    }

    /// Swap with the next entity up. False when already on top.
    pub fn bring_forward(&mut self, entity: EntityRef) -> EngineResult<bool> {
        self.swap_with_neighbour(entity, 1, "Bring forward")
    }

    /// Swap with the next entity down. False when already at the bottom.
    pub fn send_backward(&mut self, entity: EntityRef) -> EngineResult<bool> {
        self.swap_with_neighbour(entity, -1, "Send backward")
    }

    fn swap_with_neighbour(&mut self, entity: EntityRef, step: isize, label: &str) -> EngineResult<bool> {
        let order = self.entities_in_z_order();
        let Some(index) = order.iter().position(|e| *e == entity) else {
            return Ok(false);
        };
        let Some(other) = index.checked_add_signed(step).and_then(|i| order.get(i)).copied() else {
            return Ok(false);
        };
        let board = self.board_ref()?;
        let (Some(z_self), Some(z_other)) = (board.entity_z(entity), board.entity_z(other)) else {
            return Ok(false);
        };
        // Equal z-indices (from an imported document) still need a strict order.
        let (new_self, new_other) = if z_self == z_other { (z_other + step as i64, z_self) } else { (z_other, z_self) };
        self.record(label)?;
        let board = self.board_mut()?;
        board.set_entity_z(entity, new_self);
        board.set_entity_z(other, new_other);
        self.touch();
        self.notify(Self::kind_event(entity.kind));
        self.notify(Self::kind_event(other.kind));
        Ok(true)
    }

    // --- Selection ---

    pub fn is_selected(&self, entity: EntityRef) -> bool {
        self.selection.contains(entity)
    }

    /// Select `entity` (and its group) alone, raising it to the top.
    pub fn select(&mut self, entity: EntityRef) -> EngineResult<bool> {
        if !self.board_ref()?.contains(entity) {
            return Ok(false);
        }
        let expanded = self.expand_groups(&[entity]);
        self.raise_quietly(&expanded)?;
        self.selection.set(expanded);
        self.notify(ChangeEvent::SelectionChanged);
        Ok(true)
    }

    pub fn add_to_selection(&mut self, entity: EntityRef) -> EngineResult<bool> {
        if !self.board_ref()?.contains(entity) {
            return Ok(false);
        }
        let mut added = false;
        for e in self.expand_groups(&[entity]) {
            added |= self.selection.insert(e);
        }
        if added {
            self.notify(ChangeEvent::SelectionChanged);
        }
        Ok(added)
    }

    /// Remove `entity` (and its group) from the selection.
    pub fn deselect(&mut self, entity: EntityRef) -> bool {
        let mut removed = false;
        for e in self.expand_groups(&[entity]) {
            removed |= self.selection.remove(e);
        }
        if removed {
            self.notify(ChangeEvent::SelectionChanged);
        }
        removed
    }

    /// Add if absent, remove if present.
    pub fn toggle_selection(&mut self, entity: EntityRef) -> EngineResult<bool> {
        if self.selection.contains(entity) {
            Ok(self.deselect(entity))
        } else {
            self.add_to_selection(entity)
        }
    }

    pub fn clear_selection(&mut self) -> bool {
        if self.selection.is_empty() {
            return false;
        }
        self.selection.clear();
        self.notify(ChangeEvent::SelectionChanged);
        true
    }

    /// Select every visible widget and every element.
    pub fn select_all(&mut self) -> EngineResult<usize> {
        let board = self.board_ref()?;
        let all: Vec<EntityRef> = board
            .widgets
            .iter()
            .filter(|w| w.is_visible())
            .map(|w| EntityRef::widget(w.id))
            .chain(board.elements.iter().map(|e| EntityRef::element(e.id())))
            .collect();
        self.selection.set(all);
        self.notify(ChangeEvent::SelectionChanged);
        Ok(self.selection.len())
    }

    /// Replace the selection. Unknown refs are dropped, groups expanded.
    pub fn set_selection(&mut self, entities: &[EntityRef]) -> EngineResult<usize> {
        let board = self.board_ref()?;
        let existing: Vec<EntityRef> = entities.iter().copied().filter(|e| board.contains(*e)).collect();
        let expanded = self.expand_groups(&existing);
        if expanded.as_slice() != self.selection.items() {
            self.selection.set(expanded);
            self.notify(ChangeEvent::SelectionChanged);
        }
        Ok(self.selection.len())
    }

    /// Union of the selected entities' rects.
    pub fn selection_bounds(&self) -> Option<Bounds> {
        let board = self.board()?;
        union_bounds(self.selection.items().iter().filter_map(|e| board.entity_bounds(*e)))
    }

    /// Delete everything selected as one undoable action.
    pub fn delete_selection(&mut self) -> EngineResult<usize> {
        let targets: Vec<EntityRef> = self.selection.items().to_vec();
        if targets.is_empty() {
            return Ok(0);
        }
        self.batch("Delete", |store| {
            let mut removed = 0;
            for entity in targets {
                if store.purge_entity(entity)? {
                    removed += 1;
                }
            }
            Ok(removed)
        })
    }

    /// Duplicate everything selected as one undoable action and select the
    /// copies. Bindings and groups entirely inside the selection carry over
    /// to the copies.
    pub fn duplicate_selection(&mut self) -> EngineResult<Vec<EntityRef>> {
        let sources = self.sorted_existing(self.selection.items())?;
        if sources.is_empty() {
            return Ok(Vec::new());
        }
        let source_ids: HashSet<uuid::Uuid> = sources.iter().map(|e| e.id).collect();
        let offset = self.config.duplicate_offset;
        let copies = self.batch("Duplicate", |store| {
            let mut id_map = HashMap::new();
            let mut copies = Vec::new();
            for source in &sources {
                let copy = match source.kind {
                    EntityKind::Widget => {
                        let Some(widget) = store.widget(source.id).cloned() else { continue };
                        let state = store.copy_module_state(&widget);
                        EntityRef::widget(store.insert_widget_copy(widget, kurbo::Vec2::new(offset, offset), state)?)
                    }
                    EntityKind::Element => {
                        let Some(mut element) = store.element(source.id).cloned() else { continue };
                        element.regenerate_id();
                        if let Some(line) = element.as_linear_mut() {
                            for binding in [&mut line.start_binding, &mut line.end_binding] {
                                if binding.is_some_and(|b| !source_ids.contains(&b.element_id)) {
                                    *binding = None;
                                }
                            }
                        }
                        EntityRef::element(store.insert_element(element, kurbo::Vec2::new(offset, offset))?)
                    }
                };
                id_map.insert(source.id, copy.id);
                copies.push(copy);
            }
            store.remap_copied_references(&id_map)?;
            store.selection.set(copies.iter().copied());
            store.notify(ChangeEvent::SelectionChanged);
            Ok(copies)
        })?;
        Ok(copies)
    }

    /// Point copied bindings at copied targets, drop the rest, and rebuild
    /// groups whose members were all copied.
    fn remap_copied_references(&mut self, id_map: &HashMap<uuid::Uuid, uuid::Uuid>) -> EngineResult<()> {
        let board = self.board_mut()?;
        let copied: HashSet<uuid::Uuid> = id_map.values().copied().collect();
        let mut bound_lines = Vec::new();
        for element in board.elements.iter_mut().filter(|e| copied.contains(&e.id())) {
            let id = element.id();
            if let Some(line) = element.as_linear_mut() {
                for binding in [&mut line.start_binding, &mut line.end_binding] {
                    *binding = binding.and_then(|b| {
                        id_map.get(&b.element_id).map(|target| crate::elements::ArrowBinding { element_id: *target, ..b })
                    });
                }
                if line.start_binding.is_some() || line.end_binding.is_some() {
                    bound_lines.push(id);
                }
            }
        }
        for id in bound_lines {
            super::bindings::resolve_line_bindings(board, id);
        }
        let new_groups: Vec<_> = board
            .groups
            .iter()
            .filter_map(|g| {
                let members: Option<Vec<_>> = g.member_ids.iter().map(|m| id_map.get(m).copied()).collect();
                members.map(|member_ids| crate::document::ElementGroup { id: uuid::Uuid::new_v4(), member_ids })
            })
            .collect();
        if !new_groups.is_empty() {
            board.groups.extend(new_groups);
            self.notify(ChangeEvent::GroupsChanged);
        }
        Ok(())
    }

    /// Raise `entities` to the top without recording history.
    fn raise_quietly(&mut self, entities: &[EntityRef]) -> EngineResult<()> {
        let board = self.board_ref()?;
        let Some(max) = board.max_z() else {
            return Ok(());
        };
        let targets = self.sorted_existing(entities)?;
        let top_count = targets.len() as i64;
        let already_on_top = targets
            .iter()
            .enumerate()
            .all(|(i, e)| board.entity_z(*e) == Some(max - top_count + 1 + i as i64));
        if already_on_top {
            return Ok(());
        }
        self.assign_z(&targets, max + 1)
    }

    // --- Spatial queries ---

    /// Entities under `point`, topmost first. Hidden widgets are skipped.
    ///
    /// `tolerance` is in canvas units and widens thin targets such as lines.
    pub fn entities_at_point(&self, point: Point, tolerance: f64) -> Vec<EntityRef> {
        let Some(board) = self.board() else {
            return Vec::new();
        };
        let mut hits: Vec<EntityRef> = self
            .entities_in_z_order()
            .into_iter()
            .filter(|e| match e.kind {
                EntityKind::Widget => board.widget(e.id).is_some_and(|w| w.is_visible() && w.rect.contains(point)),
                EntityKind::Element => board.element(e.id).is_some_and(|el| element_hit(el, point, tolerance)),
            })
            .collect();
        hits.reverse();
        hits
    }

    pub fn entity_at(&self, point: Point, tolerance: f64) -> Option<EntityRef> {
        self.entities_at_point(point, tolerance).into_iter().next()
    }

    /// Entities whose rect intersects `rect` (tolerantly), bottom-to-top.
    pub fn entities_in_rect(&self, rect: Bounds) -> Vec<EntityRef> {
        let Some(board) = self.board() else {
            return Vec::new();
        };
        self.entities_in_z_order()
            .into_iter()
            .filter(|e| match e.kind {
                EntityKind::Widget => board.widget(e.id).is_some_and(|w| w.is_visible() && rects_intersect(rect, w.rect)),
                EntityKind::Element => board.element(e.id).is_some_and(|el| rects_intersect(rect, el.bounds())),
            })
            .collect()
    }
}

fn element_hit(element: &CanvasElement, point: Point, tolerance: f64) -> bool {
    match element.as_linear() {
        Some(line) => {
            let segment = Line::new(line.points.start, line.points.end);
            segment.nearest(point, 1e-6).distance_sq <= tolerance * tolerance
        }
        None => {
            let b = element.bounds();
            Bounds::new(b.x - tolerance, b.y - tolerance, b.width + 2.0 * tolerance, b.height + 2.0 * tolerance)
                .contains(point)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elements::{BindingEnd, ElementId};
    use crate::geometry::Anchor;

    fn store_with(n: usize) -> (BoardStore, Vec<ElementId>) {
        let mut store = BoardStore::with_defaults();
        store.create_document("Order");
        let ids = (0..n)
            .map(|i| {
                store
                    .add_element(CanvasElement::rectangle(Bounds::new(i as f64 * 100.0, 0.0, 50.0, 50.0)))
                    .unwrap()
            })
            .collect();
        (store, ids)
    }

    fn z_order_ids(store: &BoardStore) -> Vec<ElementId> {
        store.entities_in_z_order().into_iter().map(|e| e.id).collect()
    }

    #[test]
    fn test_bring_to_front_and_send_to_back() {
        let (mut store, ids) = store_with(3);
        assert!(store.bring_to_front(&[EntityRef::element(ids[0])]).unwrap());
        assert_eq!(z_order_ids(&store), vec![ids[1], ids[2], ids[0]]);
        assert!(store.send_to_back(&[EntityRef::element(ids[2])]).unwrap());
        assert_eq!(z_order_ids(&store), vec![ids[2], ids[1], ids[0]]);
    }

    #[test]
    fn test_forward_and_backward() {
        let (mut store, ids) = store_with(3);
        assert!(store.bring_forward(EntityRef::element(ids[0])).unwrap());
        assert_eq!(z_order_ids(&store), vec![ids[1], ids[0], ids[2]]);
        assert!(!store.bring_forward(EntityRef::element(ids[2])).unwrap());
        assert!(store.send_backward(EntityRef::element(ids[2])).unwrap());
        assert_eq!(z_order_ids(&store), vec![ids[1], ids[2], ids[0]]);
    }

    #[test]
    fn test_select_raises_to_top_without_history() {
        let (mut store, ids) = store_with(3);
        let entries = store.history().len();
        store.select(EntityRef::element(ids[0])).unwrap();
        assert_eq!(z_order_ids(&store).last(), Some(&ids[0]));
        assert_eq!(store.history().len(), entries);
    }

    #[test]
    fn test_delete_selection_is_one_entry() {
        let (mut store, ids) = store_with(3);
        store.set_selection(&[EntityRef::element(ids[0]), EntityRef::element(ids[2])]).unwrap();
        let entries = store.history().len();
        assert_eq!(store.delete_selection().unwrap(), 2);
        assert_eq!(store.history().len(), entries + 1);
        assert_eq!(store.element_ids(), vec![ids[1]]);
        store.undo().unwrap();
        assert_eq!(store.elements().len(), 3);
    }

    #[test]
    fn test_duplicate_selection_remaps_bindings() {
        let (mut store, ids) = store_with(1);
        let arrow = store.add_element(CanvasElement::arrow(Point::new(-100.0, 0.0), Point::ZERO)).unwrap();
        store.bind_arrow_to_shape(arrow, BindingEnd::End, ids[0], Anchor::Left).unwrap();
        store.set_selection(&[EntityRef::element(ids[0]), EntityRef::element(arrow)]).unwrap();
        let copies = store.duplicate_selection().unwrap();
        assert_eq!(copies.len(), 2);
        let shape_copy = copies.iter().find(|c| store.element(c.id).unwrap().is_shape()).unwrap().id;
        let arrow_copy = copies.iter().find(|c| c.id != shape_copy).unwrap().id;
        let binding = store.element(arrow_copy).unwrap().as_linear().unwrap().end_binding.unwrap();
        assert_eq!(binding.element_id, shape_copy);
        assert_eq!(store.selection().len(), 2);
    }

    #[test]
    fn test_hit_testing_prefers_topmost() {
        let mut store = BoardStore::with_defaults();
        store.create_document("Hits");
        let below = store.add_element(CanvasElement::rectangle(Bounds::new(0.0, 0.0, 100.0, 100.0))).unwrap();
        let above = store.add_element(CanvasElement::rectangle(Bounds::new(50.0, 50.0, 100.0, 100.0))).unwrap();
        assert_eq!(store.entity_at(Point::new(75.0, 75.0), 0.0), Some(EntityRef::element(above)));
        assert_eq!(store.entity_at(Point::new(25.0, 25.0), 0.0), Some(EntityRef::element(below)));
        assert_eq!(store.entity_at(Point::new(500.0, 500.0), 0.0), None);
    }

    #[test]
    fn test_line_hit_uses_distance() {
        let mut store = BoardStore::with_defaults();
        store.create_document("Hits");
        let line = store.add_element(CanvasElement::line(Point::ZERO, Point::new(100.0, 100.0))).unwrap();
        assert_eq!(store.entity_at(Point::new(52.0, 50.0), 4.0), Some(EntityRef::element(line)));
        assert_eq!(store.entity_at(Point::new(90.0, 10.0), 4.0), None);
    }
}
