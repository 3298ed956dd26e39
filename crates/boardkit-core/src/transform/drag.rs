//! Moving the selection.
//!
//! The committed rects stay untouched while the pointer moves. The offset is
//! held here and applied once, grid-snapped, on release.

use crate::document::Document;
use crate::elements::{BindingEnd, CanvasElement};
use crate::error::EngineResult;
use crate::geometry::Bounds;
use crate::selection::{EntityKind, EntityRef};
use crate::snap::GridSnap;
use crate::store::BoardStore;
use kurbo::{Point, Vec2};
use std::collections::HashSet;

#[derive(Debug, Clone)]
pub(crate) struct DragState {
    /// Pointer position at gesture start, screen space.
    pub start: Point,
    pub offset: Vec2,
    pub entities: Vec<(EntityRef, Bounds)>,
    pub before: Document,
}

impl DragState {
    pub fn new(start: Point, entities: Vec<(EntityRef, Bounds)>, before: Document) -> Self {
        Self { start, offset: Vec2::ZERO, entities, before }
    }

    pub fn update(&mut self, pointer: Point, zoom: f64) {
        self.offset = (pointer - self.start) / zoom;
    }

    pub fn preview(&self, entity: EntityRef) -> Option<Bounds> {
        self.entities.iter().find(|(e, _)| *e == entity).map(|(_, b)| b.translated(self.offset))
    }

    /// Target origins for every dragged entity.
    pub fn targets(&self, grid: GridSnap) -> Vec<(EntityRef, Point)> {
        self.entities
            .iter()
            .map(|(entity, start)| (*entity, grid.snap_point(start.origin() + self.offset).point))
            .collect()
    }

    /// Commit the drag as one history entry. False when nothing moved.
    pub fn commit(self, store: &mut BoardStore) -> EngineResult<bool> {
        if self.offset == Vec2::ZERO {
            return Ok(false);
        }
        let mut targets = self.targets(store.grid_snap());
        // Lines move first; a shape moved later pulls their bound ends along.
        targets.sort_by_key(|(e, _)| !store.element(e.id).is_some_and(CanvasElement::is_linear));
        let dragged: HashSet<_> = self.entities.iter().map(|(e, _)| e.id).collect();
        let detach = detached_ends(store, &self.entities, &dragged);
        store.batch_from("Move", self.before, |store| {
            for (line, end) in detach {
                store.unbind_arrow(line, end)?;
            }
            for (entity, origin) in targets {
                store.move_entity(entity, origin)?;
            }
            Ok(true)
        })
    }
}

/// Bound ends of dragged lines whose target stays behind.
fn detached_ends(
    store: &BoardStore,
    entities: &[(EntityRef, Bounds)],
    dragged: &HashSet<uuid::Uuid>,
) -> Vec<(uuid::Uuid, BindingEnd)> {
    entities
        .iter()
        .filter(|(e, _)| e.kind == EntityKind::Element)
        .filter_map(|(e, _)| store.element(e.id).and_then(CanvasElement::as_linear).map(|l| (e.id, l)))
        .flat_map(|(id, line)| {
            [BindingEnd::Start, BindingEnd::End]
                .into_iter()
                .filter(move |end| line.binding(*end).is_some_and(|b| !dragged.contains(&b.element_id)))
                .map(move |end| (id, end))
        })
        .collect()
}
