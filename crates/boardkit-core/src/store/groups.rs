//! Element groups.

use super::BoardStore;
use crate::document::{ElementGroup, GroupId};
use crate::elements::ElementId;
use crate::error::EngineResult;
use crate::events::ChangeEvent;
use crate::selection::{EntityKind, EntityRef};
use std::collections::HashSet;
use uuid::Uuid;

impl BoardStore {
    pub fn groups(&self) -> &[ElementGroup] {
        self.board().map_or(&[], |b| b.groups.as_slice())
    }

    pub fn group(&self, id: GroupId) -> Option<&ElementGroup> {
        self.board()?.group(id)
    }

    pub fn group_of(&self, element_id: ElementId) -> Option<&ElementGroup> {
        self.board()?.group_of(element_id)
    }

    /// Group two or more existing, currently ungrouped elements.
    pub fn create_group(&mut self, ids: &[ElementId]) -> EngineResult<Option<GroupId>> {
        let board = self.board_ref()?;
        let mut seen = HashSet::new();
        let members: Vec<ElementId> = ids.iter().copied().filter(|id| seen.insert(*id)).collect();
        if members.len() < 2 {
            log::debug!("create_group: need at least two elements");
            return Ok(None);
        }
        if let Some(bad) = members.iter().find(|id| board.element(**id).is_none() || board.group_of(**id).is_some()) {
            log::debug!("create_group: element {bad} is missing or already grouped");
            return Ok(None);
        }
        self.record("Group")?;
        let id = Uuid::new_v4();
        self.board_mut()?.groups.push(ElementGroup { id, member_ids: members });
        self.touch();
        self.notify(ChangeEvent::GroupsChanged);
        Ok(Some(id))
    }

    /// Dissolve a group. Its members stay where they are.
    pub fn ungroup(&mut self, group_id: GroupId) -> EngineResult<bool> {
        if self.board_ref()?.group(group_id).is_none() {
            return Ok(false);
        }
        self.record("Ungroup")?;
        self.board_mut()?.groups.retain(|g| g.id != group_id);
        if self.entered_group == Some(group_id) {
            self.entered_group = None;
        }
        self.touch();
        self.notify(ChangeEvent::GroupsChanged);
        Ok(true)
    }

    /// Group the selected elements.
    pub fn group_selection(&mut self) -> EngineResult<Option<GroupId>> {
        let ids: Vec<ElementId> =
            self.selection.items().iter().filter(|e| e.kind == EntityKind::Element).map(|e| e.id).collect();
        self.create_group(&ids)
    }

    /// Dissolve every group touched by the selection. Returns how many.
    pub fn ungroup_selection(&mut self) -> EngineResult<usize> {
        let board = self.board_ref()?;
        let mut group_ids: Vec<GroupId> = Vec::new();
        for id in self.selection.ids() {
            if let Some(group) = board.group_of(id) {
                if !group_ids.contains(&group.id) {
                    group_ids.push(group.id);
                }
            }
        }
        if group_ids.is_empty() {
            return Ok(0);
        }
        self.batch("Ungroup", |store| {
            for id in &group_ids {
                store.ungroup(*id)?;
            }
            Ok(group_ids.len())
        })
    }

    /// Edit members of `group_id` individually until [`exit_group`](Self::exit_group).
    pub fn enter_group(&mut self, group_id: GroupId) -> EngineResult<bool> {
        if self.board_ref()?.group(group_id).is_none() {
            return Ok(false);
        }
        self.entered_group = Some(group_id);
        if !self.selection.is_empty() {
            self.selection.clear();
            self.notify(ChangeEvent::SelectionChanged);
        }
        Ok(true)
    }

    pub fn exit_group(&mut self) -> bool {
        let Some(group_id) = self.entered_group.take() else {
            return false;
        };
        let members: Vec<EntityRef> = self
            .group(group_id)
            .map(|g| g.member_ids.iter().copied().map(EntityRef::element).collect())
            .unwrap_or_default();
        if !members.is_empty() {
            self.selection.set(members);
            self.notify(ChangeEvent::SelectionChanged);
        }
        true
    }

    pub fn entered_group(&self) -> Option<GroupId> {
        self.entered_group
    }

    /// Replace grouped elements by all members of their group, unless that
    /// group is the entered one. Order is kept; duplicates are dropped.
    pub(crate) fn expand_groups(&self, entities: &[EntityRef]) -> Vec<EntityRef> {
        let mut out: Vec<EntityRef> = Vec::new();
        let mut push = |e: EntityRef| {
            if !out.contains(&e) {
                out.push(e);
            }
        };
        for entity in entities {
            let group = match entity.kind {
                EntityKind::Element => self.group_of(entity.id).filter(|g| Some(g.id) != self.entered_group),
                EntityKind::Widget => None,
            };
            match group {
                Some(group) => group.member_ids.iter().copied().map(EntityRef::element).for_each(&mut push),
                None => push(*entity),
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elements::CanvasElement;
    use crate::geometry::Bounds;

    fn store_with(n: usize) -> (BoardStore, Vec<ElementId>) {
        let mut store = BoardStore::with_defaults();
        store.create_document("Groups");
        let ids = (0..n)
            .map(|i| {
                store
                    .add_element(CanvasElement::rectangle(Bounds::new(i as f64 * 60.0, 0.0, 50.0, 50.0)))
                    .unwrap()
            })
            .collect();
        (store, ids)
    }

    #[test]
    fn test_group_requires_two_ungrouped() {
        let (mut store, ids) = store_with(3);
        assert_eq!(store.create_group(&ids[..1]).unwrap(), None);
        assert_eq!(store.create_group(&[ids[0], ids[0]]).unwrap(), None);
        assert!(store.create_group(&ids[..2]).unwrap().is_some());
        assert_eq!(store.create_group(&ids[1..]).unwrap(), None);
        assert_eq!(store.groups().len(), 1);
    }

    #[test]
    fn test_selecting_member_selects_group() {
        let (mut store, ids) = store_with(3);
        let group = store.create_group(&ids[..2]).unwrap().unwrap();
        store.select(EntityRef::element(ids[1])).unwrap();
        assert_eq!(store.selection().len(), 2);

        store.enter_group(group).unwrap();
        store.select(EntityRef::element(ids[1])).unwrap();
        assert_eq!(store.selection().single(), Some(EntityRef::element(ids[1])));

        assert!(store.exit_group());
        assert_eq!(store.selection().len(), 2);
    }

    #[test]
    fn test_deleting_member_keeps_group() {
        let (mut store, ids) = store_with(3);
        let group = store.create_group(&ids).unwrap().unwrap();
        store.remove_element(ids[0]).unwrap();
        assert_eq!(store.group(group).unwrap().member_ids, vec![ids[1], ids[2]]);
        store.remove_element(ids[1]).unwrap();
        store.remove_element(ids[2]).unwrap();
        assert!(store.group(group).is_none());
    }

    #[test]
    fn test_ungroup_selection() {
        let (mut store, ids) = store_with(2);
        store.create_group(&ids).unwrap();
        store.select(EntityRef::element(ids[0])).unwrap();
        assert_eq!(store.ungroup_selection().unwrap(), 1);
        assert!(store.groups().is_empty());
    }
}
