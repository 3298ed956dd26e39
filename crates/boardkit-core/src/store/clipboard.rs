//! Single-item clipboard with cascading paste.

use super::BoardStore;
use crate::elements::CanvasElement;
use crate::error::EngineResult;
use crate::events::ChangeEvent;
use crate::selection::{EntityKind, EntityRef};
use crate::widget::Widget;
use kurbo::Vec2;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// What the clipboard holds: one widget (with its module state) or one element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ClipboardItem {
    Widget { widget: Widget, state: Option<Value> },
    Element { element: CanvasElement },
}

impl ClipboardItem {
    pub fn kind(&self) -> EntityKind {
        match self {
            ClipboardItem::Widget { .. } => EntityKind::Widget,
            ClipboardItem::Element { .. } => EntityKind::Element,
        }
    }
}

impl BoardStore {
    pub fn clipboard(&self) -> Option<&ClipboardItem> {
        self.clipboard.as_ref()
    }

    pub fn has_clipboard(&self) -> bool {
        self.clipboard.is_some()
    }

    pub fn clear_clipboard(&mut self) {
        self.clipboard = None;
        self.paste_count = 0;
    }

    /// Copy `entity`. Replaces whatever was held and restarts the paste cascade.
    pub fn copy(&mut self, entity: EntityRef) -> EngineResult<bool> {
        let board = self.board_ref()?;
        let item = match entity.kind {
            EntityKind::Widget => board.widget(entity.id).cloned().map(|widget| {
                let state = self.copy_module_state(&widget);
                ClipboardItem::Widget { widget, state }
            }),
            EntityKind::Element => board.element(entity.id).cloned().map(|mut element| {
                if let Some(line) = element.as_linear_mut() {
                    line.start_binding = None;
                    line.end_binding = None;
                }
                ClipboardItem::Element { element }
            }),
        };
        let Some(item) = item else {
            log::debug!("copy: unknown {:?} {}", entity.kind, entity.id);
            return Ok(false);
        };
        self.clipboard = Some(item);
        self.paste_count = 0;
        Ok(true)
    }

    /// Copy the first selected entity.
    pub fn copy_selection(&mut self) -> EngineResult<bool> {
        match self.selection.first() {
            Some(entity) => self.copy(entity),
            None => Ok(false),
        }
    }

    /// Copy then delete `entity` as one undoable action.
    pub fn cut(&mut self, entity: EntityRef) -> EngineResult<bool> {
        if !self.copy(entity)? {
            return Ok(false);
        }
        self.batch("Cut", |store| store.purge_entity(entity))
    }

    /// Insert a fresh copy of the clipboard item and select it.
    ///
    /// Each paste lands one further `duplicate_offset` step from the source,
    /// so repeated pastes cascade instead of stacking.
    pub fn paste(&mut self) -> EngineResult<Option<EntityRef>> {
        self.doc()?;
        let Some(item) = self.clipboard.clone() else {
            return Ok(None);
        };
        self.paste_count += 1;
        let step = self.config.duplicate_offset * f64::from(self.paste_count);
        let offset = Vec2::new(step, step);
        self.record("Paste")?;
        let pasted = match item {
            ClipboardItem::Widget { widget, state } => EntityRef::widget(self.insert_widget_copy(widget, offset, state)?),
            ClipboardItem::Element { mut element } => {
                element.regenerate_id();
                EntityRef::element(self.insert_element(element, offset)?)
            }
        };
        self.selection.set([pasted]);
        self.notify(ChangeEvent::SelectionChanged);
        log::debug!("Pasted {:?} {} (cascade {})", pasted.kind, pasted.id, self.paste_count);
        Ok(Some(pasted))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Bounds;
    use crate::modules::{ModuleCatalog, ModuleSpec};
    use kurbo::{Point, Size};
    use serde_json::json;

    fn store() -> BoardStore {
        let catalog = ModuleCatalog::new().with(
            "notes",
            ModuleSpec::new("Notes", Size::new(200.0, 200.0), Size::new(100.0, 100.0))
                .with_default_state(json!({ "text": "" })),
        );
        let mut store = BoardStore::new(Default::default(), catalog);
        store.create_document("Clipboard");
        store
    }

    #[test]
    fn test_paste_cascades() {
        let mut store = store();
        let id = store.add_element(CanvasElement::rectangle(Bounds::new(0.0, 0.0, 40.0, 40.0))).unwrap();
        assert!(store.copy(EntityRef::element(id)).unwrap());
        let first = store.paste().unwrap().unwrap();
        let second = store.paste().unwrap().unwrap();
        let step = store.config().duplicate_offset;
        assert_eq!(store.entity_bounds(first).unwrap().origin(), Point::new(step, step));
        assert_eq!(store.entity_bounds(second).unwrap().origin(), Point::new(2.0 * step, 2.0 * step));
        assert_eq!(store.selection().single(), Some(second));
        assert_ne!(first.id, id);
    }

    #[test]
    fn test_cut_is_single_undo() {
        let mut store = store();
        let id = store.add_element(CanvasElement::ellipse(Bounds::new(0.0, 0.0, 40.0, 40.0))).unwrap();
        let entries = store.history().len();
        assert!(store.cut(EntityRef::element(id)).unwrap());
        assert!(store.elements().is_empty());
        assert_eq!(store.history().len(), entries + 1);
        store.undo().unwrap();
        assert_eq!(store.elements().len(), 1);
        assert!(store.has_clipboard());
    }

    #[test]
    fn test_widget_state_is_copied() {
        let mut store = store();
        let id = store.add_widget("notes", 0.0, 0.0).unwrap().unwrap();
        store.set_module_state(id, json!({ "text": "hello" }), std::time::Instant::now()).unwrap();
        store.copy(EntityRef::widget(id)).unwrap();
        store.set_module_state(id, json!({ "text": "changed" }), std::time::Instant::now()).unwrap();
        let pasted = store.paste().unwrap().unwrap();
        assert_eq!(store.module_state(pasted.id), Some(json!({ "text": "hello" })));
    }

    #[test]
    fn test_paste_empty_clipboard() {
        let mut store = store();
        assert_eq!(store.paste().unwrap(), None);
        store.copy(EntityRef::element(uuid::Uuid::new_v4())).unwrap();
        assert!(!store.has_clipboard());
    }
}
