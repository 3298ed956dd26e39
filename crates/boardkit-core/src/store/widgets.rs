//! Widget CRUD and module state.

use super::BoardStore;
use crate::error::EngineResult;
use crate::events::ChangeEvent;
use crate::geometry::Bounds;
use crate::selection::EntityRef;
use crate::widget::{Widget, WidgetId, WidgetVisibility};
use kurbo::{Point, Size, Vec2};
use serde_json::Value;
use std::time::Instant;
use uuid::Uuid;

impl BoardStore {
    pub fn widget(&self, id: WidgetId) -> Option<&Widget> {
        self.board()?.widget(id)
    }

    pub fn widgets(&self) -> &[Widget] {
        self.board().map_or(&[], |b| b.widgets.as_slice())
    }

    /// Minimum widget size declared by `module_id`, or the configured fallback
    /// when the module is not installed.
    pub fn widget_min_size(&self, module_id: &str) -> Size {
        self.modules
            .get(module_id)
            .map(|m| m.min_size())
            .unwrap_or(Size::new(self.config.min_widget_width, self.config.min_widget_height))
    }

    /// Place a new widget of `module_id` with its top-left corner at (x, y).
    ///
    /// Returns `None` when the module is not installed.
    pub fn add_widget(&mut self, module_id: &str, x: f64, y: f64) -> EngineResult<Option<WidgetId>> {
        self.doc()?;
        let Some(module) = self.modules.get(module_id) else {
            log::warn!("add_widget: module '{module_id}' is not installed");
            return Ok(None);
        };
        let size = module.default_size();
        let min = module.min_size();
        let state = module.serialize(&module.default_state());
        let rect = Bounds::new(x, y, size.width.max(min.width), size.height.max(min.height));

        self.record("Add widget")?;
        let doc = self.doc_mut()?;
        let widget = Widget::new(module_id, rect, doc.board.next_z());
        let id = widget.id;
        doc.board.widgets.push(widget);
        doc.modules.insert(id, state);
        self.touch();
        self.selection.set([EntityRef::widget(id)]);
        self.notify(ChangeEvent::WidgetsChanged);
        self.notify(ChangeEvent::SelectionChanged);
        log::debug!("Added widget {id} ({module_id})");
        Ok(Some(id))
    }

    pub fn move_widget(&mut self, id: WidgetId, x: f64, y: f64) -> EngineResult<bool> {
        if self.board_ref()?.widget(id).is_none() {
            log::debug!("move_widget: unknown widget {id}");
            return Ok(false);
        }
        self.record("Move widget")?;
        if let Some(widget) = self.board_mut()?.widget_mut(id) {
            widget.rect = widget.rect.with_origin(Point::new(x, y));
        }
        self.touch();
        self.notify(ChangeEvent::WidgetsChanged);
        Ok(true)
    }

    /// Set a widget's rect, clamped to its module's minimum size.
    pub fn resize_widget(&mut self, id: WidgetId, rect: Bounds) -> EngineResult<bool> {
        let Some(module_id) = self.board_ref()?.widget(id).map(|w| w.module_id.clone()) else {
            log::debug!("resize_widget: unknown widget {id}");
            return Ok(false);
        };
        let min = self.widget_min_size(&module_id);
        let rect = rect.normalized();
        let rect = Bounds::new(rect.x, rect.y, rect.width.max(min.width), rect.height.max(min.height));
        self.record("Resize widget")?;
        if let Some(widget) = self.board_mut()?.widget_mut(id) {
            widget.rect = rect;
        }
        self.touch();
        self.notify(ChangeEvent::WidgetsChanged);
        Ok(true)
    }

    pub fn remove_widget(&mut self, id: WidgetId) -> EngineResult<bool> {
        if self.board_ref()?.widget(id).is_none() {
            log::debug!("remove_widget: unknown widget {id}");
            return Ok(false);
        }
        self.record("Delete widget")?;
        self.purge_entity(EntityRef::widget(id))
    }

    /// Copy a widget and its module state, offset and on top.
    pub fn duplicate_widget(&mut self, id: WidgetId) -> EngineResult<Option<WidgetId>> {
        let Some(source) = self.board_ref()?.widget(id).cloned() else {
            log::debug!("duplicate_widget: unknown widget {id}");
            return Ok(None);
        };
        let offset = self.config.duplicate_offset;
        let state = self.copy_module_state(&source);
        self.record("Duplicate widget")?;
        let new_id = self.insert_widget_copy(source, Vec2::new(offset, offset), state)?;
        self.selection.set([EntityRef::widget(new_id)]);
        self.notify(ChangeEvent::SelectionChanged);
        Ok(Some(new_id))
    }

    /// Insert `source` under a fresh id. Not recorded.
    pub(crate) fn insert_widget_copy(
        &mut self,
        mut widget: Widget,
        offset: Vec2,
        state: Option<Value>,
    ) -> EngineResult<WidgetId> {
        let doc = self.doc_mut()?;
        widget.id = Uuid::new_v4();
        widget.rect = widget.rect.translated(offset);
        widget.z_index = doc.board.next_z();
        let id = widget.id;
        doc.board.widgets.push(widget);
        if let Some(state) = state {
            doc.modules.insert(id, state);
        }
        self.touch();
        self.notify(ChangeEvent::WidgetsChanged);
        Ok(id)
    }

    /// Deep copy of a widget's stored module state.
    ///
    /// Goes through the module's deserialize/serialize pair when installed so
    /// the copy shares nothing with the original.
    pub(crate) fn copy_module_state(&self, widget: &Widget) -> Option<Value> {
        let stored = self.document.as_ref()?.modules.get(&widget.id)?;
        Some(match self.modules.get(&widget.module_id) {
            Some(module) => module.serialize(&module.deserialize(stored)),
            None => stored.clone(),
        })
    }

    pub fn set_widget_visibility(&mut self, id: WidgetId, visibility: WidgetVisibility) -> EngineResult<bool> {
        let Some(widget) = self.board_ref()?.widget(id) else {
            log::debug!("set_widget_visibility: unknown widget {id}");
            return Ok(false);
        };
        if widget.visibility.unwrap_or_default() == visibility {
            return Ok(false);
        }
        self.record(match visibility {
            WidgetVisibility::Visible => "Show widget",
            WidgetVisibility::Hidden => "Hide widget",
        })?;
        if let Some(widget) = self.board_mut()?.widget_mut(id) {
            widget.visibility = Some(visibility);
        }
        self.touch();
        self.notify(ChangeEvent::WidgetsChanged);
        Ok(true)
    }

    /// Flip visibility. Returns the new value.
    pub fn toggle_widget_visibility(&mut self, id: WidgetId) -> EngineResult<Option<WidgetVisibility>> {
        let Some(current) = self.board_ref()?.widget(id).map(|w| w.visibility.unwrap_or_default()) else {
            return Ok(None);
        };
        let next = current.toggled();
        self.set_widget_visibility(id, next)?;
        Ok(Some(next))
    }

    /// Set the content scale. Non-positive or non-finite values are rejected.
    pub fn set_widget_scale(&mut self, id: WidgetId, scale: f64) -> EngineResult<bool> {
        if !(scale.is_finite() && scale > 0.0) {
            log::debug!("set_widget_scale: rejected scale {scale}");
            return Ok(false);
        }
        if self.board_ref()?.widget(id).is_none() {
            return Ok(false);
        }
        self.record("Scale widget")?;
        if let Some(widget) = self.board_mut()?.widget_mut(id) {
            widget.scale = Some(scale);
        }
        self.touch();
        self.notify(ChangeEvent::WidgetsChanged);
        Ok(true)
    }

    /// Replace a widget's module state. History capture is debounced per widget.
    pub fn set_module_state(&mut self, id: WidgetId, state: Value, now: Instant) -> EngineResult<bool> {
        let Some(module_id) = self.board_ref()?.widget(id).map(|w| w.module_id.clone()) else {
            log::debug!("set_module_state: unknown widget {id}");
            return Ok(false);
        };
        let stored = match self.modules.get(&module_id) {
            Some(module) => module.serialize(&state),
            None => state,
        };
        self.schedule_capture(id, "Edit widget", now)?;
        self.doc_mut()?.modules.insert(id, stored);
        self.touch();
        self.notify(ChangeEvent::WidgetsChanged);
        Ok(true)
    }

    /// Live module state of a widget.
    pub fn module_state(&self, id: WidgetId) -> Option<Value> {
        let doc = self.document.as_ref()?;
        let widget = doc.board.widget(id)?;
        let stored = doc.modules.get(&id)?;
        Some(match self.modules.get(&widget.module_id) {
            Some(module) => module.deserialize(stored),
            None => stored.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::modules::{ModuleCatalog, ModuleSpec};
    use serde_json::json;
    use std::time::Duration;

    fn store() -> BoardStore {
        let catalog = ModuleCatalog::new().with(
            "todo",
            ModuleSpec::new("Todo", Size::new(280.0, 320.0), Size::new(200.0, 150.0))
                .with_default_state(json!({ "items": [] })),
        );
        let mut store = BoardStore::new(EngineConfig::default(), catalog);
        store.create_document("Widgets");
        store
    }

    #[test]
    fn test_add_widget_materializes_state_and_selects() {
        let mut store = store();
        let id = store.add_widget("todo", 10.0, 20.0).unwrap().unwrap();
        let widget = store.widget(id).unwrap();
        assert_eq!(widget.rect, Bounds::new(10.0, 20.0, 280.0, 320.0));
        assert_eq!(store.module_state(id), Some(json!({ "items": [] })));
        assert_eq!(store.selection().single(), Some(EntityRef::widget(id)));
    }

    #[test]
    fn test_missing_module_is_a_noop() {
        let mut store = store();
        assert_eq!(store.add_widget("kanban", 0.0, 0.0).unwrap(), None);
        assert!(store.widgets().is_empty());
        assert!(!store.can_undo());
    }

    #[test]
    fn test_resize_clamps_to_module_minimum() {
        let mut store = store();
        let id = store.add_widget("todo", 0.0, 0.0).unwrap().unwrap();
        assert!(store.resize_widget(id, Bounds::new(0.0, 0.0, 50.0, 500.0)).unwrap());
        assert_eq!(store.widget(id).unwrap().rect, Bounds::new(0.0, 0.0, 200.0, 500.0));
    }

    #[test]
    fn test_duplicate_copies_state() {
        let mut store = store();
        let id = store.add_widget("todo", 0.0, 0.0).unwrap().unwrap();
        store.set_module_state(id, json!({ "items": ["milk"] }), Instant::now()).unwrap();
        let copy = store.duplicate_widget(id).unwrap().unwrap();
        assert_ne!(copy, id);
        assert_eq!(store.module_state(copy), Some(json!({ "items": ["milk"] })));
        let (a, b) = (store.widget(id).unwrap(), store.widget(copy).unwrap());
        assert_eq!(b.rect.x - a.rect.x, 20.0);
        assert!(b.z_index > a.z_index);
    }

    #[test]
    fn test_remove_purges_module_state() {
        let mut store = store();
        let id = store.add_widget("todo", 0.0, 0.0).unwrap().unwrap();
        assert!(store.remove_widget(id).unwrap());
        assert!(store.document().unwrap().modules.is_empty());
        assert!(store.selection().is_empty());
        assert!(!store.remove_widget(id).unwrap());
    }

    #[test]
    fn test_module_state_capture_is_debounced() {
        let mut store = store();
        let id = store.add_widget("todo", 0.0, 0.0).unwrap().unwrap();
        let entries = store.history().len();
        let t0 = Instant::now();
        for i in 0..5 {
            store.set_module_state(id, json!({ "items": [i] }), t0 + Duration::from_millis(i * 100)).unwrap();
        }
        assert_eq!(store.history().len(), entries);
        assert_eq!(store.tick(t0 + Duration::from_millis(600)), 0);
        assert_eq!(store.tick(t0 + Duration::from_millis(900)), 1);
        assert_eq!(store.history().len(), entries + 1);
    }

    #[test]
    fn test_toggle_visibility() {
        let mut store = store();
        let id = store.add_widget("todo", 0.0, 0.0).unwrap().unwrap();
        assert_eq!(store.toggle_widget_visibility(id).unwrap(), Some(WidgetVisibility::Hidden));
        assert!(!store.widget(id).unwrap().is_visible());
        assert!(!store.set_widget_scale(id, 0.0).unwrap());
        assert!(store.set_widget_scale(id, 1.5).unwrap());
    }
}
