//! The entity store: owner of the board document.
//!
//! Every mutation validates the ids it is given first and reports a miss as
//! `Ok(false)` / `Ok(None)`. Calling a mutation before a document exists is
//! the one hard failure ([`EngineError::NotInitialized`]).
//!
//! History is captured before the first mutation of an action. Multi-step
//! actions run inside a batch so they record a single entry.

mod bindings;
mod clipboard;
mod connections;
mod elements;
mod groups;
mod order;
mod viewport;
mod widgets;

pub use clipboard::ClipboardItem;

use crate::config::EngineConfig;
use crate::deferred::DeferredTasks;
use crate::document::{Board, Document, GroupId};
use crate::error::{EngineError, EngineResult};
use crate::events::{ChangeEvent, EventBus, SubscriptionId};
use crate::geometry::{rotate_point, Bounds};
use crate::history::{HistoryEntry, HistoryManager};
use crate::modules::{CleanupHook, ModuleCatalog, ModuleRegistry};
use crate::selection::{EntityKind, EntityRef, Selection};
use kurbo::{Point, Size};
use std::time::{Duration, Instant};
use uuid::Uuid;

/// A debounced history capture waiting for its quiet period to end.
#[derive(Debug, Clone)]
struct PendingCapture {
    label: String,
    before: Document,
    /// Order of the first edit; snapshots must reach history in this order.
    seq: u64,
}

/// The entity store.
pub struct BoardStore {
    config: EngineConfig,
    document: Option<Document>,
    selection: Selection,
    entered_group: Option<GroupId>,
    history: HistoryManager<Document>,
    captures: DeferredTasks<Uuid, PendingCapture>,
    capture_seq: u64,
    modules: Box<dyn ModuleRegistry>,
    cleanup_hooks: Vec<Box<dyn CleanupHook>>,
    events: EventBus,
    clipboard: Option<ClipboardItem>,
    paste_count: u32,
    batch_depth: usize,
    queued_events: Vec<ChangeEvent>,
    restoring: bool,
}

impl BoardStore {
    pub fn new(config: EngineConfig, modules: impl ModuleRegistry + 'static) -> Self {
        Self {
            history: HistoryManager::new(config.max_history),
            captures: DeferredTasks::new(Duration::from_millis(config.capture_debounce_ms)),
            capture_seq: 0,
            config,
            document: None,
            selection: Selection::new(),
            entered_group: None,
            modules: Box::new(modules),
            cleanup_hooks: Vec::new(),
            events: EventBus::new(),
            clipboard: None,
            paste_count: 0,
            batch_depth: 0,
            queued_events: Vec::new(),
            restoring: false,
        }
    }

    /// Store with default config and no installed modules.
    pub fn with_defaults() -> Self {
        Self::new(EngineConfig::default(), ModuleCatalog::new())
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn modules(&self) -> &dyn ModuleRegistry {
        self.modules.as_ref()
    }

    pub fn is_initialized(&self) -> bool {
        self.document.is_some()
    }

    pub fn document(&self) -> Option<&Document> {
        self.document.as_ref()
    }

    pub fn board(&self) -> Option<&Board> {
        self.document.as_ref().map(|d| &d.board)
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn history(&self) -> &HistoryManager<Document> {
        &self.history
    }

    // --- Lifecycle ---

    /// Start a fresh, empty document. Returns its id.
    pub fn create_document(&mut self, title: impl Into<String>) -> Uuid {
        let mut doc = Document::new(title);
        doc.board.canvas_settings.grid_spacing = self.config.grid_spacing;
        doc.board.canvas_settings.snap_to_grid = self.config.snap_to_grid;
        let id = doc.meta.id;
        self.load_document(doc);
        id
    }

    /// Replace the document, dropping dangling references. History and
    /// selection start over. Returns the number of dropped references.
    pub fn load_document(&mut self, mut doc: Document) -> usize {
        self.restoring = true;
        self.captures.cancel_all();
        let dropped = doc.board.sanitize();
        if dropped > 0 {
            log::warn!("Dropped {dropped} dangling references while loading '{}'", doc.meta.title);
        }
        log::info!(
            "Loaded document '{}' ({} widgets, {} elements)",
            doc.meta.title,
            doc.board.widgets.len(),
            doc.board.elements.len()
        );
        self.document = Some(doc);
        self.history.clear();
        self.selection.clear();
        self.entered_group = None;
        self.emit_now(ChangeEvent::DocumentReplaced);
        self.emit_now(ChangeEvent::HistoryChanged);
        self.emit_now(ChangeEvent::SelectionChanged);
        self.restoring = false;
        dropped
    }

    /// Drop the document and everything tied to it.
    pub fn close_document(&mut self) -> Option<Document> {
        let doc = self.document.take()?;
        self.captures.cancel_all();
        self.history.clear();
        self.selection.clear();
        self.entered_group = None;
        log::info!("Closed document '{}'", doc.meta.title);
        self.emit_now(ChangeEvent::DocumentReplaced);
        self.emit_now(ChangeEvent::HistoryChanged);
        self.emit_now(ChangeEvent::SelectionChanged);
        Some(doc)
    }

    // --- Observers and collaborators ---

    pub fn subscribe(&mut self, listener: impl FnMut(&ChangeEvent) + 'static) -> SubscriptionId {
        self.events.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.events.unsubscribe(id)
    }

    /// Register a hook run before any widget or element is deleted.
    pub fn add_cleanup_hook(&mut self, hook: impl CleanupHook + 'static) {
        self.cleanup_hooks.push(Box::new(hook));
    }

    // --- History ---

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn undo(&mut self) -> EngineResult<bool> {
        let current = self.doc()?.clone();
        let entry = self.history.undo(&current);
        Ok(self.restore(entry, "undo"))
    }

    pub fn redo(&mut self) -> EngineResult<bool> {
        self.doc()?;
        let entry = self.history.redo();
        Ok(self.restore(entry, "redo"))
    }

    pub fn go_to_entry(&mut self, entry_id: u64) -> EngineResult<bool> {
        let current = self.doc()?.clone();
        let entry = self.history.go_to_entry(entry_id, &current);
        Ok(self.restore(entry, "jump"))
    }

    pub fn go_to_live(&mut self) -> EngineResult<bool> {
        self.doc()?;
        let entry = self.history.go_to_live();
        Ok(self.restore(entry, "go to live"))
    }

    /// Fire debounced captures that are due. Returns how many fired.
    pub fn tick(&mut self, now: Instant) -> usize {
        if self.restoring {
            return 0;
        }
        let mut fired = self.captures.poll(now);
        let Some(newest) = fired.iter().map(|(_, c)| c.seq).max() else {
            return 0;
        };
        // A due capture's snapshot already holds every edit started before
        // it, so those captures must land first even if still quiet.
        fired.extend(self.captures.take_where(|_, c| c.seq < newest));
        fired.sort_by_key(|(_, c)| c.seq);
        let count = fired.len();
        for (_, capture) in fired {
            log::debug!("History: recorded '{}' (debounced)", capture.label);
            self.history.push_state(capture.label, capture.before);
        }
        if count > 0 {
            self.notify(ChangeEvent::HistoryChanged);
        }
        count
    }

    /// Number of debounced captures waiting to fire.
    pub fn pending_captures(&self) -> usize {
        self.captures.len()
    }

    /// When the host should next call [`BoardStore::tick`].
    pub fn next_capture_due(&self) -> Option<Instant> {
        self.captures.next_due()
    }

    /// Replace the document with a history snapshot.
    ///
    /// Pending captures are dropped first so none can fire against the
    /// restored document.
    fn restore(&mut self, entry: Option<HistoryEntry<Document>>, action: &str) -> bool {
        let Some(entry) = entry else {
            log::debug!("History: nothing to {action}");
            return false;
        };
        self.restoring = true;
        let cancelled = self.captures.cancel_all();
        if cancelled > 0 {
            log::debug!("History: cancelled {cancelled} pending captures before {action}");
        }
        log::debug!("History: {action} to '{}'", entry.label);
        let mut snapshot = entry.snapshot;
        // The view is not part of history.
        if let Some(viewport) = self.document.as_ref().map(|d| d.board.viewport) {
            snapshot.board.viewport = viewport;
        }
        self.document = Some(snapshot);
        let selection_changed = self.prune_selection();
        self.emit_now(ChangeEvent::DocumentReplaced);
        self.emit_now(ChangeEvent::HistoryChanged);
        if selection_changed {
            self.emit_now(ChangeEvent::SelectionChanged);
        }
        self.restoring = false;
        true
    }

    /// Drop selected or entered ids that no longer exist.
    fn prune_selection(&mut self) -> bool {
        let Some(board) = self.document.as_ref().map(|d| &d.board) else {
            return false;
        };
        let before = self.selection.len();
        self.selection.retain(|e| board.contains(*e));
        if self.entered_group.is_some_and(|g| board.group(g).is_none()) {
            self.entered_group = None;
        }
        before != self.selection.len()
    }

    // --- Internal plumbing ---

    pub(crate) fn doc(&self) -> EngineResult<&Document> {
        self.document.as_ref().ok_or(EngineError::NotInitialized)
    }

    pub(crate) fn doc_mut(&mut self) -> EngineResult<&mut Document> {
        self.document.as_mut().ok_or(EngineError::NotInitialized)
    }

    pub(crate) fn board_ref(&self) -> EngineResult<&Board> {
        self.doc().map(|d| &d.board)
    }

    pub(crate) fn board_mut(&mut self) -> EngineResult<&mut Board> {
        self.doc_mut().map(|d| &mut d.board)
    }

    /// Push the current document as the state before `label`.
    ///
    /// Suppressed inside a batch and while a restore is in progress.
    pub(crate) fn record(&mut self, label: &str) -> EngineResult<()> {
        if self.restoring {
            log::debug!("History: ignored '{label}' during restore");
            return Ok(());
        }
        if self.batch_depth > 0 {
            return Ok(());
        }
        self.flush_captures();
        let snapshot = self.doc()?.clone();
        self.history.push_state(label, snapshot);
        log::debug!("History: recorded '{label}'");
        self.notify(ChangeEvent::HistoryChanged);
        Ok(())
    }

    /// Run `f` as one undoable action, snapshotting the document first.
    pub(crate) fn batch<R>(&mut self, label: &str, f: impl FnOnce(&mut Self) -> EngineResult<R>) -> EngineResult<R> {
        let before = self.doc()?.clone();
        self.batch_from(label, before, f)
    }

    /// Run `f` as one undoable action whose pre-state is `before`.
    ///
    /// Gestures capture `before` at pointer-down and commit on release; the
    /// entry is only recorded if the document actually changed.
    pub(crate) fn batch_from<R>(
        &mut self,
        label: &str,
        before: Document,
        f: impl FnOnce(&mut Self) -> EngineResult<R>,
    ) -> EngineResult<R> {
        if self.batch_depth == 0 {
            self.flush_captures();
        }
        self.batch_depth += 1;
        let result = f(self);
        self.batch_depth -= 1;
        if self.batch_depth > 0 {
            return result;
        }
        let changed = self.document.as_ref().is_some_and(|d| *d != before);
        if result.is_ok() && changed && !self.restoring {
            self.history.push_state(label, before);
            log::debug!("History: recorded '{label}'");
            self.queue_event(ChangeEvent::HistoryChanged);
        }
        for event in std::mem::take(&mut self.queued_events) {
            self.emit_now(event);
        }
        result
    }

    /// Start or extend a debounced capture keyed by `key`.
    ///
    /// The pre-edit snapshot is taken on the first edit; later edits within
    /// the quiet period only push the deadline back.
    pub(crate) fn schedule_capture(&mut self, key: Uuid, label: &str, now: Instant) -> EngineResult<()> {
        if self.batch_depth > 0 || self.restoring {
            return Ok(());
        }
        if !self.captures.reschedule(&key, now) {
            let before = self.doc()?.clone();
            let seq = self.capture_seq;
            self.capture_seq += 1;
            self.captures.schedule(key, PendingCapture { label: label.to_string(), before, seq }, now);
        }
        Ok(())
    }

    /// Record every pending debounced capture right away, oldest first.
    fn flush_captures(&mut self) {
        if self.captures.is_empty() {
            return;
        }
        let mut pending = self.captures.drain();
        pending.sort_by_key(|(_, c)| c.seq);
        for (_, capture) in pending {
            self.history.push_state(capture.label, capture.before);
        }
        self.notify(ChangeEvent::HistoryChanged);
    }

    pub(crate) fn touch(&mut self) {
        if let Some(doc) = self.document.as_mut() {
            doc.touch();
        }
    }

    /// Emit now, or after the enclosing batch finishes.
    pub(crate) fn notify(&mut self, event: ChangeEvent) {
        if self.batch_depth > 0 {
            self.queue_event(event);
        } else {
            self.emit_now(event);
        }
    }

    fn queue_event(&mut self, event: ChangeEvent) {
        if !self.queued_events.contains(&event) {
            self.queued_events.push(event);
        }
    }

    fn emit_now(&mut self, event: ChangeEvent) {
        self.events.emit(event);
    }

    pub(crate) fn kind_event(kind: EntityKind) -> ChangeEvent {
        match kind {
            EntityKind::Widget => ChangeEvent::WidgetsChanged,
            EntityKind::Element => ChangeEvent::ElementsChanged,
        }
    }

    // --- Entity-generic operations ---

    pub fn entity_bounds(&self, entity: EntityRef) -> Option<Bounds> {
        self.board()?.entity_bounds(entity)
    }

    /// Smallest size `entity` may be resized to.
    pub fn min_size_for(&self, entity: EntityRef) -> Size {
        match entity.kind {
            EntityKind::Widget => self
                .board()
                .and_then(|b| b.widget(entity.id))
                .map(|w| self.widget_min_size(&w.module_id))
                .unwrap_or(Size::new(self.config.min_widget_width, self.config.min_widget_height)),
            EntityKind::Element => Size::new(self.config.min_element_size, self.config.min_element_size),
        }
    }

    /// Move an entity so its rect origin lands on `origin`.
    pub fn move_entity(&mut self, entity: EntityRef, origin: Point) -> EngineResult<bool> {
        match entity.kind {
            EntityKind::Widget => self.move_widget(entity.id, origin.x, origin.y),
            EntityKind::Element => self.move_element(entity.id, origin.x, origin.y),
        }
    }

    pub fn resize_entity(&mut self, entity: EntityRef, rect: Bounds) -> EngineResult<bool> {
        match entity.kind {
            EntityKind::Widget => self.resize_widget(entity.id, rect),
            EntityKind::Element => self.resize_element(entity.id, rect),
        }
    }

    pub fn remove_entity(&mut self, entity: EntityRef) -> EngineResult<bool> {
        match entity.kind {
            EntityKind::Widget => self.remove_widget(entity.id),
            EntityKind::Element => self.remove_element(entity.id),
        }
    }

    pub fn duplicate_entity(&mut self, entity: EntityRef) -> EngineResult<Option<EntityRef>> {
        Ok(match entity.kind {
            EntityKind::Widget => self.duplicate_widget(entity.id)?.map(EntityRef::widget),
            EntityKind::Element => self.duplicate_element(entity.id)?.map(EntityRef::element),
        })
    }

    /// Rotate entities by `delta` radians about `pivot`.
    ///
    /// Lines and arrows rotate their endpoints; other elements orbit their
    /// center and turn their own angle; widgets only orbit their center.
    pub fn rotate_entities(&mut self, entities: &[EntityRef], pivot: Point, delta: f64) -> EngineResult<bool> {
        let board = self.board_ref()?;
        let targets: Vec<EntityRef> = entities.iter().copied().filter(|e| board.contains(*e)).collect();
        if targets.is_empty() || delta == 0.0 {
            return Ok(false);
        }
        self.record("Rotate")?;
        let board = self.board_mut()?;
        let mut moved_elements = Vec::new();
        let mut widgets_changed = false;
        for entity in &targets {
            match entity.kind {
                EntityKind::Widget => {
                    if let Some(widget) = board.widget_mut(entity.id) {
                        let center = rotate_point(widget.rect.center(), pivot, delta);
                        widget.rect = widget.rect.with_center(center);
                        widgets_changed = true;
                    }
                }
                EntityKind::Element => {
                    if let Some(element) = board.element_mut(entity.id) {
                        element.rotate_about(pivot, delta);
                        moved_elements.push(entity.id);
                    }
                }
            }
        }
        for id in &moved_elements {
            bindings::resolve_line_bindings(board, *id);
        }
        for id in &moved_elements {
            bindings::refresh_bound_arrows(board, *id);
        }
        self.touch();
        if widgets_changed {
            self.notify(ChangeEvent::WidgetsChanged);
        }
        if !moved_elements.is_empty() {
            self.notify(ChangeEvent::ElementsChanged);
        }
        Ok(true)
    }

    /// Delete `entity` and everything that refers to it. Not recorded.
    ///
    /// References are purged before the entity leaves its list so hooks and
    /// lookups still see it.
    pub(crate) fn purge_entity(&mut self, entity: EntityRef) -> EngineResult<bool> {
        if !self.board_ref()?.contains(entity) {
            return Ok(false);
        }
        let id = entity.id;
        for hook in &mut self.cleanup_hooks {
            hook.cleanup(id);
        }
        self.captures.cancel(&id);

        let doc = self.doc_mut()?;
        let board = &mut doc.board;
        let connections_before = board.connections.len();
        board.connections.retain(|c| !c.involves(id));
        let connections_changed = connections_before != board.connections.len();

        let mut groups_changed = false;
        match entity.kind {
            EntityKind::Element => {
                let cleared = bindings::clear_bindings_to(board, id);
                if cleared > 0 {
                    log::debug!("Cleared {cleared} arrow bindings to deleted element {id}");
                }
                for group in &mut board.groups {
                    let before = group.member_ids.len();
                    group.member_ids.retain(|m| *m != id);
                    groups_changed |= before != group.member_ids.len();
                }
                board.groups.retain(|g| !g.member_ids.is_empty());
                board.elements.retain(|e| e.id() != id);
            }
            EntityKind::Widget => {
                doc.modules.remove(&id);
                doc.board.widgets.retain(|w| w.id != id);
            }
        }

        let selection_changed = self.selection.remove(entity);
        if groups_changed {
            self.prune_selection();
        }
        self.touch();
        self.notify(Self::kind_event(entity.kind));
        if connections_changed {
            self.notify(ChangeEvent::ConnectionsChanged);
        }
        if groups_changed {
            self.notify(ChangeEvent::GroupsChanged);
        }
        if selection_changed {
            self.notify(ChangeEvent::SelectionChanged);
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elements::CanvasElement;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn store() -> BoardStore {
        let mut store = BoardStore::with_defaults();
        store.create_document("Test");
        store
    }

    fn rect(x: f64, y: f64) -> CanvasElement {
        CanvasElement::rectangle(Bounds::new(x, y, 50.0, 50.0))
    }

    #[test]
    fn test_mutation_without_document_fails() {
        let mut store = BoardStore::with_defaults();
        assert!(matches!(store.add_element(rect(0.0, 0.0)), Err(EngineError::NotInitialized)));
        assert!(matches!(store.undo(), Err(EngineError::NotInitialized)));
    }

    #[test]
    fn test_batch_records_single_entry() {
        let mut store = store();
        store
            .batch("Two adds", |s| {
                s.add_element(rect(0.0, 0.0))?;
                s.add_element(rect(100.0, 0.0))?;
                Ok(())
            })
            .unwrap();
        assert_eq!(store.history().len(), 1);
        assert!(store.undo().unwrap());
        assert!(store.board().unwrap().elements.is_empty());
    }

    #[test]
    fn test_unchanged_batch_records_nothing() {
        let mut store = store();
        let before = store.document().unwrap().clone();
        store.batch_from("Nothing", before, |_| Ok(())).unwrap();
        assert!(store.history().is_empty());
    }

    #[test]
    fn test_events_emitted_once_after_batch() {
        let mut store = store();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        store.subscribe(move |e| sink.borrow_mut().push(*e));
        store
            .batch("Two adds", |s| {
                s.add_element(rect(0.0, 0.0))?;
                s.add_element(rect(100.0, 0.0))?;
                Ok(())
            })
            .unwrap();
        let events = seen.borrow();
        assert_eq!(events.iter().filter(|e| **e == ChangeEvent::ElementsChanged).count(), 1);
        assert_eq!(events.iter().filter(|e| **e == ChangeEvent::HistoryChanged).count(), 1);
    }

    #[test]
    fn test_cleanup_hook_runs_before_removal() {
        let mut store = store();
        let id = store.add_element(rect(0.0, 0.0)).unwrap();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        store.add_cleanup_hook(move |id: Uuid| sink.borrow_mut().push(id));
        assert!(store.remove_element(id).unwrap());
        assert_eq!(*seen.borrow(), vec![id]);
    }

    #[test]
    fn test_load_resets_history_and_selection() {
        let mut store = store();
        store.add_element(rect(0.0, 0.0)).unwrap();
        assert!(store.can_undo());
        let doc = store.document().unwrap().clone();
        store.load_document(doc);
        assert!(!store.can_undo());
        assert!(store.selection().is_empty());
    }

    #[test]
    fn test_close_document() {
        let mut store = store();
        assert!(store.close_document().is_some());
        assert!(!store.is_initialized());
        assert!(store.close_document().is_none());
    }
}
