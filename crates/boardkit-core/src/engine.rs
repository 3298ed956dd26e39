//! The document engine: one owned object for the store and pointer handling.

use crate::config::EngineConfig;
use crate::error::EngineResult;
use crate::modules::ModuleRegistry;
use crate::store::BoardStore;
use crate::transform::{InteractionMode, Modifiers, Tool, TransformEngine};
use kurbo::Point;
use std::time::Instant;

/// Owns the [`BoardStore`] and the [`TransformEngine`] that edits it.
///
/// History navigation goes through here so a live gesture is abandoned
/// before the document underneath it is replaced.
pub struct DocumentEngine {
    store: BoardStore,
    transform: TransformEngine,
}

impl DocumentEngine {
    pub fn new(config: EngineConfig, modules: impl ModuleRegistry + 'static) -> EngineResult<Self> {
        config.validate()?;
        Ok(Self { store: BoardStore::new(config, modules), transform: TransformEngine::new() })
    }

    /// Build from a JSON config.
    pub fn from_config_json(json: &str, modules: impl ModuleRegistry + 'static) -> EngineResult<Self> {
        Self::new(EngineConfig::from_json(json)?, modules)
    }

    pub fn store(&self) -> &BoardStore {
        &self.store
    }

    /// Direct store access for CRUD calls that do not involve a gesture.
    pub fn store_mut(&mut self) -> &mut BoardStore {
        &mut self.store
    }

    pub fn transform(&self) -> &TransformEngine {
        &self.transform
    }

    pub fn transform_mut(&mut self) -> &mut TransformEngine {
        &mut self.transform
    }

    pub fn mode(&self) -> InteractionMode {
        self.transform.mode()
    }

    pub fn set_tool(&mut self, tool: Tool) {
        self.transform.set_tool(tool);
    }

    // --- Pointer input ---

    pub fn pointer_down(&mut self, screen: Point, modifiers: Modifiers) -> EngineResult<()> {
        self.transform.pointer_down(&mut self.store, screen, modifiers)
    }

    pub fn pointer_move(&mut self, screen: Point, modifiers: Modifiers) -> EngineResult<()> {
        self.transform.pointer_move(&mut self.store, screen, modifiers)
    }

    pub fn pointer_up(&mut self, screen: Point, modifiers: Modifiers) -> EngineResult<()> {
        self.transform.pointer_up(&mut self.store, screen, modifiers)
    }

    pub fn click(&mut self, screen: Point, modifiers: Modifiers) -> EngineResult<()> {
        self.transform.click(&mut self.store, screen, modifiers)
    }

    /// Escape: abandon the gesture, or leave connecting mode.
    pub fn cancel(&mut self) -> bool {
        self.transform.cancel()
    }

    pub fn focus_lost(&mut self) -> bool {
        self.transform.focus_lost()
    }

    // --- History ---

    pub fn undo(&mut self) -> EngineResult<bool> {
        self.abandon_gesture("undo");
        self.store.undo()
    }

    pub fn redo(&mut self) -> EngineResult<bool> {
        self.abandon_gesture("redo");
        self.store.redo()
    }

    pub fn go_to_entry(&mut self, entry_id: u64) -> EngineResult<bool> {
        self.abandon_gesture("history jump");
        self.store.go_to_entry(entry_id)
    }

    pub fn go_to_live(&mut self) -> EngineResult<bool> {
        self.abandon_gesture("history jump");
        self.store.go_to_live()
    }

    /// Fire due debounced captures.
    pub fn tick(&mut self, now: Instant) -> usize {
        self.store.tick(now)
    }

    fn abandon_gesture(&mut self, reason: &str) {
        if self.transform.cancel() {
            log::debug!("Abandoned live gesture for {reason}");
        }
    }
}
