//! Collaborator interfaces: module lookup and deletion cleanup.
//!
//! Widgets are owned by pluggable modules that live outside the engine. The
//! engine only needs their sizing rules and a way to (de)serialize their
//! state, plus a hook to tell other subsystems that an entity went away.

use kurbo::Size;
use serde_json::Value;
use std::collections::HashMap;
use uuid::Uuid;

/// What the engine needs to know about one module.
pub trait ModuleDefinition {
    fn display_name(&self) -> &str;

    /// Size of a freshly placed widget.
    fn default_size(&self) -> Size;

    /// Smallest size a widget of this module may be resized to.
    fn min_size(&self) -> Size;

    /// State of a freshly placed widget.
    fn default_state(&self) -> Value;

    /// Turn live state into its stored form.
    fn serialize(&self, state: &Value) -> Value {
        state.clone()
    }

    /// Turn stored data back into live state.
    fn deserialize(&self, data: &Value) -> Value {
        data.clone()
    }
}

/// Module lookup by id. Documents may reference modules that are not
/// installed, so a miss is an ordinary outcome.
pub trait ModuleRegistry {
    fn get(&self, module_id: &str) -> Option<&dyn ModuleDefinition>;
}

/// Hook invoked before a widget or element is removed.
pub trait CleanupHook {
    fn cleanup(&mut self, entity_id: Uuid);
}

impl<F: FnMut(Uuid)> CleanupHook for F {
    fn cleanup(&mut self, entity_id: Uuid) {
        self(entity_id)
    }
}

/// A module described entirely by data.
#[derive(Debug, Clone, PartialEq)]
pub struct ModuleSpec {
    pub display_name: String,
    pub default_size: Size,
    pub min_size: Size,
    pub default_state: Value,
}

impl ModuleSpec {
    pub fn new(display_name: impl Into<String>, default_size: Size, min_size: Size) -> Self {
        Self { display_name: display_name.into(), default_size, min_size, default_state: Value::Null }
    }

    pub fn with_default_state(mut self, state: Value) -> Self {
        self.default_state = state;
        self
    }
}

impl ModuleDefinition for ModuleSpec {
    fn display_name(&self) -> &str {
        &self.display_name
    }

    fn default_size(&self) -> Size {
        self.default_size
    }

    fn min_size(&self) -> Size {
        self.min_size
    }

    fn default_state(&self) -> Value {
        self.default_state.clone()
    }
}

/// In-memory module registry.
#[derive(Default)]
pub struct ModuleCatalog {
    modules: HashMap<String, Box<dyn ModuleDefinition>>,
}

impl ModuleCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a module, replacing any previous one with the same id.
    pub fn register(&mut self, module_id: impl Into<String>, module: impl ModuleDefinition + 'static) {
        self.modules.insert(module_id.into(), Box::new(module));
    }

    pub fn with(mut self, module_id: impl Into<String>, module: impl ModuleDefinition + 'static) -> Self {
        self.register(module_id, module);
        self
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

impl ModuleRegistry for ModuleCatalog {
    fn get(&self, module_id: &str) -> Option<&dyn ModuleDefinition> {
        self.modules.get(module_id).map(|m| m.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_catalog_lookup() {
        let catalog = ModuleCatalog::new().with(
            "todo",
            ModuleSpec::new("Todo", Size::new(280.0, 320.0), Size::new(200.0, 150.0))
                .with_default_state(json!({ "items": [] })),
        );
        let module = catalog.get("todo").unwrap();
        assert_eq!(module.display_name(), "Todo");
        assert_eq!(module.default_state(), json!({ "items": [] }));
        assert_eq!(module.serialize(&json!(3)), json!(3));
        assert!(catalog.get("kanban").is_none());
    }

    #[test]
    fn test_closure_cleanup_hook() {
        let mut seen = Vec::new();
        {
            let mut hook = |id: Uuid| seen.push(id);
            let id = Uuid::new_v4();
            CleanupHook::cleanup(&mut hook, id);
        }
        assert_eq!(seen.len(), 1);
    }
}
