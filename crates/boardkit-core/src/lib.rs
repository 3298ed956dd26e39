//! Boardkit Core Library
//!
//! Document engine for the Boardkit infinite canvas: the entity store, its
//! snapshot undo history, and the pointer-driven selection and transform
//! state machine.

pub mod config;
pub mod connection;
pub mod deferred;
pub mod document;
pub mod elements;
pub mod engine;
pub mod error;
pub mod events;
pub mod geometry;
pub mod history;
pub mod modules;
pub mod selection;
pub mod snap;
pub mod store;
pub mod transform;
pub mod widget;

pub use config::EngineConfig;
pub use connection::{Connection, ConnectionId, ConnectionStyle};
pub use document::{Background, Board, CanvasSettings, Document, ElementGroup, GroupId, Viewport};
pub use elements::{ArrowBinding, BindingEnd, CanvasElement, ElementId, ElementStyle};
pub use engine::DocumentEngine;
pub use error::{EngineError, EngineResult};
pub use events::{ChangeEvent, SubscriptionId};
pub use geometry::{Anchor, AnchorHit, Bounds};
pub use history::{HistoryEntry, HistoryManager};
pub use modules::{CleanupHook, ModuleCatalog, ModuleDefinition, ModuleRegistry, ModuleSpec};
pub use selection::{EntityKind, EntityRef, Selection};
pub use snap::{GridSnap, SnapResult};
pub use store::{BoardStore, ClipboardItem};
pub use transform::{InteractionMode, Modifiers, Tool, TransformEngine};
pub use widget::{Widget, WidgetId, WidgetVisibility};
