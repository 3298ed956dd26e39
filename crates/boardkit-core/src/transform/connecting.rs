//! Modal connection creation.
//!
//! The hovered target is tracked here from the engine's own hit-testing, not
//! from whatever the host toolkit reports as the event target.

use crate::connection::ConnectionId;
use crate::error::EngineResult;
use crate::selection::EntityRef;
use crate::store::BoardStore;

#[derive(Debug, Clone, Copy)]
pub(crate) struct ConnectingState {
    pub source: EntityRef,
    pub hover: Option<EntityRef>,
}

impl ConnectingState {
    pub fn new(source: EntityRef) -> Self {
        Self { source, hover: None }
    }

    /// Finish on click: connect to the hovered target, or create nothing when
    /// nothing (or the source itself) is hovered.
    pub fn complete(self, store: &mut BoardStore) -> EngineResult<Option<ConnectionId>> {
        let Some(target) = self.hover else {
            log::debug!("Connecting cancelled: no target");
            return Ok(None);
        };
        if target.id == self.source.id {
            log::debug!("Connecting cancelled: source clicked");
            return Ok(None);
        }
        store.add_connection(self.source.id, self.source.kind, target.id, target.kind)
    }
}
