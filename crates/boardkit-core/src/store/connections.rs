//! Connections between widgets and elements.

use super::BoardStore;
use crate::connection::{Connection, ConnectionId, ConnectionStyle};
use crate::error::EngineResult;
use crate::events::ChangeEvent;
use crate::selection::{EntityKind, EntityRef};
use uuid::Uuid;

impl BoardStore {
    pub fn connections(&self) -> &[Connection] {
        self.board().map_or(&[], |b| b.connections.as_slice())
    }

    pub fn connection(&self, id: ConnectionId) -> Option<&Connection> {
        self.connections().iter().find(|c| c.id == id)
    }

    /// Connections with `entity_id` at either end.
    pub fn connections_for(&self, entity_id: Uuid) -> Vec<&Connection> {
        self.connections().iter().filter(|c| c.involves(entity_id)).collect()
    }

    /// Connect two existing entities.
    ///
    /// Rejects self-connections and pairs that are already connected in
    /// either direction.
    pub fn add_connection(
        &mut self,
        source_id: Uuid,
        source_type: EntityKind,
        target_id: Uuid,
        target_type: EntityKind,
    ) -> EngineResult<Option<ConnectionId>> {
        let board = self.board_ref()?;
        let source = EntityRef::new(source_type, source_id);
        let target = EntityRef::new(target_type, target_id);
        if source_id == target_id {
            log::debug!("add_connection: refusing self-connection on {source_id}");
            return Ok(None);
        }
        if !board.contains(source) || !board.contains(target) {
            log::debug!("add_connection: unknown endpoint");
            return Ok(None);
        }
        if board.connections.iter().any(|c| c.joins(source_id, target_id)) {
            log::debug!("add_connection: {source_id} and {target_id} are already connected");
            return Ok(None);
        }
        self.record("Connect")?;
        let connection = Connection::new(source, target);
        let id = connection.id;
        self.board_mut()?.connections.push(connection);
        self.touch();
        self.notify(ChangeEvent::ConnectionsChanged);
        Ok(Some(id))
    }

    pub fn remove_connection(&mut self, id: ConnectionId) -> EngineResult<bool> {
        if !self.board_ref()?.connections.iter().any(|c| c.id == id) {
            return Ok(false);
        }
        self.record("Disconnect")?;
        self.board_mut()?.connections.retain(|c| c.id != id);
        self.touch();
        self.notify(ChangeEvent::ConnectionsChanged);
        Ok(true)
    }

    pub fn set_connection_label(&mut self, id: ConnectionId, label: Option<String>) -> EngineResult<bool> {
        self.edit_connection(id, "Label connection", |c| c.label = label.filter(|l| !l.is_empty()))
    }

    pub fn set_connection_style(&mut self, id: ConnectionId, style: Option<ConnectionStyle>) -> EngineResult<bool> {
        self.edit_connection(id, "Style connection", |c| c.style = style)
    }

    fn edit_connection(
        &mut self,
        id: ConnectionId,
        label: &str,
        edit: impl FnOnce(&mut Connection),
    ) -> EngineResult<bool> {
        if !self.board_ref()?.connections.iter().any(|c| c.id == id) {
            return Ok(false);
        }
        self.record(label)?;
        if let Some(connection) = self.board_mut()?.connections.iter_mut().find(|c| c.id == id) {
            edit(connection);
        }
        self.touch();
        self.notify(ChangeEvent::ConnectionsChanged);
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elements::CanvasElement;
    use crate::geometry::Bounds;

    fn setup() -> (BoardStore, Uuid, Uuid) {
        let mut store = BoardStore::with_defaults();
        store.create_document("Connections");
        let a = store.add_element(CanvasElement::rectangle(Bounds::new(0.0, 0.0, 10.0, 10.0))).unwrap();
        let b = store.add_element(CanvasElement::ellipse(Bounds::new(50.0, 0.0, 10.0, 10.0))).unwrap();
        (store, a, b)
    }

    #[test]
    fn test_rejects_self_and_duplicates() {
        let (mut store, a, b) = setup();
        let el = EntityKind::Element;
        assert_eq!(store.add_connection(a, el, a, el).unwrap(), None);
        assert!(store.add_connection(a, el, b, el).unwrap().is_some());
        assert_eq!(store.add_connection(a, el, b, el).unwrap(), None);
        assert_eq!(store.add_connection(b, el, a, el).unwrap(), None);
        assert_eq!(store.connections().len(), 1);
    }

    #[test]
    fn test_rejects_wrong_kind() {
        let (mut store, a, b) = setup();
        assert_eq!(store.add_connection(a, EntityKind::Widget, b, EntityKind::Element).unwrap(), None);
    }

    #[test]
    fn test_deleting_endpoint_removes_connection() {
        let (mut store, a, b) = setup();
        let el = EntityKind::Element;
        store.add_connection(a, el, b, el).unwrap();
        store.remove_element(b).unwrap();
        assert!(store.connections().is_empty());
        assert!(store.connections_for(a).is_empty());
    }

    #[test]
    fn test_label_and_remove() {
        let (mut store, a, b) = setup();
        let el = EntityKind::Element;
        let id = store.add_connection(a, el, b, el).unwrap().unwrap();
        assert!(store.set_connection_label(id, Some("feeds".into())).unwrap());
        assert_eq!(store.connection(id).unwrap().label.as_deref(), Some("feeds"));
        assert!(store.remove_connection(id).unwrap());
        assert!(!store.remove_connection(id).unwrap());
    }
}
