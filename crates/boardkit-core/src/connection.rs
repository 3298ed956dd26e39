//! Connections between two board entities.

use crate::elements::{SerializableColor, StrokeStyle};
use crate::selection::{EntityKind, EntityRef};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for connections.
pub type ConnectionId = Uuid;

/// Optional line style of a connection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionStyle {
    pub color: SerializableColor,
    pub width: f64,
    #[serde(default)]
    pub stroke_style: StrokeStyle,
}

impl Default for ConnectionStyle {
    fn default() -> Self {
        Self {
            color: SerializableColor::new(100, 116, 139, 255),
            width: 2.0,
            stroke_style: StrokeStyle::Dashed,
        }
    }
}

/// A link between a source and a target entity.
///
/// Never connects an entity to itself; at most one connection exists per
/// unordered endpoint pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
    pub id: ConnectionId,
    pub source_id: Uuid,
    pub source_type: EntityKind,
    pub target_id: Uuid,
    pub target_type: EntityKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<ConnectionStyle>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl Connection {
    pub fn new(source: EntityRef, target: EntityRef) -> Self {
        Self {
            id: Uuid::new_v4(),
            source_id: source.id,
            source_type: source.kind,
            target_id: target.id,
            target_type: target.kind,
            style: None,
            label: None,
        }
    }

    pub fn source(&self) -> EntityRef {
        EntityRef::new(self.source_type, self.source_id)
    }

    pub fn target(&self) -> EntityRef {
        EntityRef::new(self.target_type, self.target_id)
    }

    pub fn involves(&self, id: Uuid) -> bool {
        self.source_id == id || self.target_id == id
    }

    /// Whether this connection joins `a` and `b`, in either direction.
    pub fn joins(&self, a: Uuid, b: Uuid) -> bool {
        (self.source_id == a && self.target_id == b) || (self.source_id == b && self.target_id == a)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_joins_is_unordered() {
        let a = EntityRef::element(Uuid::new_v4());
        let b = EntityRef::widget(Uuid::new_v4());
        let conn = Connection::new(a, b);
        assert!(conn.joins(a.id, b.id));
        assert!(conn.joins(b.id, a.id));
        assert!(!conn.joins(a.id, a.id));
        assert_eq!(conn.target(), b);
    }

    #[test]
    fn test_serialized_field_names() {
        let conn = Connection::new(EntityRef::element(Uuid::new_v4()), EntityRef::widget(Uuid::new_v4()));
        let json = serde_json::to_value(&conn).unwrap();
        assert_eq!(json["sourceType"], "element");
        assert_eq!(json["targetType"], "widget");
    }
}
