//! Widgets: rectangular placements whose content belongs to an external module.

use crate::geometry::Bounds;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for widgets.
pub type WidgetId = Uuid;

/// Whether a widget is shown on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WidgetVisibility {
    #[default]
    Visible,
    Hidden,
}

impl WidgetVisibility {
    pub fn toggled(self) -> Self {
        match self {
            WidgetVisibility::Visible => WidgetVisibility::Hidden,
            WidgetVisibility::Hidden => WidgetVisibility::Visible,
        }
    }
}

/// A placed module instance. The engine never interprets its content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Widget {
    pub id: WidgetId,
    pub module_id: String,
    pub rect: Bounds,
    pub z_index: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visibility: Option<WidgetVisibility>,
    /// Content scale factor; `None` means 1.0.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<f64>,
}

impl Widget {
    pub fn new(module_id: impl Into<String>, rect: Bounds, z_index: i64) -> Self {
        Self {
            id: Uuid::new_v4(),
            module_id: module_id.into(),
            rect,
            z_index,
            visibility: None,
            scale: None,
        }
    }

    pub fn is_visible(&self) -> bool {
        self.visibility.unwrap_or_default() == WidgetVisibility::Visible
    }

    pub fn effective_scale(&self) -> f64 {
        self.scale.unwrap_or(1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_visibility_defaults_to_visible() {
        let mut widget = Widget::new("notes", Bounds::new(0.0, 0.0, 100.0, 100.0), 1);
        assert!(widget.is_visible());
        widget.visibility = Some(WidgetVisibility::Visible.toggled());
        assert!(!widget.is_visible());
    }

    #[test]
    fn test_optional_fields_skipped() {
        let widget = Widget::new("notes", Bounds::new(0.0, 0.0, 100.0, 100.0), 1);
        let json = serde_json::to_value(&widget).unwrap();
        assert!(json.get("visibility").is_none());
        assert_eq!(json["moduleId"], "notes");
        assert_eq!(json["zIndex"], 1);
    }
}
