//! Text element.

use super::{ElementId, ElementStyle, ElementTrait};
use crate::geometry::{normalize_angle, rotate_point, Bounds};
use kurbo::{Point, Vec2};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Font family for text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontFamily {
    #[default]
    Sans,
    Serif,
    Mono,
    Handwritten,
}

/// Horizontal text alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
}

/// A free-standing text block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextElement {
    pub(crate) id: ElementId,
    pub rect: Bounds,
    pub z_index: i64,
    #[serde(default)]
    pub rotation: f64,
    pub style: ElementStyle,
    pub content: String,
    pub font_size: f64,
    #[serde(default)]
    pub font_family: FontFamily,
    #[serde(default)]
    pub text_align: TextAlign,
}

impl TextElement {
    pub const DEFAULT_FONT_SIZE: f64 = 20.0;
    pub const DEFAULT_WIDTH: f64 = 200.0;

    pub fn new(origin: Point, content: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            rect: Bounds::new(origin.x, origin.y, Self::DEFAULT_WIDTH, Self::DEFAULT_FONT_SIZE * 1.5),
            z_index: 0,
            rotation: 0.0,
            style: ElementStyle::default(),
            content,
            font_size: Self::DEFAULT_FONT_SIZE,
            font_family: FontFamily::default(),
            text_align: TextAlign::default(),
        }
    }
}

impl ElementTrait for TextElement {
    fn id(&self) -> ElementId {
        self.id
    }

    fn bounds(&self) -> Bounds {
        self.rect
    }

    fn z_index(&self) -> i64 {
        self.z_index
    }

    fn set_z_index(&mut self, z_index: i64) {
        self.z_index = z_index;
    }

    fn style(&self) -> &ElementStyle {
        &self.style
    }

    fn style_mut(&mut self) -> &mut ElementStyle {
        &mut self.style
    }

    fn translate(&mut self, delta: Vec2) {
        self.rect = self.rect.translated(delta);
    }

    fn resize(&mut self, bounds: Bounds) {
        self.rect = bounds.normalized();
    }

    fn rotate_about(&mut self, pivot: Point, delta: f64) {
        let center = rotate_point(self.rect.center(), pivot, delta);
        self.rect = self.rect.with_center(center);
        self.rotation = normalize_angle(self.rotation + delta);
    }
}
