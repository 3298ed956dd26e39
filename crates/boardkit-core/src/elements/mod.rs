//! Native vector elements: shapes, lines, arrows, freehand strokes and text.

mod freehand;
mod linear;
mod shape;
mod text;

pub use freehand::DrawElement;
pub use linear::{ArrowBinding, BindingEnd, LinePoints, LinearElement};
pub use shape::ShapeElement;
pub use text::{FontFamily, TextAlign, TextElement};

use crate::geometry::Bounds;
use kurbo::{Point, Vec2};
use peniko::Color;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for elements.
pub type ElementId = Uuid;

/// Serializable color representation (RGBA8).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializableColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl SerializableColor {
    pub fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn black() -> Self {
        Self::new(0, 0, 0, 255)
    }

    pub fn white() -> Self {
        Self::new(255, 255, 255, 255)
    }
}

impl From<Color> for SerializableColor {
    fn from(color: Color) -> Self {
        let rgba = color.to_rgba8();
        Self { r: rgba.r, g: rgba.g, b: rgba.b, a: rgba.a }
    }
}

impl From<SerializableColor> for Color {
    fn from(color: SerializableColor) -> Self {
        Color::from_rgba8(color.r, color.g, color.b, color.a)
    }
}

/// Stroke style for outlines, lines and arrows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrokeStyle {
    #[default]
    Solid,
    Dashed,
    Dotted,
}

/// Visual style shared by every element kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementStyle {
    pub stroke_color: SerializableColor,
    pub stroke_width: f64,
    /// Fill color (None = no fill).
    #[serde(default)]
    pub fill_color: Option<SerializableColor>,
    #[serde(default)]
    pub stroke_style: StrokeStyle,
    /// 0.0 = fully transparent, 1.0 = fully opaque.
    #[serde(default = "default_opacity")]
    pub opacity: f64,
}

fn default_opacity() -> f64 {
    1.0
}

impl ElementStyle {
    /// Stroke color as a peniko Color.
    pub fn stroke(&self) -> Color {
        self.stroke_color.into()
    }

    /// Fill color as a peniko Color.
    pub fn fill(&self) -> Option<Color> {
        self.fill_color.map(Into::into)
    }

    pub fn set_stroke(&mut self, color: Color) {
        self.stroke_color = color.into();
    }

    pub fn set_fill(&mut self, color: Option<Color>) {
        self.fill_color = color.map(Into::into);
    }
}

impl Default for ElementStyle {
    fn default() -> Self {
        Self {
            stroke_color: SerializableColor::black(),
            stroke_width: 2.0,
            fill_color: None,
            stroke_style: StrokeStyle::default(),
            opacity: 1.0,
        }
    }
}

/// Common behaviour of every element variant.
pub trait ElementTrait {
    /// Get the unique identifier.
    fn id(&self) -> ElementId;

    /// Authoritative bounding box in canvas coordinates.
    fn bounds(&self) -> Bounds;

    /// Position in the shared widget/element stacking order.
    fn z_index(&self) -> i64;

    fn set_z_index(&mut self, z_index: i64);

    fn style(&self) -> &ElementStyle;

    fn style_mut(&mut self) -> &mut ElementStyle;

    /// Move by `delta`, carrying any point data along.
    fn translate(&mut self, delta: Vec2);

    /// Fit into `bounds`, rescaling any point data proportionally.
    fn resize(&mut self, bounds: Bounds);

    /// Rotate by `delta` radians about `pivot`.
    fn rotate_about(&mut self, pivot: Point, delta: f64);
}

/// Discriminant of [`CanvasElement`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementKind {
    Rectangle,
    Ellipse,
    Line,
    Arrow,
    Draw,
    Text,
}

/// Tagged union over all element kinds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum CanvasElement {
    Rectangle(ShapeElement),
    Ellipse(ShapeElement),
    Line(LinearElement),
    Arrow(LinearElement),
    Draw(DrawElement),
    Text(TextElement),
}

macro_rules! each_variant {
    ($element:expr, $inner:ident => $body:expr) => {
        match $element {
            CanvasElement::Rectangle($inner) | CanvasElement::Ellipse($inner) => $body,
            CanvasElement::Line($inner) | CanvasElement::Arrow($inner) => $body,
            CanvasElement::Draw($inner) => $body,
            CanvasElement::Text($inner) => $body,
        }
    };
}

impl CanvasElement {
    pub fn rectangle(bounds: Bounds) -> Self {
        CanvasElement::Rectangle(ShapeElement::new(bounds))
    }

    pub fn ellipse(bounds: Bounds) -> Self {
        CanvasElement::Ellipse(ShapeElement::new(bounds))
    }

    pub fn line(start: Point, end: Point) -> Self {
        CanvasElement::Line(LinearElement::new(start, end))
    }

    pub fn arrow(start: Point, end: Point) -> Self {
        CanvasElement::Arrow(LinearElement::new(start, end))
    }

    pub fn draw(points: Vec<Point>) -> Self {
        CanvasElement::Draw(DrawElement::new(points))
    }

    pub fn text(origin: Point, content: impl Into<String>) -> Self {
        CanvasElement::Text(TextElement::new(origin, content.into()))
    }

    pub fn kind(&self) -> ElementKind {
        match self {
            CanvasElement::Rectangle(_) => ElementKind::Rectangle,
            CanvasElement::Ellipse(_) => ElementKind::Ellipse,
            CanvasElement::Line(_) => ElementKind::Line,
            CanvasElement::Arrow(_) => ElementKind::Arrow,
            CanvasElement::Draw(_) => ElementKind::Draw,
            CanvasElement::Text(_) => ElementKind::Text,
        }
    }

    pub fn id(&self) -> ElementId {
        each_variant!(self, e => e.id())
    }

    pub fn bounds(&self) -> Bounds {
        each_variant!(self, e => e.bounds())
    }

    pub fn z_index(&self) -> i64 {
        each_variant!(self, e => e.z_index())
    }

    pub fn set_z_index(&mut self, z_index: i64) {
        each_variant!(self, e => e.set_z_index(z_index))
    }

    pub fn style(&self) -> &ElementStyle {
        each_variant!(self, e => e.style())
    }

    pub fn style_mut(&mut self) -> &mut ElementStyle {
        each_variant!(self, e => e.style_mut())
    }

    pub fn translate(&mut self, delta: Vec2) {
        each_variant!(self, e => e.translate(delta))
    }

    pub fn resize(&mut self, bounds: Bounds) {
        each_variant!(self, e => e.resize(bounds))
    }

    pub fn rotate_about(&mut self, pivot: Point, delta: f64) {
        each_variant!(self, e => e.rotate_about(pivot, delta))
    }

    /// Replace the id with a fresh one (duplicate/paste).
    pub fn regenerate_id(&mut self) {
        each_variant!(self, e => e.id = Uuid::new_v4())
    }

    /// Rectangles and ellipses: the only kinds arrows can bind to.
    pub fn is_shape(&self) -> bool {
        matches!(self, CanvasElement::Rectangle(_) | CanvasElement::Ellipse(_))
    }

    /// Lines and arrows: orientation lives in their endpoints.
    pub fn is_linear(&self) -> bool {
        matches!(self, CanvasElement::Line(_) | CanvasElement::Arrow(_))
    }

    pub fn as_shape(&self) -> Option<&ShapeElement> {
        match self {
            CanvasElement::Rectangle(s) | CanvasElement::Ellipse(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_shape_mut(&mut self) -> Option<&mut ShapeElement> {
        match self {
            CanvasElement::Rectangle(s) | CanvasElement::Ellipse(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_linear(&self) -> Option<&LinearElement> {
        match self {
            CanvasElement::Line(l) | CanvasElement::Arrow(l) => Some(l),
            _ => None,
        }
    }

    pub fn as_linear_mut(&mut self) -> Option<&mut LinearElement> {
        match self {
            CanvasElement::Line(l) | CanvasElement::Arrow(l) => Some(l),
            _ => None,
        }
    }

    pub fn as_text_mut(&mut self) -> Option<&mut TextElement> {
        match self {
            CanvasElement::Text(t) => Some(t),
            _ => None,
        }
    }

    /// Rotation angle in radians (0 for lines and arrows).
    pub fn rotation(&self) -> f64 {
        match self {
            CanvasElement::Rectangle(s) | CanvasElement::Ellipse(s) => s.rotation,
            CanvasElement::Draw(d) => d.rotation,
            CanvasElement::Text(t) => t.rotation,
            CanvasElement::Line(_) | CanvasElement::Arrow(_) => 0.0,
        }
    }

    /// Set the rotation angle. Ignored by lines and arrows.
    pub fn set_rotation(&mut self, rotation: f64) {
        match self {
            CanvasElement::Rectangle(s) | CanvasElement::Ellipse(s) => s.rotation = rotation,
            CanvasElement::Draw(d) => d.rotation = rotation,
            CanvasElement::Text(t) => t.rotation = rotation,
            CanvasElement::Line(_) | CanvasElement::Arrow(_) => {}
        }
    }

    /// Whether this element carries an angle field.
    pub fn supports_rotation(&self) -> bool {
        !self.is_linear()
    }
}

/// Map `point` from `from` into `to`, preserving its relative position.
///
/// A zero extent on either axis maps to a plain offset on that axis.
pub(crate) fn remap_point(point: Point, from: Bounds, to: Bounds) -> Point {
    let sx = if from.width.abs() > f64::EPSILON { to.width / from.width } else { 1.0 };
    let sy = if from.height.abs() > f64::EPSILON { to.height / from.height } else { 1.0 };
    Point::new(to.x + (point.x - from.x) * sx, to.y + (point.y - from.y) * sy)
}
