//! Pointer interaction: the selection and transform state machine.
//!
//! Exactly one gesture is live at a time. Pointer motion only updates
//! preview values held here; the store is written once, on release, as a
//! single history entry captured at pointer-down.

mod connecting;
mod drag;
mod drawing;
mod marquee;
pub mod resize;
pub mod rotate;

pub use drawing::DEFAULT_SHAPE_SIZE;

use crate::elements::{CanvasElement, ElementStyle};
use crate::error::EngineResult;
use crate::geometry::{normalize_angle, rotate_point, AnchorHit, Bounds};
use crate::selection::{handles_for, hit_test_handles, EntityKind, EntityRef, HandleKind, HANDLE_HIT_TOLERANCE};
use crate::store::BoardStore;
use connecting::ConnectingState;
use drag::DragState;
use drawing::DrawingState;
use kurbo::{Point, Size, Vec2};
use marquee::MarqueeState;
use resize::{GroupResize, SingleResize};
use rotate::{GroupRotate, SingleRotate};
use serde::{Deserialize, Serialize};

/// Hit tolerance for entities, in screen pixels.
pub const ENTITY_HIT_TOLERANCE: f64 = 6.0;

/// Available tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Tool {
    #[default]
    Select,
    Pan,
    Rectangle,
    Ellipse,
    Line,
    Arrow,
    Draw,
    Text,
}

impl Tool {
    pub fn is_linear(self) -> bool {
        matches!(self, Tool::Line | Tool::Arrow)
    }

    /// Whether this tool creates elements.
    pub fn creates_elements(self) -> bool {
        !matches!(self, Tool::Select | Tool::Pan)
    }
}

/// Modifier keys state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers { shift: false, ctrl: false, alt: false, meta: false };
    pub const SHIFT: Modifiers = Modifiers { shift: true, ctrl: false, alt: false, meta: false };

    /// Extend the selection instead of replacing it.
    pub fn additive(&self) -> bool {
        self.shift || self.ctrl || self.meta
    }

    /// Lock aspect ratio while resizing, snap angles while rotating.
    pub fn constrain(&self) -> bool {
        self.shift
    }
}

/// Public view of the interaction state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum InteractionMode {
    Idle,
    Panning,
    MarqueeSelecting,
    Drawing,
    DraggingPreview,
    ResizingSingle,
    ResizingGroup,
    RotatingSingle,
    RotatingGroup,
    Connecting,
}

#[derive(Debug, Clone, Default)]
enum InteractionState {
    #[default]
    Idle,
    Panning {
        last: Point,
    },
    Marquee(MarqueeState),
    Drawing(DrawingState),
    Dragging(DragState),
    ResizingSingle(SingleResize),
    ResizingGroup(GroupResize),
    RotatingSingle(SingleRotate),
    RotatingGroup(GroupRotate),
    Connecting(ConnectingState),
}

/// Interprets pointer input against a [`BoardStore`].
///
/// Points passed in are screen coordinates; the store's viewport maps them
/// onto the canvas.
#[derive(Debug, Clone, Default)]
pub struct TransformEngine {
    tool: Tool,
    state: InteractionState,
    suppress_click: bool,
    style: ElementStyle,
}

impl TransformEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tool(&self) -> Tool {
        self.tool
    }

    /// Switch tools. Any live gesture is abandoned.
    pub fn set_tool(&mut self, tool: Tool) {
        self.cancel();
        self.tool = tool;
    }

    /// Style given to newly drawn elements.
    pub fn style(&self) -> &ElementStyle {
        &self.style
    }

    pub fn set_style(&mut self, style: ElementStyle) {
        self.style = style;
    }

    pub fn mode(&self) -> InteractionMode {
        match &self.state {
            InteractionState::Idle => InteractionMode::Idle,
            InteractionState::Panning { .. } => InteractionMode::Panning,
            InteractionState::Marquee(_) => InteractionMode::MarqueeSelecting,
            InteractionState::Drawing(_) => InteractionMode::Drawing,
            InteractionState::Dragging(_) => InteractionMode::DraggingPreview,
            InteractionState::ResizingSingle(_) => InteractionMode::ResizingSingle,
            InteractionState::ResizingGroup(_) => InteractionMode::ResizingGroup,
            InteractionState::RotatingSingle(_) => InteractionMode::RotatingSingle,
            InteractionState::RotatingGroup(_) => InteractionMode::RotatingGroup,
            InteractionState::Connecting(_) => InteractionMode::Connecting,
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self.state, InteractionState::Idle)
    }

    // --- Pointer input ---

    /// Start a gesture. Ignored unless idle.
    pub fn pointer_down(&mut self, store: &mut BoardStore, screen: Point, modifiers: Modifiers) -> EngineResult<()> {
        store.doc()?;
        if !self.is_idle() {
            return Ok(());
        }
        self.suppress_click = false;
        let zoom = store.viewport().zoom;
        let canvas = store.screen_to_canvas(screen);
        self.state = match self.tool {
            Tool::Pan => InteractionState::Panning { last: screen },
            Tool::Select => self.begin_select(store, screen, canvas, modifiers, zoom)?,
            tool => InteractionState::Drawing(DrawingState::new(tool, canvas, store, zoom)),
        };
        log::debug!("pointer_down: {:?}", self.mode());
        Ok(())
    }

    fn begin_select(
        &mut self,
        store: &mut BoardStore,
        screen: Point,
        canvas: Point,
        modifiers: Modifiers,
        zoom: f64,
    ) -> EngineResult<InteractionState> {
        if let Some(state) = self.begin_handle_gesture(store, screen, canvas, zoom)? {
            return Ok(state);
        }
        let Some(hit) = store.entity_at(canvas, ENTITY_HIT_TOLERANCE / zoom) else {
            return Ok(InteractionState::Marquee(MarqueeState::new(canvas, modifiers.additive())));
        };
        if modifiers.additive() {
            store.toggle_selection(hit)?;
            if !store.is_selected(hit) {
                return Ok(InteractionState::Idle);
            }
        } else if !store.is_selected(hit) {
            store.select(hit)?;
        }
        let entities = store
            .selection()
            .items()
            .iter()
            .filter_map(|e| store.entity_bounds(*e).map(|b| (*e, b)))
            .collect();
        let before = store.doc()?.clone();
        Ok(InteractionState::Dragging(DragState::new(screen, entities, before)))
    }

    /// Resize or rotate when the pointer lands on a handle of the selection.
    fn begin_handle_gesture(
        &self,
        store: &BoardStore,
        screen: Point,
        canvas: Point,
        zoom: f64,
    ) -> EngineResult<Option<InteractionState>> {
        let selection = store.selection().items().to_vec();
        let tolerance = HANDLE_HIT_TOLERANCE / zoom;
        match selection.as_slice() {
            [] => Ok(None),
            [single] => {
                let single = *single;
                let Some(bounds) = store.entity_bounds(single) else {
                    return Ok(None);
                };
                let element = store.element(single.id).filter(|_| single.kind == EntityKind::Element);
                let rotation = element.map_or(0.0, CanvasElement::rotation);
                let rotatable = element.is_some_and(CanvasElement::supports_rotation);
                let handles = handles_for(bounds, rotation, rotatable, zoom);
                let Some(kind) = hit_test_handles(&handles, canvas, tolerance) else {
                    return Ok(None);
                };
                let before = store.doc()?.clone();
                Ok(Some(match kind {
                    HandleKind::Rotate => InteractionState::RotatingSingle(SingleRotate::new(
                        single.id,
                        bounds.center(),
                        rotation,
                        canvas,
                        before,
                    )),
                    handle => InteractionState::ResizingSingle(SingleResize {
                        entity: single,
                        handle,
                        start: screen,
                        original: bounds,
                        rotation,
                        min: resize_floor(store, single),
                        current: bounds,
                        before,
                    }),
                }))
            }
            _ => {
                let Some(bounds) = store.selection_bounds() else {
                    return Ok(None);
                };
                let handles = handles_for(bounds, 0.0, true, zoom);
                let Some(kind) = hit_test_handles(&handles, canvas, tolerance) else {
                    return Ok(None);
                };
                let before = store.doc()?.clone();
                Ok(Some(match kind {
                    HandleKind::Rotate => {
                        InteractionState::RotatingGroup(GroupRotate::new(selection, bounds.center(), canvas, before))
                    }
                    handle => {
                        let floor = store.config().min_element_size;
                        let members = selection
                            .iter()
                            .filter_map(|e| store.entity_bounds(*e).map(|b| (*e, b, resize_floor(store, *e))))
                            .collect::<Vec<_>>();
                        InteractionState::ResizingGroup(GroupResize::new(
                            handle,
                            screen,
                            bounds,
                            Size::new(floor, floor),
                            members,
                            before,
                        ))
                    }
                }))
            }
        }
    }

    /// Update the live preview. Never writes entity geometry.
    pub fn pointer_move(&mut self, store: &mut BoardStore, screen: Point, modifiers: Modifiers) -> EngineResult<()> {
        let zoom = store.viewport().zoom;
        let canvas = store.screen_to_canvas(screen);
        let snap = modifiers.constrain().then(|| store.config().rotation_snap_radians());
        match &mut self.state {
            InteractionState::Idle => {}
            InteractionState::Panning { last } => {
                let delta = screen - *last;
                *last = screen;
                if delta != Vec2::ZERO {
                    store.pan_by(delta)?;
                }
            }
            InteractionState::Marquee(marquee) => marquee.current = canvas,
            InteractionState::Drawing(drawing) => drawing.update(canvas, store, zoom),
            InteractionState::Dragging(drag) => drag.update(screen, zoom),
            InteractionState::ResizingSingle(resize) => resize.update(screen, zoom, modifiers.constrain()),
            InteractionState::ResizingGroup(resize) => resize.update(screen, zoom, modifiers.constrain()),
            InteractionState::RotatingSingle(rotate) => rotate.update(canvas, snap),
            InteractionState::RotatingGroup(rotate) => rotate.update(canvas, snap),
            InteractionState::Connecting(connecting) => {
                connecting.hover = store.entity_at(canvas, ENTITY_HIT_TOLERANCE / zoom);
            }
        }
        Ok(())
    }

    /// Finish the gesture and commit it. Connecting mode stays active until a
    /// click resolves it.
    pub fn pointer_up(&mut self, store: &mut BoardStore, screen: Point, modifiers: Modifiers) -> EngineResult<()> {
        self.pointer_move(store, screen, modifiers)?;
        let zoom = store.viewport().zoom;
        let mode = self.mode();
        let state = std::mem::take(&mut self.state);
        self.suppress_click = true;
        match state {
            InteractionState::Idle => self.suppress_click = false,
            InteractionState::Connecting(connecting) => {
                self.state = InteractionState::Connecting(connecting);
                self.suppress_click = false;
            }
            InteractionState::Panning { .. } => {}
            InteractionState::Marquee(marquee) => self.suppress_click = marquee.commit(store)?,
            InteractionState::Drawing(drawing) => {
                drawing.commit(store, &self.style, zoom)?;
            }
            InteractionState::Dragging(drag) => {
                drag.commit(store)?;
            }
            InteractionState::ResizingSingle(resize) => {
                let rect = resize.committed(store.grid_snap());
                if rect != resize.original {
                    let entity = resize.entity;
                    store.batch_from("Resize", resize.before, |s| s.resize_entity(entity, rect))?;
                }
            }
            InteractionState::ResizingGroup(resize) => {
                let frame = resize.committed_frame(store.grid_snap());
                if frame != resize.original {
                    let rects = resize.member_rects(frame);
                    store.batch_from("Resize", resize.before, |s| {
                        for (entity, rect) in rects {
                            s.resize_entity(entity, rect)?;
                        }
                        Ok(())
                    })?;
                }
            }
            InteractionState::RotatingSingle(rotate) => {
                if rotate.changed() {
                    let (id, angle) = (rotate.element, rotate.current);
                    store.batch_from("Rotate", rotate.before, |s| s.set_element_rotation(id, angle))?;
                }
            }
            InteractionState::RotatingGroup(rotate) => {
                if rotate.delta != 0.0 {
                    let (members, pivot, delta) = (rotate.members, rotate.pivot, rotate.delta);
                    store.batch_from("Rotate", rotate.before, |s| s.rotate_entities(&members, pivot, delta))?;
                }
            }
        }
        log::debug!("pointer_up: finished {mode:?}");
        Ok(())
    }

    /// Handle the click the host fires after a pointer-up.
    ///
    /// Resolves connecting mode; otherwise a click on empty canvas clears the
    /// selection, unless the preceding gesture swallowed it.
    pub fn click(&mut self, store: &mut BoardStore, screen: Point, modifiers: Modifiers) -> EngineResult<()> {
        if let InteractionState::Connecting(connecting) = self.state {
            self.state = InteractionState::Idle;
            connecting.complete(store)?;
            return Ok(());
        }
        if std::mem::take(&mut self.suppress_click) {
            return Ok(());
        }
        if self.tool != Tool::Select || modifiers.additive() || !self.is_idle() {
            return Ok(());
        }
        let zoom = store.viewport().zoom;
        let canvas = store.screen_to_canvas(screen);
        if store.entity_at(canvas, ENTITY_HIT_TOLERANCE / zoom).is_none() {
            store.clear_selection();
        }
        Ok(())
    }

    /// Abandon the live gesture without committing anything. Returns whether
    /// there was one.
    pub fn cancel(&mut self) -> bool {
        let had_gesture = !self.is_idle();
        if had_gesture {
            log::debug!("Cancelled {:?}", self.mode());
        }
        self.state = InteractionState::Idle;
        self.suppress_click = false;
        had_gesture
    }

    /// The window lost focus mid-gesture.
    pub fn focus_lost(&mut self) -> bool {
        self.cancel()
    }

    // --- Connecting mode ---

    /// Enter connecting mode from `source`.
    pub fn begin_connecting(&mut self, store: &BoardStore, source: EntityRef) -> EngineResult<bool> {
        if !store.board_ref()?.contains(source) {
            return Ok(false);
        }
        self.cancel();
        self.state = InteractionState::Connecting(ConnectingState::new(source));
        Ok(true)
    }

    /// Set the hovered target directly. False when not connecting.
    pub fn set_hover_target(&mut self, target: Option<EntityRef>) -> bool {
        match &mut self.state {
            InteractionState::Connecting(connecting) => {
                connecting.hover = target;
                true
            }
            _ => false,
        }
    }

    pub fn connection_source(&self) -> Option<EntityRef> {
        match &self.state {
            InteractionState::Connecting(connecting) => Some(connecting.source),
            _ => None,
        }
    }

    pub fn connection_hover(&self) -> Option<EntityRef> {
        match &self.state {
            InteractionState::Connecting(connecting) => connecting.hover,
            _ => None,
        }
    }

    // --- Preview read-outs ---

    /// Canvas offset of the live drag.
    pub fn drag_offset(&self) -> Option<Vec2> {
        match &self.state {
            InteractionState::Dragging(drag) => Some(drag.offset),
            _ => None,
        }
    }

    /// Where `entity` is drawn during the live gesture, if the gesture moves it.
    pub fn preview_bounds(&self, store: &BoardStore, entity: EntityRef) -> Option<Bounds> {
        match &self.state {
            InteractionState::Dragging(drag) => drag.preview(entity),
            InteractionState::ResizingSingle(resize) => (resize.entity == entity).then_some(resize.current),
            InteractionState::ResizingGroup(resize) => resize.preview(entity),
            InteractionState::RotatingGroup(rotate) => {
                if !rotate.members.contains(&entity) {
                    return None;
                }
                match entity.kind {
                    EntityKind::Element => {
                        let mut element = store.element(entity.id)?.clone();
                        element.rotate_about(rotate.pivot, rotate.delta);
                        Some(element.bounds())
                    }
                    EntityKind::Widget => {
                        let rect = store.widget(entity.id)?.rect;
                        Some(rect.with_center(rotate_point(rect.center(), rotate.pivot, rotate.delta)))
                    }
                }
            }
            _ => None,
        }
    }

    /// Angle `element_id` is drawn at during a live rotation.
    pub fn preview_rotation(&self, store: &BoardStore, element_id: uuid::Uuid) -> Option<f64> {
        match &self.state {
            InteractionState::RotatingSingle(rotate) => (rotate.element == element_id).then_some(rotate.current),
            InteractionState::RotatingGroup(rotate) => {
                let element = store.element(element_id).filter(|e| e.supports_rotation())?;
                rotate
                    .members
                    .contains(&EntityRef::element(element_id))
                    .then(|| normalize_angle(element.rotation() + rotate.delta))
            }
            _ => None,
        }
    }

    /// Delta held by a live group rotation.
    pub fn rotation_delta(&self) -> Option<f64> {
        match &self.state {
            InteractionState::RotatingGroup(rotate) => Some(rotate.delta),
            _ => None,
        }
    }

    pub fn marquee_rect(&self) -> Option<Bounds> {
        match &self.state {
            InteractionState::Marquee(marquee) => Some(marquee.rect()),
            _ => None,
        }
    }

    pub fn drawing_preview(&self) -> Option<CanvasElement> {
        match &self.state {
            InteractionState::Drawing(drawing) => {
                let mut element = drawing.preview()?;
                *element.style_mut() = self.style.clone();
                Some(element)
            }
            _ => None,
        }
    }

    /// Anchor the endpoint being drawn would bind to on release.
    pub fn binding_candidate(&self) -> Option<AnchorHit> {
        match &self.state {
            InteractionState::Drawing(drawing) => drawing.candidate(),
            _ => None,
        }
    }
}

/// Per-axis floor for resizing `entity`. Lines may collapse to zero on an axis.
fn resize_floor(store: &BoardStore, entity: EntityRef) -> Size {
    match entity.kind {
        EntityKind::Element if store.element(entity.id).is_some_and(CanvasElement::is_linear) => Size::ZERO,
        _ => store.min_size_for(entity),
    }
}
