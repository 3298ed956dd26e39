//! Viewport and canvas settings.
//!
//! Viewport changes are view state and never reach history. Background and
//! grid settings are document state and are recorded.

use super::BoardStore;
use crate::document::{Background, CanvasSettings, Viewport};
use crate::error::EngineResult;
use crate::events::ChangeEvent;
use crate::snap::GridSnap;
use kurbo::{Point, Size, Vec2};

impl BoardStore {
    pub fn viewport(&self) -> Viewport {
        self.board().map(|b| b.viewport).unwrap_or_default()
    }

    /// Replace the viewport. The zoom is clamped to the configured range.
    pub fn set_viewport(&mut self, viewport: Viewport) -> EngineResult<()> {
        let zoom = viewport.zoom.clamp(self.config.min_zoom, self.config.max_zoom);
        self.board_mut()?.viewport = Viewport { zoom, ..viewport };
        self.notify(ChangeEvent::ViewportChanged);
        Ok(())
    }

    /// Pan by a delta in screen pixels.
    pub fn pan_by(&mut self, delta: Vec2) -> EngineResult<()> {
        self.board_mut()?.viewport.pan(delta);
        self.notify(ChangeEvent::ViewportChanged);
        Ok(())
    }

    /// Zoom by `factor` about a screen point. False when already at the limit.
    pub fn zoom_at(&mut self, screen_point: Point, factor: f64) -> EngineResult<bool> {
        let (min, max) = (self.config.min_zoom, self.config.max_zoom);
        let changed = self.board_mut()?.viewport.zoom_at(screen_point, factor, min, max);
        if changed {
            self.notify(ChangeEvent::ViewportChanged);
        }
        Ok(changed)
    }

    pub fn reset_viewport(&mut self) -> EngineResult<()> {
        self.set_viewport(Viewport::default())
    }

    pub fn screen_to_canvas(&self, screen_point: Point) -> Point {
        self.viewport().screen_to_canvas(screen_point)
    }

    pub fn canvas_to_screen(&self, canvas_point: Point) -> Point {
        self.viewport().canvas_to_screen(canvas_point)
    }

    /// Frame all content in a view of `view_size`. False on an empty board.
    pub fn fit_to_content(&mut self, view_size: Size, padding: f64) -> EngineResult<bool> {
        let (min, max) = (self.config.min_zoom, self.config.max_zoom);
        let board = self.board_mut()?;
        let Some(content) = board.content_bounds() else {
            return Ok(false);
        };
        board.viewport.fit_to_bounds(content, view_size, padding, min, max);
        self.notify(ChangeEvent::ViewportChanged);
        Ok(true)
    }

    // --- Canvas settings ---

    pub fn set_background(&mut self, background: Background) -> EngineResult<bool> {
        if self.board_ref()?.background == background {
            return Ok(false);
        }
        self.record("Change background")?;
        self.board_mut()?.background = background;
        self.touch();
        self.notify(ChangeEvent::SettingsChanged);
        Ok(true)
    }

    pub fn set_snap_to_grid(&mut self, enabled: bool) -> EngineResult<bool> {
        self.edit_settings(if enabled { "Enable snap" } else { "Disable snap" }, |s| s.snap_to_grid = enabled)
    }

    pub fn set_show_grid(&mut self, visible: bool) -> EngineResult<bool> {
        self.edit_settings(if visible { "Show grid" } else { "Hide grid" }, |s| s.show_grid = visible)
    }

    /// The document's grid snap, or a disabled default before a document exists.
    pub fn grid_snap(&self) -> GridSnap {
        self.board()
            .map(|b| b.canvas_settings.grid())
            .unwrap_or_else(|| GridSnap::new(false, self.config.grid_spacing))
    }

    /// Recorded like the background. False when nothing changed.
    fn edit_settings(&mut self, label: &str, edit: impl FnOnce(&mut CanvasSettings)) -> EngineResult<bool> {
        let mut settings = self.board_ref()?.canvas_settings.clone();
        edit(&mut settings);
        if settings == self.board_ref()?.canvas_settings {
            return Ok(false);
        }
        self.record(label)?;
        self.board_mut()?.canvas_settings = settings;
        self.touch();
        self.notify(ChangeEvent::SettingsChanged);
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::BackgroundPattern;
    use crate::elements::CanvasElement;
    use crate::geometry::Bounds;

    fn store() -> BoardStore {
        let mut store = BoardStore::with_defaults();
        store.create_document("View");
        store
    }

    #[test]
    fn test_zoom_keeps_point_fixed_and_clamps() {
        let mut store = store();
        let anchor = Point::new(200.0, 150.0);
        let before = store.screen_to_canvas(anchor);
        assert!(store.zoom_at(anchor, 2.0).unwrap());
        let after = store.screen_to_canvas(anchor);
        assert!((before - after).hypot() < 1e-9);
        assert!(store.zoom_at(anchor, 100.0).unwrap());
        assert_eq!(store.viewport().zoom, store.config().max_zoom);
        assert!(!store.zoom_at(anchor, 2.0).unwrap());
    }

    #[test]
    fn test_viewport_changes_skip_history() {
        let mut store = store();
        store.pan_by(Vec2::new(40.0, -10.0)).unwrap();
        store.zoom_at(Point::ZERO, 1.5).unwrap();
        assert!(store.history().is_empty());
    }

    #[test]
    fn test_undo_keeps_current_view() {
        let mut store = store();
        store.add_element(CanvasElement::rectangle(Bounds::new(0.0, 0.0, 20.0, 20.0))).unwrap();
        store.pan_by(Vec2::new(100.0, 0.0)).unwrap();
        store.undo().unwrap();
        assert_eq!(store.viewport().x, 100.0);
    }

    #[test]
    fn test_fit_to_content() {
        let mut store = store();
        assert!(!store.fit_to_content(Size::new(800.0, 600.0), 0.0).unwrap());
        store.add_element(CanvasElement::rectangle(Bounds::new(0.0, 0.0, 400.0, 300.0))).unwrap();
        assert!(store.fit_to_content(Size::new(800.0, 600.0), 0.0).unwrap());
        let view = store.viewport();
        assert!((view.zoom - 2.0).abs() < 1e-9);
        let center = store.canvas_to_screen(Point::new(200.0, 150.0));
        assert!((center - Point::new(400.0, 300.0)).hypot() < 1e-9);
    }

    #[test]
    fn test_background_is_recorded() {
        let mut store = store();
        let mut background = Background::default();
        background.pattern = BackgroundPattern::Grid;
        assert!(store.set_background(background.clone()).unwrap());
        assert!(!store.set_background(background).unwrap());
        assert_eq!(store.history().len(), 1);
    }

    #[test]
    fn test_grid_toggles_are_recorded() {
        let mut store = store();
        assert!(store.set_snap_to_grid(true).unwrap());
        assert!(!store.set_snap_to_grid(true).unwrap());
        assert!(store.set_show_grid(false).unwrap());
        assert_eq!(store.history().len(), 2);
        assert!(store.grid_snap().enabled);

        store.undo().unwrap();
        assert!(store.board().unwrap().canvas_settings.show_grid);
        assert!(store.grid_snap().enabled);
        store.undo().unwrap();
        assert!(!store.grid_snap().enabled);
        store.redo().unwrap();
        assert!(store.grid_snap().enabled);
    }
}
