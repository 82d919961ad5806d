use crate::utils::vector::Vec2;

pub const MIN_ZOOM: f32 = 0.2;
pub const MAX_ZOOM: f32 = 5.0;
pub const ZOOM_STEP: f32 = 0.1;

/// Zoom/pan state of the viewport. All brush, fill and crop math operates in
/// canvas-pixel space; this only affects how the canvas is displayed and how
/// pointer positions are converted on the way in.
pub struct ViewState {
    zoom: f32,
    /// Screen-point offset of the canvas origin inside the viewport widget.
    pub offset: Vec2,
}

impl ViewState {
    pub fn new() -> Self {
        Self {
            zoom: 1.0,
            offset: Vec2::new(40.0, 20.0),
        }
    }

    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    /// Displayed size of a canvas with the given pixel dimensions.
    pub fn displayed_size(&self, width: usize, height: usize) -> Vec2 {
        Vec2::new(width as f32 * self.zoom, height as f32 * self.zoom)
    }

    pub fn zoom_in(&mut self, viewport_center: Vec2) {
        self.set_zoom(self.zoom + ZOOM_STEP, viewport_center);
    }

    pub fn zoom_out(&mut self, viewport_center: Vec2) {
        self.set_zoom(self.zoom - ZOOM_STEP, viewport_center);
    }

    /// Change the zoom level, keeping the canvas point currently under
    /// `viewport_center` (in the same coordinate space as `offset`) fixed on
    /// screen, so zooming is optically anchored at the viewport center.
    pub fn set_zoom(&mut self, level: f32, viewport_center: Vec2) {
        let level = level.clamp(MIN_ZOOM, MAX_ZOOM);
        let anchor = (viewport_center - self.offset) / self.zoom;
        self.zoom = level;
        self.offset = viewport_center - anchor * self.zoom;
    }

    /// Scroll the viewport by a screen-space delta (middle-button drag).
    pub fn pan(&mut self, delta: Vec2) {
        self.offset = self.offset + delta;
    }
}

impl Default for ViewState {
    fn default() -> Self {
        Self::new()
    }
}
