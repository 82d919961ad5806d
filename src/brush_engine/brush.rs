use crate::canvas::buffer::PixelBuffer;
use crate::canvas::document::{BACKGROUND, Document, FOREGROUND};
use crate::utils::vector::Vec2;

/// Whether the brush paints mask foreground or erases back to background.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BrushMode {
    Draw,
    Erase,
}

/// Freehand mask brush: hard-edged filled circles of a given radius.
#[derive(Clone, Debug)]
pub struct Brush {
    pub radius: f32,
    pub mode: BrushMode,
}

impl Brush {
    pub fn new(radius: f32, mode: BrushMode) -> Self {
        Self { radius, mode }
    }

    /// Toggle between painting foreground and background.
    pub fn switch_mode(&mut self) {
        self.mode = match self.mode {
            BrushMode::Draw => BrushMode::Erase,
            BrushMode::Erase => BrushMode::Draw,
        };
    }

    /// Grow or shrink the radius, never below 1.
    pub fn change_radius(&mut self, delta: f32) {
        if self.radius + delta >= 1.0 {
            self.radius += delta;
        }
    }

    /// Stamp one circle into the mask at `center`. Draw-mode stamps are
    /// mirrored into the preview layer at the display color for immediate
    /// feedback; erase-mode stamps are not (the preview is rebuilt wholesale
    /// when the stroke ends).
    pub fn stamp(&self, doc: &mut Document, center: Vec2) {
        if doc.is_empty() {
            return;
        }
        let color = match self.mode {
            BrushMode::Draw => FOREGROUND,
            BrushMode::Erase => BACKGROUND,
        };
        stamp_circle(&mut doc.mask, center, self.radius, color);
        if self.mode == BrushMode::Draw {
            let tint = doc.display_color();
            stamp_circle(
                &mut doc.preview,
                center,
                self.radius,
                [tint.r, tint.g, tint.b, 255],
            );
        }
    }
}

impl Default for Brush {
    fn default() -> Self {
        Self::new(5.0, BrushMode::Draw)
    }
}

/// Rasterize a hard-edged filled circle: a pixel is covered when its center
/// lies within the radius. No anti-aliasing, matching the mask's two-level
/// semantics.
pub fn stamp_circle(buf: &mut PixelBuffer, center: Vec2, radius: f32, color: [u8; 4]) {
    let r_sq = radius * radius;
    let r_ceil = radius.ceil() as i32;

    let min_x = (center.x.floor() as i32) - r_ceil;
    let max_x = (center.x.floor() as i32) + r_ceil;
    let min_y = (center.y.floor() as i32) - r_ceil;
    let max_y = (center.y.floor() as i32) + r_ceil;

    let w = buf.width() as i32;
    let h = buf.height() as i32;
    if max_x < 0 || max_y < 0 || min_x >= w || min_y >= h {
        return;
    }

    let start_x = min_x.max(0) as usize;
    let start_y = min_y.max(0) as usize;
    let end_x = max_x.min(w - 1) as usize;
    let end_y = max_y.min(h - 1) as usize;

    for gy in start_y..=end_y {
        let dy = gy as f32 + 0.5 - center.y;
        for gx in start_x..=end_x {
            let dx = gx as f32 + 0.5 - center.x;
            if dx * dx + dy * dy <= r_sq {
                buf.set(gx, gy, color);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::buffer::PixelBuffer;

    const INK: [u8; 4] = [255, 255, 255, 255];

    #[test]
    fn stamp_covers_center_and_respects_radius() {
        let mut buf = PixelBuffer::new(20, 20);
        stamp_circle(&mut buf, Vec2::new(10.0, 10.0), 3.0, INK);
        assert_eq!(buf.get(10, 10), INK);
        assert_eq!(buf.get(12, 10), INK);
        // Pixel centers farther than the radius stay untouched.
        assert_eq!(buf.get(14, 10), [0, 0, 0, 0]);
        assert_eq!(buf.get(13, 13), [0, 0, 0, 0]);
    }

    #[test]
    fn stamp_is_clamped_at_the_border() {
        let mut buf = PixelBuffer::new(8, 8);
        stamp_circle(&mut buf, Vec2::new(0.0, 0.0), 4.0, INK);
        assert_eq!(buf.get(0, 0), INK);
        // Nothing panics and far pixels are untouched.
        assert_eq!(buf.get(7, 7), [0, 0, 0, 0]);
    }

    #[test]
    fn stamp_fully_outside_is_noop() {
        let mut buf = PixelBuffer::new(8, 8);
        let before = buf.clone();
        stamp_circle(&mut buf, Vec2::new(-100.0, -100.0), 4.0, INK);
        assert_eq!(buf, before);
    }

    #[test]
    fn radius_never_drops_below_one() {
        let mut brush = Brush::new(2.0, BrushMode::Draw);
        brush.change_radius(-2.0);
        assert_eq!(brush.radius, 2.0);
        brush.change_radius(-1.0);
        assert_eq!(brush.radius, 1.0);
    }

    #[test]
    fn draw_stamps_mirror_into_preview_but_erase_does_not() {
        let mut doc = Document::new();
        let img = image::RgbaImage::new(16, 16);
        doc.load_image(&img);

        let brush = Brush::new(2.0, BrushMode::Draw);
        brush.stamp(&mut doc, Vec2::new(8.0, 8.0));
        assert_eq!(doc.mask.get(8, 8), FOREGROUND);
        assert_eq!(doc.preview.get(8, 8)[3], 255);

        let eraser = Brush::new(2.0, BrushMode::Erase);
        eraser.stamp(&mut doc, Vec2::new(8.0, 8.0));
        assert_eq!(doc.mask.get(8, 8), BACKGROUND);
        // Preview keeps the stale tint until the stroke-end refresh.
        assert_eq!(doc.preview.get(8, 8)[3], 255);
    }
}
