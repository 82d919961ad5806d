use eframe::egui::Color32;

/// Opaque 8-bit RGB color used for the mask display tint.
///
/// The mask itself only ever stores pure black/white; this type carries the
/// user-chosen preview color. No color round-trips through strings.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rgb8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb8 {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub const fn white() -> Self {
        Self::new(255, 255, 255)
    }

    pub const fn black() -> Self {
        Self::new(0, 0, 0)
    }

    /// Default preview tint.
    pub const fn red() -> Self {
        Self::new(255, 0, 0)
    }

    /// Convert to egui's color type for picker widgets.
    pub fn to_color32(self) -> Color32 {
        Color32::from_rgb(self.r, self.g, self.b)
    }

    pub fn from_color32(c: Color32) -> Self {
        Self::new(c.r(), c.g(), c.b())
    }
}
