use image::RgbaImage;
use image::imageops::{self, FilterType};
use rayon::iter::{IndexedParallelIterator, ParallelIterator};
use rayon::slice::{ParallelSlice, ParallelSliceMut};

use crate::canvas::buffer::PixelBuffer;
use crate::utils::color::Rgb8;
use crate::utils::profiler::ScopeTimer;

/// Mask foreground: opaque white.
pub const FOREGROUND: [u8; 4] = [255, 255, 255, 255];
/// Mask background: opaque black.
pub const BACKGROUND: [u8; 4] = [0, 0, 0, 255];

/// Channel threshold above which a returned prediction pixel counts as white.
const MERGE_WHITE_THRESHOLD: u8 = 200;

/// The open document: the source image plus the mask and its two derived
/// overlay layers. All four buffers always share dimensions and are
/// reallocated together when a new image loads.
pub struct Document {
    pub image: PixelBuffer,
    pub mask: PixelBuffer,
    pub preview: PixelBuffer,
    pub overlay: PixelBuffer,
    display_color: Rgb8,
}

impl Document {
    /// An empty document; every mutating operation no-ops until an image
    /// is loaded.
    pub fn new() -> Self {
        Self {
            image: PixelBuffer::new(0, 0),
            mask: PixelBuffer::new(0, 0),
            preview: PixelBuffer::new(0, 0),
            overlay: PixelBuffer::new(0, 0),
            display_color: Rgb8::red(),
        }
    }

    pub fn width(&self) -> usize {
        self.image.width()
    }

    pub fn height(&self) -> usize {
        self.image.height()
    }

    pub fn is_empty(&self) -> bool {
        self.image.is_empty()
    }

    pub fn display_color(&self) -> Rgb8 {
        self.display_color
    }

    /// Change the preview tint and recolor the whole preview layer.
    pub fn set_display_color(&mut self, color: Rgb8) {
        self.display_color = color;
        self.refresh_preview();
    }

    /// Load a new source image, reallocating all layers to its dimensions.
    /// The mask starts as all-background; overlay and preview start clear.
    pub fn load_image(&mut self, img: &RgbaImage) {
        let (w, h) = (img.width() as usize, img.height() as usize);
        self.image = PixelBuffer::from_raw(w, h, img.as_raw().clone())
            .expect("RgbaImage raw length matches its dimensions");
        self.mask = PixelBuffer::new_filled(w, h, BACKGROUND);
        self.preview = PixelBuffer::new(w, h);
        self.overlay = PixelBuffer::new(w, h);
    }

    /// Load a stored mask, scaling it to the document dimensions if needed,
    /// then binarize so anti-aliased resampling cannot leave gray behind.
    pub fn load_mask(&mut self, mask: &RgbaImage) {
        if self.is_empty() {
            return;
        }
        let (w, h) = (self.width() as u32, self.height() as u32);
        let scaled;
        let mask = if mask.width() != w || mask.height() != h {
            scaled = imageops::resize(mask, w, h, FilterType::Nearest);
            &scaled
        } else {
            mask
        };
        self.mask = PixelBuffer::from_raw(w as usize, h as usize, mask.as_raw().clone())
            .expect("RgbaImage raw length matches its dimensions");
        self.remove_gray();
    }

    /// Clear the mask back to all-background.
    pub fn reset_mask(&mut self) {
        if self.is_empty() {
            return;
        }
        self.mask.fill(BACKGROUND);
        self.refresh_preview();
    }

    /// Collapse anti-aliased edges into a strict two-level mask: pixels whose
    /// RGB mean exceeds 127 become foreground, everything else background.
    /// Idempotent; refreshes the preview.
    pub fn remove_gray(&mut self) {
        if self.is_empty() {
            return;
        }
        let _timer = ScopeTimer::new("remove_gray");
        let row_bytes = self.mask.width() * 4;
        self.mask
            .data_mut()
            .par_chunks_mut(row_bytes)
            .for_each(|row| {
                for px in row.chunks_exact_mut(4) {
                    let mean = (px[0] as u16 + px[1] as u16 + px[2] as u16) / 3;
                    let v = if mean > 127 { 255 } else { 0 };
                    px[0] = v;
                    px[1] = v;
                    px[2] = v;
                    px[3] = 255;
                }
            });
        self.refresh_preview();
    }

    /// Recompute the whole preview layer from the mask: foreground pixels
    /// take the display color at full opacity, everything else is
    /// transparent. The red channel is the binary proxy (R=G=B once
    /// binarized).
    pub fn refresh_preview(&mut self) {
        if self.is_empty() {
            return;
        }
        let tint = [
            self.display_color.r,
            self.display_color.g,
            self.display_color.b,
            255,
        ];
        let row_bytes = self.mask.width() * 4;
        self.preview
            .data_mut()
            .par_chunks_mut(row_bytes)
            .zip(self.mask.data().par_chunks(row_bytes))
            .for_each(|(out_row, mask_row)| {
                for (out, px) in out_row
                    .chunks_exact_mut(4)
                    .zip(mask_row.chunks_exact(4))
                {
                    if px[0] > 127 {
                        out.copy_from_slice(&tint);
                    } else {
                        out.copy_from_slice(&[0, 0, 0, 0]);
                    }
                }
            });
    }

    /// Extract a square region of the source image centered at
    /// (`center_x`, `center_y`). Portions falling outside the image are
    /// black-padded, with the in-bounds part centered in the output.
    pub fn crop_image(&self, center_x: i32, center_y: i32, size: usize) -> PixelBuffer {
        let mut out = PixelBuffer::new_filled(size, size, BACKGROUND);
        if self.is_empty() || size == 0 {
            return out;
        }

        let w = self.width() as i32;
        let h = self.height() as i32;
        let start_x = center_x - (size as i32) / 2;
        let start_y = center_y - (size as i32) / 2;

        let clamped_x0 = start_x.max(0);
        let clamped_y0 = start_y.max(0);
        let clamped_x1 = (start_x + size as i32).min(w);
        let clamped_y1 = (start_y + size as i32).min(h);
        if clamped_x0 >= clamped_x1 || clamped_y0 >= clamped_y1 {
            return out;
        }

        let actual_w = (clamped_x1 - clamped_x0) as usize;
        let actual_h = (clamped_y1 - clamped_y0) as usize;
        // Center the in-bounds region in the padded output.
        let offset_x = (size - actual_w) / 2;
        let offset_y = (size - actual_h) / 2;

        for row in 0..actual_h {
            let src = self
                .image
                .offset(clamped_x0 as usize, clamped_y0 as usize + row);
            let dst = out.offset(offset_x, offset_y + row);
            let bytes = actual_w * 4;
            out.data_mut()[dst..dst + bytes]
                .copy_from_slice(&self.image.data()[src..src + bytes]);
        }
        out
    }

    /// Union-merge a returned prediction raster into the mask: wherever the
    /// prediction is white (all channels > 200), force the mask pixel to
    /// foreground; all other mask pixels are left untouched. Predictions can
    /// only add foreground, never remove it. Binarizes and refreshes the
    /// preview afterwards.
    pub fn merge_prediction(&mut self, prediction: &PixelBuffer) {
        if self.is_empty() {
            return;
        }
        if prediction.width() != self.width() || prediction.height() != self.height() {
            log::warn!(
                "prediction raster is {}x{}, expected {}x{}; merge skipped",
                prediction.width(),
                prediction.height(),
                self.width(),
                self.height()
            );
            return;
        }
        let _timer = ScopeTimer::new("merge_prediction");
        for (mask_px, pred_px) in self
            .mask
            .data_mut()
            .chunks_exact_mut(4)
            .zip(prediction.data().chunks_exact(4))
        {
            let is_white = pred_px[0] > MERGE_WHITE_THRESHOLD
                && pred_px[1] > MERGE_WHITE_THRESHOLD
                && pred_px[2] > MERGE_WHITE_THRESHOLD;
            if is_white {
                mask_px.copy_from_slice(&FOREGROUND);
            }
        }
        self.remove_gray();
    }

    /// Encode the current mask as PNG bytes for persistence.
    pub fn mask_png(&self) -> Result<Vec<u8>, image::ImageError> {
        let img = RgbaImage::from_raw(
            self.width() as u32,
            self.height() as u32,
            self.mask.data().to_vec(),
        )
        .expect("mask buffer length matches its dimensions");
        let mut bytes = std::io::Cursor::new(Vec::new());
        img.write_to(&mut bytes, image::ImageFormat::Png)?;
        Ok(bytes.into_inner())
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc_with_image(w: u32, h: u32) -> Document {
        let mut doc = Document::new();
        let img = RgbaImage::from_fn(w, h, |x, y| {
            image::Rgba([(x * 10) as u8, (y * 10) as u8, 7, 255])
        });
        doc.load_image(&img);
        doc
    }

    #[test]
    fn load_image_sizes_all_layers_together() {
        let doc = doc_with_image(6, 4);
        for buf in [&doc.image, &doc.mask, &doc.preview, &doc.overlay] {
            assert_eq!((buf.width(), buf.height()), (6, 4));
        }
        assert_eq!(doc.mask.get(0, 0), BACKGROUND);
    }

    #[test]
    fn remove_gray_thresholds_on_rgb_mean() {
        let mut doc = doc_with_image(2, 1);
        doc.mask.set(0, 0, [127, 127, 129, 200]); // mean 127 -> background
        doc.mask.set(1, 0, [128, 128, 128, 200]); // mean 128 -> foreground
        doc.remove_gray();
        assert_eq!(doc.mask.get(0, 0), BACKGROUND);
        assert_eq!(doc.mask.get(1, 0), FOREGROUND);
    }

    #[test]
    fn remove_gray_is_idempotent() {
        let mut doc = doc_with_image(4, 4);
        doc.mask.set(1, 1, [200, 90, 130, 255]);
        doc.mask.set(2, 3, [40, 40, 40, 255]);
        doc.remove_gray();
        let once = doc.mask.clone();
        doc.remove_gray();
        assert_eq!(doc.mask, once);
    }

    #[test]
    fn preview_recolors_foreground_only() {
        let mut doc = doc_with_image(2, 2);
        doc.set_display_color(Rgb8::new(0, 200, 50));
        doc.mask.set(1, 0, FOREGROUND);
        doc.refresh_preview();
        assert_eq!(doc.preview.get(1, 0), [0, 200, 50, 255]);
        assert_eq!(doc.preview.get(0, 0), [0, 0, 0, 0]);
    }

    #[test]
    fn crop_inside_bounds_copies_image() {
        let doc = doc_with_image(10, 10);
        let crop = doc.crop_image(5, 5, 4);
        assert_eq!((crop.width(), crop.height()), (4, 4));
        // Top-left of the crop is image pixel (3, 3).
        assert_eq!(crop.get(0, 0), doc.image.get(3, 3));
    }

    #[test]
    fn crop_near_edge_is_black_padded_and_centered() {
        let doc = doc_with_image(10, 10);
        let crop = doc.crop_image(0, 0, 6);
        // Visible part is 3x3 (pixels 0..3), centered with offset 1.
        assert_eq!(crop.get(0, 0), BACKGROUND);
        assert_eq!(crop.get(1, 1), doc.image.get(0, 0));
        assert_eq!(crop.get(3, 3), doc.image.get(2, 2));
        assert_eq!(crop.get(5, 5), BACKGROUND);
    }

    #[test]
    fn crop_fully_outside_is_all_black() {
        let doc = doc_with_image(10, 10);
        let crop = doc.crop_image(-50, -50, 4);
        assert_eq!(crop, PixelBuffer::new_filled(4, 4, BACKGROUND));
    }

    #[test]
    fn merge_is_union_only() {
        let mut doc = doc_with_image(3, 1);
        doc.mask.set(0, 0, FOREGROUND);

        let mut prediction = PixelBuffer::new_filled(3, 1, BACKGROUND);
        prediction.set(1, 0, [255, 255, 255, 255]);
        prediction.set(2, 0, [150, 255, 255, 255]); // not white enough

        doc.merge_prediction(&prediction);
        // Pre-existing foreground survives even though the prediction is
        // black there; only genuinely white pixels are added.
        assert_eq!(doc.mask.get(0, 0), FOREGROUND);
        assert_eq!(doc.mask.get(1, 0), FOREGROUND);
        assert_eq!(doc.mask.get(2, 0), BACKGROUND);
    }

    #[test]
    fn operations_on_empty_document_are_noops() {
        let mut doc = Document::new();
        doc.reset_mask();
        doc.remove_gray();
        doc.refresh_preview();
        let crop = doc.crop_image(10, 10, 8);
        assert_eq!(crop, PixelBuffer::new_filled(8, 8, BACKGROUND));
    }
}
