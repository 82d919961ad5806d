//! Magic-pen crop pipeline: collect fixed-size image crops along a stroke,
//! batch them to the external predictor, and merge the returned mask.
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::brush_engine::brush::stamp_circle;
use crate::canvas::document::Document;
use crate::net::codec;
use crate::utils::vector::Vec2;

pub const DEFAULT_CROP_SIZE: usize = 200;
pub const MIN_CROP_SIZE: usize = 128;
pub const MAX_CROP_SIZE: usize = 512;

/// Translucent magenta for the transient stroke overlay.
pub const OVERLAY_COLOR: [u8; 4] = [255, 0, 255, 160];

/// One square tile of the source image captured along a magic-pen stroke.
/// Field names are the wire format of the prediction service.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Crop {
    pub id: usize,
    pub image_base64: String,
    #[serde(rename = "centerX")]
    pub center_x: i32,
    #[serde(rename = "centerY")]
    pub center_y: i32,
    pub width: u32,
    pub height: u32,
    pub canvas_width: u32,
    pub canvas_height: u32,
    pub timestamp: u64,
    pub line_distance: f32,
}

/// Tuning knobs forwarded verbatim to the predictor; not interpreted locally.
#[derive(Clone, Debug, PartialEq)]
pub struct PredictParams {
    pub mode: String,
    pub apply_morphology: bool,
    pub morph_kernel_size: u32,
    pub morph_iterations: u32,
    pub apply_dbscan: bool,
    pub db_eps: u32,
    pub db_min_samples: u32,
    pub sensitivity: u32,
}

impl Default for PredictParams {
    fn default() -> Self {
        Self {
            mode: "normal".to_string(),
            apply_morphology: true,
            morph_kernel_size: 3,
            morph_iterations: 2,
            apply_dbscan: true,
            db_eps: 10,
            db_min_samples: 5,
            sensitivity: 2,
        }
    }
}

/// Pipeline phase for the current magic-pen stroke.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PenState {
    Idle,
    Collecting,
    Predicting,
}

/// Everything one prediction round-trip needs, handed to the worker thread.
pub struct PredictionJob {
    pub crops: Vec<Crop>,
    pub params: PredictParams,
    pub generation: u64,
}

/// The magic pen: crops the image at regular path-length intervals while the
/// stroke is drawn and hands the batch off for prediction on stroke end.
pub struct MagicPen {
    state: PenState,
    crop_size: usize,
    crops: Vec<Crop>,
    pub params: PredictParams,
    generation: u64,
}

impl MagicPen {
    pub fn new() -> Self {
        Self::with_crop_size(DEFAULT_CROP_SIZE)
    }

    pub fn with_crop_size(crop_size: usize) -> Self {
        Self {
            state: PenState::Idle,
            crop_size,
            crops: Vec::new(),
            params: PredictParams::default(),
            generation: 0,
        }
    }

    pub fn state(&self) -> PenState {
        self.state
    }

    /// Identifies the stroke a prediction response belongs to; bumped on
    /// every stroke start so stale responses can be told apart.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn crop_size(&self) -> usize {
        self.crop_size
    }

    pub fn crops_collected(&self) -> usize {
        self.crops.len()
    }

    /// Crops overlap by half their width along the path.
    pub fn crop_interval(&self) -> f32 {
        self.crop_size as f32 / 2.0
    }

    /// The pen draws at half the crop size so the stroke visually covers
    /// the band that will be cropped.
    pub fn radius(&self) -> f32 {
        self.crop_size as f32 / 2.0
    }

    /// Grow or shrink the crop size within [128, 512]; the interval and pen
    /// radius follow.
    pub fn change_crop_size(&mut self, delta: i32) {
        let next = self.crop_size as i32 + delta;
        if next < MIN_CROP_SIZE as i32 || next > MAX_CROP_SIZE as i32 {
            return;
        }
        self.crop_size = next as usize;
    }

    /// Set the crop size directly (slider input), clamped to [128, 512].
    pub fn set_crop_size(&mut self, size: usize) {
        self.crop_size = size.clamp(MIN_CROP_SIZE, MAX_CROP_SIZE);
    }

    /// Start a new stroke: clear the overlay and any leftover crops, bump
    /// the generation.
    pub fn begin_stroke(&mut self, doc: &mut Document) {
        doc.overlay.clear();
        self.crops.clear();
        self.generation += 1;
        self.state = PenState::Collecting;
    }

    /// Called for every interpolated stroke point: draws the overlay stamp
    /// and emits a crop whenever the accumulated path length crosses the
    /// next interval threshold. Each threshold emits at most once.
    pub fn on_path_point(&mut self, doc: &mut Document, pos: Vec2, path_len: f32) {
        if self.state != PenState::Collecting || doc.is_empty() {
            return;
        }
        stamp_circle(&mut doc.overlay, pos, self.radius(), OVERLAY_COLOR);

        if path_len >= self.crop_interval() * self.crops.len() as f32 {
            let center = pos.floor();
            self.capture_crop(doc, center.x as i32, center.y as i32, path_len);
        }
    }

    fn capture_crop(&mut self, doc: &Document, center_x: i32, center_y: i32, path_len: f32) {
        let tile = doc.crop_image(center_x, center_y, self.crop_size);
        match codec::encode_png_data_url(&tile) {
            Ok(image_base64) => {
                let crop = Crop {
                    id: self.crops.len(),
                    image_base64,
                    center_x,
                    center_y,
                    width: self.crop_size as u32,
                    height: self.crop_size as u32,
                    canvas_width: doc.width() as u32,
                    canvas_height: doc.height() as u32,
                    timestamp: unix_millis(),
                    line_distance: path_len,
                };
                log::debug!(
                    "crop {} captured at ({center_x}, {center_y}) after {path_len:.1} px",
                    crop.id
                );
                self.crops.push(crop);
            }
            Err(err) => log::error!("failed to encode crop: {err}"),
        }
    }

    /// Finish the stroke. With crops collected, moves to `Predicting` and
    /// returns the job for the worker thread; with none, returns to `Idle`.
    pub fn end_stroke(&mut self) -> Option<PredictionJob> {
        if self.state != PenState::Collecting {
            return None;
        }
        if self.crops.is_empty() {
            self.state = PenState::Idle;
            return None;
        }
        self.state = PenState::Predicting;
        Some(PredictionJob {
            crops: std::mem::take(&mut self.crops),
            params: self.params.clone(),
            generation: self.generation,
        })
    }

    /// Round-trip finished (success or failure): clear the transient overlay
    /// and crop state and return to `Idle`.
    pub fn resolve(&mut self, doc: &mut Document) {
        doc.overlay.clear();
        self.crops.clear();
        self.state = PenState::Idle;
    }

    /// Invalidate any in-flight round-trip, e.g. when a new image loads; a
    /// response carrying the old generation will be discarded on receipt.
    pub fn abort(&mut self, doc: &mut Document) {
        self.generation += 1;
        self.resolve(doc);
    }
}

impl Default for MagicPen {
    fn default() -> Self {
        Self::new()
    }
}

fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::brush_engine::stroke::StrokeState;

    fn test_doc(w: u32, h: u32) -> Document {
        let mut doc = Document::new();
        doc.load_image(&image::RgbaImage::from_pixel(
            w,
            h,
            image::Rgba([90, 90, 90, 255]),
        ));
        doc
    }

    /// Drive a straight horizontal stroke of the given length in 1 px steps.
    fn run_stroke(pen: &mut MagicPen, doc: &mut Document, length: usize) {
        let mut stroke = StrokeState::new();
        pen.begin_stroke(doc);
        for i in 0..=length {
            let pos = Vec2::new(10.0 + i as f32, 10.0);
            stroke.add_point(1.0, pos, &mut |p, len| pen.on_path_point(doc, p, len));
        }
    }

    #[test]
    fn crop_cadence_matches_path_length() {
        let mut doc = test_doc(64, 64);
        let mut pen = MagicPen::with_crop_size(8); // interval 4
        run_stroke(&mut pen, &mut doc, 18);
        // floor(18 / 4) + 1 crops for a stroke of length 18.
        assert_eq!(pen.crops_collected(), 5);
        let distances: Vec<f32> = pen.crops.iter().map(|c| c.line_distance).collect();
        for pair in distances.windows(2) {
            assert!(pair[1] - pair[0] <= 4.0 + 1e-4);
        }
    }

    #[test]
    fn thresholds_fire_once() {
        let mut doc = test_doc(64, 64);
        let mut pen = MagicPen::with_crop_size(8);
        let mut stroke = StrokeState::new();
        pen.begin_stroke(&mut doc);
        // Repeated samples at one position never re-cross a threshold.
        for _ in 0..10 {
            stroke.add_point(1.0, Vec2::new(5.0, 5.0), &mut |p, len| {
                pen.on_path_point(&mut doc, p, len)
            });
        }
        assert_eq!(pen.crops_collected(), 1);
    }

    #[test]
    fn stroke_without_crops_returns_to_idle() {
        let mut doc = test_doc(16, 16);
        let mut pen = MagicPen::with_crop_size(8);
        pen.begin_stroke(&mut doc);
        assert_eq!(pen.state(), PenState::Collecting);
        assert!(pen.end_stroke().is_none());
        assert_eq!(pen.state(), PenState::Idle);
    }

    #[test]
    fn stroke_with_crops_moves_to_predicting() {
        let mut doc = test_doc(64, 64);
        let mut pen = MagicPen::with_crop_size(8);
        run_stroke(&mut pen, &mut doc, 10);
        let job = pen.end_stroke().expect("crops were collected");
        assert_eq!(pen.state(), PenState::Predicting);
        assert_eq!(job.generation, pen.generation());
        assert!(!job.crops.is_empty());

        pen.resolve(&mut doc);
        assert_eq!(pen.state(), PenState::Idle);
        assert_eq!(pen.crops_collected(), 0);
    }

    #[test]
    fn new_stroke_bumps_generation_and_clears_overlay() {
        let mut doc = test_doc(64, 64);
        let mut pen = MagicPen::with_crop_size(8);
        run_stroke(&mut pen, &mut doc, 10);
        let first_gen = pen.generation();
        assert!(doc.overlay.data().iter().any(|&b| b != 0));

        pen.begin_stroke(&mut doc);
        assert_eq!(pen.generation(), first_gen + 1);
        assert!(doc.overlay.data().iter().all(|&b| b == 0));
        assert_eq!(pen.crops_collected(), 0);
    }

    #[test]
    fn crop_size_clamped_to_range() {
        let mut pen = MagicPen::new();
        assert_eq!(pen.crop_size(), DEFAULT_CROP_SIZE);
        for _ in 0..100 {
            pen.change_crop_size(8);
        }
        assert!(pen.crop_size() <= MAX_CROP_SIZE);
        for _ in 0..100 {
            pen.change_crop_size(-8);
        }
        assert!(pen.crop_size() >= MIN_CROP_SIZE);
        // Interval and radius follow the crop size.
        assert_eq!(pen.crop_interval(), pen.crop_size() as f32 / 2.0);
        assert_eq!(pen.radius(), pen.crop_size() as f32 / 2.0);
    }
}
