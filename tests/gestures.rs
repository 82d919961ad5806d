//! Gesture-level flows: stroke → binarize, fill, history round-trips, and
//! the prediction merge, driven through the public API the way the editor
//! drives them.
use maskpen::brush_engine::brush::{Brush, BrushMode};
use maskpen::brush_engine::stroke::StrokeState;
use maskpen::canvas::buffer::PixelBuffer;
use maskpen::canvas::document::{BACKGROUND, Document, FOREGROUND};
use maskpen::canvas::fill::{DEFAULT_TOLERANCE, flood_fill};
use maskpen::canvas::history::History;
use maskpen::utils::vector::Vec2;

fn loaded_doc(w: u32, h: u32) -> Document {
    let mut doc = Document::new();
    doc.load_image(&image::RgbaImage::from_pixel(
        w,
        h,
        image::Rgba([120, 100, 80, 255]),
    ));
    doc
}

fn draw_segment(doc: &mut Document, brush: &Brush, from: (f32, f32), to: (f32, f32)) {
    let mut stroke = StrokeState::new();
    stroke.add_point(1.0, Vec2::new(from.0, from.1), &mut |p, _| {
        brush.stamp(doc, p)
    });
    stroke.add_point(1.0, Vec2::new(to.0, to.1), &mut |p, _| brush.stamp(doc, p));
    stroke.end();
}

#[test]
fn draw_stroke_binarizes_to_a_pure_two_level_mask() {
    let mut doc = loaded_doc(40, 40);
    let brush = Brush::new(3.0, BrushMode::Draw);
    draw_segment(&mut doc, &brush, (8.0, 20.0), (32.0, 20.0));
    doc.remove_gray();

    for y in 0..40 {
        for x in 0..40 {
            let px = doc.mask.get(x, y);
            assert!(
                px == FOREGROUND || px == BACKGROUND,
                "mixed pixel at ({x}, {y}): {px:?}"
            );
        }
    }
    // The stroke band is foreground, far corners are not.
    assert_eq!(doc.mask.get(20, 20), FOREGROUND);
    assert_eq!(doc.mask.get(2, 2), BACKGROUND);

    // Preview mirrors the mask: tinted where foreground, clear elsewhere.
    assert_eq!(doc.preview.get(20, 20)[3], 255);
    assert_eq!(doc.preview.get(2, 2)[3], 0);
}

#[test]
fn bucket_fill_stops_at_a_foreground_boundary() {
    let mut doc = loaded_doc(30, 30);
    // Closed foreground ring around (15, 15).
    for i in 5..25 {
        doc.mask.set(i, 5, FOREGROUND);
        doc.mask.set(i, 24, FOREGROUND);
        doc.mask.set(5, i, FOREGROUND);
        doc.mask.set(24, i, FOREGROUND);
    }
    // The near-maximal default tolerance still excludes the pure-white
    // boundary when seeded on pure black (diff 255 > 254).
    flood_fill(&mut doc.mask, 15, 15, FOREGROUND, DEFAULT_TOLERANCE);
    doc.remove_gray();

    assert_eq!(doc.mask.get(15, 15), FOREGROUND, "inside filled");
    assert_eq!(doc.mask.get(10, 5), FOREGROUND, "boundary kept");
    assert_eq!(doc.mask.get(2, 2), BACKGROUND, "outside untouched");
    assert_eq!(doc.mask.get(27, 15), BACKGROUND, "outside untouched");
}

#[test]
fn gesture_sequence_round_trips_through_history() {
    let mut doc = loaded_doc(24, 24);
    let mut history = History::new();
    let initial = doc.mask.clone();

    // Gesture 1: a draw stroke.
    history.store_state(&doc.mask);
    let brush = Brush::new(2.0, BrushMode::Draw);
    draw_segment(&mut doc, &brush, (4.0, 4.0), (20.0, 4.0));
    doc.remove_gray();

    // Gesture 2: a bucket fill.
    history.store_state(&doc.mask);
    flood_fill(&mut doc.mask, 12, 18, FOREGROUND, DEFAULT_TOLERANCE);
    doc.remove_gray();
    let after_both = doc.mask.clone();

    assert!(history.undo(&mut doc.mask));
    assert!(history.undo(&mut doc.mask));
    assert_eq!(doc.mask, initial, "two undos revert two whole gestures");

    assert!(history.redo(&mut doc.mask));
    assert!(history.redo(&mut doc.mask));
    assert_eq!(doc.mask, after_both, "redos restore byte-for-byte");
}

#[test]
fn prediction_merge_is_one_undoable_union_gesture() {
    let mut doc = loaded_doc(16, 16);
    let mut history = History::new();
    doc.mask.set(3, 3, FOREGROUND);
    let before = doc.mask.clone();

    let mut prediction = PixelBuffer::new_filled(16, 16, BACKGROUND);
    for x in 6..10 {
        for y in 6..10 {
            prediction.set(x, y, [255, 255, 255, 255]);
        }
    }

    history.store_state(&doc.mask);
    doc.merge_prediction(&prediction);

    // Union semantics: old foreground survives, the predicted block is added.
    assert_eq!(doc.mask.get(3, 3), FOREGROUND);
    assert_eq!(doc.mask.get(7, 7), FOREGROUND);
    assert_eq!(doc.mask.get(12, 12), BACKGROUND);

    assert!(history.undo(&mut doc.mask));
    assert_eq!(doc.mask, before, "the whole merge is a single history entry");
}

#[test]
fn erase_stroke_restores_background() {
    let mut doc = loaded_doc(20, 20);
    let painter = Brush::new(4.0, BrushMode::Draw);
    draw_segment(&mut doc, &painter, (10.0, 10.0), (10.0, 10.0));
    doc.remove_gray();
    assert_eq!(doc.mask.get(10, 10), FOREGROUND);

    let eraser = Brush::new(6.0, BrushMode::Erase);
    draw_segment(&mut doc, &eraser, (10.0, 10.0), (10.0, 10.0));
    doc.remove_gray();
    for y in 0..20 {
        for x in 0..20 {
            assert_eq!(doc.mask.get(x, y), BACKGROUND);
        }
    }
}
