use eframe::egui;

use crate::app::editor::{EditorApp, ToolMode};
use crate::brush_engine::brush::BrushMode;
use crate::magic_pen::{MAX_CROP_SIZE, MIN_CROP_SIZE};
use crate::utils::color::Rgb8;

/// Brush radius and paint/erase mode.
pub fn brush_panel(ui: &mut egui::Ui, app: &mut EditorApp) {
    ui.label("Mode:");
    ui.horizontal(|ui| {
        ui.selectable_value(&mut app.brush.mode, BrushMode::Draw, "Paint");
        ui.selectable_value(&mut app.brush.mode, BrushMode::Erase, "Erase");
    });

    ui.add_space(5.0);

    ui.label("Size:");
    ui.add(egui::Slider::new(&mut app.brush.radius, 1.0..=50.0));

    ui.add_space(5.0);
    ui.label("Tool:");
    ui.horizontal(|ui| {
        ui.selectable_value(&mut app.tool, ToolMode::Draw, "Brush");
        ui.selectable_value(&mut app.tool, ToolMode::MagicPen, "Magic Pen");
    });
}

/// Preview tint and visibility of the mask overlay.
pub fn mask_display_panel(ui: &mut egui::Ui, app: &mut EditorApp) {
    ui.label("Mask color:");
    let mut color = app.doc.display_color().to_color32();
    if ui.color_edit_button_srgba(&mut color).changed() {
        app.doc.set_display_color(Rgb8::from_color32(color));
        app.mark_preview_dirty();
    }

    ui.add_space(5.0);
    ui.checkbox(&mut app.mask_visible, "Show mask");
}

/// Crop size plus the tuning knobs forwarded to the prediction service.
pub fn magic_pen_panel(ui: &mut egui::Ui, app: &mut EditorApp) {
    ui.label("Crop size:");
    let mut crop_size = app.magic_pen.crop_size();
    if ui
        .add(egui::Slider::new(
            &mut crop_size,
            MIN_CROP_SIZE..=MAX_CROP_SIZE,
        ))
        .changed()
    {
        app.magic_pen.set_crop_size(crop_size);
    }

    ui.separator();
    ui.heading("Morphology");
    let params = &mut app.magic_pen.params;
    ui.checkbox(&mut params.apply_morphology, "Apply morphology");
    ui.label("Kernel size:");
    ui.add(egui::Slider::new(&mut params.morph_kernel_size, 1..=15).step_by(2.0));
    ui.label("Iterations:");
    ui.add(egui::Slider::new(&mut params.morph_iterations, 1..=10));

    ui.separator();
    ui.heading("DBSCAN");
    ui.checkbox(&mut params.apply_dbscan, "Apply DBSCAN");
    ui.label("Eps (distance):");
    ui.add(egui::Slider::new(&mut params.db_eps, 1..=100));
    ui.label("Min samples:");
    ui.add(egui::Slider::new(&mut params.db_min_samples, 1..=20));

    ui.separator();
    ui.heading("Sensitivity");
    ui.add(egui::Slider::new(&mut params.sensitivity, 0..=100));
}
