//! egui panels: the action bar, tool docks, and the image-open modal.
pub mod file_modal;
pub mod settings;
pub mod top_bar;

use eframe::egui;

/// Apply a cohesive dark theme tuned for long annotation sessions.
pub fn apply_global_style(ctx: &egui::Context) {
    let mut visuals = egui::Visuals::dark();
    visuals.panel_fill = egui::Color32::from_rgb(16, 17, 22);
    visuals.window_fill = egui::Color32::from_rgb(20, 22, 29);
    visuals.extreme_bg_color = egui::Color32::from_rgb(27, 29, 38);
    visuals.widgets.inactive.bg_fill = egui::Color32::from_rgb(32, 35, 45);
    visuals.widgets.hovered.bg_fill = egui::Color32::from_rgb(48, 66, 98);
    visuals.widgets.active.bg_fill = egui::Color32::from_rgb(72, 116, 180);
    visuals.widgets.inactive.fg_stroke.color = egui::Color32::from_rgb(215, 220, 230);
    visuals.widgets.hovered.fg_stroke.color = egui::Color32::from_rgb(240, 244, 255);
    visuals.selection.bg_fill = egui::Color32::from_rgb(86, 150, 235);
    visuals.window_rounding = egui::Rounding::same(8.0);
    visuals.widgets.inactive.rounding = egui::Rounding::same(6.0);
    visuals.widgets.hovered.rounding = egui::Rounding::same(6.0);
    visuals.widgets.active.rounding = egui::Rounding::same(6.0);
    ctx.set_visuals(visuals);
}
