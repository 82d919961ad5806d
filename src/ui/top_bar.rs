use eframe::egui;

use crate::app::editor::{Command, EditorApp, ToolMode};
use crate::brush_engine::brush::BrushMode;

/// Horizontal action bar: file actions, history, tools and zoom, with the
/// transient status line on the right.
pub fn top_bar(app: &mut EditorApp, ctx: &egui::Context) {
    egui::TopBottomPanel::top("action_bar").show(ctx, |ui| {
        ui.horizontal(|ui| {
            if ui.button("📂 Open").clicked() {
                app.open_file_modal();
            }
            if ui.button("⬆ Upload Image").clicked() {
                app.upload_image();
            }
            if ui.button("⬆ Upload Mask").clicked() {
                app.upload_mask();
            }
            if ui.button("💾 Save (S)").clicked() {
                app.apply_command(Command::SaveMask);
            }

            ui.separator();

            if ui
                .add_enabled(app.history.can_undo(), egui::Button::new("⟲ Undo"))
                .clicked()
            {
                app.apply_command(Command::Undo);
            }
            if ui
                .add_enabled(app.history.can_redo(), egui::Button::new("⟳ Redo"))
                .clicked()
            {
                app.apply_command(Command::Redo);
            }
            if ui.button("🗑 Clear (F)").clicked() {
                app.apply_command(Command::ClearMask);
            }

            ui.separator();

            ui.selectable_value(&mut app.tool, ToolMode::Draw, "🖌 Brush");
            ui.selectable_value(&mut app.tool, ToolMode::MagicPen, "✨ Magic Pen");

            let color_label = match app.brush.mode {
                BrushMode::Draw => "Paint (C)",
                BrushMode::Erase => "Erase (C)",
            };
            if ui.button(color_label).clicked() {
                app.apply_command(Command::SwitchColor);
            }

            ui.separator();

            if ui.button("🔍+").clicked() {
                app.apply_command(Command::ZoomIn);
            }
            if ui.button("🔍-").clicked() {
                app.apply_command(Command::ZoomOut);
            }
            ui.label(format!("{:.0}%", app.view.zoom() * 100.0));

            let mask_label = if app.mask_visible {
                "👁 Mask (M)"
            } else {
                "👁 Mask off (M)"
            };
            if ui.button(mask_label).clicked() {
                app.apply_command(Command::ToggleMask);
            }

            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                if let Some(status) = &app.status {
                    let color = if status.error {
                        egui::Color32::from_rgb(235, 100, 100)
                    } else {
                        egui::Color32::from_rgb(120, 200, 120)
                    };
                    ui.colored_label(color, &status.text);
                } else if let Some(name) = &app.open_image {
                    ui.label(name);
                }
            });
        });
    });
}
