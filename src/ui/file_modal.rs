use eframe::egui;

use crate::app::editor::EditorApp;

/// Modal listing the backend's images; clicking one opens it together with
/// its stored mask.
pub fn file_modal(app: &mut EditorApp, ctx: &egui::Context) {
    if !app.show_file_modal {
        return;
    }
    let mut open = true;
    let mut picked = None;

    egui::Window::new("Open Image")
        .open(&mut open)
        .collapsible(false)
        .resizable(true)
        .default_width(320.0)
        .show(ctx, |ui| {
            if app.image_list_loading {
                ui.horizontal(|ui| {
                    ui.spinner();
                    ui.label("Loading image list…");
                });
                return;
            }
            if app.image_list.is_empty() {
                ui.label("No images found.");
                return;
            }
            egui::ScrollArea::vertical().show(ui, |ui| {
                for entry in &app.image_list {
                    if ui.button(&entry.name).clicked() {
                        picked = Some(entry.clone());
                    }
                }
            });
        });

    if let Some(entry) = picked {
        app.open_image(entry);
        app.show_file_modal = false;
    } else if !open {
        app.show_file_modal = false;
    }
}
