use eframe::egui;

use crate::app::editor::{Command, EditorApp};
use crate::utils::vector::Vec2;

/// Keyboard table: one binding per command, checked on key-down.
pub fn keyboard_command(key: egui::Key, modifiers: egui::Modifiers) -> Option<Command> {
    if modifiers.ctrl || modifiers.command {
        return match key {
            egui::Key::Z => Some(Command::Undo),
            egui::Key::Y => Some(Command::Redo),
            _ => None,
        };
    }
    match key {
        egui::Key::Q => Some(Command::ChangeBrushSize(-2)),
        egui::Key::E => Some(Command::ChangeBrushSize(2)),
        egui::Key::Num1 => Some(Command::ChangeBrushSize(-8)),
        egui::Key::Num3 => Some(Command::ChangeBrushSize(8)),
        egui::Key::C => Some(Command::SwitchColor),
        egui::Key::B => Some(Command::SwitchTool),
        egui::Key::M => Some(Command::ToggleMask),
        egui::Key::H => Some(Command::ToggleUi),
        egui::Key::P => Some(Command::ToggleParams),
        egui::Key::F => Some(Command::ClearMask),
        egui::Key::S => Some(Command::SaveMask),
        egui::Key::Plus | egui::Key::Equals => Some(Command::ZoomIn),
        egui::Key::Minus => Some(Command::ZoomOut),
        _ => None,
    }
}

/// Route pointer and keyboard events into editor commands: primary button
/// draws (brush or magic pen by tool mode), secondary flood-fills at the
/// cursor, middle-drag pans the viewport.
pub fn handle_input(
    app: &mut EditorApp,
    ctx: &egui::Context,
    response: &egui::Response,
    canvas_rect: egui::Rect,
) {
    let events = ctx.input(|i| i.events.clone());

    for event in events {
        match event {
            egui::Event::Key {
                key,
                pressed: true,
                modifiers,
                ..
            } => {
                if let Some(command) = keyboard_command(key, modifiers) {
                    app.apply_command(command);
                }
            }

            egui::Event::PointerButton {
                pos,
                button,
                pressed,
                ..
            } => match button {
                egui::PointerButton::Primary => {
                    if pressed && response.hovered() {
                        let canvas_pos = app.screen_to_canvas(pos, canvas_rect);
                        app.begin_stroke(canvas_pos);
                    } else if !pressed {
                        app.finish_stroke();
                    }
                }
                egui::PointerButton::Secondary => {
                    if pressed && response.hovered() {
                        let canvas_pos = app.screen_to_canvas(pos, canvas_rect);
                        app.flood_fill_at(canvas_pos);
                    }
                }
                egui::PointerButton::Middle => {
                    app.is_panning = pressed && response.hovered();
                }
                _ => {}
            },

            egui::Event::PointerMoved(pos) => {
                if app.is_panning {
                    let delta = ctx.input(|i| i.pointer.delta());
                    app.view.pan(Vec2::new(delta.x, delta.y));
                    ctx.request_repaint();
                } else if app.stroke.is_some() {
                    if !canvas_rect.contains(pos) {
                        // Pointer left the canvas: finalize like a release.
                        app.finish_stroke();
                    } else if app.accept_move() {
                        let canvas_pos = app.screen_to_canvas(pos, canvas_rect);
                        app.stroke_move(canvas_pos);
                        ctx.request_repaint();
                    }
                }
            }

            egui::Event::PointerGone => {
                app.finish_stroke();
                app.is_panning = false;
            }

            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn undo_redo_require_ctrl() {
        let ctrl = egui::Modifiers {
            ctrl: true,
            ..Default::default()
        };
        assert_eq!(keyboard_command(egui::Key::Z, ctrl), Some(Command::Undo));
        assert_eq!(keyboard_command(egui::Key::Y, ctrl), Some(Command::Redo));
        assert_eq!(keyboard_command(egui::Key::Z, egui::Modifiers::NONE), None);
    }

    #[test]
    fn brush_size_bindings_scale_by_key() {
        assert_eq!(
            keyboard_command(egui::Key::E, egui::Modifiers::NONE),
            Some(Command::ChangeBrushSize(2))
        );
        assert_eq!(
            keyboard_command(egui::Key::Num1, egui::Modifiers::NONE),
            Some(Command::ChangeBrushSize(-8))
        );
    }

    #[test]
    fn unbound_keys_map_to_nothing() {
        assert_eq!(keyboard_command(egui::Key::X, egui::Modifiers::NONE), None);
        assert_eq!(
            keyboard_command(egui::Key::ArrowUp, egui::Modifiers::NONE),
            None
        );
    }
}
