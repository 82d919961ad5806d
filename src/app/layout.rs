use eframe::egui;
use egui_dock::{DockArea, DockState, NodeIndex, TabViewer};

use crate::EditorApp;
use crate::ui;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ToolTab {
    BrushSettings,
    MaskDisplay,
    MagicPenParams,
}

impl ToolTab {
    pub(crate) fn title(self) -> &'static str {
        match self {
            ToolTab::BrushSettings => "Brush",
            ToolTab::MaskDisplay => "Mask Display",
            ToolTab::MagicPenParams => "Magic Pen",
        }
    }
}

pub(crate) fn default_left_dock() -> DockState<ToolTab> {
    let mut dock = DockState::new(vec![ToolTab::BrushSettings]);
    dock.main_surface_mut()
        .split_below(NodeIndex::root(), 0.55, vec![ToolTab::MaskDisplay]);
    dock
}

pub(crate) fn default_right_dock() -> DockState<ToolTab> {
    DockState::new(vec![ToolTab::MagicPenParams])
}

struct ToolTabViewer<'a> {
    app: &'a mut EditorApp,
}

impl<'a> TabViewer for ToolTabViewer<'a> {
    type Tab = ToolTab;

    fn title(&mut self, tab: &mut Self::Tab) -> egui::WidgetText {
        tab.title().into()
    }

    fn ui(&mut self, ui: &mut egui::Ui, tab: &mut Self::Tab) {
        match tab {
            ToolTab::BrushSettings => ui::settings::brush_panel(ui, self.app),
            ToolTab::MaskDisplay => ui::settings::mask_display_panel(ui, self.app),
            ToolTab::MagicPenParams => ui::settings::magic_pen_panel(ui, self.app),
        }
    }

    fn closeable(&mut self, _tab: &mut Self::Tab) -> bool {
        false
    }

    fn allowed_in_windows(&self, _tab: &mut Self::Tab) -> bool {
        true
    }
}

pub(crate) fn show_tool_docks(app: &mut EditorApp, ctx: &egui::Context) {
    egui::SidePanel::left("tool_dock_left")
        .resizable(true)
        .default_width(280.0)
        .min_width(220.0)
        .show(ctx, |ui| {
            ui.set_min_width(220.0);
            let mut dock_state = std::mem::replace(&mut app.dock_left, DockState::new(Vec::new()));
            {
                let mut viewer = ToolTabViewer { app };
                DockArea::new(&mut dock_state).show_inside(ui, &mut viewer);
            }
            app.dock_left = dock_state;
        });

    if app.params_visible {
        egui::SidePanel::right("tool_dock_right")
            .resizable(true)
            .default_width(300.0)
            .min_width(240.0)
            .show(ctx, |ui| {
                ui.set_min_width(240.0);
                let mut dock_state =
                    std::mem::replace(&mut app.dock_right, DockState::new(Vec::new()));
                {
                    let mut viewer = ToolTabViewer { app };
                    DockArea::new(&mut dock_state).show_inside(ui, &mut viewer);
                }
                app.dock_right = dock_state;
            });
    }
}
