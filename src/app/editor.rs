use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use eframe::egui::{self, Color32, TextureHandle, TextureOptions};
use image::RgbaImage;
use image::imageops::{self, FilterType};

use crate::brush_engine::brush::{Brush, BrushMode};
use crate::brush_engine::stroke::StrokeState;
use crate::canvas::buffer::PixelBuffer;
use crate::canvas::document::{BACKGROUND, Document, FOREGROUND};
use crate::canvas::fill;
use crate::canvas::history::History;
use crate::magic_pen::{MagicPen, PenState, PredictionJob};
use crate::net::files::{FileClient, ImageEntry};
use crate::net::predict::{PredictClient, PredictResponse};
use crate::net::{NetError, codec};
use crate::utils::profiler::ScopeTimer;
use crate::utils::vector::Vec2;
use crate::view::ViewState;
use crate::{app, ui};

/// Fixed stamp spacing along a stroke, in canvas pixels.
pub const BRUSH_SPACING: f32 = 1.0;

/// Minimum interval between processed pointer-move events; a coarse frame
/// throttle bounding per-frame raster work.
const MOVE_THROTTLE: Duration = Duration::from_millis(20);

/// How long a transient status message stays visible.
const STATUS_TTL: Duration = Duration::from_secs(4);

/// Which tool the primary pointer button drives.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ToolMode {
    Draw,
    MagicPen,
}

/// A user-facing operation, decoupled from the keys and buttons that
/// trigger it.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Command {
    Undo,
    Redo,
    ChangeBrushSize(i32),
    SwitchColor,
    SwitchTool,
    ToggleMask,
    ToggleUi,
    ToggleParams,
    ClearMask,
    ZoomIn,
    ZoomOut,
    SaveMask,
}

/// Results posted back from worker threads.
pub(crate) enum NetEvent {
    ImageList(Result<Vec<ImageEntry>, NetError>),
    ImageOpened {
        name: String,
        image: Box<RgbaImage>,
        mask: Option<Box<RgbaImage>>,
    },
    ImageOpenFailed {
        name: String,
        error: NetError,
    },
    MaskSaved(Result<(), NetError>),
    UploadFinished {
        name: String,
        result: Result<(), NetError>,
    },
    Prediction {
        generation: u64,
        result: Result<PredictResponse, NetError>,
    },
}

/// Transient status line shown in the top bar.
pub(crate) struct Status {
    pub text: String,
    pub error: bool,
    at: Instant,
}

struct LayerTextures {
    image: TextureHandle,
    preview: TextureHandle,
    overlay: TextureHandle,
}

/// One editing session: the document, its history and view state, the
/// tools, and the backend clients. Constructed with an injected server URL;
/// multiple instances can coexist.
pub struct EditorApp {
    pub(crate) doc: Document,
    pub(crate) history: History,
    pub(crate) brush: Brush,
    pub(crate) tool: ToolMode,
    pub(crate) stroke: Option<StrokeState>,
    pub(crate) magic_pen: MagicPen,
    pub(crate) view: ViewState,

    files: FileClient,
    predict: PredictClient,
    events_tx: mpsc::Sender<NetEvent>,
    events_rx: mpsc::Receiver<NetEvent>,
    egui_ctx: egui::Context,

    pub(crate) open_image: Option<String>,
    pub(crate) image_list: Vec<ImageEntry>,
    pub(crate) image_list_loading: bool,
    pub(crate) show_file_modal: bool,

    pub(crate) mask_visible: bool,
    pub(crate) panels_visible: bool,
    pub(crate) params_visible: bool,
    pub(crate) status: Option<Status>,

    pub(crate) dock_left: egui_dock::DockState<app::layout::ToolTab>,
    pub(crate) dock_right: egui_dock::DockState<app::layout::ToolTab>,

    pub(crate) is_panning: bool,
    last_move: Option<Instant>,
    viewport_size: egui::Vec2,

    textures: Option<LayerTextures>,
    preview_dirty: bool,
    overlay_dirty: bool,
}

impl EditorApp {
    pub fn new(cc: &eframe::CreationContext<'_>, server_url: String) -> Self {
        ui::apply_global_style(&cc.egui_ctx);
        let (events_tx, events_rx) = mpsc::channel();
        Self {
            doc: Document::new(),
            history: History::new(),
            brush: Brush::default(),
            tool: ToolMode::Draw,
            stroke: None,
            magic_pen: MagicPen::new(),
            view: ViewState::new(),
            files: FileClient::new(server_url.clone()),
            predict: PredictClient::new(server_url),
            events_tx,
            events_rx,
            egui_ctx: cc.egui_ctx.clone(),
            open_image: None,
            image_list: Vec::new(),
            image_list_loading: false,
            show_file_modal: false,
            mask_visible: true,
            panels_visible: true,
            params_visible: true,
            status: None,
            dock_left: app::layout::default_left_dock(),
            dock_right: app::layout::default_right_dock(),
            is_panning: false,
            last_move: None,
            viewport_size: egui::Vec2::ZERO,
            textures: None,
            preview_dirty: false,
            overlay_dirty: false,
        }
    }

    // ------------------------------------------------------------------
    // Geometry
    // ------------------------------------------------------------------

    /// Convert a pointer position into canvas-pixel coordinates, using the
    /// displayed canvas rect and the current zoom. Returns (0, 0) while no
    /// image is loaded; mutating callers no-op on an empty document anyway.
    pub(crate) fn screen_to_canvas(&self, pos: egui::Pos2, panel_rect: egui::Rect) -> Vec2 {
        if self.doc.is_empty() {
            return Vec2::new(0.0, 0.0);
        }
        let origin = panel_rect.min + egui::vec2(self.view.offset.x, self.view.offset.y);
        let size = self.view.displayed_size(self.doc.width(), self.doc.height());
        Vec2::new(
            (pos.x - origin.x) / size.x * self.doc.width() as f32,
            (pos.y - origin.y) / size.y * self.doc.height() as f32,
        )
    }

    fn viewport_center(&self) -> Vec2 {
        Vec2::new(self.viewport_size.x / 2.0, self.viewport_size.y / 2.0)
    }

    // ------------------------------------------------------------------
    // Strokes
    // ------------------------------------------------------------------

    pub(crate) fn begin_stroke(&mut self, pos: Vec2) {
        if self.doc.is_empty() || self.stroke.is_some() {
            return;
        }
        let mut stroke = StrokeState::new();
        match self.tool {
            ToolMode::Draw => {
                self.history.store_state(&self.doc.mask);
                let brush = &self.brush;
                let doc = &mut self.doc;
                stroke.add_point(BRUSH_SPACING, pos, &mut |p, _| brush.stamp(doc, p));
                self.preview_dirty = true;
            }
            ToolMode::MagicPen => {
                self.magic_pen.begin_stroke(&mut self.doc);
                let pen = &mut self.magic_pen;
                let doc = &mut self.doc;
                stroke.add_point(BRUSH_SPACING, pos, &mut |p, len| {
                    pen.on_path_point(doc, p, len)
                });
                self.overlay_dirty = true;
            }
        }
        self.stroke = Some(stroke);
    }

    pub(crate) fn stroke_move(&mut self, pos: Vec2) {
        let Some(stroke) = &mut self.stroke else {
            return;
        };
        match self.tool {
            ToolMode::Draw => {
                let brush = &self.brush;
                let doc = &mut self.doc;
                stroke.add_point(BRUSH_SPACING, pos, &mut |p, _| brush.stamp(doc, p));
                self.preview_dirty = true;
            }
            ToolMode::MagicPen => {
                let pen = &mut self.magic_pen;
                let doc = &mut self.doc;
                stroke.add_point(BRUSH_SPACING, pos, &mut |p, len| {
                    pen.on_path_point(doc, p, len)
                });
                self.overlay_dirty = true;
            }
        }
    }

    pub(crate) fn finish_stroke(&mut self) {
        let Some(mut stroke) = self.stroke.take() else {
            return;
        };
        stroke.end();
        match self.tool {
            ToolMode::Draw => {
                self.doc.remove_gray();
                self.preview_dirty = true;
            }
            ToolMode::MagicPen => {
                if let Some(job) = self.magic_pen.end_stroke() {
                    self.dispatch_prediction(job);
                } else {
                    self.magic_pen.resolve(&mut self.doc);
                }
                self.overlay_dirty = true;
            }
        }
    }

    /// True when a pointer-move event should be processed; drops moves that
    /// arrive within the throttle interval.
    pub(crate) fn accept_move(&mut self) -> bool {
        let now = Instant::now();
        if let Some(last) = self.last_move {
            if now.duration_since(last) < MOVE_THROTTLE {
                return false;
            }
        }
        self.last_move = Some(now);
        true
    }

    // ------------------------------------------------------------------
    // Gestures besides strokes
    // ------------------------------------------------------------------

    pub(crate) fn flood_fill_at(&mut self, pos: Vec2) {
        if self.doc.is_empty() {
            return;
        }
        let _timer = ScopeTimer::new("flood_fill");
        self.history.store_state(&self.doc.mask);
        let color = match self.brush.mode {
            BrushMode::Draw => FOREGROUND,
            BrushMode::Erase => BACKGROUND,
        };
        fill::flood_fill(
            &mut self.doc.mask,
            pos.x.floor() as i32,
            pos.y.floor() as i32,
            color,
            fill::DEFAULT_TOLERANCE,
        );
        // Normalize any tolerance-introduced gray and rebuild the preview.
        self.doc.remove_gray();
        self.preview_dirty = true;
    }

    pub(crate) fn undo(&mut self) {
        if self.history.undo(&mut self.doc.mask) {
            self.doc.refresh_preview();
            self.preview_dirty = true;
        }
    }

    pub(crate) fn redo(&mut self) {
        if self.history.redo(&mut self.doc.mask) {
            self.doc.refresh_preview();
            self.preview_dirty = true;
        }
    }

    pub(crate) fn clear_mask(&mut self) {
        if self.doc.is_empty() {
            return;
        }
        self.history.store_state(&self.doc.mask);
        self.doc.reset_mask();
        self.preview_dirty = true;
    }

    pub(crate) fn apply_command(&mut self, command: Command) {
        match command {
            Command::Undo => self.undo(),
            Command::Redo => self.redo(),
            Command::ChangeBrushSize(delta) => match self.tool {
                ToolMode::Draw => self.brush.change_radius(delta as f32),
                ToolMode::MagicPen => self.magic_pen.change_crop_size(delta),
            },
            Command::SwitchColor => {
                self.brush.switch_mode();
                log::debug!("brush now paints {:?}", self.brush.mode);
            }
            Command::SwitchTool => {
                self.tool = match self.tool {
                    ToolMode::Draw => ToolMode::MagicPen,
                    ToolMode::MagicPen => ToolMode::Draw,
                };
                log::debug!("active tool: {:?}", self.tool);
            }
            Command::ToggleMask => self.mask_visible = !self.mask_visible,
            Command::ToggleUi => self.panels_visible = !self.panels_visible,
            Command::ToggleParams => self.params_visible = !self.params_visible,
            Command::ClearMask => self.clear_mask(),
            Command::ZoomIn => {
                let center = self.viewport_center();
                self.view.zoom_in(center);
            }
            Command::ZoomOut => {
                let center = self.viewport_center();
                self.view.zoom_out(center);
            }
            Command::SaveMask => self.save_mask(),
        }
    }

    // ------------------------------------------------------------------
    // Backend round-trips (all off the UI thread)
    // ------------------------------------------------------------------

    pub(crate) fn open_file_modal(&mut self) {
        self.show_file_modal = true;
        self.image_list_loading = true;
        let files = self.files.clone();
        let tx = self.events_tx.clone();
        let ctx = self.egui_ctx.clone();
        thread::spawn(move || {
            let _ = tx.send(NetEvent::ImageList(files.list_images()));
            ctx.request_repaint();
        });
    }

    pub(crate) fn open_image(&mut self, entry: ImageEntry) {
        let files = self.files.clone();
        let tx = self.events_tx.clone();
        let ctx = self.egui_ctx.clone();
        thread::spawn(move || {
            let event = match files.fetch_png(&entry.path) {
                Ok(image) => {
                    // A missing mask is expected for fresh images.
                    let mask = match files.fetch_mask(&entry.name) {
                        Ok(mask) => Some(Box::new(mask)),
                        Err(err) => {
                            log::warn!("no mask for {}: {err}", entry.name);
                            None
                        }
                    };
                    NetEvent::ImageOpened {
                        name: entry.name,
                        image: Box::new(image),
                        mask,
                    }
                }
                Err(error) => NetEvent::ImageOpenFailed {
                    name: entry.name,
                    error,
                },
            };
            let _ = tx.send(event);
            ctx.request_repaint();
        });
    }

    pub(crate) fn save_mask(&mut self) {
        let Some(name) = self.open_image.clone() else {
            self.set_error("no image open".to_string());
            return;
        };
        let png = match self.doc.mask_png() {
            Ok(png) => png,
            Err(err) => {
                self.set_error(format!("failed to encode mask: {err}"));
                return;
            }
        };
        let files = self.files.clone();
        let tx = self.events_tx.clone();
        let ctx = self.egui_ctx.clone();
        thread::spawn(move || {
            let _ = tx.send(NetEvent::MaskSaved(files.save_mask(&name, png)));
            ctx.request_repaint();
        });
    }

    /// Pick a local PNG and push it to the backend image store.
    pub(crate) fn upload_image(&mut self) {
        self.upload_file(false);
    }

    /// Pick a local PNG and store it as a mask on the backend.
    pub(crate) fn upload_mask(&mut self) {
        self.upload_file(true);
    }

    fn upload_file(&mut self, as_mask: bool) {
        let Some(path) = rfd::FileDialog::new()
            .add_filter("PNG image", &["png"])
            .pick_file()
        else {
            return;
        };
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload.png".to_string());
        let bytes = match std::fs::read(&path) {
            Ok(bytes) => bytes,
            Err(err) => {
                self.set_error(format!("failed to read {name}: {err}"));
                return;
            }
        };
        let files = self.files.clone();
        let tx = self.events_tx.clone();
        let ctx = self.egui_ctx.clone();
        thread::spawn(move || {
            let result = if as_mask {
                files.save_mask(&name, bytes)
            } else {
                files.upload_image(&name, bytes)
            };
            let _ = tx.send(NetEvent::UploadFinished { name, result });
            ctx.request_repaint();
        });
    }

    fn dispatch_prediction(&mut self, job: PredictionJob) {
        let predict = self.predict.clone();
        let tx = self.events_tx.clone();
        let ctx = self.egui_ctx.clone();
        thread::spawn(move || {
            let result = predict.predict_crops(&job.crops, &job.params);
            let _ = tx.send(NetEvent::Prediction {
                generation: job.generation,
                result,
            });
            ctx.request_repaint();
        });
    }

    // ------------------------------------------------------------------
    // Event pump
    // ------------------------------------------------------------------

    fn poll_events(&mut self) {
        let mut events = Vec::new();
        while let Ok(event) = self.events_rx.try_recv() {
            events.push(event);
        }
        for event in events {
            self.handle_event(event);
        }
    }

    fn handle_event(&mut self, event: NetEvent) {
        match event {
            NetEvent::ImageList(Ok(list)) => {
                self.image_list = list;
                self.image_list_loading = false;
            }
            NetEvent::ImageList(Err(err)) => {
                self.image_list_loading = false;
                self.set_error(format!("failed to list images: {err}"));
            }
            NetEvent::ImageOpened { name, image, mask } => {
                self.doc.load_image(&image);
                match mask {
                    Some(mask) => self.doc.load_mask(&mask),
                    None => self.doc.reset_mask(),
                }
                self.history.clear();
                self.magic_pen.abort(&mut self.doc);
                self.stroke = None;
                self.open_image = Some(name.clone());
                self.textures = None;
                self.set_status(format!("opened {name}"));
            }
            NetEvent::ImageOpenFailed { name, error } => {
                self.set_error(format!("failed to open {name}: {error}"));
            }
            NetEvent::MaskSaved(Ok(())) => self.set_status("mask saved".to_string()),
            NetEvent::MaskSaved(Err(err)) => {
                self.set_error(format!("failed to save mask: {err}"));
            }
            NetEvent::UploadFinished { name, result } => match result {
                Ok(()) => self.set_status(format!("uploaded {name}")),
                Err(err) => self.set_error(format!("failed to upload {name}: {err}")),
            },
            NetEvent::Prediction { generation, result } => {
                self.handle_prediction(generation, result);
            }
        }
    }

    fn handle_prediction(&mut self, generation: u64, result: Result<PredictResponse, NetError>) {
        // A response from a stroke the user has since superseded is dropped:
        // merging it would resurrect state the user already drew over.
        if generation != self.magic_pen.generation() {
            log::warn!("discarding stale prediction response (generation {generation})");
            return;
        }
        match result {
            Ok(response) => {
                if let Some(payload) = &response.merged_mask_base64 {
                    match codec::decode_png_data_url(payload) {
                        Ok(pred) => {
                            let pred =
                                fit_to_canvas(pred, self.doc.width(), self.doc.height());
                            self.history.store_state(&self.doc.mask);
                            self.doc.merge_prediction(&pred);
                            self.preview_dirty = true;
                        }
                        Err(err) => {
                            self.set_error(format!("bad prediction payload: {err}"));
                        }
                    }
                }
                let n = response.num_crops_processed.unwrap_or(0);
                self.set_status(format!("magic pen applied ({n} crops)"));
            }
            Err(err) => {
                log::error!("prediction request failed: {err}");
                self.set_error(format!("prediction failed: {err}"));
            }
        }
        if self.magic_pen.state() == PenState::Predicting {
            self.magic_pen.resolve(&mut self.doc);
            self.overlay_dirty = true;
        }
    }

    /// Flag the preview layer for texture re-upload after an out-of-band
    /// mutation (e.g. the display color changed).
    pub(crate) fn mark_preview_dirty(&mut self) {
        self.preview_dirty = true;
    }

    pub(crate) fn set_status(&mut self, text: String) {
        log::info!("{text}");
        self.status = Some(Status {
            text,
            error: false,
            at: Instant::now(),
        });
    }

    pub(crate) fn set_error(&mut self, text: String) {
        log::error!("{text}");
        self.status = Some(Status {
            text,
            error: true,
            at: Instant::now(),
        });
    }

    fn expire_status(&mut self) {
        if let Some(status) = &self.status {
            if status.at.elapsed() > STATUS_TTL {
                self.status = None;
            }
        }
    }

    // ------------------------------------------------------------------
    // Rendering
    // ------------------------------------------------------------------

    fn update_textures(&mut self, ctx: &egui::Context) {
        if self.doc.is_empty() {
            return;
        }
        let Some(textures) = &mut self.textures else {
            self.textures = Some(LayerTextures {
                image: ctx.load_texture(
                    "layer_image",
                    self.doc.image.to_color_image(),
                    TextureOptions::NEAREST,
                ),
                preview: ctx.load_texture(
                    "layer_preview",
                    self.doc.preview.to_color_image(),
                    TextureOptions::NEAREST,
                ),
                overlay: ctx.load_texture(
                    "layer_overlay",
                    self.doc.overlay.to_color_image(),
                    TextureOptions::NEAREST,
                ),
            });
            self.preview_dirty = false;
            self.overlay_dirty = false;
            return;
        };
        if self.preview_dirty {
            textures
                .preview
                .set(self.doc.preview.to_color_image(), TextureOptions::NEAREST);
            self.preview_dirty = false;
        }
        if self.overlay_dirty {
            textures
                .overlay
                .set(self.doc.overlay.to_color_image(), TextureOptions::NEAREST);
            self.overlay_dirty = false;
        }
    }

    fn draw_canvas(&mut self, ui: &mut egui::Ui) -> (egui::Response, egui::Rect) {
        let (rect, response) =
            ui.allocate_at_least(ui.available_size(), egui::Sense::click_and_drag());
        self.viewport_size = rect.size();

        if self.doc.is_empty() {
            ui.painter().text(
                rect.center(),
                egui::Align2::CENTER_CENTER,
                "Open an image to start annotating",
                egui::FontId::proportional(18.0),
                Color32::GRAY,
            );
            return (response, rect);
        }

        let origin = rect.min + egui::vec2(self.view.offset.x, self.view.offset.y);
        let size = self.view.displayed_size(self.doc.width(), self.doc.height());
        let dest = egui::Rect::from_min_size(origin, egui::vec2(size.x, size.y));
        let uv = egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0));

        if let Some(textures) = &self.textures {
            let painter = ui.painter_at(rect);
            painter.image(textures.image.id(), dest, uv, Color32::WHITE);
            if self.mask_visible {
                painter.image(textures.preview.id(), dest, uv, Color32::WHITE);
            }
            painter.image(textures.overlay.id(), dest, uv, Color32::WHITE);
        }
        (response, rect)
    }
}

impl eframe::App for EditorApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll_events();
        self.expire_status();

        ui::top_bar::top_bar(self, ctx);
        if self.panels_visible {
            app::layout::show_tool_docks(self, ctx);
        }
        ui::file_modal::file_modal(self, ctx);

        egui::CentralPanel::default().show(ctx, |ui| {
            self.update_textures(ctx);
            let (response, rect) = self.draw_canvas(ui);
            app::input_handler::handle_input(self, ctx, &response, rect);
        });
    }
}

/// Scale a decoded prediction raster to the canvas dimensions when the
/// service answered at a different resolution.
fn fit_to_canvas(pred: PixelBuffer, width: usize, height: usize) -> PixelBuffer {
    if pred.width() == width && pred.height() == height {
        return pred;
    }
    let img = RgbaImage::from_raw(
        pred.width() as u32,
        pred.height() as u32,
        pred.data().to_vec(),
    )
    .expect("pixel buffer length matches its dimensions");
    let scaled = imageops::resize(&img, width as u32, height as u32, FilterType::Nearest);
    PixelBuffer::from_raw(width, height, scaled.into_raw())
        .expect("resized image length matches the requested dimensions")
}
