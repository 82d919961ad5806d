pub mod app;
pub mod brush_engine;
pub mod canvas;
pub mod magic_pen;
pub mod net;
pub mod ui;
pub mod utils;
pub mod view;

pub use app::{Command, EditorApp, ToolMode};
