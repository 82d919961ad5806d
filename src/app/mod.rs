pub mod editor;
pub mod input_handler;
pub mod layout;

pub use editor::{Command, EditorApp, ToolMode};
