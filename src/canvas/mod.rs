//! Pixel-level mask editing core: buffers, flood fill, history.
pub mod buffer;
pub mod document;
pub mod fill;
pub mod history;
