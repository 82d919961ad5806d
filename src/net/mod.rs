//! HTTP glue around the core: the backend file store and the prediction
//! service are external collaborators reached over blocking requests from
//! worker threads.
pub mod codec;
pub mod files;
pub mod predict;

use thiserror::Error;

/// Failures from the backend and predictor round-trips.
#[derive(Debug, Error)]
pub enum NetError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server returned status {0}")]
    Status(reqwest::StatusCode),
    #[error("image payload could not be decoded: {0}")]
    Image(#[from] image::ImageError),
    #[error("base64 payload could not be decoded: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("prediction failed: {0}")]
    Prediction(String),
}
