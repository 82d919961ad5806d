use std::time::Duration;

use image::RgbaImage;
use serde::Deserialize;

use crate::net::NetError;

/// One entry from the backend image listing.
#[derive(Debug, Clone, Deserialize)]
pub struct ImageEntry {
    pub name: String,
    pub path: String,
}

/// Blocking client for the backend image/mask store. Used from worker
/// threads and short-lived UI actions (open, save, upload).
#[derive(Clone)]
pub struct FileClient {
    base_url: String,
    http: reqwest::blocking::Client,
}

impl FileClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            http: reqwest::blocking::Client::builder()
                .timeout(Duration::from_secs(30))
                .build()
                .expect("reqwest client"),
        }
    }

    /// List the images available on the backend.
    pub fn list_images(&self) -> Result<Vec<ImageEntry>, NetError> {
        let response = self
            .http
            .get(format!("{}/images", self.base_url))
            .send()?;
        if !response.status().is_success() {
            return Err(NetError::Status(response.status()));
        }
        Ok(response.json()?)
    }

    /// Fetch a PNG resource (image or mask) by its backend path.
    pub fn fetch_png(&self, path: &str) -> Result<RgbaImage, NetError> {
        let response = self
            .http
            .get(format!("{}/{}", self.base_url, path.trim_start_matches('/')))
            .send()?;
        if !response.status().is_success() {
            return Err(NetError::Status(response.status()));
        }
        let bytes = response.bytes()?;
        Ok(image::load_from_memory(&bytes)?.to_rgba8())
    }

    /// The backend keeps one mask per image, keyed by the image name.
    pub fn mask_path(image_name: &str) -> String {
        format!("masks/{image_name}")
    }

    /// Fetch the mask belonging to an image.
    pub fn fetch_mask(&self, image_name: &str) -> Result<RgbaImage, NetError> {
        self.fetch_png(&Self::mask_path(image_name))
    }

    /// Persist the current mask (PNG bytes) under the open image's name.
    pub fn save_mask(&self, image_name: &str, png: Vec<u8>) -> Result<(), NetError> {
        let response = self
            .http
            .post(format!("{}/masks/{}", self.base_url, image_name))
            .header(reqwest::header::CONTENT_TYPE, "image/png")
            .body(png)
            .send()?;
        if !response.status().is_success() {
            return Err(NetError::Status(response.status()));
        }
        Ok(())
    }

    /// Upload a local image file to the backend store.
    pub fn upload_image(&self, name: &str, png: Vec<u8>) -> Result<(), NetError> {
        let response = self
            .http
            .post(format!("{}/images/{}", self.base_url, name))
            .header(reqwest::header::CONTENT_TYPE, "image/png")
            .body(png)
            .send()?;
        if !response.status().is_success() {
            return Err(NetError::Status(response.status()));
        }
        Ok(())
    }
}
