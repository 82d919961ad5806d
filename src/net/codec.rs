use base64::{Engine as _, engine::general_purpose::STANDARD};
use image::RgbaImage;

use crate::canvas::buffer::PixelBuffer;
use crate::net::NetError;

const DATA_URL_PREFIX: &str = "data:image/png;base64,";

/// Encode a pixel buffer as a PNG data URL, the form the prediction service
/// expects for crop payloads.
pub fn encode_png_data_url(buf: &PixelBuffer) -> Result<String, NetError> {
    let img = RgbaImage::from_raw(
        buf.width() as u32,
        buf.height() as u32,
        buf.data().to_vec(),
    )
    .expect("pixel buffer length matches its dimensions");
    let mut bytes = std::io::Cursor::new(Vec::new());
    img.write_to(&mut bytes, image::ImageFormat::Png)?;
    Ok(format!(
        "{DATA_URL_PREFIX}{}",
        STANDARD.encode(bytes.into_inner())
    ))
}

/// Decode a base64 PNG (with or without a data-URL prefix) into a pixel
/// buffer. Grayscale predictor output expands to RGBA.
pub fn decode_png_data_url(payload: &str) -> Result<PixelBuffer, NetError> {
    let b64 = match payload.split_once(',') {
        Some((prefix, rest)) if prefix.starts_with("data:image") => rest,
        _ => payload,
    };
    let bytes = STANDARD.decode(b64.trim())?;
    let img = image::load_from_memory(&bytes)?.to_rgba8();
    let (w, h) = (img.width() as usize, img.height() as usize);
    Ok(PixelBuffer::from_raw(w, h, img.into_raw())
        .expect("RgbaImage raw length matches its dimensions"))
}
