//! QR code encoding and decoding for tickets.
//!
//! The check-in credential is the registrant's raw email string, encoded as a
//! standard QR symbol with no envelope.

use base64::{engine::general_purpose::STANDARD, Engine};
use image::{DynamicImage, GrayImage, ImageFormat, Luma};
use qrcode::{EcLevel, QrCode};
use std::io::Cursor;
use thiserror::Error;

/// Default rendered QR size in pixels.
pub const DEFAULT_QR_SIZE: u32 = 200;

/// Errors raised while producing or reading QR codes.
#[derive(Debug, Error)]
pub enum QrError {
    #[error("payload cannot be encoded: {0}")]
    Encode(#[from] qrcode::types::QrError),

    #[error("image could not be processed: {0}")]
    Image(#[from] image::ImageError),

    #[error("no QR code found in image")]
    NotFound,

    #[error("QR code could not be decoded: {0}")]
    Decode(String),
}

/// Renders a payload as a greyscale QR image with a quiet zone.
pub fn render(payload: &str, size: u32) -> Result<GrayImage, QrError> {
    let code = QrCode::with_error_correction_level(payload.as_bytes(), EcLevel::M)?;
    Ok(code
        .render::<Luma<u8>>()
        .min_dimensions(size, size)
        .quiet_zone(true)
        .build())
}

/// Encodes a payload as PNG bytes.
pub fn encode_png(payload: &str, size: u32) -> Result<Vec<u8>, QrError> {
    let image = render(payload, size)?;
    let mut bytes = Vec::new();
    DynamicImage::ImageLuma8(image).write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
    Ok(bytes)
}

/// Encodes a payload as a `data:image/png;base64,...` URL.
pub fn encode_data_url(payload: &str, size: u32) -> Result<String, QrError> {
    let png = encode_png(payload, size)?;
    Ok(format!("data:image/png;base64,{}", STANDARD.encode(png)))
}

/// Decodes every QR symbol found in a greyscale image.
pub fn decode_luma(image: &GrayImage) -> Result<Vec<String>, QrError> {
    let mut prepared = rqrr::PreparedImage::prepare_from_greyscale(
        image.width() as usize,
        image.height() as usize,
        |x, y| image.get_pixel(x as u32, y as u32).0[0],
    );
    let grids = prepared.detect_grids();
    if grids.is_empty() {
        return Err(QrError::NotFound);
    }

    grids
        .iter()
        .map(|grid| {
            grid.decode()
                .map(|(_, content)| content)
                .map_err(|e| QrError::Decode(e.to_string()))
        })
        .collect()
}

/// Decodes the first QR payload from encoded image bytes (PNG or JPEG).
pub fn decode_image(bytes: &[u8]) -> Result<String, QrError> {
    let image = image::load_from_memory(bytes)?.to_luma8();
    decode_luma(&image)?
        .into_iter()
        .next()
        .ok_or(QrError::NotFound)
}
