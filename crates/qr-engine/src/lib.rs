//! QR code imaging for the generation service.
//!
//! Encodes text into a module matrix, renders it onto a raster canvas with
//! a quiet zone, and composites an optional logo at the center.

pub mod compose;
pub mod qr;
pub mod resize;

use std::io::Cursor;

use image::{DynamicImage, ImageFormat};

// Re-exports for convenience
pub use compose::{apply_logo, center_offset, overlay};
pub use qr::{ModuleMatrix, Palette, canvas_size, encode, render_gray, render_rgb, render_rgba};
pub use resize::{fit_longest_side, logo_side_for};

/// Blank border around the symbol, in modules.
pub const QUIET_ZONE: u32 = 4;

/// Default pixel size of a single module.
pub const DEFAULT_BOX_SIZE: u32 = 10;

/// The logo's longest side is this fraction (1/n) of the canvas width.
pub const LOGO_SCALE_DIVISOR: u32 = 5;

/// Imaging error type.
#[derive(Debug, thiserror::Error)]
pub enum QrError {
    #[error("text must not be empty")]
    EmptyInput,

    #[error("text too long to encode at the highest error-correction level")]
    DataTooLong,

    #[error("QR encode error: {0}")]
    Encode(String),

    #[error("box size must be at least 1 (got {0})")]
    InvalidBoxSize(u32),

    #[error("image decode error: {0}")]
    Decode(#[source] image::ImageError),

    #[error("PNG encode error: {0}")]
    Png(#[source] image::ImageError),
}

/// Serialize an image as PNG bytes.
pub fn encode_png(img: &DynamicImage) -> Result<Vec<u8>, QrError> {
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, ImageFormat::Png)
        .map_err(QrError::Png)?;
    Ok(buf.into_inner())
}

/// Decode arbitrary image bytes, guessing the format from the content.
pub fn decode_image(bytes: &[u8]) -> Result<DynamicImage, QrError> {
    image::load_from_memory(bytes).map_err(QrError::Decode)
}
