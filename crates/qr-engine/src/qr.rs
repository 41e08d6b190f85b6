//! QR symbol encoding and rasterization.

use image::{GrayImage, ImageBuffer, Luma, Pixel, Rgb, RgbImage, RgbaImage};
use qrcode::types::QrError as EncodeError;
use qrcode::{Color, EcLevel, QrCode, Version};
use tracing::debug;

use crate::{QUIET_ZONE, QrError};

/// Encoded QR symbol as a square grid of dark/light modules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleMatrix {
    width: u32,
    version: i16,
    dark: Vec<bool>,
}

impl ModuleMatrix {
    /// Number of modules per side (without quiet zone).
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Symbol version selected for the data (1..=40).
    pub fn version(&self) -> i16 {
        self.version
    }

    pub fn is_dark(&self, x: u32, y: u32) -> bool {
        self.dark[(y * self.width + x) as usize]
    }
}

/// Foreground/background colors used when painting modules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub foreground: Rgb<u8>,
    pub background: Rgb<u8>,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            foreground: Rgb([0, 0, 0]),
            background: Rgb([255, 255, 255]),
        }
    }
}

impl Palette {
    /// Palette with a custom foreground on the default white background.
    pub fn with_foreground(foreground: Rgb<u8>) -> Self {
        Self {
            foreground,
            ..Self::default()
        }
    }
}

/// Encode text at error-correction level H (~30% damage tolerance).
///
/// The smallest symbol version that fits the data is chosen automatically.
pub fn encode(text: &str) -> Result<ModuleMatrix, QrError> {
    if text.is_empty() {
        return Err(QrError::EmptyInput);
    }

    let code = QrCode::with_error_correction_level(text.as_bytes(), EcLevel::H).map_err(
        |e| match e {
            EncodeError::DataTooLong => QrError::DataTooLong,
            other => QrError::Encode(other.to_string()),
        },
    )?;

    let version = match code.version() {
        Version::Normal(v) | Version::Micro(v) => v,
    };
    let width = code.width() as u32;
    let dark = code
        .to_colors()
        .into_iter()
        .map(|c| c == Color::Dark)
        .collect();

    debug!(version, width, bytes = text.len(), "Encoded QR symbol");
    Ok(ModuleMatrix {
        width,
        version,
        dark,
    })
}

/// Side length in pixels of a rendered symbol including the quiet zone.
pub fn canvas_size(matrix_width: u32, box_size: u32) -> u32 {
    (matrix_width + 2 * QUIET_ZONE) * box_size
}

/// Render black modules on white as an 8-bit grayscale image.
pub fn render_gray(matrix: &ModuleMatrix, box_size: u32) -> Result<GrayImage, QrError> {
    paint(matrix, box_size, Luma([0u8]), Luma([255u8]))
}

/// Render with a custom palette as an RGB image.
pub fn render_rgb(
    matrix: &ModuleMatrix,
    box_size: u32,
    palette: Palette,
) -> Result<RgbImage, QrError> {
    paint(matrix, box_size, palette.foreground, palette.background)
}

/// Render with a custom palette onto an opaque RGBA canvas, ready for
/// logo compositing.
pub fn render_rgba(
    matrix: &ModuleMatrix,
    box_size: u32,
    palette: Palette,
) -> Result<RgbaImage, QrError> {
    paint(
        matrix,
        box_size,
        palette.foreground.to_rgba(),
        palette.background.to_rgba(),
    )
}

fn paint<P>(
    matrix: &ModuleMatrix,
    box_size: u32,
    dark: P,
    light: P,
) -> Result<ImageBuffer<P, Vec<u8>>, QrError>
where
    P: Pixel<Subpixel = u8>,
{
    if box_size == 0 {
        return Err(QrError::InvalidBoxSize(box_size));
    }

    let img_size = canvas_size(matrix.width(), box_size);
    let mut img = ImageBuffer::from_pixel(img_size, img_size, light);

    for y in 0..matrix.width() {
        for x in 0..matrix.width() {
            if !matrix.is_dark(x, y) {
                continue;
            }
            let left = (x + QUIET_ZONE) * box_size;
            let top = (y + QUIET_ZONE) * box_size;
            for dy in 0..box_size {
                for dx in 0..box_size {
                    img.put_pixel(left + dx, top + dy, dark);
                }
            }
        }
    }

    Ok(img)
}
