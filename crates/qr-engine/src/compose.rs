//! Logo compositing onto a rendered QR canvas.

use image::{DynamicImage, Rgba, RgbaImage};
use tracing::debug;

use crate::resize::{fit_longest_side, logo_side_for};

/// Top-left offset that centers a `top` box inside a `base` box.
///
/// Integer division rounds toward the top-left when the difference is odd.
pub fn center_offset(base: (u32, u32), top: (u32, u32)) -> (u32, u32) {
    (
        base.0.saturating_sub(top.0) / 2,
        base.1.saturating_sub(top.1) / 2,
    )
}

/// Overlay `top` image onto `base` at the given position.
///
/// Opaque pixels replace the base, translucent pixels are alpha-blended and
/// fully transparent pixels leave the base untouched. Anything falling
/// outside `base` is clipped.
pub fn overlay(base: &mut RgbaImage, top: &DynamicImage, x: u32, y: u32) {
    let top_rgba = top.to_rgba8();
    for (dx, dy, pixel) in top_rgba.enumerate_pixels() {
        let target_x = x + dx;
        let target_y = y + dy;
        if target_x >= base.width() || target_y >= base.height() {
            continue;
        }
        match pixel[3] {
            0 => {}
            255 => base.put_pixel(target_x, target_y, *pixel),
            alpha => {
                let bg = *base.get_pixel(target_x, target_y);
                base.put_pixel(target_x, target_y, blend_pixel(bg, *pixel, alpha));
            }
        }
    }
}

/// Resize `logo` to 1/5 of the canvas width and paste it at the center.
///
/// Returns the offset the logo was pasted at.
pub fn apply_logo(base: &mut RgbaImage, logo: &DynamicImage) -> (u32, u32) {
    let scaled = fit_longest_side(logo, logo_side_for(base.width()));
    let (x, y) = center_offset(base.dimensions(), (scaled.width(), scaled.height()));
    debug!(
        logo_w = scaled.width(),
        logo_h = scaled.height(),
        x,
        y,
        "Pasting logo"
    );
    overlay(base, &scaled, x, y);
    (x, y)
}

fn blend_pixel(bg: Rgba<u8>, fg: Rgba<u8>, alpha: u8) -> Rgba<u8> {
    let a = u16::from(alpha);
    let inv = 255 - a;
    let mix = |f: u8, b: u8| ((u16::from(f) * a + u16::from(b) * inv + 127) / 255) as u8;
    Rgba([mix(fg[0], bg[0]), mix(fg[1], bg[1]), mix(fg[2], bg[2]), 255])
}
