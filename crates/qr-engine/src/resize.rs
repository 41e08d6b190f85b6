//! Aspect-ratio-preserving resize for logo overlays.

use image::DynamicImage;
use image::imageops::FilterType;
use tracing::debug;

use crate::LOGO_SCALE_DIVISOR;

/// Target length of the logo's longest side for a canvas of `canvas_width`.
pub fn logo_side_for(canvas_width: u32) -> u32 {
    (canvas_width / LOGO_SCALE_DIVISOR).max(1)
}

/// Resize so the longest side equals `target`, keeping the aspect ratio.
///
/// Uses Lanczos3 filtering. The shorter side is rounded and never drops
/// below one pixel. Returns a clone when the image already fits exactly.
pub fn fit_longest_side(img: &DynamicImage, target: u32) -> DynamicImage {
    let (orig_w, orig_h) = (img.width(), img.height());
    let longest = orig_w.max(orig_h);

    if longest == target {
        debug!(orig_w, orig_h, "Logo already at target size, skipping resize");
        return img.clone();
    }

    let ratio = f64::from(target) / f64::from(longest);
    let scale = |side: u32| ((f64::from(side) * ratio).round() as u32).max(1);
    let (new_w, new_h) = if orig_w >= orig_h {
        (target, scale(orig_h))
    } else {
        (scale(orig_w), target)
    };

    debug!(orig_w, orig_h, new_w, new_h, "Resizing logo");
    img.resize_exact(new_w, new_h, FilterType::Lanczos3)
}
