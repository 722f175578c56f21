//! Aspect-preserving Lanczos resize.
//!
//! Color and alpha are resampled as separate planes so that Lanczos ringing
//! on the alpha edge never bleeds dark fringe colors into opaque pixels.

use image::imageops::{self, FilterType};
use image::{GrayImage, Luma, Rgb, RgbImage, RgbaImage};

/// Target dimensions when the longer side is scaled to `target`.
///
/// Each side is `max(1, floor(side · scale))`.
pub fn fit_longest_side(width: u32, height: u32, target: u32) -> (u32, u32) {
    let longest = width.max(height);
    if longest == 0 || target == 0 {
        return (width, height);
    }
    let scale = f64::from(target) / f64::from(longest);
    let w = ((f64::from(width) * scale).floor() as u32).max(1);
    let h = ((f64::from(height) * scale).floor() as u32).max(1);
    (w, h)
}

/// Resize so the longer side equals `target`, using Lanczos3.
///
/// Returns a copy when the size would not change.
pub fn resize_longest_side(image: &RgbaImage, target: u32) -> RgbaImage {
    let (width, height) = image.dimensions();
    let (new_w, new_h) = fit_longest_side(width, height, target);
    if (new_w, new_h) == (width, height) {
        return image.clone();
    }

    let rgb = RgbImage::from_fn(width, height, |x, y| {
        let p = image.get_pixel(x, y);
        Rgb([p[0], p[1], p[2]])
    });
    let alpha = GrayImage::from_fn(width, height, |x, y| Luma([image.get_pixel(x, y)[3]]));

    let rgb = imageops::resize(&rgb, new_w, new_h, FilterType::Lanczos3);
    let alpha = imageops::resize(&alpha, new_w, new_h, FilterType::Lanczos3);

    RgbaImage::from_fn(new_w, new_h, |x, y| {
        let c = rgb.get_pixel(x, y);
        let a = alpha.get_pixel(x, y)[0];
        image::Rgba([c[0], c[1], c[2], a])
    })
}
