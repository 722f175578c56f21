//! Error diffusion and the saliency-driven hybrid.
//!
//! The scan is plain raster order. Each visited pixel is replaced by its
//! nearest palette color and `(old − new) · strength` is spread over the
//! kernel's neighbors. Neighbor writes are clipped to 0..=255 and truncated
//! straight back into the 8-bit buffer, so later pixels see exactly what an
//! 8-bit image would hold. Pixels with alpha 0 are frozen: never quantized
//! and never handed error.
//!
//! The `stop` callback is polled once per row; when it returns `true` the
//! scan ends with [`DitherError::Cancelled`].

use image::RgbaImage;

use super::kernel::{Kernel, ATKINSON, FLOYD_STEINBERG};
use super::options::DitherOptions;
use crate::api::DitherError;
use crate::color::Rgb8;
use crate::palette::{ColorMatcher, Palette};
use crate::preprocess::filters::{find_edges, gaussian_blur, luma};

/// Saliency above which the hybrid switches to Floyd–Steinberg.
const HYBRID_SALIENCY_SPLIT: f32 = 0.5;
const SALIENCY_SIGMA: f32 = 1.5;

/// Dither with a single fixed kernel.
pub fn error_diffusion(
    image: &RgbaImage,
    palette: &Palette,
    kernel: &'static Kernel,
    options: &DitherOptions,
    stop: &dyn Fn() -> bool,
) -> Result<RgbaImage, DitherError> {
    diffuse(image, palette, options, stop, |_, _| kernel)
}

/// Per-pixel kernel choice: Floyd–Steinberg on salient (edge-rich) pixels,
/// Atkinson elsewhere.
pub fn hybrid(
    image: &RgbaImage,
    palette: &Palette,
    options: &DitherOptions,
    stop: &dyn Fn() -> bool,
) -> Result<RgbaImage, DitherError> {
    let width = image.width() as usize;
    let saliency = saliency_map(image);
    diffuse(image, palette, options, stop, |x, y| {
        if saliency[y * width + x] > HYBRID_SALIENCY_SPLIT {
            &FLOYD_STEINBERG
        } else {
            &ATKINSON
        }
    })
}

/// Blurred edge magnitude of the luma image, scaled to 0.0..=1.0.
pub(crate) fn saliency_map(image: &RgbaImage) -> Vec<f32> {
    let (w, h) = (image.width() as usize, image.height() as usize);
    let gray: Vec<u8> = image.pixels().map(|p| luma(p[0], p[1], p[2])).collect();
    let edges = find_edges(&gray, w, h);
    gaussian_blur(&edges, w, h, SALIENCY_SIGMA)
        .into_iter()
        .map(|v| v / 255.0)
        .collect()
}

fn diffuse<F>(
    image: &RgbaImage,
    palette: &Palette,
    options: &DitherOptions,
    stop: &dyn Fn() -> bool,
    kernel_at: F,
) -> Result<RgbaImage, DitherError>
where
    F: Fn(usize, usize) -> &'static Kernel,
{
    let (w, h) = (image.width() as usize, image.height() as usize);
    let matcher = ColorMatcher::new(palette, options.mode);
    let frozen: Vec<bool> = image.pixels().map(|p| p[3] == 0).collect();
    let strength = options.strength;

    let mut out = image.clone();
    let buf: &mut [u8] = &mut out;

    for y in 0..h {
        if stop() {
            return Err(DitherError::Cancelled);
        }
        for x in 0..w {
            let i = y * w + x;
            if frozen[i] {
                continue;
            }
            let o = i * 4;
            let old = Rgb8::new(buf[o], buf[o + 1], buf[o + 2]);
            let new = palette.rgb(matcher.nearest(old));
            buf[o..o + 3].copy_from_slice(&new.to_bytes());

            let old = old.to_f32();
            let new = new.to_f32();
            let err = [
                (old[0] - new[0]) * strength,
                (old[1] - new[1]) * strength,
                (old[2] - new[2]) * strength,
            ];

            for (dx, dy, weight) in kernel_at(x, y).taps() {
                let nx = x as isize + dx as isize;
                let ny = y as isize + dy as isize;
                if nx < 0 || nx >= w as isize || ny >= h as isize {
                    continue;
                }
                let ni = ny as usize * w + nx as usize;
                if frozen[ni] {
                    continue;
                }
                let no = ni * 4;
                for c in 0..3 {
                    let v = f32::from(buf[no + c]) + err[c] * weight;
                    buf[no + c] = v.clamp(0.0, 255.0) as u8;
                }
            }
        }
    }
    Ok(out)
}
