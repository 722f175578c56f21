//! Tone preprocessor: denoise, equalize, stretch, boost and sharpen.
//!
//! [`Preprocessor::process`] never fails. Any internal problem is logged and
//! the input is returned unchanged so the pipeline can continue with the
//! raw image.
//!
//! # Processing Order
//!
//! 1. Brightness adjustment chosen from the *input* image
//! 2. Bilateral denoise (5×5, σ_color 30, σ_space 30)
//! 3. CLAHE on lightness (clip 4.0, 8×8 tiles), then lightness × 2·adj
//! 4. Per-channel 1st/99th percentile stretch over opaque pixels
//! 5. Gamma curve (0.8 LAB, 0.9 RGB)
//! 6. Saturation boost around every palette color
//! 7. Unsharp mask (σ 1.0, amount 3)
//! 8. Non-opaque pixels get their original RGB back; alpha never changes

use std::fmt;

use image::RgbaImage;

use super::filters::{bilateral, clahe, gaussian_blur, percentile_from_histogram, rgb_planes};
use super::options::{BoostMode, ToneOptions};
use crate::color::{distance_sq, hue_distance, ColorSpaceMode, Hsv8, Lab8, Rgb8};
use crate::palette::{Palette, PaletteEntry};

/// Pixels with at least this alpha count as opaque for statistics and
/// keep the processed color.
pub const OPAQUE_ALPHA: u8 = 191;

const BILATERAL_RADIUS: usize = 2;
const BILATERAL_SIGMA_COLOR: f32 = 30.0;
const BILATERAL_SIGMA_SPACE: f32 = 30.0;
const CLAHE_CLIP: f32 = 4.0;
const CLAHE_GRID: usize = 8;
const UNSHARP_SIGMA: f32 = 1.0;
const UNSHARP_AMOUNT: f32 = 3.0;

#[derive(Debug, Clone, PartialEq)]
enum ToneError {
    EmptyImage,
    NonFinite(&'static str),
}

impl fmt::Display for ToneError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ToneError::EmptyImage => write!(f, "image has no pixels"),
            ToneError::NonFinite(what) => write!(f, "{} is not a finite number", what),
        }
    }
}

/// Palette-aware tone preprocessor.
///
/// # Example
///
/// ```
/// use chalk_dither::{ColorSpaceMode, Palette, Preprocessor, ToneOptions};
/// use image::{Rgba, RgbaImage};
///
/// let palette = Palette::chalk();
/// let pre = Preprocessor::new(&palette, ToneOptions::new(ColorSpaceMode::Rgb));
/// let image = RgbaImage::from_pixel(4, 4, Rgba([120, 80, 60, 255]));
/// let out = pre.process(&image);
/// assert_eq!(out.dimensions(), (4, 4));
/// ```
pub struct Preprocessor<'a> {
    palette: &'a Palette,
    options: ToneOptions,
}

impl<'a> Preprocessor<'a> {
    pub fn new(palette: &'a Palette, options: ToneOptions) -> Self {
        Self { palette, options }
    }

    pub fn options(&self) -> &ToneOptions {
        &self.options
    }

    /// Run the full tone pipeline, falling back to the input on failure.
    pub fn process(&self, image: &RgbaImage) -> RgbaImage {
        match self.try_process(image) {
            Ok(out) => out,
            Err(err) => {
                tracing::warn!(%err, "Tone preprocessing failed, continuing with unprocessed image");
                image.clone()
            }
        }
    }

    fn try_process(&self, image: &RgbaImage) -> Result<RgbaImage, ToneError> {
        let (w, h) = (image.width() as usize, image.height() as usize);
        if w == 0 || h == 0 {
            return Err(ToneError::EmptyImage);
        }

        let adj = self.brightness_adjustment(image);
        if !adj.is_finite() {
            return Err(ToneError::NonFinite("brightness adjustment"));
        }
        tracing::debug!(adj, mode = ?self.options.mode, "Tone preprocessing");

        let filtered = bilateral(image, BILATERAL_RADIUS, BILATERAL_SIGMA_COLOR, BILATERAL_SIGMA_SPACE);

        let mut lab: Vec<Lab8> = filtered
            .pixels()
            .map(|p| Lab8::from_rgb(Rgb8::new(p[0], p[1], p[2])))
            .collect();
        let lightness: Vec<u8> = lab
            .iter()
            .map(|c| c.l.round().clamp(0.0, 255.0) as u8)
            .collect();
        let equalized = clahe(&lightness, w, h, CLAHE_CLIP, CLAHE_GRID);
        let gain = adj * 2.0;
        for (c, &l) in lab.iter_mut().zip(&equalized) {
            c.l = (f32::from(l) * gain).clamp(0.0, 255.0).trunc();
        }

        let mut out = filtered;
        for (px, c) in out.pixels_mut().zip(&lab) {
            let rgb = c.to_rgb();
            px[0] = rgb.r;
            px[1] = rgb.g;
            px[2] = rgb.b;
        }

        stretch_percentiles(&mut out);
        apply_lut(&mut out, &gamma_lut(self.options.gamma()));
        self.boost_saturation(&mut out, &lab);
        if self.options.unsharp {
            out = unsharp_mask(&out, UNSHARP_SIGMA, UNSHARP_AMOUNT);
        }

        for (px, src) in out.pixels_mut().zip(image.pixels()) {
            if src[3] < OPAQUE_ALPHA {
                *px = *src;
            }
        }
        Ok(out)
    }

    /// Brightness adjustment for the lightness channel, in `[0, 1]`.
    ///
    /// An explicit in-range value wins. Otherwise LAB mode uses the neutral
    /// 0.5 and RGB mode uses half the mean normalized lightness.
    pub(crate) fn brightness_adjustment(&self, image: &RgbaImage) -> f32 {
        if let Some(b) = self.options.brightness {
            if (0.0..=1.0).contains(&b) {
                return b;
            }
        }
        if self.options.mode.is_lab() {
            return 0.5;
        }

        let count = image.width() as usize * image.height() as usize;
        let total: f64 = image
            .pixels()
            .map(|p| f64::from(Lab8::from_rgb(Rgb8::new(p[0], p[1], p[2])).l))
            .sum();
        let adj = (total / count as f64 / 255.0 / 2.0) as f32;
        if adj.is_finite() {
            adj.clamp(0.0, 1.0)
        } else {
            tracing::warn!(
                fallback = self.options.default_brightness,
                "Automatic brightness failed, using default"
            );
            self.options.default_brightness
        }
    }

    fn boost_saturation(&self, image: &mut RgbaImage, lab: &[Lab8]) {
        let mut hsv: Vec<Hsv8> = image
            .pixels()
            .map(|p| Hsv8::from_rgb(Rgb8::new(p[0], p[1], p[2])))
            .collect();
        let mut touched = vec![false; hsv.len()];

        for entry in self.palette.entries() {
            let (boost, mask) = match self.options.mode {
                ColorSpaceMode::Lab => {
                    let target = Lab8::from_rgb(entry.rgb).to_array();
                    let mask: Vec<bool> = lab
                        .iter()
                        .map(|c| distance_sq(c.to_array(), target).sqrt() < entry.threshold)
                        .collect();
                    (entry.boost, mask)
                }
                ColorSpaceMode::Rgb => {
                    let target = f32::from(Hsv8::from_rgb(entry.rgb).h);
                    let hue_diff: Vec<f32> = hsv
                        .iter()
                        .map(|c| hue_distance(f32::from(c.h), target))
                        .collect();
                    let (boost, threshold) = match self.options.boost_mode {
                        BoostMode::Manual => (entry.boost, entry.threshold),
                        BoostMode::Adaptive => adaptive_params(entry, &hue_diff, &hsv),
                    };
                    let mask: Vec<bool> = hue_diff.iter().map(|&d| d < threshold).collect();
                    (boost, mask)
                }
            };

            tracing::debug!(number = entry.number, boost, "Saturation boost");
            for ((c, &hit), t) in hsv.iter_mut().zip(&mask).zip(touched.iter_mut()) {
                if hit {
                    c.s = (f32::from(c.s) * boost).clamp(0.0, 255.0) as u8;
                    *t = true;
                }
            }
        }

        for ((px, c), &t) in image.pixels_mut().zip(&hsv).zip(&touched) {
            if t {
                let rgb = c.to_rgb();
                px[0] = rgb.r;
                px[1] = rgb.g;
                px[2] = rgb.b;
            }
        }
    }
}

/// Boost and threshold derived from the pixels near an entry's hue.
fn adaptive_params(entry: &PaletteEntry, hue_diff: &[f32], hsv: &[Hsv8]) -> (f32, f32) {
    let near: Vec<usize> = hue_diff
        .iter()
        .enumerate()
        .filter(|(_, &d)| d < entry.threshold)
        .map(|(i, _)| i)
        .collect();

    let mean_sat = if near.is_empty() {
        128.0
    } else {
        near.iter().map(|&i| f32::from(hsv[i].s)).sum::<f32>() / near.len() as f32
    };
    let dynamic_boost = if mean_sat < 80.0 {
        1.4
    } else if mean_sat > 150.0 {
        1.1
    } else {
        1.2
    };

    let boost = if entry.boost < 0.0 {
        (1.0 - 0.1 * entry.boost.abs()).max(0.5)
    } else {
        dynamic_boost
    };

    let threshold = if entry.threshold < 0.0 {
        if near.is_empty() {
            35.0
        } else {
            let n = near.len() as f32;
            let mean = near.iter().map(|&i| hue_diff[i]).sum::<f32>() / n;
            let var = near.iter().map(|&i| (hue_diff[i] - mean).powi(2)).sum::<f32>() / n;
            (var.sqrt() * 1.5).clamp(20.0, 35.0)
        }
    } else {
        entry.threshold
    };

    (boost, threshold)
}

/// Stretch each RGB channel so its 1st/99th percentiles over opaque pixels
/// span 0..=255. Channels with a degenerate range are left alone.
fn stretch_percentiles(image: &mut RgbaImage) {
    let mut hists = [[0usize; 256]; 3];
    for px in image.pixels().filter(|p| p[3] >= OPAQUE_ALPHA) {
        for (c, hist) in hists.iter_mut().enumerate() {
            hist[px[c] as usize] += 1;
        }
    }

    let mut luts: [Option<[u8; 256]>; 3] = [None, None, None];
    for (c, hist) in hists.iter().enumerate() {
        let (Some(lo), Some(hi)) = (
            percentile_from_histogram(hist, 1.0),
            percentile_from_histogram(hist, 99.0),
        ) else {
            return;
        };
        if hi > lo {
            let mut lut = [0u8; 256];
            for (i, v) in lut.iter_mut().enumerate() {
                *v = ((i as f32 - lo) * 255.0 / (hi - lo)).clamp(0.0, 255.0) as u8;
            }
            luts[c] = Some(lut);
        }
    }

    for px in image.pixels_mut() {
        for (c, lut) in luts.iter().enumerate() {
            if let Some(lut) = lut {
                px[c] = lut[px[c] as usize];
            }
        }
    }
}

/// 256-entry gamma table: `trunc((i/255)^(1/γ) · 255)`.
pub(crate) fn gamma_lut(gamma: f32) -> [u8; 256] {
    let inv = 1.0 / gamma;
    let mut lut = [0u8; 256];
    for (i, v) in lut.iter_mut().enumerate() {
        *v = ((i as f32 / 255.0).powf(inv) * 255.0).clamp(0.0, 255.0) as u8;
    }
    lut
}

fn apply_lut(image: &mut RgbaImage, lut: &[u8; 256]) {
    for px in image.pixels_mut() {
        for c in 0..3 {
            px[c] = lut[px[c] as usize];
        }
    }
}

/// `rgb·(1+amount) − blur(rgb)·amount`, saturated to 8 bits.
fn unsharp_mask(image: &RgbaImage, sigma: f32, amount: f32) -> RgbaImage {
    let (w, h) = (image.width() as usize, image.height() as usize);
    let planes = rgb_planes(image);
    let blurred: Vec<Vec<f32>> = planes
        .iter()
        .map(|p| gaussian_blur(p, w, h, sigma))
        .collect();

    let mut out = image.clone();
    for (i, px) in out.pixels_mut().enumerate() {
        for c in 0..3 {
            let sharp = planes[c][i] * (1.0 + amount) - blurred[c][i].round() * amount;
            px[c] = sharp.round().clamp(0.0, 255.0) as u8;
        }
    }
    out
}
