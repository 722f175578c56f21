//! Nearest-color matching against a [`Palette`].
//!
//! Two entry points share one distance kernel:
//!
//! - [`closest_color`] / [`ColorMatcher::nearest`] for a single pixel,
//!   used inside the sequential dithering loops.
//! - [`closest_colors`] / [`ColorMatcher::nearest_all`] for a whole image,
//!   processed row-parallel with the palette projection computed once.
//!
//! Both compare squared Euclidean distances with a strict `<`, so ties keep
//! the earliest palette entry and the two paths agree pixel-for-pixel.

use image::RgbaImage;
use rayon::prelude::*;

use super::palette::Palette;
use crate::color::{distance_sq, ColorSpaceMode, Rgb8};

/// Palette projected into the matching space, ready for repeated lookups.
#[derive(Debug, Clone)]
pub struct ColorMatcher {
    mode: ColorSpaceMode,
    points: Vec<[f32; 3]>,
}

impl ColorMatcher {
    pub fn new(palette: &Palette, mode: ColorSpaceMode) -> Self {
        Self {
            mode,
            points: palette.points(mode),
        }
    }

    #[inline]
    pub fn mode(&self) -> ColorSpaceMode {
        self.mode
    }

    /// Index of the palette entry nearest to `rgb`.
    #[inline]
    pub fn nearest(&self, rgb: Rgb8) -> usize {
        self.nearest_point(self.mode.project(rgb))
    }

    /// Index of the palette entry nearest to a point already in matching space.
    #[inline]
    pub fn nearest_point(&self, point: [f32; 3]) -> usize {
        let mut best = 0;
        let mut best_dist = f32::INFINITY;
        for (i, &candidate) in self.points.iter().enumerate() {
            let d = distance_sq(point, candidate);
            if d < best_dist {
                best_dist = d;
                best = i;
            }
        }
        best
    }

    /// Nearest palette index for every pixel of `image`, row-major.
    ///
    /// Alpha is ignored; callers decide what to do with transparent pixels.
    pub fn nearest_all(&self, image: &RgbaImage) -> Vec<usize> {
        let width = image.width() as usize;
        if width == 0 {
            return Vec::new();
        }
        let raw: &[u8] = image.as_raw();
        let mut out = vec![0usize; raw.len() / 4];
        out.par_chunks_mut(width)
            .zip(raw.par_chunks(width * 4))
            .for_each(|(dst, row)| {
                for (slot, px) in dst.iter_mut().zip(row.chunks_exact(4)) {
                    *slot = self.nearest(Rgb8::new(px[0], px[1], px[2]));
                }
            });
        out
    }
}

/// Output number of the palette entry nearest to `rgb`.
///
/// ```
/// use chalk_dither::{closest_color, ColorSpaceMode, Palette, Rgb8};
///
/// let palette = Palette::from_hex(&[(0, "#000000"), (1, "#ffffff")]).unwrap();
/// let n = closest_color(Rgb8::new(200, 200, 200), &palette, ColorSpaceMode::Rgb);
/// assert_eq!(n, 1);
/// ```
pub fn closest_color(rgb: Rgb8, palette: &Palette, mode: ColorSpaceMode) -> i32 {
    let idx = ColorMatcher::new(palette, mode).nearest(rgb);
    palette.number(idx)
}

/// Output numbers of the nearest palette entry for every pixel, row-major.
pub fn closest_colors(image: &RgbaImage, palette: &Palette, mode: ColorSpaceMode) -> Vec<i32> {
    ColorMatcher::new(palette, mode)
        .nearest_all(image)
        .into_iter()
        .map(|idx| palette.number(idx))
        .collect()
}
