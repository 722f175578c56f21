//! Ordered (Bayer 8×8) pattern dithering.
//!
//! Every pixel is pushed brighter or darker by a fixed fraction depending on
//! whether it sits above or below the matrix threshold at its position, then
//! matched to the palette. No error is carried between pixels.

use image::RgbaImage;

use super::options::DitherOptions;
use crate::color::{ColorSpaceMode, Lab8, Rgb8};
use crate::palette::{ColorMatcher, Palette};

/// Classic recursive Bayer matrix; thresholds are `value / 64`.
pub const BAYER_8X8: [[u8; 8]; 8] = [
    [0, 32, 8, 40, 2, 34, 10, 42],
    [48, 16, 56, 24, 50, 18, 58, 26],
    [12, 44, 4, 36, 14, 46, 6, 38],
    [60, 28, 52, 20, 62, 30, 54, 22],
    [3, 35, 11, 43, 1, 33, 9, 41],
    [51, 19, 59, 27, 49, 17, 57, 25],
    [15, 47, 7, 39, 13, 45, 5, 37],
    [63, 31, 55, 23, 61, 29, 53, 21],
];

/// Amplitude of the brightness push at strength 1.
const PATTERN_AMPLITUDE: f32 = 0.3;

pub fn ordered(image: &RgbaImage, palette: &Palette, options: &DitherOptions) -> RgbaImage {
    let matcher = ColorMatcher::new(palette, options.mode);
    let adj = PATTERN_AMPLITUDE * options.strength;

    let mut out = image.clone();
    for (x, y, px) in out.enumerate_pixels_mut() {
        if px[3] == 0 {
            continue;
        }
        let threshold = f32::from(BAYER_8X8[(y % 8) as usize][(x % 8) as usize]) / 64.0;
        let rgb = Rgb8::new(px[0], px[1], px[2]);
        let adjusted = match options.mode {
            ColorSpaceMode::Rgb => {
                let brightness = (f32::from(rgb.r) + f32::from(rgb.g) + f32::from(rgb.b)) / 765.0;
                let factor = if brightness < threshold { 1.0 - adj } else { 1.0 + adj };
                let c = rgb.to_f32();
                Rgb8::from_f32_truncated([c[0] * factor, c[1] * factor, c[2] * factor])
            }
            ColorSpaceMode::Lab => {
                let lab = Lab8::from_rgb(rgb);
                let l = lab.l / 255.0;
                let l = if l < threshold {
                    (l - adj).max(0.0)
                } else {
                    (l + adj).min(1.0)
                };
                Lab8::new(l * 255.0, lab.a, lab.b).to_rgb()
            }
        };
        let new = palette.rgb(matcher.nearest(adjusted));
        px[0] = new.r;
        px[1] = new.g;
        px[2] = new.b;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn bw() -> Palette {
        Palette::from_hex(&[(0, "#000000"), (1, "#ffffff")]).unwrap()
    }

    #[test]
    fn test_bayer_matrix_is_a_permutation() {
        let mut seen = [false; 64];
        for row in BAYER_8X8 {
            for v in row {
                assert!(!seen[v as usize]);
                seen[v as usize] = true;
            }
        }
    }

    #[test]
    fn test_mid_gray_follows_pattern() {
        let image = RgbaImage::from_pixel(8, 8, Rgba([128, 128, 128, 255]));
        let out = ordered(&image, &bw(), &DitherOptions::new().strength(0.75));
        let white = out.pixels().filter(|p| p[0] == 255).count();
        // Brightness 0.502 is at or above thresholds 0/64..=32/64.
        assert_eq!(white, 33);
        assert_eq!(out.get_pixel(0, 0)[0], 255);
        assert_eq!(out.get_pixel(0, 1)[0], 0);
    }

    #[test]
    fn test_zero_strength_is_plain_matching() {
        let image = RgbaImage::from_pixel(8, 8, Rgba([100, 100, 100, 255]));
        let out = ordered(&image, &bw(), &DitherOptions::new().strength(0.0));
        assert!(out.pixels().all(|p| p[0] == 0));
    }

    #[test]
    fn test_lab_mode_output_in_palette() {
        let palette = Palette::chalk();
        let image = RgbaImage::from_fn(16, 16, |x, y| Rgba([(x * 16) as u8, (y * 16) as u8, 128, 255]));
        let out = ordered(&image, &palette, &DitherOptions::new().mode(ColorSpaceMode::Lab));
        for px in out.pixels() {
            assert!(palette.index_of_rgb(Rgb8::new(px[0], px[1], px[2])).is_some());
        }
    }

    #[test]
    fn test_transparent_pixels_untouched() {
        let mut image = RgbaImage::from_pixel(4, 4, Rgba([128, 128, 128, 255]));
        image.put_pixel(1, 1, Rgba([5, 6, 7, 0]));
        let out = ordered(&image, &bw(), &DitherOptions::new());
        assert_eq!(*out.get_pixel(1, 1), Rgba([5, 6, 7, 0]));
    }
}
