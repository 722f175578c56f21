//! Color types and conversion utilities
//!
//! Every pipeline stage works on 8-bit values. LAB and HSV use the 8-bit
//! encodings common to imaging libraries so that thresholds and distances
//! stay in the same numeric range as the palette configuration:
//!
//! | Space | Channels | Range |
//! |-------|----------|-------|
//! | [`Rgb8`] | R, G, B | 0..=255 |
//! | [`Lab8`] | L\*·255/100, a\*+128, b\*+128 | 0..=255 |
//! | [`Hsv8`] | hue/2, S, V | 0..180, 0..=255, 0..=255 |
//!
//! # Example
//!
//! ```
//! use chalk_dither::{Lab8, Rgb8};
//!
//! let pink: Rgb8 = "#d70b5d".parse().unwrap();
//! let lab = Lab8::from_rgb(pink);
//! assert_eq!(lab.to_rgb(), pink);
//! ```

mod hsv;
mod lab;
mod rgb;

pub use hsv::Hsv8;
pub(crate) use hsv::hue_distance;
pub use lab::Lab8;
pub use rgb::Rgb8;

/// Color space used for palette matching, masking and noise.
///
/// Chosen once per run and threaded explicitly through every stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub enum ColorSpaceMode {
    /// Squared Euclidean distance on 8-bit sRGB.
    #[default]
    Rgb,
    /// Squared Euclidean distance on 8-bit CIE L\*a\*b\*.
    Lab,
}

impl ColorSpaceMode {
    /// Map an RGB triple into the space distances are measured in.
    #[inline]
    pub fn project(self, rgb: Rgb8) -> [f32; 3] {
        match self {
            ColorSpaceMode::Rgb => [f32::from(rgb.r), f32::from(rgb.g), f32::from(rgb.b)],
            ColorSpaceMode::Lab => Lab8::from_rgb(rgb).to_array(),
        }
    }

    #[inline]
    pub fn is_lab(self) -> bool {
        matches!(self, ColorSpaceMode::Lab)
    }
}

/// Squared Euclidean distance between two 3-channel points.
#[inline]
pub fn distance_sq(a: [f32; 3], b: [f32; 3]) -> f32 {
    let d0 = a[0] - b[0];
    let d1 = a[1] - b[1];
    let d2 = a[2] - b[2];
    d0 * d0 + d1 * d1 + d2 * d2
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rgb_projection_is_identity() {
        let p = ColorSpaceMode::Rgb.project(Rgb8::new(1, 2, 3));
        assert_eq!(p, [1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_lab_projection_of_white() {
        let p = ColorSpaceMode::Lab.project(Rgb8::new(255, 255, 255));
        assert!((p[0] - 255.0).abs() < 0.05, "L8 of white: {}", p[0]);
        assert!((p[1] - 128.0).abs() < 0.05, "a8 of white: {}", p[1]);
        assert!((p[2] - 128.0).abs() < 0.05, "b8 of white: {}", p[2]);
    }

    #[test]
    fn test_distance_sq() {
        assert_eq!(distance_sq([0.0, 0.0, 0.0], [1.0, 2.0, 2.0]), 9.0);
    }
}
