//! 8-bit scaled CIE L\*a\*b\*
//!
//! Conversion goes through the `palette` crate (D65 white point, sRGB
//! companding) and is then rescaled: `L8 = L*·255/100`, `a8 = a*+128`,
//! `b8 = b*+128`. Values are kept as floats so that matching distances do
//! not pick up an extra quantization step.

use ::palette::{FromColor, Lab, Srgb};

use super::Rgb8;

/// A color in 8-bit scaled CIE L\*a\*b\* space.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Lab8 {
    /// Lightness, 0.0..=255.0
    pub l: f32,
    /// Green-red axis, offset by 128
    pub a: f32,
    /// Blue-yellow axis, offset by 128
    pub b: f32,
}

const L_SCALE: f32 = 255.0 / 100.0;
const AB_OFFSET: f32 = 128.0;

impl Lab8 {
    #[inline]
    pub const fn new(l: f32, a: f32, b: f32) -> Self {
        Self { l, a, b }
    }

    pub fn from_rgb(rgb: Rgb8) -> Self {
        let srgb = Srgb::new(rgb.r, rgb.g, rgb.b).into_format::<f32>();
        let lab: Lab = Lab::from_color(srgb);
        Self {
            l: lab.l * L_SCALE,
            a: lab.a + AB_OFFSET,
            b: lab.b + AB_OFFSET,
        }
    }

    /// Convert back to sRGB, clipping out-of-gamut results.
    pub fn to_rgb(self) -> Rgb8 {
        let lab: Lab = Lab::new(self.l / L_SCALE, self.a - AB_OFFSET, self.b - AB_OFFSET);
        let srgb = Srgb::from_color(lab);
        Rgb8::new(
            unit_to_u8(srgb.red),
            unit_to_u8(srgb.green),
            unit_to_u8(srgb.blue),
        )
    }

    #[inline]
    pub fn to_array(self) -> [f32; 3] {
        [self.l, self.a, self.b]
    }

    #[inline]
    pub fn from_array(c: [f32; 3]) -> Self {
        Self::new(c[0], c[1], c[2])
    }

    /// Clip every channel to 0.0..=255.0.
    #[inline]
    pub fn clipped(self) -> Self {
        Self::new(
            self.l.clamp(0.0, 255.0),
            self.a.clamp(0.0, 255.0),
            self.b.clamp(0.0, 255.0),
        )
    }
}

#[inline]
fn unit_to_u8(v: f32) -> u8 {
    if v.is_nan() {
        return 0;
    }
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_black_and_white_extremes() {
        let black = Lab8::from_rgb(Rgb8::new(0, 0, 0));
        assert!(black.l.abs() < 0.05);
        let white = Lab8::from_rgb(Rgb8::new(255, 255, 255));
        assert!((white.l - 255.0).abs() < 0.05);
    }

    #[test]
    fn test_round_trip_palette_colors() {
        for hex in ["ffe7c5", "2a3844", "d70b5d", "0db39e", "f4c009", "bac357"] {
            let rgb: Rgb8 = hex.parse().unwrap();
            assert_eq!(Lab8::from_rgb(rgb).to_rgb(), rgb, "round trip of {hex}");
        }
    }

    #[test]
    fn test_out_of_gamut_is_clipped() {
        let hot = Lab8::new(255.0, 255.0, 0.0).to_rgb();
        assert_eq!(hot.r, 255);
        let dark = Lab8::new(0.0, 128.0, 128.0).to_rgb();
        assert_eq!(dark, Rgb8::new(0, 0, 0));
    }

    #[test]
    fn test_red_has_positive_a() {
        let red = Lab8::from_rgb(Rgb8::new(255, 0, 0));
        assert!(red.a > 128.0 + 50.0, "a8 of red: {}", red.a);
    }
}
