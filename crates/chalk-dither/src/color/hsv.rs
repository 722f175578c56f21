//! 8-bit HSV with a half-degree hue.

use ::palette::{FromColor, Hsv, RgbHue, Srgb};

use super::Rgb8;

/// Hue period of [`Hsv8::h`].
pub(crate) const HUE_PERIOD: f32 = 180.0;

/// HSV color with hue in 0..180 (degrees / 2) and S, V in 0..=255.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Hsv8 {
    pub h: u8,
    pub s: u8,
    pub v: u8,
}

impl Hsv8 {
    pub fn from_rgb(rgb: Rgb8) -> Self {
        let srgb = Srgb::new(rgb.r, rgb.g, rgb.b).into_format::<f32>();
        let hsv: Hsv = Hsv::from_color(srgb);
        let h = (hsv.hue.into_positive_degrees() / 2.0).round() as u32 % 180;
        Self {
            h: h as u8,
            s: (hsv.saturation.clamp(0.0, 1.0) * 255.0).round() as u8,
            v: (hsv.value.clamp(0.0, 1.0) * 255.0).round() as u8,
        }
    }

    pub fn to_rgb(self) -> Rgb8 {
        let hsv = Hsv::new(
            RgbHue::from_degrees(f32::from(self.h) * 2.0),
            f32::from(self.s) / 255.0,
            f32::from(self.v) / 255.0,
        );
        let srgb = Srgb::from_color(hsv);
        Rgb8::new(
            (srgb.red.clamp(0.0, 1.0) * 255.0).round() as u8,
            (srgb.green.clamp(0.0, 1.0) * 255.0).round() as u8,
            (srgb.blue.clamp(0.0, 1.0) * 255.0).round() as u8,
        )
    }
}

/// Circular distance between two half-degree hues.
#[inline]
pub(crate) fn hue_distance(a: f32, b: f32) -> f32 {
    let d = (a - b).abs();
    d.min(HUE_PERIOD - d)
}
