//! 8-bit RGB color type
//!
//! Palette entries, pixels and stamp colors are all plain 8-bit sRGB
//! triples; [`Rgb8`] adds hex parsing and formatting on top.

use std::fmt;
use std::str::FromStr;

use crate::palette::ParseColorError;

/// An 8-bit sRGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rgb8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb8 {
    #[inline]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Create a color from a byte array [R, G, B].
    #[inline]
    pub const fn from_bytes(bytes: [u8; 3]) -> Self {
        Self::new(bytes[0], bytes[1], bytes[2])
    }

    #[inline]
    pub const fn to_bytes(self) -> [u8; 3] {
        [self.r, self.g, self.b]
    }

    /// Channels as floats in 0.0..=255.0.
    #[inline]
    pub fn to_f32(self) -> [f32; 3] {
        [f32::from(self.r), f32::from(self.g), f32::from(self.b)]
    }

    /// Build a color from float channels, clipping to 0..=255 and truncating.
    ///
    /// Truncation (not rounding) matches how every dithering stage writes
    /// adjusted values back into its 8-bit buffer.
    #[inline]
    pub fn from_f32_truncated(c: [f32; 3]) -> Self {
        Self::new(
            c[0].clamp(0.0, 255.0) as u8,
            c[1].clamp(0.0, 255.0) as u8,
            c[2].clamp(0.0, 255.0) as u8,
        )
    }

    /// Lowercase `rrggbb` without a leading hash.
    pub fn to_hex(self) -> String {
        format!("{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl From<[u8; 3]> for Rgb8 {
    fn from(bytes: [u8; 3]) -> Self {
        Self::from_bytes(bytes)
    }
}

impl fmt::Display for Rgb8 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.to_hex())
    }
}

impl FromStr for Rgb8 {
    type Err = ParseColorError;

    /// Parse a color from `#RRGGBB`, `RRGGBB`, `#RGB` or `RGB`.
    ///
    /// Parsing is case-insensitive and trims surrounding whitespace.
    ///
    /// ```
    /// use chalk_dither::Rgb8;
    ///
    /// let cream: Rgb8 = "ffe7c5".parse().unwrap();
    /// assert_eq!(cream, Rgb8::new(0xff, 0xe7, 0xc5));
    /// ```
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let input = s.trim();
        let digits = input.strip_prefix('#').unwrap_or(input);
        if !digits.is_ascii() || !matches!(digits.len(), 3 | 6) {
            return Err(ParseColorError::BadLength(input.to_string()));
        }

        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&digits[range], 16).map_err(|source| ParseColorError::BadDigit {
                input: input.to_string(),
                source,
            })
        };
        if digits.len() == 3 {
            Ok(Self::new(channel(0..1)? * 17, channel(1..2)? * 17, channel(2..3)? * 17))
        } else {
            Ok(Self::new(channel(0..2)?, channel(2..4)?, channel(4..6)?))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_parsing() {
        assert_eq!("#2a3844".parse::<Rgb8>().unwrap(), Rgb8::new(0x2a, 0x38, 0x44));
        assert_eq!("0DB39E".parse::<Rgb8>().unwrap(), Rgb8::new(0x0d, 0xb3, 0x9e));
        assert_eq!("  #f00 ".parse::<Rgb8>().unwrap(), Rgb8::new(255, 0, 0));
    }

    #[test]
    fn test_hex_parsing_errors() {
        assert!(matches!(
            "#GGG".parse::<Rgb8>(),
            Err(ParseColorError::BadDigit { .. })
        ));
        assert!(matches!(
            "#FFFF".parse::<Rgb8>(),
            Err(ParseColorError::BadLength(_))
        ));
        assert!(matches!("".parse::<Rgb8>(), Err(ParseColorError::BadLength(_))));
        assert!(matches!(
            "ééé".parse::<Rgb8>(),
            Err(ParseColorError::BadLength(_))
        ));
    }

    #[test]
    fn test_display_round_trips_hex() {
        let c = Rgb8::new(0xf4, 0xc0, 0x09);
        assert_eq!(c.to_string(), "#f4c009");
        assert_eq!(c.to_string().parse::<Rgb8>().unwrap(), c);
    }

    #[test]
    fn test_truncation_clips() {
        let c = Rgb8::from_f32_truncated([-3.0, 127.9, 300.0]);
        assert_eq!(c, Rgb8::new(0, 127, 255));
    }
}
