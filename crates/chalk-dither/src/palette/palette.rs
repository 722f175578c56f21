//! Palette entries and the validated [`Palette`] collection.
//!
//! An entry pairs a chalk color with the number the game uses for it, plus
//! the per-color saturation tuning used by the tone preprocessor. The
//! palette precomputes each entry's LAB value once so that matching in LAB
//! mode never converts palette colors per pixel.

use std::collections::HashSet;

use super::error::PaletteError;
use crate::color::{ColorSpaceMode, Lab8, Rgb8};

/// Output number marking the dynamic (animated rainbow) chalk.
pub const DYNAMIC_NUMBER: i32 = 5;

/// Output number marking pixels the game should leave blank.
pub const BLANK_NUMBER: i32 = -1;

/// Default saturation boost applied around a palette color.
pub const DEFAULT_BOOST: f32 = 1.2;

/// Default masking threshold for the saturation boost.
pub const DEFAULT_THRESHOLD: f32 = 20.0;

/// One chalk color.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PaletteEntry {
    /// Number written to the stamp file for pixels of this color.
    pub number: i32,
    pub rgb: Rgb8,
    /// Saturation multiplier for pixels near this color.
    pub boost: f32,
    /// Distance (LAB) or hue difference (HSV) defining "near".
    pub threshold: f32,
}

impl PaletteEntry {
    /// Create an entry with default boost and threshold.
    pub fn new(number: i32, rgb: Rgb8) -> Self {
        Self {
            number,
            rgb,
            boost: DEFAULT_BOOST,
            threshold: DEFAULT_THRESHOLD,
        }
    }

    /// Create an entry from a hex color string.
    ///
    /// ```
    /// use chalk_dither::PaletteEntry;
    ///
    /// let entry = PaletteEntry::from_hex(2, "#d70b5d").unwrap();
    /// assert_eq!(entry.rgb.r, 0xd7);
    /// ```
    pub fn from_hex(number: i32, hex: &str) -> Result<Self, PaletteError> {
        Ok(Self::new(number, hex.parse()?))
    }

    #[inline]
    pub fn with_boost(mut self, boost: f32) -> Self {
        self.boost = boost;
        self
    }

    #[inline]
    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.threshold = threshold;
        self
    }

    #[inline]
    pub fn is_dynamic(&self) -> bool {
        self.number == DYNAMIC_NUMBER
    }

    #[inline]
    pub fn is_blank(&self) -> bool {
        self.number == BLANK_NUMBER
    }
}

/// A non-empty list of chalk colors with distinct numbers.
///
/// Entry order matters: matching ties always resolve to the earliest entry.
#[derive(Debug, Clone, PartialEq)]
pub struct Palette {
    entries: Vec<PaletteEntry>,
    lab: Vec<[f32; 3]>,
}

impl Palette {
    /// Validate entries and build a palette.
    ///
    /// # Errors
    ///
    /// - [`PaletteError::EmptyPalette`] if `entries` is empty
    /// - [`PaletteError::DuplicateNumber`] if two entries share a number
    /// - [`PaletteError::InvalidTuning`] if a boost or threshold is NaN or infinite
    pub fn new(entries: Vec<PaletteEntry>) -> Result<Self, PaletteError> {
        if entries.is_empty() {
            return Err(PaletteError::EmptyPalette);
        }

        let mut seen = HashSet::new();
        for (index, entry) in entries.iter().enumerate() {
            if !seen.insert(entry.number) {
                return Err(PaletteError::DuplicateNumber {
                    number: entry.number,
                    index,
                });
            }
            if !entry.boost.is_finite() || !entry.threshold.is_finite() {
                return Err(PaletteError::InvalidTuning {
                    number: entry.number,
                });
            }
        }

        let lab = entries
            .iter()
            .map(|e| Lab8::from_rgb(e.rgb).to_array())
            .collect();

        Ok(Self { entries, lab })
    }

    /// Build a palette from `(number, hex)` pairs with default tuning.
    pub fn from_hex(pairs: &[(i32, &str)]) -> Result<Self, PaletteError> {
        let entries = pairs
            .iter()
            .map(|&(number, hex)| PaletteEntry::from_hex(number, hex))
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(entries)
    }

    /// The default chalk set shipped with the game.
    pub fn chalk() -> Self {
        let entries: Vec<PaletteEntry> = CHALK_COLORS
            .iter()
            .map(|&(number, rgb)| PaletteEntry::new(number, Rgb8::from_bytes(rgb)))
            .collect();
        let lab = entries
            .iter()
            .map(|e| Lab8::from_rgb(e.rgb).to_array())
            .collect();
        Self { entries, lab }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[inline]
    pub fn entries(&self) -> &[PaletteEntry] {
        &self.entries
    }

    #[inline]
    pub fn entry(&self, idx: usize) -> &PaletteEntry {
        &self.entries[idx]
    }

    #[inline]
    pub fn rgb(&self, idx: usize) -> Rgb8 {
        self.entries[idx].rgb
    }

    #[inline]
    pub fn number(&self, idx: usize) -> i32 {
        self.entries[idx].number
    }

    /// Precomputed 8-bit LAB value of an entry.
    #[inline]
    pub fn lab(&self, idx: usize) -> [f32; 3] {
        self.lab[idx]
    }

    /// Entry coordinates in the space `mode` measures distances in.
    pub fn points(&self, mode: ColorSpaceMode) -> Vec<[f32; 3]> {
        match mode {
            ColorSpaceMode::Rgb => self.entries.iter().map(|e| e.rgb.to_f32()).collect(),
            ColorSpaceMode::Lab => self.lab.clone(),
        }
    }

    /// Index of the first entry painted with exactly `rgb`.
    pub fn index_of_rgb(&self, rgb: Rgb8) -> Option<usize> {
        self.entries.iter().position(|e| e.rgb == rgb)
    }
}

const CHALK_COLORS: [(i32, [u8; 3]); 6] = [
    (0, [0xff, 0xe7, 0xc5]),
    (1, [0x2a, 0x38, 0x44]),
    (2, [0xd7, 0x0b, 0x5d]),
    (3, [0x0d, 0xb3, 0x9e]),
    (4, [0xf4, 0xc0, 0x09]),
    (6, [0xba, 0xc3, 0x57]),
];
