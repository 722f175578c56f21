//! Tone preprocessing options.
//!
//! This module provides [`ToneOptions`] and the [`BoostMode`] switch for the
//! per-palette saturation boost.

use crate::color::ColorSpaceMode;

/// How the per-palette saturation boost picks its parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BoostMode {
    /// Use each palette entry's own boost and threshold.
    #[default]
    Manual,
    /// Derive boost (and, for negative thresholds, the threshold) from the
    /// saturation statistics of the pixels near each palette hue.
    ///
    /// Only applies when masking in HSV; LAB masking always uses the
    /// entry's values.
    Adaptive,
}

/// Configuration for the tone preprocessor.
///
/// # Defaults
///
/// - Brightness: automatic (derived from mean lightness)
/// - Fallback brightness: 0.5 (neutral)
/// - Boost mode: manual
/// - Unsharp mask: enabled
///
/// # Example
///
/// ```
/// use chalk_dither::{ColorSpaceMode, ToneOptions};
///
/// let options = ToneOptions::new(ColorSpaceMode::Lab).brightness(0.6);
/// assert_eq!(options.gamma(), 0.8);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ToneOptions {
    /// Color space used for masking and brightness defaults.
    pub mode: ColorSpaceMode,

    /// Brightness adjustment in `[0, 1]`, 0.5 being neutral.
    ///
    /// `None` or an out-of-range value selects automatic brightness.
    pub brightness: Option<f32>,

    /// Adjustment used when automatic brightness cannot be computed.
    ///
    /// Default: `0.5`
    pub default_brightness: f32,

    /// Saturation boost parameter source.
    pub boost_mode: BoostMode,

    /// Apply the final unsharp mask.
    ///
    /// Default: `true`
    pub unsharp: bool,
}

impl Default for ToneOptions {
    fn default() -> Self {
        Self::new(ColorSpaceMode::default())
    }
}

impl ToneOptions {
    pub fn new(mode: ColorSpaceMode) -> Self {
        Self {
            mode,
            brightness: None,
            default_brightness: 0.5,
            boost_mode: BoostMode::Manual,
            unsharp: true,
        }
    }

    #[inline]
    pub fn brightness(mut self, value: f32) -> Self {
        self.brightness = Some(value);
        self
    }

    #[inline]
    pub fn default_brightness(mut self, value: f32) -> Self {
        self.default_brightness = value;
        self
    }

    #[inline]
    pub fn boost_mode(mut self, mode: BoostMode) -> Self {
        self.boost_mode = mode;
        self
    }

    #[inline]
    pub fn unsharp(mut self, enabled: bool) -> Self {
        self.unsharp = enabled;
        self
    }

    /// Gamma of the tone curve: 0.8 for LAB, 0.9 for RGB.
    #[inline]
    pub fn gamma(&self) -> f32 {
        match self.mode {
            ColorSpaceMode::Lab => 0.8,
            ColorSpaceMode::Rgb => 0.9,
        }
    }

    /// Boost threshold for entries that do not carry one: 20 (LAB) or 28 (HSV).
    #[inline]
    pub fn default_threshold(&self) -> f32 {
        match self.mode {
            ColorSpaceMode::Lab => 20.0,
            ColorSpaceMode::Rgb => 28.0,
        }
    }
}
