//! Dithering options and configuration.
//!
//! This module provides the [`DitherOptions`] struct shared by every
//! dithering method.

use crate::color::ColorSpaceMode;

/// Default number of clusters for k-means mapping.
pub const DEFAULT_CLUSTERS: usize = 12;

/// Configuration options for dithering.
///
/// # Defaults
///
/// - Strength: 1.0 (full error or full pattern amplitude)
/// - Mode: RGB matching
/// - Seed: none (random dithering draws from OS entropy)
/// - Clusters: 12
///
/// Algorithm-specific defaults come from
/// [`DitherAlgorithm::default_options`](crate::DitherAlgorithm::default_options).
///
/// # Example
///
/// ```
/// use chalk_dither::{ColorSpaceMode, DitherOptions};
///
/// let options = DitherOptions::new()
///     .strength(0.5)
///     .mode(ColorSpaceMode::Lab)
///     .seed(7);
/// assert_eq!(options.seed, Some(7));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct DitherOptions {
    /// Scale applied to diffused error, pattern amplitude or noise.
    ///
    /// Default: `1.0`
    pub strength: f32,

    /// Color space for matching and noise.
    pub mode: ColorSpaceMode,

    /// RNG seed for random dithering; `None` seeds from entropy.
    pub seed: Option<u64>,

    /// Cluster count for k-means mapping.
    ///
    /// Default: `12`
    pub clusters: usize,
}

impl Default for DitherOptions {
    fn default() -> Self {
        Self {
            strength: 1.0,
            mode: ColorSpaceMode::Rgb,
            seed: None,
            clusters: DEFAULT_CLUSTERS,
        }
    }
}

impl DitherOptions {
    /// Create new dither options with default values.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn strength(mut self, strength: f32) -> Self {
        self.strength = strength;
        self
    }

    #[inline]
    pub fn mode(mut self, mode: ColorSpaceMode) -> Self {
        self.mode = mode;
        self
    }

    #[inline]
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    #[inline]
    pub fn clusters(mut self, clusters: usize) -> Self {
        self.clusters = clusters;
        self
    }
}
