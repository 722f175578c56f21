//! Ditherer builder, the primary ergonomic entry point for the crate.
//!
//! [`Ditherer`] wraps the engine pipeline (resize, tone preprocessing,
//! dithering) with fluent configuration.

use image::RgbaImage;

use super::DitherError;
use crate::color::ColorSpaceMode;
use crate::dither::{DitherAlgorithm, DitherOptions};
use crate::palette::Palette;
use crate::preprocess::{resize_longest_side, Preprocessor, ToneOptions};

/// High-level dithering builder for chalk palettes.
///
/// # Design
///
/// - Constructor requires a validated [`Palette`]
/// - Configuration methods consume and return `self`
/// - [`dither()`](Self::dither) takes `&self`, so one builder serves every
///   frame of an animation
/// - [`algorithm()`](Self::algorithm) resets strength and cluster count to
///   the method's defaults; later calls override them
///
/// # Example
///
/// ```
/// use chalk_dither::{DitherAlgorithm, Ditherer, Palette};
/// use image::{Rgba, RgbaImage};
///
/// let ditherer = Ditherer::new(Palette::chalk())
///     .algorithm(DitherAlgorithm::Ordered)
///     .resize(4);
///
/// let image = RgbaImage::from_pixel(8, 6, Rgba([90, 120, 150, 255]));
/// let out = ditherer.dither(&image).unwrap();
/// assert_eq!(out.dimensions(), (4, 3));
/// ```
#[derive(Debug, Clone)]
pub struct Ditherer {
    palette: Palette,
    algorithm: DitherAlgorithm,
    options: DitherOptions,
    tone: Option<ToneOptions>,
    resize: Option<u32>,
}

impl Ditherer {
    /// Create a ditherer with the default method (Atkinson), RGB matching,
    /// no resize and no tone preprocessing.
    pub fn new(palette: Palette) -> Self {
        let algorithm = DitherAlgorithm::default();
        Self {
            palette,
            algorithm,
            options: algorithm.default_options(),
            tone: None,
            resize: None,
        }
    }

    /// Set the dithering method and apply its default options.
    ///
    /// Mode and seed are kept.
    #[inline]
    pub fn algorithm(mut self, algorithm: DitherAlgorithm) -> Self {
        let defaults = algorithm.default_options();
        self.algorithm = algorithm;
        self.options.strength = defaults.strength;
        self.options.clusters = defaults.clusters;
        self
    }

    #[inline]
    pub fn strength(mut self, strength: f32) -> Self {
        self.options = self.options.strength(strength);
        self
    }

    /// Set the matching color space for dithering and, if enabled, the tone
    /// preprocessor.
    #[inline]
    pub fn mode(mut self, mode: ColorSpaceMode) -> Self {
        self.options = self.options.mode(mode);
        if let Some(tone) = self.tone.as_mut() {
            tone.mode = mode;
        }
        self
    }

    #[inline]
    pub fn seed(mut self, seed: u64) -> Self {
        self.options = self.options.seed(seed);
        self
    }

    #[inline]
    pub fn clusters(mut self, clusters: usize) -> Self {
        self.options = self.options.clusters(clusters);
        self
    }

    /// Enable tone preprocessing. The options' mode follows the ditherer's.
    #[inline]
    pub fn tone(mut self, mut tone: ToneOptions) -> Self {
        tone.mode = self.options.mode;
        self.tone = Some(tone);
        self
    }

    /// Resize so the longer side equals `target` before anything else.
    #[inline]
    pub fn resize(mut self, target: u32) -> Self {
        self.resize = Some(target);
        self
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    pub fn selected_algorithm(&self) -> DitherAlgorithm {
        self.algorithm
    }

    pub fn options(&self) -> &DitherOptions {
        &self.options
    }

    /// Run resize, tone preprocessing and dithering on one image.
    ///
    /// # Errors
    ///
    /// Propagates [`DitherAlgorithm::apply`] errors. Tone preprocessing
    /// never fails; it logs and passes the image through.
    pub fn dither(&self, image: &RgbaImage) -> Result<RgbaImage, DitherError> {
        self.dither_until(image, &|| false)
    }

    /// [`dither()`](Self::dither) with a stop callback.
    ///
    /// `stop` is polled after resizing, after tone preprocessing and, for
    /// error diffusion, before every row. Once it returns `true` the call
    /// ends with [`DitherError::Cancelled`].
    pub fn dither_until(
        &self,
        image: &RgbaImage,
        stop: &dyn Fn() -> bool,
    ) -> Result<RgbaImage, DitherError> {
        let resized;
        let mut current = image;
        if let Some(target) = self.resize {
            resized = resize_longest_side(image, target);
            current = &resized;
        }
        if stop() {
            return Err(DitherError::Cancelled);
        }

        let toned;
        if let Some(tone) = &self.tone {
            toned = Preprocessor::new(&self.palette, tone.clone()).process(current);
            current = &toned;
        }

        self.algorithm
            .apply_until(current, &self.palette, &self.options, stop)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Rgb8;
    use image::Rgba;

    #[test]
    fn test_algorithm_resets_defaults() {
        let d = Ditherer::new(Palette::chalk())
            .strength(0.2)
            .seed(4)
            .algorithm(DitherAlgorithm::Ordered);
        assert_eq!(d.options().strength, 0.75);
        assert_eq!(d.options().seed, Some(4));
        let d = d.strength(0.5);
        assert_eq!(d.options().strength, 0.5);
    }

    #[test]
    fn test_mode_follows_into_tone() {
        let d = Ditherer::new(Palette::chalk())
            .tone(ToneOptions::default())
            .mode(ColorSpaceMode::Lab);
        assert_eq!(d.tone.as_ref().map(|t| t.mode), Some(ColorSpaceMode::Lab));

        let d = Ditherer::new(Palette::chalk())
            .mode(ColorSpaceMode::Lab)
            .tone(ToneOptions::default());
        assert_eq!(d.tone.as_ref().map(|t| t.mode), Some(ColorSpaceMode::Lab));
    }

    #[test]
    fn test_full_pipeline_outputs_palette_colors() {
        let palette = Palette::chalk();
        let image = RgbaImage::from_fn(20, 10, |x, y| Rgba([(x * 12) as u8, (y * 25) as u8, 90, 255]));
        let d = Ditherer::new(palette.clone())
            .algorithm(DitherAlgorithm::FloydSteinberg)
            .tone(ToneOptions::default())
            .resize(10);
        let out = d.dither(&image).unwrap();
        assert_eq!(out.dimensions(), (10, 5));
        for px in out.pixels() {
            assert!(palette.index_of_rgb(Rgb8::new(px[0], px[1], px[2])).is_some());
        }
    }

    #[test]
    fn test_dither_until_stops_between_rows() {
        let d = Ditherer::new(Palette::chalk()).algorithm(DitherAlgorithm::Stucki);
        let image = RgbaImage::from_pixel(16, 16, Rgba([120, 60, 200, 255]));
        let polls = std::cell::Cell::new(0);
        let stop = || {
            polls.set(polls.get() + 1);
            polls.get() > 6
        };
        assert!(matches!(d.dither_until(&image, &stop), Err(DitherError::Cancelled)));
        assert_eq!(polls.get(), 7);
        assert!(d.dither_until(&image, &|| false).is_ok());
    }

    #[test]
    fn test_builder_is_reusable() {
        let d = Ditherer::new(Palette::chalk()).algorithm(DitherAlgorithm::Hybrid);
        let image = RgbaImage::from_pixel(6, 6, Rgba([200, 40, 90, 255]));
        assert_eq!(d.dither(&image).unwrap(), d.dither(&image).unwrap());
    }
}
