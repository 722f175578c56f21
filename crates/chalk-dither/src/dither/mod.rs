//! Dithering and palette mapping methods.
//!
//! # Methods
//!
//! - **Color Match**: nearest color, no dithering
//! - **K-Means Mapping**: cluster first, then map cluster centroids
//! - **Pattern Dither**: 8×8 Bayer ordered dithering
//! - **Atkinson / Floyd / Stucki / Jarvis / Sierra**: error diffusion
//! - **Hybrid Dither**: Floyd–Steinberg on edges, Atkinson elsewhere
//! - **Random Dither**: Gaussian noise before matching
//!
//! The set is closed: [`DitherAlgorithm`] carries each method's display
//! name, description and default options as data, and [`DitherAlgorithm::apply`]
//! dispatches with a `match`.
//!
//! Every method takes an RGBA buffer and returns a new one of the same size
//! whose visible pixels hold palette colors. Alpha is always preserved.
//!
//! # Example
//!
//! ```
//! use chalk_dither::{DitherAlgorithm, Palette};
//! use image::{Rgba, RgbaImage};
//!
//! let palette = Palette::chalk();
//! let image = RgbaImage::from_pixel(8, 8, Rgba([120, 130, 140, 255]));
//! let algorithm: DitherAlgorithm = "Atkinson Dither".parse().unwrap();
//! let out = algorithm.apply(&image, &palette, &algorithm.default_options()).unwrap();
//! assert_eq!(out.dimensions(), (8, 8));
//! ```

mod color_match;
mod diffusion;
mod kernel;
mod kmeans;
mod options;
mod ordered;
mod random;

use std::fmt;
use std::str::FromStr;

use image::RgbaImage;

use crate::api::DitherError;
use crate::palette::Palette;

pub use color_match::color_match;
pub use diffusion::{error_diffusion, hybrid};
pub use kernel::*;
pub use kmeans::kmeans_mapping;
pub use options::{DitherOptions, DEFAULT_CLUSTERS};
pub use ordered::{ordered, BAYER_8X8};
pub use random::random;

/// Dithering method selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DitherAlgorithm {
    /// Nearest palette color per pixel.
    ColorMatch,

    /// K-means clustering, then nearest palette color per cluster.
    KMeans,

    /// 8×8 Bayer ordered dithering (default strength 0.75).
    Ordered,

    /// Atkinson error diffusion (75% propagation).
    #[default]
    Atkinson,

    /// Floyd–Steinberg error diffusion.
    FloydSteinberg,

    /// Stucki error diffusion.
    Stucki,

    /// Jarvis–Judice–Ninke error diffusion.
    JarvisJudiceNinke,

    /// Sierra two-row error diffusion.
    SierraTwoRow,

    /// Saliency-switched Atkinson / Floyd–Steinberg.
    Hybrid,

    /// Gaussian noise before matching.
    Random,
}

impl DitherAlgorithm {
    /// Every method, in menu order.
    pub const ALL: [DitherAlgorithm; 10] = [
        DitherAlgorithm::ColorMatch,
        DitherAlgorithm::KMeans,
        DitherAlgorithm::Hybrid,
        DitherAlgorithm::Ordered,
        DitherAlgorithm::Atkinson,
        DitherAlgorithm::Stucki,
        DitherAlgorithm::FloydSteinberg,
        DitherAlgorithm::JarvisJudiceNinke,
        DitherAlgorithm::SierraTwoRow,
        DitherAlgorithm::Random,
    ];

    /// Display name.
    pub fn name(self) -> &'static str {
        match self {
            DitherAlgorithm::ColorMatch => "Color Match",
            DitherAlgorithm::KMeans => "K-Means Mapping",
            DitherAlgorithm::Ordered => "Pattern Dither",
            DitherAlgorithm::Atkinson => "Atkinson Dither",
            DitherAlgorithm::FloydSteinberg => "Floyd Dither",
            DitherAlgorithm::Stucki => "Stucki Dither",
            DitherAlgorithm::JarvisJudiceNinke => "Jarvis Dither",
            DitherAlgorithm::SierraTwoRow => "Sierra Dither",
            DitherAlgorithm::Hybrid => "Hybrid Dither",
            DitherAlgorithm::Random => "Random Dither",
        }
    }

    /// Kebab-case identifier used on the command line and in config files.
    pub fn id(self) -> &'static str {
        match self {
            DitherAlgorithm::ColorMatch => "color-match",
            DitherAlgorithm::KMeans => "k-means",
            DitherAlgorithm::Ordered => "pattern",
            DitherAlgorithm::Atkinson => "atkinson",
            DitherAlgorithm::FloydSteinberg => "floyd",
            DitherAlgorithm::Stucki => "stucki",
            DitherAlgorithm::JarvisJudiceNinke => "jarvis",
            DitherAlgorithm::SierraTwoRow => "sierra",
            DitherAlgorithm::Hybrid => "hybrid",
            DitherAlgorithm::Random => "random",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            DitherAlgorithm::ColorMatch => {
                "Maps each pixel to the closest chalk color. Basic, consistent and reliable."
            }
            DitherAlgorithm::KMeans => {
                "Groups similar colors first for cleaner, less noisy results on busy images."
            }
            DitherAlgorithm::Ordered => "Applies an 8x8 Bayer matrix for a regular pattern.",
            DitherAlgorithm::Atkinson => {
                "Light error diffusion suited to small images, as on early Macintosh displays."
            }
            DitherAlgorithm::FloydSteinberg => {
                "Smooth gradients through full error diffusion. Best above ~120 px."
            }
            DitherAlgorithm::Stucki => {
                "Wider diffusion than Floyd-Steinberg for less noisy results."
            }
            DitherAlgorithm::JarvisJudiceNinke => {
                "Diffuses error over a large area. Best above ~120 px."
            }
            DitherAlgorithm::SierraTwoRow => {
                "Two-row Sierra diffusion: smooth gradients at lower cost."
            }
            DitherAlgorithm::Hybrid => {
                "Switches between Atkinson and Floyd-Steinberg depending on local texture."
            }
            DitherAlgorithm::Random => "Adds random noise for a grainier, natural texture.",
        }
    }

    /// Whether the method reads [`DitherOptions::strength`].
    pub fn uses_strength(self) -> bool {
        !matches!(self, DitherAlgorithm::ColorMatch | DitherAlgorithm::KMeans)
    }

    /// Default options for the method (strength 0.75 for the pattern, 1.0
    /// elsewhere; 12 clusters for k-means).
    pub fn default_options(self) -> DitherOptions {
        let options = DitherOptions::new();
        match self {
            DitherAlgorithm::Ordered => options.strength(0.75),
            _ => options,
        }
    }

    /// The fixed diffusion kernel, for the single-kernel methods.
    pub fn kernel(self) -> Option<&'static Kernel> {
        match self {
            DitherAlgorithm::Atkinson => Some(&ATKINSON),
            DitherAlgorithm::FloydSteinberg => Some(&FLOYD_STEINBERG),
            DitherAlgorithm::Stucki => Some(&STUCKI),
            DitherAlgorithm::JarvisJudiceNinke => Some(&JARVIS_JUDICE_NINKE),
            DitherAlgorithm::SierraTwoRow => Some(&SIERRA_TWO_ROW),
            _ => None,
        }
    }

    /// Run the method.
    ///
    /// # Errors
    ///
    /// [`DitherError::InvalidParameter`] for a strength the method cannot use.
    pub fn apply(
        self,
        image: &RgbaImage,
        palette: &Palette,
        options: &DitherOptions,
    ) -> Result<RgbaImage, DitherError> {
        self.apply_until(image, palette, options, &|| false)
    }

    /// Run the method, giving up with [`DitherError::Cancelled`] once `stop`
    /// returns `true`.
    ///
    /// Error diffusion polls `stop` before every row. The other methods work
    /// on the whole buffer at once and poll it only before starting.
    pub fn apply_until(
        self,
        image: &RgbaImage,
        palette: &Palette,
        options: &DitherOptions,
        stop: &dyn Fn() -> bool,
    ) -> Result<RgbaImage, DitherError> {
        if self.uses_strength() && !options.strength.is_finite() {
            return Err(DitherError::InvalidParameter {
                name: "strength",
                value: options.strength,
            });
        }
        if stop() {
            return Err(DitherError::Cancelled);
        }
        tracing::debug!(
            algorithm = self.name(),
            strength = options.strength,
            mode = ?options.mode,
            "Dithering"
        );
        let out = match self {
            DitherAlgorithm::ColorMatch => color_match(image, palette, options),
            DitherAlgorithm::KMeans => kmeans_mapping(image, palette, options),
            DitherAlgorithm::Ordered => ordered(image, palette, options),
            DitherAlgorithm::Atkinson => error_diffusion(image, palette, &ATKINSON, options, stop)?,
            DitherAlgorithm::FloydSteinberg => {
                error_diffusion(image, palette, &FLOYD_STEINBERG, options, stop)?
            }
            DitherAlgorithm::Stucki => error_diffusion(image, palette, &STUCKI, options, stop)?,
            DitherAlgorithm::JarvisJudiceNinke => {
                error_diffusion(image, palette, &JARVIS_JUDICE_NINKE, options, stop)?
            }
            DitherAlgorithm::SierraTwoRow => {
                error_diffusion(image, palette, &SIERRA_TWO_ROW, options, stop)?
            }
            DitherAlgorithm::Hybrid => hybrid(image, palette, options, stop)?,
            DitherAlgorithm::Random => random(image, palette, options)?,
        };
        Ok(out)
    }
}

impl fmt::Display for DitherAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DitherAlgorithm {
    type Err = DitherError;

    /// Accepts the display name or the kebab-case id, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|a| a.name().eq_ignore_ascii_case(wanted) || a.id().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| DitherError::UnknownAlgorithm(wanted.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Rgb8;
    use image::Rgba;

    #[test]
    fn test_registry_is_complete_and_unique() {
        let mut names: Vec<&str> = DitherAlgorithm::ALL.iter().map(|a| a.name()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), DitherAlgorithm::ALL.len());
        for a in DitherAlgorithm::ALL {
            assert!(!a.description().is_empty());
        }
    }

    #[test]
    fn test_parse_names_and_ids() {
        assert_eq!("Floyd Dither".parse::<DitherAlgorithm>().unwrap(), DitherAlgorithm::FloydSteinberg);
        assert_eq!("k-means".parse::<DitherAlgorithm>().unwrap(), DitherAlgorithm::KMeans);
        assert_eq!(" PATTERN ".parse::<DitherAlgorithm>().unwrap(), DitherAlgorithm::Ordered);
        for a in DitherAlgorithm::ALL {
            assert_eq!(a.to_string().parse::<DitherAlgorithm>().unwrap(), a);
        }
        assert!(matches!(
            "blue noise".parse::<DitherAlgorithm>(),
            Err(DitherError::UnknownAlgorithm(_))
        ));
    }

    #[test]
    fn test_default_options() {
        assert_eq!(DitherAlgorithm::Ordered.default_options().strength, 0.75);
        assert_eq!(DitherAlgorithm::Atkinson.default_options().strength, 1.0);
        assert_eq!(DitherAlgorithm::KMeans.default_options().clusters, 12);
    }

    #[test]
    fn test_kernels() {
        assert_eq!(DitherAlgorithm::Atkinson.kernel(), Some(&ATKINSON));
        assert_eq!(DitherAlgorithm::Hybrid.kernel(), None);
    }

    #[test]
    fn test_every_method_preserves_shape_and_alpha() {
        let palette = Palette::chalk();
        let image = RgbaImage::from_fn(9, 7, |x, y| {
            Rgba([(x * 28) as u8, (y * 36) as u8, 100, if x == 0 { 0 } else { 255 }])
        });
        for a in DitherAlgorithm::ALL {
            let options = a.default_options().seed(5);
            let out = a.apply(&image, &palette, &options).unwrap();
            assert_eq!(out.dimensions(), image.dimensions(), "{a}");
            for (o, i) in out.pixels().zip(image.pixels()) {
                assert_eq!(o[3], i[3], "{a}");
                if i[3] == 255 {
                    assert!(
                        palette.index_of_rgb(Rgb8::new(o[0], o[1], o[2])).is_some(),
                        "{a} produced {:?}",
                        o
                    );
                }
            }
        }
    }

    #[test]
    fn test_non_finite_strength_is_rejected() {
        let image = RgbaImage::from_pixel(2, 2, Rgba([1, 2, 3, 255]));
        let options = DitherOptions::new().strength(f32::NAN);
        let result = DitherAlgorithm::Atkinson.apply(&image, &Palette::chalk(), &options);
        assert!(matches!(result, Err(DitherError::InvalidParameter { .. })));
        // Methods without a strength ignore it.
        assert!(DitherAlgorithm::ColorMatch.apply(&image, &Palette::chalk(), &options).is_ok());
    }

    #[test]
    fn test_stopped_run_is_cancelled_for_every_method() {
        let image = RgbaImage::from_pixel(4, 4, Rgba([90, 90, 90, 255]));
        for a in DitherAlgorithm::ALL {
            let result = a.apply_until(&image, &Palette::chalk(), &a.default_options(), &|| true);
            assert!(matches!(result, Err(DitherError::Cancelled)), "{a}");
        }
    }
}
