//! Image preprocessing ahead of palette quantization.
//!
//! - [`resize_longest_side`]: Lanczos3 scaling of the longer side, color and
//!   alpha resampled separately
//! - [`Preprocessor`]: the tone pipeline (bilateral denoise, CLAHE,
//!   percentile stretch, gamma, per-palette saturation boost, unsharp mask)
//!
//! Resize happens first so that every tone statistic is gathered at the
//! resolution that is actually dithered.
//!
//! # Example
//!
//! ```
//! use chalk_dither::{resize_longest_side, ColorSpaceMode, Palette, Preprocessor, ToneOptions};
//! use image::{Rgba, RgbaImage};
//!
//! let palette = Palette::chalk();
//! let image = RgbaImage::from_pixel(64, 32, Rgba([180, 40, 90, 255]));
//!
//! let small = resize_longest_side(&image, 16);
//! assert_eq!(small.dimensions(), (16, 8));
//!
//! let toned = Preprocessor::new(&palette, ToneOptions::new(ColorSpaceMode::Lab)).process(&small);
//! assert_eq!(toned.dimensions(), (16, 8));
//! ```

pub(crate) mod filters;
mod options;
mod resize;
mod tone;

pub use options::{BoostMode, ToneOptions};
pub use resize::{fit_longest_side, resize_longest_side};
pub use tone::{Preprocessor, OPAQUE_ALPHA};
