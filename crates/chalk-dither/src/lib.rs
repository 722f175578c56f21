#![allow(clippy::needless_range_loop, clippy::manual_range_contains)]

//! chalk-dither: palette quantization and dithering for fixed chalk colors
//!
//! This library maps RGBA images onto a small, numbered palette (the chalk
//! colors a stamp can be drawn with) and provides the tone preprocessing and
//! dithering methods that make the result readable at low resolution.
//!
//! # Quick Start
//!
//! The [`Ditherer`] builder is the primary entry point:
//!
//! ```
//! use chalk_dither::{DitherAlgorithm, Ditherer, Palette, ToneOptions};
//! use image::{Rgba, RgbaImage};
//!
//! let ditherer = Ditherer::new(Palette::chalk())
//!     .algorithm(DitherAlgorithm::FloydSteinberg)
//!     .tone(ToneOptions::default());
//!
//! let image = RgbaImage::from_pixel(16, 16, Rgba([180, 90, 60, 255]));
//! let out = ditherer.dither(&image).unwrap();
//! assert_eq!(out.dimensions(), (16, 16));
//! ```
//!
//! # Palette Numbers
//!
//! Every [`PaletteEntry`] carries the number written to the stamp file.
//! Two numbers are reserved: [`DYNAMIC_NUMBER`] (5) marks the animated
//! "RGB" chalk and [`BLANK_NUMBER`] (-1) marks pixels to omit. Reserved
//! entries still take part in matching.
//!
//! # Color Spaces
//!
//! Matching runs in one of two spaces, chosen per run with
//! [`ColorSpaceMode`] and passed explicitly to every stage:
//!
//! | Mode | Distance | Notes |
//! |------|----------|-------|
//! | **Rgb** | squared Euclidean sRGB | fast, default |
//! | **Lab** | squared Euclidean 8-bit CIE L\*a\*b\* | closer to perceived difference |
//!
//! LAB values use the 8-bit scale common to imaging libraries:
//! `L·255/100`, `a + 128`, `b + 128` ([`Lab8`]). HSV, used by the
//! saturation boost, uses hue in `0..180` ([`Hsv8`]).
//!
//! # Pipeline
//!
//! ```text
//! RGBA input
//!     |
//!     v
//! [resize]            longest side, Lanczos3 (optional)
//!     |
//!     v
//! [tone]              bilateral -> CLAHE -> stretch -> gamma
//!     |               -> palette saturation boost -> unsharp (optional)
//!     v
//! [dither]            one of DitherAlgorithm::ALL
//!     |
//!     v
//! RGBA output         every visible pixel is a palette color
//! ```
//!
//! Error diffusion works directly on the 8-bit buffer: diffused values are
//! clipped and truncated as they are written, so a pixel later in the scan
//! sees exactly the 8-bit value an image would hold.

pub mod api;
pub mod color;
pub mod dither;
pub mod palette;
pub mod preprocess;


pub use api::{DitherError, Ditherer};
pub use color::{ColorSpaceMode, Hsv8, Lab8, Rgb8};
pub use dither::{
    DitherAlgorithm, DitherOptions, Kernel, ATKINSON, DEFAULT_CLUSTERS, FLOYD_STEINBERG,
    JARVIS_JUDICE_NINKE, SIERRA_TWO_ROW, STUCKI,
};
pub use self::palette::{
    closest_color, closest_colors, ColorMatcher, Palette, PaletteEntry, PaletteError,
    ParseColorError, BLANK_NUMBER, DEFAULT_BOOST, DEFAULT_THRESHOLD, DYNAMIC_NUMBER,
};
pub use preprocess::{
    fit_longest_side, resize_longest_side, BoostMode, Preprocessor, ToneOptions, OPAQUE_ALPHA,
};
