//! Palette types and nearest-color matching
//!
//! This module provides the chalk palette model, its validation errors and
//! the matcher every dithering method quantizes through.

mod error;
mod matcher;
mod palette;

pub use error::{PaletteError, ParseColorError};
pub use matcher::{closest_color, closest_colors, ColorMatcher};
pub use self::palette::{
    Palette, PaletteEntry, BLANK_NUMBER, DEFAULT_BOOST, DEFAULT_THRESHOLD, DYNAMIC_NUMBER,
};
