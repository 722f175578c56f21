//! Unified error type for the chalk-dither public API.

use crate::palette::{PaletteError, ParseColorError};
use std::fmt;

/// Unified error type for the chalk-dither public API.
///
/// Wraps every error the crate can produce so application code can
/// propagate them with `?`.
///
/// # Example
///
/// ```
/// use chalk_dither::{DitherError, Palette};
///
/// fn two_tone() -> Result<Palette, DitherError> {
///     let palette = Palette::from_hex(&[(0, "#000000"), (1, "#ffffff")])?;
///     Ok(palette)
/// }
/// assert_eq!(two_tone().unwrap().len(), 2);
/// ```
#[derive(Debug)]
pub enum DitherError {
    /// Palette validation error (empty, duplicate number, bad tuning or color)
    Palette(PaletteError),
    /// Color parsing error (invalid hex string)
    ParseColor(ParseColorError),
    /// A numeric option the selected method cannot work with
    InvalidParameter { name: &'static str, value: f32 },
    /// No method with this name or id
    UnknownAlgorithm(String),
    /// The caller's stop callback asked to abandon the run
    Cancelled,
}

impl fmt::Display for DitherError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DitherError::Palette(err) => write!(f, "palette error: {}", err),
            DitherError::ParseColor(err) => write!(f, "color parse error: {}", err),
            DitherError::InvalidParameter { name, value } => {
                write!(f, "invalid value {} for parameter '{}'", value, name)
            }
            DitherError::UnknownAlgorithm(name) => write!(f, "unknown dithering method '{}'", name),
            DitherError::Cancelled => write!(f, "dithering cancelled"),
        }
    }
}

impl std::error::Error for DitherError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DitherError::Palette(err) => Some(err),
            DitherError::ParseColor(err) => Some(err),
            DitherError::InvalidParameter { .. }
            | DitherError::UnknownAlgorithm(_)
            | DitherError::Cancelled => None,
        }
    }
}

impl From<PaletteError> for DitherError {
    fn from(err: PaletteError) -> Self {
        DitherError::Palette(err)
    }
}

impl From<ParseColorError> for DitherError {
    fn from(err: ParseColorError) -> Self {
        DitherError::ParseColor(err)
    }
}
