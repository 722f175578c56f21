//! Error types for palette operations
//!
//! Color parsing and palette validation each get their own error so that
//! configuration layers can report exactly which entry was rejected.

use std::fmt;
use std::num::ParseIntError;

/// A hex color string that could not be parsed; carries the rejected input.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseColorError {
    /// Not 3 or 6 ASCII characters after the optional '#'
    BadLength(String),
    /// A character outside `0-9a-fA-F`
    BadDigit { input: String, source: ParseIntError },
}

impl fmt::Display for ParseColorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseColorError::BadLength(input) => {
                write!(f, "'{input}' is not a 3 or 6 digit hex color")
            }
            ParseColorError::BadDigit { input, source } => {
                write!(f, "'{input}' contains a non-hex digit ({source})")
            }
        }
    }
}

impl std::error::Error for ParseColorError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ParseColorError::BadDigit { source, .. } => Some(source),
            ParseColorError::BadLength(_) => None,
        }
    }
}

/// Error type for palette validation.
#[derive(Debug, Clone, PartialEq)]
pub enum PaletteError {
    /// No entries provided
    EmptyPalette,
    /// Two entries share the same output number
    DuplicateNumber {
        /// The repeated number
        number: i32,
        /// Position of the second occurrence
        index: usize,
    },
    /// Boost or threshold is not a finite number
    InvalidTuning {
        /// Number of the offending entry
        number: i32,
    },
    /// Invalid hex color string
    ParseColor(ParseColorError),
}

impl From<ParseColorError> for PaletteError {
    fn from(err: ParseColorError) -> Self {
        PaletteError::ParseColor(err)
    }
}

impl fmt::Display for PaletteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaletteError::EmptyPalette => {
                write!(f, "palette cannot be empty")
            }
            PaletteError::DuplicateNumber { number, index } => {
                write!(f, "duplicate palette number {} at index {}", number, index)
            }
            PaletteError::InvalidTuning { number } => {
                write!(f, "palette entry {} has a non-finite boost or threshold", number)
            }
            PaletteError::ParseColor(err) => {
                write!(f, "invalid color: {}", err)
            }
        }
    }
}

impl std::error::Error for PaletteError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PaletteError::ParseColor(err) => Some(err),
            _ => None,
        }
    }
}
