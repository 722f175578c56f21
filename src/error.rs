use chalk_dither::{DitherError, PaletteError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StampError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("{operation} failed{}: {detail}", at(.coord))]
    Processing {
        operation: &'static str,
        detail: String,
        coord: Option<(u32, u32)>,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Processing cancelled")]
    Cancelled,
}

fn at(coord: &Option<(u32, u32)>) -> String {
    match coord {
        Some((x, y)) => format!(" at ({x}, {y})"),
        None => String::new(),
    }
}

impl StampError {
    pub fn processing(operation: &'static str, detail: impl Into<String>) -> Self {
        StampError::Processing {
            operation,
            detail: detail.into(),
            coord: None,
        }
    }

    pub fn processing_at(operation: &'static str, detail: impl Into<String>, x: u32, y: u32) -> Self {
        StampError::Processing {
            operation,
            detail: detail.into(),
            coord: Some((x, y)),
        }
    }
}

impl From<PaletteError> for StampError {
    fn from(e: PaletteError) -> Self {
        StampError::Validation(e.to_string())
    }
}

impl From<DitherError> for StampError {
    fn from(e: DitherError) -> Self {
        match e {
            DitherError::InvalidParameter { .. } => StampError::processing("dither", e.to_string()),
            DitherError::Cancelled => StampError::Cancelled,
            _ => StampError::Validation(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_message() {
        let error = StampError::Validation("palette cannot be empty".to_string());
        assert_eq!(error.to_string(), "Validation error: palette cannot be empty");
    }

    #[test]
    fn test_processing_message_with_coordinate() {
        let error = StampError::processing_at("replay delta", "outside frame", 3, 7);
        assert_eq!(error.to_string(), "replay delta failed at (3, 7): outside frame");
    }

    #[test]
    fn test_processing_message_without_coordinate() {
        let error = StampError::processing("dither", "bad strength");
        assert_eq!(error.to_string(), "dither failed: bad strength");
    }

    #[test]
    fn test_cancelled_message() {
        assert_eq!(StampError::Cancelled.to_string(), "Processing cancelled");
    }

    #[test]
    fn test_from_palette_error() {
        let error: StampError = PaletteError::EmptyPalette.into();
        match error {
            StampError::Validation(msg) => assert_eq!(msg, "palette cannot be empty"),
            _ => panic!("Expected Validation variant"),
        }
    }

    #[test]
    fn test_from_dither_error() {
        let error: StampError = DitherError::UnknownAlgorithm("blur".into()).into();
        assert!(matches!(error, StampError::Validation(_)));

        let error: StampError = DitherError::InvalidParameter {
            name: "strength",
            value: f32::NAN,
        }
        .into();
        assert!(matches!(error, StampError::Processing { operation: "dither", .. }));

        let error: StampError = DitherError::Cancelled.into();
        assert!(matches!(error, StampError::Cancelled));
    }

    #[test]
    fn test_from_io_error() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let error: StampError = io.into();
        assert_eq!(error.to_string(), "IO error: gone");
    }
}
