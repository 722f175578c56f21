use std::io::Cursor;
use std::path::Path;

use image::codecs::gif::GifDecoder;
use image::codecs::png::PngDecoder;
use image::codecs::webp::WebPDecoder;
use image::{AnimationDecoder, ImageError, ImageFormat, RgbaImage};

use crate::error::StampError;

/// Delay used for frames that declare none.
pub const DEFAULT_FRAME_DELAY_MS: u32 = 100;

/// One frame of an animation with its display time
#[derive(Debug, Clone, PartialEq)]
pub struct AnimationFrame {
    pub image: RgbaImage,
    pub delay_ms: u32,
}

/// A decoded input, either a single image or an animation of two or more frames
#[derive(Debug, Clone, PartialEq)]
pub enum DecodedImage {
    Static(RgbaImage),
    Animated(Vec<AnimationFrame>),
}

impl DecodedImage {
    pub fn is_animated(&self) -> bool {
        matches!(self, DecodedImage::Animated(_))
    }

    pub fn dimensions(&self) -> (u32, u32) {
        match self {
            DecodedImage::Static(image) => image.dimensions(),
            DecodedImage::Animated(frames) => frames
                .first()
                .map(|f| f.image.dimensions())
                .unwrap_or((0, 0)),
        }
    }
}

fn decode_err(e: ImageError) -> StampError {
    StampError::Decode(e.to_string())
}

/// Read and decode an image file
pub fn decode_path(path: &Path) -> Result<DecodedImage, StampError> {
    let bytes = std::fs::read(path)
        .map_err(|e| StampError::Decode(format!("cannot read {}: {e}", path.display())))?;
    let decoded = decode_bytes(&bytes)?;
    let (width, height) = decoded.dimensions();
    tracing::info!(
        path = %path.display(),
        width,
        height,
        animated = decoded.is_animated(),
        "Decoded input"
    );
    Ok(decoded)
}

/// Decode an in-memory image.
///
/// GIF, APNG and animated WebP become [`DecodedImage::Animated`] when they
/// hold more than one frame; everything else is a single RGBA image.
pub fn decode_bytes(bytes: &[u8]) -> Result<DecodedImage, StampError> {
    let format = image::guess_format(bytes).map_err(decode_err)?;
    let frames = match format {
        ImageFormat::Gif => {
            let decoder = GifDecoder::new(Cursor::new(bytes)).map_err(decode_err)?;
            Some(collect_frames(decoder)?)
        }
        ImageFormat::Png => {
            let decoder = PngDecoder::new(Cursor::new(bytes)).map_err(decode_err)?;
            if decoder.is_apng().map_err(decode_err)? {
                Some(collect_frames(decoder.apng().map_err(decode_err)?)?)
            } else {
                None
            }
        }
        ImageFormat::WebP => {
            let decoder = WebPDecoder::new(Cursor::new(bytes)).map_err(decode_err)?;
            if decoder.has_animation() {
                Some(collect_frames(decoder)?)
            } else {
                None
            }
        }
        _ => None,
    };

    match frames {
        Some(frames) if frames.len() > 1 => Ok(DecodedImage::Animated(frames)),
        Some(mut frames) if frames.len() == 1 => Ok(DecodedImage::Static(frames.remove(0).image)),
        Some(_) => Err(StampError::Decode("animation has no frames".into())),
        None => {
            let image = image::load_from_memory_with_format(bytes, format).map_err(decode_err)?;
            Ok(DecodedImage::Static(image.into_rgba8()))
        }
    }
}

fn collect_frames<'a>(decoder: impl AnimationDecoder<'a>) -> Result<Vec<AnimationFrame>, StampError> {
    let frames = decoder.into_frames().collect_frames().map_err(decode_err)?;
    Ok(frames
        .into_iter()
        .map(|frame| {
            let (numer, denom) = frame.delay().numer_denom_ms();
            let delay_ms = if denom == 0 { numer } else { numer / denom };
            AnimationFrame {
                image: frame.into_buffer(),
                delay_ms: if delay_ms == 0 { DEFAULT_FRAME_DELAY_MS } else { delay_ms },
            }
        })
        .collect())
}
