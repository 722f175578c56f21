use image::imageops::{self, FilterType};
use image::{GrayImage, Luma, Rgba, RgbaImage};

use crate::error::StampError;

/// Raw foreground probability per pixel, as produced by a segmentation model
#[derive(Debug, Clone, PartialEq)]
pub struct MaskMap {
    width: u32,
    height: u32,
    values: Vec<f32>,
}

impl MaskMap {
    pub fn new(width: u32, height: u32, values: Vec<f32>) -> Result<Self, StampError> {
        if values.len() != width as usize * height as usize || values.is_empty() {
            return Err(StampError::Validation(format!(
                "mask of {} values does not fit {width}x{height}",
                values.len()
            )));
        }
        Ok(Self {
            width,
            height,
            values,
        })
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn mean(&self) -> f32 {
        self.values.iter().sum::<f32>() / self.values.len() as f32
    }

    pub fn max(&self) -> f32 {
        self.values.iter().copied().fold(f32::NEG_INFINITY, f32::max)
    }
}

/// Source of foreground masks
pub trait BackgroundRemover: Send + Sync {
    fn mask(&self, image: &RgbaImage) -> Result<MaskMap, StampError>;
}

impl<F> BackgroundRemover for F
where
    F: Fn(&RgbaImage) -> Result<MaskMap, StampError> + Send + Sync,
{
    fn mask(&self, image: &RgbaImage) -> Result<MaskMap, StampError> {
        self(image)
    }
}

/// Remover used when no segmentation model is available; always fails
#[derive(Debug, Clone, Copy, Default)]
pub struct NoBackgroundRemover;

impl BackgroundRemover for NoBackgroundRemover {
    fn mask(&self, _image: &RgbaImage) -> Result<MaskMap, StampError> {
        Err(StampError::processing(
            "background removal",
            "no segmentation model configured",
        ))
    }
}

/// Threshold derived from the mask's own statistics.
///
/// `t = max(0.01, min(mean/2, max/2))`, then `max(0.01, 0.9·t − 0.01) / 42`.
pub fn dynamic_threshold(mask: &MaskMap) -> f32 {
    let calculated = (mask.mean() * 0.5).min(mask.max() * 0.5).max(0.01);
    (calculated * 0.9 - 0.01).max(0.01) / 42.0
}

/// Cut the background out of `image`.
///
/// Mask values at or above the threshold keep the pixel; the binary mask is
/// resized to the image with Lanczos3 and used to blend the image over
/// transparent white. Any failure is logged and the image returned as is.
pub fn remove_background(
    image: &RgbaImage,
    remover: &dyn BackgroundRemover,
    threshold: Option<f32>,
) -> RgbaImage {
    match try_remove_background(image, remover, threshold) {
        Ok(out) => out,
        Err(e) => {
            tracing::warn!(%e, "Background removal failed, keeping original image");
            image.clone()
        }
    }
}

fn try_remove_background(
    image: &RgbaImage,
    remover: &dyn BackgroundRemover,
    threshold: Option<f32>,
) -> Result<RgbaImage, StampError> {
    let mask = remover.mask(image)?;
    let threshold = threshold.unwrap_or_else(|| dynamic_threshold(&mask));
    tracing::debug!(threshold, mean = mask.mean(), max = mask.max(), "Background mask");

    let (mw, mh) = mask.dimensions();
    let binary = GrayImage::from_fn(mw, mh, |x, y| {
        let v = mask.values[(y * mw + x) as usize];
        Luma([if v >= threshold { 255 } else { 0 }])
    });
    let (w, h) = image.dimensions();
    let binary = if (mw, mh) == (w, h) {
        binary
    } else {
        imageops::resize(&binary, w, h, FilterType::Lanczos3)
    };

    let mut out = image.clone();
    for (px, m) in out.pixels_mut().zip(binary.pixels()) {
        let m = u32::from(m[0]);
        let blend = |bg: u32, fg: u8| ((bg * (255 - m) + u32::from(fg) * m + 127) / 255) as u8;
        *px = Rgba([
            blend(255, px[0]),
            blend(255, px[1]),
            blend(255, px[2]),
            blend(0, px[3]),
        ]);
    }
    Ok(out)
}
