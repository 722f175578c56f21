use chalk_dither::{closest_colors, ColorSpaceMode, Palette, OPAQUE_ALPHA};
use image::RgbaImage;

use super::{StampDocument, StampHeader, StampPoint};

/// Encode a dithered image as a static stamp.
///
/// Rows are written bottom to top with the y axis flipped, so the first
/// point is the bottom-left pixel at `(0, 0)`. Pixels with alpha at or below
/// 191 are skipped.
pub fn encode_static(image: &RgbaImage, palette: &Palette, mode: ColorSpaceMode) -> StampDocument {
    let (width, height) = image.dimensions();
    let numbers = closest_colors(image, palette, mode);

    let mut points = Vec::new();
    for y in (0..height).rev() {
        for x in 0..width {
            if image.get_pixel(x, y)[3] <= OPAQUE_ALPHA {
                continue;
            }
            let number = numbers[(y * width + x) as usize];
            points.push(StampPoint::new(x, height - 1 - y, number));
        }
    }

    tracing::debug!(width, height, points = points.len(), "Encoded static stamp");
    StampDocument {
        header: StampHeader::Static { width, height },
        points,
    }
}
