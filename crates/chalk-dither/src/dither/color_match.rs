//! Plain nearest-color mapping without any dithering.

use image::RgbaImage;

use super::options::DitherOptions;
use crate::palette::{ColorMatcher, Palette};
use crate::preprocess::OPAQUE_ALPHA;

/// Map every opaque pixel (alpha above 191) to its nearest palette color.
///
/// Less opaque pixels keep their original color; alpha is never changed.
pub fn color_match(image: &RgbaImage, palette: &Palette, options: &DitherOptions) -> RgbaImage {
    let indices = ColorMatcher::new(palette, options.mode).nearest_all(image);
    let mut out = image.clone();
    for (px, idx) in out.pixels_mut().zip(indices) {
        if px[3] > OPAQUE_ALPHA {
            let c = palette.rgb(idx);
            px[0] = c.r;
            px[1] = c.g;
            px[2] = c.b;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::{ColorSpaceMode, Rgb8};
    use image::Rgba;

    #[test]
    fn test_maps_opaque_and_restores_translucent() {
        let palette = Palette::from_hex(&[(0, "#000000"), (1, "#ffffff")]).unwrap();
        let mut image = RgbaImage::from_pixel(3, 1, Rgba([200, 200, 200, 255]));
        image.put_pixel(1, 0, Rgba([200, 200, 200, 191]));
        image.put_pixel(2, 0, Rgba([30, 30, 30, 192]));
        let out = color_match(&image, &palette, &DitherOptions::new());
        assert_eq!(*out.get_pixel(0, 0), Rgba([255, 255, 255, 255]));
        assert_eq!(*out.get_pixel(1, 0), Rgba([200, 200, 200, 191]));
        assert_eq!(*out.get_pixel(2, 0), Rgba([0, 0, 0, 192]));
    }

    #[test]
    fn test_lab_mode_maps_to_palette() {
        let palette = Palette::chalk();
        let image = RgbaImage::from_fn(8, 8, |x, y| Rgba([(x * 30) as u8, (y * 30) as u8, 60, 255]));
        let out = color_match(&image, &palette, &DitherOptions::new().mode(ColorSpaceMode::Lab));
        for px in out.pixels() {
            assert!(palette.index_of_rgb(Rgb8::new(px[0], px[1], px[2])).is_some());
        }
    }
}
