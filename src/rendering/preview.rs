use std::io::Cursor;

use image::codecs::gif::{GifEncoder, Repeat};
use image::{Delay, Frame, RgbaImage};

use crate::error::StampError;

/// Encode the dithered image as a compact PNG.
///
/// Dithered images hold few distinct colors, so they are written as an
/// indexed PNG with a transparency chunk and then re-compressed with oxipng.
/// Images with more than 256 distinct RGBA values fall back to truecolor.
pub fn render_static_preview(image: &RgbaImage) -> Result<Vec<u8>, StampError> {
    let (width, height) = image.dimensions();
    let png_bytes = match ColorTable::build(image) {
        Some(table) => {
            let bits = table.bits_per_pixel();
            let rows = pack_indices(&table.indices, width as usize, bits);
            write_png(width, height, PngLayout::Indexed { bits, colors: &table.colors }, &rows)?
        }
        None => write_png(width, height, PngLayout::Rgba, image.as_raw())?,
    };

    let options = oxipng::Options {
        strip: oxipng::StripChunks::Safe,
        optimize_alpha: false,
        ..Default::default()
    };
    match oxipng::optimize_from_memory(&png_bytes, &options) {
        Ok(optimized) => Ok(optimized),
        Err(e) => {
            tracing::debug!(error = %e, "oxipng failed, keeping unoptimized preview");
            Ok(png_bytes)
        }
    }
}

/// Encode dithered frames as an endlessly looping GIF with their delays in ms.
pub fn render_animated_preview(frames: &[RgbaImage], delays: &[u32]) -> Result<Vec<u8>, StampError> {
    let mut buf = Vec::new();
    {
        let mut encoder = GifEncoder::new(&mut buf);
        encoder
            .set_repeat(Repeat::Infinite)
            .map_err(|e| StampError::processing("gif preview", e.to_string()))?;
        let frames = frames.iter().zip(delays).map(|(image, &delay_ms)| {
            Frame::from_parts(image.clone(), 0, 0, Delay::from_numer_denom_ms(delay_ms, 1))
        });
        encoder
            .encode_frames(frames)
            .map_err(|e| StampError::processing("gif preview", e.to_string()))?;
    }
    Ok(buf)
}

/// Distinct RGBA values of an image with one index per pixel.
/// Fully transparent pixels share a single entry.
struct ColorTable {
    colors: Vec<[u8; 4]>,
    indices: Vec<u8>,
}

impl ColorTable {
    /// `None` once a 257th color shows up.
    fn build(image: &RgbaImage) -> Option<Self> {
        let mut colors: Vec<[u8; 4]> = Vec::new();
        let mut indices = Vec::with_capacity((image.width() * image.height()) as usize);
        for px in image.pixels() {
            let color = if px[3] == 0 { [0; 4] } else { px.0 };
            let index = match colors.iter().position(|&c| c == color) {
                Some(index) => index,
                None => {
                    if colors.len() == 256 {
                        return None;
                    }
                    colors.push(color);
                    colors.len() - 1
                }
            };
            indices.push(index as u8);
        }
        Some(Self { colors, indices })
    }

    /// Smallest PNG palette depth that addresses every entry.
    fn bits_per_pixel(&self) -> u8 {
        match self.colors.len() {
            0..=2 => 1,
            3..=4 => 2,
            5..=16 => 4,
            _ => 8,
        }
    }
}

enum PngLayout<'a> {
    Indexed { bits: u8, colors: &'a [[u8; 4]] },
    Rgba,
}

fn write_png(width: u32, height: u32, layout: PngLayout<'_>, data: &[u8]) -> Result<Vec<u8>, StampError> {
    let png_error = |e: png::EncodingError| StampError::processing("png preview", e.to_string());

    let mut out = Vec::new();
    let mut encoder = png::Encoder::new(Cursor::new(&mut out), width, height);
    encoder.set_compression(png::Compression::Fast);
    encoder.set_filter(png::FilterType::NoFilter);
    match layout {
        PngLayout::Indexed { bits, colors } => {
            encoder.set_color(png::ColorType::Indexed);
            encoder.set_depth(match bits {
                1 => png::BitDepth::One,
                2 => png::BitDepth::Two,
                4 => png::BitDepth::Four,
                _ => png::BitDepth::Eight,
            });
            encoder.set_palette(colors.iter().flat_map(|c| [c[0], c[1], c[2]]).collect::<Vec<u8>>());
            encoder.set_trns(colors.iter().map(|c| c[3]).collect::<Vec<u8>>());
        }
        PngLayout::Rgba => {
            encoder.set_color(png::ColorType::Rgba);
            encoder.set_depth(png::BitDepth::Eight);
        }
    }
    let mut writer = encoder.write_header().map_err(png_error)?;
    writer.write_image_data(data).map_err(png_error)?;
    writer.finish().map_err(png_error)?;
    Ok(out)
}

/// Row-major palette indices as PNG scanlines of `bits` bits per pixel,
/// most significant bits first, each row padded to a whole byte.
fn pack_indices(indices: &[u8], width: usize, bits: u8) -> Vec<u8> {
    if bits == 8 {
        return indices.to_vec();
    }
    let per_byte = usize::from(8 / bits);
    indices
        .chunks(width)
        .flat_map(|row| row.chunks(per_byte))
        .map(|group| {
            group.iter().enumerate().fold(0u8, |byte, (slot, &index)| {
                let shift = 8 - bits * (slot as u8 + 1);
                byte | ((index & ((1 << bits) - 1)) << shift)
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{AnimationDecoder, Rgba};

    fn decode_png(bytes: &[u8]) -> RgbaImage {
        image::load_from_memory_with_format(bytes, image::ImageFormat::Png)
            .unwrap()
            .into_rgba8()
    }

    #[test]
    fn test_static_preview_round_trips_pixels() {
        let mut image = RgbaImage::from_pixel(5, 3, Rgba([42, 56, 68, 255]));
        image.put_pixel(0, 0, Rgba([0, 0, 0, 0]));
        image.put_pixel(4, 2, Rgba([215, 11, 93, 200]));
        let bytes = render_static_preview(&image).unwrap();
        assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");
        assert_eq!(decode_png(&bytes), image);
    }

    #[test]
    fn test_static_preview_many_colors() {
        let image = RgbaImage::from_fn(32, 32, |x, y| Rgba([(x * 8) as u8, (y * 8) as u8, 7, 255]));
        let bytes = render_static_preview(&image).unwrap();
        assert_eq!(decode_png(&bytes), image);
    }

    #[test]
    fn test_pack_indices_pads_each_row() {
        assert_eq!(pack_indices(&[1, 0, 1], 3, 1), vec![0b1010_0000]);
        assert_eq!(pack_indices(&[3, 2, 1, 0, 3], 5, 2), vec![0b1110_0100, 0b1100_0000]);
        // Two rows of three 4-bit pixels: each row starts on a fresh byte.
        assert_eq!(
            pack_indices(&[1, 2, 3, 4, 5, 6], 3, 4),
            vec![0x12, 0x30, 0x45, 0x60]
        );
        assert_eq!(pack_indices(&[7, 9], 2, 8), vec![7, 9]);
    }

    #[test]
    fn test_color_table_depth() {
        let two = RgbaImage::from_fn(4, 1, |x, _| Rgba([x as u8 % 2, 0, 0, 255]));
        assert_eq!(ColorTable::build(&two).unwrap().bits_per_pixel(), 1);

        let mut clear = RgbaImage::from_pixel(3, 1, Rgba([5, 5, 5, 0]));
        clear.put_pixel(1, 0, Rgba([9, 9, 9, 0]));
        let table = ColorTable::build(&clear).unwrap();
        assert_eq!(table.colors, vec![[0, 0, 0, 0]]);

        let many = RgbaImage::from_fn(20, 20, |x, y| Rgba([x as u8, y as u8, 0, 255]));
        assert!(ColorTable::build(&many).is_none());
    }

    #[test]
    fn test_static_preview_four_bit_odd_width() {
        let image = RgbaImage::from_fn(7, 3, |x, y| Rgba([((x % 4) * 60) as u8, (y * 60) as u8, 0, 255]));
        let bytes = render_static_preview(&image).unwrap();
        assert_eq!(decode_png(&bytes), image);
    }

    #[test]
    fn test_animated_preview_has_all_frames() {
        let frames = vec![RgbaImage::from_pixel(3, 3, Rgba([255, 231, 197, 255])); 2];
        let bytes = render_animated_preview(&frames, &[40, 80]).unwrap();
        assert_eq!(&bytes[..6], b"GIF89a");

        let decoder = image::codecs::gif::GifDecoder::new(Cursor::new(bytes)).unwrap();
        let decoded = decoder.into_frames().collect_frames().unwrap();
        assert_eq!(decoded.len(), 2);
        assert_eq!(decoded[1].delay().numer_denom_ms(), (80, 1));
    }
}
