//! Test fixtures and constants.

use std::path::{Path, PathBuf};

use image::codecs::gif::{GifEncoder, Repeat};
use image::{Delay, Frame, ImageFormat, Rgba, RgbaImage};
use pawcessor::models::{ColorSpace, PaletteEntryConfig, ProcessConfig};

/// Chalk colors from the default palette
pub mod colors {
    use image::Rgba;

    pub const CREAM: Rgba<u8> = Rgba([0xff, 0xe7, 0xc5, 255]);
    pub const SLATE: Rgba<u8> = Rgba([0x2a, 0x38, 0x44, 255]);
    pub const MAGENTA: Rgba<u8> = Rgba([0xd7, 0x0b, 0x5d, 255]);
    pub const TEAL: Rgba<u8> = Rgba([0x0d, 0xb3, 0x9e, 255]);
    pub const CLEAR: Rgba<u8> = Rgba([0, 0, 0, 0]);
}

/// Palette entry with default boost and threshold
pub fn entry(number: i32, hex: &str) -> PaletteEntryConfig {
    PaletteEntryConfig {
        hex: hex.to_string(),
        number,
        boost: 1.2,
        threshold: None,
        enabled: true,
        role: None,
    }
}

/// Two-color white/black configuration writing to `out_dir`
pub fn white_black_config(out_dir: &Path) -> ProcessConfig {
    ProcessConfig {
        palette: vec![entry(0, "ffffff"), entry(1, "000000")],
        algorithm: "Atkinson Dither".to_string(),
        color_space: ColorSpace::Rgb,
        output_dir: out_dir.to_path_buf(),
        ..Default::default()
    }
}

/// Default chalk configuration writing to `out_dir`
pub fn chalk_config(out_dir: &Path) -> ProcessConfig {
    ProcessConfig {
        output_dir: out_dir.to_path_buf(),
        ..Default::default()
    }
}

pub fn solid(width: u32, height: u32, color: Rgba<u8>) -> RgbaImage {
    RgbaImage::from_pixel(width, height, color)
}

/// Save `image` as PNG in `dir`
pub fn write_png(dir: &Path, name: &str, image: &RgbaImage) -> PathBuf {
    let path = dir.join(name);
    image
        .save_with_format(&path, ImageFormat::Png)
        .expect("Failed to write PNG fixture");
    path
}

/// Save an animated GIF with per-frame delays in milliseconds
pub fn write_gif(dir: &Path, name: &str, frames: &[(RgbaImage, u32)]) -> PathBuf {
    let path = dir.join(name);
    let file = std::fs::File::create(&path).expect("Failed to create GIF fixture");
    let mut encoder = GifEncoder::new(file);
    encoder.set_repeat(Repeat::Infinite).unwrap();
    encoder
        .encode_frames(frames.iter().map(|(image, delay)| {
            Frame::from_parts(image.clone(), 0, 0, Delay::from_numer_denom_ms(*delay, 1))
        }))
        .expect("Failed to encode GIF fixture");
    path
}
