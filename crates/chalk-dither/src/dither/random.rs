//! Random (Gaussian noise) dithering.

use image::RgbaImage;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};

use super::options::DitherOptions;
use crate::api::DitherError;
use crate::color::{ColorSpaceMode, Lab8, Rgb8};
use crate::palette::{ColorMatcher, Palette};

/// Noise standard deviation at strength 1, in 8-bit units.
const NOISE_SIGMA: f32 = 32.0;

/// Add per-pixel Gaussian noise, then match to the palette.
///
/// In RGB mode every channel gets `N(0, 32·strength)`. In LAB mode lightness
/// gets half that deviation and both chroma axes a quarter. With a seed the
/// output is reproducible.
///
/// # Errors
///
/// [`DitherError::InvalidParameter`] if `strength` yields a negative or
/// non-finite deviation.
pub fn random(image: &RgbaImage, palette: &Palette, options: &DitherOptions) -> Result<RgbaImage, DitherError> {
    let sigma = NOISE_SIGMA * options.strength;
    let invalid = || DitherError::InvalidParameter {
        name: "strength",
        value: options.strength,
    };
    if !sigma.is_finite() || sigma < 0.0 {
        return Err(invalid());
    }
    let full = Normal::new(0.0f32, sigma).map_err(|_| invalid())?;
    let half = Normal::new(0.0f32, sigma * 0.5).map_err(|_| invalid())?;
    let quarter = Normal::new(0.0f32, sigma * 0.25).map_err(|_| invalid())?;

    let mut rng = match options.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let matcher = ColorMatcher::new(palette, options.mode);

    let mut out = image.clone();
    for px in out.pixels_mut() {
        if px[3] == 0 {
            continue;
        }
        let rgb = Rgb8::new(px[0], px[1], px[2]);
        let noisy = match options.mode {
            ColorSpaceMode::Rgb => {
                let c = rgb.to_f32();
                let r = (c[0] + full.sample(&mut rng)).clamp(0.0, 255.0);
                let g = (c[1] + full.sample(&mut rng)).clamp(0.0, 255.0);
                let b = (c[2] + full.sample(&mut rng)).clamp(0.0, 255.0);
                Rgb8::from_f32_truncated([r, g, b])
            }
            ColorSpaceMode::Lab => {
                let lab = Lab8::from_rgb(rgb);
                let l = lab.l + half.sample(&mut rng);
                let a = lab.a + quarter.sample(&mut rng);
                let b = lab.b + quarter.sample(&mut rng);
                Lab8::new(l, a, b).clipped().to_rgb()
            }
        };
        let new = palette.rgb(matcher.nearest(noisy));
        px[0] = new.r;
        px[1] = new.g;
        px[2] = new.b;
    }
    Ok(out)
}
