//! Spatial filters used by tone preprocessing and hybrid dithering.
//!
//! All neighborhood operations mirror borders with reflect-101 addressing
//! (`dcb|abcd|cba`), except the 3×3 edge detector which leaves the outer
//! ring of pixels untouched. The edge detector runs on
//! [`imageops::filter3x3`]; the Gaussian stays hand-written because
//! `imageops::blur` clamps borders and sizes its kernel differently.

use image::{imageops, GrayImage, Luma, RgbaImage};

/// Map an out-of-range coordinate back into `0..n` by reflect-101.
#[inline]
pub(crate) fn reflect101(mut i: isize, n: usize) -> usize {
    let n = n as isize;
    if n <= 1 {
        return 0;
    }
    loop {
        if i < 0 {
            i = -i;
        } else if i >= n {
            i = 2 * n - 2 - i;
        } else {
            return i as usize;
        }
    }
}

/// Normalized 1-D Gaussian kernel for an 8-bit image.
///
/// Kernel size follows the usual 8-bit rule: `round(6σ + 1) | 1` taps.
pub(crate) fn gaussian_kernel(sigma: f32) -> Vec<f32> {
    let size = ((sigma * 6.0 + 1.0).round() as usize) | 1;
    let radius = (size / 2) as isize;
    let denom = 2.0 * sigma * sigma;
    let mut kernel: Vec<f32> = (-radius..=radius)
        .map(|i| (-((i * i) as f32) / denom).exp())
        .collect();
    let sum: f32 = kernel.iter().sum();
    for k in &mut kernel {
        *k /= sum;
    }
    kernel
}

/// Separable Gaussian blur of a single float plane.
pub(crate) fn gaussian_blur(plane: &[f32], width: usize, height: usize, sigma: f32) -> Vec<f32> {
    if width == 0 || height == 0 {
        return Vec::new();
    }
    let kernel = gaussian_kernel(sigma);
    let radius = (kernel.len() / 2) as isize;

    let mut horizontal = vec![0.0f32; width * height];
    for y in 0..height {
        let row = &plane[y * width..(y + 1) * width];
        for x in 0..width {
            let mut acc = 0.0;
            for (k, w) in kernel.iter().enumerate() {
                let sx = reflect101(x as isize + k as isize - radius, width);
                acc += row[sx] * w;
            }
            horizontal[y * width + x] = acc;
        }
    }

    let mut out = vec![0.0f32; width * height];
    for y in 0..height {
        for x in 0..width {
            let mut acc = 0.0;
            for (k, w) in kernel.iter().enumerate() {
                let sy = reflect101(y as isize + k as isize - radius, height);
                acc += horizontal[sy * width + x] * w;
            }
            out[y * width + x] = acc;
        }
    }
    out
}

/// Split the RGB channels of an image into three float planes.
pub(crate) fn rgb_planes(image: &RgbaImage) -> [Vec<f32>; 3] {
    let n = (image.width() * image.height()) as usize;
    let mut planes = [vec![0.0; n], vec![0.0; n], vec![0.0; n]];
    for (i, px) in image.pixels().enumerate() {
        for c in 0..3 {
            planes[c][i] = f32::from(px[c]);
        }
    }
    planes
}

/// Edge-preserving bilateral filter on the RGB channels.
///
/// Color distance is the L1 sum over channels; only taps inside the circle
/// of `radius` contribute. Alpha is copied through.
pub(crate) fn bilateral(
    image: &RgbaImage,
    radius: usize,
    sigma_color: f32,
    sigma_space: f32,
) -> RgbaImage {
    let (w, h) = (image.width() as usize, image.height() as usize);
    let mut out = image.clone();
    if w == 0 || h == 0 {
        return out;
    }

    let r = radius as isize;
    let color_coeff = -0.5 / (sigma_color * sigma_color);
    let space_coeff = -0.5 / (sigma_space * sigma_space);

    let mut taps = Vec::new();
    for dy in -r..=r {
        for dx in -r..=r {
            let dist = ((dx * dx + dy * dy) as f32).sqrt();
            if dist <= radius as f32 {
                taps.push((dx, dy, (dist * dist * space_coeff).exp()));
            }
        }
    }

    // Color weights depend only on the integer L1 distance.
    let color_lut: Vec<f32> = (0..=255 * 3)
        .map(|d| ((d * d) as f32 * color_coeff).exp())
        .collect();

    let src = image.as_raw();
    let dst: &mut [u8] = &mut out;
    for y in 0..h {
        for x in 0..w {
            let ci = (y * w + x) * 4;
            let center = [src[ci], src[ci + 1], src[ci + 2]];
            let mut sum = [0.0f32; 3];
            let mut wsum = 0.0f32;
            for &(dx, dy, ws) in &taps {
                let sx = reflect101(x as isize + dx, w);
                let sy = reflect101(y as isize + dy, h);
                let si = (sy * w + sx) * 4;
                let d = center
                    .iter()
                    .zip(&src[si..si + 3])
                    .map(|(&a, &b)| (i32::from(a) - i32::from(b)).unsigned_abs() as usize)
                    .sum::<usize>();
                let weight = ws * color_lut[d];
                for c in 0..3 {
                    sum[c] += f32::from(src[si + c]) * weight;
                }
                wsum += weight;
            }
            for c in 0..3 {
                dst[ci + c] = (sum[c] / wsum).round().clamp(0.0, 255.0) as u8;
            }
        }
    }
    out
}

/// Contrast-limited adaptive histogram equalization of an 8-bit plane.
///
/// The plane is divided into `grid × grid` tiles (padded by reflect-101 when
/// the size does not divide evenly). Each tile histogram is clipped at
/// `clip_limit · tile_area / 256`, the excess is spread over all bins, and
/// the resulting mappings are blended bilinearly between tile centers.
pub(crate) fn clahe(plane: &[u8], width: usize, height: usize, clip_limit: f32, grid: usize) -> Vec<u8> {
    if width == 0 || height == 0 || grid == 0 {
        return plane.to_vec();
    }

    let tile_w = width.div_ceil(grid);
    let tile_h = height.div_ceil(grid);
    let tile_area = tile_w * tile_h;
    let clip = ((clip_limit * tile_area as f32 / 256.0) as usize).max(1);
    let lut_scale = 255.0 / tile_area as f32;

    let mut luts = vec![[0u8; 256]; grid * grid];
    for ty in 0..grid {
        for tx in 0..grid {
            let mut hist = [0usize; 256];
            for y in ty * tile_h..(ty + 1) * tile_h {
                let sy = reflect101(y as isize, height);
                for x in tx * tile_w..(tx + 1) * tile_w {
                    let sx = reflect101(x as isize, width);
                    hist[plane[sy * width + sx] as usize] += 1;
                }
            }

            let mut excess = 0usize;
            for bin in hist.iter_mut() {
                if *bin > clip {
                    excess += *bin - clip;
                    *bin = clip;
                }
            }
            let batch = excess / 256;
            let residual = excess % 256;
            for bin in hist.iter_mut() {
                *bin += batch;
            }
            if residual > 0 {
                let step = (256 / residual).max(1);
                let mut remaining = residual;
                let mut i = 0;
                while i < 256 && remaining > 0 {
                    hist[i] += 1;
                    remaining -= 1;
                    i += step;
                }
            }

            let lut = &mut luts[ty * grid + tx];
            let mut cumulative = 0usize;
            for (i, &count) in hist.iter().enumerate() {
                cumulative += count;
                lut[i] = (cumulative as f32 * lut_scale).round().clamp(0.0, 255.0) as u8;
            }
        }
    }

    let mut out = vec![0u8; width * height];
    for y in 0..height {
        let tyf = y as f32 / tile_h as f32 - 0.5;
        let ty1 = tyf.floor() as isize;
        let ya = tyf - ty1 as f32;
        let ty2 = (ty1 + 1).min(grid as isize - 1) as usize;
        let ty1 = ty1.max(0) as usize;
        for x in 0..width {
            let txf = x as f32 / tile_w as f32 - 0.5;
            let tx1 = txf.floor() as isize;
            let xa = txf - tx1 as f32;
            let tx2 = (tx1 + 1).min(grid as isize - 1) as usize;
            let tx1 = tx1.max(0) as usize;

            let v = plane[y * width + x] as usize;
            let top = f32::from(luts[ty1 * grid + tx1][v]) * (1.0 - xa)
                + f32::from(luts[ty1 * grid + tx2][v]) * xa;
            let bottom = f32::from(luts[ty2 * grid + tx1][v]) * (1.0 - xa)
                + f32::from(luts[ty2 * grid + tx2][v]) * xa;
            out[y * width + x] = (top * (1.0 - ya) + bottom * ya).round().clamp(0.0, 255.0) as u8;
        }
    }
    out
}

/// Percentile with linear interpolation between closest ranks.
///
/// `hist` is a 256-bin histogram; `p` is in 0..=100.
pub(crate) fn percentile_from_histogram(hist: &[usize; 256], p: f32) -> Option<f32> {
    let total: usize = hist.iter().sum();
    if total == 0 {
        return None;
    }
    let rank = p / 100.0 * (total - 1) as f32;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    let lo_value = nth_value(hist, lo);
    let hi_value = nth_value(hist, hi);
    Some(lo_value + (hi_value - lo_value) * (rank - lo as f32))
}

fn nth_value(hist: &[usize; 256], n: usize) -> f32 {
    let mut seen = 0;
    for (value, &count) in hist.iter().enumerate() {
        seen += count;
        if seen > n {
            return value as f32;
        }
    }
    255.0
}

/// Integer luma with the ITU-R 601 weights, rounded.
#[inline]
pub(crate) fn luma(r: u8, g: u8, b: u8) -> u8 {
    ((u32::from(r) * 19595 + u32::from(g) * 38470 + u32::from(b) * 7471 + 0x8000) >> 16) as u8
}

const EDGE_KERNEL: [f32; 9] = [-1.0, -1.0, -1.0, -1.0, 8.0, -1.0, -1.0, -1.0, -1.0];

/// 3×3 Laplacian-style edge detector (center 8, neighbors −1), clipped to
/// 0..=255. The outermost ring keeps its source value.
pub(crate) fn find_edges(gray: &[u8], width: usize, height: usize) -> Vec<f32> {
    let mut out: Vec<f32> = gray.iter().map(|&v| f32::from(v)).collect();
    if width < 3 || height < 3 {
        return out;
    }
    let source = GrayImage::from_fn(width as u32, height as u32, |x, y| {
        Luma([gray[y as usize * width + x as usize]])
    });
    // Zero-sum kernel: filter3x3 leaves it unnormalized and clamps to u8.
    let edges = imageops::filter3x3(&source, &EDGE_KERNEL);
    for y in 1..height - 1 {
        for x in 1..width - 1 {
            out[y * width + x] = f32::from(edges.get_pixel(x as u32, y as u32)[0]);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn test_reflect101() {
        assert_eq!(reflect101(-1, 5), 1);
        assert_eq!(reflect101(-2, 5), 2);
        assert_eq!(reflect101(5, 5), 3);
        assert_eq!(reflect101(6, 5), 2);
        assert_eq!(reflect101(3, 1), 0);
        assert_eq!(reflect101(-7, 3), 1);
    }

    #[test]
    fn test_gaussian_kernel_shape() {
        let k = gaussian_kernel(1.0);
        assert_eq!(k.len(), 7);
        assert!((k.iter().sum::<f32>() - 1.0).abs() < 1e-5);
        assert!(k[3] > k[2] && k[2] > k[1]);
        assert_eq!(gaussian_kernel(1.5).len(), 11);
    }

    #[test]
    fn test_blur_preserves_flat_plane() {
        let plane = vec![42.0; 6 * 4];
        let out = gaussian_blur(&plane, 6, 4, 1.5);
        assert!(out.iter().all(|v| (v - 42.0).abs() < 1e-3));
    }

    #[test]
    fn test_bilateral_preserves_flat_image_and_alpha() {
        let image = RgbaImage::from_pixel(5, 5, Rgba([100, 150, 200, 77]));
        let out = bilateral(&image, 2, 30.0, 30.0);
        assert_eq!(out, image);
    }

    #[test]
    fn test_bilateral_keeps_hard_edge() {
        let image = RgbaImage::from_fn(8, 8, |x, _| {
            if x < 4 {
                Rgba([0, 0, 0, 255])
            } else {
                Rgba([255, 255, 255, 255])
            }
        });
        let out = bilateral(&image, 2, 30.0, 30.0);
        assert!(out.get_pixel(3, 4)[0] < 5);
        assert!(out.get_pixel(4, 4)[0] > 250);
    }

    #[test]
    fn test_clahe_flat_plane_stays_flat() {
        let plane = vec![120u8; 16 * 16];
        let out = clahe(&plane, 16, 16, 4.0, 8);
        let first = out[0];
        assert!(out.iter().all(|&v| v == first));
    }

    #[test]
    fn test_clahe_spreads_low_contrast_ramp() {
        let (w, h) = (32, 32);
        let plane: Vec<u8> = (0..w * h).map(|i| 100 + ((i % w) / 4) as u8).collect();
        let out = clahe(&plane, w, h, 4.0, 8);
        let in_range = plane.iter().max().unwrap() - plane.iter().min().unwrap();
        let out_range = out.iter().max().unwrap() - out.iter().min().unwrap();
        assert!(out_range > in_range, "{out_range} <= {in_range}");
    }

    #[test]
    fn test_percentile_interpolates() {
        let mut hist = [0usize; 256];
        hist[10] = 1;
        hist[20] = 1;
        assert_eq!(percentile_from_histogram(&hist, 50.0), Some(15.0));
        assert_eq!(percentile_from_histogram(&hist, 0.0), Some(10.0));
        assert_eq!(percentile_from_histogram(&hist, 100.0), Some(20.0));
        assert_eq!(percentile_from_histogram(&[0; 256], 50.0), None);
    }

    #[test]
    fn test_luma_weights() {
        assert_eq!(luma(255, 255, 255), 255);
        assert_eq!(luma(0, 0, 0), 0);
        assert_eq!(luma(255, 0, 0), 76);
    }

    #[test]
    fn test_find_edges_on_spot() {
        let mut gray = vec![0u8; 5 * 5];
        gray[2 * 5 + 2] = 10;
        let edges = find_edges(&gray, 5, 5);
        assert_eq!(edges[2 * 5 + 2], 80.0);
        // Neighbors go negative and clip.
        assert_eq!(edges[2 * 5 + 1], 0.0);
    }

    #[test]
    fn test_find_edges_clips_high_and_keeps_border() {
        let mut gray = vec![7u8; 4 * 4];
        gray[4 + 1] = 200;
        let edges = find_edges(&gray, 4, 4);
        // 8·200 − 8·7 clips to 255; the step pushes its neighbor negative.
        assert_eq!(edges[4 + 1], 255.0);
        assert_eq!(edges[4 + 2], 0.0);
        assert_eq!(edges[0], 7.0);
        assert_eq!(edges[15], 7.0);
        assert_eq!(find_edges(&[3, 4], 2, 1), vec![3.0, 4.0]);
    }
}
