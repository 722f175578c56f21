//! K-means palette mapping.
//!
//! Pixels are grouped into `clusters` color clusters; each cluster is then
//! painted with the palette color nearest to its centroid. Flat regions come
//! out as large single-color areas instead of dither noise.
//!
//! Initialization is deterministic: the first center is the pixel at median
//! luma, every further center is the pixel farthest from all chosen centers.
//! Lloyd iterations then run until no label changes.

use image::RgbaImage;
use rayon::prelude::*;

use super::options::DitherOptions;
use crate::color::{distance_sq, Rgb8};
use crate::palette::{ColorMatcher, Palette};
use crate::preprocess::filters::luma;

const MAX_ITERATIONS: usize = 30;

pub fn kmeans_mapping(image: &RgbaImage, palette: &Palette, options: &DitherOptions) -> RgbaImage {
    let pixels: Vec<[f32; 3]> = image
        .pixels()
        .map(|p| [f32::from(p[0]), f32::from(p[1]), f32::from(p[2])])
        .collect();
    if pixels.is_empty() {
        return image.clone();
    }

    let k = options.clusters.clamp(1, pixels.len());
    let (centers, labels) = kmeans(&pixels, k, MAX_ITERATIONS);
    tracing::debug!(k, "K-means clustering converged");

    let matcher = ColorMatcher::new(palette, options.mode);
    let cluster_colors: Vec<Rgb8> = centers
        .iter()
        .map(|c| palette.rgb(matcher.nearest(Rgb8::from_f32_truncated(*c))))
        .collect();

    let mut out = image.clone();
    for (px, &label) in out.pixels_mut().zip(&labels) {
        let c = cluster_colors[label];
        px[0] = c.r;
        px[1] = c.g;
        px[2] = c.b;
    }
    out
}

fn nearest_center(pixel: [f32; 3], centers: &[[f32; 3]]) -> usize {
    let mut best = 0;
    let mut best_dist = f32::INFINITY;
    for (i, &c) in centers.iter().enumerate() {
        let d = distance_sq(pixel, c);
        if d < best_dist {
            best_dist = d;
            best = i;
        }
    }
    best
}

fn kmeans(pixels: &[[f32; 3]], k: usize, max_iterations: usize) -> (Vec<[f32; 3]>, Vec<usize>) {
    let mut centers = farthest_point_init(pixels, k);
    let mut labels = vec![usize::MAX; pixels.len()];

    for _ in 0..max_iterations {
        let new_labels: Vec<usize> = pixels
            .par_iter()
            .map(|&p| nearest_center(p, &centers))
            .collect();

        let changed = new_labels.iter().zip(&labels).filter(|(a, b)| a != b).count();
        labels = new_labels;
        if changed == 0 {
            break;
        }

        let mut sums = vec![[0.0f64; 3]; k];
        let mut counts = vec![0u64; k];
        for (p, &label) in pixels.iter().zip(&labels) {
            for c in 0..3 {
                sums[label][c] += f64::from(p[c]);
            }
            counts[label] += 1;
        }
        for ((center, sum), &count) in centers.iter_mut().zip(&sums).zip(&counts) {
            if count > 0 {
                let n = count as f64;
                *center = [(sum[0] / n) as f32, (sum[1] / n) as f32, (sum[2] / n) as f32];
            }
        }
    }

    (centers, labels)
}

fn farthest_point_init(pixels: &[[f32; 3]], k: usize) -> Vec<[f32; 3]> {
    let mut by_luma: Vec<(usize, u8)> = pixels
        .iter()
        .enumerate()
        .map(|(i, p)| (i, luma(p[0] as u8, p[1] as u8, p[2] as u8)))
        .collect();
    by_luma.sort_by_key(|&(i, l)| (l, i));
    let first = pixels[by_luma[by_luma.len() / 2].0];

    let mut centers = Vec::with_capacity(k);
    centers.push(first);
    let mut min_dist: Vec<f32> = pixels.par_iter().map(|&p| distance_sq(p, first)).collect();

    while centers.len() < k {
        let mut best = 0;
        let mut best_dist = f32::NEG_INFINITY;
        for (i, &d) in min_dist.iter().enumerate() {
            if d > best_dist {
                best_dist = d;
                best = i;
            }
        }
        let next = pixels[best];
        centers.push(next);
        min_dist
            .par_iter_mut()
            .zip(pixels.par_iter())
            .for_each(|(d, &p)| {
                let nd = distance_sq(p, next);
                if nd < *d {
                    *d = nd;
                }
            });
    }
    centers
}
