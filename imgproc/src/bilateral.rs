//! Bilateral Filter
//!
//! Edge-preserving smoothing filter that uses both spatial and range (intensity) distance.

use crate::{map_coord, validate_image_size, BorderMode, Result};
use cv_core::{Image, U8Pixel};
use rayon::prelude::*;

/// Bilateral filter over any 8-bit layout.
///
/// `d` is the neighbourhood diameter; when non-positive it is derived from
/// `sigma_space` (radius `round(1.5 * sigma_space)`). Only offsets inside the
/// circle of that radius contribute. The range distance between two pixels is
/// the L1 distance over their channels.
pub fn bilateral_filter<P: U8Pixel>(
    src: &Image<P>,
    d: i32,
    sigma_color: f32,
    sigma_space: f32,
) -> Result<Image<P>> {
    validate_image_size(src.width(), src.height())?;

    let sigma_color = if sigma_color <= 0.0 { 1.0 } else { sigma_color };
    let sigma_space = if sigma_space <= 0.0 { 1.0 } else { sigma_space };
    let radius = if d <= 0 {
        (sigma_space * 1.5).round() as i32
    } else {
        d / 2
    }
    .max(1);

    let channels = P::CHANNEL_COUNT as usize;
    let (w, h) = (src.width() as usize, src.height() as usize);
    let color_coeff = -0.5 / (sigma_color * sigma_color);
    let space_coeff = -0.5 / (sigma_space * sigma_space);

    // Weight per possible L1 range distance.
    let color_weights: Vec<f32> = (0..256 * channels)
        .map(|i| ((i * i) as f32 * color_coeff).exp())
        .collect();

    let mut offsets = Vec::new();
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            let r2 = (dx * dx + dy * dy) as f32;
            if r2.sqrt() > radius as f32 {
                continue;
            }
            offsets.push((dx as isize, dy as isize, (r2 * space_coeff).exp()));
        }
    }
    tracing::trace!(radius, taps = offsets.len(), "bilateral filter");

    let raw = src.as_raw();
    let border = BorderMode::Reflect101;
    let mut dst = Image::<P>::new(src.width(), src.height());

    dst.as_mut()
        .par_chunks_mut(w * channels)
        .enumerate()
        .for_each(|(y, row)| {
            let mut sum = vec![0.0f32; channels];
            for x in 0..w {
                let center = &raw[(y * w + x) * channels..(y * w + x + 1) * channels];
                sum.iter_mut().for_each(|s| *s = 0.0);
                let mut weight_sum = 0.0f32;

                for &(dx, dy, space_w) in &offsets {
                    let (Some(ix), Some(iy)) = (
                        map_coord(x as isize + dx, w, border),
                        map_coord(y as isize + dy, h, border),
                    ) else {
                        continue;
                    };
                    let idx = (iy * w + ix) * channels;
                    let neighbor = &raw[idx..idx + channels];
                    let dist: usize = neighbor
                        .iter()
                        .zip(center)
                        .map(|(a, b)| a.abs_diff(*b) as usize)
                        .sum();

                    let weight = space_w * color_weights[dist];
                    for c in 0..channels {
                        sum[c] += neighbor[c] as f32 * weight;
                    }
                    weight_sum += weight;
                }

                let out = &mut row[x * channels..(x + 1) * channels];
                for c in 0..channels {
                    out[c] = if weight_sum > 0.0 {
                        (sum[c] / weight_sum).round().clamp(0.0, 255.0) as u8
                    } else {
                        center[c]
                    };
                }
            }
        });

    Ok(dst)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma, Rgb, RgbImage};

    #[test]
    fn flat_image_is_unchanged() {
        let img = RgbImage::from_pixel(10, 10, Rgb([40, 90, 200]));
        let out = bilateral_filter(&img, 9, 75.0, 75.0).unwrap();
        assert_eq!(out, img);
    }

    #[test]
    fn preserves_a_strong_edge() {
        let img = GrayImage::from_fn(16, 8, |x, _| Luma([if x < 8 { 20 } else { 230 }]));
        let out = bilateral_filter(&img, 5, 10.0, 5.0).unwrap();
        assert_eq!(out.get_pixel(7, 4)[0], 20);
        assert_eq!(out.get_pixel(8, 4)[0], 230);
    }

    #[test]
    fn smooths_small_noise() {
        let mut img = GrayImage::from_pixel(9, 9, Luma([100]));
        img.put_pixel(4, 4, Luma([110]));
        let out = bilateral_filter(&img, 5, 50.0, 5.0).unwrap();
        let v = out.get_pixel(4, 4)[0];
        assert!(v > 100 && v < 110);
    }
}
