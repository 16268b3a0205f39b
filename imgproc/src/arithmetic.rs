//! Per-pixel arithmetic, blending and bitwise operations.
//!
//! Binary operations require operands of identical size and layout. Masked variants
//! write 0 wherever the mask is 0.

use crate::{ensure_same_size, Result};
use cv_core::{Image, U8Pixel};
use image::{GrayImage, RgbImage};
use rayon::prelude::*;

fn zip_map<P, F>(a: &Image<P>, b: &Image<P>, mask: Option<&GrayImage>, op: F) -> Result<Image<P>>
where
    P: U8Pixel,
    F: Fn(u8, u8) -> u8 + Sync,
{
    ensure_same_size(a.dimensions(), b.dimensions())?;
    if let Some(m) = mask {
        ensure_same_size(a.dimensions(), m.dimensions())?;
    }
    let channels = P::CHANNEL_COUNT as usize;
    let mut out = Image::<P>::new(a.width(), a.height());

    out.as_mut()
        .par_chunks_mut(channels)
        .zip(a.as_raw().par_chunks(channels))
        .zip(b.as_raw().par_chunks(channels))
        .enumerate()
        .for_each(|(i, ((dst, pa), pb))| {
            if let Some(m) = mask {
                if m.as_raw()[i] == 0 {
                    return;
                }
            }
            for c in 0..channels {
                dst[c] = op(pa[c], pb[c]);
            }
        });

    Ok(out)
}

/// Saturating addition: 250 + 10 = 255.
pub fn add<P: U8Pixel>(a: &Image<P>, b: &Image<P>) -> Result<Image<P>> {
    zip_map(a, b, None, |x, y| x.saturating_add(y))
}

pub fn add_masked<P: U8Pixel>(a: &Image<P>, b: &Image<P>, mask: &GrayImage) -> Result<Image<P>> {
    zip_map(a, b, Some(mask), |x, y| x.saturating_add(y))
}

/// Modular addition: 250 + 10 = 4.
pub fn add_wrapping<P: U8Pixel>(a: &Image<P>, b: &Image<P>) -> Result<Image<P>> {
    zip_map(a, b, None, |x, y| x.wrapping_add(y))
}

/// Saturating subtraction: 10 - 250 = 0.
pub fn subtract<P: U8Pixel>(a: &Image<P>, b: &Image<P>) -> Result<Image<P>> {
    zip_map(a, b, None, |x, y| x.saturating_sub(y))
}

/// Absolute per-sample difference.
pub fn absdiff<P: U8Pixel>(a: &Image<P>, b: &Image<P>) -> Result<Image<P>> {
    zip_map(a, b, None, |x, y| x.abs_diff(y))
}

/// `dst = alpha * a + beta * b + gamma`, rounded and saturated.
pub fn add_weighted<P: U8Pixel>(
    a: &Image<P>,
    alpha: f32,
    b: &Image<P>,
    beta: f32,
    gamma: f32,
) -> Result<Image<P>> {
    zip_map(a, b, None, |x, y| {
        (x as f32 * alpha + y as f32 * beta + gamma)
            .round()
            .clamp(0.0, 255.0) as u8
    })
}

pub fn bitwise_and<P: U8Pixel>(
    a: &Image<P>,
    b: &Image<P>,
    mask: Option<&GrayImage>,
) -> Result<Image<P>> {
    zip_map(a, b, mask, |x, y| x & y)
}

pub fn bitwise_or<P: U8Pixel>(
    a: &Image<P>,
    b: &Image<P>,
    mask: Option<&GrayImage>,
) -> Result<Image<P>> {
    zip_map(a, b, mask, |x, y| x | y)
}

pub fn bitwise_xor<P: U8Pixel>(
    a: &Image<P>,
    b: &Image<P>,
    mask: Option<&GrayImage>,
) -> Result<Image<P>> {
    zip_map(a, b, mask, |x, y| x ^ y)
}

pub fn bitwise_not<P: U8Pixel>(a: &Image<P>) -> Image<P> {
    let mut out = a.clone();
    out.as_mut().par_iter_mut().for_each(|v| *v = !*v);
    out
}

/// 255 where every channel lies within `lower..=upper`, 0 elsewhere.
pub fn in_range(src: &RgbImage, lower: [u8; 3], upper: [u8; 3]) -> GrayImage {
    let (w, h) = src.dimensions();
    let mut mask = GrayImage::new(w, h);
    mask.as_mut()
        .par_iter_mut()
        .zip(src.as_raw().par_chunks(3))
        .for_each(|(m, px)| {
            let inside = (0..3).all(|c| px[c] >= lower[c] && px[c] <= upper[c]);
            *m = if inside { 255 } else { 0 };
        });
    mask
}

/// Single-channel variant of [`in_range`].
pub fn in_range_gray(src: &GrayImage, lower: u8, upper: u8) -> GrayImage {
    let mut mask = src.clone();
    mask.as_mut().par_iter_mut().for_each(|v| {
        *v = if *v >= lower && *v <= upper { 255 } else { 0 };
    });
    mask
}

pub fn count_non_zero(src: &GrayImage) -> usize {
    src.as_raw().par_iter().filter(|&&v| v != 0).count()
}
