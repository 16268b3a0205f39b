use crate::{blur, gaussian_blur, BorderMode, ImgprocError, Result};
use image::GrayImage;
use rayon::prelude::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThresholdType {
    Binary,
    BinaryInv,
    Trunc,
    ToZero,
    ToZeroInv,
}

impl ThresholdType {
    pub const ALL: [ThresholdType; 5] = [
        ThresholdType::Binary,
        ThresholdType::BinaryInv,
        ThresholdType::Trunc,
        ThresholdType::ToZero,
        ThresholdType::ToZeroInv,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ThresholdType::Binary => "BINARY",
            ThresholdType::BinaryInv => "BINARY_INV",
            ThresholdType::Trunc => "TRUNC",
            ThresholdType::ToZero => "TOZERO",
            ThresholdType::ToZeroInv => "TOZERO_INV",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdaptiveMethod {
    /// Threshold is the neighbourhood mean minus `c`.
    MeanC,
    /// Threshold is the Gaussian-weighted neighbourhood sum minus `c`.
    GaussianC,
}

/// Global threshold. A sample counts as "above" only when strictly greater than `thresh`.
pub fn threshold(src: &GrayImage, thresh: u8, max_value: u8, typ: ThresholdType) -> GrayImage {
    let mut dst = src.clone();
    dst.as_mut()
        .par_iter_mut()
        .for_each(|px| *px = apply_threshold(*px, thresh, max_value, typ));
    dst
}

/// Otsu's method: picks the threshold maximising between-class variance, then applies it.
pub fn threshold_otsu(src: &GrayImage, max_value: u8, typ: ThresholdType) -> (u8, GrayImage) {
    let hist = histogram(src);
    let total: u64 = hist.iter().map(|&n| n as u64).sum();
    let weighted_total: u64 = hist.iter().enumerate().map(|(v, &n)| v as u64 * n as u64).sum();

    let (mut below, mut weighted_below) = (0u64, 0u64);
    let mut best = (0u8, -1.0f64);
    for (t, &n) in hist.iter().enumerate() {
        below += n as u64;
        weighted_below += t as u64 * n as u64;
        let above = total - below;
        if below == 0 {
            continue;
        }
        if above == 0 {
            break;
        }

        let mean_below = weighted_below as f64 / below as f64;
        let mean_above = (weighted_total - weighted_below) as f64 / above as f64;
        let spread = (below as f64) * (above as f64) * (mean_below - mean_above).powi(2);
        if spread > best.1 {
            best = (t as u8, spread);
        }
    }

    (best.0, threshold(src, best.0, max_value, typ))
}

/// Per-pixel threshold computed from a `block_size` x `block_size` neighbourhood.
///
/// `block_size` must be odd and at least 3; only `Binary` and `BinaryInv` are accepted.
pub fn adaptive_threshold(
    src: &GrayImage,
    max_value: u8,
    method: AdaptiveMethod,
    typ: ThresholdType,
    block_size: u32,
    c: f32,
) -> Result<GrayImage> {
    if block_size < 3 || block_size % 2 == 0 {
        return Err(ImgprocError::InvalidParameter(format!(
            "block_size must be odd and >= 3, got {block_size}"
        )));
    }
    if !matches!(typ, ThresholdType::Binary | ThresholdType::BinaryInv) {
        return Err(ImgprocError::InvalidParameter(format!(
            "adaptive threshold supports BINARY or BINARY_INV, got {}",
            typ.name()
        )));
    }

    let local = match method {
        AdaptiveMethod::MeanC => blur(src, block_size, block_size, BorderMode::Replicate)?,
        AdaptiveMethod::GaussianC => gaussian_blur(src, block_size, 0.0, BorderMode::Replicate)?,
    };

    let mut dst = GrayImage::new(src.width(), src.height());
    dst.as_mut()
        .par_iter_mut()
        .zip(src.as_raw().par_iter())
        .zip(local.as_raw().par_iter())
        .for_each(|((out, &value), &mean)| {
            let above = value as f32 > mean as f32 - c;
            *out = match (typ, above) {
                (ThresholdType::Binary, true) | (ThresholdType::BinaryInv, false) => max_value,
                _ => 0,
            };
        });

    Ok(dst)
}

fn apply_threshold(value: u8, thresh: u8, max_value: u8, typ: ThresholdType) -> u8 {
    let above = value > thresh;
    match typ {
        ThresholdType::Binary if above => max_value,
        ThresholdType::BinaryInv if !above => max_value,
        ThresholdType::Binary | ThresholdType::BinaryInv => 0,
        ThresholdType::Trunc => value.min(thresh),
        ThresholdType::ToZero if above => value,
        ThresholdType::ToZeroInv if !above => value,
        ThresholdType::ToZero | ThresholdType::ToZeroInv => 0,
    }
}

fn histogram(src: &GrayImage) -> [u32; 256] {
    let mut hist = [0u32; 256];
    for &px in src.as_raw() {
        hist[px as usize] += 1;
    }
    hist
}
