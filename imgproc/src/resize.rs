use crate::{separable_filter, validate_image_size, BorderMode, ImgprocError, Result};
use cv_core::{Image, U8Pixel};
use rayon::prelude::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Interpolation {
    Nearest,
    #[default]
    Linear,
    /// Bicubic with `a = -0.75`.
    Cubic,
    /// Pixel-area averaging when shrinking; behaves like `Linear` when enlarging.
    Area,
    /// Lanczos over an 8x8 neighbourhood.
    Lanczos4,
}

const CUBIC_A: f32 = -0.75;

pub(crate) fn cubic_weights(t: f32) -> [f32; 4] {
    let a = CUBIC_A;
    let w0 = ((a * (t + 1.0) - 5.0 * a) * (t + 1.0) + 8.0 * a) * (t + 1.0) - 4.0 * a;
    let w1 = ((a + 2.0) * t - (a + 3.0)) * t * t + 1.0;
    let w2 = ((a + 2.0) * (1.0 - t) - (a + 3.0)) * (1.0 - t) * (1.0 - t) + 1.0;
    [w0, w1, w2, 1.0 - w0 - w1 - w2]
}

pub(crate) fn lanczos4_weights(t: f32) -> [f32; 8] {
    let mut w = [0.0f32; 8];
    if t.abs() < f32::EPSILON {
        w[3] = 1.0;
        return w;
    }
    let mut sum = 0.0;
    for (k, wk) in w.iter_mut().enumerate() {
        let x = (t + 3.0 - k as f32) * std::f32::consts::PI;
        *wk = 4.0 * (x).sin() * (x / 4.0).sin() / (x * x);
        sum += *wk;
    }
    for wk in &mut w {
        *wk /= sum;
    }
    w
}

type Taps = Vec<Vec<(usize, f32)>>;

/// Source indices and weights for every destination coordinate along one axis.
fn axis_taps(src_len: usize, dst_len: usize, interp: Interpolation) -> Taps {
    let scale = src_len as f32 / dst_len as f32;
    let last = src_len as isize - 1;
    let clamp = |i: isize| i.clamp(0, last) as usize;

    (0..dst_len)
        .map(|d| {
            let s = (d as f32 + 0.5) * scale - 0.5;
            let i0 = s.floor() as isize;
            let t = s - i0 as f32;
            match interp {
                Interpolation::Nearest => {
                    vec![(((d as f32 * scale).floor() as usize).min(src_len - 1), 1.0)]
                }
                Interpolation::Area if scale > 1.0 => {
                    let begin = d as f32 * scale;
                    let end = begin + scale;
                    let mut taps = Vec::new();
                    let mut cell = begin.floor() as usize;
                    while (cell as f32) < end && cell < src_len {
                        let overlap = (end.min(cell as f32 + 1.0) - begin.max(cell as f32)).max(0.0);
                        if overlap > 0.0 {
                            taps.push((cell, overlap / scale));
                        }
                        cell += 1;
                    }
                    taps
                }
                Interpolation::Linear | Interpolation::Area => {
                    vec![(clamp(i0), 1.0 - t), (clamp(i0 + 1), t)]
                }
                Interpolation::Cubic => cubic_weights(t)
                    .iter()
                    .enumerate()
                    .map(|(k, &w)| (clamp(i0 - 1 + k as isize), w))
                    .collect(),
                Interpolation::Lanczos4 => lanczos4_weights(t)
                    .iter()
                    .enumerate()
                    .map(|(k, &w)| (clamp(i0 - 3 + k as isize), w))
                    .collect(),
            }
        })
        .collect()
}

/// Resizes to `width` x `height` with pixel-centre alignment.
pub fn resize<P: U8Pixel>(
    src: &Image<P>,
    width: u32,
    height: u32,
    interpolation: Interpolation,
) -> Result<Image<P>> {
    validate_image_size(src.width(), src.height())?;
    validate_image_size(width, height)?;
    if (width, height) == src.dimensions() {
        return Ok(src.clone());
    }

    let channels = P::CHANNEL_COUNT as usize;
    let (sw, sh) = (src.width() as usize, src.height() as usize);
    let (dw, dh) = (width as usize, height as usize);
    let x_taps = axis_taps(sw, dw, interpolation);
    let y_taps = axis_taps(sh, dh, interpolation);
    let raw = src.as_raw();

    let mut tmp = vec![0.0f32; sh * dw * channels];
    tmp.par_chunks_mut(dw * channels)
        .enumerate()
        .for_each(|(y, row)| {
            let src_row = &raw[y * sw * channels..(y + 1) * sw * channels];
            for (x, taps) in x_taps.iter().enumerate() {
                for c in 0..channels {
                    row[x * channels + c] = taps
                        .iter()
                        .map(|&(i, w)| src_row[i * channels + c] as f32 * w)
                        .sum();
                }
            }
        });

    let mut dst = Image::<P>::new(width, height);
    dst.as_mut()
        .par_chunks_mut(dw * channels)
        .zip(y_taps.par_iter())
        .for_each(|(row, taps)| {
            for (i, out) in row.iter_mut().enumerate() {
                let v: f32 = taps
                    .iter()
                    .map(|&(sy, w)| tmp[sy * dw * channels + i] * w)
                    .sum();
                *out = v.round().clamp(0.0, 255.0) as u8;
            }
        });

    Ok(dst)
}

/// Resizes by scale factors; the output size is `round(src * factor)`.
pub fn resize_by_factor<P: U8Pixel>(
    src: &Image<P>,
    fx: f64,
    fy: f64,
    interpolation: Interpolation,
) -> Result<Image<P>> {
    if !(fx > 0.0 && fy > 0.0) {
        return Err(ImgprocError::InvalidParameter(format!(
            "scale factors must be positive, got ({fx}, {fy})"
        )));
    }
    let width = (src.width() as f64 * fx).round() as u32;
    let height = (src.height() as f64 * fy).round() as u32;
    resize(src, width, height, interpolation)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlipCode {
    /// Around the x-axis: rows reversed.
    Vertical,
    /// Around the y-axis: columns reversed.
    Horizontal,
    Both,
}

impl FlipCode {
    /// `0` vertical, positive horizontal, negative both.
    pub fn from_code(code: i32) -> Self {
        match code {
            0 => FlipCode::Vertical,
            c if c > 0 => FlipCode::Horizontal,
            _ => FlipCode::Both,
        }
    }
}

pub fn flip<P: U8Pixel>(src: &Image<P>, code: FlipCode) -> Image<P> {
    let channels = P::CHANNEL_COUNT as usize;
    let (w, h) = (src.width() as usize, src.height() as usize);
    let stride = w * channels;
    let raw = src.as_raw();
    let flip_rows = matches!(code, FlipCode::Vertical | FlipCode::Both);
    let flip_cols = matches!(code, FlipCode::Horizontal | FlipCode::Both);

    let mut dst = Image::<P>::new(src.width(), src.height());
    if stride == 0 {
        return dst;
    }
    dst.as_mut()
        .par_chunks_mut(stride)
        .enumerate()
        .for_each(|(y, row)| {
            let sy = if flip_rows { h - 1 - y } else { y };
            let src_row = &raw[sy * stride..(sy + 1) * stride];
            if flip_cols {
                for x in 0..w {
                    let sx = w - 1 - x;
                    row[x * channels..(x + 1) * channels]
                        .copy_from_slice(&src_row[sx * channels..(sx + 1) * channels]);
                }
            } else {
                row.copy_from_slice(src_row);
            }
        });
    dst
}

const PYR_KERNEL: [f32; 5] = [0.0625, 0.25, 0.375, 0.25, 0.0625];

/// Gaussian blur with the 5-tap binomial kernel, then drops every other row and column.
pub fn pyr_down<P: U8Pixel>(src: &Image<P>) -> Result<Image<P>> {
    let blurred = separable_filter(src, &PYR_KERNEL, &PYR_KERNEL, BorderMode::Reflect101)?;
    let width = src.width().div_ceil(2);
    let height = src.height().div_ceil(2);
    Ok(Image::<P>::from_fn(width, height, |x, y| {
        *blurred.get_pixel(x * 2, y * 2)
    }))
}

/// Doubles both dimensions by zero insertion followed by a 4x-weighted binomial blur.
pub fn pyr_up<P: U8Pixel>(src: &Image<P>) -> Result<Image<P>> {
    validate_image_size(src.width(), src.height())?;
    let channels = P::CHANNEL_COUNT as usize;
    let (w, h) = (src.width() as usize, src.height() as usize);
    let mut upsampled = Image::<P>::new(src.width() * 2, src.height() * 2);
    {
        let raw = src.as_raw();
        let out: &mut [u8] = &mut upsampled;
        for y in 0..h {
            for x in 0..w {
                let s = (y * w + x) * channels;
                let d = (2 * y * 2 * w + 2 * x) * channels;
                out[d..d + channels].copy_from_slice(&raw[s..s + channels]);
            }
        }
    }
    let kernel = PYR_KERNEL.map(|v| v * 2.0);
    separable_filter(&upsampled, &kernel, &kernel, BorderMode::Reflect101)
}

/// `levels` images starting with `src`, each half the size of the previous one.
pub fn build_pyramid<P: U8Pixel>(src: &Image<P>, levels: u32) -> Result<Vec<Image<P>>> {
    let mut pyramid = vec![src.clone()];
    for _ in 1..levels {
        let Some(prev) = pyramid.last() else { break };
        if prev.width() < 2 || prev.height() < 2 {
            break;
        }
        let next = pyr_down(prev)?;
        pyramid.push(next);
    }
    Ok(pyramid)
}
