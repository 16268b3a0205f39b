use crate::simd::{accumulate_weighted, convolve_row_1d};
use crate::{map_coord, validate_image_size, BorderMode, ImgprocError, Result};
use cv_core::{Image, U8Pixel};
use rayon::prelude::*;

#[derive(Debug, Clone)]
pub struct Kernel {
    pub data: Vec<f32>,
    pub width: usize,
    pub height: usize,
}

impl Kernel {
    pub fn new(data: Vec<f32>, width: usize, height: usize) -> Result<Self> {
        if width == 0 || height == 0 || data.len() != width * height {
            return Err(ImgprocError::InvalidParameter(format!(
                "kernel of {} values cannot be {width}x{height}",
                data.len()
            )));
        }
        Ok(Self {
            data,
            width,
            height,
        })
    }

    pub fn from_slice(data: &[f32], width: usize, height: usize) -> Result<Self> {
        Self::new(data.to_vec(), width, height)
    }

    pub fn size(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    pub fn center(&self) -> (isize, isize) {
        ((self.width / 2) as isize, (self.height / 2) as isize)
    }

    pub fn get(&self, x: usize, y: usize) -> f32 {
        self.data[y * self.width + x]
    }

    pub fn normalize(&mut self) {
        let sum: f32 = self.data.iter().sum();
        if sum != 0.0 {
            for v in &mut self.data {
                *v /= sum;
            }
        }
    }
}

/// Normalised `size` x `size` averaging kernel.
pub fn box_kernel(size: usize) -> Kernel {
    let size = size.max(1);
    let value = 1.0 / (size * size) as f32;
    Kernel {
        data: vec![value; size * size],
        width: size,
        height: size,
    }
}

pub fn gaussian_kernel(sigma: f32, size: usize) -> Kernel {
    let k = gaussian_kernel_1d(sigma, size);
    let mut data = Vec::with_capacity(k.len() * k.len());
    for &wy in &k {
        for &wx in &k {
            data.push(wx * wy);
        }
    }
    Kernel {
        data,
        width: k.len(),
        height: k.len(),
    }
}

/// Sampled, normalised 1-D Gaussian. Even sizes are bumped to the next odd size.
pub fn gaussian_kernel_1d(sigma: f32, size: usize) -> Vec<f32> {
    let size = size.max(1) | 1;
    let center = (size / 2) as isize;
    let sigma2 = sigma * sigma;

    let mut kernel: Vec<f32> = (0..size)
        .map(|i| {
            let x = (i as isize - center) as f32;
            (-(x * x) / (2.0 * sigma2)).exp()
        })
        .collect();

    let sum: f32 = kernel.iter().sum();
    if sum != 0.0 {
        for v in &mut kernel {
            *v /= sum;
        }
    }
    kernel
}

// Binomial kernels used for small sizes when no sigma is given.
const SMALL_GAUSSIAN: [&[f32]; 4] = [
    &[1.0],
    &[0.25, 0.5, 0.25],
    &[0.0625, 0.25, 0.375, 0.25, 0.0625],
    &[
        0.03125, 0.109375, 0.21875, 0.28125, 0.21875, 0.109375, 0.03125,
    ],
];

/// 1-D Gaussian coefficients for `GaussianBlur`-style parameters on 8-bit images.
///
/// A `ksize` of 0 is derived from `sigma` with the 8-bit rule
/// (`round(2 * 3 * sigma + 1) | 1`; float images would use 4 sigma); a
/// non-positive `sigma` is derived from `ksize` (`0.3 * ((ksize - 1) / 2 - 1) + 0.8`).
pub fn get_gaussian_kernel(ksize: u32, sigma: f32) -> Result<Vec<f32>> {
    if ksize == 0 && sigma <= 0.0 {
        return Err(ImgprocError::InvalidParameter(
            "either ksize or sigma must be positive".into(),
        ));
    }
    let ksize = if ksize == 0 {
        ((sigma * 6.0 + 1.0).round() as u32) | 1
    } else {
        ksize
    };
    if ksize % 2 == 0 {
        return Err(ImgprocError::InvalidParameter(format!(
            "gaussian ksize must be odd, got {ksize}"
        )));
    }

    if sigma <= 0.0 && ksize <= 7 {
        return Ok(SMALL_GAUSSIAN[(ksize / 2) as usize].to_vec());
    }

    let sigma = if sigma > 0.0 {
        sigma
    } else {
        0.3 * ((ksize as f32 - 1.0) * 0.5 - 1.0) + 0.8
    };
    Ok(gaussian_kernel_1d(sigma, ksize as usize))
}

pub fn laplacian_kernel() -> Kernel {
    Kernel {
        data: vec![0.0, 1.0, 0.0, 1.0, -4.0, 1.0, 0.0, 1.0, 0.0],
        width: 3,
        height: 3,
    }
}

#[inline]
fn constant_value(border: BorderMode, channel: usize) -> f32 {
    match border {
        BorderMode::Constant(s) => s.channel(channel) as f32,
        _ => 0.0,
    }
}

#[inline]
fn saturate(v: f32) -> u8 {
    v.round().clamp(0.0, 255.0) as u8
}

/// Source index for every padded position along one axis.
fn axis_map(len: usize, before: usize, after: usize, border: BorderMode) -> Vec<Option<usize>> {
    (0..len + before + after)
        .map(|i| map_coord(i as isize - before as isize, len, border))
        .collect()
}

/// 2-D correlation with the kernel anchored at its centre, applied per channel.
pub fn filter2d<P: U8Pixel>(src: &Image<P>, kernel: &Kernel, border: BorderMode) -> Result<Image<P>> {
    validate_image_size(src.width(), src.height())?;
    let channels = P::CHANNEL_COUNT as usize;
    let (w, h) = (src.width() as usize, src.height() as usize);
    let (cx, cy) = kernel.center();
    let (cx, cy) = (cx as usize, cy as usize);

    let cols = axis_map(w, cx, kernel.width - 1 - cx, border);
    let rows = axis_map(h, cy, kernel.height - 1 - cy, border);
    let raw = src.as_raw();

    let mut dst = Image::<P>::new(src.width(), src.height());
    dst.as_mut()
        .par_chunks_mut(w * channels)
        .enumerate()
        .for_each(|(y, row)| {
            for x in 0..w {
                for c in 0..channels {
                    let mut sum = 0.0f32;
                    for ky in 0..kernel.height {
                        for kx in 0..kernel.width {
                            let sample = match (cols[x + kx], rows[y + ky]) {
                                (Some(ix), Some(iy)) => raw[(iy * w + ix) * channels + c] as f32,
                                _ => constant_value(border, c),
                            };
                            sum += sample * kernel.get(kx, ky);
                        }
                    }
                    row[x * channels + c] = saturate(sum);
                }
            }
        });

    Ok(dst)
}

/// Row pass with `kx` followed by a column pass with `ky`; each kernel is anchored at `len / 2`.
pub fn separable_filter<P: U8Pixel>(
    src: &Image<P>,
    kx: &[f32],
    ky: &[f32],
    border: BorderMode,
) -> Result<Image<P>> {
    validate_image_size(src.width(), src.height())?;
    if kx.is_empty() || ky.is_empty() {
        return Err(ImgprocError::InvalidParameter(
            "separable kernels must not be empty".into(),
        ));
    }

    let channels = P::CHANNEL_COUNT as usize;
    let (w, h) = (src.width() as usize, src.height() as usize);
    let stride = w * channels;
    let ax = kx.len() / 2;
    let ay = ky.len() / 2;
    let cols = axis_map(w, ax, kx.len() - 1 - ax, border);
    let raw = src.as_raw();

    let mut tmp = vec![0.0f32; stride * h];
    tmp.par_chunks_mut(stride)
        .enumerate()
        .for_each(|(y, row_out)| {
            let src_row = &raw[y * stride..(y + 1) * stride];
            let mut padded = vec![0.0f32; cols.len()];
            let mut filtered = vec![0.0f32; w];
            for c in 0..channels {
                for (p, col) in padded.iter_mut().zip(&cols) {
                    *p = match col {
                        Some(ix) => src_row[ix * channels + c] as f32,
                        None => constant_value(border, c),
                    };
                }
                convolve_row_1d(&padded, &mut filtered, kx);
                for (x, v) in filtered.iter().enumerate() {
                    row_out[x * channels + c] = *v;
                }
            }
        });

    // Rows outside a constant border are the constant passed through the row kernel.
    let kx_sum: f32 = kx.iter().sum();
    let constant_row: Vec<f32> = (0..stride)
        .map(|i| constant_value(border, i % channels) * kx_sum)
        .collect();

    let mut dst = Image::<P>::new(src.width(), src.height());
    dst.as_mut()
        .par_chunks_mut(stride)
        .enumerate()
        .for_each(|(y, row_out)| {
            let mut acc = vec![0.0f32; stride];
            for (k, &weight) in ky.iter().enumerate() {
                let sy = y as isize + k as isize - ay as isize;
                match map_coord(sy, h, border) {
                    Some(iy) => {
                        accumulate_weighted(&mut acc, &tmp[iy * stride..(iy + 1) * stride], weight)
                    }
                    None => accumulate_weighted(&mut acc, &constant_row, weight),
                }
            }
            for (out, v) in row_out.iter_mut().zip(&acc) {
                *out = saturate(*v);
            }
        });

    Ok(dst)
}

/// Normalised box filter of `ksize_w` x `ksize_h`.
pub fn blur<P: U8Pixel>(
    src: &Image<P>,
    ksize_w: u32,
    ksize_h: u32,
    border: BorderMode,
) -> Result<Image<P>> {
    if ksize_w == 0 || ksize_h == 0 {
        return Err(ImgprocError::InvalidParameter(format!(
            "box size must be positive, got {ksize_w}x{ksize_h}"
        )));
    }
    let kx = vec![1.0 / ksize_w as f32; ksize_w as usize];
    let ky = vec![1.0 / ksize_h as f32; ksize_h as usize];
    separable_filter(src, &kx, &ky, border)
}

pub fn gaussian_blur<P: U8Pixel>(
    src: &Image<P>,
    ksize: u32,
    sigma: f32,
    border: BorderMode,
) -> Result<Image<P>> {
    let kernel = get_gaussian_kernel(ksize, sigma)?;
    tracing::trace!(ksize = kernel.len(), sigma, "gaussian blur");
    separable_filter(src, &kernel, &kernel, border)
}

/// Median of each `ksize` x `ksize` neighbourhood, per channel, with replicated borders.
///
/// Uses a sliding 256-bin histogram per row so the cost grows linearly with `ksize`.
pub fn median_blur<P: U8Pixel>(src: &Image<P>, ksize: u32) -> Result<Image<P>> {
    validate_image_size(src.width(), src.height())?;
    if ksize == 0 || ksize % 2 == 0 {
        return Err(ImgprocError::InvalidParameter(format!(
            "median ksize must be odd and positive, got {ksize}"
        )));
    }
    if ksize == 1 {
        return Ok(src.clone());
    }

    let channels = P::CHANNEL_COUNT as usize;
    let (w, h) = (src.width() as usize, src.height() as usize);
    let r = (ksize / 2) as isize;
    let half = (ksize * ksize / 2) as u32;
    let raw = src.as_raw();

    let clamp_x = |x: isize| x.clamp(0, w as isize - 1) as usize;
    let clamp_y = |y: isize| y.clamp(0, h as isize - 1) as usize;

    let mut dst = Image::<P>::new(src.width(), src.height());
    dst.as_mut()
        .par_chunks_mut(w * channels)
        .enumerate()
        .for_each(|(y, row)| {
            let window_rows: Vec<usize> = (-r..=r).map(|dy| clamp_y(y as isize + dy)).collect();
            let sample = |x: usize, yy: usize, c: usize| raw[(yy * w + x) * channels + c];

            for c in 0..channels {
                let mut hist = [0u32; 256];
                for &yy in &window_rows {
                    for dx in -r..=r {
                        hist[sample(clamp_x(dx), yy, c) as usize] += 1;
                    }
                }

                // `median` is the smallest value whose cumulative count exceeds `half`;
                // `below` counts samples strictly less than it.
                let mut median = 0usize;
                let mut below = 0u32;
                while below + hist[median] <= half {
                    below += hist[median];
                    median += 1;
                }
                row[c] = median as u8;

                for x in 1..w {
                    let leaving = clamp_x(x as isize - 1 - r);
                    let entering = clamp_x(x as isize + r);
                    for &yy in &window_rows {
                        let out_v = sample(leaving, yy, c) as usize;
                        hist[out_v] -= 1;
                        if out_v < median {
                            below -= 1;
                        }
                        let in_v = sample(entering, yy, c) as usize;
                        hist[in_v] += 1;
                        if in_v < median {
                            below += 1;
                        }
                    }

                    while below > half {
                        median -= 1;
                        below -= hist[median];
                    }
                    while below + hist[median] <= half {
                        below += hist[median];
                        median += 1;
                    }
                    row[x * channels + c] = median as u8;
                }
            }
        });

    Ok(dst)
}

/// Laplacian sharpening: `src - amount * laplacian(src)`.
pub fn sharpen<P: U8Pixel>(src: &Image<P>, amount: f32) -> Result<Image<P>> {
    let mut kernel = laplacian_kernel();
    for v in &mut kernel.data {
        *v *= -amount;
    }
    let center = kernel.width / 2;
    kernel.data[center * kernel.width + center] += 1.0;
    filter2d(src, &kernel, BorderMode::DEFAULT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma, Rgb, RgbImage};

    #[test]
    fn gaussian_kernel_1d_is_normalized() {
        let k = gaussian_kernel_1d(1.2, 7);
        let sum: f32 = k.iter().sum();
        assert!((sum - 1.0).abs() < 1e-4);
    }

    #[test]
    fn small_kernels_without_sigma_are_binomial() {
        let k = get_gaussian_kernel(5, 0.0).unwrap();
        assert_eq!(k, vec![0.0625, 0.25, 0.375, 0.25, 0.0625]);
    }

    #[test]
    fn ksize_is_derived_from_sigma() {
        assert_eq!(get_gaussian_kernel(0, 1.0).unwrap().len(), 7);
        assert!(get_gaussian_kernel(0, 0.0).is_err());
        assert!(get_gaussian_kernel(4, 1.0).is_err());
    }

    #[test]
    fn averaging_a_constant_image_is_identity() {
        let img = RgbImage::from_pixel(20, 15, Rgb([17, 200, 93]));
        let out = filter2d(&img, &box_kernel(5), BorderMode::DEFAULT).unwrap();
        assert_eq!(out, img);
    }

    #[test]
    fn box_blur_matches_filter2d() {
        let img = GrayImage::from_fn(19, 11, |x, y| Luma([((x * 37 + y * 11) % 256) as u8]));
        let a = blur(&img, 5, 5, BorderMode::Reflect101).unwrap();
        let b = filter2d(&img, &box_kernel(5), BorderMode::Reflect101).unwrap();
        for (pa, pb) in a.as_raw().iter().zip(b.as_raw()) {
            assert!(pa.abs_diff(*pb) <= 1);
        }
    }

    #[test]
    fn constant_border_darkens_edges() {
        let img = GrayImage::from_pixel(9, 9, Luma([200]));
        let out = blur(&img, 3, 3, BorderMode::zero()).unwrap();
        assert_eq!(out.get_pixel(4, 4)[0], 200);
        // corner sees 4 of 9 samples inside the image
        assert_eq!(out.get_pixel(0, 0)[0], 89);
    }

    #[test]
    fn gaussian_blur_preserves_size_and_spreads_impulse() {
        let mut img = GrayImage::new(32, 24);
        img.put_pixel(10, 10, Luma([255]));

        let out = gaussian_blur(&img, 5, 0.0, BorderMode::Reflect101).unwrap();
        assert_eq!(out.dimensions(), img.dimensions());
        // centre weight of the 5-tap binomial kernel: 0.375^2 * 255
        assert_eq!(out.get_pixel(10, 10)[0], 36);
        assert!(out.get_pixel(11, 10)[0] > 0);
    }

    #[test]
    fn median_removes_salt_noise() {
        let mut img = GrayImage::from_pixel(12, 12, Luma([50]));
        img.put_pixel(3, 3, Luma([255]));
        img.put_pixel(8, 6, Luma([0]));
        let out = median_blur(&img, 3).unwrap();
        assert!(out.as_raw().iter().all(|&v| v == 50));
    }

    #[test]
    fn median_matches_sort_reference() {
        let img = GrayImage::from_fn(10, 7, |x, y| Luma([((x * 71 + y * 29) % 256) as u8]));
        let out = median_blur(&img, 5).unwrap();
        for y in 0..7i32 {
            for x in 0..10i32 {
                let mut window = Vec::new();
                for dy in -2..=2 {
                    for dx in -2..=2 {
                        let sx = (x + dx).clamp(0, 9) as u32;
                        let sy = (y + dy).clamp(0, 6) as u32;
                        window.push(img.get_pixel(sx, sy)[0]);
                    }
                }
                window.sort_unstable();
                assert_eq!(out.get_pixel(x as u32, y as u32)[0], window[12]);
            }
        }
    }

    #[test]
    fn median_rejects_even_ksize() {
        let img = GrayImage::new(4, 4);
        assert!(median_blur(&img, 4).is_err());
        assert_eq!(median_blur(&img, 1).unwrap(), img);
    }

    #[test]
    fn sharpen_keeps_flat_regions() {
        let img = GrayImage::from_pixel(6, 6, Luma([120]));
        assert_eq!(sharpen(&img, 1.0).unwrap(), img);
    }

    #[test]
    fn kernel_rejects_wrong_length() {
        assert!(Kernel::new(vec![1.0; 5], 2, 2).is_err());
        let mut k = Kernel::from_slice(&[1.0, 1.0, 2.0, 4.0], 2, 2).unwrap();
        k.normalize();
        assert!((k.get(1, 1) - 0.5).abs() < 1e-6);
    }
}
