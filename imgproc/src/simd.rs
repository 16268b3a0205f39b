//! `wide`-based inner loops shared by the separable filters.

use wide::f32x8;

/// 1-D correlation of a padded row.
///
/// `src` holds `dst.len() + kernel.len() - 1` samples; `dst[x]` receives
/// `sum(kernel[k] * src[x + k])`.
pub fn convolve_row_1d(src: &[f32], dst: &mut [f32], kernel: &[f32]) {
    let width = dst.len();
    debug_assert!(src.len() + 1 >= width + kernel.len());

    let simd_end = width - width % 8;
    for x in (0..simd_end).step_by(8) {
        let mut sum_v = f32x8::ZERO;
        for (k, &w) in kernel.iter().enumerate() {
            let mut chunk = [0.0f32; 8];
            chunk.copy_from_slice(&src[x + k..x + k + 8]);
            sum_v += f32x8::from(chunk) * f32x8::splat(w);
        }
        let res: [f32; 8] = sum_v.into();
        dst[x..x + 8].copy_from_slice(&res);
    }

    for x in simd_end..width {
        dst[x] = kernel
            .iter()
            .enumerate()
            .map(|(k, &w)| src[x + k] * w)
            .sum();
    }
}

/// Accumulates `weight * row` into `acc`, eight lanes at a time.
pub fn accumulate_weighted(acc: &mut [f32], row: &[f32], weight: f32) {
    debug_assert_eq!(acc.len(), row.len());
    let len = acc.len();
    let simd_end = len - len % 8;
    let w = f32x8::splat(weight);

    for i in (0..simd_end).step_by(8) {
        let mut a = [0.0f32; 8];
        let mut r = [0.0f32; 8];
        a.copy_from_slice(&acc[i..i + 8]);
        r.copy_from_slice(&row[i..i + 8]);
        let res: [f32; 8] = (f32x8::from(a) + f32x8::from(r) * w).into();
        acc[i..i + 8].copy_from_slice(&res);
    }
    for i in simd_end..len {
        acc[i] += row[i] * weight;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn convolve_row_matches_scalar_for_ragged_width() {
        let width = 13;
        let kernel = [0.25f32, 0.5, 0.25];
        let src: Vec<f32> = (0..width + 2).map(|v| v as f32).collect();
        let mut dst = vec![0.0f32; width];
        convolve_row_1d(&src, &mut dst, &kernel);

        for x in 0..width {
            let expected = src[x] * 0.25 + src[x + 1] * 0.5 + src[x + 2] * 0.25;
            assert!((dst[x] - expected).abs() < 1e-5, "x={x}");
        }
    }

    #[test]
    fn accumulate_handles_tail() {
        let mut acc = vec![1.0f32; 11];
        let row: Vec<f32> = (0..11).map(|v| v as f32).collect();
        accumulate_weighted(&mut acc, &row, 2.0);
        assert_eq!(acc[10], 21.0);
        assert_eq!(acc[0], 1.0);
    }
}
