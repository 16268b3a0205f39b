use crate::border::fetch;
use crate::resize::{cubic_weights, lanczos4_weights};
use crate::{validate_image_size, BorderMode, ImgprocError, Interpolation, Result};
use cv_core::{Image, U8Pixel};
use nalgebra::{Matrix2x3, Matrix3, Point2, SMatrix, SVector, Vector3};
use rayon::prelude::*;

/// Row-major 2x3 affine matrix, mapping source to destination coordinates.
pub type AffineMatrix = Matrix2x3<f32>;

pub fn get_translation_matrix(tx: f32, ty: f32) -> AffineMatrix {
    Matrix2x3::new(1.0, 0.0, tx, 0.0, 1.0, ty)
}

/// Rotation by `angle` degrees about `center`, counter-clockwise for positive angles
/// with the y-axis pointing down, followed by isotropic `scale`.
pub fn get_rotation_matrix_2d(center: Point2<f32>, angle: f32, scale: f32) -> AffineMatrix {
    let theta = (angle as f64).to_radians();
    let alpha = scale as f64 * theta.cos();
    let beta = scale as f64 * theta.sin();
    let (cx, cy) = (center.x as f64, center.y as f64);

    Matrix2x3::new(
        alpha,
        beta,
        (1.0 - alpha) * cx - beta * cy,
        -beta,
        alpha,
        beta * cx + (1.0 - alpha) * cy,
    )
    .cast::<f32>()
}

fn is_degenerate(a: &Point2<f32>, b: &Point2<f32>, c: &Point2<f32>) -> bool {
    let ab = (b - a).cast::<f64>();
    let ac = (c - a).cast::<f64>();
    let cross = ab.x * ac.y - ab.y * ac.x;
    let scale = ab.norm() * ac.norm();
    scale == 0.0 || cross.abs() <= 1e-9 * scale
}

fn ensure_general_position(points: &[Point2<f32>], what: &str) -> Result<()> {
    let n = points.len();
    for i in 0..n {
        for j in i + 1..n {
            for k in j + 1..n {
                if is_degenerate(&points[i], &points[j], &points[k]) {
                    return Err(ImgprocError::AlgorithmError(format!(
                        "{what} points {i}, {j}, {k} are collinear"
                    )));
                }
            }
        }
    }
    Ok(())
}

/// Affine matrix taking the three `src` points onto the three `dst` points.
pub fn get_affine_transform(src: &[Point2<f32>; 3], dst: &[Point2<f32>; 3]) -> Result<AffineMatrix> {
    ensure_general_position(src, "source")?;

    let a = Matrix3::from_fn(|r, c| match c {
        0 => src[r].x as f64,
        1 => src[r].y as f64,
        _ => 1.0,
    });
    let inv = a.try_inverse().ok_or_else(|| {
        ImgprocError::AlgorithmError("affine system is singular".into())
    })?;

    let u = inv * Vector3::new(dst[0].x as f64, dst[1].x as f64, dst[2].x as f64);
    let v = inv * Vector3::new(dst[0].y as f64, dst[1].y as f64, dst[2].y as f64);
    Ok(Matrix2x3::new(u[0], u[1], u[2], v[0], v[1], v[2]).cast::<f32>())
}

/// Homography taking the four `src` points onto the four `dst` points (`h33 = 1`).
pub fn get_perspective_transform(
    src: &[Point2<f32>; 4],
    dst: &[Point2<f32>; 4],
) -> Result<Matrix3<f32>> {
    ensure_general_position(src, "source")?;
    ensure_general_position(dst, "destination")?;

    let mut a = SMatrix::<f64, 8, 8>::zeros();
    let mut b = SVector::<f64, 8>::zeros();
    for i in 0..4 {
        let (x, y) = (src[i].x as f64, src[i].y as f64);
        let (u, v) = (dst[i].x as f64, dst[i].y as f64);
        let r = 2 * i;
        a.row_mut(r)
            .copy_from_slice(&[x, y, 1.0, 0.0, 0.0, 0.0, -x * u, -y * u]);
        a.row_mut(r + 1)
            .copy_from_slice(&[0.0, 0.0, 0.0, x, y, 1.0, -x * v, -y * v]);
        b[r] = u;
        b[r + 1] = v;
    }

    let h = a.lu().solve(&b).ok_or_else(|| {
        ImgprocError::AlgorithmError("perspective system is singular".into())
    })?;

    Ok(Matrix3::new(h[0], h[1], h[2], h[3], h[4], h[5], h[6], h[7], 1.0).cast::<f32>())
}

/// Lifts a 2x3 affine matrix to its 3x3 homogeneous form.
pub fn affine_to_homogeneous(m: &AffineMatrix) -> Matrix3<f32> {
    Matrix3::new(
        m[(0, 0)],
        m[(0, 1)],
        m[(0, 2)],
        m[(1, 0)],
        m[(1, 1)],
        m[(1, 2)],
        0.0,
        0.0,
        1.0,
    )
}

pub fn invert_affine_transform(m: &AffineMatrix) -> Result<AffineMatrix> {
    let m = m.cast::<f64>();
    let det = m[(0, 0)] * m[(1, 1)] - m[(0, 1)] * m[(1, 0)];
    if det.abs() < 1e-12 {
        return Err(ImgprocError::AlgorithmError(
            "affine matrix is not invertible".into(),
        ));
    }
    let inv_det = 1.0 / det;
    let a = m[(1, 1)] * inv_det;
    let b = -m[(0, 1)] * inv_det;
    let c = -m[(1, 0)] * inv_det;
    let d = m[(0, 0)] * inv_det;
    let tx = -(a * m[(0, 2)] + b * m[(1, 2)]);
    let ty = -(c * m[(0, 2)] + d * m[(1, 2)]);
    Ok(Matrix2x3::new(a, b, tx, c, d, ty).cast::<f32>())
}

pub fn transform_point(matrix: &Matrix3<f32>, pt: &Point2<f32>) -> Point2<f32> {
    let x = pt.x;
    let y = pt.y;

    let w = matrix[(2, 0)] * x + matrix[(2, 1)] * y + matrix[(2, 2)];
    let px = matrix[(0, 0)] * x + matrix[(0, 1)] * y + matrix[(0, 2)];
    let py = matrix[(1, 0)] * x + matrix[(1, 1)] * y + matrix[(1, 2)];

    if w.abs() > 1e-10 {
        Point2::new(px / w, py / w)
    } else {
        Point2::new(px, py)
    }
}

/// Interpolated sample of every channel at fractional source position `(x, y)`.
#[allow(clippy::too_many_arguments)]
fn interpolate_into(
    raw: &[u8],
    width: usize,
    height: usize,
    channels: usize,
    x: f32,
    y: f32,
    interpolation: Interpolation,
    border: BorderMode,
    out: &mut [u8],
) {
    let sample = |sx: isize, sy: isize, c: usize| fetch(raw, width, height, channels, sx, sy, c, border);
    let x0 = x.floor() as isize;
    let y0 = y.floor() as isize;
    let tx = x - x0 as f32;
    let ty = y - y0 as f32;

    for (c, o) in out.iter_mut().enumerate().take(channels) {
        let v = match interpolation {
            Interpolation::Nearest => sample(x.round() as isize, y.round() as isize, c),
            Interpolation::Linear | Interpolation::Area => {
                let v00 = sample(x0, y0, c);
                let v10 = sample(x0 + 1, y0, c);
                let v01 = sample(x0, y0 + 1, c);
                let v11 = sample(x0 + 1, y0 + 1, c);
                let top = v00 * (1.0 - tx) + v10 * tx;
                let bottom = v01 * (1.0 - tx) + v11 * tx;
                top * (1.0 - ty) + bottom * ty
            }
            Interpolation::Cubic => {
                let (wx, wy) = (cubic_weights(tx), cubic_weights(ty));
                let mut acc = 0.0;
                for (j, wyj) in wy.iter().enumerate() {
                    for (i, wxi) in wx.iter().enumerate() {
                        acc += wxi * wyj * sample(x0 - 1 + i as isize, y0 - 1 + j as isize, c);
                    }
                }
                acc
            }
            Interpolation::Lanczos4 => {
                let (wx, wy) = (lanczos4_weights(tx), lanczos4_weights(ty));
                let mut acc = 0.0;
                for (j, wyj) in wy.iter().enumerate() {
                    for (i, wxi) in wx.iter().enumerate() {
                        acc += wxi * wyj * sample(x0 - 3 + i as isize, y0 - 3 + j as isize, c);
                    }
                }
                acc
            }
        };
        *o = v.round().clamp(0.0, 255.0) as u8;
    }
}

/// Fills a `width` x `height` image by sampling `src` at `source_of(x, y)`.
fn warp_with<P, F>(
    src: &Image<P>,
    width: u32,
    height: u32,
    interpolation: Interpolation,
    border: BorderMode,
    source_of: F,
) -> Result<Image<P>>
where
    P: U8Pixel,
    F: Fn(usize, usize) -> (f32, f32) + Sync,
{
    validate_image_size(src.width(), src.height())?;
    validate_image_size(width, height)?;
    let channels = P::CHANNEL_COUNT as usize;
    let (sw, sh) = (src.width() as usize, src.height() as usize);
    let raw = src.as_raw();

    let mut dst = Image::<P>::new(width, height);
    dst.as_mut()
        .par_chunks_mut(width as usize * channels)
        .enumerate()
        .for_each(|(y, row)| {
            for (x, px) in row.chunks_mut(channels).enumerate() {
                let (sx, sy) = source_of(x, y);
                interpolate_into(raw, sw, sh, channels, sx, sy, interpolation, border, px);
            }
        });

    Ok(dst)
}

pub fn warp_perspective_ex<P: U8Pixel>(
    src: &Image<P>,
    matrix: &Matrix3<f32>,
    width: u32,
    height: u32,
    interpolation: Interpolation,
    border: BorderMode,
) -> Result<Image<P>> {
    // Inverse mapping: every destination pixel looks up its source position.
    let inv = matrix
        .cast::<f64>()
        .try_inverse()
        .ok_or_else(|| ImgprocError::AlgorithmError("perspective matrix is singular".into()))?
        .cast::<f32>();

    warp_with(src, width, height, interpolation, border, |x, y| {
        let p = transform_point(&inv, &Point2::new(x as f32, y as f32));
        (p.x, p.y)
    })
}

/// Perspective warp with bilinear sampling and a black constant border.
pub fn warp_perspective<P: U8Pixel>(
    src: &Image<P>,
    matrix: &Matrix3<f32>,
    width: u32,
    height: u32,
) -> Result<Image<P>> {
    warp_perspective_ex(
        src,
        matrix,
        width,
        height,
        Interpolation::Linear,
        BorderMode::zero(),
    )
}

pub fn warp_affine_ex<P: U8Pixel>(
    src: &Image<P>,
    matrix: &AffineMatrix,
    width: u32,
    height: u32,
    interpolation: Interpolation,
    border: BorderMode,
) -> Result<Image<P>> {
    let inv = invert_affine_transform(matrix)?;
    warp_with(src, width, height, interpolation, border, |x, y| {
        let (fx, fy) = (x as f32, y as f32);
        (
            inv[(0, 0)] * fx + inv[(0, 1)] * fy + inv[(0, 2)],
            inv[(1, 0)] * fx + inv[(1, 1)] * fy + inv[(1, 2)],
        )
    })
}

/// Affine warp with bilinear sampling and a black constant border.
pub fn warp_affine<P: U8Pixel>(
    src: &Image<P>,
    matrix: &AffineMatrix,
    width: u32,
    height: u32,
) -> Result<Image<P>> {
    warp_affine_ex(
        src,
        matrix,
        width,
        height,
        Interpolation::Linear,
        BorderMode::zero(),
    )
}

/// `dst(x, y) = src(map_x(x, y), map_y(x, y))` with maps stored row-major.
pub fn remap<P: U8Pixel>(
    src: &Image<P>,
    map_x: &[f32],
    map_y: &[f32],
    width: u32,
    height: u32,
    interpolation: Interpolation,
    border: BorderMode,
) -> Result<Image<P>> {
    let expected = width as usize * height as usize;
    if map_x.len() != expected || map_y.len() != expected {
        return Err(ImgprocError::DimensionMismatch(format!(
            "maps hold {} and {} entries, expected {expected}",
            map_x.len(),
            map_y.len()
        )));
    }
    let w = width as usize;
    warp_with(src, width, height, interpolation, border, |x, y| {
        (map_x[y * w + x], map_y[y * w + x])
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma, Rgb, RgbImage};

    fn close(a: Point2<f32>, b: Point2<f32>) -> bool {
        (a - b).norm() < 1e-2
    }

    #[test]
    fn remap_identity_keeps_pixels() {
        let mut img = GrayImage::new(6, 4);
        img.put_pixel(2, 1, Luma([200]));
        img.put_pixel(4, 3, Luma([123]));

        let (w, h) = img.dimensions();
        let map_x: Vec<f32> = (0..w * h).map(|i| (i % w) as f32).collect();
        let map_y: Vec<f32> = (0..w * h).map(|i| (i / w) as f32).collect();
        let out = remap(&img, &map_x, &map_y, w, h, Interpolation::Nearest, BorderMode::Replicate).unwrap();
        assert_eq!(out, img);

        assert!(remap(&img, &map_x[1..], &map_y, w, h, Interpolation::Linear, BorderMode::Replicate).is_err());
    }

    #[test]
    fn warp_affine_translation_moves_point() {
        let mut img = RgbImage::new(8, 8);
        img.put_pixel(2, 2, Rgb([255, 10, 20]));

        let m = get_translation_matrix(2.0, 1.0);
        for interp in [Interpolation::Nearest, Interpolation::Linear, Interpolation::Cubic] {
            let out = warp_affine_ex(&img, &m, 8, 8, interp, BorderMode::zero()).unwrap();
            assert_eq!(out.get_pixel(4, 3), &Rgb([255, 10, 20]), "{interp:?}");
            assert_eq!(out.get_pixel(2, 2), &Rgb([0, 0, 0]));
        }
    }

    #[test]
    fn rotation_matrix_matches_closed_form() {
        let m = get_rotation_matrix_2d(Point2::new(10.0, 20.0), 90.0, 1.0);
        let expected = [0.0, 1.0, -10.0, -1.0, 0.0, 30.0];
        for (i, e) in expected.iter().enumerate() {
            assert!((m[(i / 3, i % 3)] - e).abs() < 1e-4, "{m}");
        }
        // the centre is a fixed point
        let c = transform_point(&affine_to_homogeneous(&m), &Point2::new(10.0, 20.0));
        assert!(close(c, Point2::new(10.0, 20.0)));
    }

    #[test]
    fn affine_from_three_points() {
        let src = [Point2::new(50.0, 50.0), Point2::new(200.0, 50.0), Point2::new(50.0, 200.0)];
        let dst = [Point2::new(10.0, 100.0), Point2::new(200.0, 50.0), Point2::new(100.0, 250.0)];
        let m = affine_to_homogeneous(&get_affine_transform(&src, &dst).unwrap());
        for (s, d) in src.iter().zip(&dst) {
            assert!(close(transform_point(&m, s), *d));
        }
    }

    #[test]
    fn perspective_from_four_points() {
        let src = [
            Point2::new(56.0, 65.0),
            Point2::new(368.0, 52.0),
            Point2::new(28.0, 387.0),
            Point2::new(389.0, 390.0),
        ];
        let dst = [
            Point2::new(0.0, 0.0),
            Point2::new(300.0, 0.0),
            Point2::new(0.0, 300.0),
            Point2::new(300.0, 300.0),
        ];
        let m = get_perspective_transform(&src, &dst).unwrap();
        assert!((m[(2, 2)] - 1.0).abs() < 1e-6);
        for (s, d) in src.iter().zip(&dst) {
            assert!(close(transform_point(&m, s), *d));
        }
    }

    #[test]
    fn collinear_points_are_rejected() {
        let line = [Point2::new(0.0, 0.0), Point2::new(1.0, 1.0), Point2::new(2.0, 2.0)];
        let dst = [Point2::new(0.0, 0.0), Point2::new(1.0, 0.0), Point2::new(0.0, 1.0)];
        assert!(matches!(
            get_affine_transform(&line, &dst),
            Err(ImgprocError::AlgorithmError(_))
        ));

        let quad = [
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(2.0, 0.0),
            Point2::new(0.0, 1.0),
        ];
        let square = [
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(1.0, 1.0),
            Point2::new(0.0, 1.0),
        ];
        assert!(get_perspective_transform(&quad, &square).is_err());
    }

    #[test]
    fn invert_affine_round_trips() {
        let m = get_rotation_matrix_2d(Point2::new(3.0, 4.0), 33.0, 1.5);
        let inv = invert_affine_transform(&m).unwrap();
        let p = Point2::new(7.0, -2.0);
        let q = transform_point(&affine_to_homogeneous(&m), &p);
        assert!(close(transform_point(&affine_to_homogeneous(&inv), &q), p));

        let singular = Matrix2x3::new(1.0, 2.0, 0.0, 2.0, 4.0, 0.0);
        assert!(invert_affine_transform(&singular).is_err());
    }

    #[test]
    fn warp_perspective_identity_preserves_image() {
        let img = GrayImage::from_fn(7, 7, |x, y| Luma([(x * 30 + y) as u8]));
        let out = warp_perspective(&img, &Matrix3::identity(), 7, 7).unwrap();
        assert_eq!(out, img);
    }
}
