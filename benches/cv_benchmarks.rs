//! Benchmarks for the image kernels the tutorials lean on
//!
//! Smoothing filters, colour conversion, warps and MJPG video encoding

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use cv_imgproc::{BorderMode, ColorConversion, Interpolation};
use image::{GrayImage, Luma, Rgb, RgbImage};
use nalgebra::Point2;
use std::time::Duration;

/// Checkerboard with a diagonal ramp so filters see both edges and gradients
fn create_test_image(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        let check = if ((x / 16) + (y / 16)) % 2 == 0 { 200 } else { 40 };
        let ramp = ((x + y) % 256) as u8;
        Rgb([check, ramp, 255 - ramp])
    })
}

fn create_gray_image(width: u32, height: u32) -> GrayImage {
    GrayImage::from_fn(width, height, |x, y| Luma([((x * 7 + y * 3) % 256) as u8]))
}

fn benchmark_smoothing(c: &mut Criterion) {
    let mut group = c.benchmark_group("smoothing");
    group.measurement_time(Duration::from_secs(5));

    for size in [256u32, 512, 1024] {
        let img = create_test_image(size, size);
        let label = format!("{}x{}", size, size);

        group.bench_with_input(BenchmarkId::new("gaussian_blur_5", &label), &img, |b, i| {
            b.iter(|| cv_imgproc::gaussian_blur(black_box(i), 5, 0.0, BorderMode::DEFAULT));
        });

        group.bench_with_input(BenchmarkId::new("box_blur_5", &label), &img, |b, i| {
            b.iter(|| cv_imgproc::blur(black_box(i), 5, 5, BorderMode::DEFAULT));
        });

        group.bench_with_input(BenchmarkId::new("filter2d_5", &label), &img, |b, i| {
            let kernel = cv_imgproc::box_kernel(5);
            b.iter(|| cv_imgproc::filter2d(black_box(i), &kernel, BorderMode::DEFAULT));
        });

        group.bench_with_input(BenchmarkId::new("median_blur_5", &label), &img, |b, i| {
            b.iter(|| cv_imgproc::median_blur(black_box(i), 5));
        });
    }

    // The performance tutorial's worst case
    let img = create_test_image(512, 512);
    for ksize in [5u32, 21, 47] {
        group.bench_with_input(BenchmarkId::new("median_blur_512", ksize), &ksize, |b, &k| {
            b.iter(|| cv_imgproc::median_blur(black_box(&img), k));
        });
    }

    group.sample_size(10);
    group.bench_function("bilateral_d9_256", |b| {
        let img = create_test_image(256, 256);
        b.iter(|| cv_imgproc::bilateral_filter(black_box(&img), 9, 75.0, 75.0));
    });

    group.finish();
}

fn benchmark_color_and_threshold(c: &mut Criterion) {
    let mut group = c.benchmark_group("color_and_threshold");
    group.measurement_time(Duration::from_secs(5));

    for size in [512u32, 1024] {
        let img = create_test_image(size, size);
        let gray = create_gray_image(size, size);
        let label = format!("{}x{}", size, size);

        group.bench_with_input(BenchmarkId::new("rgb_to_gray", &label), &img, |b, i| {
            b.iter(|| cv_imgproc::convert_rgb_to_gray(black_box(i)));
        });

        group.bench_with_input(BenchmarkId::new("rgb_to_hsv", &label), &img, |b, i| {
            b.iter(|| cv_imgproc::cvt_color_rgb(black_box(i), ColorConversion::RgbToHsv));
        });

        group.bench_with_input(BenchmarkId::new("adaptive_gaussian_11", &label), &gray, |b, g| {
            b.iter(|| {
                cv_imgproc::adaptive_threshold(
                    black_box(g),
                    255,
                    cv_imgproc::AdaptiveMethod::GaussianC,
                    cv_imgproc::ThresholdType::Binary,
                    11,
                    2.0,
                )
            });
        });
    }

    group.finish();
}

fn benchmark_geometry(c: &mut Criterion) {
    let mut group = c.benchmark_group("geometry");
    group.measurement_time(Duration::from_secs(5));

    let img = create_test_image(512, 512);
    let center = Point2::new(256.0, 256.0);
    let rotation = cv_imgproc::get_rotation_matrix_2d(center, 30.0, 1.0);
    let homography = cv_imgproc::get_perspective_transform(
        &[
            Point2::new(60.0, 68.0),
            Point2::new(389.0, 54.0),
            Point2::new(31.0, 405.0),
            Point2::new(412.0, 409.0),
        ],
        &[
            Point2::new(0.0, 0.0),
            Point2::new(300.0, 0.0),
            Point2::new(0.0, 300.0),
            Point2::new(300.0, 300.0),
        ],
    )
    .expect("corners in general position");

    for interpolation in [Interpolation::Nearest, Interpolation::Linear, Interpolation::Cubic] {
        group.bench_with_input(
            BenchmarkId::new("resize_x2", format!("{:?}", interpolation)),
            &interpolation,
            |b, &interp| {
                b.iter(|| cv_imgproc::resize(black_box(&img), 1024, 1024, interp));
            },
        );
    }

    group.bench_function("warp_affine_rotate_512", |b| {
        b.iter(|| cv_imgproc::warp_affine(black_box(&img), &rotation, 512, 512));
    });

    group.bench_function("warp_perspective_300", |b| {
        b.iter(|| cv_imgproc::warp_perspective(black_box(&img), &homography, 300, 300));
    });

    group.finish();
}

fn benchmark_video_encoding(c: &mut Criterion) {
    use cv_videoio::{AviWriter, FourCC, VideoWriter};

    let mut group = c.benchmark_group("video_encoding");
    group.sample_size(10);

    let frame = create_test_image(640, 480);
    let dir = tempfile::tempdir().expect("temp dir for benchmark output");
    group.bench_function("avi_mjpg_640x480_frame", |b| {
        let mut writer = AviWriter::create(
            dir.path().join("bench.avi"),
            FourCC::MJPG,
            20.0,
            (640, 480),
            true,
        )
        .expect("writer");
        b.iter(|| writer.write(black_box(&frame)));
        let _ = writer.release();
    });

    group.finish();
}

criterion_group!(
    benches,
    benchmark_smoothing,
    benchmark_color_and_threshold,
    benchmark_geometry,
    benchmark_video_encoding
);
criterion_main!(benches);
