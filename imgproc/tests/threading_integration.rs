use cv_imgproc::color::{convert_gray_to_rgb_in_pool, convert_rgb_to_gray_in_pool};
use cv_imgproc::{gaussian_blur, median_blur, BorderMode};
use image::{GrayImage, Luma, Rgb, RgbImage};
use rayon::ThreadPoolBuilder;

#[test]
fn test_custom_pool_execution() {
    // Create a strict pool with 1 thread to verify it works even under constraints
    let pool = ThreadPoolBuilder::new().num_threads(1).build().unwrap();

    let rgb = RgbImage::from_pixel(100, 100, Rgb([100, 150, 200]));

    // Run conversion in custom pool
    let gray = convert_rgb_to_gray_in_pool(&rgb, Some(&pool));

    assert_eq!(gray.width(), 100);
    // 0.299*100 + 0.587*150 + 0.114*200 = 141.25 -> 141
    assert_eq!(gray.get_pixel(0, 0)[0], 141);

    // And back out to three channels in the same pool
    let back = convert_gray_to_rgb_in_pool(&gray, Some(&pool));
    assert_eq!(back.get_pixel(99, 99), &Rgb([141, 141, 141]));
}

#[test]
fn test_filters_agree_across_pool_sizes() {
    let img = GrayImage::from_fn(64, 48, |x, y| Luma([((x * 7 + y * 13) % 256) as u8]));

    let single = ThreadPoolBuilder::new().num_threads(1).build().unwrap();
    let wide = ThreadPoolBuilder::new().num_threads(4).build().unwrap();

    let a = single.install(|| gaussian_blur(&img, 5, 0.0, BorderMode::DEFAULT).unwrap());
    let b = wide.install(|| gaussian_blur(&img, 5, 0.0, BorderMode::DEFAULT).unwrap());
    assert_eq!(a, b);

    let a = single.install(|| median_blur(&img, 5).unwrap());
    let b = wide.install(|| median_blur(&img, 5).unwrap());
    assert_eq!(a, b);
}
