//! End-to-end checks across crates through the `cv_tutorials` facade.

use cv_tutorials::core::{roi, split, Rect};
use cv_tutorials::imgproc::{
    cvt_color_to_gray, flip, gaussian_blur, threshold, BorderMode, ColorConversion, FlipCode,
    ThresholdType,
};
use cv_tutorials::videoio::{open_video, open_writer, CaptureProperty, FourCC};
use cv_tutorials::viewer::{Figure, HighGui};
use image::{Rgb, RgbImage};
use tempfile::tempdir;

fn stripes(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, _| {
        if (x / 8) % 2 == 0 {
            Rgb([220, 40, 40])
        } else {
            Rgb([20, 20, 200])
        }
    })
}

#[test]
fn test_thread_pool_init_is_idempotent() {
    let first = cv_tutorials::init_thread_pool(Some(2));
    let second = cv_tutorials::init_thread_pool(Some(8));
    assert_eq!(first.is_ok(), second.is_ok());
}

#[test]
fn test_png_roundtrip_then_gray_read() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("image.png");
    let img = stripes(64, 32);
    cv_tutorials::io::imwrite(&path, &img).unwrap();

    let color = cv_tutorials::io::imread_color(&path).unwrap();
    assert_eq!(color, img);

    let gray = cv_tutorials::io::imread_gray(&path).unwrap();
    assert_eq!(gray, cvt_color_to_gray(&img, ColorConversion::RgbToGray).unwrap());
}

#[test]
fn test_flipped_video_recording() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("output.avi");

    let mut writer = open_writer(&path, FourCC::MJPG, 20.0, (64, 48), true).unwrap();
    for i in 0..4u32 {
        let mut frame = RgbImage::from_pixel(64, 48, Rgb([0, 0, 0]));
        // bright band in the top rows only
        for y in 0..(8 + i) {
            for x in 0..64 {
                frame.put_pixel(x, y, Rgb([250, 250, 250]));
            }
        }
        writer.write(&flip(&frame, FlipCode::Vertical)).unwrap();
    }
    writer.release().unwrap();

    let mut cap = open_video(&path).unwrap();
    assert_eq!(cap.get(CaptureProperty::FrameCount), Some(4.0));
    assert_eq!(cap.get(CaptureProperty::Fps), Some(20.0));
    let frame = cap.read().unwrap();
    // the band ended up at the bottom
    assert!(frame.get_pixel(32, 46)[0] > 200);
    assert!(frame.get_pixel(32, 2)[0] < 50);
}

#[test]
fn test_blur_threshold_and_figure() {
    let img = stripes(96, 64);
    let gray = cvt_color_to_gray(&img, ColorConversion::RgbToGray).unwrap();
    let smooth = gaussian_blur(&gray, 5, 0.0, BorderMode::DEFAULT).unwrap();
    let binary = threshold(&smooth, 60, 255, ThresholdType::Binary);

    let mut figure = Figure::new(1, 3);
    figure
        .subplot(1, "input", &img)
        .unwrap()
        .subplot(2, "blurred", &smooth)
        .unwrap()
        .subplot(3, "binary", &binary)
        .unwrap();
    let canvas = figure.render().unwrap();
    assert!(canvas.width() >= 3 * 96);
    assert!(canvas.height() >= 64);

    let planes = split(&roi(&img, Rect::new(0, 0, 8, 8)).unwrap());
    assert_eq!(planes.len(), 3);
    assert!(planes[0].pixels().all(|p| p[0] == 220));
}

#[test]
fn test_highgui_model_without_a_display() {
    let mut gui = HighGui::new();
    gui.imshow("frame", &stripes(16, 16));
    gui.create_trackbar("H", "frame", 10, 179).unwrap();
    gui.push_key('q' as i32);

    assert_eq!(gui.get_trackbar_pos("H", "frame").unwrap(), 10);
    assert_eq!(gui.wait_key(1), Some('q' as i32));
    assert_eq!(gui.wait_key(1), None);
    gui.destroy_all_windows();
    assert!(gui.windows().is_empty());
}
