use cv_core::{paste, roi, Rect};
use cv_demos::samples::{self, BouncingBall, BALL_CENTER};
use cv_imgproc::*;
use nalgebra::Point2;

#[test]
fn test_tracking_masks_pick_out_blue_and_yellow() {
    let frame = BouncingBall::new((640, 480), 10).render(0);
    let hsv = cvt_color_rgb(&frame, ColorConversion::RgbToHsv).unwrap();
    let mask_b = in_range(&hsv, [110, 50, 50], [130, 255, 255]);
    let mask_y = in_range(&hsv, [20, 50, 50], [40, 255, 255]);

    // Frame 0: ball touches the top-left corner, block sits at x = 160 on the floor.
    assert_eq!(mask_b.get_pixel(48, 48)[0], 255);
    assert_eq!(mask_y.get_pixel(208, 432)[0], 255);
    assert_eq!(mask_b.get_pixel(400, 100)[0], 0);
    assert_eq!(mask_y.get_pixel(400, 100)[0], 0);

    let mask = bitwise_or(&mask_b, &mask_y, None).unwrap();
    let res = bitwise_and(&frame, &frame, Some(&mask)).unwrap();
    assert_eq!(res.get_pixel(400, 100).0, [0, 0, 0]);
    assert_eq!(res.get_pixel(48, 48), frame.get_pixel(48, 48));
}

#[test]
fn test_adaptive_threshold_keeps_shadowed_paper_white() {
    let page = median_blur(&samples::uneven_page(420, 300), 5).unwrap();
    let global = threshold(&page, 127, 255, ThresholdType::Binary);
    let adaptive = adaptive_threshold(
        &page,
        255,
        AdaptiveMethod::MeanC,
        ThresholdType::Binary,
        11,
        2.0,
    )
    .unwrap();

    // left margin is blank paper in the dark half of the page
    assert_eq!(global.get_pixel(8, 150)[0], 0);
    assert_eq!(adaptive.get_pixel(8, 150)[0], 255);
}

#[test]
fn test_sudoku_rectifies_to_square() {
    let sudoku = samples::sudoku();
    let src = samples::SUDOKU_CORNERS.map(|(x, y)| Point2::new(x, y));
    let dst = [
        Point2::new(0.0, 0.0),
        Point2::new(300.0, 0.0),
        Point2::new(0.0, 300.0),
        Point2::new(300.0, 300.0),
    ];
    let m = get_perspective_transform(&src, &dst).unwrap();
    let out = warp_perspective(&sudoku, &m, 300, 300).unwrap();
    assert_eq!(out.dimensions(), (300, 300));

    let gray = cvt_color_to_gray(&out, ColorConversion::RgbToGray).unwrap();
    // corner sits on the thick outer frame; cell (3, 3) is empty paper
    assert!(gray.get_pixel(1, 1)[0] < 100);
    assert!(gray.get_pixel(117, 117)[0] > 150);
}

#[test]
fn test_logo_overlay_is_opaque_and_keeps_background() {
    let mut scene = samples::pitch_scene();
    let original = scene.clone();
    let logo = samples::logo(128);
    let start_col = scene.width() - 128;
    let corner = roi(&scene, Rect::new(start_col, 0, 128, 128)).unwrap();

    let gray = cvt_color_to_gray(&logo, ColorConversion::RgbToGray).unwrap();
    let mask = threshold(&gray, 10, 255, ThresholdType::Binary);
    let mask_inv = bitwise_not(&mask);
    let bg = bitwise_and(&corner, &corner, Some(&mask_inv)).unwrap();
    let fg = bitwise_and(&logo, &logo, Some(&mask)).unwrap();
    paste(&mut scene, &add(&bg, &fg).unwrap(), start_col, 0).unwrap();

    // black logo background lets the scene through
    assert_eq!(scene.get_pixel(start_col, 0), original.get_pixel(start_col, 0));
    // masked logo pixels replace the scene
    let (x, y) = (0..128u32)
        .flat_map(|y| (0..128u32).map(move |x| (x, y)))
        .find(|&(x, y)| mask.get_pixel(x, y)[0] == 255)
        .unwrap();
    assert_eq!(scene.get_pixel(start_col + x, y), logo.get_pixel(x, y));
}

#[test]
fn test_ball_roi_copy() {
    let mut img = samples::pitch_scene();
    let ball = roi(&img, Rect::from_ranges(280..340, 330..390)).unwrap();
    paste(&mut img, &ball, 100, 273).unwrap();
    let (bx, by) = (BALL_CENTER.0 as u32 - 330 + 100, BALL_CENTER.1 as u32 - 280 + 273);
    assert_eq!(img.get_pixel(bx + 15, by), img.get_pixel(BALL_CENTER.0 as u32 + 15, BALL_CENTER.1 as u32));
}
