//! Saturating versus wrapping addition, weighted blending, and pasting a
//! non-rectangular logo with threshold masks and bitwise operations.

use cv_core::{paste, roi, Rect};
use cv_demos::{samples, DemoArgs, Presenter};
use cv_imgproc::{
    add, add_wrapping, add_weighted, bitwise_and, bitwise_not, cvt_color_to_gray, resize,
    threshold, ColorConversion, Interpolation, ThresholdType,
};
use image::{GrayImage, Luma};

fn main() -> anyhow::Result<()> {
    let args = DemoArgs::init()?;
    let mut presenter = Presenter::new("Arithmetic operations", &args);

    let x = GrayImage::from_pixel(1, 1, Luma([250]));
    let y = GrayImage::from_pixel(1, 1, Luma([10]));
    println!("saturated: {}", add(&x, &y)?.get_pixel(0, 0)[0]);
    println!("wrapping:  {}", add_wrapping(&x, &y)?.get_pixel(0, 0)[0]);

    // Blending: dst = 0.7 * img1 + 0.3 * img2
    let img1 = samples::banner(240, 240, "ML");
    let img2 = resize(&samples::logo(512), img1.width(), img1.height(), Interpolation::Area)?;
    presenter.imshow("blend", &add_weighted(&img1, 0.7, &img2, 0.3, 0.0)?);

    // Logo in the top-right corner, opaque
    let mut img1 = args.color_input(samples::pitch_scene)?;
    let img2 = samples::logo(128);
    let (cols, rows) = img2.dimensions();
    anyhow::ensure!(
        img1.width() >= cols && img1.height() >= rows,
        "input must be at least {cols}x{rows}"
    );
    let start_col = img1.width() - cols;
    let corner = roi(&img1, Rect::new(start_col, 0, cols, rows))?;

    let img2gray = cvt_color_to_gray(&img2, ColorConversion::RgbToGray)?;
    let mask = threshold(&img2gray, 10, 255, ThresholdType::Binary);
    let mask_inv = bitwise_not(&mask);

    let img1_bg = bitwise_and(&corner, &corner, Some(&mask_inv))?;
    let img2_fg = bitwise_and(&img2, &img2, Some(&mask))?;
    let dst = add(&img1_bg, &img2_fg)?;
    paste(&mut img1, &dst, start_col, 0)?;

    presenter.imshow("img2gray", &img2gray);
    presenter.imshow("mask", &mask);
    presenter.imshow("mask_inv", &mask_inv);
    presenter.imshow("img1_bg", &img1_bg);
    presenter.imshow("img2_fg", &img2_fg);
    presenter.imshow("dst", &dst);
    presenter.imshow("res", &img1);
    presenter.show()
}
