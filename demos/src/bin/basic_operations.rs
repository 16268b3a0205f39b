//! Pixel access, image properties, region copies, channel planes and the
//! five border types.

use cv_core::{
    dtype, extract_channel, fill_channel, item, item_set, merge, paste, roi, shape, split,
    try_get_pixel, try_put_pixel, Rect, Scalar,
};
use cv_demos::{samples, DemoArgs, Presenter};
use cv_imgproc::{copy_make_border, BorderMode};
use cv_viewer::Figure;
use image::{Rgb, RgbImage};

// Planes are stored red, green, blue.
const RED: u8 = 0;
const BLUE: u8 = 2;

fn main() -> anyhow::Result<()> {
    let args = DemoArgs::init()?;
    let mut img = args.color_input(samples::pitch_scene)?;
    let mut presenter = Presenter::new("Basic operations", &args);

    // Single pixels
    println!("pixel at (100, 100): {:?}", try_get_pixel(&img, 100, 100)?.0);
    println!("blue channel value at (100, 100): {}", item(&img, 100, 100, BLUE)?);
    try_put_pixel(&mut img, 100, 100, Rgb([255, 255, 255]))?;
    println!("pixel at (100, 100): {:?}", img.get_pixel(100, 100).0);

    println!("red channel value at (10, 10): {}", item(&img, 10, 10, RED)?);
    item_set(&mut img, 10, 10, RED, 100)?;
    println!("red channel value at (10, 10): {}", item(&img, 10, 10, RED)?);

    // Properties
    let extent = shape(&img);
    println!("image shape: {extent}");
    println!("image size (number of pixels * channels): {}", extent.size());
    println!("image data type: {}", dtype(&img));

    // Copy the ball to another spot
    let ball = roi(&img, Rect::from_ranges(280..340, 330..390))?;
    paste(&mut img, &ball, 100, 273)?;
    presenter.imshow("ball moved", &img);

    // Planes
    let planes = split(&img);
    let img: RgbImage = merge(&planes)?;
    let red = extract_channel(&img, RED)?;
    tracing::debug!(same = red == planes[RED as usize], "plane via split and via extract_channel");
    let mut no_red = img.clone();
    fill_channel(&mut no_red, RED, 0)?;
    presenter.imshow("red channel zeroed", &no_red);

    // Borders
    let logo = args.color_input(|| samples::logo(160))?;
    let pad = |mode| copy_make_border(&logo, 10, 10, 10, 10, mode);
    let blue = Scalar::from([0, 0, 255]);
    let mut figure = Figure::new(2, 3);
    figure
        .subplot(1, "ORIGINAL", &logo)?
        .subplot(2, "CONSTANT", &pad(BorderMode::Constant(blue)))?
        .subplot(3, "REFLECT", &pad(BorderMode::Reflect))?
        .subplot(4, "REFLECT_101", &pad(BorderMode::Reflect101))?
        .subplot(5, "REPLICATE", &pad(BorderMode::Replicate))?
        .subplot(6, "WRAP", &pad(BorderMode::Wrap))?;
    presenter.figure("Border types", &figure)?;

    presenter.show()
}
