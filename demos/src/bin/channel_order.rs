//! A buffer laid out blue-green-red looks wrong when displayed as RGB.
//! Splitting it into planes and merging them back as `[r, g, b]` fixes it.

use anyhow::anyhow;
use cv_core::{merge, split};
use cv_demos::{samples, DemoArgs, Presenter};
use cv_imgproc::{cvt_color_rgb, ColorConversion};
use cv_viewer::Figure;
use image::{GrayImage, RgbImage};

fn main() -> anyhow::Result<()> {
    let args = DemoArgs::init()?;
    let img = args.color_input(samples::portrait)?;

    // What a BGR decoder would have produced.
    let img_bgr = cvt_color_rgb(&img, ColorConversion::RgbToBgr)?;

    let [b, g, r] = <[GrayImage; 3]>::try_from(split(&img_bgr))
        .map_err(|planes| anyhow!("expected 3 planes, got {}", planes.len()))?;
    let img_rgb: RgbImage = merge(&[r, g, b])?;
    tracing::info!(restored = img_rgb == img, "merged planes in RGB order");

    let mut presenter = Presenter::new("Channel order", &args);
    let mut figure = Figure::new(1, 2);
    figure
        .subplot(1, "BGR buffer", &img_bgr)?
        .subplot(2, "merged as RGB", &img_rgb)?;
    presenter.figure("BGR vs RGB", &figure)?;

    presenter.imshow("bgr image", &img_bgr);
    presenter.imshow("rgb image", &img_rgb);
    presenter.show()
}
