//! The OpenCV logo drawn with three thick anti-aliased elliptic arcs and text.

use cv_demos::{DemoArgs, Presenter};
use cv_imgproc::{ellipse, put_text, FontFace, LineType};
use image::{Rgb, RgbImage};

const THICKNESS: i32 = 40;
const RADIUS: i32 = 64;

fn main() -> anyhow::Result<()> {
    let args = DemoArgs::init()?;
    let mut img = RgbImage::new(512, 512);

    let axes = (RADIUS, RADIUS);
    let center_y = 256 + RADIUS / 2;
    // Each ring leaves a 90 degree gap, turned by the ellipse angle.
    ellipse(&mut img, (256, 128), axes, 90.0, 45.0, 315.0, Rgb([255, 0, 0]), THICKNESS, LineType::AntiAliased);
    ellipse(&mut img, (150, center_y), axes, -45.0, 45.0, 315.0, Rgb([0, 255, 0]), THICKNESS, LineType::AntiAliased);
    ellipse(&mut img, (362, center_y), axes, -90.0, 45.0, 315.0, Rgb([0, 0, 255]), THICKNESS, LineType::AntiAliased);

    put_text(
        &mut img,
        "OpenCV",
        (70, 464),
        FontFace::Simplex,
        3.0,
        Rgb([255, 255, 255]),
        4,
        LineType::AntiAliased,
    );

    let mut presenter = Presenter::new("Drawing", &args);
    presenter.imshow("OpenCV Logo", &img);
    presenter.show()
}
