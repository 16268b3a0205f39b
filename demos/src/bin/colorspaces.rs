//! Colour conversion codes, an HSV palette driven by trackbars, and
//! tracking blue and yellow objects by thresholding frames in HSV.

use cv_demos::{DemoArgs, Presenter};
use cv_imgproc::{
    bitwise_and, bitwise_or, cvt_color_rgb, hsv_to_rgb, in_range, ColorConversion,
};
use cv_videoio::VideoError;
use cv_viewer::{keys, Flow};
use image::{Rgb, RgbImage};

const PALETTE: &str = "image";
const LOWER_BLUE: [u8; 3] = [110, 50, 50];
const UPPER_BLUE: [u8; 3] = [130, 255, 255];
const LOWER_YELLOW: [u8; 3] = [20, 50, 50];
const UPPER_YELLOW: [u8; 3] = [40, 255, 255];

fn main() -> anyhow::Result<()> {
    let args = DemoArgs::init()?;

    for code in ColorConversion::ALL {
        println!("{code}");
    }
    println!("Number of flags: {}", ColorConversion::ALL.len());

    let red = RgbImage::from_pixel(1, 1, Rgb([255, 0, 0]));
    let hsv_red = cvt_color_rgb(&red, ColorConversion::RgbToHsv)?;
    println!("HSV of pure red: {:?}", hsv_red.get_pixel(0, 0).0);

    let mut presenter = Presenter::new("Colour spaces", &args);
    let gui = presenter.gui();
    let mut palette = RgbImage::new(512, 300);
    gui.imshow(PALETTE, &palette);
    gui.create_trackbar("H", PALETTE, 0, 179)?;
    gui.create_trackbar("S", PALETTE, 0, 255)?;
    gui.create_trackbar("V", PALETTE, 0, 255)?;

    let mut cap = args.open_capture()?;
    let mut tracking = true;

    presenter.run(args.frame_limit(), move |gui| {
        let h = gui.get_trackbar_pos("H", PALETTE)?;
        let s = gui.get_trackbar_pos("S", PALETTE)?;
        let v = gui.get_trackbar_pos("V", PALETTE)?;
        let color = Rgb(hsv_to_rgb([h as u8, s as u8, v as u8]));
        if palette.get_pixel(0, 0) != &color {
            palette.pixels_mut().for_each(|p| *p = color);
            gui.imshow(PALETTE, &palette);
        }

        if tracking {
            match cap.read() {
                Ok(frame) => {
                    let hsv = cvt_color_rgb(&frame, ColorConversion::RgbToHsv)?;
                    let mask_b = in_range(&hsv, LOWER_BLUE, UPPER_BLUE);
                    let mask_y = in_range(&hsv, LOWER_YELLOW, UPPER_YELLOW);
                    let mask = bitwise_or(&mask_b, &mask_y, None)?;
                    let res = bitwise_and(&frame, &frame, Some(&mask))?;

                    gui.imshow("frame", &frame);
                    gui.imshow("mask", &mask);
                    gui.imshow("res", &res);
                }
                Err(VideoError::EndOfStream) => tracking = false,
                Err(e) => {
                    tracing::warn!(error = %e, "capture failed, tracking stopped");
                    tracking = false;
                }
            }
        }

        Ok(if gui.wait_key(5) == Some(keys::ESC) {
            Flow::Exit
        } else {
            Flow::Continue
        })
    })
}
