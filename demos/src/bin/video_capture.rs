//! Show grayscale frames from camera 0 (or `--input`) until `q` is pressed.

use cv_demos::{DemoArgs, Presenter};
use cv_imgproc::{cvt_color_to_gray, ColorConversion};
use cv_videoio::{CaptureProperty, VideoError};
use cv_viewer::Flow;

fn main() -> anyhow::Result<()> {
    let args = DemoArgs::init()?;
    let mut cap = args.open_capture()?;
    tracing::info!(
        width = ?cap.get(CaptureProperty::FrameWidth),
        height = ?cap.get(CaptureProperty::FrameHeight),
        "capture opened"
    );

    Presenter::new("Video capture", &args).run(args.frame_limit(), move |gui| {
        match cap.read() {
            Ok(frame) => gui.imshow("frame", &cvt_color_to_gray(&frame, ColorConversion::RgbToGray)?),
            Err(VideoError::EndOfStream) => return Ok(Flow::Exit),
            Err(e) => {
                tracing::warn!(error = %e, "frame read failed, stopping");
                return Ok(Flow::Exit);
            }
        }

        if gui.wait_key(1) == Some('q' as i32) {
            cap.release();
            return Ok(Flow::Exit);
        }
        Ok(Flow::Continue)
    })
}
