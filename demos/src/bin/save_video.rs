//! Record camera 0 (or `--input`) flipped upside down into `output.avi`,
//! an MJPG stream at 20 fps, until `q` is pressed or the source runs dry.

use cv_demos::{DemoArgs, Presenter};
use cv_imgproc::{flip, resize, FlipCode, Interpolation};
use cv_videoio::{open_writer, FourCC, VideoError};
use cv_viewer::Flow;
use std::cell::RefCell;
use std::rc::Rc;

const FPS: f64 = 20.0;
const FRAME_SIZE: (u32, u32) = (640, 480);

fn main() -> anyhow::Result<()> {
    let args = DemoArgs::init()?;
    let mut cap = args.open_capture()?;
    let presenter = Presenter::new("Save video", &args);

    let path = presenter.output_path("output.avi")?;
    let out = Rc::new(RefCell::new(open_writer(&path, FourCC::MJPG, FPS, FRAME_SIZE, true)?));
    let sink = Rc::clone(&out);

    presenter.run(args.frame_limit(), move |gui| {
        let frame = match cap.read() {
            Ok(frame) => frame,
            Err(VideoError::EndOfStream) => return Ok(Flow::Exit),
            Err(e) => {
                tracing::warn!(error = %e, "frame read failed, stopping");
                return Ok(Flow::Exit);
            }
        };

        let mut frame = flip(&frame, FlipCode::Vertical);
        if frame.dimensions() != FRAME_SIZE {
            frame = resize(&frame, FRAME_SIZE.0, FRAME_SIZE.1, Interpolation::Linear)?;
        }
        sink.borrow_mut().write(&frame)?;

        gui.imshow("frame", &frame);
        Ok(if gui.wait_key(1) == Some('q' as i32) {
            Flow::Exit
        } else {
            Flow::Continue
        })
    })?;

    out.borrow_mut().release()?;
    tracing::info!(path = %path.display(), "video written");
    Ok(())
}
