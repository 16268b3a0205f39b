//! Lists the mouse event names, then paints a filled circle wherever the
//! canvas is double-clicked. Esc quits.

use cv_demos::{DemoArgs, Presenter};
use cv_imgproc::{circle, LineType, FILLED};
use cv_viewer::{keys, Flow, MouseEvent, MouseEventKind};
use image::{Rgb, RgbImage};

const WINDOW: &str = "image";

fn main() -> anyhow::Result<()> {
    let args = DemoArgs::init()?;
    for kind in MouseEventKind::ALL {
        println!("{}", kind.name());
    }

    let mut canvas = RgbImage::new(512, 512);
    let mut presenter = Presenter::new("Mouse events", &args);
    let headless = presenter.is_headless();
    let gui = presenter.gui();
    gui.imshow(WINDOW, &canvas);
    gui.enable_mouse_events(WINDOW)?;
    if headless {
        gui.push_mouse_event(
            WINDOW,
            MouseEvent {
                kind: MouseEventKind::LButtonDblClk,
                x: 256,
                y: 256,
                flags: 0,
                delta: 0.0,
            },
        )?;
    }

    presenter.run(args.max_frames, move |gui| {
        for event in gui.take_mouse_events(WINDOW)? {
            tracing::debug!(event = event.kind.name(), event.x, event.y, "mouse");
            if event.kind == MouseEventKind::LButtonDblClk {
                circle(&mut canvas, (event.x, event.y), 100, Rgb([0, 0, 255]), FILLED, LineType::Connected8);
                gui.imshow(WINDOW, &canvas);
            }
        }
        Ok(if gui.wait_key(20) == Some(keys::ESC) {
            Flow::Exit
        } else {
            Flow::Continue
        })
    })
}
