//! Read an image in colour, save it as PNG, load the PNG back in grayscale
//! and show it in a resizable window until a key is pressed.

use anyhow::Context;
use cv_demos::{samples, DemoArgs, Presenter};
use cv_viewer::WindowFlags;

fn main() -> anyhow::Result<()> {
    let args = DemoArgs::init()?;
    let img = args.color_input(samples::portrait)?;
    tracing::info!(width = img.width(), height = img.height(), "loaded colour image");

    let mut presenter = Presenter::new("Read, display and write", &args);
    let path = presenter.output_path("image.png")?;
    cv_io::imwrite(&path, &img).with_context(|| format!("writing {}", path.display()))?;

    let gray = cv_io::imread_gray(&path)?;
    presenter.gui().named_window("Saved as PNG", WindowFlags::Normal);
    presenter.imshow("Saved as PNG", &gray);
    presenter.show()
}
