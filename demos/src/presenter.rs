use crate::{file_stem, DemoArgs};
use anyhow::Context;
use cv_core::{Image, U8Pixel};
use cv_viewer::{Figure, Flow, HighGui};
use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;

/// Shows demo windows, or saves them when running headless.
///
/// Windows live in a [`HighGui`] either way. A headless run writes each
/// window's last image to `<output-dir>/<window title>.png` when it ends.
#[derive(Debug)]
pub struct Presenter {
    app_name: String,
    headless: bool,
    output_dir: PathBuf,
    gui: HighGui,
}

impl Presenter {
    pub fn new(app_name: &str, args: &DemoArgs) -> Self {
        Self {
            app_name: app_name.to_string(),
            headless: args.headless,
            output_dir: args.output_dir.clone(),
            gui: HighGui::new(),
        }
    }

    pub fn is_headless(&self) -> bool {
        self.headless
    }

    pub fn gui(&mut self) -> &mut HighGui {
        &mut self.gui
    }

    pub fn imshow<P: U8Pixel>(&mut self, name: &str, img: &Image<P>) {
        self.gui.imshow(name, img);
    }

    pub fn figure(&mut self, name: &str, figure: &Figure) -> anyhow::Result<()> {
        let canvas = figure.render().with_context(|| format!("rendering '{name}'"))?;
        self.gui.imshow(name, &canvas);
        Ok(())
    }

    /// Path under the output directory, creating the directory if needed.
    pub fn output_path(&self, file_name: &str) -> anyhow::Result<PathBuf> {
        std::fs::create_dir_all(&self.output_dir)
            .with_context(|| format!("creating {}", self.output_dir.display()))?;
        Ok(self.output_dir.join(file_name))
    }

    /// Writes the current image of every window and returns the files written.
    pub fn save_windows(&self) -> anyhow::Result<Vec<PathBuf>> {
        let mut written = Vec::new();
        for window in self.gui.windows() {
            let Some(image) = window.image() else { continue };
            let path = self.output_path(&format!("{}.png", file_stem(&window.name)))?;
            cv_io::imwrite(&path, image).with_context(|| format!("writing {}", path.display()))?;
            tracing::info!(window = %window.name, path = %path.display(), "saved window");
            written.push(path);
        }
        Ok(written)
    }

    /// Ends the demo: saves the windows, or shows them until a key is pressed.
    pub fn show(self) -> anyhow::Result<()> {
        self.run(None, |gui| {
            Ok(match gui.wait_key(0) {
                Some(_) => Flow::Exit,
                None => Flow::Continue,
            })
        })
    }

    /// Drives `step` once per frame until it returns [`Flow::Exit`] or
    /// `limit` frames have run.
    ///
    /// Headless runs call `step` back to back and save the windows at the
    /// end; a headless loop without `limit` runs a single step.
    pub fn run<F>(mut self, limit: Option<u32>, mut step: F) -> anyhow::Result<()>
    where
        F: FnMut(&mut HighGui) -> anyhow::Result<Flow> + 'static,
    {
        if self.headless {
            let frames = limit.unwrap_or(1);
            for _ in 0..frames {
                if step(&mut self.gui)? == Flow::Exit {
                    break;
                }
            }
            self.save_windows()?;
            return Ok(());
        }

        if self.gui.windows().is_empty() && limit.is_none() {
            return Ok(());
        }

        let failure: Rc<RefCell<Option<anyhow::Error>>> = Rc::default();
        let sink = Rc::clone(&failure);
        let mut frames = 0u32;
        cv_viewer::run(&self.app_name, self.gui, move |gui| {
            if limit.is_some_and(|n| frames >= n) {
                return Flow::Exit;
            }
            frames += 1;
            match step(gui) {
                Ok(flow) => flow,
                Err(e) => {
                    *sink.borrow_mut() = Some(e);
                    Flow::Exit
                }
            }
        })
        .context("viewer")?;

        let result = failure.borrow_mut().take();
        match result {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}
