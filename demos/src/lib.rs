//! Shared plumbing for the tutorial binaries in `src/bin`.
//!
//! Every binary accepts the same [`DemoArgs`]. Without `--input` the
//! tutorials run on images from [`samples`], and with `--headless` every
//! window is written to `--output-dir` as a PNG instead of being shown.

pub mod presenter;
pub mod samples;

pub use presenter::Presenter;

use anyhow::Context;
use clap::Parser;
use cv_videoio::VideoCapture;
use image::{GrayImage, RgbImage};
use std::path::PathBuf;

/// Frames processed by a headless demo reading an endless source.
pub const DEFAULT_HEADLESS_FRAMES: u32 = 100;

#[derive(Debug, Clone, Parser)]
#[command(version, about)]
pub struct DemoArgs {
    /// Image or video to use instead of the built-in sample
    #[arg(long, short)]
    pub input: Option<PathBuf>,

    /// Where headless runs and tutorials that write files put their output
    #[arg(long, default_value = "output")]
    pub output_dir: PathBuf,

    /// Save every window as a PNG instead of opening a viewer
    #[arg(long)]
    pub headless: bool,

    /// Size of the CPU thread pool (defaults to RUSTCV_CPU_THREADS, then all cores)
    #[arg(long)]
    pub threads: Option<usize>,

    /// Stop video demos after this many frames
    #[arg(long)]
    pub max_frames: Option<u32>,
}

impl DemoArgs {
    /// Parses the command line, then sets up logging and the thread pool.
    pub fn init() -> anyhow::Result<Self> {
        let args = Self::parse();
        init_logging();
        cv_core::init_global_thread_pool(args.threads).context("thread pool")?;
        tracing::debug!(?args, "demo arguments");
        Ok(args)
    }

    /// `--input` as a colour image, or `fallback()` when no input was given.
    pub fn color_input(&self, fallback: impl FnOnce() -> RgbImage) -> anyhow::Result<RgbImage> {
        match &self.input {
            Some(path) => cv_io::imread_color(path)
                .with_context(|| format!("reading {}", path.display())),
            None => Ok(fallback()),
        }
    }

    pub fn gray_input(&self, fallback: impl FnOnce() -> GrayImage) -> anyhow::Result<GrayImage> {
        match &self.input {
            Some(path) => cv_io::imread_gray(path)
                .with_context(|| format!("reading {}", path.display())),
            None => Ok(fallback()),
        }
    }

    /// Opens `--input` as a video, else camera 0. Without `--input`, an
    /// unavailable camera is replaced by a synthetic clip.
    pub fn open_capture(&self) -> anyhow::Result<Box<dyn VideoCapture>> {
        if let Some(path) = &self.input {
            return cv_videoio::open_video(path)
                .with_context(|| format!("opening {}", path.display()));
        }
        match cv_videoio::open_capture(0u32) {
            Ok(cap) => Ok(cap),
            Err(e) => {
                tracing::warn!(error = %e, "camera 0 unavailable, using a synthetic clip");
                Ok(Box::new(samples::BouncingBall::new(
                    cv_videoio::DEFAULT_CAMERA_SIZE,
                    self.max_frames.unwrap_or(DEFAULT_HEADLESS_FRAMES),
                )))
            }
        }
    }

    /// Frame budget for a loop that has no keyboard to stop it.
    pub fn frame_limit(&self) -> Option<u32> {
        match (self.max_frames, self.headless) {
            (Some(n), _) => Some(n),
            (None, true) => Some(DEFAULT_HEADLESS_FRAMES),
            (None, false) => None,
        }
    }
}

/// Installs a `tracing` subscriber filtered by `RUST_LOG`, `info` by default.
///
/// Calling it again is a no-op.
pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .try_init();
}

/// Lower-case file stem for a window title: `"Saved as PNG"` -> `"saved_as_png"`.
pub fn file_stem(title: &str) -> String {
    let mut stem = String::with_capacity(title.len());
    for c in title.chars() {
        if c.is_ascii_alphanumeric() {
            stem.push(c.to_ascii_lowercase());
        } else if !stem.ends_with('_') {
            stem.push('_');
        }
    }
    let trimmed = stem.trim_matches('_');
    if trimmed.is_empty() {
        "window".to_string()
    } else {
        trimmed.to_string()
    }
}
