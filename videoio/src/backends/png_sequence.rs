use crate::{CaptureProperty, Result, VideoCapture, VideoError, VideoWriter};
use image::RgbImage;
use std::fs;
use std::path::{Path, PathBuf};

/// Writes frames as `<prefix>_000000.png`, `<prefix>_000001.png`, ...
#[derive(Debug)]
pub struct PngSequenceWriter {
    directory: PathBuf,
    prefix: String,
    frame_count: usize,
    released: bool,
}

impl PngSequenceWriter {
    pub fn new<P: AsRef<Path>>(directory: P, prefix: &str) -> Result<Self> {
        let directory = directory.as_ref();
        if !directory.exists() {
            fs::create_dir_all(directory)?;
        }

        Ok(Self {
            directory: directory.to_path_buf(),
            prefix: prefix.to_string(),
            frame_count: 0,
            released: false,
        })
    }

    pub fn frame_count(&self) -> usize {
        self.frame_count
    }
}

impl VideoWriter for PngSequenceWriter {
    fn write(&mut self, frame: &RgbImage) -> Result<()> {
        if self.released {
            return Err(VideoError::InvalidParameters("writer already released".into()));
        }
        let filename = format!("{}_{:06}.png", self.prefix, self.frame_count);
        let path = self.directory.join(filename);

        cv_io::imwrite(&path, frame)
            .map_err(|e| VideoError::Backend(format!("Failed to save frame: {}", e)))?;
        self.frame_count += 1;
        Ok(())
    }

    fn is_opened(&self) -> bool {
        !self.released
    }

    fn release(&mut self) -> Result<()> {
        self.released = true;
        Ok(())
    }
}

/// Reads every `.png` in a directory in file-name order.
#[derive(Debug)]
pub struct PngSequenceCapture {
    files: Vec<PathBuf>,
    next: usize,
    grabbed: Option<usize>,
    opened: bool,
}

impl PngSequenceCapture {
    pub fn new<P: AsRef<Path>>(directory: P) -> Result<Self> {
        let directory = directory.as_ref();
        let mut files = Vec::new();
        for entry in fs::read_dir(directory)? {
            let path = entry?.path();
            let is_png = path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case("png"));
            if is_png {
                files.push(path);
            }
        }
        if files.is_empty() {
            return Err(VideoError::Backend(format!(
                "no PNG frames in {}",
                directory.display()
            )));
        }
        files.sort();

        tracing::debug!(dir = %directory.display(), frames = files.len(), "opened PNG sequence");
        Ok(Self {
            files,
            next: 0,
            grabbed: None,
            opened: true,
        })
    }
}

impl VideoCapture for PngSequenceCapture {
    fn is_opened(&self) -> bool {
        self.opened
    }

    fn grab(&mut self) -> Result<()> {
        if !self.opened {
            return Err(VideoError::CaptureFailed("capture released".into()));
        }
        if self.next >= self.files.len() {
            self.grabbed = None;
            return Err(VideoError::EndOfStream);
        }
        self.grabbed = Some(self.next);
        self.next += 1;
        Ok(())
    }

    fn retrieve(&mut self) -> Result<RgbImage> {
        let idx = self
            .grabbed
            .ok_or_else(|| VideoError::CaptureFailed("no frame grabbed".into()))?;
        cv_io::imread_color(&self.files[idx])
            .map_err(|e| VideoError::CaptureFailed(format!("{}: {e}", self.files[idx].display())))
    }

    fn get(&self, prop: CaptureProperty) -> Option<f64> {
        match prop {
            CaptureProperty::FrameCount => Some(self.files.len() as f64),
            CaptureProperty::PosFrames => Some(self.next as f64),
            _ => None,
        }
    }

    fn set(&mut self, prop: CaptureProperty, value: f64) -> bool {
        match prop {
            CaptureProperty::PosFrames if value >= 0.0 && value <= self.files.len() as f64 => {
                self.next = value as usize;
                self.grabbed = None;
                true
            }
            _ => false,
        }
    }

    fn release(&mut self) {
        self.opened = false;
        self.grabbed = None;
    }
}
