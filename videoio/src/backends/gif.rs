use crate::{CaptureProperty, Result, VideoCapture, VideoError};
use image::{AnimationDecoder, DynamicImage, RgbImage};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Animated GIF decoded up front; frames are composited RGBA flattened to RGB.
pub struct GifCapture {
    frames: Vec<image::Frame>,
    current_idx: usize,
    grabbed: Option<usize>,
    fps: f64,
    opened: bool,
}

impl std::fmt::Debug for GifCapture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GifCapture")
            .field("frame_count", &self.frames.len())
            .field("current_idx", &self.current_idx)
            .finish()
    }
}

impl GifCapture {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        let decoder = image::codecs::gif::GifDecoder::new(reader)
            .map_err(|e| VideoError::Backend(format!("Failed to decode GIF: {}", e)))?;

        let frames = decoder
            .into_frames()
            .collect_frames()
            .map_err(|e| VideoError::Backend(format!("Failed to collect frames: {}", e)))?;

        if frames.is_empty() {
            return Err(VideoError::Backend("GIF contains no frames".to_string()));
        }

        // GIF delays are per frame; report the first one as the stream rate.
        let (num, den) = frames[0].delay().numer_denom_ms();
        let fps = if num == 0 { 10.0 } else { 1000.0 * den as f64 / num as f64 };

        Ok(Self {
            frames,
            current_idx: 0,
            grabbed: None,
            fps,
            opened: true,
        })
    }
}

impl VideoCapture for GifCapture {
    fn is_opened(&self) -> bool {
        self.opened && !self.frames.is_empty()
    }

    fn grab(&mut self) -> Result<()> {
        if !self.opened {
            return Err(VideoError::CaptureFailed("capture released".into()));
        }
        if self.current_idx < self.frames.len() {
            self.grabbed = Some(self.current_idx);
            self.current_idx += 1;
            Ok(())
        } else {
            self.grabbed = None;
            Err(VideoError::EndOfStream)
        }
    }

    fn retrieve(&mut self) -> Result<RgbImage> {
        let idx = self
            .grabbed
            .ok_or_else(|| VideoError::CaptureFailed("no frame grabbed".into()))?;
        let frame = &self.frames[idx];
        Ok(DynamicImage::ImageRgba8(frame.buffer().clone()).into_rgb8())
    }

    fn get(&self, prop: CaptureProperty) -> Option<f64> {
        let first = self.frames.first()?.buffer();
        Some(match prop {
            CaptureProperty::FrameWidth => first.width() as f64,
            CaptureProperty::FrameHeight => first.height() as f64,
            CaptureProperty::Fps => self.fps,
            CaptureProperty::FrameCount => self.frames.len() as f64,
            CaptureProperty::PosFrames => self.current_idx as f64,
        })
    }

    fn set(&mut self, prop: CaptureProperty, value: f64) -> bool {
        match prop {
            CaptureProperty::PosFrames if value >= 0.0 && value <= self.frames.len() as f64 => {
                self.current_idx = value as usize;
                self.grabbed = None;
                true
            }
            _ => false,
        }
    }

    fn release(&mut self) {
        self.opened = false;
        self.frames.clear();
        self.grabbed = None;
    }
}
