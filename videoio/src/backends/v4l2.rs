//! Video4Linux2 capture backend

use crate::{CaptureProperty, Result, VideoCapture, VideoError};
use image::RgbImage;
use v4l::buffer::Type;
use v4l::format::FourCC;
use v4l::io::traits::CaptureStream;
use v4l::prelude::*;
use v4l::video::Capture;

pub struct V4L2Capture {
    device: Device,
    stream: Option<MmapStream<'static>>,
    frame: Vec<u8>,
    width: u32,
    height: u32,
}

impl std::fmt::Debug for V4L2Capture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("V4L2Capture")
            .field("device", &"v4l::Device")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("stream_active", &self.stream.is_some())
            .finish()
    }
}

fn clamp_u8(v: i32) -> u8 {
    v.clamp(0, 255) as u8
}

/// BT.601 studio-swing YUYV 4:2:2 to packed RGB.
pub fn yuyv_to_rgb(data: &[u8], width: u32, height: u32) -> Result<RgbImage> {
    let pixels = width as usize * height as usize;
    if data.len() < pixels * 2 {
        return Err(VideoError::CaptureFailed(format!(
            "YUYV buffer holds {} bytes, expected {}",
            data.len(),
            pixels * 2
        )));
    }

    let mut rgb = RgbImage::new(width, height);
    for (out, yuyv) in rgb.chunks_exact_mut(6).zip(data.chunks_exact(4)) {
        let u = yuyv[1] as i32 - 128;
        let v = yuyv[3] as i32 - 128;
        for (px, y) in out.chunks_exact_mut(3).zip([yuyv[0], yuyv[2]]) {
            let c = 298 * (y as i32 - 16);
            px[0] = clamp_u8((c + 409 * v + 128) >> 8);
            px[1] = clamp_u8((c - 100 * u - 208 * v + 128) >> 8);
            px[2] = clamp_u8((c + 516 * u + 128) >> 8);
        }
    }
    Ok(rgb)
}

impl V4L2Capture {
    pub fn new(path: &str) -> Result<Self> {
        let device = Device::with_path(path)
            .map_err(|e| VideoError::Backend(format!("Failed to open device: {}", e)))?;

        Ok(Self {
            device,
            stream: None,
            frame: Vec::new(),
            width: 0,
            height: 0,
        })
    }

    pub fn start_stream(&mut self, width: u32, height: u32) -> Result<()> {
        let mut fmt = self
            .device
            .format()
            .map_err(|e| VideoError::Backend(format!("Failed to get format: {}", e)))?;

        fmt.width = width;
        fmt.height = height;
        fmt.fourcc = FourCC::new(b"YUYV");

        // The driver may pick the nearest supported size.
        let fmt = self
            .device
            .set_format(&fmt)
            .map_err(|e| VideoError::Backend(format!("Failed to set format: {}", e)))?;
        if fmt.fourcc != FourCC::new(b"YUYV") {
            return Err(VideoError::Backend(format!(
                "device does not deliver YUYV (got {})",
                fmt.fourcc
            )));
        }
        self.width = fmt.width;
        self.height = fmt.height;

        let stream = MmapStream::with_buffers(&self.device, Type::VideoCapture, 4)
            .map_err(|e| VideoError::Backend(format!("Failed to create stream: {}", e)))?;

        tracing::debug!(width = self.width, height = self.height, "V4L2 stream started");
        self.stream = Some(stream);
        Ok(())
    }
}

impl VideoCapture for V4L2Capture {
    fn is_opened(&self) -> bool {
        self.stream.is_some()
    }

    fn grab(&mut self) -> Result<()> {
        let stream = self
            .stream
            .as_mut()
            .ok_or_else(|| VideoError::CaptureFailed("Stream not started".to_string()))?;

        let (data, _metadata) = stream
            .next()
            .map_err(|e| VideoError::CaptureFailed(format!("Failed to grab frame: {}", e)))?;
        self.frame.clear();
        self.frame.extend_from_slice(data);
        Ok(())
    }

    fn retrieve(&mut self) -> Result<RgbImage> {
        if self.frame.is_empty() {
            return Err(VideoError::CaptureFailed("no frame grabbed".into()));
        }
        yuyv_to_rgb(&self.frame, self.width, self.height)
    }

    fn get(&self, prop: CaptureProperty) -> Option<f64> {
        match prop {
            CaptureProperty::FrameWidth => Some(self.width as f64),
            CaptureProperty::FrameHeight => Some(self.height as f64),
            _ => None,
        }
    }

    fn release(&mut self) {
        self.stream = None;
        self.frame.clear();
    }
}
