//! Native FFmpeg video capture backend using ffmpeg-next

use crate::{CaptureProperty, Result, VideoCapture, VideoError};
use ffmpeg_next as ffmpeg;
use image::RgbImage;
use std::path::Path;

pub struct NativeFfmpegCapture {
    ictx: ffmpeg::format::context::Input,
    decoder: ffmpeg::decoder::Video,
    stream_index: usize,
    width: u32,
    height: u32,
    fps: f64,
    frame_count: i64,
    position: u64,
    scaler: ffmpeg::software::scaling::Context,
    pending: Option<RgbImage>,
    eof_sent: bool,
    opened: bool,
}

impl std::fmt::Debug for NativeFfmpegCapture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NativeFfmpegCapture")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("fps", &self.fps)
            .finish()
    }
}

// The decoder and scaler hold raw FFmpeg pointers; the capture only ever
// touches them from the thread that currently owns it.
unsafe impl Send for NativeFfmpegCapture {}

fn backend<E: std::fmt::Display>(what: &'static str) -> impl FnOnce(E) -> VideoError {
    move |e| VideoError::Backend(format!("{what}: {e}"))
}

impl NativeFfmpegCapture {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        ffmpeg::init().map_err(backend("FFmpeg init failed"))?;

        let ictx = ffmpeg::format::input(&path.as_ref()).map_err(backend("Failed to open input"))?;

        let input = ictx
            .streams()
            .best(ffmpeg::media::Type::Video)
            .ok_or_else(|| VideoError::Backend("No video stream found".to_string()))?;

        let stream_index = input.index();
        let rate = input.avg_frame_rate();
        let fps = if rate.denominator() != 0 {
            rate.numerator() as f64 / rate.denominator() as f64
        } else {
            0.0
        };
        let frame_count = input.frames();
        let context = ffmpeg::codec::context::Context::from_parameters(input.parameters())
            .map_err(backend("Failed to get codec context"))?;

        let decoder = context
            .decoder()
            .video()
            .map_err(backend("Failed to get decoder"))?;

        let width = decoder.width();
        let height = decoder.height();

        let scaler = ffmpeg::software::scaling::context::Context::get(
            decoder.format(),
            width,
            height,
            ffmpeg::format::Pixel::RGB24,
            width,
            height,
            ffmpeg::software::scaling::flag::Flags::BILINEAR,
        )
        .map_err(backend("Failed to initialize scaler"))?;

        tracing::debug!(width, height, fps, "opened FFmpeg input");
        Ok(Self {
            ictx,
            decoder,
            stream_index,
            width,
            height,
            fps,
            frame_count,
            position: 0,
            scaler,
            pending: None,
            eof_sent: false,
            opened: true,
        })
    }

    fn convert(&mut self, decoded: &ffmpeg::util::frame::Video) -> Result<RgbImage> {
        let mut rgb_frame = ffmpeg::util::frame::Video::empty();
        self.scaler
            .run(decoded, &mut rgb_frame)
            .map_err(backend("Scaling failed"))?;

        // Rows may be padded to the frame stride.
        let stride = rgb_frame.stride(0);
        let row_bytes = self.width as usize * 3;
        let data = rgb_frame.data(0);
        let mut out = RgbImage::new(self.width, self.height);
        for (y, row) in out.chunks_exact_mut(row_bytes).enumerate() {
            row.copy_from_slice(&data[y * stride..y * stride + row_bytes]);
        }
        Ok(out)
    }

    fn decode_next(&mut self) -> Result<RgbImage> {
        let mut decoded = ffmpeg::util::frame::Video::empty();
        loop {
            if self.decoder.receive_frame(&mut decoded).is_ok() {
                return self.convert(&decoded);
            }
            if self.eof_sent {
                return Err(VideoError::EndOfStream);
            }

            let mut sent = false;
            for (stream, packet) in self.ictx.packets() {
                if stream.index() == self.stream_index {
                    self.decoder
                        .send_packet(&packet)
                        .map_err(backend("Failed to send packet"))?;
                    sent = true;
                    break;
                }
            }
            if !sent {
                self.decoder.send_eof().map_err(backend("Failed to flush decoder"))?;
                self.eof_sent = true;
            }
        }
    }
}

impl VideoCapture for NativeFfmpegCapture {
    fn is_opened(&self) -> bool {
        self.opened
    }

    fn grab(&mut self) -> Result<()> {
        if !self.opened {
            return Err(VideoError::CaptureFailed("capture released".into()));
        }
        let frame = self.decode_next()?;
        self.pending = Some(frame);
        self.position += 1;
        Ok(())
    }

    fn retrieve(&mut self) -> Result<RgbImage> {
        self.pending
            .clone()
            .ok_or_else(|| VideoError::CaptureFailed("no frame grabbed".into()))
    }

    fn get(&self, prop: CaptureProperty) -> Option<f64> {
        match prop {
            CaptureProperty::FrameWidth => Some(self.width as f64),
            CaptureProperty::FrameHeight => Some(self.height as f64),
            CaptureProperty::Fps => Some(self.fps),
            CaptureProperty::FrameCount if self.frame_count > 0 => Some(self.frame_count as f64),
            CaptureProperty::FrameCount => None,
            CaptureProperty::PosFrames => Some(self.position as f64),
        }
    }

    fn release(&mut self) {
        self.opened = false;
        self.pending = None;
    }
}
