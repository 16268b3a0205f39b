//! Video input/output and camera capture
//!
//! This crate provides a unified interface for capturing video from cameras
//! and reading/writing video files. Frames are RGB buffers.

use image::RgbImage;
use std::fmt::{self, Debug};
use std::path::{Path, PathBuf};
use std::str::FromStr;

pub mod backends;

pub use backends::{AviCapture, AviWriter, GifCapture, PngSequenceCapture, PngSequenceWriter};

pub type Result<T> = std::result::Result<T, VideoError>;

#[derive(Debug, thiserror::Error)]
pub enum VideoError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Backend error: {0}")]
    Backend(String),

    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),

    #[error("Capture failed: {0}")]
    CaptureFailed(String),

    #[error("Unsupported codec: {0}")]
    UnsupportedCodec(FourCC),

    #[error("End of stream")]
    EndOfStream,
}

/// Four-character code naming a video codec.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct FourCC(pub [u8; 4]);

impl FourCC {
    pub const MJPG: FourCC = FourCC(*b"MJPG");

    pub const fn new(code: &[u8; 4]) -> Self {
        FourCC(*code)
    }

    pub fn from_chars(a: char, b: char, c: char, d: char) -> Result<Self> {
        let mut code = [0u8; 4];
        for (slot, ch) in code.iter_mut().zip([a, b, c, d]) {
            *slot = u8::try_from(ch)
                .ok()
                .filter(u8::is_ascii)
                .ok_or_else(|| VideoError::InvalidParameters(format!("{ch:?} is not ASCII")))?;
        }
        Ok(FourCC(code))
    }

    /// Packs the code with the first character in the low byte.
    pub fn as_u32(&self) -> u32 {
        u32::from_le_bytes(self.0)
    }

    pub fn from_u32(value: u32) -> Self {
        FourCC(value.to_le_bytes())
    }
}

impl FromStr for FourCC {
    type Err = VideoError;

    fn from_str(s: &str) -> Result<Self> {
        let chars: Vec<char> = s.chars().collect();
        match chars.as_slice() {
            &[a, b, c, d] => FourCC::from_chars(a, b, c, d),
            _ => Err(VideoError::InvalidParameters(format!(
                "fourcc needs exactly four characters, got {s:?}"
            ))),
        }
    }
}

impl fmt::Display for FourCC {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &b in &self.0 {
            let ch = if b.is_ascii_graphic() || b == b' ' { b as char } else { '?' };
            write!(f, "{ch}")?;
        }
        Ok(())
    }
}

impl Debug for FourCC {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FourCC({self})")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CaptureProperty {
    FrameWidth,
    FrameHeight,
    Fps,
    FrameCount,
    /// Index of the next frame to be read.
    PosFrames,
}

/// Generic interface for video capture devices
pub trait VideoCapture: Send + Debug {
    fn is_opened(&self) -> bool;
    /// Advances to the next frame without decoding it.
    fn grab(&mut self) -> Result<()>;
    /// Decodes the frame selected by the last `grab`.
    fn retrieve(&mut self) -> Result<RgbImage>;

    fn read(&mut self) -> Result<RgbImage> {
        self.grab()?;
        self.retrieve()
    }

    fn get(&self, _prop: CaptureProperty) -> Option<f64> {
        None
    }

    /// Returns `false` when the backend does not support changing `prop`.
    fn set(&mut self, _prop: CaptureProperty, _value: f64) -> bool {
        false
    }

    fn release(&mut self) {}
}

/// Generic interface for video sinks
pub trait VideoWriter: Send + Debug {
    fn write(&mut self, frame: &RgbImage) -> Result<()>;

    fn is_opened(&self) -> bool {
        true
    }

    /// Finalises the output; further writes fail.
    fn release(&mut self) -> Result<()> {
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureSource {
    /// Camera index, `/dev/video<N>` on Linux.
    Device(u32),
    File(PathBuf),
}

impl From<u32> for CaptureSource {
    fn from(index: u32) -> Self {
        CaptureSource::Device(index)
    }
}

impl From<PathBuf> for CaptureSource {
    fn from(path: PathBuf) -> Self {
        CaptureSource::File(path)
    }
}

impl From<&Path> for CaptureSource {
    fn from(path: &Path) -> Self {
        CaptureSource::File(path.to_path_buf())
    }
}

pub const DEFAULT_CAMERA_SIZE: (u32, u32) = (640, 480);

pub fn open_capture(source: impl Into<CaptureSource>) -> Result<Box<dyn VideoCapture>> {
    match source.into() {
        CaptureSource::Device(index) => {
            let (w, h) = DEFAULT_CAMERA_SIZE;
            open_camera(&format!("/dev/video{index}"), w, h)
        }
        CaptureSource::File(path) => open_video(path),
    }
}

/// Open a video file, picking the backend from the path: directories are PNG
/// sequences, `.gif` is decoded natively, `.avi` holding MJPG is read natively
/// and everything else goes through FFmpeg when that feature is enabled.
pub fn open_video<P: AsRef<Path>>(path: P) -> Result<Box<dyn VideoCapture>> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(VideoError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("{} does not exist", path.display()),
        )));
    }
    if path.is_dir() {
        return Ok(Box::new(PngSequenceCapture::new(path)?));
    }

    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("gif") => Ok(Box::new(GifCapture::new(path)?)),
        Some("avi") => match AviCapture::new(path) {
            Ok(cap) => Ok(Box::new(cap)),
            Err(VideoError::UnsupportedCodec(code)) => {
                tracing::debug!(%code, "AVI stream not MJPG, trying FFmpeg");
                open_with_ffmpeg(path)
            }
            Err(e) => Err(e),
        },
        _ => open_with_ffmpeg(path),
    }
}

#[cfg(feature = "ffmpeg")]
fn open_with_ffmpeg(path: &Path) -> Result<Box<dyn VideoCapture>> {
    Ok(Box::new(backends::NativeFfmpegCapture::new(path)?))
}

#[cfg(not(feature = "ffmpeg"))]
fn open_with_ffmpeg(path: &Path) -> Result<Box<dyn VideoCapture>> {
    Err(VideoError::Backend(format!(
        "no native decoder for {}; rebuild with the `ffmpeg` feature",
        path.display()
    )))
}

/// Open a camera device (V4L2 on Linux)
#[cfg(all(target_os = "linux", feature = "v4l2"))]
pub fn open_camera(path: &str, width: u32, height: u32) -> Result<Box<dyn VideoCapture>> {
    let mut cap = backends::V4L2Capture::new(path)?;
    cap.start_stream(width, height)?;
    Ok(Box::new(cap))
}

#[cfg(not(all(target_os = "linux", feature = "v4l2")))]
pub fn open_camera(path: &str, _width: u32, _height: u32) -> Result<Box<dyn VideoCapture>> {
    Err(VideoError::Backend(format!(
        "cannot open {path}: camera capture needs Linux and the `v4l2` feature"
    )))
}

/// Open a writer for `path`: `.avi` files get an MJPG [`AviWriter`], a path
/// without extension becomes a directory of numbered PNG frames.
pub fn open_writer<P: AsRef<Path>>(
    path: P,
    fourcc: FourCC,
    fps: f64,
    frame_size: (u32, u32),
    is_color: bool,
) -> Result<Box<dyn VideoWriter>> {
    let path = path.as_ref();
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("avi") => Ok(Box::new(AviWriter::create(
            path, fourcc, fps, frame_size, is_color,
        )?)),
        None => Ok(Box::new(PngSequenceWriter::new(path, "frame")?)),
        Some(ext) => Err(VideoError::InvalidParameters(format!(
            "no writer for .{ext} files"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fourcc_packs_first_char_low() {
        let code = FourCC::new(b"MJPG");
        assert_eq!(code.as_u32(), 0x47504A4D);
        assert_eq!(FourCC::from_u32(code.as_u32()), code);
        assert_eq!(code.to_string(), "MJPG");
    }

    #[test]
    fn fourcc_from_str() {
        assert_eq!("XVID".parse::<FourCC>().unwrap(), FourCC::new(b"XVID"));
        assert!("MJPEG".parse::<FourCC>().is_err());
        assert!(FourCC::from_chars('M', 'J', 'P', 'é').is_err());
    }

    #[test]
    fn missing_video_is_an_io_error() {
        let err = open_video("/definitely/not/here.avi").unwrap_err();
        assert!(matches!(err, VideoError::Io(_)));
    }

    #[test]
    fn writer_rejects_unknown_extension() {
        let dir = tempfile::tempdir().unwrap();
        let res = open_writer(dir.path().join("out.mkv"), FourCC::MJPG, 20.0, (4, 4), true);
        assert!(matches!(res, Err(VideoError::InvalidParameters(_))));
    }
}
