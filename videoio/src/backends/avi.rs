//! Motion-JPEG in a RIFF AVI container.
//!
//! The writer lays down a fixed-size header, streams one `00dc` chunk per frame
//! into the `movi` list, then appends an `idx1` index and patches the sizes and
//! frame counts on release. The reader walks the chunk tree and indexes the
//! video stream's frames without trusting `idx1`.

use crate::{CaptureProperty, FourCC, Result, VideoCapture, VideoError, VideoWriter};
use cv_io::{imdecode, imencode, ReadMode, WriteParam};
use image::RgbImage;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

const AVIF_HASINDEX: u32 = 0x10;
const AVIIF_KEYFRAME: u32 = 0x10;

// Byte offsets inside the fixed header written by `AviWriter::header`.
const RIFF_SIZE_POS: u64 = 4;
const AVIH_TOTAL_FRAMES_POS: u64 = 48;
const AVIH_SUGGESTED_BUFFER_POS: u64 = 60;
const STRH_LENGTH_POS: u64 = 140;
const STRH_SUGGESTED_BUFFER_POS: u64 = 144;
const MOVI_SIZE_POS: u64 = 216;
const HEADER_LEN: u64 = 224;

const MAX_RIFF_BYTES: u64 = u32::MAX as u64;
pub const DEFAULT_MJPG_QUALITY: u8 = 95;

fn put_tag(buf: &mut Vec<u8>, tag: &[u8; 4]) {
    buf.extend_from_slice(tag);
}

fn put_u32(buf: &mut Vec<u8>, v: u32) {
    buf.extend_from_slice(&v.to_le_bytes());
}

fn put_u16(buf: &mut Vec<u8>, v: u16) {
    buf.extend_from_slice(&v.to_le_bytes());
}

/// Frame rate as the `rate / scale` pair stored in the stream header.
fn rate_and_scale(fps: f64) -> (u32, u32) {
    if (fps - fps.round()).abs() < 1e-6 {
        (fps.round() as u32, 1)
    } else {
        ((fps * 1000.0).round() as u32, 1000)
    }
}

#[derive(Debug, Clone, Copy)]
struct IndexEntry {
    /// Offset of the chunk header from the `movi` fourcc.
    offset: u32,
    size: u32,
}

/// Writes MJPG AVI files.
#[derive(Debug)]
pub struct AviWriter {
    out: Option<BufWriter<File>>,
    path: PathBuf,
    width: u32,
    height: u32,
    is_color: bool,
    quality: u8,
    index: Vec<IndexEntry>,
    /// Bytes written after the `movi` fourcc.
    movi_bytes: u64,
    max_chunk: u32,
}

impl AviWriter {
    /// Creates `path` for frames of `frame_size`; only [`FourCC::MJPG`] is supported.
    /// With `is_color == false` frames are stored as grayscale JPEGs.
    pub fn create<P: AsRef<Path>>(
        path: P,
        fourcc: FourCC,
        fps: f64,
        frame_size: (u32, u32),
        is_color: bool,
    ) -> Result<Self> {
        if fourcc != FourCC::MJPG {
            return Err(VideoError::UnsupportedCodec(fourcc));
        }
        if !(fps.is_finite() && fps > 0.0) {
            return Err(VideoError::InvalidParameters(format!("fps must be positive, got {fps}")));
        }
        let (width, height) = frame_size;
        if width == 0 || height == 0 || width > u16::MAX as u32 || height > u16::MAX as u32 {
            return Err(VideoError::InvalidParameters(format!(
                "frame size {width}x{height} out of range"
            )));
        }

        let path = path.as_ref().to_path_buf();
        let mut out = BufWriter::new(File::create(&path)?);
        let header = Self::header(fps, width, height, is_color);
        debug_assert_eq!(header.len() as u64, HEADER_LEN);
        out.write_all(&header)?;

        tracing::debug!(path = %path.display(), fps, width, height, is_color, "opened AVI writer");
        Ok(Self {
            out: Some(out),
            path,
            width,
            height,
            is_color,
            quality: DEFAULT_MJPG_QUALITY,
            index: Vec::new(),
            movi_bytes: 4,
            max_chunk: 0,
        })
    }

    /// JPEG quality for subsequent frames, 1..=100.
    pub fn with_quality(mut self, quality: u8) -> Self {
        self.quality = quality.clamp(1, 100);
        self
    }

    pub fn frame_count(&self) -> usize {
        self.index.len()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn header(fps: f64, width: u32, height: u32, is_color: bool) -> Vec<u8> {
        let (rate, scale) = rate_and_scale(fps);
        let channels = if is_color { 3 } else { 1 };
        let mut h = Vec::with_capacity(HEADER_LEN as usize);

        put_tag(&mut h, b"RIFF");
        put_u32(&mut h, 0);
        put_tag(&mut h, b"AVI ");

        put_tag(&mut h, b"LIST");
        put_u32(&mut h, 192);
        put_tag(&mut h, b"hdrl");

        put_tag(&mut h, b"avih");
        put_u32(&mut h, 56);
        put_u32(&mut h, (1_000_000.0 / fps).round() as u32);
        put_u32(&mut h, 0); // max bytes per second
        put_u32(&mut h, 0); // padding granularity
        put_u32(&mut h, AVIF_HASINDEX);
        put_u32(&mut h, 0); // total frames
        put_u32(&mut h, 0); // initial frames
        put_u32(&mut h, 1); // streams
        put_u32(&mut h, 0); // suggested buffer size
        put_u32(&mut h, width);
        put_u32(&mut h, height);
        for _ in 0..4 {
            put_u32(&mut h, 0);
        }

        put_tag(&mut h, b"LIST");
        put_u32(&mut h, 116);
        put_tag(&mut h, b"strl");

        put_tag(&mut h, b"strh");
        put_u32(&mut h, 56);
        put_tag(&mut h, b"vids");
        put_tag(&mut h, &FourCC::MJPG.0);
        put_u32(&mut h, 0); // flags
        put_u16(&mut h, 0); // priority
        put_u16(&mut h, 0); // language
        put_u32(&mut h, 0); // initial frames
        put_u32(&mut h, scale);
        put_u32(&mut h, rate);
        put_u32(&mut h, 0); // start
        put_u32(&mut h, 0); // length
        put_u32(&mut h, 0); // suggested buffer size
        put_u32(&mut h, u32::MAX); // quality: driver default
        put_u32(&mut h, 0); // sample size
        put_u16(&mut h, 0);
        put_u16(&mut h, 0);
        put_u16(&mut h, width as u16);
        put_u16(&mut h, height as u16);

        put_tag(&mut h, b"strf");
        put_u32(&mut h, 40);
        put_u32(&mut h, 40);
        put_u32(&mut h, width);
        put_u32(&mut h, height);
        put_u16(&mut h, 1);
        put_u16(&mut h, 8 * channels as u16);
        put_tag(&mut h, &FourCC::MJPG.0);
        put_u32(&mut h, width * height * channels);
        for _ in 0..4 {
            put_u32(&mut h, 0);
        }

        put_tag(&mut h, b"LIST");
        put_u32(&mut h, 0);
        put_tag(&mut h, b"movi");
        h
    }

    fn encode(&self, frame: &RgbImage) -> Result<Vec<u8>> {
        let params = [WriteParam::JpegQuality(self.quality)];
        let encoded = if self.is_color {
            imencode("jpg", frame, &params)
        } else {
            imencode("jpg", &cv_imgproc::convert_rgb_to_gray(frame), &params)
        };
        encoded.map_err(|e| VideoError::Backend(format!("JPEG encoding failed: {e}")))
    }

    fn finish(&mut self, mut out: BufWriter<File>) -> Result<()> {
        let mut idx = Vec::with_capacity(8 + self.index.len() * 16);
        put_tag(&mut idx, b"idx1");
        put_u32(&mut idx, (self.index.len() * 16) as u32);
        for entry in &self.index {
            put_tag(&mut idx, b"00dc");
            put_u32(&mut idx, AVIIF_KEYFRAME);
            put_u32(&mut idx, entry.offset);
            put_u32(&mut idx, entry.size);
        }
        out.write_all(&idx)?;

        let file_len = HEADER_LEN + self.movi_bytes - 4 + idx.len() as u64;
        let frames = self.index.len() as u32;
        let patches = [
            (RIFF_SIZE_POS, (file_len - 8) as u32),
            (AVIH_TOTAL_FRAMES_POS, frames),
            (AVIH_SUGGESTED_BUFFER_POS, self.max_chunk),
            (STRH_LENGTH_POS, frames),
            (STRH_SUGGESTED_BUFFER_POS, self.max_chunk),
            (MOVI_SIZE_POS, self.movi_bytes as u32),
        ];
        for (pos, value) in patches {
            out.seek(SeekFrom::Start(pos))?;
            out.write_all(&value.to_le_bytes())?;
        }
        out.flush()?;

        tracing::debug!(path = %self.path.display(), frames, bytes = file_len, "finalised AVI");
        Ok(())
    }
}

impl VideoWriter for AviWriter {
    fn write(&mut self, frame: &RgbImage) -> Result<()> {
        if self.out.is_none() {
            return Err(VideoError::InvalidParameters("writer already released".into()));
        }
        if frame.dimensions() != (self.width, self.height) {
            return Err(VideoError::InvalidParameters(format!(
                "frame is {}x{}, writer expects {}x{}",
                frame.width(),
                frame.height(),
                self.width,
                self.height
            )));
        }

        let data = self.encode(frame)?;
        let pad = data.len() & 1;
        let chunk_len = 8 + data.len() as u64 + pad as u64;
        let projected = HEADER_LEN + self.movi_bytes + chunk_len + 16 * (self.index.len() as u64 + 1) + 8;
        if projected > MAX_RIFF_BYTES {
            return Err(VideoError::InvalidParameters("AVI file would exceed 4 GiB".into()));
        }

        let Some(out) = self.out.as_mut() else {
            return Err(VideoError::InvalidParameters("writer already released".into()));
        };
        out.write_all(b"00dc")?;
        out.write_all(&(data.len() as u32).to_le_bytes())?;
        out.write_all(&data)?;
        if pad == 1 {
            out.write_all(&[0])?;
        }

        self.index.push(IndexEntry {
            offset: self.movi_bytes as u32,
            size: data.len() as u32,
        });
        self.movi_bytes += chunk_len;
        self.max_chunk = self.max_chunk.max(data.len() as u32);
        Ok(())
    }

    fn is_opened(&self) -> bool {
        self.out.is_some()
    }

    fn release(&mut self) -> Result<()> {
        match self.out.take() {
            Some(out) => self.finish(out),
            None => Ok(()),
        }
    }
}

impl Drop for AviWriter {
    fn drop(&mut self) {
        if let Some(out) = self.out.take() {
            tracing::warn!(path = %self.path.display(), "AVI writer dropped without release");
            if let Err(e) = self.finish(out) {
                tracing::warn!(error = %e, "failed to finalise AVI");
            }
        }
    }
}

/// Reads MJPG AVI files frame by frame.
#[derive(Debug)]
pub struct AviCapture {
    reader: Option<BufReader<File>>,
    frames: Vec<(u64, u32)>,
    next: usize,
    grabbed: Option<usize>,
    width: u32,
    height: u32,
    fps: f64,
}

struct VideoStream {
    id: [u8; 2],
    codec: FourCC,
    fps: f64,
    width: u32,
    height: u32,
}

fn read_array<R: Read, const N: usize>(r: &mut R) -> std::io::Result<[u8; N]> {
    let mut buf = [0u8; N];
    r.read_exact(&mut buf)?;
    Ok(buf)
}

fn le32(b: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([b[at], b[at + 1], b[at + 2], b[at + 3]])
}

impl AviCapture {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let mut reader = BufReader::new(File::open(path)?);
        let file_len = reader.get_ref().metadata()?.len();

        let riff: [u8; 12] = read_array(&mut reader)?;
        if &riff[0..4] != b"RIFF" || &riff[8..12] != b"AVI " {
            return Err(VideoError::Backend(format!("{} is not an AVI file", path.display())));
        }

        let mut stream: Option<VideoStream> = None;
        let mut stream_count = 0u32;
        let mut last_strh_is_video = false;
        let mut frames = Vec::new();
        let mut pos = 12u64;

        while pos + 8 <= file_len {
            reader.seek(SeekFrom::Start(pos))?;
            let head: [u8; 8] = read_array(&mut reader)?;
            let id = [head[0], head[1], head[2], head[3]];
            let size = le32(&head, 4) as u64;

            match &id {
                b"LIST" => {
                    let kind: [u8; 4] = read_array(&mut reader)?;
                    if matches!(&kind, b"hdrl" | b"strl" | b"movi" | b"rec ") {
                        pos += 12;
                        continue;
                    }
                }
                b"strh" if size >= 36 => {
                    let body: [u8; 36] = read_array(&mut reader)?;
                    last_strh_is_video = &body[0..4] == b"vids" && stream.is_none();
                    if last_strh_is_video {
                        let scale = le32(&body, 20).max(1);
                        let rate = le32(&body, 24);
                        let digits = format!("{:02}", stream_count % 100);
                        let digits = digits.as_bytes();
                        stream = Some(VideoStream {
                            id: [digits[0], digits[1]],
                            codec: FourCC([body[4], body[5], body[6], body[7]]),
                            fps: rate as f64 / scale as f64,
                            width: 0,
                            height: 0,
                        });
                    }
                    stream_count += 1;
                }
                b"strf" if size >= 20 && last_strh_is_video => {
                    let body: [u8; 20] = read_array(&mut reader)?;
                    if let Some(s) = stream.as_mut() {
                        s.width = le32(&body, 4);
                        s.height = (le32(&body, 8) as i32).unsigned_abs();
                        let compression = FourCC([body[16], body[17], body[18], body[19]]);
                        if compression.as_u32() != 0 {
                            s.codec = compression;
                        }
                    }
                }
                _ => {
                    if let Some(s) = &stream {
                        let is_video = id[0..2] == s.id && (&id[2..4] == b"dc" || &id[2..4] == b"db");
                        if is_video && size > 0 {
                            frames.push((pos + 8, size as u32));
                        }
                    }
                }
            }
            pos += 8 + size + (size & 1);
        }

        let stream = stream.ok_or_else(|| {
            VideoError::Backend(format!("{} has no video stream", path.display()))
        })?;
        let codec = FourCC(stream.codec.0.map(|b| b.to_ascii_uppercase()));
        if codec != FourCC::MJPG {
            return Err(VideoError::UnsupportedCodec(stream.codec));
        }

        tracing::debug!(
            path = %path.display(),
            frames = frames.len(),
            width = stream.width,
            height = stream.height,
            fps = stream.fps,
            "opened AVI"
        );
        Ok(Self {
            reader: Some(reader),
            frames,
            next: 0,
            grabbed: None,
            width: stream.width,
            height: stream.height,
            fps: stream.fps,
        })
    }
}

impl VideoCapture for AviCapture {
    fn is_opened(&self) -> bool {
        self.reader.is_some()
    }

    fn grab(&mut self) -> Result<()> {
        if self.reader.is_none() {
            return Err(VideoError::CaptureFailed("capture released".into()));
        }
        if self.next >= self.frames.len() {
            self.grabbed = None;
            return Err(VideoError::EndOfStream);
        }
        self.grabbed = Some(self.next);
        self.next += 1;
        Ok(())
    }

    fn retrieve(&mut self) -> Result<RgbImage> {
        let index = self
            .grabbed
            .ok_or_else(|| VideoError::CaptureFailed("no frame grabbed".into()))?;
        let reader = self
            .reader
            .as_mut()
            .ok_or_else(|| VideoError::CaptureFailed("capture released".into()))?;

        let (offset, size) = self.frames[index];
        reader.seek(SeekFrom::Start(offset))?;
        let mut data = vec![0u8; size as usize];
        reader.read_exact(&mut data)?;

        let frame = imdecode(&data, ReadMode::Color)
            .map_err(|e| VideoError::CaptureFailed(format!("frame {index}: {e}")))?;
        Ok(frame.into_rgb8())
    }

    fn get(&self, prop: CaptureProperty) -> Option<f64> {
        Some(match prop {
            CaptureProperty::FrameWidth => self.width as f64,
            CaptureProperty::FrameHeight => self.height as f64,
            CaptureProperty::Fps => self.fps,
            CaptureProperty::FrameCount => self.frames.len() as f64,
            CaptureProperty::PosFrames => self.next as f64,
        })
    }

    fn set(&mut self, prop: CaptureProperty, value: f64) -> bool {
        match prop {
            CaptureProperty::PosFrames if value >= 0.0 && value <= self.frames.len() as f64 => {
                self.next = value as usize;
                self.grabbed = None;
                true
            }
            _ => false,
        }
    }

    fn release(&mut self) {
        self.reader = None;
        self.grabbed = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn header_offsets_line_up() {
        let h = AviWriter::header(20.0, 640, 480, true);
        assert_eq!(h.len() as u64, HEADER_LEN);
        assert_eq!(&h[24..28], b"avih");
        assert_eq!(&h[100..104], b"strh");
        assert_eq!(&h[164..168], b"strf");
        assert_eq!(&h[212..216], b"LIST");
        assert_eq!(&h[220..224], b"movi");
        assert_eq!(le32(&h, 32), 50_000);
        // rate / scale for 20 fps
        assert_eq!(le32(&h, 128), 1);
        assert_eq!(le32(&h, 132), 20);
    }

    #[test]
    fn fractional_fps_uses_millis_scale() {
        assert_eq!(rate_and_scale(29.97), (29970, 1000));
        assert_eq!(rate_and_scale(25.0), (25, 1));
    }

    #[test]
    fn sizes_are_patched_on_release() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clip.avi");
        let mut writer = AviWriter::create(&path, FourCC::MJPG, 10.0, (16, 8), true).unwrap();
        for i in 0..3u8 {
            writer.write(&RgbImage::from_pixel(16, 8, Rgb([i * 60, 0, 0]))).unwrap();
        }
        writer.release().unwrap();
        assert!(!writer.is_opened());

        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(le32(&bytes, 4) as usize, bytes.len() - 8);
        assert_eq!(le32(&bytes, AVIH_TOTAL_FRAMES_POS as usize), 3);
        assert_eq!(le32(&bytes, STRH_LENGTH_POS as usize), 3);
        let movi = le32(&bytes, MOVI_SIZE_POS as usize) as usize;
        assert_eq!(&bytes[220 + movi..224 + movi], b"idx1");
    }
}
