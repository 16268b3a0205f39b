use crate::{IoError, Result};
use cv_core::luma_u8;
use image::{DynamicImage, GrayImage, ImageError, ImageReader, RgbImage};
use std::io::Cursor;
use std::path::Path;

/// How a decoded image is converted before it is handed back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReadMode {
    /// Three 8-bit channels; any alpha channel is dropped.
    #[default]
    Color,
    /// One 8-bit channel using BT.601 luma weights.
    Grayscale,
    /// Whatever the file holds, alpha and bit depth included.
    Unchanged,
}

pub fn imread<P: AsRef<Path>>(path: P, mode: ReadMode) -> Result<DynamicImage> {
    let path = path.as_ref();
    if !path.is_file() {
        return Err(IoError::NotFound(path.to_path_buf()));
    }

    let decoded = ImageReader::open(path)?
        .with_guessed_format()?
        .decode()
        .map_err(map_image_error)?;

    tracing::debug!(
        path = %path.display(),
        width = decoded.width(),
        height = decoded.height(),
        color = ?decoded.color(),
        ?mode,
        "decoded image"
    );
    Ok(apply_mode(decoded, mode))
}

pub fn imread_color<P: AsRef<Path>>(path: P) -> Result<RgbImage> {
    Ok(imread(path, ReadMode::Color)?.into_rgb8())
}

pub fn imread_gray<P: AsRef<Path>>(path: P) -> Result<GrayImage> {
    Ok(imread(path, ReadMode::Grayscale)?.into_luma8())
}

/// Decodes an in-memory encoded image, guessing the format from its magic bytes.
pub fn imdecode(bytes: &[u8], mode: ReadMode) -> Result<DynamicImage> {
    let decoded = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()?
        .decode()
        .map_err(map_image_error)?;
    Ok(apply_mode(decoded, mode))
}

fn apply_mode(img: DynamicImage, mode: ReadMode) -> DynamicImage {
    match mode {
        ReadMode::Color => DynamicImage::ImageRgb8(img.into_rgb8()),
        ReadMode::Grayscale => DynamicImage::ImageLuma8(to_gray(img)),
        ReadMode::Unchanged => img,
    }
}

fn to_gray(img: DynamicImage) -> GrayImage {
    match img {
        DynamicImage::ImageLuma8(gray) => gray,
        other => {
            let rgb = other.into_rgb8();
            let (w, h) = rgb.dimensions();
            let mut gray = GrayImage::new(w, h);
            for (dst, p) in gray.iter_mut().zip(rgb.as_raw().chunks_exact(3)) {
                *dst = luma_u8(p[0], p[1], p[2]);
            }
            gray
        }
    }
}

pub(crate) fn map_image_error(e: ImageError) -> IoError {
    match e {
        ImageError::Unsupported(u) => IoError::UnsupportedFormat(u.to_string()),
        ImageError::IoError(io) => IoError::Io(io),
        other => IoError::Decode(other.to_string()),
    }
}
