use crate::read::map_image_error;
use crate::{IoError, Result};
use cv_core::{Image, U8Pixel};
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::{DynamicImage, ImageFormat};
use std::fs::File;
use std::io::{BufWriter, Cursor, Write};
use std::path::Path;

pub const DEFAULT_JPEG_QUALITY: u8 = 95;
pub const DEFAULT_PNG_COMPRESSION: u8 = 1;

/// Encoder settings, ignored by formats they do not apply to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteParam {
    /// JPEG quality, 0..=100.
    JpegQuality(u8),
    /// PNG compression level, 0..=9; higher is smaller and slower.
    PngCompression(u8),
}

#[derive(Debug, Clone, Copy)]
struct EncoderSettings {
    jpeg_quality: u8,
    png_compression: u8,
}

impl EncoderSettings {
    fn from_params(params: &[WriteParam]) -> Result<Self> {
        let mut settings = Self {
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            png_compression: DEFAULT_PNG_COMPRESSION,
        };
        for param in params {
            match *param {
                WriteParam::JpegQuality(q) if q <= 100 => settings.jpeg_quality = q.max(1),
                WriteParam::PngCompression(level) if level <= 9 => {
                    settings.png_compression = level
                }
                other => {
                    return Err(IoError::InvalidParameter(format!("{other:?} out of range")))
                }
            }
        }
        Ok(settings)
    }

    fn png_compression(&self) -> CompressionType {
        match self.png_compression {
            0..=3 => CompressionType::Fast,
            4..=6 => CompressionType::Default,
            _ => CompressionType::Best,
        }
    }
}

pub fn imwrite<Q, P>(path: Q, img: &Image<P>) -> Result<()>
where
    Q: AsRef<Path>,
    P: U8Pixel,
    DynamicImage: From<Image<P>>,
{
    imwrite_with_params(path, img, &[])
}

/// Writes `img` to `path`; the format comes from the file extension.
pub fn imwrite_with_params<Q, P>(path: Q, img: &Image<P>, params: &[WriteParam]) -> Result<()>
where
    Q: AsRef<Path>,
    P: U8Pixel,
    DynamicImage: From<Image<P>>,
{
    let path = path.as_ref();
    let format = ImageFormat::from_path(path).map_err(|_| {
        IoError::UnsupportedFormat(format!("cannot infer format of {}", path.display()))
    })?;
    let settings = EncoderSettings::from_params(params)?;

    let mut writer = BufWriter::new(File::create(path)?);
    encode_into(&mut writer, DynamicImage::from(img.clone()), format, settings)?;
    writer.flush()?;

    tracing::debug!(path = %path.display(), ?format, "wrote image");
    Ok(())
}

/// Encodes `img` in the format named by `ext` (`"png"`, `".jpg"`, ...).
pub fn imencode<P>(ext: &str, img: &Image<P>, params: &[WriteParam]) -> Result<Vec<u8>>
where
    P: U8Pixel,
    DynamicImage: From<Image<P>>,
{
    let ext = ext.trim_start_matches('.');
    let format = ImageFormat::from_extension(ext)
        .ok_or_else(|| IoError::UnsupportedFormat(ext.to_string()))?;
    let settings = EncoderSettings::from_params(params)?;

    let mut buf = Cursor::new(Vec::new());
    encode_into(&mut buf, DynamicImage::from(img.clone()), format, settings)?;
    Ok(buf.into_inner())
}

fn encode_into<W: Write + std::io::Seek>(
    writer: &mut W,
    img: DynamicImage,
    format: ImageFormat,
    settings: EncoderSettings,
) -> Result<()> {
    match format {
        ImageFormat::Jpeg => {
            // JPEG has no alpha channel.
            let img = if img.color().has_alpha() {
                DynamicImage::ImageRgb8(img.into_rgb8())
            } else {
                img
            };
            let encoder = JpegEncoder::new_with_quality(writer, settings.jpeg_quality);
            img.write_with_encoder(encoder)
                .map_err(|e| IoError::Encode(e.to_string()))
        }
        ImageFormat::Png => {
            let encoder = PngEncoder::new_with_quality(
                writer,
                settings.png_compression(),
                FilterType::Adaptive,
            );
            img.write_with_encoder(encoder)
                .map_err(|e| IoError::Encode(e.to_string()))
        }
        other => img.write_to(writer, other).map_err(map_image_error),
    }
}
