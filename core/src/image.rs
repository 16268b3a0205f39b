use crate::{CoreError, Result};
use image::{GrayImage, ImageBuffer, Luma, Pixel, Rgb, RgbImage, RgbaImage};

/// Pixel types whose samples are 8-bit and that can cross rayon thread boundaries.
///
/// Every image routine in the workspace is generic over this bound, so gray, RGB
/// and RGBA buffers all go through the same code paths.
pub trait U8Pixel: Pixel<Subpixel = u8> + Send + Sync + 'static {}

impl<P> U8Pixel for P where P: Pixel<Subpixel = u8> + Send + Sync + 'static {}

/// An owned 8-bit image of any channel layout.
pub type Image<P> = ImageBuffer<P, Vec<u8>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelType {
    U8,
    U16,
    F32,
    F64,
}

impl PixelType {
    pub fn name(&self) -> &'static str {
        match self {
            PixelType::U8 => "uint8",
            PixelType::U16 => "uint16",
            PixelType::F32 => "float32",
            PixelType::F64 => "float64",
        }
    }

    pub fn bytes(&self) -> usize {
        match self {
            PixelType::U8 => 1,
            PixelType::U16 => 2,
            PixelType::F32 => 4,
            PixelType::F64 => 8,
        }
    }
}

impl std::fmt::Display for PixelType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorSpace {
    Gray,
    Rgb,
    Rgba,
    Bgr,
    Hsv,
    Lab,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageInfo {
    pub width: u32,
    pub height: u32,
    pub pixel_type: PixelType,
    pub channels: u8,
}

impl ImageInfo {
    pub fn new(width: u32, height: u32, channels: u8, pixel_type: PixelType) -> Self {
        Self {
            width,
            height,
            channels,
            pixel_type,
        }
    }

    pub fn is_gray(&self) -> bool {
        self.channels == 1
    }

    pub fn is_color(&self) -> bool {
        self.channels >= 3
    }

    pub fn stride(&self) -> usize {
        (self.width as usize * self.channels as usize) * self.pixel_type.bytes()
    }
}

/// Row/column/channel extent of an image, in that order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Shape {
    pub rows: u32,
    pub cols: u32,
    pub channels: u8,
}

impl Shape {
    /// Number of samples (pixels times channels).
    pub fn size(&self) -> usize {
        self.rows as usize * self.cols as usize * self.channels as usize
    }
}

impl std::fmt::Display for Shape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.channels == 1 {
            write!(f, "({}, {})", self.rows, self.cols)
        } else {
            write!(f, "({}, {}, {})", self.rows, self.cols, self.channels)
        }
    }
}

pub fn shape<P: U8Pixel>(img: &Image<P>) -> Shape {
    Shape {
        rows: img.height(),
        cols: img.width(),
        channels: P::CHANNEL_COUNT,
    }
}

pub fn dtype<P: U8Pixel>(_img: &Image<P>) -> PixelType {
    PixelType::U8
}

pub fn image_info<P: U8Pixel>(img: &Image<P>) -> ImageInfo {
    ImageInfo::new(img.width(), img.height(), P::CHANNEL_COUNT, PixelType::U8)
}

/// BT.601 luma with 14-bit fixed-point weights, rounded to nearest.
#[inline]
pub fn luma_u8(r: u8, g: u8, b: u8) -> u8 {
    const R: u32 = 4899;
    const G: u32 = 9617;
    const B: u32 = 1868;
    ((r as u32 * R + g as u32 * G + b as u32 * B + (1 << 13)) >> 14) as u8
}

pub fn create_gray_image(width: u32, height: u32) -> GrayImage {
    ImageBuffer::new(width, height)
}

pub fn create_rgb_image(width: u32, height: u32) -> RgbImage {
    ImageBuffer::new(width, height)
}

pub fn create_rgba_image(width: u32, height: u32) -> RgbaImage {
    ImageBuffer::new(width, height)
}

pub fn get_pixel_gray(img: &GrayImage, x: u32, y: u32) -> u8 {
    img.get_pixel(x, y)[0]
}

pub fn set_pixel_gray(img: &mut GrayImage, x: u32, y: u32, value: u8) {
    img.put_pixel(x, y, Luma([value]));
}

pub fn get_pixel_rgb(img: &RgbImage, x: u32, y: u32) -> [u8; 3] {
    let p = img.get_pixel(x, y);
    [p[0], p[1], p[2]]
}

pub fn set_pixel_rgb(img: &mut RgbImage, x: u32, y: u32, rgb: [u8; 3]) {
    img.put_pixel(x, y, Rgb(rgb));
}

fn sample_index<P: U8Pixel>(img: &Image<P>, x: u32, y: u32, channel: u8) -> Result<usize> {
    if x >= img.width() || y >= img.height() {
        return Err(CoreError::OutOfBounds(format!(
            "pixel ({x}, {y}) outside {}x{} image",
            img.width(),
            img.height()
        )));
    }
    if channel >= P::CHANNEL_COUNT {
        return Err(CoreError::OutOfBounds(format!(
            "channel {channel} of a {}-channel image",
            P::CHANNEL_COUNT
        )));
    }
    let channels = P::CHANNEL_COUNT as usize;
    Ok((y as usize * img.width() as usize + x as usize) * channels + channel as usize)
}

/// Reads one sample of one pixel without copying the pixel out.
pub fn item<P: U8Pixel>(img: &Image<P>, x: u32, y: u32, channel: u8) -> Result<u8> {
    let idx = sample_index(img, x, y, channel)?;
    Ok(img.as_raw()[idx])
}

/// Overwrites one sample of one pixel.
pub fn item_set<P: U8Pixel>(
    img: &mut Image<P>,
    x: u32,
    y: u32,
    channel: u8,
    value: u8,
) -> Result<()> {
    let idx = sample_index(img, x, y, channel)?;
    let raw: &mut [u8] = img;
    raw[idx] = value;
    Ok(())
}

/// Bounds-checked pixel read.
pub fn try_get_pixel<P: U8Pixel>(img: &Image<P>, x: u32, y: u32) -> Result<P> {
    img.get_pixel_checked(x, y).copied().ok_or_else(|| {
        CoreError::OutOfBounds(format!(
            "pixel ({x}, {y}) outside {}x{} image",
            img.width(),
            img.height()
        ))
    })
}

/// Bounds-checked pixel write.
pub fn try_put_pixel<P: U8Pixel>(img: &mut Image<P>, x: u32, y: u32, pixel: P) -> Result<()> {
    let (w, h) = img.dimensions();
    match img.get_pixel_mut_checked(x, y) {
        Some(p) => {
            *p = pixel;
            Ok(())
        }
        None => Err(CoreError::OutOfBounds(format!(
            "pixel ({x}, {y}) outside {w}x{h} image"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shape_reports_rows_cols_channels() {
        let img = create_rgb_image(4, 3);
        let s = shape(&img);
        assert_eq!((s.rows, s.cols, s.channels), (3, 4, 3));
        assert_eq!(s.size(), 36);
        assert_eq!(s.to_string(), "(3, 4, 3)");
        assert_eq!(dtype(&img).name(), "uint8");
    }

    #[test]
    fn gray_shape_omits_channels_in_display() {
        let img = create_gray_image(5, 2);
        assert_eq!(shape(&img).to_string(), "(2, 5)");
    }

    #[test]
    fn item_set_changes_single_channel() {
        let mut img = create_rgb_image(16, 16);
        set_pixel_rgb(&mut img, 10, 10, [1, 2, 3]);
        item_set(&mut img, 10, 10, 2, 100).unwrap();
        assert_eq!(item(&img, 10, 10, 2).unwrap(), 100);
        assert_eq!(get_pixel_rgb(&img, 10, 10), [1, 2, 100]);
    }

    #[test]
    fn item_rejects_out_of_range_channel_and_pixel() {
        let img = create_gray_image(2, 2);
        assert!(item(&img, 0, 0, 1).is_err());
        assert!(item(&img, 2, 0, 0).is_err());
    }

    #[test]
    fn luma_weights_round_to_nearest() {
        assert_eq!(luma_u8(255, 255, 255), 255);
        assert_eq!(luma_u8(0, 0, 0), 0);
        // 0.299*100 + 0.587*150 + 0.114*200 = 140.75
        assert_eq!(luma_u8(100, 150, 200), 141);
        assert_eq!(luma_u8(255, 0, 0), 76);
    }

    #[test]
    fn checked_pixel_access() {
        let mut img = create_gray_image(3, 3);
        try_put_pixel(&mut img, 1, 1, Luma([9])).unwrap();
        assert_eq!(try_get_pixel(&img, 1, 1).unwrap(), Luma([9]));
        assert!(try_put_pixel(&mut img, 3, 0, Luma([1])).is_err());
    }
}
