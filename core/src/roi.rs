//! Regions of interest and per-channel views.

use crate::image::{Image, U8Pixel};
use crate::{CoreError, Result};
use image::{GenericImage, GenericImageView, GrayImage};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Builds a rectangle from half-open row and column ranges, `rows.start..rows.end`.
    pub fn from_ranges(rows: std::ops::Range<u32>, cols: std::ops::Range<u32>) -> Self {
        Self {
            x: cols.start,
            y: rows.start,
            width: cols.end.saturating_sub(cols.start),
            height: rows.end.saturating_sub(rows.start),
        }
    }

    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    pub fn fits_in(&self, width: u32, height: u32) -> bool {
        self.x as u64 + self.width as u64 <= width as u64
            && self.y as u64 + self.height as u64 <= height as u64
    }
}

fn check_rect(rect: Rect, width: u32, height: u32) -> Result<()> {
    if rect.width == 0 || rect.height == 0 || !rect.fits_in(width, height) {
        return Err(CoreError::OutOfBounds(format!(
            "{rect:?} does not fit in {width}x{height} image"
        )));
    }
    Ok(())
}

/// Copies a rectangular region out of `img`.
pub fn roi<P: U8Pixel>(img: &Image<P>, rect: Rect) -> Result<Image<P>> {
    check_rect(rect, img.width(), img.height())?;
    Ok(img.view(rect.x, rect.y, rect.width, rect.height).to_image())
}

/// Copies `src` into `dst` with its top-left corner at `(x, y)`.
pub fn paste<P: U8Pixel>(dst: &mut Image<P>, src: &Image<P>, x: u32, y: u32) -> Result<()> {
    let rect = Rect::new(x, y, src.width(), src.height());
    check_rect(rect, dst.width(), dst.height())?;
    dst.copy_from(src, x, y)
        .map_err(|e| CoreError::OutOfBounds(e.to_string()))
}

/// Splits an interleaved image into one gray plane per channel.
pub fn split<P: U8Pixel>(img: &Image<P>) -> Vec<GrayImage> {
    let channels = P::CHANNEL_COUNT as usize;
    let (w, h) = img.dimensions();
    let mut planes = vec![GrayImage::new(w, h); channels];

    for (i, px) in img.as_raw().chunks_exact(channels).enumerate() {
        for (plane, &v) in planes.iter_mut().zip(px) {
            let raw: &mut [u8] = plane;
            raw[i] = v;
        }
    }
    planes
}

/// Interleaves gray planes into a `P` image. The plane count must equal `P`'s channel count
/// and every plane must share the same dimensions.
pub fn merge<P: U8Pixel>(planes: &[GrayImage]) -> Result<Image<P>> {
    let channels = P::CHANNEL_COUNT as usize;
    if planes.len() != channels {
        return Err(CoreError::ChannelMismatch {
            expected: channels,
            actual: planes.len(),
        });
    }
    let (w, h) = planes[0].dimensions();
    if let Some(bad) = planes.iter().find(|p| p.dimensions() != (w, h)) {
        return Err(CoreError::DimensionMismatch(format!(
            "plane {:?} differs from {:?}",
            bad.dimensions(),
            (w, h)
        )));
    }

    let mut out = Image::<P>::new(w, h);
    for (i, px) in out.chunks_exact_mut(channels).enumerate() {
        for (c, plane) in planes.iter().enumerate() {
            px[c] = plane.as_raw()[i];
        }
    }
    Ok(out)
}

pub fn extract_channel<P: U8Pixel>(img: &Image<P>, channel: u8) -> Result<GrayImage> {
    check_channel::<P>(channel)?;
    let channels = P::CHANNEL_COUNT as usize;
    let mut plane = GrayImage::new(img.width(), img.height());
    for (dst, px) in plane.iter_mut().zip(img.as_raw().chunks_exact(channels)) {
        *dst = px[channel as usize];
    }
    Ok(plane)
}

/// Sets one channel of every pixel to `value`, leaving the others untouched.
pub fn fill_channel<P: U8Pixel>(img: &mut Image<P>, channel: u8, value: u8) -> Result<()> {
    check_channel::<P>(channel)?;
    let channels = P::CHANNEL_COUNT as usize;
    for px in img.chunks_exact_mut(channels) {
        px[channel as usize] = value;
    }
    Ok(())
}

/// Exchanges two channels in place; swapping 0 and 2 turns BGR order into RGB and back.
pub fn swap_channels<P: U8Pixel>(img: &mut Image<P>, a: u8, b: u8) -> Result<()> {
    check_channel::<P>(a)?;
    check_channel::<P>(b)?;
    let channels = P::CHANNEL_COUNT as usize;
    for px in img.chunks_exact_mut(channels) {
        px.swap(a as usize, b as usize);
    }
    Ok(())
}

fn check_channel<P: U8Pixel>(channel: u8) -> Result<()> {
    if channel >= P::CHANNEL_COUNT {
        return Err(CoreError::OutOfBounds(format!(
            "channel {channel} of a {}-channel image",
            P::CHANNEL_COUNT
        )));
    }
    Ok(())
}
