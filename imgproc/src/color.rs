//! Color-space conversion.
//!
//! Three-channel buffers carry no channel-order tag: the conversion code says how
//! the samples are to be read. `Bgr*` codes treat sample 0 as blue, `Rgb*` codes
//! treat sample 0 as red. 8-bit HSV stores hue halved (0..=179) so it fits a byte.

use crate::{ImgprocError, Result};
use cv_core::luma_u8;
use image::{GrayImage, RgbImage, RgbaImage};
use rayon::prelude::*;
use rayon::ThreadPool;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColorConversion {
    BgrToRgb,
    RgbToBgr,
    BgrToGray,
    RgbToGray,
    GrayToBgr,
    GrayToRgb,
    BgrToHsv,
    RgbToHsv,
    HsvToBgr,
    HsvToRgb,
    RgbToRgba,
    RgbaToRgb,
}

impl ColorConversion {
    pub const ALL: [ColorConversion; 12] = [
        ColorConversion::BgrToRgb,
        ColorConversion::RgbToBgr,
        ColorConversion::BgrToGray,
        ColorConversion::RgbToGray,
        ColorConversion::GrayToBgr,
        ColorConversion::GrayToRgb,
        ColorConversion::BgrToHsv,
        ColorConversion::RgbToHsv,
        ColorConversion::HsvToBgr,
        ColorConversion::HsvToRgb,
        ColorConversion::RgbToRgba,
        ColorConversion::RgbaToRgb,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ColorConversion::BgrToRgb => "COLOR_BGR2RGB",
            ColorConversion::RgbToBgr => "COLOR_RGB2BGR",
            ColorConversion::BgrToGray => "COLOR_BGR2GRAY",
            ColorConversion::RgbToGray => "COLOR_RGB2GRAY",
            ColorConversion::GrayToBgr => "COLOR_GRAY2BGR",
            ColorConversion::GrayToRgb => "COLOR_GRAY2RGB",
            ColorConversion::BgrToHsv => "COLOR_BGR2HSV",
            ColorConversion::RgbToHsv => "COLOR_RGB2HSV",
            ColorConversion::HsvToBgr => "COLOR_HSV2BGR",
            ColorConversion::HsvToRgb => "COLOR_HSV2RGB",
            ColorConversion::RgbToRgba => "COLOR_RGB2RGBA",
            ColorConversion::RgbaToRgb => "COLOR_RGBA2RGB",
        }
    }
}

impl std::fmt::Display for ColorConversion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Converts between three-channel encodings.
pub fn cvt_color_rgb(src: &RgbImage, code: ColorConversion) -> Result<RgbImage> {
    let convert: fn(&mut [u8]) = match code {
        ColorConversion::BgrToRgb | ColorConversion::RgbToBgr => |px| px.swap(0, 2),
        ColorConversion::RgbToHsv => |px| {
            let hsv = rgb_to_hsv([px[0], px[1], px[2]]);
            px.copy_from_slice(&hsv);
        },
        ColorConversion::BgrToHsv => |px| {
            let hsv = rgb_to_hsv([px[2], px[1], px[0]]);
            px.copy_from_slice(&hsv);
        },
        ColorConversion::HsvToRgb => |px| {
            let rgb = hsv_to_rgb([px[0], px[1], px[2]]);
            px.copy_from_slice(&rgb);
        },
        ColorConversion::HsvToBgr => |px| {
            let [r, g, b] = hsv_to_rgb([px[0], px[1], px[2]]);
            px.copy_from_slice(&[b, g, r]);
        },
        other => {
            return Err(ImgprocError::UnsupportedFormat(format!(
                "{other} does not map three channels to three channels"
            )))
        }
    };

    let mut out = src.clone();
    out.as_mut().par_chunks_mut(3).for_each(convert);
    Ok(out)
}

/// Collapses a three-channel image to luma, reading it in the order `code` names.
pub fn cvt_color_to_gray(src: &RgbImage, code: ColorConversion) -> Result<GrayImage> {
    match code {
        ColorConversion::RgbToGray => Ok(convert_rgb_to_gray(src)),
        ColorConversion::BgrToGray => {
            let mut swapped = src.clone();
            swapped.as_mut().par_chunks_mut(3).for_each(|px| px.swap(0, 2));
            Ok(convert_rgb_to_gray(&swapped))
        }
        other => Err(ImgprocError::UnsupportedFormat(format!(
            "{other} does not produce a gray image"
        ))),
    }
}

/// Expands a gray image to three equal channels. Channel order is irrelevant.
pub fn cvt_color_from_gray(src: &GrayImage, code: ColorConversion) -> Result<RgbImage> {
    match code {
        ColorConversion::GrayToRgb | ColorConversion::GrayToBgr => Ok(convert_gray_to_rgb(src)),
        other => Err(ImgprocError::UnsupportedFormat(format!(
            "{other} does not start from a gray image"
        ))),
    }
}

pub fn convert_rgb_to_rgba(src: &RgbImage) -> RgbaImage {
    let (w, h) = src.dimensions();
    let mut out = RgbaImage::new(w, h);
    out.as_mut()
        .par_chunks_mut(4)
        .zip(src.as_raw().par_chunks(3))
        .for_each(|(dst, s)| {
            dst[..3].copy_from_slice(s);
            dst[3] = 255;
        });
    out
}

pub fn convert_rgba_to_rgb(src: &RgbaImage) -> RgbImage {
    let (w, h) = src.dimensions();
    let mut out = RgbImage::new(w, h);
    out.as_mut()
        .par_chunks_mut(3)
        .zip(src.as_raw().par_chunks(4))
        .for_each(|(dst, s)| dst.copy_from_slice(&s[..3]));
    out
}

/// 8-bit RGB to 8-bit HSV: H in 0..=179, S and V in 0..=255.
pub fn rgb_to_hsv(rgb: [u8; 3]) -> [u8; 3] {
    let [r, g, b] = rgb.map(|c| c as f32);
    let v = r.max(g).max(b);
    let min = r.min(g).min(b);
    let diff = v - min;

    let s = if v > 0.0 { diff * 255.0 / v } else { 0.0 };
    let h = if diff == 0.0 {
        0.0
    } else if v == r {
        60.0 * (g - b) / diff
    } else if v == g {
        120.0 + 60.0 * (b - r) / diff
    } else {
        240.0 + 60.0 * (r - g) / diff
    };
    let h = if h < 0.0 { h + 360.0 } else { h };

    let h = (h / 2.0).round() as u32 % 180;
    [h as u8, s.round() as u8, v as u8]
}

/// 8-bit HSV (hue halved) back to 8-bit RGB.
pub fn hsv_to_rgb(hsv: [u8; 3]) -> [u8; 3] {
    let h = (hsv[0] as f32 * 2.0) % 360.0;
    let s = hsv[1] as f32 / 255.0;
    let v = hsv[2] as f32;

    if s == 0.0 {
        let g = v as u8;
        return [g, g, g];
    }

    let sector = h / 60.0;
    let i = sector.floor();
    let f = sector - i;
    let p = v * (1.0 - s);
    let q = v * (1.0 - s * f);
    let t = v * (1.0 - s * (1.0 - f));

    let (r, g, b) = match i as u32 {
        0 => (v, t, p),
        1 => (q, v, p),
        2 => (p, v, t),
        3 => (p, q, v),
        4 => (t, p, v),
        _ => (v, p, q),
    };
    [r, g, b].map(|c| c.round().clamp(0.0, 255.0) as u8)
}

pub fn convert_gray_to_rgb(gray: &GrayImage) -> RgbImage {
    convert_gray_to_rgb_in_pool(gray, None)
}

pub fn convert_gray_to_rgb_in_pool(gray: &GrayImage, pool: Option<&ThreadPool>) -> RgbImage {
    let run = || {
        let (w, h) = gray.dimensions();
        let mut rgb = RgbImage::new(w, h);

        rgb.as_mut()
            .par_chunks_mut(3)
            .zip(gray.as_raw().par_iter())
            .for_each(|(rgb_pixel, &g)| {
                rgb_pixel[0] = g;
                rgb_pixel[1] = g;
                rgb_pixel[2] = g;
            });

        rgb
    };

    if let Some(p) = pool {
        p.install(run)
    } else {
        run()
    }
}

pub fn convert_rgb_to_gray(rgb: &RgbImage) -> GrayImage {
    convert_rgb_to_gray_in_pool(rgb, None)
}

pub fn convert_rgb_to_gray_in_pool(rgb: &RgbImage, pool: Option<&ThreadPool>) -> GrayImage {
    let run = || {
        let (w, h) = rgb.dimensions();
        let mut gray = GrayImage::new(w, h);
        let width = w as usize;
        if width == 0 {
            return gray;
        }

        gray.as_mut()
            .par_chunks_mut(width)
            .zip(rgb.as_raw().par_chunks(width * 3))
            .for_each(|(g_row, rgb_row)| {
                for (g, px) in g_row.iter_mut().zip(rgb_row.chunks_exact(3)) {
                    *g = luma_u8(px[0], px[1], px[2]);
                }
            });

        gray
    };

    if let Some(p) = pool {
        p.install(run)
    } else {
        run()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn pure_colors_map_to_opencv_hues() {
        assert_eq!(rgb_to_hsv([255, 0, 0]), [0, 255, 255]);
        assert_eq!(rgb_to_hsv([0, 255, 0]), [60, 255, 255]);
        assert_eq!(rgb_to_hsv([0, 0, 255]), [120, 255, 255]);
        assert_eq!(rgb_to_hsv([0, 0, 0]), [0, 0, 0]);
        assert_eq!(rgb_to_hsv([128, 128, 128]), [0, 0, 128]);
    }

    #[test]
    fn hsv_roundtrip_is_close() {
        for rgb in [[200, 30, 90], [10, 220, 140], [250, 250, 5], [40, 40, 41]] {
            let back = hsv_to_rgb(rgb_to_hsv(rgb));
            for c in 0..3 {
                assert!((back[c] as i32 - rgb[c] as i32).abs() <= 4, "{rgb:?} -> {back:?}");
            }
        }
    }

    #[test]
    fn bgr_red_pixel_converts_like_rgb_red() {
        let bgr_red = RgbImage::from_pixel(1, 1, Rgb([0, 0, 255]));
        let hsv = cvt_color_rgb(&bgr_red, ColorConversion::BgrToHsv).unwrap();
        assert_eq!(hsv.get_pixel(0, 0), &Rgb([0, 255, 255]));

        let back = cvt_color_rgb(&hsv, ColorConversion::HsvToBgr).unwrap();
        assert_eq!(back.get_pixel(0, 0), &Rgb([0, 0, 255]));
    }

    #[test]
    fn bgr_to_rgb_swaps_outer_channels() {
        let img = RgbImage::from_pixel(2, 2, Rgb([1, 2, 3]));
        let out = cvt_color_rgb(&img, ColorConversion::BgrToRgb).unwrap();
        assert_eq!(out.get_pixel(1, 1), &Rgb([3, 2, 1]));
    }

    #[test]
    fn gray_codes_are_rejected_by_three_channel_conversion() {
        let img = RgbImage::new(1, 1);
        assert!(cvt_color_rgb(&img, ColorConversion::BgrToGray).is_err());
        assert!(cvt_color_to_gray(&img, ColorConversion::BgrToHsv).is_err());
    }

    #[test]
    fn bgr_to_gray_reads_blue_first() {
        let bgr_blue = RgbImage::from_pixel(1, 1, Rgb([255, 0, 0]));
        let gray = cvt_color_to_gray(&bgr_blue, ColorConversion::BgrToGray).unwrap();
        assert_eq!(gray.get_pixel(0, 0)[0], luma_u8(0, 0, 255));
    }

    #[test]
    fn flag_names_are_listed() {
        assert!(ColorConversion::ALL.iter().any(|c| c.name() == "COLOR_BGR2HSV"));
    }
}
