use cv_core::{Image, Scalar, U8Pixel};
use rayon::prelude::*;

/// How samples outside the image are synthesised.
///
/// With `abcdefgh` as a row:
/// - `Constant`: `iiiiii|abcdefgh|iiiiiii`
/// - `Replicate`: `aaaaaa|abcdefgh|hhhhhhh`
/// - `Reflect`: `fedcba|abcdefgh|hgfedcb`
/// - `Reflect101`: `gfedcb|abcdefgh|gfedcba`
/// - `Wrap`: `cdefgh|abcdefgh|abcdefg`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BorderMode {
    Constant(Scalar),
    Replicate,
    Reflect,
    Reflect101,
    Wrap,
}

impl BorderMode {
    pub const DEFAULT: BorderMode = BorderMode::Reflect101;

    /// Black constant border.
    pub fn zero() -> Self {
        BorderMode::Constant(Scalar::BLACK)
    }
}

impl Default for BorderMode {
    fn default() -> Self {
        BorderMode::DEFAULT
    }
}

/// Maps a possibly out-of-range coordinate into `0..len`, or `None` for a constant border.
pub fn map_coord(coord: isize, len: usize, mode: BorderMode) -> Option<usize> {
    let n = len as isize;
    if n <= 0 {
        return None;
    }
    if coord >= 0 && coord < n {
        return Some(coord as usize);
    }

    match mode {
        BorderMode::Constant(_) => None,
        BorderMode::Replicate => Some(coord.clamp(0, n - 1) as usize),
        BorderMode::Wrap => Some(coord.rem_euclid(n) as usize),
        BorderMode::Reflect => {
            if n == 1 {
                return Some(0);
            }
            let period = 2 * n;
            let mut c = coord.rem_euclid(period);
            if c >= n {
                c = period - c - 1;
            }
            Some(c as usize)
        }
        BorderMode::Reflect101 => {
            if n == 1 {
                return Some(0);
            }
            let period = 2 * n - 2;
            let mut c = coord.rem_euclid(period);
            if c >= n {
                c = period - c;
            }
            Some(c as usize)
        }
    }
}

/// Sample `channel` of the pixel at `(x, y)`, applying `mode` outside the image.
#[inline]
#[allow(clippy::too_many_arguments)]
pub(crate) fn fetch(
    raw: &[u8],
    width: usize,
    height: usize,
    channels: usize,
    x: isize,
    y: isize,
    channel: usize,
    mode: BorderMode,
) -> f32 {
    match (map_coord(x, width, mode), map_coord(y, height, mode)) {
        (Some(ix), Some(iy)) => raw[(iy * width + ix) * channels + channel] as f32,
        _ => match mode {
            BorderMode::Constant(s) => s.channel(channel) as f32,
            _ => 0.0,
        },
    }
}

/// Pads `src` with `top`/`bottom` rows and `left`/`right` columns filled according to `mode`.
pub fn copy_make_border<P: U8Pixel>(
    src: &Image<P>,
    top: u32,
    bottom: u32,
    left: u32,
    right: u32,
    mode: BorderMode,
) -> Image<P> {
    let channels = P::CHANNEL_COUNT as usize;
    let (sw, sh) = (src.width() as usize, src.height() as usize);
    let out_w = src.width() + left + right;
    let out_h = src.height() + top + bottom;
    let mut dst = Image::<P>::new(out_w, out_h);
    if out_w == 0 || out_h == 0 {
        return dst;
    }
    let raw = src.as_raw();

    dst.as_mut()
        .par_chunks_mut(out_w as usize * channels)
        .enumerate()
        .for_each(|(y, row)| {
            let sy = map_coord(y as isize - top as isize, sh, mode);
            for x in 0..out_w as usize {
                let sx = map_coord(x as isize - left as isize, sw, mode);
                let out = &mut row[x * channels..(x + 1) * channels];
                match (sx, sy) {
                    (Some(ix), Some(iy)) => {
                        let idx = (iy * sw + ix) * channels;
                        out.copy_from_slice(&raw[idx..idx + channels]);
                    }
                    _ => {
                        for (c, v) in out.iter_mut().enumerate() {
                            *v = match mode {
                                BorderMode::Constant(s) => s.channel(c),
                                _ => 0,
                            };
                        }
                    }
                }
            }
        });

    dst
}
