//! Synthetic stand-ins for the pictures the tutorials load from disk.
//!
//! All colour images are RGB. Sizes and feature positions match what the
//! tutorials assume, e.g. the ball in [`pitch_scene`] sits inside rows
//! `280..340` and columns `330..390`.

use cv_imgproc::{
    circle, ellipse, fill_poly, get_text_size, line, put_text, rectangle, FontFace, LineType,
    FILLED,
};
use cv_videoio::{CaptureProperty, VideoCapture, VideoError};
use image::{GrayImage, Luma, Rgb, RgbImage};

const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
const BLACK: Rgb<u8> = Rgb([0, 0, 0]);

fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

fn shade(a: [u8; 3], b: [u8; 3], t: f32) -> Rgb<u8> {
    Rgb(std::array::from_fn(|c| lerp(a[c] as f32, b[c] as f32, t).round() as u8))
}

/// 256x256 portrait: a face under a wide-brimmed hat against a warm backdrop.
pub fn portrait() -> RgbImage {
    let (w, h) = (256u32, 256u32);
    let mut img = RgbImage::from_fn(w, h, |x, y| {
        let t = (x + y) as f32 / (w + h) as f32;
        shade([196, 120, 110], [90, 50, 70], t)
    });

    ellipse(&mut img, (150, 190), (70, 90), 0.0, 0.0, 360.0, Rgb([70, 40, 35]), FILLED, LineType::AntiAliased);
    ellipse(&mut img, (140, 140), (48, 62), 10.0, 0.0, 360.0, Rgb([232, 176, 150]), FILLED, LineType::AntiAliased);
    ellipse(&mut img, (130, 80), (110, 26), -15.0, 0.0, 360.0, Rgb([180, 140, 90]), FILLED, LineType::AntiAliased);
    ellipse(&mut img, (130, 80), (110, 26), -15.0, 190.0, 350.0, Rgb([120, 60, 90]), 6, LineType::AntiAliased);
    for eye in [(122, 130), (158, 136)] {
        circle(&mut img, eye, 6, WHITE, FILLED, LineType::AntiAliased);
        circle(&mut img, eye, 3, Rgb([60, 90, 120]), FILLED, LineType::AntiAliased);
    }
    ellipse(&mut img, (138, 172), (14, 5), 5.0, 0.0, 180.0, Rgb([190, 70, 80]), 3, LineType::AntiAliased);
    img
}

/// Horizontal ramp from 0 on the left to 255 on the right.
pub fn gradient(width: u32, height: u32) -> GrayImage {
    let span = width.saturating_sub(1).max(1);
    GrayImage::from_fn(width, height, |x, _| Luma([(x * 255 / span) as u8]))
}

pub const PITCH_SIZE: (u32, u32) = (548, 342);
pub const BALL_CENTER: (i32, i32) = (360, 310);
pub const BALL_RADIUS: i32 = 24;

/// 548x342 football scene with a player and a ball near the bottom.
pub fn pitch_scene() -> RgbImage {
    let (w, h) = PITCH_SIZE;
    let mut img = RgbImage::from_fn(w, h, |x, y| {
        if y < 110 {
            shade([120, 150, 200], [60, 70, 90], y as f32 / 110.0)
        } else if (x / 46) % 2 == 0 {
            Rgb([52, 128, 48])
        } else {
            Rgb([64, 146, 58])
        }
    });

    // player
    rectangle(&mut img, (200, 150), (250, 240), Rgb([200, 30, 50]), FILLED, LineType::Connected8);
    rectangle(&mut img, (204, 240), (246, 275), WHITE, FILLED, LineType::Connected8);
    line(&mut img, (212, 275), (200, 325), Rgb([230, 190, 160]), 10, LineType::AntiAliased);
    line(&mut img, (238, 275), (262, 322), Rgb([230, 190, 160]), 10, LineType::AntiAliased);
    line(&mut img, (200, 160), (175, 220), Rgb([230, 190, 160]), 9, LineType::AntiAliased);
    line(&mut img, (250, 160), (276, 215), Rgb([230, 190, 160]), 9, LineType::AntiAliased);
    circle(&mut img, (225, 128), 20, Rgb([230, 190, 160]), FILLED, LineType::AntiAliased);
    ellipse(&mut img, (225, 116), (21, 11), 0.0, 180.0, 360.0, Rgb([40, 25, 20]), FILLED, LineType::AntiAliased);

    ball(&mut img, BALL_CENTER, BALL_RADIUS);
    img
}

fn ball(img: &mut RgbImage, center: (i32, i32), radius: i32) {
    circle(img, center, radius, WHITE, FILLED, LineType::AntiAliased);
    let patch: Vec<(i32, i32)> = (0..5)
        .map(|i| {
            let a = (i as f64 * 72.0 - 90.0).to_radians();
            let r = radius as f64 * 0.4;
            (
                center.0 + (r * a.cos()).round() as i32,
                center.1 + (r * a.sin()).round() as i32,
            )
        })
        .collect();
    fill_poly(img, &[patch], BLACK, LineType::AntiAliased);
    circle(img, center, radius, Rgb([30, 30, 30]), 2, LineType::AntiAliased);
}

/// Three open rings and the word "OpenCV" on black, scaled to `size` x `size`.
pub fn logo(size: u32) -> RgbImage {
    let mut img = RgbImage::new(size, size);
    let s = size as f64 / 512.0;
    let px = |v: f64| (v * s).round() as i32;
    let thickness = px(40.0).max(1);
    let axes = (px(64.0), px(64.0));

    let rings = [
        ((px(256.0), px(128.0)), 90.0, Rgb([255, 0, 0])),
        ((px(150.0), px(288.0)), -45.0, Rgb([0, 255, 0])),
        ((px(362.0), px(288.0)), -90.0, Rgb([0, 0, 255])),
    ];
    for (center, angle, color) in rings {
        ellipse(&mut img, center, axes, angle, 45.0, 315.0, color, thickness, LineType::AntiAliased);
    }
    put_text(
        &mut img,
        "OpenCV",
        (px(70.0), px(464.0)),
        FontFace::Simplex,
        3.0 * s,
        WHITE,
        px(4.0).max(1),
        LineType::AntiAliased,
    );
    img
}

/// White card with `text` centred in dark ink and a coloured band along the bottom.
pub fn banner(width: u32, height: u32, text: &str) -> RgbImage {
    let mut img = RgbImage::from_pixel(width, height, WHITE);
    let band = (height as i32 * 4) / 5;
    rectangle(&mut img, (0, band), (width as i32 - 1, height as i32 - 1), Rgb([40, 110, 200]), FILLED, LineType::Connected8);

    let scale = height as f64 / 60.0;
    let size = get_text_size(text, FontFace::Duplex, scale, 2);
    let org = ((width as i32 - size.width) / 2, (band + size.height) / 2);
    put_text(&mut img, text, org, FontFace::Duplex, scale, Rgb([30, 30, 30]), 2, LineType::AntiAliased);
    img
}

/// Points marked in [`drawing`], in pixel coordinates.
pub const DRAWING_POINTS: [(f32, f32); 3] = [(50.0, 50.0), (200.0, 50.0), (50.0, 200.0)];

/// 320x320 graph paper with the affine reference points marked in green.
pub fn drawing() -> RgbImage {
    let size = 320;
    let mut img = RgbImage::from_pixel(size, size, WHITE);
    for i in (0..size as i32).step_by(20) {
        let color = if i % 100 == 0 { Rgb([90, 90, 90]) } else { Rgb([200, 200, 200]) };
        line(&mut img, (i, 0), (i, size as i32 - 1), color, 1, LineType::Connected8);
        line(&mut img, (0, i), (size as i32 - 1, i), color, 1, LineType::Connected8);
    }
    let pts: Vec<(i32, i32)> = DRAWING_POINTS.iter().map(|&(x, y)| (x as i32, y as i32)).collect();
    line(&mut img, pts[0], pts[1], Rgb([30, 30, 200]), 3, LineType::AntiAliased);
    line(&mut img, pts[0], pts[2], Rgb([200, 30, 30]), 3, LineType::AntiAliased);
    for p in pts {
        circle(&mut img, p, 6, Rgb([0, 200, 0]), FILLED, LineType::AntiAliased);
    }
    img
}

/// Corners of the puzzle in [`sudoku`]: top-left, top-right, bottom-left, bottom-right.
pub const SUDOKU_CORNERS: [(f32, f32); 4] = [(60.0, 68.0), (389.0, 54.0), (31.0, 405.0), (412.0, 409.0)];

const SUDOKU_GIVENS: [(u32, u32, char); 12] = [
    (0, 0, '5'),
    (0, 1, '3'),
    (0, 4, '7'),
    (1, 0, '6'),
    (1, 3, '1'),
    (1, 4, '9'),
    (2, 1, '9'),
    (2, 2, '8'),
    (4, 4, '6'),
    (6, 6, '2'),
    (7, 5, '5'),
    (8, 8, '9'),
];

/// 450x450 photo-like sudoku: a skewed grid on off-white paper.
pub fn sudoku() -> RgbImage {
    let size = 450;
    let mut img = RgbImage::from_fn(size, size, |x, y| {
        let t = (x + y) as f32 / (2 * size) as f32;
        shade([236, 232, 222], [196, 192, 184], t)
    });

    let [tl, tr, bl, br] = SUDOKU_CORNERS;
    // Bilinear position of grid coordinate (u, v) in 0..=1.
    let at = |u: f32, v: f32| -> (f32, f32) {
        let top = (lerp(tl.0, tr.0, u), lerp(tl.1, tr.1, u));
        let bottom = (lerp(bl.0, br.0, u), lerp(bl.1, br.1, u));
        (lerp(top.0, bottom.0, v), lerp(top.1, bottom.1, v))
    };
    let pt = |p: (f32, f32)| (p.0.round() as i32, p.1.round() as i32);

    for i in 0..=9 {
        let t = i as f32 / 9.0;
        let thickness = if i % 3 == 0 { 4 } else { 1 };
        let ink = Rgb([25, 25, 25]);
        line(&mut img, pt(at(t, 0.0)), pt(at(t, 1.0)), ink, thickness, LineType::AntiAliased);
        line(&mut img, pt(at(0.0, t)), pt(at(1.0, t)), ink, thickness, LineType::AntiAliased);
    }

    for (row, col, digit) in SUDOKU_GIVENS {
        let (cx, cy) = at((col as f32 + 0.5) / 9.0, (row as f32 + 0.5) / 9.0);
        let text = digit.to_string();
        let size = get_text_size(&text, FontFace::Simplex, 1.0, 2);
        let org = ((cx as i32) - size.width / 2, (cy as i32) + size.height / 2);
        put_text(&mut img, &text, org, FontFace::Simplex, 1.0, Rgb([20, 20, 20]), 2, LineType::AntiAliased);
    }
    img
}

const PAGE_TEXT: [&str; 6] = [
    "ADAPTIVE THRESHOLD",
    "EACH PIXEL IS COMPARED",
    "WITH ITS NEIGHBOURHOOD",
    "SO SHADOWS DO NOT",
    "SWALLOW THE TEXT",
    "0123456789",
];

/// Printed page lit from the bottom right: dark in one corner, bright in the other.
pub fn uneven_page(width: u32, height: u32) -> GrayImage {
    let mut ink = GrayImage::from_pixel(width, height, Luma([255]));
    let scale = width as f64 / 420.0;
    let line_h = (height as usize / (PAGE_TEXT.len() + 1)) as i32;
    for (i, text) in PAGE_TEXT.iter().enumerate() {
        let org = ((width as f64 * 0.06) as i32, line_h * (i as i32 + 1) + line_h / 3);
        put_text(&mut ink, text, org, FontFace::Simplex, scale, Luma([0]), 2, LineType::AntiAliased);
    }

    let (w, h) = (width.max(2) as f32 - 1.0, height.max(2) as f32 - 1.0);
    GrayImage::from_fn(width, height, |x, y| {
        let light = 40.0 + 200.0 * (0.7 * x as f32 / w + 0.3 * y as f32 / h);
        let paper = ink.get_pixel(x, y)[0] as f32 / 255.0;
        Luma([(light * (0.4 + 0.6 * paper)).round().clamp(0.0, 255.0) as u8])
    })
}

/// Endless-camera stand-in: a blue ball and a yellow block bouncing over a
/// dark background for a fixed number of frames.
#[derive(Debug, Clone)]
pub struct BouncingBall {
    size: (u32, u32),
    frames: u32,
    next: u32,
    current: Option<RgbImage>,
    opened: bool,
}

pub const BALL_BLUE: Rgb<u8> = Rgb([30, 60, 220]);
pub const BLOCK_YELLOW: Rgb<u8> = Rgb([235, 210, 40]);

impl BouncingBall {
    pub const FPS: f64 = 30.0;

    pub fn new(size: (u32, u32), frames: u32) -> Self {
        Self {
            size,
            frames,
            next: 0,
            current: None,
            opened: true,
        }
    }

    /// Frame `index`, independent of the read position.
    pub fn render(&self, index: u32) -> RgbImage {
        let (w, h) = self.size;
        let mut img = RgbImage::from_fn(w, h, |_, y| shade([44, 44, 44], [16, 16, 16], y as f32 / h.max(1) as f32));

        // Triangle wave over 0..=max.
        let bounce = |t: u32, speed: u32, max: u32| -> i32 {
            if max == 0 {
                return 0;
            }
            let p = (t * speed) % (2 * max);
            (if p > max { 2 * max - p } else { p }) as i32
        };
        let r = (h / 10).max(2) as i32;
        let cx = r + bounce(index, 7, w.saturating_sub(2 * r as u32));
        let cy = r + bounce(index, 5, h.saturating_sub(2 * r as u32));
        circle(&mut img, (cx, cy), r, BALL_BLUE, FILLED, LineType::AntiAliased);

        let side = r * 2;
        let bx = bounce(index + 40, 4, w.saturating_sub(side as u32));
        let by = h as i32 - side - bounce(index, 3, (h / 2).saturating_sub(side as u32));
        rectangle(&mut img, (bx, by), (bx + side, by + side), BLOCK_YELLOW, FILLED, LineType::Connected8);
        img
    }
}

impl VideoCapture for BouncingBall {
    fn is_opened(&self) -> bool {
        self.opened
    }

    fn grab(&mut self) -> cv_videoio::Result<()> {
        if !self.opened {
            return Err(VideoError::CaptureFailed("capture released".into()));
        }
        if self.next >= self.frames {
            return Err(VideoError::EndOfStream);
        }
        self.current = Some(self.render(self.next));
        self.next += 1;
        Ok(())
    }

    fn retrieve(&mut self) -> cv_videoio::Result<RgbImage> {
        self.current
            .clone()
            .ok_or_else(|| VideoError::CaptureFailed("no frame grabbed".into()))
    }

    fn get(&self, prop: CaptureProperty) -> Option<f64> {
        Some(match prop {
            CaptureProperty::FrameWidth => self.size.0 as f64,
            CaptureProperty::FrameHeight => self.size.1 as f64,
            CaptureProperty::Fps => Self::FPS,
            CaptureProperty::FrameCount => self.frames as f64,
            CaptureProperty::PosFrames => self.next as f64,
        })
    }

    fn set(&mut self, prop: CaptureProperty, value: f64) -> bool {
        match prop {
            CaptureProperty::PosFrames if value >= 0.0 && value <= self.frames as f64 => {
                self.next = value as u32;
                true
            }
            _ => false,
        }
    }

    fn release(&mut self) {
        self.opened = false;
        self.current = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gradient_spans_full_range() {
        let g = gradient(256, 4);
        assert_eq!(g.get_pixel(0, 0)[0], 0);
        assert_eq!(g.get_pixel(127, 3)[0], 127);
        assert_eq!(g.get_pixel(255, 2)[0], 255);
    }

    #[test]
    fn ball_is_inside_the_tutorial_roi() {
        let img = pitch_scene();
        assert_eq!(img.dimensions(), PITCH_SIZE);
        let (cx, cy) = BALL_CENTER;
        assert!(cx - BALL_RADIUS >= 330 && cx + BALL_RADIUS < 390);
        assert!(cy - BALL_RADIUS >= 280 && cy + BALL_RADIUS < 340);
        // the ball is white away from its centre patch
        assert_eq!(img.get_pixel((cx + BALL_RADIUS / 2 + 3) as u32, cy as u32), &WHITE);
    }

    #[test]
    fn logo_background_is_black() {
        let img = logo(200);
        assert_eq!(img.get_pixel(0, 0), &BLACK);
        assert_eq!(img.get_pixel(199, 0), &BLACK);
        assert!(img.pixels().any(|p| p[0] > 200 && p[1] < 50));
    }

    #[test]
    fn page_is_darker_on_the_left() {
        let page = uneven_page(420, 300);
        let left = page.get_pixel(2, 150)[0];
        let right = page.get_pixel(417, 150)[0];
        assert!(left < 100 && right > 180, "left {left}, right {right}");
    }

    #[test]
    fn bouncing_ball_ends_and_seeks() {
        let mut cap = BouncingBall::new((64, 48), 3);
        for _ in 0..3 {
            assert_eq!(cap.read().unwrap().dimensions(), (64, 48));
        }
        assert!(matches!(cap.read(), Err(VideoError::EndOfStream)));
        assert!(cap.set(CaptureProperty::PosFrames, 1.0));
        assert_eq!(cap.read().unwrap(), cap.render(1));
        cap.release();
        assert!(cap.read().is_err());
    }
}
