//! Raster drawing primitives and text.
//!
//! Points are integer pixel centres. One-pixel lines without anti-aliasing use
//! Bresenham; everything else is rendered through a coverage mask that is
//! blended into the image once per primitive, so overlapping segments of a
//! polyline never darken their joints twice. All primitives clip to the image.

use crate::font::{glyph, FontFace, GLYPH_ADVANCE, GLYPH_COLS, GLYPH_ROWS};
use cv_core::{Image, U8Pixel};

pub type Point = (i32, i32);

/// Passed as `thickness` to fill closed shapes.
pub const FILLED: i32 = -1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineType {
    Connected4,
    #[default]
    Connected8,
    AntiAliased,
}

type Segment = ((f32, f32), (f32, f32));

fn dist_to_segment(p: (f32, f32), a: (f32, f32), b: (f32, f32)) -> f32 {
    let (abx, aby) = (b.0 - a.0, b.1 - a.1);
    let (apx, apy) = (p.0 - a.0, p.1 - a.1);
    let len2 = abx * abx + aby * aby;
    let t = if len2 > 0.0 {
        ((apx * abx + apy * aby) / len2).clamp(0.0, 1.0)
    } else {
        0.0
    };
    let (dx, dy) = (apx - t * abx, apy - t * aby);
    (dx * dx + dy * dy).sqrt()
}

#[inline]
fn coverage(d: f32, radius: f32, aa: bool) -> f32 {
    if aa {
        (radius + 0.5 - d).clamp(0.0, 1.0)
    } else if d <= radius.max(0.5) {
        1.0
    } else {
        0.0
    }
}

/// Per-pixel coverage in `[0, 1]` over a window of the target image.
struct Coverage {
    x0: i32,
    y0: i32,
    w: i32,
    h: i32,
    data: Vec<f32>,
}

impl Coverage {
    fn new(img_w: u32, img_h: u32, min: (f32, f32), max: (f32, f32)) -> Option<Self> {
        let x0 = (min.0.floor() as i32 - 1).max(0);
        let y0 = (min.1.floor() as i32 - 1).max(0);
        let x1 = (max.0.ceil() as i32 + 1).min(img_w as i32 - 1);
        let y1 = (max.1.ceil() as i32 + 1).min(img_h as i32 - 1);
        if x1 < x0 || y1 < y0 {
            return None;
        }
        let (w, h) = (x1 - x0 + 1, y1 - y0 + 1);
        Some(Self {
            x0,
            y0,
            w,
            h,
            data: vec![0.0; (w * h) as usize],
        })
    }

    fn around<P: U8Pixel>(img: &Image<P>, points: &[(f32, f32)], pad: f32) -> Option<Self> {
        let mut min = (f32::MAX, f32::MAX);
        let mut max = (f32::MIN, f32::MIN);
        for &(x, y) in points {
            min = (min.0.min(x), min.1.min(y));
            max = (max.0.max(x), max.1.max(y));
        }
        if points.is_empty() {
            return None;
        }
        Self::new(
            img.width(),
            img.height(),
            (min.0 - pad, min.1 - pad),
            (max.0 + pad, max.1 + pad),
        )
    }

    #[inline]
    fn raise(&mut self, x: i32, y: i32, v: f32) {
        let idx = ((y - self.y0) * self.w + (x - self.x0)) as usize;
        if v > self.data[idx] {
            self.data[idx] = v;
        }
    }

    /// Clipped inclusive pixel range covering `[lo, hi]` along one axis of the window.
    fn span(lo: f32, hi: f32, start: i32, len: i32) -> (i32, i32) {
        ((lo.floor() as i32).max(start), (hi.ceil() as i32).min(start + len - 1))
    }

    fn stamp_segment(&mut self, seg: Segment, radius: f32, aa: bool) {
        let (a, b) = seg;
        let reach = radius + 1.0;
        let (lx, hx) = Self::span(a.0.min(b.0) - reach, a.0.max(b.0) + reach, self.x0, self.w);
        let (ly, hy) = Self::span(a.1.min(b.1) - reach, a.1.max(b.1) + reach, self.y0, self.h);
        for y in ly..=hy {
            for x in lx..=hx {
                let v = coverage(dist_to_segment((x as f32, y as f32), a, b), radius, aa);
                if v > 0.0 {
                    self.raise(x, y, v);
                }
            }
        }
    }

    /// Axis-aligned box `[x0, x1) x [y0, y1)` in continuous coordinates, grown by `radius`.
    fn stamp_box(&mut self, x0: f32, y0: f32, x1: f32, y1: f32, radius: f32, aa: bool) {
        // Distances are measured from pixel centres to the box inset by half a pixel.
        let inset = |lo: f32, hi: f32| {
            if hi - lo >= 1.0 {
                (lo + 0.5, hi - 0.5)
            } else {
                let mid = (lo + hi) * 0.5;
                (mid, mid)
            }
        };
        let (ix0, ix1) = inset(x0, x1);
        let (iy0, iy1) = inset(y0, y1);
        let reach = radius + 1.0;
        let (lx, hx) = Self::span(x0 - reach, x1 + reach, self.x0, self.w);
        let (ly, hy) = Self::span(y0 - reach, y1 + reach, self.y0, self.h);

        for y in ly..=hy {
            for x in lx..=hx {
                let (cx, cy) = (x as f32 + 0.5, y as f32 + 0.5);
                let dx = (ix0 - cx).max(cx - ix1).max(0.0);
                let dy = (iy0 - cy).max(cy - iy1).max(0.0);
                let d = (dx * dx + dy * dy).sqrt();
                let v = if aa {
                    (radius + 1.0 - d).clamp(0.0, 1.0)
                } else if d <= radius + 0.5 {
                    1.0
                } else {
                    0.0
                };
                if v > 0.0 {
                    self.raise(x, y, v);
                }
            }
        }
    }

    fn stamp_with<F: Fn(f32, f32) -> f32>(&mut self, f: F) {
        for y in self.y0..self.y0 + self.h {
            for x in self.x0..self.x0 + self.w {
                let v = f(x as f32, y as f32);
                if v > 0.0 {
                    self.raise(x, y, v);
                }
            }
        }
    }

    /// Even-odd scanline fill sampled at pixel centres.
    fn fill_polygons(&mut self, polygons: &[Vec<(f32, f32)>]) {
        let mut crossings = Vec::new();
        for y in self.y0..self.y0 + self.h {
            let fy = y as f32;
            crossings.clear();
            for poly in polygons {
                let n = poly.len();
                for i in 0..n {
                    let a = poly[i];
                    let b = poly[(i + 1) % n];
                    if (a.1 <= fy && b.1 > fy) || (b.1 <= fy && a.1 > fy) {
                        crossings.push(a.0 + (fy - a.1) * (b.0 - a.0) / (b.1 - a.1));
                    }
                }
            }
            crossings.sort_by(|a, b| a.total_cmp(b));
            for pair in crossings.chunks_exact(2) {
                let lx = (pair[0].ceil() as i32).max(self.x0);
                let hx = (pair[1].floor() as i32).min(self.x0 + self.w - 1);
                for x in lx..=hx {
                    self.raise(x, y, 1.0);
                }
            }
        }
    }

    fn blend<P: U8Pixel>(&self, img: &mut Image<P>, color: &P) {
        let channels = P::CHANNEL_COUNT as usize;
        let width = img.width() as usize;
        let color = color.channels();
        let raw: &mut [u8] = img;

        for row in 0..self.h {
            for col in 0..self.w {
                let v = self.data[(row * self.w + col) as usize];
                if v <= 0.0 {
                    continue;
                }
                let idx = ((self.y0 + row) as usize * width + (self.x0 + col) as usize) * channels;
                for (dst, &src) in raw[idx..idx + channels].iter_mut().zip(color) {
                    *dst = if v >= 1.0 {
                        src
                    } else {
                        (src as f32 * v + *dst as f32 * (1.0 - v)).round() as u8
                    };
                }
            }
        }
    }
}

#[inline]
fn put<P: U8Pixel>(img: &mut Image<P>, x: i32, y: i32, color: &P) {
    if x >= 0 && y >= 0 && (x as u32) < img.width() && (y as u32) < img.height() {
        img.put_pixel(x as u32, y as u32, *color);
    }
}

// Bresenham's line algorithm
fn line_connected8<P: U8Pixel>(img: &mut Image<P>, p1: Point, p2: Point, color: &P) {
    let (mut x0, mut y0) = p1;
    let (x1, y1) = p2;

    let dx = (x1 - x0).abs();
    let dy = -(y1 - y0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        put(img, x0, y0, color);
        if x0 == x1 && y0 == y1 {
            break;
        }

        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}

/// Line whose consecutive pixels share an edge.
fn line_connected4<P: U8Pixel>(img: &mut Image<P>, p1: Point, p2: Point, color: &P) {
    let (mut x, mut y) = p1;
    let dx = (p2.0 - p1.0).abs() as i64;
    let dy = (p2.1 - p1.1).abs() as i64;
    let sx = if p1.0 < p2.0 { 1 } else { -1 };
    let sy = if p1.1 < p2.1 { 1 } else { -1 };
    let (mut ix, mut iy) = (0i64, 0i64);

    put(img, x, y, color);
    while ix < dx || iy < dy {
        if (1 + 2 * ix) * dy < (1 + 2 * iy) * dx {
            x += sx;
            ix += 1;
        } else {
            y += sy;
            iy += 1;
        }
        put(img, x, y, color);
    }
}

fn thin_line<P: U8Pixel>(img: &mut Image<P>, p1: Point, p2: Point, color: &P, line_type: LineType) {
    match line_type {
        LineType::Connected4 => line_connected4(img, p1, p2, color),
        _ => line_connected8(img, p1, p2, color),
    }
}

fn is_thin(thickness: i32, line_type: LineType) -> bool {
    thickness <= 1 && line_type != LineType::AntiAliased
}

fn stroke_segments<P: U8Pixel>(
    img: &mut Image<P>,
    segments: &[Segment],
    thickness: i32,
    line_type: LineType,
    color: &P,
) {
    let radius = thickness.max(1) as f32 / 2.0;
    let points: Vec<(f32, f32)> = segments.iter().flat_map(|&(a, b)| [a, b]).collect();
    let Some(mut cov) = Coverage::around(img, &points, radius + 1.0) else {
        return;
    };
    let aa = line_type == LineType::AntiAliased;
    for &seg in segments {
        cov.stamp_segment(seg, radius, aa);
    }
    cov.blend(img, color);
}

fn to_f(p: Point) -> (f32, f32) {
    (p.0 as f32, p.1 as f32)
}

/// Straight segment from `pt1` to `pt2` with round caps.
pub fn line<P: U8Pixel>(
    img: &mut Image<P>,
    pt1: Point,
    pt2: Point,
    color: P,
    thickness: i32,
    line_type: LineType,
) {
    if is_thin(thickness, line_type) {
        thin_line(img, pt1, pt2, &color, line_type);
    } else {
        stroke_segments(img, &[(to_f(pt1), to_f(pt2))], thickness, line_type, &color);
    }
}

/// Line with an arrow head at `pt2`; `tip_length` is relative to the line length.
pub fn arrowed_line<P: U8Pixel>(
    img: &mut Image<P>,
    pt1: Point,
    pt2: Point,
    color: P,
    thickness: i32,
    line_type: LineType,
    tip_length: f64,
) {
    let dx = (pt1.0 - pt2.0) as f64;
    let dy = (pt1.1 - pt2.1) as f64;
    let angle = dy.atan2(dx);
    let len = tip_length * dx.hypot(dy);
    let quarter = std::f64::consts::FRAC_PI_4;
    let tip = |a: f64| {
        (
            (pt2.0 as f64 + len * a.cos()).round() as i32,
            (pt2.1 as f64 + len * a.sin()).round() as i32,
        )
    };

    let polyline = [pt1, pt2];
    polylines(img, &polyline, false, color, thickness, line_type);
    polylines(img, &[tip(angle + quarter), pt2, tip(angle - quarter)], false, color, thickness, line_type);
}

pub fn polylines<P: U8Pixel>(
    img: &mut Image<P>,
    points: &[Point],
    is_closed: bool,
    color: P,
    thickness: i32,
    line_type: LineType,
) {
    if points.is_empty() {
        return;
    }
    let n = points.len();
    let pairs: Vec<(Point, Point)> = if n == 1 {
        vec![(points[0], points[0])]
    } else if is_closed && n > 2 {
        (0..n).map(|i| (points[i], points[(i + 1) % n])).collect()
    } else {
        points.windows(2).map(|w| (w[0], w[1])).collect()
    };

    if is_thin(thickness, line_type) {
        for (a, b) in pairs {
            thin_line(img, a, b, &color, line_type);
        }
    } else {
        let segments: Vec<Segment> = pairs.into_iter().map(|(a, b)| (to_f(a), to_f(b))).collect();
        stroke_segments(img, &segments, thickness, line_type, &color);
    }
}

/// Rectangle with opposite corners `pt1` and `pt2`; `FILLED` paints the interior.
pub fn rectangle<P: U8Pixel>(
    img: &mut Image<P>,
    pt1: Point,
    pt2: Point,
    color: P,
    thickness: i32,
    line_type: LineType,
) {
    if thickness < 0 {
        let x0 = pt1.0.min(pt2.0).max(0);
        let y0 = pt1.1.min(pt2.1).max(0);
        let x1 = pt1.0.max(pt2.0).min(img.width() as i32 - 1);
        let y1 = pt1.1.max(pt2.1).min(img.height() as i32 - 1);
        for y in y0..=y1 {
            for x in x0..=x1 {
                img.put_pixel(x as u32, y as u32, color);
            }
        }
        return;
    }
    let corners = [pt1, (pt2.0, pt1.1), pt2, (pt1.0, pt2.1)];
    polylines(img, &corners, true, color, thickness, line_type);
}

// Midpoint circle, one pixel per octant step.
fn circle_outline_thin<P: U8Pixel>(img: &mut Image<P>, center: Point, radius: i32, color: &P) {
    let (cx, cy) = center;
    let (mut x, mut y) = (radius, 0);
    let mut err = 1 - radius;
    while x >= y {
        for (px, py) in [
            (x, y),
            (y, x),
            (-y, x),
            (-x, y),
            (-x, -y),
            (-y, -x),
            (y, -x),
            (x, -y),
        ] {
            put(img, cx + px, cy + py, color);
        }
        y += 1;
        if err < 0 {
            err += 2 * y + 1;
        } else {
            x -= 1;
            err += 2 * (y - x) + 1;
        }
    }
}

pub fn circle<P: U8Pixel>(
    img: &mut Image<P>,
    center: Point,
    radius: i32,
    color: P,
    thickness: i32,
    line_type: LineType,
) {
    if radius < 0 {
        return;
    }
    let aa = line_type == LineType::AntiAliased;
    let (cx, cy) = to_f(center);
    let r = radius as f32;

    if thickness < 0 && !aa {
        let (ccx, ccy) = center;
        let r2 = (radius as i64) * (radius as i64);
        let rows = ccy.saturating_sub(radius).max(0)..=ccy.saturating_add(radius).min(img.height() as i32 - 1);
        let cols = ccx.saturating_sub(radius).max(0)..=ccx.saturating_add(radius).min(img.width() as i32 - 1);
        for y in rows {
            for x in cols.clone() {
                let (dx, dy) = ((x - ccx) as i64, (y - ccy) as i64);
                if dx * dx + dy * dy <= r2 {
                    put(img, x, y, &color);
                }
            }
        }
        return;
    }
    if thickness >= 0 && is_thin(thickness, line_type) {
        circle_outline_thin(img, center, radius, &color);
        return;
    }

    let half = thickness.max(1) as f32 / 2.0;
    let pad = r + half + 1.0;
    let Some(mut cov) = Coverage::new(img.width(), img.height(), (cx - pad, cy - pad), (cx + pad, cy + pad)) else {
        return;
    };
    let filled = thickness < 0;
    cov.stamp_with(|x, y| {
        let d = ((x - cx).powi(2) + (y - cy).powi(2)).sqrt();
        if filled {
            coverage(d, r, true)
        } else {
            coverage((d - r).abs(), half, aa)
        }
    });
    cov.blend(img, &color);
}

fn ellipse_points(
    center: (f32, f32),
    axes: (f32, f32),
    angle: f64,
    arc_start: f64,
    arc_end: f64,
    delta: f64,
) -> Vec<(f32, f32)> {
    if !(angle.is_finite() && arc_start.is_finite() && arc_end.is_finite()) {
        return Vec::new();
    }
    let angle = angle.rem_euclid(360.0);
    let (low, high) = if arc_start > arc_end {
        (arc_end, arc_start)
    } else {
        (arc_start, arc_end)
    };
    let (start, end) = if high - low >= 360.0 {
        (0.0, 360.0)
    } else {
        let start = low.rem_euclid(360.0);
        (start, start + (high - low))
    };

    let (sin_a, cos_a) = angle.to_radians().sin_cos();
    let delta = delta.max(1.0);
    let mut points: Vec<(f32, f32)> = Vec::new();
    let mut i = start;
    loop {
        let t = i.min(end).to_radians();
        let x = axes.0 as f64 * t.cos();
        let y = axes.1 as f64 * t.sin();
        let p = (
            (center.0 as f64 + x * cos_a - y * sin_a) as f32,
            (center.1 as f64 + x * sin_a + y * cos_a) as f32,
        );
        if points.last() != Some(&p) {
            points.push(p);
        }
        if i >= end {
            break;
        }
        i += delta;
    }
    if points.len() == 1 {
        points.push(points[0]);
    }
    points
}

/// Polygon approximating an elliptic arc; angles in degrees, `delta` is the step between vertices.
pub fn ellipse_to_poly(
    center: Point,
    axes: (i32, i32),
    angle: i32,
    arc_start: i32,
    arc_end: i32,
    delta: i32,
) -> Vec<Point> {
    let mut out: Vec<Point> = Vec::new();
    for (x, y) in ellipse_points(
        to_f(center),
        (axes.0 as f32, axes.1 as f32),
        angle as f64,
        arc_start as f64,
        arc_end as f64,
        delta as f64,
    ) {
        let p = (x.round() as i32, y.round() as i32);
        if out.last() != Some(&p) {
            out.push(p);
        }
    }
    if out.len() == 1 {
        out.push(out[0]);
    }
    out
}

/// Elliptic arc from `start_angle` to `end_angle` (degrees, clockwise with y down),
/// rotated by `angle`. `FILLED` paints the sector.
#[allow(clippy::too_many_arguments)]
pub fn ellipse<P: U8Pixel>(
    img: &mut Image<P>,
    center: Point,
    axes: (i32, i32),
    angle: f64,
    start_angle: f64,
    end_angle: f64,
    color: P,
    thickness: i32,
    line_type: LineType,
) {
    if axes.0 < 0 || axes.1 < 0 {
        return;
    }
    let size = axes.0.max(axes.1);
    let delta = match size {
        s if s < 3 => 90.0,
        s if s < 10 => 30.0,
        s if s < 15 => 18.0,
        _ => 5.0,
    };
    let mut points = ellipse_points(
        to_f(center),
        (axes.0 as f32, axes.1 as f32),
        angle,
        start_angle,
        end_angle,
        delta,
    );
    if points.is_empty() {
        return;
    }
    let aa = line_type == LineType::AntiAliased;

    if thickness < 0 {
        if (end_angle - start_angle).abs() < 360.0 {
            points.push(to_f(center));
        }
        let Some(mut cov) = Coverage::around(img, &points, 1.0) else {
            return;
        };
        let n = points.len();
        cov.fill_polygons(std::slice::from_ref(&points));
        for i in 0..n {
            cov.stamp_segment((points[i], points[(i + 1) % n]), 0.0, aa);
        }
        cov.blend(img, &color);
        return;
    }

    let segments: Vec<Segment> = points.windows(2).map(|w| (w[0], w[1])).collect();
    if is_thin(thickness, line_type) {
        for (a, b) in segments {
            let a = (a.0.round() as i32, a.1.round() as i32);
            let b = (b.0.round() as i32, b.1.round() as i32);
            thin_line(img, a, b, &color, line_type);
        }
    } else {
        stroke_segments(img, &segments, thickness, line_type, &color);
    }
}

/// Fills the union of `polygons` (even-odd rule), edges included.
pub fn fill_poly<P: U8Pixel>(img: &mut Image<P>, polygons: &[Vec<Point>], color: P, line_type: LineType) {
    let polys: Vec<Vec<(f32, f32)>> = polygons
        .iter()
        .filter(|p| !p.is_empty())
        .map(|p| p.iter().copied().map(to_f).collect())
        .collect();
    let all: Vec<(f32, f32)> = polys.iter().flatten().copied().collect();
    let Some(mut cov) = Coverage::around(img, &all, 1.0) else {
        return;
    };
    cov.fill_polygons(&polys);
    let aa = line_type == LineType::AntiAliased;
    for poly in &polys {
        let n = poly.len();
        for i in 0..n {
            cov.stamp_segment((poly[i], poly[(i + 1) % n]), 0.0, aa);
        }
    }
    cov.blend(img, &color);
}

/// Renders `text` with its bottom-left corner at `org`.
#[allow(clippy::too_many_arguments)]
pub fn put_text<P: U8Pixel>(
    img: &mut Image<P>,
    text: &str,
    org: Point,
    font: FontFace,
    font_scale: f64,
    color: P,
    thickness: i32,
    line_type: LineType,
) {
    let cell = font.cell_size(font_scale);
    let n = text.chars().count();
    if cell <= 0.0 || n == 0 {
        return;
    }
    let stroke = thickness.max(1) + font.extra_thickness();
    let radius = (stroke - 1) as f32 / 2.0;
    let aa = line_type == LineType::AntiAliased;

    let (ox, baseline) = to_f(org);
    let top = baseline - GLYPH_ROWS as f32 * cell;
    let right = ox + (n * GLYPH_ADVANCE) as f32 * cell;
    let Some(mut cov) = Coverage::new(
        img.width(),
        img.height(),
        (ox - radius - 1.0, top - radius - 1.0),
        (right + radius + 1.0, baseline + radius + 1.0),
    ) else {
        return;
    };

    for (i, ch) in text.chars().enumerate() {
        let gx = ox + (i * GLYPH_ADVANCE) as f32 * cell;
        for (row, bits) in glyph(ch).iter().enumerate() {
            for col in 0..GLYPH_COLS {
                if bits & (0x10 >> col) == 0 {
                    continue;
                }
                let x0 = gx + col as f32 * cell;
                let y0 = top + row as f32 * cell;
                cov.stamp_box(x0, y0, x0 + cell, y0 + cell, radius, aa);
            }
        }
    }
    cov.blend(img, &color);
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma, Rgb, RgbImage};

    const WHITE: Luma<u8> = Luma([255]);

    fn lit(img: &GrayImage) -> usize {
        img.as_raw().iter().filter(|&&v| v > 0).count()
    }

    #[test]
    fn thin_horizontal_line_covers_exact_pixels() {
        let mut img = GrayImage::new(10, 5);
        line(&mut img, (2, 2), (7, 2), WHITE, 1, LineType::Connected8);
        assert_eq!(lit(&img), 6);
        assert_eq!(img.get_pixel(2, 2)[0], 255);
        assert_eq!(img.get_pixel(7, 2)[0], 255);
    }

    #[test]
    fn four_connected_diagonal_has_more_pixels() {
        let mut eight = GrayImage::new(8, 8);
        let mut four = GrayImage::new(8, 8);
        line(&mut eight, (0, 0), (3, 3), WHITE, 1, LineType::Connected8);
        line(&mut four, (0, 0), (3, 3), WHITE, 1, LineType::Connected4);
        assert_eq!(lit(&eight), 4);
        assert_eq!(lit(&four), 7);
    }

    #[test]
    fn lines_clip_to_the_image() {
        let mut img = GrayImage::new(10, 10);
        line(&mut img, (-20, 5), (30, 5), WHITE, 1, LineType::Connected8);
        line(&mut img, (-20, -20), (40, 40), WHITE, 5, LineType::AntiAliased);
        assert_eq!(img.get_pixel(0, 5)[0], 255);
        assert_eq!(img.get_pixel(9, 9)[0], 255);
    }

    #[test]
    fn anti_aliased_line_has_soft_edges() {
        let mut img = GrayImage::new(20, 20);
        line(&mut img, (2, 3), (17, 11), WHITE, 1, LineType::AntiAliased);
        let partial = img.as_raw().iter().filter(|&&v| v > 0 && v < 255).count();
        assert!(partial > 0);
    }

    #[test]
    fn thick_line_reaches_half_thickness() {
        let mut img = GrayImage::new(30, 30);
        line(&mut img, (5, 15), (25, 15), WHITE, 6, LineType::Connected8);
        assert_eq!(img.get_pixel(15, 12)[0], 255);
        assert_eq!(img.get_pixel(15, 18)[0], 255);
        assert_eq!(img.get_pixel(15, 19)[0], 0);
    }

    #[test]
    fn rectangle_outline_and_fill() {
        let mut outline = GrayImage::new(20, 20);
        rectangle(&mut outline, (2, 2), (11, 11), WHITE, 1, LineType::Connected8);
        assert_eq!(lit(&outline), 36);

        let mut filled = GrayImage::new(20, 20);
        rectangle(&mut filled, (2, 2), (11, 11), WHITE, FILLED, LineType::Connected8);
        assert_eq!(lit(&filled), 100);
    }

    #[test]
    fn filled_circle_area_is_close_to_pi_r_squared() {
        let mut img = RgbImage::new(512, 512);
        circle(&mut img, (256, 256), 100, Rgb([255, 0, 0]), FILLED, LineType::Connected8);
        assert_eq!(img.get_pixel(256, 256), &Rgb([255, 0, 0]));
        assert_eq!(img.get_pixel(356, 256), &Rgb([255, 0, 0]));
        assert_eq!(img.get_pixel(357, 256), &Rgb([0, 0, 0]));

        let area = img.pixels().filter(|p| p[0] == 255).count() as f64;
        let expected = std::f64::consts::PI * 100.0 * 100.0;
        assert!((area - expected).abs() / expected < 0.01);
    }

    #[test]
    fn thin_circle_outline_skips_centre() {
        let mut img = GrayImage::new(40, 40);
        circle(&mut img, (20, 20), 10, WHITE, 1, LineType::Connected8);
        assert_eq!(img.get_pixel(30, 20)[0], 255);
        assert_eq!(img.get_pixel(20, 10)[0], 255);
        assert_eq!(img.get_pixel(20, 20)[0], 0);
    }

    #[test]
    fn ellipse_polygon_traces_the_axes() {
        let pts = ellipse_to_poly((100, 100), (50, 20), 0, 0, 360, 5);
        assert_eq!(pts.first(), Some(&(150, 100)));
        assert_eq!(pts.last(), Some(&(150, 100)));
        assert!(pts.contains(&(100, 120)));
        assert!(pts.contains(&(50, 100)));

        let rotated = ellipse_to_poly((100, 100), (50, 20), 90, 0, 90, 45);
        assert_eq!(rotated.first(), Some(&(100, 150)));
    }

    #[test]
    fn ellipse_angles_wrap_without_stepping() {
        // sweeps wider than a turn draw the whole ellipse
        for start in [-1e20, -1e13] {
            let mut img = GrayImage::new(64, 64);
            ellipse(&mut img, (32, 32), (20, 10), 0.0, start, 90.0, WHITE, 2, LineType::Connected8);
            assert_eq!(img.get_pixel(52, 32)[0], 255);
            assert_eq!(img.get_pixel(12, 32)[0], 255);
        }

        let arc = ellipse_to_poly((100, 100), (50, 50), 0, -90, 0, 45);
        assert_eq!(arc.first(), Some(&(100, 50)));
        assert_eq!(arc.last(), Some(&(150, 100)));
        assert_eq!(arc, ellipse_to_poly((100, 100), (50, 50), -360, 270, 360, 45));

        let mut img = GrayImage::new(16, 16);
        ellipse(&mut img, (8, 8), (4, 4), 0.0, f64::NAN, 90.0, WHITE, FILLED, LineType::Connected8);
        ellipse(&mut img, (8, 8), (4, 4), f64::INFINITY, 0.0, 90.0, WHITE, 1, LineType::Connected8);
        assert_eq!(lit(&img), 0);
    }

    #[test]
    fn filled_circle_larger_than_image_fills_it() {
        let mut img = GrayImage::new(8, 8);
        circle(&mut img, (4, 4), 1_000_000, WHITE, FILLED, LineType::Connected8);
        assert_eq!(lit(&img), 64);

        let mut img = GrayImage::new(8, 8);
        circle(&mut img, (-50, -50), 20, WHITE, FILLED, LineType::Connected8);
        assert_eq!(lit(&img), 0);
    }

    #[test]
    fn thick_arc_covers_only_its_sweep() {
        let mut img = RgbImage::new(200, 200);
        ellipse(&mut img, (100, 100), (60, 60), 0.0, 0.0, 90.0, Rgb([0, 255, 0]), 20, LineType::AntiAliased);
        // 45 degrees along the arc, clockwise from +x with y down
        assert_eq!(img.get_pixel(142, 142), &Rgb([0, 255, 0]));
        assert_eq!(img.get_pixel(58, 58), &Rgb([0, 0, 0]));
        assert_eq!(img.get_pixel(100, 100), &Rgb([0, 0, 0]));
    }

    #[test]
    fn filled_sector_includes_centre() {
        let mut img = GrayImage::new(100, 100);
        ellipse(&mut img, (50, 50), (30, 30), 0.0, 0.0, 90.0, WHITE, FILLED, LineType::Connected8);
        assert_eq!(img.get_pixel(50, 50)[0], 255);
        assert_eq!(img.get_pixel(60, 60)[0], 255);
        assert_eq!(img.get_pixel(40, 40)[0], 0);
    }

    #[test]
    fn fill_poly_paints_triangle_interior() {
        let mut img = GrayImage::new(50, 50);
        fill_poly(&mut img, &[vec![(10, 10), (40, 10), (10, 40)]], WHITE, LineType::Connected8);
        assert_eq!(img.get_pixel(15, 15)[0], 255);
        assert_eq!(img.get_pixel(40, 10)[0], 255);
        assert_eq!(img.get_pixel(35, 35)[0], 0);
    }

    #[test]
    fn text_stays_inside_its_reported_box() {
        let mut img = GrayImage::new(100, 60);
        put_text(&mut img, "H", (10, 40), FontFace::Simplex, 1.0, WHITE, 1, LineType::Connected8);
        let size = crate::get_text_size("H", FontFace::Simplex, 1.0, 1);

        // top-left dot of the glyph
        assert_eq!(img.get_pixel(11, 20)[0], 255);
        for (x, y, p) in img.enumerate_pixels() {
            if p[0] > 0 {
                assert!(x >= 10 && (x as i32) < 10 + size.width, "x={x}");
                assert!((y as i32) >= 40 - size.height && y < 40, "y={y}");
            }
        }
    }

    #[test]
    fn arrowed_line_draws_a_head() {
        let mut plain = GrayImage::new(60, 60);
        let mut arrow = GrayImage::new(60, 60);
        line(&mut plain, (5, 30), (50, 30), WHITE, 1, LineType::Connected8);
        arrowed_line(&mut arrow, (5, 30), (50, 30), WHITE, 1, LineType::Connected8, 0.2);
        assert!(lit(&arrow) > lit(&plain));
        assert_eq!(arrow.get_pixel(50, 30)[0], 255);
    }
}
