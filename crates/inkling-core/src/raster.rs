//! Premultiplied RGBA raster and the drawing primitives brushes paint with.
//!
//! Pixels are stored row-major, four bytes per pixel, with color channels
//! premultiplied by alpha. Alpha means "ink present"; the canvas background
//! is composited at render time and is not part of the raster.

use crate::color::Rgb;
use kurbo::{Affine, Point, Rect, Size};
use thiserror::Error;

/// Raster access errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RasterError {
    #[error("Raster is {expected_width}x{expected_height}, buffer is {width}x{height}")]
    DimensionMismatch {
        expected_width: u32,
        expected_height: u32,
        width: u32,
        height: u32,
    },
    #[error("Pixel buffer has {got} bytes, expected {expected}")]
    BufferLength { expected: usize, got: usize },
    #[error("Raster cannot be read back: {0}")]
    Unreadable(String),
}

/// How a draw call combines with existing pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompositeMode {
    /// Paint over existing content.
    #[default]
    SourceOver,
    /// Remove destination alpha in proportion to source alpha.
    DestinationOut,
}

/// A fixed-size premultiplied RGBA8 pixel buffer.
#[derive(Clone, PartialEq, Eq)]
pub struct Raster {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl std::fmt::Debug for Raster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Raster")
            .field("width", &self.width)
            .field("height", &self.height)
            .finish_non_exhaustive()
    }
}

impl Raster {
    /// Create a fully transparent raster.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0; width as usize * height as usize * 4],
        }
    }

    /// Create an opaque raster filled with `color`.
    pub fn filled(width: u32, height: u32, color: Rgb) -> Self {
        let mut raster = Self::new(width, height);
        raster.fill(color);
        raster
    }

    /// Wrap an existing premultiplied buffer.
    pub fn from_premultiplied(width: u32, height: u32, data: Vec<u8>) -> Result<Self, RasterError> {
        let expected = width as usize * height as usize * 4;
        if data.len() != expected {
            return Err(RasterError::BufferLength {
                expected,
                got: data.len(),
            });
        }
        Ok(Self { width, height, data })
    }

    /// Build from straight (non-premultiplied) RGBA bytes.
    pub fn from_straight_rgba(width: u32, height: u32, mut data: Vec<u8>) -> Result<Self, RasterError> {
        for px in data.chunks_exact_mut(4) {
            let a = px[3] as u32;
            for c in &mut px[..3] {
                *c = ((*c as u32 * a + 127) / 255) as u8;
            }
        }
        Self::from_premultiplied(width, height, data)
    }

    /// Straight (non-premultiplied) RGBA copy of the pixels.
    pub fn to_straight_rgba(&self) -> Vec<u8> {
        let mut out = self.data.clone();
        for px in out.chunks_exact_mut(4) {
            let a = px[3] as u32;
            if a == 0 {
                px[..3].fill(0);
            } else if a < 255 {
                for c in &mut px[..3] {
                    *c = ((*c as u32 * 255 + a / 2) / a).min(255) as u8;
                }
            }
        }
        out
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn size(&self) -> Size {
        Size::new(self.width as f64, self.height as f64)
    }

    /// Center of the raster in pixel coordinates.
    pub fn center(&self) -> Point {
        Point::new(self.width as f64 / 2.0, self.height as f64 / 2.0)
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Replace every pixel with the given premultiplied bytes.
    pub fn copy_from(&mut self, data: &[u8]) -> Result<(), RasterError> {
        if data.len() != self.data.len() {
            return Err(RasterError::BufferLength {
                expected: self.data.len(),
                got: data.len(),
            });
        }
        self.data.copy_from_slice(data);
        Ok(())
    }

    /// Premultiplied RGBA at `(x, y)`, or `None` outside the raster.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = self.index(x, y);
        Some([self.data[i], self.data[i + 1], self.data[i + 2], self.data[i + 3]])
    }

    /// Alpha at `(x, y)`; zero outside the raster.
    pub fn alpha(&self, x: u32, y: u32) -> u8 {
        self.pixel(x, y).map_or(0, |px| px[3])
    }

    /// True when no pixel carries any alpha.
    pub fn is_blank(&self) -> bool {
        self.data.chunks_exact(4).all(|px| px[3] == 0)
    }

    /// Reset to fully transparent.
    pub fn clear(&mut self) {
        self.data.fill(0);
    }

    /// Fill every pixel with an opaque color.
    pub fn fill(&mut self, color: Rgb) {
        for px in self.data.chunks_exact_mut(4) {
            px.copy_from_slice(&[color.r, color.g, color.b, 255]);
        }
    }

    /// Fill the pixels whose centers fall inside `rect`.
    pub fn fill_rect(&mut self, rect: Rect, color: Rgb, alpha: f32) {
        let Some((x0, y0, x1, y1)) = self.clip_centers(rect) else {
            return;
        };
        let src = premultiply(color, alpha);
        for y in y0..y1 {
            for x in x0..x1 {
                let i = self.index(x, y);
                blend(&mut self.data[i..i + 4], src, CompositeMode::SourceOver);
            }
        }
    }

    /// Anti-aliased filled disc. Non-positive or non-finite radii are ignored.
    pub fn fill_circle(&mut self, center: Point, radius: f64, color: Rgb, alpha: f32, mode: CompositeMode) {
        if !(radius > 0.0) || !center.x.is_finite() || !center.y.is_finite() {
            return;
        }
        let bounds = Rect::new(
            center.x - radius - 1.0,
            center.y - radius - 1.0,
            center.x + radius + 1.0,
            center.y + radius + 1.0,
        );
        // Sub-pixel discs keep their area instead of vanishing.
        let area_scale = if radius < 0.5 { (radius * 2.0) as f32 } else { 1.0 };
        let r = radius.max(0.5);
        self.cover(bounds, color, alpha, mode, |p| {
            (r + 0.5 - p.distance(center)).clamp(0.0, 1.0) as f32 * area_scale
        });
    }

    /// Anti-aliased line with round caps, `width` pixels wide.
    pub fn stroke_line(&mut self, from: Point, to: Point, width: f64, color: Rgb, alpha: f32, mode: CompositeMode) {
        if !(width > 0.0) || !finite(from) || !finite(to) {
            return;
        }
        let half = width / 2.0;
        let bounds = Rect::from_points(from, to).inflate(half + 1.0, half + 1.0);
        let area_scale = if half < 0.5 { (half * 2.0) as f32 } else { 1.0 };
        let h = half.max(0.5);
        self.cover(bounds, color, alpha, mode, |p| {
            (h + 0.5 - distance_to_segment(p, from, to)).clamp(0.0, 1.0) as f32 * area_scale
        });
    }

    /// Anti-aliased circle outline.
    pub fn stroke_circle(&mut self, center: Point, radius: f64, width: f64, color: Rgb, alpha: f32) {
        if !(radius > 0.0) || !(width > 0.0) || !finite(center) {
            return;
        }
        let half = width / 2.0;
        let reach = radius + half + 1.0;
        let bounds = Rect::new(center.x - reach, center.y - reach, center.x + reach, center.y + reach);
        let area_scale = if half < 0.5 { (half * 2.0) as f32 } else { 1.0 };
        let h = half.max(0.5);
        self.cover(bounds, color, alpha, CompositeMode::SourceOver, |p| {
            (h + 0.5 - (p.distance(center) - radius).abs()).clamp(0.0, 1.0) as f32 * area_scale
        });
    }

    /// Blit `src` with its top-left corner at `(dx, dy)`.
    pub fn draw_raster(&mut self, src: &Raster, dx: i64, dy: i64, alpha: f32, mode: CompositeMode) {
        let alpha = alpha.clamp(0.0, 1.0);
        if alpha == 0.0 {
            return;
        }
        let x_start = dx.max(0);
        let y_start = dy.max(0);
        let x_end = (dx + src.width as i64).min(self.width as i64);
        let y_end = (dy + src.height as i64).min(self.height as i64);
        if x_start >= x_end || y_start >= y_end {
            return;
        }

        for y in y_start..y_end {
            for x in x_start..x_end {
                let si = src.index((x - dx) as u32, (y - dy) as u32);
                let s = &src.data[si..si + 4];
                if s[3] == 0 {
                    continue;
                }
                let px = [
                    s[0] as f32 * alpha,
                    s[1] as f32 * alpha,
                    s[2] as f32 * alpha,
                    s[3] as f32 * alpha,
                ];
                let di = self.index(x as u32, y as u32);
                blend(&mut self.data[di..di + 4], px, mode);
            }
        }
    }

    /// Blit `src` centered on `center`, rounding to the nearest pixel.
    pub fn draw_raster_centered(&mut self, src: &Raster, center: Point, alpha: f32, mode: CompositeMode) {
        if !finite(center) {
            return;
        }
        let dx = (center.x - src.width as f64 / 2.0).round() as i64;
        let dy = (center.y - src.height as f64 / 2.0).round() as i64;
        self.draw_raster(src, dx, dy, alpha, mode);
    }

    /// Paint `src` through an affine transform with bilinear sampling.
    pub fn draw_raster_transformed(&mut self, src: &Raster, transform: Affine) {
        let det = transform.determinant();
        if det.abs() < f64::EPSILON || src.width == 0 || src.height == 0 {
            return;
        }
        let bounds = transform.transform_rect_bbox(Rect::from_origin_size(Point::ZERO, src.size()));
        let Some((x0, y0, x1, y1)) = self.clip_centers(bounds.inflate(1.0, 1.0)) else {
            return;
        };
        let inverse = transform.inverse();
        for y in y0..y1 {
            for x in x0..x1 {
                let p = inverse * Point::new(x as f64 + 0.5, y as f64 + 0.5);
                let sample = src.sample_bilinear(p);
                if sample[3] <= 0.0 {
                    continue;
                }
                let di = self.index(x, y);
                blend(&mut self.data[di..di + 4], sample, CompositeMode::SourceOver);
            }
        }
    }

    fn sample_bilinear(&self, p: Point) -> [f32; 4] {
        let fx = p.x - 0.5;
        let fy = p.y - 0.5;
        if fx < -1.0 || fy < -1.0 || fx > self.width as f64 || fy > self.height as f64 {
            return [0.0; 4];
        }
        let x0 = fx.floor();
        let y0 = fy.floor();
        let tx = (fx - x0) as f32;
        let ty = (fy - y0) as f32;
        let (x0, y0) = (x0 as i64, y0 as i64);

        let mut out = [0.0f32; 4];
        for (ox, oy, w) in [
            (0, 0, (1.0 - tx) * (1.0 - ty)),
            (1, 0, tx * (1.0 - ty)),
            (0, 1, (1.0 - tx) * ty),
            (1, 1, tx * ty),
        ] {
            let sx = x0 + ox;
            let sy = y0 + oy;
            if w == 0.0 || sx < 0 || sy < 0 || sx >= self.width as i64 || sy >= self.height as i64 {
                continue;
            }
            let i = self.index(sx as u32, sy as u32);
            for c in 0..4 {
                out[c] += self.data[i + c] as f32 * w;
            }
        }
        out
    }

    /// Shared coverage loop: `coverage` maps a pixel center to `[0, 1]`.
    fn cover(
        &mut self,
        bounds: Rect,
        color: Rgb,
        alpha: f32,
        mode: CompositeMode,
        coverage: impl Fn(Point) -> f32,
    ) {
        let alpha = alpha.clamp(0.0, 1.0);
        if alpha == 0.0 {
            return;
        }
        let Some((x0, y0, x1, y1)) = self.clip_centers(bounds) else {
            return;
        };
        for y in y0..y1 {
            for x in x0..x1 {
                let c = coverage(Point::new(x as f64 + 0.5, y as f64 + 0.5));
                if c <= 0.0 {
                    continue;
                }
                let src = premultiply(color, alpha * c);
                let i = self.index(x, y);
                blend(&mut self.data[i..i + 4], src, mode);
            }
        }
    }

    /// Pixel index range whose centers lie inside `rect`, clipped to the raster.
    fn clip_centers(&self, rect: Rect) -> Option<(u32, u32, u32, u32)> {
        if !rect.x0.is_finite() || !rect.y0.is_finite() || !rect.x1.is_finite() || !rect.y1.is_finite() {
            return None;
        }
        let x0 = (rect.x0 - 0.5).ceil().max(0.0);
        let y0 = (rect.y0 - 0.5).ceil().max(0.0);
        let x1 = ((rect.x1 - 0.5).floor() + 1.0).min(self.width as f64);
        let y1 = ((rect.y1 - 0.5).floor() + 1.0).min(self.height as f64);
        if x0 >= x1 || y0 >= y1 {
            return None;
        }
        Some((x0 as u32, y0 as u32, x1 as u32, y1 as u32))
    }

    #[inline]
    fn index(&self, x: u32, y: u32) -> usize {
        (y as usize * self.width as usize + x as usize) * 4
    }
}

/// Turn every opaque pixel that exactly matches `background` transparent.
///
/// Anti-aliased edge pixels that happen to equal the background color are
/// removed as well.
pub fn unbake_background(mut raster: Raster, background: Rgb) -> Raster {
    for px in raster.data.chunks_exact_mut(4) {
        if px[3] == 255 && px[0] == background.r && px[1] == background.g && px[2] == background.b {
            px.fill(0);
        }
    }
    raster
}

/// Composite `content` over an opaque `background`.
pub fn flatten(content: &Raster, background: Rgb) -> Raster {
    let mut out = Raster::filled(content.width, content.height, background);
    out.draw_raster(content, 0, 0, 1.0, CompositeMode::SourceOver);
    out
}

fn premultiply(color: Rgb, alpha: f32) -> [f32; 4] {
    let a = alpha.clamp(0.0, 1.0);
    [
        color.r as f32 * a,
        color.g as f32 * a,
        color.b as f32 * a,
        255.0 * a,
    ]
}

#[inline]
fn blend(dst: &mut [u8], src: [f32; 4], mode: CompositeMode) {
    let keep = 1.0 - src[3] / 255.0;
    match mode {
        CompositeMode::SourceOver => {
            for c in 0..4 {
                dst[c] = (src[c] + dst[c] as f32 * keep).round().clamp(0.0, 255.0) as u8;
            }
        }
        CompositeMode::DestinationOut => {
            for c in dst.iter_mut().take(4) {
                *c = (*c as f32 * keep).round().clamp(0.0, 255.0) as u8;
            }
        }
    }
}

fn finite(p: Point) -> bool {
    p.x.is_finite() && p.y.is_finite()
}

/// Distance from `p` to the segment `a..b`.
pub fn distance_to_segment(p: Point, a: Point, b: Point) -> f64 {
    let ab = b - a;
    let len_sq = ab.hypot2();
    if len_sq < f64::EPSILON {
        return p.distance(a);
    }
    let t = ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    p.distance(a + ab * t)
}
