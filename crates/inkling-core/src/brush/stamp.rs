//! Pre-rendered stamp bitmaps, rebuilt only when size or color change.

use super::noise::Noise;
use crate::color::Rgb;
use crate::raster::Raster;

/// Soft brush falloff: `(offset, alpha)` stops from center to rim.
const SOFT_STOPS: [(f64, f64); 4] = [(0.0, 1.0), (0.25, 0.65), (0.6, 0.25), (1.0, 0.0)];

const PENCIL_INTENSITY: f64 = 0.36;
const PENCIL_EDGE_SOFTNESS: f64 = 0.2;
const PENCIL_MIN_ALPHA: f64 = 0.02;

/// A stamp bitmap plus the `(size, color)` it was built for.
#[derive(Debug, Clone, Default)]
pub struct StampCache {
    key: Option<(u64, Rgb)>,
    stamp: Option<Raster>,
}

impl StampCache {
    /// Return the cached stamp, rebuilding it when `size` or `color` changed.
    pub fn get_or_build(&mut self, size: f64, color: Rgb, build: impl FnOnce(f64, Rgb) -> Raster) -> &Raster {
        let key = (size.to_bits(), color);
        if self.key != Some(key) || self.stamp.is_none() {
            self.key = Some(key);
            self.stamp = Some(build(size, color));
        }
        self.stamp.get_or_insert_with(|| Raster::new(1, 1))
    }
}

/// Alpha of the soft gradient at normalized distance `t` from center.
pub fn soft_falloff(t: f64) -> f64 {
    if t >= 1.0 {
        return 0.0;
    }
    let t = t.max(0.0);
    for pair in SOFT_STOPS.windows(2) {
        let (o0, a0) = pair[0];
        let (o1, a1) = pair[1];
        if t <= o1 {
            return a0 + (a1 - a0) * (t - o0) / (o1 - o0);
        }
    }
    0.0
}

/// Radial gradient disc of radius `size` on a `2·size` square.
pub fn build_soft_stamp(size: f64, color: Rgb) -> Raster {
    let side = (size * 2.0).ceil().max(1.0) as u32;
    let center = side as f64 / 2.0;
    let mut data = vec![0u8; side as usize * side as usize * 4];
    for y in 0..side {
        for x in 0..side {
            let d = (x as f64 + 0.5 - center).hypot(y as f64 + 0.5 - center);
            let a = soft_falloff(d / size);
            if a <= 0.0 {
                continue;
            }
            let i = (y as usize * side as usize + x as usize) * 4;
            data[i..i + 4].copy_from_slice(&premultiplied(color, a));
        }
    }
    Raster::from_premultiplied(side, side, data).unwrap_or_else(|_| Raster::new(side, side))
}

/// Noise-textured disc with a sharp edge, padded so soft edges never clip.
pub fn build_pencil_stamp(size: f64, color: Rgb, noise: &mut Noise) -> Raster {
    let side = (size * 2.0 + (size * 0.6).max(4.0)).ceil().max(1.0) as u32;
    let center = side as f64 / 2.0;
    let diameter = (size * 2.0) as i64;
    let mut data = vec![0u8; side as usize * side as usize * 4];
    for y in 0..diameter {
        let dy = y as f64 - size;
        let py = (center + dy).floor();
        for x in 0..diameter {
            let dx = x as f64 - size;
            let px = (center + dx).floor();
            let distance = dx.hypot(dy);
            if distance > size || px < 0.0 || py < 0.0 || px >= side as f64 || py >= side as f64 {
                continue;
            }
            let falloff = (1.0 - distance / size).max(0.0);
            let edge = (falloff / PENCIL_EDGE_SOFTNESS).min(1.0);
            let alpha = noise.next_f64() * PENCIL_INTENSITY * edge;
            if alpha > PENCIL_MIN_ALPHA {
                let i = (py as usize * side as usize + px as usize) * 4;
                data[i..i + 4].copy_from_slice(&premultiplied(color, alpha));
            }
        }
    }
    Raster::from_premultiplied(side, side, data).unwrap_or_else(|_| Raster::new(side, side))
}

fn premultiplied(color: Rgb, alpha: f64) -> [u8; 4] {
    let a = alpha.clamp(0.0, 1.0);
    let ch = |c: u8| (c as f64 * a).round() as u8;
    [ch(color.r), ch(color.g), ch(color.b), (a * 255.0).round() as u8]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_soft_falloff_stops() {
        assert!((soft_falloff(0.0) - 1.0).abs() < 1e-12);
        assert!((soft_falloff(0.25) - 0.65).abs() < 1e-12);
        assert!((soft_falloff(0.6) - 0.25).abs() < 1e-12);
        assert_eq!(soft_falloff(1.0), 0.0);
        assert_eq!(soft_falloff(3.0), 0.0);
        assert!(soft_falloff(0.1) < 1.0 && soft_falloff(0.1) > 0.65);
    }

    #[test]
    fn test_soft_stamp_dimensions_and_center() {
        let stamp = build_soft_stamp(10.0, Rgb::BLACK);
        assert_eq!((stamp.width(), stamp.height()), (20, 20));
        assert!(stamp.alpha(10, 10) > 200);
        assert_eq!(stamp.alpha(0, 0), 0);
    }

    #[test]
    fn test_pencil_stamp_padding_and_cutoff() {
        let mut noise = Noise::new(3);
        let stamp = build_pencil_stamp(10.0, Rgb::BLACK, &mut noise);
        assert_eq!(stamp.width(), 26);
        assert_eq!(stamp.alpha(0, 0), 0);
        // Every painted pixel is above the cutoff and below the intensity cap.
        for px in stamp.data().chunks_exact(4) {
            assert!(px[3] == 0 || (px[3] >= 5 && px[3] <= 92));
        }
        assert!(!stamp.is_blank());
    }

    #[test]
    fn test_cache_rebuilds_only_on_change() {
        let mut cache = StampCache::default();
        let mut builds = 0;
        let mut build = |size: f64, color: Rgb| {
            builds += 1;
            build_soft_stamp(size, color)
        };
        cache.get_or_build(4.0, Rgb::BLACK, &mut build);
        cache.get_or_build(4.0, Rgb::BLACK, &mut build);
        cache.get_or_build(5.0, Rgb::BLACK, &mut build);
        cache.get_or_build(5.0, Rgb::WHITE, &mut build);
        assert_eq!(builds, 3);
    }
}
