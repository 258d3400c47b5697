//! Pencil: a grainy noise stamp laid down with dense overlap.

use super::noise::{next_brush_seed, Noise};
use super::stamp::{build_pencil_stamp, StampCache};
use super::BrushSettings;
use crate::raster::{CompositeMode, Raster};
use kurbo::Point;

#[derive(Debug, Clone)]
pub struct PencilBrush {
    pub(super) settings: BrushSettings,
    stamps: StampCache,
    noise: Noise,
}

impl PencilBrush {
    pub fn new(settings: BrushSettings) -> Self {
        Self::with_seed(settings, next_brush_seed())
    }

    pub fn with_seed(settings: BrushSettings, seed: u32) -> Self {
        Self {
            settings,
            stamps: StampCache::default(),
            noise: Noise::new(seed),
        }
    }

    pub fn step_size(&self) -> f64 {
        self.settings.size * 0.4
    }

    pub fn begin_stroke(&mut self, target: &mut Raster, p: Point) {
        let stamp = self.stamp();
        target.draw_raster_centered(stamp, p, 1.0, CompositeMode::SourceOver);
    }

    pub fn stroke_to(&mut self, target: &mut Raster, from: Point, to: Point) -> usize {
        let dist = from.distance(to);
        let step = self.step_size();
        let count = (dist / step).floor() as usize + 1;
        let stamp = self.stamp();
        for i in 0..count {
            let t = if dist > 0.0 { i as f64 * step / dist } else { 0.0 };
            target.draw_raster_centered(stamp, from.lerp(to, t), 1.0, CompositeMode::SourceOver);
        }
        count
    }

    fn stamp(&mut self) -> &Raster {
        let noise = &mut self.noise;
        self.stamps
            .get_or_build(self.settings.size, self.settings.color, |size, color| {
                build_pencil_stamp(size, color, noise)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Rgb;

    #[test]
    fn test_stroke_leaves_texture() {
        let mut target = Raster::new(120, 60);
        let mut pencil = PencilBrush::with_seed(BrushSettings::new(6.0, Rgb::BLACK), 5);
        pencil.begin_stroke(&mut target, Point::new(10.0, 30.0));
        pencil.stroke_to(&mut target, Point::new(10.0, 30.0), Point::new(110.0, 30.0));
        let painted = (10..110).filter(|&x| target.alpha(x, 30) > 0).count();
        assert!(painted > 90);
        assert_eq!(target.alpha(60, 5), 0);
    }

    #[test]
    fn test_stamp_count_covers_distance() {
        let mut target = Raster::new(100, 100);
        let mut pencil = PencilBrush::with_seed(BrushSettings::new(5.0, Rgb::BLACK), 1);
        let from = Point::new(5.0, 5.0);
        let to = Point::new(95.0, 33.0);
        let count = pencil.stroke_to(&mut target, from, to);
        assert!(count >= (from.distance(to) / pencil.step_size()).ceil() as usize);
    }

    #[test]
    fn test_stamp_rebuilt_on_color_change() {
        let mut pencil = PencilBrush::with_seed(BrushSettings::new(4.0, Rgb::BLACK), 1);
        let first = pencil.stamp().clone();
        pencil.settings.color = Rgb::new(255, 0, 0);
        let second = pencil.stamp().clone();
        assert_ne!(first, second);
    }
}
