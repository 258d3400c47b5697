//! Soft round brush: a cached radial-gradient stamp repeated along the path.

use super::stamp::{build_soft_stamp, StampCache};
use super::BrushSettings;
use crate::raster::{CompositeMode, Raster};
use kurbo::Point;

/// Stamp spacing as a fraction of the radius.
const SPACING_FACTOR: f64 = 0.25;
const MIN_SPACING: f64 = 0.35;

#[derive(Debug, Clone)]
pub struct SoftBrush {
    pub(super) settings: BrushSettings,
    stamps: StampCache,
}

impl SoftBrush {
    pub fn new(settings: BrushSettings) -> Self {
        Self {
            settings,
            stamps: StampCache::default(),
        }
    }

    pub fn step_size(&self) -> f64 {
        (self.settings.size * SPACING_FACTOR).max(MIN_SPACING)
    }

    pub fn begin_stroke(&mut self, target: &mut Raster, p: Point) {
        self.stamp_at(target, p, CompositeMode::SourceOver);
    }

    pub fn stroke_to(&mut self, target: &mut Raster, from: Point, to: Point) -> usize {
        self.stamp_segment(target, from, to, CompositeMode::SourceOver)
    }

    pub(super) fn stamp_at(&mut self, target: &mut Raster, p: Point, mode: CompositeMode) {
        let stamp = self
            .stamps
            .get_or_build(self.settings.size, self.settings.color, build_soft_stamp);
        target.draw_raster_centered(stamp, p, 1.0, mode);
    }

    /// Stamp at every `step_size` along the segment, starting at `from`.
    pub(super) fn stamp_segment(&mut self, target: &mut Raster, from: Point, to: Point, mode: CompositeMode) -> usize {
        let dist = from.distance(to);
        let step = self.step_size();
        let count = (dist / step).floor() as usize + 1;
        let stamp = self
            .stamps
            .get_or_build(self.settings.size, self.settings.color, build_soft_stamp);
        for i in 0..count {
            let t = if dist > 0.0 { i as f64 * step / dist } else { 0.0 };
            target.draw_raster_centered(stamp, from.lerp(to, t), 1.0, mode);
        }
        count
    }
}
