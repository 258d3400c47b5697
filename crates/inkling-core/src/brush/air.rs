//! Airbrush: random translucent dots scattered inside the brush disc.

use super::noise::{next_brush_seed, Noise};
use super::BrushSettings;
use crate::raster::{CompositeMode, Raster};
use kurbo::{Point, Vec2};
use std::f64::consts::TAU;

#[derive(Debug, Clone)]
pub struct AirBrush {
    pub(super) settings: BrushSettings,
    noise: Noise,
}

impl AirBrush {
    pub fn new(settings: BrushSettings) -> Self {
        Self::with_seed(settings, next_brush_seed())
    }

    pub fn with_seed(settings: BrushSettings, seed: u32) -> Self {
        Self {
            settings,
            noise: Noise::new(seed),
        }
    }

    pub fn step_size(&self) -> f64 {
        self.settings.size * 0.5
    }

    /// Dots per spray.
    pub fn density(&self) -> usize {
        ((self.settings.size * 1.2).floor() as usize).max(8)
    }

    pub fn begin_stroke(&mut self, target: &mut Raster, p: Point) {
        self.spray_at(target, p);
    }

    pub fn stroke_to(&mut self, target: &mut Raster, from: Point, to: Point) -> usize {
        let dist = from.distance(to);
        let steps = ((dist / self.step_size()).ceil() as usize).max(1);
        for i in 0..steps {
            self.spray_at(target, from.lerp(to, i as f64 / steps as f64));
        }
        steps
    }

    fn spray_at(&mut self, target: &mut Raster, center: Point) {
        let radius = self.settings.size;
        for _ in 0..self.density() {
            let angle = self.noise.next_f64() * TAU;
            let r = self.noise.next_f64() * radius;
            let dot_radius = self.noise.next_f64() * (radius * 0.08) + 0.4;
            let alpha = 0.12 + self.noise.next_f64() * 0.15;
            let p = center + Vec2::from_angle(angle) * r;
            target.fill_circle(p, dot_radius, self.settings.color, alpha as f32, CompositeMode::SourceOver);
        }
    }
}
