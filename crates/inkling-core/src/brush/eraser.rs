//! Eraser: soft brush geometry that removes alpha instead of adding color.

use super::soft::SoftBrush;
use super::BrushSettings;
use crate::color::Rgb;
use crate::raster::{CompositeMode, Raster};
use kurbo::Point;

#[derive(Debug, Clone)]
pub struct EraserBrush {
    soft: SoftBrush,
}

impl EraserBrush {
    pub fn new(size: f64) -> Self {
        Self {
            soft: SoftBrush::new(BrushSettings::new(size, Rgb::BLACK)),
        }
    }

    pub fn settings(&self) -> BrushSettings {
        self.soft.settings
    }

    pub fn set_size(&mut self, size: f64) {
        self.soft.settings.size = size;
    }

    pub fn step_size(&self) -> f64 {
        self.soft.step_size()
    }

    pub fn begin_stroke(&mut self, target: &mut Raster, p: Point) {
        self.soft.stamp_at(target, p, CompositeMode::DestinationOut);
    }

    pub fn stroke_to(&mut self, target: &mut Raster, from: Point, to: Point) -> usize {
        self.soft.stamp_segment(target, from, to, CompositeMode::DestinationOut)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_erases_existing_ink() {
        let mut target = Raster::filled(60, 60, Rgb::new(200, 0, 0));
        let mut eraser = EraserBrush::new(10.0);
        eraser.begin_stroke(&mut target, Point::new(10.0, 30.0));
        eraser.stroke_to(&mut target, Point::new(10.0, 30.0), Point::new(50.0, 30.0));
        assert!(target.alpha(30, 30) < 40);
        assert_eq!(target.alpha(30, 5), 255);
    }

    #[test]
    fn test_never_adds_ink() {
        let mut target = Raster::new(40, 40);
        let mut eraser = EraserBrush::new(6.0);
        eraser.begin_stroke(&mut target, Point::new(20.0, 20.0));
        eraser.stroke_to(&mut target, Point::new(20.0, 20.0), Point::new(30.0, 20.0));
        assert!(target.is_blank());
    }
}
