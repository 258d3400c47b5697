//! Pen: round-capped line smoothed through the midpoints of recent samples.

use super::replica::ReplicaSlots;
use super::BrushSettings;
use crate::raster::{CompositeMode, Raster};
use kurbo::{ParamCurve, Point, QuadBez};

#[derive(Debug, Clone)]
pub struct PenBrush {
    pub(super) settings: BrushSettings,
    trails: ReplicaSlots<Vec<Point>>,
}

impl PenBrush {
    pub fn new(settings: BrushSettings) -> Self {
        Self {
            settings,
            trails: ReplicaSlots::default(),
        }
    }

    pub fn line_width(&self) -> f64 {
        self.settings.size * 2.0
    }

    /// Curve flattening resolution.
    pub fn step_size(&self) -> f64 {
        (self.line_width() * 0.25).max(0.5)
    }

    pub fn begin_stroke(&mut self, target: &mut Raster, p: Point, replica: Option<usize>) {
        self.trails.begin(replica, vec![p]);
        target.fill_circle(p, self.settings.size, self.settings.color, 1.0, CompositeMode::SourceOver);
    }

    pub fn stroke_to(&mut self, target: &mut Raster, from: Point, to: Point, replica: Option<usize>) -> usize {
        let step = self.step_size();
        let d = from.distance(to);
        let Some(trail) = self.trails.get_or_begin(replica, || vec![from]) else {
            return self.draw_polyline(target, &[from, to], d, step);
        };
        trail.push(to);
        if trail.len() > 3 {
            trail.remove(0);
        }

        let curve: Vec<Point> = match trail.as_slice() {
            [a, b, c] => {
                let quad = QuadBez::new(a.midpoint(*b), *b, b.midpoint(*c));
                let chord = quad.p0.distance(quad.p2);
                let n = segments(chord.max(d), step);
                (0..=n).map(|i| quad.eval(i as f64 / n as f64)).collect()
            }
            [a, b] => vec![*a, *b],
            _ => vec![from, to],
        };
        self.draw_polyline(target, &curve, d, step)
    }

    pub fn end_stroke(&mut self, replica: Option<usize>) {
        self.trails.end(replica);
    }

    /// Draw `points` as capped segments, subdividing so at least
    /// `ceil(min_len / step)` segments are emitted.
    fn draw_polyline(&self, target: &mut Raster, points: &[Point], min_len: f64, step: f64) -> usize {
        let width = self.line_width();
        let color = self.settings.color;
        if let [a, b] = points {
            let n = segments(a.distance(*b).max(min_len), step);
            for i in 0..n {
                let p0 = a.lerp(*b, i as f64 / n as f64);
                let p1 = a.lerp(*b, (i + 1) as f64 / n as f64);
                target.stroke_line(p0, p1, width, color, 1.0, CompositeMode::SourceOver);
            }
            return n;
        }
        for pair in points.windows(2) {
            target.stroke_line(pair[0], pair[1], width, color, 1.0, CompositeMode::SourceOver);
        }
        points.len().saturating_sub(1)
    }
}

fn segments(len: f64, step: f64) -> usize {
    ((len / step).ceil() as usize).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Rgb;

    fn pen() -> PenBrush {
        PenBrush::new(BrushSettings::new(3.0, Rgb::BLACK))
    }

    #[test]
    fn test_first_segment_is_straight() {
        let mut target = Raster::new(100, 40);
        let mut pen = pen();
        pen.begin_stroke(&mut target, Point::new(10.0, 20.0), None);
        pen.stroke_to(&mut target, Point::new(10.0, 20.0), Point::new(90.0, 20.0), None);
        for x in 10..90 {
            assert!(target.alpha(x, 20) > 0, "gap at x={x}");
        }
    }

    #[test]
    fn test_segment_count_covers_distance() {
        let mut target = Raster::new(200, 200);
        let mut pen = pen();
        let pts = [
            Point::new(10.0, 10.0),
            Point::new(60.0, 15.0),
            Point::new(120.0, 90.0),
            Point::new(121.0, 90.0),
            Point::new(30.0, 180.0),
        ];
        pen.begin_stroke(&mut target, pts[0], None);
        for pair in pts.windows(2) {
            let d = pair[0].distance(pair[1]);
            let count = pen.stroke_to(&mut target, pair[0], pair[1], None);
            assert!(count >= (d / pen.step_size()).ceil() as usize);
        }
    }

    #[test]
    fn test_replicas_keep_separate_trails() {
        let mut target = Raster::new(100, 100);
        let mut pen = pen();
        pen.begin_stroke(&mut target, Point::new(10.0, 10.0), Some(0));
        pen.begin_stroke(&mut target, Point::new(90.0, 90.0), Some(1));
        pen.stroke_to(&mut target, Point::new(10.0, 10.0), Point::new(20.0, 10.0), Some(0));
        pen.end_stroke(Some(0));
        assert_eq!(pen.trails.active(), 1);
        pen.end_stroke(None);
        assert_eq!(pen.trails.active(), 0);
    }
}
