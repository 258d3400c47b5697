//! Rotational symmetry: fans stroke calls out to `N` replicas around a pivot.

use crate::brush::{StrokeSink, MAX_REPLICAS};
use kurbo::{Affine, Point, Size, Vec2};
use std::f64::consts::TAU;

/// Rotate `p` by `angle` radians around `pivot`.
pub fn rotate_point_around(p: Point, pivot: Point, angle: f64) -> Point {
    Affine::rotate_about(angle, pivot) * p
}

/// Rotational symmetry setting. Zero or one axis means no symmetry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Symmetry {
    axes: usize,
}

impl Default for Symmetry {
    fn default() -> Self {
        Self::new(0)
    }
}

impl Symmetry {
    /// Axis counts above the replica limit are capped.
    pub fn new(axes: usize) -> Self {
        Self {
            axes: axes.min(MAX_REPLICAS),
        }
    }

    pub fn axes(&self) -> usize {
        self.axes
    }

    pub fn set_axes(&mut self, axes: usize) {
        *self = Self::new(axes);
    }

    /// True when calls fan out to more than one replica.
    pub fn is_active(&self) -> bool {
        self.axes > 1
    }

    fn angle(&self, i: usize) -> f64 {
        i as f64 * TAU / self.axes as f64
    }

    /// Positions of every replica of `p`, in replica order.
    pub fn replicas(&self, p: Point, pivot: Point) -> Vec<Point> {
        if !self.is_active() {
            return vec![p];
        }
        (0..self.axes)
            .map(|i| rotate_point_around(p, pivot, self.angle(i)))
            .collect()
    }

    /// Begin a stroke and leave a dot at `p` in every replica.
    pub fn begin_and_dot(&self, sink: &mut impl StrokeSink, p: Point, pivot: Point) {
        if !self.is_active() {
            sink.begin_stroke(p, None);
            sink.stroke_to(p, p, None);
            return;
        }
        for (i, q) in self.replicas(p, pivot).into_iter().enumerate() {
            sink.begin_stroke(q, Some(i));
            sink.stroke_to(q, q, Some(i));
        }
    }

    /// Extend every replica. Returns the total number of marks drawn.
    pub fn stroke(&self, sink: &mut impl StrokeSink, from: Point, to: Point, pivot: Point) -> usize {
        if !self.is_active() {
            return sink.stroke_to(from, to, None);
        }
        (0..self.axes)
            .map(|i| {
                let angle = self.angle(i);
                sink.stroke_to(
                    rotate_point_around(from, pivot, angle),
                    rotate_point_around(to, pivot, angle),
                    Some(i),
                )
            })
            .sum()
    }

    pub fn end_stroke(&self, sink: &mut impl StrokeSink) {
        if !self.is_active() {
            sink.end_stroke(None);
            return;
        }
        for i in 0..self.axes {
            sink.end_stroke(Some(i));
        }
    }

    /// Guide rays from the center of `content`, long enough to leave it.
    pub fn guide_rays(&self, content: Size) -> Vec<(Point, Point)> {
        if !self.is_active() {
            return Vec::new();
        }
        let center = Point::new(content.width / 2.0, content.height / 2.0);
        let len = content.width.hypot(content.height) / 2.0 + 2.0;
        (0..self.axes)
            .map(|i| (center, center + Vec2::from_angle(self.angle(i)) * len))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Probe {
        begins: Vec<(Point, Option<usize>)>,
        strokes: Vec<(Point, Point, Option<usize>)>,
        ends: Vec<Option<usize>>,
    }

    impl StrokeSink for Probe {
        fn begin_stroke(&mut self, p: Point, replica: Option<usize>) {
            self.begins.push((p, replica));
        }

        fn stroke_to(&mut self, from: Point, to: Point, replica: Option<usize>) -> usize {
            self.strokes.push((from, to, replica));
            1
        }

        fn end_stroke(&mut self, replica: Option<usize>) {
            self.ends.push(replica);
        }
    }

    fn close(a: Point, b: Point) -> bool {
        a.distance(b) < 1e-9
    }

    #[test]
    fn test_rotate_quarter_turn() {
        let p = rotate_point_around(Point::new(2.0, 1.0), Point::new(1.0, 1.0), TAU / 4.0);
        assert!(close(p, Point::new(1.0, 2.0)));
    }

    #[test]
    fn test_four_axes_fan_out() {
        let pivot = Point::new(400.0, 300.0);
        let mut probe = Probe::default();
        Symmetry::new(4).begin_and_dot(&mut probe, Point::new(450.0, 300.0), pivot);

        assert_eq!(probe.begins.len(), 4);
        let expected = [
            Point::new(450.0, 300.0),
            Point::new(400.0, 350.0),
            Point::new(350.0, 300.0),
            Point::new(400.0, 250.0),
        ];
        for (i, ((p, replica), want)) in probe.begins.iter().zip(expected).enumerate() {
            assert_eq!(*replica, Some(i));
            assert!(close(*p, want), "replica {i} at {p:?}");
            assert!((p.distance(pivot) - 50.0).abs() < 1e-9);
        }
        assert_eq!(probe.strokes.len(), 4);
    }

    #[test]
    fn test_single_axis_passes_through() {
        for axes in [0, 1] {
            let mut probe = Probe::default();
            let sym = Symmetry::new(axes);
            let p = Point::new(5.0, 6.0);
            sym.begin_and_dot(&mut probe, p, Point::new(100.0, 100.0));
            sym.stroke(&mut probe, p, Point::new(7.0, 8.0), Point::new(100.0, 100.0));
            sym.end_stroke(&mut probe);
            assert_eq!(probe.begins, vec![(p, None)]);
            assert_eq!(probe.strokes.len(), 2);
            assert_eq!(probe.strokes[1], (p, Point::new(7.0, 8.0), None));
            assert_eq!(probe.ends, vec![None]);
        }
    }

    #[test]
    fn test_replica_ids_stable_across_stroke() {
        let pivot = Point::new(0.0, 0.0);
        let sym = Symmetry::new(3);
        let mut probe = Probe::default();
        sym.begin_and_dot(&mut probe, Point::new(10.0, 0.0), pivot);
        sym.stroke(&mut probe, Point::new(10.0, 0.0), Point::new(20.0, 0.0), pivot);
        sym.end_stroke(&mut probe);

        // The stroke segment of replica i starts where replica i began.
        let begins: Vec<_> = probe.begins.iter().map(|(p, _)| *p).collect();
        let segments: Vec<_> = probe.strokes[3..].to_vec();
        for (i, (from, _, replica)) in segments.iter().enumerate() {
            assert_eq!(*replica, Some(i));
            assert!(close(*from, begins[i]));
        }
        assert_eq!(probe.ends, vec![Some(0), Some(1), Some(2)]);
    }

    #[test]
    fn test_axes_capped() {
        assert_eq!(Symmetry::new(500).axes(), MAX_REPLICAS);
    }

    #[test]
    fn test_guide_rays_leave_content() {
        let rays = Symmetry::new(6).guide_rays(Size::new(800.0, 600.0));
        assert_eq!(rays.len(), 6);
        for (start, end) in rays {
            assert!(close(start, Point::new(400.0, 300.0)));
            assert!((start.distance(end) - 502.0).abs() < 1e-9);
        }
        assert!(Symmetry::new(1).guide_rays(Size::new(10.0, 10.0)).is_empty());
    }
}
