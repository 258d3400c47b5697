//! Fountain pen: speed-sensitive ink width along a midpoint-smoothed path.
//!
//! Slow strokes run towards the maximum radius, fast strokes towards the
//! minimum. The target radius is eased and then smoothed exponentially so
//! the width never jumps between samples. Each symmetry replica keeps its
//! own timing and point history.

use super::replica::ReplicaSlots;
use super::BrushSettings;
use crate::clock::Clock;
use crate::raster::{CompositeMode, Raster};
use kurbo::{ParamCurve, Point, QuadBez};
use std::rc::Rc;

const SLOW_SPEED: f64 = 0.1;
const FAST_SPEED: f64 = 2.0;
const SMOOTHING: f64 = 0.7;
const SAMPLE_RESOLUTION: f64 = 0.35;
const MIN_STEP: f64 = 0.25;
const INK_ALPHA: f32 = 0.85;

#[derive(Debug, Clone, Copy, PartialEq)]
struct InkPoint {
    p: Point,
    r: f64,
}

#[derive(Debug, Clone)]
struct InkState {
    last_time: f64,
    radius: f64,
    points: Vec<InkPoint>,
}

#[derive(Debug, Clone)]
pub struct FountainPen {
    pub(super) settings: BrushSettings,
    clock: Rc<dyn Clock>,
    states: ReplicaSlots<InkState>,
}

impl FountainPen {
    pub fn new(settings: BrushSettings, clock: Rc<dyn Clock>) -> Self {
        Self {
            settings,
            clock,
            states: ReplicaSlots::default(),
        }
    }

    pub fn min_radius(&self) -> f64 {
        self.settings.size * 0.2
    }

    pub fn max_radius(&self) -> f64 {
        self.settings.size * 0.8
    }

    /// Largest circle spacing the pen can use at its current size.
    pub fn max_step(&self) -> f64 {
        (self.max_radius() * SAMPLE_RESOLUTION).max(MIN_STEP)
    }

    /// Map pointer speed (px/ms) to a target radius.
    pub fn radius_for_speed(&self, speed: f64) -> f64 {
        speed_to_radius(speed, self.min_radius(), self.max_radius())
    }

    pub fn begin_stroke(&mut self, target: &mut Raster, p: Point, replica: Option<usize>) {
        let r = self.min_radius();
        let state = InkState {
            last_time: self.clock.now_ms(),
            radius: r,
            points: vec![InkPoint { p, r }],
        };
        self.states.begin(replica, state);
        self.draw_circle(target, p, r);
    }

    pub fn stroke_to(&mut self, target: &mut Raster, from: Point, to: Point, replica: Option<usize>) -> usize {
        let now = self.clock.now_ms();
        let (min_r, max_r) = (self.min_radius(), self.max_radius());
        let dist = from.distance(to);

        let Some(state) = self.states.get_or_begin(replica, || InkState {
            last_time: now,
            radius: min_r,
            points: vec![InkPoint { p: from, r: min_r }],
        }) else {
            return 0;
        };
        let speed = dist / (now - state.last_time).max(1.0);
        state.radius = lerp(state.radius, speed_to_radius(speed, min_r, max_r), 1.0 - SMOOTHING);
        state.points.push(InkPoint { p: to, r: state.radius });
        if state.points.len() > 3 {
            state.points.remove(0);
        }
        state.last_time = now;

        let samples = match state.points.as_slice() {
            [a, b] => line_samples(*a, *b, dist),
            [a, b, c] => curve_samples(*a, *b, *c, dist),
            _ => Vec::new(),
        };
        for s in &samples {
            self.draw_circle(target, s.p, s.r);
        }
        samples.len()
    }

    /// Smoothed radius of a replica's stroke in progress.
    pub fn current_radius(&self, replica: Option<usize>) -> Option<f64> {
        self.states.get(replica).map(|state| state.radius)
    }

    pub fn end_stroke(&mut self, replica: Option<usize>) {
        self.states.end(replica);
    }

    fn draw_circle(&self, target: &mut Raster, p: Point, r: f64) {
        target.fill_circle(p, r, self.settings.color, INK_ALPHA, CompositeMode::SourceOver);
    }
}

/// Faster strokes are thinner.
fn speed_to_radius(speed: f64, min_r: f64, max_r: f64) -> f64 {
    let clamped = speed.clamp(SLOW_SPEED, FAST_SPEED);
    let factor = 1.0 - (clamped - SLOW_SPEED) / (FAST_SPEED - SLOW_SPEED);
    min_r + (max_r - min_r) * ease_in_out(factor)
}

fn ease_in_out(t: f64) -> f64 {
    if t < 0.5 {
        2.0 * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(2) / 2.0
    }
}

fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

fn step_len(avg_r: f64) -> f64 {
    (avg_r * SAMPLE_RESOLUTION).max(MIN_STEP)
}

fn line_samples(a: InkPoint, b: InkPoint, min_len: f64) -> Vec<InkPoint> {
    let dist = a.p.distance(b.p);
    if dist < 0.001 {
        return vec![b];
    }
    let steps = ((dist.max(min_len) / step_len((a.r + b.r) * 0.5)).ceil() as usize).max(1);
    (0..=steps)
        .map(|i| {
            let t = i as f64 / steps as f64;
            InkPoint {
                p: a.p.lerp(b.p, t),
                r: lerp(a.r, b.r, t),
            }
        })
        .collect()
}

fn curve_samples(a: InkPoint, b: InkPoint, c: InkPoint, min_len: f64) -> Vec<InkPoint> {
    let quad = QuadBez::new(a.p.midpoint(b.p), b.p, b.p.midpoint(c.p));
    let seg = quad.p0.distance(quad.p2);
    let avg_r = (a.r + b.r + c.r) / 3.0;
    let steps = ((seg.max(min_len) / step_len(avg_r)).ceil() as usize).max(1);
    let r_start = (a.r + b.r) * 0.5;
    let r_end = (b.r + c.r) * 0.5;
    (0..=steps)
        .map(|i| {
            let t = i as f64 / steps as f64;
            InkPoint {
                p: quad.eval(t),
                r: lerp(r_start, r_end, t),
            }
        })
        .collect()
}
