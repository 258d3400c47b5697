//! Brush engine.
//!
//! Every brush follows the same stroke contract: `begin_stroke` deposits a
//! first mark, `stroke_to` extends the stroke without gaps by resampling the
//! segment at a brush-specific step, and `end_stroke` drops per-stroke state.
//! An optional replica index lets symmetry replicas run concurrent strokes
//! through one brush instance.

mod air;
mod eraser;
mod fountain;
mod noise;
mod pen;
mod pencil;
mod replica;
mod soft;
mod stamp;

pub use air::AirBrush;
pub use eraser::EraserBrush;
pub use fountain::FountainPen;
pub use noise::Noise;
pub use pen::PenBrush;
pub use pencil::PencilBrush;
pub use replica::{ReplicaSlots, MAX_REPLICAS};
pub use soft::SoftBrush;

use crate::clock::Clock;
use crate::color::Rgb;
use crate::raster::Raster;
use kurbo::Point;
use serde::{Deserialize, Serialize};
use std::rc::Rc;
use thiserror::Error;

/// Default brush radius in content pixels.
pub const DEFAULT_BRUSH_SIZE: f64 = 30.0;

/// Unknown brush key.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown brush: {0:?}")]
pub struct UnknownBrush(pub String);

/// The closed set of brush types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BrushKind {
    #[default]
    Soft,
    Pen,
    Air,
    Fountain,
    Pencil,
    Eraser,
}

impl BrushKind {
    pub const ALL: [BrushKind; 6] = [
        BrushKind::Soft,
        BrushKind::Pen,
        BrushKind::Air,
        BrushKind::Fountain,
        BrushKind::Pencil,
        BrushKind::Eraser,
    ];

    pub fn key(self) -> &'static str {
        match self {
            BrushKind::Soft => "soft",
            BrushKind::Pen => "pen",
            BrushKind::Air => "air",
            BrushKind::Fountain => "fountain",
            BrushKind::Pencil => "pencil",
            BrushKind::Eraser => "eraser",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl std::str::FromStr for BrushKind {
    type Err = UnknownBrush;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BrushKind::ALL
            .into_iter()
            .find(|kind| kind.key() == s)
            .ok_or_else(|| UnknownBrush(s.to_string()))
    }
}

impl std::fmt::Display for BrushKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

/// User-facing brush parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BrushSettings {
    /// Radius in content pixels, always a whole number ≥ 1.
    pub size: f64,
    pub color: Rgb,
}

impl BrushSettings {
    pub fn new(size: f64, color: Rgb) -> Self {
        Self {
            size: clamp_size(size).unwrap_or(1.0),
            color,
        }
    }
}

impl Default for BrushSettings {
    fn default() -> Self {
        Self::new(DEFAULT_BRUSH_SIZE, Rgb::BLACK)
    }
}

/// Truncate to a whole radius ≥ 1; `None` for non-finite input.
fn clamp_size(size: f64) -> Option<f64> {
    size.is_finite().then(|| size.trunc().max(1.0))
}

/// One brush of each kind, dispatched by variant.
#[derive(Debug, Clone)]
pub enum Brush {
    Soft(SoftBrush),
    Pen(PenBrush),
    Air(AirBrush),
    Fountain(FountainPen),
    Pencil(PencilBrush),
    Eraser(EraserBrush),
}

impl Brush {
    pub fn new(kind: BrushKind, settings: BrushSettings, clock: Rc<dyn Clock>) -> Self {
        match kind {
            BrushKind::Soft => Brush::Soft(SoftBrush::new(settings)),
            BrushKind::Pen => Brush::Pen(PenBrush::new(settings)),
            BrushKind::Air => Brush::Air(AirBrush::new(settings)),
            BrushKind::Fountain => Brush::Fountain(FountainPen::new(settings, clock)),
            BrushKind::Pencil => Brush::Pencil(PencilBrush::new(settings)),
            BrushKind::Eraser => Brush::Eraser(EraserBrush::new(settings.size)),
        }
    }

    pub fn kind(&self) -> BrushKind {
        match self {
            Brush::Soft(_) => BrushKind::Soft,
            Brush::Pen(_) => BrushKind::Pen,
            Brush::Air(_) => BrushKind::Air,
            Brush::Fountain(_) => BrushKind::Fountain,
            Brush::Pencil(_) => BrushKind::Pencil,
            Brush::Eraser(_) => BrushKind::Eraser,
        }
    }

    pub fn settings(&self) -> BrushSettings {
        match self {
            Brush::Soft(b) => b.settings,
            Brush::Pen(b) => b.settings,
            Brush::Air(b) => b.settings,
            Brush::Fountain(b) => b.settings,
            Brush::Pencil(b) => b.settings,
            Brush::Eraser(b) => b.settings(),
        }
    }

    /// Set the radius. Non-finite values are ignored; others are clamped to ≥ 1.
    pub fn set_size(&mut self, size: f64) {
        let Some(size) = clamp_size(size) else {
            return;
        };
        match self {
            Brush::Soft(b) => b.settings.size = size,
            Brush::Pen(b) => b.settings.size = size,
            Brush::Air(b) => b.settings.size = size,
            Brush::Fountain(b) => b.settings.size = size,
            Brush::Pencil(b) => b.settings.size = size,
            Brush::Eraser(b) => b.set_size(size),
        }
    }

    /// Set the ink color. The eraser has none and ignores this.
    pub fn set_color(&mut self, color: Rgb) {
        match self {
            Brush::Soft(b) => b.settings.color = color,
            Brush::Pen(b) => b.settings.color = color,
            Brush::Air(b) => b.settings.color = color,
            Brush::Fountain(b) => b.settings.color = color,
            Brush::Pencil(b) => b.settings.color = color,
            Brush::Eraser(_) => {}
        }
    }

    /// Radius of the hover preview ring.
    pub fn preview_radius(&self) -> f64 {
        self.settings().size
    }

    /// Nominal resampling step: `stroke_to` emits at least
    /// `ceil(distance / step_size)` marks.
    pub fn step_size(&self) -> f64 {
        match self {
            Brush::Soft(b) => b.step_size(),
            Brush::Pen(b) => b.step_size(),
            Brush::Air(b) => b.step_size(),
            Brush::Fountain(b) => b.max_step(),
            Brush::Pencil(b) => b.step_size(),
            Brush::Eraser(b) => b.step_size(),
        }
    }

    pub fn begin_stroke(&mut self, target: &mut Raster, p: Point, replica: Option<usize>) {
        if !finite(p) {
            return;
        }
        match self {
            Brush::Soft(b) => b.begin_stroke(target, p),
            Brush::Pen(b) => b.begin_stroke(target, p, replica),
            Brush::Air(b) => b.begin_stroke(target, p),
            Brush::Fountain(b) => b.begin_stroke(target, p, replica),
            Brush::Pencil(b) => b.begin_stroke(target, p),
            Brush::Eraser(b) => b.begin_stroke(target, p),
        }
    }

    /// Extend the stroke from `from` to `to`. Returns the number of marks drawn.
    pub fn stroke_to(&mut self, target: &mut Raster, from: Point, to: Point, replica: Option<usize>) -> usize {
        if !finite(from) || !finite(to) {
            return 0;
        }
        match self {
            Brush::Soft(b) => b.stroke_to(target, from, to),
            Brush::Pen(b) => b.stroke_to(target, from, to, replica),
            Brush::Air(b) => b.stroke_to(target, from, to),
            Brush::Fountain(b) => b.stroke_to(target, from, to, replica),
            Brush::Pencil(b) => b.stroke_to(target, from, to),
            Brush::Eraser(b) => b.stroke_to(target, from, to),
        }
    }

    pub fn end_stroke(&mut self, replica: Option<usize>) {
        match self {
            Brush::Pen(b) => b.end_stroke(replica),
            Brush::Fountain(b) => b.end_stroke(replica),
            Brush::Soft(_) | Brush::Air(_) | Brush::Pencil(_) | Brush::Eraser(_) => {}
        }
    }
}

fn finite(p: Point) -> bool {
    p.x.is_finite() && p.y.is_finite()
}

/// Receiver of stroke calls, so symmetry fan-out can target a brush or a probe.
pub trait StrokeSink {
    fn begin_stroke(&mut self, p: Point, replica: Option<usize>);
    fn stroke_to(&mut self, from: Point, to: Point, replica: Option<usize>) -> usize;
    fn end_stroke(&mut self, replica: Option<usize>);
}

/// A brush paired with the raster it paints on.
pub struct BoundBrush<'a> {
    pub brush: &'a mut Brush,
    pub target: &'a mut Raster,
}

impl StrokeSink for BoundBrush<'_> {
    fn begin_stroke(&mut self, p: Point, replica: Option<usize>) {
        self.brush.begin_stroke(self.target, p, replica);
    }

    fn stroke_to(&mut self, from: Point, to: Point, replica: Option<usize>) -> usize {
        self.brush.stroke_to(self.target, from, to, replica)
    }

    fn end_stroke(&mut self, replica: Option<usize>) {
        self.brush.end_stroke(replica);
    }
}

/// The session's brushes, one instance per kind, created up front.
#[derive(Debug, Clone)]
pub struct BrushSet {
    brushes: Vec<Brush>,
}

impl BrushSet {
    pub fn new(defaults: BrushSettings, clock: Rc<dyn Clock>) -> Self {
        Self {
            brushes: BrushKind::ALL
                .into_iter()
                .map(|kind| Brush::new(kind, defaults, clock.clone()))
                .collect(),
        }
    }

    pub fn get(&self, kind: BrushKind) -> &Brush {
        &self.brushes[kind.index()]
    }

    pub fn get_mut(&mut self, kind: BrushKind) -> &mut Brush {
        &mut self.brushes[kind.index()]
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Brush> {
        self.brushes.iter_mut()
    }
}
