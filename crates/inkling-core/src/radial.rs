//! Radial brush menu collaborator.
//!
//! The surface opens the menu on a secondary-button press or a touch long
//! press, forwards hover positions while it is open, and asks it for the
//! chosen brush on release. Rendering and hit-testing belong to the host.

use crate::brush::BrushKind;
use kurbo::Point;
use std::f64::consts::TAU;

/// What opened the menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RadialVia {
    Mouse,
    Touch,
}

pub trait RadialMenu: std::fmt::Debug {
    fn open_at(&mut self, client: Point, via: RadialVia);
    fn is_open(&self) -> bool;
    fn update_hover(&mut self, client: Point);
    fn set_long_press_selecting(&mut self, selecting: bool);
    fn is_long_press_selecting(&self) -> bool;
    /// Brush under the last hover point, if any.
    fn finalize_selection(&mut self) -> Option<BrushKind>;
    fn close(&mut self);
}

/// Equal angular sectors around the open point, starting at 12 o'clock and
/// running clockwise, with a dead zone in the middle.
#[derive(Debug, Clone, PartialEq)]
pub struct RingLayout {
    pub items: Vec<BrushKind>,
    pub dead_zone: f64,
}

impl Default for RingLayout {
    fn default() -> Self {
        Self {
            items: BrushKind::ALL.to_vec(),
            dead_zone: 24.0,
        }
    }
}

impl RingLayout {
    pub fn item_at(&self, center: Point, p: Point) -> Option<BrushKind> {
        if self.items.is_empty() || center.distance(p) < self.dead_zone {
            return None;
        }
        let d = p - center;
        let sector = TAU / self.items.len() as f64;
        // Clockwise from straight up, in y-down screen space.
        let angle = d.x.atan2(-d.y).rem_euclid(TAU);
        let index = ((angle + sector / 2.0) / sector).floor() as usize % self.items.len();
        self.items.get(index).copied()
    }
}

/// State-only radial menu.
#[derive(Debug, Clone, Default)]
pub struct RadialTracker {
    opened: Option<(Point, RadialVia)>,
    hover: Option<Point>,
    long_press_selecting: bool,
    layout: Option<RingLayout>,
}

impl RadialTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_layout(layout: RingLayout) -> Self {
        Self {
            layout: Some(layout),
            ..Self::default()
        }
    }

    pub fn opened_at(&self) -> Option<(Point, RadialVia)> {
        self.opened
    }

    pub fn hover(&self) -> Option<Point> {
        self.hover
    }
}

impl RadialMenu for RadialTracker {
    fn open_at(&mut self, client: Point, via: RadialVia) {
        self.opened = Some((client, via));
        self.hover = None;
    }

    fn is_open(&self) -> bool {
        self.opened.is_some()
    }

    fn update_hover(&mut self, client: Point) {
        if self.is_open() {
            self.hover = Some(client);
        }
    }

    fn set_long_press_selecting(&mut self, selecting: bool) {
        self.long_press_selecting = selecting;
    }

    fn is_long_press_selecting(&self) -> bool {
        self.long_press_selecting
    }

    fn finalize_selection(&mut self) -> Option<BrushKind> {
        let (center, _) = self.opened?;
        let hover = self.hover?;
        self.layout.as_ref()?.item_at(center, hover)
    }

    fn close(&mut self) {
        self.opened = None;
        self.hover = None;
        self.long_press_selecting = false;
    }
}
