//! Viewport transform between client (screen) space and content space.
//!
//! `screen = content * scale + offset`, where screen coordinates are
//! relative to the viewport's top-left corner in client space.

use crate::input::{DeltaMode, WheelEvent};
use kurbo::{Affine, Point, Rect, Size, Vec2};
use serde::{Deserialize, Serialize};

/// Largest allowed zoom.
pub const MAX_SCALE: f64 = 32.0;
/// Smallest allowed zoom regardless of fit.
pub const MIN_SCALE_FLOOR: f64 = 0.05;
/// Zoom-out limit as a fraction of the fit scale.
pub const MIN_FIT_FRACTION: f64 = 0.25;

const ZOOM_INTENSITY: f64 = 0.005;
const LINE_DELTA_PX: f64 = 32.0;
const PAN_SPEED: f64 = 1.5;
const CUSTOM_ZOOM_EPSILON: f64 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq)]
struct PanState {
    start_client: Point,
    start_offset: Vec2,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct PinchState {
    start_distance: f64,
    start_scale: f64,
    world_mid: Point,
}

/// Pan and zoom state of the on-screen canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub scale: f64,
    pub offset: Vec2,
    pub fit_scale: f64,
    /// Client-space rectangle of the viewport element.
    bounds: Rect,
    #[serde(skip)]
    pan: Option<PanState>,
    #[serde(skip)]
    pinch: Option<PinchState>,
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(Rect::new(0.0, 0.0, 1.0, 1.0))
    }
}

impl Viewport {
    pub fn new(bounds: Rect) -> Self {
        Self {
            scale: 1.0,
            offset: Vec2::ZERO,
            fit_scale: 1.0,
            bounds,
            pan: None,
            pinch: None,
        }
    }

    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    pub fn size(&self) -> Size {
        self.bounds.size()
    }

    /// Content to viewport-local screen transform.
    pub fn transform(&self) -> Affine {
        Affine::translate(self.offset) * Affine::scale(self.scale)
    }

    pub fn min_scale(&self) -> f64 {
        (self.fit_scale * MIN_FIT_FRACTION).max(MIN_SCALE_FLOOR)
    }

    fn clamp_scale(&self, scale: f64) -> f64 {
        scale.clamp(self.min_scale(), MAX_SCALE)
    }

    /// Client point relative to the viewport's top-left corner.
    fn local(&self, client: Point) -> Point {
        client - self.bounds.origin().to_vec2()
    }

    fn world_from_local(&self, local: Point) -> Point {
        Point::new(
            (local.x - self.offset.x) / self.scale,
            (local.y - self.offset.y) / self.scale,
        )
    }

    /// Content coordinates under a client-space point.
    pub fn world_from_client(&self, client: Point) -> Point {
        self.world_from_local(self.local(client))
    }

    /// Client-space position of a content point.
    pub fn client_from_world(&self, world: Point) -> Point {
        self.transform() * world + self.bounds.origin().to_vec2()
    }

    /// Letterbox `content` inside the viewport and center it.
    pub fn fit_to_content(&mut self, content: Size) {
        let Some(fit) = self.fit_for(content) else {
            return;
        };
        self.fit_scale = fit;
        self.scale = fit;
        let view = self.size();
        self.offset = Vec2::new(
            (view.width - content.width * fit) / 2.0,
            (view.height - content.height * fit) / 2.0,
        );
        log::debug!("Viewport fit: scale {:.4}, offset {:?}", self.scale, self.offset);
    }

    fn fit_for(&self, content: Size) -> Option<f64> {
        let view = self.size();
        if view.width <= 0.0 || view.height <= 0.0 || content.width <= 0.0 || content.height <= 0.0 {
            return None;
        }
        Some((view.width / content.width).min(view.height / content.height))
    }

    /// Zoom around `local` so the content point under it stays put.
    fn zoom_at_local(&mut self, local: Point, new_scale: f64) {
        let world = self.world_from_local(local);
        self.scale = self.clamp_scale(new_scale);
        self.offset = Vec2::new(local.x - world.x * self.scale, local.y - world.y * self.scale);
    }

    /// Zoom by `factor` around a client-space point.
    pub fn zoom_at(&mut self, client: Point, factor: f64) {
        if !(factor > 0.0) || !factor.is_finite() {
            return;
        }
        let local = self.local(client);
        self.zoom_at_local(local, self.scale * factor);
    }

    /// Wheel with a zoom modifier zooms at the cursor; otherwise it pans.
    pub fn wheel(&mut self, event: &WheelEvent) {
        if !event.delta.x.is_finite() || !event.delta.y.is_finite() {
            return;
        }
        if event.is_zoom() {
            self.zoom_at(event.position, (-event.delta.y * ZOOM_INTENSITY).exp());
            return;
        }

        let unit = match event.mode {
            DeltaMode::Pixel => 1.0,
            DeltaMode::Line => LINE_DELTA_PX,
            DeltaMode::Page => self.size().height,
        };
        let mut delta = event.delta;
        // Mice without a horizontal wheel send shift+vertical for sideways scrolling.
        if event.modifiers.shift && delta.x.abs() < 1.0 && delta.y.abs() >= 1.0 {
            delta = Vec2::new(delta.y, 0.0);
        }
        self.offset -= delta * unit * PAN_SPEED;
    }

    pub fn start_pan(&mut self, client: Point) {
        self.pan = Some(PanState {
            start_client: client,
            start_offset: self.offset,
        });
    }

    pub fn update_pan(&mut self, client: Point) {
        if let Some(pan) = self.pan {
            self.offset = pan.start_offset + (client - pan.start_client);
        }
    }

    pub fn end_pan(&mut self) {
        self.pan = None;
    }

    pub fn is_panning(&self) -> bool {
        self.pan.is_some()
    }

    /// Start a two-finger pinch. The content point under the midpoint is
    /// remembered for the whole gesture.
    pub fn begin_pinch(&mut self, a: Point, b: Point) {
        let mid = self.local(a.midpoint(b));
        self.pinch = Some(PinchState {
            start_distance: a.distance(b),
            start_scale: self.scale,
            world_mid: self.world_from_local(mid),
        });
    }

    pub fn update_pinch(&mut self, a: Point, b: Point) {
        let Some(pinch) = self.pinch else {
            return;
        };
        if pinch.start_distance <= 0.0 {
            return;
        }
        let factor = a.distance(b) / pinch.start_distance;
        let mid = self.local(a.midpoint(b));
        self.scale = self.clamp_scale(pinch.start_scale * factor);
        self.offset = Vec2::new(
            mid.x - pinch.world_mid.x * self.scale,
            mid.y - pinch.world_mid.y * self.scale,
        );
    }

    pub fn end_pinch(&mut self) {
        self.pinch = None;
    }

    pub fn is_pinching(&self) -> bool {
        self.pinch.is_some()
    }

    /// Adopt new viewport bounds. An unmodified zoom snaps to the new fit;
    /// a custom zoom is kept. Either way the content point that was at the
    /// old viewport center ends up at the new center.
    pub fn on_resize(&mut self, bounds: Rect, content: Size) {
        let old = self.size();
        let center_world = self.world_from_local(Point::new(old.width / 2.0, old.height / 2.0));
        let custom_zoom = (self.scale - self.fit_scale).abs() > CUSTOM_ZOOM_EPSILON;

        self.bounds = bounds;
        if let Some(fit) = self.fit_for(content) {
            self.fit_scale = fit;
        }
        if !custom_zoom {
            self.scale = self.fit_scale;
        }

        let view = self.size();
        self.offset = Vec2::new(
            view.width / 2.0 - center_world.x * self.scale,
            view.height / 2.0 - center_world.y * self.scale,
        );
        log::debug!(
            "Viewport resized to {}x{}, scale {:.4} (custom zoom: {custom_zoom})",
            view.width,
            view.height,
            self.scale
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::Modifiers;

    fn assert_close(a: Point, b: Point) {
        assert!(a.distance(b) < 1e-9, "{a:?} != {b:?}");
    }

    fn viewport(w: f64, h: f64) -> Viewport {
        Viewport::new(Rect::new(0.0, 0.0, w, h))
    }

    fn ctrl_wheel(position: Point, dy: f64) -> WheelEvent {
        WheelEvent {
            position,
            delta: Vec2::new(0.0, dy),
            mode: DeltaMode::Pixel,
            modifiers: Modifiers {
                ctrl: true,
                ..Modifiers::default()
            },
        }
    }

    #[test]
    fn test_fit_letterboxes_content() {
        let mut vp = viewport(400.0, 300.0);
        vp.fit_to_content(Size::new(800.0, 600.0));
        assert!((vp.scale - 0.5).abs() < f64::EPSILON);
        assert_eq!(vp.offset, Vec2::ZERO);

        let mut wide = viewport(1000.0, 300.0);
        wide.fit_to_content(Size::new(800.0, 600.0));
        assert!((wide.scale - 0.5).abs() < f64::EPSILON);
        assert!((wide.offset.x - 300.0).abs() < 1e-12);
        assert_eq!(wide.offset.y, 0.0);
    }

    #[test]
    fn test_fit_is_idempotent() {
        let mut vp = viewport(640.0, 480.0);
        vp.fit_to_content(Size::new(1234.0, 567.0));
        let first = (vp.scale, vp.offset);
        vp.fit_to_content(Size::new(1234.0, 567.0));
        assert_eq!(first, (vp.scale, vp.offset));
    }

    #[test]
    fn test_fit_ignores_degenerate_sizes() {
        let mut vp = viewport(0.0, 300.0);
        vp.fit_to_content(Size::new(800.0, 600.0));
        assert_eq!(vp.scale, 1.0);
        let mut vp = viewport(400.0, 300.0);
        vp.fit_to_content(Size::new(0.0, 600.0));
        assert_eq!(vp.scale, 1.0);
    }

    #[test]
    fn test_world_from_client_respects_origin() {
        let mut vp = Viewport::new(Rect::new(10.0, 20.0, 410.0, 320.0));
        vp.fit_to_content(Size::new(800.0, 600.0));
        assert_close(vp.world_from_client(Point::new(10.0, 20.0)), Point::ZERO);
        assert_close(vp.world_from_client(Point::new(210.0, 170.0)), Point::new(400.0, 300.0));
        let p = Point::new(123.0, 45.0);
        assert_close(vp.client_from_world(vp.world_from_client(p)), p);
    }

    #[test]
    fn test_wheel_zoom_keeps_cursor_point() {
        let cases = [
            (1.0, Vec2::ZERO, Point::new(50.0, 50.0), -120.0),
            (0.5, Vec2::new(30.0, -10.0), Point::new(383.0, 12.0), 240.0),
            (4.0, Vec2::new(-900.0, -700.0), Point::new(0.0, 299.0), -3.0),
            (31.0, Vec2::new(5.0, 5.0), Point::new(200.0, 150.0), -500.0),
        ];
        for (scale, offset, cursor, dy) in cases {
            let mut vp = Viewport::new(Rect::new(7.0, 9.0, 407.0, 309.0));
            vp.fit_to_content(Size::new(800.0, 600.0));
            vp.scale = scale;
            vp.offset = offset;
            let before = vp.world_from_client(cursor);
            vp.wheel(&ctrl_wheel(cursor, dy));
            assert_close(vp.client_from_world(before), cursor);
            assert!(vp.scale >= vp.min_scale() && vp.scale <= MAX_SCALE);
        }
    }

    #[test]
    fn test_wheel_zoom_direction_and_clamp() {
        let mut vp = viewport(400.0, 300.0);
        vp.fit_to_content(Size::new(800.0, 600.0));
        vp.wheel(&ctrl_wheel(Point::new(200.0, 150.0), -100.0));
        assert!(vp.scale > 0.5);
        for _ in 0..100 {
            vp.wheel(&ctrl_wheel(Point::new(200.0, 150.0), 1000.0));
        }
        assert!((vp.scale - 0.125).abs() < 1e-12);
        for _ in 0..100 {
            vp.wheel(&ctrl_wheel(Point::new(200.0, 150.0), -1000.0));
        }
        assert!((vp.scale - MAX_SCALE).abs() < 1e-12);
    }

    #[test]
    fn test_wheel_pan_units() {
        let mut vp = viewport(400.0, 300.0);
        vp.wheel(&WheelEvent::pixels(Point::ZERO, Vec2::new(10.0, 20.0)));
        assert_eq!(vp.offset, Vec2::new(-15.0, -30.0));

        let mut vp = viewport(400.0, 300.0);
        vp.wheel(&WheelEvent {
            mode: DeltaMode::Line,
            ..WheelEvent::pixels(Point::ZERO, Vec2::new(0.0, 1.0))
        });
        assert_eq!(vp.offset, Vec2::new(0.0, -48.0));

        let mut vp = viewport(400.0, 300.0);
        vp.wheel(&WheelEvent {
            mode: DeltaMode::Page,
            ..WheelEvent::pixels(Point::ZERO, Vec2::new(0.0, 1.0))
        });
        assert_eq!(vp.offset, Vec2::new(0.0, -450.0));
    }

    #[test]
    fn test_shift_wheel_pans_horizontally() {
        let mut vp = viewport(400.0, 300.0);
        vp.wheel(&WheelEvent {
            modifiers: Modifiers {
                shift: true,
                ..Modifiers::default()
            },
            ..WheelEvent::pixels(Point::ZERO, Vec2::new(0.0, 10.0))
        });
        assert_eq!(vp.offset, Vec2::new(-15.0, 0.0));
    }

    #[test]
    fn test_drag_pan() {
        let mut vp = viewport(400.0, 300.0);
        vp.update_pan(Point::new(50.0, 50.0));
        assert_eq!(vp.offset, Vec2::ZERO);
        vp.start_pan(Point::new(10.0, 10.0));
        vp.update_pan(Point::new(25.0, 5.0));
        vp.update_pan(Point::new(30.0, 40.0));
        assert_eq!(vp.offset, Vec2::new(20.0, 30.0));
        vp.end_pan();
        assert!(!vp.is_panning());
    }

    #[test]
    fn test_pinch_keeps_midpoint_world_point() {
        let mut vp = Viewport::new(Rect::new(0.0, 50.0, 400.0, 350.0));
        vp.fit_to_content(Size::new(800.0, 600.0));
        let a = Point::new(100.0, 150.0);
        let b = Point::new(200.0, 250.0);
        let mid_world = vp.world_from_client(a.midpoint(b));
        vp.begin_pinch(a, b);

        for (a2, b2) in [
            (Point::new(90.0, 140.0), Point::new(210.0, 260.0)),
            (Point::new(60.0, 100.0), Point::new(260.0, 300.0)),
            (Point::new(140.0, 190.0), Point::new(160.0, 210.0)),
        ] {
            vp.update_pinch(a2, b2);
            assert_close(vp.client_from_world(mid_world), a2.midpoint(b2));
        }

        // Spreading the fingers apart doubles the scale.
        vp.update_pinch(Point::new(50.0, 100.0), Point::new(250.0, 300.0));
        assert!((vp.scale - 1.0).abs() < 1e-12);
        vp.end_pinch();
        assert!(!vp.is_pinching());
    }

    #[test]
    fn test_pinch_with_zero_start_distance_is_ignored() {
        let mut vp = viewport(400.0, 300.0);
        let p = Point::new(10.0, 10.0);
        vp.begin_pinch(p, p);
        vp.update_pinch(Point::ZERO, Point::new(100.0, 0.0));
        assert_eq!(vp.scale, 1.0);
        assert_eq!(vp.offset, Vec2::ZERO);
    }

    #[test]
    fn test_resize_snaps_to_new_fit() {
        let content = Size::new(800.0, 600.0);
        let mut vp = viewport(400.0, 300.0);
        vp.fit_to_content(content);
        vp.on_resize(Rect::new(0.0, 0.0, 800.0, 600.0), content);
        assert!((vp.scale - 1.0).abs() < 1e-12);
        assert!((vp.fit_scale - 1.0).abs() < 1e-12);
        assert!(vp.offset.hypot() < 1e-9);
    }

    #[test]
    fn test_resize_keeps_custom_zoom_and_center() {
        let content = Size::new(800.0, 600.0);
        let mut vp = viewport(400.0, 300.0);
        vp.fit_to_content(content);
        vp.zoom_at(Point::new(100.0, 100.0), 3.0);
        let scale = vp.scale;
        let center_world = vp.world_from_client(Point::new(200.0, 150.0));

        vp.on_resize(Rect::new(0.0, 0.0, 1000.0, 500.0), content);
        assert!((vp.scale - scale).abs() < 1e-12);
        assert!((vp.fit_scale - 500.0 / 600.0).abs() < 1e-12);
        assert_close(vp.client_from_world(center_world), Point::new(500.0, 250.0));
    }
}
