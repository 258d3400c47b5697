//! Drawing surface controller.
//!
//! Owns the content raster, its history and the session's brushes, and routes
//! client-space input through the viewport into exactly one interaction mode
//! at a time. Every state-affecting call recomposites the device-pixel frame.

use crate::brush::{BoundBrush, BrushKind, BrushSet, BrushSettings};
use crate::clock::{Clock, SystemClock};
use crate::color::{ColorError, Rgb};
use crate::config::SurfaceConfig;
use crate::export::{self, ExportError, ImageSink, SaveOutcome};
use crate::history::History;
use crate::input::{KeyEvent, MouseButton, PointerEvent, Shortcut, TouchEvent, TouchPhase, WheelEvent};
use crate::radial::{RadialMenu, RadialTracker, RadialVia};
use crate::raster::{self, CompositeMode, Raster};
use crate::setup::{CanvasSetup, SetupError, SetupMode};
use crate::symmetry::Symmetry;
use crate::viewport::Viewport;
use kurbo::{Affine, Point, Rect};
use std::rc::Rc;
use thiserror::Error;

const GUIDE_GRAY: Rgb = Rgb::new(127, 127, 127);
const GUIDE_ALPHA: f32 = 0.6;
const HOVER_GRAY: Rgb = Rgb::new(200, 200, 200);
const HOVER_ALPHA: f32 = 0.9;

/// Drawing surface errors.
#[derive(Debug, Error)]
pub enum SurfaceError {
    #[error("Drawing surface is not initialized")]
    NotInitialized,
    #[error(transparent)]
    Setup(#[from] SetupError),
    #[error(transparent)]
    Color(#[from] ColorError),
    #[error(transparent)]
    Export(#[from] ExportError),
}

/// Result type for surface operations.
pub type SurfaceResult<T> = Result<T, SurfaceError>;

/// The single active interaction mode.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Interaction {
    Idle,
    /// A stroke is in progress; `last` is the previous content-space sample.
    Drawing { last: Point },
    Panning,
    Pinching,
    RadialSelecting { via: RadialVia },
}

/// What a key event did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOutcome {
    Ignored,
    Handled,
    /// The host should save the drawing.
    SaveRequested,
}

#[derive(Debug)]
struct Content {
    raster: Raster,
    history: History,
    background: Rgb,
    /// Background-colored pixels are still part of the raster.
    baked: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct LongPress {
    start_client: Point,
    deadline_ms: f64,
}

/// The painting canvas: content raster, viewport, brushes and input routing.
#[derive(Debug)]
pub struct DrawingSurface {
    config: SurfaceConfig,
    content: Option<Content>,
    viewport: Viewport,
    dpr: f64,
    brushes: BrushSet,
    active: BrushKind,
    symmetry: Symmetry,
    interaction: Interaction,
    /// Last client position of a hovering mouse.
    hover: Option<Point>,
    space_held: bool,
    color_picker_open: bool,
    long_press: Option<LongPress>,
    radial: Box<dyn RadialMenu>,
    frame: Raster,
}

impl DrawingSurface {
    /// Create an uninitialized surface over a viewport element at `bounds`
    /// (client space) with the given device pixel ratio.
    pub fn new(config: SurfaceConfig, bounds: Rect, dpr: f64) -> Self {
        Self::with_clock(config, bounds, dpr, Rc::new(SystemClock::new()))
    }

    pub fn with_clock(config: SurfaceConfig, bounds: Rect, dpr: f64, clock: Rc<dyn Clock>) -> Self {
        let dpr = sanitize_dpr(dpr);
        let defaults = BrushSettings::new(config.brush_size, config.brush_color);
        Self {
            content: None,
            viewport: Viewport::new(bounds),
            dpr,
            brushes: BrushSet::new(defaults, clock),
            active: BrushKind::default(),
            symmetry: Symmetry::default(),
            interaction: Interaction::Idle,
            hover: None,
            space_held: false,
            color_picker_open: false,
            long_press: None,
            radial: Box::new(RadialTracker::new()),
            frame: device_frame(bounds, dpr),
            config,
        }
    }

    /// Replace the radial menu collaborator.
    pub fn with_radial_menu(mut self, radial: Box<dyn RadialMenu>) -> Self {
        self.radial = radial;
        self
    }

    /// Validate `setup` and start a fresh canvas. On error nothing changes.
    pub fn initialize(&mut self, setup: CanvasSetup) -> SurfaceResult<()> {
        setup.validate(&self.config.limits)?;

        let raster = Raster::new(setup.width, setup.height);
        let mut history = History::new(self.config.history_capacity);
        history.record(&raster);
        self.content = Some(Content {
            raster,
            history,
            background: setup.background,
            baked: setup.mode == SetupMode::Upload,
        });

        self.interaction = Interaction::Idle;
        self.long_press = None;
        self.viewport.end_pan();
        self.viewport.end_pinch();
        self.radial.close();
        self.viewport.fit_to_content(self.content_size());
        log::info!(
            "Canvas initialized: {}x{} ({:?}), background {}",
            setup.width,
            setup.height,
            setup.mode,
            setup.background
        );
        self.render();
        Ok(())
    }

    /// Parse raw form inputs against the configured limits, then initialize.
    /// Parse form inputs and initialize. An empty background falls back to
    /// the configured default.
    pub fn initialize_from_inputs(
        &mut self,
        width: &str,
        height: &str,
        background: &str,
        mode: SetupMode,
    ) -> SurfaceResult<()> {
        let fallback;
        let background = if background.trim().is_empty() {
            fallback = self.config.background.to_hex();
            fallback.as_str()
        } else {
            background
        };
        let setup = CanvasSetup::from_inputs(width, height, background, &self.config.limits)?;
        self.initialize(setup.with_mode(mode))
    }

    pub fn is_initialized(&self) -> bool {
        self.content.is_some()
    }

    pub fn config(&self) -> &SurfaceConfig {
        &self.config
    }

    pub fn interaction(&self) -> Interaction {
        self.interaction
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn dpr(&self) -> f64 {
        self.dpr
    }

    /// The composited device-pixel frame.
    pub fn frame(&self) -> &Raster {
        &self.frame
    }

    pub fn content(&self) -> Option<&Raster> {
        self.content.as_ref().map(|c| &c.raster)
    }

    pub fn history(&self) -> Option<&History> {
        self.content.as_ref().map(|c| &c.history)
    }

    pub fn background(&self) -> Option<Rgb> {
        self.content.as_ref().map(|c| c.background)
    }

    pub fn is_background_baked(&self) -> bool {
        self.content.as_ref().is_some_and(|c| c.baked)
    }

    pub fn active_brush(&self) -> BrushKind {
        self.active
    }

    /// Settings of the active brush.
    pub fn brush_settings(&self) -> BrushSettings {
        self.brushes.get(self.active).settings()
    }

    pub fn settings_for(&self, kind: BrushKind) -> BrushSettings {
        self.brushes.get(kind).settings()
    }

    pub fn symmetry(&self) -> Symmetry {
        self.symmetry
    }

    pub fn is_space_held(&self) -> bool {
        self.space_held
    }

    pub fn radial(&self) -> &dyn RadialMenu {
        self.radial.as_ref()
    }

    fn content_mut(&mut self) -> SurfaceResult<&mut Content> {
        self.content.as_mut().ok_or(SurfaceError::NotInitialized)
    }

    fn require_content(&self) -> SurfaceResult<&Content> {
        self.content.as_ref().ok_or(SurfaceError::NotInitialized)
    }

    fn content_size(&self) -> kurbo::Size {
        self.content
            .as_ref()
            .map(|c| c.raster.size())
            .unwrap_or(kurbo::Size::ZERO)
    }

    // Pointer input

    pub fn pointer(&mut self, event: &PointerEvent) -> SurfaceResult<()> {
        self.require_content()?;
        match *event {
            PointerEvent::Down {
                position,
                button,
                ..
            } => self.pointer_down(position, button)?,
            PointerEvent::Move { position } => self.pointer_move(position)?,
            PointerEvent::Up { .. } => self.release()?,
            PointerEvent::Enter { position } => self.hover = Some(position),
            PointerEvent::Leave => {
                self.hover = None;
                // An open radial menu only resolves on release.
                if !matches!(self.interaction, Interaction::RadialSelecting { .. }) {
                    self.release()?;
                }
            }
        }
        self.render();
        Ok(())
    }

    fn pointer_down(&mut self, client: Point, button: MouseButton) -> SurfaceResult<()> {
        if self.color_picker_open || self.interaction != Interaction::Idle {
            return Ok(());
        }
        match button {
            MouseButton::Right => self.open_radial(client, RadialVia::Mouse),
            MouseButton::Left if self.space_held => self.start_pan(client),
            MouseButton::Left => self.begin_drawing(client)?,
            MouseButton::Middle => {}
        }
        Ok(())
    }

    fn pointer_move(&mut self, client: Point) -> SurfaceResult<()> {
        self.hover = Some(client);
        if self.color_picker_open {
            return Ok(());
        }
        match self.interaction {
            Interaction::RadialSelecting { .. } => self.radial.update_hover(client),
            Interaction::Panning => self.viewport.update_pan(client),
            Interaction::Drawing { last } => self.continue_drawing(last, client)?,
            Interaction::Idle | Interaction::Pinching => {}
        }
        Ok(())
    }

    /// End whatever the pointer was doing.
    fn release(&mut self) -> SurfaceResult<()> {
        match self.interaction {
            Interaction::RadialSelecting { .. } => self.finalize_radial(),
            Interaction::Panning => {
                self.viewport.end_pan();
                self.interaction = Interaction::Idle;
            }
            Interaction::Drawing { .. } => self.finish_stroke()?,
            Interaction::Pinching => {
                self.viewport.end_pinch();
                self.interaction = Interaction::Idle;
            }
            Interaction::Idle => {}
        }
        Ok(())
    }

    // Touch input

    pub fn touch(&mut self, event: &TouchEvent) -> SurfaceResult<()> {
        self.require_content()?;
        if self.color_picker_open {
            return Ok(());
        }
        match event.phase {
            TouchPhase::Start => self.touch_start(event)?,
            TouchPhase::Move => self.touch_move(event)?,
            TouchPhase::End | TouchPhase::Cancel => self.touch_end(event)?,
        }
        self.render();
        Ok(())
    }

    fn touch_start(&mut self, event: &TouchEvent) -> SurfaceResult<()> {
        if let Some((a, b)) = event.pair() {
            if self.interaction == Interaction::Pinching {
                return Ok(());
            }
            self.long_press = None;
            match self.interaction {
                Interaction::Drawing { .. } => self.finish_stroke()?,
                Interaction::Panning => self.viewport.end_pan(),
                Interaction::RadialSelecting { .. } => self.radial.close(),
                Interaction::Idle | Interaction::Pinching => {}
            }
            self.viewport.begin_pinch(a, b);
            self.interaction = Interaction::Pinching;
            return Ok(());
        }

        let Some(client) = event.first() else {
            return Ok(());
        };
        if self.interaction != Interaction::Idle {
            return Ok(());
        }
        if self.space_held {
            self.start_pan(client);
            return Ok(());
        }
        // Drawing waits for the first move; holding still opens the radial menu.
        self.long_press = Some(LongPress {
            start_client: client,
            deadline_ms: event.time_ms + self.config.long_press_ms,
        });
        Ok(())
    }

    fn touch_move(&mut self, event: &TouchEvent) -> SurfaceResult<()> {
        if self.interaction == Interaction::Pinching {
            if let Some((a, b)) = event.pair() {
                self.viewport.update_pinch(a, b);
            }
            return Ok(());
        }
        let Some(client) = event.first() else {
            return Ok(());
        };
        match self.interaction {
            Interaction::Panning => self.viewport.update_pan(client),
            Interaction::RadialSelecting { .. } => {
                if self.radial.is_long_press_selecting() {
                    self.radial.update_hover(client);
                }
            }
            Interaction::Drawing { last } => self.continue_drawing(last, client)?,
            Interaction::Idle => match self.long_press.take() {
                Some(press) if event.time_ms >= press.deadline_ms => {
                    self.promote_long_press(press);
                    self.radial.update_hover(client);
                }
                _ => self.begin_drawing(client)?,
            },
            Interaction::Pinching => {}
        }
        Ok(())
    }

    fn touch_end(&mut self, event: &TouchEvent) -> SurfaceResult<()> {
        if self.interaction == Interaction::Pinching {
            if event.touches.len() < 2 {
                self.viewport.end_pinch();
                self.interaction = Interaction::Idle;
            }
            return Ok(());
        }
        self.long_press = None;
        self.release()
    }

    /// Promote a pending long press to radial selection once `now_ms` has
    /// reached its deadline. Returns whether the menu opened.
    pub fn poll_long_press(&mut self, now_ms: f64) -> SurfaceResult<bool> {
        self.require_content()?;
        let Some(press) = self.long_press else {
            return Ok(false);
        };
        if now_ms < press.deadline_ms || self.interaction != Interaction::Idle {
            return Ok(false);
        }
        self.long_press = None;
        self.promote_long_press(press);
        self.render();
        Ok(true)
    }

    fn promote_long_press(&mut self, press: LongPress) {
        self.open_radial(press.start_client, RadialVia::Touch);
        self.radial.set_long_press_selecting(true);
        self.radial.update_hover(press.start_client);
    }

    // Wheel and keys

    pub fn wheel(&mut self, event: &WheelEvent) -> SurfaceResult<()> {
        self.require_content()?;
        self.viewport.wheel(event);
        self.render();
        Ok(())
    }

    pub fn key_down(&mut self, event: &KeyEvent) -> SurfaceResult<KeyOutcome> {
        self.require_content()?;
        match event.shortcut() {
            Some(Shortcut::Undo) => {
                self.undo()?;
                return Ok(KeyOutcome::Handled);
            }
            Some(Shortcut::Redo) => {
                self.redo()?;
                return Ok(KeyOutcome::Handled);
            }
            Some(Shortcut::Save) => return Ok(KeyOutcome::SaveRequested),
            None => {}
        }
        if event.is_space() && !event.in_text_field {
            self.space_held = true;
            return Ok(KeyOutcome::Handled);
        }
        Ok(KeyOutcome::Ignored)
    }

    pub fn key_up(&mut self, event: &KeyEvent) -> SurfaceResult<KeyOutcome> {
        self.require_content()?;
        if !event.is_space() {
            return Ok(KeyOutcome::Ignored);
        }
        self.space_held = false;
        if self.interaction == Interaction::Panning {
            self.viewport.end_pan();
            self.interaction = Interaction::Idle;
            self.render();
        }
        Ok(KeyOutcome::Handled)
    }

    // Modes

    fn start_pan(&mut self, client: Point) {
        self.viewport.start_pan(client);
        self.interaction = Interaction::Panning;
    }

    fn open_radial(&mut self, client: Point, via: RadialVia) {
        self.radial.open_at(client, via);
        self.interaction = Interaction::RadialSelecting { via };
    }

    fn finalize_radial(&mut self) {
        if let Some(kind) = self.radial.finalize_selection() {
            log::debug!("Radial menu selected {kind}");
            self.active = kind;
        }
        self.radial.close();
        self.interaction = Interaction::Idle;
    }

    fn begin_drawing(&mut self, client: Point) -> SurfaceResult<()> {
        let world = self.viewport.world_from_client(client);
        let content = self.content.as_mut().ok_or(SurfaceError::NotInitialized)?;
        let pivot = content.raster.center();
        let mut sink = BoundBrush {
            brush: self.brushes.get_mut(self.active),
            target: &mut content.raster,
        };
        self.symmetry.begin_and_dot(&mut sink, world, pivot);
        self.interaction = Interaction::Drawing { last: world };
        log::debug!("Stroke started with {} at {:?}", self.active, world);
        Ok(())
    }

    fn continue_drawing(&mut self, last: Point, client: Point) -> SurfaceResult<()> {
        let world = self.viewport.world_from_client(client);
        let content = self.content.as_mut().ok_or(SurfaceError::NotInitialized)?;
        let pivot = content.raster.center();
        let mut sink = BoundBrush {
            brush: self.brushes.get_mut(self.active),
            target: &mut content.raster,
        };
        self.symmetry.stroke(&mut sink, last, world, pivot);
        self.interaction = Interaction::Drawing { last: world };
        Ok(())
    }

    /// End the current stroke and record it. A partial stroke is kept.
    fn finish_stroke(&mut self) -> SurfaceResult<()> {
        if !matches!(self.interaction, Interaction::Drawing { .. }) {
            return Ok(());
        }
        let content = self.content.as_mut().ok_or(SurfaceError::NotInitialized)?;
        let mut sink = BoundBrush {
            brush: self.brushes.get_mut(self.active),
            target: &mut content.raster,
        };
        self.symmetry.end_stroke(&mut sink);
        let recorded = content.history.record(&content.raster);
        self.interaction = Interaction::Idle;
        log::debug!("Stroke finished (recorded: {recorded})");
        Ok(())
    }

    // Editing

    pub fn clear(&mut self) -> SurfaceResult<()> {
        self.finish_stroke()?;
        let content = self.content_mut()?;
        content.raster.clear();
        content.history.record(&content.raster);
        self.render();
        Ok(())
    }

    /// Returns `false` when there was nothing to undo.
    pub fn undo(&mut self) -> SurfaceResult<bool> {
        self.finish_stroke()?;
        let content = self.content_mut()?;
        let changed = content.history.undo(&mut content.raster);
        if changed {
            self.render();
        }
        Ok(changed)
    }

    /// Returns `false` when there was nothing to redo.
    pub fn redo(&mut self) -> SurfaceResult<bool> {
        self.finish_stroke()?;
        let content = self.content_mut()?;
        let changed = content.history.redo(&mut content.raster);
        if changed {
            self.render();
        }
        Ok(changed)
    }

    /// Switch backgrounds. A baked-in background is converted to
    /// transparency once, using exact color matches.
    pub fn set_background_color(&mut self, color: Rgb) -> SurfaceResult<()> {
        let content = self.content_mut()?;
        if content.baked {
            let raster = std::mem::replace(&mut content.raster, Raster::new(0, 0));
            content.raster = raster::unbake_background(raster, content.background);
            content.baked = false;
            content.history.record(&content.raster);
            log::info!("Unbaked background {}", content.background);
        }
        content.background = color;
        self.render();
        Ok(())
    }

    pub fn set_background_hex(&mut self, hex: &str) -> SurfaceResult<()> {
        let color = Rgb::from_hex(hex)?;
        self.set_background_color(color)
    }

    /// Draw an image into the content, top-left aligned and clipped, and
    /// record it.
    pub fn import_image(&mut self, image: &Raster) -> SurfaceResult<()> {
        self.finish_stroke()?;
        let content = self.content_mut()?;
        content.raster.draw_raster(image, 0, 0, 1.0, CompositeMode::SourceOver);
        content.history.record(&content.raster);
        log::info!("Imported {}x{} image", image.width(), image.height());
        self.render();
        Ok(())
    }

    /// Decode PNG or JPEG bytes and import them.
    pub fn import_bytes(&mut self, bytes: &[u8]) -> SurfaceResult<()> {
        self.require_content()?;
        let image = export::decode_image(bytes)?;
        self.import_image(&image)
    }

    // Brush and tool settings

    pub fn set_active_brush(&mut self, kind: BrushKind) {
        if kind == self.active {
            return;
        }
        if let Err(err) = self.finish_stroke() {
            log::warn!("Could not finish stroke before switching brush: {err}");
        }
        self.active = kind;
        self.render();
    }

    /// Set the size of every brush, clamped to `1..=max_brush_size`.
    pub fn set_brush_size(&mut self, size: f64) {
        if !size.is_finite() {
            return;
        }
        let size = size.clamp(1.0, self.config.max_brush_size.max(1.0));
        for brush in self.brushes.iter_mut() {
            brush.set_size(size);
        }
        self.render();
    }

    /// Set the ink color of every brush.
    pub fn set_brush_color(&mut self, color: Rgb) {
        for brush in self.brushes.iter_mut() {
            brush.set_color(color);
        }
    }

    /// Push settings for one brush.
    pub fn configure_brush(&mut self, kind: BrushKind, settings: BrushSettings) {
        let size = settings.size.clamp(1.0, self.config.max_brush_size.max(1.0));
        let brush = self.brushes.get_mut(kind);
        brush.set_size(size);
        brush.set_color(settings.color);
        if kind == self.active {
            self.render();
        }
    }

    /// Change the axis count. A stroke in progress ends first so each
    /// replica keeps its sector.
    pub fn set_symmetry_axes(&mut self, axes: usize) {
        if let Err(err) = self.finish_stroke() {
            log::warn!("Could not finish stroke before changing symmetry: {err}");
        }
        self.symmetry.set_axes(axes.min(self.config.max_symmetry_axes));
        self.render();
    }

    /// While the color picker is open, presses on the canvas do not draw.
    pub fn set_color_picker_open(&mut self, open: bool) {
        self.color_picker_open = open;
    }

    // Viewport

    pub fn fit_to_view(&mut self) -> SurfaceResult<()> {
        self.require_content()?;
        self.viewport.fit_to_content(self.content_size());
        self.render();
        Ok(())
    }

    /// Adopt new viewport bounds and device pixel ratio. Before
    /// initialization only the bounds are stored.
    pub fn resize(&mut self, bounds: Rect, dpr: f64) {
        self.dpr = sanitize_dpr(dpr);
        if self.content.is_some() {
            self.viewport.on_resize(bounds, self.content_size());
        } else {
            self.viewport = Viewport::new(bounds);
        }
        self.frame = device_frame(bounds, self.dpr);
        self.render();
    }

    // Export

    /// Background composited under the content, fully opaque.
    pub fn export_flattened(&self) -> SurfaceResult<Raster> {
        let content = self.require_content()?;
        Ok(raster::flatten(&content.raster, content.background))
    }

    pub fn encode_jpeg(&self) -> SurfaceResult<Vec<u8>> {
        let flat = self.export_flattened()?;
        Ok(export::encode_jpeg(&flat, self.config.jpeg_quality)?)
    }

    /// Encode and publish, falling back to `fallback` on failure.
    pub async fn save(
        &self,
        primary: &dyn ImageSink,
        fallback: &dyn ImageSink,
        timestamp_ms: u64,
    ) -> SurfaceResult<SaveOutcome> {
        let bytes = self.encode_jpeg()?;
        Ok(export::save_with_fallback(primary, fallback, &bytes, timestamp_ms).await)
    }

    // Rendering

    /// Recomposite the frame: background, content, guides, outline and the
    /// hover ring.
    pub fn render(&mut self) {
        self.frame.clear();
        let Some(content) = &self.content else {
            return;
        };
        let device = Affine::scale(self.dpr) * self.viewport.transform();
        let zoom = self.viewport.scale * self.dpr;
        let area = device.transform_rect_bbox(Rect::from_origin_size(Point::ZERO, content.raster.size()));

        self.frame.fill_rect(area, content.background, 1.0);
        self.frame.draw_raster_transformed(&content.raster, device);

        let guide_width = (0.5 / zoom).max(0.25) * zoom;
        for (from, to) in self.symmetry.guide_rays(content.raster.size()) {
            self.frame.stroke_line(
                device * from,
                device * to,
                guide_width,
                GUIDE_GRAY,
                GUIDE_ALPHA,
                CompositeMode::SourceOver,
            );
        }

        let corners = [
            Point::new(area.x0, area.y0),
            Point::new(area.x1, area.y0),
            Point::new(area.x1, area.y1),
            Point::new(area.x0, area.y1),
        ];
        for i in 0..corners.len() {
            let (a, b) = (corners[i], corners[(i + 1) % corners.len()]);
            self.frame.stroke_line(a, b, 1.0, GUIDE_GRAY, 1.0, CompositeMode::SourceOver);
        }

        if let (Interaction::Idle, Some(hover)) = (self.interaction, self.hover) {
            let local = hover - self.viewport.bounds().origin().to_vec2();
            let center = Point::new(local.x * self.dpr, local.y * self.dpr);
            let radius = self.brushes.get(self.active).preview_radius().max(1.0) * zoom;
            self.frame.stroke_circle(center, radius, 1.0, HOVER_GRAY, HOVER_ALPHA);
        }
    }
}

fn sanitize_dpr(dpr: f64) -> f64 {
    if dpr.is_finite() && dpr > 0.0 { dpr } else { 1.0 }
}

fn device_frame(bounds: Rect, dpr: f64) -> Raster {
    let size = bounds.size() * dpr;
    let dim = |v: f64| if v.is_finite() { v.round().max(1.0) as u32 } else { 1 };
    Raster::new(dim(size.width), dim(size.height))
}
