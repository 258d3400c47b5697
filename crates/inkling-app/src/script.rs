//! Replay scripts: a canvas setup plus timed input steps.

use inkling_core::{
    BrushKind, CanvasSetup, DrawingSurface, KeyEvent, KeyOutcome, ManualClock, PointerEvent,
    RadialTracker, Rgb, RingLayout, SetupMode, SurfaceConfig, SurfaceError, TouchEvent, TouchPhase,
    WheelEvent,
};
use kurbo::{Point, Rect};
use serde::{Deserialize, Serialize};
use std::rc::Rc;
use thiserror::Error;

/// Replay errors.
#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("Invalid script: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Cannot read script: {0}")]
    Io(#[from] std::io::Error),
    #[error("Step {step}: {source}")]
    Step { step: usize, source: SurfaceError },
    #[error(transparent)]
    Surface(#[from] SurfaceError),
}

/// Canvas parameters as written in a script. Without a background the
/// configured default is used.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SetupSpec {
    pub width: u32,
    pub height: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background: Option<Rgb>,
    #[serde(default)]
    pub mode: SetupMode,
}

impl SetupSpec {
    pub fn resolve(&self, config: &SurfaceConfig) -> CanvasSetup {
        CanvasSetup::new(self.width, self.height, self.background.unwrap_or(config.background))
            .with_mode(self.mode)
    }
}

/// Size of the simulated viewport element, in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewportSpec {
    pub width: f64,
    pub height: f64,
    pub dpr: f64,
}

impl Default for ViewportSpec {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 600.0,
            dpr: 1.0,
        }
    }
}

impl ViewportSpec {
    fn bounds(&self) -> Rect {
        Rect::new(0.0, 0.0, self.width, self.height)
    }
}

/// One input or editing action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    Pointer(PointerEvent),
    Touch {
        phase: TouchPhase,
        #[serde(default)]
        points: Vec<Point>,
    },
    Wheel(WheelEvent),
    KeyDown(KeyEvent),
    KeyUp(KeyEvent),
    Brush { brush: BrushKind },
    Size { size: f64 },
    Color { color: Rgb },
    ColorPicker { open: bool },
    Symmetry { axes: usize },
    Background { color: Rgb },
    Clear,
    Undo,
    Redo,
    Fit,
    Resize {
        width: f64,
        height: f64,
        #[serde(default = "one")]
        dpr: f64,
    },
}

fn one() -> f64 {
    1.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    /// Time of the step in milliseconds since the start of the replay.
    #[serde(default)]
    pub at_ms: f64,
    pub event: Action,
}

/// A complete replay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Script {
    pub setup: SetupSpec,
    #[serde(default)]
    pub viewport: ViewportSpec,
    #[serde(default)]
    pub config: SurfaceConfig,
    #[serde(default)]
    pub steps: Vec<Step>,
}

impl Script {
    pub fn from_json(json: &str) -> Result<Self, ReplayError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self, ReplayError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }
}

/// A replayed surface and what the script asked of the host.
#[derive(Debug)]
pub struct Session {
    pub surface: DrawingSurface,
    pub clock: ManualClock,
    /// Number of save shortcuts pressed.
    pub save_requests: usize,
}

/// Drive a fresh surface through every step. Pending long presses fire
/// when the clock passes their deadline, before the next step runs.
pub fn replay(script: &Script) -> Result<Session, ReplayError> {
    let clock = ManualClock::new(0.0);
    let mut surface = DrawingSurface::with_clock(
        script.config.clone(),
        script.viewport.bounds(),
        script.viewport.dpr,
        Rc::new(clock.clone()),
    )
    .with_radial_menu(Box::new(RadialTracker::with_layout(RingLayout::default())));
    surface.initialize(script.setup.resolve(&script.config))?;

    let mut session = Session {
        surface,
        clock,
        save_requests: 0,
    };
    let mut now = 0.0_f64;
    for (index, step) in script.steps.iter().enumerate() {
        now = now.max(step.at_ms);
        session.clock.set(now);
        apply(&mut session, &step.event, now).map_err(|source| ReplayError::Step { step: index, source })?;
    }
    log::info!("Replayed {} steps", script.steps.len());
    Ok(session)
}

fn apply(session: &mut Session, action: &Action, now: f64) -> Result<(), SurfaceError> {
    let surface = &mut session.surface;
    surface.poll_long_press(now)?;
    match action {
        Action::Pointer(event) => surface.pointer(event)?,
        Action::Touch { phase, points } => surface.touch(&TouchEvent::new(*phase, points, now))?,
        Action::Wheel(event) => surface.wheel(event)?,
        Action::KeyDown(event) => {
            if surface.key_down(event)? == KeyOutcome::SaveRequested {
                session.save_requests += 1;
            }
        }
        Action::KeyUp(event) => {
            surface.key_up(event)?;
        }
        Action::Brush { brush } => surface.set_active_brush(*brush),
        Action::Size { size } => surface.set_brush_size(*size),
        Action::Color { color } => surface.set_brush_color(*color),
        Action::ColorPicker { open } => surface.set_color_picker_open(*open),
        Action::Symmetry { axes } => surface.set_symmetry_axes(*axes),
        Action::Background { color } => surface.set_background_color(*color)?,
        Action::Clear => surface.clear()?,
        Action::Undo => {
            surface.undo()?;
        }
        Action::Redo => {
            surface.redo()?;
        }
        Action::Fit => surface.fit_to_view()?,
        Action::Resize { width, height, dpr } => surface.resize(Rect::new(0.0, 0.0, *width, *height), *dpr),
    }
    Ok(())
}
