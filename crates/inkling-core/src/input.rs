//! Input event types delivered to the drawing surface.
//!
//! All positions are client-space (screen) coordinates. The viewport is the
//! only place they are converted into content coordinates.

use kurbo::{Point, Vec2};
use serde::{Deserialize, Serialize};

/// Mouse button identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MouseButton {
    #[default]
    Left,
    Right,
    Middle,
}

/// Modifier keys state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers {
        shift: false,
        ctrl: false,
        alt: false,
        meta: false,
    };

    /// Ctrl on most platforms, Cmd on macOS.
    pub fn command(&self) -> bool {
        self.ctrl || self.meta
    }
}

/// Mouse or pen pointer event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PointerEvent {
    Down {
        position: Point,
        #[serde(default)]
        button: MouseButton,
        #[serde(default)]
        modifiers: Modifiers,
    },
    Move {
        position: Point,
    },
    Up {
        position: Point,
        #[serde(default)]
        button: MouseButton,
    },
    Enter {
        position: Point,
    },
    Leave,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TouchPhase {
    Start,
    Move,
    End,
    Cancel,
}

/// One active touch point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Touch {
    pub id: u64,
    pub position: Point,
}

/// Touch event carrying every touch still on the surface after the event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TouchEvent {
    pub phase: TouchPhase,
    pub touches: Vec<Touch>,
    pub time_ms: f64,
}

impl TouchEvent {
    pub fn new(phase: TouchPhase, positions: &[Point], time_ms: f64) -> Self {
        Self {
            phase,
            touches: positions
                .iter()
                .enumerate()
                .map(|(id, &position)| Touch { id: id as u64, position })
                .collect(),
            time_ms,
        }
    }

    pub fn first(&self) -> Option<Point> {
        self.touches.first().map(|t| t.position)
    }

    pub fn pair(&self) -> Option<(Point, Point)> {
        match self.touches.as_slice() {
            [a, b, ..] => Some((a.position, b.position)),
            _ => None,
        }
    }
}

/// Unit of wheel deltas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeltaMode {
    #[default]
    Pixel,
    Line,
    Page,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WheelEvent {
    pub position: Point,
    pub delta: Vec2,
    #[serde(default)]
    pub mode: DeltaMode,
    #[serde(default)]
    pub modifiers: Modifiers,
}

impl WheelEvent {
    pub fn pixels(position: Point, delta: Vec2) -> Self {
        Self {
            position,
            delta,
            mode: DeltaMode::Pixel,
            modifiers: Modifiers::NONE,
        }
    }

    /// Zooms rather than pans (pinch gestures on trackpads arrive with ctrl).
    pub fn is_zoom(&self) -> bool {
        self.modifiers.command()
    }
}

/// Keyboard event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyEvent {
    /// Physical key code, e.g. `"Space"` or `"KeyZ"`.
    pub code: String,
    /// Logical key, e.g. `" "` or `"z"`.
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub modifiers: Modifiers,
    /// A text input or similar has focus.
    #[serde(default)]
    pub in_text_field: bool,
}

/// Editing shortcuts recognized by the surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shortcut {
    Undo,
    Redo,
    Save,
}

impl KeyEvent {
    pub fn new(code: &str, key: &str, modifiers: Modifiers) -> Self {
        Self {
            code: code.to_string(),
            key: key.to_string(),
            modifiers,
            in_text_field: false,
        }
    }

    pub fn is_space(&self) -> bool {
        self.code == "Space" || self.key == " "
    }

    pub fn shortcut(&self) -> Option<Shortcut> {
        if self.in_text_field || !self.modifiers.command() {
            return None;
        }
        match self.key.to_ascii_lowercase().as_str() {
            "z" if self.modifiers.shift => Some(Shortcut::Redo),
            "z" => Some(Shortcut::Undo),
            "y" => Some(Shortcut::Redo),
            "s" => Some(Shortcut::Save),
            _ => None,
        }
    }
}
