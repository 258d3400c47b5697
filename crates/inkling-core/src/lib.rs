//! Inkling Core Library
//!
//! Platform-agnostic painting engine: a fixed-resolution content raster,
//! texture brushes, rotational symmetry, a pan/zoom viewport, snapshot
//! history and the drawing surface that ties them to client input.

pub mod brush;
pub mod clock;
pub mod color;
pub mod config;
pub mod export;
pub mod history;
pub mod input;
pub mod radial;
pub mod raster;
pub mod setup;
pub mod surface;
pub mod symmetry;
pub mod viewport;

pub use brush::{Brush, BrushKind, BrushSet, BrushSettings, DEFAULT_BRUSH_SIZE};
pub use clock::{Clock, ManualClock, SystemClock};
pub use color::{ColorError, Rgb};
pub use config::{ConfigError, SurfaceConfig};
pub use export::{ExportError, ImageSink, MemorySink, SaveOutcome};
pub use history::{History, Snapshot};
pub use input::{KeyEvent, Modifiers, MouseButton, PointerEvent, TouchEvent, TouchPhase, WheelEvent};
pub use radial::{RadialMenu, RadialTracker, RadialVia, RingLayout};
pub use raster::{CompositeMode, Raster, RasterError};
pub use setup::{CanvasSetup, SetupError, SetupLimits, SetupMode};
pub use surface::{DrawingSurface, Interaction, KeyOutcome, SurfaceError, SurfaceResult};
pub use symmetry::Symmetry;
pub use viewport::Viewport;

#[cfg(not(target_arch = "wasm32"))]
pub use export::FileSink;
