//! Inkling Application
//!
//! Headless shell that replays input scripts against the drawing surface
//! and saves the result as a JPEG.

mod script;

pub use script::{replay, Action, ReplayError, Script, Session, SetupSpec, Step, ViewportSpec};

#[cfg(not(target_arch = "wasm32"))]
use inkling_core::{DrawingSurface, FileSink, SaveOutcome};

/// Save the flattened drawing into `dir` under a random name, falling back to
/// `drawing-<timestamp_ms>.jpg` in the same directory.
#[cfg(not(target_arch = "wasm32"))]
pub async fn save_to_dir(
    surface: &DrawingSurface,
    dir: &std::path::Path,
    timestamp_ms: u64,
) -> Result<SaveOutcome, ReplayError> {
    let sink = FileSink::new(dir.to_path_buf()).map_err(inkling_core::SurfaceError::from)?;
    Ok(surface.save(&sink, &sink, timestamp_ms).await?)
}
