//! Undo/redo over whole-raster snapshots.
//!
//! The top of the undo stack always mirrors the raster right after the last
//! committed action, so undo needs at least two entries.

use crate::raster::{Raster, RasterError};
use std::collections::VecDeque;
use std::sync::Arc;

/// Default number of snapshots kept.
pub const DEFAULT_HISTORY_CAPACITY: usize = 50;

/// Immutable copy of a raster's pixels.
#[derive(Clone, PartialEq, Eq)]
pub struct Snapshot {
    width: u32,
    height: u32,
    pixels: Arc<[u8]>,
}

impl std::fmt::Debug for Snapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Snapshot")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.pixels.len())
            .finish()
    }
}

impl Snapshot {
    pub fn new(width: u32, height: u32, pixels: impl Into<Arc<[u8]>>) -> Self {
        Self {
            width,
            height,
            pixels: pixels.into(),
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Full pixel comparison.
    pub fn same_content(&self, other: &Snapshot) -> bool {
        self.width == other.width && self.height == other.height && self.pixels == other.pixels
    }
}

/// A surface whose pixels can be captured and restored.
pub trait PixelSource {
    /// Direct pixel read-back.
    fn read_pixels(&self) -> Result<Snapshot, RasterError>;

    /// Fallback: duplicate the whole buffer first, then read the copy.
    fn copy_buffer(&self) -> Result<Snapshot, RasterError>;

    fn restore(&mut self, snapshot: &Snapshot) -> Result<(), RasterError>;
}

impl PixelSource for Raster {
    fn read_pixels(&self) -> Result<Snapshot, RasterError> {
        Ok(Snapshot::new(self.width(), self.height(), self.data()))
    }

    fn copy_buffer(&self) -> Result<Snapshot, RasterError> {
        let copy = self.clone();
        Ok(Snapshot::new(copy.width(), copy.height(), copy.data()))
    }

    fn restore(&mut self, snapshot: &Snapshot) -> Result<(), RasterError> {
        if snapshot.width != self.width() || snapshot.height != self.height() {
            return Err(RasterError::DimensionMismatch {
                expected_width: self.width(),
                expected_height: self.height(),
                width: snapshot.width,
                height: snapshot.height,
            });
        }
        self.copy_from(&snapshot.pixels)
    }
}

/// Capture `source`, falling back to a buffer copy when read-back fails.
/// Returns `None` when both strategies fail.
pub fn capture_snapshot(source: &impl PixelSource) -> Option<Snapshot> {
    match source.read_pixels() {
        Ok(snapshot) => Some(snapshot),
        Err(err) => {
            log::warn!("Snapshot read-back failed ({err}), copying buffer instead");
            match source.copy_buffer() {
                Ok(snapshot) => Some(snapshot),
                Err(err) => {
                    log::warn!("Snapshot skipped: {err}");
                    None
                }
            }
        }
    }
}

/// Bounded undo stack plus redo stack.
#[derive(Debug, Clone)]
pub struct History {
    undo: VecDeque<Snapshot>,
    redo: Vec<Snapshot>,
    capacity: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}

impl History {
    /// Capacity is at least 2 so one undo step is always possible.
    pub fn new(capacity: usize) -> Self {
        Self {
            undo: VecDeque::new(),
            redo: Vec::new(),
            capacity: capacity.max(2),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn undo_len(&self) -> usize {
        self.undo.len()
    }

    pub fn redo_len(&self) -> usize {
        self.redo.len()
    }

    pub fn can_undo(&self) -> bool {
        self.undo.len() >= 2
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    pub fn top(&self) -> Option<&Snapshot> {
        self.undo.back()
    }

    /// Record a committed action. Identical to the top: nothing happens and
    /// `false` is returned. Otherwise redo is cleared.
    pub fn push(&mut self, snapshot: Snapshot) -> bool {
        if self.top().is_some_and(|top| top.same_content(&snapshot)) {
            return false;
        }
        self.redo.clear();
        self.push_undo(snapshot);
        true
    }

    /// Capture `source` and push it.
    pub fn record(&mut self, source: &impl PixelSource) -> bool {
        capture_snapshot(source).is_some_and(|snapshot| self.push(snapshot))
    }

    fn push_undo(&mut self, snapshot: Snapshot) {
        self.undo.push_back(snapshot);
        while self.undo.len() > self.capacity {
            self.undo.pop_front();
        }
    }

    /// Step back one action. Returns `false` when there is nothing to undo.
    pub fn undo(&mut self, target: &mut impl PixelSource) -> bool {
        if !self.can_undo() {
            return false;
        }
        let Some(current) = self.undo.pop_back() else {
            return false;
        };
        let restored = match self.undo.back() {
            Some(previous) => target.restore(previous),
            None => Ok(()),
        };
        if let Err(err) = restored {
            log::warn!("Undo failed to restore snapshot: {err}");
            self.undo.push_back(current);
            return false;
        }
        self.redo.push(current);
        true
    }

    /// Re-apply the last undone action. Returns `false` when redo is empty.
    pub fn redo(&mut self, target: &mut impl PixelSource) -> bool {
        let Some(next) = self.redo.pop() else {
            return false;
        };
        if let Err(err) = target.restore(&next) {
            log::warn!("Redo failed to restore snapshot: {err}");
            self.redo.push(next);
            return false;
        }
        self.push_undo(next);
        true
    }

    /// Forget everything and start over from `baseline`.
    pub fn reset(&mut self, baseline: Option<Snapshot>) {
        self.undo.clear();
        self.redo.clear();
        self.undo.extend(baseline);
    }
}
