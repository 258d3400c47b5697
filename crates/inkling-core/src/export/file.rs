//! Directory-backed image sink for native platforms.

use super::{BoxFuture, ExportError, ExportResult, ImageSink};
use std::fs;
use std::path::PathBuf;

/// Writes each published image as a file in `base_path`.
pub struct FileSink {
    base_path: PathBuf,
}

impl FileSink {
    /// Creates the directory if it doesn't exist.
    pub fn new(base_path: PathBuf) -> ExportResult<Self> {
        if !base_path.exists() {
            fs::create_dir_all(&base_path).map_err(|e| {
                ExportError::Io(format!("Failed to create output directory: {}", e))
            })?;
        }
        Ok(Self { base_path })
    }

    fn image_path(&self, name: &str) -> PathBuf {
        let safe: String = name
            .chars()
            .map(|c| if c.is_alphanumeric() || matches!(c, '-' | '_' | '.') { c } else { '_' })
            .collect();
        self.base_path.join(safe)
    }

    pub fn base_path(&self) -> &PathBuf {
        &self.base_path
    }
}

impl ImageSink for FileSink {
    fn publish(&self, name: &str, bytes: &[u8]) -> BoxFuture<'_, ExportResult<String>> {
        let path = self.image_path(name);
        let bytes = bytes.to_vec();
        Box::pin(async move {
            fs::write(&path, bytes).map_err(|e| {
                ExportError::Io(format!("Failed to write {}: {}", path.display(), e))
            })?;
            Ok(path.display().to_string())
        })
    }
}
