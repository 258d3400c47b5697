//! In-memory image sink.

use super::{BoxFuture, ExportError, ExportResult, ImageSink};
use std::collections::HashMap;
use std::sync::RwLock;

/// In-memory sink for tests and ephemeral use.
#[derive(Default)]
pub struct MemorySink {
    images: RwLock<HashMap<String, Vec<u8>>>,
    failing: bool,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// A sink that rejects every publish.
    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    pub fn get(&self, name: &str) -> Option<Vec<u8>> {
        self.images.read().ok()?.get(name).cloned()
    }

    pub fn names(&self) -> Vec<String> {
        self.images
            .read()
            .map(|images| images.keys().cloned().collect())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.images.read().map(|images| images.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ImageSink for MemorySink {
    fn publish(&self, name: &str, bytes: &[u8]) -> BoxFuture<'_, ExportResult<String>> {
        let name = name.to_string();
        let bytes = bytes.to_vec();
        Box::pin(async move {
            if self.failing {
                return Err(ExportError::Sink(format!("Rejected {name}")));
            }
            let mut images = self
                .images
                .write()
                .map_err(|e| ExportError::Sink(format!("Lock error: {}", e)))?;
            let url = format!("memory://{name}");
            images.insert(name, bytes);
            Ok(url)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::block_on;

    #[test]
    fn test_publish_and_get() {
        let sink = MemorySink::new();
        let url = block_on(sink.publish("a.jpg", &[1, 2, 3])).unwrap();
        assert_eq!(url, "memory://a.jpg");
        assert_eq!(sink.get("a.jpg"), Some(vec![1, 2, 3]));
        assert_eq!(sink.names(), vec!["a.jpg".to_string()]);
    }

    #[test]
    fn test_failing_sink() {
        let sink = MemorySink::failing();
        assert!(matches!(block_on(sink.publish("a.jpg", &[1])), Err(ExportError::Sink(_))));
        assert!(sink.is_empty());
    }
}
