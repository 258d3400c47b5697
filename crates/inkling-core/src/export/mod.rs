//! Export and import at the persistence boundary.
//!
//! Saving flattens the content over the background, encodes a JPEG and hands
//! the bytes to an [`ImageSink`]. When publishing fails the bytes go to a
//! fallback sink instead. Neither path touches the raster or history.

mod memory;

#[cfg(not(target_arch = "wasm32"))]
mod file;

pub use memory::MemorySink;

#[cfg(not(target_arch = "wasm32"))]
pub use file::FileSink;

pub use crate::raster::flatten;

use crate::raster::{Raster, RasterError};
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Default JPEG quality for saved drawings.
pub const JPEG_QUALITY: u8 = 95;

/// Export errors.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Encoding failed: {0}")]
    Encode(String),
    #[error("Decoding failed: {0}")]
    Decode(String),
    #[error("Upload failed: {0}")]
    Sink(String),
    #[error("IO error: {0}")]
    Io(String),
    #[error(transparent)]
    Raster(#[from] RasterError),
}

/// Result type for export operations.
pub type ExportResult<T> = Result<T, ExportError>;

/// Boxed future for async operations (compatible with WASM).
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

/// Destination for encoded images. Returns a URL or path for the stored image.
#[cfg(not(target_arch = "wasm32"))]
pub trait ImageSink: Send + Sync {
    fn publish(&self, name: &str, bytes: &[u8]) -> BoxFuture<'_, ExportResult<String>>;
}

/// Destination for encoded images (WASM version without Send + Sync).
#[cfg(target_arch = "wasm32")]
pub trait ImageSink {
    fn publish(&self, name: &str, bytes: &[u8]) -> BoxFuture<'_, ExportResult<String>>;
}

/// Encode an opaque raster as JPEG. Alpha is dropped.
pub fn encode_jpeg(raster: &Raster, quality: u8) -> ExportResult<Vec<u8>> {
    let rgb: Vec<u8> = raster
        .to_straight_rgba()
        .chunks_exact(4)
        .flat_map(|px| [px[0], px[1], px[2]])
        .collect();
    let mut bytes = Vec::new();
    image::codecs::jpeg::JpegEncoder::new_with_quality(&mut bytes, quality.clamp(1, 100))
        .encode(&rgb, raster.width(), raster.height(), image::ExtendedColorType::Rgb8)
        .map_err(|e| ExportError::Encode(e.to_string()))?;
    Ok(bytes)
}

/// Decode any supported image (PNG, JPEG) into a raster.
pub fn decode_image(bytes: &[u8]) -> ExportResult<Raster> {
    let image = image::load_from_memory(bytes)
        .map_err(|e| ExportError::Decode(e.to_string()))?
        .to_rgba8();
    let (width, height) = image.dimensions();
    Ok(Raster::from_straight_rgba(width, height, image.into_raw())?)
}

/// Random object name for a published image.
pub fn create_filename(extension: &str) -> String {
    format!("{}.{}", uuid::Uuid::new_v4(), extension)
}

/// Local download name used when publishing fails.
pub fn fallback_filename(timestamp_ms: u64) -> String {
    format!("drawing-{timestamp_ms}.jpg")
}

/// Where a save ended up.
#[derive(Debug)]
pub enum SaveOutcome {
    Published(String),
    SavedLocally(String),
    Failed(ExportError),
}

/// Publish `bytes`, falling back to a local copy when publishing fails.
pub async fn save_with_fallback(
    primary: &dyn ImageSink,
    fallback: &dyn ImageSink,
    bytes: &[u8],
    timestamp_ms: u64,
) -> SaveOutcome {
    let name = create_filename("jpg");
    match primary.publish(&name, bytes).await {
        Ok(url) => {
            log::info!("Drawing published to {url}");
            SaveOutcome::Published(url)
        }
        Err(err) => {
            log::warn!("Publishing failed ({err}), saving a local copy");
            match fallback.publish(&fallback_filename(timestamp_ms), bytes).await {
                Ok(location) => SaveOutcome::SavedLocally(location),
                Err(err) => {
                    log::error!("Local save failed: {err}");
                    SaveOutcome::Failed(err)
                }
            }
        }
    }
}

#[cfg(test)]
pub(crate) fn block_on<F: std::future::Future>(f: F) -> F::Output {
    use std::task::{Context, Poll, RawWaker, RawWakerVTable, Waker};

    fn dummy_raw_waker() -> RawWaker {
        fn no_op(_: *const ()) {}
        fn clone(_: *const ()) -> RawWaker {
            dummy_raw_waker()
        }
        static VTABLE: RawWakerVTable = RawWakerVTable::new(clone, no_op, no_op, no_op);
        RawWaker::new(std::ptr::null(), &VTABLE)
    }

    let waker = unsafe { Waker::from_raw(dummy_raw_waker()) };
    let mut cx = Context::from_waker(&waker);
    let mut f = std::pin::pin!(f);

    loop {
        if let Poll::Ready(result) = f.as_mut().poll(&mut cx) {
            return result;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Rgb;
    use std::io::Cursor;

    #[test]
    fn test_jpeg_round_trip_dimensions() {
        let raster = Raster::filled(33, 17, Rgb::new(200, 30, 30));
        let bytes = encode_jpeg(&raster, JPEG_QUALITY).unwrap();
        assert_eq!(&bytes[..2], &[0xFF, 0xD8]);
        let decoded = decode_image(&bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (33, 17));
        let px = decoded.pixel(16, 8).unwrap();
        assert_eq!(px[3], 255);
        assert!((px[0] as i32 - 200).abs() < 8);
    }

    #[test]
    fn test_decode_png_with_alpha() {
        let mut image = image::RgbaImage::new(2, 1);
        image.put_pixel(0, 0, image::Rgba([255, 0, 0, 255]));
        image.put_pixel(1, 0, image::Rgba([0, 0, 0, 0]));
        let mut bytes = Cursor::new(Vec::new());
        image.write_to(&mut bytes, image::ImageFormat::Png).unwrap();

        let raster = decode_image(bytes.get_ref()).unwrap();
        assert_eq!(raster.pixel(0, 0), Some([255, 0, 0, 255]));
        assert_eq!(raster.alpha(1, 0), 0);
    }

    #[test]
    fn test_decode_garbage() {
        assert!(matches!(decode_image(b"not an image"), Err(ExportError::Decode(_))));
    }

    #[test]
    fn test_filenames() {
        let a = create_filename("jpg");
        let b = create_filename("jpg");
        assert!(a.ends_with(".jpg"));
        assert_eq!(a.len(), 36 + 4);
        assert_ne!(a, b);
        assert_eq!(fallback_filename(1700000000000), "drawing-1700000000000.jpg");
    }

    #[test]
    fn test_save_publishes() {
        let primary = MemorySink::new();
        let fallback = MemorySink::new();
        let outcome = block_on(save_with_fallback(&primary, &fallback, b"jpeg", 1));
        assert!(matches!(outcome, SaveOutcome::Published(url) if url.starts_with("memory://")));
        assert_eq!(primary.len(), 1);
        assert!(fallback.is_empty());
    }

    #[test]
    fn test_save_falls_back_locally() {
        let primary = MemorySink::failing();
        let fallback = MemorySink::new();
        let outcome = block_on(save_with_fallback(&primary, &fallback, b"jpeg", 42));
        assert!(matches!(outcome, SaveOutcome::SavedLocally(_)));
        assert_eq!(fallback.get("drawing-42.jpg").as_deref(), Some(&b"jpeg"[..]));
    }

    #[test]
    fn test_save_reports_double_failure() {
        let outcome = block_on(save_with_fallback(&MemorySink::failing(), &MemorySink::failing(), b"x", 0));
        assert!(matches!(outcome, SaveOutcome::Failed(ExportError::Sink(_))));
    }
}
