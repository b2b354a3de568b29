//! Image processor - dimension probing for evidence images

use bytes::Bytes;
use image::ImageReader;
use std::io::Cursor;
use vigil_core::Dimensions;

pub struct ImageProcessor;

impl ImageProcessor {
    /// Read pixel dimensions from the image header without a full decode.
    ///
    /// Returns `None` for content the decoder cannot identify; the file stays
    /// acceptable and its resolution is reported as unknown.
    pub fn probe_dimensions(data: &[u8]) -> Option<Dimensions> {
        let reader = ImageReader::new(Cursor::new(data))
            .with_guessed_format()
            .ok()?;
        match reader.into_dimensions() {
            Ok((width, height)) => Some(Dimensions { width, height }),
            Err(e) => {
                tracing::debug!(error = %e, "Could not determine image dimensions");
                None
            }
        }
    }

    /// Probe dimensions on the blocking pool
    pub async fn probe_dimensions_blocking(data: Bytes) -> Option<Dimensions> {
        match tokio::task::spawn_blocking(move || Self::probe_dimensions(&data)).await {
            Ok(dimensions) => dimensions,
            Err(e) => {
                tracing::warn!(error = %e, "Dimension probe task failed");
                None
            }
        }
    }
}
