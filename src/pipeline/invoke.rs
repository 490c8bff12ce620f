//! OCR invocation with isolation and guaranteed cleanup.
//!
//! External recognizers take a file path, so every call crosses a
//! write-then-read boundary: the image bytes go to a transient file, the
//! engine reads it back, and the file must disappear afterwards no matter
//! what happened in between. `tempfile::NamedTempFile` gives us that as
//! RAII — the file is unlinked on drop on every exit path, including
//! engine failure, timeout, and task cancellation.

use crate::config::BatchConfig;
use crate::error::OcrFailure;
use crate::ocr::OcrEngine;
use image::ImageFormat;
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, warn};

/// Run one isolated OCR call over encoded image bytes.
///
/// * No engine handle → fail fast with [`OcrFailure::Unavailable`],
///   without touching the filesystem.
/// * `Ok(vec![])` is a valid result: the engine ran and found no text.
/// * A single attempt per image; timeouts and engine errors are returned
///   for the caller to record, never retried here.
pub async fn recognize(
    engine: Option<&Arc<dyn OcrEngine>>,
    image_bytes: &[u8],
    format: ImageFormat,
    config: &BatchConfig,
) -> Result<Vec<String>, OcrFailure> {
    let Some(engine) = engine else {
        return Err(OcrFailure::Unavailable);
    };

    // The gate already sniffed the bytes; its verdict picks the suffix.
    let suffix = match format {
        ImageFormat::Jpeg => ".jpg",
        ImageFormat::Tiff => ".tiff",
        _ => ".png",
    };
    let mut transient = tempfile::Builder::new()
        .prefix("docmill-ocr-")
        .suffix(suffix)
        .tempfile()
        .map_err(|e| OcrFailure::Engine(format!("transient file: {e}")))?;
    transient
        .write_all(image_bytes)
        .and_then(|_| transient.flush())
        .map_err(|e| OcrFailure::Engine(format!("transient write: {e}")))?;

    let secs = config.ocr_timeout_secs;
    debug!(
        "invoking OCR engine '{}' ({} bytes, timeout {}s)",
        engine.name(),
        image_bytes.len(),
        secs
    );

    let result = match timeout(Duration::from_secs(secs), engine.recognize(transient.path())).await
    {
        Err(_elapsed) => {
            warn!("OCR call exceeded {}s timeout", secs);
            Err(OcrFailure::Timeout { secs })
        }
        Ok(Err(e)) => Err(OcrFailure::Engine(e.to_string())),
        Ok(Ok(lines)) => Ok(lines),
    };

    // `transient` drops here: the file is removed on success, empty result,
    // failure, and timeout alike.
    result
}
