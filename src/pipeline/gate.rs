//! Image gate: decides per embedded image whether OCR is worth attempting.
//!
//! A rejected image is recorded by the caller as a Warning diagnostic and
//! skipped — never an error, since a skipped image does not compromise the
//! rest of the document, and never an exception that reaches the OCR
//! invoker.

use crate::config::BatchConfig;
use crate::error::ImageRejection;
use image::ImageFormat;
use tracing::debug;

/// Admit or reject one embedded image for OCR.
///
/// Composes the image validator with the configured ceiling; on admission
/// the sniffed format is returned so the invoker can pick a sensible
/// transient-file suffix.
pub fn admit(image_bytes: &[u8], config: &BatchConfig) -> Result<ImageFormat, ImageRejection> {
    match super::validate::validate_image(image_bytes, config.max_image_mb) {
        Ok(format) => {
            debug!("image admitted ({} bytes, {:?})", image_bytes.len(), format);
            Ok(format)
        }
        Err(reason) => {
            debug!("image rejected: {reason}");
            Err(reason)
        }
    }
}
