//! Pre-flight validation: size ceilings and image-header sniffing.
//!
//! These checks are pure functions of the input bytes and the configured
//! limits — no side effects, safe to call repeatedly. They run *before*
//! expensive work (container parsing, OCR) so a hopeless input is refused
//! for the cost of a length comparison or a header decode.

use crate::error::{DocumentOpenError, ImageRejection};
use image::{ImageFormat, ImageReader};
use std::io::Cursor;

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

fn size_mb(bytes: &[u8]) -> f64 {
    bytes.len() as f64 / BYTES_PER_MB
}

/// Check a raw document buffer against the document ceiling.
///
/// Failure is terminal for the document: no page data will be accessed.
pub fn validate_document_size(bytes: &[u8], limit_mb: u64) -> Result<(), DocumentOpenError> {
    let size = size_mb(bytes);
    if size > limit_mb as f64 {
        return Err(DocumentOpenError::SizeExceeded {
            size_mb: size,
            limit_mb,
        });
    }
    Ok(())
}

/// Check one embedded image: size ceiling, decodable header, and format
/// within the allow-set {PNG, JPEG, TIFF}.
///
/// Any decode failure yields a rejection, never a panic or a propagated
/// decoder error.
pub fn validate_image(bytes: &[u8], limit_mb: u64) -> Result<ImageFormat, ImageRejection> {
    let size = size_mb(bytes);
    if size > limit_mb as f64 {
        return Err(ImageRejection::TooLarge {
            size_mb: size,
            limit_mb,
        });
    }

    let reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|_| ImageRejection::Undecodable)?;
    let format = reader.format().ok_or(ImageRejection::Undecodable)?;
    if !matches!(
        format,
        ImageFormat::Png | ImageFormat::Jpeg | ImageFormat::Tiff
    ) {
        return Err(ImageRejection::DisallowedFormat {
            format: format!("{format:?}"),
        });
    }
    // Decode the header proper, not just the magic bytes.
    reader
        .into_dimensions()
        .map_err(|_| ImageRejection::Undecodable)?;
    Ok(format)
}
