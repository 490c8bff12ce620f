//! Error types for the docmill library.
//!
//! The taxonomy mirrors the granularity of the pipeline itself:
//!
//! * [`DocmillError`] — **Fatal**: configuration or output-side failures that
//!   mean a call cannot proceed at all. Returned as `Err` from entry points.
//!
//! * [`DocumentOpenError`] — **Terminal for one document**: the container was
//!   oversize or unreadable, so no page data is accessible. Becomes a failed
//!   outcome inside [`crate::output::BatchResult`]; sibling documents are
//!   unaffected.
//!
//! * [`ImageRejection`] / [`OcrFailure`] — **Per-image**: recovered locally
//!   into [`crate::output::Diagnostic`] entries and never propagated upward
//!   as aborts.
//!
//! There is no system-fatal class: an OCR engine that failed to initialise
//! degrades every recognition call to [`OcrFailure::Unavailable`] rather than
//! halting processing.

use std::path::PathBuf;
use thiserror::Error;

/// Fatal errors returned by docmill entry points.
///
/// Per-document and per-image failures are carried inside
/// [`crate::output::BatchResult`] instead.
#[derive(Debug, Error)]
pub enum DocmillError {
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Could not create or write an output artifact file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A document that never produced an artifact.
///
/// Raised before any page data is accessible; everything after a successful
/// open is a [`crate::output::Diagnostic`], not an error.
#[derive(Debug, Clone, Error, serde::Serialize, serde::Deserialize)]
pub enum DocumentOpenError {
    /// The raw buffer exceeds the configured document ceiling.
    /// The container decoder is never invoked in this case.
    #[error("document too large ({size_mb:.1}MB, limit {limit_mb}MB)")]
    SizeExceeded { size_mb: f64, limit_mb: u64 },

    /// The container could not be opened or parsed.
    #[error("failed to open document: {detail}")]
    Corrupt { detail: String },

    /// The batch was cancelled before this document was dispatched.
    #[error("processing cancelled before this document was attempted")]
    Cancelled,
}

/// Why the image gate refused to send an image to OCR.
///
/// A rejection is always recorded as a Warning diagnostic — a skipped image
/// never compromises the rest of the document.
#[derive(Debug, Clone, Error, serde::Serialize, serde::Deserialize)]
pub enum ImageRejection {
    /// Encoded image bytes exceed the configured image ceiling.
    #[error("image too large ({size_mb:.1}MB, limit {limit_mb}MB)")]
    TooLarge { size_mb: f64, limit_mb: u64 },

    /// The image header could not be decoded at all.
    #[error("invalid or corrupted image data")]
    Undecodable,

    /// The header decoded but the format is outside the allow-set
    /// (PNG, JPEG, TIFF).
    #[error("unsupported image format {format}")]
    DisallowedFormat { format: String },
}

/// Error reported by an [`crate::ocr::OcrEngine`] implementation.
///
/// Engines reduce their backend-specific failures to a message; the invoker
/// wraps it into [`OcrFailure::Engine`].
#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct OcrEngineError(pub String);

/// Outcome of a single failed OCR invocation.
///
/// Never aborts sibling images; the page processor maps each variant to an
/// `ImageResult` with outcome `Failed` plus an Error diagnostic.
#[derive(Debug, Clone, Error)]
pub enum OcrFailure {
    /// No engine handle was available (initialisation failed at startup).
    /// The invoker fails fast without touching the filesystem.
    #[error("OCR engine not initialized")]
    Unavailable,

    /// The engine call exceeded the configured per-call timeout.
    #[error("OCR call timed out after {secs}s")]
    Timeout { secs: u64 },

    /// The engine call itself failed.
    #[error("{0}")]
    Engine(String),
}
