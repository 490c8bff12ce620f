//! Document-container decoding boundary.
//!
//! The pipeline talks to containers exclusively through [`DocumentDecoder`],
//! which drains a byte buffer into an owned [`DecodedDocument`] in one
//! blocking pass. Per-page and per-image faults are carried *inside* the
//! decoded model rather than propagated as errors, so a bad page or a bad
//! embedded image never hides the rest of the document from the pipeline.
//!
//! ## Why an eager decode?
//!
//! pdfium objects borrow from the library binding and cannot cross
//! `spawn_blocking` boundaries. Draining the container inside one blocking
//! call returns plain owned data the async pipeline can chew on, and makes
//! resource release trivial: the container is dropped before `decode`
//! returns, on every path.

use crate::error::DocumentOpenError;
use image::DynamicImage;
use pdfium_render::prelude::*;
use std::io::Cursor;
use thiserror::Error;
use tracing::{debug, warn};

/// The container could not be opened or parsed at all.
#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct DecodeError(pub String);

impl From<DecodeError> for DocumentOpenError {
    fn from(e: DecodeError) -> Self {
        DocumentOpenError::Corrupt { detail: e.0 }
    }
}

/// One embedded image as the container exposes it.
#[derive(Debug, Clone)]
pub enum ImageAccess {
    /// Encoded raster bytes (PNG/JPEG/TIFF/...), ready for the gate.
    Bytes(Vec<u8>),
    /// The container failed to surface this image's data.
    Failed(String),
}

/// One page drained from the container.
#[derive(Debug, Clone)]
pub struct DecodedPage {
    /// Page width in container units (points for PDF).
    pub width: f32,
    /// Page height in container units.
    pub height: f32,
    /// Native text, or the extraction failure detail.
    pub text: Result<String, String>,
    /// Embedded images in document enumeration order.
    pub images: Vec<ImageAccess>,
}

/// Access outcome for one page slot.
#[derive(Debug, Clone)]
pub enum PageAccess {
    Available(DecodedPage),
    /// Container-level page fault: the page itself could not be loaded.
    Unavailable(String),
}

/// A fully-drained container. Page count is `pages.len()`.
#[derive(Debug, Clone, Default)]
pub struct DecodedDocument {
    pub pages: Vec<PageAccess>,
}

/// Decodes a page-oriented container from raw bytes.
///
/// Implementations may block; callers wrap `decode` in
/// `tokio::task::spawn_blocking`. Tests substitute scripted fakes.
pub trait DocumentDecoder: Send + Sync {
    fn decode(&self, bytes: &[u8]) -> Result<DecodedDocument, DecodeError>;
}

/// PDF decoder backed by pdfium.
///
/// Binds the pdfium library per call: a local `libpdfium` next to the
/// binary wins, then the system library. Binding is cheap relative to
/// document parsing and keeps the decoder free of shared mutable state.
#[derive(Debug, Default)]
pub struct PdfiumDecoder;

impl PdfiumDecoder {
    pub fn new() -> Self {
        Self
    }

    fn bind() -> Result<Pdfium, DecodeError> {
        let bindings = Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
            .or_else(|_| Pdfium::bind_to_system_library())
            .map_err(|e| DecodeError(format!("failed to bind pdfium library: {e:?}")))?;
        Ok(Pdfium::new(bindings))
    }
}

impl DocumentDecoder for PdfiumDecoder {
    fn decode(&self, bytes: &[u8]) -> Result<DecodedDocument, DecodeError> {
        let pdfium = Self::bind()?;
        let document = pdfium
            .load_pdf_from_byte_slice(bytes, None)
            .map_err(|e| DecodeError(format!("{e:?}")))?;

        let pages = document.pages();
        let total = pages.len() as usize;
        debug!("container opened: {} pages", total);

        let mut out = Vec::with_capacity(total);
        for idx in 0..total {
            match pages.get(idx as u16) {
                Ok(page) => out.push(PageAccess::Available(drain_page(&page, idx))),
                Err(e) => {
                    warn!("page {} unavailable: {:?}", idx + 1, e);
                    out.push(PageAccess::Unavailable(format!("{e:?}")));
                }
            }
        }

        // `document` is dropped here, releasing the container on all paths.
        Ok(DecodedDocument { pages: out })
    }
}

/// Drain one pdfium page into owned data: dimensions, native text, and each
/// embedded raster object re-encoded as PNG bytes.
fn drain_page(page: &PdfPage, idx: usize) -> DecodedPage {
    let width = page.width().value;
    let height = page.height().value;

    let text = page
        .text()
        .map(|t| t.all())
        .map_err(|e| format!("{e:?}"));

    let mut images = Vec::new();
    for object in page.objects().iter() {
        if let PdfPageObject::Image(ref image_object) = object {
            match image_object.get_raw_image() {
                Ok(raster) => match encode_png(&raster) {
                    Ok(bytes) => images.push(ImageAccess::Bytes(bytes)),
                    Err(e) => images.push(ImageAccess::Failed(e)),
                },
                Err(e) => {
                    debug!("page {}: image object unreadable: {:?}", idx + 1, e);
                    images.push(ImageAccess::Failed(format!("{e:?}")));
                }
            }
        }
    }

    DecodedPage {
        width,
        height,
        text,
        images,
    }
}

/// Re-encode an extracted raster as PNG. Lossless, so downstream OCR sees
/// exactly what the container held.
fn encode_png(raster: &DynamicImage) -> Result<Vec<u8>, String> {
    let mut buf = Vec::new();
    raster
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .map_err(|e| format!("png encode failed: {e}"))?;
    Ok(buf)
}
