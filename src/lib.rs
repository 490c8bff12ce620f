//! # docmill
//!
//! Batch-convert page-oriented documents (PDF) into structured Markdown:
//! native text per page plus OCR of embedded raster images, with partial
//! failures tolerated at every granularity and reported alongside the
//! output.
//!
//! ## Why this crate?
//!
//! Real-world document batches are messy: one file is truncated, one page
//! has a broken content stream, one embedded image is a 40 MB TIFF. Most
//! converters abort on the first problem and lose everything else. docmill
//! instead converts everything it can and returns a machine-readable
//! ledger of everything it could not — one artifact or one recorded
//! failure per input, never a silently-dropped document.
//!
//! ## Pipeline Overview
//!
//! ```text
//! documents
//!  │
//!  ├─ 1. Validate  size ceilings before any parsing
//!  ├─ 2. Decode    drain the container via pdfium (blocking, spawn_blocking)
//!  ├─ 3. Pages     strictly in order: native text + embedded images
//!  ├─ 4. Gate      per image: decodable? allowed format? within bounds?
//!  ├─ 5. OCR       isolated call per admitted image, timeout + cleanup
//!  └─ 6. Output    Markdown artifact per document + diagnostic ledger
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use docmill::{process_batch, BatchConfig, RawDocument};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let bytes = std::fs::read("report.pdf")?;
//!     let config = BatchConfig::default(); // no OCR engine: degraded mode
//!     let batch = process_batch(vec![RawDocument::new("report.pdf", bytes)], &config).await;
//!     for outcome in &batch.documents {
//!         match &outcome.result {
//!             Ok(artifact) => println!("{}", artifact.render()),
//!             Err(e) => eprintln!("{}: {}", outcome.name, e),
//!         }
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Failure semantics
//!
//! | Granularity | On failure | Surfaced as |
//! |-------------|-----------|-------------|
//! | Image (gate reject, OCR error) | next image continues | Warning/Error diagnostic |
//! | Page text extraction | page's images skipped | Error diagnostic, empty section |
//! | Page access (container fault) | next page continues | document-scoped Error |
//! | Document open (oversize, corrupt) | next document continues | failed batch outcome |
//! | OCR engine missing at startup | everything else proceeds | every image `Failed` |
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `docmill` binary (clap + anyhow + tracing-subscriber + indicatif) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod cancel;
pub mod config;
pub mod convert;
pub mod decode;
pub mod error;
pub mod ocr;
pub mod output;
pub mod package;
pub mod pipeline;
pub mod progress;
pub mod stream;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use cancel::CancelToken;
pub use config::{BatchConfig, BatchConfigBuilder};
pub use convert::{process_batch, process_document};
pub use decode::{
    DecodeError, DecodedDocument, DecodedPage, DocumentDecoder, ImageAccess, PageAccess,
    PdfiumDecoder,
};
pub use error::{DocmillError, DocumentOpenError, ImageRejection, OcrEngineError, OcrFailure};
pub use ocr::{OcrEngine, VlmOcrEngine};
pub use output::{
    ArtifactStats, BatchResult, Diagnostic, DiagnosticScope, DocumentArtifact, DocumentOutcome,
    ImageOutcome, ImageResult, PageResult, RawDocument, Severity,
};
pub use package::{package_batch, DirPackager, Packager};
pub use progress::{BatchProgress, NoopProgress, ProgressHandle};
pub use stream::{batch_stream, DocumentStream};
