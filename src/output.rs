//! Output data model: per-image and per-page results, diagnostics,
//! document artifacts, and batch outcomes.
//!
//! Diagnostics flow *upward* through this model as accumulated lists, never
//! as errors that abort a sibling unit of work. Everything here is plain
//! serialisable data; rendering to Markdown lives in
//! [`crate::pipeline::render`].

use crate::error::DocumentOpenError;
use serde::{Deserialize, Serialize};

/// One caller-supplied input document: an opaque byte buffer plus the
/// display name it was uploaded under. Not retained after processing.
#[derive(Debug, Clone)]
pub struct RawDocument {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl RawDocument {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }
}

/// Diagnostic severity.
///
/// Warnings describe skipped or degraded work (rejected image, empty OCR
/// result); Errors describe work that was attempted and failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    Warning,
    Error,
}

/// Where in the document a diagnostic applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiagnosticScope {
    /// The document as a whole (open failures, page-access faults).
    Document,
    /// One page, 1-indexed.
    Page(usize),
    /// One embedded image, both indices 1-based.
    Image { page: usize, image: usize },
}

/// A recorded, recoverable problem.
///
/// Collection is append-only: a diagnostic never causes already-produced
/// text from sibling pages or images to be discarded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub scope: DiagnosticScope,
    pub message: String,
}

impl Diagnostic {
    pub fn warning(scope: DiagnosticScope, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            scope,
            message: message.into(),
        }
    }

    pub fn error(scope: DiagnosticScope, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            scope,
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

/// What happened to one embedded image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImageOutcome {
    /// OCR produced at least one line of text.
    Recognized,
    /// OCR ran successfully but found no text (Warning, not an error).
    NoTextFound,
    /// The image gate refused the image; OCR was never invoked.
    Rejected,
    /// OCR was attempted and failed (engine error, timeout, or no engine).
    Failed,
}

/// Result for one embedded image.
///
/// Holds only recognized text — raster bytes are transient and do not
/// outlive the OCR call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageResult {
    /// 1-based position within the page's image enumeration order.
    pub index: usize,
    /// Recognized lines joined by single spaces; empty unless `Recognized`.
    pub text: String,
    pub outcome: ImageOutcome,
}

/// Fully-processed result for one page. Immutable once returned by the
/// page processor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageResult {
    /// 1-based page number.
    pub page_num: usize,
    /// Extracted native text; empty when extraction failed.
    pub text: String,
    /// Image results in original enumeration order.
    pub images: Vec<ImageResult>,
    /// Diagnostics raised while processing this page, in collection order.
    pub diagnostics: Vec<Diagnostic>,
}

/// Counters for one converted document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ArtifactStats {
    /// Pages the container reported.
    pub total_pages: usize,
    /// Pages that produced a [`PageResult`].
    pub pages_processed: usize,
    pub images_recognized: usize,
    pub images_no_text: usize,
    pub images_rejected: usize,
    pub images_failed: usize,
    pub errors: usize,
    pub warnings: usize,
    pub duration_ms: u64,
}

/// The structured output for one successfully-opened document.
///
/// The rendered Markdown blob is derived deterministically from this
/// structure by [`DocumentArtifact::render`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentArtifact {
    /// Original display name of the input document.
    pub name: String,
    /// Page results in page order.
    pub pages: Vec<PageResult>,
    /// The full diagnostic ledger for the document — every diagnostic of
    /// every scope, in collection (processing) order. Page-scoped entries
    /// also appear in their page's own `diagnostics` list.
    pub diagnostics: Vec<Diagnostic>,
    pub stats: ArtifactStats,
}

impl DocumentArtifact {
    /// Render the artifact to its Markdown representation.
    ///
    /// Deterministic and idempotent: rendering the same artifact twice
    /// produces byte-identical output.
    pub fn render(&self) -> String {
        crate::pipeline::render::render_artifact(self)
    }

    /// True if any Error-severity diagnostic was collected.
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }
}

/// One entry of a batch: the input name plus either its artifact or the
/// reason no artifact could be produced.
#[derive(Debug, Clone)]
pub struct DocumentOutcome {
    pub name: String,
    pub result: Result<DocumentArtifact, DocumentOpenError>,
}

impl DocumentOutcome {
    pub fn artifact(&self) -> Option<&DocumentArtifact> {
        self.result.as_ref().ok()
    }
}

/// Result of one batch call: exactly one outcome per input document, in
/// input order. No document is silently dropped.
#[derive(Debug, Clone, Default)]
pub struct BatchResult {
    pub documents: Vec<DocumentOutcome>,
}

impl BatchResult {
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Documents that produced an artifact, as `(name, artifact)` pairs in
    /// input order.
    pub fn artifacts(&self) -> impl Iterator<Item = (&str, &DocumentArtifact)> {
        self.documents
            .iter()
            .filter_map(|d| d.result.as_ref().ok().map(|a| (d.name.as_str(), a)))
    }

    /// Outcomes that never produced an artifact, in input order.
    pub fn failures(&self) -> impl Iterator<Item = (&str, &DocumentOpenError)> {
        self.documents
            .iter()
            .filter_map(|d| d.result.as_ref().err().map(|e| (d.name.as_str(), e)))
    }
}
