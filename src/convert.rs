//! Document and batch processing entry points.
//!
//! [`process_document`] drives one document through the pipeline: size
//! gate, container decode, strictly-ordered page processing, progress
//! reporting, and assembly of the diagnostic ledger. [`process_batch`]
//! applies it to every input with bounded concurrency, converting
//! document-level failures into per-document outcomes so one broken input
//! never costs the rest of the batch.
//!
//! ## Failure propagation
//!
//! Replaces what would otherwise be deeply nested error handling with
//! Result-returning stages composed here: image and page problems come
//! back as diagnostics inside the page results, page-access faults become
//! document-scoped ledger entries, and only a failure to *open* the
//! container escapes as an error — which the batch layer immediately
//! catches into a failed outcome.

use crate::config::BatchConfig;
use crate::decode::{PageAccess, PdfiumDecoder};
use crate::error::DocumentOpenError;
use crate::output::{
    ArtifactStats, BatchResult, Diagnostic, DiagnosticScope, DocumentArtifact, DocumentOutcome,
    ImageOutcome, RawDocument,
};
use crate::pipeline::{page, validate};
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Process one document into a [`DocumentArtifact`].
///
/// # Errors
/// Returns `Err(DocumentOpenError)` only when no page data is accessible:
/// the buffer exceeds the document ceiling (the decoder is never invoked)
/// or the container cannot be opened. Everything past a successful open is
/// recorded as a diagnostic on the artifact, never an error.
pub async fn process_document(
    raw: RawDocument,
    config: &BatchConfig,
) -> Result<DocumentArtifact, DocumentOpenError> {
    let start = Instant::now();
    let name = raw.name;

    // ── Step 1: size gate, before any parsing ────────────────────────────
    validate::validate_document_size(&raw.bytes, config.max_document_mb)?;

    // ── Step 2: drain the container (blocking work off the runtime) ──────
    let decoder = config
        .decoder
        .clone()
        .unwrap_or_else(|| Arc::new(PdfiumDecoder::new()) as Arc<dyn crate::decode::DocumentDecoder>);
    let bytes = raw.bytes;
    let decoded = tokio::task::spawn_blocking(move || decoder.decode(&bytes))
        .await
        .map_err(|e| DocumentOpenError::Corrupt {
            detail: format!("decode task panicked: {e}"),
        })??;

    let total_pages = decoded.pages.len();
    info!("'{}': {} pages", name, total_pages);
    if let Some(ref cb) = config.progress {
        cb.on_document_start(&name, total_pages);
    }

    // ── Step 3: pages strictly in order ──────────────────────────────────
    let mut ledger: Vec<Diagnostic> = Vec::new();
    let mut pages = Vec::with_capacity(total_pages);

    for (idx, access) in decoded.pages.into_iter().enumerate() {
        let page_num = idx + 1;

        if let Some(ref cancel) = config.cancel {
            if cancel.is_cancelled() {
                warn!("'{}': cancelled before page {}", name, page_num);
                ledger.push(Diagnostic::warning(
                    DiagnosticScope::Document,
                    format!("Processing cancelled before page {page_num} of {total_pages}"),
                ));
                break;
            }
        }

        match access {
            PageAccess::Unavailable(detail) => {
                // Container-level page fault: no PageResult, document
                // continues with the next page.
                ledger.push(Diagnostic::error(
                    DiagnosticScope::Document,
                    format!("Failed to process page {page_num}: {detail}"),
                ));
            }
            PageAccess::Available(decoded_page) => {
                let result = page::process_page(decoded_page, page_num, config).await;
                ledger.extend(result.diagnostics.iter().cloned());
                pages.push(result);
            }
        }

        // Fires after every attempt, successful or not: the fraction
        // page_num / total_pages increases monotonically.
        if let Some(ref cb) = config.progress {
            cb.on_page_processed(&name, page_num, total_pages);
        }
    }

    // ── Step 4: assemble stats and the artifact ──────────────────────────
    let mut stats = ArtifactStats {
        total_pages,
        pages_processed: pages.len(),
        duration_ms: start.elapsed().as_millis() as u64,
        ..Default::default()
    };
    for p in &pages {
        for img in &p.images {
            match img.outcome {
                ImageOutcome::Recognized => stats.images_recognized += 1,
                ImageOutcome::NoTextFound => stats.images_no_text += 1,
                ImageOutcome::Rejected => stats.images_rejected += 1,
                ImageOutcome::Failed => stats.images_failed += 1,
            }
        }
    }
    stats.errors = ledger.iter().filter(|d| d.is_error()).count();
    stats.warnings = ledger.len() - stats.errors;

    debug!(
        "'{}': {} pages processed, {} errors, {} warnings, {}ms",
        name, stats.pages_processed, stats.errors, stats.warnings, stats.duration_ms
    );

    Ok(DocumentArtifact {
        name,
        pages,
        diagnostics: ledger,
        stats,
    })
}

/// Process a batch of documents.
///
/// Documents run under a bounded pool of `min(config.concurrency, batch
/// size)` workers; outcomes come back in input order. A document-level
/// failure becomes that document's outcome and never aborts a sibling.
pub async fn process_batch(inputs: Vec<RawDocument>, config: &BatchConfig) -> BatchResult {
    let total = inputs.len();
    let width = config.concurrency.min(total).max(1);
    info!("processing batch of {} document(s), concurrency {}", total, width);

    let documents: Vec<DocumentOutcome> = stream::iter(inputs.into_iter().map(|raw| {
        let config = config.clone();
        async move { process_one(raw, &config).await }
    }))
    .buffered(width)
    .collect()
    .await;

    debug_assert_eq!(documents.len(), total);
    BatchResult { documents }
}

/// One batch slot: cancellation check, document processing, progress
/// notification, outcome construction. Shared by [`process_batch`] and
/// [`crate::stream::batch_stream`].
pub(crate) async fn process_one(raw: RawDocument, config: &BatchConfig) -> DocumentOutcome {
    let name = raw.name.clone();

    if let Some(ref cancel) = config.cancel {
        if cancel.is_cancelled() {
            debug!("'{}': not dispatched, batch cancelled", name);
            return DocumentOutcome {
                name,
                result: Err(DocumentOpenError::Cancelled),
            };
        }
    }

    let result = process_document(raw, config).await;
    match &result {
        Ok(artifact) => {
            if let Some(ref cb) = config.progress {
                cb.on_document_complete(&name, artifact.stats.pages_processed);
            }
        }
        Err(e) => {
            warn!("'{}' failed: {}", name, e);
            if let Some(ref cb) = config.progress {
                cb.on_document_failed(&name, &e.to_string());
            }
        }
    }

    DocumentOutcome { name, result }
}
