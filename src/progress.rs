//! Progress-callback trait for batch processing events.
//!
//! Inject an [`Arc<dyn BatchProgress>`] via
//! [`crate::config::BatchConfigBuilder::progress`] to receive events as the
//! pipeline works through documents and pages. The trait is deliberately
//! front-end agnostic: implementations can drive a terminal bar, a WebSocket,
//! or a database row without the library knowing which.
//!
//! Within one document, pages are processed strictly in order, so
//! `page_num / total_pages` is a monotonically increasing fraction and
//! `on_page_processed` fires once per page regardless of that page's
//! success. When documents run concurrently, events for different document
//! names interleave; implementations must synchronise shared state.

use std::sync::Arc;

/// Called by the pipeline as documents and pages are processed.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. Implementations must be `Send + Sync`.
pub trait BatchProgress: Send + Sync {
    /// Called once per document after its container was opened, before any
    /// page is processed.
    fn on_document_start(&self, name: &str, total_pages: usize) {
        let _ = (name, total_pages);
    }

    /// Called after each page attempt, successful or not.
    ///
    /// `page_num / total_pages` is the document's completed fraction.
    fn on_page_processed(&self, name: &str, page_num: usize, total_pages: usize) {
        let _ = (name, page_num, total_pages);
    }

    /// Called when a document produced an artifact.
    fn on_document_complete(&self, name: &str, pages_processed: usize) {
        let _ = (name, pages_processed);
    }

    /// Called when a document produced no artifact at all.
    fn on_document_failed(&self, name: &str, reason: &str) {
        let _ = (name, reason);
    }
}

/// No-op implementation used when no callback is configured.
pub struct NoopProgress;

impl BatchProgress for NoopProgress {}

/// Convenience alias matching the type stored in
/// [`crate::config::BatchConfig`].
pub type ProgressHandle = Arc<dyn BatchProgress>;
