//! Cooperative cancellation for batch processing.
//!
//! The token is checked before dispatching each document and before each
//! page within a document. In-flight page and image operations run to
//! completion and release their resources normally — cancellation stops
//! *new* work, it never leaks a transient file or a half-open container.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A cloneable cancellation flag shared between the caller and the batch
/// orchestrator.
///
/// Documents that have not been dispatched when the token fires are reported
/// as [`crate::error::DocumentOpenError::Cancelled`] outcomes, so the
/// one-outcome-per-input invariant holds even for a cancelled batch.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Idempotent; cannot be undone.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}
