//! Streaming batch API: emit document outcomes as they complete.
//!
//! Large batches take minutes when OCR is involved. The eager
//! [`crate::convert::process_batch`] returns only after every document
//! finishes; [`batch_stream`] instead yields each [`DocumentOutcome`] as
//! soon as its document is done, so callers can package or display
//! artifacts incrementally. Outcomes arrive in input order (`buffered`
//! preserves it) even though up to `concurrency` documents run at once.

use crate::config::BatchConfig;
use crate::convert::process_one;
use crate::output::{DocumentOutcome, RawDocument};
use futures::stream::{self, StreamExt};
use std::pin::Pin;
use tokio_stream::Stream;
use tracing::info;

/// A boxed stream of per-document outcomes.
pub type DocumentStream = Pin<Box<dyn Stream<Item = DocumentOutcome> + Send>>;

/// Process a batch, yielding one outcome per input document in input order.
///
/// The cancellation and progress behaviour is identical to
/// [`crate::convert::process_batch`]; this is the same pipeline behind a
/// streaming surface.
pub fn batch_stream(inputs: Vec<RawDocument>, config: &BatchConfig) -> DocumentStream {
    let total = inputs.len();
    let width = config.concurrency.min(total).max(1);
    info!(
        "streaming batch of {} document(s), concurrency {}",
        total, width
    );

    let config = config.clone();
    let s = stream::iter(inputs.into_iter().map(move |raw| {
        let config = config.clone();
        async move { process_one(raw, &config).await }
    }))
    .buffered(width);

    Box::pin(s)
}
