//! Configuration for batch document processing.
//!
//! Every knob lives in one [`BatchConfig`] built via its
//! [`BatchConfigBuilder`], so configs are trivial to share across workers
//! and to diff between runs. The injectable collaborators — container
//! decoder, OCR engine, progress observer, cancellation token — ride in the
//! config too: never hidden globals, so tests substitute deterministic
//! fakes.

use crate::cancel::CancelToken;
use crate::decode::DocumentDecoder;
use crate::error::DocmillError;
use crate::ocr::OcrEngine;
use crate::progress::BatchProgress;
use std::fmt;
use std::sync::Arc;

/// Configuration for one batch call.
///
/// Built via [`BatchConfig::builder()`] or [`BatchConfig::default()`].
///
/// # Example
/// ```rust
/// use docmill::BatchConfig;
///
/// let config = BatchConfig::builder()
///     .max_document_mb(25)
///     .ocr_timeout_secs(15)
///     .concurrency(2)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct BatchConfig {
    /// Document size ceiling in megabytes. Default: 50.
    ///
    /// A pure byte-length gate applied before the container decoder runs;
    /// exceeding it is terminal for that document.
    pub max_document_mb: u64,

    /// Embedded-image size ceiling in megabytes. Default: 10.
    ///
    /// Independent of the document ceiling. An oversize image is skipped
    /// with a Warning, never an error.
    pub max_image_mb: u64,

    /// Page area ceiling in square container units. Default: 1e7.
    ///
    /// Pages above the ceiling still process fully; the pipeline records a
    /// Warning that output quality may suffer.
    pub max_page_area: f64,

    /// Per-call OCR timeout in seconds. Default: 30.
    ///
    /// The OCR call is the only operation expected to block for non-trivial
    /// time. A timeout is treated like any other engine failure: one Error
    /// diagnostic for that image, no global abort.
    pub ocr_timeout_secs: u64,

    /// OCR language profile passed to the engine. Default: "en".
    pub ocr_language: String,

    /// Bound on concurrently-processed documents. Default: 4.
    ///
    /// Documents share no mutable state, so the effective pool is
    /// `min(concurrency, batch size)`. Pages within a document always run
    /// strictly in order.
    pub concurrency: usize,

    /// Container decoder. `None` means the built-in pdfium decoder.
    pub decoder: Option<Arc<dyn DocumentDecoder>>,

    /// Process-wide OCR engine handle, constructed once at startup.
    ///
    /// `None` is the degraded mode: every OCR call fails fast as
    /// unavailable while native text extraction proceeds normally.
    pub ocr_engine: Option<Arc<dyn OcrEngine>>,

    /// Progress observer for document and page events.
    pub progress: Option<Arc<dyn BatchProgress>>,

    /// Cooperative cancellation token.
    pub cancel: Option<CancelToken>,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            max_document_mb: 50,
            max_image_mb: 10,
            max_page_area: 1.0e7,
            ocr_timeout_secs: 30,
            ocr_language: "en".to_string(),
            concurrency: 4,
            decoder: None,
            ocr_engine: None,
            progress: None,
            cancel: None,
        }
    }
}

impl fmt::Debug for BatchConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BatchConfig")
            .field("max_document_mb", &self.max_document_mb)
            .field("max_image_mb", &self.max_image_mb)
            .field("max_page_area", &self.max_page_area)
            .field("ocr_timeout_secs", &self.ocr_timeout_secs)
            .field("ocr_language", &self.ocr_language)
            .field("concurrency", &self.concurrency)
            .field("decoder", &self.decoder.as_ref().map(|_| "<dyn DocumentDecoder>"))
            .field(
                "ocr_engine",
                &self.ocr_engine.as_ref().map(|e| e.name()),
            )
            .field("progress", &self.progress.as_ref().map(|_| "<dyn BatchProgress>"))
            .field("cancel", &self.cancel)
            .finish()
    }
}

impl BatchConfig {
    /// Create a new builder.
    pub fn builder() -> BatchConfigBuilder {
        BatchConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`BatchConfig`].
pub struct BatchConfigBuilder {
    config: BatchConfig,
}

impl BatchConfigBuilder {
    pub fn max_document_mb(mut self, mb: u64) -> Self {
        self.config.max_document_mb = mb;
        self
    }

    pub fn max_image_mb(mut self, mb: u64) -> Self {
        self.config.max_image_mb = mb;
        self
    }

    pub fn max_page_area(mut self, area: f64) -> Self {
        self.config.max_page_area = area;
        self
    }

    pub fn ocr_timeout_secs(mut self, secs: u64) -> Self {
        self.config.ocr_timeout_secs = secs.max(1);
        self
    }

    pub fn ocr_language(mut self, lang: impl Into<String>) -> Self {
        self.config.ocr_language = lang.into();
        self
    }

    pub fn concurrency(mut self, n: usize) -> Self {
        self.config.concurrency = n.max(1);
        self
    }

    pub fn decoder(mut self, decoder: Arc<dyn DocumentDecoder>) -> Self {
        self.config.decoder = Some(decoder);
        self
    }

    pub fn ocr_engine(mut self, engine: Arc<dyn OcrEngine>) -> Self {
        self.config.ocr_engine = Some(engine);
        self
    }

    /// Degraded mode: every OCR call reports the engine as unavailable.
    pub fn without_ocr(mut self) -> Self {
        self.config.ocr_engine = None;
        self
    }

    pub fn progress(mut self, progress: Arc<dyn BatchProgress>) -> Self {
        self.config.progress = Some(progress);
        self
    }

    pub fn cancel_token(mut self, token: CancelToken) -> Self {
        self.config.cancel = Some(token);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<BatchConfig, DocmillError> {
        let c = &self.config;
        if c.max_document_mb == 0 {
            return Err(DocmillError::InvalidConfig(
                "document size ceiling must be ≥ 1 MB".into(),
            ));
        }
        if c.max_image_mb > c.max_document_mb {
            return Err(DocmillError::InvalidConfig(format!(
                "image ceiling ({} MB) exceeds document ceiling ({} MB)",
                c.max_image_mb, c.max_document_mb
            )));
        }
        if !c.max_page_area.is_finite() || c.max_page_area <= 0.0 {
            return Err(DocmillError::InvalidConfig(
                "page area ceiling must be a positive number".into(),
            ));
        }
        Ok(self.config)
    }
}
