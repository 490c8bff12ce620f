//! End-to-end pipeline tests for docmill.
//!
//! These drive `process_batch` through scripted decoder and OCR fakes so
//! the whole flow — size gate, container decode, page loop, image gate,
//! OCR dispatch, rendering, packaging — runs without pdfium or a live
//! vision API. Every test is hermetic and runs in CI.

use async_trait::async_trait;
use docmill::{
    package_batch, process_batch, BatchConfig, BatchProgress, CancelToken, DecodedDocument,
    DecodedPage, DirPackager, DocumentDecoder, DocumentOpenError, ImageAccess, OcrEngine,
    OcrEngineError, PageAccess, RawDocument,
};
use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use std::collections::HashMap;
use std::io::Cursor;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

// ── Scripted collaborators ───────────────────────────────────────────────────

/// Decoder that replays a canned result per input byte string and counts
/// how often it was consulted.
struct ScriptedDecoder {
    script: HashMap<Vec<u8>, Result<DecodedDocument, String>>,
    calls: AtomicUsize,
}

impl ScriptedDecoder {
    fn new() -> Self {
        Self {
            script: HashMap::new(),
            calls: AtomicUsize::new(0),
        }
    }

    fn on(mut self, bytes: &[u8], result: Result<DecodedDocument, &str>) -> Self {
        self.script
            .insert(bytes.to_vec(), result.map_err(String::from));
        self
    }
}

impl DocumentDecoder for ScriptedDecoder {
    fn decode(&self, bytes: &[u8]) -> Result<DecodedDocument, docmill::DecodeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.script.get(bytes) {
            Some(Ok(doc)) => Ok(doc.clone()),
            Some(Err(detail)) => Err(docmill::DecodeError(detail.clone())),
            None => panic!("decoder saw unscripted input of {} bytes", bytes.len()),
        }
    }
}

/// OCR engine that answers based on the bytes it finds at the temp path.
/// Unscripted images come back as "no text". Counts invocations.
struct ScriptedEngine {
    script: HashMap<Vec<u8>, Result<Vec<String>, String>>,
    calls: AtomicUsize,
}

impl ScriptedEngine {
    fn new() -> Self {
        Self {
            script: HashMap::new(),
            calls: AtomicUsize::new(0),
        }
    }

    fn on(mut self, image: &[u8], result: Result<&[&str], &str>) -> Self {
        self.script.insert(
            image.to_vec(),
            result
                .map(|lines| lines.iter().map(|s| s.to_string()).collect())
                .map_err(String::from),
        );
        self
    }
}

#[async_trait]
impl OcrEngine for ScriptedEngine {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn recognize(&self, path: &Path) -> Result<Vec<String>, OcrEngineError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let bytes = std::fs::read(path).map_err(|e| OcrEngineError(e.to_string()))?;
        match self.script.get(&bytes) {
            Some(Ok(lines)) => Ok(lines.clone()),
            Some(Err(detail)) => Err(OcrEngineError(detail.clone())),
            None => Ok(Vec::new()),
        }
    }
}

// ── Fixture helpers ──────────────────────────────────────────────────────────

/// A small valid PNG whose bytes are unique per fill colour.
fn png(color: [u8; 4]) -> Vec<u8> {
    let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(3, 3, Rgba(color)));
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .expect("png encode");
    buf
}

fn text_page(text: &str, images: Vec<ImageAccess>) -> PageAccess {
    PageAccess::Available(DecodedPage {
        width: 612.0,
        height: 792.0,
        text: Ok(text.to_string()),
        images,
    })
}

fn doc(pages: Vec<PageAccess>) -> DecodedDocument {
    DecodedDocument { pages }
}

fn config_with(
    decoder: Arc<ScriptedDecoder>,
    engine: Option<Arc<ScriptedEngine>>,
) -> BatchConfig {
    let mut builder = BatchConfig::builder().decoder(decoder).concurrency(2);
    if let Some(engine) = engine {
        builder = builder.ocr_engine(engine);
    }
    builder.build().expect("valid config")
}

// ── Batch shape invariants ───────────────────────────────────────────────────

#[tokio::test]
async fn batch_preserves_count_names_and_order() {
    let decoder = Arc::new(
        ScriptedDecoder::new()
            .on(b"a", Ok(doc(vec![text_page("alpha", vec![])])))
            .on(b"b", Err("bad header"))
            .on(b"c", Ok(doc(vec![]))),
    );
    let config = config_with(decoder, None);

    let inputs = vec![
        RawDocument::new("a.pdf", b"a".to_vec()),
        RawDocument::new("b.pdf", b"b".to_vec()),
        RawDocument::new("c.pdf", b"c".to_vec()),
    ];
    let batch = process_batch(inputs, &config).await;

    assert_eq!(batch.documents.len(), 3);
    let names: Vec<&str> = batch.documents.iter().map(|o| o.name.as_str()).collect();
    assert_eq!(names, vec!["a.pdf", "b.pdf", "c.pdf"]);
    assert!(batch.documents[0].result.is_ok());
    assert!(matches!(
        batch.documents[1].result,
        Err(DocumentOpenError::Corrupt { .. })
    ));
    assert!(batch.documents[2].result.is_ok());
}

#[tokio::test]
async fn corrupt_document_does_not_disturb_its_siblings() {
    let decoder = Arc::new(
        ScriptedDecoder::new()
            .on(b"good", Ok(doc(vec![text_page("fine", vec![])])))
            .on(b"bad", Err("xref table truncated")),
    );
    let config = config_with(decoder, None);

    let batch = process_batch(
        vec![
            RawDocument::new("bad.pdf", b"bad".to_vec()),
            RawDocument::new("good.pdf", b"good".to_vec()),
        ],
        &config,
    )
    .await;

    let failures: Vec<_> = batch.failures().collect();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].0, "bad.pdf");

    let artifact = batch.documents[1].artifact().expect("good survives");
    assert_eq!(artifact.pages[0].text, "fine");
    assert!(!artifact.has_errors());
}

#[tokio::test]
async fn oversize_document_fails_without_touching_the_decoder() {
    let decoder = Arc::new(ScriptedDecoder::new());
    let config = BatchConfig::builder()
        .decoder(decoder.clone())
        .max_document_mb(1)
        .max_image_mb(1)
        .build()
        .unwrap();

    let batch = process_batch(
        vec![RawDocument::new("huge.pdf", vec![0u8; 3 * 1024 * 1024])],
        &config,
    )
    .await;

    assert!(matches!(
        batch.documents[0].result,
        Err(DocumentOpenError::SizeExceeded { limit_mb: 1, .. })
    ));
    assert_eq!(decoder.calls.load(Ordering::SeqCst), 0);
}

// ── Image handling through the whole stack ───────────────────────────────────

#[tokio::test]
async fn recognized_text_lands_in_the_artifact() {
    let chart = png([10, 20, 30, 255]);
    let decoder = Arc::new(ScriptedDecoder::new().on(
        b"d",
        Ok(doc(vec![text_page(
            "Quarterly results",
            vec![ImageAccess::Bytes(chart.clone())],
        )])),
    ));
    let engine = Arc::new(ScriptedEngine::new().on(&chart, Ok(&["Revenue up", "Costs down"])));
    let config = config_with(decoder, Some(engine.clone()));

    let batch = process_batch(vec![RawDocument::new("q3.pdf", b"d".to_vec())], &config).await;
    let artifact = batch.documents[0].artifact().unwrap();

    assert_eq!(engine.calls.load(Ordering::SeqCst), 1);
    assert_eq!(artifact.stats.images_recognized, 1);
    assert_eq!(artifact.pages[0].images[0].text, "Revenue up Costs down");

    let md = artifact.render();
    assert!(md.contains("### Images on Page 1"));
    assert!(md.contains("**Image 1 OCR:**\nRevenue up Costs down"));
    assert!(!md.contains("Processing Summary"));
}

#[tokio::test]
async fn oversize_image_is_skipped_before_the_engine_sees_it() {
    // Arbitrary filler: the size gate fires on byte length alone.
    let blob = vec![0u8; 2 * 1024 * 1024];
    let decoder = Arc::new(ScriptedDecoder::new().on(
        b"d",
        Ok(doc(vec![text_page(
            "Body",
            vec![ImageAccess::Bytes(blob)],
        )])),
    ));
    let engine = Arc::new(ScriptedEngine::new());
    let config = BatchConfig::builder()
        .decoder(decoder)
        .ocr_engine(engine.clone())
        .max_image_mb(1)
        .build()
        .unwrap();

    let batch = process_batch(vec![RawDocument::new("d.pdf", b"d".to_vec())], &config).await;
    let artifact = batch.documents[0].artifact().unwrap();

    assert_eq!(engine.calls.load(Ordering::SeqCst), 0);
    assert_eq!(artifact.stats.images_rejected, 1);
    assert_eq!(artifact.stats.warnings, 1);
    assert_eq!(artifact.stats.errors, 0);

    let md = artifact.render();
    assert!(md.contains("### Warnings"));
    assert!(md.contains("Skipped image 1 on page 1"));
    assert!(!md.contains("### Errors"));
}

#[tokio::test]
async fn one_failing_image_leaves_its_neighbours_intact() {
    let good_a = png([1, 1, 1, 255]);
    let broken = png([2, 2, 2, 255]);
    let good_b = png([3, 3, 3, 255]);
    let decoder = Arc::new(ScriptedDecoder::new().on(
        b"d",
        Ok(doc(vec![text_page(
            "Page text",
            vec![
                ImageAccess::Bytes(good_a.clone()),
                ImageAccess::Bytes(broken.clone()),
                ImageAccess::Bytes(good_b.clone()),
            ],
        )])),
    ));
    let engine = Arc::new(
        ScriptedEngine::new()
            .on(&good_a, Ok(&["first"]))
            .on(&broken, Err("model refused the request"))
            .on(&good_b, Ok(&["third"])),
    );
    let config = config_with(decoder, Some(engine.clone()));

    let batch = process_batch(vec![RawDocument::new("d.pdf", b"d".to_vec())], &config).await;
    let artifact = batch.documents[0].artifact().unwrap();

    assert_eq!(engine.calls.load(Ordering::SeqCst), 3);
    assert_eq!(artifact.stats.images_recognized, 2);
    assert_eq!(artifact.stats.images_failed, 1);
    assert_eq!(artifact.stats.errors, 1);

    let md = artifact.render();
    assert!(md.contains("**Image 1 OCR:**\nfirst"));
    assert!(md.contains("**Image 3 OCR:**\nthird"));
    assert!(md.contains("OCR error for image 2 on page 1"));
}

#[tokio::test]
async fn missing_engine_degrades_to_native_text_only() {
    let pic = png([9, 9, 9, 255]);
    let decoder = Arc::new(ScriptedDecoder::new().on(
        b"d",
        Ok(doc(vec![text_page(
            "Still extracted",
            vec![ImageAccess::Bytes(pic)],
        )])),
    ));
    let config = config_with(decoder, None);

    let batch = process_batch(vec![RawDocument::new("d.pdf", b"d".to_vec())], &config).await;
    let artifact = batch.documents[0].artifact().unwrap();

    assert_eq!(artifact.pages[0].text, "Still extracted");
    assert_eq!(artifact.stats.images_failed, 1);
    let md = artifact.render();
    assert!(md.contains("Still extracted"));
    assert!(md.contains("OCR engine not initialized"));
}

// ── Rendering ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn two_page_document_renders_the_expected_markdown() {
    let pic = png([42, 0, 0, 255]);
    let decoder = Arc::new(ScriptedDecoder::new().on(
        b"d",
        Ok(doc(vec![
            text_page("Hello", vec![ImageAccess::Bytes(pic.clone())]),
            PageAccess::Available(DecodedPage {
                width: 612.0,
                height: 792.0,
                text: Err("content stream missing".into()),
                images: vec![],
            }),
        ])),
    ));
    let engine = Arc::new(ScriptedEngine::new().on(&pic, Ok(&["WORLD"])));
    let config = config_with(decoder, Some(engine));

    let batch = process_batch(vec![RawDocument::new("doc.pdf", b"d".to_vec())], &config).await;
    let artifact = batch.documents[0].artifact().unwrap();

    let expected = "## Page 1\n\nHello\n\n\
                    ### Images on Page 1\n\n\
                    **Image 1 OCR:**\nWORLD\n\n\
                    ## Page 2\n\n\
                    ## Processing Summary\n\n\
                    ### Errors\n\n\
                    Failed to extract text from page 2: content stream missing";
    assert_eq!(artifact.render(), expected);
}

#[tokio::test]
async fn rendering_is_deterministic() {
    let decoder = Arc::new(ScriptedDecoder::new().on(
        b"d",
        Ok(doc(vec![
            text_page("One", vec![]),
            PageAccess::Unavailable("object 7 missing".into()),
            text_page("Three", vec![]),
        ])),
    ));
    let config = config_with(decoder, None);

    let batch = process_batch(vec![RawDocument::new("d.pdf", b"d".to_vec())], &config).await;
    let artifact = batch.documents[0].artifact().unwrap();

    assert_eq!(artifact.render(), artifact.render());
    assert_eq!(artifact.stats.total_pages, 3);
    assert_eq!(artifact.stats.pages_processed, 2);
    assert!(artifact.render().contains("Failed to process page 2"));
}

// ── Cancellation ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn cancelled_batch_still_yields_one_outcome_per_input() {
    let decoder = Arc::new(ScriptedDecoder::new());
    let cancel = CancelToken::new();
    cancel.cancel();
    let config = BatchConfig::builder()
        .decoder(decoder.clone())
        .cancel_token(cancel)
        .build()
        .unwrap();

    let batch = process_batch(
        vec![
            RawDocument::new("a.pdf", b"a".to_vec()),
            RawDocument::new("b.pdf", b"b".to_vec()),
        ],
        &config,
    )
    .await;

    assert_eq!(batch.documents.len(), 2);
    for outcome in &batch.documents {
        assert!(matches!(
            outcome.result,
            Err(DocumentOpenError::Cancelled)
        ));
    }
    assert_eq!(decoder.calls.load(Ordering::SeqCst), 0);
}

/// Fires the shared token once the first page of any document has been
/// attempted, so the page loop sees it before page 2.
struct CancelAfterFirstPage {
    token: CancelToken,
}

impl BatchProgress for CancelAfterFirstPage {
    fn on_page_processed(&self, _name: &str, page_num: usize, _total: usize) {
        if page_num == 1 {
            self.token.cancel();
        }
    }
}

#[tokio::test]
async fn mid_document_cancellation_keeps_the_partial_artifact() {
    let decoder = Arc::new(ScriptedDecoder::new().on(
        b"a",
        Ok(doc(vec![
            text_page("first", vec![]),
            text_page("second", vec![]),
            text_page("third", vec![]),
        ])),
    ));
    let token = CancelToken::new();
    let config = BatchConfig::builder()
        .decoder(decoder.clone())
        .concurrency(1)
        .cancel_token(token.clone())
        .progress(Arc::new(CancelAfterFirstPage { token }))
        .build()
        .unwrap();

    let batch = process_batch(
        vec![
            RawDocument::new("a.pdf", b"a".to_vec()),
            RawDocument::new("b.pdf", b"b".to_vec()),
        ],
        &config,
    )
    .await;

    // The in-flight document keeps what it finished before the token fired.
    let artifact = batch.documents[0].artifact().expect("partial artifact");
    assert_eq!(artifact.stats.total_pages, 3);
    assert_eq!(artifact.stats.pages_processed, 1);
    assert_eq!(artifact.pages[0].text, "first");
    assert_eq!(artifact.stats.warnings, 1);
    let md = artifact.render();
    assert!(md.contains("### Warnings"));
    assert!(md.contains("Processing cancelled before page 2 of 3"));

    // The document still queued when the token fired is never dispatched.
    assert!(matches!(
        batch.documents[1].result,
        Err(DocumentOpenError::Cancelled)
    ));
    assert_eq!(decoder.calls.load(Ordering::SeqCst), 1);
}

// ── Packaging ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn packaging_writes_one_markdown_file_per_successful_document() {
    let decoder = Arc::new(
        ScriptedDecoder::new()
            .on(b"a", Ok(doc(vec![text_page("A text", vec![])])))
            // Same stem as a.pdf after extension swap, from a different dir.
            .on(b"b", Ok(doc(vec![text_page("B text", vec![])])))
            .on(b"c", Err("not a container")),
    );
    let config = config_with(decoder, None);

    let batch = process_batch(
        vec![
            RawDocument::new("report.pdf", b"a".to_vec()),
            RawDocument::new("report.docx", b"b".to_vec()),
            RawDocument::new("broken.pdf", b"c".to_vec()),
        ],
        &config,
    )
    .await;

    let dir = tempfile::tempdir().expect("tempdir");
    let mut packager = DirPackager::new(dir.path()).expect("packager");
    let written = package_batch(&batch, &mut packager).expect("package");

    assert_eq!(written, 2);
    let first = std::fs::read_to_string(dir.path().join("report.md")).expect("report.md");
    let second = std::fs::read_to_string(dir.path().join("report-2.md")).expect("report-2.md");
    assert!(first.contains("A text"));
    assert!(second.contains("B text"));
    assert!(!dir.path().join("broken.md").exists());
}
