//! Page processing: native text plus gated OCR over embedded images.
//!
//! Diagnostics are accumulated in a locally-scoped list and returned inside
//! the [`PageResult`]; nothing here aborts a sibling image or escapes to
//! the document level. The one early return — text-extraction failure —
//! skips only this page's image work, as no amount of OCR rescues a page
//! whose container refused to yield its content stream.

use crate::config::BatchConfig;
use crate::decode::{DecodedPage, ImageAccess};
use crate::output::{Diagnostic, DiagnosticScope, ImageOutcome, ImageResult, PageResult};
use crate::pipeline::{gate, invoke};
use tracing::debug;

/// Process one decoded page into a fully-populated [`PageResult`].
///
/// Output ordering: native text precedes image OCR results; images keep
/// their original enumeration order. Never fails — every problem becomes a
/// diagnostic.
pub async fn process_page(page: DecodedPage, page_num: usize, config: &BatchConfig) -> PageResult {
    let mut diagnostics = Vec::new();

    let area = page.width as f64 * page.height as f64;
    if area > config.max_page_area {
        diagnostics.push(Diagnostic::warning(
            DiagnosticScope::Page(page_num),
            format!("Page {page_num} too large, may affect processing quality"),
        ));
    }

    let text = match page.text {
        Ok(text) => text,
        Err(detail) => {
            // Abort only this page's image work; the document continues.
            diagnostics.push(Diagnostic::error(
                DiagnosticScope::Page(page_num),
                format!("Failed to extract text from page {page_num}: {detail}"),
            ));
            return PageResult {
                page_num,
                text: String::new(),
                images: Vec::new(),
                diagnostics,
            };
        }
    };

    let engine = config.ocr_engine.as_ref();
    let mut images = Vec::with_capacity(page.images.len());

    for (i, access) in page.images.into_iter().enumerate() {
        let index = i + 1;
        let scope = DiagnosticScope::Image {
            page: page_num,
            image: index,
        };

        let bytes = match access {
            ImageAccess::Bytes(bytes) => bytes,
            ImageAccess::Failed(detail) => {
                diagnostics.push(Diagnostic::error(
                    scope,
                    format!("Failed to process image {index} on page {page_num}: {detail}"),
                ));
                images.push(ImageResult {
                    index,
                    text: String::new(),
                    outcome: ImageOutcome::Failed,
                });
                continue;
            }
        };

        let format = match gate::admit(&bytes, config) {
            Ok(format) => format,
            Err(reason) => {
                diagnostics.push(Diagnostic::warning(
                    scope,
                    format!("Skipped image {index} on page {page_num}: {reason}"),
                ));
                images.push(ImageResult {
                    index,
                    text: String::new(),
                    outcome: ImageOutcome::Rejected,
                });
                continue;
            }
        };

        match invoke::recognize(engine, &bytes, format, config).await {
            Ok(lines) if lines.is_empty() => {
                diagnostics.push(Diagnostic::warning(
                    scope,
                    format!("No text found in image {index} on page {page_num}"),
                ));
                images.push(ImageResult {
                    index,
                    text: String::new(),
                    outcome: ImageOutcome::NoTextFound,
                });
            }
            Ok(lines) => {
                debug!(
                    "page {} image {}: recognised {} line(s)",
                    page_num,
                    index,
                    lines.len()
                );
                images.push(ImageResult {
                    index,
                    text: lines.join(" "),
                    outcome: ImageOutcome::Recognized,
                });
            }
            Err(failure) => {
                diagnostics.push(Diagnostic::error(
                    scope,
                    format!("OCR error for image {index} on page {page_num}: {failure}"),
                ));
                images.push(ImageResult {
                    index,
                    text: String::new(),
                    outcome: ImageOutcome::Failed,
                });
            }
        }
        // Raster bytes drop here; they never outlive the OCR call.
    }

    PageResult {
        page_num,
        text,
        images,
        diagnostics,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::OcrEngineError;
    use crate::ocr::OcrEngine;
    use async_trait::async_trait;
    use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
    use std::io::Cursor;
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn png_bytes() -> Vec<u8> {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(2, 2, Rgba([7, 7, 7, 255])));
        let mut buf = Vec::new();
        img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
            .expect("png encode");
        buf
    }

    fn page_with(text: Result<String, String>, images: Vec<ImageAccess>) -> DecodedPage {
        DecodedPage {
            width: 612.0,
            height: 792.0,
            text,
            images,
        }
    }

    struct CountingEngine {
        calls: AtomicUsize,
        lines: Vec<String>,
    }

    #[async_trait]
    impl OcrEngine for CountingEngine {
        fn name(&self) -> &'static str {
            "counting"
        }
        async fn recognize(&self, _path: &Path) -> Result<Vec<String>, OcrEngineError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.lines.clone())
        }
    }

    #[tokio::test]
    async fn extraction_failure_skips_image_work() {
        let engine = Arc::new(CountingEngine {
            calls: AtomicUsize::new(0),
            lines: vec!["SHOULD NOT RUN".into()],
        });
        let config = BatchConfig::builder()
            .ocr_engine(engine.clone())
            .build()
            .unwrap();
        let page = page_with(
            Err("content stream gone".into()),
            vec![ImageAccess::Bytes(png_bytes())],
        );

        let result = process_page(page, 2, &config).await;
        assert_eq!(result.text, "");
        assert!(result.images.is_empty());
        assert_eq!(result.diagnostics.len(), 1);
        assert!(result.diagnostics[0].is_error());
        assert!(result.diagnostics[0]
            .message
            .contains("Failed to extract text from page 2"));
        assert_eq!(engine.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn rejected_image_never_reaches_the_engine() {
        let engine = Arc::new(CountingEngine {
            calls: AtomicUsize::new(0),
            lines: vec!["X".into()],
        });
        let config = BatchConfig::builder()
            .ocr_engine(engine.clone())
            .build()
            .unwrap();
        let page = page_with(
            Ok("body".into()),
            vec![ImageAccess::Bytes(b"not an image".to_vec())],
        );

        let result = process_page(page, 1, &config).await;
        assert_eq!(engine.calls.load(Ordering::SeqCst), 0);
        assert_eq!(result.images.len(), 1);
        assert_eq!(result.images[0].outcome, ImageOutcome::Rejected);
        let warnings: Vec<_> = result
            .diagnostics
            .iter()
            .filter(|d| !d.is_error())
            .collect();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].message.contains("Skipped image 1 on page 1"));
    }

    #[tokio::test]
    async fn empty_ocr_result_is_a_warning_not_an_error() {
        let engine = Arc::new(CountingEngine {
            calls: AtomicUsize::new(0),
            lines: vec![],
        });
        let config = BatchConfig::builder()
            .ocr_engine(engine.clone())
            .build()
            .unwrap();
        let page = page_with(Ok("body".into()), vec![ImageAccess::Bytes(png_bytes())]);

        let result = process_page(page, 1, &config).await;
        assert_eq!(result.images[0].outcome, ImageOutcome::NoTextFound);
        assert!(result.diagnostics.iter().all(|d| !d.is_error()));
        assert!(result.diagnostics[0]
            .message
            .contains("No text found in image 1 on page 1"));
    }

    #[tokio::test]
    async fn recognized_lines_are_joined_with_single_spaces() {
        let engine = Arc::new(CountingEngine {
            calls: AtomicUsize::new(0),
            lines: vec!["HELLO".into(), "WORLD".into()],
        });
        let config = BatchConfig::builder().ocr_engine(engine).build().unwrap();
        let page = page_with(Ok("body".into()), vec![ImageAccess::Bytes(png_bytes())]);

        let result = process_page(page, 1, &config).await;
        assert_eq!(result.images[0].outcome, ImageOutcome::Recognized);
        assert_eq!(result.images[0].text, "HELLO WORLD");
        assert!(result.diagnostics.is_empty());
    }

    #[tokio::test]
    async fn oversize_page_warns_but_continues() {
        let config = BatchConfig::builder().max_page_area(100.0).build().unwrap();
        let page = page_with(Ok("still processed".into()), vec![]);

        let result = process_page(page, 3, &config).await;
        assert_eq!(result.text, "still processed");
        assert_eq!(result.diagnostics.len(), 1);
        assert!(!result.diagnostics[0].is_error());
        assert!(result.diagnostics[0].message.contains("Page 3 too large"));
    }

    #[tokio::test]
    async fn container_image_fault_does_not_stop_enumeration() {
        let engine = Arc::new(CountingEngine {
            calls: AtomicUsize::new(0),
            lines: vec!["OK".into()],
        });
        let config = BatchConfig::builder()
            .ocr_engine(engine.clone())
            .build()
            .unwrap();
        let page = page_with(
            Ok("body".into()),
            vec![
                ImageAccess::Failed("xref missing".into()),
                ImageAccess::Bytes(png_bytes()),
            ],
        );

        let result = process_page(page, 1, &config).await;
        assert_eq!(result.images.len(), 2);
        assert_eq!(result.images[0].outcome, ImageOutcome::Failed);
        assert_eq!(result.images[1].outcome, ImageOutcome::Recognized);
        assert_eq!(engine.calls.load(Ordering::SeqCst), 1);
    }
}
