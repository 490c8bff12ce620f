//! Deterministic Markdown rendering of a finished [`DocumentArtifact`].
//!
//! Rendering is a pure function of the artifact structure: no clocks, no
//! randomness, no environment. Re-rendering the same artifact twice is
//! byte-identical, which lets callers cache or diff outputs safely.
//!
//! Layout: per page a `## Page <n>` section with the native text, then an
//! `### Images on Page <n>` subsection when at least one image yielded
//! recognized text, then a trailing `## Processing Summary` listing errors
//! and warnings in collection order — present only when diagnostics exist.
//! Sections are separated by one blank line.

use crate::output::{DocumentArtifact, ImageOutcome, Severity};

/// Render an artifact to its UTF-8 Markdown representation.
pub fn render_artifact(artifact: &DocumentArtifact) -> String {
    let mut sections: Vec<String> = Vec::new();

    for page in &artifact.pages {
        sections.push(
            format!("## Page {}\n\n{}", page.page_num, page.text)
                .trim_end()
                .to_string(),
        );

        let recognized: Vec<_> = page
            .images
            .iter()
            .filter(|img| img.outcome == ImageOutcome::Recognized)
            .collect();
        if !recognized.is_empty() {
            sections.push(format!("### Images on Page {}", page.page_num));
            for img in recognized {
                sections.push(format!("**Image {} OCR:**\n{}", img.index, img.text));
            }
        }
    }

    if !artifact.diagnostics.is_empty() {
        sections.push("## Processing Summary".to_string());

        let errors: Vec<_> = artifact
            .diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Error)
            .collect();
        if !errors.is_empty() {
            sections.push("### Errors".to_string());
            for d in &errors {
                sections.push(d.message.clone());
            }
        }

        let warnings: Vec<_> = artifact
            .diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Warning)
            .collect();
        if !warnings.is_empty() {
            sections.push("### Warnings".to_string());
            for d in &warnings {
                sections.push(d.message.clone());
            }
        }
    }

    sections.join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::{
        ArtifactStats, Diagnostic, DiagnosticScope, ImageResult, PageResult,
    };

    fn artifact(pages: Vec<PageResult>, diagnostics: Vec<Diagnostic>) -> DocumentArtifact {
        DocumentArtifact {
            name: "doc.pdf".into(),
            pages,
            diagnostics,
            stats: ArtifactStats::default(),
        }
    }

    fn page(page_num: usize, text: &str, images: Vec<ImageResult>) -> PageResult {
        PageResult {
            page_num,
            text: text.into(),
            images,
            diagnostics: vec![],
        }
    }

    #[test]
    fn empty_artifact_renders_empty() {
        assert_eq!(render_artifact(&artifact(vec![], vec![])), "");
    }

    #[test]
    fn clean_document_has_no_summary_section() {
        let a = artifact(vec![page(1, "Hello", vec![])], vec![]);
        let md = render_artifact(&a);
        assert_eq!(md, "## Page 1\n\nHello");
        assert!(!md.contains("Processing Summary"));
    }

    #[test]
    fn recognized_images_get_a_subsection() {
        let a = artifact(
            vec![page(
                1,
                "Hello",
                vec![ImageResult {
                    index: 1,
                    text: "WORLD".into(),
                    outcome: ImageOutcome::Recognized,
                }],
            )],
            vec![],
        );
        let md = render_artifact(&a);
        assert_eq!(
            md,
            "## Page 1\n\nHello\n\n### Images on Page 1\n\n**Image 1 OCR:**\nWORLD"
        );
    }

    #[test]
    fn unrecognized_images_do_not_create_a_subsection() {
        for outcome in [
            ImageOutcome::NoTextFound,
            ImageOutcome::Rejected,
            ImageOutcome::Failed,
        ] {
            let a = artifact(
                vec![page(
                    1,
                    "Hello",
                    vec![ImageResult {
                        index: 1,
                        text: String::new(),
                        outcome,
                    }],
                )],
                vec![],
            );
            assert!(!render_artifact(&a).contains("Images on Page"));
        }
    }

    #[test]
    fn summary_lists_errors_then_warnings_in_collection_order() {
        let a = artifact(
            vec![page(1, "x", vec![])],
            vec![
                Diagnostic::warning(DiagnosticScope::Page(1), "first warning"),
                Diagnostic::error(DiagnosticScope::Page(1), "first error"),
                Diagnostic::warning(DiagnosticScope::Document, "second warning"),
                Diagnostic::error(DiagnosticScope::Document, "second error"),
            ],
        );
        let md = render_artifact(&a);
        let errors_at = md.find("### Errors").unwrap();
        let warnings_at = md.find("### Warnings").unwrap();
        assert!(errors_at < warnings_at);
        assert!(md.find("first error").unwrap() < md.find("second error").unwrap());
        assert!(md.find("first warning").unwrap() < md.find("second warning").unwrap());
        assert!(md.find("second error").unwrap() < warnings_at);
    }

    #[test]
    fn warnings_only_summary_omits_errors_heading() {
        let a = artifact(
            vec![page(1, "x", vec![])],
            vec![Diagnostic::warning(DiagnosticScope::Page(1), "slow page")],
        );
        let md = render_artifact(&a);
        assert!(md.contains("### Warnings"));
        assert!(!md.contains("### Errors"));
    }

    #[test]
    fn rendering_is_idempotent() {
        let a = artifact(
            vec![page(
                2,
                "Body text\n",
                vec![ImageResult {
                    index: 1,
                    text: "CAPTION".into(),
                    outcome: ImageOutcome::Recognized,
                }],
            )],
            vec![Diagnostic::error(DiagnosticScope::Page(2), "boom")],
        );
        assert_eq!(render_artifact(&a), render_artifact(&a));
    }

    #[test]
    fn empty_page_text_renders_bare_heading() {
        let a = artifact(vec![page(2, "", vec![])], vec![]);
        assert_eq!(render_artifact(&a), "## Page 2");
    }
}
