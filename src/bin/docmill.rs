//! CLI binary for docmill.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `BatchConfig`, runs the batch, and writes one Markdown artifact per
//! document into the output directory.

use anyhow::{Context, Result};
use clap::Parser;
use docmill::{
    package_batch, process_batch, BatchConfig, BatchProgress, BatchResult, DirPackager,
    ProgressHandle, RawDocument, VlmOcrEngine,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn yellow(s: &str) -> String {
    format!("\x1b[33m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress: one bar across the batch, advanced per document, with
/// the current page shown in the message line. Document events may arrive
/// from different workers; indicatif's bar is internally synchronised.
struct CliProgress {
    bar: ProgressBar,
    failed: AtomicUsize,
}

impl CliProgress {
    fn new(total_documents: usize) -> Arc<Self> {
        let bar = ProgressBar::new(total_documents as u64);
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>2}/{len} documents  ⏱ {elapsed_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
        bar.set_style(style);
        bar.set_prefix("Converting");
        bar.enable_steady_tick(std::time::Duration::from_millis(80));

        Arc::new(Self {
            bar,
            failed: AtomicUsize::new(0),
        })
    }

    fn finish(&self, total: usize) {
        let failed = self.failed.load(Ordering::SeqCst);
        self.bar.finish_and_clear();
        if failed == 0 {
            eprintln!(
                "{} {} document(s) converted",
                green("✔"),
                bold(&(total - failed).to_string())
            );
        } else {
            eprintln!(
                "{} {}/{} documents converted  ({} failed)",
                if failed == total { red("✘") } else { yellow("⚠") },
                bold(&(total - failed).to_string()),
                total,
                red(&failed.to_string()),
            );
        }
    }
}

impl BatchProgress for CliProgress {
    fn on_document_start(&self, name: &str, total_pages: usize) {
        self.bar
            .set_message(format!("{name} ({total_pages} pages)"));
    }

    fn on_page_processed(&self, name: &str, page_num: usize, total_pages: usize) {
        self.bar
            .set_message(format!("{name}  page {page_num}/{total_pages}"));
    }

    fn on_document_complete(&self, name: &str, pages_processed: usize) {
        self.bar.println(format!(
            "  {} {}  {}",
            green("✓"),
            name,
            dim(&format!("{pages_processed} pages")),
        ));
        self.bar.inc(1);
    }

    fn on_document_failed(&self, name: &str, reason: &str) {
        self.failed.fetch_add(1, Ordering::SeqCst);
        self.bar
            .println(format!("  {} {}  {}", red("✗"), name, red(reason)));
        self.bar.inc(1);
    }
}

// ── JSON report ──────────────────────────────────────────────────────────────

/// One row of the machine-readable batch report.
#[derive(serde::Serialize)]
struct ReportEntry<'a> {
    name: &'a str,
    status: &'static str,
    error: Option<String>,
    pages: usize,
    images_recognized: usize,
    errors: usize,
    warnings: usize,
    duration_ms: u64,
}

fn write_report(batch: &BatchResult, path: &PathBuf) -> Result<()> {
    let entries: Vec<ReportEntry> = batch
        .documents
        .iter()
        .map(|outcome| match &outcome.result {
            Ok(a) => ReportEntry {
                name: &outcome.name,
                status: "converted",
                error: None,
                pages: a.stats.pages_processed,
                images_recognized: a.stats.images_recognized,
                errors: a.stats.errors,
                warnings: a.stats.warnings,
                duration_ms: a.stats.duration_ms,
            },
            Err(e) => ReportEntry {
                name: &outcome.name,
                status: "failed",
                error: Some(e.to_string()),
                pages: 0,
                images_recognized: 0,
                errors: 0,
                warnings: 0,
                duration_ms: 0,
            },
        })
        .collect();
    let json = serde_json::to_string_pretty(&entries).context("Failed to serialise report")?;
    std::fs::write(path, json).with_context(|| format!("Failed to write report to {path:?}"))?;
    Ok(())
}

// ── CLI definition ───────────────────────────────────────────────────────────

const AFTER_HELP: &str = r#"EXAMPLES:
  # Convert a batch of PDFs into ./out/
  docmill report.pdf invoice.pdf -o out

  # No OCR (native text only, images skipped as unavailable)
  docmill --no-ocr *.pdf -o out

  # Pick the vision provider and model used for OCR
  docmill --provider anthropic --model claude-haiku-4-20250514 scan.pdf -o out

  # Machine-readable ledger of everything that went wrong
  docmill *.pdf -o out --report out/batch.json

ENVIRONMENT VARIABLES:
  OPENAI_API_KEY          OpenAI API key (preferred when set)
  ANTHROPIC_API_KEY       Anthropic API key
  GEMINI_API_KEY          Google Gemini API key
  PDFIUM_LIB_PATH         Path to an existing libpdfium

NOTES:
  A missing or unconfigured OCR engine never aborts the run: native text is
  still extracted and every image is reported as failed in the summary.
"#;

/// Batch-convert page-oriented documents to Markdown with OCR of embedded images.
#[derive(Parser, Debug)]
#[command(
    name = "docmill",
    version,
    about = "Batch-convert documents to Markdown with OCR of embedded images",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Input document files.
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Output directory for Markdown artifacts.
    #[arg(short, long, env = "DOCMILL_OUTPUT", default_value = "out")]
    out_dir: PathBuf,

    /// Document size ceiling in MB.
    #[arg(long, env = "DOCMILL_MAX_DOC_MB", default_value_t = 50)]
    max_doc_mb: u64,

    /// Embedded-image size ceiling in MB.
    #[arg(long, env = "DOCMILL_MAX_IMAGE_MB", default_value_t = 10)]
    max_image_mb: u64,

    /// Page area ceiling (container units squared) before a quality warning.
    #[arg(long, env = "DOCMILL_MAX_PAGE_AREA", default_value_t = 1.0e7)]
    max_page_area: f64,

    /// Per-image OCR timeout in seconds.
    #[arg(long, env = "DOCMILL_OCR_TIMEOUT", default_value_t = 30)]
    ocr_timeout: u64,

    /// OCR language profile.
    #[arg(long, env = "DOCMILL_LANGUAGE", default_value = "en")]
    language: String,

    /// Number of documents processed concurrently.
    #[arg(short, long, env = "DOCMILL_CONCURRENCY", default_value_t = 4)]
    concurrency: usize,

    /// Skip OCR entirely; extract native text only.
    #[arg(long, env = "DOCMILL_NO_OCR")]
    no_ocr: bool,

    /// Vision provider for OCR: openai, anthropic, gemini, ollama.
    /// Auto-detected from API key env vars if not set.
    #[arg(long, env = "DOCMILL_PROVIDER")]
    provider: Option<String>,

    /// Vision model ID used for OCR.
    #[arg(long, env = "DOCMILL_MODEL")]
    model: Option<String>,

    /// Write a JSON batch report to this path.
    #[arg(long, env = "DOCMILL_REPORT")]
    report: Option<PathBuf>,

    /// Disable the progress bar.
    #[arg(long, env = "DOCMILL_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "DOCMILL_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "DOCMILL_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar is the user-facing feedback channel; keep library
    // logs at error level while it is active unless -v asks for more.
    let show_progress = !cli.quiet && !cli.no_progress;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Read inputs ──────────────────────────────────────────────────────
    let mut inputs = Vec::with_capacity(cli.files.len());
    for path in &cli.files {
        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        inputs.push(RawDocument::new(name, bytes));
    }

    // ── OCR engine: construct once, degrade on failure ───────────────────
    let engine = if cli.no_ocr {
        None
    } else {
        let built = match cli.provider.as_deref() {
            Some(name) => VlmOcrEngine::with_provider(name, cli.model.as_deref(), &cli.language),
            None => VlmOcrEngine::from_env(cli.model.as_deref(), &cli.language),
        };
        match built {
            Ok(engine) => Some(Arc::new(engine) as Arc<dyn docmill::OcrEngine>),
            Err(e) => {
                if !cli.quiet {
                    eprintln!(
                        "{} OCR engine unavailable ({e}); continuing without image recognition",
                        yellow("⚠"),
                    );
                }
                None
            }
        }
    };

    // ── Build config ─────────────────────────────────────────────────────
    let cli_progress: Option<Arc<CliProgress>> = if show_progress {
        Some(CliProgress::new(inputs.len()))
    } else {
        None
    };
    let progress: Option<ProgressHandle> = cli_progress
        .clone()
        .map(|p| p as Arc<dyn BatchProgress>);

    let mut builder = BatchConfig::builder()
        .max_document_mb(cli.max_doc_mb)
        .max_image_mb(cli.max_image_mb)
        .max_page_area(cli.max_page_area)
        .ocr_timeout_secs(cli.ocr_timeout)
        .ocr_language(cli.language.clone())
        .concurrency(cli.concurrency);
    if let Some(engine) = engine {
        builder = builder.ocr_engine(engine);
    }
    if let Some(cb) = progress {
        builder = builder.progress(cb);
    }
    let config = builder.build().context("Invalid configuration")?;

    // ── Run the batch and package artifacts ──────────────────────────────
    let total = inputs.len();
    let batch = process_batch(inputs, &config).await;

    let mut packager = DirPackager::new(&cli.out_dir)
        .with_context(|| format!("Failed to create output directory {:?}", cli.out_dir))?;
    let written = package_batch(&batch, &mut packager).context("Packaging failed")?;

    if let Some(ref bar) = cli_progress {
        bar.finish(total);
    }

    if let Some(ref report_path) = cli.report {
        write_report(&batch, report_path)?;
    }

    // ── Summary ──────────────────────────────────────────────────────────
    if !cli.quiet {
        eprintln!(
            "{} artifact(s) written to {}",
            written,
            bold(&cli.out_dir.display().to_string())
        );
        for (name, reason) in batch.failures() {
            eprintln!("  {} {}: {}", red("✗"), name, reason);
        }
        let with_diagnostics = batch
            .documents
            .iter()
            .filter_map(|o| o.artifact())
            .filter(|a| !a.diagnostics.is_empty())
            .count();
        if with_diagnostics > 0 {
            eprintln!(
                "{}",
                dim(&format!(
                    "{with_diagnostics} document(s) completed with warnings or errors — see the Processing Summary section of each artifact"
                ))
            );
        }
    }

    // Failed documents are reported, not fatal; exit non-zero only when
    // nothing at all could be converted.
    if written == 0 && total > 0 {
        anyhow::bail!("no document in the batch could be converted");
    }
    Ok(())
}
