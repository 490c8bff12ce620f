//! OCR engine boundary and the built-in vision-model engine.
//!
//! The pipeline never talks to a recognizer directly: it goes through
//! [`OcrEngine`], injected once at startup via
//! [`crate::config::BatchConfigBuilder::ocr_engine`]. The handle is
//! read-only after construction, so concurrent recognition calls need no
//! synchronisation, and tests swap in deterministic fakes.
//!
//! [`VlmOcrEngine`] is the production implementation: it hands the image to
//! a vision language model and asks for a plain transcription. VLMs read
//! photographed and rasterised text far more reliably than classical OCR on
//! low-quality scans, and the provider plumbing (OpenAI / Anthropic /
//! Gemini / Ollama keys from the environment) comes for free from
//! `edgequake-llm`.

use crate::error::OcrEngineError;
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use edgequake_llm::{
    ChatMessage, CompletionOptions, ImageData, LLMProvider, ProviderFactory,
};
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, warn};

/// A recognizer that turns one raster image file into ordered text lines.
///
/// An empty line list is a valid, non-error result ("no text found").
/// Implementations must be `Send + Sync`; the pipeline may issue concurrent
/// calls for distinct images.
#[async_trait]
pub trait OcrEngine: Send + Sync {
    /// Engine identifier for logs and diagnostics.
    fn name(&self) -> &'static str;

    /// Recognise text in the image at `path`, returning lines in reading
    /// order.
    async fn recognize(&self, path: &Path) -> Result<Vec<String>, OcrEngineError>;
}

/// Sentinel the model is instructed to answer when the image holds no text.
const NO_TEXT_SENTINEL: &str = "NO_TEXT";

/// Strip a wrapping Markdown code fence from a model response.
static CODE_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^\s*```[a-zA-Z]*\n?(.*?)\n?```\s*$").expect("valid regex"));

fn transcription_prompt(language: &str) -> String {
    format!(
        "You are a text recognition engine. Transcribe ALL text visible in the \
         supplied image, in reading order, one text region per line. The text \
         is in language '{language}'. Output the transcription only — no \
         commentary, no formatting, no code fences. If the image contains no \
         readable text, output exactly {NO_TEXT_SENTINEL}."
    )
}

/// OCR engine backed by a vision language model.
///
/// Constructed once at process start; if construction fails the caller
/// leaves the config's engine slot empty and the batch runs in degraded
/// mode instead of crashing.
pub struct VlmOcrEngine {
    provider: Arc<dyn LLMProvider>,
    language: String,
}

impl VlmOcrEngine {
    /// Wrap a pre-constructed provider. Useful for tests and for callers
    /// that need custom middleware around the provider.
    pub fn new(provider: Arc<dyn LLMProvider>, language: impl Into<String>) -> Self {
        Self {
            provider,
            language: language.into(),
        }
    }

    /// Construct a named provider (e.g. "openai", "anthropic") with an
    /// optional model override. Reads the matching API key from the
    /// environment.
    pub fn with_provider(
        provider_name: &str,
        model: Option<&str>,
        language: &str,
    ) -> Result<Self, OcrEngineError> {
        let model = model.unwrap_or("gpt-4.1-nano");
        let provider = ProviderFactory::create_llm_provider(provider_name, model)
            .map_err(|e| OcrEngineError(format!("provider '{provider_name}': {e}")))?;
        Ok(Self::new(provider, language))
    }

    /// Auto-detect a provider from the environment.
    ///
    /// Prefers OpenAI when `OPENAI_API_KEY` is set so multi-key
    /// environments behave predictably; otherwise falls back to the
    /// factory's own scan of known key variables.
    pub fn from_env(model: Option<&str>, language: &str) -> Result<Self, OcrEngineError> {
        if let Ok(key) = std::env::var("OPENAI_API_KEY") {
            if !key.is_empty() {
                return Self::with_provider("openai", model, language);
            }
        }
        let (provider, _embedding) = ProviderFactory::from_env().map_err(|e| {
            OcrEngineError(format!(
                "no vision provider auto-detected from environment: {e}"
            ))
        })?;
        Ok(Self::new(provider, language))
    }
}

#[async_trait]
impl OcrEngine for VlmOcrEngine {
    fn name(&self) -> &'static str {
        "vlm"
    }

    async fn recognize(&self, path: &Path) -> Result<Vec<String>, OcrEngineError> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| OcrEngineError(format!("read '{}': {e}", path.display())))?;

        let mime = match image::guess_format(&bytes) {
            Ok(image::ImageFormat::Jpeg) => "image/jpeg",
            Ok(image::ImageFormat::Tiff) => "image/tiff",
            _ => "image/png",
        };
        let image_data = ImageData::new(STANDARD.encode(&bytes), mime).with_detail("high");

        let messages = vec![
            ChatMessage::system(transcription_prompt(&self.language)),
            // VLM APIs require a user turn; the image carries the content.
            ChatMessage::user_with_images("", vec![image_data]),
        ];
        let options = CompletionOptions {
            // Deterministic transcription, not creativity.
            temperature: Some(0.0),
            max_tokens: Some(2048),
            ..Default::default()
        };

        let response = self
            .provider
            .chat(&messages, Some(&options))
            .await
            .map_err(|e| {
                warn!("vlm recognition failed: {e}");
                OcrEngineError(format!("{e}"))
            })?;

        let lines = parse_lines(&response.content);
        debug!("vlm recognised {} line(s)", lines.len());
        Ok(lines)
    }
}

/// Normalise a model response into recognized lines.
///
/// Strips a wrapping code fence (models add them despite instructions),
/// drops blank lines, and maps the no-text sentinel to an empty list.
fn parse_lines(content: &str) -> Vec<String> {
    let unfenced = match CODE_FENCE.captures(content) {
        Some(caps) => caps.get(1).map(|m| m.as_str()).unwrap_or(content),
        None => content,
    };
    let trimmed = unfenced.trim();
    if trimmed.is_empty() || trimmed == NO_TEXT_SENTINEL {
        return Vec::new();
    }
    trimmed
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}
