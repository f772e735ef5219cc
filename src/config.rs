//! Configuration types for resume evaluation.
//!
//! All evaluation behaviour is controlled through [`EvaluationConfig`], built
//! via its [`EvaluationConfigBuilder`]. The config is an explicit value: the
//! model client is resolved from it at call time and never stored in a
//! global, so tests can hand in a pre-built provider or skip the provider
//! entirely with [`crate::evaluate::evaluate_with`].

use crate::error::AtsError;
use crate::progress::ProgressCallback;
use crate::prompts::EvaluationMode;
use edgequake_llm::LLMProvider;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Text substituted for the resume placeholder in One-Shot and Few-Shot
/// prompts. The resume itself travels as an image.
pub const DEFAULT_RESUME_CONTENT: &str = "Resume content embedded as an image.";

/// Configuration for a single resume evaluation.
///
/// # Example
/// ```rust
/// use edgequake_ats::{EvaluationConfig, EvaluationMode};
///
/// let config = EvaluationConfig::builder()
///     .mode(EvaluationMode::FewShot)
///     .model("gemini-2.0-flash")
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct EvaluationConfig {
    /// Prompting strategy. Default: [`EvaluationMode::ZeroShot`].
    pub mode: EvaluationMode,

    /// Whether to extract a relevance score from the reply. Default: [`EvaluationAction::PercentageMatch`].
    pub action: EvaluationAction,

    /// Text standing in for the resume inside One-Shot/Few-Shot prompts.
    pub resume_content: String,

    /// LLM model identifier, e.g. "gemini-2.0-flash", "gpt-4.1-mini".
    /// If None, uses the resolved provider's default.
    pub model: Option<String>,

    /// LLM provider name (e.g. "gemini", "openai", "anthropic").
    /// If None along with `provider`, the provider is auto-detected.
    pub provider_name: Option<String>,

    /// Pre-constructed LLM provider. Takes precedence over `provider_name`.
    pub provider: Option<Arc<dyn LLMProvider>>,

    /// Sampling temperature. Range 0.0–2.0. Default: 0.2.
    ///
    /// Kept low so repeated evaluations of the same resume land on similar
    /// percentages.
    pub temperature: f32,

    /// Maximum tokens the model may generate. Default: 2048.
    pub max_tokens: usize,

    /// Retry attempts on a failed model call. Default: 3.
    pub max_retries: u32,

    /// Initial retry delay in milliseconds, doubled per attempt. Default: 500.
    pub retry_backoff_ms: u64,

    /// Per-call model timeout in seconds. Default: 60.
    pub api_timeout_secs: u64,

    /// Download timeout for URL inputs in seconds. Default: 120.
    pub download_timeout_secs: u64,

    /// Rendering DPI for the first resume page. Range: 72–400. Default: 150.
    pub dpi: u32,

    /// Longest edge of the rendered page in pixels. Default: 2000.
    pub max_rendered_pixels: u32,

    /// JPEG quality for the encoded page. Range: 1–100. Default: 90.
    pub jpeg_quality: u8,

    /// PDF user password for encrypted resumes.
    pub password: Option<String>,

    /// Path to a pdfium shared library. Falls back to `PDFIUM_LIB_PATH`,
    /// then to the system library search path.
    pub pdfium_lib_path: Option<PathBuf>,

    /// Optional progress callback. Receives per-stage events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            mode: EvaluationMode::default(),
            action: EvaluationAction::default(),
            resume_content: DEFAULT_RESUME_CONTENT.to_string(),
            model: None,
            provider_name: None,
            provider: None,
            temperature: 0.2,
            max_tokens: 2048,
            max_retries: 3,
            retry_backoff_ms: 500,
            api_timeout_secs: 60,
            download_timeout_secs: 120,
            dpi: 150,
            max_rendered_pixels: 2000,
            jpeg_quality: 90,
            password: None,
            pdfium_lib_path: None,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for EvaluationConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EvaluationConfig")
            .field("mode", &self.mode)
            .field("action", &self.action)
            .field("model", &self.model)
            .field("provider_name", &self.provider_name)
            .field("provider", &self.provider.as_ref().map(|_| "<dyn LLMProvider>"))
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("max_retries", &self.max_retries)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .field("dpi", &self.dpi)
            .field("max_rendered_pixels", &self.max_rendered_pixels)
            .field("jpeg_quality", &self.jpeg_quality)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn EvaluationProgressCallback>"),
            )
            .finish()
    }
}

impl EvaluationConfig {
    /// Create a new builder for `EvaluationConfig`.
    pub fn builder() -> EvaluationConfigBuilder {
        EvaluationConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`EvaluationConfig`].
#[derive(Debug)]
pub struct EvaluationConfigBuilder {
    config: EvaluationConfig,
}

impl EvaluationConfigBuilder {
    pub fn mode(mut self, mode: EvaluationMode) -> Self {
        self.config.mode = mode;
        self
    }

    pub fn action(mut self, action: EvaluationAction) -> Self {
        self.config.action = action;
        self
    }

    pub fn resume_content(mut self, text: impl Into<String>) -> Self {
        self.config.resume_content = text.into();
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = Some(model.into());
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.config.provider = Some(provider);
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn max_retries(mut self, n: u32) -> Self {
        self.config.max_retries = n;
        self
    }

    pub fn retry_backoff_ms(mut self, ms: u64) -> Self {
        self.config.retry_backoff_ms = ms;
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs;
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    pub fn dpi(mut self, dpi: u32) -> Self {
        self.config.dpi = dpi.clamp(72, 400);
        self
    }

    pub fn max_rendered_pixels(mut self, px: u32) -> Self {
        self.config.max_rendered_pixels = px.max(100);
        self
    }

    pub fn jpeg_quality(mut self, q: u8) -> Self {
        self.config.jpeg_quality = q;
        self
    }

    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        self.config.password = Some(pwd.into());
        self
    }

    pub fn pdfium_lib_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.pdfium_lib_path = Some(path.into());
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<EvaluationConfig, AtsError> {
        let c = &self.config;
        if c.jpeg_quality == 0 || c.jpeg_quality > 100 {
            return Err(AtsError::InvalidConfig(format!(
                "JPEG quality must be 1–100, got {}",
                c.jpeg_quality
            )));
        }
        if c.max_tokens == 0 {
            return Err(AtsError::InvalidConfig("max_tokens must be ≥ 1".into()));
        }
        if c.api_timeout_secs == 0 {
            return Err(AtsError::InvalidConfig("API timeout must be ≥ 1s".into()));
        }
        Ok(self.config)
    }
}

/// What the caller wants back from an evaluation.
///
/// `Review` returns the model's prose only. `PercentageMatch` additionally
/// runs [`crate::score::extract_score`] over the reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EvaluationAction {
    /// "Tell me about my resume": show the evaluation only.
    Review,
    /// "Percentage Match": show the evaluation and a relevance score. (default)
    #[default]
    PercentageMatch,
}

impl EvaluationAction {
    pub fn extracts_score(self) -> bool {
        matches!(self, EvaluationAction::PercentageMatch)
    }
}
