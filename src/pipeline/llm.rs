//! Model interaction: send the job description, page image and prompt, get prose back.
//!
//! [`ModelInvoker`] is the seam between the pipeline and the hosted model.
//! [`LlmInvoker`] is the production implementation over an
//! `edgequake_llm` provider; tests substitute their own.
//!
//! ## Retry Strategy
//!
//! Failed or timed-out calls are retried with exponential backoff
//! (`retry_backoff_ms * 2^attempt`): with 500 ms base and 3 retries the
//! waits are 500 ms → 1 s → 2 s. After the last attempt the final error
//! surfaces as [`AtsError::GenerationFailed`].

use crate::config::EvaluationConfig;
use crate::error::AtsError;
use crate::progress::ProgressCallback;
use async_trait::async_trait;
use edgequake_llm::{ChatMessage, CompletionOptions, ImageData, LLMProvider, ProviderFactory};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tokio::time::{sleep, timeout, Duration};
use tracing::{debug, info, warn};

/// Default model when Gemini is picked from `GEMINI_API_KEY` / `GOOGLE_API_KEY`.
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash";

/// Default model when a provider is named without a model.
pub const DEFAULT_MODEL: &str = "gpt-4.1-mini";

/// The model's answer plus accounting.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelReply {
    /// Reply text, exactly as returned.
    pub text: String,
    pub input_tokens: usize,
    pub output_tokens: usize,
    /// Retries spent before the call succeeded.
    pub retries: u32,
    pub duration_ms: u64,
}

impl ModelReply {
    /// A reply with no accounting, for fakes and tests.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }
}

/// Anything that can turn (job description, page image, prompt) into a reply.
#[async_trait]
pub trait ModelInvoker: Send + Sync {
    async fn generate(
        &self,
        job_description: &str,
        image: ImageData,
        prompt: &str,
    ) -> Result<ModelReply, AtsError>;
}

/// [`ModelInvoker`] backed by an `edgequake_llm` provider.
pub struct LlmInvoker {
    provider: Arc<dyn LLMProvider>,
    temperature: f32,
    max_tokens: usize,
    max_retries: u32,
    retry_backoff_ms: u64,
    api_timeout_secs: u64,
    progress: Option<ProgressCallback>,
}

impl LlmInvoker {
    /// Wrap an already-constructed provider, taking call settings from `config`.
    pub fn new(provider: Arc<dyn LLMProvider>, config: &EvaluationConfig) -> Self {
        Self {
            provider,
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            max_retries: config.max_retries,
            retry_backoff_ms: config.retry_backoff_ms,
            api_timeout_secs: config.api_timeout_secs,
            progress: config.progress_callback.clone(),
        }
    }

    /// Resolve a provider from `config` (see [`resolve_provider`]) and wrap it.
    pub fn from_config(config: &EvaluationConfig) -> Result<Self, AtsError> {
        let provider = resolve_provider(config)?;
        Ok(Self::new(provider, config))
    }

    fn options(&self) -> CompletionOptions {
        CompletionOptions {
            temperature: Some(self.temperature),
            max_tokens: Some(self.max_tokens),
            ..Default::default()
        }
    }
}

/// Message layout: one user turn with the job description and the page
/// image, then one user turn carrying the instruction prompt.
pub fn build_messages(job_description: &str, image: ImageData, prompt: &str) -> Vec<ChatMessage> {
    vec![
        ChatMessage::user_with_images(job_description, vec![image]),
        ChatMessage::user(prompt),
    ]
}

#[async_trait]
impl ModelInvoker for LlmInvoker {
    async fn generate(
        &self,
        job_description: &str,
        image: ImageData,
        prompt: &str,
    ) -> Result<ModelReply, AtsError> {
        let start = Instant::now();
        let messages = build_messages(job_description, image, prompt);
        let options = self.options();
        let call_timeout = Duration::from_secs(self.api_timeout_secs);

        let mut last_err: Option<String> = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let backoff = self.retry_backoff_ms * 2u64.pow(attempt - 1);
                warn!(
                    "Model call: retry {}/{} after {}ms",
                    attempt, self.max_retries, backoff
                );
                if let (Some(cb), Some(err)) = (&self.progress, &last_err) {
                    cb.on_retry(attempt, self.max_retries, err);
                }
                sleep(Duration::from_millis(backoff)).await;
            }

            match timeout(call_timeout, self.provider.chat(&messages, Some(&options))).await {
                Ok(Ok(response)) => {
                    let duration = start.elapsed();
                    debug!(
                        "Model call: {} input tokens, {} output tokens, {:?}",
                        response.prompt_tokens, response.completion_tokens, duration
                    );
                    return Ok(ModelReply {
                        text: response.content,
                        input_tokens: response.prompt_tokens as usize,
                        output_tokens: response.completion_tokens as usize,
                        retries: attempt,
                        duration_ms: duration.as_millis() as u64,
                    });
                }
                Ok(Err(e)) => {
                    let err_msg = e.to_string();
                    warn!("Model call: attempt {} failed: {}", attempt + 1, err_msg);
                    last_err = Some(err_msg);
                }
                Err(_) => {
                    let err_msg = format!("timed out after {}s", self.api_timeout_secs);
                    warn!("Model call: attempt {} {}", attempt + 1, err_msg);
                    last_err = Some(err_msg);
                }
            }
        }

        Err(AtsError::GenerationFailed {
            retries: self.max_retries,
            message: last_err.unwrap_or_else(|| "Unknown error".to_string()),
        })
    }
}

fn create_provider(provider_name: &str, model: &str) -> Result<Arc<dyn LLMProvider>, AtsError> {
    ProviderFactory::create_llm_provider(provider_name, model).map_err(|e| {
        AtsError::ProviderNotConfigured {
            provider: provider_name.to_string(),
            hint: format!("{e}"),
        }
    })
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

/// Resolve the LLM provider, from most-specific to least-specific.
///
/// 1. **Pre-built provider** (`config.provider`), used as-is.
/// 2. **Named provider** (`config.provider_name`) with `config.model`
///    or [`DEFAULT_MODEL`].
/// 3. **Environment pair** `EDGEQUAKE_LLM_PROVIDER` + `EDGEQUAKE_MODEL`.
/// 4. **Gemini key** `GEMINI_API_KEY` or `GOOGLE_API_KEY`, with
///    `config.model` or [`DEFAULT_GEMINI_MODEL`].
/// 5. **Full auto-detection** via `ProviderFactory::from_env`.
pub fn resolve_provider(config: &EvaluationConfig) -> Result<Arc<dyn LLMProvider>, AtsError> {
    if let Some(ref provider) = config.provider {
        return Ok(Arc::clone(provider));
    }

    if let Some(ref name) = config.provider_name {
        let model = config.model.as_deref().unwrap_or(DEFAULT_MODEL);
        info!("Using provider {} ({})", name, model);
        return create_provider(name, model);
    }

    if let (Some(prov), Some(model)) = (
        non_empty_env("EDGEQUAKE_LLM_PROVIDER"),
        non_empty_env("EDGEQUAKE_MODEL"),
    ) {
        info!("Using provider {} ({}) from environment", prov, model);
        return create_provider(&prov, &model);
    }

    if non_empty_env("GEMINI_API_KEY").is_some() || non_empty_env("GOOGLE_API_KEY").is_some() {
        let model = config.model.as_deref().unwrap_or(DEFAULT_GEMINI_MODEL);
        info!("Using provider gemini ({})", model);
        return create_provider("gemini", model);
    }

    let (llm_provider, _embedding) =
        ProviderFactory::from_env().map_err(|e| AtsError::ProviderNotConfigured {
            provider: "auto".to_string(),
            hint: format!(
                "No LLM provider could be auto-detected from environment.\n\
                Set GEMINI_API_KEY, OPENAI_API_KEY, ANTHROPIC_API_KEY, or pass --provider.\n\
                Error: {}",
                e
            ),
        })?;

    Ok(llm_provider)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image() -> ImageData {
        ImageData::new("aGVsbG8=", "image/jpeg")
    }

    #[test]
    fn messages_carry_job_description_image_then_prompt() {
        let msgs = build_messages("Rust engineer", image(), "Evaluate this.");
        assert_eq!(msgs.len(), 2);
        assert_eq!(msgs[0].content, "Rust engineer");
        assert_eq!(msgs[1].content, "Evaluate this.");
    }

    #[test]
    fn reply_text_constructor() {
        let r = ModelReply::text("Relevance Percentage: 80%");
        assert_eq!(r.text, "Relevance Percentage: 80%");
        assert_eq!(r.retries, 0);
    }
}
