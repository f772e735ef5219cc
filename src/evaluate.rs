//! Evaluation entry points.
//!
//! Every entry point runs the same pipeline and differs only in where the
//! resume comes from and which [`ModelInvoker`] answers:
//!
//! | Function | Resume | Model |
//! |----------|--------|-------|
//! | [`evaluate`] | path or URL | resolved from config |
//! | [`evaluate_bytes`] | in-memory PDF | resolved from config |
//! | [`evaluate_with`] | path or URL | caller-supplied |
//! | [`evaluate_image`] | already-rendered page | caller-supplied |
//!
//! Missing inputs are checked before any I/O: an empty job description or
//! empty resume fails with [`AtsError::MissingInput`] without touching pdfium
//! or the network.

use crate::config::EvaluationConfig;
use crate::error::AtsError;
use crate::output::{EvaluationOutput, EvaluationStats};
use crate::pipeline::input::{self, ResolvedInput};
use crate::pipeline::llm::{LlmInvoker, ModelInvoker};
use crate::pipeline::{encode, render};
use crate::progress::Stage;
use crate::prompts::build_prompt;
use crate::score::extract_score;
use image::DynamicImage;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Evaluate a resume (local path or HTTP/HTTPS URL) against a job description.
///
/// The model provider is resolved from `config` (see
/// [`crate::pipeline::llm::resolve_provider`]).
///
/// # Errors
/// - [`AtsError::MissingInput`] when either input is empty
/// - input / PDF errors from resolving and rendering the resume
/// - [`AtsError::ProviderNotConfigured`] when no model can be resolved
/// - [`AtsError::GenerationFailed`] when the model call fails after retries
///
/// A reply without a score marker is **not** an error: `output.score` is
/// `None`.
pub async fn evaluate(
    resume: impl AsRef<str>,
    job_description: &str,
    config: &EvaluationConfig,
) -> Result<EvaluationOutput, AtsError> {
    require_job_description(job_description)?;
    let resolved = resolve_stage(resume.as_ref(), config).await?;
    let invoker = LlmInvoker::from_config(config)?;
    evaluate_resolved(&invoker, &resolved, job_description, config).await
}

/// Evaluate a resume held in memory, e.g. a browser upload.
///
/// # Example
/// ```rust,no_run
/// use edgequake_ats::{evaluate_bytes, EvaluationConfig, EvaluationMode};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let bytes = std::fs::read("resume.pdf")?;
/// let config = EvaluationConfig::builder().mode(EvaluationMode::FewShot).build()?;
/// let output = evaluate_bytes(&bytes, "Senior Rust engineer, tokio, Postgres", &config).await?;
/// println!("{}", output.reply);
/// # Ok(())
/// # }
/// ```
pub async fn evaluate_bytes(
    bytes: &[u8],
    job_description: &str,
    config: &EvaluationConfig,
) -> Result<EvaluationOutput, AtsError> {
    require_job_description(job_description)?;
    let resolved = staged(config, Stage::Resolve, async { input::resolve_bytes(bytes) }).await?;
    let invoker = LlmInvoker::from_config(config)?;
    evaluate_resolved(&invoker, &resolved, job_description, config).await
}

/// Like [`evaluate`], but with a caller-supplied model.
pub async fn evaluate_with(
    invoker: &dyn ModelInvoker,
    resume: impl AsRef<str>,
    job_description: &str,
    config: &EvaluationConfig,
) -> Result<EvaluationOutput, AtsError> {
    require_job_description(job_description)?;
    let resolved = resolve_stage(resume.as_ref(), config).await?;
    evaluate_resolved(invoker, &resolved, job_description, config).await
}

/// Run the post-render half of the pipeline on an already-rasterised page:
/// encode, prompt, call the model, extract.
pub async fn evaluate_image(
    invoker: &dyn ModelInvoker,
    page: &DynamicImage,
    job_description: &str,
    config: &EvaluationConfig,
) -> Result<EvaluationOutput, AtsError> {
    require_job_description(job_description)?;
    let start = Instant::now();
    let mut output = generate_and_extract(invoker, page, job_description, config).await?;
    output.stats.total_duration_ms = start.elapsed().as_millis() as u64;
    Ok(output)
}

/// Synchronous wrapper around [`evaluate`].
///
/// Creates a temporary tokio runtime internally.
pub fn evaluate_sync(
    resume: impl AsRef<str>,
    job_description: &str,
    config: &EvaluationConfig,
) -> Result<EvaluationOutput, AtsError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| AtsError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(evaluate(resume, job_description, config))
}

/// Evaluate and write the Markdown report to `output_path`.
///
/// Uses atomic write (temp file + rename) to prevent partial files.
pub async fn evaluate_to_file(
    resume: impl AsRef<str>,
    job_description: &str,
    output_path: impl AsRef<Path>,
    config: &EvaluationConfig,
) -> Result<EvaluationOutput, AtsError> {
    let output = evaluate(resume, job_description, config).await?;
    write_report(&output, output_path.as_ref()).await?;
    Ok(output)
}

/// Atomically write `output` as a Markdown report.
pub async fn write_report(output: &EvaluationOutput, path: &Path) -> Result<(), AtsError> {
    let write_err = |source: std::io::Error| AtsError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(write_err)?;
    }

    let tmp_path = path.with_extension("md.tmp");
    tokio::fs::write(&tmp_path, output.to_markdown())
        .await
        .map_err(write_err)?;
    tokio::fs::rename(&tmp_path, path).await.map_err(write_err)?;

    info!("Report written to {}", path.display());
    Ok(())
}

// ── Internal helpers ─────────────────────────────────────────────────────

fn require_job_description(job_description: &str) -> Result<(), AtsError> {
    if job_description.trim().is_empty() {
        return Err(AtsError::MissingInput {
            what: "no job description supplied".into(),
        });
    }
    Ok(())
}

async fn resolve_stage(resume: &str, config: &EvaluationConfig) -> Result<ResolvedInput, AtsError> {
    staged(
        config,
        Stage::Resolve,
        input::resolve_input(resume, config.download_timeout_secs),
    )
    .await
}

/// Run `fut` as `stage`, reporting start/complete/error to the progress callback.
async fn staged<T, F>(config: &EvaluationConfig, stage: Stage, fut: F) -> Result<T, AtsError>
where
    F: std::future::Future<Output = Result<T, AtsError>>,
{
    let cb = config.progress_callback.as_ref();
    if let Some(cb) = cb {
        cb.on_stage_start(stage);
    }
    let start = Instant::now();
    let result = fut.await;
    if let Some(cb) = cb {
        match &result {
            Ok(_) => cb.on_stage_complete(stage, start.elapsed().as_millis() as u64),
            Err(e) => cb.on_stage_error(stage, &e.to_string()),
        }
    }
    result
}

async fn evaluate_resolved(
    invoker: &dyn ModelInvoker,
    resolved: &ResolvedInput,
    job_description: &str,
    config: &EvaluationConfig,
) -> Result<EvaluationOutput, AtsError> {
    let total_start = Instant::now();
    info!("Evaluating {} ({})", resolved.path().display(), config.mode);

    let render_start = Instant::now();
    let page = staged(
        config,
        Stage::Render,
        render::render_first_page(resolved.path(), config),
    )
    .await?;
    let render_duration_ms = render_start.elapsed().as_millis() as u64;

    let mut output = generate_and_extract(invoker, &page, job_description, config).await?;
    output.stats.render_duration_ms = render_duration_ms;
    output.stats.total_duration_ms = total_start.elapsed().as_millis() as u64;

    info!(
        "Evaluation complete in {}ms (score: {})",
        output.stats.total_duration_ms,
        output
            .score
            .map(|s| s.to_string())
            .unwrap_or_else(|| "none".to_string())
    );
    Ok(output)
}

async fn generate_and_extract(
    invoker: &dyn ModelInvoker,
    page: &DynamicImage,
    job_description: &str,
    config: &EvaluationConfig,
) -> Result<EvaluationOutput, AtsError> {
    let (image, image_bytes) = staged(config, Stage::Encode, async {
        encode::encode_page(page, config.jpeg_quality)
    })
    .await?;

    let prompt = build_prompt(config.mode, job_description, &config.resume_content);
    debug!("Prompt: {} mode, {} chars", config.mode, prompt.len());

    let reply = staged(
        config,
        Stage::Generate,
        invoker.generate(job_description, image, &prompt),
    )
    .await?;

    let score = if config.action.extracts_score() {
        let score = staged(config, Stage::Extract, async { Ok(extract_score(&reply.text)) }).await?;
        if score.is_none() {
            warn!("No relevance percentage found in model reply");
        }
        score
    } else {
        None
    };

    Ok(EvaluationOutput {
        mode: config.mode,
        action: config.action,
        reply: reply.text,
        score,
        stats: EvaluationStats {
            input_tokens: reply.input_tokens,
            output_tokens: reply.output_tokens,
            retries: reply.retries,
            image_bytes,
            render_duration_ms: 0,
            llm_duration_ms: reply.duration_ms,
            total_duration_ms: 0,
        },
    })
}
