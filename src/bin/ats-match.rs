//! CLI binary for edgequake-ats.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `EvaluationConfig`, prints the model's reply verbatim and, for a
//! percentage match, a gauge or a "no percentage" notice.

use anyhow::{Context, Result};
use clap::Parser;
use edgequake_ats::{
    evaluate, write_report, AtsError, EvaluationAction, EvaluationConfig, EvaluationMode,
    EvaluationOutput, EvaluationProgressCallback, ProgressCallback, Stage, NO_SCORE_NOTICE,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, IsTerminal, Read, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
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

/// Spinner on stderr showing the current stage, with one log line per
/// finished stage.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}  {elapsed:.dim}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
        bar.set_style(style);
        bar.set_prefix("Evaluating");
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self { bar })
    }

    fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl EvaluationProgressCallback for CliProgressCallback {
    fn on_stage_start(&self, stage: Stage) {
        self.bar.set_message(format!("{stage}…"));
    }

    fn on_stage_complete(&self, stage: Stage, elapsed_ms: u64) {
        self.bar.println(format!(
            "  {} {:<28} {}",
            green("✓"),
            stage.describe(),
            dim(&format!("{:.1}s", elapsed_ms as f64 / 1000.0)),
        ));
    }

    fn on_retry(&self, attempt: u32, max_retries: u32, error: &str) {
        let msg = if error.len() > 80 {
            format!("{}\u{2026}", error.chars().take(79).collect::<String>())
        } else {
            error.to_string()
        };
        self.bar.println(format!(
            "  {} retry {attempt}/{max_retries}  {}",
            yellow("↻"),
            dim(&msg)
        ));
    }

    fn on_stage_error(&self, stage: Stage, _error: &str) {
        self.bar.println(format!("  {} {}", red("✗"), stage.describe()));
        self.bar.finish_and_clear();
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Percentage match, job description inline
  ats-match resume.pdf --job "Senior Rust engineer: tokio, Postgres, Kubernetes"

  # Few-shot prompting, job description from a file
  ats-match resume.pdf --job-file posting.txt --mode few-shot

  # Evaluation prose only ("Tell me about my resume")
  ats-match resume.pdf --job-file posting.txt --action review

  # Job description from stdin, report to a file
  cat posting.txt | ats-match https://example.com/cv.pdf -o report.md

  # Machine-readable output
  ats-match resume.pdf --job-file posting.txt --json

EVALUATION MODES:
  zero-shot   instruction only (default)
  one-shot    one worked example (100% match) before your request
  few-shot    two worked examples (100% and 66.7%) to encourage graded scores

ENVIRONMENT VARIABLES:
  GEMINI_API_KEY          Google Gemini API key (GOOGLE_API_KEY also accepted)
  OPENAI_API_KEY          OpenAI API key
  ANTHROPIC_API_KEY       Anthropic API key
  EDGEQUAKE_LLM_PROVIDER  Override provider (gemini, openai, anthropic, ollama)
  EDGEQUAKE_MODEL         Override model ID
  PDFIUM_LIB_PATH         Path to an existing libpdfium
"#;

/// Score a PDF resume against a job description using Vision LLMs.
#[derive(Parser, Debug)]
#[command(
    name = "ats-match",
    version,
    about = "Score a PDF resume against a job description using Vision LLMs",
    long_about = "Render the first page of a PDF resume, send it with a job description to a \
Vision Language Model, print the model's evaluation, and extract a relevance percentage. \
Supports Google Gemini, OpenAI, Anthropic, Azure OpenAI, and any OpenAI-compatible endpoint.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Resume: local PDF path or HTTP/HTTPS URL.
    resume: String,

    /// Job description text.
    #[arg(short, long, conflicts_with = "job_file")]
    job: Option<String>,

    /// Read the job description from a file ("-" for stdin).
    #[arg(long, env = "ATS_JOB_FILE")]
    job_file: Option<PathBuf>,

    /// Evaluation mode.
    #[arg(short, long, env = "ATS_MODE", value_enum, default_value = "zero-shot")]
    mode: ModeArg,

    /// match: evaluation plus relevance percentage; review: evaluation only.
    #[arg(short, long, env = "ATS_ACTION", value_enum, default_value = "match")]
    action: ActionArg,

    /// Also write a Markdown report to this file.
    #[arg(short, long, env = "ATS_OUTPUT")]
    output: Option<PathBuf>,

    /// LLM model ID (e.g. gemini-2.0-flash, gpt-4.1-mini, claude-sonnet-4-20250514).
    #[arg(long, env = "EDGEQUAKE_MODEL")]
    model: Option<String>,

    /// LLM provider: gemini, openai, anthropic, ollama, azure.
    #[arg(long, env = "EDGEQUAKE_PROVIDER")]
    provider: Option<String>,

    /// Text substituted for the resume in one-shot/few-shot prompts.
    #[arg(long, env = "ATS_RESUME_TEXT")]
    resume_text: Option<String>,

    /// Rendering DPI (72–400).
    #[arg(long, env = "ATS_DPI", default_value_t = 150,
          value_parser = clap::value_parser!(u32).range(72..=400))]
    dpi: u32,

    /// JPEG quality for the page image (1–100).
    #[arg(long, env = "ATS_JPEG_QUALITY", default_value_t = 90,
          value_parser = clap::value_parser!(u8).range(1..=100))]
    jpeg_quality: u8,

    /// PDF user password for encrypted resumes.
    #[arg(long, env = "ATS_PASSWORD")]
    password: Option<String>,

    /// Path to a pdfium shared library.
    #[arg(long, env = "PDFIUM_LIB_PATH")]
    pdfium_lib: Option<PathBuf>,

    /// Max LLM output tokens.
    #[arg(long, env = "ATS_MAX_TOKENS", default_value_t = 2048)]
    max_tokens: usize,

    /// LLM temperature (0.0–2.0).
    #[arg(long, env = "ATS_TEMPERATURE", default_value_t = 0.2)]
    temperature: f32,

    /// Retries on model failure.
    #[arg(long, env = "ATS_MAX_RETRIES", default_value_t = 3)]
    max_retries: u32,

    /// Model call timeout in seconds.
    #[arg(long, env = "ATS_API_TIMEOUT", default_value_t = 60)]
    api_timeout: u64,

    /// HTTP download timeout in seconds (URL resumes).
    #[arg(long, env = "ATS_DOWNLOAD_TIMEOUT", default_value_t = 120)]
    download_timeout: u64,

    /// Output structured JSON (EvaluationOutput) instead of text.
    #[arg(long, env = "ATS_JSON")]
    json: bool,

    /// Disable the progress spinner.
    #[arg(long, env = "ATS_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "ATS_VERBOSE")]
    verbose: bool,

    /// Suppress all output except the reply and errors.
    #[arg(short, long, env = "ATS_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum ModeArg {
    ZeroShot,
    OneShot,
    FewShot,
}

impl From<ModeArg> for EvaluationMode {
    fn from(v: ModeArg) -> Self {
        match v {
            ModeArg::ZeroShot => EvaluationMode::ZeroShot,
            ModeArg::OneShot => EvaluationMode::OneShot,
            ModeArg::FewShot => EvaluationMode::FewShot,
        }
    }
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum ActionArg {
    Match,
    Review,
}

impl From<ActionArg> for EvaluationAction {
    fn from(v: ActionArg) -> Self {
        match v {
            ActionArg::Match => EvaluationAction::PercentageMatch,
            ActionArg::Review => EvaluationAction::Review,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // INFO logs would interleave with the spinner, so they are muted while
    // it is active.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json && io::stderr().is_terminal();
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

    let job_description = read_job_description(&cli).await?;

    let progress = show_progress.then(CliProgressCallback::new);
    let config = build_config(
        &cli,
        progress.clone().map(|cb| cb as ProgressCallback),
    )?;

    let result = evaluate(&cli.resume, &job_description, &config).await;
    if let Some(ref cb) = progress {
        cb.finish();
    }
    let output = match result {
        Ok(output) => output,
        Err(e) => match input_warning(&e) {
            Some(warning) => {
                eprintln!("{warning}");
                std::process::exit(2);
            }
            None => return Err(e).context("Evaluation failed"),
        },
    };

    if let Some(ref path) = cli.output {
        write_report(&output, path)
            .await
            .context("Failed to write report")?;
    }

    if cli.json {
        let json = serde_json::to_string_pretty(&output).context("Failed to serialise output")?;
        println!("{json}");
    } else {
        print_output(&output, cli.quiet)?;
    }

    if !cli.quiet && !cli.json {
        if let Some(ref path) = cli.output {
            eprintln!("{}  report  →  {}", green("✔"), bold(&path.display().to_string()));
        }
        eprintln!(
            "   {} tokens in  /  {} tokens out,  {}ms total",
            dim(&output.stats.input_tokens.to_string()),
            dim(&output.stats.output_tokens.to_string()),
            output.stats.total_duration_ms,
        );
    }

    Ok(())
}

/// Warning line for errors the user fixes by changing the input, such as a
/// missing job description. Other errors are hard failures.
fn input_warning(err: &AtsError) -> Option<String> {
    err.is_user_correctable()
        .then(|| format!("{} {}", yellow("⚠"), err))
}

/// Print the reply verbatim, then the score gauge or the no-score notice.
fn print_output(output: &EvaluationOutput, quiet: bool) -> Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();

    if !quiet {
        writeln!(handle, "{}", bold("### AI Response:"))?;
    }
    handle
        .write_all(output.reply.as_bytes())
        .context("Failed to write to stdout")?;
    if !output.reply.ends_with('\n') {
        handle.write_all(b"\n").ok();
    }

    if output.action.extracts_score() {
        match (output.score, output.score_gauge(40)) {
            (Some(score), Some(gauge)) => {
                writeln!(handle)?;
                writeln!(handle, "{}", bold(&format!("### Match Percentage: {score}")))?;
                writeln!(handle, "{gauge}")?;
            }
            _ => eprintln!("{} {}", yellow("⚠"), NO_SCORE_NOTICE),
        }
    }
    Ok(())
}

/// Job description from `--job`, `--job-file` (`-` = stdin), or piped stdin.
///
/// Returns an empty string when none is given; the library reports that as
/// a missing input.
async fn read_job_description(cli: &Cli) -> Result<String> {
    if let Some(ref text) = cli.job {
        return Ok(text.clone());
    }

    match cli.job_file {
        Some(ref path) if path.as_os_str() == "-" => read_stdin(),
        Some(ref path) => tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read job description from {:?}", path)),
        None if !io::stdin().is_terminal() => read_stdin(),
        None => Ok(String::new()),
    }
}

fn read_stdin() -> Result<String> {
    let mut buf = String::new();
    io::stdin()
        .read_to_string(&mut buf)
        .context("Failed to read job description from stdin")?;
    Ok(buf)
}

/// Map CLI args to `EvaluationConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<EvaluationConfig> {
    let mut builder = EvaluationConfig::builder()
        .mode(cli.mode.into())
        .action(cli.action.into())
        .dpi(cli.dpi)
        .jpeg_quality(cli.jpeg_quality)
        .max_tokens(cli.max_tokens)
        .temperature(cli.temperature)
        .max_retries(cli.max_retries)
        .api_timeout_secs(cli.api_timeout)
        .download_timeout_secs(cli.download_timeout);

    if let Some(ref text) = cli.resume_text {
        builder = builder.resume_content(text.clone());
    }
    if let Some(ref path) = cli.pdfium_lib {
        builder = builder.pdfium_lib_path(path.clone());
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    let mut config = builder.build().context("Invalid configuration")?;

    config.model = cli.model.clone();
    config.provider_name = cli.provider.clone();
    config.password = cli.password.clone();

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_input_is_a_warning() {
        let err = AtsError::MissingInput {
            what: "no job description supplied".into(),
        };
        let line = input_warning(&err).expect("missing input should warn");
        assert!(line.contains('⚠'));
        assert!(line.contains("no job description supplied"));
    }

    #[test]
    fn unknown_mode_and_bad_path_are_warnings() {
        assert!(input_warning(&AtsError::UnknownMode("Two-Shot".into())).is_some());
        assert!(input_warning(&AtsError::FileNotFound {
            path: PathBuf::from("cv.pdf")
        })
        .is_some());
    }

    #[test]
    fn model_failure_is_not_a_warning() {
        let err = AtsError::GenerationFailed {
            retries: 3,
            message: "503".into(),
        };
        assert_eq!(input_warning(&err), None);
    }
}
