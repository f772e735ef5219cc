//! # edgequake-ats
//!
//! Score a PDF resume against a job description with a Vision Language Model.
//!
//! The first page of the resume is rasterised and sent to the model together
//! with the job description and an instruction prompt. The model answers in
//! prose and ends with a marker line, `Relevance Percentage: XX%`, which is
//! read back into a number.
//!
//! ## Pipeline Overview
//!
//! ```text
//! resume.pdf + job description
//!  │
//!  ├─ 1. Input    resolve local file, URL or uploaded bytes
//!  ├─ 2. Render   first page via pdfium (spawn_blocking)
//!  ├─ 3. Encode   RGB → JPEG → base64 ImageData
//!  ├─ 4. Prompt   Zero-Shot / One-Shot / Few-Shot template
//!  ├─ 5. VLM      one call with retry/backoff and a per-call timeout
//!  └─ 6. Score    "Relevance Percentage: XX%" or "Total Score: X/Y"
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use edgequake_ats::{evaluate, EvaluationConfig, EvaluationMode};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Provider auto-detected from GEMINI_API_KEY / OPENAI_API_KEY / ANTHROPIC_API_KEY
//!     let config = EvaluationConfig::builder()
//!         .mode(EvaluationMode::FewShot)
//!         .build()?;
//!     let output = evaluate("resume.pdf", "Backend engineer: Rust, Postgres, Kubernetes", &config).await?;
//!     println!("{}", output.reply);
//!     match output.score {
//!         Some(score) => println!("Match: {score}"),
//!         None => println!("{}", edgequake_ats::NO_SCORE_NOTICE),
//!     }
//!     Ok(())
//! }
//! ```
//!
//! The two pure pieces can be used on their own, with no model or PDF:
//!
//! ```rust
//! use edgequake_ats::{build_prompt, extract_percentage, EvaluationMode};
//!
//! let prompt = build_prompt(EvaluationMode::OneShot, "Data engineer", "Spark, Airflow");
//! assert!(prompt.contains("Relevance Percentage:"));
//!
//! assert_eq!(extract_percentage("Total Score: 3 out of 4"), Some(75.0));
//! assert_eq!(extract_percentage("no markers here"), None);
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `ats-match` binary (clap + anyhow + tracing-subscriber + indicatif) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod evaluate;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod score;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{EvaluationAction, EvaluationConfig, EvaluationConfigBuilder, DEFAULT_RESUME_CONTENT};
pub use error::AtsError;
pub use evaluate::{
    evaluate, evaluate_bytes, evaluate_image, evaluate_sync, evaluate_to_file, evaluate_with,
    write_report,
};
pub use output::{render_gauge, EvaluationOutput, EvaluationStats, NO_SCORE_NOTICE};
pub use pipeline::llm::{LlmInvoker, ModelInvoker, ModelReply};
pub use progress::{EvaluationProgressCallback, NoopProgressCallback, ProgressCallback, Stage};
pub use prompts::{build_prompt, build_prompt_for_label, EvaluationMode, RELEVANCE_LABEL};
pub use score::{extract_percentage, extract_score, RelevanceScore, ScoreSource};
