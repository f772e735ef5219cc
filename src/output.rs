//! Evaluation results and their presentation helpers.
//!
//! [`EvaluationOutput`] is what every `evaluate*` entry point returns. It is
//! `serde`-serialisable for `--json` output, and knows how to render itself
//! as a Markdown report and a text gauge for terminals.

use crate::config::EvaluationAction;
use crate::prompts::EvaluationMode;
use crate::score::RelevanceScore;
use serde::{Deserialize, Serialize};

/// Shown when a percentage match was requested but the reply had no marker.
pub const NO_SCORE_NOTICE: &str =
    "No percentage could be extracted from the response. Please adjust the prompt or model output format.";

/// Result of one resume evaluation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationOutput {
    pub mode: EvaluationMode,
    pub action: EvaluationAction,
    /// The model's reply, verbatim.
    pub reply: String,
    /// Extracted relevance score. Always `None` for [`EvaluationAction::Review`].
    pub score: Option<RelevanceScore>,
    pub stats: EvaluationStats,
}

/// Timing and token accounting for one evaluation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvaluationStats {
    pub input_tokens: usize,
    pub output_tokens: usize,
    pub retries: u32,
    /// Raw JPEG size of the page sent to the model.
    pub image_bytes: usize,
    pub render_duration_ms: u64,
    pub llm_duration_ms: u64,
    pub total_duration_ms: u64,
}

impl EvaluationOutput {
    /// `true` when a score was requested but none could be extracted.
    pub fn score_missing(&self) -> bool {
        self.action.extracts_score() && self.score.is_none()
    }

    /// Text gauge for the score, e.g. `[███████░░░]  75%`.
    ///
    /// `None` when there is no score. The bar is clamped to `0..=width`
    /// even if the reported percentage falls outside 0–100.
    pub fn score_gauge(&self, width: usize) -> Option<String> {
        self.score.map(|s| render_gauge(&s, width))
    }

    /// Render a Markdown report: heading, reply, and the score section when
    /// a percentage match was requested.
    pub fn to_markdown(&self) -> String {
        let mut md = format!("# Resume Evaluation ({})\n\n", self.mode);
        md.push_str("## AI Response\n\n");
        md.push_str(self.reply.trim_end());
        md.push_str("\n\n");

        if self.action.extracts_score() {
            match self.score {
                Some(score) => {
                    md.push_str(&format!("## Match Percentage: **{}**\n\n", score));
                    md.push_str(&format!("`{}`\n", render_gauge(&score, 40)));
                }
                None => {
                    md.push_str(&format!("> {}\n", NO_SCORE_NOTICE));
                }
            }
        }
        md
    }
}

/// Draw a fixed-width bar proportional to the score's clamped fraction.
pub fn render_gauge(score: &RelevanceScore, width: usize) -> String {
    let filled = ((score.fraction() * width as f64).round() as usize).min(width);
    let label = score.to_string();
    format!(
        "[{}{}] {:>5}",
        "█".repeat(filled),
        "░".repeat(width - filled),
        label
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn output(action: EvaluationAction, score: Option<RelevanceScore>) -> EvaluationOutput {
        EvaluationOutput {
            mode: EvaluationMode::OneShot,
            action,
            reply: "Strong backend profile.\nRelevance Percentage: 75%\n".into(),
            score,
            stats: EvaluationStats::default(),
        }
    }

    #[test]
    fn gauge_is_proportional() {
        let g = render_gauge(&RelevanceScore::reported(75.0), 8);
        assert_eq!(g, "[██████░░]   75%");
    }

    #[test]
    fn gauge_clamps_out_of_range_scores() {
        let g = render_gauge(&RelevanceScore::reported(150.0), 4);
        assert!(g.starts_with("[████]"), "got {g}");
        let g = render_gauge(&RelevanceScore::reported(-5.0), 4);
        assert!(g.starts_with("[░░░░]"), "got {g}");
    }

    #[test]
    fn markdown_with_score() {
        let out = output(
            EvaluationAction::PercentageMatch,
            Some(RelevanceScore::reported(75.0)),
        );
        let md = out.to_markdown();
        assert!(md.starts_with("# Resume Evaluation (One-Shot)"));
        assert!(md.contains("Strong backend profile."));
        assert!(md.contains("## Match Percentage: **75%**"));
        assert!(!out.score_missing());
    }

    #[test]
    fn markdown_without_score_shows_notice() {
        let out = output(EvaluationAction::PercentageMatch, None);
        assert!(out.score_missing());
        assert!(out.to_markdown().contains(NO_SCORE_NOTICE));
        assert_eq!(out.score_gauge(10), None);
    }

    #[test]
    fn review_never_reports_missing_score() {
        let out = output(EvaluationAction::Review, None);
        assert!(!out.score_missing());
        let md = out.to_markdown();
        assert!(!md.contains("Match Percentage"));
        assert!(!md.contains(NO_SCORE_NOTICE));
    }

    #[test]
    fn serialises_to_json() {
        let out = output(
            EvaluationAction::PercentageMatch,
            Some(RelevanceScore::reported(75.0)),
        );
        let json = serde_json::to_value(&out).unwrap();
        assert_eq!(json["mode"], "OneShot");
        assert_eq!(json["score"]["value"], 75.0);
        assert_eq!(json["score"]["source"]["kind"], "reported");
    }
}
