//! Relevance-score extraction from free-text model replies.
//!
//! Models are asked to end with `Relevance Percentage: XX%` but do not
//! always comply. Two marker lines are recognised, in strict priority order:
//!
//! 1. `Relevance Percentage: 87.5%`, returned as reported, unrounded and
//!    unclamped.
//! 2. `Total Score: 6/8` or `Total Score: 3 out of 4`, converted to a
//!    percentage and rounded to two decimals, half away from zero.
//!
//! Both labels match case-insensitively anywhere in the reply, so
//! surrounding prose and quoting are tolerated. When several markers of the
//! same kind are present the first one in document order wins.
//! Numbers are ASCII digits with at most one decimal point (`87`, `87.5`,
//! `87.`, `.5`). A percentage that overflows to infinity counts as no
//! `Relevance Percentage` marker at all.
//!
//! A reply without either marker yields `None`. So does a `Total Score`
//! with a maximum of zero, or one whose ratio is not finite.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

// ASCII digits only: `\d` would also match e.g. Arabic-Indic digits, which
// `f64::from_str` rejects.
static RE_RELEVANCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)Relevance Percentage:\s*([0-9]+\.?[0-9]*|\.[0-9]+)%").unwrap());

static RE_TOTAL_SCORE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)Total Score:\s*([0-9]+)\s*(?:/|out of)\s*([0-9]+)").unwrap());

/// Where a [`RelevanceScore`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScoreSource {
    /// Read directly from a `Relevance Percentage:` marker.
    Reported,
    /// Computed from a `Total Score: obtained/maximum` marker.
    Derived { obtained: f64, maximum: f64 },
}

/// A relevance percentage, conceptually in `0..=100`.
///
/// The value is whatever the reply claimed (or the arithmetic derived); it is
/// not clamped. Use [`RelevanceScore::fraction`] for display widgets.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RelevanceScore {
    value: f64,
    source: ScoreSource,
}

impl RelevanceScore {
    /// A score read straight from a percentage marker.
    pub fn reported(value: f64) -> Self {
        Self {
            value,
            source: ScoreSource::Reported,
        }
    }

    /// Derive a score from `obtained / maximum`, rounded to 2 decimals.
    ///
    /// Returns `None` when `maximum` is zero or the result is not finite.
    pub fn derived(obtained: f64, maximum: f64) -> Option<Self> {
        if maximum == 0.0 {
            return None;
        }
        let value = round2(obtained / maximum * 100.0);
        value.is_finite().then_some(Self {
            value,
            source: ScoreSource::Derived { obtained, maximum },
        })
    }

    /// The percentage as extracted.
    pub fn value(&self) -> f64 {
        self.value
    }

    /// Which marker produced the score.
    pub fn source(&self) -> ScoreSource {
        self.source
    }

    /// The percentage as a `0.0..=1.0` fraction, clamped for progress bars.
    pub fn fraction(&self) -> f64 {
        (self.value / 100.0).clamp(0.0, 1.0)
    }
}

impl fmt::Display for RelevanceScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.value)
    }
}

/// Round to two decimal places, half away from zero.
fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

/// Extract a relevance percentage from a model reply.
///
/// Pure function of `reply`. See the module docs for the marker grammar.
pub fn extract_score(reply: &str) -> Option<RelevanceScore> {
    extract_reported(reply).or_else(|| extract_total_score(reply))
}

/// Convenience wrapper returning just the number.
pub fn extract_percentage(reply: &str) -> Option<f64> {
    extract_score(reply).map(|s| s.value())
}

fn extract_reported(reply: &str) -> Option<RelevanceScore> {
    let caps = RE_RELEVANCE.captures(reply)?;
    let value: f64 = caps[1].parse().ok()?;
    if !value.is_finite() {
        debug!("Relevance percentage {:?} is not finite; ignoring", &caps[1]);
        return None;
    }
    Some(RelevanceScore::reported(value))
}

fn extract_total_score(reply: &str) -> Option<RelevanceScore> {
    let caps = RE_TOTAL_SCORE.captures(reply)?;
    let obtained: f64 = caps[1].parse().ok()?;
    let maximum: f64 = caps[2].parse().ok()?;

    let score = RelevanceScore::derived(obtained, maximum);
    if score.is_none() {
        debug!(
            "Total Score {}/{} has no usable ratio; treating as no signal",
            &caps[1], &caps[2]
        );
    }
    score
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reported_integer() {
        assert_eq!(extract_percentage("Strong fit.\nRelevance Percentage: 87%"), Some(87.0));
    }

    #[test]
    fn reported_decimal_with_trailing_prose() {
        assert_eq!(
            extract_percentage("...Relevance Percentage: 87.5% more text"),
            Some(87.5)
        );
    }

    #[test]
    fn reported_is_case_insensitive_and_tolerates_quotes() {
        assert_eq!(extract_percentage("relevance percentage: 50%"), Some(50.0));
        assert_eq!(extract_percentage("\"RELEVANCE PERCENTAGE:42%\""), Some(42.0));
    }

    #[test]
    fn reported_is_not_clamped() {
        assert_eq!(extract_percentage("Relevance Percentage: 140%"), Some(140.0));
        let s = extract_score("Relevance Percentage: 140%").unwrap();
        assert_eq!(s.fraction(), 1.0);
        assert_eq!(s.source(), ScoreSource::Reported);
    }

    #[test]
    fn first_reported_marker_wins() {
        let reply = "Relevance Percentage: 60%\n...\nRelevance Percentage: 90%";
        assert_eq!(extract_percentage(reply), Some(60.0));
    }

    #[test]
    fn placeholder_marker_is_skipped() {
        let reply = "Format: Relevance Percentage: XX%\nRelevance Percentage: 73%";
        assert_eq!(extract_percentage(reply), Some(73.0));
    }

    #[test]
    fn reported_beats_total_score() {
        let reply = "Total Score: 1/4\nRelevance Percentage: 80%";
        assert_eq!(extract_percentage(reply), Some(80.0));
    }

    #[test]
    fn total_score_slash() {
        let s = extract_score("...Total Score: 6/8...").unwrap();
        assert_eq!(s.value(), 75.0);
        assert_eq!(
            s.source(),
            ScoreSource::Derived {
                obtained: 6.0,
                maximum: 8.0
            }
        );
    }

    #[test]
    fn total_score_out_of() {
        assert_eq!(extract_percentage("...Total Score: 3 out of 4..."), Some(75.0));
        assert_eq!(extract_percentage("total score:3 OUT OF 4"), Some(75.0));
    }

    #[test]
    fn total_score_rounds_to_two_decimals() {
        assert_eq!(extract_percentage("Total Score: 2/3"), Some(66.67));
        assert_eq!(extract_percentage("Total Score: 1 / 8"), Some(12.5));
    }

    #[test]
    fn zero_maximum_is_no_signal() {
        assert_eq!(extract_score("Total Score: 0/0"), None);
        assert_eq!(extract_score("Total Score: 5 out of 0"), None);
    }

    #[test]
    fn no_markers() {
        assert_eq!(extract_score("no markers here"), None);
        assert_eq!(extract_score(""), None);
    }

    #[test]
    fn malformed_numbers_do_not_match() {
        assert_eq!(extract_score("Relevance Percentage: 1.2.3%"), None);
        assert_eq!(extract_score("Relevance Percentage: %"), None);
    }

    #[test]
    fn reported_accepts_trailing_and_leading_decimal_point() {
        assert_eq!(extract_percentage("Relevance Percentage: 87.%"), Some(87.0));
        assert_eq!(extract_percentage("Relevance Percentage: .5%"), Some(0.5));
    }

    #[test]
    fn trailing_point_percentage_beats_later_total_score() {
        let reply = "Relevance Percentage: 87.%\nTotal Score: 1/4";
        assert_eq!(extract_percentage(reply), Some(87.0));
    }

    #[test]
    fn non_ascii_digits_are_not_a_marker() {
        assert_eq!(extract_score("Relevance Percentage: \u{0668}%"), None);
        let reply = "Relevance Percentage: \u{0668}%\nRelevance Percentage: 50%";
        assert_eq!(extract_percentage(reply), Some(50.0));
        let reply = "Total Score: \u{0663}/4\nTotal Score: 1/4";
        assert_eq!(extract_percentage(reply), Some(25.0));
    }

    #[test]
    fn overflowing_percentage_falls_through_to_total_score() {
        let reply = format!("Relevance Percentage: {}%\nTotal Score: 3/4", "9".repeat(400));
        let s = extract_score(&reply).unwrap();
        assert_eq!(s.value(), 75.0);
        assert!(matches!(s.source(), ScoreSource::Derived { .. }));
    }

    #[test]
    fn overflowing_total_score_is_no_signal() {
        let huge = "9".repeat(400);
        assert_eq!(extract_score(&format!("Total Score: {huge}/4")), None);
        assert_eq!(extract_score(&format!("Total Score: {huge}/{huge}")), None);
        assert_eq!(RelevanceScore::derived(f64::INFINITY, 4.0), None);
    }

    #[test]
    fn first_total_score_decides_even_when_unusable() {
        assert_eq!(extract_score("Total Score: 0/0\nTotal Score: 1/2"), None);
    }

    #[test]
    fn display_uses_percent_sign() {
        assert_eq!(RelevanceScore::reported(87.5).to_string(), "87.5%");
    }
}
