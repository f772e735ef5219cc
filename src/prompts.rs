//! Evaluation prompts, one typed template function per mode.
//!
//! Every prompt ends by asking the model for a marker line of the exact
//! shape `Relevance Percentage: XX%`, which [`crate::score::extract_score`]
//! later reads back out of the reply.
//!
//! The modes differ only in how many worked examples precede the request:
//!
//! | Mode | Worked examples | Uses caller text |
//! |------|-----------------|------------------|
//! | [`EvaluationMode::ZeroShot`] | 0 | no |
//! | [`EvaluationMode::OneShot`]  | 1 (100 %) | yes |
//! | [`EvaluationMode::FewShot`]  | 2 (100 %, 66.7 %) | yes |
//!
//! Substitution is literal: the job description and resume content are
//! inserted as-is, with no escaping, so braces or quotes in either survive
//! untouched.

use crate::error::AtsError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The literal label every prompt asks the model to end its reply with.
pub const RELEVANCE_LABEL: &str = "Relevance Percentage:";

/// Prompting strategy: how many worked examples precede the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum EvaluationMode {
    /// No examples; the instruction stands alone. (default)
    #[default]
    ZeroShot,
    /// One worked example with a 100 % outcome.
    OneShot,
    /// Two worked examples of differing match quality.
    FewShot,
}

impl EvaluationMode {
    /// Every mode, in the order the selector shows them.
    pub const ALL: [EvaluationMode; 3] = [
        EvaluationMode::ZeroShot,
        EvaluationMode::OneShot,
        EvaluationMode::FewShot,
    ];

    /// Human-facing label, matching the selector choices.
    pub fn label(self) -> &'static str {
        match self {
            EvaluationMode::ZeroShot => "Zero-Shot",
            EvaluationMode::OneShot => "One-Shot",
            EvaluationMode::FewShot => "Few-Shot",
        }
    }

    /// Number of worked examples the prompt contains.
    pub fn example_count(self) -> usize {
        match self {
            EvaluationMode::ZeroShot => 0,
            EvaluationMode::OneShot => 1,
            EvaluationMode::FewShot => 2,
        }
    }
}

impl fmt::Display for EvaluationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for EvaluationMode {
    type Err = AtsError;

    /// Accepts the selector labels (`Zero-Shot`) and their lower-case,
    /// underscore and unseparated spellings. Anything else is rejected.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .trim()
            .chars()
            .filter(|c| !matches!(c, '-' | '_' | ' '))
            .collect::<String>()
            .to_lowercase();

        match key.as_str() {
            "zeroshot" | "zero" => Ok(EvaluationMode::ZeroShot),
            "oneshot" | "one" => Ok(EvaluationMode::OneShot),
            "fewshot" | "few" => Ok(EvaluationMode::FewShot),
            _ => Err(AtsError::UnknownMode(s.to_string())),
        }
    }
}

/// Build the instruction text for `mode`.
///
/// Pure: the same inputs always produce byte-identical output. For
/// [`EvaluationMode::ZeroShot`] both text inputs are ignored.
pub fn build_prompt(mode: EvaluationMode, job_description: &str, resume_content: &str) -> String {
    match mode {
        EvaluationMode::ZeroShot => zero_shot_prompt().to_string(),
        EvaluationMode::OneShot => one_shot_prompt(job_description, resume_content),
        EvaluationMode::FewShot => few_shot_prompt(job_description, resume_content),
    }
}

/// Parse a mode label and build its prompt in one step.
///
/// Unknown labels fail with [`AtsError::UnknownMode`] rather than yielding
/// an empty prompt.
pub fn build_prompt_for_label(
    label: &str,
    job_description: &str,
    resume_content: &str,
) -> Result<String, AtsError> {
    let mode: EvaluationMode = label.parse()?;
    Ok(build_prompt(mode, job_description, resume_content))
}

const ZERO_SHOT_PROMPT: &str = r#"You are an AI tasked with evaluating the provided resume against the given job description.
Return a professional evaluation focusing on whether the candidate's profile aligns with the role,
highlighting strengths and weaknesses. At the end of your response, include a line:
"Relevance Percentage: XX%"
"#;

/// Zero-shot instruction. Takes no caller text.
pub fn zero_shot_prompt() -> &'static str {
    ZERO_SHOT_PROMPT
}

/// One worked example, then the caller's request.
pub fn one_shot_prompt(job_description: &str, resume_content: &str) -> String {
    format!(
        r#"Example:
Job Description: "Looking for a Full Stack Developer with React, Node.js, and Docker experience."
Resume: "3 years of experience in React, Node.js, and containerized applications with Docker."
Evaluation:
- Candidate matches all required skills.
- Relevance Percentage: 100%

Now evaluate the following:
Job Description: {job_description}
Resume: {resume_content}

At the end of your response, always include:
"Relevance Percentage: XX%"
"#
    )
}

/// Two worked examples (full and partial match), then the caller's request.
pub fn few_shot_prompt(job_description: &str, resume_content: &str) -> String {
    format!(
        r#"Example 1:
Job Description: "Data Scientist with Python, TensorFlow, and SQL."
Resume: "5 years in Python, TensorFlow, SQL, plus data analysis."
Evaluation:
- Excellent match for the requirements.
Relevance Percentage: 100%

Example 2:
Job Description: "Web Developer with HTML, CSS, JavaScript."
Resume: "Experience in HTML and CSS, but lacks JavaScript."
Evaluation:
- Partial match.
Relevance Percentage: 66.7%

Now evaluate the following:
Job Description: {job_description}
Resume: {resume_content}

At the end of your evaluation, include:
"Relevance Percentage: XX%"
"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const JD: &str = "Rust engineer with tokio and {braces} experience";
    const RESUME: &str = "Seven years of \"async\" Rust, $HOME and %d intact";

    #[test]
    fn every_mode_asks_for_marker_line() {
        for mode in EvaluationMode::ALL {
            let prompt = build_prompt(mode, JD, RESUME);
            assert!(!prompt.trim().is_empty(), "{mode}: empty prompt");
            assert!(prompt.contains(RELEVANCE_LABEL), "{mode}: no marker guidance");
            assert!(
                prompt.contains("Relevance Percentage: XX%"),
                "{mode}: marker shape missing"
            );
        }
    }

    #[test]
    fn zero_shot_ignores_inputs() {
        let a = build_prompt(EvaluationMode::ZeroShot, JD, RESUME);
        let b = build_prompt(EvaluationMode::ZeroShot, "", "");
        assert_eq!(a, b);
        assert!(!a.contains(JD));
        assert!(a.contains("strengths and weaknesses"));
    }

    #[test]
    fn shot_modes_substitute_verbatim() {
        for mode in [EvaluationMode::OneShot, EvaluationMode::FewShot] {
            let prompt = build_prompt(mode, JD, RESUME);
            assert!(prompt.contains(JD), "{mode}: job description not verbatim");
            assert!(prompt.contains(RESUME), "{mode}: resume not verbatim");
        }
    }

    #[test]
    fn caller_text_follows_examples() {
        let prompt = build_prompt(EvaluationMode::FewShot, JD, RESUME);
        let example = prompt.find("66.7%").expect("partial example present");
        let request = prompt.find(JD).expect("job description present");
        assert!(example < request);
        assert!(prompt.trim_end().ends_with("\"Relevance Percentage: XX%\""));
    }

    #[test]
    fn example_counts_match_templates() {
        let one = build_prompt(EvaluationMode::OneShot, JD, RESUME);
        let few = build_prompt(EvaluationMode::FewShot, JD, RESUME);
        assert!(one.contains("100%"));
        assert!(!one.contains("Example 2"));
        assert!(few.contains("Example 1") && few.contains("Example 2"));
        assert_eq!(EvaluationMode::FewShot.example_count(), 2);
    }

    #[test]
    fn build_is_idempotent() {
        for mode in EvaluationMode::ALL {
            assert_eq!(build_prompt(mode, JD, RESUME), build_prompt(mode, JD, RESUME));
        }
    }

    #[test]
    fn parse_labels() {
        assert_eq!("Zero-Shot".parse::<EvaluationMode>().unwrap(), EvaluationMode::ZeroShot);
        assert_eq!("one_shot".parse::<EvaluationMode>().unwrap(), EvaluationMode::OneShot);
        assert_eq!(" FEWSHOT ".parse::<EvaluationMode>().unwrap(), EvaluationMode::FewShot);
        for mode in EvaluationMode::ALL {
            assert_eq!(mode.label().parse::<EvaluationMode>().unwrap(), mode);
        }
    }

    #[test]
    fn unknown_label_fails_loudly() {
        let err = build_prompt_for_label("Two-Shot", JD, RESUME).unwrap_err();
        assert!(matches!(err, AtsError::UnknownMode(ref m) if m == "Two-Shot"));
        assert!("".parse::<EvaluationMode>().is_err());
    }
}
