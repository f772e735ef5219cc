//! Progress-callback trait for evaluation stage events.
//!
//! Inject an [`Arc<dyn EvaluationProgressCallback>`] via
//! [`crate::config::EvaluationConfigBuilder::progress_callback`] to be told
//! when each stage of an evaluation starts and finishes. The CLI uses this to
//! drive its spinner; a web front end could forward the same events over a
//! socket.
//!
//! # Example
//!
//! ```rust
//! use edgequake_ats::{EvaluationConfig, EvaluationProgressCallback, Stage};
//! use std::sync::Arc;
//!
//! struct Logger;
//!
//! impl EvaluationProgressCallback for Logger {
//!     fn on_stage_start(&self, stage: Stage) {
//!         eprintln!("{}…", stage.describe());
//!     }
//! }
//!
//! let config = EvaluationConfig::builder()
//!     .progress_callback(Arc::new(Logger))
//!     .build()
//!     .unwrap();
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// One step of the evaluation pipeline, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Stage {
    /// Locate the resume: local path, URL download or in-memory bytes.
    Resolve,
    /// Rasterise the first PDF page.
    Render,
    /// JPEG-encode and base64-wrap the page.
    Encode,
    /// Call the model.
    Generate,
    /// Pull the relevance score out of the reply.
    Extract,
}

impl Stage {
    /// Short present-tense description for status lines.
    pub fn describe(self) -> &'static str {
        match self {
            Stage::Resolve => "Reading resume",
            Stage::Render => "Rendering first page",
            Stage::Encode => "Encoding page image",
            Stage::Generate => "Waiting for the model",
            Stage::Extract => "Extracting relevance score",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.describe())
    }
}

/// Called by the evaluation pipeline as it moves through each [`Stage`].
///
/// All methods default to no-ops so implementors override only what they
/// need. Implementations must be `Send + Sync`: rendering runs on a
/// blocking thread and the callback may be shared across requests.
pub trait EvaluationProgressCallback: Send + Sync {
    /// Called when a stage begins.
    fn on_stage_start(&self, stage: Stage) {
        let _ = stage;
    }

    /// Called when a stage finishes successfully.
    ///
    /// # Arguments
    /// * `stage`: the stage that finished
    /// * `elapsed_ms`: wall-clock time spent in it
    fn on_stage_complete(&self, stage: Stage, elapsed_ms: u64) {
        let _ = (stage, elapsed_ms);
    }

    /// Called before a model call is retried.
    fn on_retry(&self, attempt: u32, max_retries: u32, error: &str) {
        let _ = (attempt, max_retries, error);
    }

    /// Called when a stage fails. No further events follow.
    fn on_stage_error(&self, stage: Stage, error: &str) {
        let _ = (stage, error);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl EvaluationProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::EvaluationConfig`].
pub type ProgressCallback = Arc<dyn EvaluationProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<String>>,
    }

    impl EvaluationProgressCallback for Recorder {
        fn on_stage_start(&self, stage: Stage) {
            self.events.lock().unwrap().push(format!("start {stage:?}"));
        }

        fn on_stage_complete(&self, stage: Stage, _elapsed_ms: u64) {
            self.events.lock().unwrap().push(format!("done {stage:?}"));
        }

        fn on_retry(&self, attempt: u32, max_retries: u32, _error: &str) {
            self.events
                .lock()
                .unwrap()
                .push(format!("retry {attempt}/{max_retries}"));
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_stage_start(Stage::Render);
        cb.on_stage_complete(Stage::Render, 12);
        cb.on_retry(1, 3, "503");
        cb.on_stage_error(Stage::Generate, "boom");
    }

    #[test]
    fn recorder_sees_events_in_order() {
        let rec = Recorder::default();
        rec.on_stage_start(Stage::Generate);
        rec.on_retry(1, 2, "timeout");
        rec.on_stage_complete(Stage::Generate, 900);
        rec.on_stage_error(Stage::Extract, "ignored by default impl");

        let events = rec.events.lock().unwrap();
        assert_eq!(
            *events,
            vec!["start Generate", "retry 1/2", "done Generate"]
        );
    }

    #[test]
    fn stage_descriptions_are_distinct() {
        let all = [
            Stage::Resolve,
            Stage::Render,
            Stage::Encode,
            Stage::Generate,
            Stage::Extract,
        ];
        let mut seen: Vec<&str> = all.iter().map(|s| s.describe()).collect();
        seen.sort_unstable();
        seen.dedup();
        assert_eq!(seen.len(), all.len());
    }
}
