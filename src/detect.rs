//! Pluggable content-detection seam.
//!
//! The engine itself never does object detection; callers that have a
//! detector (a local model, a remote service) implement [`ContentDetector`]
//! and pass it to
//! [`evaluate_with_detector`](crate::pipeline::evaluate_with_detector).
//! Detection results only ever add warnings to the verdict, they never
//! change the score or the pass/fail outcome.

use serde::Serialize;
use std::path::Path;

/// What a detector found in an image.
#[derive(Debug, Clone, Serialize)]
pub struct ContentSignal {
    /// Whether the image contains the content the detector looks for.
    pub has_relevant_content: bool,
    /// Number of detected objects.
    pub object_count: u32,
    /// Free-form description of what was found.
    pub summary: String,
}

/// A content detector the pipeline can consult per image.
pub trait ContentDetector {
    /// Short detector name for logging.
    fn name(&self) -> &str;

    /// Inspect the image at `path`. Errors are downgraded by the pipeline
    /// to [`ContentCheck::Unavailable`]; they never fail the evaluation.
    fn detect(&self, path: &Path) -> anyhow::Result<ContentSignal>;
}

/// Content-detection outcome carried on the verdict.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "availability", rename_all = "snake_case")]
pub enum ContentCheck {
    /// No detector was supplied, or the detector errored.
    Unavailable { reason: String },
    /// The detector ran and produced a signal.
    Detected(ContentSignal),
}

impl ContentCheck {
    /// Warning to surface on the verdict, if any.
    pub fn warning(&self) -> Option<String> {
        match self {
            ContentCheck::Unavailable { .. } => None,
            ContentCheck::Detected(signal) if signal.has_relevant_content => None,
            ContentCheck::Detected(signal) => Some(format!(
                "No relevant content detected: {}",
                signal.summary
            )),
        }
    }
}
