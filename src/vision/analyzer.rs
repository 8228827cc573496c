//! Scene analyzer
//!
//! Turns a frame and the current mode into narration text. Failures come back
//! as text prefixed with [`ERROR_PREFIX`] instead of an `Err`, so the scan loop
//! always has something to show.

use std::sync::Arc;

use crate::assistant::Mode;
use crate::camera::Frame;
use crate::vision::{SceneModel, build_prompt};

/// Prefix marking analysis text that is an error report
pub const ERROR_PREFIX: &str = "Error:";

/// Analyzes frames with a remote vision model
#[derive(Clone)]
pub struct SceneAnalyzer {
    model: Arc<dyn SceneModel>,
}

impl SceneAnalyzer {
    /// Create an analyzer backed by a scene model
    #[must_use]
    pub fn new(model: Arc<dyn SceneModel>) -> Self {
        Self { model }
    }

    /// Describe a frame for the given mode
    ///
    /// Never fails; errors are embedded in the returned text.
    pub async fn analyze(&self, frame: &Frame, mode: Mode, target: &str) -> String {
        let prompt = build_prompt(mode, target);
        tracing::debug!(%mode, query = target, bytes = frame.data().len(), "analyzing frame");

        match self.model.generate(&prompt, frame).await {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(error = %e, %mode, "scene analysis failed");
                format!("{ERROR_PREFIX} {e}")
            }
        }
    }
}

/// Whether analysis text is an error report rather than a description
#[must_use]
pub fn is_error_text(text: &str) -> bool {
    text.trim_start().starts_with(ERROR_PREFIX)
}

/// Whether a description reports a found object
#[must_use]
pub fn is_found_text(text: &str) -> bool {
    text.contains("Found")
}
