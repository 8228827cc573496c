//! Scene analysis
//!
//! Builds a mode-specific prompt and asks a hosted vision-language model
//! about the current frame.

mod analyzer;
mod client;
mod prompt;

pub use analyzer::{ERROR_PREFIX, SceneAnalyzer, is_error_text, is_found_text};
pub use client::{SceneModel, VisionClient, VisionProvider};
pub use prompt::build_prompt;
