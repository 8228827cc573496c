//! Mode-specific prompts for scene analysis

use crate::assistant::Mode;

const NAVIGATION_PROMPT: &str = "You are a vision assistant for a blind person. \
Keep it UNDER 3 SENTENCES.\n\
Priority: Immediate HAZARDS (steps, obstacles) and distance.";

const READING_PROMPT: &str = "You are a reading assistant. \
Focus ONLY on text (Signs, Medicines, Books, Labels).\n\
Read the content clearly. Keep it concise.";

const GENERIC_PROMPT: &str = "Describe scene.";

/// Build the prompt for a mode
///
/// `target` is interpolated verbatim in find mode and ignored otherwise.
#[must_use]
pub fn build_prompt(mode: Mode, target: &str) -> String {
    match mode {
        Mode::Navigation => NAVIGATION_PROMPT.to_string(),
        Mode::Reading => READING_PROMPT.to_string(),
        Mode::FindObject => format!(
            "User is looking for: '{target}'.\n\
             Scan image for '{target}'.\n\
             If found, say \"Found {target}\" and describe exact location.\n\
             If NOT found, say \"Searching for {target}...\""
        ),
        Mode::Sos => GENERIC_PROMPT.to_string(),
    }
}
