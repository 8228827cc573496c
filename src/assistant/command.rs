//! Voice command interpretation
//!
//! Maps a recognized utterance to a mode change. Rules are checked in a fixed
//! order and the first substring match wins.

use super::{Mode, ModeState, Status};

/// Interpreted command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Look for an object
    Find { target: String },
    /// Read text
    Read,
    /// Navigation assistance
    Navigate,
    /// Emergency
    Sos,
    /// Nothing matched; carries the utterance as heard
    Unrecognized { utterance: String },
}

impl Command {
    /// Mode this command switches to, if any
    #[must_use]
    pub const fn mode(&self) -> Option<Mode> {
        match self {
            Self::Find { .. } => Some(Mode::FindObject),
            Self::Read => Some(Mode::Reading),
            Self::Navigate => Some(Mode::Navigation),
            Self::Sos => Some(Mode::Sos),
            Self::Unrecognized { .. } => None,
        }
    }
}

const READ_WORDS: [&str; 2] = ["read", "text"];
const NAVIGATE_WORDS: [&str; 3] = ["navigate", "safety", "walk"];
const SOS_WORDS: [&str; 2] = ["help", "sos"];

/// Interpret an utterance
///
/// Matching is case-insensitive. Recognition failure sentinels such as
/// "could not understand audio" fall through to [`Command::Unrecognized`].
#[must_use]
pub fn interpret(utterance: &str) -> Command {
    let lower = utterance.to_lowercase();
    let has_any = |words: &[&str]| words.iter().any(|w| lower.contains(w));

    if lower.contains("find") {
        Command::Find {
            target: extract_target(&lower),
        }
    } else if has_any(&READ_WORDS) {
        Command::Read
    } else if has_any(&NAVIGATE_WORDS) {
        Command::Navigate
    } else if has_any(&SOS_WORDS) {
        Command::Sos
    } else {
        Command::Unrecognized {
            utterance: utterance.to_string(),
        }
    }
}

/// "find my keys" -> "keys"
///
/// Removes every occurrence of "find" and "my", including inside words.
fn extract_target(lower: &str) -> String {
    lower.replace("find", "").replace("my", "").trim().to_string()
}

impl ModeState {
    /// Apply a command and describe the outcome
    ///
    /// The target query is only written by find commands; other commands leave
    /// a stale target in place.
    pub fn apply(&mut self, command: &Command) -> Status {
        match command {
            Command::Find { target } => {
                self.mode = Mode::FindObject;
                self.target_query.clone_from(target);
                Status::success(format!("Command Accepted: Finding '{target}'"))
            }
            Command::Read => {
                self.mode = Mode::Reading;
                Status::success("Switched to Reading Mode")
            }
            Command::Navigate => {
                self.mode = Mode::Navigation;
                Status::success("Switched to Navigation Mode")
            }
            Command::Sos => {
                self.mode = Mode::Sos;
                Status::error("SOS mode activated")
            }
            Command::Unrecognized { utterance } => Status::warning(format!(
                "Heard '{utterance}', but command not recognized. Try 'Find Keys' or 'Navigation'."
            )),
        }
    }
}
