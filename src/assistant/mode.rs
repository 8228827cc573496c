//! Assistant modes and the mode state owned by the controller

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// What the assistant is currently trying to do for the user
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// Hazards, obstacles and distances
    #[default]
    Navigation,
    /// Signs, labels and printed text
    Reading,
    /// Look for one named object
    FindObject,
    /// Emergency
    Sos,
}

impl Mode {
    /// Every mode, in display order
    pub const ALL: [Self; 4] = [Self::Navigation, Self::Reading, Self::FindObject, Self::Sos];

    /// Human-readable label
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Navigation => "Navigation Mode (Safety)",
            Self::Reading => "Reading Mode (Text/Medicine)",
            Self::FindObject => "Find Specific Object",
            Self::Sos => "SOS",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Mode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_lowercase().replace(['-', ' '], "_");
        match normalized.as_str() {
            "navigation" | "navigate" | "nav" => Ok(Self::Navigation),
            "reading" | "read" => Ok(Self::Reading),
            "find_object" | "find" | "findobject" => Ok(Self::FindObject),
            "sos" | "emergency" => Ok(Self::Sos),
            _ => Self::ALL
                .into_iter()
                .find(|m| m.label().eq_ignore_ascii_case(s.trim()))
                .ok_or_else(|| Error::Config(format!("unknown mode: {s}"))),
        }
    }
}

/// Session state shared by the command interpreter and the scan loop
///
/// Only the controller task holds this, so it needs no synchronization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModeState {
    /// Active mode
    pub mode: Mode,
    /// Object being searched for; meaningful in find mode
    pub target_query: String,
    /// Whether the scan loop should keep iterating
    pub running: bool,
    /// Contact shown in the simulated emergency alert
    pub guardian_contact: String,
}

impl ModeState {
    /// Fresh state: navigation mode, idle, no target
    #[must_use]
    pub fn new(guardian_contact: impl Into<String>) -> Self {
        Self {
            mode: Mode::default(),
            target_query: String::new(),
            running: false,
            guardian_contact: guardian_contact.into(),
        }
    }

    /// Target to show, only while in find mode
    #[must_use]
    pub fn visible_target(&self) -> Option<&str> {
        (self.mode == Mode::FindObject).then_some(self.target_query.as_str())
    }
}
