//! What the user sees: status line, live frame, narration and alerts

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{AlertLog, Mode, ModeState};
use crate::camera::Frame;

/// How a status message should be presented
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Success,
    Info,
    Warning,
    Error,
}

/// One user-visible status message
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Status {
    pub severity: Severity,
    pub message: String,
    pub at: DateTime<Utc>,
}

impl Status {
    #[must_use]
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            message: message.into(),
            at: Utc::now(),
        }
    }

    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self::new(Severity::Success, message)
    }

    #[must_use]
    pub fn info(message: impl Into<String>) -> Self {
        Self::new(Severity::Info, message)
    }

    #[must_use]
    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, message)
    }

    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self::new(Severity::Error, message)
    }
}

/// Snapshot published by the controller after every change
#[derive(Debug, Clone, Default, Serialize)]
pub struct DisplayState {
    pub mode: Mode,
    pub mode_label: &'static str,
    /// Present only in find mode
    pub target_query: Option<String>,
    pub running: bool,
    pub guardian_contact: String,
    /// Most recent status message
    pub status: Option<Status>,
    /// Most recent scene description or analysis error
    pub narration: Option<String>,
    /// Most recent synthesized speech on disk
    pub artifact: Option<PathBuf>,
    /// Most recent simulated emergency alert
    pub alert: Option<AlertLog>,
    /// Completed scan iterations
    pub iterations: u64,
    /// Most recent captured frame
    #[serde(skip)]
    pub frame: Option<Frame>,
}

impl DisplayState {
    /// Copy the mode state fields into the snapshot
    pub fn sync(&mut self, state: &ModeState) {
        self.mode = state.mode;
        self.mode_label = state.mode.label();
        self.target_query = state.visible_target().map(ToString::to_string);
        self.running = state.running;
        self.guardian_contact.clone_from(&state.guardian_contact);
    }
}
