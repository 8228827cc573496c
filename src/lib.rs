//! Third Eye - voice-controlled scene narration for blind and low-vision users
//!
//! The assistant captures a camera frame, asks a hosted vision model to
//! describe it for the current mode, and speaks the answer. Spoken commands
//! switch between modes or raise a simulated emergency alert.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                     Controls                         │
//! │        Console  │  HTTP API  │  Voice (mic)         │
//! └────────────────────┬────────────────────────────────┘
//!                      │ actions
//! ┌────────────────────▼────────────────────────────────┐
//! │                   Controller                         │
//! │   Mode State  │  Command Interpreter  │  Scan Loop  │
//! └────────────────────┬────────────────────────────────┘
//!                      │
//! ┌────────────────────▼────────────────────────────────┐
//! │                 Collaborators                        │
//! │   Camera  │  Vision model  │  STT  │  TTS  │  Audio │
//! └─────────────────────────────────────────────────────┘
//! ```

pub mod api;
pub mod assistant;
pub mod camera;
pub mod config;
pub mod console;
pub mod error;
pub mod vision;
pub mod voice;

pub use assistant::{
    Action, Collaborators, Command, Controller, ControllerHandle, DisplayState, Mode, ModeState,
    Status, interpret,
};
pub use config::Config;
pub use error::{Error, Result};
