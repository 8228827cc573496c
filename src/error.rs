//! Error types for Third Eye

use thiserror::Error;

/// Result type alias for Third Eye operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in Third Eye
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Audio device error
    #[error("audio error: {0}")]
    Audio(String),

    /// Camera capture error
    #[error("camera error: {0}")]
    Camera(String),

    /// Speech-to-text error
    #[error("STT error: {0}")]
    Stt(String),

    /// Text-to-speech error
    #[error("TTS error: {0}")]
    Tts(String),

    /// Vision API error
    #[error("vision error: {0}")]
    Vision(String),

    /// Controller is gone or refused a request
    #[error("controller error: {0}")]
    Controller(String),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP error
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),
}
