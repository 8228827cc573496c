//! TOML configuration file loading
//!
//! Supports `~/.config/third-eye/config.toml` as a persistent config source.
//! All fields are optional; the file is a partial overlay on top of defaults.

use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Top-level TOML configuration file schema
#[derive(Debug, Default, Deserialize)]
pub struct ThirdEyeConfigFile {
    /// Vision model configuration
    #[serde(default)]
    pub vision: VisionFileConfig,

    /// Voice/audio configuration
    #[serde(default)]
    pub voice: VoiceFileConfig,

    /// Camera configuration
    #[serde(default)]
    pub camera: CameraFileConfig,

    /// API keys for external services
    #[serde(default)]
    pub api_keys: ApiKeysFileConfig,

    /// Scan loop configuration
    #[serde(default)]
    pub scan: ScanFileConfig,

    /// Emergency alert configuration
    #[serde(default)]
    pub alert: AlertFileConfig,

    /// Control server configuration
    #[serde(default)]
    pub server: ServerFileConfig,
}

/// Vision-related configuration
#[derive(Debug, Default, Deserialize)]
pub struct VisionFileConfig {
    /// Provider ("gemini" or "anthropic")
    pub provider: Option<String>,

    /// Model identifier (e.g. "gemini-2.5-flash")
    pub model: Option<String>,

    /// Upper bound on response tokens
    pub max_tokens: Option<u32>,
}

/// Voice processing configuration
#[derive(Debug, Default, Deserialize)]
pub struct VoiceFileConfig {
    /// Enable microphone commands and spoken narration
    pub enabled: Option<bool>,

    /// STT provider ("whisper" or "deepgram")
    pub stt_provider: Option<String>,

    /// STT model (e.g. "whisper-1")
    pub stt_model: Option<String>,

    /// TTS provider ("openai" or "elevenlabs")
    pub tts_provider: Option<String>,

    /// TTS model (e.g. "tts-1")
    pub tts_model: Option<String>,

    /// TTS voice identifier (e.g. "alloy")
    pub tts_voice: Option<String>,

    /// TTS speed multiplier
    pub tts_speed: Option<f64>,

    /// Spoken language code
    pub language: Option<String>,

    /// Seconds to wait for speech to begin
    pub listen_timeout_secs: Option<f64>,

    /// Maximum seconds of a single utterance
    pub phrase_time_limit_secs: Option<f64>,

    /// Play narration through the speakers
    pub playback: Option<bool>,

    /// Directory for synthesized audio artifacts
    pub artifact_dir: Option<String>,
}

/// Camera configuration
#[derive(Debug, Default, Deserialize)]
pub struct CameraFileConfig {
    /// Still image to use instead of a live device
    pub file: Option<String>,

    /// Capture program (e.g. "ffmpeg")
    pub program: Option<String>,

    /// Capture program arguments; must write one JPEG frame to stdout
    pub args: Option<Vec<String>>,

    /// Seconds before an unresponsive capture is abandoned
    pub timeout_secs: Option<f64>,
}

/// API keys configuration
#[derive(Debug, Default, Deserialize)]
pub struct ApiKeysFileConfig {
    pub google: Option<String>,
    pub anthropic: Option<String>,
    pub openai: Option<String>,
    pub elevenlabs: Option<String>,
    pub deepgram: Option<String>,
}

/// Scan loop configuration
#[derive(Debug, Default, Deserialize)]
pub struct ScanFileConfig {
    /// Fixed delay between iterations, in seconds
    pub interval_secs: Option<f64>,
}

/// Emergency alert configuration
#[derive(Debug, Default, Deserialize)]
pub struct AlertFileConfig {
    /// Guardian contact shown in the simulated alert
    pub guardian_contact: Option<String>,
}

/// Control server configuration
#[derive(Debug, Default, Deserialize)]
pub struct ServerFileConfig {
    /// Serve the HTTP control API
    pub enabled: Option<bool>,

    /// Port to listen on
    pub port: Option<u16>,
}

/// Load the TOML config file from the standard path
///
/// Returns `ThirdEyeConfigFile::default()` if the file doesn't exist or can't be parsed.
pub fn load_config_file() -> ThirdEyeConfigFile {
    config_file_path().map_or_else(ThirdEyeConfigFile::default, |path| load_from(&path))
}

/// Load a config file from an explicit path, falling back to defaults
pub fn load_from(path: &Path) -> ThirdEyeConfigFile {
    if !path.exists() {
        return ThirdEyeConfigFile::default();
    }

    match std::fs::read_to_string(path) {
        Ok(content) => match toml::from_str(&content) {
            Ok(config) => {
                tracing::info!(path = %path.display(), "loaded config file");
                config
            }
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "failed to parse config file, using defaults"
                );
                ThirdEyeConfigFile::default()
            }
        },
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "failed to read config file"
            );
            ThirdEyeConfigFile::default()
        }
    }
}

/// Return the config file path: `~/.config/third-eye/config.toml`
pub fn config_file_path() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|d| d.config_dir().join("third-eye").join("config.toml"))
}
