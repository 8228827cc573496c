//! Configuration management for Third Eye
//!
//! Values resolve with priority: environment > TOML file > default.
//! CLI flags are applied on top by the binary.

pub mod file;

use std::path::PathBuf;
use std::time::Duration;

use crate::vision::VisionProvider;
use crate::voice::{SttProvider, TtsProvider};
use crate::{Error, Result};

/// Default delay between scan iterations
pub const DEFAULT_SCAN_INTERVAL: Duration = Duration::from_secs(6);

/// Default wait for speech to begin
pub const DEFAULT_LISTEN_TIMEOUT: Duration = Duration::from_secs(5);

/// Default maximum utterance length
pub const DEFAULT_PHRASE_TIME_LIMIT: Duration = Duration::from_secs(3);

/// Default camera timeout
pub const DEFAULT_CAMERA_TIMEOUT: Duration = Duration::from_secs(10);

/// Placeholder guardian contact until the user edits it
pub const DEFAULT_GUARDIAN_CONTACT: &str = "+1 555 0100";

/// Default control server port
pub const DEFAULT_PORT: u16 = 18790;

/// Third Eye configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Path to data directory
    pub data_dir: PathBuf,

    /// API keys
    pub api_keys: ApiKeys,

    /// Vision model configuration
    pub vision: VisionConfig,

    /// Voice configuration
    pub voice: VoiceConfig,

    /// Camera configuration
    pub camera: CameraConfig,

    /// Fixed delay between scan iterations
    pub scan_interval: Duration,

    /// Initial guardian contact
    pub guardian_contact: String,

    /// HTTP control server configuration
    pub server: ServerConfig,
}

/// API keys for external services
#[derive(Debug, Clone, Default)]
pub struct ApiKeys {
    /// Google AI Studio key (Gemini vision)
    pub google: Option<String>,

    /// `Anthropic` API key (Claude vision)
    pub anthropic: Option<String>,

    /// `OpenAI` API key (Whisper and TTS)
    pub openai: Option<String>,

    /// `ElevenLabs` API key (optional TTS)
    pub elevenlabs: Option<String>,

    /// `Deepgram` API key (optional STT)
    pub deepgram: Option<String>,
}

/// Vision model configuration
#[derive(Debug, Clone)]
pub struct VisionConfig {
    pub provider: VisionProvider,
    pub model: String,
    pub max_tokens: u32,
}

/// Voice processing configuration
#[derive(Debug, Clone)]
pub struct VoiceConfig {
    /// Enable microphone commands and spoken narration
    pub enabled: bool,

    pub stt_provider: SttProvider,

    /// STT model (e.g. "whisper-1", "nova-2")
    pub stt_model: String,

    pub tts_provider: TtsProvider,

    /// TTS model (e.g. "tts-1")
    pub tts_model: String,

    /// TTS voice identifier
    pub tts_voice: String,

    /// TTS speed multiplier, 1.0 is normal
    pub tts_speed: f64,

    /// Language of recognition and synthesis
    pub language: String,

    /// How long to wait for speech to begin
    pub listen_timeout: Duration,

    /// Maximum length of one utterance
    pub phrase_time_limit: Duration,

    /// Play narration on the local speakers
    pub playback: bool,

    /// Where synthesized audio artifacts are written
    pub artifact_dir: PathBuf,
}

/// Where frames come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CameraSource {
    /// Spawn a program that writes one JPEG frame to stdout
    Device { program: String, args: Vec<String> },
    /// Re-read a still image on every capture
    File(PathBuf),
}

/// Camera configuration
#[derive(Debug, Clone)]
pub struct CameraConfig {
    pub source: CameraSource,
    pub timeout: Duration,
}

/// HTTP control server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub enabled: bool,
    pub port: u16,
}

impl Config {
    /// Load configuration from the environment and the config file
    ///
    /// # Errors
    ///
    /// Returns error if a provider name is not recognized
    pub fn load() -> Result<Self> {
        let fc = file::load_config_file();
        Self::resolve(fc, |key| std::env::var(key).ok())
    }

    /// Resolve configuration from a parsed file and an environment lookup
    ///
    /// # Errors
    ///
    /// Returns error if a provider name is not recognized
    pub fn resolve(
        fc: file::ThirdEyeConfigFile,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        // API keys (env > toml > None)
        let api_keys = ApiKeys {
            google: env("GOOGLE_API_KEY")
                .or_else(|| env("GEMINI_API_KEY"))
                .or(fc.api_keys.google),
            anthropic: env("ANTHROPIC_API_KEY").or(fc.api_keys.anthropic),
            openai: env("OPENAI_API_KEY").or(fc.api_keys.openai),
            elevenlabs: env("ELEVENLABS_API_KEY").or(fc.api_keys.elevenlabs),
            deepgram: env("DEEPGRAM_API_KEY").or(fc.api_keys.deepgram),
        };

        let provider: VisionProvider = env("THIRD_EYE_VISION_PROVIDER")
            .or(fc.vision.provider)
            .map_or(Ok(VisionProvider::Gemini), |s| s.parse())?;
        let vision = VisionConfig {
            provider,
            model: env("THIRD_EYE_VISION_MODEL")
                .or(fc.vision.model)
                .unwrap_or_else(|| provider.default_model().to_string()),
            max_tokens: fc.vision.max_tokens.unwrap_or(300),
        };

        // Determine data directory (~/.local/share/third-eye on Linux)
        let data_dir = env("THIRD_EYE_DATA_DIR").map_or_else(
            || {
                directories::BaseDirs::new()
                    .map_or_else(|| PathBuf::from("."), |d| d.data_dir().join("third-eye"))
            },
            PathBuf::from,
        );

        let artifact_dir = env("THIRD_EYE_AUDIO_DIR")
            .or(fc.voice.artifact_dir)
            .map_or_else(|| data_dir.join("audio"), PathBuf::from);

        let stt_provider: SttProvider = env("THIRD_EYE_STT_PROVIDER")
            .or(fc.voice.stt_provider)
            .map_or(Ok(SttProvider::Whisper), |s| s.parse())?;
        let tts_provider: TtsProvider = env("THIRD_EYE_TTS_PROVIDER")
            .or(fc.voice.tts_provider)
            .map_or(Ok(TtsProvider::OpenAI), |s| s.parse())?;

        let voice = VoiceConfig {
            enabled: env("THIRD_EYE_VOICE_ENABLED")
                .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
                .or(fc.voice.enabled)
                .unwrap_or(true),
            stt_provider,
            stt_model: env("THIRD_EYE_STT_MODEL")
                .or(fc.voice.stt_model)
                .unwrap_or_else(|| stt_provider.default_model().to_string()),
            tts_provider,
            tts_model: env("THIRD_EYE_TTS_MODEL")
                .or(fc.voice.tts_model)
                .unwrap_or_else(|| tts_provider.default_model().to_string()),
            tts_voice: fc
                .voice
                .tts_voice
                .unwrap_or_else(|| tts_provider.default_voice().to_string()),
            tts_speed: fc.voice.tts_speed.unwrap_or(1.0),
            language: fc.voice.language.unwrap_or_else(|| "en".to_string()),
            listen_timeout: secs_or(fc.voice.listen_timeout_secs, DEFAULT_LISTEN_TIMEOUT),
            phrase_time_limit: secs_or(
                fc.voice.phrase_time_limit_secs,
                DEFAULT_PHRASE_TIME_LIMIT,
            ),
            playback: fc.voice.playback.unwrap_or(true),
            artifact_dir,
        };

        let camera_file = env("THIRD_EYE_CAMERA_FILE").or(fc.camera.file);
        let source = camera_file.map_or_else(
            || CameraSource::Device {
                program: fc.camera.program.unwrap_or_else(|| "ffmpeg".to_string()),
                args: fc.camera.args.unwrap_or_else(default_camera_args),
            },
            |path| CameraSource::File(PathBuf::from(path)),
        );
        let camera = CameraConfig {
            source,
            timeout: secs_or(fc.camera.timeout_secs, DEFAULT_CAMERA_TIMEOUT),
        };

        let scan_interval = secs_or(
            env("THIRD_EYE_SCAN_INTERVAL")
                .and_then(|s| s.parse().ok())
                .or(fc.scan.interval_secs),
            DEFAULT_SCAN_INTERVAL,
        );

        let guardian_contact = env("THIRD_EYE_GUARDIAN")
            .or(fc.alert.guardian_contact)
            .unwrap_or_else(|| DEFAULT_GUARDIAN_CONTACT.to_string());

        let server = ServerConfig {
            enabled: fc.server.enabled.unwrap_or(true),
            port: env("THIRD_EYE_PORT")
                .and_then(|s| s.parse().ok())
                .or(fc.server.port)
                .unwrap_or(DEFAULT_PORT),
        };

        Ok(Self {
            data_dir,
            api_keys,
            vision,
            voice,
            camera,
            scan_interval,
            guardian_contact,
            server,
        })
    }

    /// API key for the configured vision provider
    ///
    /// # Errors
    ///
    /// Returns error if the key is not set
    pub fn vision_api_key(&self) -> Result<String> {
        let (key, var) = match self.vision.provider {
            VisionProvider::Gemini => (&self.api_keys.google, "GOOGLE_API_KEY"),
            VisionProvider::Anthropic => (&self.api_keys.anthropic, "ANTHROPIC_API_KEY"),
        };
        key.clone()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| Error::Config(format!("{var} required for scene analysis")))
    }
}

/// Convert optional seconds into a duration, rejecting non-positive values
fn secs_or(secs: Option<f64>, default: Duration) -> Duration {
    match secs {
        Some(s) if s > 0.0 => Duration::try_from_secs_f64(s).unwrap_or_else(|_| {
            tracing::warn!(value = s, "ignoring invalid duration, using default");
            default
        }),
        Some(s) => {
            tracing::warn!(value = s, "ignoring invalid duration, using default");
            default
        }
        None => default,
    }
}

/// Grab one MJPEG frame from the platform default webcam
fn default_camera_args() -> Vec<String> {
    #[cfg(target_os = "macos")]
    let input: &[&str] = &["-f", "avfoundation", "-framerate", "30", "-i", "0"];
    #[cfg(target_os = "windows")]
    let input: &[&str] = &["-f", "dshow", "-i", "video=Integrated Camera"];
    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    let input: &[&str] = &["-f", "v4l2", "-i", "/dev/video0"];

    ["-hide_banner", "-loglevel", "error"]
        .iter()
        .chain(input)
        .chain(&["-frames:v", "1", "-f", "image2pipe", "-vcodec", "mjpeg", "-"])
        .map(ToString::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn resolve_with(fc: file::ThirdEyeConfigFile, vars: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        Config::resolve(fc, |key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = resolve_with(file::ThirdEyeConfigFile::default(), &[]).unwrap();

        assert_eq!(config.vision.provider, VisionProvider::Gemini);
        assert_eq!(config.vision.model, "gemini-2.5-flash");
        assert_eq!(config.scan_interval, Duration::from_secs(6));
        assert_eq!(config.voice.listen_timeout, Duration::from_secs(5));
        assert_eq!(config.voice.phrase_time_limit, Duration::from_secs(3));
        assert_eq!(config.voice.language, "en");
        assert!((config.voice.tts_speed - 1.0).abs() < f64::EPSILON);
        assert_eq!(config.guardian_contact, DEFAULT_GUARDIAN_CONTACT);
        assert!(matches!(config.camera.source, CameraSource::Device { .. }));
    }

    #[test]
    fn test_env_overrides_file() {
        let fc: file::ThirdEyeConfigFile = toml::from_str(
            r#"
            [api_keys]
            google = "from-file"

            [alert]
            guardian_contact = "+1 555 0199"
            "#,
        )
        .unwrap();

        let config = resolve_with(
            fc,
            &[("GOOGLE_API_KEY", "from-env"), ("THIRD_EYE_CAMERA_FILE", "/tmp/a.jpg")],
        )
        .unwrap();

        assert_eq!(config.api_keys.google.as_deref(), Some("from-env"));
        assert_eq!(config.guardian_contact, "+1 555 0199");
        assert_eq!(config.camera.source, CameraSource::File(PathBuf::from("/tmp/a.jpg")));
    }

    #[test]
    fn test_unknown_provider_is_error() {
        let result = resolve_with(
            file::ThirdEyeConfigFile::default(),
            &[("THIRD_EYE_VISION_PROVIDER", "carrier-pigeon")],
        );
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_vision_key_required() {
        let config = resolve_with(file::ThirdEyeConfigFile::default(), &[]).unwrap();
        assert!(config.vision_api_key().is_err());

        let config = resolve_with(
            file::ThirdEyeConfigFile::default(),
            &[("THIRD_EYE_VISION_PROVIDER", "anthropic"), ("ANTHROPIC_API_KEY", "k")],
        )
        .unwrap();
        assert_eq!(config.vision_api_key().unwrap(), "k");
    }

    #[test]
    fn test_invalid_duration_uses_default() {
        assert_eq!(secs_or(Some(-1.0), DEFAULT_SCAN_INTERVAL), DEFAULT_SCAN_INTERVAL);
        assert_eq!(secs_or(Some(f64::NAN), DEFAULT_SCAN_INTERVAL), DEFAULT_SCAN_INTERVAL);
        assert_eq!(secs_or(Some(0.5), DEFAULT_SCAN_INTERVAL), Duration::from_millis(500));
    }

    #[test]
    fn test_oversized_duration_uses_default() {
        assert_eq!(secs_or(Some(1e30), DEFAULT_SCAN_INTERVAL), DEFAULT_SCAN_INTERVAL);
        assert_eq!(secs_or(Some(f64::INFINITY), DEFAULT_SCAN_INTERVAL), DEFAULT_SCAN_INTERVAL);

        let config = resolve_with(
            file::ThirdEyeConfigFile::default(),
            &[("THIRD_EYE_SCAN_INTERVAL", "1e30")],
        )
        .unwrap();
        assert_eq!(config.scan_interval, DEFAULT_SCAN_INTERVAL);
    }

    #[test]
    fn test_default_camera_args_emit_one_frame() {
        let args = default_camera_args();
        assert_eq!(args.last().map(String::as_str), Some("-"));
        assert!(args.windows(2).any(|w| w[0] == "-frames:v" && w[1] == "1"));
    }
}
