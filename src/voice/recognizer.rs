//! One-shot voice command listening

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use super::capture::{SAMPLE_RATE, record_phrase, samples_to_wav};
use super::stt::SpeechToText;

/// Outcome of one listening attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recognition {
    /// Speech was transcribed
    Utterance(String),
    /// Audio was heard but nothing intelligible came back
    Unrecognized,
    /// The recognition service failed
    ServiceUnavailable,
    /// Nobody spoke, or the microphone could not be used
    NoAudio,
}

impl Recognition {
    /// Lowercased utterance, or a sentinel phrase for failures
    ///
    /// Sentinels never match a command keyword, so the interpreter reports
    /// them as unrecognized.
    #[must_use]
    pub fn as_utterance(&self) -> String {
        match self {
            Self::Utterance(text) => text.to_lowercase(),
            Self::Unrecognized => "could not understand audio".to_string(),
            Self::ServiceUnavailable => "voice service down".to_string(),
            Self::NoAudio => "no audio detected".to_string(),
        }
    }
}

/// Listens for a single spoken command
#[async_trait]
pub trait CommandListener: Send + Sync {
    async fn listen(&self) -> Recognition;
}

/// Microphone plus hosted speech recognition
pub struct MicListener {
    stt: Arc<SpeechToText>,
    timeout: Duration,
    phrase_limit: Duration,
}

impl MicListener {
    #[must_use]
    pub const fn new(stt: Arc<SpeechToText>, timeout: Duration, phrase_limit: Duration) -> Self {
        Self {
            stt,
            timeout,
            phrase_limit,
        }
    }
}

#[async_trait]
impl CommandListener for MicListener {
    async fn listen(&self) -> Recognition {
        let (timeout, limit) = (self.timeout, self.phrase_limit);

        tracing::info!("listening for command");
        let recorded = tokio::task::spawn_blocking(move || record_phrase(timeout, limit)).await;

        let samples = match recorded {
            Ok(Ok(Some(samples))) => samples,
            Ok(Ok(None)) => {
                tracing::info!("no speech before timeout");
                return Recognition::NoAudio;
            }
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "microphone unavailable");
                return Recognition::NoAudio;
            }
            Err(e) => {
                tracing::error!(error = %e, "listening task failed");
                return Recognition::NoAudio;
            }
        };

        let wav = match samples_to_wav(&samples, SAMPLE_RATE) {
            Ok(wav) => wav,
            Err(e) => {
                tracing::warn!(error = %e, "failed to encode phrase");
                return Recognition::NoAudio;
            }
        };

        match self.stt.transcribe(&wav).await {
            Ok(text) if text.trim().is_empty() => Recognition::Unrecognized,
            Ok(text) => Recognition::Utterance(text.trim().to_string()),
            Err(e) => {
                tracing::warn!(error = %e, "speech recognition failed");
                Recognition::ServiceUnavailable
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_utterance_lowercased() {
        assert_eq!(
            Recognition::Utterance("Find My Keys".to_string()).as_utterance(),
            "find my keys"
        );
    }

    #[test]
    fn test_sentinels() {
        assert_eq!(
            Recognition::Unrecognized.as_utterance(),
            "could not understand audio"
        );
        assert_eq!(
            Recognition::ServiceUnavailable.as_utterance(),
            "voice service down"
        );
        assert_eq!(Recognition::NoAudio.as_utterance(), "no audio detected");
    }
}
