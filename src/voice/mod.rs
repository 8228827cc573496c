//! Voice processing module
//!
//! Listening for spoken commands, speech synthesis for narration, and local
//! playback of the resulting artifacts.

mod capture;
mod narration;
mod playback;
mod recognizer;
mod stt;
mod tts;

pub use capture::{
    Microphone, PhraseDetector, PhraseEvent, SAMPLE_RATE, calculate_energy, record_phrase,
    samples_to_wav,
};
pub use narration::{ARTIFACT_PREFIX, ARTIFACT_SUFFIX, AudioArtifact, Narrator, is_artifact_name};
pub use playback::{AudioPlayback, LocalSpeaker, Speaker, decode_mp3};
pub use recognizer::{CommandListener, MicListener, Recognition};
pub use stt::{SpeechToText, SttProvider};
pub use tts::{SpeechSynthesizer, TextToSpeech, TtsProvider};
