//! Microphone capture and single-phrase listening

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleRate, Stream, StreamConfig};

use crate::{Error, Result};

/// Sample rate for audio capture (16kHz for speech)
pub const SAMPLE_RATE: u32 = 16000;

/// Minimum audio energy to count as speech
const ENERGY_THRESHOLD: f32 = 0.03;

/// Trailing silence that ends a phrase (0.8 seconds)
const END_SILENCE_SAMPLES: usize = 12_800;

/// Shortest phrase worth transcribing (0.3 seconds)
const MIN_PHRASE_SAMPLES: usize = 4800;

/// How often the listening loop drains the capture buffer
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Captures audio from the default input device
pub struct Microphone {
    config: StreamConfig,
    buffer: Arc<Mutex<Vec<f32>>>,
    stream: Option<Stream>,
}

impl Microphone {
    /// Open the default input device
    ///
    /// # Errors
    ///
    /// Returns error if no input device supports 16kHz mono
    pub fn new() -> Result<Self> {
        let device = default_input()?;

        let supported_config = device
            .supported_input_configs()
            .map_err(|e| Error::Audio(e.to_string()))?
            .find(|c| {
                c.channels() == 1
                    && c.min_sample_rate() <= SampleRate(SAMPLE_RATE)
                    && c.max_sample_rate() >= SampleRate(SAMPLE_RATE)
            })
            .ok_or_else(|| Error::Audio("no suitable audio config found".to_string()))?;

        let config = supported_config
            .with_sample_rate(SampleRate(SAMPLE_RATE))
            .config();

        tracing::debug!(
            device = device.name().unwrap_or_default(),
            sample_rate = SAMPLE_RATE,
            "microphone opened"
        );

        Ok(Self {
            config,
            buffer: Arc::new(Mutex::new(Vec::new())),
            stream: None,
        })
    }

    /// Start capturing audio
    ///
    /// # Errors
    ///
    /// Returns error if the input stream cannot be started
    pub fn start(&mut self) -> Result<()> {
        if self.stream.is_some() {
            return Ok(());
        }

        let buffer = Arc::clone(&self.buffer);
        let stream = default_input()?
            .build_input_stream(
                &self.config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    if let Ok(mut buf) = buffer.lock() {
                        buf.extend_from_slice(data);
                    }
                },
                |err| {
                    tracing::error!(error = %err, "audio capture error");
                },
                None,
            )
            .map_err(|e| Error::Audio(e.to_string()))?;

        stream.play().map_err(|e| Error::Audio(e.to_string()))?;
        self.stream = Some(stream);
        Ok(())
    }

    /// Stop capturing and release the input stream
    pub fn stop(&mut self) {
        self.stream.take();
    }

    /// Take the samples captured since the last call
    #[must_use]
    pub fn take_buffer(&self) -> Vec<f32> {
        self.buffer
            .lock()
            .map(|mut buf| std::mem::take(&mut *buf))
            .unwrap_or_default()
    }
}

fn default_input() -> Result<cpal::Device> {
    cpal::default_host()
        .default_input_device()
        .ok_or_else(|| Error::Audio("no input device available".to_string()))
}

/// Progress of a phrase being listened for
#[derive(Debug, Clone, PartialEq)]
pub enum PhraseEvent {
    /// No speech yet
    Waiting,
    /// Speech is in progress
    Speaking,
    /// Phrase ended by silence or the length limit
    Complete(Vec<f32>),
    /// No speech began before the timeout
    TimedOut,
}

/// Energy-based detector for one spoken phrase
///
/// Time is measured in samples so the detector behaves the same on live
/// audio and on synthetic buffers.
pub struct PhraseDetector {
    timeout_samples: usize,
    limit_samples: usize,
    waited: usize,
    silence: usize,
    phrase: Vec<f32>,
    started: bool,
}

impl PhraseDetector {
    /// Wait up to `timeout` for speech, then record at most `phrase_limit`
    #[must_use]
    pub fn new(timeout: Duration, phrase_limit: Duration) -> Self {
        Self {
            timeout_samples: duration_to_samples(timeout),
            limit_samples: duration_to_samples(phrase_limit),
            waited: 0,
            silence: 0,
            phrase: Vec::new(),
            started: false,
        }
    }

    /// Feed the next chunk of samples
    pub fn feed(&mut self, samples: &[f32]) -> PhraseEvent {
        let is_speech = calculate_energy(samples) > ENERGY_THRESHOLD;

        if !self.started {
            if is_speech {
                self.started = true;
                self.phrase.extend_from_slice(samples);
                tracing::trace!("speech started");
            } else {
                self.waited += samples.len();
                if self.waited >= self.timeout_samples {
                    return PhraseEvent::TimedOut;
                }
                return PhraseEvent::Waiting;
            }
        } else {
            self.phrase.extend_from_slice(samples);
            if is_speech {
                self.silence = 0;
            } else {
                self.silence += samples.len();
            }
        }

        let ended_by_silence =
            self.silence > END_SILENCE_SAMPLES && self.phrase.len() > MIN_PHRASE_SAMPLES;
        if ended_by_silence || self.phrase.len() >= self.limit_samples {
            self.phrase.truncate(self.limit_samples);
            return PhraseEvent::Complete(std::mem::take(&mut self.phrase));
        }

        PhraseEvent::Speaking
    }
}

/// Record one phrase from the microphone, blocking the calling thread
///
/// Returns `None` when nobody spoke before the timeout.
///
/// # Errors
///
/// Returns error if the microphone cannot be opened
pub fn record_phrase(timeout: Duration, phrase_limit: Duration) -> Result<Option<Vec<f32>>> {
    let mut mic = Microphone::new()?;
    mic.start()?;

    let mut detector = PhraseDetector::new(timeout, phrase_limit);
    let deadline = Instant::now() + timeout + phrase_limit + Duration::from_secs(1);

    let result = loop {
        std::thread::sleep(POLL_INTERVAL);

        match detector.feed(&mic.take_buffer()) {
            PhraseEvent::Complete(samples) => break Some(samples),
            PhraseEvent::TimedOut => break None,
            PhraseEvent::Waiting | PhraseEvent::Speaking => {}
        }

        // A stalled device delivers no samples; don't wait on it forever
        if Instant::now() > deadline {
            break None;
        }
    };

    mic.stop();
    tracing::debug!(
        samples = result.as_ref().map_or(0, Vec::len),
        "listening finished"
    );
    Ok(result)
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn duration_to_samples(duration: Duration) -> usize {
    (duration.as_secs_f64() * f64::from(SAMPLE_RATE)) as usize
}

/// Calculate RMS energy of audio samples
#[allow(clippy::cast_precision_loss)]
#[must_use]
pub fn calculate_energy(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }

    let sum_squares: f32 = samples.iter().map(|s| s * s).sum();
    (sum_squares / samples.len() as f32).sqrt()
}

/// Convert f32 samples to WAV bytes for STT APIs
///
/// # Errors
///
/// Returns error if WAV encoding fails
pub fn samples_to_wav(samples: &[f32], sample_rate: u32) -> Result<Vec<u8>> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = std::io::Cursor::new(Vec::new());
    {
        let mut writer =
            hound::WavWriter::new(&mut cursor, spec).map_err(|e| Error::Audio(e.to_string()))?;

        for &sample in samples {
            #[allow(clippy::cast_possible_truncation)]
            let sample_i16 = (sample * 32767.0).clamp(-32768.0, 32767.0) as i16;
            writer
                .write_sample(sample_i16)
                .map_err(|e| Error::Audio(e.to_string()))?;
        }

        writer.finalize().map_err(|e| Error::Audio(e.to_string()))?;
    }

    Ok(cursor.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_energy_calculation() {
        assert!(calculate_energy(&[]) < f32::EPSILON);
        assert!(calculate_energy(&[0.0; 100]) < 0.001);
        assert!(calculate_energy(&[0.5; 100]) > 0.4);
    }

    #[test]
    fn test_duration_to_samples() {
        assert_eq!(duration_to_samples(Duration::from_secs(1)), 16000);
        assert_eq!(duration_to_samples(Duration::from_millis(500)), 8000);
    }
}
