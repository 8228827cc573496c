//! Narration audio artifacts
//!
//! Each narration is written to its own uniquely named MP3 file. Older files
//! with the same naming convention are removed first, so a long scan session
//! keeps at most one artifact on disk.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;

use super::tts::SpeechSynthesizer;
use crate::Result;

/// File name prefix for narration artifacts
pub const ARTIFACT_PREFIX: &str = "temp_audio_";

/// File name suffix for narration artifacts
pub const ARTIFACT_SUFFIX: &str = ".mp3";

/// Synthesized speech for one narration, on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioArtifact {
    path: PathBuf,
}

impl AudioArtifact {
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn into_path(self) -> PathBuf {
        self.path
    }
}

/// Turns text into audio artifacts in a single directory
pub struct Narrator {
    synthesizer: Arc<dyn SpeechSynthesizer>,
    dir: PathBuf,
    sequence: AtomicU64,
}

impl Narrator {
    #[must_use]
    pub fn new(synthesizer: Arc<dyn SpeechSynthesizer>, dir: impl Into<PathBuf>) -> Self {
        Self {
            synthesizer,
            dir: dir.into(),
            sequence: AtomicU64::new(0),
        }
    }

    /// Directory artifacts are written to
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Synthesize `text` into a fresh artifact
    ///
    /// Returns `None` if synthesis or writing fails; the caller skips playback.
    pub async fn synthesize(&self, text: &str) -> Option<AudioArtifact> {
        match self.try_synthesize(text).await {
            Ok(artifact) => {
                tracing::debug!(path = %artifact.path.display(), "narration written");
                Some(artifact)
            }
            Err(e) => {
                tracing::warn!(error = %e, "narration synthesis failed");
                None
            }
        }
    }

    async fn try_synthesize(&self, text: &str) -> Result<AudioArtifact> {
        tokio::fs::create_dir_all(&self.dir).await?;
        self.remove_stale().await;

        let audio = self.synthesizer.synthesize(text).await?;

        let path = self.dir.join(self.next_file_name());
        tokio::fs::write(&path, audio).await?;

        Ok(AudioArtifact { path })
    }

    fn next_file_name(&self) -> String {
        let seq = self.sequence.fetch_add(1, Ordering::Relaxed);
        let stamp = Utc::now().timestamp_millis();
        format!("{ARTIFACT_PREFIX}{stamp}_{seq}{ARTIFACT_SUFFIX}")
    }

    /// Best-effort removal of earlier artifacts
    async fn remove_stale(&self) {
        let Ok(mut entries) = tokio::fs::read_dir(&self.dir).await else {
            return;
        };

        while let Ok(Some(entry)) = entries.next_entry().await {
            let name = entry.file_name();
            if !is_artifact_name(&name.to_string_lossy()) {
                continue;
            }

            // The file may still be open by a player
            if let Err(e) = tokio::fs::remove_file(entry.path()).await {
                tracing::debug!(path = %entry.path().display(), error = %e, "stale artifact kept");
            }
        }
    }
}

/// Whether a file name follows the artifact naming convention
#[must_use]
pub fn is_artifact_name(name: &str) -> bool {
    name.starts_with(ARTIFACT_PREFIX) && name.ends_with(ARTIFACT_SUFFIX)
}
