//! Shared test utilities
//!
//! Mock collaborators so the controller can run without hardware or network.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tempfile::TempDir;
use third_eye::camera::{Frame, FrameSource};
use third_eye::vision::{SceneAnalyzer, SceneModel};
use third_eye::voice::{
    AudioArtifact, CommandListener, Narrator, Recognition, Speaker, SpeechSynthesizer,
};
use third_eye::{Collaborators, Controller, ControllerHandle, DisplayState, Error, ModeState, Result};
use tokio::sync::{oneshot, watch};

/// Scan interval used by controller tests
pub const INTERVAL: Duration = Duration::from_secs(6);

/// Camera returning a tiny JPEG, or failing on demand
#[derive(Default)]
pub struct MockCamera {
    pub captures: Mutex<Vec<tokio::time::Instant>>,
    pub fail: bool,
    /// Captures after this many succeed fail
    pub fail_after: Option<usize>,
    /// First capture waits until this fires
    pub gate: Mutex<Option<oneshot::Receiver<()>>>,
    /// Fired when a gated capture begins
    pub entered: Mutex<Option<oneshot::Sender<()>>>,
}

impl MockCamera {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// Camera whose first capture blocks until the returned sender fires
    pub fn gated() -> (Self, oneshot::Sender<()>, oneshot::Receiver<()>) {
        let (release, gate) = oneshot::channel();
        let (entered_tx, entered) = oneshot::channel();
        let camera = Self {
            gate: Mutex::new(Some(gate)),
            entered: Mutex::new(Some(entered_tx)),
            ..Self::default()
        };
        (camera, release, entered)
    }

    /// Camera that delivers `n` frames, then fails
    pub fn failing_after(n: usize) -> Self {
        Self {
            fail_after: Some(n),
            ..Self::default()
        }
    }

    pub fn capture_count(&self) -> usize {
        self.captures.lock().unwrap().len()
    }
}

#[async_trait]
impl FrameSource for MockCamera {
    async fn capture(&self) -> Result<Frame> {
        let count = {
            let mut captures = self.captures.lock().unwrap();
            captures.push(tokio::time::Instant::now());
            captures.len()
        };

        let gate = self.gate.lock().unwrap().take();
        if let Some(gate) = gate {
            if let Some(entered) = self.entered.lock().unwrap().take() {
                let _ = entered.send(());
            }
            let _ = gate.await;
        }

        if self.fail || self.fail_after.is_some_and(|n| count > n) {
            return Err(Error::Camera("no camera attached".to_string()));
        }
        Ok(Frame::jpeg(vec![0xFF, 0xD8, 0xFF, 0xD9]))
    }
}

/// Vision model with a canned reply that records every prompt
pub struct MockModel {
    pub prompts: Mutex<Vec<String>>,
    /// Reply for the first call only
    first: Mutex<Option<std::result::Result<String, String>>>,
    reply: std::result::Result<String, String>,
}

impl MockModel {
    pub fn replying(text: &str) -> Self {
        Self {
            prompts: Mutex::new(Vec::new()),
            first: Mutex::new(None),
            reply: Ok(text.to_string()),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            prompts: Mutex::new(Vec::new()),
            first: Mutex::new(None),
            reply: Err(message.to_string()),
        }
    }

    /// Succeed once with `text`, then fail with `message`
    pub fn replying_once(text: &str, message: &str) -> Self {
        Self {
            prompts: Mutex::new(Vec::new()),
            first: Mutex::new(Some(Ok(text.to_string()))),
            reply: Err(message.to_string()),
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl SceneModel for MockModel {
    async fn generate(&self, prompt: &str, _frame: &Frame) -> Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        let first = self.first.lock().unwrap().take();
        first
            .unwrap_or_else(|| self.reply.clone())
            .map_err(Error::Vision)
    }
}

/// Synthesizer producing placeholder MP3 bytes
#[derive(Default)]
pub struct MockSynthesizer {
    pub texts: Mutex<Vec<String>>,
    pub fail: bool,
    /// Calls after this many succeed fail
    pub fail_after: Option<usize>,
}

#[async_trait]
impl SpeechSynthesizer for MockSynthesizer {
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>> {
        let count = {
            let mut texts = self.texts.lock().unwrap();
            texts.push(text.to_string());
            texts.len()
        };
        if self.fail || self.fail_after.is_some_and(|n| count > n) {
            return Err(Error::Tts("quota exceeded".to_string()));
        }
        Ok(b"ID3 fake mp3".to_vec())
    }
}

/// Listener replaying scripted recognitions
#[derive(Default)]
pub struct MockListener {
    pub script: Mutex<VecDeque<Recognition>>,
}

impl MockListener {
    pub fn hearing(recognitions: impl IntoIterator<Item = Recognition>) -> Self {
        Self {
            script: Mutex::new(recognitions.into_iter().collect()),
        }
    }
}

#[async_trait]
impl CommandListener for MockListener {
    async fn listen(&self) -> Recognition {
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Recognition::NoAudio)
    }
}

/// Speaker recording what it was asked to play
#[derive(Default)]
pub struct MockSpeaker {
    pub played: Mutex<Vec<PathBuf>>,
}

#[async_trait]
impl Speaker for MockSpeaker {
    async fn play(&self, artifact: &AudioArtifact) -> Result<()> {
        self.played
            .lock()
            .unwrap()
            .push(artifact.path().to_path_buf());
        Ok(())
    }
}

/// A running controller wired to mocks
pub struct Harness {
    pub handle: ControllerHandle,
    pub camera: Arc<MockCamera>,
    pub model: Arc<MockModel>,
    pub synthesizer: Arc<MockSynthesizer>,
    pub listener: Arc<MockListener>,
    pub speaker: Arc<MockSpeaker>,
    pub audio_dir: TempDir,
}

impl Harness {
    pub fn start(camera: MockCamera, model: MockModel) -> Self {
        Self::start_with(camera, model, MockListener::default(), MockSynthesizer::default())
    }

    pub fn start_with(
        camera: MockCamera,
        model: MockModel,
        listener: MockListener,
        synthesizer: MockSynthesizer,
    ) -> Self {
        let camera = Arc::new(camera);
        let model = Arc::new(model);
        let listener = Arc::new(listener);
        let synthesizer = Arc::new(synthesizer);
        let speaker = Arc::new(MockSpeaker::default());
        let audio_dir = TempDir::new().unwrap();

        let collaborators = Collaborators {
            camera: camera.clone(),
            analyzer: SceneAnalyzer::new(model.clone()),
            narrator: Some(Arc::new(Narrator::new(
                synthesizer.clone(),
                audio_dir.path(),
            ))),
            listener: Some(listener.clone()),
            speaker: Some(speaker.clone()),
        };

        let (controller, handle) =
            Controller::new(ModeState::new("+1 555 0100"), collaborators, INTERVAL);
        tokio::spawn(controller.run());

        Self {
            handle,
            camera,
            model,
            synthesizer,
            listener,
            speaker,
            audio_dir,
        }
    }

    /// Wait until the display satisfies `predicate`
    pub async fn wait_for(&self, predicate: impl FnMut(&DisplayState) -> bool) -> DisplayState {
        let mut rx: watch::Receiver<DisplayState> = self.handle.subscribe();
        rx.wait_for(predicate).await.unwrap().clone()
    }

    pub fn played(&self) -> Vec<PathBuf> {
        self.speaker.played.lock().unwrap().clone()
    }
}

/// Narration artifacts currently in `dir`
pub fn artifacts_in(dir: &Path) -> Vec<PathBuf> {
    std::fs::read_dir(dir)
        .unwrap()
        .filter_map(|e| e.ok().map(|e| e.path()))
        .filter(|p| {
            p.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(third_eye::voice::is_artifact_name)
        })
        .collect()
}
