//! Assistant controller and scan loop
//!
//! A single task owns the [`ModeState`]. Controls arrive as [`Action`]s over a
//! channel; observers read [`DisplayState`] snapshots from a watch channel.
//!
//! While idle the controller waits for the next action. While running it
//! applies every queued action at the top of an iteration, then performs one
//! full capture, analyze, narrate and play pass followed by the fixed scan
//! delay. Actions sent during a pass or its delay are seen at the top of the
//! next iteration, so a stop never interrupts a pass in flight.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc::error::TryRecvError;
use tokio::sync::{mpsc, oneshot, watch};

use super::{AlertTrigger, Command, DisplayState, Mode, ModeState, Status, interpret, simulate_alert};
use crate::camera::FrameSource;
use crate::vision::{SceneAnalyzer, is_error_text, is_found_text};
use crate::voice::{CommandListener, Narrator, Speaker};
use crate::{Error, Result};

/// Queue depth for pending control requests
const REQUEST_BUFFER: usize = 32;

/// A control request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Listen for one spoken command
    Listen,
    /// Interpret typed text as if it had been spoken
    Utterance(String),
    /// Switch mode directly; `target` replaces the search target when given
    SetMode { mode: Mode, target: Option<String> },
    /// Begin scanning
    Start,
    /// Stop scanning after the current iteration
    Stop,
    /// Raise the simulated emergency alert
    Alert,
    /// Change the guardian contact
    SetGuardian(String),
}

struct Request {
    action: Action,
    reply: Option<oneshot::Sender<Status>>,
}

/// Everything the controller talks to
pub struct Collaborators {
    pub camera: Arc<dyn FrameSource>,
    pub analyzer: SceneAnalyzer,
    /// `None` disables narration audio
    pub narrator: Option<Arc<Narrator>>,
    /// `None` disables voice commands
    pub listener: Option<Arc<dyn CommandListener>>,
    /// `None` mutes playback
    pub speaker: Option<Arc<dyn Speaker>>,
}

/// Cloneable handle for sending actions and observing the display
#[derive(Clone)]
pub struct ControllerHandle {
    tx: mpsc::Sender<Request>,
    display: watch::Receiver<DisplayState>,
}

impl ControllerHandle {
    /// Send an action and wait for its status
    ///
    /// While scanning, the reply arrives once the current iteration is over.
    ///
    /// # Errors
    ///
    /// Returns error if the controller has shut down
    pub async fn send(&self, action: Action) -> Result<Status> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(Request {
                action,
                reply: Some(reply),
            })
            .await
            .map_err(|_| Error::Controller("controller is not running".to_string()))?;

        rx.await
            .map_err(|_| Error::Controller("controller dropped the request".to_string()))
    }

    /// Queue an action without waiting for it to be applied
    ///
    /// # Errors
    ///
    /// Returns error if the controller has shut down
    pub async fn submit(&self, action: Action) -> Result<()> {
        self.tx
            .send(Request {
                action,
                reply: None,
            })
            .await
            .map_err(|_| Error::Controller("controller is not running".to_string()))
    }

    /// Latest display snapshot
    #[must_use]
    pub fn display(&self) -> DisplayState {
        self.display.borrow().clone()
    }

    /// Receiver notified after every display change
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<DisplayState> {
        self.display.clone()
    }
}

/// Owns the mode state and runs the scan loop
pub struct Controller {
    state: ModeState,
    collaborators: Collaborators,
    interval: Duration,
    rx: mpsc::Receiver<Request>,
    display: DisplayState,
    display_tx: watch::Sender<DisplayState>,
}

impl Controller {
    /// Create a controller and the handle used to drive it
    #[must_use]
    pub fn new(
        state: ModeState,
        collaborators: Collaborators,
        interval: Duration,
    ) -> (Self, ControllerHandle) {
        let (tx, rx) = mpsc::channel(REQUEST_BUFFER);

        let mut display = DisplayState::default();
        display.sync(&state);
        let (display_tx, display_rx) = watch::channel(display.clone());

        let controller = Self {
            state,
            collaborators,
            interval,
            rx,
            display,
            display_tx,
        };
        let handle = ControllerHandle {
            tx,
            display: display_rx,
        };

        (controller, handle)
    }

    /// Run until every handle has been dropped
    pub async fn run(mut self) {
        tracing::info!(
            mode = %self.state.mode,
            interval_secs = self.interval.as_secs_f64(),
            "controller started"
        );

        loop {
            if self.state.running {
                if !self.drain_requests().await {
                    break;
                }
                if !self.state.running {
                    continue;
                }

                self.iterate().await;
                self.display.iterations += 1;
                self.publish();

                tokio::time::sleep(self.interval).await;
            } else {
                match self.rx.recv().await {
                    Some(request) => self.handle(request).await,
                    None => break,
                }
            }
        }

        tracing::info!("controller stopped");
    }

    /// Apply every queued request; `false` once all handles are gone
    async fn drain_requests(&mut self) -> bool {
        loop {
            match self.rx.try_recv() {
                Ok(request) => self.handle(request).await,
                Err(TryRecvError::Empty) => return true,
                Err(TryRecvError::Disconnected) => return false,
            }
        }
    }

    async fn handle(&mut self, request: Request) {
        tracing::debug!(action = ?request.action, "applying action");

        let status = self.apply(request.action).await;
        self.set_status(status.clone());

        if let Some(reply) = request.reply {
            // The requester may have given up waiting
            let _ = reply.send(status);
        }
    }

    async fn apply(&mut self, action: Action) -> Status {
        match action {
            Action::Listen => match self.collaborators.listener.clone() {
                Some(listener) => {
                    self.set_status(Status::info("Listening... Speak now!"));
                    let recognition = listener.listen().await;
                    self.apply_utterance(&recognition.as_utterance())
                }
                None => Status::warning("Voice input is disabled"),
            },
            Action::Utterance(text) => self.apply_utterance(&text),
            Action::SetMode { mode, target } => {
                self.state.mode = mode;
                if let Some(target) = target {
                    self.state.target_query = target;
                }
                tracing::info!(%mode, "mode set");

                if mode == Mode::Sos {
                    self.raise_alert(AlertTrigger::Manual)
                } else {
                    Status::success(format!("Switched to {}", mode.label()))
                }
            }
            Action::Start => {
                if self.state.running {
                    Status::info("System already running")
                } else {
                    self.state.running = true;
                    tracing::info!("scanning started");
                    Status::info("System started")
                }
            }
            Action::Stop => {
                if self.state.running {
                    self.state.running = false;
                    tracing::info!("scanning stopped");
                    Status::info("System stopped")
                } else {
                    Status::info("System already stopped")
                }
            }
            Action::Alert => self.raise_alert(AlertTrigger::Manual),
            Action::SetGuardian(contact) => {
                let contact = contact.trim().to_string();
                let status = Status::info(format!("Guardian contact set to {contact}"));
                self.state.guardian_contact = contact;
                status
            }
        }
    }

    fn apply_utterance(&mut self, utterance: &str) -> Status {
        let command = interpret(utterance);
        let status = self.state.apply(&command);
        tracing::info!(utterance, ?command, mode = %self.state.mode, "command interpreted");

        if command == Command::Sos {
            self.raise_alert(AlertTrigger::Voice)
        } else {
            status
        }
    }

    fn raise_alert(&mut self, trigger: AlertTrigger) -> Status {
        let alert = simulate_alert(&self.state.guardian_contact, trigger);
        tracing::warn!(to = %alert.to, ?trigger, "simulated emergency alert\n{alert}");

        self.display.alert = Some(alert);
        Status::error("EMERGENCY ALERT SENT!")
    }

    /// One capture, analyze, narrate and play pass
    async fn iterate(&mut self) {
        // Output from the previous pass never outlives it
        self.display.frame = None;
        self.display.narration = None;
        self.display.artifact = None;

        let frame = match self.collaborators.camera.capture().await {
            Ok(frame) => frame,
            Err(e) => {
                tracing::warn!(error = %e, "capture failed, skipping iteration");
                self.set_status(Status::warning(format!("Camera unavailable: {e}")));
                return;
            }
        };

        self.display.frame = Some(frame.clone());
        self.publish();

        let mode = self.state.mode;
        let text = self
            .collaborators
            .analyzer
            .analyze(&frame, mode, &self.state.target_query)
            .await;

        let failed = is_error_text(&text);
        let status = if failed {
            Status::error(text.clone())
        } else if is_found_text(&text) {
            Status::success(text.clone())
        } else {
            Status::info(text.clone())
        };
        self.display.narration = Some(text.clone());
        self.set_status(status);

        if failed {
            return;
        }

        let Some(narrator) = self.collaborators.narrator.clone() else {
            return;
        };
        let Some(artifact) = narrator.synthesize(&text).await else {
            return;
        };

        self.display.artifact = Some(artifact.path().to_path_buf());
        self.publish();

        if let Some(speaker) = self.collaborators.speaker.clone()
            && let Err(e) = speaker.play(&artifact).await
        {
            tracing::warn!(error = %e, "narration playback failed");
        }
    }

    fn set_status(&mut self, status: Status) {
        self.display.status = Some(status);
        self.publish();
    }

    fn publish(&mut self) {
        self.display.sync(&self.state);
        self.display_tx.send_replace(self.display.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_equality() {
        assert_eq!(
            Action::SetMode {
                mode: Mode::Reading,
                target: None
            },
            Action::SetMode {
                mode: Mode::Reading,
                target: None
            }
        );
        assert_ne!(Action::Start, Action::Stop);
    }
}
