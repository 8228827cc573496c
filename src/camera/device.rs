//! Live camera capture through an external grabber program
//!
//! The program (ffmpeg by default) owns the device for the lifetime of one
//! capture: it opens the webcam, writes a single encoded frame to stdout and
//! exits. The child is killed on drop, so a timed-out capture still releases
//! the device.

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;

use super::{Frame, FrameSource};
use crate::{Error, Result};

/// Webcam accessed by spawning a frame grabber per capture
#[derive(Debug, Clone)]
pub struct DeviceCamera {
    program: String,
    args: Vec<String>,
    timeout: Duration,
}

impl DeviceCamera {
    /// Create a camera that runs `program args...` for each frame
    #[must_use]
    pub const fn new(program: String, args: Vec<String>, timeout: Duration) -> Self {
        Self {
            program,
            args,
            timeout,
        }
    }
}

#[async_trait]
impl FrameSource for DeviceCamera {
    async fn capture(&self) -> Result<Frame> {
        let child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| Error::Camera(format!("failed to start {}: {e}", self.program)))?;

        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| {
                Error::Camera(format!("no frame within {}s", self.timeout.as_secs_f32()))
            })??;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::Camera(format!(
                "{} exited with {}: {}",
                self.program,
                output.status,
                stderr.trim()
            )));
        }

        if output.stdout.is_empty() {
            return Err(Error::Camera("capture produced no image data".to_string()));
        }

        tracing::debug!(bytes = output.stdout.len(), "frame captured");
        Ok(Frame::new(output.stdout))
    }
}
