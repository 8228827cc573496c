//! Camera capture
//!
//! Each capture opens the camera, takes exactly one frame and releases the
//! camera again before returning, whether or not the capture succeeded.

mod device;
mod still;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

pub use device::DeviceCamera;
pub use still::StillImage;

use crate::Result;
use crate::config::{CameraConfig, CameraSource};

/// A single captured image
#[derive(Clone, Debug)]
pub struct Frame {
    data: Arc<[u8]>,
    mime_type: &'static str,
    captured_at: DateTime<Utc>,
}

impl Frame {
    /// Wrap encoded image bytes, detecting the format from its header
    #[must_use]
    pub fn new(data: Vec<u8>) -> Self {
        let mime_type = sniff_mime_type(&data);
        Self {
            data: data.into(),
            mime_type,
            captured_at: Utc::now(),
        }
    }

    /// Wrap JPEG bytes
    #[must_use]
    pub fn jpeg(data: Vec<u8>) -> Self {
        Self {
            data: data.into(),
            mime_type: "image/jpeg",
            captured_at: Utc::now(),
        }
    }

    /// Encoded image bytes
    #[must_use]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// MIME type of the encoded image
    #[must_use]
    pub const fn mime_type(&self) -> &'static str {
        self.mime_type
    }

    /// When the frame was captured
    #[must_use]
    pub const fn captured_at(&self) -> DateTime<Utc> {
        self.captured_at
    }
}

/// Something that yields one frame per call
#[async_trait]
pub trait FrameSource: Send + Sync {
    /// Capture one frame
    ///
    /// # Errors
    ///
    /// Returns error if the camera cannot be opened or yields no frame
    async fn capture(&self) -> Result<Frame>;
}

/// Build the frame source described by the configuration
#[must_use]
pub fn from_config(config: &CameraConfig) -> Arc<dyn FrameSource> {
    match &config.source {
        CameraSource::Device { program, args } => Arc::new(DeviceCamera::new(
            program.clone(),
            args.clone(),
            config.timeout,
        )),
        CameraSource::File(path) => Arc::new(StillImage::new(path.clone())),
    }
}

/// Detect an image MIME type from magic bytes
///
/// Unknown formats default to JPEG, which is what capture programs emit.
#[must_use]
pub fn sniff_mime_type(data: &[u8]) -> &'static str {
    match data {
        [0x89, b'P', b'N', b'G', ..] => "image/png",
        [b'G', b'I', b'F', b'8', ..] => "image/gif",
        [b'R', b'I', b'F', b'F', _, _, _, _, b'W', b'E', b'B', b'P', ..] => "image/webp",
        _ => "image/jpeg",
    }
}
