//! Still image frame source, for demos and machines without a webcam

use std::path::PathBuf;

use async_trait::async_trait;

use super::{Frame, FrameSource};
use crate::{Error, Result};

/// Re-reads an image file on every capture
#[derive(Debug, Clone)]
pub struct StillImage {
    path: PathBuf,
}

impl StillImage {
    #[must_use]
    pub const fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

#[async_trait]
impl FrameSource for StillImage {
    async fn capture(&self) -> Result<Frame> {
        let data = tokio::fs::read(&self.path).await.map_err(|e| {
            Error::Camera(format!("failed to read {}: {e}", self.path.display()))
        })?;

        if data.is_empty() {
            return Err(Error::Camera(format!("{} is empty", self.path.display())));
        }

        Ok(Frame::new(data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_reads_file_each_time() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scene.png");
        std::fs::write(&path, b"\x89PNG first").unwrap();

        let source = StillImage::new(path.clone());
        assert_eq!(source.capture().await.unwrap().data(), b"\x89PNG first");

        std::fs::write(&path, b"\x89PNG second").unwrap();
        let frame = source.capture().await.unwrap();
        assert_eq!(frame.data(), b"\x89PNG second");
        assert_eq!(frame.mime_type(), "image/png");
    }

    #[tokio::test]
    async fn test_missing_file_is_camera_error() {
        let source = StillImage::new(PathBuf::from("/nonexistent/scene.jpg"));
        assert!(matches!(source.capture().await, Err(Error::Camera(_))));
    }
}
