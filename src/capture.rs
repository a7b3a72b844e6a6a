use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

/// One encoded image read from the capture device. Ephemeral: submitted to
/// the recognition endpoint once and then discarded.
#[derive(Debug, Clone)]
pub struct Frame {
    pub image: Vec<u8>,
    pub captured_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Error)]
pub enum CaptureError {
    /// No device granted access (permission denied, device busy). Fatal to
    /// session start.
    #[error("capture device unavailable: {0}")]
    DeviceUnavailable(String),
    /// A single frame read failed. The affected sampling tick is skipped.
    #[error("frame read failed: {0}")]
    Frame(String),
}

/// Exclusive handle over one camera/video device for a session's lifetime.
///
/// The frame sampler is the only reader; the concrete device implementation
/// belongs to the embedder.
#[async_trait]
pub trait CaptureSource: Send {
    /// Request exclusive access to the device. Must succeed before any frame
    /// is read.
    async fn acquire(&mut self) -> Result<(), CaptureError>;

    /// The most recent available frame, encoded.
    async fn read_frame(&mut self) -> Result<Frame, CaptureError>;

    /// Release the device. Idempotent: safe to call repeatedly, including
    /// after a failed `acquire`.
    async fn release(&mut self);
}
