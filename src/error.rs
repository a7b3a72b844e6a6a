use thiserror::Error;

use crate::backend::BackendError;
use crate::capture::CaptureError;

#[derive(Debug, Error)]
pub enum SessionError {
    /// Camera acquisition failed; the session never became active and no
    /// timers were started.
    #[error("capture device unavailable")]
    DeviceUnavailable(#[source] CaptureError),
    /// The operation is only valid while the session is active.
    #[error("session is not active")]
    SessionNotActive,
    /// The session has ended; no further operations are accepted.
    #[error("session has ended")]
    SessionEnded,
    /// The backend refused a manual override. No local state was changed.
    #[error("override rejected: {0}")]
    OverrideRejected(String),
    /// A backend call outside the per-tick loops failed.
    #[error(transparent)]
    Backend(#[from] BackendError),
}
