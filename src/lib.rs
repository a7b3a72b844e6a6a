//! Live attendance session coordination.
//!
//! Once a session starts, one capture device is sampled on a fixed cadence
//! and frames are submitted for recognition, the authoritative roster is
//! polled independently, and manual overrides take effect faster than the
//! polling cadence. [`SessionController`] owns all of it and guarantees
//! bounded, deterministic teardown. The backend transport and the display
//! layer plug in through [`AttendanceBackend`] and [`CaptureSource`].

mod backend;
mod capture;
mod config;
mod error;
mod models;
mod poller;
mod sampler;
mod session;
mod state;

pub use backend::{AttendanceBackend, BackendError};
pub use capture::{CaptureError, CaptureSource, Frame};
pub use config::SessionConfig;
pub use error::SessionError;
pub use models::{
    AttendanceStatus, MarkedBy, PeriodInfo, RosterCounts, RosterEntry, RosterSnapshot,
    SessionDescriptor, SessionId, SessionPhase,
};
pub use poller::RosterHealth;
pub use session::SessionController;
pub use state::SessionState;
