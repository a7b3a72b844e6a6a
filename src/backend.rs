use async_trait::async_trait;
use chrono::NaiveDate;
use thiserror::Error;

use crate::capture::Frame;
use crate::models::{AttendanceStatus, RosterEntry, SessionDescriptor, SessionId};

#[derive(Debug, Clone, Error)]
pub enum BackendError {
    /// The backend understood the request and refused it (unknown
    /// registration id, session no longer ongoing, ...).
    #[error("rejected: {0}")]
    Rejected(String),
    /// The request never completed: network failure, timeout, server error.
    #[error("transport failure: {0}")]
    Transport(String),
}

/// The operations the coordinator consumes from the attendance backend,
/// which is the system of record for all attendance facts.
///
/// Transport and wire format are the implementor's concern.
#[async_trait]
pub trait AttendanceBackend: Send + Sync {
    /// Open (or reopen) the session for a timetable slot.
    async fn start_session(
        &self,
        date: NaiveDate,
        period: u32,
    ) -> Result<SessionDescriptor, BackendError>;

    /// Look up an existing session, used when resuming an ongoing one.
    async fn get_session(&self, session_id: SessionId) -> Result<SessionDescriptor, BackendError>;

    /// Close the session. The backend finalizes unmarked entries as absent.
    async fn end_session(&self, session_id: SessionId) -> Result<(), BackendError>;

    /// The complete, authoritative roster for the session.
    async fn fetch_roster(&self, session_id: SessionId) -> Result<Vec<RosterEntry>, BackendError>;

    /// Manually set one entry's status.
    async fn submit_override(
        &self,
        session_id: SessionId,
        reg_no: &str,
        status: AttendanceStatus,
    ) -> Result<(), BackendError>;

    /// Submit one frame for recognition. Best-effort: the coordinator only
    /// looks at success/failure, never at the response body.
    async fn submit_frame(&self, session_id: SessionId, frame: &Frame) -> Result<(), BackendError>;
}
