use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Backend-assigned session key.
pub type SessionId = i64;

/// Lifecycle of one attendance session. Transitions are monotonic; there is
/// no way back out of `Ended`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "camelCase")]
pub enum SessionPhase {
    Initializing,
    Active,
    Ending,
    Ended,
}

impl SessionPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionPhase::Ended)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SessionPhase::Initializing => "initializing",
            SessionPhase::Active => "active",
            SessionPhase::Ending => "ending",
            SessionPhase::Ended => "ended",
        }
    }
}

/// Which timetable slot a session covers. Opaque to the coordinator; it is
/// carried through from the backend for the display layer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PeriodInfo {
    pub date: NaiveDate,
    pub day: String,
    pub period: u32,
    pub subject_code: String,
    pub subject_name: String,
    pub start_time: String,
    pub end_time: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SessionDescriptor {
    pub id: SessionId,
    pub period: PeriodInfo,
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
}
