use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum AttendanceStatus {
    Present,
    Absent,
    OnDuty,
}

impl AttendanceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttendanceStatus::Present => "present",
            AttendanceStatus::Absent => "absent",
            AttendanceStatus::OnDuty => "onDuty",
        }
    }
}

/// Who last wrote an entry's status: the recognition pipeline or the proctor.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum MarkedBy {
    Automatic,
    Manual,
}

/// One student's attendance record within a session. The registration id is
/// the natural key and stays stable for the session's lifetime; only
/// status/marked_by/marked_at ever change.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RosterEntry {
    pub reg_no: String,
    pub name: String,
    pub status: AttendanceStatus,
    pub marked_by: MarkedBy,
    pub marked_at: Option<DateTime<Utc>>,
}

/// A complete, internally consistent copy of the roster at a point in time.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RosterSnapshot {
    pub entries: Vec<RosterEntry>,
    pub captured_at: Option<DateTime<Utc>>,
    /// Poll attempt that produced this snapshot. Zero until the first poll lands.
    #[serde(skip)]
    pub generation: u64,
}

impl RosterSnapshot {
    pub fn entry(&self, reg_no: &str) -> Option<&RosterEntry> {
        self.entries.iter().find(|entry| entry.reg_no == reg_no)
    }

    /// Derived on read, never stored.
    pub fn counts(&self) -> RosterCounts {
        let mut counts = RosterCounts::default();
        for entry in &self.entries {
            match entry.status {
                AttendanceStatus::Present => counts.present += 1,
                AttendanceStatus::Absent => counts.absent += 1,
                AttendanceStatus::OnDuty => counts.on_duty += 1,
            }
        }
        counts
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RosterCounts {
    pub present: usize,
    pub absent: usize,
    pub on_duty: usize,
}
