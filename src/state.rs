use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::watch;

use crate::models::{AttendanceStatus, MarkedBy, RosterEntry, RosterSnapshot};

/// The single in-memory source of truth for roster entries and counts.
///
/// Writers either replace the whole snapshot (the roster poller) or merge a
/// single entry (an accepted override); both happen inside one
/// `send_if_modified`, so readers always observe a complete snapshot, never
/// a torn mix of two.
#[derive(Clone)]
pub struct SessionState {
    tx: Arc<watch::Sender<RosterSnapshot>>,
}

impl SessionState {
    pub(crate) fn new() -> Self {
        let (tx, _rx) = watch::channel(RosterSnapshot::default());
        Self { tx: Arc::new(tx) }
    }

    /// The current complete snapshot.
    pub fn snapshot(&self) -> RosterSnapshot {
        self.tx.borrow().clone()
    }

    /// Watch for snapshot changes.
    pub fn subscribe(&self) -> watch::Receiver<RosterSnapshot> {
        self.tx.subscribe()
    }

    /// Replace the roster wholesale. Snapshots are applied in generation
    /// order: a response from an earlier poll that lands after a later one
    /// has already been applied is discarded. Returns whether the snapshot
    /// was applied.
    pub(crate) fn apply_snapshot(
        &self,
        generation: u64,
        entries: Vec<RosterEntry>,
        captured_at: DateTime<Utc>,
    ) -> bool {
        self.tx.send_if_modified(|current| {
            if generation <= current.generation {
                return false;
            }
            current.entries = entries;
            current.captured_at = Some(captured_at);
            current.generation = generation;
            true
        })
    }

    /// Merge one accepted override into the current snapshot. Returns false
    /// when the registration id is not in the roster yet (first poll still
    /// pending, or the backend knows an entry we have not seen).
    pub(crate) fn apply_override(
        &self,
        reg_no: &str,
        status: AttendanceStatus,
        marked_at: DateTime<Utc>,
    ) -> bool {
        self.tx.send_if_modified(|current| {
            match current.entries.iter_mut().find(|entry| entry.reg_no == reg_no) {
                Some(entry) => {
                    entry.status = status;
                    entry.marked_by = MarkedBy::Manual;
                    entry.marked_at = Some(marked_at);
                    true
                }
                None => false,
            }
        })
    }
}
