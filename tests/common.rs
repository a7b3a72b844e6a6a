#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use rollcall::{
    AttendanceBackend, AttendanceStatus, BackendError, CaptureError, CaptureSource, Frame,
    MarkedBy, PeriodInfo, RosterEntry, SessionDescriptor, SessionId,
};
use tokio::sync::Mutex;

pub fn init_logs() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn test_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, 9).unwrap()
}

pub fn entry(reg_no: &str, name: &str) -> RosterEntry {
    RosterEntry {
        reg_no: reg_no.to_string(),
        name: name.to_string(),
        status: AttendanceStatus::Absent,
        marked_by: MarkedBy::Automatic,
        marked_at: None,
    }
}

pub fn descriptor(id: SessionId) -> SessionDescriptor {
    SessionDescriptor {
        id,
        period: PeriodInfo {
            date: test_date(),
            day: "MON".to_string(),
            period: 2,
            subject_code: "CS301".to_string(),
            subject_name: "Operating Systems".to_string(),
            start_time: "09:50".to_string(),
            end_time: "10:40".to_string(),
        },
        started_at: Some(Utc::now()),
        ended_at: None,
    }
}

/// In-memory stand-in for the attendance backend. Applies overrides to its
/// own roster copy and counts every call so tests can assert on traffic.
pub struct TestBackend {
    pub roster: Mutex<Vec<RosterEntry>>,
    pub frame_delay: Duration,
    pub fail_rosters: AtomicBool,
    pub roster_fetches: AtomicUsize,
    pub frames_submitted: AtomicUsize,
    pub frames_in_flight: AtomicUsize,
    pub max_frames_in_flight: AtomicUsize,
    pub overrides_accepted: AtomicUsize,
    pub session_ended: AtomicBool,
}

impl TestBackend {
    pub fn new(roster: Vec<RosterEntry>) -> Arc<Self> {
        Self::with_frame_delay(roster, Duration::ZERO)
    }

    pub fn with_frame_delay(roster: Vec<RosterEntry>, frame_delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            roster: Mutex::new(roster),
            frame_delay,
            fail_rosters: AtomicBool::new(false),
            roster_fetches: AtomicUsize::new(0),
            frames_submitted: AtomicUsize::new(0),
            frames_in_flight: AtomicUsize::new(0),
            max_frames_in_flight: AtomicUsize::new(0),
            overrides_accepted: AtomicUsize::new(0),
            session_ended: AtomicBool::new(false),
        })
    }
}

#[async_trait]
impl AttendanceBackend for TestBackend {
    async fn start_session(
        &self,
        _date: NaiveDate,
        _period: u32,
    ) -> Result<SessionDescriptor, BackendError> {
        Ok(descriptor(41))
    }

    async fn get_session(&self, session_id: SessionId) -> Result<SessionDescriptor, BackendError> {
        Ok(descriptor(session_id))
    }

    async fn end_session(&self, _session_id: SessionId) -> Result<(), BackendError> {
        self.session_ended.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn fetch_roster(&self, _session_id: SessionId) -> Result<Vec<RosterEntry>, BackendError> {
        self.roster_fetches.fetch_add(1, Ordering::SeqCst);
        if self.fail_rosters.load(Ordering::SeqCst) {
            return Err(BackendError::Transport("backend unreachable".to_string()));
        }
        Ok(self.roster.lock().await.clone())
    }

    async fn submit_override(
        &self,
        _session_id: SessionId,
        reg_no: &str,
        status: AttendanceStatus,
    ) -> Result<(), BackendError> {
        let mut roster = self.roster.lock().await;
        match roster.iter_mut().find(|entry| entry.reg_no == reg_no) {
            Some(entry) => {
                entry.status = status;
                entry.marked_by = MarkedBy::Manual;
                entry.marked_at = Some(Utc::now());
                self.overrides_accepted.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
            None => Err(BackendError::Rejected(format!(
                "unknown registration id {reg_no}"
            ))),
        }
    }

    async fn submit_frame(&self, _session_id: SessionId, _frame: &Frame) -> Result<(), BackendError> {
        let in_flight = self.frames_in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_frames_in_flight.fetch_max(in_flight, Ordering::SeqCst);
        if !self.frame_delay.is_zero() {
            tokio::time::sleep(self.frame_delay).await;
        }
        self.frames_in_flight.fetch_sub(1, Ordering::SeqCst);
        self.frames_submitted.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Observer handles for a [`TestCapture`] after it has been boxed away.
#[derive(Clone)]
pub struct CaptureProbe {
    pub acquired: Arc<AtomicBool>,
    pub released: Arc<AtomicBool>,
    pub reads: Arc<AtomicUsize>,
}

pub struct TestCapture {
    probe: CaptureProbe,
    fail_acquire: bool,
    failing_reads: usize,
}

impl TestCapture {
    /// A device that acquires and reads without trouble.
    pub fn working() -> (Self, CaptureProbe) {
        Self::build(false, 0)
    }

    /// A device that refuses to be acquired.
    pub fn unavailable() -> (Self, CaptureProbe) {
        Self::build(true, 0)
    }

    /// A device whose first `failing_reads` frame reads fail transiently.
    pub fn glitching(failing_reads: usize) -> (Self, CaptureProbe) {
        Self::build(false, failing_reads)
    }

    fn build(fail_acquire: bool, failing_reads: usize) -> (Self, CaptureProbe) {
        let probe = CaptureProbe {
            acquired: Arc::new(AtomicBool::new(false)),
            released: Arc::new(AtomicBool::new(false)),
            reads: Arc::new(AtomicUsize::new(0)),
        };
        (
            Self {
                probe: probe.clone(),
                fail_acquire,
                failing_reads,
            },
            probe,
        )
    }
}

#[async_trait]
impl CaptureSource for TestCapture {
    async fn acquire(&mut self) -> Result<(), CaptureError> {
        if self.fail_acquire {
            return Err(CaptureError::DeviceUnavailable(
                "permission denied".to_string(),
            ));
        }
        self.probe.acquired.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn read_frame(&mut self) -> Result<Frame, CaptureError> {
        self.probe.reads.fetch_add(1, Ordering::SeqCst);
        if self.failing_reads > 0 {
            self.failing_reads -= 1;
            return Err(CaptureError::Frame("sensor glitch".to_string()));
        }
        Ok(Frame {
            image: vec![0xff, 0xd8, 0xff, 0xe0],
            captured_at: Utc::now(),
        })
    }

    async fn release(&mut self) {
        self.probe.released.store(true, Ordering::SeqCst);
    }
}
