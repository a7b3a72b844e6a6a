use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use log::{error, info, warn};
use tokio::sync::{watch, Mutex};

use crate::backend::{AttendanceBackend, BackendError};
use crate::capture::CaptureSource;
use crate::config::SessionConfig;
use crate::error::SessionError;
use crate::models::{
    AttendanceStatus, RosterSnapshot, SessionDescriptor, SessionId, SessionPhase,
};
use crate::poller::{RosterHealth, RosterPoller};
use crate::sampler::FrameSampler;
use crate::state::SessionState;

enum Startup {
    Start { date: NaiveDate, period: u32 },
    Resume { session_id: SessionId },
}

/// Coordinates one attendance session: acquires the capture device, runs the
/// frame sampler and roster poller, accepts manual overrides, and tears
/// everything down deterministically.
///
/// One controller covers one session. Phases only move forward
/// (`Initializing → Active → Ending → Ended`); once `Ended`, every
/// operation fails with [`SessionError::SessionEnded`].
pub struct SessionController {
    backend: Arc<dyn AttendanceBackend>,
    config: SessionConfig,
    state: SessionState,
    phase: watch::Sender<SessionPhase>,
    health_rx: watch::Receiver<RosterHealth>,
    inner: Mutex<Inner>,
}

struct Inner {
    session: Option<SessionDescriptor>,
    sampler: FrameSampler,
    poller: RosterPoller,
    /// Handed to the poller task on startup.
    health_tx: Option<watch::Sender<RosterHealth>>,
}

impl SessionController {
    pub fn new(backend: Arc<dyn AttendanceBackend>, config: SessionConfig) -> Self {
        let (phase, _) = watch::channel(SessionPhase::Initializing);
        let (health_tx, health_rx) = watch::channel(RosterHealth::Ok);

        Self {
            backend,
            config,
            state: SessionState::new(),
            phase,
            health_rx,
            inner: Mutex::new(Inner {
                session: None,
                sampler: FrameSampler::new(),
                poller: RosterPoller::new(),
                health_tx: Some(health_tx),
            }),
        }
    }

    /// Start a fresh session for the given timetable slot.
    pub async fn start(
        &self,
        source: Box<dyn CaptureSource>,
        date: NaiveDate,
        period: u32,
    ) -> Result<SessionDescriptor, SessionError> {
        self.activate(source, Startup::Start { date, period }).await
    }

    /// Reattach to a session the backend already considers ongoing.
    pub async fn resume(
        &self,
        source: Box<dyn CaptureSource>,
        session_id: SessionId,
    ) -> Result<SessionDescriptor, SessionError> {
        self.activate(source, Startup::Resume { session_id }).await
    }

    async fn activate(
        &self,
        mut source: Box<dyn CaptureSource>,
        how: Startup,
    ) -> Result<SessionDescriptor, SessionError> {
        let mut inner = self.inner.lock().await;
        match *self.phase.borrow() {
            SessionPhase::Initializing => {}
            SessionPhase::Ended => return Err(SessionError::SessionEnded),
            _ => return Err(SessionError::SessionNotActive),
        }

        // The device must be held before any timer starts. Failure is fatal:
        // the controller goes straight to Ended and no task is ever spawned.
        if let Err(err) = source.acquire().await {
            source.release().await;
            self.advance_phase(SessionPhase::Ended);
            return Err(SessionError::DeviceUnavailable(err));
        }

        let descriptor = match how {
            Startup::Start { date, period } => self.backend.start_session(date, period).await,
            Startup::Resume { session_id } => self.backend.get_session(session_id).await,
        };
        let descriptor = match descriptor {
            Ok(descriptor) => descriptor,
            Err(err) => {
                source.release().await;
                self.advance_phase(SessionPhase::Ended);
                return Err(err.into());
            }
        };

        let health_tx = match inner.health_tx.take() {
            Some(health_tx) => health_tx,
            None => return Err(SessionError::SessionNotActive),
        };

        inner
            .sampler
            .start(descriptor.id, source, Arc::clone(&self.backend), &self.config);
        inner.poller.start(
            descriptor.id,
            Arc::clone(&self.backend),
            self.state.clone(),
            health_tx,
            &self.config,
        );
        inner.session = Some(descriptor.clone());
        self.advance_phase(SessionPhase::Active);

        info!(
            "attendance session {} active for {} period {} ({})",
            descriptor.id, descriptor.period.date, descriptor.period.period,
            descriptor.period.subject_code
        );
        Ok(descriptor)
    }

    /// Manually correct one roster entry. Accepted only while the session is
    /// active; the typed status argument is the set of allowed values.
    ///
    /// On success the matching entry is updated optimistically (status,
    /// marked-by manual, marked-at now) so the change is visible before the
    /// next poll, and an eager roster refresh reconciles with the backend.
    /// A poll that started before the override may still land after it and
    /// briefly win; the kicked refresh corrects that on the next cycle.
    pub async fn override_status(
        &self,
        reg_no: &str,
        status: AttendanceStatus,
    ) -> Result<(), SessionError> {
        let inner = self.inner.lock().await;
        match *self.phase.borrow() {
            SessionPhase::Active => {}
            SessionPhase::Ended => return Err(SessionError::SessionEnded),
            _ => return Err(SessionError::SessionNotActive),
        }
        let session_id = inner
            .session
            .as_ref()
            .map(|session| session.id)
            .ok_or(SessionError::SessionNotActive)?;

        match self
            .backend
            .submit_override(session_id, reg_no, status)
            .await
        {
            Ok(()) => {
                if !self.state.apply_override(reg_no, status, Utc::now()) {
                    warn!(
                        "override for {reg_no} accepted but entry not in local roster yet (session {session_id})"
                    );
                }
                inner.poller.kick();
                info!(
                    "override applied for {reg_no} -> {} (session {session_id})",
                    status.as_str()
                );
                Ok(())
            }
            Err(BackendError::Rejected(reason)) => Err(SessionError::OverrideRejected(reason)),
            Err(err) => Err(err.into()),
        }
    }

    /// End the session: cancel both periodic tasks, give the camera back,
    /// and tell the backend to finalize (it marks unmarked entries absent).
    ///
    /// In-flight tick work is dropped rather than awaited, so teardown
    /// latency is bounded by the request timeout, not by the poll cadence.
    pub async fn end(&self) -> Result<(), SessionError> {
        let mut inner = self.inner.lock().await;
        match *self.phase.borrow() {
            SessionPhase::Active => {}
            SessionPhase::Initializing => return Err(SessionError::SessionNotActive),
            SessionPhase::Ending | SessionPhase::Ended => return Err(SessionError::SessionEnded),
        }
        self.advance_phase(SessionPhase::Ending);

        inner.sampler.stop().await;
        inner.poller.stop().await;

        let session_id = inner
            .session
            .as_ref()
            .map(|session| session.id)
            .ok_or(SessionError::SessionNotActive)?;
        let result = self.backend.end_session(session_id).await;
        self.advance_phase(SessionPhase::Ended);

        match result {
            Ok(()) => {
                info!("attendance session {session_id} ended");
                Ok(())
            }
            Err(err) => {
                error!("backend end-session call failed for session {session_id}: {err}");
                Err(err.into())
            }
        }
    }

    pub fn phase(&self) -> SessionPhase {
        *self.phase.borrow()
    }

    pub fn phase_watch(&self) -> watch::Receiver<SessionPhase> {
        self.phase.subscribe()
    }

    /// The current complete roster snapshot; counts derive from it on read.
    pub fn roster(&self) -> RosterSnapshot {
        self.state.snapshot()
    }

    pub fn roster_watch(&self) -> watch::Receiver<RosterSnapshot> {
        self.state.subscribe()
    }

    /// Cloneable handle to the shared roster state, for display layers that
    /// outlive borrows of the controller.
    pub fn state(&self) -> SessionState {
        self.state.clone()
    }

    /// Health of the roster feed. Stays `Ok` through isolated failures and
    /// flips once per sustained outage.
    pub fn roster_health(&self) -> watch::Receiver<RosterHealth> {
        self.health_rx.clone()
    }

    pub async fn descriptor(&self) -> Option<SessionDescriptor> {
        self.inner.lock().await.session.clone()
    }

    /// Phases only move forward; a stale transition is ignored.
    fn advance_phase(&self, next: SessionPhase) {
        self.phase.send_if_modified(|phase| {
            if next > *phase {
                *phase = next;
                true
            } else {
                false
            }
        });
    }
}
