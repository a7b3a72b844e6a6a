use std::sync::Arc;

use chrono::Utc;
use log::{debug, error, info, warn};
use serde::Serialize;
use tokio::sync::{watch, Notify};
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::backend::AttendanceBackend;
use crate::config::SessionConfig;
use crate::models::SessionId;
use crate::state::SessionState;

/// Whether the roster feed is currently trustworthy. Flips to `Unavailable`
/// exactly once per sustained outage and back to `Ok` on recovery; stale
/// entries stay on display either way.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum RosterHealth {
    Ok,
    Unavailable,
}

/// Owns the roster polling task for one session.
pub(crate) struct RosterPoller {
    handle: Option<JoinHandle<()>>,
    cancel: Option<CancellationToken>,
    kick: Arc<Notify>,
}

impl RosterPoller {
    pub(crate) fn new() -> Self {
        Self {
            handle: None,
            cancel: None,
            kick: Arc::new(Notify::new()),
        }
    }

    pub(crate) fn start(
        &mut self,
        session_id: SessionId,
        backend: Arc<dyn AttendanceBackend>,
        state: SessionState,
        health: watch::Sender<RosterHealth>,
        config: &SessionConfig,
    ) {
        debug_assert!(self.handle.is_none(), "roster poller already running");

        let cancel = CancellationToken::new();
        let handle = tokio::spawn(poll_loop(
            session_id,
            backend,
            state,
            health,
            config.clone(),
            Arc::clone(&self.kick),
            cancel.clone(),
        ));

        self.handle = Some(handle);
        self.cancel = Some(cancel);
    }

    /// Request an out-of-cycle fetch. If a fetch is already in flight the
    /// permit is kept and the refresh runs right after it completes.
    pub(crate) fn kick(&self) {
        self.kick.notify_one();
    }

    pub(crate) async fn stop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel.cancel();
        }
        if let Some(handle) = self.handle.take() {
            if let Err(err) = handle.await {
                error!("roster poller task failed to join: {err}");
            }
        }
    }
}

/// Fetch the authoritative roster on every tick (or kick) and replace the
/// shared snapshot wholesale. The backend is the single source of truth, so
/// there is no incremental merging here.
async fn poll_loop(
    session_id: SessionId,
    backend: Arc<dyn AttendanceBackend>,
    state: SessionState,
    health: watch::Sender<RosterHealth>,
    config: SessionConfig,
    kick: Arc<Notify>,
    cancel: CancellationToken,
) {
    let failure_threshold = config.roster_failure_threshold;
    let request_timeout = config.request_timeout;
    let mut ticker = time::interval(config.poll_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let mut attempt: u64 = 0;
    let mut consecutive_failures: u32 = 0;
    let mut outage_reported = false;

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = kick.notified() => {
                debug!("eager roster refresh for session {session_id}");
            }
            _ = cancel.cancelled() => break,
        }

        attempt += 1;

        tokio::select! {
            result = time::timeout(request_timeout, backend.fetch_roster(session_id)) => {
                let outcome = match result {
                    Ok(Ok(entries)) => Ok(entries),
                    Ok(Err(err)) => Err(err.to_string()),
                    Err(_) => Err(format!("timed out after {request_timeout:?}")),
                };

                match outcome {
                    Ok(entries) => {
                        if outage_reported {
                            info!("roster fetch recovered for session {session_id}");
                            let _ = health.send(RosterHealth::Ok);
                            outage_reported = false;
                        }
                        consecutive_failures = 0;

                        if !state.apply_snapshot(attempt, entries, Utc::now()) {
                            debug!(
                                "discarded stale roster snapshot (attempt {attempt}) for session {session_id}"
                            );
                        }
                    }
                    Err(reason) => {
                        consecutive_failures += 1;
                        if consecutive_failures == failure_threshold {
                            warn!(
                                "roster unavailable for session {session_id} after {failure_threshold} consecutive failures: {reason}"
                            );
                            let _ = health.send(RosterHealth::Unavailable);
                            outage_reported = true;
                        } else {
                            debug!(
                                "roster fetch failed for session {session_id} ({consecutive_failures} consecutive): {reason}"
                            );
                        }
                    }
                }
            }
            _ = cancel.cancelled() => break,
        }
    }

    info!("roster poller stopped for session {session_id}");
}
