use std::sync::Arc;
use std::time::Duration;

use log::{debug, error, info, warn};
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::backend::AttendanceBackend;
use crate::capture::CaptureSource;
use crate::config::SessionConfig;
use crate::models::SessionId;

/// Owns the frame sampling task for one session.
///
/// The loop takes ownership of the capture source and releases it on every
/// exit path, so stopping the sampler is what gives the device back.
pub(crate) struct FrameSampler {
    handle: Option<JoinHandle<()>>,
    cancel: Option<CancellationToken>,
}

impl FrameSampler {
    pub(crate) fn new() -> Self {
        Self {
            handle: None,
            cancel: None,
        }
    }

    pub(crate) fn start(
        &mut self,
        session_id: SessionId,
        source: Box<dyn CaptureSource>,
        backend: Arc<dyn AttendanceBackend>,
        config: &SessionConfig,
    ) {
        debug_assert!(self.handle.is_none(), "frame sampler already running");

        let cancel = CancellationToken::new();
        let handle = tokio::spawn(sample_loop(
            session_id,
            source,
            backend,
            config.clone(),
            cancel.clone(),
        ));

        self.handle = Some(handle);
        self.cancel = Some(cancel);
    }

    /// Cancel the loop and wait for it to wind down. Any in-flight
    /// submission is dropped, not awaited, so this returns promptly.
    pub(crate) async fn stop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel.cancel();
        }
        if let Some(handle) = self.handle.take() {
            if let Err(err) = handle.await {
                error!("frame sampler task failed to join: {err}");
            }
        }
    }
}

/// One tick per `frame_interval`: read a frame, submit it, forget it.
///
/// Missed ticks are skipped, never queued, so there is at most one
/// submission in flight at any time regardless of recognition latency.
async fn sample_loop(
    session_id: SessionId,
    mut source: Box<dyn CaptureSource>,
    backend: Arc<dyn AttendanceBackend>,
    config: SessionConfig,
    cancel: CancellationToken,
) {
    let mut ticker = time::interval(config.frame_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                tokio::select! {
                    _ = submit_one(session_id, source.as_mut(), backend.as_ref(), config.request_timeout) => {}
                    _ = cancel.cancelled() => break,
                }
            }
            _ = cancel.cancelled() => break,
        }
    }

    source.release().await;
    info!("frame sampler stopped for session {session_id}, capture released");
}

/// A single failed frame is an opportunistic signal lost, not an error the
/// session has to react to: every failure here is logged and swallowed.
async fn submit_one(
    session_id: SessionId,
    source: &mut dyn CaptureSource,
    backend: &dyn AttendanceBackend,
    request_timeout: Duration,
) {
    let frame = match source.read_frame().await {
        Ok(frame) => frame,
        Err(err) => {
            debug!("skipping sampling tick for session {session_id}: {err}");
            return;
        }
    };

    match time::timeout(request_timeout, backend.submit_frame(session_id, &frame)).await {
        Ok(Ok(())) => {
            debug!(
                "submitted frame for session {session_id} ({} bytes)",
                frame.image.len()
            );
        }
        Ok(Err(err)) => warn!("frame submission failed for session {session_id}: {err}"),
        Err(_) => warn!(
            "frame submission timed out (> {request_timeout:?}) for session {session_id}"
        ),
    }
}
