use std::time::Duration;

/// Cadences and bounds for a live session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// How often a frame is captured and submitted for recognition.
    pub frame_interval: Duration,

    /// How often the authoritative roster is fetched.
    pub poll_interval: Duration,

    /// Consecutive roster failures before the health signal flips to
    /// unavailable.
    pub roster_failure_threshold: u32,

    /// Upper bound on any single backend call made by the periodic tasks.
    /// Also bounds how long teardown can trail an in-flight request.
    pub request_timeout: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            frame_interval: Duration::from_millis(1000),
            poll_interval: Duration::from_millis(3000),
            roster_failure_threshold: 3,
            request_timeout: Duration::from_secs(10),
        }
    }
}
