//! Player bridge configuration

use std::time::Duration;

/// Default number of handshake attempts
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Handshake and surface timing
#[derive(Debug, Clone, PartialEq)]
pub struct BridgeConfig {
    /// Total handshake attempts before the channel is declared exhausted
    pub max_attempts: u32,
    /// How long each attempt waits for the readiness signal
    pub retry_delay: Duration,
    /// Surface-side polling interval while the media element is absent
    pub media_poll_interval: Duration,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            retry_delay: Duration::from_secs(1),
            media_poll_interval: Duration::from_millis(100),
        }
    }
}

impl BridgeConfig {
    /// Sets the attempt limit (at least one attempt is always made)
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    /// Sets the per-attempt readiness wait
    pub fn with_retry_delay(mut self, retry_delay: Duration) -> Self {
        self.retry_delay = retry_delay;
        self
    }

    /// Sets the media element polling interval
    pub fn with_media_poll_interval(mut self, interval: Duration) -> Self {
        self.media_poll_interval = interval.max(Duration::from_millis(1));
        self
    }
}
