//! Bridge runtime configuration.

use std::time::Duration;

/// Tunable parameters for the bridge control loop.
///
/// Wire markers and the acknowledgement burst are fixed protocol constants in
/// [`crate::wire`]; everything here is a local accommodation (pacing, idle
/// behavior, poll cadence) and safe to adjust per deployment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeConfig {
    /// Sleep between poll iterations.
    pub poll_interval: Duration,
    /// Silence window after which the synthetic idle prompt fires.
    pub idle_timeout: Duration,
    /// Whether the synthetic idle prompt is enabled at all.
    pub auto_message: bool,
    /// Pacing delay after each whitespace boundary while streaming tokens.
    ///
    /// A bandwidth/latency accommodation for the device, not a protocol
    /// requirement.
    pub word_delay: Duration,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(50),
            idle_timeout: Duration::from_secs(120),
            auto_message: true,
            word_delay: Duration::from_millis(200),
        }
    }
}

impl BridgeConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    #[must_use]
    pub fn with_idle_timeout(mut self, idle_timeout: Duration) -> Self {
        self.idle_timeout = idle_timeout;
        self
    }

    #[must_use]
    pub fn with_auto_message(mut self, auto_message: bool) -> Self {
        self.auto_message = auto_message;
        self
    }

    #[must_use]
    pub fn with_word_delay(mut self, word_delay: Duration) -> Self {
        self.word_delay = word_delay;
        self
    }
}
