//! Connection timing and sizing configuration.

use std::time::Duration;

use crate::line::MAX_IRC_LINE_LEN;

/// Default version string, used for CTCP VERSION replies and the default
/// quit message.
pub const DEFAULT_VERSION: &str = concat!("slirc-client ", env!("CARGO_PKG_VERSION"));

/// Timeouts, keepalive and reconnect settings for a [`Client`](crate::Client).
///
/// ```
/// use std::time::Duration;
/// use slirc_client::ClientConfig;
///
/// let config = ClientConfig::default()
///     .with_timeout(Duration::from_secs(30))
///     .with_ping_frequency(Duration::from_secs(120));
/// assert_eq!(config.read_deadline(), Duration::from_secs(150));
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ClientConfig {
    /// Dial timeout and per-write deadline.
    pub timeout: Duration,
    /// Interval of the unconditional PING (and preferred nick reclaim).
    pub ping_frequency: Duration,
    /// Silence after which the keepalive check sends a PING.
    pub keepalive: Duration,
    /// How often the keepalive threshold is checked.
    pub keepalive_check: Duration,
    /// Base reconnect delay, multiplied by the attempt number.
    pub reconnect_delay: Duration,
    /// Attempt number at which the reconnect delay stops growing.
    pub max_reconnect_attempt: u32,
    /// Capacity of the outbound queue.
    pub queue_capacity: usize,
    /// Longest inbound line accepted, terminator included.
    pub max_line_len: usize,
    /// Enable TCP keepalive on the socket.
    pub tcp_keepalive: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(60),
            ping_frequency: Duration::from_secs(15 * 60),
            keepalive: Duration::from_secs(4 * 60),
            keepalive_check: Duration::from_secs(60),
            reconnect_delay: Duration::from_secs(15),
            max_reconnect_attempt: 20,
            queue_capacity: 64,
            max_line_len: MAX_IRC_LINE_LEN,
            tcp_keepalive: true,
        }
    }
}

impl ClientConfig {
    /// Deadline for a single line read: `timeout + ping_frequency`.
    ///
    /// A healthy server answers our periodic PING well within this window.
    pub fn read_deadline(&self) -> Duration {
        self.timeout.saturating_add(self.ping_frequency)
    }

    /// Delay before reconnect attempt number `attempt` (1-based).
    pub fn reconnect_delay_for(&self, attempt: u32) -> Duration {
        reconnect_delay(self.reconnect_delay, attempt, self.max_reconnect_attempt)
    }

    /// Set the dial timeout and write deadline.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the unconditional PING interval.
    #[must_use]
    pub fn with_ping_frequency(mut self, ping_frequency: Duration) -> Self {
        self.ping_frequency = ping_frequency;
        self
    }

    /// Set the keepalive threshold and how often it is checked.
    #[must_use]
    pub fn with_keepalive(mut self, keepalive: Duration, check_every: Duration) -> Self {
        self.keepalive = keepalive;
        self.keepalive_check = check_every;
        self
    }

    /// Set the base reconnect delay.
    #[must_use]
    pub fn with_reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = delay;
        self
    }

    /// Set the outbound queue capacity (at least 1).
    #[must_use]
    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity.max(1);
        self
    }
}

/// Linear backoff: `base * min(attempt, cap)`, with attempt 0 treated as 1.
pub fn reconnect_delay(base: Duration, attempt: u32, cap: u32) -> Duration {
    base.saturating_mul(attempt.clamp(1, cap.max(1)))
}
