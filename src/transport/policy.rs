use std::time::Duration;

use crate::config::TransportConfig;

/// Exponential reconnect backoff.
#[derive(Debug, Clone, PartialEq)]
pub struct ReconnectPolicy {
    /// Delay before the first reconnect.
    pub reconnect_interval: Duration,
    /// Ceiling for the delay.
    pub max_reconnect_interval: Duration,
    /// Growth factor per failed attempt.
    pub reconnect_decay: f64,
    /// A connection attempt still pending after this long is abandoned.
    pub timeout_interval: Duration,
    /// Stop after this many consecutive reconnects; `None` retries forever.
    pub max_reconnect_attempts: Option<u32>,
}

impl ReconnectPolicy {
    /// `min(reconnect_interval * decay^attempt, max_reconnect_interval)`
    pub fn delay(&self, attempt: u32) -> Duration {
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let secs = self.reconnect_interval.as_secs_f64() * self.reconnect_decay.powi(exponent);
        let max = self.max_reconnect_interval;
        if !secs.is_finite() || secs >= max.as_secs_f64() {
            return max;
        }
        Duration::from_secs_f64(secs)
    }

    /// Whether another reconnect may follow `attempts` consecutive ones.
    pub fn allows(&self, attempts: u32) -> bool {
        self.max_reconnect_attempts.map_or(true, |max| attempts < max)
    }
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self::from(&TransportConfig::default())
    }
}

impl From<&TransportConfig> for ReconnectPolicy {
    fn from(config: &TransportConfig) -> Self {
        Self {
            reconnect_interval: Duration::from_millis(config.reconnect_interval_ms),
            max_reconnect_interval: Duration::from_millis(config.max_reconnect_interval_ms),
            reconnect_decay: config.reconnect_decay,
            timeout_interval: Duration::from_millis(config.timeout_interval_ms),
            max_reconnect_attempts: config.max_reconnect_attempts,
        }
    }
}
