//! Hub configuration

use std::time::Duration;

use crate::error::{Error, Result};
use crate::history::DEFAULT_HISTORY_CAPACITY;

/// Default silence allowed before a subscriber is declared dead
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(60);

/// Default probe cadence (90% of the read timeout, so a probe always lands first)
pub const DEFAULT_PING_INTERVAL: Duration = Duration::from_secs(54);

/// Default bound on any single write to a subscriber
pub const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_secs(10);

/// Configuration for the subscriber hub
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HubConfig {
    /// Number of recent events replayed to new subscribers
    pub history_capacity: usize,

    /// Interval between liveness probes
    pub ping_interval: Duration,

    /// Maximum silence before a subscriber is removed
    pub read_timeout: Duration,

    /// Maximum time any single write may take (lock wait included)
    pub write_timeout: Duration,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            ping_interval: DEFAULT_PING_INTERVAL,
            read_timeout: DEFAULT_READ_TIMEOUT,
            write_timeout: DEFAULT_WRITE_TIMEOUT,
        }
    }
}

impl HubConfig {
    /// Set the history capacity
    pub fn history_capacity(mut self, capacity: usize) -> Self {
        self.history_capacity = capacity;
        self
    }

    /// Set the probe interval
    pub fn ping_interval(mut self, interval: Duration) -> Self {
        self.ping_interval = interval;
        self
    }

    /// Set the read timeout
    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    /// Set the write timeout
    pub fn write_timeout(mut self, timeout: Duration) -> Self {
        self.write_timeout = timeout;
        self
    }

    /// Bound on waiting for a subscriber's write lock
    ///
    /// A full history replay holds the lock for up to one `write_timeout`
    /// per buffered event, plus one more for a ping or pong in flight.
    pub fn lock_timeout(&self) -> Duration {
        let writes = u32::try_from(self.history_capacity)
            .unwrap_or(u32::MAX)
            .saturating_add(1);
        self.write_timeout.saturating_mul(writes)
    }

    /// Check the timing constants against each other
    pub fn validate(&self) -> Result<()> {
        if self.ping_interval.is_zero() || self.read_timeout.is_zero() || self.write_timeout.is_zero()
        {
            return Err(Error::Config("keepalive durations must be non-zero".into()));
        }
        if self.ping_interval >= self.read_timeout {
            return Err(Error::Config(format!(
                "ping interval ({:?}) must be shorter than read timeout ({:?})",
                self.ping_interval, self.read_timeout
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = HubConfig::default();

        assert_eq!(config.history_capacity, 20);
        assert_eq!(config.ping_interval, Duration::from_secs(54));
        assert_eq!(config.read_timeout, Duration::from_secs(60));
        assert_eq!(config.write_timeout, Duration::from_secs(10));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_chaining() {
        let config = HubConfig::default()
            .history_capacity(2)
            .ping_interval(Duration::from_secs(9))
            .read_timeout(Duration::from_secs(10))
            .write_timeout(Duration::from_secs(1));

        assert_eq!(config.history_capacity, 2);
        assert_eq!(config.ping_interval, Duration::from_secs(9));
        assert_eq!(config.read_timeout, Duration::from_secs(10));
        assert_eq!(config.write_timeout, Duration::from_secs(1));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_ping_not_shorter_than_timeout() {
        let config = HubConfig::default()
            .ping_interval(Duration::from_secs(60))
            .read_timeout(Duration::from_secs(60));

        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_validate_zero_duration() {
        let config = HubConfig::default().write_timeout(Duration::ZERO);

        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_lock_timeout_covers_replay() {
        let config = HubConfig::default();
        assert_eq!(config.lock_timeout(), Duration::from_secs(210));

        let config = HubConfig::default()
            .history_capacity(0)
            .write_timeout(Duration::from_secs(3));
        assert_eq!(config.lock_timeout(), Duration::from_secs(3));

        let config = HubConfig::default().history_capacity(usize::MAX);
        assert!(config.lock_timeout() >= Duration::from_secs(10));
    }
}
