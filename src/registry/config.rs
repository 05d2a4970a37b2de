//! Registry configuration

use std::time::Duration;

use tokio::time::{Interval, MissedTickBehavior};

/// Default time a device may stay silent before it is marked disconnected
pub const DEFAULT_LIVENESS_TIMEOUT: Duration = Duration::from_secs(30);

/// Default cadence of the liveness sweep
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(5);

/// Configuration for the device registry
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Silence longer than this demotes a connected device
    pub liveness_timeout: Duration,

    /// How often the background sweep runs
    pub sweep_interval: Duration,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            liveness_timeout: DEFAULT_LIVENESS_TIMEOUT,
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
        }
    }
}

impl RegistryConfig {
    /// Set the liveness timeout
    pub fn liveness_timeout(mut self, timeout: Duration) -> Self {
        self.liveness_timeout = timeout;
        self
    }

    /// Set the sweep interval
    ///
    /// Zero is bumped to one millisecond; `tokio::time::interval` rejects a
    /// zero period.
    pub fn sweep_interval(mut self, interval: Duration) -> Self {
        self.sweep_interval = interval.max(Duration::from_millis(1));
        self
    }

    /// Ticker for the liveness sweep
    ///
    /// The first tick completes immediately. Ticks missed during a stall are
    /// collapsed into one and the schedule restarts from there.
    pub(crate) fn sweep_ticker(&self) -> Interval {
        let mut ticker = tokio::time::interval(self.sweep_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RegistryConfig::default();

        assert_eq!(config.liveness_timeout, Duration::from_secs(30));
        assert_eq!(config.sweep_interval, Duration::from_secs(5));
    }

    #[test]
    fn test_builder_chaining() {
        let config = RegistryConfig::default()
            .liveness_timeout(Duration::from_secs(10))
            .sweep_interval(Duration::from_secs(1));

        assert_eq!(config.liveness_timeout, Duration::from_secs(10));
        assert_eq!(config.sweep_interval, Duration::from_secs(1));
    }

    #[test]
    fn test_zero_sweep_interval_clamped() {
        let config = RegistryConfig::default().sweep_interval(Duration::ZERO);

        assert_eq!(config.sweep_interval, Duration::from_millis(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweep_ticker_does_not_burst() {
        let config = RegistryConfig::default().sweep_interval(Duration::from_secs(5));
        let mut ticker = config.sweep_ticker();
        assert_eq!(ticker.missed_tick_behavior(), MissedTickBehavior::Delay);

        ticker.tick().await;
        // Stall across two missed ticks
        tokio::time::advance(Duration::from_secs(12)).await;

        let start = tokio::time::Instant::now();
        ticker.tick().await;
        assert_eq!(start.elapsed(), Duration::ZERO);

        ticker.tick().await;
        assert!(start.elapsed() >= Duration::from_secs(5));
    }
}
