use crate::signal::ResetMode;
use std::time::Duration;

/// Configuration for a [`SlotRing`](crate::SlotRing).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RingConfig {
    /// Budget for every individual bounded wait (ring lock, slot lock, signal).
    ///
    /// Default: 20ms
    pub wait_timeout: Duration,
    /// Consecutive timeouts of one kind before a stall warning is logged.
    ///
    /// Default: 10
    pub stall_warn_after: u32,
    /// Reset mode of the "not-full" / "not-empty" signals.
    ///
    /// Default: [`ResetMode::Manual`]
    pub signal_mode: ResetMode,
    /// Enable metrics collection (slight overhead)
    pub enable_metrics: bool,
}

impl RingConfig {
    /// Creates a new configuration with custom settings.
    pub const fn new(
        wait_timeout: Duration,
        stall_warn_after: u32,
        signal_mode: ResetMode,
        enable_metrics: bool,
    ) -> Self {
        Self {
            wait_timeout,
            stall_warn_after,
            signal_mode,
            enable_metrics,
        }
    }

    /// Sets the per-wait timeout.
    pub const fn with_wait_timeout(mut self, timeout: Duration) -> Self {
        self.wait_timeout = timeout;
        self
    }

    /// Sets the stall warning threshold.
    pub const fn with_stall_warn_after(mut self, timeouts: u32) -> Self {
        self.stall_warn_after = timeouts;
        self
    }

    /// Sets the reset mode used for both occupancy signals.
    pub const fn with_signal_mode(mut self, mode: ResetMode) -> Self {
        self.signal_mode = mode;
        self
    }

    /// Enables or disables metrics.
    pub const fn with_metrics(mut self, enabled: bool) -> Self {
        self.enable_metrics = enabled;
        self
    }
}

impl Default for RingConfig {
    fn default() -> Self {
        Self {
            wait_timeout: Duration::from_millis(20),
            stall_warn_after: 10,
            signal_mode: ResetMode::Manual,
            enable_metrics: false,
        }
    }
}

/// Low latency configuration (2ms waits, warns after 50 consecutive timeouts)
pub const LOW_LATENCY_CONFIG: RingConfig =
    RingConfig::new(Duration::from_millis(2), 50, ResetMode::Manual, false);

/// Relaxed configuration for slow pipelines (100ms waits, metrics on)
pub const RELAXED_CONFIG: RingConfig =
    RingConfig::new(Duration::from_millis(100), 5, ResetMode::Manual, true);
