use std::sync::atomic::{AtomicU64, Ordering};

/// Optional metrics for monitoring ring behavior.
///
/// Counters are only updated when
/// [`RingConfig::enable_metrics`](crate::RingConfig::enable_metrics) is set.
#[derive(Debug, Default)]
pub struct Metrics {
    frames_produced: AtomicU64,
    frames_consumed: AtomicU64,
    produce_timeouts: AtomicU64,
    consume_timeouts: AtomicU64,
    stall_warnings: AtomicU64,
}

/// Point-in-time copy of [`Metrics`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub frames_produced: u64,
    pub frames_consumed: u64,
    pub produce_timeouts: u64,
    pub consume_timeouts: u64,
    pub stall_warnings: u64,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub(crate) fn add_frames_produced(&self, n: u64) {
        self.frames_produced.fetch_add(n, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn add_frames_consumed(&self, n: u64) {
        self.frames_consumed.fetch_add(n, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn add_produce_timeouts(&self, n: u64) {
        self.produce_timeouts.fetch_add(n, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn add_consume_timeouts(&self, n: u64) {
        self.consume_timeouts.fetch_add(n, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn add_stall_warnings(&self, n: u64) {
        self.stall_warnings.fetch_add(n, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            frames_produced: self.frames_produced.load(Ordering::Relaxed),
            frames_consumed: self.frames_consumed.load(Ordering::Relaxed),
            produce_timeouts: self.produce_timeouts.load(Ordering::Relaxed),
            consume_timeouts: self.consume_timeouts.load(Ordering::Relaxed),
            stall_warnings: self.stall_warnings.load(Ordering::Relaxed),
        }
    }
}
