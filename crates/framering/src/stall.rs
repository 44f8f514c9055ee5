use std::sync::atomic::{AtomicU32, Ordering};

/// Consecutive-timeout counter for one side of the ring.
///
/// Each ring owns one per side, so diagnostics never leak between instances.
/// Advisory only: crossing the threshold never changes control flow.
#[derive(Debug, Default)]
pub(crate) struct StallCounter {
    consecutive: AtomicU32,
}

impl StallCounter {
    pub(crate) const fn new() -> Self {
        Self {
            consecutive: AtomicU32::new(0),
        }
    }

    /// Records one timeout. Returns the streak length once it reaches
    /// `threshold`, restarting the count.
    #[inline]
    pub(crate) fn record_timeout(&self, threshold: u32) -> Option<u32> {
        let streak = self.consecutive.fetch_add(1, Ordering::Relaxed) + 1;
        if streak >= threshold.max(1) {
            self.consecutive.store(0, Ordering::Relaxed);
            Some(streak)
        } else {
            None
        }
    }

    /// Ends the current streak.
    #[inline]
    pub(crate) fn reset(&self) {
        self.consecutive.store(0, Ordering::Relaxed);
    }

    #[cfg(test)]
    pub(crate) fn current(&self) -> u32 {
        self.consecutive.load(Ordering::Relaxed)
    }
}
