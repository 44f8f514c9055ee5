use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A cloneable abort flag for cooperative shutdown.
///
/// The ring only ever reads the token: every bounded wait that times out
/// checks it and reports [`RingError::Cancelled`](crate::RingError::Cancelled)
/// instead of a retryable timeout once it is set. Any clone can cancel; the
/// first call wins and later calls are no-ops.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    /// Creates a token that is not cancelled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation.
    #[inline]
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    /// Returns `true` once any clone has called [`cancel`](Self::cancel).
    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}
