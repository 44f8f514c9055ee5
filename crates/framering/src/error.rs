//! Error types for ring operations.

use crate::signal::SignalError;
use std::fmt;
use thiserror::Error;

/// The bounded wait that ran out of budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitStage {
    /// The ring-level lock guarding head/tail/count.
    RingLock,
    /// The exclusive lock of the slot being reserved.
    SlotLock,
    /// The "not-full" signal (producer side, ring was full).
    NotFull,
    /// The "not-empty" signal (consumer side, ring was empty).
    NotEmpty,
}

impl fmt::Display for WaitStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::RingLock => "ring lock",
            Self::SlotLock => "slot lock",
            Self::NotFull => "not-full signal",
            Self::NotEmpty => "not-empty signal",
        };
        f.write_str(name)
    }
}

/// Errors that can occur in ring operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RingError {
    /// A bounded wait elapsed. No state changed; the call may be retried.
    #[error("timed out waiting for {0}")]
    Timeout(WaitStage),

    /// A wait timed out after the attached cancel token was set.
    #[error("operation cancelled")]
    Cancelled,

    /// Slots cannot be registered once producing or consuming has started.
    #[error("ring is sealed: register is only allowed before the first produce/consume")]
    Sealed,

    /// Produce/consume was attempted on a ring with no registered slots.
    #[error("ring has no registered slots")]
    NoSlots,

    /// `begin_produce` was called while a fill reservation is still outstanding.
    #[error("a produce operation is already in flight (slot {slot})")]
    ProduceInFlight {
        /// Slot held by the outstanding reservation.
        slot: usize,
    },

    /// `begin_consume` was called while a drain reservation is still outstanding.
    #[error("a consume operation is already in flight (slot {slot})")]
    ConsumeInFlight {
        /// Slot held by the outstanding reservation.
        slot: usize,
    },

    /// The signal primitive failed; the ring refuses to continue.
    #[error(transparent)]
    Signal(#[from] SignalError),
}

impl RingError {
    /// Returns `true` if this is a recoverable error (e.g., `Timeout`).
    #[inline]
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }

    /// Returns `true` if this error indicates the ring is permanently unusable
    /// for the caller.
    #[inline]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Cancelled | Self::Signal(_))
    }

    /// Returns `true` if this error reports a protocol misuse.
    #[inline]
    pub fn is_misuse(&self) -> bool {
        matches!(
            self,
            Self::Sealed
                | Self::NoSlots
                | Self::ProduceInFlight { .. }
                | Self::ConsumeInFlight { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        let timeout = RingError::Timeout(WaitStage::NotFull);
        assert!(timeout.is_recoverable());
        assert!(!timeout.is_terminal());
        assert!(!timeout.is_misuse());

        assert!(RingError::Cancelled.is_terminal());
        assert!(RingError::Signal(SignalError::Uninitialized).is_terminal());

        assert!(RingError::Sealed.is_misuse());
        assert!(RingError::ProduceInFlight { slot: 0 }.is_misuse());
        assert!(!RingError::Sealed.is_recoverable());
    }

    #[test]
    fn test_display() {
        assert_eq!(
            RingError::Timeout(WaitStage::NotEmpty).to_string(),
            "timed out waiting for not-empty signal"
        );
        assert_eq!(
            RingError::from(SignalError::Failed("closed".into())).to_string(),
            "signal primitive failed: closed"
        );
    }
}
