//! Binary synchronization signals.
//!
//! The ring consumes signals through the [`Signal`] trait so the primitive can
//! be swapped (e.g. for an OS event object). [`Event`] is the default,
//! built on `parking_lot`'s `Mutex` + `Condvar`.
//!
//! Two modes are supported:
//!
//! - **Auto-reset**: a successful wait consumes the signal; `signal()` wakes
//!   one waiter.
//! - **Manual-reset**: the signal stays set until `clear()`; `signal()` wakes
//!   every waiter.

use parking_lot::{Condvar, Mutex};
use std::time::{Duration, Instant};
use thiserror::Error;

/// How a signal behaves after a successful wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetMode {
    /// Cleared atomically by the waiter that observes it.
    Auto,
    /// Stays signaled until explicitly cleared.
    Manual,
}

impl ResetMode {
    /// Returns `true` for [`ResetMode::Manual`].
    #[inline]
    pub fn is_manual(self) -> bool {
        matches!(self, Self::Manual)
    }
}

/// Outcome of a bounded wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitStatus {
    /// The signal was set within the budget.
    Signaled,
    /// The budget elapsed first.
    TimedOut,
}

/// Errors reported by a signal primitive.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignalError {
    /// The underlying primitive was never created.
    #[error("signal primitive is not initialized")]
    Uninitialized,

    /// The underlying primitive reported a failure.
    #[error("signal primitive failed: {0}")]
    Failed(String),
}

/// A binary condition signal with bounded waits.
pub trait Signal: Send + Sync {
    /// Creates an unsignaled instance in the given mode.
    fn create(mode: ResetMode) -> Result<Self, SignalError>
    where
        Self: Sized;

    /// Sets the signal.
    fn signal(&self) -> Result<(), SignalError>;

    /// Clears the signal.
    fn clear(&self) -> Result<(), SignalError>;

    /// Sets or clears the signal.
    fn set_state(&self, signaled: bool) -> Result<(), SignalError> {
        if signaled {
            self.signal()
        } else {
            self.clear()
        }
    }

    /// Waits up to `timeout` for the signal to become set.
    fn wait(&self, timeout: Duration) -> Result<WaitStatus, SignalError>;

    /// Returns the current state without consuming it.
    fn is_signaled(&self) -> bool;

    /// Returns the reset mode.
    fn mode(&self) -> ResetMode;

    /// Changes the reset mode. Waiters already blocked keep the wake policy
    /// that was in effect when they were notified.
    fn set_mode(&self, mode: ResetMode);
}

#[derive(Debug)]
struct EventState {
    signaled: bool,
    mode: ResetMode,
}

/// Default [`Signal`] implementation.
#[derive(Debug)]
pub struct Event {
    state: Mutex<EventState>,
    cond: Condvar,
}

impl Event {
    /// Creates an unsignaled event.
    pub fn new(mode: ResetMode) -> Self {
        Self {
            state: Mutex::new(EventState {
                signaled: false,
                mode,
            }),
            cond: Condvar::new(),
        }
    }

    /// Creates an unsignaled manual-reset event.
    pub fn manual() -> Self {
        Self::new(ResetMode::Manual)
    }

    /// Creates an unsignaled auto-reset event.
    pub fn auto() -> Self {
        Self::new(ResetMode::Auto)
    }
}

impl Default for Event {
    fn default() -> Self {
        Self::manual()
    }
}

impl Signal for Event {
    fn create(mode: ResetMode) -> Result<Self, SignalError> {
        Ok(Self::new(mode))
    }

    fn signal(&self) -> Result<(), SignalError> {
        let mut state = self.state.lock();
        state.signaled = true;
        match state.mode {
            ResetMode::Manual => {
                self.cond.notify_all();
            }
            ResetMode::Auto => {
                self.cond.notify_one();
            }
        }
        Ok(())
    }

    fn clear(&self) -> Result<(), SignalError> {
        self.state.lock().signaled = false;
        Ok(())
    }

    fn wait(&self, timeout: Duration) -> Result<WaitStatus, SignalError> {
        let deadline = Instant::now().checked_add(timeout);
        let mut state = self.state.lock();

        while !state.signaled {
            match deadline {
                Some(deadline) => {
                    // Spurious wakeups loop back here without extending the budget.
                    if self.cond.wait_until(&mut state, deadline).timed_out() && !state.signaled
                    {
                        return Ok(WaitStatus::TimedOut);
                    }
                }
                None => self.cond.wait(&mut state),
            }
        }

        if state.mode == ResetMode::Auto {
            state.signaled = false;
        }
        Ok(WaitStatus::Signaled)
    }

    fn is_signaled(&self) -> bool {
        self.state.lock().signaled
    }

    fn mode(&self) -> ResetMode {
        self.state.lock().mode
    }

    fn set_mode(&self, mode: ResetMode) {
        self.state.lock().mode = mode;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::thread;

    const SHORT: Duration = Duration::from_millis(10);

    #[test]
    fn test_wait_times_out_when_unsignaled() {
        let event = Event::manual();
        let start = Instant::now();
        assert_eq!(event.wait(SHORT).unwrap(), WaitStatus::TimedOut);
        assert!(start.elapsed() >= SHORT);
    }

    #[test]
    fn test_manual_reset_stays_signaled() {
        let event = Event::manual();
        event.signal().unwrap();

        assert_eq!(event.wait(SHORT).unwrap(), WaitStatus::Signaled);
        assert_eq!(event.wait(SHORT).unwrap(), WaitStatus::Signaled);
        assert!(event.is_signaled());

        event.clear().unwrap();
        assert!(!event.is_signaled());
        assert_eq!(event.wait(SHORT).unwrap(), WaitStatus::TimedOut);
    }

    #[test]
    fn test_auto_reset_consumed_by_wait() {
        let event = Event::auto();
        event.signal().unwrap();

        assert_eq!(event.wait(SHORT).unwrap(), WaitStatus::Signaled);
        assert!(!event.is_signaled());
        assert_eq!(event.wait(SHORT).unwrap(), WaitStatus::TimedOut);
    }

    #[test]
    fn test_is_signaled_does_not_consume() {
        let event = Event::auto();
        event.set_state(true).unwrap();

        assert!(event.is_signaled());
        assert!(event.is_signaled());
        assert_eq!(event.wait(SHORT).unwrap(), WaitStatus::Signaled);

        event.set_state(false).unwrap();
        assert!(!event.is_signaled());
    }

    #[test]
    fn test_mode_switch() {
        let event = Event::auto();
        assert_eq!(event.mode(), ResetMode::Auto);

        event.set_mode(ResetMode::Manual);
        assert!(event.mode().is_manual());

        event.signal().unwrap();
        assert_eq!(event.wait(SHORT).unwrap(), WaitStatus::Signaled);
        assert!(event.is_signaled());
    }

    #[test]
    fn test_wakes_waiter_on_other_thread() {
        let event = Arc::new(Event::manual());
        let waiter = {
            let event = Arc::clone(&event);
            thread::spawn(move || event.wait(Duration::from_secs(5)).unwrap())
        };

        thread::sleep(Duration::from_millis(20));
        event.signal().unwrap();

        assert_eq!(waiter.join().unwrap(), WaitStatus::Signaled);
    }

    #[test]
    fn test_auto_reset_wakes_exactly_one() {
        let event = Arc::new(Event::auto());
        let woken = Arc::new(AtomicUsize::new(0));

        let waiters: Vec<_> = (0..2)
            .map(|_| {
                let event = Arc::clone(&event);
                let woken = Arc::clone(&woken);
                thread::spawn(move || {
                    if event.wait(Duration::from_millis(300)).unwrap() == WaitStatus::Signaled {
                        woken.fetch_add(1, Ordering::SeqCst);
                    }
                })
            })
            .collect();

        thread::sleep(Duration::from_millis(30));
        event.signal().unwrap();

        for waiter in waiters {
            waiter.join().unwrap();
        }
        assert_eq!(woken.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_manual_reset_wakes_all() {
        let event = Arc::new(Event::manual());
        let woken = Arc::new(AtomicUsize::new(0));

        let waiters: Vec<_> = (0..3)
            .map(|_| {
                let event = Arc::clone(&event);
                let woken = Arc::clone(&woken);
                thread::spawn(move || {
                    if event.wait(Duration::from_secs(5)).unwrap() == WaitStatus::Signaled {
                        woken.fetch_add(1, Ordering::SeqCst);
                    }
                })
            })
            .collect();

        thread::sleep(Duration::from_millis(20));
        event.signal().unwrap();

        for waiter in waiters {
            waiter.join().unwrap();
        }
        assert_eq!(woken.load(Ordering::SeqCst), 3);
    }
}
