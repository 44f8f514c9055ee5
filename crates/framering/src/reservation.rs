use crate::error::RingError;
use crate::ring::SlotRing;
use crate::signal::{Event, Signal};
use parking_lot::MutexGuard;
use std::fmt;
use std::mem::ManuallyDrop;
use std::ops::{Deref, DerefMut};

/// Exclusive access to a slot reserved for filling.
///
/// Returned by [`SlotRing::begin_produce`]. The slot's lock is held until
/// [`end_produce`](Self::end_produce) is called or the reservation is dropped;
/// either path releases the lock and then signals "not-empty", so the frame
/// becomes visible to the consumer exactly once.
///
/// The reservation is `!Send`: the thread that began the fill must end it.
///
/// # Example
///
/// ```ignore
/// if let Ok(mut frame) = ring.begin_produce() {
///     frame.copy_from_slice(&captured);
///     frame.end_produce()?;
/// }
/// ```
pub struct FillSlot<'a, F, S: Signal = Event> {
    ring: &'a SlotRing<F, S>,
    guard: ManuallyDrop<MutexGuard<'a, F>>,
    index: usize,
}

impl<'a, F, S: Signal> FillSlot<'a, F, S> {
    pub(crate) fn new(ring: &'a SlotRing<F, S>, index: usize, guard: MutexGuard<'a, F>) -> Self {
        Self {
            ring,
            guard: ManuallyDrop::new(guard),
            index,
        }
    }

    /// Returns the index of the reserved slot (the fill cursor).
    #[inline]
    pub fn index(&self) -> usize {
        self.index
    }

    /// Releases the slot and publishes it to the consumer.
    ///
    /// Only a signal failure is reported; the slot lock is released either way.
    pub fn end_produce(self) -> Result<(), RingError> {
        let mut this = ManuallyDrop::new(self);
        // SAFETY: `this` is never dropped, so the guard is dropped exactly once here.
        unsafe { ManuallyDrop::drop(&mut this.guard) };
        this.ring.finish_fill(this.index)
    }
}

impl<F, S: Signal> Deref for FillSlot<'_, F, S> {
    type Target = F;

    fn deref(&self) -> &F {
        &self.guard
    }
}

impl<F, S: Signal> DerefMut for FillSlot<'_, F, S> {
    fn deref_mut(&mut self) -> &mut F {
        &mut self.guard
    }
}

impl<F, S: Signal> Drop for FillSlot<'_, F, S> {
    fn drop(&mut self) {
        // SAFETY: `end_produce` bypasses this impl, so the guard is still live.
        unsafe { ManuallyDrop::drop(&mut self.guard) };
        if let Err(err) = self.ring.finish_fill(self.index) {
            tracing::error!(slot = self.index, error = %err, "failed to publish filled slot");
        }
    }
}

impl<F: fmt::Debug, S: Signal> fmt::Debug for FillSlot<'_, F, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FillSlot")
            .field("index", &self.index)
            .field("frame", &**self.guard)
            .finish()
    }
}

/// Exclusive access to a slot reserved for draining.
///
/// Returned by [`SlotRing::begin_consume`]. Mirror image of [`FillSlot`]:
/// ending or dropping it releases the slot lock and then signals "not-full".
pub struct DrainSlot<'a, F, S: Signal = Event> {
    ring: &'a SlotRing<F, S>,
    guard: ManuallyDrop<MutexGuard<'a, F>>,
    index: usize,
}

impl<'a, F, S: Signal> DrainSlot<'a, F, S> {
    pub(crate) fn new(ring: &'a SlotRing<F, S>, index: usize, guard: MutexGuard<'a, F>) -> Self {
        Self {
            ring,
            guard: ManuallyDrop::new(guard),
            index,
        }
    }

    /// Returns the index of the reserved slot (the drain cursor).
    #[inline]
    pub fn index(&self) -> usize {
        self.index
    }

    /// Releases the slot and hands it back to the producer.
    pub fn end_consume(self) -> Result<(), RingError> {
        let mut this = ManuallyDrop::new(self);
        // SAFETY: `this` is never dropped, so the guard is dropped exactly once here.
        unsafe { ManuallyDrop::drop(&mut this.guard) };
        this.ring.finish_drain(this.index)
    }
}

impl<F, S: Signal> Deref for DrainSlot<'_, F, S> {
    type Target = F;

    fn deref(&self) -> &F {
        &self.guard
    }
}

impl<F, S: Signal> DerefMut for DrainSlot<'_, F, S> {
    fn deref_mut(&mut self) -> &mut F {
        &mut self.guard
    }
}

impl<F, S: Signal> Drop for DrainSlot<'_, F, S> {
    fn drop(&mut self) {
        // SAFETY: `end_consume` bypasses this impl, so the guard is still live.
        unsafe { ManuallyDrop::drop(&mut self.guard) };
        if let Err(err) = self.ring.finish_drain(self.index) {
            tracing::error!(slot = self.index, error = %err, "failed to release drained slot");
        }
    }
}

impl<F: fmt::Debug, S: Signal> fmt::Debug for DrainSlot<'_, F, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DrainSlot")
            .field("index", &self.index)
            .field("frame", &**self.guard)
            .finish()
    }
}
