use crate::invariants::{
    debug_assert_bounded_count, debug_assert_cursor_matches, debug_assert_index_in_range,
    debug_assert_positions_consistent,
};
use crate::stall::StallCounter;
use crate::{
    CancelToken, DrainSlot, Event, FillSlot, Metrics, MetricsSnapshot, RingConfig, RingError,
    Signal, WaitStage, WaitStatus,
};
use crossbeam_utils::CachePadded;
use parking_lot::{Mutex, MutexGuard};
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{debug, warn};

// =============================================================================
// LOCKING PROTOCOL
// =============================================================================
//
// Two levels of locks, always taken in this order:
//
// 1. Ring lock (`state`): guards head, tail, count and the seal flag, plus the
//    clear() transitions of both occupancy signals made by begin_*. Held only
//    for the bookkeeping of a single begin_* call.
// 2. Slot lock (`slots[i].frame`): guards the caller's frame handle. Taken
//    while the ring lock is held, then kept by the returned reservation after
//    the ring lock is released, until the matching end_* call.
//
// The ring lock is never held while waiting on a signal. end_* never touches
// the ring lock: it releases the slot lock and then signals the other side.
//
// Every acquisition is a bounded wait of `config.wait_timeout`. When one runs
// out, the attached cancel token decides between `Timeout` (retry) and
// `Cancelled` (stop).
//
// A begin_* that observes the ring full (empty) clears "not-full"
// ("not-empty") before dropping the ring lock. Any later signal therefore
// reflects an occupancy change made after the observation, and a stale signal
// from an earlier end_* costs at most one extra pass through the loop.
//
// =============================================================================

/// Sentinel for "no reservation outstanding".
const NO_CURSOR: usize = usize::MAX;

/// One registered frame slot. The frame handle lives inside its exclusive lock.
struct Slot<F> {
    frame: Mutex<F>,
}

impl<F> Slot<F> {
    fn new(frame: F) -> Self {
        Self {
            frame: Mutex::new(frame),
        }
    }

    fn into_frame(self) -> F {
        self.frame.into_inner()
    }
}

/// Positions guarded by the ring lock.
#[derive(Debug, Default)]
struct RingState {
    /// Next slot to fill
    head: usize,
    /// Next slot to drain
    tail: usize,
    /// Filled (or filling) slots
    count: usize,
    /// Set by the first begin_* call; closes registration
    sealed: bool,
}

#[derive(Clone, Copy)]
enum Side {
    Produce,
    Consume,
}

/// Bounded ring of caller-owned frame slots for one producer and one consumer.
///
/// Slots are registered up front with [`register`](Self::register); the first
/// produce or consume call seals the ring and fixes its capacity. The producer
/// repeatedly calls [`begin_produce`](Self::begin_produce), writes into the
/// returned [`FillSlot`], and ends it; the consumer does the same with
/// [`begin_consume`](Self::begin_consume) and [`DrainSlot`]. Frames are drained
/// in the order they were reserved for filling.
///
/// Key properties:
/// - At most one thread holds any given slot at a time
/// - Every wait is bounded; timeouts surface as [`RingError::Timeout`]
/// - Cancellation is checked on every timeout
/// - No lock is held across caller frame processing except the slot's own
pub struct SlotRing<F, S: Signal = Event> {
    // === PRODUCER SIDE ===
    /// Slot held by the outstanding `FillSlot`, or `NO_CURSOR`
    fill_cursor: CachePadded<AtomicUsize>,
    /// Consecutive "ring stayed full" timeouts
    producer_stalls: CachePadded<StallCounter>,

    // === CONSUMER SIDE ===
    /// Slot held by the outstanding `DrainSlot`, or `NO_CURSOR`
    drain_cursor: CachePadded<AtomicUsize>,
    /// Consecutive "ring stayed empty" timeouts
    consumer_stalls: CachePadded<StallCounter>,

    // === SHARED ===
    state: Mutex<RingState>,
    not_full: S,
    not_empty: S,
    slots: Vec<Slot<F>>,
    cancel: Option<CancelToken>,
    metrics: Metrics,
    config: RingConfig,
}

impl<F> SlotRing<F, Event> {
    /// Creates an empty ring backed by the default [`Event`] signals.
    pub fn new(config: RingConfig) -> Self {
        Self::with_signals(
            config,
            Event::new(config.signal_mode),
            Event::new(config.signal_mode),
        )
    }

    /// Creates a ring and registers every frame in iteration order.
    pub fn from_frames<I>(config: RingConfig, frames: I) -> Self
    where
        I: IntoIterator<Item = F>,
    {
        let mut ring = Self::new(config);
        ring.slots.extend(frames.into_iter().map(Slot::new));
        debug!(capacity = ring.slots.len(), "registered frame slots");
        ring
    }
}

impl<F, S: Signal> SlotRing<F, S> {
    /// Creates an empty ring, constructing both signals through [`Signal::create`].
    ///
    /// A signal that fails to initialize is reported here; the ring is never
    /// built around a broken primitive.
    pub fn create(config: RingConfig) -> Result<Self, RingError> {
        let not_full = S::create(config.signal_mode)?;
        let not_empty = S::create(config.signal_mode)?;
        Ok(Self::with_signals(config, not_full, not_empty))
    }

    /// Creates an empty ring around caller-supplied signals.
    pub fn with_signals(config: RingConfig, not_full: S, not_empty: S) -> Self {
        Self {
            fill_cursor: CachePadded::new(AtomicUsize::new(NO_CURSOR)),
            producer_stalls: CachePadded::new(StallCounter::new()),
            drain_cursor: CachePadded::new(AtomicUsize::new(NO_CURSOR)),
            consumer_stalls: CachePadded::new(StallCounter::new()),
            state: Mutex::new(RingState::default()),
            not_full,
            not_empty,
            slots: Vec::new(),
            cancel: None,
            metrics: Metrics::new(),
            config,
        }
    }

    // ---------------------------------------------------------------------
    // SETUP
    // ---------------------------------------------------------------------

    /// Appends a slot holding `frame`. Returns the new slot's index.
    ///
    /// Fails with [`RingError::Sealed`] once any produce/consume call was made.
    pub fn register(&mut self, frame: F) -> Result<usize, RingError> {
        if self.state.get_mut().sealed {
            return Err(RingError::Sealed);
        }
        let index = self.slots.len();
        self.slots.push(Slot::new(frame));
        debug!(slot = index, "registered frame slot");
        Ok(index)
    }

    /// Attaches the abort flag checked whenever a wait times out.
    ///
    /// The ring keeps a clone and only reads it; the caller cancels through
    /// its own clone.
    pub fn set_cancel_token(&mut self, token: CancelToken) {
        self.cancel = Some(token);
    }

    /// Returns the attached cancel token, if any.
    pub fn cancel_token(&self) -> Option<&CancelToken> {
        self.cancel.as_ref()
    }

    /// Releases every slot and resets the ring to its freshly constructed state.
    ///
    /// Returns the frame handles in slot order. Exclusive access guarantees no
    /// reservation is outstanding. Both signals are cleared, the cancel token
    /// is detached and registration is reopened; metrics are kept.
    pub fn clear(&mut self) -> Result<Vec<F>, RingError> {
        self.not_full.clear()?;
        self.not_empty.clear()?;

        let frames: Vec<F> = self.slots.drain(..).map(Slot::into_frame).collect();

        *self.state.get_mut() = RingState::default();
        *self.fill_cursor.get_mut() = NO_CURSOR;
        *self.drain_cursor.get_mut() = NO_CURSOR;
        self.producer_stalls.reset();
        self.consumer_stalls.reset();
        self.cancel = None;

        debug!(frames = frames.len(), "cleared ring");
        Ok(frames)
    }

    // ---------------------------------------------------------------------
    // STATUS
    // ---------------------------------------------------------------------

    /// Returns the number of registered slots.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Returns the number of filled (or filling) slots.
    pub fn count(&self) -> usize {
        self.state.lock().count
    }

    /// Returns true if no slot is filled.
    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    /// Returns true if every slot is filled.
    pub fn is_full(&self) -> bool {
        self.count() == self.capacity()
    }

    /// Returns the index of the next slot to fill.
    pub fn head_index(&self) -> usize {
        self.state.lock().head
    }

    /// Returns the index of the next slot to drain.
    pub fn tail_index(&self) -> usize {
        self.state.lock().tail
    }

    /// Returns true once the first produce/consume call has closed registration.
    pub fn is_sealed(&self) -> bool {
        self.state.lock().sealed
    }

    /// Returns the ring's configuration.
    pub fn config(&self) -> &RingConfig {
        &self.config
    }

    /// Returns a snapshot of the ring's metrics.
    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    // ---------------------------------------------------------------------
    // PRODUCER API
    // ---------------------------------------------------------------------

    /// Reserves the next free slot for writing.
    ///
    /// Makes one bounded attempt: if the ring stays full, or a lock cannot be
    /// taken, for `config.wait_timeout`, returns [`RingError::Timeout`] (or
    /// [`RingError::Cancelled`] if the attached token is set). The slot lock is
    /// held by the returned reservation until it is ended or dropped.
    pub fn begin_produce(&self) -> Result<FillSlot<'_, F, S>, RingError> {
        let capacity = self.capacity();
        if capacity == 0 {
            return Err(RingError::NoSlots);
        }
        let timeout = self.config.wait_timeout;

        loop {
            let mut state = self.lock_state(Side::Produce)?;
            state.sealed = true;

            let outstanding = self.fill_cursor.load(Ordering::Acquire);
            if outstanding != NO_CURSOR {
                return Err(RingError::ProduceInFlight { slot: outstanding });
            }

            if state.count == capacity {
                self.not_full.clear()?;
                drop(state);
                match self.not_full.wait(timeout)? {
                    WaitStatus::Signaled => continue,
                    WaitStatus::TimedOut => return Err(self.producer_stalled()),
                }
            }
            self.producer_stalls.reset();

            let index = state.head;
            let guard = match self.slots[index].frame.try_lock_for(timeout) {
                Some(guard) => guard,
                None => return Err(self.timed_out(Side::Produce, WaitStage::SlotLock)),
            };

            if state.count + 1 == capacity {
                self.not_full.clear()?;
            }
            self.fill_cursor.store(index, Ordering::Release);
            state.head = (index + 1) % capacity;
            state.count += 1;

            debug_assert_bounded_count!(state.count, capacity);
            debug_assert_index_in_range!("head", state.head, capacity);
            debug_assert_positions_consistent!(state.head, state.tail, state.count, capacity);

            return Ok(FillSlot::new(self, index, guard));
        }
    }

    /// Reserves the next free slot, retrying timeouts until it succeeds or
    /// `cancel` (or the attached token) is set.
    ///
    /// Every individual wait is still bounded, so cancellation is observed
    /// within one `wait_timeout`.
    pub fn begin_produce_blocking(
        &self,
        cancel: &CancelToken,
    ) -> Result<FillSlot<'_, F, S>, RingError> {
        loop {
            match self.begin_produce() {
                Err(err) if err.is_recoverable() => {
                    if cancel.is_cancelled() {
                        return Err(RingError::Cancelled);
                    }
                }
                result => return result,
            }
        }
    }

    /// Called by `FillSlot` after its slot lock has been released.
    pub(crate) fn finish_fill(&self, index: usize) -> Result<(), RingError> {
        let recorded = self.fill_cursor.swap(NO_CURSOR, Ordering::AcqRel);
        debug_assert_cursor_matches!("fill", recorded, index);

        if self.config.enable_metrics {
            self.metrics.add_frames_produced(1);
        }
        self.not_empty.signal()?;
        Ok(())
    }

    // ---------------------------------------------------------------------
    // CONSUMER API
    // ---------------------------------------------------------------------

    /// Reserves the oldest filled slot for reading.
    ///
    /// Mirror image of [`begin_produce`](Self::begin_produce): waits on
    /// "not-empty" for at most one `wait_timeout` when the ring is empty. The
    /// slot is only handed out once its producer has ended the fill.
    pub fn begin_consume(&self) -> Result<DrainSlot<'_, F, S>, RingError> {
        let capacity = self.capacity();
        if capacity == 0 {
            return Err(RingError::NoSlots);
        }
        let timeout = self.config.wait_timeout;

        loop {
            let mut state = self.lock_state(Side::Consume)?;
            state.sealed = true;

            let outstanding = self.drain_cursor.load(Ordering::Acquire);
            if outstanding != NO_CURSOR {
                return Err(RingError::ConsumeInFlight { slot: outstanding });
            }

            if state.count == 0 {
                self.not_empty.clear()?;
                drop(state);
                match self.not_empty.wait(timeout)? {
                    WaitStatus::Signaled => continue,
                    WaitStatus::TimedOut => return Err(self.consumer_starved()),
                }
            }
            self.consumer_stalls.reset();

            // Blocks (bounded) while the producer is still filling this slot.
            let index = state.tail;
            let guard = match self.slots[index].frame.try_lock_for(timeout) {
                Some(guard) => guard,
                None => return Err(self.timed_out(Side::Consume, WaitStage::SlotLock)),
            };

            if state.count == 1 {
                self.not_empty.clear()?;
            }
            self.drain_cursor.store(index, Ordering::Release);
            state.tail = (index + 1) % capacity;
            state.count -= 1;

            debug_assert_index_in_range!("tail", state.tail, capacity);
            debug_assert_positions_consistent!(state.head, state.tail, state.count, capacity);

            return Ok(DrainSlot::new(self, index, guard));
        }
    }

    /// Reserves the oldest filled slot, retrying timeouts until it succeeds or
    /// `cancel` (or the attached token) is set.
    pub fn begin_consume_blocking(
        &self,
        cancel: &CancelToken,
    ) -> Result<DrainSlot<'_, F, S>, RingError> {
        loop {
            match self.begin_consume() {
                Err(err) if err.is_recoverable() => {
                    if cancel.is_cancelled() {
                        return Err(RingError::Cancelled);
                    }
                }
                result => return result,
            }
        }
    }

    /// Called by `DrainSlot` after its slot lock has been released.
    pub(crate) fn finish_drain(&self, index: usize) -> Result<(), RingError> {
        let recorded = self.drain_cursor.swap(NO_CURSOR, Ordering::AcqRel);
        debug_assert_cursor_matches!("drain", recorded, index);

        if self.config.enable_metrics {
            self.metrics.add_frames_consumed(1);
        }
        self.not_full.signal()?;
        Ok(())
    }

    // ---------------------------------------------------------------------
    // BOUNDED WAITS
    // ---------------------------------------------------------------------

    fn lock_state(&self, side: Side) -> Result<MutexGuard<'_, RingState>, RingError> {
        self.state
            .try_lock_for(self.config.wait_timeout)
            .ok_or_else(|| self.timed_out(side, WaitStage::RingLock))
    }

    /// Turns an elapsed wait into `Cancelled` or a retryable `Timeout`.
    fn timed_out(&self, side: Side, stage: WaitStage) -> RingError {
        if self.config.enable_metrics {
            match side {
                Side::Produce => self.metrics.add_produce_timeouts(1),
                Side::Consume => self.metrics.add_consume_timeouts(1),
            }
        }
        if self.cancel.as_ref().is_some_and(CancelToken::is_cancelled) {
            RingError::Cancelled
        } else {
            RingError::Timeout(stage)
        }
    }

    fn producer_stalled(&self) -> RingError {
        if let Some(streak) = self.producer_stalls.record_timeout(self.config.stall_warn_after) {
            if self.config.enable_metrics {
                self.metrics.add_stall_warnings(1);
            }
            warn!(
                timeouts = streak,
                capacity = self.capacity(),
                "producer too slow to be drained: ring stayed full"
            );
        }
        self.timed_out(Side::Produce, WaitStage::NotFull)
    }

    fn consumer_starved(&self) -> RingError {
        if let Some(streak) = self.consumer_stalls.record_timeout(self.config.stall_warn_after) {
            if self.config.enable_metrics {
                self.metrics.add_stall_warnings(1);
            }
            warn!(
                timeouts = streak,
                capacity = self.capacity(),
                "starving consumer: ring stayed empty"
            );
        }
        self.timed_out(Side::Consume, WaitStage::NotEmpty)
    }
}

impl<F, S: Signal> fmt::Debug for SlotRing<F, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut dbg = f.debug_struct("SlotRing");
        dbg.field("capacity", &self.capacity());
        match self.state.try_lock() {
            Some(state) => dbg.field("state", &*state),
            None => dbg.field("state", &"<locked>"),
        };
        dbg.field("config", &self.config).finish_non_exhaustive()
    }
}
