//! Loom-based concurrency tests for framering.
//!
//! Run with: `cargo test -p framering --features loom --test loom_tests --release`
//!
//! Loom exhaustively explores all possible thread interleavings to find
//! concurrency bugs that might only occur under specific scheduling.

#![cfg(feature = "loom")]

use loom::sync::{Arc, Mutex};
use loom::thread;

const CAPACITY: usize = 2;

/// Positions guarded by the ring lock.
struct Positions {
    head: usize,
    tail: usize,
    count: usize,
}

/// Simplified slot ring for loom testing.
///
/// Keeps the two-level protocol of `SlotRing` (ring lock → slot lock, slot
/// lock held past the ring lock) but replaces bounded waits with `try_lock`
/// and the occupancy signals with caller retries, to keep the state space
/// manageable for loom's exhaustive search.
struct LoomSlotRing {
    positions: Mutex<Positions>,
    slots: [Mutex<u64>; CAPACITY],
}

impl LoomSlotRing {
    fn new() -> Self {
        Self {
            positions: Mutex::new(Positions {
                head: 0,
                tail: 0,
                count: 0,
            }),
            slots: [Mutex::new(0), Mutex::new(0)],
        }
    }

    /// Producer: reserve under the ring lock, fill under the slot lock only.
    fn try_produce(&self, value: u64) -> bool {
        let mut positions = self.positions.lock().unwrap();
        if positions.count == CAPACITY {
            return false;
        }
        let index = positions.head;
        let Ok(mut slot) = self.slots[index].try_lock() else {
            return false;
        };
        positions.head = (index + 1) % CAPACITY;
        positions.count += 1;
        drop(positions);

        // FILLING: ring lock released, slot lock still held
        *slot = value;
        true
    }

    /// Consumer: mirror image.
    fn try_consume(&self) -> Option<u64> {
        let mut positions = self.positions.lock().unwrap();
        if positions.count == 0 {
            return None;
        }
        let index = positions.tail;
        // Fails while the producer is still filling this slot
        let Ok(mut slot) = self.slots[index].try_lock() else {
            return None;
        };
        positions.tail = (index + 1) % CAPACITY;
        positions.count -= 1;
        drop(positions);

        let value = *slot;
        *slot = 0;
        Some(value)
    }

    fn count(&self) -> usize {
        self.positions.lock().unwrap().count
    }
}

/// A reserved-but-unfilled slot is never observed by the consumer.
#[test]
fn loom_consumer_never_sees_unfilled_slot() {
    loom::model(|| {
        let ring = Arc::new(LoomSlotRing::new());
        let producer_ring = Arc::clone(&ring);

        let producer = thread::spawn(move || {
            assert!(producer_ring.try_produce(7));
        });

        let mut received = None;
        for _ in 0..3 {
            if let Some(v) = ring.try_consume() {
                received = Some(v);
                break;
            }
            thread::yield_now();
        }

        producer.join().unwrap();
        if let Some(v) = received {
            assert_eq!(v, 7, "consumer read a slot before its fill ended");
        }
    });
}

/// Frames are drained in fill order.
#[test]
fn loom_fifo_two_frames() {
    loom::model(|| {
        let ring = Arc::new(LoomSlotRing::new());
        let producer_ring = Arc::clone(&ring);

        let producer = thread::spawn(move || {
            let mut sent = 0;
            for value in [1, 2] {
                if producer_ring.try_produce(value) {
                    sent += 1;
                } else {
                    break;
                }
            }
            sent
        });

        let mut received = Vec::new();
        for _ in 0..3 {
            if let Some(v) = ring.try_consume() {
                received.push(v);
            }
            thread::yield_now();
        }

        let sent = producer.join().unwrap();
        assert!(received.len() <= sent);
        for (i, v) in received.iter().enumerate() {
            assert_eq!(*v, i as u64 + 1, "FIFO violation at position {}", i);
        }
    });
}

/// Count stays within bounds when the ring fills and drains concurrently.
#[test]
fn loom_bounded_count_when_full() {
    loom::model(|| {
        let ring = Arc::new(LoomSlotRing::new());
        assert!(ring.try_produce(1));
        assert!(ring.try_produce(2));
        assert!(!ring.try_produce(3));

        let consumer_ring = Arc::clone(&ring);
        let consumer = thread::spawn(move || consumer_ring.try_consume());

        let produced = ring.try_produce(3);
        let consumed = consumer.join().unwrap();

        assert_eq!(consumed, Some(1));
        let count = ring.count();
        assert!(count <= CAPACITY);
        assert_eq!(count, if produced { 2 } else { 1 });
    });
}
