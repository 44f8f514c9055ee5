//! Property-based tests for the slot ring protocol.
//!
//! - FIFO: the consumer sees frames in the order the producer reserved them
//! - Bounded count: `0 ≤ count ≤ capacity`, `is_empty ⟺ count == 0`
//! - Exclusive slots: no slot is ever held by two threads at once

use framering::{CancelToken, RingConfig, RingError, SlotRing, WaitStage};
use proptest::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

fn config() -> RingConfig {
    RingConfig::default().with_wait_timeout(Duration::from_millis(1))
}

// =============================================================================
// FIFO + Bounded Count (single thread, random interleaving)
// =============================================================================

proptest! {
    /// Any interleaving of completed produce/consume pairs drains in fill order.
    #[test]
    fn prop_fifo_and_bounded_count(
        capacity in 1usize..8,
        ops in prop::collection::vec(prop::bool::ANY, 1..80),
    ) {
        let ring = SlotRing::from_frames(config(), vec![0u64; capacity]);
        let mut next = 0u64;
        let mut produced = Vec::new();
        let mut consumed = Vec::new();

        for produce in ops {
            if produce && !ring.is_full() {
                let mut frame = ring.begin_produce().unwrap();
                *frame = next;
                frame.end_produce().unwrap();
                produced.push(next);
                next += 1;
            } else if !produce && !ring.is_empty() {
                let frame = ring.begin_consume().unwrap();
                consumed.push(*frame);
                frame.end_consume().unwrap();
            }

            let count = ring.count();
            prop_assert!(count <= ring.capacity(),
                "count {} exceeds capacity {}", count, ring.capacity());
            prop_assert_eq!(ring.is_empty(), count == 0);
            prop_assert_eq!(count, produced.len() - consumed.len());
            prop_assert!(ring.head_index() < capacity);
            prop_assert!(ring.tail_index() < capacity);
        }

        prop_assert_eq!(&consumed[..], &produced[..consumed.len()]);
    }
}

proptest! {
    /// A full ring rejects the next produce without changing state.
    #[test]
    fn prop_full_ring_rejects_produce(capacity in 1usize..6) {
        let ring = SlotRing::from_frames(config(), vec![0u32; capacity]);
        for i in 0..capacity {
            let mut frame = ring.begin_produce().unwrap();
            *frame = i as u32;
            frame.end_produce().unwrap();
        }

        let head = ring.head_index();
        prop_assert_eq!(
            ring.begin_produce().unwrap_err(),
            RingError::Timeout(WaitStage::NotFull)
        );
        prop_assert_eq!(ring.count(), capacity);
        prop_assert_eq!(ring.head_index(), head);
    }
}

// =============================================================================
// Exclusive Slots (concurrent producer/consumer)
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(8))]

    /// Per-slot occupancy stays at 0 or 1 under concurrent producer/consumer.
    #[test]
    fn prop_slot_occupancy_at_most_one(
        frames in 50u64..300,
        producer_pauses in prop::collection::vec(prop::bool::ANY, 8),
        consumer_pauses in prop::collection::vec(prop::bool::ANY, 8),
    ) {
        const CAPACITY: usize = 8;

        let ring = SlotRing::from_frames(config(), vec![0u64; CAPACITY]);
        let occupancy: Vec<AtomicUsize> = (0..CAPACITY).map(|_| AtomicUsize::new(0)).collect();
        let max_seen = AtomicUsize::new(0);
        let token = CancelToken::new();

        let enter = |slot: usize| {
            let holders = occupancy[slot].fetch_add(1, Ordering::SeqCst) + 1;
            max_seen.fetch_max(holders, Ordering::SeqCst);
        };
        let leave = |slot: usize| {
            occupancy[slot].fetch_sub(1, Ordering::SeqCst);
        };

        let received = thread::scope(|s| {
            s.spawn(|| {
                for sequence in 0..frames {
                    let mut frame = ring.begin_produce_blocking(&token).unwrap();
                    enter(frame.index());
                    *frame = sequence;
                    if producer_pauses[sequence as usize % producer_pauses.len()] {
                        thread::yield_now();
                    }
                    leave(frame.index());
                    frame.end_produce().unwrap();
                }
            });

            let mut received = Vec::with_capacity(frames as usize);
            while (received.len() as u64) < frames {
                let frame = ring.begin_consume_blocking(&token).unwrap();
                enter(frame.index());
                received.push(*frame);
                if consumer_pauses[received.len() % consumer_pauses.len()] {
                    thread::yield_now();
                }
                leave(frame.index());
                frame.end_consume().unwrap();
            }
            received
        });

        prop_assert_eq!(max_seen.load(Ordering::SeqCst), 1);
        prop_assert_eq!(received, (0..frames).collect::<Vec<_>>());
        prop_assert!(ring.is_empty());
    }
}
