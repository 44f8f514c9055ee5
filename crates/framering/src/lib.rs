//! framering - Bounded Slot Ring for Frame Pipelines
//!
//! A fixed-capacity ring of caller-owned frame slots shared by exactly one
//! producer thread and one consumer thread, e.g. capture → display.
//!
//! Each slot keeps its frame handle behind its own exclusive lock; a
//! ring-level lock guards only the head/tail/count bookkeeping. The producer
//! and consumer therefore work on different slots fully concurrently, while a
//! slot is never handed to the consumer before its fill has ended.
//!
//! # Key Features
//!
//! - RAII reservations ([`FillSlot`] / [`DrainSlot`]) hold the slot lock
//! - Every wait is bounded (20ms by default); timeouts are recoverable errors
//! - Cooperative shutdown through a [`CancelToken`] checked on every timeout
//! - Pluggable [`Signal`] primitive, auto- or manual-reset
//! - Instance-scoped stall diagnostics via `tracing`
//!
//! # Example
//!
//! ```
//! use framering::{RingConfig, SlotRing};
//!
//! let ring = SlotRing::from_frames(RingConfig::default(), vec![vec![0u8; 16]; 3]);
//!
//! // Producer: fill the next free slot in place
//! let mut slot = ring.begin_produce().unwrap();
//! slot[0] = 42;
//! slot.end_produce().unwrap();
//!
//! // Consumer: drain in FIFO order
//! let slot = ring.begin_consume().unwrap();
//! assert_eq!(slot[0], 42);
//! slot.end_consume().unwrap();
//! ```

mod cancel;
mod config;
mod error;
mod invariants;
mod metrics;
mod reservation;
mod ring;
mod signal;
mod stall;

pub use cancel::CancelToken;
pub use config::{RingConfig, LOW_LATENCY_CONFIG, RELAXED_CONFIG};
pub use error::{RingError, WaitStage};
pub use metrics::{Metrics, MetricsSnapshot};
pub use reservation::{DrainSlot, FillSlot};
pub use ring::SlotRing;
pub use signal::{Event, ResetMode, Signal, SignalError, WaitStatus};
