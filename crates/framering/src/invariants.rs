//! Debug assertion macros for slot ring invariants.
//!
//! They are only active in debug builds (`#[cfg(debug_assertions)]`), so there
//! is zero overhead in release builds.

// =============================================================================
// Bounded Count
// =============================================================================

/// Assert that occupancy never exceeds capacity.
///
/// **Invariant**: `0 ≤ count ≤ capacity`
///
/// Used in: `begin_produce()` after incrementing count
macro_rules! debug_assert_bounded_count {
    ($count:expr, $capacity:expr) => {
        debug_assert!(
            $count <= $capacity,
            "bounded count violated: count {} exceeds capacity {}",
            $count,
            $capacity
        )
    };
}

// =============================================================================
// Index Range
// =============================================================================

/// Assert that a head/tail position addresses a registered slot.
///
/// **Invariant**: `0 ≤ index < capacity`
///
/// Used in: `begin_produce()` / `begin_consume()` after advancing
macro_rules! debug_assert_index_in_range {
    ($name:literal, $index:expr, $capacity:expr) => {
        debug_assert!(
            $index < $capacity,
            "index range violated: {} {} outside [0, {})",
            $name,
            $index,
            $capacity
        )
    };
}

// =============================================================================
// Position Consistency
// =============================================================================

/// Assert that count agrees with the distance between head and tail.
///
/// **Invariant**: `count == (head - tail) mod capacity`, except when the ring
/// is full and head has wrapped onto tail.
///
/// Used in: `begin_produce()` / `begin_consume()` before releasing the ring lock
macro_rules! debug_assert_positions_consistent {
    ($head:expr, $tail:expr, $count:expr, $capacity:expr) => {
        debug_assert!(
            ($head + $capacity - $tail) % $capacity == $count % $capacity,
            "position consistency violated: head {} tail {} count {} capacity {}",
            $head,
            $tail,
            $count,
            $capacity
        )
    };
}

// =============================================================================
// Cursor Matching
// =============================================================================

/// Assert that an end call releases the slot its begin call reserved.
///
/// **Invariant**: `end_*` releases exactly the cursor recorded by `begin_*`
///
/// Used in: `finish_fill()` / `finish_drain()`
macro_rules! debug_assert_cursor_matches {
    ($side:literal, $recorded:expr, $released:expr) => {
        debug_assert!(
            $recorded == $released,
            "cursor mismatch: {} cursor was {} but slot {} was released",
            $side,
            $recorded,
            $released
        )
    };
}

// =============================================================================
// Re-exports for crate-internal use
// =============================================================================

pub(crate) use debug_assert_bounded_count;
pub(crate) use debug_assert_cursor_matches;
pub(crate) use debug_assert_index_in_range;
pub(crate) use debug_assert_positions_consistent;
