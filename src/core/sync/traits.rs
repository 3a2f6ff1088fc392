/*!
 * Slot Traits
 *
 * Core abstraction for a capacity-1 coalescing signal slot.
 *
 * # Design: Trait-Based Abstraction for Backends
 *
 * `Slot` uses enum dispatch on the hot path, but every backend implements
 * this trait so they can be tested and benchmarked on equal footing. All
 * methods are small and expected to inline.
 */

use std::time::Instant;

/// Outcome of posting a pulse into a slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostResult {
    /// The slot was empty and now holds a pending pulse
    Posted,
    /// A pulse was already pending; this post was merged into it
    Merged,
}

impl PostResult {
    /// Check whether this post changed the slot from empty to pending
    #[inline(always)]
    pub fn is_posted(&self) -> bool {
        matches!(self, PostResult::Posted)
    }

    /// Check whether this post was collapsed into an existing pulse
    #[inline(always)]
    pub fn is_merged(&self) -> bool {
        matches!(self, PostResult::Merged)
    }
}

/// A single-slot signal holding at most one pending pulse
///
/// Implementations must be:
/// - **Thread-safe**: `post`, `try_take` and `wait` may race from any number of threads
/// - **Non-blocking on post**: posting never parks the caller
/// - **Exactly-once on take**: a pending pulse is consumed by exactly one taker
///
/// No ordering between waiters is promised.
pub trait SignalSlot: Send + Sync {
    /// Place a pulse into the slot, merging with a pending one if present
    ///
    /// Wakes at most one parked waiter when the slot transitions to pending.
    fn post(&self) -> PostResult;

    /// Consume the pending pulse without blocking
    ///
    /// Returns `true` if a pulse was consumed.
    fn try_take(&self) -> bool;

    /// Block until a pulse is consumed or the deadline passes
    ///
    /// Returns `true` if a pulse was consumed, `false` on deadline. A wait
    /// that reaches its deadline leaves the slot untouched.
    fn wait(&self, deadline: Option<Instant>) -> bool;

    /// Check whether a pulse is pending (racy snapshot, for diagnostics)
    fn is_pending(&self) -> bool;

    /// Approximate number of parked waiters (for diagnostics)
    fn waiter_count(&self) -> usize {
        0 // Default: unknown
    }

    /// Backend name for debugging
    fn name(&self) -> &'static str;
}
