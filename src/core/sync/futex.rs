/*!
 * Futex-Based Slot
 *
 * Uses parking_lot_core for futex-like parking on the address of the
 * slot state. On Linux this maps onto the parking lot's futex backend.
 *
 * # Design
 *
 * All bookkeeping lives in one atomic word:
 *
 * - bit 0: the pending pulse
 * - bits 1..32: waiters registered inside `wait` (spinning, about to park,
 *   or parked)
 * - bits 32..64: hand-offs, pulses owed to registered waiters but not yet
 *   claimed (never more than the number of waiters)
 *
 * A post that finds more waiters than hand-offs credits one of them instead
 * of setting the pending bit, so K posts release K registered waiters no
 * matter how far each one got towards parking. Waiters only park after
 * re-validating the word under the parking lot's bucket lock, so a credit
 * racing with a park cannot be lost.
 */

use super::traits::{PostResult, SignalSlot};
use parking_lot_core::{
    park, unpark_one, ParkResult, DEFAULT_PARK_TOKEN, DEFAULT_UNPARK_TOKEN,
};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

const PENDING: u64 = 1;
const WAITER_UNIT: u64 = 1 << 1;
const WAITER_MASK: u64 = 0x7fff_ffff;
const HANDOFF_SHIFT: u32 = 32;
const HANDOFF_UNIT: u64 = 1 << HANDOFF_SHIFT;

#[inline(always)]
fn waiters(state: u64) -> u64 {
    (state >> 1) & WAITER_MASK
}

#[inline(always)]
fn handoffs(state: u64) -> u64 {
    state >> HANDOFF_SHIFT
}

/// State after a registered waiter consumes a credit or the pending pulse
#[inline(always)]
fn claimed(state: u64) -> Option<u64> {
    if handoffs(state) > 0 {
        Some(state - HANDOFF_UNIT - WAITER_UNIT)
    } else if state & PENDING != 0 {
        Some((state & !PENDING) - WAITER_UNIT)
    } else {
        None
    }
}

/// Futex-based coalescing slot
///
/// # Performance
///
/// - Zero allocations
/// - Uncontended post and take are one compare-exchange each
/// - Posters only touch the parking lot when a waiter is registered
#[repr(C, align(64))]
pub struct FutexSlot {
    state: AtomicU64,
}

impl FutexSlot {
    /// Create an empty slot
    pub const fn new() -> Self {
        Self {
            state: AtomicU64::new(0),
        }
    }

    /// Stable parking address shared by posters and waiters
    #[inline(always)]
    fn park_addr(&self) -> usize {
        &self.state as *const AtomicU64 as usize
    }

    /// Count the caller as a waiter; posts from now on hand off to it
    ///
    /// Must be balanced by a successful [`claim`](Self::claim) or by
    /// [`leave`](Self::leave).
    #[inline]
    pub(super) fn register(&self) {
        self.state.fetch_add(WAITER_UNIT, Ordering::AcqRel);
    }

    /// Consume a credit or the pending pulse, deregistering on success
    #[inline]
    pub(super) fn claim(&self) -> bool {
        let mut state = self.state.load(Ordering::Acquire);
        loop {
            let Some(next) = claimed(state) else {
                return false;
            };
            match self
                .state
                .compare_exchange_weak(state, next, Ordering::AcqRel, Ordering::Acquire)
            {
                Ok(_) => return true,
                Err(actual) => state = actual,
            }
        }
    }

    /// Deregister after giving up
    ///
    /// A pulse owed to the caller cannot be left behind, so one is still
    /// claimed if available; returns whether that happened.
    pub(super) fn leave(&self) -> bool {
        let mut state = self.state.load(Ordering::Acquire);
        loop {
            let (next, taken) = match claimed(state) {
                Some(next) => (next, true),
                None => (state - WAITER_UNIT, false),
            };
            match self
                .state
                .compare_exchange_weak(state, next, Ordering::AcqRel, Ordering::Acquire)
            {
                Ok(_) => return taken,
                Err(actual) => state = actual,
            }
        }
    }

    /// Park a registered waiter until it claims a pulse or `deadline` passes
    pub(super) fn park_registered(&self, deadline: Option<Instant>) -> bool {
        loop {
            if self.claim() {
                return true;
            }

            // SAFETY: the address belongs to `self`; the callbacks only read
            // an atomic and never call back into the parking lot
            let result = unsafe {
                park(
                    self.park_addr(),
                    || claimed(self.state.load(Ordering::Acquire)).is_none(),
                    || {},
                    |_, _| {},
                    DEFAULT_PARK_TOKEN,
                    deadline,
                )
            };

            // A pulse may have landed right at the deadline
            if let ParkResult::TimedOut = result {
                return self.leave();
            }
        }
    }
}

impl Default for FutexSlot {
    fn default() -> Self {
        Self::new()
    }
}

impl SignalSlot for FutexSlot {
    fn post(&self) -> PostResult {
        let mut state = self.state.load(Ordering::Acquire);
        loop {
            let (next, handoff) = if waiters(state) > handoffs(state) {
                (state + HANDOFF_UNIT, true)
            } else if state & PENDING != 0 {
                return PostResult::Merged;
            } else {
                (state | PENDING, false)
            };

            match self
                .state
                .compare_exchange_weak(state, next, Ordering::AcqRel, Ordering::Acquire)
            {
                Ok(_) if handoff => break,
                Ok(_) => return PostResult::Posted,
                Err(actual) => state = actual,
            }
        }

        // The credit is already visible to waiters that have not parked yet;
        // wake one that has, if any
        // SAFETY: the address belongs to `self`, which outlives this call,
        // and the callback does not touch the parking lot
        unsafe {
            unpark_one(self.park_addr(), |_| DEFAULT_UNPARK_TOKEN);
        }
        PostResult::Posted
    }

    #[inline]
    fn try_take(&self) -> bool {
        self.state.fetch_and(!PENDING, Ordering::AcqRel) & PENDING != 0
    }

    fn wait(&self, deadline: Option<Instant>) -> bool {
        // Fast path: pulse already pending
        if self.try_take() {
            return true;
        }

        self.register();
        self.park_registered(deadline)
    }

    #[inline]
    fn is_pending(&self) -> bool {
        self.state.load(Ordering::Acquire) & PENDING != 0
    }

    fn waiter_count(&self) -> usize {
        waiters(self.state.load(Ordering::Relaxed)) as usize
    }

    fn name(&self) -> &'static str {
        "futex"
    }
}
