/*!
 * Condvar-Based Slot
 *
 * Cross-platform backend using parking_lot::Mutex + parking_lot::Condvar.
 *
 * # Design: Direct Hand-off to Parked Waiters
 *
 * All state lives under one mutex. A post that finds a parked waiter with
 * no pulse already owed to it hands the pulse over directly (the slot stays
 * empty) and signals one waiter. Only when nobody is parked does the pulse
 * land in the slot, where further posts merge with it. This is what lets
 * K back-to-back posts release K parked waiters while a burst with nobody
 * waiting still collapses to one pulse.
 */

use super::traits::{PostResult, SignalSlot};
use parking_lot::{Condvar, Mutex};
use std::time::Instant;

#[derive(Debug, Default)]
struct SlotState {
    /// A pulse is waiting in the slot
    pending: bool,
    /// Waiters currently parked on the condvar
    parked: usize,
    /// Pulses handed to the parked set but not yet claimed (`<= parked`)
    handoffs: usize,
}

impl SlotState {
    /// Claim a handed-off or pending pulse
    #[inline]
    fn claim(&mut self) -> bool {
        if self.handoffs > 0 {
            self.handoffs -= 1;
            true
        } else {
            std::mem::replace(&mut self.pending, false)
        }
    }
}

/// Condvar-based coalescing slot
///
/// # Performance
///
/// - Works on all platforms
/// - One uncontended lock per post or take
/// - Fixed footprint, no allocation after construction
#[repr(C, align(64))] // Cache-line aligned to prevent false sharing
pub struct CondvarSlot {
    state: Mutex<SlotState>,
    condvar: Condvar,
}

impl CondvarSlot {
    /// Create an empty slot
    pub const fn new() -> Self {
        Self {
            state: Mutex::new(SlotState {
                pending: false,
                parked: 0,
                handoffs: 0,
            }),
            condvar: Condvar::new(),
        }
    }
}

impl Default for CondvarSlot {
    fn default() -> Self {
        Self::new()
    }
}

impl SignalSlot for CondvarSlot {
    fn post(&self) -> PostResult {
        {
            let mut state = self.state.lock();
            if state.parked > state.handoffs {
                state.handoffs += 1;
            } else if state.pending {
                return PostResult::Merged;
            } else {
                state.pending = true;
                return PostResult::Posted;
            }
        }

        // Only one waiter can consume the pulse, so wake only one
        self.condvar.notify_one();
        PostResult::Posted
    }

    #[inline]
    fn try_take(&self) -> bool {
        std::mem::replace(&mut self.state.lock().pending, false)
    }

    fn wait(&self, deadline: Option<Instant>) -> bool {
        let mut state = self.state.lock();

        // Fast path: pulse already pending
        if std::mem::replace(&mut state.pending, false) {
            return true;
        }

        state.parked += 1;

        let taken = loop {
            match deadline {
                Some(deadline) => {
                    if self.condvar.wait_until(&mut state, deadline).timed_out() {
                        // Leaving the parked set: take anything owed to it so
                        // `handoffs <= parked` keeps holding
                        break state.claim();
                    }
                }
                None => self.condvar.wait(&mut state),
            }

            if state.claim() {
                break true;
            }
            // Another waiter won the pulse; park again
        };

        state.parked -= 1;
        taken
    }

    #[inline]
    fn is_pending(&self) -> bool {
        self.state.lock().pending
    }

    fn waiter_count(&self) -> usize {
        self.state.lock().parked
    }

    fn name(&self) -> &'static str {
        "condvar"
    }
}
