/*!
 * Adaptive Spin-Wait Slot with Exponential Backoff
 *
 * Optimized for producers that post in rapid succession, where a waiter
 * usually finds the next pulse within microseconds.
 *
 * # Design: Spin, Then Park
 *
 * 1. **Tight spin phase**: `spin_loop()` hint between take attempts
 * 2. **Yield phase**: `yield_now()` between take attempts
 * 3. **Backoff phase**: exponentially increasing sleeps, capped
 *
 * The waiter registers with the inner futex slot before its first spin, so
 * a post made while it spins is handed to it exactly as if it were parked.
 * Once the spin budget is spent it parks on that slot, still registered.
 */

use super::futex::FutexSlot;
use super::traits::{PostResult, SignalSlot};
use crate::core::limits::{
    DEFAULT_MAX_SPINS, DEFAULT_SPIN_DURATION, MAX_SPIN_BACKOFF_NANOS, SPIN_HINT_ITERATIONS,
    SPIN_YIELD_ITERATIONS,
};
use std::thread;
use std::time::{Duration, Instant};

/// Adaptive spin-wait slot
///
/// # Use Cases
///
/// Best when:
/// - Pulses typically arrive within ~100µs of a waiter arriving
/// - Wake latency matters more than idle CPU
pub struct SpinSlot {
    /// Owns the pending flag and the parking fallback
    inner: FutexSlot,
    /// Spin duration before parking
    spin_duration: Duration,
    /// Maximum spin iterations before parking
    max_spins: u32,
}

impl SpinSlot {
    /// Create an empty slot with the given spin budget
    pub fn new(spin_duration: Duration, max_spins: u32) -> Self {
        Self {
            inner: FutexSlot::new(),
            spin_duration,
            max_spins,
        }
    }

    /// Create with default spin budget
    pub fn with_defaults() -> Self {
        Self::new(DEFAULT_SPIN_DURATION, DEFAULT_MAX_SPINS)
    }

    /// Spin trying to claim a pulse as a registered waiter
    ///
    /// Returns `Some(taken)` once the wait is settled (claimed, or deadline
    /// passed), `None` when the spin budget ran out first.
    fn spin(&self, deadline: Option<Instant>) -> Option<bool> {
        let start = Instant::now();
        let mut spin_count = 0u32;
        let mut backoff_ns = 1u64;

        loop {
            if self.inner.claim() {
                return Some(true);
            }

            let now = Instant::now();
            if deadline.is_some_and(|d| now >= d) {
                return Some(self.inner.leave());
            }
            if now.duration_since(start) >= self.spin_duration || spin_count >= self.max_spins {
                return None;
            }

            if spin_count < SPIN_HINT_ITERATIONS {
                std::hint::spin_loop();
            } else if spin_count < SPIN_YIELD_ITERATIONS {
                thread::yield_now();
            } else {
                thread::sleep(Duration::from_nanos(backoff_ns));
                backoff_ns = (backoff_ns * 2).min(MAX_SPIN_BACKOFF_NANOS);
            }

            spin_count += 1;
        }
    }
}

impl Default for SpinSlot {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl SignalSlot for SpinSlot {
    #[inline]
    fn post(&self) -> PostResult {
        self.inner.post()
    }

    #[inline]
    fn try_take(&self) -> bool {
        self.inner.try_take()
    }

    fn wait(&self, deadline: Option<Instant>) -> bool {
        if self.inner.try_take() {
            return true;
        }

        self.inner.register();
        match self.spin(deadline) {
            Some(taken) => taken,
            None => self.inner.park_registered(deadline),
        }
    }

    #[inline]
    fn is_pending(&self) -> bool {
        self.inner.is_pending()
    }

    fn waiter_count(&self) -> usize {
        self.inner.waiter_count()
    }

    fn name(&self) -> &'static str {
        "spinwait"
    }
}
