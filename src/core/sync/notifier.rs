/*!
 * Coalescing Notifier
 *
 * A single-slot "something changed" signal. Any number of producers call
 * `notify()` without ever blocking; any number of consumers wait for the
 * next pulse. A burst of notifies with nobody waiting collapses into one
 * pending pulse, while notifies that find consumers already waiting are
 * handed to them one each.
 *
 * # Handles
 *
 * `new()` returns a [`Notify`] and a [`Waiter`] bound to one shared slot,
 * mirroring the "notify function + receive handle" shape. [`Notifier`] bundles
 * both for callers that prefer a single object. All handles are cheap to
 * clone; the slot lives until the last handle is dropped.
 *
 * # Blocking and Async Waiters
 *
 * Blocking waiters park on the slot backend. Async waiters register here and
 * are woken through a `tokio::sync::Notify`. A notify that finds an async
 * waiter registered with no pulse owed to it hands that waiter a credit
 * instead of touching the slot, so async consumers get the same hand-off
 * behaviour as parked threads. Each pulse is consumed by exactly one waiter
 * of either kind. No fairness between waiters is promised.
 */

use super::config::NotifierConfig;
use super::slot::{Slot, WaitResult};
use super::traits::{PostResult, SignalSlot};
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

/// Bookkeeping for async waiters
#[derive(Debug, Default)]
struct AsyncWaiters {
    /// Async waiters currently registered
    registered: usize,
    /// Pulses handed to registered waiters but not yet claimed (`<= registered`)
    credits: usize,
}

struct Shared {
    slot: Slot,
    async_waiters: Mutex<AsyncWaiters>,
    async_wake: tokio::sync::Notify,
}

impl Shared {
    fn new(config: &NotifierConfig) -> Self {
        let slot = Slot::new(config);
        debug!(strategy = slot.name(), "Notifier created");

        Self {
            slot,
            async_waiters: Mutex::new(AsyncWaiters::default()),
            async_wake: tokio::sync::Notify::new(),
        }
    }

    fn notify(&self) -> PostResult {
        {
            let mut waiters = self.async_waiters.lock();
            if waiters.registered > waiters.credits {
                waiters.credits += 1;
                drop(waiters);
                self.async_wake.notify_one();
                return PostResult::Posted;
            }
        }

        self.post_to_slot()
    }

    /// Post into the slot, nudging async waiters so they re-check it
    fn post_to_slot(&self) -> PostResult {
        let result = self.slot.post();

        // A waiter registering after this check sees the pulse on its own
        // re-check, since registration and the check share the lock
        if result.is_posted() && self.async_waiters.lock().registered > 0 {
            self.async_wake.notify_one();
        }

        result
    }

    async fn wait_async(&self) {
        if self.slot.try_take() {
            return;
        }

        let mut registration = Registration::new(self);

        loop {
            let notified = self.async_wake.notified();
            tokio::pin!(notified);

            // Enable before checking so a wake between check and await is kept
            notified.as_mut().enable();

            if registration.claim() {
                return;
            }

            notified.await;
        }
    }
}

/// An async waiter's membership in the registered set
///
/// Dropping an unclaimed registration (a cancelled wait) gives back any
/// credit the set can no longer absorb, so an abandoned wait never
/// swallows a pulse.
struct Registration<'a> {
    shared: &'a Shared,
    active: bool,
}

impl<'a> Registration<'a> {
    fn new(shared: &'a Shared) -> Self {
        shared.async_waiters.lock().registered += 1;
        Self {
            shared,
            active: true,
        }
    }

    /// Claim a credit or the slot's pending pulse
    fn claim(&mut self) -> bool {
        let mut waiters = self.shared.async_waiters.lock();

        let claimed = if waiters.credits > 0 {
            waiters.credits -= 1;
            true
        } else {
            self.shared.slot.try_take()
        };

        if claimed {
            waiters.registered -= 1;
            self.active = false;
        }
        claimed
    }
}

impl Drop for Registration<'_> {
    fn drop(&mut self) {
        if !self.active {
            return;
        }

        let surplus = {
            let mut waiters = self.shared.async_waiters.lock();
            waiters.registered -= 1;
            if waiters.credits > waiters.registered {
                waiters.credits -= 1;
                true
            } else {
                false
            }
        };

        if surplus {
            self.shared.post_to_slot();
        }
    }
}

/// Create a notifier with the default configuration
///
/// # Examples
///
/// ```
/// let (notify, waiter) = notifier::new();
///
/// notify.notify();
/// notify.notify(); // merged with the pending pulse
///
/// waiter.wait(); // returns immediately
/// assert!(!waiter.try_wait());
/// ```
pub fn new() -> (Notify, Waiter) {
    with_config(NotifierConfig::default())
}

/// Create a notifier with a specific configuration
pub fn with_config(config: NotifierConfig) -> (Notify, Waiter) {
    Notifier::with_config(config).split()
}

/// The notify capability
///
/// Callable from any number of threads at once; never blocks.
#[derive(Clone)]
pub struct Notify {
    shared: Arc<Shared>,
}

impl Notify {
    /// Announce that something changed
    ///
    /// Returns whether the pulse was delivered (`Posted`) or collapsed into an
    /// already pending one (`Merged`). Callers are free to ignore it.
    #[inline]
    pub fn notify(&self) -> PostResult {
        self.shared.notify()
    }
}

impl fmt::Debug for Notify {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Notify")
            .field("strategy", &self.shared.slot.name())
            .finish()
    }
}

/// The wait capability
///
/// Every method consumes at most one pulse. Any number of threads and tasks
/// may wait at once; which of them is released first is unspecified.
#[derive(Clone)]
pub struct Waiter {
    shared: Arc<Shared>,
}

impl Waiter {
    /// Block the current thread until a pulse is consumed
    ///
    /// Do not call from inside an async task; use [`Waiter::wait_async`].
    #[inline]
    pub fn wait(&self) {
        self.shared.slot.wait(None);
    }

    /// Consume a pending pulse without blocking
    #[inline]
    pub fn try_wait(&self) -> bool {
        self.shared.slot.try_take()
    }

    /// Block until a pulse is consumed or `timeout` elapses
    ///
    /// A timed-out wait consumes nothing.
    pub fn wait_timeout(&self, timeout: Duration) -> WaitResult<()> {
        self.shared.slot.wait_timeout(timeout)
    }

    /// Block until a pulse is consumed or `deadline` passes
    pub fn wait_deadline(&self, deadline: Instant) -> WaitResult<()> {
        self.shared.slot.wait_deadline(deadline)
    }

    /// Wait for a pulse without blocking the runtime
    ///
    /// Cancel-safe: dropping the future before it completes leaves the slot
    /// as it was, so racing it against a timer loses nothing.
    ///
    /// # Examples
    ///
    /// ```
    /// # #[tokio::main(flavor = "current_thread")]
    /// # async fn main() {
    /// use std::time::Duration;
    ///
    /// let (notify, waiter) = notifier::new();
    /// notify.notify();
    ///
    /// tokio::time::timeout(Duration::from_secs(1), waiter.wait_async())
    ///     .await
    ///     .expect("pulse was pending");
    /// # }
    /// ```
    pub async fn wait_async(&self) {
        self.shared.wait_async().await
    }

    /// Check whether a pulse is pending (racy snapshot)
    #[inline]
    pub fn is_pending(&self) -> bool {
        self.shared.slot.is_pending()
    }

    /// Approximate number of waiters currently suspended
    pub fn waiter_count(&self) -> usize {
        self.shared.slot.waiter_count() + self.shared.async_waiters.lock().registered
    }

    /// Name of the slot backend in use
    pub fn strategy_name(&self) -> &'static str {
        self.shared.slot.name()
    }
}

impl fmt::Debug for Waiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Waiter")
            .field("strategy", &self.shared.slot.name())
            .field("pending", &self.is_pending())
            .finish()
    }
}

/// Both capabilities in one object
///
/// Clones share the same slot.
#[derive(Clone, Debug)]
pub struct Notifier {
    notify: Notify,
    waiter: Waiter,
}

impl Notifier {
    /// Create with default configuration (auto-selects best strategy)
    pub fn new() -> Self {
        Self::with_config(NotifierConfig::default())
    }

    /// Create with a specific configuration
    pub fn with_config(config: NotifierConfig) -> Self {
        let shared = Arc::new(Shared::new(&config));
        Self {
            notify: Notify {
                shared: shared.clone(),
            },
            waiter: Waiter { shared },
        }
    }

    /// Announce that something changed
    #[inline]
    pub fn notify(&self) -> PostResult {
        self.notify.notify()
    }

    /// Block the current thread until a pulse is consumed
    #[inline]
    pub fn wait(&self) {
        self.waiter.wait()
    }

    /// Consume a pending pulse without blocking
    #[inline]
    pub fn try_wait(&self) -> bool {
        self.waiter.try_wait()
    }

    /// Block until a pulse is consumed or `timeout` elapses
    pub fn wait_timeout(&self, timeout: Duration) -> WaitResult<()> {
        self.waiter.wait_timeout(timeout)
    }

    /// Wait for a pulse without blocking the runtime
    pub async fn wait_async(&self) {
        self.waiter.wait_async().await
    }

    /// A notify handle bound to this notifier's slot
    pub fn notify_handle(&self) -> Notify {
        self.notify.clone()
    }

    /// A wait handle bound to this notifier's slot
    pub fn waiter(&self) -> Waiter {
        self.waiter.clone()
    }

    /// Split into the two capabilities
    pub fn split(self) -> (Notify, Waiter) {
        (self.notify, self.waiter)
    }
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new()
    }
}
