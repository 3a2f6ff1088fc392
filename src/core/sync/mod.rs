/*!
 * Synchronization Primitives
 *
 * A coalescing notification primitive: a capacity-1 signal slot that any
 * number of producers can pulse without blocking and any number of
 * consumers can wait on.
 *
 * # Architecture
 *
 * - `SignalSlot` is the backend contract (post / take / wait)
 * - Three backends: futex-style parking, mutex + condvar, adaptive spin
 * - `Slot` picks a backend from `NotifierConfig` via enum dispatch
 * - `Notifier` / `Notify` / `Waiter` are the public handles, adding
 *   async waiting on top of the slot
 *
 * # Semantics
 *
 * - At most one pulse is ever pending; posts with nobody waiting merge
 * - A post that finds a waiter already suspended hands the pulse to it
 * - Posting never blocks; waiting is the only suspension point
 */

mod condvar;
mod config;
mod futex;
mod notifier;
mod slot;
mod spinwait;
mod traits;

pub use config::{NotifierConfig, ParseStrategyError, StrategyType};
pub use notifier::{new, with_config, Notifier, Notify, Waiter};
pub use slot::{Slot, WaitError, WaitResult};
pub use traits::{PostResult, SignalSlot};

// Re-export specific backends for advanced users
pub use condvar::CondvarSlot;
pub use futex::FutexSlot;
pub use spinwait::SpinSlot;
