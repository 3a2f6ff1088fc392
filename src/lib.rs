/*!
 * Notifier Library
 * Coalescing "something changed" signal for threads and async tasks
 *
 * ```
 * use std::thread;
 *
 * let (notify, waiter) = notifier::new();
 *
 * let producer = thread::spawn(move || {
 *     for _ in 0..10 {
 *         notify.notify();
 *     }
 * });
 * producer.join().unwrap();
 *
 * // Ten notifies with nobody waiting collapse into one pulse
 * waiter.wait();
 * assert!(!waiter.try_wait());
 * ```
 */

pub mod core;
pub mod monitoring;

// Re-exports
pub use crate::core::sync::{
    new, with_config, Notifier, NotifierConfig, Notify, PostResult, StrategyType, WaitError,
    WaitResult, Waiter,
};
pub use monitoring::init_tracing;
