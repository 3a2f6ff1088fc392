/*!
 * Notifier Integration Tests
 *
 * Coalescing, hand-off and wake-up guarantees, run against every backend
 */

use notifier::core::sync::{NotifierConfig, PostResult, StrategyType, WaitError};
use notifier::{Notifier, Waiter};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::mpsc;
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::{Duration, Instant};

/// Bound for "completes promptly"
const TICK: Duration = Duration::from_secs(1);
/// Bound for "does not complete"
const NO_TICK: Duration = Duration::from_millis(10);

fn all_configs() -> Vec<NotifierConfig> {
    vec![
        NotifierConfig::with_strategy(StrategyType::Futex),
        NotifierConfig::with_strategy(StrategyType::Condvar),
        NotifierConfig::with_strategy(StrategyType::SpinWait),
        NotifierConfig::low_latency(),
    ]
}

fn assert_tick(waiter: &Waiter, message: &str) {
    assert!(
        waiter.wait_timeout(TICK).is_ok(),
        "notifier did not update ({}, {})",
        message,
        waiter.strategy_name()
    );
}

fn assert_no_tick(waiter: &Waiter, message: &str) {
    assert!(
        matches!(waiter.wait_timeout(NO_TICK), Err(WaitError::Timeout { .. })),
        "notifier updated ({}, {})",
        message,
        waiter.strategy_name()
    );
}

/// Wait until `count` waiters are inside a wait call
///
/// No settling delay: a counted waiter may still be spinning or on its way
/// to parking, and must be released all the same.
fn await_waiting(waiter: &Waiter, count: usize) {
    let deadline = Instant::now() + Duration::from_secs(2);
    while waiter.waiter_count() < count {
        assert!(
            Instant::now() < deadline,
            "waiters never arrived ({})",
            waiter.strategy_name()
        );
        thread::yield_now();
    }
}

/// Block `count` threads in `wait`, notify once per thread, expect all released
fn assert_each_notify_releases_a_waiter(config: NotifierConfig, count: usize) {
    let (notify, waiter) = notifier::with_config(config);
    let (done_tx, done_rx) = mpsc::channel();

    let handles: Vec<_> = (0..count)
        .map(|_| {
            let waiter = waiter.clone();
            let done_tx = done_tx.clone();
            thread::spawn(move || {
                waiter.wait();
                done_tx.send(()).ok();
            })
        })
        .collect();

    await_waiting(&waiter, count);

    // Each notify finds a waiter not yet served, so none are merged
    let results: Vec<_> = (0..count).map(|_| notify.notify()).collect();
    assert_eq!(results, vec![PostResult::Posted; count], "{}", waiter.strategy_name());

    for _ in 0..count {
        done_rx.recv_timeout(TICK).unwrap_or_else(|_| {
            panic!("waits did not complete ({})", waiter.strategy_name())
        });
    }
    for handle in handles {
        handle.join().unwrap();
    }
    assert!(!waiter.is_pending());
    assert_eq!(waiter.waiter_count(), 0);
}

#[test]
fn test_simple_notify() {
    for config in all_configs() {
        let (notify, waiter) = notifier::with_config(config);

        notify.notify();
        assert_tick(&waiter, "when notified");
        assert_no_tick(&waiter, "when not notified");
    }
}

#[test]
fn test_multiple_notify_merged() {
    for config in all_configs() {
        let (notify, waiter) = notifier::with_config(config);

        assert_eq!(notify.notify(), PostResult::Posted);
        for _ in 1..5 {
            assert_eq!(notify.notify(), PostResult::Merged);
        }

        assert_tick(&waiter, "when notified");
        assert_no_tick(&waiter, "multiple notifications are merged");
    }
}

#[test]
fn test_notify_with_waiting() {
    for config in all_configs() {
        assert_each_notify_releases_a_waiter(config, 5);
    }
}

#[test]
fn test_notify_with_waiters_still_spinning() {
    let config = NotifierConfig {
        strategy: StrategyType::SpinWait,
        spin_duration: Duration::from_millis(500),
        max_spins: u32::MAX,
    };

    // Notifies land well inside every waiter's spin budget
    assert_each_notify_releases_a_waiter(config, 3);
}

#[test]
fn test_notify_with_waiting_stress() {
    for strategy in [StrategyType::Futex, StrategyType::Condvar] {
        for _ in 0..200 {
            assert_each_notify_releases_a_waiter(NotifierConfig::with_strategy(strategy), 4);
        }
    }
}

#[test]
fn test_wait_after_notify_returns_immediately() {
    for config in all_configs() {
        let (notify, waiter) = notifier::with_config(config);
        notify.notify();

        // Already notified, wait should return immediately
        let (done_tx, done_rx) = mpsc::channel();
        let waiter_clone = waiter.clone();
        thread::spawn(move || {
            waiter_clone.wait();
            done_tx.send(()).ok();
        });

        done_rx.recv_timeout(TICK).expect("wait did not complete");
        assert!(!waiter.is_pending());
    }
}

#[test]
fn test_no_spurious_wake() {
    for config in all_configs() {
        let (_notify, waiter) = notifier::with_config(config);

        let start = Instant::now();
        let result = waiter.wait_timeout(Duration::from_millis(100));

        assert!(matches!(result, Err(WaitError::Timeout { .. })));
        assert!(start.elapsed() >= Duration::from_millis(100));
        assert!(!waiter.is_pending());
    }
}

#[test]
fn test_concurrent_notify_leaves_one_pulse() {
    const NOTIFIERS: usize = 8;

    for config in all_configs() {
        let (notify, waiter) = notifier::with_config(config);
        let barrier = Arc::new(Barrier::new(NOTIFIERS));

        let handles: Vec<_> = (0..NOTIFIERS)
            .map(|_| {
                let notify = notify.clone();
                let barrier = barrier.clone();
                thread::spawn(move || {
                    barrier.wait();
                    notify.notify()
                })
            })
            .collect();

        let posted = handles
            .into_iter()
            .map(|handle| handle.join().unwrap())
            .filter(PostResult::is_posted)
            .count();

        assert_eq!(posted, 1, "exactly one racing notify lands");
        assert!(waiter.try_wait());
        assert!(!waiter.try_wait());
    }
}

#[test]
fn test_interleaved_notify_wait_observes_every_notify() {
    for config in all_configs() {
        let notifier = Notifier::with_config(config);

        for _ in 0..100 {
            assert_eq!(notifier.notify(), PostResult::Posted);
            assert!(notifier.wait_timeout(TICK).is_ok());
        }
        assert!(!notifier.try_wait());
    }
}

#[test]
fn test_timed_out_wait_leaves_slot_untouched() {
    for config in all_configs() {
        let (notify, waiter) = notifier::with_config(config);

        assert!(waiter.wait_timeout(NO_TICK).is_err());
        notify.notify();
        assert!(waiter.is_pending());

        // A wait abandoned by a caller-side deadline never ran, so the
        // pulse is still there for the next waiter
        assert!(waiter.wait_deadline(Instant::now()).is_ok());
        assert!(!waiter.is_pending());
    }
}

#[test]
fn test_strategy_auto_selection() {
    let waiter = Notifier::new().waiter();

    #[cfg(target_os = "linux")]
    assert_eq!(waiter.strategy_name(), "futex");

    #[cfg(not(target_os = "linux"))]
    assert_eq!(waiter.strategy_name(), "condvar");
}

#[test]
fn test_waiter_count() {
    for config in all_configs() {
        let notifier = Notifier::with_config(config);

        let handles: Vec<_> = (0..3)
            .map(|_| {
                let waiter = notifier.waiter();
                thread::spawn(move || waiter.wait_timeout(Duration::from_secs(2)))
            })
            .collect();

        await_waiting(&notifier.waiter(), 3);
        assert_eq!(notifier.waiter().waiter_count(), 3);

        for _ in 0..3 {
            notifier.notify();
        }
        for handle in handles {
            assert!(handle.join().unwrap().is_ok());
        }
        assert_eq!(notifier.waiter().waiter_count(), 0);
    }
}

#[test]
fn test_high_frequency_notify_never_loses_last_change() {
    for config in all_configs() {
        let notifier = Notifier::with_config(config);
        let generation = Arc::new(AtomicU64::new(0));
        let done = Arc::new(AtomicBool::new(false));

        let consumer = {
            let waiter = notifier.waiter();
            let generation = generation.clone();
            let done = done.clone();
            thread::spawn(move || {
                let mut wakes = 0u64;
                loop {
                    waiter.wait();
                    wakes += 1;
                    if done.load(Ordering::Acquire) {
                        return (wakes, generation.load(Ordering::Acquire));
                    }
                }
            })
        };

        let producers: Vec<_> = (0..4)
            .map(|_| {
                let notify = notifier.notify_handle();
                let generation = generation.clone();
                thread::spawn(move || {
                    for _ in 0..1000 {
                        generation.fetch_add(1, Ordering::Release);
                        notify.notify();
                    }
                })
            })
            .collect();

        for producer in producers {
            producer.join().unwrap();
        }

        done.store(true, Ordering::Release);
        notifier.notify();

        let (wakes, seen) = consumer.join().unwrap();
        assert_eq!(seen, 4000, "final state observed after the last notify");
        assert!(wakes >= 1 && wakes <= 4001);
    }
}

#[test]
fn test_handles_work_after_notifier_dropped() {
    let (notify, waiter) = {
        let notifier = Notifier::with_config(NotifierConfig::default());
        (notifier.notify_handle(), notifier.waiter())
    };

    let handle = thread::spawn(move || notify.notify());
    assert!(handle.join().unwrap().is_posted());
    assert_tick(&waiter, "handles keep the slot alive");
}
