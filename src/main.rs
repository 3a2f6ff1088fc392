/*!
 * Notifier Demo
 *
 * Watcher threads mutate shared state and notify in bursts; an async
 * re-render loop re-reads the state once per pulse. The log at the end
 * shows how many notifies collapsed into how many re-renders.
 *
 * Environment variables:
 * - NOTIFIER_STRATEGY: futex | condvar | spinwait | auto
 * - NOTIFIER_DEMO_PRODUCERS: watcher threads (default: 4)
 * - NOTIFIER_DEMO_BURST: notifies per burst (default: 8)
 * - NOTIFIER_DEMO_ROUNDS: bursts per watcher (default: 50)
 */

use std::error::Error;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{debug, info, warn};

use notifier::{init_tracing, Notifier, NotifierConfig};

fn env_or(name: &str, default: usize) -> usize {
    match std::env::var(name) {
        Ok(value) => value.parse().unwrap_or_else(|e| {
            warn!(var = name, value = %value, error = %e, "Invalid value, using default");
            default
        }),
        Err(_) => default,
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    init_tracing();

    let producers = env_or("NOTIFIER_DEMO_PRODUCERS", 4);
    let burst = env_or("NOTIFIER_DEMO_BURST", 8);
    let rounds = env_or("NOTIFIER_DEMO_ROUNDS", 50);

    let notifier = Notifier::with_config(NotifierConfig::from_env());
    info!(
        strategy = notifier.waiter().strategy_name(),
        producers, burst, rounds, "Notifier demo starting"
    );

    let generation = Arc::new(AtomicU64::new(0));
    let fired = Arc::new(AtomicU64::new(0));
    let done = Arc::new(AtomicBool::new(false));

    // Re-render loop: one re-read of shared state per pulse
    let renderer = {
        let waiter = notifier.waiter();
        let generation = generation.clone();
        let done = done.clone();

        tokio::spawn(async move {
            let mut renders = 0u64;
            let mut last_seen = 0u64;

            loop {
                waiter.wait_async().await;

                let finished = done.load(Ordering::Acquire);
                let current = generation.load(Ordering::Acquire);
                renders += 1;

                if current > last_seen {
                    debug!(generation = current, coalesced = current - last_seen, "Re-render");
                }
                last_seen = current;

                if finished {
                    break;
                }
            }

            (renders, last_seen)
        })
    };

    // Watchers: mutate, then notify without caring whether a pulse is pending
    let watchers = (0..producers)
        .map(|id| {
            let notify = notifier.notify_handle();
            let generation = generation.clone();
            let fired = fired.clone();

            thread::Builder::new()
                .name(format!("watcher-{}", id))
                .spawn(move || {
                    for _ in 0..rounds {
                        for _ in 0..burst {
                            generation.fetch_add(1, Ordering::Release);
                            notify.notify();
                            fired.fetch_add(1, Ordering::Relaxed);
                        }
                        thread::sleep(Duration::from_millis(1));
                    }
                })
        })
        .collect::<Result<Vec<_>, _>>()?;

    for watcher in watchers {
        watcher.join().map_err(|_| "watcher thread panicked")?;
    }

    done.store(true, Ordering::Release);
    notifier.notify();

    let (renders, final_generation) = renderer.await?;
    info!(
        notifies = fired.load(Ordering::Relaxed),
        renders, final_generation, "Notifier demo finished"
    );

    Ok(())
}
