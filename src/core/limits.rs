/*!
 * Limits and Constants
 *
 * Centralized location for the tuning knobs of the notification slots.
 *
 * ## Conventions
 * - Performance-critical constants are marked with [PERF]
 * - Values that shape observable test timing are marked with [TIMING]
 */

use std::time::Duration;

// =============================================================================
// SPIN / BACKOFF TUNING
// =============================================================================

/// Default spin budget before a spinning waiter parks (10 microseconds)
pub const DEFAULT_SPIN_DURATION: Duration = Duration::from_micros(10);

/// Default maximum spin iterations before parking
pub const DEFAULT_MAX_SPINS: u32 = 100;

/// Low-latency spin budget (50 microseconds)
/// [PERF] Trades CPU for wake latency when pulses arrive in quick succession
pub const LOW_LATENCY_SPIN_DURATION: Duration = Duration::from_micros(50);

/// Low-latency maximum spin iterations
pub const LOW_LATENCY_MAX_SPINS: u32 = 500;

/// Long-wait spin budget (1 microsecond)
pub const LONG_WAIT_SPIN_DURATION: Duration = Duration::from_micros(1);

/// Long-wait maximum spin iterations
pub const LONG_WAIT_MAX_SPINS: u32 = 10;

/// Iterations of pure `spin_loop()` hints before yielding
/// [PERF] Best for sub-100ns hand-offs
pub const SPIN_HINT_ITERATIONS: u32 = 10;

/// Iterations of `yield_now()` before backing off with sleeps
pub const SPIN_YIELD_ITERATIONS: u32 = 50;

/// Backoff sleep cap during the last spin phase (1ms)
pub const MAX_SPIN_BACKOFF_NANOS: u64 = 1_000_000;

// =============================================================================
// ENVIRONMENT
// =============================================================================

/// Environment variable selecting the slot strategy
pub const STRATEGY_ENV_VAR: &str = "NOTIFIER_STRATEGY";

/// Environment variable switching tracing output to JSON
pub const TRACE_JSON_ENV_VAR: &str = "NOTIFIER_TRACE_JSON";
