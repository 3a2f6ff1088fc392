/*!
 * Slot
 *
 * Strategy-selected coalescing slot behind a single concrete type.
 *
 * # Design: Enum Dispatch for Zero-Cost Abstraction
 *
 * Instead of `Box<dyn SignalSlot>`, the backend is an enum so every post
 * and take is a direct, inlinable call.
 */

use super::condvar::CondvarSlot;
use super::config::{NotifierConfig, StrategyType};
use super::futex::FutexSlot;
use super::spinwait::SpinSlot;
use super::traits::{PostResult, SignalSlot};
use miette::Diagnostic;
use std::time::{Duration, Instant};
use thiserror::Error;

/// Result type for bounded wait operations
pub type WaitResult<T> = Result<T, WaitError>;

/// Bounded wait errors
///
/// Only the timeout helpers can fail; an unbounded wait never does.
#[derive(Error, Debug, Clone, PartialEq, Eq, Diagnostic)]
pub enum WaitError {
    #[error("Wait timed out after {elapsed_ms}ms")]
    #[diagnostic(
        code(notifier::wait_timeout),
        help("No pulse arrived before the deadline. The slot was left untouched.")
    )]
    Timeout { elapsed_ms: u64 },
}

/// Backend implementation (enum dispatch for zero overhead)
enum SlotBackend {
    Futex(FutexSlot),
    Condvar(CondvarSlot),
    SpinWait(SpinSlot),
}

/// Capacity-1 coalescing slot with a configurable backend
pub struct Slot {
    backend: SlotBackend,
}

impl Slot {
    /// Create an empty slot using the configured strategy
    pub fn new(config: &NotifierConfig) -> Self {
        let backend = match config.select_strategy() {
            StrategyType::Condvar => SlotBackend::Condvar(CondvarSlot::new()),
            StrategyType::SpinWait => {
                SlotBackend::SpinWait(SpinSlot::new(config.spin_duration, config.max_spins))
            }
            // Auto is resolved by select_strategy
            StrategyType::Futex | StrategyType::Auto => SlotBackend::Futex(FutexSlot::new()),
        };

        Self { backend }
    }

    /// Create with default configuration (auto-selects best strategy)
    pub fn with_defaults() -> Self {
        Self::new(&NotifierConfig::default())
    }

    /// Block until a pulse is consumed or `timeout` elapses
    #[inline]
    pub fn wait_timeout(&self, timeout: Duration) -> WaitResult<()> {
        let start = Instant::now();
        match start.checked_add(timeout) {
            Some(deadline) => self.wait_deadline_from(start, deadline),
            // Unrepresentable deadline: effectively unbounded
            None => {
                self.wait(None);
                Ok(())
            }
        }
    }

    /// Block until a pulse is consumed or `deadline` passes
    #[inline]
    pub fn wait_deadline(&self, deadline: Instant) -> WaitResult<()> {
        self.wait_deadline_from(Instant::now(), deadline)
    }

    fn wait_deadline_from(&self, start: Instant, deadline: Instant) -> WaitResult<()> {
        if self.wait(Some(deadline)) {
            Ok(())
        } else {
            let elapsed_ms = start.elapsed().as_millis() as u64;
            tracing::trace!(elapsed_ms, strategy = self.name(), "Wait timed out");
            Err(WaitError::Timeout { elapsed_ms })
        }
    }
}

impl Default for Slot {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl SignalSlot for Slot {
    #[inline(always)]
    fn post(&self) -> PostResult {
        match &self.backend {
            SlotBackend::Futex(s) => s.post(),
            SlotBackend::Condvar(s) => s.post(),
            SlotBackend::SpinWait(s) => s.post(),
        }
    }

    #[inline(always)]
    fn try_take(&self) -> bool {
        match &self.backend {
            SlotBackend::Futex(s) => s.try_take(),
            SlotBackend::Condvar(s) => s.try_take(),
            SlotBackend::SpinWait(s) => s.try_take(),
        }
    }

    #[inline(always)]
    fn wait(&self, deadline: Option<Instant>) -> bool {
        match &self.backend {
            SlotBackend::Futex(s) => s.wait(deadline),
            SlotBackend::Condvar(s) => s.wait(deadline),
            SlotBackend::SpinWait(s) => s.wait(deadline),
        }
    }

    #[inline(always)]
    fn is_pending(&self) -> bool {
        match &self.backend {
            SlotBackend::Futex(s) => s.is_pending(),
            SlotBackend::Condvar(s) => s.is_pending(),
            SlotBackend::SpinWait(s) => s.is_pending(),
        }
    }

    fn waiter_count(&self) -> usize {
        match &self.backend {
            SlotBackend::Futex(s) => s.waiter_count(),
            SlotBackend::Condvar(s) => s.waiter_count(),
            SlotBackend::SpinWait(s) => s.waiter_count(),
        }
    }

    fn name(&self) -> &'static str {
        match &self.backend {
            SlotBackend::Futex(s) => s.name(),
            SlotBackend::Condvar(s) => s.name(),
            SlotBackend::SpinWait(s) => s.name(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strategy_selection() {
        let condvar = Slot::new(&NotifierConfig::with_strategy(StrategyType::Condvar));
        assert_eq!(condvar.name(), "condvar");

        let futex = Slot::new(&NotifierConfig::with_strategy(StrategyType::Futex));
        assert_eq!(futex.name(), "futex");

        let spin = Slot::new(&NotifierConfig::low_latency());
        assert_eq!(spin.name(), "spinwait");
    }

    #[test]
    fn test_wait_timeout_reports_elapsed() {
        let slot = Slot::with_defaults();
        let result = slot.wait_timeout(Duration::from_millis(20));

        match result {
            Err(WaitError::Timeout { elapsed_ms }) => assert!(elapsed_ms >= 20),
            other => panic!("expected timeout, got {:?}", other),
        }
    }

    #[test]
    fn test_wait_deadline_consumes_pending_pulse() {
        let slot = Slot::with_defaults();
        slot.post();

        assert!(slot.wait_deadline(Instant::now()).is_ok());
        assert!(slot.wait_deadline(Instant::now()).is_err());
    }
}
