/*!
 * Notifier Configuration
 *
 * Runtime configuration for slot strategy selection
 */

use crate::core::limits::{
    DEFAULT_MAX_SPINS, DEFAULT_SPIN_DURATION, LONG_WAIT_MAX_SPINS, LONG_WAIT_SPIN_DURATION,
    LOW_LATENCY_MAX_SPINS, LOW_LATENCY_SPIN_DURATION, STRATEGY_ENV_VAR,
};
use miette::Diagnostic;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;
use tracing::warn;

/// Strategy type selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyType {
    /// Atomic flag + parking lot (lock-free fast paths)
    Futex,
    /// Mutex-guarded flag + condition variable (cross-platform, reliable)
    Condvar,
    /// Adaptive spin before parking (low-latency, high-CPU for short waits)
    SpinWait,
    /// Auto-select based on platform
    Auto,
}

impl StrategyType {
    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyType::Futex => "futex",
            StrategyType::Condvar => "condvar",
            StrategyType::SpinWait => "spinwait",
            StrategyType::Auto => "auto",
        }
    }
}

impl fmt::Display for StrategyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unknown strategy name
#[derive(Error, Debug, Clone, PartialEq, Eq, Diagnostic)]
#[error("Unknown notifier strategy: {0}")]
#[diagnostic(
    code(notifier::unknown_strategy),
    help("Expected one of: futex, condvar, spinwait, auto")
)]
pub struct ParseStrategyError(pub String);

impl FromStr for StrategyType {
    type Err = ParseStrategyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "futex" => Ok(StrategyType::Futex),
            "condvar" => Ok(StrategyType::Condvar),
            "spinwait" | "spin" => Ok(StrategyType::SpinWait),
            "auto" | "" => Ok(StrategyType::Auto),
            _ => Err(ParseStrategyError(s.to_string())),
        }
    }
}

/// Notifier configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotifierConfig {
    /// Preferred strategy
    pub strategy: StrategyType,
    /// Spin duration before parking (for SpinWait)
    pub spin_duration: Duration,
    /// Maximum spin iterations before parking (for SpinWait)
    pub max_spins: u32,
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            strategy: StrategyType::Auto,
            spin_duration: DEFAULT_SPIN_DURATION,
            max_spins: DEFAULT_MAX_SPINS,
        }
    }
}

impl NotifierConfig {
    /// Configuration for a specific strategy with default tuning
    pub fn with_strategy(strategy: StrategyType) -> Self {
        Self {
            strategy,
            ..Default::default()
        }
    }

    /// Configuration optimized for low-latency (< 1ms wait expected)
    pub const fn low_latency() -> Self {
        Self {
            strategy: StrategyType::SpinWait,
            spin_duration: LOW_LATENCY_SPIN_DURATION,
            max_spins: LOW_LATENCY_MAX_SPINS,
        }
    }

    /// Configuration optimized for long waits (> 1ms expected)
    pub const fn long_wait() -> Self {
        Self {
            strategy: StrategyType::Auto,
            spin_duration: LONG_WAIT_SPIN_DURATION,
            max_spins: LONG_WAIT_MAX_SPINS,
        }
    }

    /// Default configuration with the strategy taken from `NOTIFIER_STRATEGY`
    ///
    /// Unknown values are logged and fall back to `Auto`.
    pub fn from_env() -> Self {
        let strategy = match std::env::var(STRATEGY_ENV_VAR) {
            Ok(value) => value.parse().unwrap_or_else(|e: ParseStrategyError| {
                warn!(error = %e, "Ignoring {}, using auto", STRATEGY_ENV_VAR);
                StrategyType::Auto
            }),
            Err(_) => StrategyType::Auto,
        };

        Self::with_strategy(strategy)
    }

    /// Select best strategy for current platform
    pub fn select_strategy(&self) -> StrategyType {
        match self.strategy {
            StrategyType::Auto => {
                // Prefer futex on Linux, condvar elsewhere
                #[cfg(target_os = "linux")]
                {
                    StrategyType::Futex
                }
                #[cfg(not(target_os = "linux"))]
                {
                    StrategyType::Condvar
                }
            }
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_strategy() {
        assert_eq!("futex".parse::<StrategyType>(), Ok(StrategyType::Futex));
        assert_eq!(" Condvar ".parse::<StrategyType>(), Ok(StrategyType::Condvar));
        assert_eq!("spin".parse::<StrategyType>(), Ok(StrategyType::SpinWait));
        assert_eq!("".parse::<StrategyType>(), Ok(StrategyType::Auto));
        assert_eq!(
            "semaphore".parse::<StrategyType>(),
            Err(ParseStrategyError("semaphore".to_string()))
        );
        assert_eq!(StrategyType::SpinWait.to_string(), "spinwait");
    }

    #[test]
    fn test_auto_resolves_to_concrete_strategy() {
        let selected = NotifierConfig::default().select_strategy();
        assert_ne!(selected, StrategyType::Auto);

        let explicit = NotifierConfig::with_strategy(StrategyType::Condvar);
        assert_eq!(explicit.select_strategy(), StrategyType::Condvar);
    }

    #[test]
    fn test_presets() {
        assert_eq!(NotifierConfig::low_latency().strategy, StrategyType::SpinWait);
        assert!(NotifierConfig::long_wait().max_spins < NotifierConfig::default().max_spins);
    }
}
