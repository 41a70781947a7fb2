use std::sync::Mutex;
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::config::CircuitBreakerConfig;

/// Circuit breaker state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    /// Normal operation, calls flow through
    Closed,
    /// Circuit is tripped, calls fail fast without reaching the backend
    Open,
    /// One trial call is testing whether the backend has recovered
    HalfOpen,
}

#[derive(Debug)]
struct BreakerState {
    circuit: CircuitState,
    consecutive_failures: u32,
    opened_at: Option<Instant>,
    trial_in_flight: bool,
}

/// Guards calls to one backend.
///
/// Calls are admitted through [`CircuitBreaker::try_acquire`], whose
/// [`CallPermit`] reports the outcome.
#[derive(Debug)]
pub struct CircuitBreaker {
    name: String,
    config: CircuitBreakerConfig,
    state: Mutex<BreakerState>,
}

impl CircuitBreaker {
    pub fn new(name: impl Into<String>, config: CircuitBreakerConfig) -> Self {
        Self {
            name: name.into(),
            config,
            state: Mutex::new(BreakerState {
                circuit: CircuitState::Closed,
                consecutive_failures: 0,
                opened_at: None,
                trial_in_flight: false,
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> CircuitState {
        self.lock().circuit
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.lock().consecutive_failures
    }

    /// Admit a call, or `None` while the circuit rejects calls.
    ///
    /// An open circuit turns half-open once the cool-down has elapsed and
    /// then admits a single trial call until that call is reported. A permit
    /// dropped without a report gives the trial slot back.
    pub fn try_acquire(&self) -> Option<CallPermit<'_>> {
        let mut state = self.lock();
        let trial = match state.circuit {
            CircuitState::Closed => false,
            CircuitState::Open => {
                let cooled_down = state
                    .opened_at
                    .is_some_and(|at| at.elapsed() >= self.config.open_timeout());
                if !cooled_down {
                    return None;
                }
                info!("Circuit {} half-open, letting a trial call through", self.name);
                state.circuit = CircuitState::HalfOpen;
                state.opened_at = None;
                state.trial_in_flight = true;
                true
            }
            CircuitState::HalfOpen => {
                if state.trial_in_flight {
                    return None;
                }
                state.trial_in_flight = true;
                true
            }
        };

        Some(CallPermit {
            breaker: self,
            trial,
            reported: false,
        })
    }

    pub fn record_success(&self) {
        let mut state = self.lock();
        if state.circuit != CircuitState::Closed {
            info!("Circuit {} closed", self.name);
        }
        state.circuit = CircuitState::Closed;
        state.consecutive_failures = 0;
        state.opened_at = None;
        state.trial_in_flight = false;
    }

    pub fn record_failure(&self) {
        let mut state = self.lock();
        state.consecutive_failures += 1;
        state.trial_in_flight = false;

        let trip = match state.circuit {
            CircuitState::HalfOpen => true,
            CircuitState::Closed => state.consecutive_failures >= self.config.failure_threshold,
            CircuitState::Open => false,
        };

        if trip {
            warn!(
                "Circuit {} opened after {} consecutive failures",
                self.name, state.consecutive_failures
            );
            state.circuit = CircuitState::Open;
            state.opened_at = Some(Instant::now());
        }
    }

    fn abandon_trial(&self) {
        let mut state = self.lock();
        if state.circuit == CircuitState::HalfOpen && state.trial_in_flight {
            debug!("Circuit {} trial call abandoned", self.name);
            state.trial_in_flight = false;
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BreakerState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// One admitted call; report its outcome exactly once.
#[must_use = "an unreported permit counts as an abandoned call"]
pub struct CallPermit<'a> {
    breaker: &'a CircuitBreaker,
    trial: bool,
    reported: bool,
}

impl CallPermit<'_> {
    pub fn is_trial(&self) -> bool {
        self.trial
    }

    pub fn record_success(mut self) {
        self.reported = true;
        self.breaker.record_success();
    }

    pub fn record_failure(mut self) {
        self.reported = true;
        self.breaker.record_failure();
    }
}

impl Drop for CallPermit<'_> {
    fn drop(&mut self) {
        if self.trial && !self.reported {
            self.breaker.abandon_trial();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn breaker(failure_threshold: u32, open_timeout_ms: u64) -> CircuitBreaker {
        CircuitBreaker::new(
            "backend",
            CircuitBreakerConfig {
                failure_threshold,
                open_timeout_ms,
            },
        )
    }

    #[test]
    fn test_starts_closed() {
        let breaker = breaker(3, 1000);
        assert_eq!(breaker.state(), CircuitState::Closed);
        assert!(breaker.try_acquire().is_some());
        assert_eq!(breaker.name(), "backend");
    }

    #[test]
    fn test_opens_after_threshold() {
        let breaker = breaker(3, 60_000);
        breaker.record_failure();
        breaker.record_failure();
        assert_eq!(breaker.state(), CircuitState::Closed);

        breaker.try_acquire().unwrap().record_failure();
        assert_eq!(breaker.state(), CircuitState::Open);
        assert!(breaker.try_acquire().is_none());
    }

    #[test]
    fn test_success_resets_failure_count() {
        let breaker = breaker(2, 60_000);
        breaker.record_failure();
        breaker.try_acquire().unwrap().record_success();
        breaker.record_failure();

        assert_eq!(breaker.state(), CircuitState::Closed);
        assert_eq!(breaker.consecutive_failures(), 1);
    }

    #[test]
    fn test_half_open_admits_one_trial() {
        let breaker = breaker(1, 10);
        breaker.record_failure();
        assert!(breaker.try_acquire().is_none());

        std::thread::sleep(Duration::from_millis(20));
        let trial = breaker.try_acquire().unwrap();
        assert!(trial.is_trial());
        assert_eq!(breaker.state(), CircuitState::HalfOpen);
        assert!(breaker.try_acquire().is_none());
        trial.record_failure();
    }

    #[test]
    fn test_trial_success_closes() {
        let breaker = breaker(1, 10);
        breaker.record_failure();
        std::thread::sleep(Duration::from_millis(20));

        breaker.try_acquire().unwrap().record_success();
        assert_eq!(breaker.state(), CircuitState::Closed);
        assert!(!breaker.try_acquire().unwrap().is_trial());
    }

    #[test]
    fn test_trial_failure_reopens() {
        let breaker = breaker(1, 10);
        breaker.record_failure();
        std::thread::sleep(Duration::from_millis(20));

        breaker.try_acquire().unwrap().record_failure();
        assert_eq!(breaker.state(), CircuitState::Open);
        assert!(breaker.try_acquire().is_none());
    }

    #[test]
    fn test_dropped_trial_frees_the_slot() {
        let breaker = breaker(1, 10);
        breaker.record_failure();
        std::thread::sleep(Duration::from_millis(20));

        let trial = breaker.try_acquire().unwrap();
        assert!(breaker.try_acquire().is_none());
        drop(trial);

        assert_eq!(breaker.state(), CircuitState::HalfOpen);
        let next = breaker.try_acquire().unwrap();
        assert!(next.is_trial());
        next.record_success();
        assert_eq!(breaker.state(), CircuitState::Closed);
    }

    #[test]
    fn test_dropped_closed_permit_changes_nothing() {
        let breaker = breaker(1, 60_000);
        drop(breaker.try_acquire());

        assert_eq!(breaker.state(), CircuitState::Closed);
        assert_eq!(breaker.consecutive_failures(), 0);
    }
}
