//! Three-state circuit breaker guarding block production: a single
//! instance owned privately by the proposer.

use std::sync::RwLock;
use std::time::{Duration, Instant};

use crate::metrics;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

#[derive(Clone, Debug)]
pub struct CircuitBreakerConfig {
    pub threshold: u32,
    pub timeout: Duration,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            threshold: 5,
            timeout: Duration::from_secs(30),
        }
    }
}

struct Inner {
    state: CircuitState,
    failure_count: u32,
    last_failure_time: Option<Instant>,
}

pub struct CircuitBreaker {
    config: CircuitBreakerConfig,
    inner: RwLock<Inner>,
}

impl CircuitBreaker {
    pub fn new(config: CircuitBreakerConfig) -> Self {
        Self {
            config,
            inner: RwLock::new(Inner {
                state: CircuitState::Closed,
                failure_count: 0,
                last_failure_time: None,
            }),
        }
    }

    /// Current state, lazily transitioning Open -> HalfOpen once `timeout`
    /// has elapsed since the failure that opened the breaker.
    pub fn state(&self) -> CircuitState {
        let mut inner = self.inner.write().unwrap();
        if inner.state == CircuitState::Open {
            if let Some(last_failure) = inner.last_failure_time {
                if last_failure.elapsed() >= self.config.timeout {
                    inner.state = CircuitState::HalfOpen;
                    tracing::info!("circuit breaker transitioning to half-open");
                }
            }
        }
        inner.state
    }

    /// Whether a production attempt should be made right now.
    pub fn allow_request(&self) -> bool {
        matches!(self.state(), CircuitState::Closed | CircuitState::HalfOpen)
    }

    pub fn record_success(&self) {
        let mut inner = self.inner.write().unwrap();
        let was_open = inner.state != CircuitState::Closed;
        inner.state = CircuitState::Closed;
        inner.failure_count = 0;
        metrics::CIRCUIT_BREAKER_STATE.set(0);
        if was_open {
            tracing::info!("circuit breaker recovered, transitioning to closed");
        }
    }

    pub fn record_failure(&self) {
        let mut inner = self.inner.write().unwrap();
        inner.last_failure_time = Some(Instant::now());
        match inner.state {
            CircuitState::Closed => {
                inner.failure_count += 1;
                if inner.failure_count >= self.config.threshold {
                    inner.state = CircuitState::Open;
                    metrics::CIRCUIT_BREAKER_STATE.set(1);
                    metrics::CIRCUIT_BREAKER_TRIPS_TOTAL.inc();
                    tracing::warn!(failures = inner.failure_count, "circuit breaker opened");
                }
            }
            CircuitState::HalfOpen => {
                inner.state = CircuitState::Open;
                tracing::warn!("circuit breaker failed in half-open, returning to open");
            }
            CircuitState::Open => {}
        }
    }
}

impl Default for CircuitBreaker {
    fn default() -> Self {
        Self::new(CircuitBreakerConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_closed_and_allows() {
        let cb = CircuitBreaker::default();
        assert_eq!(cb.state(), CircuitState::Closed);
        assert!(cb.allow_request());
    }

    #[test]
    fn opens_after_threshold_failures() {
        let cb = CircuitBreaker::new(CircuitBreakerConfig {
            threshold: 3,
            ..Default::default()
        });
        cb.record_failure();
        cb.record_failure();
        assert_eq!(cb.state(), CircuitState::Closed);
        cb.record_failure();
        assert_eq!(cb.state(), CircuitState::Open);
        assert!(!cb.allow_request());
    }

    #[test]
    fn transitions_to_half_open_after_timeout() {
        let cb = CircuitBreaker::new(CircuitBreakerConfig {
            threshold: 1,
            timeout: Duration::from_millis(10),
        });
        cb.record_failure();
        assert_eq!(cb.state(), CircuitState::Open);
        std::thread::sleep(Duration::from_millis(15));
        assert!(cb.allow_request());
        assert_eq!(cb.state(), CircuitState::HalfOpen);
    }

    #[test]
    fn half_open_success_closes_with_reset_counter() {
        let cb = CircuitBreaker::new(CircuitBreakerConfig {
            threshold: 1,
            timeout: Duration::from_millis(10),
        });
        cb.record_failure();
        std::thread::sleep(Duration::from_millis(15));
        assert!(cb.allow_request());
        cb.record_success();
        assert_eq!(cb.state(), CircuitState::Closed);
    }

    #[test]
    fn half_open_failure_returns_to_open() {
        let cb = CircuitBreaker::new(CircuitBreakerConfig {
            threshold: 1,
            timeout: Duration::from_millis(10),
        });
        cb.record_failure();
        std::thread::sleep(Duration::from_millis(15));
        assert!(cb.allow_request());
        cb.record_failure();
        assert_eq!(cb.state(), CircuitState::Open);
    }

    #[test]
    fn success_resets_failure_count_before_threshold() {
        let cb = CircuitBreaker::new(CircuitBreakerConfig {
            threshold: 3,
            ..Default::default()
        });
        cb.record_failure();
        cb.record_failure();
        cb.record_success();
        cb.record_failure();
        cb.record_failure();
        assert_eq!(cb.state(), CircuitState::Closed);
    }
}
