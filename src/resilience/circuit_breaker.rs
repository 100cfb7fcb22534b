//! # Circuit Breaker Implementation
//!
//! Classic three-state breaker: Closed (calls pass), Open (calls fail fast) and
//! Half-Open (a bounded number of probe calls decide whether to close again).

use crate::config::CircuitBreakerSettings;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::atomic::{AtomicU8, Ordering};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CircuitState {
    Closed = 0,
    Open = 1,
    HalfOpen = 2,
}

impl From<u8> for CircuitState {
    fn from(value: u8) -> Self {
        match value {
            0 => CircuitState::Closed,
            2 => CircuitState::HalfOpen,
            _ => CircuitState::Open,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CircuitBreakerConfig {
    /// Consecutive failures that open the circuit
    pub failure_threshold: u32,
    /// How long the circuit stays open before probing
    pub timeout: Duration,
    /// Successful probes needed to close again
    pub success_threshold: u32,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        CircuitBreakerSettings::default().into()
    }
}

impl From<CircuitBreakerSettings> for CircuitBreakerConfig {
    fn from(settings: CircuitBreakerSettings) -> Self {
        Self {
            failure_threshold: settings.failure_threshold,
            timeout: Duration::from_secs(settings.timeout_seconds),
            success_threshold: settings.success_threshold,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CircuitBreakerError<E> {
    #[error("Circuit breaker is open for {component}")]
    CircuitOpen { component: String },

    #[error("Operation failed: {0}")]
    OperationFailed(E),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CircuitBreakerMetrics {
    pub total_calls: u64,
    pub success_count: u64,
    pub failure_count: u64,
    pub consecutive_failures: u64,
    pub half_open_calls: u64,
    pub rejected_calls: u64,
}

#[derive(Debug)]
pub struct CircuitBreaker {
    name: String,
    state: AtomicU8,
    config: CircuitBreakerConfig,
    metrics: Mutex<CircuitBreakerMetrics>,
    opened_at: Mutex<Option<Instant>>,
}

impl CircuitBreaker {
    pub fn new(name: impl Into<String>, config: CircuitBreakerConfig) -> Self {
        let name = name.into();
        info!(
            component = %name,
            failure_threshold = config.failure_threshold,
            timeout_seconds = config.timeout.as_secs(),
            success_threshold = config.success_threshold,
            "Circuit breaker initialized"
        );

        Self {
            name,
            state: AtomicU8::new(CircuitState::Closed as u8),
            config,
            metrics: Mutex::new(CircuitBreakerMetrics::default()),
            opened_at: Mutex::new(None),
        }
    }

    pub fn state(&self) -> CircuitState {
        CircuitState::from(self.state.load(Ordering::Acquire))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Execute an operation with circuit breaker protection
    pub async fn call<F, T, E, Fut>(&self, operation: F) -> Result<T, CircuitBreakerError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if !self.should_allow_call() {
            self.metrics.lock().rejected_calls += 1;
            return Err(CircuitBreakerError::CircuitOpen {
                component: self.name.clone(),
            });
        }

        let start_time = Instant::now();
        let result = operation().await;
        let duration = start_time.elapsed();

        match &result {
            Ok(_) => self.record_success(duration),
            Err(_) => self.record_failure(duration),
        }

        result.map_err(CircuitBreakerError::OperationFailed)
    }

    fn should_allow_call(&self) -> bool {
        match self.state() {
            CircuitState::Closed => true,
            CircuitState::Open => {
                let opened_at = *self.opened_at.lock();
                let elapsed = opened_at.map(|opened| opened.elapsed());
                match elapsed {
                    Some(elapsed) if elapsed >= self.config.timeout => {
                        self.transition_to_half_open();
                        true
                    }
                    Some(_) => false,
                    None => {
                        warn!(component = %self.name, "Circuit open but no timestamp recorded");
                        true
                    }
                }
            }
            CircuitState::HalfOpen => {
                self.metrics.lock().half_open_calls < u64::from(self.config.success_threshold)
            }
        }
    }

    fn record_success(&self, duration: Duration) {
        let close = {
            let mut metrics = self.metrics.lock();
            metrics.total_calls += 1;
            metrics.success_count += 1;
            metrics.consecutive_failures = 0;

            debug!(
                component = %self.name,
                duration_ms = duration.as_millis() as u64,
                "Protected call succeeded"
            );

            if self.state() == CircuitState::HalfOpen {
                metrics.half_open_calls += 1;
                metrics.half_open_calls >= u64::from(self.config.success_threshold)
            } else {
                false
            }
        };

        if close {
            self.transition_to_closed();
        }
    }

    fn record_failure(&self, duration: Duration) {
        let open = {
            let mut metrics = self.metrics.lock();
            metrics.total_calls += 1;
            metrics.failure_count += 1;
            metrics.consecutive_failures += 1;

            warn!(
                component = %self.name,
                duration_ms = duration.as_millis() as u64,
                consecutive_failures = metrics.consecutive_failures,
                "Protected call failed"
            );

            match self.state() {
                CircuitState::Closed => {
                    metrics.consecutive_failures >= u64::from(self.config.failure_threshold)
                }
                // Any failure while probing reopens immediately
                CircuitState::HalfOpen => true,
                CircuitState::Open => false,
            }
        };

        if open {
            self.transition_to_open();
        }
    }

    fn transition_to_closed(&self) {
        self.state.store(CircuitState::Closed as u8, Ordering::Release);
        *self.opened_at.lock() = None;
        let mut metrics = self.metrics.lock();
        metrics.consecutive_failures = 0;
        metrics.half_open_calls = 0;

        info!(
            component = %self.name,
            total_calls = metrics.total_calls,
            "Circuit breaker closed (recovered)"
        );
    }

    fn transition_to_open(&self) {
        self.state.store(CircuitState::Open as u8, Ordering::Release);
        *self.opened_at.lock() = Some(Instant::now());
        self.metrics.lock().half_open_calls = 0;

        warn!(
            component = %self.name,
            failure_threshold = self.config.failure_threshold,
            timeout_seconds = self.config.timeout.as_secs(),
            "Circuit breaker opened (failing fast)"
        );
    }

    fn transition_to_half_open(&self) {
        self.state
            .store(CircuitState::HalfOpen as u8, Ordering::Release);
        self.metrics.lock().half_open_calls = 0;

        info!(
            component = %self.name,
            success_threshold = self.config.success_threshold,
            "Circuit breaker half-open (testing recovery)"
        );
    }

    pub fn force_open(&self) {
        warn!(component = %self.name, "Circuit breaker forced open");
        self.transition_to_open();
    }

    pub fn force_closed(&self) {
        warn!(component = %self.name, "Circuit breaker forced closed");
        self.transition_to_closed();
    }

    pub fn metrics(&self) -> CircuitBreakerMetrics {
        self.metrics.lock().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::sleep;

    fn config(failure_threshold: u32, timeout_ms: u64, success_threshold: u32) -> CircuitBreakerConfig {
        CircuitBreakerConfig {
            failure_threshold,
            timeout: Duration::from_millis(timeout_ms),
            success_threshold,
        }
    }

    #[tokio::test]
    async fn test_normal_operation_counts_calls() {
        let circuit = CircuitBreaker::new("test", config(3, 100, 2));
        assert_eq!(circuit.state(), CircuitState::Closed);

        let result = circuit.call(|| async { Ok::<_, String>("ok") }).await;
        assert!(result.is_ok());

        let metrics = circuit.metrics();
        assert_eq!(metrics.total_calls, 1);
        assert_eq!(metrics.success_count, 1);
        assert_eq!(metrics.failure_count, 0);
    }

    #[tokio::test]
    async fn test_opens_after_consecutive_failures() {
        let circuit = CircuitBreaker::new("test", config(2, 100, 2));

        let _ = circuit.call(|| async { Err::<String, _>("boom") }).await;
        assert_eq!(circuit.state(), CircuitState::Closed);

        let _ = circuit.call(|| async { Err::<String, _>("boom") }).await;
        assert_eq!(circuit.state(), CircuitState::Open);

        let result = circuit
            .call(|| async { Ok::<_, String>("never runs") })
            .await;
        assert!(matches!(result, Err(CircuitBreakerError::CircuitOpen { .. })));
        assert_eq!(circuit.metrics().rejected_calls, 1);
    }

    #[tokio::test]
    async fn test_success_resets_failure_streak() {
        let circuit = CircuitBreaker::new("test", config(2, 100, 1));

        let _ = circuit.call(|| async { Err::<String, _>("boom") }).await;
        let _ = circuit.call(|| async { Ok::<_, &str>("ok".to_string()) }).await;
        let _ = circuit.call(|| async { Err::<String, _>("boom") }).await;
        assert_eq!(circuit.state(), CircuitState::Closed);
    }

    #[tokio::test]
    async fn test_recovers_through_half_open() {
        let circuit = CircuitBreaker::new("test", config(1, 50, 1));

        let _ = circuit.call(|| async { Err::<String, _>("boom") }).await;
        assert_eq!(circuit.state(), CircuitState::Open);

        sleep(Duration::from_millis(60)).await;

        let result = circuit.call(|| async { Ok::<_, String>("ok") }).await;
        assert!(result.is_ok());
        assert_eq!(circuit.state(), CircuitState::Closed);
    }

    #[tokio::test]
    async fn test_force_operations() {
        let circuit = CircuitBreaker::new("test", config(1, 1000, 1));

        circuit.force_open();
        assert_eq!(circuit.state(), CircuitState::Open);

        circuit.force_closed();
        assert_eq!(circuit.state(), CircuitState::Closed);
    }

    #[test]
    fn test_config_from_settings() {
        let config: CircuitBreakerConfig = CircuitBreakerSettings {
            failure_threshold: 4,
            timeout_seconds: 12,
            success_threshold: 3,
        }
        .into();
        assert_eq!(config.timeout, Duration::from_secs(12));
        assert_eq!(config.failure_threshold, 4);
    }
}
