//! # Resilience Module
//!
//! Circuit breaker protecting calls to the classification oracle. When the
//! oracle keeps failing the breaker opens and calls fail fast, which sends every
//! classification step straight to its keyword fallback.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use feedback_core::resilience::{CircuitBreaker, CircuitBreakerConfig};
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = CircuitBreakerConfig {
//!     failure_threshold: 5,
//!     timeout: Duration::from_secs(30),
//!     success_threshold: 2,
//! };
//!
//! let circuit_breaker = CircuitBreaker::new("classification_oracle", config);
//!
//! let result = circuit_breaker.call(|| async {
//!     Ok::<&str, Box<dyn std::error::Error>>("POSITIVE")
//! }).await?;
//! # Ok(())
//! # }
//! ```

pub mod circuit_breaker;

pub use circuit_breaker::{
    CircuitBreaker, CircuitBreakerConfig, CircuitBreakerError, CircuitBreakerMetrics, CircuitState,
};
