//! # Resilience Module
//!
//! Retry and circuit breaking for intercepted methods.
//!
//! ## Architecture
//!
//! - **Retry**: re-runs the inner call within a fixed attempt budget, with an
//!   optional error-kind filter and a fixed pause between attempts
//! - **Circuit Breakers**: one per method identity, held in a
//!   [`CircuitRegistry`] and shared by every concurrent caller of that method
//! - **Metrics**: per-breaker call, failure and rejection counts
//!
//! The breaker wraps retry: a call that exhausts its retries counts as one
//! breaker failure.
//!
//! ## Usage
//!
//! ```rust
//! use interceptor_core::models::MethodIdentity;
//! use interceptor_core::policy::CircuitBreakerPolicy;
//! use interceptor_core::resilience::{CircuitRegistry, CircuitState};
//! use std::time::Duration;
//!
//! let registry = CircuitRegistry::new();
//! let identity = MethodIdentity::new("Inventory", "reserve").param("u64");
//! let breaker = registry.breaker_for(
//!     &identity,
//!     &CircuitBreakerPolicy::new(3, Duration::from_secs(30)),
//! );
//! assert_eq!(breaker.state(), CircuitState::Closed);
//! ```

pub mod circuit_breaker;
pub mod metrics;
pub mod registry;
pub mod retry;

pub use circuit_breaker::{CircuitBreaker, CircuitState};
pub use metrics::CircuitBreakerMetrics;
pub use registry::CircuitRegistry;
pub use retry::execute_with_retry;
