#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Interceptor Core
//!
//! Declarative method interception for Rust services.
//!
//! ## Overview
//!
//! Given an implementation of some capability, Interceptor Core produces a
//! wrapping [`Interceptor`] that applies cross-cutting behavior to every
//! call: input validation, response caching, execution timing, retry,
//! circuit breaking, fallback substitution and audit logging. Which stages
//! run for a method is decided by per-method [`MethodPolicy`] metadata,
//! never by call-site code.
//!
//! ## Architecture
//!
//! - **Policies** are resolved once per method when the interceptor is
//!   built, and are read-only afterwards
//! - **One pipeline** serves synchronous, fire-and-forget async and
//!   value-returning async calls; only the execution strategy differs
//! - **Shared state** (circuit breakers, cache) is safe under concurrent
//!   callers of the same method
//!
//! ## Module Organization
//!
//! - [`interceptor`] - The wrapping object, its builder and the [`Decorated`] boundary
//! - [`pipeline`] - Stage composition, audit, timing and call-shape execution
//! - [`policy`] - Declarative per-method metadata and the resolved policy store
//! - [`resilience`] - Retry, circuit breakers and their registry
//! - [`cache`] - Cache store contract, providers and key generation
//! - [`validation`] - Structural argument rules
//! - [`config`] - Global switches and policy documents
//! - [`logging`] - Log sink contract and structured logging setup
//! - [`error`] - Error types
//!
//! ## Quick Start
//!
//! ```rust
//! use interceptor_core::prelude::*;
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! #[derive(Debug, thiserror::Error)]
//! #[error("quote service down")]
//! struct QuoteError;
//!
//! impl Classify for QuoteError {
//!     fn kind(&self) -> &str {
//!         "unavailable"
//!     }
//! }
//!
//! struct Quotes;
//!
//! impl Decorated for Quotes {
//!     type Error = QuoteError;
//!
//!     fn methods(&self) -> Vec<MethodDescriptor> {
//!         vec![MethodDescriptor::sync(MethodIdentity::new("Quotes", "price").param("String"))]
//!     }
//!
//!     fn invoke<'a>(
//!         &'a self,
//!         _method: &'a MethodIdentity,
//!         _args: &'a Arguments,
//!         _failure: Option<Failure<QuoteError>>,
//!     ) -> Reply<'a, QuoteError> {
//!         Reply::ready(Ok(json!(101.5)))
//!     }
//! }
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let interceptor = Interceptor::builder(Arc::new(Quotes))
//!     .policy_for(
//!         "price",
//!         MethodPolicy::new()
//!             .retry(RetryPolicy::new(3))
//!             .cache(CachePolicy::default()),
//!     )
//!     .build()?;
//!
//! let price = MethodIdentity::new("Quotes", "price").param("String");
//! let value: f64 = interceptor.invoke_sync(&price, Arguments::new().with("ACME")?)?;
//! assert_eq!(value, 101.5);
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod config;
pub mod constants;
pub mod error;
pub mod interceptor;
pub mod logging;
pub mod models;
pub mod pipeline;
pub mod policy;
pub mod resilience;
pub mod test_utils;
pub mod validation;

pub use cache::{CacheKeyGenerator, CacheStore, MemoryCacheStore, NoOpCacheStore};
pub use config::{ConfigLoader, GlobalOptions, PolicyDocument};
pub use error::{
    ArgumentError, Classify, ConfigResult, ConfigurationError, Failure, InterceptError,
    ValidationError,
};
pub use interceptor::{Decorated, Dispatch, Interceptor, InterceptorBuilder, Reply};
pub use logging::{init_structured_logging, LogEvent, LogRecord, LogSink, TracingLogSink};
pub use models::{Argument, Arguments, CallShape, MethodDescriptor, MethodIdentity};
pub use pipeline::ErrorCallback;
pub use policy::{
    AuditPolicy, CachePolicy, CircuitBreakerPolicy, FallbackPolicy, MethodPolicy, PolicyConfig,
    RetryPolicy,
};
pub use resilience::{CircuitBreaker, CircuitRegistry, CircuitState};
pub use validation::{Constraint, FieldRule, Validated};

/// Everything needed to implement [`Decorated`] and build an interceptor.
pub mod prelude {
    pub use crate::error::{Classify, Failure, InterceptError};
    pub use crate::interceptor::{Decorated, Interceptor, Reply};
    pub use crate::models::{Arguments, CallShape, MethodDescriptor, MethodIdentity};
    pub use crate::policy::{
        AuditPolicy, CachePolicy, CircuitBreakerPolicy, MethodPolicy, RetryPolicy,
    };
}
