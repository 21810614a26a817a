//! # Interception Pipeline
//!
//! The fixed stage chain applied to every intercepted call:
//!
//! ```text
//! validate -> audit input -> start timer
//!   -> cache lookup            (hit returns here)
//!     -> fallback
//!       -> circuit breaker
//!         -> retry
//!           -> decorated implementation
//!   <- cache store on success
//! <- stop timer -> audit output | audit error
//! ```
//!
//! Each stage is a no-op when its policy is absent. The chain is written once
//! as async code; [`ExecutionStrategy`] decides whether it is blocked on
//! (sync calls) or awaited (async calls).

pub mod audit;
pub mod executor;
pub mod timing;

pub use audit::AuditTrail;
pub use executor::{reconstruct, ExecutionStrategy};
pub use timing::Stopwatch;

use crate::cache::{CacheKeyGenerator, CacheStore};
use crate::error::{Failure, InterceptError};
use crate::interceptor::Decorated;
use crate::logging::{LogEvent, LogRecord, LogSink};
use crate::models::{Arguments, MethodIdentity};
use crate::policy::MethodEntry;
use crate::resilience::{execute_with_retry, CircuitBreaker, CircuitRegistry};
use crate::validation::validate_arguments;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

/// Called once per invocation whose final outcome is an error.
pub type ErrorCallback = dyn Fn(&MethodIdentity, &(dyn std::error::Error + 'static)) + Send + Sync;

/// One invocation's view of the stage chain.
pub struct Pipeline<'a, T: Decorated> {
    target: &'a T,
    entry: &'a MethodEntry,
    cache: &'a dyn CacheStore,
    sink: &'a dyn LogSink,
    on_error: Option<&'a ErrorCallback>,
    breaker: Option<Arc<CircuitBreaker>>,
    strategy: ExecutionStrategy,
    method: String,
    invocation_id: Uuid,
}

impl<'a, T: Decorated> Pipeline<'a, T> {
    pub fn new(
        target: &'a T,
        entry: &'a MethodEntry,
        cache: &'a dyn CacheStore,
        sink: &'a dyn LogSink,
        registry: &CircuitRegistry,
    ) -> Self {
        let breaker = entry
            .policy
            .circuit_breaker
            .as_ref()
            .map(|policy| registry.breaker_for(entry.identity(), policy));

        Self {
            target,
            entry,
            cache,
            sink,
            on_error: None,
            breaker,
            strategy: ExecutionStrategy::for_shape(entry.descriptor.shape),
            method: entry.identity().to_string(),
            invocation_id: Uuid::new_v4(),
        }
    }

    pub fn with_error_hook(mut self, hook: Option<&'a ErrorCallback>) -> Self {
        self.on_error = hook;
        self
    }

    pub fn strategy(&self) -> ExecutionStrategy {
        self.strategy
    }

    pub fn invocation_id(&self) -> Uuid {
        self.invocation_id
    }

    fn context(&self) -> Option<&str> {
        self.entry
            .policy
            .audit
            .as_ref()
            .and_then(|audit| audit.context.as_deref())
    }

    fn record(&self, event: LogEvent) -> LogRecord {
        LogRecord::new(event, self.method.as_str(), self.invocation_id).context(self.context())
    }

    /// Run every stage once and return the untyped result.
    ///
    /// The audit outcome record and the error hook fire when the chain
    /// finishes. Dropping the future before then (a timeout, a cancelled
    /// task) leaves the input record without a matching outcome.
    pub async fn run(self, arguments: Arguments) -> Result<Value, InterceptError<T::Error>> {
        let result = self.staged(arguments).await;
        if let (Err(error), Some(hook)) = (&result, self.on_error) {
            hook(self.entry.identity(), error as &(dyn std::error::Error + 'static));
        }
        result
    }

    async fn staged(&self, arguments: Arguments) -> Result<Value, InterceptError<T::Error>> {
        let policy = &self.entry.policy;

        if policy.validate {
            validate_arguments(&arguments).map_err(InterceptError::Validation)?;
        }

        let audit = AuditTrail::new(
            self.sink,
            policy.audit.as_ref(),
            &self.method,
            self.invocation_id,
        );
        audit.input(&arguments);

        let stopwatch = policy.timing.then(Stopwatch::start);
        let result = self.cached(&arguments).await;
        if let Some(stopwatch) = stopwatch {
            stopwatch.stop(self.sink, &self.method, self.context(), self.invocation_id);
        }

        match &result {
            Ok(value) => audit.output(value),
            Err(error) => audit.error(error),
        }
        result
    }

    async fn cached(&self, arguments: &Arguments) -> Result<Value, InterceptError<T::Error>> {
        let Some(cache_policy) = &self.entry.policy.cache else {
            return self.recovered(arguments).await;
        };

        let key = CacheKeyGenerator::key(self.entry.identity(), arguments);
        if let Some(hit) = self.cache.try_get(&key) {
            debug!(method = %self.method, provider = self.cache.provider_name(), "Served from cache");
            return Ok(hit);
        }

        let value = self.recovered(arguments).await?;
        self.cache.set(&key, value.clone(), cache_policy.ttl());
        Ok(value)
    }

    async fn recovered(&self, arguments: &Arguments) -> Result<Value, InterceptError<T::Error>> {
        let failure = match self.protected(arguments).await {
            Ok(value) => return Ok(value),
            Err(failure) => failure,
        };

        let Some(fallback) = &self.entry.fallback else {
            return Err(failure.into());
        };

        self.sink.warn(
            &self
                .record(LogEvent::FallbackInvoked)
                .field("fallback", &fallback.identity)
                .field("error", &failure),
        );

        let captured = fallback.passes_failure.then_some(failure);
        self.target
            .invoke(&fallback.identity, arguments, captured)
            .resolve()
            .await
            .map_err(InterceptError::Invocation)
    }

    async fn protected(&self, arguments: &Arguments) -> Result<Value, Failure<T::Error>> {
        match &self.breaker {
            Some(breaker) => breaker.call(|| self.attempts(arguments)).await,
            None => self.attempts(arguments).await.map_err(Failure::Invocation),
        }
    }

    async fn attempts(&self, arguments: &Arguments) -> Result<Value, T::Error> {
        execute_with_retry(
            self.entry.policy.retry.as_ref(),
            self.strategy,
            |attempt, error: &T::Error| {
                self.sink.warn(
                    &self
                        .record(LogEvent::RetryAttempt)
                        .field("attempt", attempt)
                        .field("error", error),
                );
            },
            |_| self.call_target(arguments),
        )
        .await
    }

    async fn call_target(&self, arguments: &Arguments) -> Result<Value, T::Error> {
        self.target
            .invoke(self.entry.identity(), arguments, None)
            .resolve()
            .await
    }
}
