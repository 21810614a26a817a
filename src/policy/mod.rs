//! # Method Policies
//!
//! Declarative per-method metadata and its resolved, read-only form.
//!
//! ## Architecture
//!
//! - [`MethodPolicy`]: what the metadata asks for (builder API or a
//!   deserialized policy document)
//! - [`PolicyConfig`]: what actually runs once global switches are applied
//! - [`PolicyStore`]: one resolved entry per method, built when the
//!   interceptor is built and never mutated afterwards

pub mod store;

pub use store::{FallbackTarget, MethodEntry, PolicyConfig, PolicySelector, PolicyStore};

use crate::constants::defaults;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Retry the inner call up to `attempts` times in total.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Total attempt budget, including the first try.
    pub attempts: u32,

    /// Fixed pause between attempts.
    #[serde(default = "default_retry_delay_ms")]
    pub delay_ms: u64,

    /// Error kinds eligible for retry; empty retries every kind.
    #[serde(default)]
    pub exception_kinds: Vec<String>,
}

impl RetryPolicy {
    pub fn new(attempts: u32) -> Self {
        Self {
            attempts,
            delay_ms: defaults::RETRY_DELAY_MS,
            exception_kinds: Vec::new(),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay_ms = delay.as_millis() as u64;
        self
    }

    pub fn retry_on(mut self, kind: impl Into<String>) -> Self {
        self.exception_kinds.push(kind.into());
        self
    }

    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }

    /// Whether an error of this kind may consume another attempt.
    pub fn is_retryable(&self, kind: &str) -> bool {
        self.exception_kinds.is_empty() || self.exception_kinds.iter().any(|k| k == kind)
    }
}

/// Open the circuit after `threshold` consecutive failures, for `break_duration_seconds`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CircuitBreakerPolicy {
    #[serde(default = "default_threshold")]
    pub threshold: u32,

    #[serde(default = "default_break_seconds")]
    pub break_duration_seconds: f64,
}

impl CircuitBreakerPolicy {
    pub fn new(threshold: u32, break_duration: Duration) -> Self {
        Self {
            threshold,
            break_duration_seconds: break_duration.as_secs_f64(),
        }
    }

    pub fn break_duration(&self) -> Duration {
        bounded_duration(self.break_duration_seconds)
    }
}

impl Default for CircuitBreakerPolicy {
    fn default() -> Self {
        Self {
            threshold: defaults::CIRCUIT_BREAKER_THRESHOLD,
            break_duration_seconds: defaults::CIRCUIT_BREAKER_BREAK_SECONDS as f64,
        }
    }
}

/// Substitute the named operation's result when the protected call fails.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FallbackPolicy {
    pub target: String,
}

impl FallbackPolicy {
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachePolicy {
    #[serde(default = "default_cache_ttl")]
    pub ttl_seconds: f64,
}

impl CachePolicy {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl_seconds: ttl.as_secs_f64(),
        }
    }

    pub fn ttl(&self) -> Duration {
        bounded_duration(self.ttl_seconds)
    }
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self {
            ttl_seconds: defaults::CACHE_TTL_SECONDS as f64,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditPolicy {
    #[serde(default)]
    pub context: Option<String>,

    #[serde(default = "default_true")]
    pub log_input: bool,

    #[serde(default = "default_true")]
    pub log_output: bool,

    #[serde(default = "default_true")]
    pub log_error: bool,
}

impl AuditPolicy {
    pub fn with_context(context: impl Into<String>) -> Self {
        Self {
            context: Some(context.into()),
            ..Self::default()
        }
    }
}

impl Default for AuditPolicy {
    fn default() -> Self {
        Self {
            context: None,
            log_input: defaults::AUDIT_LOG_INPUT,
            log_output: defaults::AUDIT_LOG_OUTPUT,
            log_error: defaults::AUDIT_LOG_ERROR,
        }
    }
}

/// Declarative metadata for one method. Absent fields mean the stage is a
/// no-op for that method.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MethodPolicy {
    #[serde(default)]
    pub retry: Option<RetryPolicy>,

    #[serde(default)]
    pub circuit_breaker: Option<CircuitBreakerPolicy>,

    #[serde(default)]
    pub fallback: Option<FallbackPolicy>,

    #[serde(default)]
    pub cache: Option<CachePolicy>,

    #[serde(default)]
    pub audit: Option<AuditPolicy>,

    #[serde(default)]
    pub validate: bool,

    #[serde(default)]
    pub measure_time: bool,
}

impl MethodPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = Some(retry);
        self
    }

    pub fn circuit_breaker(mut self, circuit_breaker: CircuitBreakerPolicy) -> Self {
        self.circuit_breaker = Some(circuit_breaker);
        self
    }

    pub fn fallback(mut self, target: impl Into<String>) -> Self {
        self.fallback = Some(FallbackPolicy::new(target));
        self
    }

    pub fn cache(mut self, cache: CachePolicy) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn audit(mut self, audit: AuditPolicy) -> Self {
        self.audit = Some(audit);
        self
    }

    pub fn validate(mut self) -> Self {
        self.validate = true;
        self
    }

    pub fn measure_time(mut self) -> Self {
        self.measure_time = true;
        self
    }

    /// Check declared values against their documented bounds.
    pub fn check(&self) -> Result<(), String> {
        if let Some(retry) = &self.retry {
            if retry.attempts == 0 {
                return Err("retry attempts must be at least 1".to_string());
            }
        }

        if let Some(breaker) = &self.circuit_breaker {
            if breaker.threshold == 0 {
                return Err("circuit breaker threshold must be at least 1".to_string());
            }
            if !breaker.break_duration_seconds.is_finite() || breaker.break_duration_seconds < 0.0
            {
                return Err("circuit breaker break duration must be a non-negative number".to_string());
            }
            if breaker.break_duration_seconds > defaults::MAX_DURATION_SECONDS as f64 {
                return Err(format!(
                    "circuit breaker break duration must not exceed {} seconds",
                    defaults::MAX_DURATION_SECONDS
                ));
            }
        }

        if let Some(fallback) = &self.fallback {
            if fallback.target.trim().is_empty() {
                return Err("fallback target must not be empty".to_string());
            }
        }

        if let Some(cache) = &self.cache {
            if !cache.ttl_seconds.is_finite() || cache.ttl_seconds <= 0.0 {
                return Err("cache ttl must be greater than 0".to_string());
            }
            if cache.ttl_seconds > defaults::MAX_DURATION_SECONDS as f64 {
                return Err(format!(
                    "cache ttl must not exceed {} seconds",
                    defaults::MAX_DURATION_SECONDS
                ));
            }
        }

        Ok(())
    }
}

/// Seconds to a `Duration`, clamped to `[0, MAX_DURATION_SECONDS]`.
/// NaN maps to zero.
fn bounded_duration(seconds: f64) -> Duration {
    let max = defaults::MAX_DURATION_SECONDS as f64;
    let seconds = if seconds.is_nan() { 0.0 } else { seconds.clamp(0.0, max) };
    Duration::try_from_secs_f64(seconds)
        .unwrap_or_else(|_| Duration::from_secs(defaults::MAX_DURATION_SECONDS))
}

fn default_retry_delay_ms() -> u64 {
    defaults::RETRY_DELAY_MS
}

fn default_threshold() -> u32 {
    defaults::CIRCUIT_BREAKER_THRESHOLD
}

fn default_break_seconds() -> f64 {
    defaults::CIRCUIT_BREAKER_BREAK_SECONDS as f64
}

fn default_cache_ttl() -> f64 {
    defaults::CACHE_TTL_SECONDS as f64
}

fn default_true() -> bool {
    true
}
