//! # Circuit Breaker Metrics
//!
//! Counters kept per breaker for monitoring and diagnostics.

use crate::resilience::CircuitState;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// Snapshot of one breaker's counters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CircuitBreakerMetrics {
    /// Calls that reached the protected operation
    pub total_calls: u64,

    pub success_count: u64,

    pub failure_count: u64,

    /// Calls refused without running the protected operation
    pub rejected_count: u64,

    pub consecutive_failures: u64,

    pub current_state: CircuitState,

    /// Failure rate over admitted calls (0.0 to 1.0)
    pub failure_rate: f64,
}

impl CircuitBreakerMetrics {
    pub fn is_healthy(&self) -> bool {
        match self.current_state {
            CircuitState::Closed => self.failure_rate < 0.1,
            CircuitState::Open => false,
            CircuitState::HalfOpen => true,
        }
    }

    /// Get human-readable state description
    pub fn state_description(&self) -> &'static str {
        match self.current_state {
            CircuitState::Closed => "Healthy - Normal operation",
            CircuitState::Open => "Failing - Rejecting all calls",
            CircuitState::HalfOpen => "Recovering - Testing with a trial call",
        }
    }

    /// Format metrics for logging
    pub fn format_summary(&self) -> String {
        format!(
            "State: {} | Calls: {} | Failures: {} | Rejected: {} | Failure rate: {:.1}%",
            self.state_description(),
            self.total_calls,
            self.failure_count,
            self.rejected_count,
            self.failure_rate * 100.0
        )
    }
}

/// Lock-free counters updated on every admitted or rejected call.
#[derive(Debug, Default)]
pub(crate) struct AtomicCircuitBreakerMetrics {
    total_calls: AtomicU64,
    success_count: AtomicU64,
    failure_count: AtomicU64,
    rejected_count: AtomicU64,
}

impl AtomicCircuitBreakerMetrics {
    #[inline]
    pub(crate) fn record_success(&self) {
        self.total_calls.fetch_add(1, Ordering::Relaxed);
        self.success_count.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_failure(&self) {
        self.total_calls.fetch_add(1, Ordering::Relaxed);
        self.failure_count.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_rejection(&self) {
        self.rejected_count.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(
        &self,
        state: CircuitState,
        consecutive_failures: u64,
    ) -> CircuitBreakerMetrics {
        let total_calls = self.total_calls.load(Ordering::Relaxed);
        let failure_count = self.failure_count.load(Ordering::Relaxed);
        let failure_rate = if total_calls > 0 {
            failure_count as f64 / total_calls as f64
        } else {
            0.0
        };

        CircuitBreakerMetrics {
            total_calls,
            success_count: self.success_count.load(Ordering::Relaxed),
            failure_count,
            rejected_count: self.rejected_count.load(Ordering::Relaxed),
            consecutive_failures,
            current_state: state,
            failure_rate,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_rates() {
        let metrics = AtomicCircuitBreakerMetrics::default();
        metrics.record_success();
        metrics.record_failure();
        metrics.record_failure();
        metrics.record_failure();
        metrics.record_rejection();

        let snapshot = metrics.snapshot(CircuitState::Open, 3);
        assert_eq!(snapshot.total_calls, 4);
        assert_eq!(snapshot.rejected_count, 1);
        assert_eq!(snapshot.failure_rate, 0.75);
        assert!(!snapshot.is_healthy());
        assert!(snapshot.format_summary().contains("Rejected: 1"));
    }

    #[test]
    fn test_empty_snapshot_is_healthy() {
        let snapshot = AtomicCircuitBreakerMetrics::default().snapshot(CircuitState::Closed, 0);
        assert_eq!(snapshot.failure_rate, 0.0);
        assert!(snapshot.is_healthy());
    }
}
