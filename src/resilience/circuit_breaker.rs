//! # Circuit Breaker Implementation
//!
//! Per-method fault isolation with three states: Closed (normal operation),
//! Open (failing fast) and Half-Open (one trial call tests recovery).
//!
//! State, the consecutive-failure counter and the open timestamp live behind
//! one lock, so every read-modify-write is serialized and concurrent callers
//! never under- or over-count failures. The lock is never held across an
//! await point.

use crate::error::Failure;
use crate::models::MethodIdentity;
use crate::policy::CircuitBreakerPolicy;
use crate::resilience::metrics::{AtomicCircuitBreakerMetrics, CircuitBreakerMetrics};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Circuit breaker states representing the current operational mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CircuitState {
    /// Normal operation - all calls are allowed through
    Closed,
    /// Failure mode - all calls fail fast without executing
    Open,
    /// Testing recovery - a single trial call is allowed through
    HalfOpen,
}

#[derive(Debug)]
struct CircuitCore {
    state: CircuitState,
    consecutive_failures: u64,
    opened_at: Option<Instant>,
    trial_in_flight: bool,
}

impl CircuitCore {
    fn closed() -> Self {
        Self {
            state: CircuitState::Closed,
            consecutive_failures: 0,
            opened_at: None,
            trial_in_flight: false,
        }
    }
}

/// How a call was let through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Admission {
    Normal,
    Trial,
}

/// Releases a half-open trial slot if the admitted call is dropped before
/// it reports an outcome.
struct AdmissionGuard<'a> {
    breaker: &'a CircuitBreaker,
    admission: Admission,
    settled: bool,
}

impl AdmissionGuard<'_> {
    fn settle(mut self, success: bool) {
        self.settled = true;
        if success {
            self.breaker.record_success(self.admission);
        } else {
            self.breaker.record_failure(self.admission);
        }
    }
}

impl Drop for AdmissionGuard<'_> {
    fn drop(&mut self) {
        if !self.settled && self.admission == Admission::Trial {
            let mut core = self.breaker.core.lock();
            core.trial_in_flight = false;
            debug!(method = %self.breaker.identity, "Half-open trial abandoned");
        }
    }
}

#[derive(Debug)]
pub struct CircuitBreaker {
    identity: MethodIdentity,
    threshold: u64,
    break_duration: Duration,
    core: Mutex<CircuitCore>,
    metrics: AtomicCircuitBreakerMetrics,
}

impl CircuitBreaker {
    pub fn new(identity: MethodIdentity, policy: &CircuitBreakerPolicy) -> Self {
        let threshold = u64::from(policy.threshold.max(1));
        let break_duration = policy.break_duration();

        info!(
            method = %identity,
            threshold = threshold,
            break_duration_ms = break_duration.as_millis() as u64,
            "🛡️ Circuit breaker initialized"
        );

        Self {
            identity,
            threshold,
            break_duration,
            core: Mutex::new(CircuitCore::closed()),
            metrics: AtomicCircuitBreakerMetrics::default(),
        }
    }

    pub fn identity(&self) -> &MethodIdentity {
        &self.identity
    }

    /// Whether this breaker trips and recovers the way `policy` describes.
    pub fn governed_by(&self, policy: &CircuitBreakerPolicy) -> bool {
        self.threshold == u64::from(policy.threshold.max(1))
            && self.break_duration == policy.break_duration()
    }

    /// Current state. An Open breaker whose break duration has elapsed still
    /// reports Open until the next call claims the trial.
    pub fn state(&self) -> CircuitState {
        self.core.lock().state
    }

    pub fn consecutive_failures(&self) -> u64 {
        self.core.lock().consecutive_failures
    }

    /// Execute an operation with circuit breaker protection.
    ///
    /// Rejected calls return [`Failure::CircuitOpen`] without running
    /// `operation`.
    pub async fn call<F, Fut, T, E>(&self, operation: F) -> Result<T, Failure<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: std::error::Error + 'static,
    {
        let guard = match self.admit() {
            Some(admission) => AdmissionGuard {
                breaker: self,
                admission,
                settled: false,
            },
            None => {
                self.metrics.record_rejection();
                debug!(method = %self.identity, "Circuit open, rejecting call");
                return Err(Failure::CircuitOpen {
                    method: self.identity.to_string(),
                });
            }
        };

        let result = operation().await;
        guard.settle(result.is_ok());
        result.map_err(Failure::Invocation)
    }

    fn admit(&self) -> Option<Admission> {
        let mut core = self.core.lock();
        match core.state {
            CircuitState::Closed => Some(Admission::Normal),
            CircuitState::Open => {
                let elapsed = core
                    .opened_at
                    .map(|opened| opened.elapsed() >= self.break_duration)
                    .unwrap_or(true);
                if elapsed {
                    core.state = CircuitState::HalfOpen;
                    core.trial_in_flight = true;
                    info!(method = %self.identity, "🟡 Circuit breaker half-open (trial call)");
                    Some(Admission::Trial)
                } else {
                    None
                }
            }
            CircuitState::HalfOpen if !core.trial_in_flight => {
                core.trial_in_flight = true;
                Some(Admission::Trial)
            }
            CircuitState::HalfOpen => None,
        }
    }

    fn record_success(&self, admission: Admission) {
        self.metrics.record_success();
        let mut core = self.core.lock();

        match (core.state, admission) {
            (CircuitState::HalfOpen, Admission::Trial) => {
                *core = CircuitCore::closed();
                info!(method = %self.identity, "🟢 Circuit breaker closed (recovered)");
            }
            (CircuitState::Closed, _) => {
                core.consecutive_failures = 0;
            }
            (state, _) => {
                debug!(method = %self.identity, state = ?state, "Late success ignored");
            }
        }
    }

    fn record_failure(&self, admission: Admission) {
        self.metrics.record_failure();
        let mut core = self.core.lock();

        match (core.state, admission) {
            (CircuitState::Closed, _) => {
                core.consecutive_failures += 1;
                if core.consecutive_failures >= self.threshold {
                    core.state = CircuitState::Open;
                    core.opened_at = Some(Instant::now());
                    error!(
                        method = %self.identity,
                        consecutive_failures = core.consecutive_failures,
                        threshold = self.threshold,
                        break_duration_ms = self.break_duration.as_millis() as u64,
                        "🔴 Circuit breaker opened (failing fast)"
                    );
                }
            }
            (CircuitState::HalfOpen, Admission::Trial) => {
                core.state = CircuitState::Open;
                core.opened_at = Some(Instant::now());
                core.trial_in_flight = false;
                core.consecutive_failures += 1;
                error!(method = %self.identity, "🔴 Circuit breaker re-opened (trial failed)");
            }
            (state, _) => {
                debug!(method = %self.identity, state = ?state, "Late failure ignored");
            }
        }
    }

    /// Force circuit to open state (for emergency situations)
    pub fn force_open(&self) {
        warn!(method = %self.identity, "🚨 Circuit breaker forced open");
        let mut core = self.core.lock();
        core.state = CircuitState::Open;
        core.opened_at = Some(Instant::now());
        core.trial_in_flight = false;
    }

    /// Force circuit to closed state (for emergency recovery)
    pub fn force_closed(&self) {
        warn!(method = %self.identity, "🚨 Circuit breaker forced closed");
        *self.core.lock() = CircuitCore::closed();
    }

    pub fn metrics(&self) -> CircuitBreakerMetrics {
        let (state, consecutive_failures) = {
            let core = self.core.lock();
            (core.state, core.consecutive_failures)
        };
        self.metrics.snapshot(state, consecutive_failures)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tokio::time::sleep;

    #[derive(Debug, thiserror::Error)]
    #[error("operation failed")]
    struct OpError;

    fn breaker(threshold: u32, break_duration: Duration) -> CircuitBreaker {
        CircuitBreaker::new(
            MethodIdentity::new("Svc", "op"),
            &CircuitBreakerPolicy::new(threshold, break_duration),
        )
    }

    #[tokio::test]
    async fn test_circuit_breaker_normal_operation() {
        let circuit = breaker(3, Duration::from_millis(100));
        assert_eq!(circuit.state(), CircuitState::Closed);

        let result = circuit.call(|| async { Ok::<_, OpError>("success") }).await;
        assert!(result.is_ok());

        let metrics = circuit.metrics();
        assert_eq!(metrics.total_calls, 1);
        assert_eq!(metrics.success_count, 1);
        assert_eq!(metrics.failure_count, 0);
    }

    #[tokio::test]
    async fn test_circuit_breaker_opens_on_failures() {
        let circuit = breaker(2, Duration::from_secs(30));

        let _ = circuit.call(|| async { Err::<(), _>(OpError) }).await;
        assert_eq!(circuit.state(), CircuitState::Closed);

        let _ = circuit.call(|| async { Err::<(), _>(OpError) }).await;
        assert_eq!(circuit.state(), CircuitState::Open);

        let ran = AtomicUsize::new(0);
        let result = circuit
            .call(|| async {
                ran.fetch_add(1, Ordering::SeqCst);
                Ok::<_, OpError>("should not execute")
            })
            .await;
        assert!(matches!(result, Err(Failure::CircuitOpen { .. })));
        assert_eq!(ran.load(Ordering::SeqCst), 0);
        assert_eq!(circuit.metrics().rejected_count, 1);
    }

    #[tokio::test]
    async fn test_success_resets_consecutive_failures() {
        let circuit = breaker(3, Duration::from_secs(30));

        let _ = circuit.call(|| async { Err::<(), _>(OpError) }).await;
        let _ = circuit.call(|| async { Err::<(), _>(OpError) }).await;
        assert_eq!(circuit.consecutive_failures(), 2);

        let _ = circuit.call(|| async { Ok::<_, OpError>(()) }).await;
        assert_eq!(circuit.consecutive_failures(), 0);

        let _ = circuit.call(|| async { Err::<(), _>(OpError) }).await;
        assert_eq!(circuit.state(), CircuitState::Closed);
    }

    #[tokio::test]
    async fn test_circuit_breaker_recovery() {
        let circuit = breaker(1, Duration::from_millis(50));

        let _ = circuit.call(|| async { Err::<(), _>(OpError) }).await;
        assert_eq!(circuit.state(), CircuitState::Open);

        sleep(Duration::from_millis(60)).await;

        let result = circuit.call(|| async { Ok::<_, OpError>("success") }).await;
        assert!(result.is_ok());
        assert_eq!(circuit.state(), CircuitState::Closed);
        assert_eq!(circuit.consecutive_failures(), 0);
    }

    #[tokio::test]
    async fn test_failed_trial_reopens() {
        let circuit = breaker(1, Duration::from_millis(50));

        let _ = circuit.call(|| async { Err::<(), _>(OpError) }).await;
        sleep(Duration::from_millis(60)).await;

        let result = circuit.call(|| async { Err::<(), _>(OpError) }).await;
        assert!(matches!(result, Err(Failure::Invocation(OpError))));
        assert_eq!(circuit.state(), CircuitState::Open);

        // The failed trial restarted the break window.
        let result = circuit.call(|| async { Ok::<_, OpError>(()) }).await;
        assert!(matches!(result, Err(Failure::CircuitOpen { .. })));
    }

    #[tokio::test]
    async fn test_single_trial_in_half_open() {
        let circuit = Arc::new(breaker(1, Duration::from_millis(20)));
        let _ = circuit.call(|| async { Err::<(), _>(OpError) }).await;
        sleep(Duration::from_millis(30)).await;

        let (release, wait) = tokio::sync::oneshot::channel::<()>();
        let trial = {
            let circuit = Arc::clone(&circuit);
            tokio::spawn(async move {
                circuit
                    .call(|| async move {
                        let _ = wait.await;
                        Ok::<_, OpError>(())
                    })
                    .await
            })
        };

        // Let the trial claim its slot.
        sleep(Duration::from_millis(10)).await;
        assert_eq!(circuit.state(), CircuitState::HalfOpen);

        let concurrent = circuit.call(|| async { Ok::<_, OpError>(()) }).await;
        assert!(matches!(concurrent, Err(Failure::CircuitOpen { .. })));

        release.send(()).unwrap();
        assert!(trial.await.unwrap().is_ok());
        assert_eq!(circuit.state(), CircuitState::Closed);
    }

    #[tokio::test]
    async fn test_concurrent_failures_are_counted_exactly() {
        let circuit = Arc::new(breaker(1000, Duration::from_secs(30)));

        let handles: Vec<_> = (0..50)
            .map(|_| {
                let circuit = Arc::clone(&circuit);
                tokio::spawn(async move {
                    let _ = circuit.call(|| async { Err::<(), _>(OpError) }).await;
                })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(circuit.consecutive_failures(), 50);
        assert_eq!(circuit.metrics().failure_count, 50);
    }

    #[tokio::test]
    async fn test_force_operations() {
        let circuit = breaker(1, Duration::from_secs(1));

        circuit.force_open();
        assert_eq!(circuit.state(), CircuitState::Open);

        circuit.force_closed();
        assert_eq!(circuit.state(), CircuitState::Closed);
    }
}
