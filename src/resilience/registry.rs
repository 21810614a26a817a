//! # Circuit Breaker Registry
//!
//! Holds one breaker per method identity. Every interceptor built against the
//! same registry shares the breaker of a given method, so failures recorded
//! through one wrapper trip the circuit for all of them.

use crate::error::{ConfigResult, ConfigurationError};
use crate::models::MethodIdentity;
use crate::policy::CircuitBreakerPolicy;
use crate::resilience::{CircuitBreaker, CircuitBreakerMetrics, CircuitState};
use dashmap::DashMap;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};
use tracing::{info, warn};

static GLOBAL_REGISTRY: OnceLock<Arc<CircuitRegistry>> = OnceLock::new();

#[derive(Debug, Default)]
pub struct CircuitRegistry {
    breakers: DashMap<MethodIdentity, Arc<CircuitBreaker>>,
}

impl CircuitRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Process-wide registry. Builders only use it when it is passed to
    /// [`circuit_registry`](crate::interceptor::InterceptorBuilder::circuit_registry).
    pub fn global() -> Arc<CircuitRegistry> {
        Arc::clone(GLOBAL_REGISTRY.get_or_init(|| Arc::new(CircuitRegistry::new())))
    }

    /// Get or create the breaker for a method.
    ///
    /// The policy only applies when the breaker is created; later callers get
    /// the existing breaker unchanged.
    pub fn breaker_for(
        &self,
        identity: &MethodIdentity,
        policy: &CircuitBreakerPolicy,
    ) -> Arc<CircuitBreaker> {
        if let Some(existing) = self.breakers.get(identity) {
            return Arc::clone(existing.value());
        }

        let entry = self
            .breakers
            .entry(identity.clone())
            .or_insert_with(|| Arc::new(CircuitBreaker::new(identity.clone(), policy)));
        let breaker = Arc::clone(entry.value());
        drop(entry);

        info!(
            method = %identity,
            total_circuit_breakers = self.breakers.len(),
            "Registered circuit breaker"
        );
        breaker
    }

    /// Like [`breaker_for`](Self::breaker_for), but fails when the method
    /// already has a breaker governed by a different policy.
    pub fn register(
        &self,
        identity: &MethodIdentity,
        policy: &CircuitBreakerPolicy,
    ) -> ConfigResult<Arc<CircuitBreaker>> {
        let breaker = self.breaker_for(identity, policy);
        if !breaker.governed_by(policy) {
            warn!(method = %identity, "Conflicting circuit breaker policy");
            return Err(ConfigurationError::BreakerConflict {
                method: identity.to_string(),
            });
        }
        Ok(breaker)
    }

    pub fn get(&self, identity: &MethodIdentity) -> Option<Arc<CircuitBreaker>> {
        self.breakers
            .get(identity)
            .map(|entry| Arc::clone(entry.value()))
    }

    pub fn list_methods(&self) -> Vec<MethodIdentity> {
        self.breakers
            .iter()
            .map(|entry| entry.key().clone())
            .collect()
    }

    pub fn metrics(&self, identity: &MethodIdentity) -> Option<CircuitBreakerMetrics> {
        self.get(identity).map(|breaker| breaker.metrics())
    }

    /// Count of breakers in each state.
    pub fn state_summary(&self) -> HashMap<CircuitState, usize> {
        let mut summary = HashMap::new();
        for entry in self.breakers.iter() {
            *summary.entry(entry.value().state()).or_insert(0) += 1;
        }
        summary
    }

    /// Force open all circuit breakers (emergency stop)
    pub fn force_open_all(&self) {
        warn!("🚨 Forcing all circuit breakers open (emergency stop)");
        for entry in self.breakers.iter() {
            entry.value().force_open();
        }
    }

    /// Force close all circuit breakers (emergency recovery)
    pub fn force_close_all(&self) {
        warn!("🚨 Forcing all circuit breakers closed (emergency recovery)");
        for entry in self.breakers.iter() {
            entry.value().force_closed();
        }
    }

    pub fn remove(&self, identity: &MethodIdentity) -> bool {
        let removed = self.breakers.remove(identity).is_some();
        if removed {
            info!(
                method = %identity,
                remaining_count = self.breakers.len(),
                "🗑️ Removed circuit breaker"
            );
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.breakers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.breakers.is_empty()
    }
}
