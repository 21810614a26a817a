//! Interceptor construction.

use super::{Decorated, Interceptor};
use crate::cache::{CacheStore, MemoryCacheStore};
use crate::config::{GlobalOptions, PolicyDocument};
use crate::error::ConfigResult;
use crate::logging::{LogSink, TracingLogSink};
use crate::models::MethodIdentity;
use crate::pipeline::ErrorCallback;
use crate::policy::{MethodPolicy, PolicySelector, PolicyStore};
use crate::resilience::CircuitRegistry;
use std::sync::Arc;
use tracing::info;

/// Collects policies and collaborators, then resolves everything in
/// [`build`](InterceptorBuilder::build).
///
/// Unset collaborators default to a [`MemoryCacheStore`], the
/// [`TracingLogSink`] and a fresh [`CircuitRegistry`] owned by this
/// interceptor. Pass [`CircuitRegistry::global`] (or any shared registry) to
/// [`circuit_registry`](Self::circuit_registry) to share breakers between
/// interceptors.
pub struct InterceptorBuilder<T: Decorated> {
    target: Arc<T>,
    policies: Vec<(PolicySelector, MethodPolicy)>,
    options: GlobalOptions,
    cache: Option<Arc<dyn CacheStore>>,
    sink: Option<Arc<dyn LogSink>>,
    registry: Option<Arc<CircuitRegistry>>,
    on_error: Option<Arc<ErrorCallback>>,
}

impl<T: Decorated> InterceptorBuilder<T> {
    pub fn new(target: Arc<T>) -> Self {
        Self {
            target,
            policies: Vec::new(),
            options: GlobalOptions::default(),
            cache: None,
            sink: None,
            registry: None,
            on_error: None,
        }
    }

    /// Attach a policy to one overload.
    pub fn policy(mut self, identity: MethodIdentity, policy: MethodPolicy) -> Self {
        self.policies
            .push((PolicySelector::Identity(identity), policy));
        self
    }

    /// Attach a policy to every overload with this name.
    pub fn policy_for(mut self, name: impl Into<String>, policy: MethodPolicy) -> Self {
        self.policies.push((PolicySelector::Name(name.into()), policy));
        self
    }

    /// Take options and per-name policies from a loaded document.
    pub fn document(mut self, document: PolicyDocument) -> Self {
        self.options = document.options;
        self.policies.extend(
            document
                .methods
                .into_iter()
                .map(|(name, policy)| (PolicySelector::Name(name), policy)),
        );
        self
    }

    pub fn options(mut self, options: GlobalOptions) -> Self {
        self.options = options;
        self
    }

    pub fn cache(mut self, cache: Arc<dyn CacheStore>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn log_sink(mut self, sink: Arc<dyn LogSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Share breakers through `registry` instead of a registry private to
    /// this interceptor.
    pub fn circuit_registry(mut self, registry: Arc<CircuitRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Called with the method and the final error of every failed call,
    /// after audit logging. Retried attempts that later succeed and failures
    /// recovered by a fallback are not reported.
    pub fn on_error<F>(mut self, callback: F) -> Self
    where
        F: Fn(&MethodIdentity, &(dyn std::error::Error + 'static)) + Send + Sync + 'static,
    {
        self.on_error = Some(Arc::new(callback));
        self
    }

    /// Resolve every method's policy and fallback target.
    ///
    /// Fails on duplicate method declarations, policies naming unknown
    /// methods, out-of-range policy values and unresolvable fallbacks. Every
    /// circuit breaker is registered here, which fails when a shared registry
    /// already holds a breaker for the same method under another policy.
    pub fn build(self) -> ConfigResult<Interceptor<T>> {
        let descriptors = self.target.methods();
        let store = PolicyStore::build::<T::Error>(&descriptors, &self.policies, &self.options)?;

        let cache = self
            .cache
            .unwrap_or_else(|| Arc::new(MemoryCacheStore::new()));
        let sink = self.sink.unwrap_or_else(|| Arc::new(TracingLogSink));
        let registry = self
            .registry
            .unwrap_or_else(|| Arc::new(CircuitRegistry::new()));

        for entry in store.iter() {
            if let Some(policy) = &entry.policy.circuit_breaker {
                registry.register(entry.identity(), policy)?;
            }
        }

        info!(
            methods = store.len(),
            policies = self.policies.len(),
            cache_provider = cache.provider_name(),
            enable_retries = self.options.enable_retries,
            enable_validation = self.options.enable_validation,
            enable_timing = self.options.enable_timing,
            "🔧 Interceptor built"
        );

        Ok(Interceptor {
            target: self.target,
            store,
            cache,
            sink,
            registry,
            on_error: self.on_error,
        })
    }
}
