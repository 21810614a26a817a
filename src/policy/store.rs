//! Resolved per-method policy table.

use super::{
    AuditPolicy, CachePolicy, CircuitBreakerPolicy, FallbackPolicy, MethodPolicy, RetryPolicy,
};
use crate::config::GlobalOptions;
use crate::error::{ConfigResult, ConfigurationError};
use crate::models::{MethodDescriptor, MethodIdentity};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::debug;

/// Effective configuration for one method. Read-only after resolution.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PolicyConfig {
    pub retry: Option<RetryPolicy>,
    pub circuit_breaker: Option<CircuitBreakerPolicy>,
    pub fallback: Option<FallbackPolicy>,
    pub cache: Option<CachePolicy>,
    pub audit: Option<AuditPolicy>,
    pub validate: bool,
    pub timing: bool,
}

impl PolicyConfig {
    /// Apply the global switches to declared metadata.
    pub fn resolve(policy: &MethodPolicy, options: &GlobalOptions) -> Self {
        Self {
            retry: policy.retry.clone().filter(|_| options.enable_retries),
            circuit_breaker: policy.circuit_breaker.clone(),
            fallback: policy.fallback.clone(),
            cache: policy.cache.clone(),
            audit: policy.audit.clone(),
            validate: policy.validate && options.enable_validation,
            timing: policy.measure_time && options.enable_timing,
        }
    }
}

/// The operation a fallback policy resolved to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FallbackTarget {
    pub identity: MethodIdentity,
    /// The target takes the captured failure as a trailing parameter.
    pub passes_failure: bool,
}

#[derive(Debug, Clone)]
pub struct MethodEntry {
    pub descriptor: MethodDescriptor,
    pub policy: PolicyConfig,
    pub fallback: Option<FallbackTarget>,
}

impl MethodEntry {
    pub fn identity(&self) -> &MethodIdentity {
        &self.descriptor.identity
    }
}

/// Which methods a policy applies to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PolicySelector {
    /// Exactly one overload.
    Identity(MethodIdentity),
    /// Every overload with this name (ASCII case-insensitive).
    Name(String),
}

impl PolicySelector {
    fn matches(&self, identity: &MethodIdentity) -> bool {
        match self {
            PolicySelector::Identity(id) => id == identity,
            PolicySelector::Name(name) => identity.name().eq_ignore_ascii_case(name),
        }
    }

    fn describe(&self) -> String {
        match self {
            PolicySelector::Identity(id) => id.to_string(),
            PolicySelector::Name(name) => name.clone(),
        }
    }
}

#[derive(Debug, Default)]
pub struct PolicyStore {
    entries: HashMap<MethodIdentity, Arc<MethodEntry>>,
}

impl PolicyStore {
    /// Resolve every declared method against the supplied policies.
    ///
    /// Later policies replace earlier ones for the same method. `E` is the
    /// implementation's error type, needed to recognise exception-accepting
    /// fallback signatures.
    pub fn build<E: std::error::Error + 'static>(
        descriptors: &[MethodDescriptor],
        policies: &[(PolicySelector, MethodPolicy)],
        options: &GlobalOptions,
    ) -> ConfigResult<Self> {
        let mut declared: HashSet<&MethodIdentity> = HashSet::new();
        for descriptor in descriptors {
            if !declared.insert(&descriptor.identity) {
                return Err(ConfigurationError::DuplicateMethod {
                    method: descriptor.identity.to_string(),
                });
            }
        }

        let mut assigned: HashMap<&MethodIdentity, &MethodPolicy> = HashMap::new();
        for (selector, policy) in policies {
            let mut matched = false;
            for descriptor in descriptors.iter().filter(|d| selector.matches(&d.identity)) {
                policy
                    .check()
                    .map_err(|reason| ConfigurationError::InvalidPolicy {
                        method: descriptor.identity.to_string(),
                        reason,
                    })?;
                assigned.insert(&descriptor.identity, policy);
                matched = true;
            }
            if !matched {
                return Err(ConfigurationError::UnknownMethod {
                    method: selector.describe(),
                });
            }
        }

        let mut entries = HashMap::with_capacity(descriptors.len());
        for descriptor in descriptors {
            let policy = assigned
                .get(&descriptor.identity)
                .map(|p| PolicyConfig::resolve(p, options))
                .unwrap_or_default();

            let fallback = match &policy.fallback {
                Some(fallback) => Some(resolve_fallback::<E>(
                    descriptor,
                    &fallback.target,
                    descriptors,
                )?),
                None => None,
            };

            debug!(
                method = %descriptor.identity,
                shape = %descriptor.shape,
                retry = policy.retry.is_some(),
                circuit_breaker = policy.circuit_breaker.is_some(),
                fallback = ?fallback.as_ref().map(|f| f.identity.to_string()),
                cache = policy.cache.is_some(),
                audit = policy.audit.is_some(),
                validate = policy.validate,
                timing = policy.timing,
                "Resolved method policy"
            );

            entries.insert(
                descriptor.identity.clone(),
                Arc::new(MethodEntry {
                    descriptor: descriptor.clone(),
                    policy,
                    fallback,
                }),
            );
        }

        Ok(Self { entries })
    }

    pub fn get(&self, identity: &MethodIdentity) -> Option<&Arc<MethodEntry>> {
        self.entries.get(identity)
    }

    /// Look up a method by name when the name is not overloaded.
    pub fn find_by_name(&self, name: &str) -> Option<&Arc<MethodEntry>> {
        let mut matches = self.entries.values().filter(|e| e.identity().name() == name);
        match (matches.next(), matches.next()) {
            (Some(entry), None) => Some(entry),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<MethodEntry>> {
        self.entries.values()
    }
}

/// Exact parameter list first, then the list plus a trailing failure
/// parameter. The target must share the primary's call shape.
fn resolve_fallback<E: std::error::Error + 'static>(
    primary: &MethodDescriptor,
    target: &str,
    descriptors: &[MethodDescriptor],
) -> ConfigResult<FallbackTarget> {
    let params = primary.identity.parameter_types();
    let candidates: Vec<&MethodDescriptor> = descriptors
        .iter()
        .filter(|d| d.identity.name() == target && d.shape == primary.shape)
        .collect();

    if let Some(exact) = candidates
        .iter()
        .find(|d| d.identity.parameter_types() == params)
    {
        return Ok(FallbackTarget {
            identity: exact.identity.clone(),
            passes_failure: false,
        });
    }

    let failure_type = MethodIdentity::failure_type_name::<E>();
    let with_failure = candidates.iter().find(|d| {
        let candidate = d.identity.parameter_types();
        candidate.len() == params.len() + 1
            && candidate[..params.len()] == *params
            && candidate[params.len()] == failure_type
    });

    match with_failure {
        Some(found) => Ok(FallbackTarget {
            identity: found.identity.clone(),
            passes_failure: true,
        }),
        None => Err(ConfigurationError::FallbackResolution {
            method: primary.identity.to_string(),
            target: target.to_string(),
        }),
    }
}
