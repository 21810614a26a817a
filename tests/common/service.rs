//! A decorated test service with call counting and scripted failures.

use interceptor_core::error::{Classify, Failure};
use interceptor_core::interceptor::{Decorated, Interceptor, Reply};
use interceptor_core::models::{Arguments, MethodDescriptor, MethodIdentity};
use interceptor_core::policy::MethodPolicy;
use interceptor_core::resilience::CircuitRegistry;
use interceptor_core::test_utils::RecordingLogSink;
use interceptor_core::validation::{FieldRule, Validated};
use interceptor_core::MemoryCacheStore;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

pub const SERVICE: &str = "TestService";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ServiceError {
    #[error("transient failure in {0}")]
    Transient(String),

    #[error("permanent failure in {0}")]
    Permanent(String),
}

impl Classify for ServiceError {
    fn kind(&self) -> &str {
        match self {
            ServiceError::Transient(_) => "transient",
            ServiceError::Permanent(_) => "permanent",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub name: Option<String>,
    pub email: String,
}

impl Validated for User {
    fn field_rules() -> Vec<FieldRule> {
        vec![
            FieldRule::required("name"),
            FieldRule::max_length("email", 64),
        ]
    }
}

pub fn id(name: &str) -> MethodIdentity {
    MethodIdentity::new(SERVICE, name)
}

pub fn get_value() -> MethodIdentity {
    id("get_value").param("i32")
}

pub fn get_async() -> MethodIdentity {
    id("get_async").param("String")
}

pub fn notify() -> MethodIdentity {
    id("notify").param("String")
}

pub fn always_fails() -> MethodIdentity {
    id("always_fails")
}

pub fn always_fails_async() -> MethodIdentity {
    id("always_fails_async")
}

pub fn permanent_failure() -> MethodIdentity {
    id("permanent_failure")
}

pub fn fallback_value() -> MethodIdentity {
    id("fallback_value")
}

pub fn fallback_value_async() -> MethodIdentity {
    id("fallback_value_async")
}

pub fn fallback_with_error() -> MethodIdentity {
    id("fallback_with_error").failure_param::<ServiceError>()
}

pub fn fallback_fails() -> MethodIdentity {
    id("fallback_fails")
}

pub fn create_user() -> MethodIdentity {
    id("create_user").param("User")
}

pub fn toggle() -> MethodIdentity {
    id("toggle")
}

#[derive(Default)]
pub struct TestService {
    calls: Mutex<HashMap<String, usize>>,
    notifications: Mutex<Vec<String>>,
    received_failures: Mutex<Vec<String>>,
    unhealthy: AtomicBool,
}

impl TestService {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn calls(&self, method: &str) -> usize {
        self.calls.lock().get(method).copied().unwrap_or(0)
    }

    pub fn notifications(&self) -> Vec<String> {
        self.notifications.lock().clone()
    }

    pub fn received_failures(&self) -> Vec<String> {
        self.received_failures.lock().clone()
    }

    /// Make `toggle` fail until switched back.
    pub fn set_unhealthy(&self, unhealthy: bool) {
        self.unhealthy.store(unhealthy, Ordering::SeqCst);
    }

    fn record_call(&self, method: &str) {
        *self.calls.lock().entry(method.to_string()).or_insert(0) += 1;
    }
}

impl Decorated for TestService {
    type Error = ServiceError;

    fn methods(&self) -> Vec<MethodDescriptor> {
        vec![
            MethodDescriptor::sync(get_value()),
            MethodDescriptor::async_value(get_async()),
            MethodDescriptor::async_void(notify()),
            MethodDescriptor::sync(always_fails()),
            MethodDescriptor::async_value(always_fails_async()),
            MethodDescriptor::sync(permanent_failure()),
            MethodDescriptor::sync(fallback_value()),
            MethodDescriptor::async_value(fallback_value_async()),
            MethodDescriptor::sync(fallback_with_error()),
            MethodDescriptor::sync(fallback_fails()),
            MethodDescriptor::sync(create_user()),
            MethodDescriptor::sync(toggle()),
        ]
    }

    fn invoke<'a>(
        &'a self,
        method: &'a MethodIdentity,
        args: &'a Arguments,
        failure: Option<Failure<ServiceError>>,
    ) -> Reply<'a, ServiceError> {
        let name = method.name();
        self.record_call(name);

        match name {
            "get_value" => Reply::ready(
                args.decode::<i32>(0)
                    .map(|x| json!(x * 2))
                    .map_err(|e| ServiceError::Permanent(e.to_string())),
            ),
            "get_async" => Reply::pending(async move {
                tokio::time::sleep(Duration::from_millis(1)).await;
                let key: String = args
                    .decode(0)
                    .map_err(|e| ServiceError::Permanent(e.to_string()))?;
                Ok::<_, ServiceError>(json!(format!("value:{key}")))
            }),
            "notify" => Reply::pending(async move {
                tokio::time::sleep(Duration::from_millis(1)).await;
                let message: String = args
                    .decode(0)
                    .map_err(|e| ServiceError::Permanent(e.to_string()))?;
                self.notifications.lock().push(message);
                Ok::<_, ServiceError>(Value::Null)
            }),
            "always_fails" => Reply::ready(Err(ServiceError::Transient(name.to_string()))),
            "always_fails_async" => Reply::pending(async move {
                tokio::time::sleep(Duration::from_millis(1)).await;
                Err::<Value, _>(ServiceError::Transient("always_fails_async".to_string()))
            }),
            "permanent_failure" => Reply::ready(Err(ServiceError::Permanent(name.to_string()))),
            "fallback_value" => Reply::ready(Ok(json!("fallback"))),
            "fallback_value_async" => Reply::pending(async { Ok::<_, ServiceError>(json!("fallback-async")) }),
            "fallback_with_error" => {
                let message = failure
                    .map(|f| f.to_string())
                    .unwrap_or_else(|| "no failure".to_string());
                self.received_failures.lock().push(message.clone());
                Reply::ready(Ok(json!(format!("recovered: {message}"))))
            }
            "fallback_fails" => Reply::ready(Err(ServiceError::Permanent(name.to_string()))),
            "create_user" => Reply::ready(
                args.decode::<User>(0)
                    .map(|user| json!(user.name))
                    .map_err(|e| ServiceError::Permanent(e.to_string())),
            ),
            "toggle" => {
                if self.unhealthy.load(Ordering::SeqCst) {
                    Reply::ready(Err(ServiceError::Transient(name.to_string())))
                } else {
                    Reply::ready(Ok(json!("healthy")))
                }
            }
            other => Reply::ready(Err(ServiceError::Permanent(format!("unknown {other}")))),
        }
    }
}

/// Everything a test needs to inspect after driving an interceptor.
pub struct Harness {
    pub service: Arc<TestService>,
    pub interceptor: Interceptor<TestService>,
    pub sink: Arc<RecordingLogSink>,
    pub cache: Arc<MemoryCacheStore>,
    pub registry: Arc<CircuitRegistry>,
}

pub fn harness(policies: Vec<(MethodIdentity, MethodPolicy)>) -> Harness {
    let service = TestService::new();
    let sink = Arc::new(RecordingLogSink::new());
    let cache = Arc::new(MemoryCacheStore::new());
    let registry = Arc::new(CircuitRegistry::new());

    let mut builder = Interceptor::builder(Arc::clone(&service))
        .log_sink(sink.clone())
        .cache(cache.clone())
        .circuit_registry(Arc::clone(&registry));
    for (identity, policy) in policies {
        builder = builder.policy(identity, policy);
    }

    Harness {
        service,
        interceptor: builder.build().expect("interceptor builds"),
        sink,
        cache,
        registry,
    }
}
