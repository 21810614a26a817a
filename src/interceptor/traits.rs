//! The boundary between the interceptor and the implementation it wraps.

use crate::error::{Classify, Failure};
use crate::models::{Arguments, MethodDescriptor, MethodIdentity};
use futures::future::BoxFuture;
use serde_json::Value;
use std::future::Future;

/// Result of handing one call to the decorated implementation.
pub enum Reply<'a, E> {
    /// A synchronous operation finished on the caller's thread.
    Ready(Result<Value, E>),
    /// A suspending operation; the pipeline awaits it.
    Pending(BoxFuture<'a, Result<Value, E>>),
}

impl<'a, E> Reply<'a, E> {
    pub fn ready(result: Result<Value, E>) -> Self {
        Reply::Ready(result)
    }

    pub fn pending<F>(future: F) -> Self
    where
        F: Future<Output = Result<Value, E>> + Send + 'a,
    {
        Reply::Pending(Box::pin(future))
    }

    pub(crate) async fn resolve(self) -> Result<Value, E> {
        match self {
            Reply::Ready(result) => result,
            Reply::Pending(future) => future.await,
        }
    }
}

impl<E> std::fmt::Debug for Reply<'_, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Reply::Ready(_) => f.write_str("Reply::Ready"),
            Reply::Pending(_) => f.write_str("Reply::Pending"),
        }
    }
}

/// A capability whose methods can be intercepted.
///
/// `methods` lists every operation once, with its call shape. `invoke`
/// dispatches by identity; results travel as JSON values and `AsyncVoid`
/// operations return `Value::Null`. `failure` is `Some` only when the
/// operation runs as an exception-accepting fallback.
///
/// ```rust
/// use interceptor_core::error::{Classify, Failure};
/// use interceptor_core::interceptor::{Decorated, Reply};
/// use interceptor_core::models::{Arguments, MethodDescriptor, MethodIdentity};
/// use serde_json::json;
///
/// #[derive(Debug, thiserror::Error)]
/// #[error("lookup failed")]
/// struct LookupError;
///
/// impl Classify for LookupError {
///     fn kind(&self) -> &str {
///         "lookup"
///     }
/// }
///
/// struct Greeter;
///
/// impl Decorated for Greeter {
///     type Error = LookupError;
///
///     fn methods(&self) -> Vec<MethodDescriptor> {
///         vec![MethodDescriptor::sync(MethodIdentity::new("Greeter", "hello").param("String"))]
///     }
///
///     fn invoke<'a>(
///         &'a self,
///         _method: &'a MethodIdentity,
///         args: &'a Arguments,
///         _failure: Option<Failure<LookupError>>,
///     ) -> Reply<'a, LookupError> {
///         let name: String = args.decode(0).unwrap_or_default();
///         Reply::ready(Ok(json!(format!("hello {name}"))))
///     }
/// }
/// ```
pub trait Decorated: Send + Sync + 'static {
    type Error: Classify;

    fn methods(&self) -> Vec<MethodDescriptor>;

    fn invoke<'a>(
        &'a self,
        method: &'a MethodIdentity,
        args: &'a Arguments,
        failure: Option<Failure<Self::Error>>,
    ) -> Reply<'a, Self::Error>;
}
