//! # Interceptor
//!
//! The wrapping object around a [`Decorated`] implementation. Each call is
//! routed by method identity to the resolved policy entry and then run
//! through the [`Pipeline`](crate::pipeline::Pipeline) with the strategy its
//! call shape requires.
//!
//! Callers normally go through the typed executors:
//!
//! - [`Interceptor::invoke_sync`] for [`CallShape::Sync`]
//! - [`Interceptor::invoke_async_void`] for [`CallShape::AsyncVoid`]
//! - [`Interceptor::invoke_async_value`] for [`CallShape::AsyncValue`]
//!
//! A capability trait is proxied by a struct that holds the interceptor and
//! implements each trait method with one of these calls.

pub mod builder;
pub mod traits;

pub use builder::InterceptorBuilder;
pub use traits::{Decorated, Reply};

use crate::cache::CacheStore;
use crate::error::InterceptError;
use crate::logging::LogSink;
use crate::models::{Arguments, CallShape, MethodDescriptor, MethodIdentity};
use crate::pipeline::{reconstruct, ErrorCallback, Pipeline};
use crate::policy::{MethodEntry, PolicyConfig, PolicyStore};
use crate::resilience::CircuitRegistry;
use futures::future::BoxFuture;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;

type CallResult<E> = Result<Value, InterceptError<E>>;

/// Outcome of routing a call by shape.
pub enum Dispatch<'a, E: std::error::Error + 'static> {
    /// The synchronous pipeline already ran on the caller's thread.
    Completed(CallResult<E>),
    /// The pipeline for a suspending call; nothing has run until it is polled.
    Suspended(BoxFuture<'a, CallResult<E>>),
}

impl<'a, E: std::error::Error + 'static> Dispatch<'a, E> {
    /// Await the result whatever the shape.
    pub async fn into_result(self) -> CallResult<E> {
        match self {
            Dispatch::Completed(result) => result,
            Dispatch::Suspended(future) => future.await,
        }
    }

    pub fn is_suspended(&self) -> bool {
        matches!(self, Dispatch::Suspended(_))
    }
}

impl<E: std::error::Error + 'static> std::fmt::Debug for Dispatch<'_, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Dispatch::Completed(result) => f.debug_tuple("Completed").field(result).finish(),
            Dispatch::Suspended(_) => f.write_str("Suspended"),
        }
    }
}

pub struct Interceptor<T: Decorated> {
    target: Arc<T>,
    store: PolicyStore,
    cache: Arc<dyn CacheStore>,
    sink: Arc<dyn LogSink>,
    registry: Arc<CircuitRegistry>,
    on_error: Option<Arc<ErrorCallback>>,
}

impl<T: Decorated> Interceptor<T> {
    pub fn builder(target: Arc<T>) -> InterceptorBuilder<T> {
        InterceptorBuilder::new(target)
    }

    pub fn target(&self) -> &Arc<T> {
        &self.target
    }

    /// Resolved policy for a method.
    pub fn policy(&self, method: &MethodIdentity) -> Option<&PolicyConfig> {
        self.store.get(method).map(|entry| &entry.policy)
    }

    /// Identity of a method by name, when the name is not overloaded.
    pub fn method(&self, name: &str) -> Option<&MethodIdentity> {
        self.store.find_by_name(name).map(|entry| entry.identity())
    }

    pub fn methods(&self) -> impl Iterator<Item = &MethodDescriptor> {
        self.store.iter().map(|entry| &entry.descriptor)
    }

    pub fn circuit_registry(&self) -> &Arc<CircuitRegistry> {
        &self.registry
    }

    /// Route a call by its declared shape.
    ///
    /// Sync calls run to completion before this returns. Async calls come
    /// back as a future that runs the pipeline when polled.
    pub fn invoke(
        &self,
        method: &MethodIdentity,
        arguments: Arguments,
    ) -> Result<Dispatch<'_, T::Error>, InterceptError<T::Error>> {
        let entry = self.entry(method)?;
        let pipeline = self.pipeline(entry);

        Ok(match entry.descriptor.shape {
            CallShape::Sync => Dispatch::Completed(futures::executor::block_on(pipeline.run(arguments))),
            CallShape::AsyncVoid | CallShape::AsyncValue => {
                Dispatch::Suspended(Box::pin(pipeline.run(arguments)))
            }
        })
    }

    /// Run a synchronous method and decode its result.
    ///
    /// The pipeline's audit outcome is recorded before decoding, so a
    /// [`InterceptError::Reconstruction`] failure follows an audit output
    /// record rather than an audit error record.
    pub fn invoke_sync<R: DeserializeOwned>(
        &self,
        method: &MethodIdentity,
        arguments: Arguments,
    ) -> Result<R, InterceptError<T::Error>> {
        let entry = self.entry_with_shape(method, CallShape::Sync)?;
        let value = futures::executor::block_on(self.pipeline(entry).run(arguments))?;
        reconstruct(method, value)
    }

    /// Run a suspending method that completes without a payload.
    pub async fn invoke_async_void(
        &self,
        method: &MethodIdentity,
        arguments: Arguments,
    ) -> Result<(), InterceptError<T::Error>> {
        let entry = self.entry_with_shape(method, CallShape::AsyncVoid)?;
        self.pipeline(entry).run(arguments).await.map(|_| ())
    }

    /// Run a suspending method and decode its payload.
    ///
    /// As with [`invoke_sync`](Self::invoke_sync), decoding happens after the
    /// audit outcome has been recorded.
    pub async fn invoke_async_value<R: DeserializeOwned>(
        &self,
        method: &MethodIdentity,
        arguments: Arguments,
    ) -> Result<R, InterceptError<T::Error>> {
        let entry = self.entry_with_shape(method, CallShape::AsyncValue)?;
        let value = self.pipeline(entry).run(arguments).await?;
        reconstruct(method, value)
    }

    fn pipeline<'a>(&'a self, entry: &'a MethodEntry) -> Pipeline<'a, T> {
        Pipeline::new(
            self.target.as_ref(),
            entry,
            self.cache.as_ref(),
            self.sink.as_ref(),
            &self.registry,
        )
        .with_error_hook(self.on_error.as_deref())
    }

    fn entry(&self, method: &MethodIdentity) -> Result<&MethodEntry, InterceptError<T::Error>> {
        self.store
            .get(method)
            .map(Arc::as_ref)
            .ok_or_else(|| InterceptError::UnknownMethod {
                method: method.to_string(),
            })
    }

    fn entry_with_shape(
        &self,
        method: &MethodIdentity,
        requested: CallShape,
    ) -> Result<&MethodEntry, InterceptError<T::Error>> {
        let entry = self.entry(method)?;
        if entry.descriptor.shape != requested {
            return Err(InterceptError::ShapeMismatch {
                method: method.to_string(),
                declared: entry.descriptor.shape.as_str(),
                requested: requested.as_str(),
            });
        }
        Ok(entry)
    }
}

impl<T: Decorated> std::fmt::Debug for Interceptor<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Interceptor")
            .field("methods", &self.store.len())
            .field("cache_provider", &self.cache.provider_name())
            .finish()
    }
}
