//! Call-shape execution strategies.
//!
//! Every shape runs the same async pipeline. Only two things differ: how the
//! pipeline is driven (blocked on for sync calls, awaited for async ones) and
//! how a retry pause waits.

use crate::error::InterceptError;
use crate::models::{CallShape, MethodIdentity};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionStrategy {
    /// Runs to completion on the caller's thread; pauses block the thread.
    Blocking,
    /// Runs inside the caller's tokio runtime; pauses suspend.
    Suspending,
}

impl ExecutionStrategy {
    pub fn for_shape(shape: CallShape) -> Self {
        if shape.is_suspending() {
            ExecutionStrategy::Suspending
        } else {
            ExecutionStrategy::Blocking
        }
    }

    /// Wait between retry attempts.
    pub async fn pause(&self, duration: Duration) {
        if duration.is_zero() {
            return;
        }
        match self {
            ExecutionStrategy::Blocking => std::thread::sleep(duration),
            ExecutionStrategy::Suspending => tokio::time::sleep(duration).await,
        }
    }
}

/// Turn the pipeline's untyped result into the caller's payload type.
///
/// Runs once after the pipeline has finished; no stage is re-entered.
pub fn reconstruct<R, E>(method: &MethodIdentity, value: Value) -> Result<R, InterceptError<E>>
where
    R: DeserializeOwned,
    E: std::error::Error + 'static,
{
    serde_json::from_value(value).map_err(|error| InterceptError::Reconstruction {
        method: method.to_string(),
        reason: error.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;
    use std::time::Instant;

    #[derive(Debug, thiserror::Error)]
    #[error("unused")]
    struct Never;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Order {
        id: u64,
        total: f64,
    }

    #[test]
    fn test_strategy_for_shape() {
        assert_eq!(
            ExecutionStrategy::for_shape(CallShape::Sync),
            ExecutionStrategy::Blocking
        );
        assert_eq!(
            ExecutionStrategy::for_shape(CallShape::AsyncVoid),
            ExecutionStrategy::Suspending
        );
        assert_eq!(
            ExecutionStrategy::for_shape(CallShape::AsyncValue),
            ExecutionStrategy::Suspending
        );
    }

    #[test]
    fn test_reconstruct_typed_payload() {
        let method = MethodIdentity::new("Orders", "get");
        let order: Order =
            reconstruct::<_, Never>(&method, json!({ "id": 7, "total": 12.5 })).unwrap();
        assert_eq!(order, Order { id: 7, total: 12.5 });
    }

    #[test]
    fn test_reconstruct_mismatch_is_reported() {
        let method = MethodIdentity::new("Orders", "get");
        let result = reconstruct::<Order, Never>(&method, json!("not an order"));
        match result {
            Err(InterceptError::Reconstruction { method, .. }) => {
                assert_eq!(method, "Orders.get()");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_suspending_pause_waits() {
        let started = Instant::now();
        ExecutionStrategy::Suspending
            .pause(Duration::from_millis(15))
            .await;
        assert!(started.elapsed() >= Duration::from_millis(15));
    }

    #[test]
    fn test_zero_pause_returns_immediately() {
        futures::executor::block_on(ExecutionStrategy::Blocking.pause(Duration::ZERO));
        tokio_test::block_on(ExecutionStrategy::Suspending.pause(Duration::ZERO));
    }
}
