//! Method identity and call shape.

use crate::error::Failure;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable key for a method on a capability: declaring type, name and
/// parameter types. Indexes both policy configuration and circuit state.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MethodIdentity {
    declaring_type: String,
    name: String,
    parameter_types: Vec<String>,
}

impl MethodIdentity {
    pub fn new(declaring_type: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            declaring_type: declaring_type.into(),
            name: name.into(),
            parameter_types: Vec::new(),
        }
    }

    /// Append one parameter type.
    pub fn param(mut self, parameter_type: impl Into<String>) -> Self {
        self.parameter_types.push(parameter_type.into());
        self
    }

    /// Append several parameter types in order.
    pub fn params<I, S>(mut self, parameter_types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.parameter_types
            .extend(parameter_types.into_iter().map(Into::into));
        self
    }

    /// Append the trailing parameter through which an exception-accepting
    /// fallback receives the captured failure.
    pub fn failure_param<E: std::error::Error + 'static>(self) -> Self {
        self.param(Self::failure_type_name::<E>())
    }

    pub(crate) fn failure_type_name<E: std::error::Error + 'static>() -> &'static str {
        std::any::type_name::<Failure<E>>()
    }

    pub fn declaring_type(&self) -> &str {
        &self.declaring_type
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parameter_types(&self) -> &[String] {
        &self.parameter_types
    }

    /// `Type.name` without the parameter list.
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.declaring_type, self.name)
    }
}

impl fmt::Display for MethodIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}({})",
            self.declaring_type,
            self.name,
            self.parameter_types.join(", ")
        )
    }
}

/// How an intercepted operation hands back its result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallShape {
    /// Returns on the caller's thread.
    Sync,
    /// Suspends, completes without a payload.
    AsyncVoid,
    /// Suspends, completes with a typed payload.
    AsyncValue,
}

impl CallShape {
    pub fn as_str(&self) -> &'static str {
        match self {
            CallShape::Sync => "sync",
            CallShape::AsyncVoid => "async_void",
            CallShape::AsyncValue => "async_value",
        }
    }

    pub fn is_suspending(&self) -> bool {
        !matches!(self, CallShape::Sync)
    }
}

impl fmt::Display for CallShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One operation offered by a decorated implementation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodDescriptor {
    pub identity: MethodIdentity,
    pub shape: CallShape,
}

impl MethodDescriptor {
    pub fn new(identity: MethodIdentity, shape: CallShape) -> Self {
        Self { identity, shape }
    }

    pub fn sync(identity: MethodIdentity) -> Self {
        Self::new(identity, CallShape::Sync)
    }

    pub fn async_void(identity: MethodIdentity) -> Self {
        Self::new(identity, CallShape::AsyncVoid)
    }

    pub fn async_value(identity: MethodIdentity) -> Self {
        Self::new(identity, CallShape::AsyncValue)
    }
}
